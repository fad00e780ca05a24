//! Exchange-rate lookup and currency conversion
//!
//! Rates come from the exchangerate-api v4 endpoint:
//! `GET {base_url}/v4/latest/{BASE}` returning `{"rates": {"EUR": 0.92, ...}}`.

use std::collections::BTreeMap;

use serde::Deserialize;
use tracing::{info, warn};

use super::ServiceError;
use super::http::HttpSession;

/// Default exchange-rate API host
pub const DEFAULT_RATES_URL: &str = "https://api.exchangerate-api.com";

/// Currency that anchors the list of available codes
pub const REFERENCE_CURRENCY: &str = "USD";

/// Codes offered when the rate API cannot be reached
pub const FALLBACK_CURRENCIES: &[&str] = &["CAD", "EUR", "GBP", "JPY", "USD"];

#[derive(Debug, Deserialize)]
struct RatesResponse {
    rates: BTreeMap<String, f64>,
}

/// A completed conversion
#[derive(Debug, Clone, PartialEq)]
pub struct Conversion {
    pub amount: f64,
    pub from: String,
    pub to: String,
    pub rate: f64,
    pub result: f64,
}

impl Conversion {
    /// Line recorded in the history, e.g. `100.0 USD -> 92.34 EUR`
    pub fn history_entry(&self) -> String {
        format!(
            "{} {} -> {:.2} {}",
            format_amount(self.amount),
            self.from,
            self.result,
            self.to
        )
    }
}

impl std::fmt::Display for Conversion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {} = {:.2} {}",
            format_amount(self.amount),
            self.from,
            self.result,
            self.to
        )
    }
}

/// Amount as typed back to the user, always with a decimal part (`100.0`)
///
/// Very large or small amounts use a signed two-digit exponent (`1e+16`,
/// `1.5e-05`), matching how the history has always recorded them.
fn format_amount(amount: f64) -> String {
    let repr = format!("{:?}", amount);
    match repr.split_once('e') {
        Some((mantissa, exponent)) => {
            let exponent: i32 = exponent.parse().unwrap_or_default();
            let sign = if exponent < 0 { '-' } else { '+' };
            format!("{}e{}{:02}", mantissa, sign, exponent.abs())
        }
        None => repr,
    }
}

/// Parse a user-entered amount
///
/// Accepts anything `f64` parses after trimming; rejects NaN and infinities.
pub fn parse_amount(input: &str) -> Result<f64, ServiceError> {
    let trimmed = input.trim();
    match trimmed.parse::<f64>() {
        Ok(amount) if amount.is_finite() => Ok(amount),
        _ => Err(ServiceError::InvalidAmount(trimmed.to_string())),
    }
}

/// Normalize a currency code (`eur ` -> `EUR`)
fn currency_code(code: &str) -> String {
    code.trim().to_ascii_uppercase()
}

/// Client for the exchange-rate API
#[derive(Debug, Clone)]
pub struct CurrencyClient {
    session: HttpSession,
    base_url: String,
}

impl CurrencyClient {
    pub fn new(session: HttpSession) -> Self {
        Self::with_base_url(session, DEFAULT_RATES_URL)
    }

    pub fn with_base_url(session: HttpSession, base_url: impl Into<String>) -> Self {
        Self {
            session,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Rates for one unit of `base`, keyed by currency code
    pub async fn fetch_rates(&self, base: &str) -> Result<BTreeMap<String, f64>, ServiceError> {
        let url = format!("{}/v4/latest/{}", self.base_url, currency_code(base));
        let response = self.session.get(&url).await?;
        let body: RatesResponse = response
            .json()
            .await
            .map_err(|e| ServiceError::UnexpectedResponse(e.to_string()))?;
        Ok(body.rates)
    }

    /// Sorted list of known currency codes
    ///
    /// Falls back to [`FALLBACK_CURRENCIES`] if the API is unavailable.
    pub async fn fetch_currencies(&self) -> Vec<String> {
        match self.fetch_rates(REFERENCE_CURRENCY).await {
            Ok(rates) if !rates.is_empty() => rates.into_keys().collect(),
            Ok(_) => {
                warn!("rate API returned no currencies, using fallback list");
                fallback_currencies()
            }
            Err(e) => {
                warn!(error = %e, "failed to fetch currencies, using fallback list");
                fallback_currencies()
            }
        }
    }

    /// Convert `amount` of `from` into `to` at the current rate
    pub async fn convert(
        &self,
        amount: f64,
        from: &str,
        to: &str,
    ) -> Result<Conversion, ServiceError> {
        let from = currency_code(from);
        let to = currency_code(to);

        let rates = self.fetch_rates(&from).await?;
        let rate = *rates
            .get(&to)
            .ok_or_else(|| ServiceError::UnknownCurrency(to.clone()))?;

        let conversion = Conversion {
            amount,
            result: amount * rate,
            from,
            to,
            rate,
        };
        info!(
            amount,
            from = %conversion.from,
            to = %conversion.to,
            result = conversion.result,
            "converted currency"
        );
        Ok(conversion)
    }
}

fn fallback_currencies() -> Vec<String> {
    FALLBACK_CURRENCIES.iter().map(|c| c.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conversion(amount: f64, result: f64) -> Conversion {
        Conversion {
            amount,
            from: "USD".to_string(),
            to: "EUR".to_string(),
            rate: result / amount,
            result,
        }
    }

    #[test]
    fn test_history_entry_format() {
        assert_eq!(
            conversion(100.0, 92.3412).history_entry(),
            "100.0 USD -> 92.34 EUR"
        );
        assert_eq!(conversion(2.5, 2.3).history_entry(), "2.5 USD -> 2.30 EUR");
    }

    #[test]
    fn test_format_amount_exponents() {
        assert_eq!(format_amount(1e16), "1e+16");
        assert_eq!(format_amount(1.5e-5), "1.5e-05");
        assert_eq!(format_amount(2e100), "2e+100");
        assert_eq!(format_amount(-1e20), "-1e+20");
        assert_eq!(format_amount(1e15), "1000000000000000.0");
        assert_eq!(format_amount(0.0001), "0.0001");
    }

    #[test]
    fn test_display_format() {
        assert_eq!(
            conversion(100.0, 92.3412).to_string(),
            "100.0 USD = 92.34 EUR"
        );
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("100").unwrap(), 100.0);
        assert_eq!(parse_amount(" 2.5 ").unwrap(), 2.5);
        assert_eq!(parse_amount("-3").unwrap(), -3.0);
        assert!(matches!(
            parse_amount("ten"),
            Err(ServiceError::InvalidAmount(s)) if s == "ten"
        ));
        assert!(parse_amount("").is_err());
        assert!(parse_amount("NaN").is_err());
        assert!(parse_amount("inf").is_err());
    }

    #[test]
    fn test_currency_code_normalized() {
        assert_eq!(currency_code(" eur "), "EUR");
    }

    #[test]
    fn test_fallback_currencies_sorted() {
        let mut sorted = FALLBACK_CURRENCIES.to_vec();
        sorted.sort();
        assert_eq!(FALLBACK_CURRENCIES, sorted.as_slice());
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client = CurrencyClient::with_base_url(HttpSession::new(), "http://localhost:1/");
        assert_eq!(client.base_url, "http://localhost:1");
    }
}
