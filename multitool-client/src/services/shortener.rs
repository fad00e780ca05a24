//! URL shortening via TinyURL's `api-create.php`

use tracing::info;

use super::ServiceError;
use super::http::HttpSession;

/// Default shortener host
pub const DEFAULT_SHORTENER_URL: &str = "http://tinyurl.com";

/// Trim `input` and add `http://` when it has no scheme
pub fn normalize_url(input: &str) -> Result<String, ServiceError> {
    let url = input.trim();
    if url.is_empty() {
        return Err(ServiceError::EmptyUrl);
    }

    if url.starts_with("http://") || url.starts_with("https://") {
        Ok(url.to_string())
    } else {
        Ok(format!("http://{}", url))
    }
}

/// Client for the URL shortener
#[derive(Debug, Clone)]
pub struct Shortener {
    session: HttpSession,
    base_url: String,
}

impl Shortener {
    pub fn new(session: HttpSession) -> Self {
        Self::with_base_url(session, DEFAULT_SHORTENER_URL)
    }

    pub fn with_base_url(session: HttpSession, base_url: impl Into<String>) -> Self {
        Self {
            session,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Shorten `input`, returning the short URL
    pub async fn shorten(&self, input: &str) -> Result<String, ServiceError> {
        let url = normalize_url(input)?;
        let endpoint = format!("{}/api-create.php", self.base_url);

        let response = self
            .session
            .send(|client| client.get(&endpoint).query(&[("url", url.as_str())]))
            .await?;
        let short = response.text().await?.trim().to_string();

        if short.is_empty() {
            return Err(ServiceError::UnexpectedResponse(
                "empty shortener response".to_string(),
            ));
        }

        info!(url = %url, short = %short, "shortened URL");
        Ok(short)
    }
}
