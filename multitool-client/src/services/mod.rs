//! Network services
//!
//! Thin HTTP clients for exchange rates, URL shortening, and URL safety
//! checks. All of them share one [`HttpSession`] and its retry policy.

pub mod currency;
pub mod http;
pub mod safety;
pub mod shortener;

use thiserror::Error;

pub use currency::{Conversion, CurrencyClient, parse_amount};
pub use http::{HttpSession, RetryPolicy};
pub use safety::{SafetyChecker, SafetyVerdict};
pub use shortener::{Shortener, normalize_url};

/// Errors returned by the network services
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Amount is not a finite number
    #[error("invalid amount: {0:?}")]
    InvalidAmount(String),

    /// URL to shorten or check is empty
    #[error("URL is empty")]
    EmptyUrl,

    /// Target currency is missing from the rate table
    #[error("unknown currency: {0}")]
    UnknownCurrency(String),

    /// Server answered with a non-success status after all retries
    #[error("HTTP status {0}")]
    Status(reqwest::StatusCode),

    /// Transport error (connection, timeout, body decoding)
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Response body did not have the expected shape
    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),
}
