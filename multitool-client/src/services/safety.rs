//! URL safety checks against the Google Safe Browsing v4 Lookup API
//!
//! Without an API key nothing is sent and the verdict is
//! [`SafetyVerdict::Unchecked`].

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::ServiceError;
use super::http::HttpSession;
use super::shortener::normalize_url;

/// Default Safe Browsing host
pub const DEFAULT_SAFE_BROWSING_URL: &str = "https://safebrowsing.googleapis.com";

/// Client identifier sent with lookups
const CLIENT_ID: &str = "multitool";

/// Threat categories to look up
const THREAT_TYPES: &[&str] = &[
    "MALWARE",
    "SOCIAL_ENGINEERING",
    "UNWANTED_SOFTWARE",
    "POTENTIALLY_HARMFUL_APPLICATION",
];

/// Result of a safety check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SafetyVerdict {
    /// No known threats
    Safe,
    /// Listed for these threat types
    Unsafe(Vec<String>),
    /// No API key configured, nothing was checked
    Unchecked,
}

impl std::fmt::Display for SafetyVerdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SafetyVerdict::Safe => write!(f, "URL is safe."),
            SafetyVerdict::Unsafe(threats) => {
                write!(f, "URL may be unsafe! ({})", threats.join(", "))
            }
            SafetyVerdict::Unchecked => {
                write!(f, "URL was not checked: no Safe Browsing API key configured.")
            }
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LookupRequest<'a> {
    client: ClientInfo<'a>,
    threat_info: ThreatInfo<'a>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ClientInfo<'a> {
    client_id: &'a str,
    client_version: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ThreatInfo<'a> {
    threat_types: &'a [&'a str],
    platform_types: &'a [&'a str],
    threat_entry_types: &'a [&'a str],
    threat_entries: Vec<ThreatEntry<'a>>,
}

#[derive(Serialize)]
struct ThreatEntry<'a> {
    url: &'a str,
}

#[derive(Debug, Default, Deserialize)]
struct LookupResponse {
    #[serde(default)]
    matches: Vec<ThreatMatch>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ThreatMatch {
    threat_type: String,
}

fn lookup_request(url: &str) -> LookupRequest<'_> {
    LookupRequest {
        client: ClientInfo {
            client_id: CLIENT_ID,
            client_version: env!("CARGO_PKG_VERSION"),
        },
        threat_info: ThreatInfo {
            threat_types: THREAT_TYPES,
            platform_types: &["ANY_PLATFORM"],
            threat_entry_types: &["URL"],
            threat_entries: vec![ThreatEntry { url }],
        },
    }
}

fn verdict_from(response: LookupResponse) -> SafetyVerdict {
    if response.matches.is_empty() {
        return SafetyVerdict::Safe;
    }

    let mut threats: Vec<String> = response
        .matches
        .into_iter()
        .map(|m| m.threat_type)
        .collect();
    threats.sort();
    threats.dedup();
    SafetyVerdict::Unsafe(threats)
}

/// Client for the Safe Browsing Lookup API
#[derive(Debug, Clone)]
pub struct SafetyChecker {
    session: HttpSession,
    base_url: String,
    api_key: Option<String>,
}

impl SafetyChecker {
    /// Create a checker; a blank key disables lookups
    pub fn new(session: HttpSession, api_key: &str) -> Self {
        Self::with_base_url(session, DEFAULT_SAFE_BROWSING_URL, api_key)
    }

    pub fn with_base_url(session: HttpSession, base_url: impl Into<String>, api_key: &str) -> Self {
        let api_key = api_key.trim();
        Self {
            session,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: (!api_key.is_empty()).then(|| api_key.to_string()),
        }
    }

    /// Look up `input` in the Safe Browsing lists
    pub async fn check(&self, input: &str) -> Result<SafetyVerdict, ServiceError> {
        let url = normalize_url(input)?;

        let Some(api_key) = &self.api_key else {
            warn!(url = %url, "safety check skipped: no API key");
            return Ok(SafetyVerdict::Unchecked);
        };

        let endpoint = format!("{}/v4/threatMatches:find", self.base_url);
        let body = lookup_request(&url);
        let response = self
            .session
            .send(|client| {
                client
                    .post(&endpoint)
                    .query(&[("key", api_key.as_str())])
                    .json(&body)
            })
            .await?;

        let lookup: LookupResponse = response
            .json()
            .await
            .map_err(|e| ServiceError::UnexpectedResponse(e.to_string()))?;
        let verdict = verdict_from(lookup);

        info!(url = %url, verdict = ?verdict, "checked URL safety");
        Ok(verdict)
    }
}
