//! Identity provider adapters.

use std::time::Duration;

use async_trait::async_trait;
use attest_types::{Provider, Timestamp};
use reqwest::StatusCode;
use serde::Deserialize;
use url::Url;

use crate::VerificationError;

/// Longest profile identifier accepted.
pub const MAX_PROFILE_LEN: usize = 128;

/// Payload object keys that may carry the profile reference.
const PROFILE_KEYS: [&str; 3] = ["profile", "profileUrl", "profileId"];

/// Default connection timeout.
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// The provider-side identifier of a holder's identity claim.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProfileReference(String);

impl ProfileReference {
    /// Extract the profile reference from an opaque client payload.
    ///
    /// The payload is either a string or an object carrying one under
    /// `profile`, `profileUrl` or `profileId`. The string is either an
    /// `http(s)` profile URL, whose last path segment is the reference, or
    /// the bare reference itself.
    pub fn from_payload(payload: &serde_json::Value) -> Result<Self, VerificationError> {
        let raw = match payload {
            serde_json::Value::String(s) => s.as_str(),
            serde_json::Value::Object(map) => PROFILE_KEYS
                .iter()
                .find_map(|k| map.get(*k).and_then(|v| v.as_str()))
                .ok_or_else(|| {
                    VerificationError::InvalidPayload("missing profile reference".into())
                })?,
            _ => {
                return Err(VerificationError::InvalidPayload(
                    "expected a string or an object".into(),
                ))
            }
        };
        Self::parse(raw.trim())
    }

    pub fn parse(raw: &str) -> Result<Self, VerificationError> {
        if raw.contains("://") {
            let url = Url::parse(raw).map_err(|e| VerificationError::InvalidUrl(e.to_string()))?;
            if !matches!(url.scheme(), "http" | "https") {
                return Err(VerificationError::InvalidUrl(format!(
                    "unsupported scheme `{}`",
                    url.scheme()
                )));
            }
            let segment = url
                .path_segments()
                .and_then(|mut segments| segments.rfind(|s| !s.is_empty()))
                .ok_or_else(|| VerificationError::InvalidUrl("URL has no profile segment".into()))?;
            return Self::validate(segment);
        }
        Self::validate(raw)
    }

    fn validate(id: &str) -> Result<Self, VerificationError> {
        let ok = !id.is_empty()
            && id.len() <= MAX_PROFILE_LEN
            && id
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-');
        if ok {
            Ok(Self(id.to_string()))
        } else {
            Err(VerificationError::InvalidPayload(format!(
                "profile reference `{id}` is malformed"
            )))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Outcome of a provider check.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProviderCheck {
    pub registered: bool,
    /// When the provider recorded the identity claim, if it says.
    pub submission_time: Option<Timestamp>,
    /// The provider's verification datum committed into the proof hash.
    pub datum: String,
}

/// `verify(profile) -> {registered, submissionTime}` against one provider.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    fn provider(&self) -> Provider;

    async fn verify(&self, profile: &ProfileReference) -> Result<ProviderCheck, VerificationError>;
}

/// Adapter for a public registry exposing `GET {base}/{profile}`.
///
/// The registry answers `{"registered": bool, "submissionTime": secs?}`; an
/// unknown profile (404) counts as not registered.
pub struct HttpRegistryProvider {
    provider: Provider,
    base: String,
    http_client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RegistryResponse {
    registered: bool,
    #[serde(default)]
    submission_time: Option<u64>,
}

impl HttpRegistryProvider {
    /// Fails only if the HTTP client cannot be built with the given timeouts.
    pub fn new(provider: Provider, base: &Url, timeout: Duration) -> Result<Self, reqwest::Error> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(DEFAULT_CONNECT_TIMEOUT)
            .build()?;
        Ok(Self {
            provider,
            base: base.as_str().trim_end_matches('/').to_string(),
            http_client,
        })
    }

    fn unavailable(&self, reason: impl Into<String>) -> VerificationError {
        VerificationError::ProviderUnavailable {
            provider: self.provider,
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl IdentityProvider for HttpRegistryProvider {
    fn provider(&self) -> Provider {
        self.provider
    }

    async fn verify(&self, profile: &ProfileReference) -> Result<ProviderCheck, VerificationError> {
        let url = format!("{}/{}", self.base, profile.as_str());
        let response = self.http_client.get(&url).send().await.map_err(|e| {
            if e.is_timeout() {
                VerificationError::ProviderTimeout(self.provider)
            } else if e.is_connect() {
                self.unavailable(format!("connection failed: {e}"))
            } else {
                self.unavailable(e.to_string())
            }
        })?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(ProviderCheck {
                registered: false,
                submission_time: None,
                datum: profile.as_str().to_string(),
            });
        }
        if !response.status().is_success() {
            return Err(self.unavailable(format!("HTTP status {}", response.status())));
        }

        let body: RegistryResponse = response
            .json()
            .await
            .map_err(|e| self.unavailable(format!("failed to parse registry response: {e}")))?;

        Ok(ProviderCheck {
            registered: body.registered,
            submission_time: body.submission_time.map(Timestamp::new),
            datum: profile.as_str().to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn bare_reference() {
        let p = ProfileReference::from_payload(&json!("0xAbC123")).unwrap();
        assert_eq!(p.as_str(), "0xAbC123");
    }

    #[test]
    fn url_reference_uses_last_segment() {
        let p = ProfileReference::from_payload(&json!(
            "https://registry.example/profile/0xabc123/"
        ))
        .unwrap();
        assert_eq!(p.as_str(), "0xabc123");
    }

    #[test]
    fn object_payload() {
        let p = ProfileReference::from_payload(&json!({"profileUrl": "https://r.example/p/42"}))
            .unwrap();
        assert_eq!(p.as_str(), "42");
    }

    #[test]
    fn malformed_payloads_are_rejected() {
        assert!(matches!(
            ProfileReference::from_payload(&json!(42)),
            Err(VerificationError::InvalidPayload(_))
        ));
        assert!(matches!(
            ProfileReference::from_payload(&json!({"other": "x"})),
            Err(VerificationError::InvalidPayload(_))
        ));
        assert!(matches!(
            ProfileReference::from_payload(&json!("has spaces")),
            Err(VerificationError::InvalidPayload(_))
        ));
    }

    #[test]
    fn bad_urls_are_rejected() {
        assert!(matches!(
            ProfileReference::parse("ftp://registry.example/p/1"),
            Err(VerificationError::InvalidUrl(_))
        ));
        assert!(matches!(
            ProfileReference::parse("https://registry.example/"),
            Err(VerificationError::InvalidUrl(_))
        ));
        assert!(matches!(
            ProfileReference::parse("https://"),
            Err(VerificationError::InvalidUrl(_))
        ));
    }

    #[tokio::test]
    async fn unreachable_registry_is_retryable() {
        let base = Url::parse("http://127.0.0.1:1/profiles").unwrap();
        let adapter =
            HttpRegistryProvider::new(Provider::HumanityRegistry, &base, Duration::from_secs(2))
                .unwrap();
        let profile = ProfileReference::parse("42").unwrap();
        let err = adapter.verify(&profile).await.unwrap_err();
        assert!(err.is_retryable());
    }
}
