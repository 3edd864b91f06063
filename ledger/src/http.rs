//! REST adapter for a ledger node.
//!
//! - `POST {base}/transactions` with a [`Transition`] body → `{"transactionId": ..}`
//! - `GET {base}/program/{program}/mapping/{mapping}/{key}` → JSON value or `null`
//! - `GET {base}/latest/height` → integer

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use url::Url;

use crate::{LedgerClient, LedgerError, RejectReason, TransactionId, Transition};

/// Default connection timeout.
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

pub struct HttpLedgerClient {
    base: String,
    timeout: Duration,
    http_client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SubmitResponse {
    transaction_id: String,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

impl HttpLedgerClient {
    /// Fails only if the HTTP client cannot be built with the given timeouts.
    pub fn new(endpoint: &Url, timeout: Duration) -> Result<Self, reqwest::Error> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(DEFAULT_CONNECT_TIMEOUT)
            .build()?;
        Ok(Self {
            base: endpoint.as_str().trim_end_matches('/').to_string(),
            timeout,
            http_client,
        })
    }

    /// A timed-out request may still have reached the node, so it is reported
    /// as a timeout rather than as unreachable.
    fn map_send_error(&self, operation: &'static str, e: reqwest::Error) -> LedgerError {
        if e.is_timeout() {
            LedgerError::Timeout {
                operation,
                millis: self.timeout.as_millis() as u64,
            }
        } else if e.is_connect() {
            LedgerError::Unreachable(format!("connection failed: {e}"))
        } else {
            LedgerError::Unreachable(e.to_string())
        }
    }
}

#[async_trait]
impl LedgerClient for HttpLedgerClient {
    async fn submit(&self, transition: Transition) -> Result<TransactionId, LedgerError> {
        let url = format!("{}/transactions", self.base);
        let response = self
            .http_client
            .post(&url)
            .json(&transition)
            .send()
            .await
            .map_err(|e| self.map_send_error("submit", e))?;

        let status = response.status();
        if status.is_server_error() {
            return Err(LedgerError::Unreachable(format!("HTTP status {status}")));
        }
        if !status.is_success() {
            let body: ErrorResponse = response.json().await.unwrap_or(ErrorResponse {
                error: None,
                message: None,
            });
            let message = body
                .error
                .or(body.message)
                .unwrap_or_else(|| format!("HTTP status {status}"));
            return Err(LedgerError::Rejected(RejectReason::classify(&message)));
        }

        let body: SubmitResponse = response
            .json()
            .await
            .map_err(|e| LedgerError::InvalidResponse(format!("submit response: {e}")))?;
        Ok(TransactionId::new(body.transaction_id))
    }

    async fn read_mapping(
        &self,
        program: &str,
        mapping: &str,
        key: &str,
    ) -> Result<Option<String>, LedgerError> {
        let url = format!("{}/program/{program}/mapping/{mapping}/{key}", self.base);
        let response = self
            .http_client
            .get(&url)
            .send()
            .await
            .map_err(|e| self.map_send_error("read_mapping", e))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(LedgerError::Unreachable(format!(
                "HTTP status {}",
                response.status()
            )));
        }

        let value: serde_json::Value = response
            .json()
            .await
            .map_err(|e| LedgerError::InvalidResponse(format!("mapping value: {e}")))?;
        Ok(match value {
            serde_json::Value::Null => None,
            serde_json::Value::String(s) => Some(s),
            other => Some(other.to_string()),
        })
    }

    async fn current_height(&self) -> Result<u64, LedgerError> {
        let url = format!("{}/latest/height", self.base);
        let response = self
            .http_client
            .get(&url)
            .send()
            .await
            .map_err(|e| self.map_send_error("current_height", e))?;

        if !response.status().is_success() {
            return Err(LedgerError::Unreachable(format!(
                "HTTP status {}",
                response.status()
            )));
        }
        response
            .json::<u64>()
            .await
            .map_err(|e| LedgerError::InvalidResponse(format!("height: {e}")))
    }
}
