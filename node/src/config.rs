//! Node configuration with TOML file support.

use serde::{Deserialize, Serialize};

use attest_types::{IssuanceParams, Provider};

use crate::admission::Budget;
use crate::signature::SignatureMode;
use crate::NodeError;

/// Configuration for an attest node.
///
/// Can be loaded from a TOML file via [`NodeConfig::from_toml_file`] or
/// built programmatically (e.g. for tests).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NodeConfig {
    /// Port the HTTP API listens on.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Log format: "human" or "json".
    #[serde(default = "default_log_format")]
    pub log_format: String,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Expose internal error detail in API responses.
    #[serde(default)]
    pub development_mode: bool,

    /// Identity of the issuing authority recorded on every credential.
    #[serde(default = "default_issuer")]
    pub issuer: String,

    /// How holder proofs are checked.
    #[serde(default = "default_signature_mode")]
    pub signature_mode: SignatureMode,

    /// Wall-clock lifetime of a verified verification.
    #[serde(default = "default_verification_ttl")]
    pub verification_ttl_secs: u64,

    /// Credential lifetime in ledger blocks.
    #[serde(default = "default_badge_validity")]
    pub badge_validity_blocks: u64,

    /// Age after which a pending credential is reconciled against the ledger.
    #[serde(default = "default_pending_timeout")]
    pub pending_timeout_secs: u64,

    #[serde(default)]
    pub ledger: LedgerConfig,

    #[serde(default)]
    pub providers: ProvidersConfig,

    #[serde(default)]
    pub limits: LimitsConfig,
}

/// The external ledger node.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// Base URL of the ledger REST API.
    #[serde(default = "default_ledger_endpoint")]
    pub endpoint: String,

    /// Deployed program holding the credential, nullifier and tally mappings.
    #[serde(default = "default_program")]
    pub program: String,

    /// Fee attached to every transition.
    #[serde(default = "default_fee")]
    pub fee: u64,

    #[serde(default = "default_ledger_timeout")]
    pub timeout_secs: u64,
}

/// Identity provider endpoints. A provider without a URL is disabled.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProvidersConfig {
    #[serde(default = "default_provider_timeout")]
    pub timeout_secs: u64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub humanity_registry: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub biometric_uniqueness: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub liveness: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub social_graph: Option<String>,
}

/// Admission-control budgets.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LimitsConfig {
    #[serde(default = "default_budget")]
    pub default: Budget,

    #[serde(default = "verification_budget")]
    pub verification: Budget,

    #[serde(default = "issuance_budget")]
    pub issuance: Budget,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_port() -> u16 {
    3001
}

fn default_log_format() -> String {
    "human".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_issuer() -> String {
    IssuanceParams::default().issuer
}

fn default_signature_mode() -> SignatureMode {
    SignatureMode::Ed25519
}

fn default_verification_ttl() -> u64 {
    IssuanceParams::default().verification_ttl_secs
}

fn default_badge_validity() -> u64 {
    IssuanceParams::default().badge_validity_blocks
}

fn default_pending_timeout() -> u64 {
    IssuanceParams::default().pending_timeout_secs
}

fn default_ledger_endpoint() -> String {
    "http://127.0.0.1:3030".to_string()
}

fn default_program() -> String {
    "attest_badge.aleo".to_string()
}

fn default_fee() -> u64 {
    100_000
}

fn default_ledger_timeout() -> u64 {
    30
}

fn default_provider_timeout() -> u64 {
    10
}

fn default_budget() -> Budget {
    Budget::new(100, 900)
}

fn verification_budget() -> Budget {
    Budget::new(10, 900)
}

fn issuance_budget() -> Budget {
    Budget::new(3, 3600)
}

// ── Impl ───────────────────────────────────────────────────────────────

impl NodeConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: &str) -> Result<Self, NodeError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| NodeError::Config(e.to_string()))?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, NodeError> {
        toml::from_str(s).map_err(|e| NodeError::Config(e.to_string()))
    }

    /// Serialize the configuration to a TOML string.
    pub fn to_toml_string(&self) -> String {
        toml::to_string_pretty(self).expect("NodeConfig is always serializable to TOML")
    }

    pub fn issuance_params(&self) -> IssuanceParams {
        IssuanceParams {
            verification_ttl_secs: self.verification_ttl_secs,
            badge_validity_blocks: self.badge_validity_blocks,
            pending_timeout_secs: self.pending_timeout_secs,
            issuer: self.issuer.clone(),
        }
    }

    /// Reject values the pipeline cannot run with.
    pub fn validate(&self) -> Result<(), NodeError> {
        if self.issuer.trim().is_empty() {
            return Err(NodeError::Config("issuer must not be empty".into()));
        }
        if self.verification_ttl_secs == 0 || self.badge_validity_blocks == 0 {
            return Err(NodeError::Config(
                "verification_ttl_secs and badge_validity_blocks must be positive".into(),
            ));
        }
        if self.ledger.timeout_secs == 0 || self.providers.timeout_secs == 0 {
            return Err(NodeError::Config("timeouts must be positive".into()));
        }
        for (name, budget) in [
            ("default", &self.limits.default),
            ("verification", &self.limits.verification),
            ("issuance", &self.limits.issuance),
        ] {
            if budget.max_requests == 0 || budget.window_secs == 0 {
                return Err(NodeError::Config(format!("limits.{name} must be positive")));
            }
        }
        url::Url::parse(&self.ledger.endpoint)
            .map_err(|e| NodeError::Config(format!("ledger.endpoint: {e}")))?;
        for (provider, url) in self.providers.configured() {
            url::Url::parse(url)
                .map_err(|e| NodeError::Config(format!("providers.{provider}: {e}")))?;
        }
        Ok(())
    }
}

impl ProvidersConfig {
    /// Providers that have an endpoint configured.
    pub fn configured(&self) -> Vec<(Provider, &str)> {
        [
            (Provider::HumanityRegistry, &self.humanity_registry),
            (Provider::BiometricUniqueness, &self.biometric_uniqueness),
            (Provider::Liveness, &self.liveness),
            (Provider::SocialGraph, &self.social_graph),
        ]
        .into_iter()
        .filter_map(|(provider, url)| url.as_deref().map(|u| (provider, u)))
        .collect()
    }
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            log_format: default_log_format(),
            log_level: default_log_level(),
            development_mode: false,
            issuer: default_issuer(),
            signature_mode: default_signature_mode(),
            verification_ttl_secs: default_verification_ttl(),
            badge_validity_blocks: default_badge_validity(),
            pending_timeout_secs: default_pending_timeout(),
            ledger: LedgerConfig::default(),
            providers: ProvidersConfig::default(),
            limits: LimitsConfig::default(),
        }
    }
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            endpoint: default_ledger_endpoint(),
            program: default_program(),
            fee: default_fee(),
            timeout_secs: default_ledger_timeout(),
        }
    }
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_provider_timeout(),
            humanity_registry: None,
            biometric_uniqueness: None,
            liveness: None,
            social_graph: None,
        }
    }
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            default: default_budget(),
            verification: verification_budget(),
            issuance: issuance_budget(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_round_trips_through_toml() {
        let config = NodeConfig::default();
        let toml_str = config.to_toml_string();
        let parsed = NodeConfig::from_toml_str(&toml_str).expect("should parse");
        assert_eq!(parsed.port, config.port);
        assert_eq!(parsed.ledger.program, config.ledger.program);
        assert_eq!(parsed.limits.issuance, config.limits.issuance);
    }

    #[test]
    fn minimal_toml_uses_defaults() {
        let config = NodeConfig::from_toml_str("").expect("empty toml should use defaults");
        assert_eq!(config.port, 3001);
        assert_eq!(config.log_format, "human");
        assert_eq!(config.signature_mode, SignatureMode::Ed25519);
        assert_eq!(config.limits.verification, Budget::new(10, 900));
        assert!(config.providers.configured().is_empty());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_toml_overrides() {
        let toml = r#"
            port = 9999
            signature_mode = "accept-all"

            [providers]
            humanity_registry = "https://registry.example/api/profiles"

            [limits.issuance]
            max_requests = 1
            window_secs = 60
        "#;
        let config = NodeConfig::from_toml_str(toml).expect("should parse");
        assert_eq!(config.port, 9999);
        assert_eq!(config.signature_mode, SignatureMode::AcceptAll);
        assert_eq!(config.limits.issuance, Budget::new(1, 60));
        assert_eq!(config.limits.default, Budget::new(100, 900));
        assert_eq!(
            config.providers.configured(),
            vec![(Provider::HumanityRegistry, "https://registry.example/api/profiles")]
        );
        assert_eq!(config.log_format, "human"); // default
    }

    #[test]
    fn issuance_params_follow_config() {
        let config = NodeConfig {
            issuer: "council".into(),
            badge_validity_blocks: 500,
            ..NodeConfig::default()
        };
        let params = config.issuance_params();
        assert_eq!(params.issuer, "council");
        assert_eq!(params.badge_validity_blocks, 500);
    }

    #[test]
    fn validate_rejects_bad_values() {
        let config = NodeConfig {
            issuer: " ".into(),
            ..NodeConfig::default()
        };
        assert!(config.validate().is_err());

        let mut config = NodeConfig::default();
        config.providers.liveness = Some("not a url".into());
        assert!(config.validate().is_err());

        let mut config = NodeConfig::default();
        config.limits.issuance = Budget::new(0, 3600);
        assert!(config.validate().is_err());
    }

    #[test]
    fn missing_file_returns_config_error() {
        let result = NodeConfig::from_toml_file("/nonexistent/attest.toml");
        assert!(matches!(result, Err(NodeError::Config(_))));
    }
}
