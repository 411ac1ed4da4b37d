use crate::utils::config_loader::{ConfigSection, LoadConfigError};
use crate::utils::constants::{DEFAULT_CHAIN_ID, DEFAULT_CONFIRMATIONS, UNSET_CONTRACT};
use alloy_primitives::Address;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use url::Url;

/// How many blocks must sit on top of a transaction before it counts as confirmed.
///
/// Set per method because call sites differ (a membership join waits longer than a claim).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfirmationPolicy {
    pub default: u64,
    pub per_method: HashMap<String, u64>,
}

impl Default for ConfirmationPolicy {
    fn default() -> Self {
        Self {
            default: DEFAULT_CONFIRMATIONS,
            per_method: HashMap::from([("joinDAO".to_string(), 2)]),
        }
    }
}

impl ConfirmationPolicy {
    pub fn uniform(confirmations: u64) -> Self {
        Self {
            default: confirmations,
            per_method: HashMap::new(),
        }
    }

    pub fn with_method(mut self, method: impl Into<String>, confirmations: u64) -> Self {
        self.per_method.insert(method.into(), confirmations);
        self
    }

    pub fn for_method(&self, method: &str) -> u64 {
        self.per_method.get(method).copied().unwrap_or(self.default)
    }
}

/// Configuration for the execution layer
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutorConfig {
    /// HTTP RPC URL used for submission and receipt polling
    pub rpc_http_url: String,
    /// Chain the connected wallet must be on
    pub chain_id: u64,
    /// JobSecure core contract
    pub core_address: Address,
    /// JobSecure governance contract
    pub governance_address: Address,
    pub confirmations: ConfirmationPolicy,
    /// Delay between receipt polls, in milliseconds
    pub poll_interval_ms: u64,
    /// How often the progress estimate is nudged while waiting, in milliseconds
    pub progress_tick_ms: u64,
    /// Give up waiting for confirmations after this long. `None` waits forever.
    pub confirmation_timeout_secs: Option<u64>,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            rpc_http_url: "http://127.0.0.1:8545".to_string(),
            chain_id: DEFAULT_CHAIN_ID,
            core_address: UNSET_CONTRACT,
            governance_address: UNSET_CONTRACT,
            confirmations: ConfirmationPolicy::default(),
            poll_interval_ms: 2_000,
            progress_tick_ms: 1_000,
            confirmation_timeout_secs: None,
        }
    }
}

impl ConfigSection for ExecutorConfig {
    const SECTION: &'static str = "executor";
}

impl ExecutorConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> eyre::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`ExecutorConfig::from_env`], reading variables through `lookup`
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> eyre::Result<Self> {
        let mut config = Self::default();

        if let Some(rpc_http_url) = lookup("RPC_HTTP_URL") {
            let _url = Url::parse(&rpc_http_url).map_err(|e| eyre::eyre!("Invalid RPC_HTTP_URL: {}", e))?;
            config.rpc_http_url = rpc_http_url;
        }

        if let Some(chain_id) = lookup("CHAIN_ID") {
            config.chain_id = chain_id.parse().map_err(|e| eyre::eyre!("Invalid CHAIN_ID: {}", e))?;
        }

        if let Some(core_address) = lookup("CORE_ADDRESS") {
            config.core_address = core_address
                .parse()
                .map_err(|e| eyre::eyre!("Invalid CORE_ADDRESS: {}", e))?;
        }

        if let Some(governance_address) = lookup("GOVERNANCE_ADDRESS") {
            config.governance_address = governance_address
                .parse()
                .map_err(|e| eyre::eyre!("Invalid GOVERNANCE_ADDRESS: {}", e))?;
        }

        if let Some(confirmations) = lookup("DEFAULT_CONFIRMATIONS") {
            config.confirmations.default = confirmations
                .parse()
                .map_err(|e| eyre::eyre!("Invalid DEFAULT_CONFIRMATIONS: {}", e))?;
        }

        if let Some(poll_interval) = lookup("POLL_INTERVAL_MS") {
            config.poll_interval_ms = poll_interval
                .parse()
                .map_err(|e| eyre::eyre!("Invalid POLL_INTERVAL_MS: {}", e))?;
        }

        if let Some(tick) = lookup("PROGRESS_TICK_MS") {
            config.progress_tick_ms = tick.parse().map_err(|e| eyre::eyre!("Invalid PROGRESS_TICK_MS: {}", e))?;
        }

        if let Some(timeout) = lookup("CONFIRMATION_TIMEOUT_SECS") {
            config.confirmation_timeout_secs = Some(
                timeout
                    .parse()
                    .map_err(|e| eyre::eyre!("Invalid CONFIRMATION_TIMEOUT_SECS: {}", e))?,
            );
        }

        config.validate()?;
        Ok(config)
    }

    /// Load the `[executor]` section of a TOML file
    pub fn from_file(file_name: &str) -> Result<Self, LoadConfigError> {
        let config = Self::load_section_from_file_sync(file_name)?;
        config.validate().map_err(|e| LoadConfigError::ConfigError(e.to_string()))?;
        Ok(config)
    }

    pub fn validate(&self) -> eyre::Result<()> {
        Url::parse(&self.rpc_http_url).map_err(|e| eyre::eyre!("Invalid rpc_http_url: {}", e))?;
        if self.poll_interval_ms == 0 {
            return Err(eyre::eyre!("poll_interval_ms must be greater than zero"));
        }
        if self.progress_tick_ms == 0 {
            return Err(eyre::eyre!("progress_tick_ms must be greater than zero"));
        }
        Ok(())
    }

    pub fn rpc_url(&self) -> eyre::Result<Url> {
        Url::parse(&self.rpc_http_url).map_err(|e| eyre::eyre!("Invalid rpc_http_url: {}", e))
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn progress_tick(&self) -> Duration {
        Duration::from_millis(self.progress_tick_ms)
    }

    pub fn confirmation_timeout(&self) -> Option<Duration> {
        self.confirmation_timeout_secs.map(Duration::from_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::config_loader::parse_config;

    #[test]
    fn test_default_config() {
        let config = ExecutorConfig::default();
        assert_eq!(config.rpc_http_url, "http://127.0.0.1:8545");
        assert_eq!(config.chain_id, 1);
        assert_eq!(config.confirmations.for_method("contribute"), 1);
        assert_eq!(config.confirmations.for_method("joinDAO"), 2);
        assert!(config.confirmation_timeout().is_none());
    }

    #[test]
    fn test_durations() {
        let config = ExecutorConfig::default();
        assert_eq!(config.poll_interval(), Duration::from_secs(2));
        assert_eq!(config.progress_tick(), Duration::from_secs(1));
    }

    #[test]
    fn test_from_lookup() {
        let vars = HashMap::from([
            ("RPC_HTTP_URL", "https://rpc.example.org"),
            ("CHAIN_ID", "11155111"),
            ("CORE_ADDRESS", "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266"),
            ("DEFAULT_CONFIRMATIONS", "3"),
            ("CONFIRMATION_TIMEOUT_SECS", "120"),
        ]);
        let config = ExecutorConfig::from_lookup(|key| vars.get(key).map(|v| v.to_string())).unwrap();

        assert_eq!(config.rpc_http_url, "https://rpc.example.org");
        assert_eq!(config.chain_id, 11155111);
        assert!(!config.core_address.is_zero());
        assert_eq!(config.confirmations.for_method("endClaim"), 3);
        assert_eq!(config.confirmation_timeout(), Some(Duration::from_secs(120)));
    }

    #[test]
    fn test_from_lookup_rejects_garbage() {
        assert!(ExecutorConfig::from_lookup(|key| (key == "RPC_HTTP_URL").then(|| "not a url".to_string())).is_err());
        assert!(ExecutorConfig::from_lookup(|key| (key == "CHAIN_ID").then(|| "mainnet".to_string())).is_err());
        assert!(ExecutorConfig::from_lookup(|key| (key == "POLL_INTERVAL_MS").then(|| "0".to_string())).is_err());
    }

    #[test]
    fn test_toml_section() {
        let raw = r#"
            [executor]
            rpc_http_url = "https://rpc.example.org"
            core_address = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266"
            poll_interval_ms = 500

            [executor.confirmations]
            default = 0
            per_method = { joinDAO = 2, submitProposal = 3 }
        "#;
        let mut table: toml::Table = parse_config(raw).unwrap();
        let config: ExecutorConfig = table.remove(ExecutorConfig::SECTION).unwrap().try_into().unwrap();

        assert_eq!(config.poll_interval(), Duration::from_millis(500));
        assert_eq!(config.progress_tick_ms, 1_000);
        assert_eq!(config.confirmations.for_method("submitProposal"), 3);
        assert_eq!(config.confirmations.for_method("contribute"), 0);
    }

    #[tokio::test]
    async fn test_from_file() {
        let path = std::env::temp_dir().join(format!("jobsecure-executor-{}.toml", std::process::id()));
        std::fs::write(
            &path,
            "[executor]\nchain_id = 31337\nprogress_tick_ms = 100\nconfirmation_timeout_secs = 30\n",
        )
        .unwrap();
        let file_name = path.to_str().unwrap();

        let config = ExecutorConfig::from_file(file_name).unwrap();
        assert_eq!(config.chain_id, 31337);
        assert_eq!(config.progress_tick(), Duration::from_millis(100));
        assert_eq!(config.confirmation_timeout(), Some(Duration::from_secs(30)));

        let loaded = ExecutorConfig::load_section_from_file(file_name).await.unwrap();
        assert_eq!(loaded.chain_id, 31337);

        std::fs::remove_file(&path).unwrap();
        assert!(matches!(
            ExecutorConfig::from_file(file_name),
            Err(LoadConfigError::IoError(_))
        ));
    }
}
