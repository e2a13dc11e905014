use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;
use std::fs;
use crate::error::{Error, Result};

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub feed: FeedConfig,
    #[serde(default)]
    pub jupiter: JupiterConfig,
    #[serde(default)]
    pub solana: SolanaConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub pinata: PinataConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct FeedConfig {
    pub stream_url: String,
    /// Partner config keys used to filter both the stream and the initial fetch.
    pub partner_configs: Vec<String>,
    /// Token pinned to the top of the graduated list.
    pub priority_token: Option<String>,
    pub reconnect_delay_secs: u64,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            stream_url: "wss://trench-stream.jup.ag/ws".to_string(),
            partner_configs: Vec::new(),
            priority_token: None,
            reconnect_delay_secs: 5,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct JupiterConfig {
    pub pools_url: String,
    pub gems_url: String,
    pub cache_ttl_secs: i64,
}

impl Default for JupiterConfig {
    fn default() -> Self {
        Self {
            pools_url: "https://datapi.jup.ag/v1/pools".to_string(),
            gems_url: "https://datapi.jup.ag/v1/pools/gems".to_string(),
            cache_ttl_secs: 15,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct SolanaConfig {
    pub rpc_url: Option<String>,
    pub confirm_timeout_secs: u64,
}

impl Default for SolanaConfig {
    fn default() -> Self {
        Self {
            rpc_url: None,
            confirm_timeout_secs: 60,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: Option<String>,
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            max_connections: 5,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct PinataConfig {
    pub api_url: String,
    pub gateway_url: String,
    pub platform: String,
    pub jwt: Option<String>,
    pub api_key: Option<String>,
    pub api_secret: Option<String>,
}

impl Default for PinataConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.pinata.cloud".to_string(),
            gateway_url: "https://ipfs.io/ipfs".to_string(),
            platform: "https://fairly.best".to_string(),
            jwt: None,
            api_key: None,
            api_secret: None,
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let config_str = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&config_str)?;
        Ok(config)
    }

    /// Applies overrides from the process environment (after `.env` is loaded).
    pub fn apply_env(&mut self) {
        self.apply_overrides(|key| env::var(key).ok());
    }

    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = get("RPC_URL") {
            self.solana.rpc_url = Some(url);
        }
        if let Some(key) = get("POOL_CONFIG_KEY") {
            self.feed.partner_configs = vec![key];
        }
        if let Some(token) = get("PRIORITY_TOKEN") {
            self.feed.priority_token = Some(token);
        }
        if let Some(url) = get("DATABASE_URL") {
            self.database.url = Some(url);
        }
        if let Some(jwt) = get("PINATA_JWT") {
            self.pinata.jwt = Some(jwt);
        }
        if let Some(key) = get("PINATA_API_KEY") {
            self.pinata.api_key = Some(key);
        }
        if let Some(secret) = get("PINATA_API_SECRET") {
            self.pinata.api_secret = Some(secret);
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.feed.partner_configs.iter().all(|k| k.trim().is_empty()) {
            return Err(Error::ConfigError(
                "a pool config key is required (feed.partner_configs or POOL_CONFIG_KEY)".to_string(),
            ));
        }
        if self.server.port == 0 {
            return Err(Error::ConfigError("server.port must be non-zero".to_string()));
        }
        Ok(())
    }
}
