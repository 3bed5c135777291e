//! Configuration module for wscope-server.
//!
//! Handles loading configuration from an optional TOML file, then applying
//! CLI arguments and environment variables on top of it.

pub mod file;

use crate::config::file::FileConfig;
use clap::Args;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use url::Url;
use wscope_core::config::{AiConfig, CoreConfig, SnapshotLimits, UpstreamConfig};
use wscope_sdk::objects::Chain;

const MAX_TRANSFER_LIMIT: usize = 50;

/// Errors that can occur during configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("invalid URL for {field}: {source}")]
    InvalidUrl {
        field: &'static str,
        source: url::ParseError,
    },

    #[error("validation error: {0}")]
    ValidationError(String),
}

/// Settings that override the config file, from flags or the environment.
#[derive(Args, Debug, Clone, Default)]
pub struct Overrides {
    /// Override the listen address (e.g., 0.0.0.0:3000)
    #[arg(short, long, env = "WSCOPE_LISTEN")]
    pub listen: Option<SocketAddr>,

    /// Override only the listen port
    #[arg(long, env = "PORT")]
    pub port: Option<u16>,

    /// Comma separated list of chains to serve (default: all)
    #[arg(long, env = "WSCOPE_CHAINS")]
    pub chains: Option<String>,

    /// Number of recent transfers per snapshot
    #[arg(long, env = "WSCOPE_TRANSFER_LIMIT")]
    pub transfer_limit: Option<usize>,

    /// Concurrent detail lookups per snapshot
    #[arg(long, env = "WSCOPE_FANOUT_LIMIT")]
    pub fan_out_limit: Option<usize>,

    /// Upstream request timeout in seconds
    #[arg(long, env = "WSCOPE_UPSTREAM_TIMEOUT")]
    pub upstream_timeout: Option<u64>,

    /// Directory of the built dashboard to serve at `/`
    #[arg(long, env = "WSCOPE_STATIC_DIR")]
    pub static_dir: Option<PathBuf>,

    #[arg(long, env = "ETHERSCAN_API_KEY", hide_env_values = true)]
    pub etherscan_api_key: Option<String>,

    #[arg(long, env = "ETHERSCAN_API_URL")]
    pub etherscan_api_url: Option<String>,

    #[arg(long, env = "TRON_API_KEY", hide_env_values = true)]
    pub tron_api_key: Option<String>,

    #[arg(long, env = "TRONSCAN_ACCOUNT_URL")]
    pub tronscan_account_url: Option<String>,

    #[arg(long, env = "TRONSCAN_API_URL")]
    pub tronscan_api_url: Option<String>,

    #[arg(long, env = "BLOCKCHAIN_INFO_URL")]
    pub blockchain_info_url: Option<String>,

    #[arg(long, env = "BLOCKCYPHER_URL")]
    pub blockcypher_url: Option<String>,

    #[arg(long, env = "SOLANA_RPC_URL")]
    pub solana_rpc_url: Option<String>,

    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    pub gemini_api_key: Option<String>,

    #[arg(long, env = "GEMINI_MODEL")]
    pub gemini_model: Option<String>,

    #[arg(long, env = "GEMINI_API_URL")]
    pub gemini_api_url: Option<String>,
}

/// Server-only settings.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub listen: SocketAddr,
    pub static_dir: Option<PathBuf>,
}

/// Loaded configuration result containing all parts.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub server: ServerConfig,
    pub core: CoreConfig,
}

/// Configuration loader that handles the complete loading process.
pub struct ConfigLoader {
    config_path: PathBuf,
    overrides: Overrides,
}

impl ConfigLoader {
    /// Create a new config loader.
    pub fn new(config_path: impl AsRef<Path>, overrides: Overrides) -> Self {
        Self {
            config_path: config_path.as_ref().to_path_buf(),
            overrides,
        }
    }

    /// Load and process the configuration.
    ///
    /// This will:
    /// 1. Read the TOML file, if there is one
    /// 2. Apply CLI / environment overrides
    /// 3. Validate and build the runtime configuration
    pub fn load(&self) -> Result<LoadedConfig, ConfigError> {
        let mut file_config = self.read_file()?;
        self.apply_overrides(&mut file_config)?;
        build_loaded_config(file_config)
    }

    fn read_file(&self) -> Result<FileConfig, ConfigError> {
        match std::fs::read_to_string(&self.config_path) {
            Ok(content) => {
                tracing::info!(path = ?self.config_path, "Configuration file loaded");
                Ok(toml::from_str(&content)?)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = ?self.config_path, "No configuration file, using defaults");
                Ok(FileConfig::default())
            }
            Err(e) => Err(e.into()),
        }
    }

    fn apply_overrides(&self, config: &mut FileConfig) -> Result<(), ConfigError> {
        let o = self.overrides.clone();

        if let Some(listen) = o.listen {
            config.server.listen = listen;
        }
        if let Some(port) = o.port {
            config.server.listen.set_port(port);
        }
        if let Some(dir) = o.static_dir {
            config.server.static_dir = Some(dir);
        }
        if let Some(chains) = o.chains {
            config.chains.enabled = Some(parse_chain_list(&chains)?);
        }
        if let Some(limit) = o.transfer_limit {
            config.chains.transfer_limit = limit;
        }
        if let Some(limit) = o.fan_out_limit {
            config.chains.fan_out_limit = limit;
        }
        if let Some(secs) = o.upstream_timeout {
            config.chains.upstream_timeout_secs = secs;
        }

        let upstreams = &mut config.upstreams;
        override_secret(&mut upstreams.etherscan_api_key, o.etherscan_api_key);
        override_secret(&mut upstreams.tron_api_key, o.tron_api_key);
        override_value(&mut upstreams.etherscan_url, o.etherscan_api_url);
        override_value(&mut upstreams.tronscan_account_url, o.tronscan_account_url);
        override_value(&mut upstreams.tronscan_api_url, o.tronscan_api_url);
        override_value(&mut upstreams.blockchain_info_url, o.blockchain_info_url);
        override_value(&mut upstreams.blockcypher_url, o.blockcypher_url);
        override_value(&mut upstreams.solana_rpc_url, o.solana_rpc_url);

        override_secret(&mut config.ai.api_key, o.gemini_api_key);
        override_value(&mut config.ai.model, o.gemini_model);
        override_value(&mut config.ai.base_url, o.gemini_api_url);

        Ok(())
    }
}

/// Blank values (e.g. `ETHERSCAN_API_KEY=`) leave the current value alone.
fn override_value(target: &mut String, value: Option<String>) {
    if let Some(value) = value.filter(|v| !v.trim().is_empty()) {
        *target = value.trim().to_string();
    }
}

fn override_secret(target: &mut Option<String>, value: Option<String>) {
    if let Some(value) = value.filter(|v| !v.trim().is_empty()) {
        *target = Some(value.trim().to_string());
    }
}

fn parse_chain_list(list: &str) -> Result<Vec<Chain>, ConfigError> {
    list.split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(|name| {
            name.parse::<Chain>()
                .map_err(|e| ConfigError::ValidationError(e.to_string()))
        })
        .collect()
}

fn parse_url(field: &'static str, value: &str) -> Result<Url, ConfigError> {
    Url::parse(value).map_err(|source| ConfigError::InvalidUrl { field, source })
}

fn validate(config: &FileConfig) -> Result<(), ConfigError> {
    let chains = &config.chains;
    if !(1..=MAX_TRANSFER_LIMIT).contains(&chains.transfer_limit) {
        return Err(ConfigError::ValidationError(format!(
            "transfer_limit must be between 1 and {MAX_TRANSFER_LIMIT}, got {}",
            chains.transfer_limit
        )));
    }
    if chains.fan_out_limit == 0 {
        return Err(ConfigError::ValidationError(
            "fan_out_limit must be at least 1".to_string(),
        ));
    }
    if chains.upstream_timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "upstream_timeout_secs must be at least 1".to_string(),
        ));
    }
    if chains.enabled.as_ref().is_some_and(Vec::is_empty) {
        return Err(ConfigError::ValidationError(
            "at least one chain must be enabled".to_string(),
        ));
    }
    if config.ai.model.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "ai model must not be empty".to_string(),
        ));
    }
    Ok(())
}

fn build_loaded_config(file_config: FileConfig) -> Result<LoadedConfig, ConfigError> {
    validate(&file_config)?;

    let FileConfig {
        server,
        chains,
        upstreams,
        ai,
    } = file_config;

    let mut enabled_chains = chains.enabled.unwrap_or_else(|| Chain::ALL.to_vec());
    enabled_chains.sort();
    enabled_chains.dedup();

    let upstream = UpstreamConfig {
        etherscan_url: parse_url("etherscan_url", &upstreams.etherscan_url)?,
        etherscan_api_key: non_blank(upstreams.etherscan_api_key),
        tronscan_account_url: parse_url("tronscan_account_url", &upstreams.tronscan_account_url)?,
        tronscan_api_url: parse_url("tronscan_api_url", &upstreams.tronscan_api_url)?,
        tron_api_key: non_blank(upstreams.tron_api_key),
        blockchain_info_url: parse_url("blockchain_info_url", &upstreams.blockchain_info_url)?,
        blockcypher_url: parse_url("blockcypher_url", &upstreams.blockcypher_url)?,
        solana_rpc_url: parse_url("solana_rpc_url", &upstreams.solana_rpc_url)?,
    };

    let ai = AiConfig {
        api_key: non_blank(ai.api_key),
        model: ai.model.trim().to_string(),
        base_url: parse_url("ai.base_url", &ai.base_url)?,
    };

    Ok(LoadedConfig {
        server: ServerConfig {
            listen: server.listen,
            static_dir: server.static_dir,
        },
        core: CoreConfig {
            upstream,
            ai,
            limits: SnapshotLimits {
                transfer_limit: chains.transfer_limit,
                fan_out_limit: chains.fan_out_limit,
            },
            enabled_chains,
            upstream_timeout: Duration::from_secs(chains.upstream_timeout_secs),
        },
    })
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
