use serde::{Deserialize, Serialize};

use crate::router::TOKEN_BACKEND_PREFIX;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub router: RouterConfig,
    pub metrics: MetricsConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RouterConfig {
    /// Requests under this prefix keep their raw client token.
    pub token_backend_prefix: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    pub enabled: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    pub filter: String,
    pub json: bool,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self { token_backend_prefix: TOKEN_BACKEND_PREFIX.to_string() }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { filter: "vault_router=debug,info".to_string(), json: false }
    }
}

impl Config {
    /// Load from an optional `vault-router.{toml,yaml,json}` file, then
    /// `VAULT_ROUTER_*` environment variables (`__` separates sections).
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from("vault-router")
    }

    pub fn load_from(file: &str) -> anyhow::Result<Self> {
        let config = config::Config::builder()
            .add_source(config::File::with_name(file).required(false))
            .add_source(
                config::Environment::with_prefix("VAULT_ROUTER")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        let config: Self = config.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        self.router.validate()
    }
}

impl RouterConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        let prefix = &self.token_backend_prefix;
        if prefix.is_empty() {
            anyhow::bail!("router.token_backend_prefix must not be empty");
        }
        if !prefix.ends_with('/') {
            anyhow::bail!("router.token_backend_prefix must end with '/': {}", prefix);
        }
        Ok(())
    }
}
