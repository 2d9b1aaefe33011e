//! Application configuration management.

use std::collections::BTreeMap;

use config::{Config, ConfigBuilder, Environment, File, FileFormat, builder::DefaultState};
use serde::Deserialize;

use crate::types::{AccountId, BookId};

/// Environment variable prefix (`HOMELEDGER__SERVER__PORT=9000`).
pub const ENV_PREFIX: &str = "HOMELEDGER";

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration.
    pub server: ServerConfig,
    /// Ledger engine configuration.
    pub ledger: LedgerConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Per-request timeout in seconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_request_timeout() -> u64 {
    30
}

/// Ledger engine configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LedgerConfig {
    /// Book served by this process.
    pub book_id: BookId,
    /// Seeded chart of accounts.
    #[serde(default)]
    pub chart: Vec<AccountSeed>,
    /// Suspense accounts for reconciliation differences.
    pub suspense: SuspenseConfig,
    /// Accounts used by depreciation accruals.
    pub depreciation: DepreciationConfig,
    /// Conversion allow-list: entry type to the entry types it may become.
    #[serde(default)]
    pub conversions: BTreeMap<String, Vec<String>>,
    /// Attempts made by a reconciliation snapshot before giving up.
    #[serde(default = "default_max_retries")]
    pub reconciliation_max_retries: u32,
}

fn default_max_retries() -> u32 {
    3
}

/// One account of the seeded chart.
#[derive(Debug, Clone, Deserialize)]
pub struct AccountSeed {
    /// Account identifier.
    pub id: AccountId,
    /// Human code (e.g. `1001-01`).
    pub code: String,
    /// Display name.
    pub name: String,
    /// One of `asset`, `liability`, `equity`, `income`, `expense`.
    #[serde(rename = "type")]
    pub account_type: String,
    /// Overrides the normal side implied by the type.
    #[serde(default)]
    pub normal_side: Option<String>,
    /// Parent account.
    #[serde(default)]
    pub parent: Option<AccountId>,
    /// Fixed-asset class whose purchases create depreciable assets.
    #[serde(default)]
    pub depreciable: bool,
    /// Inactive accounts reject postings.
    #[serde(default = "default_true")]
    pub active: bool,
}

fn default_true() -> bool {
    true
}

/// Suspense accounts.
#[derive(Debug, Clone, Deserialize)]
pub struct SuspenseConfig {
    /// Receives credit-side reconciliation differences.
    pub unclassified_income: AccountId,
    /// Receives debit-side reconciliation differences.
    pub unclassified_expense: AccountId,
}

/// Depreciation posting accounts.
#[derive(Debug, Clone, Deserialize)]
pub struct DepreciationConfig {
    /// Depreciation expense account (debited).
    pub expense: AccountId,
    /// Accumulated depreciation contra-asset (credited).
    pub accumulated: AccountId,
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        Self::with_env(
            Config::builder()
                .add_source(File::with_name("config/default").required(false))
                .add_source(File::with_name(&format!("config/{run_mode}")).required(false)),
        )
    }

    /// Loads configuration from a TOML document, with environment overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the document is invalid or incomplete.
    pub fn from_toml(toml: &str) -> Result<Self, config::ConfigError> {
        Self::with_env(Config::builder().add_source(File::from_str(toml, FileFormat::Toml)))
    }

    fn with_env(builder: ConfigBuilder<DefaultState>) -> Result<Self, config::ConfigError> {
        builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }
}
