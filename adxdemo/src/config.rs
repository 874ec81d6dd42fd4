//! Application configuration management.
//!
//! This module handles loading and merging configuration from multiple sources
//! with a clear precedence order. Configuration can come from default values,
//! configuration files, and environment variables.

use crate::{Cli, schedule::Scheduler};
use adx_core::models::{Address, ContentId, ItemKind};
use serde::{Deserialize, Serialize};

/// The main application configuration that composes all component configs
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct AppConfig {
    /// Web server configuration (bind address, CORS)
    #[serde(default)]
    pub server: adx_axum::config::AxumConfig,

    /// Exchange configuration (custody account, refund keeper)
    #[serde(default)]
    pub exchange: ExchangeConfig,

    /// Periodic refunding of timed-out bids
    #[serde(default)]
    pub sweeper: Scheduler,

    /// Accounts, items and balances to create at startup
    #[serde(default)]
    pub seed: SeedConfig,
}

/// Exchange configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ExchangeConfig {
    /// The ledger account holding escrow
    #[serde(default = "default_custody")]
    pub custody: Address,

    /// The account the sweeper refunds bids as (defaults to the custody account)
    #[serde(default)]
    pub keeper: Option<Address>,

    /// How many notifications a slow event subscriber may fall behind
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,
}

fn default_custody() -> Address {
    Address([0xad; 20])
}

fn default_event_capacity() -> usize {
    adx_exchange::DEFAULT_EVENT_CAPACITY
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        Self {
            custody: default_custody(),
            keeper: None,
            event_capacity: default_event_capacity(),
        }
    }
}

impl ExchangeConfig {
    /// The account the sweeper acts as
    pub fn keeper(&self) -> Address {
        self.keeper.unwrap_or(self.custody)
    }
}

/// Initial state of the in-memory registry and ledger
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct SeedConfig {
    /// Accounts to register
    #[serde(default)]
    pub accounts: Vec<SeedAccount>,

    /// Items to create, in order; each receives the next id of its kind
    #[serde(default)]
    pub items: Vec<SeedItem>,

    /// Balances to mint
    #[serde(default)]
    pub balances: Vec<SeedBalance>,
}

/// An account to register at startup
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SeedAccount {
    /// The account
    pub address: Address,
    /// Display name
    #[serde(default)]
    pub name: String,
    /// Payout wallet (defaults to the account itself)
    #[serde(default)]
    pub wallet: Option<Address>,
}

/// An item to create at startup
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SeedItem {
    /// The owning account, which must be seeded too
    pub owner: Address,
    /// Ad unit or ad slot
    pub kind: ItemKind,
    /// Content id of the item's description
    pub ipfs: ContentId,
    /// Display name
    #[serde(default)]
    pub name: String,
}

/// A balance to mint at startup
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SeedBalance {
    /// The credited account
    pub address: Address,
    /// How much to mint (config files carry 64-bit integers)
    pub amount: u64,
    /// Also let the custody account pull this much
    #[serde(default)]
    pub approve: bool,
}

impl AppConfig {
    /// Load configuration from multiple sources with precedence:
    /// 1. Environment variables (highest priority)
    /// 2. Config file given by the CLI
    /// 3. Default values (lowest priority)
    ///
    /// Environment variables are mapped using the pattern:
    /// `APP_<SECTION>__<KEY>` maps to `<section>.<key>`
    ///
    /// # Examples
    ///
    /// ```bash
    /// # Set server bind address
    /// export APP_SERVER__BIND_ADDRESS="0.0.0.0:3000"
    ///
    /// # Refund timed-out bids every minute
    /// export APP_SWEEPER__EVERY="1m"
    /// ```
    pub fn load(cli: &Cli) -> anyhow::Result<Self> {
        let mut config = config::Config::builder();

        // Start with default values
        config = config.add_source(config::Config::try_from(&Self::default())?);

        // Layer on config file if it is specified and exists
        if let Some(path) = &cli.config {
            if path.exists() {
                config = config.add_source(config::File::from(path.as_path()))
            } else {
                return Err(anyhow::anyhow!(
                    "Config file {} does not exist",
                    path.display()
                ));
            }
        }

        // This maps APP_SERVER__BIND_ADDRESS to server.bind_address
        config = config.add_source(
            config::Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let built_config = config.build()?;
        built_config.try_deserialize().map_err(Into::into)
    }
}
