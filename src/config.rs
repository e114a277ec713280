// ⚙️ Configuration - economy constants and process settings
//
// Economy knobs live in an optional JSON file; process settings (database
// path, bind address) come from flags with environment fallbacks.

use crate::credit::DEFAULT_MIN_RATE;
use crate::interest::DEFAULT_PENALTY_RATIO;
use crate::pricing::MIN_STOCK_PRICE;
use crate::trading::DEFAULT_FEE_RATE;
use anyhow::{Context, Result};
use clap::Args;
use serde::{Deserialize, Serialize};
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

pub const DEFAULT_DB_PATH: &str = "vivaatown.db";
pub const DEFAULT_HTTP_BIND: &str = "0.0.0.0:3000";

// ============================================================================
// ECONOMY CONFIG
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EconomyConfig {
    /// Fraction of trade value charged on every buy and sell
    pub trading_fee_rate: f64,
    /// Floor for credit-adjusted savings rates, in percent
    pub min_interest_rate: f64,
    /// Share of remaining interest forfeited on early withdrawal
    pub early_withdrawal_penalty: f64,
    /// Prices never fall below this after a tick or news event
    pub min_stock_price: f64,
}

impl Default for EconomyConfig {
    fn default() -> Self {
        EconomyConfig {
            trading_fee_rate: DEFAULT_FEE_RATE,
            min_interest_rate: DEFAULT_MIN_RATE,
            early_withdrawal_penalty: DEFAULT_PENALTY_RATIO,
            min_stock_price: MIN_STOCK_PRICE,
        }
    }
}

impl EconomyConfig {
    /// Load from a JSON file; missing fields keep their defaults
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read economy config: {:?}", path.as_ref()))?;

        let config: EconomyConfig =
            serde_json::from_str(&content).context("Failed to parse economy config JSON")?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<()> {
        anyhow::ensure!(
            (0.0..1.0).contains(&self.trading_fee_rate),
            "tradingFeeRate must be in [0, 1), got {}",
            self.trading_fee_rate
        );
        anyhow::ensure!(
            self.min_interest_rate >= 0.0,
            "minInterestRate must be >= 0, got {}",
            self.min_interest_rate
        );
        anyhow::ensure!(
            (0.0..=1.0).contains(&self.early_withdrawal_penalty),
            "earlyWithdrawalPenalty must be in [0, 1], got {}",
            self.early_withdrawal_penalty
        );
        anyhow::ensure!(
            self.min_stock_price > 0.0,
            "minStockPrice must be > 0, got {}",
            self.min_stock_price
        );
        Ok(())
    }
}

// ============================================================================
// PROCESS SETTINGS
// ============================================================================

/// Flags shared by the CLI and the server
#[derive(Debug, Clone, Args)]
pub struct StorageArgs {
    /// SQLite database file
    #[arg(long = "db", env = "VIVAA_DB", default_value = DEFAULT_DB_PATH)]
    pub db_path: PathBuf,

    /// Optional JSON file with economy settings
    #[arg(long = "config", env = "VIVAA_CONFIG")]
    pub economy_config: Option<PathBuf>,
}

impl StorageArgs {
    pub fn economy(&self) -> Result<EconomyConfig> {
        EconomyConfig::load(self.economy_config.as_deref())
    }
}

#[derive(Debug, Clone, Args)]
pub struct ServerArgs {
    #[command(flatten)]
    pub storage: StorageArgs,

    /// Address the HTTP API listens on
    #[arg(long = "bind", env = "VIVAA_BIND", default_value = DEFAULT_HTTP_BIND)]
    pub bind: SocketAddr,
}
