//! Configuration loading for the Homestead session.
//!
//! The canonical configuration lives in `homestead-config.yaml`. Every
//! section and field has a default, so an empty file is a valid config.

use std::path::Path;

use rust_decimal::Decimal;
use serde::Deserialize;

use homestead_farm::PlotPricing;
use homestead_types::ToolId;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// A value parsed but is out of range.
    #[error("invalid configuration: {reason}")]
    Invalid {
        /// What is wrong.
        reason: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level configuration. Mirrors `homestead-config.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct HomesteadConfig {
    /// New-player settings.
    #[serde(default)]
    pub player: PlayerConfig,

    /// Shop pricing.
    #[serde(default)]
    pub economy: EconomyConfig,

    /// Periodic reconciliation.
    #[serde(default)]
    pub reconcile: ReconcileConfig,

    /// Connection strings.
    #[serde(default)]
    pub infrastructure: InfrastructureConfig,

    /// Logging.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl HomesteadConfig {
    /// Load configuration from a YAML file.
    ///
    /// `DATABASE_URL` overrides `infrastructure.postgres_url`.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let mut config: Self = if yaml.trim().is_empty() {
            Self::default()
        } else {
            serde_yml::from_str(yaml)?
        };
        config.infrastructure.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Reject values that parse but make no sense.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.player.starting_money.is_sign_negative() {
            return Err(ConfigError::Invalid {
                reason: "player.starting_money must not be negative".to_owned(),
            });
        }
        if self.economy.plot_base_price.is_sign_negative()
            || self.economy.plot_price_step.is_sign_negative()
        {
            return Err(ConfigError::Invalid {
                reason: "plot prices must not be negative".to_owned(),
            });
        }
        if self.reconcile.tick_interval_ms == 0 {
            return Err(ConfigError::Invalid {
                reason: "reconcile.tick_interval_ms must be at least 1".to_owned(),
            });
        }
        Ok(())
    }

    /// Plot pricing from the economy section.
    pub const fn plot_pricing(&self) -> PlotPricing {
        PlotPricing {
            base: self.economy.plot_base_price,
            step: self.economy.plot_price_step,
        }
    }
}

/// New-player settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PlayerConfig {
    /// Money on the first run.
    #[serde(default = "default_starting_money")]
    pub starting_money: Decimal,

    /// Tools owned and equipped on the first run.
    #[serde(default = "default_starter_tools")]
    pub starter_tools: Vec<ToolId>,

    /// Plots owned on the first run.
    #[serde(default = "default_starter_plots")]
    pub starter_plots: u32,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            starting_money: default_starting_money(),
            starter_tools: default_starter_tools(),
            starter_plots: default_starter_plots(),
        }
    }
}

/// Shop pricing.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EconomyConfig {
    /// Price of a plot when none are owned.
    #[serde(default = "default_plot_base_price")]
    pub plot_base_price: Decimal,

    /// Price increase per plot owned.
    #[serde(default = "default_plot_price_step")]
    pub plot_price_step: Decimal,
}

impl Default for EconomyConfig {
    fn default() -> Self {
        Self {
            plot_base_price: default_plot_base_price(),
            plot_price_step: default_plot_price_step(),
        }
    }
}

/// Periodic reconciliation.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ReconcileConfig {
    /// Real-time milliseconds between reconciliation passes.
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
        }
    }
}

/// Connection strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct InfrastructureConfig {
    /// `PostgreSQL` connection string. The in-memory store is used when
    /// unset.
    #[serde(default)]
    pub postgres_url: Option<String>,
}

impl InfrastructureConfig {
    /// Override connection strings with environment variables when set.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("DATABASE_URL") {
            self.postgres_url = Some(val);
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

// ---------------------------------------------------------------------------
// Default value functions
// ---------------------------------------------------------------------------

const fn default_starting_money() -> Decimal {
    Decimal::ONE_HUNDRED
}

fn default_starter_tools() -> Vec<ToolId> {
    vec![ToolId::new(201), ToolId::new(205)]
}

const fn default_starter_plots() -> u32 {
    1
}

const fn default_plot_base_price() -> Decimal {
    Decimal::ONE_HUNDRED
}

const fn default_plot_price_step() -> Decimal {
    Decimal::from_parts(50, 0, 0, false, 0)
}

const fn default_tick_interval_ms() -> u64 {
    1000
}

fn default_log_level() -> String {
    "info".to_owned()
}
