//! Configuration loading from TOML.
//!
//! Reads `config.toml` and deserializes into strongly-typed structs, then
//! maps the sections onto the sizer and replay configs.

use anyhow::{Context, Result};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::fs;

use crate::backtest::runner::BacktestConfig;
use crate::strategy::SizerConfig;
use crate::types::SizerError;

/// Top-level application configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub agent: AgentConfig,
    pub sizer: SizerSection,
    pub backtest: BacktestSection,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AgentConfig {
    pub name: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SizerSection {
    /// Lots per stake unit.
    pub unit_lot: Decimal,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BacktestSection {
    pub outcomes_file: String,
    #[serde(default = "default_initial_balance")]
    pub initial_balance: Decimal,
    pub take_profit: Decimal,
    pub stop_loss: Decimal,
    /// Write the JSON report here if set.
    #[serde(default)]
    pub report_path: Option<String>,
}

fn default_initial_balance() -> Decimal {
    BacktestConfig::default().initial_balance
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {path}"))?;
        let config = Self::parse(&contents)
            .with_context(|| format!("Failed to parse config file: {path}"))?;
        Ok(config)
    }

    /// Parse and validate configuration from TOML text.
    pub fn parse(contents: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the sizer cannot work with.
    pub fn validate(&self) -> Result<(), SizerError> {
        if self.sizer.unit_lot <= Decimal::ZERO {
            return Err(SizerError::Config(format!(
                "sizer.unit_lot must be positive, got {}",
                self.sizer.unit_lot
            )));
        }
        if self.backtest.take_profit < Decimal::ZERO || self.backtest.stop_loss < Decimal::ZERO {
            return Err(SizerError::Config(
                "backtest.take_profit and backtest.stop_loss must not be negative".into(),
            ));
        }
        if self.backtest.initial_balance <= Decimal::ZERO {
            return Err(SizerError::Config(format!(
                "backtest.initial_balance must be positive, got {}",
                self.backtest.initial_balance
            )));
        }
        Ok(())
    }

    pub fn sizer_config(&self) -> SizerConfig {
        SizerConfig {
            unit_lot: self.sizer.unit_lot,
        }
    }

    pub fn backtest_config(&self) -> BacktestConfig {
        BacktestConfig {
            initial_balance: self.backtest.initial_balance,
            take_profit: self.backtest.take_profit,
            stop_loss: self.backtest.stop_loss,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    const SAMPLE: &str = r#"
[agent]
name = "DMC-TEST"

[sizer]
unit_lot = 0.01

[backtest]
outcomes_file = "outcomes.txt"
initial_balance = 10000.0
take_profit = 25.0
stop_loss = 25.0
"#;

    #[test]
    fn test_parse_sample() {
        let cfg = AppConfig::parse(SAMPLE).unwrap();
        assert_eq!(cfg.agent.name, "DMC-TEST");
        assert_eq!(cfg.sizer.unit_lot, dec!(0.01));
        assert_eq!(cfg.backtest.outcomes_file, "outcomes.txt");
        assert!(cfg.backtest.report_path.is_none());
        assert_eq!(cfg.backtest_config().take_profit, dec!(25));
        assert_eq!(cfg.sizer_config().unit_lot, dec!(0.01));
    }

    #[test]
    fn test_initial_balance_defaults_when_omitted() {
        let minimal = r#"
[agent]
name = "DMC-001"

[sizer]
unit_lot = 0.01

[backtest]
outcomes_file = "outcomes.txt"
take_profit = 25.0
stop_loss = 25.0
# report_path = "report.json"
"#;
        let cfg = AppConfig::parse(minimal).unwrap();
        assert_eq!(cfg.backtest.initial_balance, dec!(10000));
        assert_eq!(
            cfg.backtest_config().initial_balance,
            BacktestConfig::default().initial_balance
        );
    }

    #[test]
    fn test_zero_unit_lot_rejected() {
        let bad = SAMPLE.replace("unit_lot = 0.01", "unit_lot = 0.0");
        let err = AppConfig::parse(&bad).unwrap_err();
        assert!(err.to_string().contains("unit_lot"));
    }

    #[test]
    fn test_negative_stop_loss_rejected() {
        let bad = SAMPLE.replace("stop_loss = 25.0", "stop_loss = -1.0");
        assert!(AppConfig::parse(&bad).is_err());
    }

    #[test]
    fn test_missing_section_rejected() {
        assert!(AppConfig::parse("[agent]\nname = \"x\"\n").is_err());
    }

    #[test]
    fn test_load_from_file() {
        let mut path = std::env::temp_dir();
        path.push(format!("decomp_sizer_config_{}.toml", uuid::Uuid::new_v4()));
        let with_report = format!("{SAMPLE}report_path = \"out.json\"\n");
        fs::write(&path, with_report).unwrap();

        let cfg = AppConfig::load(path.to_str().unwrap()).unwrap();
        assert_eq!(cfg.backtest.report_path.as_deref(), Some("out.json"));

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_load_missing_file() {
        let err = AppConfig::load("/nonexistent/config.toml").unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }
}
