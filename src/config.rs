// src/config.rs
use log::{info, warn};
use serde::{Serialize, Deserialize};
use std::env;
use std::fmt::Display;
use std::str::FromStr;

use crate::models::BasketType;
use crate::services::cash_flows::CashFlowModel;
use crate::services::risk::RiskModel;

/// Per-basket valuation assumptions, all in percent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BasketAssumptions {
    pub discount_rate: f64,
    pub hurdle_rate: f64,
    pub expected_growth: f64,
}

impl BasketAssumptions {
    pub fn defaults(basket: BasketType) -> Self {
        match basket {
            BasketType::Bitcoin => BasketAssumptions { discount_rate: 15.0, hurdle_rate: 15.0, expected_growth: 20.0 },
            BasketType::BlueChip => BasketAssumptions { discount_rate: 20.0, hurdle_rate: 20.0, expected_growth: 25.0 },
            BasketType::SmallCap => BasketAssumptions { discount_rate: 30.0, hurdle_rate: 30.0, expected_growth: 35.0 },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    pub risk_model: RiskModel,
    pub cash_flow_model: CashFlowModel,
    pub default_risk_free_rate: f64,
    pub fed_rate_sensitivity: f64,
    pub monte_carlo_paths: u32,
    pub monte_carlo_seed: u64,
    /// Sampling frequency of incoming price series, used to annualize volatility.
    pub periods_per_year: f64,
    pub bitcoin: BasketAssumptions,
    pub blue_chip: BasketAssumptions,
    pub small_cap: BasketAssumptions,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            risk_model: RiskModel::Basic,
            cash_flow_model: CashFlowModel::Compounding,
            default_risk_free_rate: 3.0,
            fed_rate_sensitivity: 1.0,
            monte_carlo_paths: 1_000,
            monte_carlo_seed: 42,
            periods_per_year: 365.0,
            bitcoin: BasketAssumptions::defaults(BasketType::Bitcoin),
            blue_chip: BasketAssumptions::defaults(BasketType::BlueChip),
            small_cap: BasketAssumptions::defaults(BasketType::SmallCap),
        }
    }
}

impl EngineConfig {
    /// Read configuration from the environment (after `dotenv`), falling back
    /// to defaults for anything missing or malformed.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = EngineConfig::default();

        let basket = |basket: BasketType| {
            let fallback = BasketAssumptions::defaults(basket);
            let prefix = basket.env_prefix();
            BasketAssumptions {
                discount_rate: parse_or(&lookup, &format!("{}_DISCOUNT_RATE", prefix), fallback.discount_rate),
                hurdle_rate: parse_or(&lookup, &format!("{}_HURDLE_RATE", prefix), fallback.hurdle_rate),
                expected_growth: parse_or(&lookup, &format!("{}_EXPECTED_GROWTH", prefix), fallback.expected_growth),
            }
        };

        let config = EngineConfig {
            risk_model: parse_or(&lookup, "RISK_MODEL", defaults.risk_model),
            cash_flow_model: parse_or(&lookup, "CASH_FLOW_MODEL", defaults.cash_flow_model),
            default_risk_free_rate: parse_or(&lookup, "DEFAULT_RISK_FREE_RATE", defaults.default_risk_free_rate)
                .clamp(2.0, 4.0),
            fed_rate_sensitivity: parse_or(&lookup, "FED_RATE_SENSITIVITY", defaults.fed_rate_sensitivity),
            monte_carlo_paths: parse_or(&lookup, "MONTE_CARLO_PATHS", defaults.monte_carlo_paths),
            monte_carlo_seed: parse_or(&lookup, "MONTE_CARLO_SEED", defaults.monte_carlo_seed),
            periods_per_year: parse_or(&lookup, "PERIODS_PER_YEAR", defaults.periods_per_year),
            bitcoin: basket(BasketType::Bitcoin),
            blue_chip: basket(BasketType::BlueChip),
            small_cap: basket(BasketType::SmallCap),
        };

        info!(
            "Engine config: risk model {:?}, cash flow model {:?}, {} Monte Carlo paths",
            config.risk_model, config.cash_flow_model, config.monte_carlo_paths
        );
        config
    }

    pub fn assumptions(&self, basket: BasketType) -> BasketAssumptions {
        match basket {
            BasketType::Bitcoin => self.bitcoin,
            BasketType::BlueChip => self.blue_chip,
            BasketType::SmallCap => self.small_cap,
        }
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: Display,
{
    match lookup(key) {
        Some(raw) => match raw.trim().parse::<T>() {
            Ok(value) => value,
            Err(e) => {
                warn!("Ignoring malformed {}={:?}: {}", key, raw, e);
                default
            }
        },
        None => default,
    }
}
