// src/services/cash_flows.rs
use serde::{Serialize, Deserialize};
use std::str::FromStr;

use crate::models::CashFlowSeries;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CashFlowModel {
    /// Staking rewards accrue in coins, compound into the balance and are
    /// realized each year at the interpolated price.
    #[default]
    Compounding,
    /// Deprecated: flat dollar staking reward paid out at the terminal year,
    /// no compounding and no intermediate realization.
    Flat,
}

impl FromStr for CashFlowModel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "compounding" => Ok(CashFlowModel::Compounding),
            "flat" => Ok(CashFlowModel::Flat),
            other => Err(format!("unknown cash flow model: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CashFlowProjection {
    pub model: CashFlowModel,
    pub flows: CashFlowSeries,
    pub initial_coins: f64,
    pub final_coins: f64,
}

/// Geometric interpolation between the current and expected price.
pub fn interpolated_price(current_price: f64, expected_price: f64, year: u32, horizon_years: u32) -> f64 {
    if current_price <= 0.0 || expected_price <= 0.0 || horizon_years == 0 {
        return 0.0;
    }
    let fraction = year as f64 / horizon_years as f64;
    current_price * (expected_price / current_price).powf(fraction)
}

/// Canonical (compounding) cash-flow series: `horizon_years + 1` entries,
/// the first being `-investment_amount`.
pub fn generate_cash_flows(
    investment_amount: f64,
    expected_price: f64,
    current_price: f64,
    horizon_years: u32,
    staking_yield_pct: f64,
) -> CashFlowSeries {
    project_cash_flows(
        investment_amount,
        expected_price,
        current_price,
        horizon_years,
        staking_yield_pct,
        CashFlowModel::Compounding,
    )
    .flows
}

pub fn project_cash_flows(
    investment_amount: f64,
    expected_price: f64,
    current_price: f64,
    horizon_years: u32,
    staking_yield_pct: f64,
    model: CashFlowModel,
) -> CashFlowProjection {
    let mut flows = Vec::with_capacity(horizon_years as usize + 1);
    flows.push(-investment_amount);

    let initial_coins = if current_price > 0.0 && investment_amount > 0.0 {
        investment_amount / current_price
    } else {
        0.0
    };
    let yield_fraction = staking_yield_pct.max(0.0) / 100.0;
    let terminal_price = expected_price.max(0.0);
    let mut coins = initial_coins;

    if horizon_years == 0 {
        return CashFlowProjection { model, flows, initial_coins, final_coins: coins };
    }

    match model {
        CashFlowModel::Compounding => {
            for year in 1..horizon_years {
                let reward = coins * yield_fraction;
                coins += reward;
                flows.push(reward * interpolated_price(current_price, expected_price, year, horizon_years));
            }
            flows.push(coins * terminal_price);
        }
        CashFlowModel::Flat => {
            for _ in 1..horizon_years {
                flows.push(0.0);
            }
            let staking_income = investment_amount.max(0.0) * yield_fraction * horizon_years as f64;
            flows.push(coins * terminal_price + staking_income);
        }
    }

    CashFlowProjection { model, flows, initial_coins, final_coins: coins }
}
