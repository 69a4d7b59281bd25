// src/services/risk.rs
use serde::{Serialize, Deserialize};
use std::str::FromStr;
use log::debug;

use crate::models::{BasketType, SmartMoney};
use super::statistics::{covariance, variance};

pub const DEFAULT_VAR_CONFIDENCE: f64 = 0.95;
const NEUTRAL_BETA: f64 = 1.0;
const MIN_DISCOUNT_RATE: f64 = 0.5;
const MAX_DISCOUNT_RATE: f64 = 50.0;

/// Risk-scoring formula. Both are kept selectable instead of silently
/// picking one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskModel {
    /// Basket base score plus additive signal adjustments.
    #[default]
    Basic,
    /// Beta 40% / volatility 30% / basket 20% / fundamentals 10% blended into
    /// a 0-100 score, quantized, then adjusted by on-chain and macro signals.
    BetaWeighted,
}

impl FromStr for RiskModel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "basic" => Ok(RiskModel::Basic),
            "beta_weighted" | "betaweighted" => Ok(RiskModel::BetaWeighted),
            other => Err(format!("unknown risk model: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct RiskFactorInputs {
    pub basket: Option<BasketType>,
    /// Annualized volatility in percent; 0 means insufficient data.
    pub volatility: f64,
    pub fundamentals_score: Option<f64>,
    pub aviv_ratio: Option<f64>,
    pub active_supply_pct: Option<f64>,
    pub vaulted_supply_pct: Option<f64>,
    pub fed_rate_change: Option<f64>,
    pub smart_money: Option<SmartMoney>,
    pub beta: Option<f64>,
}

impl RiskFactorInputs {
    pub fn new(basket: BasketType, volatility: f64) -> Self {
        RiskFactorInputs { basket: Some(basket), volatility, ..Default::default() }
    }
}

/// Systematic risk against a benchmark. Neutral 1.0 when the series are
/// mismatched, too short or the benchmark does not move.
pub fn beta(asset_returns: &[f64], market_returns: &[f64]) -> f64 {
    if asset_returns.len() != market_returns.len() || asset_returns.len() < 2 {
        debug!(
            "Beta falls back to neutral: {} asset vs {} market returns",
            asset_returns.len(),
            market_returns.len()
        );
        return NEUTRAL_BETA;
    }
    let market_variance = variance(market_returns);
    if market_variance == 0.0 || !market_variance.is_finite() {
        return NEUTRAL_BETA;
    }
    covariance(asset_returns, market_returns) / market_variance
}

pub fn sharpe_ratio(portfolio_return: f64, risk_free_rate: f64, std_dev: f64) -> f64 {
    if std_dev == 0.0 {
        0.0
    } else {
        (portfolio_return - risk_free_rate) / std_dev
    }
}

/// Historical Value-at-Risk as a positive loss amount. The
/// `(1 - confidence)` quantile of `returns` is scaled by `portfolio_value`;
/// a quantile that is still a gain means no loss at that confidence.
pub fn value_at_risk(portfolio_value: f64, returns: &[f64], confidence: f64) -> f64 {
    if returns.is_empty() || portfolio_value <= 0.0 {
        return 0.0;
    }
    let mut sorted: Vec<f64> = returns.iter().copied().filter(|r| r.is_finite()).collect();
    if sorted.is_empty() {
        return 0.0;
    }
    sorted.sort_by(|a, b| a.total_cmp(b));

    let tail = (1.0 - confidence.clamp(0.0, 1.0)) * sorted.len() as f64;
    let index = (tail.floor() as usize).min(sorted.len() - 1);
    (-sorted[index]).max(0.0) * portfolio_value
}

/// Starting score per basket: smaller, newer assets start riskier.
pub fn base_risk(basket: BasketType) -> f64 {
    match basket {
        BasketType::Bitcoin => 3.0,
        BasketType::BlueChip => 4.0,
        BasketType::SmallCap => 5.0,
    }
}

/// Composite risk score, always an integer in 1..=5.
pub fn risk_factor(inputs: &RiskFactorInputs, model: RiskModel) -> u8 {
    let start = match model {
        RiskModel::Basic => basic_score(inputs),
        RiskModel::BetaWeighted => quantize(continuous_risk_score(inputs)),
    };
    let score = start + signal_adjustments(inputs);
    if !score.is_finite() {
        return 3;
    }
    score.clamp(1.0, 5.0).round() as u8
}

fn basket_or_default(inputs: &RiskFactorInputs) -> BasketType {
    inputs.basket.unwrap_or(BasketType::SmallCap)
}

fn basic_score(inputs: &RiskFactorInputs) -> f64 {
    let basket = basket_or_default(inputs);
    let mut score = base_risk(basket);

    if let Some(fundamentals) = inputs.fundamentals_score {
        match basket {
            BasketType::BlueChip if fundamentals > 8.0 => score -= 1.0,
            BasketType::SmallCap if fundamentals > 9.0 => score -= 1.0,
            BasketType::SmallCap if fundamentals < 5.0 => score += 1.0,
            _ => {}
        }
    }

    // Zero volatility is missing data, not calm markets
    if inputs.volatility > 80.0 {
        score += 1.0;
    } else if inputs.volatility > 0.0 && inputs.volatility < 30.0 {
        score -= 1.0;
    }

    score
}

// On-chain and macro adjustments shared by both models.
fn signal_adjustments(inputs: &RiskFactorInputs) -> f64 {
    let mut delta = 0.0;

    if basket_or_default(inputs) == BasketType::Bitcoin {
        if let Some(aviv) = inputs.aviv_ratio {
            if aviv > 2.5 {
                delta += 1.0;
            } else if aviv < 0.55 {
                delta -= 1.0;
            }
        }
    }

    if inputs.active_supply_pct.is_some_and(|active| active > 50.0) {
        delta += 1.0;
    }
    if inputs.vaulted_supply_pct.is_some_and(|vaulted| vaulted > 70.0) {
        delta -= 1.0;
    }
    if inputs.smart_money == Some(SmartMoney::Selling) {
        delta += 1.0;
    }

    if let Some(change) = inputs.fed_rate_change {
        if change > 0.0 {
            delta += 0.5;
        } else if change < 0.0 {
            delta -= 0.5;
        }
    }

    delta
}

/// Continuous 0-100 score used by [`RiskModel::BetaWeighted`].
pub fn continuous_risk_score(inputs: &RiskFactorInputs) -> f64 {
    let beta = inputs.beta.filter(|b| b.is_finite()).unwrap_or(NEUTRAL_BETA);
    let beta_component = (beta.abs() / 2.5).min(1.0) * 100.0;

    let volatility_component = if inputs.volatility.is_finite() && inputs.volatility > 0.0 {
        (inputs.volatility / 150.0).min(1.0) * 100.0
    } else {
        50.0
    };

    let basket_component = (base_risk(basket_or_default(inputs)) - 1.0) / 4.0 * 100.0;

    let fundamentals_component = inputs
        .fundamentals_score
        .filter(|f| f.is_finite())
        .map(|f| (10.0 - f.clamp(0.0, 10.0)) * 10.0)
        .unwrap_or(50.0);

    0.4 * beta_component + 0.3 * volatility_component + 0.2 * basket_component + 0.1 * fundamentals_component
}

fn quantize(score: f64) -> f64 {
    (1.0 + (score.clamp(0.0, 100.0) / 20.0).floor()).min(5.0)
}

fn basket_rate_multiplier(basket: BasketType) -> f64 {
    match basket {
        BasketType::Bitcoin => 1.0,
        BasketType::BlueChip => 1.25,
        BasketType::SmallCap => 1.5,
    }
}

/// Shift a discount rate (percent) by a Fed-rate change, scaled by
/// sensitivity and basket, bounded to [0.5, 50].
pub fn adjust_discount_rate(base_rate: f64, fed_rate_change: f64, basket: BasketType, sensitivity: f64) -> f64 {
    let shift = if fed_rate_change.is_finite() && sensitivity.is_finite() {
        fed_rate_change * sensitivity * basket_rate_multiplier(basket)
    } else {
        0.0
    };
    (base_rate + shift).clamp(MIN_DISCOUNT_RATE, MAX_DISCOUNT_RATE)
}
