// src/services/statistics.rs
use serde::Serialize;
use statrs::statistics::Statistics;
use log::debug;

use crate::models::PriceSeries;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct VolatilityEstimate {
    pub annualized_pct: f64,
    pub sample_size: usize,
    pub reliable: bool,
}

/// Sample standard deviation (n - 1). Zero when fewer than two values.
pub fn standard_deviation(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let sd = values.iter().std_dev();
    if sd.is_finite() { sd } else { 0.0 }
}

/// Population variance. Zero when fewer than two values.
pub fn variance(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    values.iter().population_variance()
}

/// Population covariance of two paired series. Zero when the lengths differ
/// or fewer than two pairs are available.
pub fn covariance(a: &[f64], b: &[f64]) -> f64 {
    if a.len() != b.len() || a.len() < 2 {
        return 0.0;
    }
    a.iter().population_covariance(b.iter())
}

/// Period-over-period simple returns. Pairs with a non-positive base are skipped.
pub fn simple_returns(prices: &[f64]) -> Vec<f64> {
    prices
        .windows(2)
        .filter(|w| w[0] > 0.0)
        .map(|w| (w[1] - w[0]) / w[0])
        .collect()
}

/// Annualized volatility in percent. Returns 0 for fewer than two prices,
/// which callers must read as "insufficient data".
pub fn annualized_volatility(prices: &[f64], periods_per_year: f64) -> f64 {
    if prices.len() < 2 || periods_per_year <= 0.0 {
        debug!("Insufficient data for volatility ({} prices)", prices.len());
        return 0.0;
    }
    let returns = simple_returns(prices);
    standard_deviation(&returns) * periods_per_year.sqrt() * 100.0
}

pub fn estimate_volatility(series: &PriceSeries, periods_per_year: f64) -> VolatilityEstimate {
    VolatilityEstimate {
        annualized_pct: annualized_volatility(&series.prices(), periods_per_year),
        sample_size: series.len(),
        reliable: series.len() >= PriceSeries::RELIABLE_SAMPLE,
    }
}
