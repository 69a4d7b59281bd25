// src/services/simulation.rs
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::Serialize;
use statrs::distribution::{ContinuousCDF, Normal};
use log::debug;

#[derive(Debug, Clone, Copy)]
pub struct SimulationParams {
    pub investment_amount: f64,
    /// Expected annual price growth in percent; the median path follows it.
    pub expected_growth_pct: f64,
    /// Annualized volatility in percent.
    pub volatility_pct: f64,
    pub horizon_years: u32,
    pub staking_yield_pct: f64,
    pub paths: u32,
    pub seed: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SimulationSummary {
    pub paths: u32,
    pub loss_probability: f64,
    pub median_terminal_value: f64,
    pub p5_terminal_value: f64,
}

impl SimulationSummary {
    fn empty() -> Self {
        SimulationSummary { paths: 0, loss_probability: 0.0, median_terminal_value: 0.0, p5_terminal_value: 0.0 }
    }
}

/// Geometric Brownian motion over the horizon. Deterministic for a given seed.
pub fn simulate_terminal_values(params: &SimulationParams) -> SimulationSummary {
    if params.paths == 0 || params.investment_amount <= 0.0 || params.horizon_years == 0 {
        return SimulationSummary::empty();
    }

    let years = params.horizon_years as f64;
    let drift = (1.0 + params.expected_growth_pct.max(-99.0) / 100.0).ln();
    let sigma = if params.volatility_pct.is_finite() { params.volatility_pct.max(0.0) / 100.0 } else { 0.0 };
    // Coins compound through every year except the terminal one
    let compounding_years = i32::try_from(params.horizon_years.saturating_sub(1)).unwrap_or(i32::MAX);
    let staking_factor = (1.0 + params.staking_yield_pct.max(0.0) / 100.0).powi(compounding_years);

    let standard_normal = Normal::standard();
    let mut rng = StdRng::seed_from_u64(params.seed);

    let mut values: Vec<f64> = (0..params.paths)
        .map(|_| {
            let u: f64 = rng.gen_range(f64::EPSILON..1.0);
            let z = standard_normal.inverse_cdf(u);
            let growth = (drift * years + sigma * years.sqrt() * z).exp();
            params.investment_amount * staking_factor * growth
        })
        .collect();

    let losses = values.iter().filter(|&&v| v < params.investment_amount).count();
    values.sort_by(|a, b| a.total_cmp(b));
    let n = values.len();

    let summary = SimulationSummary {
        paths: params.paths,
        loss_probability: losses as f64 / n as f64,
        median_terminal_value: values[n / 2],
        p5_terminal_value: values[((n as f64 * 0.05).floor() as usize).min(n - 1)],
    };
    debug!("Monte Carlo over {} paths: loss probability {:.3}", n, summary.loss_probability);
    summary
}
