// src/services/time_value.rs
use serde::Serialize;
use log::{debug, warn};

pub const DEFAULT_MAX_ITERATIONS: u32 = 100;
pub const DEFAULT_PRECISION: f64 = 1e-4;
const INITIAL_GUESS: f64 = 0.10;
const RATE_FLOOR: f64 = -0.99;

/// Outcome of the IRR root finder. `rate` is a percentage; when
/// `converged` is false it is the last iterate and should be treated as
/// low confidence.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct IrrResult {
    pub rate: f64,
    pub converged: bool,
    pub iterations: u32,
}

/// Net present value with `cash_flows[0]` undiscounted. `discount_rate` is a fraction.
pub fn npv(cash_flows: &[f64], discount_rate: f64) -> f64 {
    cash_flows
        .iter()
        .enumerate()
        .map(|(t, cf)| cf / (1.0 + discount_rate).powi(t as i32))
        .sum()
}

// d(NPV)/dr
fn npv_derivative(cash_flows: &[f64], rate: f64) -> f64 {
    cash_flows
        .iter()
        .enumerate()
        .skip(1)
        .map(|(t, cf)| -(t as f64) * cf / (1.0 + rate).powi(t as i32 + 1))
        .sum()
}

pub fn irr(cash_flows: &[f64]) -> IrrResult {
    irr_with(cash_flows, DEFAULT_MAX_ITERATIONS, DEFAULT_PRECISION)
}

/// Newton-Raphson IRR starting at 10%, floored at -99%.
pub fn irr_with(cash_flows: &[f64], max_iterations: u32, precision: f64) -> IrrResult {
    let mut rate = INITIAL_GUESS;

    if cash_flows.is_empty() {
        return IrrResult { rate: 0.0, converged: false, iterations: 0 };
    }

    for iteration in 0..max_iterations {
        let value = npv(cash_flows, rate);
        if !value.is_finite() {
            warn!("IRR diverged at iteration {} (rate {})", iteration, rate);
            return IrrResult { rate: rate * 100.0, converged: false, iterations: iteration };
        }
        if value.abs() < precision {
            debug!("IRR converged to {:.6} after {} iterations", rate, iteration);
            return IrrResult { rate: rate * 100.0, converged: true, iterations: iteration };
        }

        let derivative = npv_derivative(cash_flows, rate);
        if derivative == 0.0 || !derivative.is_finite() {
            warn!("IRR stalled at iteration {}: zero derivative", iteration);
            return IrrResult { rate: rate * 100.0, converged: false, iterations: iteration };
        }

        rate = (rate - value / derivative).max(RATE_FLOOR);
    }

    // Budget exhausted; the final iterate may still satisfy the tolerance.
    let converged = npv(cash_flows, rate).abs() < precision;
    if !converged {
        warn!("IRR did not converge within {} iterations", max_iterations);
    }
    IrrResult { rate: rate * 100.0, converged, iterations: max_iterations }
}
