// src/services/growth.rs

/// Compound annual growth rate in percent. Zero for non-positive values or periods.
pub fn cagr(begin_value: f64, end_value: f64, periods: f64) -> f64 {
    if begin_value <= 0.0 || end_value <= 0.0 || periods <= 0.0 {
        0.0
    } else {
        ((end_value / begin_value).powf(1.0 / periods) - 1.0) * 100.0
    }
}

/// Simple return on investment in percent. Zero when `begin_value` is not positive.
pub fn roi(begin_value: f64, end_value: f64) -> f64 {
    if begin_value <= 0.0 {
        0.0
    } else {
        (end_value - begin_value) / begin_value * 100.0
    }
}
