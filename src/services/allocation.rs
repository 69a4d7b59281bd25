// src/services/allocation.rs
use serde::{Serialize, Deserialize};

use crate::models::{AllocationAction, AllocationResult, AllocationStatus, BasketType, TargetRange};

/// Tolerance, in percentage points, on the three baskets summing to 100%.
pub const SUM_TOLERANCE: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AllocationRule {
    pub allowed: TargetRange,
    pub recommended: TargetRange,
}

pub fn allocation_rule(basket: BasketType) -> AllocationRule {
    match basket {
        BasketType::Bitcoin => AllocationRule {
            allowed: TargetRange { min: 60.0, max: 80.0 },
            recommended: TargetRange { min: 60.0, max: 75.0 },
        },
        BasketType::BlueChip => AllocationRule {
            allowed: TargetRange { min: 0.0, max: 40.0 },
            recommended: TargetRange { min: 20.0, max: 35.0 },
        },
        BasketType::SmallCap => AllocationRule {
            allowed: TargetRange { min: 0.0, max: 15.0 },
            recommended: TargetRange { min: 5.0, max: 10.0 },
        },
    }
}

pub fn portfolio_percentage(investment_amount: f64, total_portfolio: f64) -> f64 {
    if total_portfolio <= 0.0 || !total_portfolio.is_finite() {
        0.0
    } else {
        investment_amount / total_portfolio * 100.0
    }
}

pub fn check_allocation(investment_amount: f64, total_portfolio: f64, basket: BasketType) -> AllocationResult {
    let rule = allocation_rule(basket);
    let percentage = portfolio_percentage(investment_amount, total_portfolio);

    let (status, action) = if percentage < rule.allowed.min {
        (AllocationStatus::Underexposed, AllocationAction::Increase)
    } else if percentage > rule.allowed.max {
        (AllocationStatus::Overexposed, AllocationAction::Decrease)
    } else {
        (AllocationStatus::Optimal, AllocationAction::Maintain)
    };

    AllocationResult {
        portfolio_percentage: percentage,
        basket,
        status,
        action,
        allowed_range: rule.allowed,
        recommended_range: rule.recommended,
    }
}

/// Basket weights of a whole portfolio, in percent.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PortfolioAllocation {
    pub bitcoin: f64,
    pub blue_chip: f64,
    pub small_cap: f64,
}

impl PortfolioAllocation {
    pub fn weight(&self, basket: BasketType) -> f64 {
        match basket {
            BasketType::Bitcoin => self.bitcoin,
            BasketType::BlueChip => self.blue_chip,
            BasketType::SmallCap => self.small_cap,
        }
    }

    pub fn total(&self) -> f64 {
        self.bitcoin + self.blue_chip + self.small_cap
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PortfolioValidation {
    pub is_valid: bool,
    pub total: f64,
    pub issues: Vec<String>,
}

pub fn validate_portfolio(allocation: &PortfolioAllocation) -> PortfolioValidation {
    let mut issues = Vec::new();
    let total = allocation.total();

    if (total - 100.0).abs() > SUM_TOLERANCE {
        issues.push(format!("Allocations sum to {:.2}%, expected 100%", total));
    }

    for basket in BasketType::ALL {
        let weight = allocation.weight(basket);
        let rule = allocation_rule(basket);
        if weight > rule.allowed.max {
            issues.push(format!(
                "{} allocation {:.2}% exceeds the {:.0}% cap",
                basket, weight, rule.allowed.max
            ));
        }
    }

    PortfolioValidation { is_valid: issues.is_empty(), total, issues }
}
