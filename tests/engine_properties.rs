use crypto_valuation::models::{AllocationStatus, BasketType, SmartMoney};
use crypto_valuation::services::allocation::check_allocation;
use crypto_valuation::services::cash_flows::{generate_cash_flows, project_cash_flows, CashFlowModel};
use crypto_valuation::services::growth::cagr;
use crypto_valuation::services::risk::{risk_factor, RiskFactorInputs, RiskModel};
use crypto_valuation::services::time_value::{irr, npv, DEFAULT_PRECISION};
use quickcheck::TestResult;
use quickcheck_macros::quickcheck;

// Map an arbitrary float into [0, 1).
fn unit(x: f64) -> f64 {
    if x.is_finite() { x.abs().fract() } else { 0.5 }
}

fn basket_from(n: u8) -> BasketType {
    BasketType::ALL[n as usize % 3]
}

#[quickcheck]
fn npv_vanishes_at_converged_irr(outlay: u16, inflows: Vec<u16>) -> TestResult {
    if inflows.is_empty() {
        return TestResult::discard();
    }
    let mut flows = vec![-(outlay as f64 + 1.0) * 10.0];
    flows.extend(inflows.iter().take(30).map(|&v| v as f64));

    let result = irr(&flows);
    if !result.converged {
        return TestResult::discard();
    }
    TestResult::from_bool(npv(&flows, result.rate / 100.0).abs() < DEFAULT_PRECISION)
}

#[quickcheck]
fn cagr_recovers_the_growth_rate(r: f64, n: u8) -> bool {
    let rate = -0.99 + unit(r) * 10.98 + 0.001;
    let periods = (n % 50 + 1) as f64;
    let end = 100.0 * (1.0 + rate).powf(periods);
    (cagr(100.0, end, periods) - rate * 100.0).abs() < 1e-6
}

#[quickcheck]
fn cash_flow_shape(amount: f64, start: f64, end: f64, horizon: u8, yield_pct: f64) -> bool {
    let amount = 1.0 + unit(amount) * 1e6;
    let start = 0.01 + unit(start) * 1e5;
    let end = 0.01 + unit(end) * 1e5;
    let horizon = (horizon % 30 + 1) as u32;
    let yield_pct = unit(yield_pct) * 50.0;

    let flows = generate_cash_flows(amount, end, start, horizon, yield_pct);
    let unstaked = generate_cash_flows(amount, end, start, horizon, 0.0);

    flows.len() == horizon as usize + 1
        && flows[0] == -amount
        && unstaked[1..horizon as usize].iter().all(|&cf| cf == 0.0)
}

#[quickcheck]
fn risk_factor_always_in_range(
    basket: u8,
    volatility: f64,
    fundamentals: f64,
    on_chain: (f64, f64, f64),
    fed: f64,
    beta: f64,
    selling: bool,
) -> bool {
    let (aviv, active, vaulted) = on_chain;
    let inputs = RiskFactorInputs {
        fundamentals_score: Some(fundamentals),
        aviv_ratio: Some(aviv),
        active_supply_pct: Some(active),
        vaulted_supply_pct: Some(vaulted),
        fed_rate_change: Some(fed),
        smart_money: Some(if selling { SmartMoney::Selling } else { SmartMoney::Buying }),
        beta: Some(beta),
        ..RiskFactorInputs::new(basket_from(basket), volatility)
    };
    [RiskModel::Basic, RiskModel::BetaWeighted]
        .iter()
        .all(|&model| (1..=5).contains(&risk_factor(&inputs, model)))
}

#[test]
fn risk_factor_survives_extreme_values() {
    let inputs = RiskFactorInputs {
        aviv_ratio: Some(-5.0),
        active_supply_pct: Some(1e9),
        ..RiskFactorInputs::new(BasketType::SmallCap, 10_000.0)
    };
    assert_eq!(risk_factor(&inputs, RiskModel::Basic), 5);
}

#[quickcheck]
fn allocation_never_falls_back_to_underexposed(a: f64, b: f64, total: f64, basket: u8) -> bool {
    let total = 1.0 + unit(total) * 1e6;
    let (low, high) = {
        let x = unit(a) * total * 1.5;
        let y = unit(b) * total * 1.5;
        if x <= y { (x, y) } else { (y, x) }
    };
    let basket = basket_from(basket);
    let before = check_allocation(low, total, basket).status;
    let after = check_allocation(high, total, basket).status;
    !(before == AllocationStatus::Overexposed && after == AllocationStatus::Underexposed)
        && !(before == AllocationStatus::Optimal && after == AllocationStatus::Underexposed)
}

#[test]
fn bitcoin_buy_signal_scenario() {
    let inputs = RiskFactorInputs {
        aviv_ratio: Some(0.5),
        vaulted_supply_pct: Some(75.0),
        ..RiskFactorInputs::new(BasketType::Bitcoin, 40.0)
    };
    assert!(risk_factor(&inputs, RiskModel::Basic) <= 2);

    let allocation = check_allocation(6_500.0, 10_000.0, BasketType::Bitcoin);
    assert_eq!(allocation.status, AllocationStatus::Optimal);
}

#[test]
fn simple_loan_irr() {
    let result = irr(&[-1000.0, 1100.0]);
    assert!(result.converged);
    assert!((result.rate - 10.0).abs() < 0.01);
}

#[test]
fn staking_compounding_beats_naive_balance() {
    let compounding = project_cash_flows(10_000.0, 20_000.0, 10_000.0, 3, 10.0, CashFlowModel::Compounding);
    let naive = project_cash_flows(10_000.0, 20_000.0, 10_000.0, 3, 10.0, CashFlowModel::Flat);
    assert!(compounding.final_coins > naive.final_coins);
    assert_eq!(compounding.flows.len(), 4);
    assert_eq!(compounding.flows[0], -10_000.0);
}
