// src/services/analysis.rs
use chrono::{DateTime, Utc};
use log::info;
use serde::{Serialize, Deserialize};
use std::collections::HashMap;

use crate::config::EngineConfig;
use crate::models::{
    AllocationResult, CoinSnapshot, InvestmentInputs, MarketConditions, PriceSeries,
    RecommendationResult, ValidationError,
};
use super::allocation::check_allocation;
use super::cash_flows::{project_cash_flows, CashFlowProjection};
use super::growth::{cagr, roi};
use super::recommendation::{synthesize, RecommendationInputs};
use super::risk::{adjust_discount_rate, beta, risk_factor, sharpe_ratio, value_at_risk, RiskFactorInputs, DEFAULT_VAR_CONFIDENCE};
use super::simulation::{simulate_terminal_values, SimulationParams, SimulationSummary};
use super::statistics::{estimate_volatility, simple_returns, VolatilityEstimate};
use super::time_value::{irr, npv, IrrResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisRequest {
    pub inputs: InvestmentInputs,
    pub coin: CoinSnapshot,
    #[serde(default)]
    pub prices: PriceSeries,
    /// Benchmark history (usually BTC or a market index) for beta.
    #[serde(default)]
    pub benchmark_prices: Option<PriceSeries>,
    #[serde(default)]
    pub market: MarketConditions,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DataQuality {
    pub sample_size: usize,
    pub reliable: bool,
    pub has_benchmark: bool,
    pub has_on_chain: bool,
    /// 0-100
    pub score: f64,
}

impl DataQuality {
    pub fn assess(sample_size: usize, has_benchmark: bool, has_on_chain: bool) -> Self {
        let history = (sample_size as f64 / PriceSeries::RELIABLE_SAMPLE as f64).min(1.0) * 60.0;
        let benchmark = if has_benchmark { 20.0 } else { 0.0 };
        let on_chain = if has_on_chain { 20.0 } else { 0.0 };
        DataQuality {
            sample_size,
            reliable: sample_size >= PriceSeries::RELIABLE_SAMPLE,
            has_benchmark,
            has_on_chain,
            score: history + benchmark + on_chain,
        }
    }
}

/// Every intermediate metric alongside the recommendation, suitable for an audit record.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub coin_id: String,
    pub as_of: Option<DateTime<Utc>>,
    pub expected_price: f64,
    pub discount_rate: f64,
    pub risk_free_rate: f64,
    pub cash_flows: CashFlowProjection,
    pub npv: f64,
    pub irr: IrrResult,
    pub projected_cagr: f64,
    pub projected_roi: f64,
    pub historical_cagr: f64,
    pub volatility: VolatilityEstimate,
    pub beta: f64,
    pub sharpe_ratio: f64,
    pub value_at_risk: f64,
    pub risk_factor: u8,
    pub allocation: Option<AllocationResult>,
    pub simulation: SimulationSummary,
    pub data_quality: DataQuality,
    pub recommendation: RecommendationResult,
}

/// Pair up returns of two series on matching timestamps.
pub fn aligned_returns(asset: &PriceSeries, benchmark: &PriceSeries) -> (Vec<f64>, Vec<f64>) {
    let benchmark_by_time: HashMap<DateTime<Utc>, f64> =
        benchmark.points().iter().map(|p| (p.timestamp, p.price)).collect();

    let (asset_prices, benchmark_prices): (Vec<f64>, Vec<f64>) = asset
        .points()
        .iter()
        .filter_map(|p| benchmark_by_time.get(&p.timestamp).map(|&b| (p.price, b)))
        .unzip();

    (simple_returns(&asset_prices), simple_returns(&benchmark_prices))
}

pub fn analyze(request: &AnalysisRequest, config: &EngineConfig) -> Result<AnalysisReport, ValidationError> {
    let inputs = &request.inputs;
    let coin = &request.coin;
    inputs.validate()?;
    coin.validate()?;

    let basket = coin.basket;
    let assumptions = config.assumptions(basket);
    let horizon = inputs.horizon_years;
    let amount = inputs.investment_amount;

    let expected_price = inputs.expected_price.unwrap_or_else(|| {
        coin.current_price * (1.0 + assumptions.expected_growth / 100.0).powi(horizon as i32)
    });
    let risk_free_rate = inputs.risk_free_rate.unwrap_or(config.default_risk_free_rate);
    let discount_rate = adjust_discount_rate(
        assumptions.discount_rate,
        request.market.fed_rate_change,
        basket,
        config.fed_rate_sensitivity,
    );

    // Time value
    let projection = project_cash_flows(
        amount,
        expected_price,
        coin.current_price,
        horizon,
        inputs.staking_yield_pct(),
        config.cash_flow_model,
    );
    let npv_value = npv(&projection.flows, discount_rate / 100.0);
    let irr_result = irr(&projection.flows);
    let proceeds: f64 = projection.flows.iter().skip(1).sum();
    let projected_cagr = cagr(amount, proceeds, horizon as f64);
    let projected_roi = roi(amount, proceeds);

    // History
    let prices = &request.prices;
    let historical_cagr = match (prices.first(), prices.last()) {
        (Some(first), Some(last)) => cagr(first.price, last.price, prices.span_years()),
        _ => 0.0,
    };
    let volatility = estimate_volatility(prices, config.periods_per_year);
    let asset_returns = prices.returns();

    let (beta_value, has_benchmark) = match &request.benchmark_prices {
        Some(benchmark) => {
            let (asset_aligned, benchmark_aligned) = aligned_returns(prices, benchmark);
            (beta(&asset_aligned, &benchmark_aligned), asset_aligned.len() >= 2)
        }
        None => (1.0, false),
    };

    let sharpe = sharpe_ratio(projected_cagr, risk_free_rate, volatility.annualized_pct);
    let var = value_at_risk(amount, &asset_returns, DEFAULT_VAR_CONFIDENCE);

    let on_chain = &coin.on_chain;
    let risk_inputs = RiskFactorInputs {
        basket: Some(basket),
        volatility: volatility.annualized_pct,
        fundamentals_score: coin.fundamentals_score,
        aviv_ratio: on_chain.aviv_ratio,
        active_supply_pct: on_chain.active_supply_pct,
        vaulted_supply_pct: on_chain.vaulted_supply_pct,
        fed_rate_change: Some(request.market.fed_rate_change),
        smart_money: on_chain.smart_money.or(Some(request.market.smart_money)),
        beta: has_benchmark.then_some(beta_value),
    };
    let risk_score = risk_factor(&risk_inputs, config.risk_model);

    let allocation = inputs.portfolio_value.map(|total| check_allocation(amount, total, basket));

    let simulation = simulate_terminal_values(&SimulationParams {
        investment_amount: amount,
        expected_growth_pct: cagr(coin.current_price, expected_price, horizon as f64),
        volatility_pct: volatility.annualized_pct,
        horizon_years: horizon,
        staking_yield_pct: inputs.staking_yield_pct(),
        paths: config.monte_carlo_paths,
        seed: config.monte_carlo_seed,
    });

    let data_quality = DataQuality::assess(prices.len(), has_benchmark, !on_chain.is_empty());

    let recommendation = synthesize(&RecommendationInputs {
        npv: npv_value,
        irr: Some(irr_result),
        hurdle_rate: Some(assumptions.hurdle_rate),
        cagr: projected_cagr,
        volatility: volatility.annualized_pct,
        aviv_ratio: on_chain.aviv_ratio,
        beta: has_benchmark.then_some(beta_value),
        loss_probability: (simulation.paths > 0).then_some(simulation.loss_probability),
        data_quality: Some(data_quality.score),
        risk_factor: Some(risk_score),
        allocation: allocation.clone(),
        market: Some(request.market.clone()),
        currently_held: inputs.currently_held,
    });

    info!(
        "Analysis for {}: NPV {:.2}, IRR {:.2}% (converged: {}), risk {}/5 -> {} ({}%)",
        inputs.coin_id,
        npv_value,
        irr_result.rate,
        irr_result.converged,
        risk_score,
        recommendation.action,
        recommendation.confidence
    );

    Ok(AnalysisReport {
        coin_id: inputs.coin_id.clone(),
        as_of: prices.last().map(|p| p.timestamp),
        expected_price,
        discount_rate,
        risk_free_rate,
        cash_flows: projection,
        npv: npv_value,
        irr: irr_result,
        projected_cagr,
        projected_roi,
        historical_cagr,
        volatility,
        beta: beta_value,
        sharpe_ratio: sharpe,
        value_at_risk: var,
        risk_factor: risk_score,
        allocation,
        simulation,
        data_quality,
        recommendation,
    })
}
