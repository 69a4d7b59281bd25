// src/handlers/cash_flows.rs
use warp::reply::Json;
use warp::Rejection;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use log::info;

use crate::config::EngineConfig;
use crate::models::{InvestmentInputs, ValidationError};
use crate::services::cash_flows::{project_cash_flows, CashFlowModel, CashFlowProjection};
use crate::services::time_value::{irr, npv, IrrResult};
use super::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct CashFlowRequest {
    pub investment_amount: f64,
    pub expected_price: f64,
    pub current_price: f64,
    pub horizon_years: u32,
    #[serde(default)]
    pub staking_yield: f64,
    /// Percent. Defaults to nothing discounted.
    #[serde(default)]
    pub discount_rate: f64,
    #[serde(default)]
    pub model: Option<CashFlowModel>,
}

impl CashFlowRequest {
    fn validate(&self) -> Result<(), ApiError> {
        if !(self.investment_amount > 0.0) || !(self.current_price > 0.0) || !(self.expected_price > 0.0) {
            return Err(ApiError::validation(
                "investment_amount, current_price and expected_price must be positive",
            ));
        }
        if self.horizon_years == 0 {
            return Err(ValidationError::ZeroHorizon.into());
        }
        if self.horizon_years > InvestmentInputs::MAX_HORIZON_YEARS {
            return Err(ValidationError::HorizonTooLong(self.horizon_years).into());
        }
        if !(0.0..=50.0).contains(&self.staking_yield) {
            return Err(ValidationError::StakingYieldOutOfRange(self.staking_yield).into());
        }
        if !(self.discount_rate > -100.0) || !self.discount_rate.is_finite() {
            return Err(ApiError::validation(format!(
                "discount_rate must be above -100%, got {}",
                self.discount_rate
            )));
        }
        Ok(())
    }
}

#[derive(Serialize)]
struct CashFlowResponse {
    projection: CashFlowProjection,
    npv: f64,
    irr: IrrResult,
}

pub async fn post_cash_flows(request: CashFlowRequest, config: Arc<EngineConfig>) -> Result<Json, Rejection> {
    info!("Handling cash flow projection over {} years", request.horizon_years);

    request.validate().map_err(warp::reject::custom)?;

    let projection = project_cash_flows(
        request.investment_amount,
        request.expected_price,
        request.current_price,
        request.horizon_years,
        request.staking_yield,
        request.model.unwrap_or(config.cash_flow_model),
    );

    let response = CashFlowResponse {
        npv: npv(&projection.flows, request.discount_rate / 100.0),
        irr: irr(&projection.flows),
        projection,
    };

    Ok(warp::reply::json(&response))
}
