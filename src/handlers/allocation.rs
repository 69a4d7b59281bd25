// src/handlers/allocation.rs
use warp::reply::Json;
use warp::Rejection;
use serde::Deserialize;
use log::info;

use crate::models::BasketType;
use crate::services::allocation::{check_allocation, validate_portfolio, PortfolioAllocation};
use super::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct AllocationCheckRequest {
    pub investment_amount: f64,
    pub total_portfolio: f64,
    pub basket: BasketType,
}

pub async fn post_allocation_check(request: AllocationCheckRequest) -> Result<Json, Rejection> {
    info!("Handling allocation check for {} basket", request.basket);

    if !(request.total_portfolio > 0.0) || !request.total_portfolio.is_finite() {
        return Err(warp::reject::custom(ApiError::validation(
            "total_portfolio must be positive",
        )));
    }
    if !(request.investment_amount >= 0.0) || !request.investment_amount.is_finite() {
        return Err(warp::reject::custom(ApiError::validation(
            "investment_amount must not be negative",
        )));
    }

    let result = check_allocation(request.investment_amount, request.total_portfolio, request.basket);
    Ok(warp::reply::json(&result))
}

pub async fn post_allocation_validate(allocation: PortfolioAllocation) -> Result<Json, Rejection> {
    info!("Handling portfolio allocation validation");
    let validation = validate_portfolio(&allocation);
    Ok(warp::reply::json(&validation))
}
