// src/routes.rs
use std::sync::Arc;
use warp::reject::Rejection;
use warp::http::StatusCode;
use crate::config::EngineConfig;
use crate::handlers::{allocation::post_allocation_check, allocation::post_allocation_validate,
                     analysis::post_analysis, cash_flows::post_cash_flows};
use crate::handlers::allocation::AllocationCheckRequest;
use crate::handlers::cash_flows::CashFlowRequest;
use crate::handlers::error::ApiError;
use crate::services::allocation::PortfolioAllocation;
use crate::services::analysis::AnalysisRequest;
use log::info;

use std::convert::Infallible;
use warp::{Filter, Reply};

const MAX_BODY_BYTES: u64 = 1024 * 1024;

// Turn rejections into JSON error bodies
async fn handle_rejection(err: Rejection) -> Result<impl Reply, Infallible> {
    let code;
    let message;

    if err.is_not_found() {
        code = StatusCode::NOT_FOUND;
        message = "Not Found".to_string();
    } else if let Some(api_error) = err.find::<ApiError>() {
        code = api_error.status();
        message = api_error.message.clone();
    } else if let Some(e) = err.find::<warp::filters::body::BodyDeserializeError>() {
        code = StatusCode::BAD_REQUEST;
        message = format!("Invalid request body: {}", e);
    } else if err.find::<warp::reject::PayloadTooLarge>().is_some() {
        code = StatusCode::PAYLOAD_TOO_LARGE;
        message = "Payload Too Large".to_string();
    } else if err.find::<warp::reject::MethodNotAllowed>().is_some() {
        code = StatusCode::METHOD_NOT_ALLOWED;
        message = "Method Not Allowed".to_string();
    } else {
        code = StatusCode::INTERNAL_SERVER_ERROR;
        message = "Internal Server Error".to_string();
    }

    Ok(warp::reply::with_status(
        warp::reply::json(&serde_json::json!({
            "error": message,
        })),
        code,
    ))
}

fn json_body<T>() -> impl Filter<Extract = (T,), Error = Rejection> + Clone
where
    T: serde::de::DeserializeOwned + Send,
{
    warp::body::content_length_limit(MAX_BODY_BYTES).and(warp::body::json())
}

pub fn routes(config: Arc<EngineConfig>) -> impl Filter<Extract = impl Reply, Error = Infallible> + Clone {
    info!("Configuring routes...");

    let config_filter = warp::any().map(move || config.clone());

    let analysis_route = warp::path!("api" / "v1" / "analysis")
        .and(warp::post())
        .and(json_body::<AnalysisRequest>())
        .and(config_filter.clone())
        .and_then(post_analysis);

    let allocation_check_route = warp::path!("api" / "v1" / "allocation" / "check")
        .and(warp::post())
        .and(json_body::<AllocationCheckRequest>())
        .and_then(post_allocation_check);

    let allocation_validate_route = warp::path!("api" / "v1" / "allocation" / "validate")
        .and(warp::post())
        .and(json_body::<PortfolioAllocation>())
        .and_then(post_allocation_validate);

    let cash_flows_route = warp::path!("api" / "v1" / "cash_flows")
        .and(warp::post())
        .and(json_body::<CashFlowRequest>())
        .and(config_filter.clone())
        .and_then(post_cash_flows);

    info!("All routes configured successfully.");

    analysis_route
        .or(allocation_check_route)
        .or(allocation_validate_route)
        .or(cash_flows_route)
        .recover(handle_rejection)
}
