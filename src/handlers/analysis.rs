// src/handlers/analysis.rs
use warp::reply::Json;
use warp::Rejection;
use std::sync::Arc;
use log::{info, warn};

use crate::config::EngineConfig;
use crate::services::analysis::{analyze, AnalysisRequest};
use super::error::ApiError;

pub async fn post_analysis(request: AnalysisRequest, config: Arc<EngineConfig>) -> Result<Json, Rejection> {
    info!("Handling analysis request for {}", request.inputs.coin_id);

    let report = analyze(&request, &config).map_err(|e| {
        warn!("Rejected analysis request for {}: {}", request.inputs.coin_id, e);
        warp::reject::custom(ApiError::from(e))
    })?;

    Ok(warp::reply::json(&report))
}
