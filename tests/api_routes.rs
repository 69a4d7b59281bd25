use std::sync::Arc;

use crypto_valuation::config::EngineConfig;
use crypto_valuation::routes::routes;
use serde_json::{json, Value};
use warp::http::StatusCode;

fn body_json(body: &[u8]) -> Value {
    serde_json::from_slice(body).expect("response body is JSON")
}

#[tokio::test]
async fn allocation_check_classifies() {
    let api = routes(Arc::new(EngineConfig::default()));
    let resp = warp::test::request()
        .method("POST")
        .path("/api/v1/allocation/check")
        .json(&json!({ "investment_amount": 6500.0, "total_portfolio": 10000.0, "basket": "bitcoin" }))
        .reply(&api)
        .await;

    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp.body());
    assert_eq!(body["status"], "optimal");
    assert_eq!(body["action"], "maintain");
}

#[tokio::test]
async fn allocation_validate_reports_issues() {
    let api = routes(Arc::new(EngineConfig::default()));
    let resp = warp::test::request()
        .method("POST")
        .path("/api/v1/allocation/validate")
        .json(&json!({ "bitcoin": 50.0, "blue_chip": 30.0, "small_cap": 25.0 }))
        .reply(&api)
        .await;

    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp.body());
    assert_eq!(body["is_valid"], false);
    assert_eq!(body["issues"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn cash_flows_endpoint_returns_irr() {
    let api = routes(Arc::new(EngineConfig::default()));
    let resp = warp::test::request()
        .method("POST")
        .path("/api/v1/cash_flows")
        .json(&json!({
            "investment_amount": 1000.0,
            "expected_price": 110.0,
            "current_price": 100.0,
            "horizon_years": 1
        }))
        .reply(&api)
        .await;

    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp.body());
    assert_eq!(body["projection"]["flows"].as_array().unwrap().len(), 2);
    assert_eq!(body["irr"]["converged"], true);
    assert!((body["irr"]["rate"].as_f64().unwrap() - 10.0).abs() < 0.01);
}

#[tokio::test]
async fn allocation_check_rejects_negative_amount() {
    let api = routes(Arc::new(EngineConfig::default()));
    let resp = warp::test::request()
        .method("POST")
        .path("/api/v1/allocation/check")
        .json(&json!({ "investment_amount": -500.0, "total_portfolio": 10000.0, "basket": "blue_chip" }))
        .reply(&api)
        .await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body = body_json(resp.body());
    assert!(body["error"].as_str().unwrap().contains("investment_amount"));
}

async fn post_cash_flows_request(overrides: Value) -> (StatusCode, Value) {
    let mut request = json!({
        "investment_amount": 1000.0,
        "expected_price": 110.0,
        "current_price": 100.0,
        "horizon_years": 3
    });
    if let (Some(base), Some(extra)) = (request.as_object_mut(), overrides.as_object()) {
        for (key, value) in extra {
            base.insert(key.clone(), value.clone());
        }
    }

    let api = routes(Arc::new(EngineConfig::default()));
    let resp = warp::test::request()
        .method("POST")
        .path("/api/v1/cash_flows")
        .json(&request)
        .reply(&api)
        .await;
    (resp.status(), body_json(resp.body()))
}

#[tokio::test]
async fn cash_flows_rejects_out_of_range_inputs() {
    let (status, body) = post_cash_flows_request(json!({ "horizon_years": 4_294_967_295u32 })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("at most 100 years"));

    let (status, body) = post_cash_flows_request(json!({ "discount_rate": -100.0 })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("discount_rate"));

    let (status, body) = post_cash_flows_request(json!({ "staking_yield": 75.0 })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("staking yield"));

    let (status, _) = post_cash_flows_request(json!({ "discount_rate": 20.0, "staking_yield": 5.0 })).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn analysis_runs_end_to_end() {
    let api = routes(Arc::new(EngineConfig::default()));
    let resp = warp::test::request()
        .method("POST")
        .path("/api/v1/analysis")
        .json(&json!({
            "inputs": { "coin_id": "bitcoin", "investment_amount": 5000.0, "horizon_years": 2 },
            "coin": { "current_price": 60000.0, "basket": "bitcoin", "on_chain": { "aviv_ratio": 0.7 } },
            "prices": [
                { "timestamp": "2024-01-01T00:00:00Z", "price": 42000.0 },
                { "timestamp": "2024-01-02T00:00:00Z", "price": 43100.0 },
                { "timestamp": "2024-01-03T00:00:00Z", "price": 42500.0 }
            ],
            "market": { "fed_rate_change": -0.25, "bitcoin_market_state": "bullish" }
        }))
        .reply(&api)
        .await;

    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp.body());
    assert_eq!(body["coin_id"], "bitcoin");
    assert_eq!(body["cash_flows"]["flows"].as_array().unwrap().len(), 3);
    assert!(body["recommendation"]["confidence"].as_u64().unwrap() <= 100);
    assert_eq!(body["data_quality"]["sample_size"], 3);
}

#[tokio::test]
async fn invalid_analysis_is_bad_request() {
    let api = routes(Arc::new(EngineConfig::default()));
    let resp = warp::test::request()
        .method("POST")
        .path("/api/v1/analysis")
        .json(&json!({
            "inputs": { "coin_id": "doge", "investment_amount": -1.0, "horizon_years": 2 },
            "coin": { "current_price": 0.1, "basket": "small_cap" }
        }))
        .reply(&api)
        .await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body = body_json(resp.body());
    assert!(body["error"].as_str().unwrap().contains("investment amount"));
}

#[tokio::test]
async fn malformed_body_is_bad_request() {
    let api = routes(Arc::new(EngineConfig::default()));
    let resp = warp::test::request()
        .method("POST")
        .path("/api/v1/allocation/check")
        .json(&json!({ "basket": "moon" }))
        .reply(&api)
        .await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unknown_route_is_not_found() {
    let api = routes(Arc::new(EngineConfig::default()));
    let resp = warp::test::request().method("GET").path("/api/v1/nothing").reply(&api).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
