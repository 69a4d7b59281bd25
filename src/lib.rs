// src/lib.rs

// Valuation engine
pub mod config;
pub mod models;
pub mod services;

// HTTP adapter
pub mod handlers;
pub mod routes;

pub use config::EngineConfig;
pub use services::analysis::{analyze, AnalysisReport, AnalysisRequest};
