// src/handlers/mod.rs
pub mod analysis;
pub mod allocation;
pub mod cash_flows;
pub mod error;
