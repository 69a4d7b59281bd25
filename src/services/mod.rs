// src/services/mod.rs
pub mod statistics;
pub mod time_value;
pub mod growth;
pub mod cash_flows;
pub mod risk;
pub mod allocation;
pub mod simulation;
pub mod recommendation;
pub mod analysis;
