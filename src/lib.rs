//! Outage Risk Forecaster
//!
//! Scores electricity-grid outage risk from weather, grid and temporal
//! conditions, explains the score, and runs what-if and sensitivity analysis
//! over it. The HTTP surface in [`api`] is a thin wrapper around
//! [`risk::RiskEngine`] and the analyzers in [`scenario`].

pub mod api;
pub mod app;
pub mod config;
pub mod domain;
pub mod error;
pub mod forecast;
pub mod ml;
pub mod risk;
pub mod scenario;
pub mod telemetry;
