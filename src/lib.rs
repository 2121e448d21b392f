//! Plant telemetry - sensor installations and decoded telemetry for industrial plants
//!
//! This library exposes the core modules for testing and reuse.

pub mod common;
pub mod config;
pub mod entity;
pub mod error;
pub mod routes;
pub mod services;
pub mod telemetry;
