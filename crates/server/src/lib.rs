pub mod actions;
pub mod api;
pub mod config;
pub mod encoder;
pub mod error;
pub mod telemetry;
