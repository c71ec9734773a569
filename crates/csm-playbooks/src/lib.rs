pub mod config;
pub mod error;
pub mod playbooks;
pub mod telemetry;
