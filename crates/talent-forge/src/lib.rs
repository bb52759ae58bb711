//! Assessment scoring, token authentication, and hosted-store access backing the
//! Talent Forge HTTP API.

pub mod assessments;
pub mod auth;
pub mod config;
pub mod error;
pub mod extract;
pub mod store;
pub mod telemetry;
