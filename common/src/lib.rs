//! Shared building blocks for the database REST gateway.
//!
//! - `config`: environment-driven configuration
//! - `errors`: the error taxonomy and its HTTP mapping
//! - `extract`: request extractors
//! - `middleware`: request-id tracing middleware
//! - `models`: request and response bodies
//! - `response`: small JSON response wrappers
//! - `utils`: SQL keyword and identifier guards

pub mod config;
pub mod errors;
pub mod extract;
pub mod middleware;
pub mod models;
pub mod response;
pub mod utils;
