//! Service-desk analytics console: a mock ticket store, a
//! natural-language query filter with LLM-primary / keyword-fallback
//! resolution, and an executive-summary generator behind an HTTP API.

pub mod analysis;
pub mod api;
pub mod config;
pub mod error;
pub mod filter;
pub mod models;
pub mod store;
