//! DecisionLab Runner: the service layer around `decisionlab-core`.
//!
//! This crate provides:
//! - TOML service configuration with defaults and validation
//! - Tracing subscriber setup
//! - Idempotency cache with memory, file and disabled backends
//! - `DecisionService`: parse, validate, decide, replay, batch
//! - Request/candle loading from JSON and CSV
//! - Deterministic synthetic candles

pub mod cache;
pub mod config;
pub mod data_loader;
pub mod logging;
pub mod service;
pub mod synthetic;

pub use cache::{CacheBackend, CacheEntry, CacheError, IdempotencyCache};
pub use config::{CacheBackendKind, ConfigError, ServiceConfig};
pub use data_loader::{load_candles_csv, load_request, request_from_csv, LoadError};
pub use service::{BatchCall, DecisionService, HttpResponse};
pub use synthetic::{generate_candles, generate_universe};
