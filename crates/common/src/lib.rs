//! Common utilities and shared types for facility-admin.
//!
//! This crate provides foundational components used across all facility-admin crates:
//!
//! - **Configuration**: Application settings via [`Config`]
//! - **Error handling**: Unified error types via [`AppError`] and [`AppResult`]
//! - **Metrics**: Counters for requests, datastore access and degraded paths via [`Metrics`]
//!
//! # Example
//!
//! ```no_run
//! use facility_admin_common::{AppResult, Config};
//!
//! fn example() -> AppResult<()> {
//!     let config = Config::load()?;
//!     println!("Binding to {}", config.bind_address());
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod metrics;

pub use config::Config;
pub use error::{AppError, AppResult};
pub use metrics::{Metrics, MetricsSnapshot, Timer, get_metrics};
