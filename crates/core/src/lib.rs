//! Moderation logic for facility-admin.
//!
//! Services combine repository reads into the views the admin console
//! shows: threaded comments with like counts, report summaries and
//! category statistics.

pub mod services;

pub use services::*;
