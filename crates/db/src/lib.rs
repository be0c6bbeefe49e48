//! Datastore layer for facility-admin.
//!
//! The community tables live in a hosted relational database reached over
//! its REST interface. Repositories build [`query::Query`] values and run
//! them through an injected [`client::DataSource`].

pub mod client;
pub mod entities;
pub mod pagination;
pub mod query;
pub mod repositories;
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

use std::sync::Arc;

use facility_admin_common::{AppResult, Config};
use tracing::info;

pub use client::{DataSource, RestClient, Rows, SharedDataSource};
pub use pagination::{PageRequest, Paginated, PaginationMeta};

/// Build the datastore client described by `config`.
pub fn init(config: &Config) -> AppResult<SharedDataSource> {
    let client = RestClient::new(&config.datastore)?;
    info!(url = %config.datastore.url, "Datastore client ready");
    Ok(Arc::new(client))
}
