//! Row types for the community tables.
//!
//! Each module names its table and exposes a `Column` enum usable in
//! [`Query`](crate::query::Query) filters and orderings.

pub mod comment;
pub mod like;
pub mod post;
pub mod report;
pub mod status;
pub mod user;

pub use status::{ContentStatus, ReportStatus};

/// Declare a `Column` enum whose variants map to datastore column names.
macro_rules! columns {
    ($($variant:ident => $name:literal),+ $(,)?) => {
        /// Columns of this table.
        #[derive(Debug, Clone, Copy)]
        pub enum Column {
            $($variant),+
        }

        impl $crate::query::ColumnRef for Column {
            fn name(&self) -> &str {
                match self {
                    $(Self::$variant => $name),+
                }
            }
        }
    };
}

pub(crate) use columns;
