//! Extractors turning source texts into snapshots.
//!
//! None of them fail: fragments they cannot make sense of are skipped and
//! reported as [`Diagnostic`](crate::model::Diagnostic)s, favoring missed
//! findings over aborted runs.

mod ddl;
mod loader;
pub mod scan;
mod types;
mod usage;

pub use ddl::extract_schema;
pub use loader::{load_migrations, load_modules, load_type_file, module_name};
pub use types::extract_types;
pub use usage::{extract_usage, PairingPolicy};
