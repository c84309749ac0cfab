//! driftcheck - static drift detection between a migration history, the
//! types generated from it and the code that queries it.
//!
//! Three extractors turn source texts into snapshots:
//!
//! - SQL migrations → [`model::SchemaSnapshot`] (the authoritative schema)
//! - a generated type file → [`model::TypeSnapshot`]
//! - data-access modules → [`model::UsageSnapshot`]
//!
//! [`drift::analyze`] compares them and [`report`] renders the result.
//!
//! # Quick Start
//!
//! ```no_run
//! use driftcheck::prelude::*;
//!
//! let result = verify(&VerifyOptions::in_project(".")).unwrap();
//! print!("{}", render_text(&result.report, result.check));
//! ```
//!
//! # Modules
//!
//! - [`api`] - High-level API mirroring the CLI
//! - [`prelude`] - Convenient re-exports for common usage
//! - [`parser`] - Loaders and tolerant extractors
//! - [`drift`] - Snapshot comparison
//! - [`filter`] - Table filtering by glob

pub mod api;
pub mod drift;
pub mod filter;
pub mod model;
pub mod parser;
pub mod prelude;
pub mod report;
