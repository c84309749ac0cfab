//! Convenient re-exports for common driftcheck usage.
//!
//! # Example
//!
//! ```no_run
//! use driftcheck::prelude::*;
//!
//! let options = VerifyOptions::in_project(".").with_check(Check::Usage);
//! let result = verify(&options).unwrap();
//! println!("{} tables analyzed", result.report.tables.len());
//! ```

pub use crate::api::{verify, Error, InputKind, VerifyOptions, VerifyResult};

pub use crate::drift::{analyze, Comparison, ComparisonSummary, DriftReport, TableDrift};
pub use crate::filter::TableFilter;
pub use crate::model::{
    ColumnSet, Diagnostic, DiagnosticKind, ForeignKeyEdge, SchemaSnapshot, Source, TypeSnapshot,
    UsageSnapshot,
};
pub use crate::parser::{extract_schema, extract_types, extract_usage, PairingPolicy};
pub use crate::report::{exit_status, render_json, render_text, Check, ExitStatus};
