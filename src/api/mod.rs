//! High-level API for embedding driftcheck in other tools.
//!
//! [`verify`] mirrors the CLI: it loads the configured inputs, runs the
//! three extractors and compares their snapshots.
//!
//! # Example
//!
//! ```no_run
//! use driftcheck::api::{verify, VerifyOptions};
//! use driftcheck::report::{render_text, Check};
//!
//! let options = VerifyOptions::in_project(".").with_check(Check::Sync);
//! let result = verify(&options).unwrap();
//!
//! print!("{}", render_text(&result.report, result.check));
//! std::process::exit(result.status().code().into());
//! ```

mod error;
mod options;
mod results;

pub use error::{Error, InputKind, Result};
pub use options::{
    VerifyOptions, DEFAULT_MIGRATIONS_DIR, DEFAULT_MODULES_DIR, DEFAULT_MODULE_FILE,
    DEFAULT_TYPES_FILE,
};
pub use results::VerifyResult;

use crate::drift::{analyze, Comparison};
use crate::filter::TableFilter;
use crate::model::{Diagnostic, Extraction, TypeSnapshot, UsageSnapshot};
use crate::parser::{
    extract_schema, extract_types, extract_usage, load_migrations, load_modules, load_type_file,
};

// ============================================================================
// Helper functions
// ============================================================================

fn log_diagnostic(diagnostic: &Diagnostic) {
    if diagnostic.is_warning() {
        tracing::warn!(source = %diagnostic.source, kind = ?diagnostic.kind, "{}", diagnostic.message);
    } else {
        tracing::debug!(source = %diagnostic.source, kind = ?diagnostic.kind, "{}", diagnostic.message);
    }
}

fn collect<T>(extraction: Extraction<T>, diagnostics: &mut Vec<Diagnostic>) -> T {
    extraction.diagnostics.iter().for_each(log_diagnostic);
    diagnostics.extend(extraction.diagnostics);
    extraction.snapshot
}

// ============================================================================
// Public API
// ============================================================================

/// Runs the comparisons selected by `options.check`.
///
/// Only the inputs those comparisons need are read; a missing one is an
/// [`Error::MissingInput`]. Drift is reported through the result, never as an
/// error.
pub fn verify(options: &VerifyOptions) -> Result<VerifyResult> {
    let filter = TableFilter::new(&options.include_tables, &options.exclude_tables)
        .map_err(|e| Error::invalid_filter(e.to_string()))?;
    let check = options.check;
    let mut diagnostics = Vec::new();

    let migrations = load_migrations(&options.migrations_dir)?;
    tracing::debug!(files = migrations.len(), "extracting schema");
    let schema = collect(extract_schema(&migrations), &mut diagnostics);

    let types = if check.needs_types() {
        let source = load_type_file(&options.types_file)?;
        tracing::debug!(file = %source.name, "extracting types");
        collect(extract_types(&source), &mut diagnostics)
    } else {
        TypeSnapshot::default()
    };

    let usage = if check.needs_modules() {
        let modules = load_modules(&options.modules_dir, &options.module_file_name)?;
        tracing::debug!(modules = modules.len(), "extracting usage");
        collect(extract_usage(&modules, options.pairing), &mut diagnostics)
    } else {
        UsageSnapshot::default()
    };

    let mut report = analyze(&schema, &types, &usage);
    for comparison in Comparison::ALL {
        if !check.includes(comparison) {
            report.discard(comparison);
        }
    }
    if !filter.is_empty() {
        report.retain_tables(&filter);
    }

    tracing::info!(
        tables = report.tables.len(),
        foreign_keys = report.foreign_keys.len(),
        diagnostics = diagnostics.len(),
        "analysis complete"
    );

    Ok(VerifyResult {
        report,
        diagnostics,
        check,
    })
}
