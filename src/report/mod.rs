use crate::drift::{Comparison, ComparisonSummary, DriftReport, TableDrift};
use crate::model::ForeignKeyEdge;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Which comparisons a run renders and counts towards its exit status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Check {
    #[default]
    All,
    Sync,
    Usage,
    Relations,
}

impl Check {
    pub fn comparisons(&self) -> &'static [Comparison] {
        match self {
            Check::All => &Comparison::ALL,
            Check::Sync => &[Comparison::Sync],
            Check::Usage => &[Comparison::Usage],
            Check::Relations => &[Comparison::Relations],
        }
    }

    pub fn includes(&self, comparison: Comparison) -> bool {
        self.comparisons().contains(&comparison)
    }

    /// The type file is only read by the sync comparison.
    pub fn needs_types(&self) -> bool {
        self.includes(Comparison::Sync)
    }

    pub fn needs_modules(&self) -> bool {
        self.includes(Comparison::Usage) || self.includes(Comparison::Relations)
    }
}

impl fmt::Display for Check {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Check::All => "all",
            Check::Sync => "sync",
            Check::Usage => "usage",
            Check::Relations => "relations",
        };
        write!(f, "{s}")
    }
}

/// Process exit status of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStatus {
    Clean,
    DriftFound,
    Fault,
}

impl ExitStatus {
    pub fn code(&self) -> u8 {
        match self {
            ExitStatus::Clean => 0,
            ExitStatus::DriftFound => 1,
            ExitStatus::Fault => 2,
        }
    }
}

/// Number of failing issues across the selected, non-advisory comparisons.
pub fn failing_issues(report: &DriftReport, check: Check) -> usize {
    check
        .comparisons()
        .iter()
        .filter(|comparison| !comparison.is_advisory())
        .map(|comparison| report.issue_count(*comparison))
        .sum()
}

pub fn exit_status(report: &DriftReport, check: Check) -> ExitStatus {
    if failing_issues(report, check) == 0 {
        ExitStatus::Clean
    } else {
        ExitStatus::DriftFound
    }
}

fn section_title(comparison: Comparison) -> &'static str {
    match comparison {
        Comparison::Sync => "Schema ↔ types synchronization",
        Comparison::Usage => "Backend usage ↔ schema",
        Comparison::Relations => "Relations",
    }
}

fn score_label(comparison: Comparison) -> &'static str {
    match comparison {
        Comparison::Sync => "Sync score",
        Comparison::Usage => "Cleanliness score",
        Comparison::Relations => "Relation score",
    }
}

fn push_summary(output: &mut String, summary: &ComparisonSummary, clean: &str, dirty: &str) {
    output.push_str(&format!("  Tables analyzed: {}\n", summary.total));
    output.push_str(&format!("  ✓ {clean}: {}\n", summary.clean));
    output.push_str(&format!("  ✗ {dirty}: {}\n", summary.dirty));
    output.push('\n');
}

fn push_clean_tables(output: &mut String, report: &DriftReport, comparison: Comparison) {
    let clean: Vec<&str> = report
        .tables
        .iter()
        .filter(|(_, drift)| drift.is_clean(comparison))
        .map(|(name, _)| name.as_str())
        .collect();
    if clean.is_empty() {
        return;
    }

    output.push_str("Clean tables:\n");
    for table in clean {
        output.push_str(&format!("  ✓ {table}\n"));
    }
    output.push('\n');
}

fn push_columns(output: &mut String, label: &str, columns: &BTreeSet<String>) {
    if columns.is_empty() {
        return;
    }
    output.push_str(&format!("    {label}:\n"));
    for column in columns {
        output.push_str(&format!("      - {column}\n"));
    }
}

fn dirty_tables(
    report: &DriftReport,
    comparison: Comparison,
) -> impl Iterator<Item = (&String, &TableDrift)> {
    report
        .tables
        .iter()
        .filter(move |(_, drift)| !drift.is_clean(comparison))
}

fn render_sync(output: &mut String, report: &DriftReport) {
    let summary = report.summary(Comparison::Sync);
    push_summary(output, &summary, "Synchronized", "With drift");
    push_clean_tables(output, report, Comparison::Sync);

    if summary.dirty > 0 {
        output.push_str("Drift detected:\n");
        for (table, drift) in dirty_tables(report, Comparison::Sync) {
            output.push_str(&format!("  Table: {table}\n"));
            push_columns(output, "Missing in types", &drift.missing_in_types);
            push_columns(output, "Missing in SQL", &drift.missing_in_sql);
        }
        output.push('\n');
    }
}

fn render_usage(output: &mut String, report: &DriftReport) {
    let summary = report.summary(Comparison::Usage);
    push_summary(output, &summary, "Clean", "With phantom columns");
    push_clean_tables(output, report, Comparison::Usage);

    if summary.dirty > 0 {
        output.push_str("Phantom columns (used by modules, absent from the schema):\n");
        for (table, drift) in dirty_tables(report, Comparison::Usage) {
            output.push_str(&format!("  Table: {table}\n"));
            push_columns(output, "Phantom", &drift.phantom_backend);
        }
        output.push('\n');
    }
}

fn group_foreign_keys(edges: &[ForeignKeyEdge]) -> BTreeMap<&str, Vec<&ForeignKeyEdge>> {
    let mut grouped: BTreeMap<&str, Vec<&ForeignKeyEdge>> = BTreeMap::new();
    for edge in edges {
        grouped.entry(edge.source_table.as_str()).or_default().push(edge);
    }
    for edges in grouped.values_mut() {
        edges.sort();
    }
    grouped
}

fn render_relations(output: &mut String, report: &DriftReport) {
    let summary = report.summary(Comparison::Relations);
    push_summary(output, &summary, "All relations declared", "With undeclared relations");
    output.push_str(&format!(
        "  Foreign keys declared: {}\n",
        report.foreign_keys.len()
    ));
    output.push_str(&format!(
        "  Relations used by modules: {}\n",
        report.relation_candidates
    ));
    output.push('\n');

    if !report.foreign_keys.is_empty() {
        output.push_str("Declared foreign keys:\n");
        for (table, edges) in group_foreign_keys(&report.foreign_keys) {
            output.push_str(&format!("  Table: {table}\n"));
            for edge in edges {
                output.push_str(&format!(
                    "    {} → {}.{}\n",
                    edge.source_column, edge.target_table, edge.target_column
                ));
            }
        }
        output.push('\n');
    }

    if summary.dirty > 0 {
        output.push_str("Undeclared relations (advisory):\n");
        for (table, drift) in dirty_tables(report, Comparison::Relations) {
            for relation in &drift.undeclared_relations {
                output.push_str(&format!(
                    "  ⚠ {table}.{} used as a join key in module {} without a foreign key\n",
                    relation.column, relation.module
                ));
            }
        }
        output.push('\n');
    }
}

/// Renders the human-readable report. Output depends only on the report
/// contents: tables and columns come out sorted.
pub fn render_text(report: &DriftReport, check: Check) -> String {
    let mut output = String::new();

    output.push_str("=== driftcheck ===\n");
    output.push_str(&format!("Check: {check}\n"));
    output.push_str(&format!("Schema fingerprint: {}\n", report.schema_fingerprint));
    if check.needs_types() {
        output.push_str(&format!("Types fingerprint: {}\n", report.types_fingerprint));
    }
    output.push('\n');

    for comparison in check.comparisons() {
        output.push_str(&format!("== {} ==\n", section_title(*comparison)));
        match comparison {
            Comparison::Sync => render_sync(&mut output, report),
            Comparison::Usage => render_usage(&mut output, report),
            Comparison::Relations => render_relations(&mut output, report),
        }
        if !comparison.is_advisory() {
            let score = report.summary(*comparison).score();
            output.push_str(&format!("{}: {score:.1}%\n", score_label(*comparison)));
            output.push('\n');
        }
    }

    let issues = failing_issues(report, check);
    match exit_status(report, check) {
        ExitStatus::Clean => output.push_str("Result: PASS\n"),
        _ => output.push_str(&format!("Result: FAIL ({issues} issue(s))\n")),
    }

    output
}

#[derive(Serialize)]
struct JsonReport<'a> {
    check: Check,
    passed: bool,
    issues: usize,
    summaries: BTreeMap<Comparison, ComparisonSummary>,
    #[serde(flatten)]
    report: &'a DriftReport,
}

pub fn render_json(report: &DriftReport, check: Check) -> serde_json::Result<String> {
    let summaries = check
        .comparisons()
        .iter()
        .map(|comparison| (*comparison, report.summary(*comparison)))
        .collect();
    let issues = failing_issues(report, check);
    let json = JsonReport {
        check,
        passed: issues == 0,
        issues,
        summaries,
        report,
    };
    serde_json::to_string_pretty(&json)
}
