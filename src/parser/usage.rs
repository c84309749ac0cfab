use super::scan::{split_top_level, strip_comments, Dialect};
use crate::model::{
    Diagnostic, DiagnosticKind, Extraction, RelationCandidate, Source, UsageSnapshot,
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

static FROM_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\.from\(\s*['"`]([A-Za-z_][\w$]*)['"`]\s*\)"#).unwrap()
});

static PREDICATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"\.(eq|neq|gt|gte|lt|lte|order|filter|like|ilike)\(\s*['"`]([A-Za-z_][\w$]*)['"`]\s*(?:,\s*([A-Za-z_$][\w$.]*)\s*[,)])?"#,
    )
    .unwrap()
});

static OR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"\.or\(\s*['"`]([^'"`]*)['"`]"#).unwrap());

static OR_SEGMENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([A-Za-z_][\w$]*)\.").unwrap());

/// How predicate columns are attributed to tables within a module.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PairingPolicy {
    /// The table of the nearest preceding `.from(...)` call.
    #[default]
    Nearest,
    /// Every table the module selects from. Over-approximates.
    CrossProduct,
}

impl FromStr for PairingPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "nearest" => Ok(PairingPolicy::Nearest),
            "cross-product" | "cross_product" => Ok(PairingPolicy::CrossProduct),
            _ => Err(format!(
                "Invalid pairing policy '{s}'. Valid policies: nearest, cross-product"
            )),
        }
    }
}

impl fmt::Display for PairingPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PairingPolicy::Nearest => write!(f, "nearest"),
            PairingPolicy::CrossProduct => write!(f, "cross-product"),
        }
    }
}

#[derive(Debug)]
enum Event<'a> {
    Table(&'a str),
    Column {
        name: &'a str,
        equality: bool,
        argument: Option<&'a str>,
    },
}

/// Scans data-access modules for table selections and column predicates.
pub fn extract_usage(modules: &[Source], pairing: PairingPolicy) -> Extraction<UsageSnapshot> {
    let mut snapshot = UsageSnapshot::new();
    let mut diagnostics = Vec::new();
    let mut candidates: BTreeMap<(String, String), RelationCandidate> = BTreeMap::new();

    for module in modules {
        let text = strip_comments(&module.text, Dialect::TypeScript);
        let events = module_events(&text);

        // Per file: module names can repeat across directories.
        let mut file_tables: BTreeSet<&str> = BTreeSet::new();
        let mut file_columns: BTreeSet<&str> = BTreeSet::new();
        let mut pairs: Vec<(&str, &str)> = Vec::new();
        let mut relation_uses: Vec<(&str, Option<&str>, Option<&str>)> = Vec::new();
        let mut current_table: Option<&str> = None;

        for (_, event) in &events {
            match *event {
                Event::Table(table) => {
                    file_tables.insert(table);
                    snapshot.columns.insert_table(table);
                    current_table = Some(table);
                }
                Event::Column {
                    name,
                    equality,
                    argument,
                } => {
                    file_columns.insert(name);
                    if equality && name.ends_with("_id") {
                        relation_uses.push((name, current_table, argument));
                    }
                    match (pairing, current_table) {
                        (PairingPolicy::Nearest, Some(table)) => pairs.push((table, name)),
                        (PairingPolicy::Nearest, None) => diagnostics.push(Diagnostic::new(
                            &module.name,
                            DiagnosticKind::UnpairedPredicate,
                            format!("column `{name}` used before any .from(...) call"),
                        )),
                        (PairingPolicy::CrossProduct, _) => {}
                    }
                }
            }
        }

        if pairing == PairingPolicy::CrossProduct {
            for table in &file_tables {
                for column in &file_columns {
                    snapshot.columns.insert_column(*table, *column);
                }
            }
        }
        for (table, column) in pairs {
            snapshot.columns.insert_column(table, column);
        }

        for (column, paired, argument) in relation_uses {
            let tables: BTreeSet<String> = match pairing {
                PairingPolicy::Nearest => paired.map(str::to_string).into_iter().collect(),
                PairingPolicy::CrossProduct => file_tables.iter().map(|t| t.to_string()).collect(),
            };
            let entry = candidates
                .entry((module.name.clone(), column.to_string()))
                .or_insert_with(|| RelationCandidate {
                    module: module.name.clone(),
                    column: column.to_string(),
                    tables: BTreeSet::new(),
                    argument: None,
                });
            entry.tables.extend(tables);
            if entry.argument.is_none() {
                entry.argument = argument.map(str::to_string);
            }
        }

        tracing::debug!(
            module = %module.name,
            tables = file_tables.len(),
            columns = file_columns.len(),
            "scanned module"
        );

        let usage = snapshot.modules.entry(module.name.clone()).or_default();
        usage.tables.extend(file_tables.into_iter().map(str::to_string));
        usage.columns.extend(file_columns.into_iter().map(str::to_string));
    }

    snapshot.relation_candidates = candidates.into_values().collect();
    Extraction::new(snapshot, diagnostics)
}

/// Table selections and column references in source order.
fn module_events(text: &str) -> Vec<(usize, Event<'_>)> {
    let mut events = Vec::new();

    for caps in FROM_RE.captures_iter(text) {
        if let (Some(whole), Some(table)) = (caps.get(0), caps.get(1)) {
            events.push((whole.start(), Event::Table(table.as_str())));
        }
    }

    for caps in PREDICATE_RE.captures_iter(text) {
        if let (Some(whole), Some(op), Some(column)) = (caps.get(0), caps.get(1), caps.get(2)) {
            events.push((
                whole.start(),
                Event::Column {
                    name: column.as_str(),
                    equality: op.as_str() == "eq",
                    argument: caps.get(3).map(|m| m.as_str()),
                },
            ));
        }
    }

    for caps in OR_RE.captures_iter(text) {
        let (Some(whole), Some(filters)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        for segment in split_top_level(filters.as_str(), b',', Dialect::TypeScript) {
            if let Some(column) = OR_SEGMENT_RE.captures(segment.trim()).and_then(|c| c.get(1)) {
                events.push((
                    whole.start(),
                    Event::Column {
                        name: column.as_str(),
                        equality: false,
                        argument: None,
                    },
                ));
            }
        }
    }

    events.sort_by_key(|(offset, _)| *offset);
    events
}
