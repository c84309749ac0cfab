use crate::filter::TableFilter;
use crate::model::{ColumnSet, ForeignKeyEdge, SchemaSnapshot, TypeSnapshot, UsageSnapshot};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// The three independent comparisons made for every table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Comparison {
    /// Schema against the generated types.
    Sync,
    /// Columns used by data-access code against the schema.
    Usage,
    /// `_id` predicates against declared foreign keys. Advisory.
    Relations,
}

impl Comparison {
    pub const ALL: [Comparison; 3] = [Comparison::Sync, Comparison::Usage, Comparison::Relations];

    /// Advisory comparisons never fail a run.
    pub fn is_advisory(&self) -> bool {
        matches!(self, Comparison::Relations)
    }
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Comparison::Sync => "sync",
            Comparison::Usage => "usage",
            Comparison::Relations => "relations",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UndeclaredRelation {
    pub module: String,
    pub column: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableDrift {
    /// Used by data-access code, absent from the schema.
    pub phantom_backend: BTreeSet<String>,
    /// In the schema, absent from the types.
    pub missing_in_types: BTreeSet<String>,
    /// In the types, absent from the schema.
    pub missing_in_sql: BTreeSet<String>,
    pub undeclared_relations: BTreeSet<UndeclaredRelation>,
}

impl TableDrift {
    pub fn is_dirty(&self) -> bool {
        !self.phantom_backend.is_empty()
    }

    pub fn is_synchronized(&self) -> bool {
        self.missing_in_types.is_empty() && self.missing_in_sql.is_empty()
    }

    pub fn is_clean(&self, comparison: Comparison) -> bool {
        match comparison {
            Comparison::Sync => self.is_synchronized(),
            Comparison::Usage => !self.is_dirty(),
            Comparison::Relations => self.undeclared_relations.is_empty(),
        }
    }

    /// Number of drifted columns (or findings) for a comparison.
    pub fn issue_count(&self, comparison: Comparison) -> usize {
        match comparison {
            Comparison::Sync => self.missing_in_types.len() + self.missing_in_sql.len(),
            Comparison::Usage => self.phantom_backend.len(),
            Comparison::Relations => self.undeclared_relations.len(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComparisonSummary {
    pub total: usize,
    pub clean: usize,
    pub dirty: usize,
}

impl ComparisonSummary {
    /// Percentage of clean tables. An empty run is fully clean.
    pub fn score(&self) -> f64 {
        if self.total == 0 {
            100.0
        } else {
            self.clean as f64 / self.total as f64 * 100.0
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriftReport {
    pub tables: BTreeMap<String, TableDrift>,
    pub foreign_keys: Vec<ForeignKeyEdge>,
    pub relation_candidates: usize,
    pub schema_fingerprint: String,
    pub types_fingerprint: String,
}

impl DriftReport {
    pub fn summary(&self, comparison: Comparison) -> ComparisonSummary {
        let total = self.tables.len();
        let clean = self
            .tables
            .values()
            .filter(|drift| drift.is_clean(comparison))
            .count();
        ComparisonSummary {
            total,
            clean,
            dirty: total - clean,
        }
    }

    pub fn issue_count(&self, comparison: Comparison) -> usize {
        self.tables
            .values()
            .map(|drift| drift.issue_count(comparison))
            .sum()
    }

    /// True when no table drifts on any non-advisory comparison.
    pub fn passed(&self) -> bool {
        self.tables
            .values()
            .all(|drift| !drift.is_dirty() && drift.is_synchronized())
    }

    /// Empties the findings of a comparison that was not run, so its
    /// default inputs do not show up as drift.
    pub fn discard(&mut self, comparison: Comparison) {
        for drift in self.tables.values_mut() {
            match comparison {
                Comparison::Sync => {
                    drift.missing_in_types.clear();
                    drift.missing_in_sql.clear();
                }
                Comparison::Usage => drift.phantom_backend.clear(),
                Comparison::Relations => drift.undeclared_relations.clear(),
            }
        }
    }

    /// Drops tables the filter rejects, along with the foreign keys they declare.
    pub fn retain_tables(&mut self, filter: &TableFilter) {
        self.tables.retain(|name, _| filter.matches(name));
        self.foreign_keys.retain(|edge| filter.matches(&edge.source_table));
    }
}

fn difference(left: Option<&BTreeSet<String>>, right: Option<&BTreeSet<String>>) -> BTreeSet<String> {
    match (left, right) {
        (Some(left), Some(right)) => left.difference(right).cloned().collect(),
        (Some(left), None) => left.clone(),
        (None, _) => BTreeSet::new(),
    }
}

fn table_names<'a>(sets: &[&'a ColumnSet]) -> BTreeSet<&'a str> {
    sets.iter().flat_map(|set| set.table_names()).collect()
}

/// Compares the three snapshots. Pure: no I/O and the inputs are untouched.
///
/// Every table named by any snapshot gets an entry. Foreign keys are taken
/// from the schema snapshot.
pub fn analyze(schema: &SchemaSnapshot, types: &TypeSnapshot, usage: &UsageSnapshot) -> DriftReport {
    let mut tables = BTreeMap::new();

    for table in table_names(&[&schema.columns, &types.columns, &usage.columns]) {
        let schema_cols = schema.columns.columns(table);
        let type_cols = types.columns.columns(table);
        let usage_cols = usage.columns.columns(table);

        let undeclared_relations = usage
            .candidates_for_table(table)
            .filter(|candidate| !schema.has_foreign_key(table, &candidate.column))
            .map(|candidate| UndeclaredRelation {
                module: candidate.module.clone(),
                column: candidate.column.clone(),
            })
            .collect();

        let drift = TableDrift {
            phantom_backend: difference(usage_cols, schema_cols),
            missing_in_types: difference(schema_cols, type_cols),
            missing_in_sql: difference(type_cols, schema_cols),
            undeclared_relations,
        };
        tables.insert(table.to_string(), drift);
    }

    DriftReport {
        tables,
        foreign_keys: schema.foreign_keys.clone(),
        relation_candidates: usage.relation_candidates.len(),
        schema_fingerprint: schema.fingerprint(),
        types_fingerprint: types.fingerprint(),
    }
}
