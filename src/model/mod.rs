use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Table name to column names. Names are compared exactly (case-sensitive).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct ColumnSet {
    tables: BTreeMap<String, BTreeSet<String>>,
}

impl ColumnSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a table without columns. Existing columns are kept.
    pub fn insert_table(&mut self, table: impl Into<String>) {
        self.tables.entry(table.into()).or_default();
    }

    /// Adds a column, creating the table entry if needed.
    /// Returns `true` when the column was not already present.
    pub fn insert_column(&mut self, table: impl Into<String>, column: impl Into<String>) -> bool {
        self.tables
            .entry(table.into())
            .or_default()
            .insert(column.into())
    }

    pub fn columns(&self, table: &str) -> Option<&BTreeSet<String>> {
        self.tables.get(table)
    }

    pub fn contains_table(&self, table: &str) -> bool {
        self.tables.contains_key(table)
    }

    pub fn contains_column(&self, table: &str, column: &str) -> bool {
        self.tables
            .get(table)
            .is_some_and(|columns| columns.contains(column))
    }

    pub fn table_names(&self) -> impl Iterator<Item = &str> {
        self.tables.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &BTreeSet<String>)> {
        self.tables.iter().map(|(name, cols)| (name.as_str(), cols))
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    pub fn column_count(&self) -> usize {
        self.tables.values().map(BTreeSet::len).sum()
    }
}

impl<T, C> FromIterator<(T, C)> for ColumnSet
where
    T: Into<String>,
    C: IntoIterator,
    C::Item: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (T, C)>>(iter: I) -> Self {
        let mut set = ColumnSet::new();
        for (table, columns) in iter {
            let table = table.into();
            set.insert_table(table.clone());
            for column in columns {
                set.insert_column(table.clone(), column);
            }
        }
        set
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ForeignKeyEdge {
    pub source_table: String,
    pub source_column: String,
    pub target_table: String,
    pub target_column: String,
}

impl ForeignKeyEdge {
    pub fn new(
        source_table: impl Into<String>,
        source_column: impl Into<String>,
        target_table: impl Into<String>,
        target_column: impl Into<String>,
    ) -> Self {
        Self {
            source_table: source_table.into(),
            source_column: source_column.into(),
            target_table: target_table.into(),
            target_column: target_column.into(),
        }
    }
}

/// Authoritative schema accumulated from the migration history.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SchemaSnapshot {
    pub columns: ColumnSet,
    pub foreign_keys: Vec<ForeignKeyEdge>,
}

impl SchemaSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_foreign_key(&self, source_table: &str, source_column: &str) -> bool {
        self.foreign_keys
            .iter()
            .any(|fk| fk.source_table == source_table && fk.source_column == source_column)
    }

    pub fn fingerprint(&self) -> String {
        fingerprint_of(self)
    }
}

/// What application code believes the schema looks like.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TypeSnapshot {
    pub columns: ColumnSet,
}

impl TypeSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fingerprint(&self) -> String {
        fingerprint_of(self)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ModuleUsage {
    pub tables: BTreeSet<String>,
    pub columns: BTreeSet<String>,
}

/// An `_id` equality predicate that looks like a join key.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RelationCandidate {
    pub module: String,
    pub column: String,
    /// Tables the predicate was paired with.
    pub tables: BTreeSet<String>,
    /// Second argument of the call when it is a plain identifier.
    pub argument: Option<String>,
}

/// Column usage observed in data-access modules.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct UsageSnapshot {
    pub modules: BTreeMap<String, ModuleUsage>,
    pub columns: ColumnSet,
    pub relation_candidates: Vec<RelationCandidate>,
}

impl UsageSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn candidates_for_table<'a>(
        &'a self,
        table: &'a str,
    ) -> impl Iterator<Item = &'a RelationCandidate> + 'a {
        self.relation_candidates
            .iter()
            .filter(move |candidate| candidate.tables.contains(table))
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// Malformed or unrecognized fragment, skipped.
    ParseSkip,
    /// Statement outside the supported subset (DROP, RENAME, ...), ignored.
    UnsupportedStatement,
    /// REFERENCES clause with no enclosing CREATE TABLE.
    OrphanReference,
    /// Predicate column with no table-selection call before it.
    UnpairedPredicate,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Diagnostic {
    /// File or module the fragment came from.
    pub source: String,
    pub kind: DiagnosticKind,
    pub message: String,
}

impl Diagnostic {
    pub fn new(source: impl Into<String>, kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            kind,
            message: message.into(),
        }
    }

    pub fn is_warning(&self) -> bool {
        matches!(
            self.kind,
            DiagnosticKind::UnsupportedStatement | DiagnosticKind::OrphanReference
        )
    }
}

/// Output of an extractor: the snapshot plus whatever it had to skip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extraction<T> {
    pub snapshot: T,
    pub diagnostics: Vec<Diagnostic>,
}

impl<T> Extraction<T> {
    pub fn new(snapshot: T, diagnostics: Vec<Diagnostic>) -> Self {
        Self {
            snapshot,
            diagnostics,
        }
    }
}

/// A named input text (migration file, type file or module).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Source {
    pub name: String,
    pub text: String,
}

impl Source {
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: text.into(),
        }
    }
}

fn fingerprint_of<T: Serialize>(value: &T) -> String {
    use sha2::{Digest, Sha256};
    let json = serde_json::to_string(value).expect("snapshot must serialize");
    let hash = Sha256::digest(json.as_bytes());
    hex::encode(hash)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_set_keeps_existing_columns_on_reinsert() {
        let mut set = ColumnSet::new();
        set.insert_column("users", "id");
        set.insert_table("users");
        assert!(set.contains_column("users", "id"));
        assert!(!set.insert_column("users", "id"));
        assert_eq!(set.column_count(), 1);
    }

    #[test]
    fn column_set_from_iter() {
        let set: ColumnSet = [("users", vec!["id", "email"]), ("empty", vec![])]
            .into_iter()
            .collect();
        assert_eq!(set.len(), 2);
        assert!(set.contains_table("empty"));
        assert!(set.columns("empty").unwrap().is_empty());
        assert!(set.contains_column("users", "email"));
    }

    #[test]
    fn column_names_are_case_sensitive() {
        let set: ColumnSet = [("users", vec!["Email"])].into_iter().collect();
        assert!(!set.contains_column("users", "email"));
    }

    #[test]
    fn same_snapshot_produces_same_fingerprint() {
        let mut a = SchemaSnapshot::new();
        a.columns.insert_column("t", "a");
        let b = a.clone();
        assert_eq!(a.fingerprint(), b.fingerprint());

        let mut c = a.clone();
        c.columns.insert_column("t", "b");
        assert_ne!(a.fingerprint(), c.fingerprint());
    }

    #[test]
    fn has_foreign_key_matches_source_pair() {
        let mut schema = SchemaSnapshot::new();
        schema
            .foreign_keys
            .push(ForeignKeyEdge::new("bilans", "consultant_id", "profiles", "id"));
        assert!(schema.has_foreign_key("bilans", "consultant_id"));
        assert!(!schema.has_foreign_key("profiles", "consultant_id"));
    }
}
