use super::scan::{
    find_matching, find_statement_end, object_name, split_top_level, strip_comments, unquote,
    Dialect,
};
use crate::model::{Diagnostic, DiagnosticKind, Extraction, ForeignKeyEdge, SchemaSnapshot, Source};
use regex::Regex;
use std::ops::Range;
use std::sync::LazyLock;

const NAME: &str = r#"(?:"[^"]+"|[A-Za-z_][\w$]*)(?:\s*\.\s*(?:"[^"]+"|[A-Za-z_][\w$]*))?"#;

static CREATE_TABLE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?i)\bCREATE\s+(?:OR\s+REPLACE\s+)?(?:(?:GLOBAL|LOCAL)\s+)?(?:(?:TEMP|TEMPORARY|UNLOGGED)\s+)?TABLE\s+(?:IF\s+NOT\s+EXISTS\s+)?({NAME})\s*\("
    ))
    .unwrap()
});

static ALTER_TABLE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?i)\bALTER\s+TABLE\s+(?:IF\s+EXISTS\s+)?(?:ONLY\s+)?({NAME})\s+"
    ))
    .unwrap()
});

static DROP_TABLE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"(?i)\bDROP\s+TABLE\s+(?:IF\s+EXISTS\s+)?({NAME})")).unwrap()
});

static REFERENCES_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r#"(?i)\bREFERENCES\s+({NAME})\s*\(\s*("[^"]+"|[A-Za-z_][\w$]*)\s*\)"#
    ))
    .unwrap()
});

static TABLE_FOREIGN_KEY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r#"(?is)\bFOREIGN\s+KEY\s*\(\s*("[^"]+"|[A-Za-z_][\w$]*)\s*\)\s*REFERENCES\s+({NAME})\s*\(\s*("[^"]+"|[A-Za-z_][\w$]*)\s*\)"#
    ))
    .unwrap()
});

static LEADING_IDENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"^(?:"([^"]+)"|([A-Za-z_][\w$]*))"#).unwrap());

static ADD_ACTION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?is)^ADD\s+(COLUMN\s+)?(?:IF\s+NOT\s+EXISTS\s+)?(?:"([^"]+)"|([A-Za-z_][\w$]*))"#,
    )
    .unwrap()
});

/// Leading tokens of table-level clauses inside a CREATE TABLE body.
const CONSTRAINT_KEYWORDS: [&str; 8] = [
    "PRIMARY",
    "FOREIGN",
    "UNIQUE",
    "CHECK",
    "CONSTRAINT",
    "INDEX",
    "EXCLUDE",
    "LIKE",
];

fn is_constraint_keyword(token: &str) -> bool {
    CONSTRAINT_KEYWORDS
        .iter()
        .any(|kw| kw.eq_ignore_ascii_case(token))
}

/// Leading identifier of a clause. Quoted identifiers are never keywords.
fn leading_identifier(clause: &str) -> Option<(String, bool)> {
    let caps = LEADING_IDENT_RE.captures(clause.trim_start())?;
    if let Some(quoted) = caps.get(1) {
        return Some((quoted.as_str().to_string(), true));
    }
    caps.get(2).map(|m| (m.as_str().to_string(), false))
}

/// Builds the authoritative schema from migration files, in the order given.
///
/// The caller supplies the files already sorted by name. Columns accumulate
/// across files and are never removed.
pub fn extract_schema(migrations: &[Source]) -> Extraction<SchemaSnapshot> {
    let mut schema = SchemaSnapshot::new();
    let mut diagnostics = Vec::new();

    for migration in migrations {
        let before = schema.columns.column_count();
        let mut file = FileExtractor {
            source: &migration.name,
            schema: &mut schema,
            diagnostics: &mut diagnostics,
        };
        file.extract(&migration.text);
        tracing::debug!(
            file = %migration.name,
            added_columns = schema.columns.column_count() - before,
            "extracted migration"
        );
    }

    tracing::debug!(
        tables = schema.columns.len(),
        foreign_keys = schema.foreign_keys.len(),
        "schema snapshot built"
    );
    Extraction::new(schema, diagnostics)
}

struct FileExtractor<'a> {
    source: &'a str,
    schema: &'a mut SchemaSnapshot,
    diagnostics: &'a mut Vec<Diagnostic>,
}

impl FileExtractor<'_> {
    fn extract(&mut self, text: &str) {
        let sql = strip_comments(text, Dialect::Sql);

        let creates = self.create_tables(&sql);
        let alter_spans = self.alter_tables(&sql);
        self.drop_tables(&sql);
        self.inline_references(&sql, &creates, &alter_spans);
    }

    fn skip(&mut self, kind: DiagnosticKind, message: String) {
        self.diagnostics
            .push(Diagnostic::new(self.source, kind, message));
    }

    fn add_edge(&mut self, edge: ForeignKeyEdge) {
        if !self.schema.foreign_keys.contains(&edge) {
            self.schema.foreign_keys.push(edge);
        }
    }

    /// Returns `(offset, table)` for every CREATE TABLE head, in file order.
    fn create_tables(&mut self, sql: &str) -> Vec<(usize, String)> {
        let mut heads = Vec::new();

        for caps in CREATE_TABLE_RE.captures_iter(sql) {
            let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            let table = object_name(name.as_str());
            heads.push((whole.start(), table.clone()));

            let open = whole.end() - 1;
            let Some(close) = find_matching(sql, open, Dialect::Sql) else {
                self.skip(
                    DiagnosticKind::ParseSkip,
                    format!("CREATE TABLE {table}: unbalanced parentheses, body skipped"),
                );
                self.schema.columns.insert_table(table);
                continue;
            };

            self.schema.columns.insert_table(table.clone());
            self.table_body(&table, &sql[open + 1..close]);
        }

        heads
    }

    fn table_body(&mut self, table: &str, body: &str) {
        if body.trim().is_empty() {
            return;
        }

        for clause in split_top_level(body, b',', Dialect::Sql) {
            let clause = clause.trim();
            let Some((ident, quoted)) = leading_identifier(clause) else {
                self.skip(
                    DiagnosticKind::ParseSkip,
                    format!("{table}: unrecognized clause `{}`", abbreviate(clause)),
                );
                continue;
            };

            if !quoted && is_constraint_keyword(&ident) {
                if let Some(caps) = TABLE_FOREIGN_KEY_RE.captures(clause) {
                    self.add_edge(ForeignKeyEdge::new(
                        table,
                        unquote(&caps[1]),
                        object_name(&caps[2]),
                        unquote(&caps[3]),
                    ));
                }
                continue;
            }

            self.schema.columns.insert_column(table, ident);
        }
    }

    /// Returns the byte ranges covered by ALTER TABLE statements.
    fn alter_tables(&mut self, sql: &str) -> Vec<Range<usize>> {
        let mut spans = Vec::new();

        for caps in ALTER_TABLE_RE.captures_iter(sql) {
            let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            let table = object_name(name.as_str());
            let end = find_statement_end(sql, whole.end(), Dialect::Sql);
            spans.push(whole.start()..end);

            for action in split_top_level(&sql[whole.end()..end], b',', Dialect::Sql) {
                self.alter_action(&table, action.trim());
            }
        }

        spans
    }

    fn alter_action(&mut self, table: &str, action: &str) {
        if let Some(caps) = ADD_ACTION_RE.captures(action) {
            let has_column_keyword = caps.get(1).is_some();
            let (name, quoted) = match (caps.get(2), caps.get(3)) {
                (Some(q), _) => (q.as_str(), true),
                (None, Some(n)) => (n.as_str(), false),
                (None, None) => return,
            };

            if !has_column_keyword && !quoted && is_constraint_keyword(name) {
                if let Some(fk) = TABLE_FOREIGN_KEY_RE.captures(action) {
                    self.add_edge(ForeignKeyEdge::new(
                        table,
                        unquote(&fk[1]),
                        object_name(&fk[2]),
                        unquote(&fk[3]),
                    ));
                }
                return;
            }

            self.schema.columns.insert_column(table, name);
            if let Some(reference) = REFERENCES_RE.captures(action) {
                self.add_edge(ForeignKeyEdge::new(
                    table,
                    name,
                    object_name(&reference[1]),
                    unquote(&reference[2]),
                ));
            }
            return;
        }

        let mut words = action.split_whitespace();
        let verb = words.next().unwrap_or_default();
        let target = words.next().unwrap_or_default();
        let touches_columns = (verb.eq_ignore_ascii_case("DROP")
            || verb.eq_ignore_ascii_case("RENAME"))
            && !is_constraint_keyword(target);
        if touches_columns {
            tracing::warn!(
                file = %self.source,
                table,
                "ignoring `{}`: columns are never removed or renamed in the snapshot",
                abbreviate(action)
            );
            self.skip(
                DiagnosticKind::UnsupportedStatement,
                format!("ALTER TABLE {table} {}: ignored", abbreviate(action)),
            );
        } else {
            tracing::debug!(file = %self.source, table, "skipping `{}`", abbreviate(action));
        }
    }

    fn drop_tables(&mut self, sql: &str) {
        for caps in DROP_TABLE_RE.captures_iter(sql) {
            let table = object_name(&caps[1]);
            tracing::warn!(file = %self.source, table = %table, "ignoring DROP TABLE");
            self.skip(
                DiagnosticKind::UnsupportedStatement,
                format!("DROP TABLE {table}: ignored, recorded columns are kept"),
            );
        }
    }

    /// Column-level `REFERENCES` outside ALTER TABLE statements belong to the
    /// nearest preceding CREATE TABLE.
    fn inline_references(
        &mut self,
        sql: &str,
        creates: &[(usize, String)],
        alter_spans: &[Range<usize>],
    ) {
        for caps in REFERENCES_RE.captures_iter(sql) {
            let Some(whole) = caps.get(0) else {
                continue;
            };
            let at = whole.start();
            if alter_spans.iter().any(|span| span.contains(&at)) {
                continue;
            }

            let clause = clause_before(sql, at);
            let Some((column, quoted)) = leading_identifier(clause) else {
                self.skip(
                    DiagnosticKind::ParseSkip,
                    format!("REFERENCES {}: no source column", &caps[1]),
                );
                continue;
            };
            if !quoted && is_constraint_keyword(&column) {
                // table-level FOREIGN KEY, handled with the table body
                continue;
            }

            let target_table = object_name(&caps[1]);
            let target_column = unquote(&caps[2]).to_string();
            let Some((_, source_table)) = creates.iter().rev().find(|(offset, _)| *offset < at)
            else {
                tracing::warn!(
                    file = %self.source,
                    column = %column,
                    "REFERENCES {target_table}({target_column}) has no preceding CREATE TABLE"
                );
                self.skip(
                    DiagnosticKind::OrphanReference,
                    format!(
                        "{column} REFERENCES {target_table}({target_column}): no preceding CREATE TABLE, edge dropped"
                    ),
                );
                continue;
            };

            self.add_edge(ForeignKeyEdge::new(
                source_table.clone(),
                column,
                target_table,
                target_column,
            ));
        }
    }
}

/// Text of the clause ending at `end`: back to the previous top-level `,`,
/// `;` or unmatched `(`.
fn clause_before(sql: &str, end: usize) -> &str {
    let bytes = sql.as_bytes();
    let mut depth = 0usize;
    let mut i = end;
    while i > 0 {
        i -= 1;
        match bytes[i] {
            b')' => depth += 1,
            b'(' if depth == 0 => return sql[i + 1..end].trim(),
            b'(' => depth -= 1,
            b',' | b';' if depth == 0 => return sql[i + 1..end].trim(),
            _ => {}
        }
    }
    sql[..end].trim()
}

fn abbreviate(fragment: &str) -> String {
    let collapsed = fragment.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.chars().count() > 60 {
        let cut: String = collapsed.chars().take(57).collect();
        format!("{cut}...")
    } else {
        collapsed
    }
}
