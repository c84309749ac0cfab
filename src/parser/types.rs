use super::scan::{find_matching, string_end, strip_comments, Dialect};
use crate::model::{Diagnostic, DiagnosticKind, Extraction, Source, TypeSnapshot};
use regex::Regex;
use std::sync::LazyLock;

static ROW_BLOCK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?:"([^"]+)"|'([^']+)'|\b([A-Za-z_$][\w$]*))\s*:\s*\{\s*Row\s*:\s*\{"#,
    )
    .unwrap()
});

/// Reads `<table>: { Row: { ... } }` declarations from a generated type file.
pub fn extract_types(source: &Source) -> Extraction<TypeSnapshot> {
    let text = strip_comments(&source.text, Dialect::TypeScript);
    let mut snapshot = TypeSnapshot::new();
    let mut diagnostics = Vec::new();

    for caps in ROW_BLOCK_RE.captures_iter(&text) {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        let Some(table) = caps.get(1).or(caps.get(2)).or(caps.get(3)) else {
            continue;
        };
        let table = table.as_str();

        let open = whole.end() - 1;
        let Some(close) = find_matching(&text, open, Dialect::TypeScript) else {
            diagnostics.push(Diagnostic::new(
                &source.name,
                DiagnosticKind::ParseSkip,
                format!("{table}: unbalanced Row block, skipped"),
            ));
            continue;
        };

        snapshot.columns.insert_table(table);
        for field in member_keys(&text[open + 1..close]) {
            snapshot.columns.insert_column(table, field);
        }
    }

    tracing::debug!(tables = snapshot.columns.len(), "type snapshot built");
    Extraction::new(snapshot, diagnostics)
}

fn is_ident_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_' || b == b'$'
}

fn is_ident_continue(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'$'
}

fn skip_spaces(bytes: &[u8], mut i: usize) -> usize {
    while i < bytes.len() && matches!(bytes[i], b' ' | b'\t' | b'\r') {
        i += 1;
    }
    i
}

/// `name:` or `name?:` right after `end`, but not `::`.
fn followed_by_colon(bytes: &[u8], end: usize) -> bool {
    let mut j = skip_spaces(bytes, end);
    if bytes.get(j) == Some(&b'?') {
        j = skip_spaces(bytes, j + 1);
    }
    bytes.get(j) == Some(&b':') && bytes.get(j + 1) != Some(&b':')
}

/// Member keys declared directly in an object type body.
///
/// Keys of nested object types (anything inside `{}`, `()` or `[]`) are not
/// members of this body and are skipped.
pub(crate) fn member_keys(body: &str) -> Vec<String> {
    let bytes = body.as_bytes();
    let mut keys = Vec::new();
    let mut depth = 0usize;
    let mut member_start = true;
    let mut i = 0;

    while i < bytes.len() {
        if let Some(end) = string_end(bytes, i, Dialect::TypeScript) {
            if depth == 0 && member_start && end > i + 1 && followed_by_colon(bytes, end) {
                keys.push(body[i + 1..end - 1].to_string());
            }
            member_start = false;
            i = end;
            continue;
        }

        match bytes[i] {
            b'{' | b'(' | b'[' => {
                depth += 1;
                member_start = false;
            }
            b'}' | b')' | b']' => {
                depth = depth.saturating_sub(1);
                member_start = false;
            }
            b';' | b',' | b'\n' if depth == 0 => member_start = true,
            b if b.is_ascii_whitespace() => {}
            b if is_ident_start(b) => {
                let start = i;
                while i < bytes.len() && is_ident_continue(bytes[i]) {
                    i += 1;
                }
                let ident = &body[start..i];
                if depth == 0 && member_start {
                    if ident == "readonly" && !followed_by_colon(bytes, i) {
                        continue;
                    }
                    if followed_by_colon(bytes, i) {
                        keys.push(ident.to_string());
                    }
                }
                member_start = false;
                continue;
            }
            _ => member_start = false,
        }
        i += 1;
    }

    keys
}
