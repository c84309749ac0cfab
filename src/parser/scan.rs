//! Quote-aware text primitives shared by the extractors.
//!
//! Nothing here understands SQL or TypeScript grammar. The functions only know
//! where string literals start and end, so that delimiters inside literals are
//! never mistaken for structure.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    /// `'...'`, `"..."` and `$tag$...$tag$` literals, `--` and `/* */` comments.
    Sql,
    /// `'...'`, `"..."` and `` `...` `` literals with backslash escapes,
    /// `//` and `/* */` comments.
    TypeScript,
}

/// If a string literal starts at `start`, returns the index just past its end
/// (or the text length when unterminated).
pub(crate) fn string_end(bytes: &[u8], start: usize, dialect: Dialect) -> Option<usize> {
    let quote = *bytes.get(start)?;
    match (dialect, quote) {
        (Dialect::Sql, b'\'' | b'"') => Some(closing_quote(bytes, start, quote, false)),
        (Dialect::Sql, b'$') => dollar_quote_end(bytes, start),
        (Dialect::TypeScript, b'\'' | b'"' | b'`') => {
            Some(closing_quote(bytes, start, quote, true))
        }
        _ => None,
    }
}

fn closing_quote(bytes: &[u8], start: usize, quote: u8, escapes: bool) -> usize {
    let mut i = start + 1;
    while i < bytes.len() {
        let b = bytes[i];
        if escapes && b == b'\\' {
            i += 2;
            continue;
        }
        if b == quote {
            return i + 1;
        }
        i += 1;
    }
    bytes.len()
}

fn dollar_quote_end(bytes: &[u8], start: usize) -> Option<usize> {
    let mut i = start + 1;
    while i < bytes.len() && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'_') {
        i += 1;
    }
    if i >= bytes.len() || bytes[i] != b'$' {
        return None;
    }
    // `$1` style placeholders are not quotes.
    if i > start + 1 && bytes[start + 1].is_ascii_digit() {
        return None;
    }
    let tag = &bytes[start..=i];
    let body = i + 1;
    let close = bytes[body..]
        .windows(tag.len())
        .position(|window| window == tag)
        .map(|pos| body + pos + tag.len())
        .unwrap_or(bytes.len());
    Some(close)
}

/// Finds the delimiter closing the one at `open_idx`, tracking nesting depth.
///
/// Supports `(`, `[` and `{`. Returns `None` when the text ends first.
pub fn find_matching(text: &str, open_idx: usize, dialect: Dialect) -> Option<usize> {
    let bytes = text.as_bytes();
    let open = *bytes.get(open_idx)?;
    let close = match open {
        b'(' => b')',
        b'[' => b']',
        b'{' => b'}',
        _ => return None,
    };

    let mut depth = 0usize;
    let mut i = open_idx;
    while i < bytes.len() {
        if let Some(end) = string_end(bytes, i, dialect) {
            i = end;
            continue;
        }
        let b = bytes[i];
        if b == open {
            depth += 1;
        } else if b == close {
            depth -= 1;
            if depth == 0 {
                return Some(i);
            }
        }
        i += 1;
    }
    None
}

/// Splits `text` on `sep` occurring outside literals and outside any
/// bracket pair.
pub fn split_top_level(text: &str, sep: u8, dialect: Dialect) -> Vec<&str> {
    let bytes = text.as_bytes();
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    let mut i = 0;

    while i < bytes.len() {
        if let Some(end) = string_end(bytes, i, dialect) {
            i = end;
            continue;
        }
        match bytes[i] {
            b'(' | b'[' | b'{' => depth += 1,
            b')' | b']' | b'}' => depth = depth.saturating_sub(1),
            b if b == sep && depth == 0 => {
                parts.push(&text[start..i]);
                start = i + 1;
            }
            _ => {}
        }
        i += 1;
    }
    parts.push(&text[start..]);
    parts
}

/// Index of the next top-level `;` at or after `from`, or the text length.
pub fn find_statement_end(text: &str, from: usize, dialect: Dialect) -> usize {
    let bytes = text.as_bytes();
    let mut depth = 0usize;
    let mut i = from;

    while i < bytes.len() {
        if let Some(end) = string_end(bytes, i, dialect) {
            i = end;
            continue;
        }
        match bytes[i] {
            b'(' | b'[' | b'{' => depth += 1,
            b')' | b']' | b'}' => depth = depth.saturating_sub(1),
            b';' if depth == 0 => return i,
            _ => {}
        }
        i += 1;
    }
    bytes.len()
}

/// Blanks out comments, keeping byte offsets and newlines intact.
pub fn strip_comments(text: &str, dialect: Dialect) -> String {
    let bytes = text.as_bytes();
    let line_comment: &[u8] = match dialect {
        Dialect::Sql => b"--",
        Dialect::TypeScript => b"//",
    };

    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if let Some(end) = string_end(bytes, i, dialect) {
            out.extend_from_slice(&bytes[i..end]);
            i = end;
            continue;
        }
        if bytes[i..].starts_with(line_comment) {
            while i < bytes.len() && bytes[i] != b'\n' {
                out.push(b' ');
                i += 1;
            }
            continue;
        }
        if bytes[i..].starts_with(b"/*") {
            let end = bytes[i + 2..]
                .windows(2)
                .position(|w| w == b"*/")
                .map(|pos| i + 2 + pos + 2)
                .unwrap_or(bytes.len());
            out.extend(
                bytes[i..end]
                    .iter()
                    .map(|&b| if b == b'\n' { b'\n' } else { b' ' }),
            );
            i = end;
            continue;
        }
        out.push(bytes[i]);
        i += 1;
    }

    // Only whole code points were copied; comment bytes became ASCII spaces.
    String::from_utf8(out).unwrap_or_else(|e| String::from_utf8_lossy(e.as_bytes()).into_owned())
}

/// Strips surrounding double quotes from an identifier.
pub fn unquote(ident: &str) -> &str {
    let ident = ident.trim();
    ident
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(ident)
}

/// `"public"."users"` -> `users`. Tables are keyed by their unqualified name.
pub fn object_name(qualified: &str) -> String {
    let last = qualified.rsplit('.').next().unwrap_or(qualified);
    unquote(last).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn find_matching_skips_nested_parens() {
        let sql = "CREATE TABLE t (a NUMERIC(10, 2), CHECK (a > (0)));";
        let open = sql.find('(').unwrap();
        let close = find_matching(sql, open, Dialect::Sql).unwrap();
        assert_eq!(&sql[close..], ");");
    }

    #[test]
    fn find_matching_ignores_parens_in_literals() {
        let sql = "(a TEXT DEFAULT ')(', b INT)";
        assert_eq!(find_matching(sql, 0, Dialect::Sql), Some(sql.len() - 1));
    }

    #[test]
    fn find_matching_unbalanced_is_none() {
        assert_eq!(find_matching("(a INT, (b", 0, Dialect::Sql), None);
    }

    #[test]
    fn find_matching_braces_in_typescript_strings() {
        let ts = "{ a: '}' ; b: { c: string } }";
        assert_eq!(find_matching(ts, 0, Dialect::TypeScript), Some(ts.len() - 1));
    }

    #[test]
    fn split_top_level_keeps_nested_commas() {
        let parts = split_top_level("a NUMERIC(10, 2), b TEXT, PRIMARY KEY (a, b)", b',', Dialect::Sql);
        let parts: Vec<&str> = parts.iter().map(|p| p.trim()).collect();
        assert_eq!(parts, vec!["a NUMERIC(10, 2)", "b TEXT", "PRIMARY KEY (a, b)"]);
    }

    #[test]
    fn split_top_level_ignores_commas_in_strings() {
        let parts = split_top_level("a TEXT DEFAULT 'x,y', b INT", b',', Dialect::Sql);
        assert_eq!(parts.len(), 2);
    }

    #[test]
    fn statement_end_skips_dollar_quoted_bodies() {
        let sql = "CREATE FUNCTION f() RETURNS void AS $$ BEGIN; END; $$ LANGUAGE plpgsql; SELECT 1;";
        let end = find_statement_end(sql, 0, Dialect::Sql);
        assert!(sql[..end].ends_with("plpgsql"));
    }

    #[test]
    fn dollar_placeholders_are_not_quotes() {
        let sql = "UPDATE t SET a = $1; SELECT 2;";
        let end = find_statement_end(sql, 0, Dialect::Sql);
        assert_eq!(&sql[..end], "UPDATE t SET a = $1");
    }

    #[test]
    fn strip_sql_comments_preserves_offsets() {
        let sql = "a INT, -- note (\nb TEXT /* ) */";
        let stripped = strip_comments(sql, Dialect::Sql);
        assert_eq!(stripped.len(), sql.len());
        assert!(!stripped.contains("note"));
        assert!(!stripped.contains(')'));
        assert!(stripped.contains("b TEXT"));
    }

    #[test]
    fn strip_comments_leaves_literals_alone() {
        let sql = "a TEXT DEFAULT '--not a comment'";
        assert_eq!(strip_comments(sql, Dialect::Sql), sql);
    }

    #[test]
    fn strip_typescript_comments() {
        let ts = "id: string // primary key\nurl: string // 'http://x'";
        let stripped = strip_comments(ts, Dialect::TypeScript);
        assert!(!stripped.contains("primary"));
        assert!(stripped.contains("url: string"));
    }

    #[test]
    fn object_name_drops_schema_and_quotes() {
        assert_eq!(object_name("\"public\".\"users\""), "users");
        assert_eq!(object_name("public.users"), "users");
        assert_eq!(object_name("users"), "users");
    }
}
