//! Command synthesis from result rows.
//!
//! A template such as `PUBLISH {sku} {qty}` is expanded once per row.  Map
//! rows substitute `{field}` by key; scalar rows substitute `{.}`.  Braces
//! that name nothing in the row are left as written, so a typo shows up in
//! the dispatched command instead of silently vanishing.

use tracing::warn;

use super::value::Value;

/// Rows processed per synthesis call unless configured otherwise.
pub const DEFAULT_MAX_ROWS: usize = 10;

/// Expand `template` for each row, up to `max_rows` rows.
pub fn synthesize(template: &str, rows: &[Value], max_rows: usize) -> Vec<String> {
    if rows.len() > max_rows {
        warn!(
            rows = rows.len(),
            max_rows, "synthesis input truncated to the row limit"
        );
    }
    rows.iter()
        .take(max_rows)
        .map(|row| expand_row(template, row))
        .collect()
}

/// Extract the rows a `FOREACH:` directive iterates over.
///
/// Accepts a list directly, a stored result (`{success, payload}`) whose
/// payload is a list, or a map with a `rows` list.  Anything else yields
/// `None`.
pub fn rows_of(value: &Value) -> Option<&[Value]> {
    match value {
        Value::List(items) => Some(items),
        Value::Map(fields) => fields
            .get("payload")
            .or_else(|| fields.get("rows"))
            .and_then(rows_of),
        _ => None,
    }
}

fn expand_row(template: &str, row: &Value) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let Some(close) = after.find('}') else {
            out.push_str(&rest[open..]);
            return out;
        };
        let key = &after[..close];
        match lookup(row, key) {
            // Newlines would split one synthesized command into several.
            Some(v) => out.push_str(&v.to_string().replace(['\r', '\n'], " ")),
            None => {
                out.push('{');
                out.push_str(key);
                out.push('}');
            }
        }
        rest = &after[close + 1..];
    }
    out.push_str(rest);
    out
}

fn lookup<'a>(row: &'a Value, key: &str) -> Option<&'a Value> {
    match (row, key) {
        (Value::Map(_) | Value::List(_), ".") => None,
        (_, ".") => Some(row),
        _ => key.split('.').try_fold(row, |v, seg| v.field(seg)),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
