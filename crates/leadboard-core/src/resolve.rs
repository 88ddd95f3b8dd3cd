//! Field resolution for loosely-keyed spreadsheet rows.
//!
//! Sheet headers drift between edits ("NDA Signed", "nda signed?", "NDA - Signed"),
//! so every lookup goes through [`resolve`], which tries three passes in order:
//!
//! 1. Exact key match (case-sensitive) for any hint.
//! 2. Canonical equality: key and hint both lower-cased with every
//!    non-alphanumeric character stripped ("NDA - Signed" → "ndasigned").
//! 3. Canonical containment: the canonical hint is a substring of the
//!    canonical key ("loiissued" inside "loiissueddate"). Only multi-word
//!    hints take part, so "NDA" never matches "Monday Call".
//!
//! Within a pass the first key in the row's natural order wins. [`RawRow`] is
//! a `BTreeMap`, so natural order is lexicographic and does not depend on the
//! order the keys arrived in.

use std::collections::BTreeMap;

use serde_json::Value;

/// One spreadsheet row as delivered by the sheet endpoint.
pub type RawRow = BTreeMap<String, Value>;

/// Canonicalise a header or hint: lower-case, alphanumerics only.
///
/// "Commodities – PPT (Link)" → "commoditiespptlink"
pub fn canonical_key(s: &str) -> String {
    s.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Find the first non-blank value matching any of `hints`.
///
/// Null values and whitespace-only strings are skipped, so a blank
/// "Customer" cell lets a populated "Company" column win.
pub fn resolve<'a>(row: &'a RawRow, hints: &[&str]) -> Option<&'a Value> {
    find(row, hints, |v| !is_blank(v))
}

/// Resolve `hints` and render the value as trimmed text.
pub fn resolve_text(row: &RawRow, hints: &[&str]) -> Option<String> {
    resolve(row, hints).map(value_text)
}

/// Whether any key in the row matches `hints`, regardless of its value.
pub fn has_field(row: &RawRow, hints: &[&str]) -> bool {
    find(row, hints, |_| true).is_some()
}

/// Strict boolean coercion using spreadsheet conventions.
///
/// Only JSON `true` and the strings "true", "yes", "checked" (any case,
/// surrounding whitespace ignored) are truthy. Numbers are never truthy.
pub fn coerce_bool(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => {
            matches!(s.trim().to_lowercase().as_str(), "true" | "yes" | "checked")
        }
        _ => false,
    }
}

/// Resolve `hints` and coerce the result to a boolean.
pub fn resolve_bool(row: &RawRow, hints: &[&str]) -> bool {
    coerce_bool(resolve(row, hints))
}

/// Render a scalar JSON value as display text.
pub fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.trim().to_string(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

fn is_multi_word(hint: &str) -> bool {
    hint.split_whitespace().nth(1).is_some()
}

fn find<'a>(
    row: &'a RawRow,
    hints: &[&str],
    accept: impl Fn(&Value) -> bool,
) -> Option<&'a Value> {
    // Pass 1: exact key.
    for hint in hints {
        if let Some(v) = row.get(*hint)
            && accept(v)
        {
            return Some(v);
        }
    }

    let canon_hints: Vec<(String, bool)> = hints
        .iter()
        .map(|h| (canonical_key(h), is_multi_word(h)))
        .filter(|(canon, _)| !canon.is_empty())
        .collect();
    let canon_keys: Vec<(String, &Value)> =
        row.iter().map(|(k, v)| (canonical_key(k), v)).collect();

    // Pass 2: canonical equality.
    for (hint, _) in &canon_hints {
        for (key, v) in &canon_keys {
            if key == hint && accept(v) {
                return Some(v);
            }
        }
    }

    // Pass 3: canonical containment, multi-word hints only.
    for (hint, _) in canon_hints.iter().filter(|(_, multi)| *multi) {
        for (key, v) in &canon_keys {
            if key.contains(hint.as_str()) && accept(v) {
                return Some(v);
            }
        }
    }

    None
}
