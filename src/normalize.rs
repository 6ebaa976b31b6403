//! Cross-dialect canonicalization used by the differ.

use regex::Regex;
use std::sync::OnceLock;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedType {
    pub name: String,
    /// `SERIAL`-family types imply auto-increment even though the column
    /// definition never says so explicitly.
    pub implies_auto_increment: bool,
}

/// Case-folds, strips trailing length/precision, and unifies known
/// equivalent spellings (`INT`/`INTEGER`, `VARCHAR`/`CHARACTER VARYING`,
/// `BOOL`/`BOOLEAN`, `SERIAL`/`INTEGER` with an auto-increment flag, and
/// common PostgreSQL UDT names).
pub fn normalize_type(t: &str) -> NormalizedType {
    let trimmed = t.trim();
    let without_size = strip_size_suffix(trimmed);
    let upper = without_size.to_ascii_uppercase();

    let (canonical, implies_auto_increment) = match upper.as_str() {
        "INT" | "INTEGER" | "INT4" | "INT8" | "INT2" | "BIGINT" | "SMALLINT" => {
            (upper.clone(), false)
        }
        "SERIAL" | "SERIAL4" => ("INTEGER".to_string(), true),
        "BIGSERIAL" | "SERIAL8" => ("BIGINT".to_string(), true),
        "SMALLSERIAL" | "SERIAL2" => ("SMALLINT".to_string(), true),
        "VARCHAR" | "CHARACTER VARYING" => ("VARCHAR".to_string(), false),
        "CHAR" | "CHARACTER" | "BPCHAR" => ("CHAR".to_string(), false),
        "TEXT" => ("TEXT".to_string(), false),
        "BOOL" | "BOOLEAN" => ("BOOLEAN".to_string(), false),
        "FLOAT4" | "REAL" => ("REAL".to_string(), false),
        "FLOAT8" | "DOUBLE PRECISION" => ("DOUBLE PRECISION".to_string(), false),
        "NUMERIC" | "DECIMAL" => ("NUMERIC".to_string(), false),
        "TIMESTAMPTZ" | "TIMESTAMP WITH TIME ZONE" => {
            ("TIMESTAMP WITH TIME ZONE".to_string(), false)
        }
        "TIMESTAMP" | "TIMESTAMP WITHOUT TIME ZONE" => ("TIMESTAMP".to_string(), false),
        "TIMETZ" | "TIME WITH TIME ZONE" => ("TIME WITH TIME ZONE".to_string(), false),
        "TIME" | "TIME WITHOUT TIME ZONE" => ("TIME".to_string(), false),
        "UUID" => ("UUID".to_string(), false),
        "JSON" => ("JSON".to_string(), false),
        "JSONB" => ("JSONB".to_string(), false),
        "BYTEA" => ("BYTEA".to_string(), false),
        other => (other.to_string(), false),
    };

    NormalizedType {
        name: canonical,
        implies_auto_increment,
    }
}

fn strip_size_suffix(t: &str) -> &str {
    match t.find('(') {
        Some(idx) => t[..idx].trim_end(),
        None => t,
    }
}

fn is_boolean_type(normalized_type: &str) -> bool {
    normalized_type.eq_ignore_ascii_case("BOOLEAN")
}

/// Strips a trailing PostgreSQL type cast (`'x'::typename` or
/// `x::typename`, where `typename` may be schema-qualified and may carry
/// its own parenthesized precision), keeping only the leftmost literal.
/// Only the *last* `::` is treated as a cast — a value containing `::`
/// earlier is preserved apart from that trailing cast. Surrounding single
/// quotes are then stripped, and `true`/`false`/numeric-zero values are
/// normalized relative to the column's semantic type.
pub fn normalize_default(v: &str, column_type: &str) -> String {
    let v = v.trim();
    if v.is_empty() || v.eq_ignore_ascii_case("null") {
        return String::new();
    }

    let without_cast = match v.rfind("::") {
        Some(idx) => v[..idx].trim(),
        None => v,
    };

    let unquoted = strip_surrounding_quotes(without_cast);

    let normalized_type = normalize_type(column_type);
    if is_boolean_type(&normalized_type.name) {
        if unquoted == "0" {
            return "false".to_string();
        }
        if unquoted == "1" {
            return "true".to_string();
        }
        return unquoted.to_ascii_lowercase();
    }

    if unquoted.eq_ignore_ascii_case("true") || unquoted.eq_ignore_ascii_case("false") {
        return unquoted.to_ascii_lowercase();
    }

    unquoted.to_string()
}

fn strip_surrounding_quotes(v: &str) -> &str {
    if v.len() >= 2 && v.starts_with('\'') && v.ends_with('\'') {
        &v[1..v.len() - 1]
    } else {
        v
    }
}

fn function_call_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*\s*\([^)]*\)$").unwrap())
}

const KNOWN_EXPR_KEYWORDS: &[&str] = &[
    "CURRENT_TIMESTAMP",
    "CURRENT_DATE",
    "CURRENT_TIME",
    "CURRENT_USER",
    "LOCALTIME",
    "LOCALTIMESTAMP",
];

/// Recognizes function-call defaults (`NOW()`, `CURRENT_TIMESTAMP`,
/// `gen_random_uuid()`, ...) so the differ can record them under
/// `default_expr` rather than `default`.
pub fn is_default_expr(v: &str) -> bool {
    let trimmed = v.trim();
    if trimmed.is_empty() {
        return false;
    }
    let upper = trimmed.to_ascii_uppercase();
    if KNOWN_EXPR_KEYWORDS.contains(&upper.as_str()) {
        return true;
    }
    function_call_pattern().is_match(trimmed)
}

/// A database-side index whose name follows `<table>_..._key` is the
/// convention PostgreSQL uses for indexes created implicitly by a UNIQUE
/// constraint; such indexes are excluded from diff comparison.
pub fn is_constraint_based_unique_index(index_name: &str, table_name: &str) -> bool {
    let prefix = format!("{}_", table_name);
    index_name.starts_with(&prefix) && index_name.ends_with("_key")
}
