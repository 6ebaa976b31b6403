//! Dependency graphing.
//!
//! Builds the table foreign-key dependency graph (with self-referencing
//! FKs segregated out) and the function call-graph used to order
//! `CREATE FUNCTION` statements. The function grapher keeps a
//! process-wide, reader/writer-locked regex cache so repeated calls
//! across many functions don't recompile the same pattern.

use crate::diagnostics::DiagnosticLog;
use crate::ir::{Database, SelfReferencingForeignKey};
use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::sync::{OnceLock, RwLock};

pub fn build(db: &mut Database, log: &mut DiagnosticLog) {
    build_table_dependencies(db);
    build_function_dependencies(db, log);
}

fn build_table_dependencies(db: &mut Database) {
    let struct_to_table: HashMap<String, String> = db
        .tables
        .iter()
        .map(|t| (t.struct_name.clone(), t.name.clone()))
        .collect();

    let mut dependencies: HashMap<String, Vec<String>> = db
        .tables
        .iter()
        .map(|t| (t.name.clone(), Vec::new()))
        .collect();
    let mut self_refs: HashMap<String, Vec<SelfReferencingForeignKey>> = HashMap::new();

    let mut record = |owner_table: &str,
                       referenced_table: &str,
                       field_name: &str,
                       foreign: &str,
                       foreign_key_name: Option<String>,
                       dependencies: &mut HashMap<String, Vec<String>>,
                       self_refs: &mut HashMap<String, Vec<SelfReferencingForeignKey>>| {
        if referenced_table == owner_table {
            self_refs
                .entry(owner_table.to_string())
                .or_default()
                .push(SelfReferencingForeignKey {
                    field_name: field_name.to_string(),
                    foreign: foreign.to_string(),
                    foreign_key_name,
                });
        } else {
            let deps = dependencies.entry(owner_table.to_string()).or_default();
            if !deps.iter().any(|d| d == referenced_table) {
                deps.push(referenced_table.to_string());
            }
        }
    };

    for field in &db.fields {
        let Some(foreign) = field.foreign.as_ref() else {
            continue;
        };
        let Some(owner_table) = struct_to_table.get(&field.struct_name) else {
            continue;
        };
        let Some(referenced_table) = field.foreign_table() else {
            continue;
        };
        record(
            owner_table,
            referenced_table,
            &field.name,
            foreign,
            field.foreign_key_name.clone(),
            &mut dependencies,
            &mut self_refs,
        );
    }

    // Relation-mode embedded fields are also scanned directly from their
    // `ref`. The expanded Field produced by `ir::embed` already covers the
    // common case above; this loop keeps the graph correct even if a
    // caller hands the grapher an IR that skipped expansion. `record`'s
    // "unless already present" check keeps it idempotent either way.
    for embedded in &db.embedded_fields {
        if embedded.mode != Some(crate::ir::EmbeddedMode::Relation) {
            continue;
        }
        let Some(owner_table) = struct_to_table.get(&embedded.struct_name) else {
            continue;
        };
        let Some(reference) = embedded.r#ref.as_ref() else {
            continue;
        };
        let Some(referenced_table) = reference.split('(').next().map(|s| s.trim()) else {
            continue;
        };
        let field_name = embedded.field.clone().unwrap_or_default();
        record(
            owner_table,
            referenced_table,
            &field_name,
            reference,
            None,
            &mut dependencies,
            &mut self_refs,
        );
    }

    db.dependencies = dependencies;
    db.self_referencing_foreign_keys = self_refs;
}

/// Patterns are cached across calls: a process-wide `HashMap<String, Regex>`
/// protected by a reader/writer lock, allowing concurrent cache hits and
/// exclusive inserts.
static FUNCTION_CALL_PATTERN_CACHE: OnceLock<RwLock<HashMap<String, Regex>>> = OnceLock::new();

fn cache() -> &'static RwLock<HashMap<String, Regex>> {
    FUNCTION_CALL_PATTERN_CACHE.get_or_init(|| RwLock::new(HashMap::new()))
}

fn call_pattern_for(name: &str) -> Regex {
    {
        let read_guard = cache().read().unwrap();
        if let Some(pattern) = read_guard.get(name) {
            return pattern.clone();
        }
    }
    let pattern = Regex::new(&format!(r"\b{}\s*\(", regex::escape(name)))
        .expect("generated function-call pattern is always valid");
    cache()
        .write()
        .unwrap()
        .insert(name.to_string(), pattern.clone());
    pattern
}

fn build_function_dependencies(db: &mut Database, _log: &mut DiagnosticLog) {
    let known: HashSet<&str> = db.functions.iter().map(|f| f.name.as_str()).collect();
    let mut function_dependencies: HashMap<String, Vec<String>> = HashMap::new();

    for function in &db.functions {
        let mut deps = Vec::new();
        for &other_name in &known {
            if other_name == function.name {
                continue;
            }
            let pattern = call_pattern_for(other_name);
            if pattern.is_match(&function.body) {
                deps.push(other_name.to_string());
            }
        }
        deps.sort();
        function_dependencies.insert(function.name.clone(), deps);
    }

    db.function_dependencies = function_dependencies;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{Field, Function, Table};

    fn table(struct_name: &str, name: &str) -> Table {
        Table {
            struct_name: struct_name.to_string(),
            name: name.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn self_referencing_fk_is_segregated_not_a_dependency() {
        let mut db = Database::default();
        db.tables.push(table("User", "users"));
        db.fields.push(Field {
            struct_name: "User".to_string(),
            name: "parent_id".to_string(),
            foreign: Some("users(id)".to_string()),
            foreign_key_name: Some("fk_users_parent".to_string()),
            ..Default::default()
        });

        let mut log = DiagnosticLog::new();
        build(&mut db, &mut log);

        assert!(db.dependencies["users"].is_empty());
        assert_eq!(db.self_referencing_foreign_keys["users"].len(), 1);
        assert_eq!(db.self_referencing_foreign_keys["users"][0].field_name, "parent_id");
    }

    #[test]
    fn regular_fk_becomes_a_dependency_without_duplication() {
        let mut db = Database::default();
        db.tables.push(table("Order", "orders"));
        db.tables.push(table("User", "users"));
        db.fields.push(Field {
            struct_name: "Order".to_string(),
            name: "user_id".to_string(),
            foreign: Some("users(id)".to_string()),
            ..Default::default()
        });
        db.fields.push(Field {
            struct_name: "Order".to_string(),
            name: "billing_user_id".to_string(),
            foreign: Some("users(id)".to_string()),
            ..Default::default()
        });

        let mut log = DiagnosticLog::new();
        build(&mut db, &mut log);

        assert_eq!(db.dependencies["orders"], vec!["users".to_string()]);
    }

    #[test]
    fn function_dependencies_detect_whole_word_calls() {
        let mut db = Database::default();
        db.functions.push(Function {
            name: "touch_updated_at".to_string(),
            body: "BEGIN NEW.updated_at = now(); RETURN NEW; END;".to_string(),
            ..Default::default()
        });
        db.functions.push(Function {
            name: "notify_touch".to_string(),
            body: "BEGIN PERFORM touch_updated_at(); END;".to_string(),
            ..Default::default()
        });

        let mut log = DiagnosticLog::new();
        build(&mut db, &mut log);

        assert_eq!(
            db.function_dependencies["notify_touch"],
            vec!["touch_updated_at".to_string()]
        );
        assert!(db.function_dependencies["touch_updated_at"].is_empty());
    }

    #[test]
    fn function_self_calls_are_ignored() {
        let mut db = Database::default();
        db.functions.push(Function {
            name: "recurse".to_string(),
            body: "SELECT recurse();".to_string(),
            ..Default::default()
        });

        let mut log = DiagnosticLog::new();
        build(&mut db, &mut log);

        assert!(db.function_dependencies["recurse"].is_empty());
    }
}
