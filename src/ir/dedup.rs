//! Deduplication.
//!
//! Removes duplicates across the IR while preserving first-seen insertion
//! order — required for deterministic migration output. Extensions are
//! the one exception: deduplicated by name but then sorted alphabetically,
//! since their creation order does not affect correctness and a stable
//! canonical order simplifies diff output.

use crate::ir::Database;
use std::collections::HashSet;
use std::hash::Hash;

/// Keep the first occurrence of each key, preserving order.
fn dedup_by<T, K, F>(items: Vec<T>, mut key_fn: F) -> Vec<T>
where
    K: Eq + Hash,
    F: FnMut(&T) -> K,
{
    let mut seen: HashSet<K> = HashSet::new();
    let mut result = Vec::with_capacity(items.len());
    for item in items {
        let key = key_fn(&item);
        if seen.insert(key) {
            result.push(item);
        }
    }
    result
}

pub fn dedup(db: &mut Database) {
    db.tables = dedup_by(std::mem::take(&mut db.tables), |t| t.name.clone());
    db.fields = dedup_by(std::mem::take(&mut db.fields), |f| {
        (f.struct_name.clone(), f.name.clone())
    });
    db.indexes = dedup_by(std::mem::take(&mut db.indexes), |i| {
        (i.struct_name.clone(), i.name.clone())
    });
    db.enums = dedup_by(std::mem::take(&mut db.enums), |e| e.name.clone());
    db.embedded_fields = dedup_by(std::mem::take(&mut db.embedded_fields), |e| {
        (e.struct_name.clone(), e.embedded_type_name.clone())
    });
    db.functions = dedup_by(std::mem::take(&mut db.functions), |f| f.name.clone());
    db.rls_policies = dedup_by(std::mem::take(&mut db.rls_policies), |p| p.name.clone());
    db.rls_enabled_tables = dedup_by(std::mem::take(&mut db.rls_enabled_tables), |r| r.table.clone());
    db.roles = dedup_by(std::mem::take(&mut db.roles), |r| r.name.clone());
    db.constraints = dedup_by(std::mem::take(&mut db.constraints), |c| c.name.clone());

    db.extensions = dedup_by(std::mem::take(&mut db.extensions), |e| e.name.clone());
    db.extensions.sort_by(|a, b| a.name.cmp(&b.name));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{Extension, Field, Table};

    #[test]
    fn tables_dedup_by_name_preserving_first_seen_order() {
        let mut db = Database::default();
        db.tables.push(Table {
            struct_name: "UserV1".to_string(),
            name: "users".to_string(),
            ..Default::default()
        });
        db.tables.push(Table {
            struct_name: "Order".to_string(),
            name: "orders".to_string(),
            ..Default::default()
        });
        db.tables.push(Table {
            struct_name: "UserV2".to_string(),
            name: "users".to_string(),
            ..Default::default()
        });

        dedup(&mut db);

        assert_eq!(db.tables.len(), 2);
        assert_eq!(db.tables[0].name, "users");
        assert_eq!(db.tables[0].struct_name, "UserV1");
        assert_eq!(db.tables[1].name, "orders");
    }

    #[test]
    fn fields_dedup_by_composite_key() {
        let mut db = Database::default();
        db.fields.push(Field {
            struct_name: "User".to_string(),
            name: "email".to_string(),
            type_: "TEXT".to_string(),
            ..Default::default()
        });
        db.fields.push(Field {
            struct_name: "User".to_string(),
            name: "email".to_string(),
            type_: "VARCHAR(255)".to_string(),
            ..Default::default()
        });
        dedup(&mut db);
        assert_eq!(db.fields.len(), 1);
        assert_eq!(db.fields[0].type_, "TEXT");
    }

    #[test]
    fn extensions_are_alphabetized_after_dedup() {
        let mut db = Database::default();
        for name in ["pg_trgm", "adminpack", "pg_trgm", "btree_gist"] {
            db.extensions.push(Extension {
                name: name.to_string(),
                ..Default::default()
            });
        }
        dedup(&mut db);
        let names: Vec<_> = db.extensions.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["adminpack", "btree_gist", "pg_trgm"]);
    }
}
