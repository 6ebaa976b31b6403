//! Produces a [`SchemaDiff`] between the in-memory IR and an introspected
//! database schema.
//!
//! `SchemaDiff` is treated as a builder that accepts a diff per object
//! kind and exposes an accessor per kind, so the planner's phase ordering
//! stays decoupled from how the differ happened to discover each change.

pub mod options;

pub use options::CompareOptions;

use crate::introspect::{DbColumn, DbSchema};
use crate::ir::{
    Constraint, Database, Enum, Extension, Field, Function, Index, Role, RlsPolicy, Table,
};
use crate::normalize;
use std::collections::HashMap;

#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct ColumnDiff {
    pub name: String,
    /// Each differing property, keyed by name, recorded as `"old -> new"`.
    pub changes: HashMap<String, String>,
}

#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct TableDiff {
    pub name: String,
    pub columns_added: Vec<Field>,
    pub columns_removed: Vec<String>,
    pub columns_modified: Vec<ColumnDiff>,
}

#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct EnumDiff {
    pub name: String,
    pub values_added: Vec<String>,
    pub values_removed: Vec<String>,
}

#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct FunctionDiff {
    pub name: String,
    pub changes: HashMap<String, String>,
}

#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct RlsPolicyRemoval {
    pub name: String,
    pub table: String,
}

#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct RlsPolicyDiff {
    pub name: String,
    pub table: String,
    pub changes: HashMap<String, String>,
}

#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct RoleDiff {
    pub name: String,
    pub changes: HashMap<String, String>,
    pub password_update_required: bool,
}

#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct SchemaDiff {
    pub tables_added: Vec<Table>,
    pub tables_removed: Vec<String>,
    pub tables_modified: Vec<TableDiff>,

    pub enums_added: Vec<Enum>,
    pub enums_removed: Vec<String>,
    pub enums_modified: Vec<EnumDiff>,

    pub indexes_added: Vec<Index>,
    pub indexes_removed: Vec<String>,

    pub extensions_added: Vec<String>,
    pub extensions_removed: Vec<String>,

    pub functions_added: Vec<Function>,
    pub functions_removed: Vec<String>,
    pub functions_modified: Vec<FunctionDiff>,

    pub rls_policies_added: Vec<RlsPolicy>,
    pub rls_policies_removed: Vec<RlsPolicyRemoval>,
    pub rls_policies_modified: Vec<RlsPolicyDiff>,

    pub rls_enabled_tables_added: Vec<String>,
    pub rls_enabled_tables_removed: Vec<String>,

    pub roles_added: Vec<Role>,
    pub roles_modified: Vec<RoleDiff>,

    pub constraints_added: Vec<Constraint>,
    pub constraints_removed: Vec<String>,
}

impl SchemaDiff {
    pub fn is_empty(&self) -> bool {
        self.tables_added.is_empty()
            && self.tables_removed.is_empty()
            && self.tables_modified.is_empty()
            && self.enums_added.is_empty()
            && self.enums_removed.is_empty()
            && self.enums_modified.is_empty()
            && self.indexes_added.is_empty()
            && self.indexes_removed.is_empty()
            && self.extensions_added.is_empty()
            && self.extensions_removed.is_empty()
            && self.functions_added.is_empty()
            && self.functions_removed.is_empty()
            && self.functions_modified.is_empty()
            && self.rls_policies_added.is_empty()
            && self.rls_policies_removed.is_empty()
            && self.rls_policies_modified.is_empty()
            && self.rls_enabled_tables_added.is_empty()
            && self.rls_enabled_tables_removed.is_empty()
            && self.roles_added.is_empty()
            && self.roles_modified.is_empty()
            && self.constraints_added.is_empty()
            && self.constraints_removed.is_empty()
    }
}

/// Symmetric set difference by name across two differently-typed
/// collections (IR side vs. introspected-DB side), returning
/// `(only_in_a, only_in_b, common_pairs)`.
fn partition_by_name<'a, A, B>(
    a: &'a [A],
    b: &'a [B],
    name_a: impl Fn(&A) -> &str,
    name_b: impl Fn(&B) -> &str,
) -> (Vec<&'a A>, Vec<&'a B>, Vec<(&'a A, &'a B)>) {
    let mut only_a = Vec::new();
    let mut common = Vec::new();
    for item in a {
        match b.iter().find(|other| name_b(other) == name_a(item)) {
            Some(other) => common.push((item, other)),
            None => only_a.push(item),
        }
    }
    let only_b: Vec<&B> = b
        .iter()
        .filter(|item| !a.iter().any(|other| name_a(other) == name_b(*item)))
        .collect();
    (only_a, only_b, common)
}

pub fn diff(ir: &Database, db: &DbSchema, opts: &CompareOptions) -> SchemaDiff {
    let mut result = SchemaDiff::default();

    diff_tables(ir, db, &mut result);
    diff_enums(ir, db, &mut result);
    diff_indexes(ir, db, &mut result);
    diff_extensions(ir, db, opts, &mut result);
    diff_functions(ir, db, &mut result);
    diff_rls_policies(ir, db, &mut result);
    diff_rls_enablement(ir, db, &mut result);
    diff_roles(ir, db, &mut result);
    diff_constraints(ir, db, &mut result);

    result
}

fn diff_tables(ir: &Database, db: &DbSchema, result: &mut SchemaDiff) {
    let (only_ir, only_db, common) = partition_by_name(
        &ir.tables,
        &db.tables,
        |t| t.name.as_str(),
        |t| t.name.as_str(),
    );

    let mut added: Vec<Table> = only_ir.into_iter().cloned().collect();
    added.sort_by(|a, b| a.name.cmp(&b.name));
    result.tables_added = added;

    let mut removed: Vec<String> = only_db.into_iter().map(|t| t.name.clone()).collect();
    removed.sort();
    result.tables_removed = removed;

    for (ir_table, db_table) in common {
        let table_diff = diff_columns(ir, ir_table, db_table);
        if !table_diff.columns_added.is_empty()
            || !table_diff.columns_removed.is_empty()
            || !table_diff.columns_modified.is_empty()
        {
            result.tables_modified.push(table_diff);
        }
    }
}

fn diff_columns(ir: &Database, ir_table: &Table, db_table: &crate::introspect::DbTable) -> TableDiff {
    let mut diff = TableDiff {
        name: ir_table.name.clone(),
        ..Default::default()
    };

    let ir_fields: Vec<&Field> = ir.fields_of_struct(&ir_table.struct_name).collect();

    for field in &ir_fields {
        match db_table.columns.iter().find(|c| c.name == field.name) {
            None => diff.columns_added.push((*field).clone()),
            Some(column) => {
                if let Some(column_diff) = diff_column(field, column) {
                    diff.columns_modified.push(column_diff);
                }
            }
        }
    }

    let mut removed: Vec<String> = db_table
        .columns
        .iter()
        .filter(|c| !ir_fields.iter().any(|f| f.name == c.name))
        .map(|c| c.name.clone())
        .collect();
    removed.sort();
    diff.columns_removed = removed;

    diff
}

fn diff_column(field: &Field, column: &DbColumn) -> Option<ColumnDiff> {
    let mut changes = HashMap::new();

    let column_type_source = column.udt_name.as_deref().unwrap_or(&column.data_type);
    let ir_type = normalize::normalize_type(&field.type_);
    let db_type = normalize::normalize_type(column_type_source);
    if ir_type.name != db_type.name {
        changes.insert(
            "type".to_string(),
            format!("{} -> {}", db_type.name, ir_type.name),
        );
    }

    let ir_nullable = field.effective_nullable();
    if ir_nullable != column.is_nullable {
        changes.insert(
            "nullable".to_string(),
            format!("{} -> {}", column.is_nullable, ir_nullable),
        );
    }

    if field.primary != column.is_primary_key {
        changes.insert(
            "primary".to_string(),
            format!("{} -> {}", column.is_primary_key, field.primary),
        );
    }

    if field.unique != column.is_unique {
        changes.insert(
            "unique".to_string(),
            format!("{} -> {}", column.is_unique, field.unique),
        );
    }

    let is_auto_increment = field.auto_inc || ir_type.implies_auto_increment || column.is_auto_increment;
    if !is_auto_increment {
        let ir_default_raw = field.default.clone().or_else(|| field.default_expr.clone());
        let ir_default = ir_default_raw
            .as_deref()
            .map(|v| normalize::normalize_default(v, &field.type_))
            .unwrap_or_default();
        let db_default = column
            .column_default
            .as_deref()
            .map(|v| normalize::normalize_default(v, column_type_source))
            .unwrap_or_default();

        if ir_default != db_default {
            let key = if normalize::is_default_expr(ir_default_raw.as_deref().unwrap_or("")) {
                "default_expr"
            } else {
                "default"
            };
            changes.insert(key.to_string(), format!("{} -> {}", db_default, ir_default));
        }
    }

    if changes.is_empty() {
        None
    } else {
        Some(ColumnDiff {
            name: field.name.clone(),
            changes,
        })
    }
}

fn diff_enums(ir: &Database, db: &DbSchema, result: &mut SchemaDiff) {
    let (only_ir, only_db, common) =
        partition_by_name(&ir.enums, &db.enums, |e| e.name.as_str(), |e| e.name.as_str());

    let mut added: Vec<Enum> = only_ir.into_iter().cloned().collect();
    added.sort_by(|a, b| a.name.cmp(&b.name));
    result.enums_added = added;

    let mut removed: Vec<String> = only_db.into_iter().map(|e| e.name.clone()).collect();
    removed.sort();
    result.enums_removed = removed;

    let mut modified = Vec::new();
    for (ir_enum, db_enum) in common {
        let mut values_added: Vec<String> = ir_enum
            .values
            .iter()
            .filter(|v| !db_enum.values.contains(v))
            .cloned()
            .collect();
        values_added.sort();
        let mut values_removed: Vec<String> = db_enum
            .values
            .iter()
            .filter(|v| !ir_enum.values.contains(v))
            .cloned()
            .collect();
        values_removed.sort();

        if !values_added.is_empty() || !values_removed.is_empty() {
            modified.push(EnumDiff {
                name: ir_enum.name.clone(),
                values_added,
                values_removed,
            });
        }
    }
    modified.sort_by(|a, b| a.name.cmp(&b.name));
    result.enums_modified = modified;
}

fn diff_indexes(ir: &Database, db: &DbSchema, result: &mut SchemaDiff) {
    let relevant_db_indexes: Vec<&crate::introspect::DbIndex> = db
        .indexes
        .iter()
        .filter(|i| !i.is_primary)
        .filter(|i| !normalize::is_constraint_based_unique_index(&i.name, &i.table_name))
        .collect();

    let mut added: Vec<Index> = ir
        .indexes
        .iter()
        .filter(|i| !relevant_db_indexes.iter().any(|d| d.name == i.name))
        .cloned()
        .collect();
    added.sort_by(|a, b| a.name.cmp(&b.name));
    result.indexes_added = added;

    let mut removed: Vec<String> = relevant_db_indexes
        .iter()
        .filter(|d| !ir.indexes.iter().any(|i| i.name == d.name))
        .map(|d| d.name.clone())
        .collect();
    removed.sort();
    result.indexes_removed = removed;
}

fn diff_extensions(ir: &Database, db: &DbSchema, opts: &CompareOptions, result: &mut SchemaDiff) {
    let ir_extensions: Vec<&Extension> = ir
        .extensions
        .iter()
        .filter(|e| !opts.ignored_extensions.contains(&e.name))
        .collect();
    let db_extensions: Vec<&crate::introspect::DbExtension> = db
        .extensions
        .iter()
        .filter(|e| !opts.ignored_extensions.contains(&e.name))
        .collect();

    let mut added: Vec<String> = ir_extensions
        .iter()
        .filter(|e| !db_extensions.iter().any(|d| d.name == e.name))
        .map(|e| e.name.clone())
        .collect();
    added.sort();
    result.extensions_added = added;

    let mut removed: Vec<String> = db_extensions
        .iter()
        .filter(|d| !ir_extensions.iter().any(|e| e.name == d.name))
        .map(|d| d.name.clone())
        .collect();
    removed.sort();
    result.extensions_removed = removed;
}

fn diff_functions(ir: &Database, db: &DbSchema, result: &mut SchemaDiff) {
    let (only_ir, only_db, common) =
        partition_by_name(&ir.functions, &db.functions, |f| f.name.as_str(), |f| f.name.as_str());

    let mut added: Vec<Function> = only_ir.into_iter().cloned().collect();
    added.sort_by(|a, b| a.name.cmp(&b.name));
    result.functions_added = added;

    let mut removed: Vec<String> = only_db.into_iter().map(|f| f.name.clone()).collect();
    removed.sort();
    result.functions_removed = removed;

    let mut modified = Vec::new();
    for (ir_fn, db_fn) in common {
        let mut changes = HashMap::new();
        if ir_fn.parameters != db_fn.parameters {
            changes.insert(
                "parameters".to_string(),
                format!("{:?} -> {:?}", db_fn.parameters, ir_fn.parameters),
            );
        }
        if ir_fn.returns != db_fn.returns {
            changes.insert(
                "returns".to_string(),
                format!("{} -> {}", db_fn.returns, ir_fn.returns),
            );
        }
        if ir_fn.language != db_fn.language {
            changes.insert(
                "language".to_string(),
                format!("{} -> {}", db_fn.language, ir_fn.language),
            );
        }
        if ir_fn.security != db_fn.security {
            changes.insert(
                "security".to_string(),
                format!("{:?} -> {:?}", db_fn.security, ir_fn.security),
            );
        }
        if ir_fn.volatility != db_fn.volatility {
            changes.insert(
                "volatility".to_string(),
                format!("{:?} -> {:?}", db_fn.volatility, ir_fn.volatility),
            );
        }
        if ir_fn.body.trim() != db_fn.body.trim() {
            changes.insert("body".to_string(), "changed".to_string());
        }
        if !changes.is_empty() {
            modified.push(FunctionDiff {
                name: ir_fn.name.clone(),
                changes,
            });
        }
    }
    modified.sort_by(|a, b| a.name.cmp(&b.name));
    result.functions_modified = modified;
}

fn diff_rls_policies(ir: &Database, db: &DbSchema, result: &mut SchemaDiff) {
    let (only_ir, only_db, common) =
        partition_by_name(
            &ir.rls_policies,
            &db.rls_policies,
            |p| p.name.as_str(),
            |p| p.name.as_str(),
        );

    let mut added: Vec<RlsPolicy> = only_ir.into_iter().cloned().collect();
    added.sort_by(|a, b| a.name.cmp(&b.name));
    result.rls_policies_added = added;

    let mut removed: Vec<RlsPolicyRemoval> = only_db
        .into_iter()
        .map(|p| RlsPolicyRemoval {
            name: p.name.clone(),
            table: p.table.clone(),
        })
        .collect();
    removed.sort_by(|a, b| a.name.cmp(&b.name));
    result.rls_policies_removed = removed;

    let mut modified = Vec::new();
    for (ir_policy, db_policy) in common {
        let mut changes = HashMap::new();
        if ir_policy.policy_for != db_policy.policy_for {
            changes.insert(
                "policy_for".to_string(),
                format!("{:?} -> {:?}", db_policy.policy_for, ir_policy.policy_for),
            );
        }
        if ir_policy.to_roles != db_policy.to_roles {
            changes.insert(
                "to_roles".to_string(),
                format!("{:?} -> {:?}", db_policy.to_roles, ir_policy.to_roles),
            );
        }
        if ir_policy.using_expression != db_policy.using_expression {
            changes.insert(
                "using_expression".to_string(),
                format!(
                    "{:?} -> {:?}",
                    db_policy.using_expression, ir_policy.using_expression
                ),
            );
        }
        if ir_policy.with_check_expression != db_policy.with_check_expression {
            changes.insert(
                "with_check_expression".to_string(),
                format!(
                    "{:?} -> {:?}",
                    db_policy.with_check_expression, ir_policy.with_check_expression
                ),
            );
        }
        if !changes.is_empty() {
            modified.push(RlsPolicyDiff {
                name: ir_policy.name.clone(),
                table: ir_policy.table.clone(),
                changes,
            });
        }
    }
    modified.sort_by(|a, b| a.name.cmp(&b.name));
    result.rls_policies_modified = modified;
}

fn diff_rls_enablement(ir: &Database, db: &DbSchema, result: &mut SchemaDiff) {
    let mut added: Vec<String> = ir
        .rls_enabled_tables
        .iter()
        .filter(|t| !db.rls_enabled_tables.contains(&t.table))
        .map(|t| t.table.clone())
        .collect();
    added.sort();
    result.rls_enabled_tables_added = added;

    let mut removed: Vec<String> = db
        .rls_enabled_tables
        .iter()
        .filter(|table| !ir.rls_enabled_tables.iter().any(|t| &t.table == *table))
        .cloned()
        .collect();
    removed.sort();
    result.rls_enabled_tables_removed = removed;
}

fn diff_roles(ir: &Database, db: &DbSchema, result: &mut SchemaDiff) {
    let (only_ir, _only_db, common) =
        partition_by_name(&ir.roles, &db.roles, |r| r.name.as_str(), |r| r.name.as_str());

    let mut added: Vec<Role> = only_ir.into_iter().cloned().collect();
    added.sort_by(|a, b| a.name.cmp(&b.name));
    result.roles_added = added;

    let mut modified = Vec::new();
    for (ir_role, db_role) in common {
        let mut changes = HashMap::new();
        if ir_role.login != db_role.login {
            changes.insert("login".to_string(), format!("{} -> {}", db_role.login, ir_role.login));
        }
        if ir_role.superuser != db_role.superuser {
            changes.insert(
                "superuser".to_string(),
                format!("{} -> {}", db_role.superuser, ir_role.superuser),
            );
        }
        if ir_role.createdb != db_role.createdb {
            changes.insert(
                "createdb".to_string(),
                format!("{} -> {}", db_role.createdb, ir_role.createdb),
            );
        }
        if ir_role.createrole != db_role.createrole {
            changes.insert(
                "createrole".to_string(),
                format!("{} -> {}", db_role.createrole, ir_role.createrole),
            );
        }
        if ir_role.inherit != db_role.inherit {
            changes.insert(
                "inherit".to_string(),
                format!("{} -> {}", db_role.inherit, ir_role.inherit),
            );
        }
        if ir_role.replication != db_role.replication {
            changes.insert(
                "replication".to_string(),
                format!("{} -> {}", db_role.replication, ir_role.replication),
            );
        }
        let password_update_required = ir_role.password.is_some() && !db_role.has_password;

        if !changes.is_empty() || password_update_required {
            modified.push(RoleDiff {
                name: ir_role.name.clone(),
                changes,
                password_update_required,
            });
        }
    }
    modified.sort_by(|a, b| a.name.cmp(&b.name));
    result.roles_modified = modified;
}

fn diff_constraints(ir: &Database, db: &DbSchema, result: &mut SchemaDiff) {
    let (only_ir, only_db, _common) =
        partition_by_name(
            &ir.constraints,
            &db.constraints,
            |c| c.name.as_str(),
            |c| c.name.as_str(),
        );

    let mut added: Vec<Constraint> = only_ir.into_iter().cloned().collect();
    added.sort_by(|a, b| a.name.cmp(&b.name));
    result.constraints_added = added;

    let mut removed: Vec<String> = only_db.into_iter().map(|c| c.name.clone()).collect();
    removed.sort();
    result.constraints_removed = removed;
}
