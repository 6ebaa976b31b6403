//! Translates a [`SchemaDiff`] into an ordered vector of AST operations —
//! the migration itself, prior to rendering. Emission order across the
//! whole plan is fixed; see the phase-by-phase breakdown below. Only
//! PostgreSQL implements roles, functions, RLS, extensions, EXCLUDE
//! constraints, native enums, and partial/operator-class indexes — the
//! MySQL and MariaDB planners share every relational phase and silently
//! omit the Postgres-only object kinds.

pub mod ast;

pub use ast::Operation;

use crate::dialect::Dialect;
use crate::diagnostics::DiagnosticLog;
use crate::diff::SchemaDiff;
use crate::ir::{Constraint, ConstraintType, Database, Field};
use crate::normalize;
use ast::{AlterTableOp, CommentSeverity};
use std::collections::HashMap;

pub fn plan(diff: &SchemaDiff, db: &Database, dialect: Dialect, log: &mut DiagnosticLog) -> Vec<Operation> {
    let mut ops = Vec::new();

    if dialect.is_postgres() {
        phase_create_extensions(diff, &mut ops);
        phase_create_roles(diff, &mut ops);
        phase_create_functions(diff, &mut ops);
    }

    phase_create_enums(diff, dialect, &mut ops);
    phase_alter_enums(diff, dialect, &mut ops);

    let new_table_names = phase_create_tables(diff, db, dialect, &mut ops);
    phase_add_new_table_foreign_keys(diff, db, &mut ops);

    phase_modify_columns(diff, db, dialect, &mut ops, log);
    phase_add_new_column_foreign_keys(diff, &mut ops);

    if dialect.is_postgres() {
        phase_alter_roles(diff, &mut ops);
        phase_enable_rls(diff, &new_table_names, &mut ops);
        phase_add_policies(diff, &mut ops);
    }

    phase_add_indexes(diff, db, &mut ops);
    phase_add_constraints(diff, &mut ops);
    phase_drop_indexes(diff, &mut ops);

    if dialect.is_postgres() {
        phase_drop_policies(diff, &mut ops);
    }

    phase_drop_columns(diff, &mut ops);
    phase_drop_constraints(diff, &mut ops);
    phase_drop_tables(diff, &mut ops);

    if dialect.is_postgres() {
        phase_drop_functions(diff, &mut ops);
        phase_drop_roles(diff, &mut ops);
    }

    phase_drop_enums(diff, dialect, &mut ops);

    if dialect.is_postgres() {
        phase_drop_extensions(diff, &mut ops);
    }

    ops
}

/// Applies per-dialect overrides and the `SERIAL -> INT AUTO_INCREMENT`
/// / inline-enum translation MySQL and MariaDB need, per the planner's
/// documented dialect differences. PostgreSQL fields pass through
/// untouched.
fn effective_field(field: &Field, dialect: Dialect, db: &Database) -> Field {
    let mut out = field.clone();

    if let Some(override_type) = field.override_for(dialect.override_key(), "type") {
        out.type_ = override_type.to_string();
    }

    if dialect.is_mysql_family() {
        let normalized = normalize::normalize_type(&out.type_);
        if normalized.implies_auto_increment {
            out.type_ = normalized.name;
            out.auto_inc = true;
        }
        if let Some(matching_enum) = db.enums.iter().find(|e| e.name == out.type_) {
            let values = matching_enum
                .values
                .iter()
                .map(|v| format!("'{}'", v))
                .collect::<Vec<_>>()
                .join(", ");
            out.type_ = format!("ENUM({})", values);
        }
    }

    out
}

fn phase_create_extensions(diff: &SchemaDiff, ops: &mut Vec<Operation>) {
    for name in &diff.extensions_added {
        ops.push(Operation::CreateExtension {
            name: name.clone(),
            if_not_exists: true,
        });
    }
}

fn phase_create_roles(diff: &SchemaDiff, ops: &mut Vec<Operation>) {
    for role in &diff.roles_added {
        ops.push(Operation::CreateRole { role: role.clone() });
    }
}

fn phase_create_functions(diff: &SchemaDiff, ops: &mut Vec<Operation>) {
    for function in &diff.functions_added {
        ops.push(Operation::CreateFunction {
            function: function.clone(),
        });
    }
}

fn phase_create_enums(diff: &SchemaDiff, dialect: Dialect, ops: &mut Vec<Operation>) {
    if !dialect.is_postgres() {
        return;
    }
    for e in &diff.enums_added {
        ops.push(Operation::CreateEnum { r#enum: e.clone() });
    }
}

fn phase_alter_enums(diff: &SchemaDiff, dialect: Dialect, ops: &mut Vec<Operation>) {
    if !dialect.is_postgres() {
        return;
    }
    for enum_diff in &diff.enums_modified {
        for value in &enum_diff.values_added {
            ops.push(Operation::AlterEnumAddValue {
                enum_name: enum_diff.name.clone(),
                value: value.clone(),
            });
        }
        for value in &enum_diff.values_removed {
            ops.push(Operation::Comment {
                text: format!(
                    "value {:?} removed from enum {} cannot be applied without recreating the type",
                    value, enum_diff.name
                ),
                severity: CommentSeverity::Warning,
            });
        }
    }
}

fn phase_create_tables(
    diff: &SchemaDiff,
    db: &Database,
    dialect: Dialect,
    ops: &mut Vec<Operation>,
) -> Vec<String> {
    let added_names: Vec<&str> = diff.tables_added.iter().map(|t| t.name.as_str()).collect();

    let ordered_names: Vec<String> = db
        .table_order
        .iter()
        .filter(|name| added_names.contains(&name.as_str()))
        .cloned()
        .collect();

    for name in &ordered_names {
        let Some(table) = diff.tables_added.iter().find(|t| &t.name == name) else {
            continue;
        };
        let columns: Vec<Field> = db
            .fields_of_struct(&table.struct_name)
            .map(|f| effective_field(f, dialect, db))
            .collect();
        ops.push(Operation::CreateTable {
            name: table.name.clone(),
            columns,
        });
    }

    ordered_names
}

fn phase_add_new_table_foreign_keys(diff: &SchemaDiff, db: &Database, ops: &mut Vec<Operation>) {
    let added_names: Vec<&str> = diff.tables_added.iter().map(|t| t.name.as_str()).collect();
    let ordered_names: Vec<String> = db
        .table_order
        .iter()
        .filter(|name| added_names.contains(&name.as_str()))
        .cloned()
        .collect();

    for table_name in &ordered_names {
        let Some(table) = diff.tables_added.iter().find(|t| &t.name == table_name) else {
            continue;
        };

        let mut non_self: Vec<&Field> = db
            .fields_of_struct(&table.struct_name)
            .filter(|f| f.foreign.is_some() && f.foreign_table() != Some(table_name.as_str()))
            .collect();
        non_self.sort_by(|a, b| a.name.cmp(&b.name));
        for field in non_self {
            ops.push(foreign_key_op(table_name, field));
        }

        if let Some(self_refs) = db.self_referencing_foreign_keys.get(table_name.as_str()) {
            let mut sorted = self_refs.clone();
            sorted.sort_by(|a, b| a.field_name.cmp(&b.field_name));
            for self_ref in sorted {
                let (foreign_table, foreign_column) = parse_foreign(&self_ref.foreign);
                ops.push(Operation::AddConstraint {
                    table: table_name.clone(),
                    constraint: Constraint {
                        struct_name: table.struct_name.clone(),
                        name: self_ref
                            .foreign_key_name
                            .clone()
                            .unwrap_or_else(|| format!("fk_{}_{}", table_name, self_ref.field_name)),
                        r#type: Some(ConstraintType::ForeignKey),
                        table: table_name.clone(),
                        columns: Some(vec![self_ref.field_name.clone()]),
                        foreign_table: Some(foreign_table),
                        foreign_column: Some(foreign_column),
                        ..Default::default()
                    },
                });
            }
        }
    }
}

fn foreign_key_op(table_name: &str, field: &Field) -> Operation {
    let (foreign_table, foreign_column) = parse_foreign(field.foreign.as_deref().unwrap_or(""));
    Operation::AddConstraint {
        table: table_name.to_string(),
        constraint: Constraint {
            struct_name: field.struct_name.clone(),
            name: field
                .foreign_key_name
                .clone()
                .unwrap_or_else(|| format!("fk_{}_{}", table_name, field.name)),
            r#type: Some(ConstraintType::ForeignKey),
            table: table_name.to_string(),
            columns: Some(vec![field.name.clone()]),
            foreign_table: Some(foreign_table),
            foreign_column: Some(foreign_column),
            ..Default::default()
        },
    }
}

fn parse_foreign(foreign: &str) -> (String, String) {
    let mut parts = foreign.splitn(2, '(');
    let table = parts.next().unwrap_or("").trim().to_string();
    let column = parts
        .next()
        .map(|rest| rest.trim_end_matches(')').trim().to_string())
        .unwrap_or_default();
    (table, column)
}

fn phase_modify_columns(
    diff: &SchemaDiff,
    db: &Database,
    dialect: Dialect,
    ops: &mut Vec<Operation>,
    _log: &mut DiagnosticLog,
) {
    for table_diff in &diff.tables_modified {
        if table_diff.columns_added.is_empty() && table_diff.columns_modified.is_empty() {
            continue;
        }
        ops.push(Operation::Comment {
            text: format!("Add/modify columns for table: {}", table_diff.name),
            severity: CommentSeverity::Info,
        });

        let mut alter_ops = Vec::new();
        for field in &table_diff.columns_added {
            alter_ops.push(AlterTableOp::AddColumn(effective_field(field, dialect, db)));
        }
        for column_diff in &table_diff.columns_modified {
            alter_ops.push(AlterTableOp::ModifyColumn {
                name: column_diff.name.clone(),
                changes: column_diff.changes.clone(),
            });
        }
        if !alter_ops.is_empty() {
            ops.push(Operation::AlterTable {
                table: table_diff.name.clone(),
                operations: alter_ops,
            });
        }
    }
}

fn phase_add_new_column_foreign_keys(diff: &SchemaDiff, ops: &mut Vec<Operation>) {
    for table_diff in &diff.tables_modified {
        for field in &table_diff.columns_added {
            if field.foreign.is_some() {
                ops.push(foreign_key_op(&table_diff.name, field));
            }
        }
    }
}

fn phase_alter_roles(diff: &SchemaDiff, ops: &mut Vec<Operation>) {
    for role_diff in &diff.roles_modified {
        if role_diff.changes.is_empty() && !role_diff.password_update_required {
            continue;
        }
        ops.push(Operation::AlterRole {
            name: role_diff.name.clone(),
            changes: role_diff.changes.clone(),
            set_password: role_diff.password_update_required,
        });
    }
}

fn phase_enable_rls(diff: &SchemaDiff, new_table_names: &[String], ops: &mut Vec<Operation>) {
    for table in &diff.rls_enabled_tables_added {
        if new_table_names.iter().any(|n| n == table) {
            ops.push(Operation::EnableRls {
                table: table.clone(),
            });
        }
    }
}

fn phase_add_policies(diff: &SchemaDiff, ops: &mut Vec<Operation>) {
    for policy in &diff.rls_policies_added {
        ops.push(Operation::CreatePolicy {
            policy: policy.clone(),
            replace: true,
        });
    }
}

fn phase_add_indexes(diff: &SchemaDiff, db: &Database, ops: &mut Vec<Operation>) {
    let struct_to_table = db.struct_to_table();

    for index in &diff.indexes_added {
        let table = index
            .table_name
            .clone()
            .or_else(|| struct_to_table.get(index.struct_name.as_str()).map(|t| t.to_string()));
        match table {
            Some(table) => ops.push(Operation::CreateIndex {
                index: index.clone(),
                table,
            }),
            None => ops.push(Operation::ErrorComment {
                text: format!(
                    "could not resolve target table for index {} (struct {:?} not found)",
                    index.name, index.struct_name
                ),
            }),
        }
    }
}

fn phase_add_constraints(diff: &SchemaDiff, ops: &mut Vec<Operation>) {
    for constraint in &diff.constraints_added {
        ops.push(Operation::AddConstraint {
            table: constraint.table.clone(),
            constraint: constraint.clone(),
        });
    }
}

fn phase_drop_indexes(diff: &SchemaDiff, ops: &mut Vec<Operation>) {
    for name in &diff.indexes_removed {
        ops.push(Operation::DropIndex {
            name: name.clone(),
            if_exists: true,
        });
    }
}

fn phase_drop_policies(diff: &SchemaDiff, ops: &mut Vec<Operation>) {
    let mut affected_tables: Vec<String> = Vec::new();
    for removal in &diff.rls_policies_removed {
        ops.push(Operation::DropPolicy {
            name: removal.name.clone(),
            table: removal.table.clone(),
            if_exists: true,
        });
        if !affected_tables.contains(&removal.table) {
            affected_tables.push(removal.table.clone());
        }
    }
    for table in affected_tables {
        ops.push(Operation::Comment {
            text: format!("verify whether RLS should be disabled on {}", table),
            severity: CommentSeverity::Info,
        });
    }
}

fn phase_drop_columns(diff: &SchemaDiff, ops: &mut Vec<Operation>) {
    for table_diff in &diff.tables_modified {
        if table_diff.columns_removed.is_empty() {
            continue;
        }
        let mut alter_ops = Vec::new();
        for name in &table_diff.columns_removed {
            ops.push(Operation::Comment {
                text: format!("dropping column {}.{}", table_diff.name, name),
                severity: CommentSeverity::Warning,
            });
            alter_ops.push(AlterTableOp::DropColumn {
                name: name.clone(),
                cascade: true,
            });
        }
        ops.push(Operation::AlterTable {
            table: table_diff.name.clone(),
            operations: alter_ops,
        });
    }
}

fn phase_drop_constraints(diff: &SchemaDiff, ops: &mut Vec<Operation>) {
    for name in &diff.constraints_removed {
        ops.push(Operation::Comment {
            text: format!(
                "dropping constraint {} via a transient lookup function since its owning table is not known at diff time",
                name
            ),
            severity: CommentSeverity::Info,
        });
        ops.push(Operation::DropConstraint { name: name.clone() });
    }
}

fn phase_drop_tables(diff: &SchemaDiff, ops: &mut Vec<Operation>) {
    for name in &diff.tables_removed {
        ops.push(Operation::Comment {
            text: format!("dropping table {}", name),
            severity: CommentSeverity::Warning,
        });
        ops.push(Operation::DropTable {
            name: name.clone(),
            if_exists: true,
            cascade: true,
        });
    }
}

fn phase_drop_functions(diff: &SchemaDiff, ops: &mut Vec<Operation>) {
    for name in &diff.functions_removed {
        ops.push(Operation::Comment {
            text: format!("dropping function {}; dependents may break", name),
            severity: CommentSeverity::Warning,
        });
        ops.push(Operation::DropFunction {
            name: name.clone(),
            if_exists: true,
        });
    }
}

fn phase_drop_roles(diff: &SchemaDiff, ops: &mut Vec<Operation>) {
    // `SchemaDiff` never populates a roles-removed list (role removal is
    // considered too dangerous to automate), so this phase is permanently
    // a no-op. Kept as an explicit phase so the global ordering matches
    // the documented planner contract one-for-one.
    let _ = diff;
    let _ = ops;
}

fn phase_drop_enums(diff: &SchemaDiff, dialect: Dialect, ops: &mut Vec<Operation>) {
    if !dialect.is_postgres() {
        return;
    }
    for name in &diff.enums_removed {
        ops.push(Operation::Comment {
            text: format!("dropping enum {}", name),
            severity: CommentSeverity::Warning,
        });
        ops.push(Operation::DropEnum {
            name: name.clone(),
            if_exists: true,
            cascade: true,
        });
    }
}

fn phase_drop_extensions(diff: &SchemaDiff, ops: &mut Vec<Operation>) {
    for name in &diff.extensions_removed {
        for _ in 0..3 {
            ops.push(Operation::Comment {
                text: format!(
                    "dropping extension {} may affect dependent objects and cascade further",
                    name
                ),
                severity: CommentSeverity::Warning,
            });
        }
        ops.push(Operation::DropExtension {
            name: name.clone(),
            if_exists: true,
        });
    }
}
