//! Constructs a [`Database`] from already-parsed directive records, then
//! runs the rest of the enrichment pipeline — embedded expansion,
//! deduplication, dependency graphing, and topological sort — so callers
//! get back a `Database` that's already safe to treat as immutable.

use crate::diagnostics::DiagnosticLog;
use crate::ir::directive::{self, ParsedDirective, RawDirective};
use crate::ir::{self, Constraint, Database, Enum, Extension, Field, Function, Index, RlsEnabledTable, RlsPolicy, Role, Table};

/// Total, order-preserving, and silently tolerant of malformed directives.
/// Order of appearance is preserved per collection; the caller is
/// responsible for visiting files in directory-walk order ahead of time —
/// the scan order itself is an external, file-system concern.
pub fn build(directives: &[RawDirective]) -> (Database, DiagnosticLog) {
    let mut log = DiagnosticLog::new();
    let mut db = Database::default();

    for raw in directives {
        match directive::parse(raw, &mut log) {
            Some(ParsedDirective::Table(t)) => db.tables.push(Table {
                struct_name: t.struct_name,
                name: t.name,
                engine: t.engine,
                comment: t.comment,
                primary_key: t.primary_key,
                checks: t.checks,
                custom_sql: t.custom_sql,
                overrides: t.overrides,
            }),
            Some(ParsedDirective::Field(f)) => {
                let mut field = Field {
                    struct_name: f.struct_name,
                    field_name: f.field_name,
                    name: f.name,
                    type_: f.type_,
                    nullable: f.nullable,
                    primary: f.primary,
                    auto_inc: f.auto_inc,
                    unique: f.unique,
                    unique_expr: f.unique_expr,
                    default: f.default,
                    default_expr: f.default_expr,
                    foreign: f.foreign,
                    foreign_key_name: f.foreign_key_name,
                    enum_values: f.enum_values,
                    check: f.check,
                    comment: f.comment,
                    overrides: f.overrides,
                };
                rewrite_inline_enum(&mut field, &mut db.enums);
                db.fields.push(field);
            }
            Some(ParsedDirective::Embedded(e)) => db.embedded_fields.push(ir::EmbeddedField {
                struct_name: e.struct_name,
                mode: Some(e.mode),
                prefix: e.prefix,
                name: e.name,
                type_: e.type_,
                nullable: e.nullable,
                index: e.index,
                field: e.field,
                r#ref: e.r#ref,
                on_delete: e.on_delete,
                on_update: e.on_update,
                comment: e.comment,
                embedded_type_name: e.embedded_type_name,
                overrides: e.overrides,
            }),
            Some(ParsedDirective::Index(i)) => db.indexes.push(Index {
                struct_name: i.struct_name,
                name: i.name,
                fields: i.fields,
                unique: i.unique,
                comment: i.comment,
                r#type: i.r#type,
                condition: i.condition,
                operator: i.operator,
                table_name: i.table_name,
            }),
            Some(ParsedDirective::Extension(x)) => db.extensions.push(Extension {
                name: x.name,
                if_not_exists: x.if_not_exists,
                version: x.version,
                comment: x.comment,
            }),
            Some(ParsedDirective::Function(f)) => db.functions.push(Function {
                struct_name: f.struct_name,
                name: f.name,
                parameters: f.parameters,
                returns: f.returns,
                language: f.language,
                security: f.security,
                volatility: f.volatility,
                body: f.body,
                comment: f.comment,
            }),
            Some(ParsedDirective::RlsEnable(r)) => db.rls_enabled_tables.push(RlsEnabledTable {
                struct_name: r.struct_name,
                table: r.table,
                comment: r.comment,
            }),
            Some(ParsedDirective::RlsPolicy(p)) => db.rls_policies.push(RlsPolicy {
                struct_name: p.struct_name,
                name: p.name,
                table: p.table,
                policy_for: p.policy_for,
                to_roles: p.to_roles,
                using_expression: p.using_expression,
                with_check_expression: p.with_check_expression,
                comment: p.comment,
            }),
            Some(ParsedDirective::Role(r)) => db.roles.push(Role {
                struct_name: r.struct_name,
                name: r.name,
                login: r.login,
                password: r.password,
                superuser: r.superuser,
                createdb: r.createdb,
                createrole: r.createrole,
                inherit: r.inherit,
                replication: r.replication,
                comment: r.comment,
            }),
            Some(ParsedDirective::Constraint(c)) => db.constraints.push(Constraint {
                struct_name: c.struct_name,
                name: c.name,
                r#type: c.r#type,
                table: c.table,
                columns: c.columns,
                using_method: c.using_method,
                exclude_elements: c.exclude_elements,
                where_condition: c.where_condition,
                check_expression: c.check_expression,
                foreign_table: c.foreign_table,
                foreign_column: c.foreign_column,
                on_delete: c.on_delete,
                on_update: c.on_update,
            }),
            None => {}
        }
    }

    ir::dedup::dedup(&mut db);
    ir::embed::expand(&mut db, &mut log);
    ir::dedup::dedup(&mut db);
    ir::depgraph::build(&mut db, &mut log);
    ir::toposort::sort(&mut db, &mut log);

    (db, log)
}

/// When a Field specifies `type = ENUM` and carries a comma-separated enum
/// list, synthesize an `Enum` named `enum_<lowercase(struct)>_<lowercase
/// (field)>`, replace the field's `type` with that name, and insert the
/// enum into the IR.
fn rewrite_inline_enum(field: &mut Field, enums: &mut Vec<Enum>) {
    if !field.type_.eq_ignore_ascii_case("ENUM") || field.enum_values.is_empty() {
        return;
    }
    let enum_name = ir::generated_enum_name(&field.struct_name, &field.name);
    enums.push(Enum {
        name: enum_name.clone(),
        values: field.enum_values.clone(),
    });
    field.type_ = enum_name;
}
