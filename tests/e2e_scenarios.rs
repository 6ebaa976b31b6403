//! End-to-end scenarios covering concrete migration cases: a full
//! `directives -> build -> diff -> plan` run against a synthetic
//! introspected database, asserting on the resulting AST operation
//! sequence the way a caller actually would.

#[path = "helpers/mod.rs"]
mod helpers;

use helpers::directives as d;
use schemaforge::dialect::Dialect;
use schemaforge::diagnostics::DiagnosticLog;
use schemaforge::diff::{diff, CompareOptions};
use schemaforge::introspect::{DbColumn, DbExtension, DbSchema, DbTable};
use schemaforge::plan::{self, Operation};

fn empty_db() -> DbSchema {
    DbSchema::default()
}

/// Scenario 1: a single self-referencing table against an empty database
/// produces exactly a `CreateTable` followed by one `AlterTable
/// AddConstraint` for the self FK — no FK is ever inlined into the
/// `CREATE TABLE` itself.
#[test]
fn self_reference_produces_create_then_single_fk_constraint() {
    let directives = vec![
        d::table("User", "users"),
        d::primary_key_field("User", "id", "TEXT"),
        d::field("User", "parent_id", "TEXT").with("nullable", "true").with("foreign", "users(id)"),
        d::field("User", "email", "TEXT"),
    ];
    let (database, mut log) = helpers::build(&directives);
    let schema_diff = diff(&database, &empty_db(), &CompareOptions::default());
    let ops = plan::plan(&schema_diff, &database, Dialect::Postgres, &mut log);

    assert_eq!(ops.len(), 2);
    assert!(matches!(ops[0], Operation::CreateTable { ref name, .. } if name == "users"));
    match &ops[1] {
        Operation::AddConstraint { table, constraint } => {
            assert_eq!(table, "users");
            assert_eq!(constraint.foreign_table.as_deref(), Some("users"));
        }
        other => panic!("expected AddConstraint, got {:?}", other),
    }
}

/// Scenario 2: a four-table chain (tenants -> users -> locations -> areas)
/// where `users` also self-references, against an empty database. Table
/// creation order must be dependency-respecting, and every FK (6 regular
/// + 1 self) must land in a later `AlterTable`/`AddConstraint`, never
/// inlined into a `CreateTable`.
#[test]
fn four_table_chain_creates_in_dependency_order_then_all_fks() {
    let directives = vec![
        d::table("Tenant", "tenants"),
        d::primary_key_field("Tenant", "id", "TEXT"),
        d::table("User", "users"),
        d::primary_key_field("User", "id", "TEXT"),
        d::foreign_key_field("User", "tenant_id", "TEXT", "tenants(id)"),
        d::field("User", "manager_id", "TEXT").with("nullable", "true").with("foreign", "users(id)"),
        d::table("Location", "locations"),
        d::primary_key_field("Location", "id", "TEXT"),
        d::foreign_key_field("Location", "tenant_id", "TEXT", "tenants(id)"),
        d::foreign_key_field("Location", "user_id", "TEXT", "users(id)"),
        d::table("Area", "areas"),
        d::primary_key_field("Area", "id", "TEXT"),
        d::foreign_key_field("Area", "tenant_id", "TEXT", "tenants(id)"),
        d::foreign_key_field("Area", "user_id", "TEXT", "users(id)"),
        d::foreign_key_field("Area", "location_id", "TEXT", "locations(id)"),
    ];
    let (database, mut log) = helpers::build(&directives);
    assert_eq!(
        database.table_order,
        vec!["tenants".to_string(), "users".to_string(), "locations".to_string(), "areas".to_string()]
    );

    let schema_diff = diff(&database, &empty_db(), &CompareOptions::default());
    let ops = plan::plan(&schema_diff, &database, Dialect::Postgres, &mut log);

    let create_tables: Vec<&str> = ops
        .iter()
        .filter_map(|op| match op {
            Operation::CreateTable { name, .. } => Some(name.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(create_tables, vec!["tenants", "users", "locations", "areas"]);

    let fk_constraint_count = ops.iter().filter(|op| matches!(op, Operation::AddConstraint { .. })).count();
    assert_eq!(fk_constraint_count, 7);

    let last_create_table_idx = ops.iter().rposition(|op| matches!(op, Operation::CreateTable { .. })).unwrap();
    let first_fk_idx = ops.iter().position(|op| matches!(op, Operation::AddConstraint { .. })).unwrap();
    assert!(first_fk_idx > last_create_table_idx, "every FK constraint must come after all CreateTable nodes");
}

/// Scenario 3: a MySQL-targeted embedded `relation` field on a SERIAL
/// parent. The parent's id becomes `INT AUTO_INCREMENT`, the generated FK
/// column picks up the `mysql.type = INT` override, and the constraint is
/// still deferred to a later `ALTER TABLE`.
#[test]
fn mysql_embedded_relation_uses_int_override_and_defers_fk() {
    let directives = vec![
        d::table("User", "users"),
        d::primary_key_field("User", "id", "SERIAL").with("auto_inc", "true"),
        d::table("Article", "articles"),
        d::primary_key_field("Article", "id", "SERIAL").with("auto_inc", "true"),
        d::embedded_relation("Article", "User", "author_id", "users(id)"),
    ];
    let (database, mut log) = helpers::build(&directives);
    let schema_diff = diff(&database, &empty_db(), &CompareOptions::default());
    let ops = plan::plan(&schema_diff, &database, Dialect::MySql, &mut log);

    let users_columns = ops
        .iter()
        .find_map(|op| match op {
            Operation::CreateTable { name, columns } if name == "users" => Some(columns),
            _ => None,
        })
        .expect("users table created");
    let id_col = users_columns.iter().find(|c| c.name == "id").unwrap();
    assert!(id_col.auto_inc);

    let articles_columns = ops
        .iter()
        .find_map(|op| match op {
            Operation::CreateTable { name, columns } if name == "articles" => Some(columns),
            _ => None,
        })
        .expect("articles table created");
    let author_id_col = articles_columns.iter().find(|c| c.name == "author_id").unwrap();
    assert_eq!(author_id_col.type_, "INT");

    let fk_after_articles = ops.iter().any(|op| {
        matches!(op, Operation::AddConstraint { constraint, .. } if constraint.name == "fk_article_author_id")
    });
    assert!(fk_after_articles);
}

/// Scenario 4: extension ignore policy. Default options hide `plpgsql`
/// entirely; a custom ignore list that drops `plpgsql` from the default
/// set surfaces its removal.
#[test]
fn extension_ignore_policy_controls_plpgsql_visibility() {
    let directives = vec![d::extension("pg_trgm")];
    let (database, _log) = helpers::build(&directives);

    let db = DbSchema {
        extensions: vec![
            DbExtension { name: "plpgsql".to_string() },
            DbExtension { name: "pg_trgm".to_string() },
        ],
        ..Default::default()
    };

    let default_diff = diff(&database, &db, &CompareOptions::default());
    assert!(default_diff.extensions_added.is_empty());
    assert!(default_diff.extensions_removed.is_empty());

    let custom_opts = CompareOptions::with(["adminpack".to_string()]);
    let custom_diff = diff(&database, &db, &custom_opts);
    assert!(custom_diff.extensions_added.is_empty());
    assert_eq!(custom_diff.extensions_removed, vec!["plpgsql".to_string()]);
}

/// Scenario 5: a PostgreSQL default value carrying a trailing type cast
/// normalizes identically to the IR's plain literal default, so no
/// spurious `ModifyColumn` appears.
#[test]
fn postgres_cast_default_normalizes_to_no_diff() {
    let directives = vec![
        d::table("Post", "posts"),
        d::field("Post", "status", "TEXT").with("default", "active"),
    ];
    let (database, _log) = helpers::build(&directives);

    let db = DbSchema {
        tables: vec![DbTable {
            name: "posts".to_string(),
            columns: vec![DbColumn {
                name: "status".to_string(),
                data_type: "TEXT".to_string(),
                column_default: Some("'active'::text".to_string()),
                ..Default::default()
            }],
        }],
        ..Default::default()
    };

    let schema_diff = diff(&database, &db, &CompareOptions::default());
    assert!(schema_diff.tables_modified.is_empty());
}

/// Scenario 6: an RLS policy present in the database but absent from the
/// target IR is dropped, and the table it targeted gets a follow-up note
/// suggesting RLS might need disabling.
#[test]
fn rls_policy_removed_from_ir_is_dropped_with_a_note() {
    let database = schemaforge::Database::default();
    let db = DbSchema {
        rls_policies: vec![schemaforge::introspect::DbRlsPolicy {
            name: "user_policy".to_string(),
            table: "users".to_string(),
            ..Default::default()
        }],
        ..Default::default()
    };

    let schema_diff = diff(&database, &db, &CompareOptions::default());
    let mut log = DiagnosticLog::new();
    let ops = plan::plan(&schema_diff, &database, Dialect::Postgres, &mut log);

    assert!(matches!(
        ops[0],
        Operation::DropPolicy { ref name, ref table, .. } if name == "user_policy" && table == "users"
    ));
    assert!(matches!(ops[1], Operation::Comment { ref text, .. } if text.contains("users")));
}

/// Boundary: an empty IR against an empty database produces an empty plan.
#[test]
fn empty_ir_against_empty_db_produces_empty_plan() {
    let database = schemaforge::Database::default();
    let db = empty_db();
    let schema_diff = diff(&database, &db, &CompareOptions::default());
    assert!(schema_diff.is_empty());

    let mut log = DiagnosticLog::new();
    let ops = plan::plan(&schema_diff, &database, Dialect::Postgres, &mut log);
    assert!(ops.is_empty());
}

/// Boundary: identical IR and DB produce an empty plan (idempotence).
#[test]
fn identical_ir_and_db_produce_empty_plan() {
    let directives = vec![
        d::table("User", "users"),
        d::primary_key_field("User", "id", "TEXT"),
    ];
    let (database, _log) = helpers::build(&directives);

    let db = DbSchema {
        tables: vec![DbTable {
            name: "users".to_string(),
            columns: vec![DbColumn {
                name: "id".to_string(),
                data_type: "TEXT".to_string(),
                is_primary_key: true,
                ..Default::default()
            }],
        }],
        ..Default::default()
    };

    let schema_diff = diff(&database, &db, &CompareOptions::default());
    let mut log = DiagnosticLog::new();
    let ops = plan::plan(&schema_diff, &database, Dialect::Postgres, &mut log);
    assert!(ops.is_empty());
}

/// Running the full pipeline twice on the same inputs must produce
/// byte-identical output (ordering stability, spec property #1).
#[test]
fn pipeline_is_deterministic_across_repeated_runs() {
    let directives = vec![
        d::table("Tenant", "tenants"),
        d::primary_key_field("Tenant", "id", "TEXT"),
        d::table("User", "users"),
        d::primary_key_field("User", "id", "TEXT"),
        d::foreign_key_field("User", "tenant_id", "TEXT", "tenants(id)"),
        d::rls_policy("User", "user_policy", "users"),
    ];

    let run = || {
        let (database, mut log) = helpers::build(&directives);
        let schema_diff = diff(&database, &empty_db(), &CompareOptions::default());
        let ops = plan::plan(&schema_diff, &database, Dialect::Postgres, &mut log);
        serde_json::to_string(&ops).unwrap()
    };

    assert_eq!(run(), run());
}

/// Cycle in table dependencies: the plan is still generated in full,
/// unplaced tables land at the tail, and a warning is recorded.
#[test]
fn cyclic_table_dependency_still_produces_a_plan_with_a_warning() {
    let directives = vec![
        d::table("A", "a_table"),
        d::primary_key_field("A", "id", "TEXT"),
        d::foreign_key_field("A", "b_id", "TEXT", "b_table(id)"),
        d::table("B", "b_table"),
        d::primary_key_field("B", "id", "TEXT"),
        d::foreign_key_field("B", "a_id", "TEXT", "a_table(id)"),
    ];
    let (database, mut log) = helpers::build(&directives);
    assert!(log.entries().iter().any(|diag| diag.message.contains("cycle")));

    let schema_diff = diff(&database, &empty_db(), &CompareOptions::default());
    let ops = plan::plan(&schema_diff, &database, Dialect::Postgres, &mut log);

    let create_table_count = ops.iter().filter(|op| matches!(op, Operation::CreateTable { .. })).count();
    assert_eq!(create_table_count, 2);
}
