use crate::command::Options;
use chrono::Utc;
use schemaforge::diagnostics::Severity;
use schemaforge::diff::CompareOptions;
use schemaforge::introspect::DbSchema;
use schemaforge::ir::directive::RawDirective;
use schemaforge::{diff, ir, plan};
use std::fs;
use std::io;

/// Reads the directive stream and, if given, an introspection snapshot,
/// then runs `build -> diff -> plan` and prints the `SchemaDiff` and AST
/// plan. Directive lexing and live introspection stay external — this
/// command only consumes their already-parsed JSON stand-ins, per the
/// core's documented external interfaces.
pub fn migrate(options: &Options) -> io::Result<()> {
    let directives_raw = fs::read_to_string(&options.directives_path)?;
    let directives: Vec<RawDirective> = serde_json::from_str(&directives_raw).map_err(|e| {
        io::Error::new(
            io::ErrorKind::InvalidData,
            format!("failed to parse directives JSON: {e}"),
        )
    })?;

    let db_schema = match &options.introspection_path {
        Some(path) => {
            let raw = fs::read_to_string(path)?;
            serde_json::from_str::<DbSchema>(&raw).map_err(|e| {
                io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("failed to parse introspection JSON: {e}"),
                )
            })?
        }
        None => DbSchema::default(),
    };

    let (database, mut log) = ir::build(&directives);

    let compare_options = if options.ignored_extensions.is_empty() {
        CompareOptions::default()
    } else {
        CompareOptions::with_additional(options.ignored_extensions.clone())
    };
    let schema_diff = diff::diff(&database, &db_schema, &compare_options);
    let ops = plan::plan(&schema_diff, &database, options.dialect, &mut log);
    let generated_at = Utc::now().to_rfc3339();

    if options.json {
        let output = serde_json::json!({
            "generated_at": generated_at,
            "dialect": options.dialect.to_string(),
            "diff": schema_diff,
            "plan": ops,
        });
        println!("{}", serde_json::to_string_pretty(&output).unwrap());
    } else {
        println!("-- generated {generated_at} for {} --", options.dialect);
        print_human_readable(&schema_diff, &ops);
    }

    for diagnostic in log.entries() {
        eprintln!("{}", diagnostic.render(options.enable_color));
    }

    if log.count(Severity::Error) > 0 {
        std::process::exit(1);
    }

    Ok(())
}

fn print_human_readable(schema_diff: &schemaforge::diff::SchemaDiff, ops: &[schemaforge::Operation]) {
    if schema_diff.is_empty() {
        println!("No schema changes detected.");
        return;
    }

    println!("-- schema diff --");
    println!("tables added:    {}", schema_diff.tables_added.len());
    println!("tables removed:  {}", schema_diff.tables_removed.len());
    println!("tables modified: {}", schema_diff.tables_modified.len());
    println!("enums added/removed/modified: {}/{}/{}",
        schema_diff.enums_added.len(), schema_diff.enums_removed.len(), schema_diff.enums_modified.len());
    println!("indexes added/removed: {}/{}", schema_diff.indexes_added.len(), schema_diff.indexes_removed.len());
    println!(
        "extensions added/removed: {}/{}",
        schema_diff.extensions_added.len(),
        schema_diff.extensions_removed.len()
    );
    println!("roles added/modified: {}/{}", schema_diff.roles_added.len(), schema_diff.roles_modified.len());
    println!();

    println!("-- migration plan ({} operations) --", ops.len());
    for (i, op) in ops.iter().enumerate() {
        println!("{:>3}. {}", i + 1, describe(op));
    }
}

/// A one-line human summary of an AST node; the real renderer (external
/// to this core) is responsible for dialect-specific SQL text.
fn describe(op: &schemaforge::Operation) -> String {
    use schemaforge::Operation::*;
    match op {
        CreateExtension { name, .. } => format!("CREATE EXTENSION {name}"),
        CreateRole { role } => format!("CREATE ROLE {}", role.name),
        CreateFunction { function } => format!("CREATE FUNCTION {}", function.name),
        CreateEnum { r#enum } => format!("CREATE TYPE {} AS ENUM", r#enum.name),
        AlterEnumAddValue { enum_name, value } => format!("ALTER TYPE {enum_name} ADD VALUE '{value}'"),
        Comment { text, .. } => format!("-- {text}"),
        ErrorComment { text } => format!("-- ERROR: {text}"),
        CreateTable { name, columns } => format!("CREATE TABLE {name} ({} columns)", columns.len()),
        AlterTable { table, operations } => format!("ALTER TABLE {table} ({} ops)", operations.len()),
        EnableRls { table } => format!("ALTER TABLE {table} ENABLE ROW LEVEL SECURITY"),
        DisableRls { table } => format!("ALTER TABLE {table} DISABLE ROW LEVEL SECURITY"),
        CreatePolicy { policy, .. } => format!("CREATE POLICY {} ON {}", policy.name, policy.table),
        DropPolicy { name, table, .. } => format!("DROP POLICY {name} ON {table}"),
        CreateIndex { index, table } => format!("CREATE INDEX {} ON {table}", index.name),
        DropIndex { name, .. } => format!("DROP INDEX {name}"),
        AddConstraint { table, constraint } => format!("ALTER TABLE {table} ADD CONSTRAINT {}", constraint.name),
        DropConstraint { name } => format!("DROP CONSTRAINT {name}"),
        AlterRole { name, .. } => format!("ALTER ROLE {name}"),
        DropTable { name, .. } => format!("DROP TABLE {name}"),
        DropFunction { name, .. } => format!("DROP FUNCTION {name}"),
        DropRole { name, .. } => format!("DROP ROLE {name}"),
        DropEnum { name, .. } => format!("DROP TYPE {name}"),
        DropExtension { name, .. } => format!("DROP EXTENSION {name}"),
    }
}
