use criterion::{black_box, criterion_group, criterion_main, Criterion};
use schemaforge::dialect::Dialect;
use schemaforge::diff::{diff, CompareOptions};
use schemaforge::introspect::DbSchema;
use schemaforge::ir::directive::RawDirective;
use schemaforge::ir::{self};
use schemaforge::plan;

fn synthetic_directives(table_count: usize) -> Vec<RawDirective> {
    let mut directives = Vec::new();
    for i in 0..table_count {
        let struct_name = format!("Table{i}");
        let table_name = format!("table_{i}");
        directives.push(RawDirective::new("table", struct_name.clone()).with("name", table_name));
        directives.push(
            RawDirective::new("field", struct_name.clone())
                .with("name", "id")
                .with("type", "INTEGER")
                .with("primary", "true"),
        );
        if i > 0 {
            let parent = format!("table_{}", i - 1);
            directives.push(
                RawDirective::new("field", struct_name.clone())
                    .with("name", "parent_id")
                    .with("type", "INTEGER")
                    .with("foreign", format!("{parent}(id)")),
            );
        }
    }
    directives
}

fn build_benchmark(c: &mut Criterion) {
    let directives = synthetic_directives(200);
    c.bench_function("ir::build 200 tables", |b| {
        b.iter(|| {
            let (database, _log) = ir::build(black_box(&directives));
            database
        })
    });
}

fn diff_benchmark(c: &mut Criterion) {
    let directives = synthetic_directives(200);
    let (database, _log) = ir::build(&directives);
    let empty_db = DbSchema::default();

    c.bench_function("diff::diff 200 tables against empty db", |b| {
        b.iter(|| diff(black_box(&database), black_box(&empty_db), &CompareOptions::default()))
    });
}

fn plan_benchmark(c: &mut Criterion) {
    let directives = synthetic_directives(200);
    let (database, _log) = ir::build(&directives);
    let empty_db = DbSchema::default();
    let schema_diff = diff(&database, &empty_db, &CompareOptions::default());

    c.bench_function("plan::plan 200 tables against empty db", |b| {
        b.iter(|| {
            let mut log = schemaforge::diagnostics::DiagnosticLog::new();
            plan::plan(black_box(&schema_diff), black_box(&database), Dialect::Postgres, &mut log)
        })
    });
}

criterion_group!(benches, build_benchmark, diff_benchmark, plan_benchmark);
criterion_main!(benches);
