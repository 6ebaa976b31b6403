pub mod directives;

use schemaforge::diagnostics::DiagnosticLog;
use schemaforge::ir::Database;

/// Runs the full `build -> dedup -> embed -> depgraph -> toposort`
/// pipeline and panics with the accumulated diagnostics if anything went
/// wrong that the caller didn't expect (tests call this when they want a
/// clean `Database` and don't care about diagnostics themselves).
pub fn expect_clean_build(directives: &[schemaforge::ir::directive::RawDirective]) -> Database {
    let (database, log) = schemaforge::ir::build(directives);
    for diagnostic in log.entries() {
        if matches!(diagnostic.severity, schemaforge::diagnostics::Severity::Error) {
            panic!("unexpected error diagnostic: {}", diagnostic.message);
        }
    }
    database
}

pub fn build(directives: &[schemaforge::ir::directive::RawDirective]) -> (Database, DiagnosticLog) {
    schemaforge::ir::build(directives)
}
