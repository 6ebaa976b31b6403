//! The tagged dialect variant threaded through the normalizer and planner.
//!
//! String comparisons on `"postgres"` / `"mysql"` / `"mariadb"` scattered
//! through branching logic are an easy way to typo a dialect check. Every
//! entry point that needs to branch on target engine takes a `Dialect`
//! instead.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Dialect {
    Postgres,
    MySql,
    MariaDb,
}

impl Dialect {
    /// Only PostgreSQL implements roles, functions, RLS, extensions,
    /// EXCLUDE constraints, native enums, and partial/operator-class indexes.
    pub fn is_postgres(self) -> bool {
        matches!(self, Dialect::Postgres)
    }

    /// MySQL and MariaDB share the relational planner phases and only
    /// differ in small rendering details the (external) renderer handles.
    pub fn is_mysql_family(self) -> bool {
        matches!(self, Dialect::MySql | Dialect::MariaDb)
    }

    /// The dialect override key used to look up `Field.overrides` /
    /// `EmbeddedField.overrides` maps (e.g. `mysql.type`, `mariadb.type`).
    pub fn override_key(self) -> &'static str {
        match self {
            Dialect::Postgres => "postgres",
            Dialect::MySql => "mysql",
            Dialect::MariaDb => "mariadb",
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.override_key())
    }
}
