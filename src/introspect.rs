//! The database-schema shape consumed at the differ boundary.
//!
//! Live introspection (querying `information_schema`, `pg_catalog`, etc.)
//! is external; this module only defines the value shape the differ
//! compares the IR against once introspection has already produced it.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DbSchema {
    pub tables: Vec<DbTable>,
    pub enums: Vec<DbEnum>,
    pub indexes: Vec<DbIndex>,
    pub extensions: Vec<DbExtension>,
    pub functions: Vec<DbFunction>,
    pub rls_policies: Vec<DbRlsPolicy>,
    pub rls_enabled_tables: Vec<String>,
    pub roles: Vec<DbRole>,
    pub constraints: Vec<DbConstraint>,
}

impl DbSchema {
    pub fn table(&self, name: &str) -> Option<&DbTable> {
        self.tables.iter().find(|t| t.name == name)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DbTable {
    pub name: String,
    pub columns: Vec<DbColumn>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DbColumn {
    pub name: String,
    pub data_type: String,
    pub udt_name: Option<String>,
    pub is_nullable: bool,
    pub column_default: Option<String>,
    pub is_primary_key: bool,
    pub is_unique: bool,
    pub is_auto_increment: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DbIndex {
    pub name: String,
    pub table_name: String,
    pub is_primary: bool,
    pub is_unique: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DbEnum {
    pub name: String,
    pub values: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DbExtension {
    pub name: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DbFunction {
    pub name: String,
    pub parameters: Option<String>,
    pub returns: String,
    pub language: String,
    pub security: Option<String>,
    pub volatility: Option<String>,
    pub body: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DbRlsPolicy {
    pub name: String,
    pub table: String,
    pub policy_for: Option<crate::ir::PolicyFor>,
    pub to_roles: Vec<String>,
    pub using_expression: Option<String>,
    pub with_check_expression: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DbRole {
    pub name: String,
    pub login: bool,
    pub superuser: bool,
    pub createdb: bool,
    pub createrole: bool,
    pub inherit: bool,
    pub replication: bool,
    pub has_password: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DbConstraint {
    pub name: String,
    pub table: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_lookup_by_name() {
        let schema = DbSchema {
            tables: vec![DbTable {
                name: "users".to_string(),
                columns: Vec::new(),
            }],
            ..Default::default()
        };
        assert!(schema.table("users").is_some());
        assert!(schema.table("orders").is_none());
    }
}
