//! Typed directive records at the IR boundary.
//!
//! The annotation lexical layer is external: something else turns source
//! comments into [`RawDirective`] values, as loosely typed key/value maps.
//! [`parse`] is the boundary that turns one `RawDirective` into a strongly
//! typed [`ParsedDirective`] per directive kind, or `None` plus a
//! diagnostic when a required key is missing or the kind is unrecognized,
//! so the IR builder consumes sum-typed inputs rather than string maps.

use crate::diagnostics::DiagnosticLog;
use crate::ir::{ConstraintType, EmbeddedMode, IndexType, PolicyFor};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The boundary input type: `{kind, kv, owner, field}`. `Serialize` /
/// `Deserialize` let a caller (e.g. the CLI) read a directive stream from
/// a JSON file standing in for the real annotation lexer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawDirective {
    pub kind: String,
    pub kv: HashMap<String, String>,
    pub owner: String,
    pub field: Option<String>,
}

impl RawDirective {
    pub fn new(kind: impl Into<String>, owner: impl Into<String>) -> Self {
        RawDirective {
            kind: kind.into(),
            kv: HashMap::new(),
            owner: owner.into(),
            field: None,
        }
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.kv.insert(key.into(), value.into());
        self
    }

    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    fn get(&self, key: &str) -> Option<&str> {
        self.kv.get(key).map(|s| s.as_str())
    }

    fn get_bool(&self, key: &str, default: bool) -> bool {
        match self.get(key) {
            Some(v) => matches!(v.to_ascii_lowercase().as_str(), "true" | "1" | "yes"),
            None => default,
        }
    }

    fn get_csv(&self, key: &str) -> Vec<String> {
        match self.get(key) {
            Some(v) if !v.is_empty() => v.split(',').map(|s| s.trim().to_string()).collect(),
            _ => Vec::new(),
        }
    }

    /// Keys of the form `override.<dialect>.<key>` populate the
    /// per-dialect overrides map shared by `Field`/`EmbeddedField`/`Table`.
    fn overrides(&self) -> crate::ir::Overrides {
        let mut overrides: crate::ir::Overrides = HashMap::new();
        for (k, v) in &self.kv {
            if let Some(rest) = k.strip_prefix("override.") {
                if let Some((dialect, key)) = rest.split_once('.') {
                    overrides
                        .entry(dialect.to_string())
                        .or_default()
                        .insert(key.to_string(), v.clone());
                }
            }
        }
        overrides
    }
}

#[derive(Debug, Clone)]
pub struct TableDirective {
    pub struct_name: String,
    pub name: String,
    pub engine: Option<String>,
    pub comment: Option<String>,
    pub primary_key: Vec<String>,
    pub checks: Vec<String>,
    pub custom_sql: Option<String>,
    pub overrides: crate::ir::Overrides,
}

#[derive(Debug, Clone)]
pub struct FieldDirective {
    pub struct_name: String,
    pub field_name: String,
    pub name: String,
    pub type_: String,
    pub nullable: bool,
    pub primary: bool,
    pub auto_inc: bool,
    pub unique: bool,
    pub unique_expr: Option<String>,
    pub default: Option<String>,
    pub default_expr: Option<String>,
    pub foreign: Option<String>,
    pub foreign_key_name: Option<String>,
    pub enum_values: Vec<String>,
    pub check: Option<String>,
    pub comment: Option<String>,
    pub overrides: crate::ir::Overrides,
}

#[derive(Debug, Clone)]
pub struct EmbeddedDirective {
    pub struct_name: String,
    pub mode: EmbeddedMode,
    pub prefix: Option<String>,
    pub name: Option<String>,
    pub type_: Option<String>,
    pub nullable: bool,
    pub index: bool,
    pub field: Option<String>,
    pub r#ref: Option<String>,
    pub on_delete: Option<String>,
    pub on_update: Option<String>,
    pub comment: Option<String>,
    pub embedded_type_name: String,
    pub overrides: crate::ir::Overrides,
}

#[derive(Debug, Clone)]
pub struct IndexDirective {
    pub struct_name: String,
    pub name: String,
    pub fields: Vec<String>,
    pub unique: bool,
    pub comment: Option<String>,
    pub r#type: Option<IndexType>,
    pub condition: Option<String>,
    pub operator: Option<String>,
    pub table_name: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ExtensionDirective {
    pub name: String,
    pub if_not_exists: bool,
    pub version: Option<String>,
    pub comment: Option<String>,
}

#[derive(Debug, Clone)]
pub struct FunctionDirective {
    pub struct_name: String,
    pub name: String,
    pub parameters: Option<String>,
    pub returns: String,
    pub language: String,
    pub security: Option<String>,
    pub volatility: Option<String>,
    pub body: String,
    pub comment: Option<String>,
}

#[derive(Debug, Clone)]
pub struct RlsEnableDirective {
    pub struct_name: String,
    pub table: String,
    pub comment: Option<String>,
}

#[derive(Debug, Clone)]
pub struct RlsPolicyDirective {
    pub struct_name: String,
    pub name: String,
    pub table: String,
    pub policy_for: Option<PolicyFor>,
    pub to_roles: Vec<String>,
    pub using_expression: Option<String>,
    pub with_check_expression: Option<String>,
    pub comment: Option<String>,
}

#[derive(Debug, Clone)]
pub struct RoleDirective {
    pub struct_name: String,
    pub name: String,
    pub login: bool,
    pub password: Option<String>,
    pub superuser: bool,
    pub createdb: bool,
    pub createrole: bool,
    pub inherit: bool,
    pub replication: bool,
    pub comment: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ConstraintDirective {
    pub struct_name: String,
    pub name: String,
    pub r#type: Option<ConstraintType>,
    pub table: String,
    pub columns: Option<Vec<String>>,
    pub using_method: Option<String>,
    pub exclude_elements: Option<String>,
    pub where_condition: Option<String>,
    pub check_expression: Option<String>,
    pub foreign_table: Option<String>,
    pub foreign_column: Option<String>,
    pub on_delete: Option<String>,
    pub on_update: Option<String>,
}

#[derive(Debug, Clone)]
pub enum ParsedDirective {
    Table(TableDirective),
    Field(FieldDirective),
    Embedded(EmbeddedDirective),
    Index(IndexDirective),
    Extension(ExtensionDirective),
    Function(FunctionDirective),
    RlsEnable(RlsEnableDirective),
    RlsPolicy(RlsPolicyDirective),
    Role(RoleDirective),
    Constraint(ConstraintDirective),
}

fn constraint_type_from_str(s: &str) -> Option<ConstraintType> {
    match s.to_ascii_uppercase().as_str() {
        "EXCLUDE" => Some(ConstraintType::Exclude),
        "CHECK" => Some(ConstraintType::Check),
        "UNIQUE" => Some(ConstraintType::Unique),
        "PRIMARY KEY" => Some(ConstraintType::PrimaryKey),
        "FOREIGN KEY" => Some(ConstraintType::ForeignKey),
        _ => None,
    }
}

fn index_type_from_str(s: &str) -> Option<IndexType> {
    match s.to_ascii_uppercase().as_str() {
        "BTREE" => Some(IndexType::BTree),
        "GIN" => Some(IndexType::Gin),
        "GIST" => Some(IndexType::Gist),
        "HASH" => Some(IndexType::Hash),
        _ => None,
    }
}

/// Total: unknown kinds and directives missing a required key are skipped
/// silently, with the record counted toward `log`. Only a fixed, narrow
/// list of keys trigger a skip: `table.name`, `field.name`, `index.name`,
/// `function.name`, `rls.enable.table`, `rls.policy.name` /
/// `rls.policy.table`, `role.name`, `constraint.name`. Keys not on that
/// list (e.g. `extension.name`, `constraint.table`, `embedded.type`)
/// default to an empty value rather than causing a skip, so parsing never
/// fails outright on an otherwise-recognizable directive.
pub fn parse(raw: &RawDirective, log: &mut DiagnosticLog) -> Option<ParsedDirective> {
    match raw.kind.as_str() {
        "table" => {
            let name = require(raw, "name", "table.name", log)?;
            Some(ParsedDirective::Table(TableDirective {
                struct_name: raw.owner.clone(),
                name,
                engine: raw.get("engine").map(str::to_string),
                comment: raw.get("comment").map(str::to_string),
                primary_key: raw.get_csv("primary_key"),
                checks: raw
                    .get("checks")
                    .map(|v| v.split(";;").map(|s| s.trim().to_string()).collect())
                    .unwrap_or_default(),
                custom_sql: raw.get("custom_sql").map(str::to_string),
                overrides: raw.overrides(),
            }))
        }
        "field" => {
            let name = require(raw, "name", "field.name", log)?;
            let type_ = raw.get("type").unwrap_or_default().to_string();
            let enum_values = if type_.eq_ignore_ascii_case("ENUM") {
                raw.get_csv("enum")
            } else {
                Vec::new()
            };
            Some(ParsedDirective::Field(FieldDirective {
                struct_name: raw.owner.clone(),
                field_name: raw.field.clone().unwrap_or_else(|| name.clone()),
                name,
                type_,
                nullable: raw.get_bool("nullable", false),
                primary: raw.get_bool("primary", false),
                auto_inc: raw.get_bool("auto_inc", false),
                unique: raw.get_bool("unique", false),
                unique_expr: raw.get("unique_expr").map(str::to_string),
                default: raw.get("default").map(str::to_string),
                default_expr: raw.get("default_expr").map(str::to_string),
                foreign: raw.get("foreign").map(str::to_string),
                foreign_key_name: raw.get("foreign_key_name").map(str::to_string),
                enum_values,
                check: raw.get("check").map(str::to_string),
                comment: raw.get("comment").map(str::to_string),
                overrides: raw.overrides(),
            }))
        }
        "embedded" => {
            let mode = match raw.get("mode") {
                Some("json") => EmbeddedMode::Json,
                Some("relation") => EmbeddedMode::Relation,
                Some("skip") => EmbeddedMode::Skip,
                _ => EmbeddedMode::Inline,
            };
            Some(ParsedDirective::Embedded(EmbeddedDirective {
                struct_name: raw.owner.clone(),
                mode,
                prefix: raw.get("prefix").map(str::to_string),
                name: raw.get("name").map(str::to_string),
                type_: raw.get("column_type").map(str::to_string),
                nullable: raw.get_bool("nullable", false),
                index: raw.get_bool("index", false),
                field: raw.get("field").map(str::to_string),
                r#ref: raw.get("ref").map(str::to_string),
                on_delete: raw.get("on_delete").map(str::to_string),
                on_update: raw.get("on_update").map(str::to_string),
                comment: raw.get("comment").map(str::to_string),
                embedded_type_name: raw.get("type").unwrap_or_default().to_string(),
                overrides: raw.overrides(),
            }))
        }
        "index" => {
            let name = require(raw, "name", "index.name", log)?;
            Some(ParsedDirective::Index(IndexDirective {
                struct_name: raw.owner.clone(),
                name,
                fields: raw.get_csv("fields"),
                unique: raw.get_bool("unique", false),
                comment: raw.get("comment").map(str::to_string),
                r#type: raw.get("type").and_then(index_type_from_str),
                condition: raw.get("condition").map(str::to_string),
                operator: raw.get("operator").map(str::to_string),
                table_name: raw.get("table").map(str::to_string),
            }))
        }
        "extension" => Some(ParsedDirective::Extension(ExtensionDirective {
            name: raw.get("name").unwrap_or_default().to_string(),
            if_not_exists: raw.get_bool("if_not_exists", true),
            version: raw.get("version").map(str::to_string),
            comment: raw.get("comment").map(str::to_string),
        })),
        "function" => {
            let name = require(raw, "name", "function.name", log)?;
            Some(ParsedDirective::Function(FunctionDirective {
                struct_name: raw.owner.clone(),
                name,
                parameters: raw.get("parameters").map(str::to_string),
                returns: raw.get("returns").unwrap_or_default().to_string(),
                language: raw
                    .get("language")
                    .unwrap_or("plpgsql")
                    .to_string(),
                security: raw.get("security").map(str::to_string),
                volatility: raw.get("volatility").map(str::to_string),
                body: raw.get("body").unwrap_or_default().to_string(),
                comment: raw.get("comment").map(str::to_string),
            }))
        }
        "rls.enable" => {
            let table = require(raw, "table", "rls.enable.table", log)?;
            Some(ParsedDirective::RlsEnable(RlsEnableDirective {
                struct_name: raw.owner.clone(),
                table,
                comment: raw.get("comment").map(str::to_string),
            }))
        }
        "rls.policy" => {
            let name = require(raw, "name", "rls.policy.name", log)?;
            let table = require(raw, "table", "rls.policy.table", log)?;
            Some(ParsedDirective::RlsPolicy(RlsPolicyDirective {
                struct_name: raw.owner.clone(),
                name,
                table,
                policy_for: raw.get("for").and_then(PolicyFor::parse),
                to_roles: raw.get_csv("to"),
                using_expression: raw.get("using").map(str::to_string),
                with_check_expression: raw.get("with_check").map(str::to_string),
                comment: raw.get("comment").map(str::to_string),
            }))
        }
        "role" => {
            let name = require(raw, "name", "role.name", log)?;
            Some(ParsedDirective::Role(RoleDirective {
                struct_name: raw.owner.clone(),
                name,
                login: raw.get_bool("login", false),
                password: raw.get("password").map(str::to_string),
                superuser: raw.get_bool("superuser", false),
                createdb: raw.get_bool("createdb", false),
                createrole: raw.get_bool("createrole", false),
                inherit: raw.get_bool("inherit", true),
                replication: raw.get_bool("replication", false),
                comment: raw.get("comment").map(str::to_string),
            }))
        }
        "constraint" => {
            let name = require(raw, "name", "constraint.name", log)?;
            Some(ParsedDirective::Constraint(ConstraintDirective {
                struct_name: raw.owner.clone(),
                name,
                r#type: raw.get("type").and_then(constraint_type_from_str),
                table: raw.get("table").unwrap_or_default().to_string(),
                columns: {
                    let cols = raw.get_csv("columns");
                    if cols.is_empty() { None } else { Some(cols) }
                },
                using_method: raw.get("using_method").map(str::to_string),
                exclude_elements: raw.get("exclude_elements").map(str::to_string),
                where_condition: raw.get("where_condition").map(str::to_string),
                check_expression: raw.get("check_expression").map(str::to_string),
                foreign_table: raw.get("foreign_table").map(str::to_string),
                foreign_column: raw.get("foreign_column").map(str::to_string),
                on_delete: raw.get("on_delete").map(str::to_string),
                on_update: raw.get("on_update").map(str::to_string),
            }))
        }
        unknown => {
            log.info(format!("ignored unrecognized directive kind: {}", unknown));
            None
        }
    }
}

fn require(
    raw: &RawDirective,
    key: &str,
    qualified_name: &str,
    log: &mut DiagnosticLog,
) -> Option<String> {
    match raw.get(key) {
        Some(v) if !v.is_empty() => Some(v.to_string()),
        _ => {
            log.info(format!(
                "skipped {} directive on {:?}: missing required key {:?}",
                raw.kind, raw.owner, qualified_name
            ));
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_required_key_is_skipped_with_diagnostic() {
        let mut log = DiagnosticLog::new();
        let raw = RawDirective::new("table", "User");
        assert!(parse(&raw, &mut log).is_none());
        assert_eq!(log.entries().len(), 1);
    }

    #[test]
    fn unknown_kind_is_ignored() {
        let mut log = DiagnosticLog::new();
        let raw = RawDirective::new("mystery", "User");
        assert!(parse(&raw, &mut log).is_none());
        assert_eq!(log.entries().len(), 1);
    }

    #[test]
    fn field_enum_type_collects_values() {
        let mut log = DiagnosticLog::new();
        let raw = RawDirective::new("field", "User")
            .with("name", "status")
            .with("type", "ENUM")
            .with("enum", "active, inactive, banned");
        match parse(&raw, &mut log).unwrap() {
            ParsedDirective::Field(f) => {
                assert_eq!(f.enum_values, vec!["active", "inactive", "banned"]);
            }
            _ => panic!("expected Field"),
        }
        assert!(log.is_empty());
    }

    #[test]
    fn override_keys_populate_per_dialect_map() {
        let mut log = DiagnosticLog::new();
        let raw = RawDirective::new("field", "Article")
            .with("name", "author_id")
            .with("override.mysql.type", "INT")
            .with("override.mariadb.type", "INT");
        match parse(&raw, &mut log).unwrap() {
            ParsedDirective::Field(f) => {
                assert_eq!(f.overrides["mysql"]["type"], "INT");
                assert_eq!(f.overrides["mariadb"]["type"], "INT");
            }
            _ => panic!("expected Field"),
        }
    }
}
