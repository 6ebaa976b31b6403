//! The schema intermediate representation.
//!
//! `Database` is the root aggregate. It owns every constituent collection
//! as an ordered `Vec` — order matters, since deduplication and
//! topological sort both promise deterministic output derived from
//! insertion order, not from any incidental `HashMap` iteration order.
//!
//! The IR is built once per invocation from annotation directives
//! (`ir::builder::build`) and is immutable once dependency analysis
//! completes — nothing here mutates a `Database` after `build` returns it.

pub mod builder;
pub mod dedup;
pub mod depgraph;
pub mod directive;
pub mod embed;
pub mod toposort;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub use builder::build;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Database {
    pub tables: Vec<Table>,
    pub fields: Vec<Field>,
    pub indexes: Vec<Index>,
    pub enums: Vec<Enum>,
    pub embedded_fields: Vec<EmbeddedField>,
    pub extensions: Vec<Extension>,
    pub functions: Vec<Function>,
    pub rls_policies: Vec<RlsPolicy>,
    pub rls_enabled_tables: Vec<RlsEnabledTable>,
    pub roles: Vec<Role>,
    pub constraints: Vec<Constraint>,

    /// Regular FK dependencies only; self-referencing FKs are segregated
    /// into `self_referencing_foreign_keys`.
    pub dependencies: HashMap<String, Vec<String>>,
    pub function_dependencies: HashMap<String, Vec<String>>,
    pub self_referencing_foreign_keys: HashMap<String, Vec<SelfReferencingForeignKey>>,

    /// Topological order of table names; tables not placeable due to a
    /// cycle are appended at the tail in original order.
    pub table_order: Vec<String>,
    pub function_order: Vec<String>,
}

impl Database {
    /// Struct name -> table name, precomputed once rather than scanning
    /// `tables` every time a field's owner needs resolving.
    pub fn struct_to_table(&self) -> HashMap<&str, &str> {
        self.tables
            .iter()
            .map(|t| (t.struct_name.as_str(), t.name.as_str()))
            .collect()
    }

    pub fn table_to_struct(&self) -> HashMap<&str, &str> {
        self.tables
            .iter()
            .map(|t| (t.name.as_str(), t.struct_name.as_str()))
            .collect()
    }

    pub fn table_by_name(&self, name: &str) -> Option<&Table> {
        self.tables.iter().find(|t| t.name == name)
    }

    pub fn fields_of_struct<'a>(&'a self, struct_name: &'a str) -> impl Iterator<Item = &'a Field> {
        self.fields.iter().filter(move |f| f.struct_name == struct_name)
    }

    pub fn field(&self, struct_name: &str, name: &str) -> Option<&Field> {
        self.fields
            .iter()
            .find(|f| f.struct_name == struct_name && f.name == name)
    }
}

pub type Overrides = HashMap<String, HashMap<String, String>>;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Table {
    pub struct_name: String,
    pub name: String,
    pub engine: Option<String>,
    pub comment: Option<String>,
    pub primary_key: Vec<String>,
    pub checks: Vec<String>,
    pub custom_sql: Option<String>,
    pub overrides: Overrides,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Field {
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
    pub overrides: Overrides,
}

impl Field {
    /// Primary-key fields are implicitly NOT NULL regardless of their
    /// declared `nullable` value.
    pub fn effective_nullable(&self) -> bool {
        if self.primary {
            false
        } else {
            self.nullable
        }
    }

    /// The table name a non-empty `foreign` reference points at: the
    /// substring preceding the first `(`.
    pub fn foreign_table(&self) -> Option<&str> {
        let foreign = self.foreign.as_deref()?;
        foreign.split('(').next().map(|s| s.trim())
    }

    pub fn override_for(&self, dialect_key: &str, key: &str) -> Option<&str> {
        self.overrides.get(dialect_key)?.get(key).map(|s| s.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IndexType {
    BTree,
    Gin,
    Gist,
    Hash,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Index {
    pub struct_name: String,
    pub name: String,
    pub fields: Vec<String>,
    pub unique: bool,
    pub comment: Option<String>,
    pub r#type: Option<IndexType>,
    pub condition: Option<String>,
    pub operator: Option<String>,
    /// Cross-table target; when absent, resolved from `struct_name` via
    /// the struct->table map during index emission.
    pub table_name: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Enum {
    pub name: String,
    pub values: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EmbeddedMode {
    Inline,
    Json,
    Relation,
    Skip,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EmbeddedField {
    pub struct_name: String,
    pub mode: Option<EmbeddedMode>,
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
    pub overrides: Overrides,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Extension {
    pub name: String,
    pub if_not_exists: bool,
    pub version: Option<String>,
    pub comment: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Function {
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

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PolicyFor {
    All,
    Select,
    Insert,
    Update,
    Delete,
}

impl PolicyFor {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "ALL" => Some(PolicyFor::All),
            "SELECT" => Some(PolicyFor::Select),
            "INSERT" => Some(PolicyFor::Insert),
            "UPDATE" => Some(PolicyFor::Update),
            "DELETE" => Some(PolicyFor::Delete),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RlsPolicy {
    pub struct_name: String,
    pub name: String,
    pub table: String,
    pub policy_for: Option<PolicyFor>,
    pub to_roles: Vec<String>,
    pub using_expression: Option<String>,
    pub with_check_expression: Option<String>,
    pub comment: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RlsEnabledTable {
    pub struct_name: String,
    pub table: String,
    pub comment: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Role {
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

impl Default for Role {
    fn default() -> Self {
        Role {
            struct_name: String::new(),
            name: String::new(),
            login: false,
            password: None,
            superuser: false,
            createdb: false,
            createrole: false,
            inherit: true,
            replication: false,
            comment: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConstraintType {
    Exclude,
    Check,
    Unique,
    PrimaryKey,
    ForeignKey,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Constraint {
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

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SelfReferencingForeignKey {
    pub field_name: String,
    pub foreign: String,
    pub foreign_key_name: Option<String>,
}

/// Generated enum type name for an inline `ENUM` column.
pub fn generated_enum_name(struct_name: &str, field_name: &str) -> String {
    format!(
        "enum_{}_{}",
        struct_name.to_ascii_lowercase(),
        field_name.to_ascii_lowercase()
    )
}

/// Generated FK constraint name for a `relation`-mode embedded field.
pub fn generated_relation_fk_name(container: &str, field: &str) -> String {
    format!(
        "fk_{}_{}",
        container.to_ascii_lowercase(),
        field.to_ascii_lowercase()
    )
}
