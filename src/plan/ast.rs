//! The planner's output shape: a tagged sequence of DDL operations. A
//! renderer (external to this core) is responsible for textualizing each
//! node into dialect-specific SQL; cascade/`IF EXISTS` are booleans here
//! rather than SQL string fragments so the renderer decides syntax.

use crate::ir::{Constraint, Enum, Field, Function, Index, Role, RlsPolicy, Table};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CommentSeverity {
    Info,
    Warning,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum AlterTableOp {
    AddColumn(Field),
    ModifyColumn {
        name: String,
        changes: HashMap<String, String>,
    },
    DropColumn {
        name: String,
        cascade: bool,
    },
    AddConstraint(Constraint),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Operation {
    CreateExtension {
        name: String,
        if_not_exists: bool,
    },
    CreateRole {
        role: Role,
    },
    CreateFunction {
        function: Function,
    },
    CreateEnum {
        r#enum: Enum,
    },
    AlterEnumAddValue {
        enum_name: String,
        value: String,
    },
    Comment {
        text: String,
        severity: CommentSeverity,
    },
    ErrorComment {
        text: String,
    },
    CreateTable {
        name: String,
        columns: Vec<Field>,
    },
    AlterTable {
        table: String,
        operations: Vec<AlterTableOp>,
    },
    EnableRls {
        table: String,
    },
    DisableRls {
        table: String,
    },
    CreatePolicy {
        policy: RlsPolicy,
        replace: bool,
    },
    DropPolicy {
        name: String,
        table: String,
        if_exists: bool,
    },
    CreateIndex {
        index: Index,
        table: String,
    },
    DropIndex {
        name: String,
        if_exists: bool,
    },
    AddConstraint {
        table: String,
        constraint: Constraint,
    },
    DropConstraint {
        name: String,
    },
    AlterRole {
        name: String,
        changes: HashMap<String, String>,
        set_password: bool,
    },
    DropTable {
        name: String,
        if_exists: bool,
        cascade: bool,
    },
    DropFunction {
        name: String,
        if_exists: bool,
    },
    DropRole {
        name: String,
        if_exists: bool,
    },
    DropEnum {
        name: String,
        if_exists: bool,
        cascade: bool,
    },
    DropExtension {
        name: String,
        if_exists: bool,
    },
}
