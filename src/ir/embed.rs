//! Embedded-field expansion — the hardest isolated algorithm in the IR
//! layer.
//!
//! `inline` mode flattens every field of the embedded struct into the
//! container, recursively, with optional prefixing. `json` synthesizes a
//! single column. `relation` synthesizes a foreign-key field. `skip` is a
//! no-op. Expansion runs before the dependency grapher (`ir::depgraph`),
//! so FK relations introduced by `relation`-mode embedding participate in
//! ordering.
//!
//! A naive recursive formulation is only safe under an acyclic embedding
//! graph; this uses an explicit worklist plus a visited set keyed by
//! `(container, embedded_type, effective_prefix)` so a cyclic embedding
//! terminates instead of looping forever.

use crate::diagnostics::DiagnosticLog;
use crate::ir::{generated_relation_fk_name, Database, EmbeddedMode, Field};
use std::collections::{HashSet, VecDeque};

pub fn expand(db: &mut Database, log: &mut DiagnosticLog) {
    let mut generated: Vec<Field> = Vec::new();

    // Snapshot the pre-expansion embedded fields; `relation`/`json` are
    // handled per-occurrence, `inline` drives the worklist below.
    let embedded_snapshot = db.embedded_fields.clone();

    for embedded in &embedded_snapshot {
        match embedded.mode.unwrap_or(EmbeddedMode::Inline) {
            EmbeddedMode::Inline => {
                expand_inline(
                    db,
                    &embedded.struct_name,
                    &embedded.embedded_type_name,
                    embedded.prefix.as_deref().unwrap_or(""),
                    &mut generated,
                    log,
                );
            }
            EmbeddedMode::Json => {
                generated.push(expand_json(embedded));
            }
            EmbeddedMode::Relation => {
                generated.push(expand_relation(embedded));
            }
            EmbeddedMode::Skip => {}
        }
    }

    db.fields.extend(generated);
}

fn expand_inline(
    db: &Database,
    container: &str,
    embedded_type: &str,
    prefix: &str,
    generated: &mut Vec<Field>,
    log: &mut DiagnosticLog,
) {
    let mut worklist: VecDeque<(String, String, String)> =
        VecDeque::from([(container.to_string(), embedded_type.to_string(), prefix.to_string())]);
    let mut visited: HashSet<(String, String, String)> = HashSet::new();

    while let Some((s, t, p)) = worklist.pop_front() {
        let key = (s.clone(), t.clone(), p.clone());
        if visited.contains(&key) {
            log.warning(format!(
                "embedding cycle detected expanding {:?} into {:?}; skipping repeat visit",
                t, s
            ));
            continue;
        }
        visited.insert(key);

        for field in db.fields.iter().filter(|f| f.struct_name == t) {
            let mut cloned = field.clone();
            cloned.struct_name = s.clone();
            cloned.name = format!("{}{}", p, field.name);
            generated.push(cloned);
        }

        for inner in db
            .embedded_fields
            .iter()
            .filter(|e| e.struct_name == t && e.mode.unwrap_or(EmbeddedMode::Inline) == EmbeddedMode::Inline)
        {
            let combined_prefix = format!("{}{}", p, inner.prefix.as_deref().unwrap_or(""));
            worklist.push_back((s.clone(), inner.embedded_type_name.clone(), combined_prefix));
        }
    }
}

/// `json` mode: column name defaults to `<lowercase(embedded_type)>_data`;
/// column type defaults to `JSONB`.
fn expand_json(embedded: &crate::ir::EmbeddedField) -> Field {
    let name = embedded.name.clone().unwrap_or_else(|| {
        format!("{}_data", embedded.embedded_type_name.to_ascii_lowercase())
    });
    let type_ = embedded.type_.clone().unwrap_or_else(|| "JSONB".to_string());

    Field {
        struct_name: embedded.struct_name.clone(),
        field_name: embedded
            .field
            .clone()
            .unwrap_or_else(|| embedded.embedded_type_name.clone()),
        name,
        type_,
        nullable: embedded.nullable,
        primary: false,
        auto_inc: false,
        unique: false,
        unique_expr: None,
        default: None,
        default_expr: None,
        foreign: None,
        foreign_key_name: None,
        enum_values: Vec::new(),
        check: None,
        comment: embedded.comment.clone(),
        overrides: embedded.overrides.clone(),
    }
}

/// `relation` mode: synthesizes a foreign-key field named
/// `embedded.field`, referencing `embedded.ref`, typed `INTEGER` unless
/// the ref text suggests a textual key (VARCHAR/TEXT/uuid), in which case
/// `VARCHAR(36)`. Always carries `mysql.type = INT` / `mariadb.type = INT`
/// overrides for MySQL/MariaDB compatibility with auto-increment parents.
fn expand_relation(embedded: &crate::ir::EmbeddedField) -> Field {
    let field_name = embedded
        .field
        .clone()
        .unwrap_or_else(|| format!("{}_id", embedded.embedded_type_name.to_ascii_lowercase()));

    let reference = embedded.r#ref.clone().unwrap_or_default();
    let reference_upper = reference.to_ascii_uppercase();
    let type_ = if reference_upper.contains("VARCHAR")
        || reference_upper.contains("TEXT")
        || reference.to_ascii_lowercase().contains("uuid")
    {
        "VARCHAR(36)".to_string()
    } else {
        "INTEGER".to_string()
    };

    let mut overrides = embedded.overrides.clone();
    overrides
        .entry("mysql".to_string())
        .or_default()
        .insert("type".to_string(), "INT".to_string());
    overrides
        .entry("mariadb".to_string())
        .or_default()
        .insert("type".to_string(), "INT".to_string());

    Field {
        struct_name: embedded.struct_name.clone(),
        field_name: field_name.clone(),
        name: field_name.clone(),
        type_,
        nullable: embedded.nullable,
        primary: false,
        auto_inc: false,
        unique: false,
        unique_expr: None,
        default: None,
        default_expr: None,
        foreign: Some(reference),
        foreign_key_name: Some(generated_relation_fk_name(&embedded.struct_name, &field_name)),
        enum_values: Vec::new(),
        check: None,
        comment: embedded.comment.clone(),
        overrides,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::EmbeddedField;

    fn field(struct_name: &str, name: &str) -> Field {
        Field {
            struct_name: struct_name.to_string(),
            field_name: name.to_string(),
            name: name.to_string(),
            type_: "TEXT".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn inline_expansion_flattens_with_prefix() {
        let mut db = Database::default();
        db.fields.push(field("Address", "street"));
        db.fields.push(field("Address", "city"));
        db.embedded_fields.push(EmbeddedField {
            struct_name: "User".to_string(),
            mode: Some(EmbeddedMode::Inline),
            prefix: Some("home_".to_string()),
            embedded_type_name: "Address".to_string(),
            ..Default::default()
        });

        let mut log = DiagnosticLog::new();
        expand(&mut db, &mut log);

        let names: Vec<_> = db
            .fields
            .iter()
            .filter(|f| f.struct_name == "User")
            .map(|f| f.name.as_str())
            .collect();
        assert_eq!(names, vec!["home_street", "home_city"]);
    }

    #[test]
    fn inline_expansion_recurses_through_nested_embeds() {
        let mut db = Database::default();
        db.fields.push(field("Coordinates", "lat"));
        db.embedded_fields.push(EmbeddedField {
            struct_name: "Address".to_string(),
            mode: Some(EmbeddedMode::Inline),
            prefix: Some("geo_".to_string()),
            embedded_type_name: "Coordinates".to_string(),
            ..Default::default()
        });
        db.embedded_fields.push(EmbeddedField {
            struct_name: "User".to_string(),
            mode: Some(EmbeddedMode::Inline),
            prefix: Some("home_".to_string()),
            embedded_type_name: "Address".to_string(),
            ..Default::default()
        });

        let mut log = DiagnosticLog::new();
        expand(&mut db, &mut log);

        let names: Vec<_> = db
            .fields
            .iter()
            .filter(|f| f.struct_name == "User")
            .map(|f| f.name.as_str())
            .collect();
        assert_eq!(names, vec!["home_geo_lat"]);
    }

    #[test]
    fn inline_expansion_preserves_sibling_declaration_order() {
        // `Profile` has two inline-embedded siblings at the same nesting
        // level (`Address` declared before `Contact`); the worklist must
        // flatten them in that order, not reversed.
        let mut db = Database::default();
        db.fields.push(field("Address", "street"));
        db.fields.push(field("Contact", "phone"));
        db.embedded_fields.push(EmbeddedField {
            struct_name: "Profile".to_string(),
            mode: Some(EmbeddedMode::Inline),
            prefix: Some("addr_".to_string()),
            embedded_type_name: "Address".to_string(),
            ..Default::default()
        });
        db.embedded_fields.push(EmbeddedField {
            struct_name: "Profile".to_string(),
            mode: Some(EmbeddedMode::Inline),
            prefix: Some("contact_".to_string()),
            embedded_type_name: "Contact".to_string(),
            ..Default::default()
        });
        db.embedded_fields.push(EmbeddedField {
            struct_name: "User".to_string(),
            mode: Some(EmbeddedMode::Inline),
            prefix: Some("profile_".to_string()),
            embedded_type_name: "Profile".to_string(),
            ..Default::default()
        });

        let mut log = DiagnosticLog::new();
        expand(&mut db, &mut log);

        let names: Vec<_> = db
            .fields
            .iter()
            .filter(|f| f.struct_name == "User")
            .map(|f| f.name.as_str())
            .collect();
        assert_eq!(names, vec!["profile_addr_street", "profile_contact_phone"]);
    }

    #[test]
    fn embedding_cycle_terminates() {
        let mut db = Database::default();
        db.embedded_fields.push(EmbeddedField {
            struct_name: "A".to_string(),
            mode: Some(EmbeddedMode::Inline),
            embedded_type_name: "B".to_string(),
            ..Default::default()
        });
        db.embedded_fields.push(EmbeddedField {
            struct_name: "B".to_string(),
            mode: Some(EmbeddedMode::Inline),
            embedded_type_name: "A".to_string(),
            ..Default::default()
        });

        let mut log = DiagnosticLog::new();
        expand(&mut db, &mut log);
        assert!(log.entries().iter().any(|d| d.message.contains("cycle")));
    }

    #[test]
    fn relation_mode_defaults_to_integer_with_mysql_overrides() {
        let embedded = EmbeddedField {
            struct_name: "Article".to_string(),
            mode: Some(EmbeddedMode::Relation),
            field: Some("author_id".to_string()),
            r#ref: Some("users(id)".to_string()),
            embedded_type_name: "User".to_string(),
            ..Default::default()
        };
        let field = expand_relation(&embedded);
        assert_eq!(field.type_, "INTEGER");
        assert_eq!(field.overrides["mysql"]["type"], "INT");
        assert_eq!(field.overrides["mariadb"]["type"], "INT");
        assert_eq!(field.foreign_key_name.unwrap(), "fk_article_author_id");
    }

    #[test]
    fn relation_mode_prefers_textual_key_when_ref_mentions_uuid() {
        let embedded = EmbeddedField {
            struct_name: "Article".to_string(),
            mode: Some(EmbeddedMode::Relation),
            field: Some("author_id".to_string()),
            r#ref: Some("users(uuid)".to_string()),
            embedded_type_name: "User".to_string(),
            ..Default::default()
        };
        let field = expand_relation(&embedded);
        assert_eq!(field.type_, "VARCHAR(36)");
    }

    #[test]
    fn json_mode_defaults_name_and_type() {
        let embedded = EmbeddedField {
            struct_name: "Order".to_string(),
            mode: Some(EmbeddedMode::Json),
            embedded_type_name: "LineItems".to_string(),
            ..Default::default()
        };
        let field = expand_json(&embedded);
        assert_eq!(field.name, "lineitems_data");
        assert_eq!(field.type_, "JSONB");
    }

    #[test]
    fn skip_mode_generates_nothing() {
        let mut db = Database::default();
        db.embedded_fields.push(EmbeddedField {
            struct_name: "User".to_string(),
            mode: Some(EmbeddedMode::Skip),
            embedded_type_name: "Address".to_string(),
            ..Default::default()
        });
        let mut log = DiagnosticLog::new();
        expand(&mut db, &mut log);
        assert!(db.fields.is_empty());
    }
}
