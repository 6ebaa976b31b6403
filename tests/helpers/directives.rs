//! Small fixture builders for constructing [`RawDirective`] streams in
//! tests without hand-assembling key/value maps every time.

use schemaforge::ir::directive::RawDirective;

pub fn table(struct_name: &str, name: &str) -> RawDirective {
    RawDirective::new("table", struct_name).with("name", name)
}

pub fn field(struct_name: &str, name: &str, type_: &str) -> RawDirective {
    RawDirective::new("field", struct_name)
        .with("name", name)
        .with("type", type_)
}

pub fn primary_key_field(struct_name: &str, name: &str, type_: &str) -> RawDirective {
    field(struct_name, name, type_).with("primary", "true")
}

pub fn foreign_key_field(struct_name: &str, name: &str, type_: &str, references: &str) -> RawDirective {
    field(struct_name, name, type_).with("foreign", references)
}

pub fn embedded_relation(struct_name: &str, embedded_type: &str, field_name: &str, references: &str) -> RawDirective {
    RawDirective::new("embedded", struct_name)
        .with("type", embedded_type)
        .with("mode", "relation")
        .with("field", field_name)
        .with("ref", references)
}

pub fn extension(name: &str) -> RawDirective {
    RawDirective::new("extension", "").with("name", name)
}

pub fn rls_policy(struct_name: &str, name: &str, table: &str) -> RawDirective {
    RawDirective::new("rls.policy", struct_name)
        .with("name", name)
        .with("table", table)
        .with("for", "ALL")
}
