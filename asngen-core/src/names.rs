//! C identifiers derived from location paths.

use heck::ToSnakeCase;

use crate::layout::Symbol;

/// `foo`, `Foo` `A` `a` → `foo_foo_a_a`.
pub fn c_name<S: AsRef<str>>(namespace: &str, path: &[S]) -> String {
    let mut name = namespace.to_snake_case();
    for segment in path {
        name.push('_');
        name.push_str(&segment.as_ref().to_snake_case());
    }
    name
}

/// Prefix of every C symbol generated for a top-level type.
pub fn symbol_name(namespace: &str, symbol: &Symbol) -> String {
    c_name(namespace, &[&symbol.module, &symbol.name])
}

/// Struct member name for an ASN.1 identifier.
pub fn field_name(identifier: &str) -> String {
    identifier.to_snake_case()
}

pub fn presence_flag(identifier: &str) -> String {
    format!("is_{}_present", field_name(identifier))
}

/// C enum type for an ENUMERATED at `path`.
pub fn enum_type(namespace: &str, path: &[String]) -> String {
    format!("{}_e", c_name(namespace, path))
}

pub fn enum_value(namespace: &str, path: &[String], item: &str) -> String {
    format!("{}_{}_e", c_name(namespace, path), field_name(item))
}

/// C enum type of the `choice` selector of a CHOICE at `path`.
pub fn choice_type(namespace: &str, path: &[String]) -> String {
    format!("{}_choice_e", c_name(namespace, path))
}

pub fn choice_value(namespace: &str, path: &[String], alternative: &str) -> String {
    format!("{}_choice_{}_e", c_name(namespace, path), field_name(alternative))
}

/// `FOO_H` for `foo`.
pub fn include_guard(namespace: &str) -> String {
    format!("{}_H", namespace.to_snake_case().to_uppercase())
}
