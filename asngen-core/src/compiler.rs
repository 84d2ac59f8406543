use std::path::Path;

use tracing::info;

use crate::error::{CoreError, GenerateError};
use crate::loader::load_specification;
use crate::support::EncodingRule;
use crate::types::Specification;
use crate::{codegen_oer, codegen_uper};

/// Generated C sources for one namespace: `<namespace>.h` and
/// `<namespace>.c`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompilationArtifact {
    pub header: String,
    pub source: String,
}

/// Generate encoders and decoders for every type in `spec`.
///
/// Either the whole specification generates or the first error found, in
/// module and declaration order, is returned and nothing is produced.
pub fn compile(
    spec: &Specification,
    namespace: &str,
    rule: EncodingRule,
) -> Result<CompilationArtifact, GenerateError> {
    let artifact = match rule {
        EncodingRule::Oer => codegen_oer::generate(spec, namespace)?,
        EncodingRule::Uper => codegen_uper::generate(spec, namespace)?,
    };
    info!(
        namespace,
        %rule,
        header_bytes = artifact.header.len(),
        source_bytes = artifact.source.len(),
        "generated C sources"
    );
    Ok(artifact)
}

/// Load a type tree from a file or directory and compile it.
pub fn compile_file(
    input: impl AsRef<Path>,
    namespace: &str,
    rule: EncodingRule,
) -> Result<CompilationArtifact, CoreError> {
    let spec = load_specification(input)?;
    Ok(compile(&spec, namespace, rule)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::parse_specification;

    const RULES: [EncodingRule; 2] = [EncodingRule::Oer, EncodingRule::Uper];

    /// A module `Foo` holding `A ::= <ty>`.
    fn single(ty: &str) -> Specification {
        let text = format!(r#"{{"modules": [{{"name": "Foo", "types": [{{"name": "A", "type": {ty}}}]}}]}}"#);
        parse_specification(&text).expect("valid type tree")
    }

    fn error(ty: &str, rule: EncodingRule) -> String {
        compile(&single(ty), "foo", rule)
            .expect_err("generation should fail")
            .to_string()
    }

    fn assert_error_for_all_rules(ty: &str, expected: &str) {
        for rule in RULES {
            assert_eq!(error(ty, rule), expected, "{rule}");
        }
    }

    #[test]
    fn unsupported_type() {
        assert_error_for_all_rules(
            r#"{"kind": "OBJECT IDENTIFIER"}"#,
            "Foo.A: Unsupported type 'OBJECT IDENTIFIER'.",
        );
    }

    #[test]
    fn unsupported_type_in_sequence() {
        assert_error_for_all_rules(
            r#"{"kind": "SEQUENCE", "members": [{"name": "a", "type": {"kind": "NumericString"}}]}"#,
            "Foo.A.a: Unsupported type 'NumericString'.",
        );
    }

    #[test]
    fn integer_no_minimum_nor_maximum() {
        assert_error_for_all_rules(r#"{"kind": "INTEGER"}"#, "Foo.A: INTEGER has no minimum value.");
    }

    #[test]
    fn integer_no_minimum() {
        assert_error_for_all_rules(
            r#"{"kind": "INTEGER", "value": {"lower": "MIN", "upper": 10}}"#,
            "Foo.A: INTEGER has no minimum value.",
        );
    }

    #[test]
    fn integer_no_maximum() {
        assert_error_for_all_rules(
            r#"{"kind": "INTEGER", "value": {"lower": 1, "upper": "MAX"}}"#,
            "Foo.A: INTEGER has no maximum value.",
        );
    }

    #[test]
    fn integer_over_64_bits() {
        assert_error_for_all_rules(
            r#"{"kind": "INTEGER", "value": {"lower": 0, "upper": "18446744073709551616"}}"#,
            "Foo.A: Type does not fit in 64 bits.",
        );
    }

    #[test]
    fn octet_string_no_size() {
        assert_error_for_all_rules(
            r#"{"kind": "OCTET STRING"}"#,
            "Foo.A: OCTET STRING has no maximum length.",
        );
    }

    #[test]
    fn octet_string_no_maximum() {
        assert_error_for_all_rules(
            r#"{"kind": "OCTET STRING", "size": {"lower": 1, "upper": "MAX"}}"#,
            "Foo.A: OCTET STRING has no maximum length.",
        );
    }

    #[test]
    fn sequence_of_no_size() {
        assert_error_for_all_rules(
            r#"{"kind": "SEQUENCE OF", "element": {"kind": "BOOLEAN"}}"#,
            "Foo.A: SEQUENCE OF has no maximum length.",
        );
    }

    #[test]
    fn sequence_of_no_maximum() {
        assert_error_for_all_rules(
            r#"{"kind": "SEQUENCE OF", "size": {"lower": 1, "upper": "MAX"}, "element": {"kind": "BOOLEAN"}}"#,
            "Foo.A: SEQUENCE OF has no maximum length.",
        );
    }

    #[test]
    fn oer_real_not_ieee754() {
        assert_eq!(
            error(r#"{"kind": "REAL"}"#, EncodingRule::Oer),
            "Foo.A: REAL not IEEE 754 binary32 or binary64."
        );
    }

    #[test]
    fn uper_rejects_real() {
        assert_eq!(
            error(r#"{"kind": "REAL", "encoding": "binary64"}"#, EncodingRule::Uper),
            "Foo.A: Unsupported type 'REAL'."
        );
    }

    #[test]
    fn members_backtrace() {
        assert_error_for_all_rules(
            r#"{"kind": "SEQUENCE", "members": [
                {"name": "a", "type": {"kind": "CHOICE", "members": [
                    {"name": "b", "type": {"kind": "INTEGER"}}
                ]}}
            ]}"#,
            "Foo.A.a.b: INTEGER has no minimum value.",
        );
    }

    #[test]
    fn first_failing_type_wins() {
        let spec = parse_specification(
            r#"{"modules": [{"name": "Foo", "types": [
                {"name": "A", "type": {"kind": "BOOLEAN"}},
                {"name": "B", "type": {"kind": "OCTET STRING"}},
                {"name": "C", "type": {"kind": "INTEGER"}}
            ]}]}"#,
        )
        .expect("valid type tree");
        let err = compile(&spec, "foo", EncodingRule::Oer).expect_err("generation should fail");
        assert_eq!(err.to_string(), "Foo.B: OCTET STRING has no maximum length.");
    }

    #[test]
    fn recursive_types_are_rejected() {
        let spec = parse_specification(
            r#"{"modules": [{"name": "Foo", "types": [
                {"name": "A", "type": {"kind": "SEQUENCE", "members": [
                    {"name": "b", "type": {"kind": "Reference", "name": "B"}}
                ]}},
                {"name": "B", "type": {"kind": "SEQUENCE", "members": [
                    {"name": "a", "type": {"kind": "Reference", "name": "A"}}
                ]}}
            ]}]}"#,
        )
        .expect("valid type tree");
        for rule in RULES {
            let err = compile(&spec, "foo", rule).expect_err("generation should fail");
            assert_eq!(err.to_string(), "Foo.A: Recursive type 'A' is not supported.");
        }
    }

    #[test]
    fn recursion_is_reported_before_later_failures() {
        let spec = parse_specification(
            r#"{"modules": [{"name": "Foo", "types": [
                {"name": "A", "type": {"kind": "SEQUENCE", "members": [
                    {"name": "a", "type": {"kind": "Reference", "name": "A"}}
                ]}},
                {"name": "B", "type": {"kind": "INTEGER"}}
            ]}]}"#,
        )
        .expect("valid type tree");
        for rule in RULES {
            let err = compile(&spec, "foo", rule).expect_err("generation should fail");
            assert_eq!(err.to_string(), "Foo.A: Recursive type 'A' is not supported.", "{rule}");
        }
    }

    #[test]
    fn defaults_on_referenced_types_decode_to_wrapped_value() {
        let spec = parse_specification(
            r#"{"modules": [{"name": "Foo", "types": [
                {"name": "E", "type": {"kind": "ENUMERATED", "items": [
                    {"name": "a", "value": -3}, {"name": "b", "value": 200}, {"name": "c", "value": 5}
                ]}},
                {"name": "I", "type": {"kind": "INTEGER", "value": {"lower": 0, "upper": 10}}},
                {"name": "S", "type": {"kind": "SEQUENCE", "members": [
                    {"name": "e", "type": {"kind": "Reference", "name": "E"}, "default": "c"},
                    {"name": "i", "type": {"kind": "Reference", "name": "I"}, "default": 4}
                ]}}
            ]}]}"#,
        )
        .expect("valid type tree");
        for rule in RULES {
            let artifact = compile(&spec, "foo", rule).expect("generation should succeed");
            assert!(artifact.source.contains("dst_p->e = (struct foo_foo_e_t){ .value = foo_foo_e_c_e };"));
            assert!(artifact.source.contains("dst_p->i = (struct foo_foo_i_t){ .value = 4u };"));
        }
    }

    #[test]
    fn integer_defaults_cover_the_full_unsigned_range() {
        let spec = single(
            r#"{"kind": "SEQUENCE", "members": [
                {"name": "x", "type": {"kind": "INTEGER", "value": {"lower": 0, "upper": 18446744073709551615}},
                 "default": 18446744073709551615}
            ]}"#,
        );
        for rule in RULES {
            let artifact = compile(&spec, "foo", rule).expect("generation should succeed");
            assert!(artifact.source.contains("dst_p->x = UINT64_C(18446744073709551615);"));
        }
    }

    #[test]
    fn colliding_c_member_names_are_rejected() {
        assert_error_for_all_rules(
            r#"{"kind": "SEQUENCE", "members": [
                {"name": "fooBar", "type": {"kind": "BOOLEAN"}},
                {"name": "foo_bar", "type": {"kind": "BOOLEAN"}}
            ]}"#,
            "Foo.A.foo_bar: Name 'foo_bar' clashes with another C identifier.",
        );
    }

    #[test]
    fn enumeration_values_must_fit_c_int() {
        assert_error_for_all_rules(
            r#"{"kind": "ENUMERATED", "items": [{"name": "a", "value": 0}, {"name": "x", "value": 5000000000}]}"#,
            "Foo.A: ENUMERATED value 'x' does not fit in a C int.",
        );
    }

    #[test]
    fn undefined_reference_is_rejected() {
        assert_error_for_all_rules(
            r#"{"kind": "SEQUENCE OF", "size": {"lower": 0, "upper": 2}, "element": {"kind": "Reference", "name": "Nope"}}"#,
            "Foo.A: Undefined type 'Nope'.",
        );
    }

    #[test]
    fn byte_integer_uses_uint8() {
        let spec = single(r#"{"kind": "INTEGER", "value": {"lower": 0, "upper": 255}}"#);

        let oer = compile(&spec, "foo", EncodingRule::Oer).expect("generation should succeed");
        assert!(oer.header.contains("struct foo_foo_a_t {\n    uint8_t value;\n};"));
        assert!(oer.source.contains("encoder_append_uint(encoder_p, (uint64_t)src_p->value, 1);"));

        let uper = compile(&spec, "foo", EncodingRule::Uper).expect("generation should succeed");
        assert!(uper.header.contains("struct foo_foo_a_t {\n    uint8_t value;\n};"));
        assert!(uper.source.contains(
            "encoder_append_non_negative_binary_integer(encoder_p, (uint64_t)src_p->value, 8);"
        ));
    }

    #[test]
    fn header_declares_public_functions() {
        let spec = single(r#"{"kind": "BOOLEAN"}"#);
        let artifact = compile(&spec, "foo", EncodingRule::Uper).expect("generation should succeed");
        assert!(artifact.header.starts_with("#ifndef FOO_H\n#define FOO_H\n"));
        assert!(artifact.header.contains("#define EBADCHOICE 280"));
        assert!(artifact.header.contains("ssize_t foo_foo_a_encode(\n    uint8_t *encoded_p,\n    size_t size,\n    const struct foo_foo_a_t *src_p);"));
        assert!(artifact.header.contains("ssize_t foo_foo_a_decode(\n    struct foo_foo_a_t *dst_p,"));
        assert!(artifact.source.contains("#include \"foo.h\""));
        assert!(artifact.source.contains("memset(dst_p, 0, sizeof(*dst_p));"));
    }

    #[test]
    fn referenced_types_are_declared_first() {
        let spec = parse_specification(
            r#"{"modules": [{"name": "Foo", "types": [
                {"name": "Outer", "type": {"kind": "SEQUENCE", "members": [
                    {"name": "inner", "type": {"kind": "Reference", "name": "Inner"}}
                ]}},
                {"name": "Inner", "type": {"kind": "BOOLEAN"}}
            ]}]}"#,
        )
        .expect("valid type tree");
        let artifact = compile(&spec, "foo", EncodingRule::Oer).expect("generation should succeed");
        let inner = artifact.header.find("struct foo_foo_inner_t {").expect("inner declared");
        let outer = artifact.header.find("struct foo_foo_outer_t {").expect("outer declared");
        assert!(inner < outer);
        assert!(artifact.header.contains("    struct foo_foo_inner_t inner;\n"));

        // Inner functions are forward declared before any definition.
        let forward = artifact.source.find("static void foo_foo_outer_encode_inner(\n    struct encoder_t *encoder_p,\n    const struct foo_foo_outer_t *src_p);").expect("forward declaration");
        let definition = artifact.source.find("static void foo_foo_inner_encode_inner(\n    struct encoder_t *encoder_p,\n    const struct foo_foo_inner_t *src_p)\n{").expect("definition");
        assert!(forward < definition);
    }

    #[test]
    fn only_used_helpers_are_emitted() {
        let spec = single(r#"{"kind": "BOOLEAN"}"#);
        let artifact = compile(&spec, "foo", EncodingRule::Oer).expect("generation should succeed");
        assert!(artifact.source.contains("static void encoder_append_bool("));
        assert!(artifact.source.contains("static void encoder_append_uint("));
        assert!(!artifact.source.contains("encoder_append_length_determinant"));
        assert!(!artifact.source.contains("decoder_read_tag"));
        assert!(!artifact.source.contains("encoder_append_float"));
    }

    #[test]
    fn output_is_deterministic() {
        let spec = parse_specification(
            r#"{"modules": [{"name": "Foo", "types": [
                {"name": "E", "type": {"kind": "ENUMERATED", "items": [
                    {"name": "a", "value": 0}, {"name": "b", "value": 3}
                ]}},
                {"name": "C", "type": {"kind": "CHOICE", "members": [
                    {"name": "e", "type": {"kind": "Reference", "name": "E"}},
                    {"name": "s", "type": {"kind": "IA5String", "size": {"lower": 0, "upper": 5}}}
                ]}}
            ]}]}"#,
        )
        .expect("valid type tree");
        for rule in RULES {
            let first = compile(&spec, "foo", rule).expect("generation should succeed");
            let second = compile(&spec, "foo", rule).expect("generation should succeed");
            assert_eq!(first, second);
        }
    }

    #[test]
    fn compiles_from_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("foo.json");
        std::fs::write(
            &path,
            r#"{"modules": [{"name": "Foo", "types": [{"name": "A", "type": {"kind": "NULL"}}]}]}"#,
        )
        .expect("write input");
        let artifact = compile_file(&path, "foo", EncodingRule::Uper).expect("generation should succeed");
        assert!(artifact.header.contains("struct foo_foo_a_t {\n    uint8_t dummy;\n};"));
        assert!(artifact.source.contains("(void)encoder_p;\n    (void)src_p;\n"));
    }
}
