//! Source assembly shared by both encoding rules.
//!
//! An emitter turns each resolved layout into function bodies; the assembler
//! orders the types, declares them, and lays out the header and source files
//! around those bodies.

use std::collections::{BTreeSet, HashMap};

use tracing::debug;

use crate::compiler::CompilationArtifact;
use crate::declarations::declare;
use crate::error::{GenerateError, Reason};
use crate::layout::{Layout, Symbol};
use crate::location::Location;
use crate::names::{include_guard, symbol_name};
use crate::support::EncodingRule;
use crate::writer::{Place, Writer};

/// A static C function (or struct plus functions) generated code relies on.
pub trait RuntimeHelper: Copy + Ord + 'static {
    /// Helpers the public wrappers call.
    const CORE: &'static [Self];

    /// Helpers that must be emitted before this one.
    fn dependencies(self) -> &'static [Self];

    fn source(self) -> &'static str;
}

/// Per-rule generation of function bodies.
pub trait CodeEmitter {
    type Helper: RuntimeHelper;

    const RULE: EncodingRule;

    /// Statements of `<type>_encode_inner`, reading from `src`.
    fn encode_body(&mut self, layout: &Layout, src: &Place) -> String;

    /// Statements of `<type>_decode_inner`, writing to `dst`.
    fn decode_body(&mut self, layout: &Layout, dst: &Place) -> String;

    /// Helpers called by every body emitted so far.
    fn used_helpers(&self) -> &BTreeSet<Self::Helper>;
}

/// A resolved top-level type assignment.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedType {
    pub symbol: Symbol,
    pub layout: Layout,
}

/// Where a type's value lives inside its struct: aggregates are the struct
/// itself, scalars its `value` member.
pub fn root_place(layout: &Layout, pointer: &str) -> Place {
    let root = Place::pointer(pointer);
    if layout.is_aggregate() { root } else { root.field("value") }
}

/// Types ordered so every type follows the types it embeds by value.
pub fn declaration_order(types: &[ResolvedType]) -> Result<Vec<&ResolvedType>, GenerateError> {
    let index: HashMap<&Symbol, usize> = types.iter().enumerate().map(|(i, t)| (&t.symbol, i)).collect();
    let mut state = vec![Visit::New; types.len()];
    let mut order = Vec::with_capacity(types.len());

    for start in 0..types.len() {
        visit(start, types, &index, &mut state, &mut order)?;
    }

    Ok(order.into_iter().map(|i| &types[i]).collect())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Visit {
    New,
    Active,
    Done,
}

fn visit(
    current: usize,
    types: &[ResolvedType],
    index: &HashMap<&Symbol, usize>,
    state: &mut [Visit],
    order: &mut Vec<usize>,
) -> Result<(), GenerateError> {
    match state[current] {
        Visit::Done => return Ok(()),
        Visit::Active => {
            let symbol = &types[current].symbol;
            let location = Location::new(&symbol.module, &symbol.name);
            return Err(location.error(Reason::RecursiveType(symbol.name.clone())));
        }
        Visit::New => {}
    }

    state[current] = Visit::Active;
    for dependency in types[current].layout.dependencies() {
        if let Some(&next) = index.get(dependency) {
            visit(next, types, index, state, order)?;
        }
    }
    state[current] = Visit::Done;
    order.push(current);
    Ok(())
}

/// Every helper in `used` plus their dependencies, in emission order.
pub fn helper_closure<H: RuntimeHelper>(used: &BTreeSet<H>) -> BTreeSet<H> {
    let mut closure = BTreeSet::new();
    let mut pending: Vec<H> = used.iter().copied().chain(H::CORE.iter().copied()).collect();
    while let Some(helper) = pending.pop() {
        if closure.insert(helper) {
            pending.extend(helper.dependencies().iter().copied());
        }
    }
    closure
}

pub fn assemble<E: CodeEmitter>(
    namespace: &str,
    types: &[ResolvedType],
    mut emitter: E,
) -> Result<CompilationArtifact, GenerateError> {
    let ordered = declaration_order(types)?;

    let mut definitions = Writer::new();
    for resolved in &ordered {
        let name = symbol_name(namespace, &resolved.symbol);
        debug!(symbol = %name, rule = %E::RULE, "emitting functions");

        let src = root_place(&resolved.layout, "src_p");
        let body = emitter.encode_body(&resolved.layout, &src);
        definitions.line(format!("static void {name}_encode_inner("));
        definitions.line("    struct encoder_t *encoder_p,");
        definitions.line(format!("    const struct {name}_t *src_p)"));
        function_body(&mut definitions, &body, ["encoder_p", "src_p"]);
        definitions.blank();

        let dst = root_place(&resolved.layout, "dst_p");
        let body = emitter.decode_body(&resolved.layout, &dst);
        definitions.line(format!("static void {name}_decode_inner("));
        definitions.line("    struct decoder_t *decoder_p,");
        definitions.line(format!("    struct {name}_t *dst_p)"));
        function_body(&mut definitions, &body, ["decoder_p", "dst_p"]);
        definitions.blank();
    }

    let header = header(namespace, &ordered, E::RULE);

    let mut source = Writer::new();
    source.line("#include <errno.h>");
    source.line("#include <string.h>");
    source.blank();
    source.line(format!("#include \"{namespace}.h\""));
    source.blank();

    if !ordered.is_empty() {
        for helper in helper_closure(emitter.used_helpers()) {
            source.raw(helper.source());
            source.blank();
        }

        for resolved in &ordered {
            let name = symbol_name(namespace, &resolved.symbol);
            source.line(format!("static void {name}_encode_inner("));
            source.line("    struct encoder_t *encoder_p,");
            source.line(format!("    const struct {name}_t *src_p);"));
            source.line(format!("static void {name}_decode_inner("));
            source.line("    struct decoder_t *decoder_p,");
            source.line(format!("    struct {name}_t *dst_p);"));
        }
        source.blank();
    }

    source.raw(&definitions.finish());

    for resolved in &ordered {
        public_functions(&mut source, &symbol_name(namespace, &resolved.symbol));
    }

    Ok(CompilationArtifact {
        header,
        source: source.finish(),
    })
}

/// Writes `{ body }`, casting away parameters the body never mentions.
fn function_body(out: &mut Writer, body: &str, parameters: [&str; 2]) {
    out.line("{");
    for parameter in parameters {
        if !body.contains(parameter) {
            out.line(format!("    (void){parameter};"));
        }
    }
    out.raw(body);
    out.line("}");
}

fn header(namespace: &str, ordered: &[&ResolvedType], rule: EncodingRule) -> String {
    let guard = include_guard(namespace);
    let mut out = Writer::new();

    out.line(format!("#ifndef {guard}"));
    out.line(format!("#define {guard}"));
    out.blank();
    out.line("#ifdef __cplusplus");
    out.line("extern \"C\" {");
    out.line("#endif");
    out.blank();
    out.line("#include <stdbool.h>");
    out.line("#include <stdint.h>");
    out.line("#include <sys/types.h>");
    out.blank();
    out.line("#define EOUTOFDATA 279");
    out.line("#define EBADCHOICE 280");
    out.line("#define EBADLENGTH 281");
    out.line("#define EBADENUM 282");
    out.line("#define EBADVALUE 283");
    out.blank();

    for resolved in ordered {
        let declaration = declare(namespace, &resolved.symbol, &resolved.layout);
        out.raw(&declaration.enums);
        out.raw(&declaration.structure);
        out.blank();
    }

    for resolved in ordered {
        let name = symbol_name(namespace, &resolved.symbol);
        out.line("/**");
        out.line(format!(" * Encode given data as {rule}."));
        out.line(" *");
        out.line(" * @param[out] encoded_p Buffer to place encoded data in.");
        out.line(" * @param[in] size Size of the encoded data buffer.");
        out.line(" * @param[in] src_p Data to encode.");
        out.line(" *");
        out.line(" * @return Encoded data length or negative error code.");
        out.line(" */");
        out.line(format!("ssize_t {name}_encode("));
        out.line("    uint8_t *encoded_p,");
        out.line("    size_t size,");
        out.line(format!("    const struct {name}_t *src_p);"));
        out.blank();
        out.line("/**");
        out.line(format!(" * Decode given {rule} data."));
        out.line(" *");
        out.line(" * @param[out] dst_p Decoded data.");
        out.line(" * @param[in] encoded_p Encoded data.");
        out.line(" * @param[in] size Encoded data size.");
        out.line(" *");
        out.line(" * @return Number of bytes decoded or negative error code.");
        out.line(" */");
        out.line(format!("ssize_t {name}_decode("));
        out.line(format!("    struct {name}_t *dst_p,"));
        out.line("    const uint8_t *encoded_p,");
        out.line("    size_t size);");
        out.blank();
    }

    out.line("#ifdef __cplusplus");
    out.line("}");
    out.line("#endif");
    out.blank();
    out.line("#endif");
    out.finish()
}

fn public_functions(out: &mut Writer, name: &str) {
    out.line(format!("ssize_t {name}_encode("));
    out.line("    uint8_t *encoded_p,");
    out.line("    size_t size,");
    out.line(format!("    const struct {name}_t *src_p)"));
    out.open("{");
    out.line("struct encoder_t encoder;");
    out.blank();
    out.line("encoder_init(&encoder, encoded_p, size);");
    out.line(format!("{name}_encode_inner(&encoder, src_p);"));
    out.blank();
    out.line("return (encoder_get_result(&encoder));");
    out.close("}");
    out.blank();
    out.line(format!("ssize_t {name}_decode("));
    out.line(format!("    struct {name}_t *dst_p,"));
    out.line("    const uint8_t *encoded_p,");
    out.line("    size_t size)");
    out.open("{");
    out.line("struct decoder_t decoder;");
    out.blank();
    out.line("decoder_init(&decoder, encoded_p, size);");
    out.line("memset(dst_p, 0, sizeof(*dst_p));");
    out.line(format!("{name}_decode_inner(&decoder, dst_p);"));
    out.blank();
    out.line("return (decoder_get_result(&decoder));");
    out.close("}");
    out.blank();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{MemberLayout, Presence};

    fn reference(name: &str) -> Layout {
        Layout::Reference(Symbol::new("Foo", name))
    }

    fn sequence_of(members: Vec<Layout>) -> Layout {
        Layout::Sequence(
            members
                .into_iter()
                .enumerate()
                .map(|(i, layout)| MemberLayout {
                    name: format!("m{i}"),
                    layout,
                    presence: Presence::Required,
                })
                .collect(),
        )
    }

    fn resolved(name: &str, layout: Layout) -> ResolvedType {
        ResolvedType {
            symbol: Symbol::new("Foo", name),
            layout,
        }
    }

    #[test]
    fn orders_dependencies_first_then_declaration_order() {
        let types = vec![
            resolved("A", sequence_of(vec![reference("C")])),
            resolved("B", Layout::Boolean),
            resolved("C", sequence_of(vec![reference("B")])),
        ];
        let names: Vec<_> = declaration_order(&types)
            .unwrap()
            .into_iter()
            .map(|t| t.symbol.name.as_str())
            .collect();
        assert_eq!(names, vec!["B", "C", "A"]);
    }

    #[test]
    fn rejects_by_value_cycles_at_first_type() {
        let types = vec![
            resolved("A", sequence_of(vec![reference("B")])),
            resolved("B", sequence_of(vec![reference("A")])),
        ];
        let err = declaration_order(&types).unwrap_err();
        assert_eq!(err.to_string(), "Foo.A: Recursive type 'A' is not supported.");
    }

    #[test]
    fn scalars_live_in_value_member() {
        assert_eq!(root_place(&Layout::Boolean, "src_p").expr(), "src_p->value");
        assert_eq!(root_place(&sequence_of(vec![]), "src_p").expr(), "src_p");
    }

    #[test]
    fn casts_unused_parameters() {
        let mut out = Writer::new();
        function_body(&mut out, "    dst_p->value = 1u;\n", ["decoder_p", "dst_p"]);
        assert_eq!(out.finish(), "{\n    (void)decoder_p;\n    dst_p->value = 1u;\n}\n");
    }
}
