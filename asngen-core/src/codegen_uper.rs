//! UPER backend (X.691, unaligned variant).
//!
//! Every constrained quantity is written as an offset from its lower bound
//! in the fewest bits covering the range; a range of one value takes no
//! bits at all.

use std::collections::BTreeSet;

use crate::assembler::{CodeEmitter, assemble};
use crate::compiler::CompilationArtifact;
use crate::constraints::resolve_specification;
use crate::error::GenerateError;
use crate::layout::{
    AlternativeLayout, ChoiceLayout, EnumeratedLayout, IntegerLayout, Layout, MemberLayout, Presence,
    SizeLayout, StringKind,
};
use crate::names::{choice_value, enum_value, field_name, presence_flag, symbol_name};
use crate::support::EncodingRule;
use crate::types::Specification;
use crate::uper_runtime::UperHelper;
use crate::writer::{
    Place, Writer, default_literal, int_literal, length_out_of_range, uint_literal, wrapping_u64,
};

/// Generate the UPER header and source for every type in `spec`.
pub fn generate(spec: &Specification, namespace: &str) -> Result<CompilationArtifact, GenerateError> {
    let types = resolve_specification(spec, EncodingRule::Uper)?;
    assemble(namespace, &types, UperEmitter::new(namespace))
}

pub struct UperEmitter<'a> {
    namespace: &'a str,
    helpers: BTreeSet<UperHelper>,
    variables: usize,
}

/// How the payload octets of a string are written.
#[derive(Debug, Clone, Copy)]
enum Payload {
    Octets,
    SevenBitChars,
}

impl<'a> UperEmitter<'a> {
    pub fn new(namespace: &'a str) -> Self {
        UperEmitter {
            namespace,
            helpers: BTreeSet::new(),
            variables: 0,
        }
    }

    fn call(&mut self, helper: UperHelper) {
        self.helpers.insert(helper);
    }

    fn variable(&mut self, base: &str) -> String {
        let name = format!("{base}_{}", self.variables);
        self.variables += 1;
        name
    }

    /// `encoder_append_non_negative_binary_integer(...)` for `bits > 0`.
    fn append_bits(&mut self, out: &mut Writer, value: &str, bits: u32) {
        if bits > 0 {
            self.call(UperHelper::AppendNonNegativeBinaryInteger);
            out.line(format!(
                "encoder_append_non_negative_binary_integer(encoder_p, {value}, {bits});"
            ));
        }
    }

    fn read_bits(&mut self, bits: u32) -> String {
        self.call(UperHelper::ReadNonNegativeBinaryInteger);
        format!("decoder_read_non_negative_binary_integer(decoder_p, {bits})")
    }
}

impl CodeEmitter for UperEmitter<'_> {
    type Helper = UperHelper;

    const RULE: EncodingRule = EncodingRule::Uper;

    fn encode_body(&mut self, layout: &Layout, src: &Place) -> String {
        self.variables = 0;
        let mut out = Writer::with_level(1);
        self.encode(&mut out, layout, src);
        out.finish()
    }

    fn decode_body(&mut self, layout: &Layout, dst: &Place) -> String {
        self.variables = 0;
        let mut out = Writer::with_level(1);
        self.decode(&mut out, layout, dst);
        out.finish()
    }

    fn used_helpers(&self) -> &BTreeSet<UperHelper> {
        &self.helpers
    }
}

fn payload(kind: StringKind) -> Payload {
    match kind {
        StringKind::IA5 | StringKind::Visible => Payload::SevenBitChars,
        StringKind::UTF8 => Payload::Octets,
    }
}

/// Alternatives in canonical tag order; the position is the CHOICE index.
fn canonical_order(choice: &ChoiceLayout) -> Vec<&AlternativeLayout> {
    let mut alternatives: Vec<_> = choice.alternatives.iter().collect();
    alternatives.sort_by_key(|a| a.tag);
    alternatives
}

// ---------------------------------------------------------------------
// Encoding
// ---------------------------------------------------------------------

impl UperEmitter<'_> {
    fn encode(&mut self, out: &mut Writer, layout: &Layout, place: &Place) {
        match layout {
            Layout::Null => {}
            Layout::Boolean => {
                self.call(UperHelper::AppendBool);
                out.line(format!("encoder_append_bool(encoder_p, {place});"));
            }
            Layout::Integer(int) => self.encode_integer(out, int, place),
            // Rejected for UPER before a layout is built.
            Layout::Real(_) => {}
            Layout::Enumerated(enumerated) => self.encode_enumerated(out, enumerated, place),
            Layout::OctetString(size) => self.encode_octets(out, size, Payload::Octets, place),
            Layout::CharacterString { kind, size } => {
                self.encode_octets(out, size, payload(*kind), place)
            }
            Layout::BitString(size) => self.encode_bits(out, size, place),
            Layout::Sequence(members) => self.encode_sequence(out, members, place),
            Layout::Choice(choice) => self.encode_choice(out, choice, place),
            Layout::SequenceOf { size, element } => {
                let length = place.field("length");
                out.abort_if(&length_out_of_range(length.expr(), size), "encoder", "EBADLENGTH");
                self.append_bits(
                    out,
                    &format!("{length} - {}", uint_literal(size.minimum)),
                    size.uper_bits,
                );
                if size.maximum > 0 {
                    let i = self.variable("i");
                    let mut body = out.nested();
                    self.encode(&mut body, element, &place.field("elements").index(&i));
                    if !body.is_empty() {
                        out.line(format!("for (uint64_t {i} = 0; {i} < {length}; {i}++) {{"));
                        out.raw(&body.finish());
                        out.line("}");
                    }
                }
            }
            Layout::Reference(symbol) => out.line(format!(
                "{}_encode_inner(encoder_p, {});",
                symbol_name(self.namespace, symbol),
                place.address()
            )),
        }
    }

    fn encode_integer(&mut self, out: &mut Writer, int: &IntegerLayout, place: &Place) {
        let offset = if int.minimum == 0 {
            format!("(uint64_t){place}")
        } else {
            format!("(uint64_t){place} - {}", uint_literal(wrapping_u64(int.minimum)))
        };
        self.append_bits(out, &offset, int.uper_bits);
    }

    fn encode_enumerated(&mut self, out: &mut Writer, enumerated: &EnumeratedLayout, place: &Place) {
        out.line(format!("switch ({place}) {{"));
        out.blank();
        for (index, (item, _)) in enumerated.sorted().into_iter().enumerate() {
            out.line(format!("case {}:", enum_value(self.namespace, &enumerated.path, item)));
            out.indent();
            self.append_bits(out, &uint_literal(index as u64), enumerated.uper_bits);
            out.line("break;");
            out.dedent();
            out.blank();
        }
        out.line("default:");
        out.indent();
        out.abort("encoder", "EBADENUM");
        out.dedent();
        out.line("}");
    }

    fn encode_octets(&mut self, out: &mut Writer, size: &SizeLayout, payload: Payload, place: &Place) {
        let buf = place.field("buf");
        let count = if size.is_fixed() {
            size.maximum.to_string()
        } else {
            let length = place.field("length");
            out.abort_if(&length_out_of_range(length.expr(), size), "encoder", "EBADLENGTH");
            self.append_bits(
                out,
                &format!("{length} - {}", uint_literal(size.minimum)),
                size.uper_bits,
            );
            length.to_string()
        };
        if size.maximum == 0 {
            return;
        }
        match payload {
            Payload::Octets => {
                self.call(UperHelper::AppendBytes);
                out.line(format!("encoder_append_bytes(encoder_p, &{buf}[0], {count});"));
            }
            Payload::SevenBitChars => {
                self.call(UperHelper::AppendSevenBitChars);
                out.line(format!("encoder_append_seven_bit_chars(encoder_p, &{buf}[0], {count});"));
            }
        }
    }

    fn encode_bits(&mut self, out: &mut Writer, size: &SizeLayout, place: &Place) {
        let buf = place.field("buf");
        let count = if size.is_fixed() {
            size.maximum.to_string()
        } else {
            let bits = place.field("number_of_bits");
            out.abort_if(&length_out_of_range(bits.expr(), size), "encoder", "EBADLENGTH");
            self.append_bits(
                out,
                &format!("{bits} - {}", uint_literal(size.minimum)),
                size.uper_bits,
            );
            bits.to_string()
        };
        if size.maximum > 0 {
            self.call(UperHelper::AppendBits);
            out.line(format!("encoder_append_bits(encoder_p, &{buf}[0], {count});"));
        }
    }

    fn encode_sequence(&mut self, out: &mut Writer, members: &[MemberLayout], place: &Place) {
        for member in members.iter().filter(|m| m.has_presence_flag()) {
            self.call(UperHelper::AppendBool);
            out.line(format!(
                "encoder_append_bool(encoder_p, {});",
                place.field(&presence_flag(&member.name))
            ));
        }

        for member in members {
            let field = place.field(&field_name(&member.name));
            if member.has_presence_flag() {
                let mut body = out.nested();
                self.encode(&mut body, &member.layout, &field);
                if !body.is_empty() {
                    out.line(format!("if ({}) {{", place.field(&presence_flag(&member.name))));
                    out.raw(&body.finish());
                    out.line("}");
                }
            } else {
                self.encode(out, &member.layout, &field);
            }
        }
    }

    fn encode_choice(&mut self, out: &mut Writer, choice: &ChoiceLayout, place: &Place) {
        let alternatives = canonical_order(choice);
        if let [only] = alternatives.as_slice() {
            let selector = choice_value(self.namespace, &choice.path, &only.name);
            out.abort_if(&format!("{} != {selector}", place.field("choice")), "encoder", "EBADCHOICE");
            let value = place.field("value").field(&field_name(&only.name));
            self.encode(out, &only.layout, &value);
            return;
        }

        out.line(format!("switch ({}) {{", place.field("choice")));
        out.blank();
        for (index, alternative) in alternatives.into_iter().enumerate() {
            out.line(format!(
                "case {}:",
                choice_value(self.namespace, &choice.path, &alternative.name)
            ));
            out.indent();
            self.append_bits(out, &uint_literal(index as u64), choice.uper_bits);
            let value = place.field("value").field(&field_name(&alternative.name));
            self.encode(out, &alternative.layout, &value);
            out.line("break;");
            out.dedent();
            out.blank();
        }
        out.line("default:");
        out.indent();
        out.abort("encoder", "EBADCHOICE");
        out.dedent();
        out.line("}");
    }
}

// ---------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------

impl UperEmitter<'_> {
    fn decode(&mut self, out: &mut Writer, layout: &Layout, place: &Place) {
        match layout {
            Layout::Null => {}
            Layout::Boolean => {
                self.call(UperHelper::ReadBool);
                out.line(format!("{place} = decoder_read_bool(decoder_p);"));
            }
            Layout::Integer(int) => self.decode_integer(out, int, place),
            Layout::Real(_) => {}
            Layout::Enumerated(enumerated) => self.decode_enumerated(out, enumerated, place),
            Layout::OctetString(size) => self.decode_octets(out, size, Payload::Octets, place),
            Layout::CharacterString { kind, size } => {
                self.decode_octets(out, size, payload(*kind), place)
            }
            Layout::BitString(size) => self.decode_bits(out, size, place),
            Layout::Sequence(members) => self.decode_sequence(out, members, place),
            Layout::Choice(choice) => self.decode_choice(out, choice, place),
            Layout::SequenceOf { size, element } => {
                let length = self.decode_length(out, size, &place.field("length"));
                if size.maximum > 0 {
                    let i = self.variable("i");
                    let mut body = out.nested();
                    self.decode(&mut body, element, &place.field("elements").index(&i));
                    if !body.is_empty() {
                        out.line(format!("for (uint64_t {i} = 0; {i} < {length}; {i}++) {{"));
                        out.raw(&body.finish());
                        out.line("}");
                    }
                }
            }
            Layout::Reference(symbol) => out.line(format!(
                "{}_decode_inner(decoder_p, {});",
                symbol_name(self.namespace, symbol),
                place.address()
            )),
        }
    }

    /// Reads a constrained length into `target` and returns the C
    /// expression holding it.
    fn decode_length(&mut self, out: &mut Writer, size: &SizeLayout, target: &Place) -> String {
        let length_type = size.length_type.name();
        if size.is_fixed() {
            out.line(format!("{target} = {};", uint_literal(size.maximum)));
            return target.to_string();
        }

        let length = self.variable("length");
        let read = self.read_bits(size.uper_bits);
        out.line(format!(
            "uint64_t {length} = {read} + {};",
            uint_literal(size.minimum)
        ));
        out.blank();
        out.abort_if(&length_out_of_range(&length, size), "decoder", "EBADLENGTH");
        out.line(format!("{target} = ({length_type}){length};"));
        length
    }

    fn decode_integer(&mut self, out: &mut Writer, int: &IntegerLayout, place: &Place) {
        let c_type = int.c_type.name();
        if int.uper_bits == 0 {
            out.line(format!("{place} = {};", int_literal(int.minimum, int.c_type)));
            return;
        }

        let value = self.variable("value");
        let read = self.read_bits(int.uper_bits);
        out.line(format!("uint64_t {value} = {read};"));
        out.blank();
        if int.span < u64::MAX >> (64 - int.uper_bits) {
            out.abort_if(
                &format!("{value} > {}", uint_literal(int.span)),
                "decoder",
                "EBADVALUE",
            );
        }
        if int.minimum == 0 {
            out.line(format!("{place} = ({c_type}){value};"));
        } else {
            out.line(format!(
                "{place} = ({c_type})({value} + {});",
                uint_literal(wrapping_u64(int.minimum))
            ));
        }
    }

    fn decode_enumerated(&mut self, out: &mut Writer, enumerated: &EnumeratedLayout, place: &Place) {
        let sorted = enumerated.sorted();
        if let [(only, _)] = sorted.as_slice() {
            out.line(format!("{place} = {};", enum_value(self.namespace, &enumerated.path, only)));
            return;
        }

        let value = self.variable("value");
        let read = self.read_bits(enumerated.uper_bits);
        out.line(format!("uint64_t {value} = {read};"));
        out.blank();
        out.line(format!("switch ({value}) {{"));
        out.blank();
        for (index, (item, _)) in sorted.into_iter().enumerate() {
            out.line(format!("case {}:", uint_literal(index as u64)));
            out.indent();
            out.line(format!(
                "{place} = {};",
                enum_value(self.namespace, &enumerated.path, item)
            ));
            out.line("break;");
            out.dedent();
            out.blank();
        }
        out.line("default:");
        out.indent();
        out.abort("decoder", "EBADENUM");
        out.dedent();
        out.line("}");
    }

    fn decode_octets(&mut self, out: &mut Writer, size: &SizeLayout, payload: Payload, place: &Place) {
        let buf = place.field("buf");
        let count = if size.is_fixed() {
            size.maximum.to_string()
        } else {
            self.decode_length(out, size, &place.field("length"))
        };
        if size.maximum == 0 {
            return;
        }
        match payload {
            Payload::Octets => {
                self.call(UperHelper::ReadBytes);
                out.line(format!("decoder_read_bytes(decoder_p, &{buf}[0], {count});"));
            }
            Payload::SevenBitChars => {
                self.call(UperHelper::ReadSevenBitChars);
                out.line(format!("decoder_read_seven_bit_chars(decoder_p, &{buf}[0], {count});"));
            }
        }
    }

    fn decode_bits(&mut self, out: &mut Writer, size: &SizeLayout, place: &Place) {
        let buf = place.field("buf");
        let count = if size.is_fixed() {
            size.maximum.to_string()
        } else {
            self.decode_length(out, size, &place.field("number_of_bits"))
        };
        if size.maximum > 0 {
            self.call(UperHelper::ReadBits);
            out.line(format!("decoder_read_bits(decoder_p, &{buf}[0], {count});"));
        }
    }

    fn decode_sequence(&mut self, out: &mut Writer, members: &[MemberLayout], place: &Place) {
        let mut flagged = false;
        for member in members.iter().filter(|m| m.has_presence_flag()) {
            self.call(UperHelper::ReadBool);
            out.line(format!(
                "{} = decoder_read_bool(decoder_p);",
                place.field(&presence_flag(&member.name))
            ));
            flagged = true;
        }
        if flagged {
            out.blank();
        }

        for member in members {
            let field = place.field(&field_name(&member.name));
            if !member.has_presence_flag() {
                self.decode(out, &member.layout, &field);
                continue;
            }

            let mut body = out.nested();
            self.decode(&mut body, &member.layout, &field);
            let default = match &member.presence {
                Presence::Default(default) => default_literal(self.namespace, default),
                Presence::Required | Presence::Optional => None,
            };
            if body.is_empty() && default.is_none() {
                continue;
            }
            out.line(format!("if ({}) {{", place.field(&presence_flag(&member.name))));
            out.raw(&body.finish());
            match default {
                Some(literal) => {
                    out.open("} else {");
                    out.line(format!("{field} = {literal};"));
                    out.close("}");
                }
                None => out.line("}"),
            }
        }
    }

    fn decode_choice(&mut self, out: &mut Writer, choice: &ChoiceLayout, place: &Place) {
        let alternatives = canonical_order(choice);
        if let [only] = alternatives.as_slice() {
            out.line(format!(
                "{} = {};",
                place.field("choice"),
                choice_value(self.namespace, &choice.path, &only.name)
            ));
            let value = place.field("value").field(&field_name(&only.name));
            self.decode(out, &only.layout, &value);
            return;
        }

        let index = self.variable("choice");
        let read = self.read_bits(choice.uper_bits);
        out.line(format!("uint64_t {index} = {read};"));
        out.blank();
        out.line(format!("switch ({index}) {{"));
        out.blank();
        for (position, alternative) in alternatives.into_iter().enumerate() {
            out.line(format!("case {}:", uint_literal(position as u64)));
            out.indent();
            out.line(format!(
                "{} = {};",
                place.field("choice"),
                choice_value(self.namespace, &choice.path, &alternative.name)
            ));
            let value = place.field("value").field(&field_name(&alternative.name));
            self.decode(out, &alternative.layout, &value);
            out.line("break;");
            out.dedent();
            out.blank();
        }
        out.line("default:");
        out.indent();
        out.abort("decoder", "EBADCHOICE");
        out.dedent();
        out.line("}");
    }
}
