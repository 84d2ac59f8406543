//! OER backend (X.696).
//!
//! Integers are written at their storage width, so every fixed-size value
//! has a fixed encoded size and only strings and lists carry lengths.

use std::collections::BTreeSet;

use crate::assembler::{CodeEmitter, assemble};
use crate::compiler::CompilationArtifact;
use crate::constraints::resolve_specification;
use crate::error::GenerateError;
use crate::layout::{ChoiceLayout, EnumeratedLayout, IntegerLayout, Layout, MemberLayout, Presence, RealFormat, SizeLayout};
use crate::names::{choice_value, enum_type, enum_value, field_name, presence_flag, symbol_name};
use crate::oer_runtime::{OerHelper, tag_octets, tag_value};
use crate::support::EncodingRule;
use crate::types::Specification;
use crate::writer::{Place, Writer, default_literal, hex_literal, length_out_of_range, value_out_of_range};

/// Generate the OER header and source for every type in `spec`.
pub fn generate(spec: &Specification, namespace: &str) -> Result<CompilationArtifact, GenerateError> {
    let types = resolve_specification(spec, EncodingRule::Oer)?;
    assemble(namespace, &types, OerEmitter::new(namespace))
}

pub struct OerEmitter<'a> {
    namespace: &'a str,
    helpers: BTreeSet<OerHelper>,
    variables: usize,
}

impl<'a> OerEmitter<'a> {
    pub fn new(namespace: &'a str) -> Self {
        OerEmitter {
            namespace,
            helpers: BTreeSet::new(),
            variables: 0,
        }
    }

    fn call(&mut self, helper: OerHelper) {
        self.helpers.insert(helper);
    }

    /// A local name unique within the current function.
    fn variable(&mut self, base: &str) -> String {
        let name = format!("{base}_{}", self.variables);
        self.variables += 1;
        name
    }
}

impl CodeEmitter for OerEmitter<'_> {
    type Helper = OerHelper;

    const RULE: EncodingRule = EncodingRule::Oer;

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

    fn used_helpers(&self) -> &BTreeSet<OerHelper> {
        &self.helpers
    }
}

// ---------------------------------------------------------------------
// Encoding
// ---------------------------------------------------------------------

impl OerEmitter<'_> {
    fn encode(&mut self, out: &mut Writer, layout: &Layout, place: &Place) {
        match layout {
            Layout::Null => {}
            Layout::Boolean => {
                self.call(OerHelper::AppendBool);
                out.line(format!("encoder_append_bool(encoder_p, {place});"));
            }
            Layout::Integer(int) => self.encode_integer(out, int, place),
            Layout::Real(RealFormat::Binary32) => {
                self.call(OerHelper::AppendFloat);
                out.line(format!("encoder_append_float(encoder_p, {place});"));
            }
            Layout::Real(RealFormat::Binary64) => {
                self.call(OerHelper::AppendDouble);
                out.line(format!("encoder_append_double(encoder_p, {place});"));
            }
            Layout::Enumerated(enumerated) => self.encode_enumerated(out, enumerated, place),
            Layout::OctetString(size) => self.encode_octets(out, size, !size.is_fixed(), place),
            Layout::CharacterString { kind, size } => {
                self.encode_octets(out, size, kind.needs_length(size), place)
            }
            Layout::BitString(size) => self.encode_bits(out, size, place),
            Layout::Sequence(members) => self.encode_sequence(out, members, place),
            Layout::Choice(choice) => self.encode_choice(out, choice, place),
            Layout::SequenceOf { size, element } => {
                let length = place.field("length");
                out.abort_if(&length_out_of_range(length.expr(), size), "encoder", "EBADLENGTH");
                self.call(OerHelper::AppendQuantity);
                out.line(format!("encoder_append_quantity(encoder_p, {length});"));
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
        let octets = int.oer_octets();
        if int.c_type.is_signed() {
            self.call(OerHelper::AppendInt);
            out.line(format!("encoder_append_int(encoder_p, (int64_t){place}, {octets});"));
        } else {
            self.call(OerHelper::AppendUint);
            out.line(format!("encoder_append_uint(encoder_p, (uint64_t){place}, {octets});"));
        }
    }

    fn encode_enumerated(&mut self, out: &mut Writer, enumerated: &EnumeratedLayout, place: &Place) {
        self.call(OerHelper::AppendEnumerated);
        out.line(format!("switch ({place}) {{"));
        out.blank();
        for (item, _) in &enumerated.items {
            out.line(format!("case {}:", enum_value(self.namespace, &enumerated.path, item)));
        }
        out.indent();
        out.line(format!("encoder_append_enumerated(encoder_p, (int64_t){place});"));
        out.line("break;");
        out.dedent();
        out.blank();
        out.line("default:");
        out.indent();
        out.abort("encoder", "EBADENUM");
        out.dedent();
        out.line("}");
    }

    fn encode_octets(&mut self, out: &mut Writer, size: &SizeLayout, has_length: bool, place: &Place) {
        let buf = place.field("buf");
        if has_length {
            let length = place.field("length");
            out.abort_if(&length_out_of_range(length.expr(), size), "encoder", "EBADLENGTH");
            self.call(OerHelper::AppendLengthDeterminant);
            out.line(format!("encoder_append_length_determinant(encoder_p, {length});"));
            if size.maximum > 0 {
                self.call(OerHelper::AppendBytes);
                out.line(format!("encoder_append_bytes(encoder_p, &{buf}[0], {length});"));
            }
        } else if size.maximum > 0 {
            self.call(OerHelper::AppendBytes);
            out.line(format!("encoder_append_bytes(encoder_p, &{buf}[0], {});", size.maximum));
        }
    }

    fn encode_bits(&mut self, out: &mut Writer, size: &SizeLayout, place: &Place) {
        let buf = place.field("buf");
        if size.is_fixed() {
            if size.maximum > 0 {
                self.call(OerHelper::AppendBytes);
                out.line(format!(
                    "encoder_append_bytes(encoder_p, &{buf}[0], {});",
                    size.maximum.div_ceil(8)
                ));
            }
            return;
        }

        let bits = place.field("number_of_bits");
        out.abort_if(&length_out_of_range(bits.expr(), size), "encoder", "EBADLENGTH");
        self.call(OerHelper::AppendLengthDeterminant);
        self.call(OerHelper::AppendUint);
        self.call(OerHelper::AppendBytes);
        out.line(format!(
            "encoder_append_length_determinant(encoder_p, ((uint64_t){bits} + 7) / 8 + 1);"
        ));
        out.line(format!("encoder_append_uint(encoder_p, (8 - ({bits} % 8)) % 8, 1);"));
        out.line(format!("encoder_append_bytes(encoder_p, &{buf}[0], ((size_t){bits} + 7) / 8);"));
    }

    fn encode_sequence(&mut self, out: &mut Writer, members: &[MemberLayout], place: &Place) {
        let flagged: Vec<&MemberLayout> = members.iter().filter(|m| m.has_presence_flag()).collect();
        if !flagged.is_empty() {
            let presence = self.variable("presence");
            out.line(format!("uint8_t {presence}[{}];", flagged.len().div_ceil(8)));
            out.blank();
            out.line(format!("memset(&{presence}[0], 0, sizeof({presence}));"));
            out.blank();
            for (i, member) in flagged.iter().enumerate() {
                out.open(format!("if ({}) {{", place.field(&presence_flag(&member.name))));
                out.line(format!("{presence}[{}] |= 0x{:02x}u;", i / 8, 0x80u8 >> (i % 8)));
                out.close("}");
                out.blank();
            }
            self.call(OerHelper::AppendBytes);
            out.line(format!("encoder_append_bytes(encoder_p, &{presence}[0], sizeof({presence}));"));
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
        self.call(OerHelper::AppendUint);
        out.line(format!("switch ({}) {{", place.field("choice")));
        out.blank();
        for alternative in &choice.alternatives {
            out.line(format!(
                "case {}:",
                choice_value(self.namespace, &choice.path, &alternative.name)
            ));
            out.indent();
            out.line(format!(
                "encoder_append_uint(encoder_p, {}, {});",
                hex_literal(tag_value(alternative.tag)),
                tag_octets(alternative.tag).len()
            ));
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

impl OerEmitter<'_> {
    fn decode(&mut self, out: &mut Writer, layout: &Layout, place: &Place) {
        match layout {
            Layout::Null => {}
            Layout::Boolean => {
                self.call(OerHelper::ReadBool);
                out.line(format!("{place} = decoder_read_bool(decoder_p);"));
            }
            Layout::Integer(int) => self.decode_integer(out, int, place),
            Layout::Real(RealFormat::Binary32) => {
                self.call(OerHelper::ReadFloat);
                out.line(format!("{place} = decoder_read_float(decoder_p);"));
            }
            Layout::Real(RealFormat::Binary64) => {
                self.call(OerHelper::ReadDouble);
                out.line(format!("{place} = decoder_read_double(decoder_p);"));
            }
            Layout::Enumerated(enumerated) => self.decode_enumerated(out, enumerated, place),
            Layout::OctetString(size) => self.decode_octets(out, size, !size.is_fixed(), place),
            Layout::CharacterString { kind, size } => {
                self.decode_octets(out, size, kind.needs_length(size), place)
            }
            Layout::BitString(size) => self.decode_bits(out, size, place),
            Layout::Sequence(members) => self.decode_sequence(out, members, place),
            Layout::Choice(choice) => self.decode_choice(out, choice, place),
            Layout::SequenceOf { size, element } => {
                let length = self.variable("length");
                self.call(OerHelper::ReadQuantity);
                out.line(format!("uint64_t {length} = decoder_read_quantity(decoder_p);"));
                out.blank();
                out.abort_if(&length_out_of_range(&length, size), "decoder", "EBADLENGTH");
                out.line(format!(
                    "{} = ({}){length};",
                    place.field("length"),
                    size.length_type.name()
                ));
                if size.maximum > 0 {
                    let i = self.variable("i");
                    let mut body = out.nested();
                    self.decode(&mut body, element, &place.field("elements").index(&i));
                    if !body.is_empty() {
                        out.blank();
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

    fn decode_integer(&mut self, out: &mut Writer, int: &IntegerLayout, place: &Place) {
        let octets = int.oer_octets();
        let c_type = int.c_type.name();
        if int.c_type.is_signed() {
            self.call(OerHelper::ReadInt);
            out.line(format!("{place} = ({c_type})decoder_read_int(decoder_p, {octets});"));
        } else {
            self.call(OerHelper::ReadUint);
            out.line(format!("{place} = ({c_type})decoder_read_uint(decoder_p, {octets});"));
        }
        if let Some(condition) = value_out_of_range(place.expr(), int) {
            out.blank();
            out.abort_if(&condition, "decoder", "EBADVALUE");
        }
    }

    fn decode_enumerated(&mut self, out: &mut Writer, enumerated: &EnumeratedLayout, place: &Place) {
        let value = self.variable("value");
        self.call(OerHelper::ReadEnumerated);
        out.line(format!("int64_t {value} = decoder_read_enumerated(decoder_p);"));
        out.blank();
        out.line(format!("switch ({value}) {{"));
        out.blank();
        for (item, _) in &enumerated.items {
            out.line(format!("case {}:", enum_value(self.namespace, &enumerated.path, item)));
        }
        out.indent();
        out.line(format!(
            "{place} = (enum {}){value};",
            enum_type(self.namespace, &enumerated.path)
        ));
        out.line("break;");
        out.dedent();
        out.blank();
        out.line("default:");
        out.indent();
        out.abort("decoder", "EBADENUM");
        out.dedent();
        out.line("}");
    }

    fn decode_octets(&mut self, out: &mut Writer, size: &SizeLayout, has_length: bool, place: &Place) {
        let buf = place.field("buf");
        if has_length {
            let length = self.variable("length");
            self.call(OerHelper::ReadLengthDeterminant);
            out.line(format!("uint64_t {length} = decoder_read_length_determinant(decoder_p);"));
            out.blank();
            out.abort_if(&length_out_of_range(&length, size), "decoder", "EBADLENGTH");
            out.line(format!(
                "{} = ({}){length};",
                place.field("length"),
                size.length_type.name()
            ));
            if size.maximum > 0 {
                self.call(OerHelper::ReadBytes);
                out.line(format!("decoder_read_bytes(decoder_p, &{buf}[0], {length});"));
            }
        } else if size.maximum > 0 {
            self.call(OerHelper::ReadBytes);
            out.line(format!("decoder_read_bytes(decoder_p, &{buf}[0], {});", size.maximum));
        }
    }

    fn decode_bits(&mut self, out: &mut Writer, size: &SizeLayout, place: &Place) {
        let buf = place.field("buf");
        let octets = size.maximum.div_ceil(8);
        if size.is_fixed() {
            if octets > 0 {
                self.call(OerHelper::ReadBytes);
                out.line(format!("decoder_read_bytes(decoder_p, &{buf}[0], {octets});"));
            }
            return;
        }

        let length = self.variable("length");
        let unused = self.variable("unused");
        let bits = self.variable("bits");
        self.call(OerHelper::ReadLengthDeterminant);
        self.call(OerHelper::ReadUint);
        self.call(OerHelper::ReadBytes);
        out.line(format!("uint64_t {length} = decoder_read_length_determinant(decoder_p);"));
        out.blank();
        out.abort_if(
            &format!("({length} < 1u) || ({length} > {}u)", octets + 1),
            "decoder",
            "EBADLENGTH",
        );
        out.line(format!("uint64_t {unused} = decoder_read_uint(decoder_p, 1);"));
        out.blank();
        out.abort_if(&format!("{unused} > 7u"), "decoder", "EBADLENGTH");
        out.line(format!("uint64_t {bits} = 8 * ({length} - 1) - {unused};"));
        out.blank();
        out.abort_if(&length_out_of_range(&bits, size), "decoder", "EBADLENGTH");
        out.line(format!(
            "{} = ({}){bits};",
            place.field("number_of_bits"),
            size.length_type.name()
        ));
        out.line(format!("decoder_read_bytes(decoder_p, &{buf}[0], {length} - 1);"));
    }

    fn decode_sequence(&mut self, out: &mut Writer, members: &[MemberLayout], place: &Place) {
        let flagged: Vec<&MemberLayout> = members.iter().filter(|m| m.has_presence_flag()).collect();
        if !flagged.is_empty() {
            let presence = self.variable("presence");
            self.call(OerHelper::ReadBytes);
            out.line(format!("uint8_t {presence}[{}];", flagged.len().div_ceil(8)));
            out.blank();
            out.line(format!("decoder_read_bytes(decoder_p, &{presence}[0], sizeof({presence}));"));
            for (i, member) in flagged.iter().enumerate() {
                out.line(format!(
                    "{} = (({presence}[{}] & 0x{:02x}u) != 0);",
                    place.field(&presence_flag(&member.name)),
                    i / 8,
                    0x80u8 >> (i % 8)
                ));
            }
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
        let tag = self.variable("tag");
        self.call(OerHelper::ReadTag);
        out.line(format!("uint64_t {tag} = decoder_read_tag(decoder_p);"));
        out.blank();
        out.line(format!("switch ({tag}) {{"));
        out.blank();
        for alternative in &choice.alternatives {
            out.line(format!("case {}:", hex_literal(tag_value(alternative.tag))));
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
