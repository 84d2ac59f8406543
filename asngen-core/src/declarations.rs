//! C type declarations shared by both encoding rules.

use crate::layout::{ChoiceLayout, EnumeratedLayout, Layout, Symbol};
use crate::names::{choice_type, choice_value, enum_type, enum_value, field_name, presence_flag, symbol_name};
use crate::writer::Writer;

/// Header text for one top-level type: the enums it needs, then its struct.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    pub enums: String,
    pub structure: String,
}

pub fn declare(namespace: &str, symbol: &Symbol, layout: &Layout) -> Declaration {
    let mut declarer = Declarer {
        namespace,
        enums: Writer::new(),
    };

    let mut body = Writer::with_level(1);
    declarer.body(&mut body, layout);
    if body.is_empty() {
        body.line("uint8_t dummy;");
    }

    let mut structure = Writer::new();
    structure.line(format!("struct {}_t {{", symbol_name(namespace, symbol)));
    structure.raw(&body.finish());
    structure.line("};");

    Declaration {
        enums: declarer.enums.finish(),
        structure: structure.finish(),
    }
}

struct Declarer<'a> {
    namespace: &'a str,
    enums: Writer,
}

impl Declarer<'_> {
    /// Members of the struct holding `layout`. Scalars live in `value`.
    fn body(&mut self, out: &mut Writer, layout: &Layout) {
        match layout {
            Layout::Sequence(members) => {
                for member in members {
                    if member.has_presence_flag() {
                        out.line(format!("bool {};", presence_flag(&member.name)));
                    }
                    self.field(out, &field_name(&member.name), &member.layout, "");
                }
            }
            Layout::Choice(choice) => {
                self.choice_enum(choice);
                out.line(format!("enum {} choice;", choice_type(self.namespace, &choice.path)));

                let mut union = out.nested();
                for alternative in &choice.alternatives {
                    self.field(&mut union, &field_name(&alternative.name), &alternative.layout, "");
                }
                if !union.is_empty() {
                    out.line("union {");
                    out.raw(&union.finish());
                    out.line("} value;");
                }
            }
            Layout::SequenceOf { size, element } => {
                out.line(format!("{} length;", size.length_type.name()));
                if size.maximum > 0 {
                    self.field(out, "elements", element, &format!("[{}]", size.maximum));
                }
            }
            Layout::OctetString(size) => {
                if !size.is_fixed() {
                    out.line(format!("{} length;", size.length_type.name()));
                }
                if size.maximum > 0 {
                    out.line(format!("uint8_t buf[{}];", size.maximum));
                }
            }
            Layout::CharacterString { kind, size } => {
                if kind.needs_length(size) {
                    out.line(format!("{} length;", size.length_type.name()));
                }
                if size.maximum > 0 {
                    out.line(format!("uint8_t buf[{}];", size.maximum));
                }
            }
            Layout::BitString(size) => {
                if !size.is_fixed() {
                    out.line(format!("{} number_of_bits;", size.length_type.name()));
                }
                if size.maximum > 0 {
                    out.line(format!("uint8_t buf[{}];", size.maximum.div_ceil(8)));
                }
            }
            scalar => self.field(out, "value", scalar, ""),
        }
    }

    fn field(&mut self, out: &mut Writer, name: &str, layout: &Layout, suffix: &str) {
        match layout {
            Layout::Null => {}
            Layout::Boolean => out.line(format!("bool {name}{suffix};")),
            Layout::Integer(int) => out.line(format!("{} {name}{suffix};", int.c_type.name())),
            Layout::Real(format) => out.line(format!("{} {name}{suffix};", format.c_type())),
            Layout::Enumerated(enumerated) => {
                self.enumeration(enumerated);
                out.line(format!(
                    "enum {} {name}{suffix};",
                    enum_type(self.namespace, &enumerated.path)
                ));
            }
            Layout::Reference(symbol) => out.line(format!(
                "struct {}_t {name}{suffix};",
                symbol_name(self.namespace, symbol)
            )),
            aggregate => {
                let mut inner = out.nested();
                self.body(&mut inner, aggregate);
                if inner.is_empty() {
                    inner.line("uint8_t dummy;");
                }
                out.line("struct {");
                out.raw(&inner.finish());
                out.line(format!("}} {name}{suffix};"));
            }
        }
    }

    fn enumeration(&mut self, enumerated: &EnumeratedLayout) {
        let namespace = self.namespace;
        let items = enumerated
            .items
            .iter()
            .map(|(item, value)| format!("{} = {value}", enum_value(namespace, &enumerated.path, item)));
        self.enum_block(&enum_type(namespace, &enumerated.path), items);
    }

    fn choice_enum(&mut self, choice: &ChoiceLayout) {
        let namespace = self.namespace;
        let items = choice
            .alternatives
            .iter()
            .enumerate()
            .map(|(index, alternative)| {
                format!("{} = {index}", choice_value(namespace, &choice.path, &alternative.name))
            });
        self.enum_block(&choice_type(namespace, &choice.path), items);
    }

    fn enum_block(&mut self, name: &str, items: impl Iterator<Item = String>) {
        let items: Vec<String> = items.collect();
        self.enums.open(format!("enum {name} {{"));
        for (index, item) in items.iter().enumerate() {
            if index + 1 < items.len() {
                self.enums.line(format!("{item},"));
            } else {
                self.enums.line(item);
            }
        }
        self.enums.close("};");
        self.enums.blank();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{AlternativeLayout, CType, IntegerLayout, MemberLayout, Presence, SizeLayout};

    fn byte() -> Layout {
        Layout::Integer(IntegerLayout {
            minimum: 0,
            maximum: 255,
            c_type: CType::U8,
            span: 255,
            uper_bits: 8,
        })
    }

    #[test]
    fn wraps_scalars_in_value() {
        let decl = declare("foo", &Symbol::new("Foo", "A"), &byte());
        assert_eq!(decl.structure, "struct foo_foo_a_t {\n    uint8_t value;\n};\n");
        assert!(decl.enums.is_empty());
    }

    #[test]
    fn empty_bodies_get_a_dummy_field() {
        let decl = declare("foo", &Symbol::new("Foo", "N"), &Layout::Null);
        assert_eq!(decl.structure, "struct foo_foo_n_t {\n    uint8_t dummy;\n};\n");

        let decl = declare("foo", &Symbol::new("Foo", "S"), &Layout::Sequence(vec![]));
        assert!(decl.structure.contains("uint8_t dummy;"));
    }

    #[test]
    fn sequence_members_get_presence_flags() {
        let layout = Layout::Sequence(vec![
            MemberLayout {
                name: "a".into(),
                layout: byte(),
                presence: Presence::Required,
            },
            MemberLayout {
                name: "isReady".into(),
                layout: Layout::Boolean,
                presence: Presence::Optional,
            },
            MemberLayout {
                name: "n".into(),
                layout: Layout::Null,
                presence: Presence::Required,
            },
        ]);
        let decl = declare("foo", &Symbol::new("Foo", "S"), &layout);
        assert_eq!(
            decl.structure,
            "struct foo_foo_s_t {\n    uint8_t a;\n    bool is_is_ready_present;\n    bool is_ready;\n};\n"
        );
    }

    #[test]
    fn choices_declare_selector_enum_and_union() {
        let layout = Layout::Choice(ChoiceLayout {
            path: vec!["Foo".into(), "C".into()],
            alternatives: vec![
                AlternativeLayout {
                    name: "a".into(),
                    layout: Layout::Boolean,
                    tag: 0,
                },
                AlternativeLayout {
                    name: "b".into(),
                    layout: Layout::OctetString(SizeLayout {
                        minimum: 0,
                        maximum: 4,
                        length_type: CType::U8,
                        uper_bits: 3,
                    }),
                    tag: 1,
                },
            ],
            uper_bits: 1,
        });
        let decl = declare("foo", &Symbol::new("Foo", "C"), &layout);
        assert_eq!(
            decl.enums,
            "enum foo_foo_c_choice_e {\n    foo_foo_c_choice_a_e = 0,\n    foo_foo_c_choice_b_e = 1\n};\n\n"
        );
        assert_eq!(
            decl.structure,
            concat!(
                "struct foo_foo_c_t {\n",
                "    enum foo_foo_c_choice_e choice;\n",
                "    union {\n",
                "        bool a;\n",
                "        struct {\n",
                "            uint8_t length;\n",
                "            uint8_t buf[4];\n",
                "        } b;\n",
                "    } value;\n",
                "};\n"
            )
        );
    }

    #[test]
    fn nested_enumerations_are_named_by_path() {
        let layout = Layout::SequenceOf {
            size: SizeLayout {
                minimum: 1,
                maximum: 3,
                length_type: CType::U8,
                uper_bits: 2,
            },
            element: Box::new(Layout::Enumerated(EnumeratedLayout {
                path: vec!["Foo".into(), "L".into()],
                items: vec![("red".into(), 0), ("blue".into(), 7)],
                uper_bits: 1,
            })),
        };
        let decl = declare("foo", &Symbol::new("Foo", "L"), &layout);
        assert_eq!(
            decl.enums,
            "enum foo_foo_l_e {\n    foo_foo_l_red_e = 0,\n    foo_foo_l_blue_e = 7\n};\n\n"
        );
        assert!(decl.structure.contains("    enum foo_foo_l_e elements[3];\n"));
    }

    #[test]
    fn fixed_bit_strings_need_no_bit_count() {
        let layout = Layout::BitString(SizeLayout {
            minimum: 12,
            maximum: 12,
            length_type: CType::U8,
            uper_bits: 0,
        });
        let decl = declare("foo", &Symbol::new("Foo", "B"), &layout);
        assert_eq!(decl.structure, "struct foo_foo_b_t {\n    uint8_t buf[2];\n};\n");
    }
}
