//! Constraint resolution: from a compiled [`Type`] to a [`Layout`].
//!
//! Every node is checked against the support matrix first and then against
//! its own constraints. The first failure, in depth-first member order,
//! ends the walk; nothing is collected past it.

use std::collections::BTreeSet;

use tracing::{debug, trace};

use crate::assembler::ResolvedType;
use crate::error::{GenerateError, Reason};
use crate::layout::{
    AlternativeLayout, CType, ChoiceLayout, DefaultValue, EnumeratedLayout, IntegerLayout, Layout,
    MemberLayout, Presence, RealFormat, SizeLayout, StringKind, Symbol, bits_for,
};
use crate::location::Location;
use crate::names::{c_name, field_name, presence_flag};
use crate::support::{EncodingRule, Support, support};
use crate::types::{Bound, Bounds, EnumItem, Member, RealEncoding, Specification, Type, TypeKind, Value};

/// Resolve every type assignment, in module then declaration order. Each
/// assignment is fully checked, by-value recursion included, before the
/// next one starts.
pub fn resolve_specification(
    spec: &Specification,
    rule: EncodingRule,
) -> Result<Vec<ResolvedType>, GenerateError> {
    let mut resolved = Vec::new();
    let mut c_names = BTreeSet::new();
    for module in &spec.modules {
        for assignment in &module.types {
            let mut location = Location::new(&module.name, &assignment.name);
            if !c_names.insert(c_name("", &[&module.name, &assignment.name])) {
                return Err(location.error(Reason::NameClash(assignment.name.clone())));
            }

            let symbol = Symbol::new(&module.name, &assignment.name);
            let layout = resolve_type(spec, rule, &mut location, &assignment.ty)?;
            check_recursion(spec, &symbol, &assignment.ty)?;
            debug!(module = %module.name, name = %assignment.name, %rule, "resolved type");
            resolved.push(ResolvedType { symbol, layout });
        }
    }
    Ok(resolved)
}

/// Fails when `symbol` embeds itself by value through any chain of
/// references.
fn check_recursion(spec: &Specification, symbol: &Symbol, ty: &Type) -> Result<(), GenerateError> {
    let mut pending = Vec::new();
    embedded(ty, &symbol.module, &mut pending);
    let mut seen = BTreeSet::new();
    while let Some(next) = pending.pop() {
        if next == *symbol {
            let location = Location::new(&symbol.module, &symbol.name);
            return Err(location.error(Reason::RecursiveType(symbol.name.clone())));
        }
        if let Some(assignment) = spec.find(&next.module, &next.name) {
            if seen.insert(next.clone()) {
                embedded(&assignment.ty, &next.module, &mut pending);
            }
        }
    }
    Ok(())
}

/// Top-level types `ty` embeds by value. Unqualified references are taken
/// relative to `module`.
fn embedded(ty: &Type, module: &str, out: &mut Vec<Symbol>) {
    match ty {
        Type::Reference { module: target, name } => {
            out.push(Symbol::new(target.as_deref().unwrap_or(module), name));
        }
        Type::Sequence { members } | Type::Set { members } | Type::Choice { members } => {
            for member in members {
                embedded(&member.ty, module, out);
            }
        }
        Type::SequenceOf { element, .. } | Type::SetOf { element, .. } => embedded(element, module, out),
        _ => {}
    }
}

/// Resolve a top-level type assignment for `rule`.
pub fn resolve_type(
    spec: &Specification,
    rule: EncodingRule,
    location: &mut Location,
    ty: &Type,
) -> Result<Layout, GenerateError> {
    let resolver = Resolver { spec, rule };
    resolver.resolve(location, ty)
}

struct Resolver<'a> {
    spec: &'a Specification,
    rule: EncodingRule,
}

impl Resolver<'_> {
    fn resolve(&self, location: &mut Location, ty: &Type) -> Result<Layout, GenerateError> {
        let kind = ty.kind();
        if support(kind, self.rule) == Support::Rejected {
            return Err(location.error(Reason::UnsupportedType(kind.keyword())));
        }

        match ty {
            Type::Boolean => Ok(Layout::Boolean),
            Type::Null => Ok(Layout::Null),
            Type::Integer { value } => {
                let layout = resolve_integer(location, value.as_ref())?;
                trace!(
                    location = %location.path(),
                    c_type = layout.c_type.name(),
                    uper_bits = layout.uper_bits,
                    "resolved INTEGER"
                );
                Ok(Layout::Integer(layout))
            }
            Type::Real { encoding } => match encoding {
                RealEncoding::Binary32 => Ok(Layout::Real(RealFormat::Binary32)),
                RealEncoding::Binary64 => Ok(Layout::Real(RealFormat::Binary64)),
                RealEncoding::Other => Err(location.error(Reason::RealNotIeee754)),
            },
            Type::Enumerated { items } => resolve_enumerated(location, items),
            Type::OctetString { size } => {
                Ok(Layout::OctetString(resolve_size(location, kind, size.as_ref())?))
            }
            Type::BitString { size } => {
                Ok(Layout::BitString(resolve_size(location, kind, size.as_ref())?))
            }
            Type::IA5String { size } => self.character_string(location, kind, StringKind::IA5, size.as_ref()),
            Type::VisibleString { size } => {
                self.character_string(location, kind, StringKind::Visible, size.as_ref())
            }
            Type::UTF8String { size } => self.character_string(location, kind, StringKind::UTF8, size.as_ref()),
            Type::Sequence { members } | Type::Set { members } => {
                let mut fields = BTreeSet::new();
                let mut resolved = Vec::with_capacity(members.len());
                for member in members {
                    resolved.push(location.within(&member.name, |loc| {
                        claim_field_names(loc, &mut fields, member)?;
                        self.member(loc, member)
                    })?);
                }
                Ok(Layout::Sequence(resolved))
            }
            Type::Choice { members } => {
                if members.is_empty() {
                    return Err(location.error(Reason::NoMembers(kind.keyword())));
                }
                let mut fields = BTreeSet::new();
                let mut alternatives = Vec::with_capacity(members.len());
                for (index, member) in members.iter().enumerate() {
                    let layout = location.within(&member.name, |loc| {
                        claim_field_names(loc, &mut fields, member)?;
                        self.resolve(loc, &member.ty)
                    })?;
                    alternatives.push(AlternativeLayout {
                        name: member.name.clone(),
                        layout,
                        tag: member.tag.unwrap_or(index as u32),
                    });
                }
                Ok(Layout::Choice(ChoiceLayout {
                    path: location.segments().to_vec(),
                    uper_bits: bits_for(alternatives.len() as u64 - 1),
                    alternatives,
                }))
            }
            Type::SequenceOf { size, element } | Type::SetOf { size, element } => {
                let size = resolve_size(location, kind, size.as_ref())?;
                // The element is unnamed and reports under its declaring segment.
                let element = self.resolve(location, element)?;
                Ok(Layout::SequenceOf {
                    size,
                    element: Box::new(element),
                })
            }
            Type::Reference { module, name } => {
                let module = module.as_deref().unwrap_or(location.module());
                if self.spec.find(module, name).is_none() {
                    return Err(location.error(Reason::UndefinedType(name.clone())));
                }
                Ok(Layout::Reference(Symbol::new(module, name)))
            }
            Type::NumericString { .. }
            | Type::PrintableString { .. }
            | Type::BMPString { .. }
            | Type::UniversalString { .. }
            | Type::TeletexString { .. }
            | Type::GeneralString { .. }
            | Type::GraphicString { .. }
            | Type::ObjectIdentifier
            | Type::RelativeOid
            | Type::UTCTime
            | Type::GeneralizedTime
            | Type::Date
            | Type::TimeOfDay
            | Type::DateTime
            | Type::Any
            | Type::External => Err(location.error(Reason::UnsupportedType(kind.keyword()))),
        }
    }

    fn character_string(
        &self,
        location: &Location,
        kind: TypeKind,
        string: StringKind,
        size: Option<&Bounds>,
    ) -> Result<Layout, GenerateError> {
        Ok(Layout::CharacterString {
            kind: string,
            size: resolve_size(location, kind, size)?,
        })
    }

    fn member(&self, location: &mut Location, member: &Member) -> Result<MemberLayout, GenerateError> {
        let layout = self.resolve(location, &member.ty)?;
        let presence = match &member.default {
            Some(value) => Presence::Default(self.default_value(location, &layout, value)?),
            None if member.optional => Presence::Optional,
            None => Presence::Required,
        };
        Ok(MemberLayout {
            name: member.name.clone(),
            layout,
            presence,
        })
    }

    /// Check a DEFAULT against the scalar the member type denotes,
    /// following references to other assignments.
    fn default_value(&self, location: &Location, layout: &Layout, value: &Value) -> Result<DefaultValue, GenerateError> {
        let mut scalar = layout.clone();
        let mut via = Vec::new();
        while let Layout::Reference(symbol) = &scalar {
            let mut target = Location::new(&symbol.module, &symbol.name);
            if via.contains(symbol) {
                return Err(target.error(Reason::RecursiveType(symbol.name.clone())));
            }
            let assignment = self
                .spec
                .find(&symbol.module, &symbol.name)
                .ok_or_else(|| location.error(Reason::UndefinedType(symbol.name.clone())))?;
            let next = self.resolve(&mut target, &assignment.ty)?;
            via.push(symbol.clone());
            scalar = next;
        }
        check_default(location, &scalar, value)?;
        Ok(DefaultValue {
            value: value.clone(),
            scalar,
            via,
        })
    }
}

/// Reserve the C field names `member` occupies in its enclosing struct:
/// its own and, when it has one, its presence flag.
fn claim_field_names(
    location: &Location,
    taken: &mut BTreeSet<String>,
    member: &Member,
) -> Result<(), GenerateError> {
    let mut names = vec![field_name(&member.name)];
    if member.optional || member.default.is_some() {
        names.push(presence_flag(&member.name));
    }
    for name in names {
        if !taken.insert(name) {
            return Err(location.error(Reason::NameClash(member.name.clone())));
        }
    }
    Ok(())
}

fn resolve_integer(location: &Location, value: Option<&Bounds>) -> Result<IntegerLayout, GenerateError> {
    let bounds = value.ok_or_else(|| location.error(Reason::MissingLowerBound))?;
    let minimum = bounds
        .lower
        .value()
        .ok_or_else(|| location.error(Reason::MissingLowerBound))?;
    let maximum = bounds
        .upper
        .value()
        .ok_or_else(|| location.error(Reason::MissingUpperBound))?;

    if maximum < minimum {
        return Err(location.error(Reason::EmptyRange(TypeKind::Integer.keyword())));
    }

    let span = maximum
        .checked_sub(minimum)
        .and_then(|span| u64::try_from(span).ok())
        .ok_or_else(|| location.error(Reason::IntegerTooWide))?;
    let c_type =
        CType::for_range(minimum, maximum).ok_or_else(|| location.error(Reason::IntegerTooWide))?;

    Ok(IntegerLayout {
        minimum,
        maximum,
        c_type,
        span,
        uper_bits: bits_for(span),
    })
}

/// Resolve a `SIZE` constraint. Only the maximum gates generation; a
/// missing or unbounded minimum counts as zero.
fn resolve_size(
    location: &Location,
    kind: TypeKind,
    size: Option<&Bounds>,
) -> Result<SizeLayout, GenerateError> {
    let missing = || location.error(Reason::MissingMaximumLength(kind.keyword()));
    let bounds = size.ok_or_else(missing)?;
    let maximum = match bounds.upper {
        Bound::Value(v) => v,
        Bound::Min | Bound::Max => return Err(missing()),
    };
    let minimum = match bounds.lower {
        Bound::Value(v) => v.max(0),
        Bound::Min | Bound::Max => 0,
    };

    if maximum < minimum {
        return Err(location.error(Reason::EmptyRange(kind.keyword())));
    }

    let maximum = u64::try_from(maximum).map_err(|_| location.error(Reason::IntegerTooWide))?;
    let minimum = minimum as u64;
    let length_type = CType::for_range(0, maximum.into())
        .ok_or_else(|| location.error(Reason::IntegerTooWide))?;

    Ok(SizeLayout {
        minimum,
        maximum,
        length_type,
        uper_bits: bits_for(maximum - minimum),
    })
}

fn resolve_enumerated(location: &Location, items: &[EnumItem]) -> Result<Layout, GenerateError> {
    if items.is_empty() {
        return Err(location.error(Reason::NoMembers(TypeKind::Enumerated.keyword())));
    }
    let mut names = BTreeSet::new();
    for item in items {
        if i32::try_from(item.value).is_err() {
            return Err(location.error(Reason::EnumerationValueTooWide(item.name.clone())));
        }
        if !names.insert(field_name(&item.name)) {
            return Err(location.error(Reason::NameClash(item.name.clone())));
        }
    }
    Ok(Layout::Enumerated(EnumeratedLayout {
        path: location.segments().to_vec(),
        items: items.iter().map(|i| (i.name.clone(), i.value)).collect(),
        uper_bits: bits_for(items.len() as u64 - 1),
    }))
}

/// A DEFAULT must be a plain value of the member's own type.
fn check_default(location: &Location, layout: &Layout, value: &Value) -> Result<(), GenerateError> {
    let valid = match (layout, value) {
        (Layout::Boolean, Value::Boolean(_)) => true,
        (Layout::Integer(int), Value::Integer(v)) => int.minimum <= *v && *v <= int.maximum,
        (Layout::Real(_), Value::Real(_) | Value::Integer(_)) => true,
        (Layout::Enumerated(e), Value::Identifier(name)) => e.items.iter().any(|(n, _)| n == name),
        _ => false,
    };
    if valid {
        Ok(())
    } else {
        Err(location.error(Reason::InvalidDefault))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolve(rule: EncodingRule, ty: &Type) -> Result<Layout, GenerateError> {
        let spec = Specification::default();
        let mut location = Location::new("Foo", "A");
        resolve_type(&spec, rule, &mut location, ty)
    }

    fn reason(rule: EncodingRule, ty: &Type) -> Reason {
        resolve(rule, ty).unwrap_err().reason
    }

    #[test]
    fn integer_needs_minimum_before_maximum() {
        let rule = EncodingRule::Oer;
        assert_eq!(reason(rule, &Type::Integer { value: None }), Reason::MissingLowerBound);
        assert_eq!(
            reason(rule, &Type::integer(Bound::Min, Bound::Max)),
            Reason::MissingLowerBound
        );
        assert_eq!(
            reason(rule, &Type::integer(Bound::Value(1), Bound::Max)),
            Reason::MissingUpperBound
        );
    }

    #[test]
    fn integer_span_must_fit_64_bits() {
        let too_wide = Type::integer(Bound::Value(0), Bound::Value(18446744073709551616));
        assert_eq!(reason(EncodingRule::Uper, &too_wide), Reason::IntegerTooWide);

        // Offset fits, but no single C type holds both ends.
        let mixed = Type::integer(Bound::Value(-1), Bound::Value(i128::from(i64::MAX) + 1));
        assert_eq!(reason(EncodingRule::Oer, &mixed), Reason::IntegerTooWide);

        let full = Type::integer(Bound::Value(i64::MIN.into()), Bound::Value(i64::MAX.into()));
        let Layout::Integer(int) = resolve(EncodingRule::Uper, &full).unwrap() else {
            panic!("unexpected layout");
        };
        assert_eq!(int.c_type, CType::I64);
        assert_eq!(int.uper_bits, 64);
    }

    #[test]
    fn derives_widths_for_byte_range() {
        let ty = Type::integer(Bound::Value(0), Bound::Value(255));
        let Layout::Integer(int) = resolve(EncodingRule::Uper, &ty).unwrap() else {
            panic!("unexpected layout");
        };
        assert_eq!(int.c_type, CType::U8);
        assert_eq!(int.uper_bits, 8);
        assert_eq!(int.oer_octets(), 1);
    }

    #[test]
    fn single_value_range_needs_no_bits() {
        let ty = Type::integer(Bound::Value(7), Bound::Value(7));
        let Layout::Integer(int) = resolve(EncodingRule::Uper, &ty).unwrap() else {
            panic!("unexpected layout");
        };
        assert_eq!(int.uper_bits, 0);
    }

    #[test]
    fn rejects_inverted_range() {
        let ty = Type::integer(Bound::Value(10), Bound::Value(1));
        assert_eq!(reason(EncodingRule::Oer, &ty), Reason::EmptyRange("INTEGER"));
    }

    #[test]
    fn sizes_need_a_concrete_maximum() {
        let missing = Type::OctetString { size: None };
        assert_eq!(
            reason(EncodingRule::Oer, &missing),
            Reason::MissingMaximumLength("OCTET STRING")
        );

        let open = Type::SequenceOf {
            size: Some(Bounds::new(Bound::Value(1), Bound::Max)),
            element: Box::new(Type::Boolean),
        };
        assert_eq!(
            reason(EncodingRule::Uper, &open),
            Reason::MissingMaximumLength("SEQUENCE OF")
        );
    }

    #[test]
    fn missing_maximum_length_names_the_keyword() {
        let unbounded = || Some(Bounds::new(Bound::Value(0), Bound::Max));
        let cases = [
            (Type::BitString { size: unbounded() }, "BIT STRING"),
            (Type::IA5String { size: None }, "IA5String"),
            (
                Type::SetOf {
                    size: unbounded(),
                    element: Box::new(Type::Boolean),
                },
                "SET OF",
            ),
        ];
        for (ty, keyword) in cases {
            let err = resolve(EncodingRule::Uper, &ty).unwrap_err();
            assert_eq!(err.to_string(), format!("Foo.A: {keyword} has no maximum length."));
        }
    }

    #[test]
    fn size_minimum_defaults_to_zero() {
        let ty = Type::BitString {
            size: Some(Bounds::new(Bound::Min, Bound::Value(12))),
        };
        let Layout::BitString(size) = resolve(EncodingRule::Uper, &ty).unwrap() else {
            panic!("unexpected layout");
        };
        assert_eq!(size.minimum, 0);
        assert_eq!(size.maximum, 12);
        assert_eq!(size.uper_bits, 4);
        assert!(!size.is_fixed());
    }

    #[test]
    fn real_must_be_ieee754_for_oer_and_is_rejected_for_uper() {
        let ty = Type::Real {
            encoding: RealEncoding::Other,
        };
        assert_eq!(reason(EncodingRule::Oer, &ty), Reason::RealNotIeee754);

        let binary32 = Type::Real {
            encoding: RealEncoding::Binary32,
        };
        assert_eq!(
            resolve(EncodingRule::Oer, &binary32).unwrap(),
            Layout::Real(RealFormat::Binary32)
        );
        assert_eq!(reason(EncodingRule::Uper, &binary32), Reason::UnsupportedType("REAL"));
    }

    #[test]
    fn unsupported_check_precedes_constraints() {
        let ty = Type::NumericString { size: None };
        assert_eq!(reason(EncodingRule::Oer, &ty), Reason::UnsupportedType("NumericString"));
    }

    #[test]
    fn reports_first_failing_member_path() {
        let ty = Type::Sequence {
            members: vec![
                Member {
                    name: "a".into(),
                    ty: Type::Choice {
                        members: vec![Member {
                            name: "b".into(),
                            ty: Type::Integer { value: None },
                            optional: false,
                            default: None,
                            tag: None,
                        }],
                    },
                    optional: false,
                    default: None,
                    tag: None,
                },
                Member {
                    name: "c".into(),
                    ty: Type::ObjectIdentifier,
                    optional: false,
                    default: None,
                    tag: None,
                },
            ],
        };
        let err = resolve(EncodingRule::Uper, &ty).unwrap_err();
        assert_eq!(err.to_string(), "Foo.A.a.b: INTEGER has no minimum value.");
    }

    #[test]
    fn sequence_of_element_reports_under_declaring_segment() {
        let ty = Type::SequenceOf {
            size: Some(Bounds::new(Bound::Value(0), Bound::Value(4))),
            element: Box::new(Type::UTCTime),
        };
        let err = resolve(EncodingRule::Oer, &ty).unwrap_err();
        assert_eq!(err.to_string(), "Foo.A: Unsupported type 'UTCTime'.");
    }

    #[test]
    fn checks_default_values_against_member_type() {
        let member = |default| Type::Sequence {
            members: vec![Member {
                name: "x".into(),
                ty: Type::integer(Bound::Value(0), Bound::Value(10)),
                optional: false,
                default: Some(default),
                tag: None,
            }],
        };
        assert!(resolve(EncodingRule::Oer, &member(Value::Integer(3))).is_ok());
        assert_eq!(
            reason(EncodingRule::Oer, &member(Value::Integer(11))),
            Reason::InvalidDefault
        );
        assert_eq!(
            reason(EncodingRule::Oer, &member(Value::Boolean(true))),
            Reason::InvalidDefault
        );
    }

    #[test]
    fn references_must_resolve() {
        let ty = Type::Reference {
            module: None,
            name: "Missing".into(),
        };
        assert_eq!(
            reason(EncodingRule::Oer, &ty),
            Reason::UndefinedType("Missing".into())
        );
    }

    #[test]
    fn resolves_qualified_references_across_modules() {
        let spec = crate::loader::parse_specification(
            r#"{"modules": [
                {"name": "Bar", "types": [{"name": "B", "type": {"kind": "BOOLEAN"}}]},
                {"name": "Foo", "types": [{"name": "A", "type": {"kind": "Reference", "module": "Bar", "name": "B"}}]}
            ]}"#,
        )
        .unwrap();
        let resolved = resolve_specification(&spec, EncodingRule::Uper).unwrap();
        let symbols: Vec<_> = resolved.iter().map(|r| r.symbol.clone()).collect();
        assert_eq!(symbols, vec![Symbol::new("Bar", "B"), Symbol::new("Foo", "A")]);
        assert_eq!(resolved[1].layout, Layout::Reference(Symbol::new("Bar", "B")));
    }

    fn spec(text: &str) -> Specification {
        crate::loader::parse_specification(text).unwrap()
    }

    #[test]
    fn member_names_may_not_shadow_presence_flags() {
        let ty = Type::Sequence {
            members: vec![
                Member {
                    name: "x".into(),
                    ty: Type::Boolean,
                    optional: true,
                    default: None,
                    tag: None,
                },
                Member {
                    name: "isXPresent".into(),
                    ty: Type::Boolean,
                    optional: false,
                    default: None,
                    tag: None,
                },
            ],
        };
        let err = resolve(EncodingRule::Oer, &ty).unwrap_err();
        assert_eq!(err.location, "Foo.A.isXPresent");
        assert_eq!(err.reason, Reason::NameClash("isXPresent".into()));
    }

    #[test]
    fn enumeration_items_need_distinct_c_names() {
        let ty = Type::Enumerated {
            items: vec![
                EnumItem {
                    name: "darkRed".into(),
                    value: 0,
                },
                EnumItem {
                    name: "dark-red".into(),
                    value: 1,
                },
            ],
        };
        assert_eq!(
            reason(EncodingRule::Uper, &ty),
            Reason::NameClash("dark-red".into())
        );
    }

    #[test]
    fn top_level_names_need_distinct_c_names() {
        let spec = spec(
            r#"{"modules": [{"name": "Foo", "types": [
                {"name": "FooBar", "type": {"kind": "BOOLEAN"}},
                {"name": "foo_bar", "type": {"kind": "BOOLEAN"}}
            ]}]}"#,
        );
        let err = resolve_specification(&spec, EncodingRule::Oer).unwrap_err();
        assert_eq!(err.to_string(), "Foo.foo_bar: Name 'foo_bar' clashes with another C identifier.");
    }

    #[test]
    fn referenced_defaults_follow_reference_chains() {
        let spec = spec(
            r#"{"modules": [{"name": "Foo", "types": [
                {"name": "Paint", "type": {"kind": "Reference", "name": "Color"}},
                {"name": "Color", "type": {"kind": "ENUMERATED", "items": [
                    {"name": "red", "value": 0}, {"name": "blue", "value": 1}
                ]}},
                {"name": "S", "type": {"kind": "SEQUENCE", "members": [
                    {"name": "p", "type": {"kind": "Reference", "name": "Paint"}, "default": "blue"}
                ]}}
            ]}]}"#,
        );
        let resolved = resolve_specification(&spec, EncodingRule::Oer).unwrap();
        let Layout::Sequence(members) = &resolved[2].layout else {
            panic!("unexpected layout");
        };
        let Presence::Default(default) = &members[0].presence else {
            panic!("expected a DEFAULT");
        };
        assert_eq!(default.value, Value::Identifier("blue".into()));
        assert_eq!(default.via, vec![Symbol::new("Foo", "Paint"), Symbol::new("Foo", "Color")]);
        assert!(matches!(default.scalar, Layout::Enumerated(_)));
    }

    #[test]
    fn referenced_defaults_are_checked_against_the_target() {
        let spec = spec(
            r#"{"modules": [{"name": "Foo", "types": [
                {"name": "I", "type": {"kind": "INTEGER", "value": {"lower": 0, "upper": 10}}},
                {"name": "T", "type": {"kind": "SEQUENCE", "members": []}},
                {"name": "S", "type": {"kind": "SEQUENCE", "members": [
                    {"name": "i", "type": {"kind": "Reference", "name": "I"}, "default": 11}
                ]}},
                {"name": "U", "type": {"kind": "SEQUENCE", "members": [
                    {"name": "t", "type": {"kind": "Reference", "name": "T"}, "default": 1}
                ]}}
            ]}]}"#,
        );
        let err = resolve_specification(&spec, EncodingRule::Uper).unwrap_err();
        assert_eq!(err.to_string(), "Foo.S.i: Invalid DEFAULT value.");

        let mut without_s = spec.clone();
        without_s.modules[0].types.remove(2);
        let err = resolve_specification(&without_s, EncodingRule::Uper).unwrap_err();
        assert_eq!(err.to_string(), "Foo.U.t: Invalid DEFAULT value.");
    }

    #[test]
    fn only_cycles_through_the_type_itself_are_reported_at_it() {
        let spec = spec(
            r#"{"modules": [{"name": "Foo", "types": [
                {"name": "A", "type": {"kind": "SEQUENCE", "members": [
                    {"name": "b", "type": {"kind": "Reference", "name": "B"}}
                ]}},
                {"name": "B", "type": {"kind": "SEQUENCE OF", "size": {"upper": 2},
                    "element": {"kind": "Reference", "name": "B"}}}
            ]}]}"#,
        );
        let err = resolve_specification(&spec, EncodingRule::Oer).unwrap_err();
        assert_eq!(err.to_string(), "Foo.B: Recursive type 'B' is not supported.");
    }

    #[test]
    fn choice_tags_default_to_alternative_index() {
        let alternative = |name: &str, tag| Member {
            name: name.into(),
            ty: Type::Null,
            optional: false,
            default: None,
            tag,
        };
        let ty = Type::Choice {
            members: vec![alternative("a", None), alternative("b", Some(9)), alternative("c", None)],
        };
        let Layout::Choice(choice) = resolve(EncodingRule::Oer, &ty).unwrap() else {
            panic!("unexpected layout");
        };
        let tags: Vec<_> = choice.alternatives.iter().map(|a| a.tag).collect();
        assert_eq!(tags, vec![0, 9, 2]);
        assert_eq!(choice.uper_bits, 2);
        assert_eq!(choice.path, vec!["Foo".to_string(), "A".to_string()]);
    }
}
