//! Resolved layouts: the derived form the emitters consume.
//!
//! A [`Layout`] is what the constraint resolver produces from a
//! [`crate::types::Type`] once every bound is concrete. Widths and storage
//! types are computed once, here, and read as-is by both emitters.

use crate::types::Value;

/// C integer storage type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CType {
    U8,
    U16,
    U32,
    U64,
    I8,
    I16,
    I32,
    I64,
}

impl CType {
    pub fn name(self) -> &'static str {
        match self {
            CType::U8 => "uint8_t",
            CType::U16 => "uint16_t",
            CType::U32 => "uint32_t",
            CType::U64 => "uint64_t",
            CType::I8 => "int8_t",
            CType::I16 => "int16_t",
            CType::I32 => "int32_t",
            CType::I64 => "int64_t",
        }
    }

    pub fn octets(self) -> u32 {
        match self {
            CType::U8 | CType::I8 => 1,
            CType::U16 | CType::I16 => 2,
            CType::U32 | CType::I32 => 4,
            CType::U64 | CType::I64 => 8,
        }
    }

    pub fn is_signed(self) -> bool {
        matches!(self, CType::I8 | CType::I16 | CType::I32 | CType::I64)
    }

    pub fn min_value(self) -> i128 {
        match self {
            CType::U8 | CType::U16 | CType::U32 | CType::U64 => 0,
            CType::I8 => i8::MIN.into(),
            CType::I16 => i16::MIN.into(),
            CType::I32 => i32::MIN.into(),
            CType::I64 => i64::MIN.into(),
        }
    }

    pub fn max_value(self) -> i128 {
        match self {
            CType::U8 => u8::MAX.into(),
            CType::U16 => u16::MAX.into(),
            CType::U32 => u32::MAX.into(),
            CType::U64 => u64::MAX.into(),
            CType::I8 => i8::MAX.into(),
            CType::I16 => i16::MAX.into(),
            CType::I32 => i32::MAX.into(),
            CType::I64 => i64::MAX.into(),
        }
    }

    /// Smallest type holding every value in `minimum..=maximum`: unsigned
    /// when `minimum` is non-negative, two's complement otherwise.
    pub fn for_range(minimum: i128, maximum: i128) -> Option<CType> {
        let candidates: &[CType] = if minimum >= 0 {
            &[CType::U8, CType::U16, CType::U32, CType::U64]
        } else {
            &[CType::I8, CType::I16, CType::I32, CType::I64]
        };
        candidates
            .iter()
            .copied()
            .find(|t| t.min_value() <= minimum && maximum <= t.max_value())
    }
}

/// Number of bits needed to write any value in `0..=value`.
pub fn bits_for(value: u64) -> u32 {
    u64::BITS - value.leading_zeros()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntegerLayout {
    pub minimum: i128,
    pub maximum: i128,
    pub c_type: CType,
    /// `maximum - minimum`.
    pub span: u64,
    /// UPER field width; zero when the range holds a single value.
    pub uper_bits: u32,
}

impl IntegerLayout {
    /// OER fixed width, which is always the storage width.
    pub fn oer_octets(&self) -> u32 {
        self.c_type.octets()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RealFormat {
    Binary32,
    Binary64,
}

impl RealFormat {
    pub fn c_type(self) -> &'static str {
        match self {
            RealFormat::Binary32 => "float",
            RealFormat::Binary64 => "double",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumeratedLayout {
    /// Location path of the type, used for C names.
    pub path: Vec<String>,
    /// Items in declaration order.
    pub items: Vec<(String, i64)>,
    /// UPER index width over `items.len()` values.
    pub uper_bits: u32,
}

impl EnumeratedLayout {
    /// Items in ascending value order; the UPER index is the position here.
    pub fn sorted(&self) -> Vec<(&str, i64)> {
        let mut sorted: Vec<_> = self.items.iter().map(|(n, v)| (n.as_str(), *v)).collect();
        sorted.sort_by_key(|(_, v)| *v);
        sorted
    }
}

/// Resolved `SIZE (minimum..maximum)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizeLayout {
    pub minimum: u64,
    pub maximum: u64,
    /// Storage type of the length field.
    pub length_type: CType,
    /// UPER width of `length - minimum`; zero for fixed sizes.
    pub uper_bits: u32,
}

impl SizeLayout {
    pub fn is_fixed(&self) -> bool {
        self.minimum == self.maximum
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StringKind {
    IA5,
    Visible,
    UTF8,
}

impl StringKind {
    /// Known-multiplier strings with a fixed size need no length.
    pub fn is_known_multiplier(self) -> bool {
        matches!(self, StringKind::IA5 | StringKind::Visible)
    }

    /// Whether values carry an explicit length, in C and on the wire.
    pub fn needs_length(self, size: &SizeLayout) -> bool {
        !(size.is_fixed() && self.is_known_multiplier())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Presence {
    Required,
    Optional,
    Default(DefaultValue),
}

/// A DEFAULT value and the scalar type it was checked against.
#[derive(Debug, Clone, PartialEq)]
pub struct DefaultValue {
    pub value: Value,
    pub scalar: Layout,
    /// Top-level types followed from the member to reach `scalar`,
    /// outermost first. Empty when the member type is the scalar itself.
    pub via: Vec<Symbol>,
}

impl DefaultValue {
    pub fn inline(value: Value, scalar: Layout) -> Self {
        DefaultValue {
            value,
            scalar,
            via: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MemberLayout {
    pub name: String,
    pub layout: Layout,
    pub presence: Presence,
}

impl MemberLayout {
    pub fn has_presence_flag(&self) -> bool {
        !matches!(self.presence, Presence::Required)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AlternativeLayout {
    pub name: String,
    pub layout: Layout,
    /// Context-specific tag number.
    pub tag: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChoiceLayout {
    pub path: Vec<String>,
    pub alternatives: Vec<AlternativeLayout>,
    pub uper_bits: u32,
}

/// Identifies a top-level type assignment.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Symbol {
    pub module: String,
    pub name: String,
}

impl Symbol {
    pub fn new(module: &str, name: &str) -> Self {
        Symbol {
            module: module.to_string(),
            name: name.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Layout {
    Boolean,
    Null,
    Integer(IntegerLayout),
    Real(RealFormat),
    Enumerated(EnumeratedLayout),
    OctetString(SizeLayout),
    BitString(SizeLayout),
    CharacterString { kind: StringKind, size: SizeLayout },
    /// SEQUENCE and SET; SET members keep declaration order, which is tag
    /// order under automatic tagging.
    Sequence(Vec<MemberLayout>),
    Choice(ChoiceLayout),
    /// SEQUENCE OF and SET OF.
    SequenceOf {
        size: SizeLayout,
        element: Box<Layout>,
    },
    Reference(Symbol),
}

impl Layout {
    /// Whether the C representation is a struct body of its own rather
    /// than a single scalar field.
    pub fn is_aggregate(&self) -> bool {
        matches!(
            self,
            Layout::Sequence(_)
                | Layout::Choice(_)
                | Layout::SequenceOf { .. }
                | Layout::OctetString(_)
                | Layout::BitString(_)
                | Layout::CharacterString { .. }
        )
    }

    /// Top-level types this layout embeds by value.
    pub fn dependencies(&self) -> Vec<&Symbol> {
        let mut out = Vec::new();
        self.collect_dependencies(&mut out);
        out
    }

    fn collect_dependencies<'a>(&'a self, out: &mut Vec<&'a Symbol>) {
        match self {
            Layout::Reference(symbol) => {
                if !out.contains(&symbol) {
                    out.push(symbol);
                }
            }
            Layout::Sequence(members) => {
                for member in members {
                    member.layout.collect_dependencies(out);
                }
            }
            Layout::Choice(choice) => {
                for alternative in &choice.alternatives {
                    alternative.layout.collect_dependencies(out);
                }
            }
            Layout::SequenceOf { element, .. } => element.collect_dependencies(out),
            Layout::Boolean
            | Layout::Null
            | Layout::Integer(_)
            | Layout::Real(_)
            | Layout::Enumerated(_)
            | Layout::OctetString(_)
            | Layout::BitString(_)
            | Layout::CharacterString { .. } => {}
        }
    }
}
