//! Compiled ASN.1 type model.
//!
//! This is the shape the external resolver hands to the generator: modules
//! of ordered type assignments whose types are already resolved and
//! tagged. The model is a closed enum so that the support matrix and both
//! emitters are exhaustive matches over it. The generator only reads it;
//! everything it derives lives in [`crate::layout`].

use std::fmt;

use serde::Deserialize;
use serde::de::{self, Deserializer, Visitor};

/// A whole compiled specification: every module the resolver produced.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct Specification {
    pub modules: Vec<Module>,
}

impl Specification {
    /// Find a top-level assignment by module and type name.
    pub fn find(&self, module: &str, name: &str) -> Option<&TypeAssignment> {
        self.modules
            .iter()
            .filter(|m| m.name == module)
            .flat_map(|m| m.types.iter())
            .find(|t| t.name == name)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Module {
    pub name: String,
    #[serde(default)]
    pub types: Vec<TypeAssignment>,
}

/// `Name ::= Type` at module level.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TypeAssignment {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: Type,
}

/// One bound of a value or size range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bound {
    /// `MIN`
    Min,
    /// `MAX`
    Max,
    Value(i128),
}

impl Bound {
    pub fn value(self) -> Option<i128> {
        match self {
            Bound::Value(v) => Some(v),
            Bound::Min | Bound::Max => None,
        }
    }
}

impl<'de> Deserialize<'de> for Bound {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(BoundVisitor)
    }
}

struct BoundVisitor;

impl<'de> Visitor<'de> for BoundVisitor {
    type Value = Bound;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("an integer, a decimal string, \"MIN\" or \"MAX\"")
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Bound, E> {
        Ok(Bound::Value(v.into()))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Bound, E> {
        Ok(Bound::Value(v.into()))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Bound, E> {
        match v {
            "MIN" => Ok(Bound::Min),
            "MAX" => Ok(Bound::Max),
            other => other
                .parse::<i128>()
                .map(Bound::Value)
                .map_err(|_| E::invalid_value(de::Unexpected::Str(other), &self)),
        }
    }
}

fn unbounded_low() -> Bound {
    Bound::Min
}

fn unbounded_high() -> Bound {
    Bound::Max
}

/// `(lower..upper)`; used for both value and `SIZE` constraints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct Bounds {
    #[serde(default = "unbounded_low")]
    pub lower: Bound,
    #[serde(default = "unbounded_high")]
    pub upper: Bound,
}

impl Bounds {
    pub fn new(lower: Bound, upper: Bound) -> Self {
        Bounds { lower, upper }
    }
}

/// What the REAL constraints pin the type to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RealEncoding {
    Binary32,
    Binary64,
    #[default]
    Other,
}

/// A DEFAULT value attached to a SEQUENCE or SET member.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Boolean(bool),
    /// Wide enough for every bound of a 64-bit range, signed or not.
    Integer(i128),
    Real(f64),
    /// An enumeration identifier.
    Identifier(String),
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(ValueVisitor)
    }
}

struct ValueVisitor;

impl<'de> Visitor<'de> for ValueVisitor {
    type Value = Value;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a boolean, a number or an identifier")
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<Value, E> {
        Ok(Value::Boolean(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Value, E> {
        Ok(Value::Integer(v.into()))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Value, E> {
        Ok(Value::Integer(v.into()))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Value, E> {
        Ok(Value::Real(v))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Value, E> {
        Ok(Value::Identifier(v.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Member {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: Type,
    #[serde(default)]
    pub optional: bool,
    #[serde(default)]
    pub default: Option<Value>,
    /// Explicit context-specific tag number. Automatic tagging (the
    /// member's index) applies when absent.
    #[serde(default)]
    pub tag: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EnumItem {
    pub name: String,
    pub value: i64,
}

/// A compiled ASN.1 type.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "kind")]
pub enum Type {
    #[serde(rename = "BOOLEAN")]
    Boolean,
    #[serde(rename = "INTEGER")]
    Integer {
        #[serde(default)]
        value: Option<Bounds>,
    },
    #[serde(rename = "REAL")]
    Real {
        #[serde(default)]
        encoding: RealEncoding,
    },
    #[serde(rename = "ENUMERATED")]
    Enumerated { items: Vec<EnumItem> },
    #[serde(rename = "NULL")]
    Null,
    #[serde(rename = "OCTET STRING")]
    OctetString {
        #[serde(default)]
        size: Option<Bounds>,
    },
    #[serde(rename = "BIT STRING")]
    BitString {
        #[serde(default)]
        size: Option<Bounds>,
    },
    #[serde(rename = "SEQUENCE")]
    Sequence { members: Vec<Member> },
    #[serde(rename = "SET")]
    Set { members: Vec<Member> },
    #[serde(rename = "CHOICE")]
    Choice { members: Vec<Member> },
    #[serde(rename = "SEQUENCE OF")]
    SequenceOf {
        #[serde(default)]
        size: Option<Bounds>,
        element: Box<Type>,
    },
    #[serde(rename = "SET OF")]
    SetOf {
        #[serde(default)]
        size: Option<Bounds>,
        element: Box<Type>,
    },
    IA5String {
        #[serde(default)]
        size: Option<Bounds>,
    },
    VisibleString {
        #[serde(default)]
        size: Option<Bounds>,
    },
    UTF8String {
        #[serde(default)]
        size: Option<Bounds>,
    },
    NumericString {
        #[serde(default)]
        size: Option<Bounds>,
    },
    PrintableString {
        #[serde(default)]
        size: Option<Bounds>,
    },
    BMPString {
        #[serde(default)]
        size: Option<Bounds>,
    },
    UniversalString {
        #[serde(default)]
        size: Option<Bounds>,
    },
    TeletexString {
        #[serde(default)]
        size: Option<Bounds>,
    },
    GeneralString {
        #[serde(default)]
        size: Option<Bounds>,
    },
    GraphicString {
        #[serde(default)]
        size: Option<Bounds>,
    },
    #[serde(rename = "OBJECT IDENTIFIER")]
    ObjectIdentifier,
    #[serde(rename = "RELATIVE-OID")]
    RelativeOid,
    UTCTime,
    GeneralizedTime,
    #[serde(rename = "DATE")]
    Date,
    #[serde(rename = "TIME-OF-DAY")]
    TimeOfDay,
    #[serde(rename = "DATE-TIME")]
    DateTime,
    #[serde(rename = "ANY")]
    Any,
    #[serde(rename = "EXTERNAL")]
    External,
    /// Reference to another top-level assignment. `module` defaults to the
    /// module the reference appears in.
    Reference {
        #[serde(default)]
        module: Option<String>,
        name: String,
    },
}

/// Field-less mirror of [`Type`], one variant per constructor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TypeKind {
    Boolean,
    Integer,
    Real,
    Enumerated,
    Null,
    OctetString,
    BitString,
    Sequence,
    Set,
    Choice,
    SequenceOf,
    SetOf,
    IA5String,
    VisibleString,
    UTF8String,
    NumericString,
    PrintableString,
    BMPString,
    UniversalString,
    TeletexString,
    GeneralString,
    GraphicString,
    ObjectIdentifier,
    RelativeOid,
    UTCTime,
    GeneralizedTime,
    Date,
    TimeOfDay,
    DateTime,
    Any,
    External,
    Reference,
}

impl TypeKind {
    pub const ALL: &'static [TypeKind] = &[
        TypeKind::Boolean,
        TypeKind::Integer,
        TypeKind::Real,
        TypeKind::Enumerated,
        TypeKind::Null,
        TypeKind::OctetString,
        TypeKind::BitString,
        TypeKind::Sequence,
        TypeKind::Set,
        TypeKind::Choice,
        TypeKind::SequenceOf,
        TypeKind::SetOf,
        TypeKind::IA5String,
        TypeKind::VisibleString,
        TypeKind::UTF8String,
        TypeKind::NumericString,
        TypeKind::PrintableString,
        TypeKind::BMPString,
        TypeKind::UniversalString,
        TypeKind::TeletexString,
        TypeKind::GeneralString,
        TypeKind::GraphicString,
        TypeKind::ObjectIdentifier,
        TypeKind::RelativeOid,
        TypeKind::UTCTime,
        TypeKind::GeneralizedTime,
        TypeKind::Date,
        TypeKind::TimeOfDay,
        TypeKind::DateTime,
        TypeKind::Any,
        TypeKind::External,
        TypeKind::Reference,
    ];

    /// The ASN.1 keyword as written in a module, used verbatim in
    /// diagnostics.
    pub fn keyword(self) -> &'static str {
        match self {
            TypeKind::Boolean => "BOOLEAN",
            TypeKind::Integer => "INTEGER",
            TypeKind::Real => "REAL",
            TypeKind::Enumerated => "ENUMERATED",
            TypeKind::Null => "NULL",
            TypeKind::OctetString => "OCTET STRING",
            TypeKind::BitString => "BIT STRING",
            TypeKind::Sequence => "SEQUENCE",
            TypeKind::Set => "SET",
            TypeKind::Choice => "CHOICE",
            TypeKind::SequenceOf => "SEQUENCE OF",
            TypeKind::SetOf => "SET OF",
            TypeKind::IA5String => "IA5String",
            TypeKind::VisibleString => "VisibleString",
            TypeKind::UTF8String => "UTF8String",
            TypeKind::NumericString => "NumericString",
            TypeKind::PrintableString => "PrintableString",
            TypeKind::BMPString => "BMPString",
            TypeKind::UniversalString => "UniversalString",
            TypeKind::TeletexString => "TeletexString",
            TypeKind::GeneralString => "GeneralString",
            TypeKind::GraphicString => "GraphicString",
            TypeKind::ObjectIdentifier => "OBJECT IDENTIFIER",
            TypeKind::RelativeOid => "RELATIVE-OID",
            TypeKind::UTCTime => "UTCTime",
            TypeKind::GeneralizedTime => "GeneralizedTime",
            TypeKind::Date => "DATE",
            TypeKind::TimeOfDay => "TIME-OF-DAY",
            TypeKind::DateTime => "DATE-TIME",
            TypeKind::Any => "ANY",
            TypeKind::External => "EXTERNAL",
            TypeKind::Reference => "Reference",
        }
    }
}

impl fmt::Display for TypeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

impl Type {
    pub fn kind(&self) -> TypeKind {
        match self {
            Type::Boolean => TypeKind::Boolean,
            Type::Integer { .. } => TypeKind::Integer,
            Type::Real { .. } => TypeKind::Real,
            Type::Enumerated { .. } => TypeKind::Enumerated,
            Type::Null => TypeKind::Null,
            Type::OctetString { .. } => TypeKind::OctetString,
            Type::BitString { .. } => TypeKind::BitString,
            Type::Sequence { .. } => TypeKind::Sequence,
            Type::Set { .. } => TypeKind::Set,
            Type::Choice { .. } => TypeKind::Choice,
            Type::SequenceOf { .. } => TypeKind::SequenceOf,
            Type::SetOf { .. } => TypeKind::SetOf,
            Type::IA5String { .. } => TypeKind::IA5String,
            Type::VisibleString { .. } => TypeKind::VisibleString,
            Type::UTF8String { .. } => TypeKind::UTF8String,
            Type::NumericString { .. } => TypeKind::NumericString,
            Type::PrintableString { .. } => TypeKind::PrintableString,
            Type::BMPString { .. } => TypeKind::BMPString,
            Type::UniversalString { .. } => TypeKind::UniversalString,
            Type::TeletexString { .. } => TypeKind::TeletexString,
            Type::GeneralString { .. } => TypeKind::GeneralString,
            Type::GraphicString { .. } => TypeKind::GraphicString,
            Type::ObjectIdentifier => TypeKind::ObjectIdentifier,
            Type::RelativeOid => TypeKind::RelativeOid,
            Type::UTCTime => TypeKind::UTCTime,
            Type::GeneralizedTime => TypeKind::GeneralizedTime,
            Type::Date => TypeKind::Date,
            Type::TimeOfDay => TypeKind::TimeOfDay,
            Type::DateTime => TypeKind::DateTime,
            Type::Any => TypeKind::Any,
            Type::External => TypeKind::External,
            Type::Reference { .. } => TypeKind::Reference,
        }
    }

    /// Construct `INTEGER (lower..upper)`.
    pub fn integer(lower: Bound, upper: Bound) -> Type {
        Type::Integer {
            value: Some(Bounds::new(lower, upper)),
        }
    }
}
