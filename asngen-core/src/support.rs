//! Support matrix: which type constructors each encoding rule can generate.
//!
//! The table is an exhaustive match over [`TypeKind`], so adding a
//! constructor to the model does not compile until a decision is made for
//! every rule here.

use core::fmt;

use crate::types::TypeKind;

/// Encoding rules the generator emits code for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EncodingRule {
    /// Octet Encoding Rules, X.696.
    Oer,
    /// Unaligned Packed Encoding Rules, X.691.
    Uper,
}

impl EncodingRule {
    pub fn name(self) -> &'static str {
        match self {
            EncodingRule::Oer => "OER",
            EncodingRule::Uper => "UPER",
        }
    }
}

impl fmt::Display for EncodingRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Support {
    Generatable,
    Rejected,
}

/// One row of the matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SupportRow {
    pub kind: TypeKind,
    pub oer: Support,
    pub uper: Support,
}

impl SupportRow {
    pub fn get(&self, rule: EncodingRule) -> Support {
        match rule {
            EncodingRule::Oer => self.oer,
            EncodingRule::Uper => self.uper,
        }
    }
}

/// The matrix row for `kind`.
pub fn row(kind: TypeKind) -> SupportRow {
    use Support::{Generatable as G, Rejected as R};

    let (oer, uper) = match kind {
        TypeKind::Boolean
        | TypeKind::Integer
        | TypeKind::Enumerated
        | TypeKind::Null
        | TypeKind::OctetString
        | TypeKind::BitString
        | TypeKind::Sequence
        | TypeKind::Set
        | TypeKind::Choice
        | TypeKind::SequenceOf
        | TypeKind::SetOf
        | TypeKind::IA5String
        | TypeKind::VisibleString
        | TypeKind::Reference => (G, G),

        // UPER has no IEEE 754 shortcut; its REAL is the BER-style
        // mantissa/exponent form.
        TypeKind::Real => (G, R),

        // Not a known-multiplier string, so UPER would need an unconstrained
        // length determinant.
        TypeKind::UTF8String => (G, R),

        TypeKind::NumericString
        | TypeKind::PrintableString
        | TypeKind::BMPString
        | TypeKind::UniversalString
        | TypeKind::TeletexString
        | TypeKind::GeneralString
        | TypeKind::GraphicString
        | TypeKind::ObjectIdentifier
        | TypeKind::RelativeOid
        | TypeKind::UTCTime
        | TypeKind::GeneralizedTime
        | TypeKind::Date
        | TypeKind::TimeOfDay
        | TypeKind::DateTime
        | TypeKind::Any
        | TypeKind::External => (R, R),
    };

    SupportRow { kind, oer, uper }
}

pub fn support(kind: TypeKind, rule: EncodingRule) -> Support {
    row(kind).get(rule)
}

/// Every row, in [`TypeKind::ALL`] order.
pub fn matrix() -> impl Iterator<Item = SupportRow> {
    TypeKind::ALL.iter().copied().map(row)
}
