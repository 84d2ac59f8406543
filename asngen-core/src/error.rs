use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("failed to read type tree: {0}")]
    SourceIo(#[from] std::io::Error),
    #[error("input was not found at {0}")]
    MissingInput(PathBuf),
    #[error("malformed type tree in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("malformed type tree: {0}")]
    Parse(#[source] serde_json::Error),
    #[error(transparent)]
    Generate(#[from] GenerateError),
}

/// The single error a generation call can end with.
///
/// Displays as `<location>: <reason>`, e.g. `Foo.A.a: INTEGER has no
/// minimum value.`
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{location}: {reason}")]
pub struct GenerateError {
    pub location: String,
    pub reason: Reason,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Reason {
    #[error("Unsupported type '{0}'.")]
    UnsupportedType(&'static str),
    #[error("INTEGER has no minimum value.")]
    MissingLowerBound,
    #[error("INTEGER has no maximum value.")]
    MissingUpperBound,
    #[error("Type does not fit in 64 bits.")]
    IntegerTooWide,
    #[error("{0} has no maximum length.")]
    MissingMaximumLength(&'static str),
    #[error("REAL not IEEE 754 binary32 or binary64.")]
    RealNotIeee754,
    #[error("{0} has an empty range.")]
    EmptyRange(&'static str),
    #[error("{0} has no members.")]
    NoMembers(&'static str),
    #[error("Undefined type '{0}'.")]
    UndefinedType(String),
    #[error("Recursive type '{0}' is not supported.")]
    RecursiveType(String),
    #[error("Invalid DEFAULT value.")]
    InvalidDefault,
    #[error("ENUMERATED value '{0}' does not fit in a C int.")]
    EnumerationValueTooWide(String),
    #[error("Name '{0}' clashes with another C identifier.")]
    NameClash(String),
}
