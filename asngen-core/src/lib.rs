//! Core of the asngen C code generator.
//!
//! Turns a compiled ASN.1 type tree into a C header and source pair that
//! encode and decode every type with OER or UPER. The pipeline is roughly:
//!
//!   type tree .json
//!     -> loader      (serde model in `types`)
//!     -> constraints (support matrix + bounds -> `layout`)
//!     -> codegen_oer / codegen_uper (function bodies + runtime helpers)
//!     -> assembler   (declaration order, header and source text)
//!
//! Higher-level tools (the CLI) should depend on this crate rather than
//! reimplementing the pipeline.

// ---------------------------------------------------------------------
// Error handling and diagnostics
// ---------------------------------------------------------------------

pub mod error;
pub mod location;

// ---------------------------------------------------------------------
// Input model and loading
// ---------------------------------------------------------------------

pub mod types;
pub mod loader;

// ---------------------------------------------------------------------
// Semantic layers: support matrix, constraint resolution, layouts
// ---------------------------------------------------------------------

pub mod support;
pub mod constraints;
pub mod layout;

// ---------------------------------------------------------------------
// C text infrastructure shared by both encoding rules
// ---------------------------------------------------------------------

pub mod names;
pub mod writer;
pub mod declarations;
pub mod assembler;

// ---------------------------------------------------------------------
// Back-ends: per-rule emitters, runtimes, and compiler orchestration
// ---------------------------------------------------------------------

pub mod oer_runtime;
pub mod codegen_oer;
pub mod uper_runtime;
pub mod codegen_uper;
pub mod compiler;

// ---------------------------------------------------------------------
// Public API re-exports
// ---------------------------------------------------------------------

pub use compiler::{CompilationArtifact, compile, compile_file};
pub use error::{CoreError, GenerateError, Reason};
pub use support::EncodingRule;
pub use types::Specification;
