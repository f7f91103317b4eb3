//! RDF term model.
//!
//! Terms are immutable values created during parse/build. Literal sub-kinds
//! are classified once at construction from the datatype IRI and never
//! re-derived by repeated type tests.

pub mod term;

pub use term::{xsd, ComparisonGroup, Literal, LiteralKind, Numeric, Term};
