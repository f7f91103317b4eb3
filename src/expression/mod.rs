//! Expression evaluation.
//!
//! An expression node evaluates against exactly one solution mapping and
//! yields an RDF term or a typed error. Callers decide whether an error
//! propagates or is contained: Filter converts contained errors to "exclude
//! this solution", everything else aborts.

pub mod evaluator;

pub use evaluator::{compare_terms, equals, ArithmeticOp, ComparisonOp, Expression};
