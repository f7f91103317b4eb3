//! # Minerva
//!
//! Minerva is a SPARQL algebra evaluation core: it takes a parsed operator
//! tree (a query plan) and executes it against an RDF dataset, producing a
//! multiset of variable bindings, or evaluates a scalar expression against a
//! single binding, producing an RDF term or a typed error.
//!
//! The engine implements SPARQL's bag semantics, its open-world type system
//! where operations routinely produce contained type errors, and the total
//! order across incomparable term kinds used by ORDER BY.
//!
//! ## Example
//!
//! ```rust
//! use minerva::algebra::builder::build_plan;
//! use minerva::algebra::executor::ExecContext;
//! use minerva::parsing::reader::read_form;
//! use minerva::store::MemoryDataset;
//! use minerva::Result;
//!
//! fn example() -> Result<()> {
//!     let form = read_form("(bgp (triple ?s ?p ?o))")?;
//!     let plan = build_plan(&form)?;
//!     let mut dataset = MemoryDataset::new();
//!     let result = plan.execute(&mut dataset, &ExecContext::new())?;
//!     println!("{} solutions", result.into_solutions()?.len());
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::missing_docs_in_private_items)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::new_without_default)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::if_not_else)]

/// RDF term model: term kinds, literal sub-kinds, numeric promotion, EBV
pub mod model;

/// Solution mappings and the bag of solutions produced by execution
pub mod solution;

/// Scalar/boolean expression evaluation over a single solution mapping
pub mod expression;

/// Operator tree, builder, executor, and tree optimizer
pub mod algebra;

/// Textual readers: S-expression plans and N-Triples data
pub mod parsing;

/// Dataset collaborator contracts and the in-memory reference dataset
pub mod store;

pub mod error {
    //! Error types and result definitions

    use std::fmt;

    /// Result type alias for Minerva operations
    pub type Result<T> = std::result::Result<T, Error>;

    /// Main error type for Minerva
    #[derive(Debug)]
    pub enum Error {
        /// Operand has the wrong RDF term category or incompatible literal group
        Type(String),
        /// Structurally wrong input: bad arity, unbound variable, unknown operator
        Argument(String),
        /// Recognized but unsupported feature, e.g. the regex `s` flag
        NotImplemented(String),
        /// Decimal or integer division by zero; always fatal, never contained
        ZeroDivision(String),
        /// Malformed plan or data text
        Parse(String),
        /// Dataset source could not be loaded
        Load(String),
        /// IO error
        Io(std::io::Error),
    }

    impl fmt::Display for Error {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            match self {
                Error::Type(msg) => write!(f, "Type error: {}", msg),
                Error::Argument(msg) => write!(f, "Argument error: {}", msg),
                Error::NotImplemented(msg) => write!(f, "Not implemented: {}", msg),
                Error::ZeroDivision(msg) => write!(f, "Division by zero: {}", msg),
                Error::Parse(msg) => write!(f, "Parse error: {}", msg),
                Error::Load(msg) => write!(f, "Load error: {}", msg),
                Error::Io(err) => write!(f, "IO error: {}", err),
            }
        }
    }

    impl std::error::Error for Error {
        fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
            match self {
                Error::Io(err) => Some(err),
                _ => None,
            }
        }
    }

    impl From<std::io::Error> for Error {
        fn from(err: std::io::Error) -> Self {
            Error::Io(err)
        }
    }

    impl Error {
        /// True for the error categories Filter's EBV-false rule may contain.
        ///
        /// Division by zero is a hard failure and is never contained.
        pub fn is_containable(&self) -> bool {
            !matches!(self, Error::ZeroDivision(_) | Error::Io(_) | Error::Load(_))
        }
    }
}

// Re-export commonly used types
pub use error::{Error, Result};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::Type("incompatible literal groups".to_string());
        assert_eq!(format!("{}", err), "Type error: incompatible literal groups");
    }

    #[test]
    fn test_zero_division_is_not_containable() {
        assert!(!Error::ZeroDivision("decimal".to_string()).is_containable());
        assert!(Error::Type("x".to_string()).is_containable());
    }
}
