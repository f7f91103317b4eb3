//! Textual readers.
//!
//! `reader` turns a surface query-plan string into the nested list/atom form
//! the algebra builder consumes; `ntriples` reads one line of N-Triples data
//! into a ground triple for dataset loading.

pub mod ntriples;
pub mod reader;

pub use reader::{read_form, Form, PlanReader};
