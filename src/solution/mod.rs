//! Solution mappings and sequences.
//!
//! A mapping assigns RDF terms to a subset of query variables; a sequence is
//! an ordered bag of mappings. Sequences are produced fresh by each executor
//! call and owned by the caller; every operation here returns a new value.

pub mod mapping;
pub mod sequence;

pub use mapping::SolutionMapping;
pub use sequence::SolutionSequence;
