//! Dataset collaborator contracts.
//!
//! The executor never indexes triples itself: leaf graph patterns call out
//! to a [`Dataset`] implementation, and the Dataset operator asks it to load
//! sources. [`MemoryDataset`] is the reference implementation used by the
//! CLI and the test suite.

pub mod memory;

pub use memory::MemoryDataset;

use crate::error::Result;
use crate::model::Term;
use crate::solution::SolutionSequence;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// A ground RDF triple.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Triple {
    pub subject: Term,
    pub predicate: Term,
    pub object: Term,
}

impl Triple {
    pub fn new(subject: Term, predicate: Term, object: Term) -> Self {
        Self { subject, predicate, object }
    }
}

impl fmt::Display for Triple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(triple {} {} {})", self.subject, self.predicate, self.object)
    }
}

/// A triple pattern: subject/predicate/object, each a bound term or a
/// variable. Also used as a CONSTRUCT template triple.
#[derive(Debug, Clone, PartialEq)]
pub struct TriplePattern {
    pub subject: Term,
    pub predicate: Term,
    pub object: Term,
}

impl TriplePattern {
    pub fn new(subject: Term, predicate: Term, object: Term) -> Self {
        Self { subject, predicate, object }
    }
}

impl fmt::Display for TriplePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(triple {} {} {})", self.subject, self.predicate, self.object)
    }
}

/// A set of triples; inserting a duplicate is a no-op.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Graph {
    triples: BTreeSet<Triple>,
}

impl Graph {
    pub fn new() -> Self {
        Self { triples: BTreeSet::new() }
    }

    pub fn insert(&mut self, triple: Triple) {
        self.triples.insert(triple);
    }

    pub fn contains(&self, triple: &Triple) -> bool {
        self.triples.contains(triple)
    }

    pub fn len(&self) -> usize {
        self.triples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triples.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Triple> {
        self.triples.iter()
    }
}

impl FromIterator<Triple> for Graph {
    fn from_iter<I: IntoIterator<Item = Triple>>(iter: I) -> Self {
        Self { triples: iter.into_iter().collect() }
    }
}

/// Active-graph selector passed down to pattern matching.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActiveGraph {
    /// The dataset's default graph
    Default,
    /// A single named graph
    Named(String),
}

/// The dataset collaborator consumed by the executor.
///
/// Pattern matching is a read; `load` is the only write, performed by the
/// Dataset operator before evaluating its pattern. Implementations provide
/// their own consistency guarantees; the core performs no locking.
pub trait Dataset {
    /// Bindings for every triple in the active graph matching the pattern.
    fn match_pattern(&self, pattern: &TriplePattern, active: &ActiveGraph) -> SolutionSequence;

    /// Names of every named graph, for Graph-with-variable enumeration.
    fn graph_names(&self) -> Vec<String>;

    /// Fetch `source` and insert its triples under the default graph or the
    /// given named graph.
    fn load(&mut self, source: &str, named: Option<&str>) -> Result<()>;
}
