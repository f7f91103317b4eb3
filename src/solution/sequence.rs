use crate::solution::SolutionMapping;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashSet;

/// An ordered bag of solution mappings.
///
/// Duplicates are significant: cardinalities add under union and multiply
/// under join. Every operation returns a new sequence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolutionSequence {
    mappings: Vec<SolutionMapping>,
}

impl SolutionSequence {
    pub fn new() -> Self {
        Self { mappings: Vec::new() }
    }

    pub fn push(&mut self, mapping: SolutionMapping) {
        self.mappings.push(mapping);
    }

    pub fn extend(&mut self, other: SolutionSequence) {
        self.mappings.extend(other.mappings);
    }

    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SolutionMapping> {
        self.mappings.iter()
    }

    /// The identity sequence for join: a single empty mapping.
    pub fn unit() -> Self {
        Self { mappings: vec![SolutionMapping::new()] }
    }

    /// Retain the first occurrence of each unique mapping, preserving
    /// first-seen order.
    pub fn distinct(&self) -> SolutionSequence {
        let mut seen = HashSet::new();
        let mappings = self
            .mappings
            .iter()
            .filter(|mapping| seen.insert((*mapping).clone()))
            .cloned()
            .collect();
        SolutionSequence { mappings }
    }

    /// Implementation-defined duplicate reduction.
    ///
    /// Permitted to dedup anywhere between "not at all" and "fully"; this
    /// implementation reuses `distinct`, which satisfies both bounds: the
    /// result is a subset of the input and never gains mappings.
    pub fn reduce(&self) -> SolutionSequence {
        self.distinct()
    }

    /// Project every mapping onto `variables`.
    pub fn project(&self, variables: &[String]) -> SolutionSequence {
        let mappings = self.mappings.iter().map(|mapping| mapping.project(variables)).collect();
        SolutionSequence { mappings }
    }

    /// Stable sort by the given comparator; ties keep their input order.
    pub fn order_by<F>(&self, compare: F) -> SolutionSequence
    where
        F: Fn(&SolutionMapping, &SolutionMapping) -> Ordering,
    {
        let mut mappings = self.mappings.clone();
        mappings.sort_by(|a, b| compare(a, b));
        SolutionSequence { mappings }
    }

    /// Drop the first `count` mappings; `None` means unspecified (no-op).
    pub fn offset(&self, count: Option<usize>) -> SolutionSequence {
        match count {
            Some(n) => {
                SolutionSequence { mappings: self.mappings.iter().skip(n).cloned().collect() }
            }
            None => self.clone(),
        }
    }

    /// Keep the first `count` mappings; `None` means unspecified (no-op).
    pub fn limit(&self, count: Option<usize>) -> SolutionSequence {
        match count {
            Some(n) => {
                SolutionSequence { mappings: self.mappings.iter().take(n).cloned().collect() }
            }
            None => self.clone(),
        }
    }
}

impl From<Vec<SolutionMapping>> for SolutionSequence {
    fn from(mappings: Vec<SolutionMapping>) -> Self {
        Self { mappings }
    }
}

impl IntoIterator for SolutionSequence {
    type Item = SolutionMapping;
    type IntoIter = std::vec::IntoIter<SolutionMapping>;

    fn into_iter(self) -> Self::IntoIter {
        self.mappings.into_iter()
    }
}

impl<'a> IntoIterator for &'a SolutionSequence {
    type Item = &'a SolutionMapping;
    type IntoIter = std::slice::Iter<'a, SolutionMapping>;

    fn into_iter(self) -> Self::IntoIter {
        self.mappings.iter()
    }
}
