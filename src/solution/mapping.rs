use crate::model::Term;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A solution mapping: variable name → bound RDF term.
///
/// Keys are unique and iteration order is deterministic. Bound values are
/// always ground terms, never variables.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SolutionMapping {
    bindings: BTreeMap<String, Term>,
}

impl SolutionMapping {
    pub fn new() -> Self {
        Self { bindings: BTreeMap::new() }
    }

    /// Bind a variable, replacing any previous binding for the same name.
    pub fn bind(&mut self, variable: impl Into<String>, term: Term) {
        self.bindings.insert(variable.into(), term);
    }

    pub fn get(&self, variable: &str) -> Option<&Term> {
        self.bindings.get(variable)
    }

    pub fn is_bound(&self, variable: &str) -> bool {
        self.bindings.contains_key(variable)
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Term)> {
        self.bindings.iter()
    }

    pub fn variables(&self) -> impl Iterator<Item = &String> {
        self.bindings.keys()
    }

    /// Two mappings are compatible iff every variable present in both is
    /// bound to the identical RDF term (raw term equality, not SPARQL `=`).
    pub fn compatible(&self, other: &SolutionMapping) -> bool {
        self.bindings.iter().all(|(variable, term)| match other.bindings.get(variable) {
            Some(other_term) => term == other_term,
            None => true,
        })
    }

    /// Union of both binding maps; defined iff the mappings are compatible.
    pub fn merge(&self, other: &SolutionMapping) -> Option<SolutionMapping> {
        if !self.compatible(other) {
            return None;
        }
        let mut bindings = self.bindings.clone();
        for (variable, term) in &other.bindings {
            bindings.insert(variable.clone(), term.clone());
        }
        Some(SolutionMapping { bindings })
    }

    /// Keep only the bindings whose variable is in `variables`.
    ///
    /// Variables unbound in the source are simply absent in the result.
    pub fn project(&self, variables: &[String]) -> SolutionMapping {
        let bindings = self
            .bindings
            .iter()
            .filter(|(variable, _)| variables.contains(variable))
            .map(|(variable, term)| (variable.clone(), term.clone()))
            .collect();
        SolutionMapping { bindings }
    }
}

impl FromIterator<(String, Term)> for SolutionMapping {
    fn from_iter<I: IntoIterator<Item = (String, Term)>>(iter: I) -> Self {
        Self { bindings: iter.into_iter().collect() }
    }
}

impl fmt::Display for SolutionMapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(solution")?;
        for (variable, term) in &self.bindings {
            write!(f, " (?{} {})", variable, term)?;
        }
        write!(f, ")")
    }
}
