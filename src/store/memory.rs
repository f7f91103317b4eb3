use crate::error::{Error, Result};
use crate::model::Term;
use crate::parsing::ntriples;
use crate::solution::{SolutionMapping, SolutionSequence};
use crate::store::{ActiveGraph, Dataset, Graph, Triple, TriplePattern};
use std::collections::BTreeMap;
use std::fs;

/// In-memory dataset: one default graph plus named graphs, with linear-scan
/// pattern matching. Sources are N-Triples files on the local filesystem.
#[derive(Debug, Clone, Default)]
pub struct MemoryDataset {
    default_graph: Graph,
    named_graphs: BTreeMap<String, Graph>,
}

impl MemoryDataset {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a triple into the default graph.
    pub fn insert(&mut self, triple: Triple) {
        self.default_graph.insert(triple);
    }

    /// Insert a triple into a named graph, creating the graph if absent.
    pub fn insert_named(&mut self, graph: impl Into<String>, triple: Triple) {
        self.named_graphs.entry(graph.into()).or_default().insert(triple);
    }

    pub fn default_graph(&self) -> &Graph {
        &self.default_graph
    }

    pub fn named_graph(&self, name: &str) -> Option<&Graph> {
        self.named_graphs.get(name)
    }

    fn graph_for(&self, active: &ActiveGraph) -> Option<&Graph> {
        match active {
            ActiveGraph::Default => Some(&self.default_graph),
            ActiveGraph::Named(name) => self.named_graphs.get(name),
        }
    }
}

/// Unify one pattern position against a ground term under the bindings
/// accumulated so far for this triple.
fn unify(pattern: &Term, actual: &Term, mapping: &mut SolutionMapping) -> bool {
    match pattern {
        Term::Variable(name) => match mapping.get(name) {
            Some(bound) => bound == actual,
            None => {
                mapping.bind(name.clone(), actual.clone());
                true
            }
        },
        ground => ground == actual,
    }
}

impl Dataset for MemoryDataset {
    fn match_pattern(&self, pattern: &TriplePattern, active: &ActiveGraph) -> SolutionSequence {
        let mut solutions = SolutionSequence::new();
        let Some(graph) = self.graph_for(active) else {
            return solutions;
        };
        for triple in graph.iter() {
            let mut mapping = SolutionMapping::new();
            if unify(&pattern.subject, &triple.subject, &mut mapping)
                && unify(&pattern.predicate, &triple.predicate, &mut mapping)
                && unify(&pattern.object, &triple.object, &mut mapping)
            {
                solutions.push(mapping);
            }
        }
        solutions
    }

    fn graph_names(&self) -> Vec<String> {
        self.named_graphs.keys().cloned().collect()
    }

    fn load(&mut self, source: &str, named: Option<&str>) -> Result<()> {
        let path = source.strip_prefix("file://").unwrap_or(source);
        let content = fs::read_to_string(path)
            .map_err(|err| Error::Load(format!("cannot read {}: {}", source, err)))?;
        let graph = match named {
            Some(name) => self.named_graphs.entry(name.to_string()).or_default(),
            None => &mut self.default_graph,
        };
        for (number, line) in content.lines().enumerate() {
            match ntriples::parse_line(line) {
                Ok(Some(triple)) => graph.insert(triple),
                Ok(None) => {}
                Err(err) => {
                    return Err(Error::Load(format!("{}:{}: {}", source, number + 1, err)));
                }
            }
        }
        Ok(())
    }
}
