//! Plan execution.
//!
//! `Algebra::execute` walks the operator tree bottom-up against a
//! [`Dataset`], threading an [`ExecContext`] that carries the active graph
//! and the base IRI for source resolution. Bag semantics throughout:
//! duplicate solutions survive until an explicit Distinct or Reduced.

use crate::algebra::node::{Algebra, DatasetSource, OrderKey};
use crate::error::{Error, Result};
use crate::expression::{compare_terms, Expression};
use crate::model::Term;
use crate::solution::{SolutionMapping, SolutionSequence};
use crate::store::{ActiveGraph, Dataset, Graph, Triple, TriplePattern};
use std::cmp::Ordering;
use std::collections::HashMap;

/// Per-branch execution state.
///
/// Contexts are cheap to clone and never mutated in place: operators that
/// change the active graph or base hand a derived context to their children.
#[derive(Debug, Clone)]
pub struct ExecContext {
    active_graph: ActiveGraph,
    base: Option<String>,
    depth: usize,
}

impl ExecContext {
    pub fn new() -> Self {
        Self { active_graph: ActiveGraph::Default, base: None, depth: 0 }
    }

    pub fn active_graph(&self) -> &ActiveGraph {
        &self.active_graph
    }

    /// Recursion depth of the current node, for diagnostics only.
    pub fn depth(&self) -> usize {
        self.depth
    }

    fn descend(&self) -> Self {
        let mut context = self.clone();
        context.depth += 1;
        context
    }

    fn with_graph(&self, name: &str) -> Self {
        let mut context = self.descend();
        context.active_graph = ActiveGraph::Named(name.to_string());
        context
    }

    fn with_base(&self, base: &str) -> Self {
        let mut context = self.descend();
        context.base = Some(base.to_string());
        context
    }

    fn resolve(&self, iri: &str) -> String {
        match &self.base {
            Some(base) if !has_scheme(iri) => {
                if base.ends_with('/') || base.ends_with('#') {
                    format!("{}{}", base, iri)
                } else {
                    format!("{}/{}", base, iri)
                }
            }
            _ => iri.to_string(),
        }
    }
}

fn has_scheme(iri: &str) -> bool {
    let Some(colon) = iri.find(':') else {
        return false;
    };
    let scheme = &iri[..colon];
    let mut chars = scheme.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

/// What execution produced: bindings for most plans, a graph for Construct.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryResult {
    Solutions(SolutionSequence),
    Graph(Graph),
}

impl QueryResult {
    pub fn into_solutions(self) -> Result<SolutionSequence> {
        match self {
            QueryResult::Solutions(solutions) => Ok(solutions),
            QueryResult::Graph(_) => {
                Err(Error::Type("expected solutions, got a graph result".to_string()))
            }
        }
    }

    pub fn into_graph(self) -> Result<Graph> {
        match self {
            QueryResult::Graph(graph) => Ok(graph),
            QueryResult::Solutions(_) => {
                Err(Error::Type("expected a graph, got a solution result".to_string()))
            }
        }
    }
}

/// All pairwise merges of compatible mappings.
fn join_sequences(left: &SolutionSequence, right: &SolutionSequence) -> SolutionSequence {
    let mut joined = SolutionSequence::new();
    for l in left {
        for r in right {
            if let Some(merged) = l.merge(r) {
                joined.push(merged);
            }
        }
    }
    joined
}

/// Filter's acceptance test: true iff the condition evaluates to EBV true.
///
/// A missing condition always holds. Containable evaluation errors count as
/// false; fatal errors propagate.
fn condition_holds(condition: Option<&Expression>, mapping: &SolutionMapping) -> Result<bool> {
    let Some(expression) = condition else {
        return Ok(true);
    };
    match expression.effective_boolean_value(mapping) {
        Ok(value) => Ok(value),
        Err(error) if error.is_containable() => Ok(false),
        Err(error) => Err(error),
    }
}

impl Algebra {
    /// Execute the plan against `dataset`.
    pub fn execute(&self, dataset: &mut dyn Dataset, context: &ExecContext) -> Result<QueryResult> {
        match self {
            Algebra::Bgp(patterns) => {
                let mut solutions = SolutionSequence::unit();
                for pattern in patterns {
                    let matches = dataset.match_pattern(pattern, context.active_graph());
                    solutions = join_sequences(&solutions, &matches);
                    if solutions.is_empty() {
                        break;
                    }
                }
                Ok(QueryResult::Solutions(solutions))
            }
            Algebra::Join(left, right) => {
                let left = left.execute(dataset, &context.descend())?.into_solutions()?;
                let right = right.execute(dataset, &context.descend())?.into_solutions()?;
                Ok(QueryResult::Solutions(join_sequences(&left, &right)))
            }
            Algebra::LeftJoin(left, right, condition) => {
                let left = left.execute(dataset, &context.descend())?.into_solutions()?;
                let right = right.execute(dataset, &context.descend())?.into_solutions()?;
                let mut solutions = SolutionSequence::new();
                for l in &left {
                    let mut extended = false;
                    for r in &right {
                        if let Some(merged) = l.merge(r) {
                            if condition_holds(condition.as_ref(), &merged)? {
                                solutions.push(merged);
                                extended = true;
                            }
                        }
                    }
                    // No compatible right mapping passed: the left mapping
                    // survives unextended
                    if !extended {
                        solutions.push(l.clone());
                    }
                }
                Ok(QueryResult::Solutions(solutions))
            }
            Algebra::Union(left, right) => {
                let mut solutions = left.execute(dataset, &context.descend())?.into_solutions()?;
                solutions.extend(right.execute(dataset, &context.descend())?.into_solutions()?);
                Ok(QueryResult::Solutions(solutions))
            }
            Algebra::Filter(expression, pattern) => {
                let input = pattern.execute(dataset, &context.descend())?.into_solutions()?;
                let mut solutions = SolutionSequence::new();
                for mapping in input {
                    if condition_holds(Some(expression), &mapping)? {
                        solutions.push(mapping);
                    }
                }
                Ok(QueryResult::Solutions(solutions))
            }
            Algebra::Graph(term, pattern) => match term {
                Term::Iri(name) => pattern.execute(dataset, &context.with_graph(name)),
                Term::Literal(literal) => {
                    pattern.execute(dataset, &context.with_graph(literal.lexical()))
                }
                Term::Variable(variable) => {
                    let mut solutions = SolutionSequence::new();
                    for name in dataset.graph_names() {
                        let inner =
                            pattern.execute(dataset, &context.with_graph(&name))?.into_solutions()?;
                        let mut binding = SolutionMapping::new();
                        binding.bind(variable.clone(), Term::Iri(name));
                        for mapping in &inner {
                            if let Some(merged) = mapping.merge(&binding) {
                                solutions.push(merged);
                            }
                        }
                    }
                    Ok(QueryResult::Solutions(solutions))
                }
                other => Err(Error::Type(format!("invalid graph term {}", other))),
            },
            Algebra::Dataset(sources, pattern) => {
                for source in sources {
                    match source {
                        DatasetSource::Default(iri) => {
                            dataset.load(&context.resolve(iri), None)?;
                        }
                        DatasetSource::Named(iri) => {
                            let resolved = context.resolve(iri);
                            dataset.load(&resolved, Some(&resolved))?;
                        }
                    }
                }
                pattern.execute(dataset, &context.descend())
            }
            Algebra::Project(variables, pattern) => {
                let solutions = pattern.execute(dataset, &context.descend())?.into_solutions()?;
                Ok(QueryResult::Solutions(solutions.project(variables)))
            }
            Algebra::Distinct(pattern) => {
                let solutions = pattern.execute(dataset, &context.descend())?.into_solutions()?;
                Ok(QueryResult::Solutions(solutions.distinct()))
            }
            Algebra::Reduced(pattern) => {
                let solutions = pattern.execute(dataset, &context.descend())?.into_solutions()?;
                Ok(QueryResult::Solutions(solutions.reduce()))
            }
            Algebra::OrderBy(keys, pattern) => {
                let solutions = pattern.execute(dataset, &context.descend())?.into_solutions()?;
                Ok(QueryResult::Solutions(
                    solutions.order_by(|a, b| compare_by_keys(keys, a, b)),
                ))
            }
            Algebra::Slice(offset, limit, pattern) => {
                let solutions = pattern.execute(dataset, &context.descend())?.into_solutions()?;
                Ok(QueryResult::Solutions(solutions.offset(*offset).limit(*limit)))
            }
            Algebra::Construct(template, pattern) => {
                let solutions = pattern.execute(dataset, &context.descend())?.into_solutions()?;
                Ok(QueryResult::Graph(instantiate_template(template, &solutions)))
            }
            Algebra::Base(iri, pattern) => pattern.execute(dataset, &context.with_base(iri)),
            Algebra::Prefix(_, pattern) => pattern.execute(dataset, &context.descend()),
        }
    }
}

/// Compare two mappings under a sort-key list.
///
/// Keys apply left to right; an evaluation error leaves the key unbound,
/// which sorts lowest. Terms the value order cannot relate fall back to
/// their rendered forms so the comparator stays total.
fn compare_by_keys(keys: &[OrderKey], a: &SolutionMapping, b: &SolutionMapping) -> Ordering {
    for key in keys {
        let left = key.expression().evaluate(a).ok();
        let right = key.expression().evaluate(b).ok();
        let ordering = match compare_terms(left.as_ref(), right.as_ref()) {
            Ok(ordering) => ordering,
            Err(_) => rendered(left.as_ref()).cmp(&rendered(right.as_ref())),
        };
        let ordering = if key.is_descending() { ordering.reverse() } else { ordering };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    Ordering::Equal
}

fn rendered(term: Option<&Term>) -> String {
    term.map(Term::to_string).unwrap_or_default()
}

/// Instantiate a CONSTRUCT template once per solution.
///
/// Blank node labels in the template mint a fresh blank node per solution;
/// triples with an unbound variable or an illegal term position are skipped.
fn instantiate_template(template: &[TriplePattern], solutions: &SolutionSequence) -> Graph {
    let mut graph = Graph::new();
    let mut next_blank = 0usize;
    for mapping in solutions {
        let mut fresh: HashMap<String, Term> = HashMap::new();
        for pattern in template {
            let mut instantiate = |term: &Term| -> Option<Term> {
                match term {
                    Term::Variable(name) => mapping.get(name).cloned(),
                    Term::BlankNode(label) => Some(
                        fresh
                            .entry(label.clone())
                            .or_insert_with(|| {
                                let node = Term::BlankNode(format!("c{}", next_blank));
                                next_blank += 1;
                                node
                            })
                            .clone(),
                    ),
                    other => Some(other.clone()),
                }
            };
            let (Some(subject), Some(predicate), Some(object)) = (
                instantiate(&pattern.subject),
                instantiate(&pattern.predicate),
                instantiate(&pattern.object),
            ) else {
                continue;
            };
            if matches!(subject, Term::Literal(_)) || !matches!(predicate, Term::Iri(_)) {
                continue;
            }
            graph.insert(Triple::new(subject, predicate, object));
        }
    }
    graph
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algebra::builder::build_plan;
    use crate::model::Literal;
    use crate::parsing::reader::read_form;
    use crate::store::MemoryDataset;

    fn iri(value: &str) -> Term {
        Term::Iri(format!("http://example.org/{}", value))
    }

    fn dataset() -> MemoryDataset {
        let mut dataset = MemoryDataset::new();
        for (s, o) in [("a", 1), ("b", 2), ("c", 3)] {
            dataset.insert(Triple::new(
                iri(s),
                iri("value"),
                Term::Literal(Literal::integer(o)),
            ));
        }
        dataset
    }

    fn run(plan: &str, dataset: &mut MemoryDataset) -> SolutionSequence {
        let plan = build_plan(&read_form(plan).unwrap()).unwrap();
        plan.execute(dataset, &ExecContext::new()).unwrap().into_solutions().unwrap()
    }

    #[test]
    fn test_empty_bgp_is_join_identity() {
        let mut dataset = dataset();
        let solutions = run("(bgp)", &mut dataset);
        assert_eq!(solutions.len(), 1);
        assert_eq!(solutions.iter().next().unwrap().len(), 0);
    }

    #[test]
    fn test_filter_drops_error_rows() {
        // ?o < 3 errors on nothing here, but comparing an IRI binding would;
        // the scenario below exercises the contained-error path
        let mut dataset = dataset();
        dataset.insert(Triple::new(iri("d"), iri("value"), iri("not-a-number")));
        let solutions = run(
            "(filter (< ?o 3) (bgp (triple ?s <http://example.org/value> ?o)))",
            &mut dataset,
        );
        assert_eq!(solutions.len(), 2);
    }

    #[test]
    fn test_order_desc_puts_largest_first() {
        let mut dataset = dataset();
        let solutions = run(
            "(order ((desc ?o)) (bgp (triple ?s <http://example.org/value> ?o)))",
            &mut dataset,
        );
        let first = solutions.iter().next().unwrap();
        assert_eq!(first.get("o"), Some(&Term::Literal(Literal::integer(3))));
    }

    #[test]
    fn test_construct_mints_fresh_blanks_per_solution() {
        let mut dataset = dataset();
        let plan = build_plan(
            &read_form(
                "(construct ((triple _:who <http://example.org/score> ?o)) \
                 (bgp (triple ?s <http://example.org/value> ?o)))",
            )
            .unwrap(),
        )
        .unwrap();
        let graph =
            plan.execute(&mut dataset, &ExecContext::new()).unwrap().into_graph().unwrap();
        assert_eq!(graph.len(), 3);
        let subjects: std::collections::HashSet<_> =
            graph.iter().map(|t| t.subject.clone()).collect();
        assert_eq!(subjects.len(), 3);
    }
}
