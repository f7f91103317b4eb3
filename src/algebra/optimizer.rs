//! Algebra tree optimizer.
//!
//! A single bottom-up rewrite pass producing a new, semantically-equivalent
//! tree. The rules are deliberately small: drop identity operands, degrade
//! degenerate left joins, ground graph terms. Optimization is optional and
//! idempotent.

use crate::algebra::node::Algebra;
use crate::model::Term;

impl Algebra {
    /// Return a simplified copy of the tree.
    pub fn optimize(&self) -> Algebra {
        match self {
            Algebra::Bgp(patterns) => Algebra::Bgp(patterns.clone()),
            Algebra::Join(left, right) => {
                let left = left.optimize();
                let right = right.optimize();
                if left.is_unit() {
                    right
                } else if right.is_unit() {
                    left
                } else {
                    Algebra::Join(Box::new(left), Box::new(right))
                }
            }
            Algebra::LeftJoin(left, right, condition) => {
                let left = left.optimize();
                let right = right.optimize();
                // A unit operand degrades the left join to a filter over the
                // other side, or to the other side alone when unconditional
                if left.is_unit() || right.is_unit() {
                    let survivor = if left.is_unit() { right } else { left };
                    return match condition {
                        Some(expression) => {
                            Algebra::Filter(expression.clone(), Box::new(survivor))
                        }
                        None => survivor,
                    };
                }
                Algebra::LeftJoin(Box::new(left), Box::new(right), condition.clone())
            }
            Algebra::Union(left, right) => {
                let left = left.optimize();
                let right = right.optimize();
                if left.is_unit() {
                    right
                } else if right.is_unit() {
                    left
                } else {
                    Algebra::Union(Box::new(left), Box::new(right))
                }
            }
            Algebra::Filter(expression, pattern) => {
                Algebra::Filter(expression.clone(), Box::new(pattern.optimize()))
            }
            Algebra::Graph(term, pattern) => {
                // A literal graph term names the same graph its lexical form
                // does as an IRI; ground it here
                let term = match term {
                    Term::Literal(literal) => Term::Iri(literal.lexical().to_string()),
                    other => other.clone(),
                };
                Algebra::Graph(term, Box::new(pattern.optimize()))
            }
            Algebra::Dataset(sources, pattern) => {
                Algebra::Dataset(sources.clone(), Box::new(pattern.optimize()))
            }
            Algebra::Project(variables, pattern) => {
                Algebra::Project(variables.clone(), Box::new(pattern.optimize()))
            }
            Algebra::Distinct(pattern) => Algebra::Distinct(Box::new(pattern.optimize())),
            Algebra::Reduced(pattern) => Algebra::Reduced(Box::new(pattern.optimize())),
            Algebra::OrderBy(keys, pattern) => {
                Algebra::OrderBy(keys.clone(), Box::new(pattern.optimize()))
            }
            Algebra::Slice(offset, limit, pattern) => {
                Algebra::Slice(*offset, *limit, Box::new(pattern.optimize()))
            }
            Algebra::Construct(template, pattern) => {
                Algebra::Construct(template.clone(), Box::new(pattern.optimize()))
            }
            Algebra::Base(iri, pattern) => {
                Algebra::Base(iri.clone(), Box::new(pattern.optimize()))
            }
            Algebra::Prefix(declarations, pattern) => {
                Algebra::Prefix(declarations.clone(), Box::new(pattern.optimize()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algebra::builder::build_plan;
    use crate::parsing::reader::read_form;

    fn optimized(text: &str) -> String {
        build_plan(&read_form(text).unwrap()).unwrap().optimize().to_string()
    }

    #[test]
    fn test_join_unit_elimination() {
        assert_eq!(
            optimized("(join (bgp) (bgp (triple ?s ?p ?o)))"),
            "(bgp (triple ?s ?p ?o))"
        );
        assert_eq!(
            optimized("(join (bgp (triple ?s ?p ?o)) (bgp))"),
            "(bgp (triple ?s ?p ?o))"
        );
    }

    #[test]
    fn test_leftjoin_degrades_to_filter() {
        assert_eq!(
            optimized("(leftjoin (bgp (triple ?s ?p ?o)) (bgp) (bound ?o))"),
            "(filter (bound ?o) (bgp (triple ?s ?p ?o)))"
        );
        assert_eq!(
            optimized("(leftjoin (bgp (triple ?s ?p ?o)) (bgp))"),
            "(bgp (triple ?s ?p ?o))"
        );
    }

    #[test]
    fn test_rules_apply_recursively() {
        assert_eq!(
            optimized("(distinct (union (bgp) (bgp (triple ?s ?p ?o))))"),
            "(distinct (bgp (triple ?s ?p ?o)))"
        );
    }

    #[test]
    fn test_graph_literal_grounds_to_iri() {
        assert_eq!(
            optimized("(graph \"http://example.org/g\" (bgp (triple ?s ?p ?o)))"),
            "(graph <http://example.org/g> (bgp (triple ?s ?p ?o)))"
        );
    }

    #[test]
    fn test_optimize_is_idempotent() {
        let plan = build_plan(
            &read_form("(slice _ 5 (leftjoin (join (bgp) (bgp (triple ?s ?p ?o))) (bgp)))")
                .unwrap(),
        )
        .unwrap();
        let once = plan.optimize();
        assert_eq!(once.optimize(), once);
    }
}
