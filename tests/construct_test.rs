use minerva::algebra::builder::build_plan;
use minerva::algebra::executor::ExecContext;
use minerva::model::{Literal, Term};
use minerva::parsing::reader::read_form;
use minerva::store::{Graph, MemoryDataset, Triple};
use minerva::Error;
use std::collections::HashSet;

fn iri(value: &str) -> Term {
    Term::Iri(format!("http://example.org/{}", value))
}

fn dataset() -> MemoryDataset {
    let mut dataset = MemoryDataset::new();
    dataset.insert(Triple::new(iri("a"), iri("name"), Term::Literal(Literal::simple("Alice"))));
    dataset.insert(Triple::new(iri("b"), iri("name"), Term::Literal(Literal::simple("Bob"))));
    dataset.insert(Triple::new(iri("b"), iri("age"), Term::Literal(Literal::integer(30))));
    dataset
}

fn construct(plan: &str, dataset: &mut MemoryDataset) -> Result<Graph, Error> {
    let plan = build_plan(&read_form(plan)?)?;
    plan.execute(dataset, &ExecContext::new())?.into_graph()
}

#[test]
fn test_template_instantiated_per_solution() {
    let graph = construct(
        "(construct ((triple ?s <http://example.org/label> ?n)) \
         (bgp (triple ?s <http://example.org/name> ?n)))",
        &mut dataset(),
    )
    .unwrap();
    assert_eq!(graph.len(), 2);
    assert!(graph.contains(&Triple::new(
        iri("a"),
        iri("label"),
        Term::Literal(Literal::simple("Alice")),
    )));
}

#[test]
fn test_result_is_a_set() {
    let mut dataset = dataset();
    // Two solutions instantiate the identical ground triple; the graph
    // keeps one copy
    let graph = construct(
        "(construct ((triple <http://example.org/x> <http://example.org/p> \
         <http://example.org/y>)) (bgp (triple ?s <http://example.org/name> ?n)))",
        &mut dataset,
    )
    .unwrap();
    assert_eq!(graph.len(), 1);
}

#[test]
fn test_blank_labels_are_fresh_per_solution() {
    let graph = construct(
        "(construct ((triple _:p <http://example.org/calls> ?s) \
         (triple _:p <http://example.org/as> ?n)) \
         (bgp (triple ?s <http://example.org/name> ?n)))",
        &mut dataset(),
    )
    .unwrap();
    // 2 solutions x 2 template triples
    assert_eq!(graph.len(), 4);

    // Within a solution the label denotes one node; across solutions the
    // nodes differ
    let subjects: HashSet<_> = graph.iter().map(|t| t.subject.clone()).collect();
    assert_eq!(subjects.len(), 2);
    for subject in &subjects {
        let about: Vec<_> = graph.iter().filter(|t| &t.subject == subject).collect();
        assert_eq!(about.len(), 2);
    }
}

#[test]
fn test_unbound_variable_skips_the_triple() {
    // ?age is only bound for b; a's solution instantiates nothing
    let graph = construct(
        "(construct ((triple ?s <http://example.org/years> ?age)) \
         (leftjoin (bgp (triple ?s <http://example.org/name> ?n)) \
         (bgp (triple ?s <http://example.org/age> ?age))))",
        &mut dataset(),
    )
    .unwrap();
    assert_eq!(graph.len(), 1);
    assert_eq!(graph.iter().next().unwrap().subject, iri("b"));
}

#[test]
fn test_illegal_positions_skip_the_triple() {
    // A literal subject and a literal predicate are both illegal
    let graph = construct(
        "(construct ((triple ?n <http://example.org/p> ?s) (triple ?s ?n ?s)) \
         (bgp (triple ?s <http://example.org/name> ?n)))",
        &mut dataset(),
    )
    .unwrap();
    assert!(graph.is_empty());
}

#[test]
fn test_solutions_accessor_rejects_graph_results() {
    let plan = build_plan(
        &read_form(
            "(construct ((triple ?s <http://example.org/p> ?n)) \
             (bgp (triple ?s <http://example.org/name> ?n)))",
        )
        .unwrap(),
    )
    .unwrap();
    let result = plan.execute(&mut dataset(), &ExecContext::new()).unwrap();
    assert!(matches!(result.into_solutions(), Err(Error::Type(_))));
}
