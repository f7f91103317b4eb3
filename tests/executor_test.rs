use minerva::algebra::builder::build_plan;
use minerva::algebra::executor::ExecContext;
use minerva::model::{Literal, Term};
use minerva::parsing::reader::read_form;
use minerva::solution::SolutionSequence;
use minerva::store::{MemoryDataset, Triple};
use minerva::Error;

fn iri(value: &str) -> Term {
    Term::Iri(format!("http://example.org/{}", value))
}

fn int(value: i64) -> Term {
    Term::Literal(Literal::integer(value))
}

/// Three subjects with values 1, 2, 3 and names for two of them.
fn dataset() -> MemoryDataset {
    let mut dataset = MemoryDataset::new();
    for (subject, value) in [("a", 1), ("b", 2), ("c", 3)] {
        dataset.insert(Triple::new(iri(subject), iri("value"), int(value)));
    }
    dataset.insert(Triple::new(iri("a"), iri("name"), Term::Literal(Literal::simple("Alice"))));
    dataset.insert(Triple::new(iri("b"), iri("name"), Term::Literal(Literal::simple("Bob"))));
    dataset
}

fn run_on(plan: &str, dataset: &mut MemoryDataset) -> Result<SolutionSequence, Error> {
    let plan = build_plan(&read_form(plan)?)?;
    plan.execute(dataset, &ExecContext::new())?.into_solutions()
}

fn run(plan: &str) -> SolutionSequence {
    run_on(plan, &mut dataset()).unwrap()
}

#[test]
fn test_bgp_matches_and_binds() {
    let solutions = run("(bgp (triple ?s <http://example.org/value> ?o))");
    assert_eq!(solutions.len(), 3);
    assert!(solutions.iter().all(|m| m.is_bound("s") && m.is_bound("o")));
}

#[test]
fn test_bgp_joins_its_own_patterns() {
    // Both patterns share ?s: only a and b have both value and name
    let solutions = run(
        "(bgp (triple ?s <http://example.org/value> ?v) \
         (triple ?s <http://example.org/name> ?n))",
    );
    assert_eq!(solutions.len(), 2);
}

#[test]
fn test_repeated_variable_in_one_pattern() {
    let mut dataset = MemoryDataset::new();
    dataset.insert(Triple::new(iri("x"), iri("p"), iri("x")));
    dataset.insert(Triple::new(iri("x"), iri("p"), iri("y")));
    // ?s in both positions: only the reflexive triple matches
    let solutions = run_on("(bgp (triple ?s <http://example.org/p> ?s))", &mut dataset).unwrap();
    assert_eq!(solutions.len(), 1);
}

#[test]
fn test_join_cardinality_is_multiplicative() {
    let mut dataset = MemoryDataset::new();
    for i in 0..2 {
        dataset.insert(Triple::new(iri(&format!("s{}", i)), iri("p"), int(i)));
        dataset.insert(Triple::new(iri(&format!("t{}", i)), iri("q"), int(i)));
    }
    // Disjoint variable sets: 2 x 2 = 4 solutions
    let solutions = run_on(
        "(join (bgp (triple ?a <http://example.org/p> ?x)) \
         (bgp (triple ?b <http://example.org/q> ?y)))",
        &mut dataset,
    )
    .unwrap();
    assert_eq!(solutions.len(), 4);
}

#[test]
fn test_filter_keeps_ebv_true_rows() {
    let solutions = run(
        "(filter (< ?o 3) (bgp (triple ?s <http://example.org/value> ?o)))",
    );
    assert_eq!(solutions.len(), 2);
    assert!(solutions.iter().all(|m| m.get("o") != Some(&int(3))));
}

#[test]
fn test_filter_contains_type_errors() {
    let mut dataset = dataset();
    // A non-numeric value: comparing it is a contained type error, so the
    // row is dropped rather than the query failing
    dataset.insert(Triple::new(iri("d"), iri("value"), iri("weird")));
    let solutions = run_on(
        "(filter (< ?o 3) (bgp (triple ?s <http://example.org/value> ?o)))",
        &mut dataset,
    )
    .unwrap();
    assert_eq!(solutions.len(), 2);
}

#[test]
fn test_filter_division_by_zero_aborts() {
    let result = run_on(
        "(filter (< (/ 1 0) 3) (bgp (triple ?s <http://example.org/value> ?o)))",
        &mut dataset(),
    );
    assert!(matches!(result, Err(Error::ZeroDivision(_))));
}

#[test]
fn test_leftjoin_keeps_unmatched_left_rows() {
    // c has a value but no name: it survives with ?n unbound
    let solutions = run(
        "(leftjoin (bgp (triple ?s <http://example.org/value> ?v)) \
         (bgp (triple ?s <http://example.org/name> ?n)))",
    );
    assert_eq!(solutions.len(), 3);
    let unmatched: Vec<_> = solutions.iter().filter(|m| !m.is_bound("n")).collect();
    assert_eq!(unmatched.len(), 1);
    assert_eq!(unmatched[0].get("s"), Some(&iri("c")));
}

#[test]
fn test_leftjoin_condition_rejects_extension_but_keeps_left() {
    // The condition fails for b (value 2 is not < 2), so b appears
    // unextended rather than disappearing
    let solutions = run(
        "(leftjoin (bgp (triple ?s <http://example.org/name> ?n)) \
         (bgp (triple ?s <http://example.org/value> ?v)) (< ?v 2))",
    );
    assert_eq!(solutions.len(), 2);
    let bob = solutions
        .iter()
        .find(|m| m.get("n") == Some(&Term::Literal(Literal::simple("Bob"))))
        .unwrap();
    assert!(!bob.is_bound("v"));
}

#[test]
fn test_leftjoin_disjoint_domains_with_condition() {
    let mut dataset = MemoryDataset::new();
    dataset.insert(Triple::new(iri("x"), iri("p"), int(1)));
    dataset.insert(Triple::new(iri("x"), iri("p"), int(2)));
    dataset.insert(Triple::new(iri("y"), iri("q"), int(3)));
    dataset.insert(Triple::new(iri("y"), iri("q"), int(4)));

    // No shared variables, so every pair merges. The condition only holds
    // for ?v = 2: that left row joins with both right rows, the ?v = 1 row
    // survives bare. 2 merged + 1 bare = 3.
    let solutions = run_on(
        "(leftjoin (bgp (triple ?s <http://example.org/p> ?v)) \
         (bgp (triple ?t <http://example.org/q> ?w)) (= ?v 2))",
        &mut dataset,
    )
    .unwrap();
    assert_eq!(solutions.len(), 3);
    let merged: Vec<_> = solutions.iter().filter(|m| m.is_bound("w")).collect();
    assert_eq!(merged.len(), 2);
    assert!(merged.iter().all(|m| m.get("v") == Some(&int(2))));
    let bare: Vec<_> = solutions.iter().filter(|m| !m.is_bound("w")).collect();
    assert_eq!(bare.len(), 1);
    assert_eq!(bare[0].get("v"), Some(&int(1)));
}

#[test]
fn test_union_concatenates_bags() {
    let solutions = run(
        "(union (bgp (triple ?s <http://example.org/value> ?o)) \
         (bgp (triple ?s <http://example.org/value> ?o)))",
    );
    // Duplicates survive: 3 + 3
    assert_eq!(solutions.len(), 6);
    assert_eq!(solutions.distinct().len(), 3);
}

#[test]
fn test_project_narrows_bindings() {
    let solutions = run("(project (?s) (bgp (triple ?s <http://example.org/value> ?o)))");
    assert!(solutions.iter().all(|m| m.is_bound("s") && !m.is_bound("o")));
}

#[test]
fn test_order_slice_pagination() {
    let solutions = run(
        "(slice 1 1 (order (?o) (bgp (triple ?s <http://example.org/value> ?o))))",
    );
    assert_eq!(solutions.len(), 1);
    assert_eq!(solutions.iter().next().unwrap().get("o"), Some(&int(2)));
}

#[test]
fn test_order_descending() {
    let solutions = run(
        "(order ((desc ?o)) (bgp (triple ?s <http://example.org/value> ?o)))",
    );
    let values: Vec<_> = solutions.iter().map(|m| m.get("o").cloned().unwrap()).collect();
    assert_eq!(values, vec![int(3), int(2), int(1)]);
}

#[test]
fn test_graph_selects_named_graph() {
    let mut dataset = MemoryDataset::new();
    dataset.insert(Triple::new(iri("s"), iri("p"), int(0)));
    dataset.insert_named("http://example.org/g1", Triple::new(iri("s"), iri("p"), int(1)));
    dataset.insert_named("http://example.org/g2", Triple::new(iri("s"), iri("p"), int(2)));

    // Default graph only
    let solutions = run_on("(bgp (triple ?s ?p ?o))", &mut dataset).unwrap();
    assert_eq!(solutions.len(), 1);

    // A named graph by IRI
    let solutions = run_on(
        "(graph <http://example.org/g1> (bgp (triple ?s ?p ?o)))",
        &mut dataset,
    )
    .unwrap();
    assert_eq!(solutions.len(), 1);
    assert_eq!(solutions.iter().next().unwrap().get("o"), Some(&int(1)));

    // A graph variable enumerates every named graph and binds it
    let solutions = run_on("(graph ?g (bgp (triple ?s ?p ?o)))", &mut dataset).unwrap();
    assert_eq!(solutions.len(), 2);
    assert!(solutions.iter().all(|m| m.is_bound("g")));
}

#[test]
fn test_graph_variable_conflict_drops_solution() {
    let mut dataset = MemoryDataset::new();
    dataset.insert_named(
        "http://example.org/g1",
        Triple::new(iri("s"), iri("p"), iri("g2")),
    );
    // ?g is bound to the object inside and to the graph name outside; they
    // disagree, so no solution survives
    let solutions = run_on("(graph ?g (bgp (triple ?s ?p ?g)))", &mut dataset).unwrap();
    assert!(solutions.is_empty());
}

#[test]
fn test_dataset_loads_sources() {
    let dir = std::env::temp_dir().join("minerva_executor_test");
    std::fs::create_dir_all(&dir).unwrap();
    let default_path = dir.join("default.nt");
    let named_path = dir.join("named.nt");
    std::fs::write(
        &default_path,
        "<http://example.org/a> <http://example.org/p> \"1\"^^<http://www.w3.org/2001/XMLSchema#integer> .\n",
    )
    .unwrap();
    std::fs::write(
        &named_path,
        "<http://example.org/b> <http://example.org/p> \"2\"^^<http://www.w3.org/2001/XMLSchema#integer> .\n",
    )
    .unwrap();

    let mut dataset = MemoryDataset::new();
    let plan = format!(
        "(dataset (<file://{default}> (named <file://{named}>)) (bgp (triple ?s ?p ?o)))",
        default = default_path.display(),
        named = named_path.display(),
    );
    // Only the default-graph source is visible to the default active graph
    let solutions = run_on(&plan, &mut dataset).unwrap();
    assert_eq!(solutions.len(), 1);
    assert_eq!(solutions.iter().next().unwrap().get("s"), Some(&iri("a")));

    // The named source landed under its own graph name
    let named_graph = format!("file://{}", named_path.display());
    assert_eq!(dataset.named_graph(&named_graph).map(|g| g.len()), Some(1));
}

#[test]
fn test_missing_dataset_source_is_fatal() {
    let result = run_on(
        "(dataset (<file:///nonexistent/minerva.nt>) (bgp (triple ?s ?p ?o)))",
        &mut MemoryDataset::new(),
    );
    assert!(matches!(result, Err(Error::Load(_))));
}

#[test]
fn test_optimized_plan_agrees_with_unoptimized() {
    let text = "(slice _ 2 (order (?o) (leftjoin \
                (join (bgp) (bgp (triple ?s <http://example.org/value> ?o))) (bgp))))";
    let plan = build_plan(&read_form(text).unwrap()).unwrap();
    let plain = plan
        .execute(&mut dataset(), &ExecContext::new())
        .unwrap()
        .into_solutions()
        .unwrap();
    let optimized = plan
        .optimize()
        .execute(&mut dataset(), &ExecContext::new())
        .unwrap()
        .into_solutions()
        .unwrap();
    assert_eq!(plain, optimized);
}
