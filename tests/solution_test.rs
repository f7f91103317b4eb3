use minerva::model::{Literal, Term};
use minerva::solution::{SolutionMapping, SolutionSequence};

fn iri(value: &str) -> Term {
    Term::Iri(format!("http://example.org/{}", value))
}

fn mapping(pairs: &[(&str, Term)]) -> SolutionMapping {
    let mut m = SolutionMapping::new();
    for (variable, term) in pairs {
        m.bind(*variable, term.clone());
    }
    m
}

#[test]
fn test_compatibility_requires_identical_shared_bindings() {
    let a = mapping(&[("x", iri("1")), ("y", iri("2"))]);
    let b = mapping(&[("y", iri("2")), ("z", iri("3"))]);
    let c = mapping(&[("y", iri("other"))]);

    assert!(a.compatible(&b));
    assert!(!a.compatible(&c));
    // Disjoint domains are always compatible
    assert!(c.compatible(&mapping(&[("w", iri("4"))])));
}

#[test]
fn test_merge_unions_bindings() {
    let a = mapping(&[("x", iri("1"))]);
    let b = mapping(&[("y", iri("2"))]);

    let merged = a.merge(&b).unwrap();
    assert_eq!(merged.len(), 2);
    assert_eq!(merged.get("x"), Some(&iri("1")));
    assert_eq!(merged.get("y"), Some(&iri("2")));

    // Merge is symmetric and incompatibility yields None, never a partial
    // mapping
    assert_eq!(a.merge(&b), b.merge(&a));
    let conflicting = mapping(&[("x", iri("other"))]);
    assert_eq!(a.merge(&conflicting), None);
}

#[test]
fn test_empty_mapping_is_merge_identity() {
    let a = mapping(&[("x", iri("1"))]);
    assert_eq!(a.merge(&SolutionMapping::new()), Some(a.clone()));
}

#[test]
fn test_projection_drops_unlisted_and_ignores_unbound() {
    let a = mapping(&[("x", iri("1")), ("y", iri("2"))]);
    let projected = a.project(&["x".to_string(), "missing".to_string()]);
    assert_eq!(projected.len(), 1);
    assert_eq!(projected.get("x"), Some(&iri("1")));
    assert!(!projected.is_bound("missing"));
}

#[test]
fn test_sequence_preserves_duplicates_until_distinct() {
    let row = mapping(&[("x", Term::Literal(Literal::integer(1)))]);
    let sequence: SolutionSequence = vec![row.clone(), row.clone(), row.clone()].into();
    assert_eq!(sequence.len(), 3);

    let distinct = sequence.distinct();
    assert_eq!(distinct.len(), 1);

    // reduce never yields more mappings than distinct saw duplicates of
    let reduced = sequence.reduce();
    assert!(reduced.len() <= sequence.len());
    assert!(reduced.len() >= distinct.len());
}

#[test]
fn test_slice_beyond_length_is_empty() {
    let row = mapping(&[("x", Term::Literal(Literal::integer(1)))]);
    let sequence: SolutionSequence = vec![row].into();
    assert!(sequence.offset(Some(5)).is_empty());
    assert_eq!(sequence.limit(Some(5)).len(), 1);
    assert_eq!(sequence.limit(Some(0)).len(), 0);
}

#[test]
fn test_mapping_display_renders_solution_form() {
    let m = mapping(&[("x", iri("1"))]);
    assert_eq!(m.to_string(), "(solution (?x <http://example.org/1>))");
}
