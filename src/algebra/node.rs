use crate::expression::Expression;
use crate::model::Term;
use crate::store::TriplePattern;
use std::fmt;

/// A sort key for the Order operator.
///
/// A plain variable or expression key sorts ascending; `Desc` reverses the
/// per-key comparison.
#[derive(Debug, Clone, PartialEq)]
pub enum OrderKey {
    Asc(Expression),
    Desc(Expression),
}

impl OrderKey {
    pub fn expression(&self) -> &Expression {
        match self {
            OrderKey::Asc(expr) | OrderKey::Desc(expr) => expr,
        }
    }

    pub fn is_descending(&self) -> bool {
        matches!(self, OrderKey::Desc(_))
    }
}

/// A source declaration of the Dataset operator.
#[derive(Debug, Clone, PartialEq)]
pub enum DatasetSource {
    /// Loaded into the default graph
    Default(String),
    /// Loaded into the named graph of the same name
    Named(String),
}

/// An operator tree node.
///
/// The operator set is closed: execution and optimization dispatch with one
/// exhaustive match each, so adding an operator is a compile-time checked
/// change. Nodes are immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub enum Algebra {
    /// Basic graph pattern; the empty BGP is the join identity
    Bgp(Vec<TriplePattern>),
    Join(Box<Algebra>, Box<Algebra>),
    LeftJoin(Box<Algebra>, Box<Algebra>, Option<Expression>),
    Union(Box<Algebra>, Box<Algebra>),
    Filter(Expression, Box<Algebra>),
    /// Graph selection; the term is an IRI or a variable
    Graph(Term, Box<Algebra>),
    Dataset(Vec<DatasetSource>, Box<Algebra>),
    Project(Vec<String>, Box<Algebra>),
    Distinct(Box<Algebra>),
    Reduced(Box<Algebra>),
    OrderBy(Vec<OrderKey>, Box<Algebra>),
    /// Offset and limit; `None` is the unspecified sentinel
    Slice(Option<usize>, Option<usize>, Box<Algebra>),
    Construct(Vec<TriplePattern>, Box<Algebra>),
    /// Pass-through carrying a base IRI for relative-IRI resolution
    Base(String, Box<Algebra>),
    /// Pass-through carrying prefix declarations for rendering
    Prefix(Vec<(String, String)>, Box<Algebra>),
}

impl Algebra {
    /// The empty BGP, the identity pattern for join.
    pub fn unit() -> Self {
        Algebra::Bgp(Vec::new())
    }

    pub fn is_unit(&self) -> bool {
        matches!(self, Algebra::Bgp(patterns) if patterns.is_empty())
    }
}

fn write_slice_bound(f: &mut fmt::Formatter<'_>, bound: Option<usize>) -> fmt::Result {
    match bound {
        Some(value) => write!(f, "{}", value),
        None => write!(f, "_"),
    }
}

impl fmt::Display for Algebra {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Algebra::Bgp(patterns) => {
                write!(f, "(bgp")?;
                for pattern in patterns {
                    write!(f, " {}", pattern)?;
                }
                write!(f, ")")
            }
            Algebra::Join(left, right) => write!(f, "(join {} {})", left, right),
            Algebra::LeftJoin(left, right, None) => {
                write!(f, "(leftjoin {} {})", left, right)
            }
            Algebra::LeftJoin(left, right, Some(expr)) => {
                write!(f, "(leftjoin {} {} {})", left, right, expr)
            }
            Algebra::Union(left, right) => write!(f, "(union {} {})", left, right),
            Algebra::Filter(expr, pattern) => write!(f, "(filter {} {})", expr, pattern),
            Algebra::Graph(term, pattern) => write!(f, "(graph {} {})", term, pattern),
            Algebra::Dataset(sources, pattern) => {
                write!(f, "(dataset (")?;
                for (index, source) in sources.iter().enumerate() {
                    if index > 0 {
                        write!(f, " ")?;
                    }
                    match source {
                        DatasetSource::Default(iri) => write!(f, "<{}>", iri)?,
                        DatasetSource::Named(iri) => write!(f, "(named <{}>)", iri)?,
                    }
                }
                write!(f, ") {})", pattern)
            }
            Algebra::Project(variables, pattern) => {
                write!(f, "(project (")?;
                for (index, variable) in variables.iter().enumerate() {
                    if index > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "?{}", variable)?;
                }
                write!(f, ") {})", pattern)
            }
            Algebra::Distinct(pattern) => write!(f, "(distinct {})", pattern),
            Algebra::Reduced(pattern) => write!(f, "(reduced {})", pattern),
            Algebra::OrderBy(keys, pattern) => {
                write!(f, "(order (")?;
                for (index, key) in keys.iter().enumerate() {
                    if index > 0 {
                        write!(f, " ")?;
                    }
                    match key {
                        OrderKey::Asc(expr) => write!(f, "{}", expr)?,
                        OrderKey::Desc(expr) => write!(f, "(desc {})", expr)?,
                    }
                }
                write!(f, ") {})", pattern)
            }
            Algebra::Slice(offset, limit, pattern) => {
                write!(f, "(slice ")?;
                write_slice_bound(f, *offset)?;
                write!(f, " ")?;
                write_slice_bound(f, *limit)?;
                write!(f, " {})", pattern)
            }
            Algebra::Construct(template, pattern) => {
                write!(f, "(construct (")?;
                for (index, triple) in template.iter().enumerate() {
                    if index > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{}", triple)?;
                }
                write!(f, ") {})", pattern)
            }
            Algebra::Base(iri, pattern) => write!(f, "(base <{}> {})", iri, pattern),
            Algebra::Prefix(declarations, pattern) => {
                write!(f, "(prefix (")?;
                for (index, (prefix, namespace)) in declarations.iter().enumerate() {
                    if index > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "({} <{}>)", prefix, namespace)?;
                }
                write!(f, ") {})", pattern)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_bgp() {
        let pattern = Algebra::Bgp(vec![TriplePattern::new(
            Term::Variable("s".into()),
            Term::Iri("http://example.org/p".into()),
            Term::Variable("o".into()),
        )]);
        assert_eq!(
            pattern.to_string(),
            "(bgp (triple ?s <http://example.org/p> ?o))"
        );
        assert_eq!(Algebra::unit().to_string(), "(bgp)");
    }

    #[test]
    fn test_render_slice_sentinels() {
        let node = Algebra::Slice(None, Some(10), Box::new(Algebra::unit()));
        assert_eq!(node.to_string(), "(slice _ 10 (bgp))");
    }
}
