use crate::error::{Error, Result};
use crate::model::{xsd, ComparisonGroup, Literal, Numeric, Term};
use crate::solution::SolutionMapping;
use regex::Regex;
use std::cmp::Ordering;
use std::fmt;

/// Binary arithmetic operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithmeticOp {
    Add,
    Subtract,
    Multiply,
    Divide,
}

impl ArithmeticOp {
    pub fn symbol(self) -> &'static str {
        match self {
            ArithmeticOp::Add => "+",
            ArithmeticOp::Subtract => "-",
            ArithmeticOp::Multiply => "*",
            ArithmeticOp::Divide => "/",
        }
    }
}

/// Binary comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComparisonOp {
    Equal,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
}

impl ComparisonOp {
    pub fn symbol(self) -> &'static str {
        match self {
            ComparisonOp::Equal => "=",
            ComparisonOp::NotEqual => "!=",
            ComparisonOp::Less => "<",
            ComparisonOp::LessEqual => "<=",
            ComparisonOp::Greater => ">",
            ComparisonOp::GreaterEqual => ">=",
        }
    }
}

/// A scalar/boolean expression node.
///
/// The operator set is a closed enumeration; `evaluate` dispatches with one
/// exhaustive match, so a new operator is a new variant plus a new arm.
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    /// A constant term, or a variable resolved against the mapping
    Term(Term),
    Bound(String),
    IsIri(Box<Expression>),
    IsBlank(Box<Expression>),
    IsLiteral(Box<Expression>),
    Str(Box<Expression>),
    Lang(Box<Expression>),
    Datatype(Box<Expression>),
    LangMatches(Box<Expression>, Box<Expression>),
    Regex(Box<Expression>, Box<Expression>, Option<Box<Expression>>),
    SameTerm(Box<Expression>, Box<Expression>),
    Not(Box<Expression>),
    And(Box<Expression>, Box<Expression>),
    Or(Box<Expression>, Box<Expression>),
    UnaryPlus(Box<Expression>),
    UnaryMinus(Box<Expression>),
    Arithmetic(ArithmeticOp, Box<Expression>, Box<Expression>),
    Comparison(ComparisonOp, Box<Expression>, Box<Expression>),
}

fn boolean(value: bool) -> Term {
    Term::Literal(Literal::boolean(value))
}

impl Expression {
    /// Evaluate against a single solution mapping.
    pub fn evaluate(&self, mapping: &SolutionMapping) -> Result<Term> {
        match self {
            Expression::Term(Term::Variable(name)) => mapping
                .get(name)
                .cloned()
                .ok_or_else(|| Error::Argument(format!("unbound variable ?{}", name))),
            Expression::Term(term) => Ok(term.clone()),

            Expression::Bound(name) => Ok(boolean(mapping.is_bound(name))),

            Expression::IsIri(operand) => Ok(boolean(operand.evaluate(mapping)?.is_iri())),
            Expression::IsBlank(operand) => Ok(boolean(operand.evaluate(mapping)?.is_blank())),
            Expression::IsLiteral(operand) => Ok(boolean(operand.evaluate(mapping)?.is_literal())),

            Expression::Str(operand) => match operand.evaluate(mapping)? {
                Term::Literal(lit) => Ok(Term::Literal(Literal::simple(lit.lexical()))),
                Term::Iri(iri) => Ok(Term::Literal(Literal::simple(iri))),
                other => Err(Error::Type(format!("str() is undefined for {}", other))),
            },

            Expression::Lang(operand) => match operand.evaluate(mapping)? {
                Term::Literal(lit) => {
                    Ok(Term::Literal(Literal::simple(lit.language().unwrap_or(""))))
                }
                other => Err(Error::Argument(format!("lang() expects a literal, got {}", other))),
            },

            Expression::Datatype(operand) => match operand.evaluate(mapping)? {
                Term::Literal(lit) => match (lit.datatype(), lit.language()) {
                    (Some(datatype), _) => Ok(Term::Iri(datatype.to_string())),
                    (None, None) => Ok(Term::Iri(xsd::STRING.to_string())),
                    (None, Some(_)) => Err(Error::Type(
                        "datatype() is undefined for language-tagged literals".to_string(),
                    )),
                },
                other => {
                    Err(Error::Type(format!("datatype() expects a literal, got {}", other)))
                }
            },

            Expression::LangMatches(tag, range) => {
                let tag = plain_string(tag, mapping, "langMatches")?;
                let range = plain_string(range, mapping, "langMatches")?;
                Ok(boolean(lang_matches(&tag, &range)))
            }

            Expression::Regex(text, pattern, flags) => {
                let text = simple_string(text, mapping, "regex")?;
                let pattern = simple_string(pattern, mapping, "regex")?;
                let flags = match flags {
                    Some(expr) => simple_string(expr, mapping, "regex")?,
                    None => String::new(),
                };
                regex_match(&text, &pattern, &flags).map(boolean)
            }

            Expression::SameTerm(left, right) => {
                Ok(boolean(left.evaluate(mapping)? == right.evaluate(mapping)?))
            }

            Expression::Not(operand) => Ok(boolean(!ebv(operand, mapping)?)),

            // Both sides are evaluated unconditionally; an EBV error on
            // either side propagates rather than being short-circuited away.
            Expression::And(left, right) => {
                let left = ebv(left, mapping)?;
                let right = ebv(right, mapping)?;
                Ok(boolean(left && right))
            }
            Expression::Or(left, right) => {
                let left = ebv(left, mapping)?;
                let right = ebv(right, mapping)?;
                Ok(boolean(left || right))
            }

            // Unary plus returns the operand's value unchanged; unary minus
            // negates it. Both require a numeric operand.
            Expression::UnaryPlus(operand) => {
                let term = operand.evaluate(mapping)?;
                numeric_of(&term)?;
                Ok(term)
            }
            Expression::UnaryMinus(operand) => {
                let value = numeric_of(&operand.evaluate(mapping)?)?;
                Ok(Term::Literal(value.negate().to_literal()))
            }

            Expression::Arithmetic(op, left, right) => {
                let left = numeric_of(&left.evaluate(mapping)?)?;
                let right = numeric_of(&right.evaluate(mapping)?)?;
                arithmetic(*op, left, right).map(|value| Term::Literal(value.to_literal()))
            }

            Expression::Comparison(op, left, right) => {
                let left = left.evaluate(mapping)?;
                let right = right.evaluate(mapping)?;
                match op {
                    ComparisonOp::Equal => equals(&left, &right).map(boolean),
                    ComparisonOp::NotEqual => equals(&left, &right).map(|eq| boolean(!eq)),
                    _ => {
                        let ordering = value_compare(&left, &right)?;
                        let holds = match op {
                            ComparisonOp::Less => ordering == Ordering::Less,
                            ComparisonOp::LessEqual => ordering != Ordering::Greater,
                            ComparisonOp::Greater => ordering == Ordering::Greater,
                            ComparisonOp::GreaterEqual => ordering != Ordering::Less,
                            ComparisonOp::Equal | ComparisonOp::NotEqual => unreachable!(),
                        };
                        Ok(boolean(holds))
                    }
                }
            }
        }
    }

    /// Effective boolean value of this expression under `mapping`.
    pub fn effective_boolean_value(&self, mapping: &SolutionMapping) -> Result<bool> {
        ebv(self, mapping)
    }
}

fn ebv(expression: &Expression, mapping: &SolutionMapping) -> Result<bool> {
    expression.evaluate(mapping)?.effective_boolean_value()
}

fn numeric_of(term: &Term) -> Result<Numeric> {
    match term {
        Term::Literal(lit) => lit.as_numeric(),
        other => Err(Error::Type(format!("numeric operand required, got {}", other))),
    }
}

/// Evaluate an operand that must be a simple literal.
fn simple_string(
    expression: &Expression,
    mapping: &SolutionMapping,
    operator: &str,
) -> Result<String> {
    match expression.evaluate(mapping)? {
        Term::Literal(lit)
            if lit.datatype().is_none() && lit.language().is_none() =>
        {
            Ok(lit.lexical().to_string())
        }
        other => {
            Err(Error::Argument(format!("{}() expects a simple literal, got {}", operator, other)))
        }
    }
}

/// Evaluate an operand that must be a simple or language-tagged literal.
fn plain_string(
    expression: &Expression,
    mapping: &SolutionMapping,
    operator: &str,
) -> Result<String> {
    match expression.evaluate(mapping)? {
        Term::Literal(lit) if lit.datatype().is_none() => Ok(lit.lexical().to_string()),
        other => Err(Error::Argument(format!(
            "{}() expects a plain literal, got {}",
            operator, other
        ))),
    }
}

/// Basic language-range matching: exact (case-insensitive), the `*`
/// wildcard, or a `range-suffix` extension of the range.
fn lang_matches(tag: &str, range: &str) -> bool {
    let tag = tag.to_ascii_lowercase();
    let range = range.to_ascii_lowercase();
    if range == "*" {
        return !tag.is_empty();
    }
    tag == range || tag.starts_with(&format!("{}-", range))
}

/// Match `text` against `pattern` with the supported flag subset `i,m,x`.
fn regex_match(text: &str, pattern: &str, flags: &str) -> Result<bool> {
    let mut inline = String::new();
    for flag in flags.chars() {
        match flag {
            'i' | 'm' | 'x' => inline.push(flag),
            's' => {
                return Err(Error::NotImplemented(
                    "regex flag 's' (dot-all) is not supported".to_string(),
                ));
            }
            other => {
                return Err(Error::Argument(format!("unsupported regex flag {:?}", other)));
            }
        }
    }
    let full_pattern =
        if inline.is_empty() { pattern.to_string() } else { format!("(?{}){}", inline, pattern) };
    let compiled = Regex::new(&full_pattern)
        .map_err(|err| Error::Argument(format!("invalid regular expression: {}", err)))?;
    Ok(compiled.is_match(text))
}

fn arithmetic(op: ArithmeticOp, left: Numeric, right: Numeric) -> Result<Numeric> {
    let (left, right) = Numeric::promote_pair(left, right);
    match op {
        ArithmeticOp::Add | ArithmeticOp::Subtract | ArithmeticOp::Multiply => {
            match (left, right) {
                (Numeric::Integer(a), Numeric::Integer(b)) => {
                    let result = match op {
                        ArithmeticOp::Add => a.checked_add(b),
                        ArithmeticOp::Subtract => a.checked_sub(b),
                        ArithmeticOp::Multiply => a.checked_mul(b),
                        ArithmeticOp::Divide => unreachable!(),
                    };
                    result.map(Numeric::Integer).ok_or_else(|| {
                        Error::Type(format!("integer overflow in {} {} {}", a, op.symbol(), b))
                    })
                }
                (Numeric::Decimal(a), Numeric::Decimal(b)) => Ok(Numeric::Decimal(apply(op, a, b))),
                (Numeric::Float(a), Numeric::Float(b)) => {
                    Ok(Numeric::Float(apply(op, f64::from(a), f64::from(b)) as f32))
                }
                (Numeric::Double(a), Numeric::Double(b)) => Ok(Numeric::Double(apply(op, a, b))),
                _ => unreachable!("promote_pair yields matching sub-kinds"),
            }
        }
        ArithmeticOp::Divide => divide(left, right),
    }
}

fn apply(op: ArithmeticOp, a: f64, b: f64) -> f64 {
    match op {
        ArithmeticOp::Add => a + b,
        ArithmeticOp::Subtract => a - b,
        ArithmeticOp::Multiply => a * b,
        ArithmeticOp::Divide => a / b,
    }
}

/// Division: integer ÷ integer yields a decimal; integer and decimal
/// division by zero is a hard failure; float/double follow IEEE semantics.
fn divide(left: Numeric, right: Numeric) -> Result<Numeric> {
    match (left, right) {
        (Numeric::Integer(a), Numeric::Integer(b)) => {
            if b == 0 {
                Err(Error::ZeroDivision(format!("{} / 0", a)))
            } else {
                Ok(Numeric::Decimal(a as f64 / b as f64))
            }
        }
        (Numeric::Decimal(a), Numeric::Decimal(b)) => {
            if b == 0.0 {
                Err(Error::ZeroDivision(format!("{} / 0", a)))
            } else {
                Ok(Numeric::Decimal(a / b))
            }
        }
        (Numeric::Float(a), Numeric::Float(b)) => Ok(Numeric::Float(a / b)),
        (Numeric::Double(a), Numeric::Double(b)) => Ok(Numeric::Double(a / b)),
        _ => unreachable!("promote_pair yields matching sub-kinds"),
    }
}

/// SPARQL `=` over two ground terms.
///
/// 1. Literals in the same comparison group compare by value.
/// 2. Literals outside a shared group compare by syntactic identity, but
///    only a positive outcome is conclusive.
/// 3. IRIs and blank nodes compare by identity within their category.
/// 4. Everything else is a type error, never a silent false.
pub fn equals(left: &Term, right: &Term) -> Result<bool> {
    match (left, right) {
        (Term::Literal(a), Term::Literal(b)) => {
            match (a.comparison_group(), b.comparison_group()) {
                (Some(group_a), Some(group_b)) if group_a == group_b => {
                    match group_value_equals(group_a, a, b) {
                        Ok(result) => Ok(result),
                        // Malformed lexical forms fall back to rule 2
                        Err(_) if a == b => Ok(true),
                        Err(err) => Err(err),
                    }
                }
                _ if a == b => Ok(true),
                _ => Err(Error::Type(format!(
                    "unable to determine equivalence of {} and {}",
                    left, right
                ))),
            }
        }
        (Term::Iri(a), Term::Iri(b)) => Ok(a == b),
        (Term::BlankNode(a), Term::BlankNode(b)) => Ok(a == b),
        _ => Err(Error::Type(format!(
            "unable to determine equivalence of {} and {}",
            left, right
        ))),
    }
}

fn group_value_equals(group: ComparisonGroup, a: &Literal, b: &Literal) -> Result<bool> {
    match group {
        ComparisonGroup::Stringy => Ok(a.lexical() == b.lexical()),
        ComparisonGroup::Numeric => Ok(Numeric::equals(a.as_numeric()?, b.as_numeric()?)),
        ComparisonGroup::Boolean => Ok(a.as_bool()? == b.as_bool()?),
        ComparisonGroup::DateTime => Ok(a.as_date_time()? == b.as_date_time()?),
    }
}

/// Value comparison inside a shared comparison group, used by the relational
/// operators. Terms outside a shared group are a type error.
pub fn value_compare(left: &Term, right: &Term) -> Result<Ordering> {
    match (left, right) {
        (Term::Literal(a), Term::Literal(b)) => {
            match (a.comparison_group(), b.comparison_group()) {
                (Some(group_a), Some(group_b)) if group_a == group_b => {
                    group_value_compare(group_a, a, b)
                }
                _ => Err(Error::Type(format!("{} and {} are not comparable", left, right))),
            }
        }
        _ => Err(Error::Type(format!("{} and {} are not comparable", left, right))),
    }
}

fn group_value_compare(group: ComparisonGroup, a: &Literal, b: &Literal) -> Result<Ordering> {
    match group {
        ComparisonGroup::Stringy => Ok(a.lexical().cmp(b.lexical())),
        ComparisonGroup::Numeric => Ok(Numeric::compare(a.as_numeric()?, b.as_numeric()?)),
        ComparisonGroup::Boolean => Ok(a.as_bool()?.cmp(&b.as_bool()?)),
        ComparisonGroup::DateTime => Ok(a.as_date_time()?.cmp(&b.as_date_time()?)),
    }
}

/// Total order over optional terms, used only by ORDER BY.
///
/// unbound < blank node < IRI < literal. Blank nodes have no defined order
/// among themselves and compare equal; IRIs order by their string form;
/// literals in mismatched comparison groups are a type error, which ORDER BY
/// degrades instead of propagating.
pub fn compare_terms(left: Option<&Term>, right: Option<&Term>) -> Result<Ordering> {
    let (left, right) = match (left, right) {
        (None, None) => return Ok(Ordering::Equal),
        (None, Some(_)) => return Ok(Ordering::Less),
        (Some(_), None) => return Ok(Ordering::Greater),
        (Some(a), Some(b)) => (a, b),
    };
    let rank = |term: &Term| -> Result<u8> {
        match term {
            Term::BlankNode(_) => Ok(0),
            Term::Iri(_) => Ok(1),
            Term::Literal(_) => Ok(2),
            Term::Variable(name) => {
                Err(Error::Type(format!("cannot order unresolved variable ?{}", name)))
            }
        }
    };
    let (left_rank, right_rank) = (rank(left)?, rank(right)?);
    if left_rank != right_rank {
        return Ok(left_rank.cmp(&right_rank));
    }
    match (left, right) {
        (Term::BlankNode(_), Term::BlankNode(_)) => Ok(Ordering::Equal),
        (Term::Iri(a), Term::Iri(b)) => Ok(a.cmp(b)),
        (Term::Literal(_), Term::Literal(_)) => value_compare(left, right),
        _ => unreachable!("ranks matched above"),
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Term(term) => write!(f, "{}", term),
            Expression::Bound(name) => write!(f, "(bound ?{})", name),
            Expression::IsIri(e) => write!(f, "(isIRI {})", e),
            Expression::IsBlank(e) => write!(f, "(isBlank {})", e),
            Expression::IsLiteral(e) => write!(f, "(isLiteral {})", e),
            Expression::Str(e) => write!(f, "(str {})", e),
            Expression::Lang(e) => write!(f, "(lang {})", e),
            Expression::Datatype(e) => write!(f, "(datatype {})", e),
            Expression::LangMatches(a, b) => write!(f, "(langMatches {} {})", a, b),
            Expression::Regex(a, b, None) => write!(f, "(regex {} {})", a, b),
            Expression::Regex(a, b, Some(c)) => write!(f, "(regex {} {} {})", a, b, c),
            Expression::SameTerm(a, b) => write!(f, "(sameTerm {} {})", a, b),
            Expression::Not(e) => write!(f, "(! {})", e),
            Expression::And(a, b) => write!(f, "(&& {} {})", a, b),
            Expression::Or(a, b) => write!(f, "(|| {} {})", a, b),
            Expression::UnaryPlus(e) => write!(f, "(+ {})", e),
            Expression::UnaryMinus(e) => write!(f, "(- {})", e),
            Expression::Arithmetic(op, a, b) => write!(f, "({} {} {})", op.symbol(), a, b),
            Expression::Comparison(op, a, b) => write!(f, "({} {} {})", op.symbol(), a, b),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::LiteralKind;

    fn lit(i: i64) -> Expression {
        Expression::Term(Term::Literal(Literal::integer(i)))
    }

    fn empty() -> SolutionMapping {
        SolutionMapping::new()
    }

    #[test]
    fn test_integer_division_yields_decimal() {
        let expr = Expression::Arithmetic(ArithmeticOp::Divide, Box::new(lit(7)), Box::new(lit(2)));
        let result = expr.evaluate(&empty()).unwrap();
        let literal = result.as_literal().unwrap();
        assert_eq!(literal.kind(), LiteralKind::Decimal);
        assert_eq!(literal.lexical(), "3.5");
    }

    #[test]
    fn test_division_by_zero_is_fatal() {
        let expr = Expression::Arithmetic(ArithmeticOp::Divide, Box::new(lit(1)), Box::new(lit(0)));
        assert!(matches!(expr.evaluate(&empty()), Err(Error::ZeroDivision(_))));
    }

    #[test]
    fn test_unary_plus_returns_operand_unchanged() {
        let expr = Expression::UnaryPlus(Box::new(lit(5)));
        assert_eq!(expr.evaluate(&empty()).unwrap(), Term::Literal(Literal::integer(5)));
        let expr = Expression::UnaryMinus(Box::new(lit(5)));
        assert_eq!(expr.evaluate(&empty()).unwrap(), Term::Literal(Literal::integer(-5)));
    }

    #[test]
    fn test_equality_type_error_on_mixed_categories() {
        let left = Term::Literal(Literal::integer(1));
        let right = Term::Iri("http://example.org/x".to_string());
        assert!(matches!(equals(&left, &right), Err(Error::Type(_))));
    }

    #[test]
    fn test_equality_syntactic_fallback() {
        // Same unrecognized datatype, identical lexical form: rule 2
        let a = Term::Literal(Literal::typed("x", "http://example.org/dt"));
        let b = Term::Literal(Literal::typed("x", "http://example.org/dt"));
        assert!(equals(&a, &b).unwrap());
        // Different unrecognized datatypes: rule 4
        let c = Term::Literal(Literal::typed("x", "http://example.org/other"));
        assert!(matches!(equals(&a, &c), Err(Error::Type(_))));
    }

    #[test]
    fn test_regex_flags() {
        assert!(regex_match("Hello", "hello", "i").unwrap());
        assert!(!regex_match("Hello", "hello", "").unwrap());
        assert!(matches!(regex_match("a", "a", "s"), Err(Error::NotImplemented(_))));
        assert!(matches!(regex_match("a", "a", "q"), Err(Error::Argument(_))));
    }

    #[test]
    fn test_lang_matches() {
        assert!(lang_matches("en-US", "en"));
        assert!(lang_matches("EN", "en"));
        assert!(lang_matches("fr", "*"));
        assert!(!lang_matches("", "*"));
        assert!(!lang_matches("fr", "en"));
    }

    #[test]
    fn test_and_propagates_type_errors() {
        let iri = Expression::Term(Term::Iri("http://example.org/x".to_string()));
        let truthy = Expression::Term(Term::Literal(Literal::boolean(true)));
        let expr = Expression::And(Box::new(truthy), Box::new(iri));
        assert!(matches!(expr.evaluate(&empty()), Err(Error::Type(_))));
    }

    #[test]
    fn test_total_order_across_categories() {
        let blank = Term::BlankNode("b".to_string());
        let iri = Term::Iri("http://example.org/x".to_string());
        let literal = Term::Literal(Literal::integer(1));
        assert_eq!(compare_terms(None, Some(&blank)).unwrap(), Ordering::Less);
        assert_eq!(compare_terms(Some(&blank), Some(&iri)).unwrap(), Ordering::Less);
        assert_eq!(compare_terms(Some(&iri), Some(&literal)).unwrap(), Ordering::Less);
        let other_blank = Term::BlankNode("c".to_string());
        assert_eq!(compare_terms(Some(&blank), Some(&other_blank)).unwrap(), Ordering::Equal);
    }
}
