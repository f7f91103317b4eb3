//! Algebra builder: nested list/atom forms → validated operator trees.
//!
//! Dispatch is by operator symbol and arity. Plain booleans, numbers,
//! strings and timestamps coerce to the corresponding literal; terms,
//! variables and nested forms pass through recursively. Prefix and base-IRI
//! resolution travels in an explicit [`BuildContext`], never in ambient
//! state.

use crate::algebra::node::{Algebra, DatasetSource, OrderKey};
use crate::error::{Error, Result};
use crate::expression::{ArithmeticOp, ComparisonOp, Expression};
use crate::model::{xsd, Literal, Term};
use crate::parsing::reader::Form;
use crate::store::TriplePattern;
use std::collections::HashMap;

/// Prefix and base-IRI resolution context threaded through the build.
#[derive(Debug, Clone, Default)]
pub struct BuildContext {
    base: Option<String>,
    prefixes: HashMap<String, String>,
}

impl BuildContext {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_base(&self, base: &str) -> Self {
        let mut context = self.clone();
        context.base = Some(base.to_string());
        context
    }

    fn with_prefixes(&self, declarations: &[(String, String)]) -> Self {
        let mut context = self.clone();
        for (prefix, namespace) in declarations {
            context.prefixes.insert(prefix.clone(), namespace.clone());
        }
        context
    }

    /// Resolve an IRI against the base, if any. Absolute IRIs pass through.
    pub fn resolve(&self, iri: &str) -> String {
        if is_absolute_iri(iri) {
            return iri.to_string();
        }
        match &self.base {
            Some(base) if base.ends_with('/') || base.ends_with('#') => {
                format!("{}{}", base, iri)
            }
            Some(base) => format!("{}/{}", base, iri),
            None => iri.to_string(),
        }
    }

    fn expand_prefixed(&self, symbol: &str) -> Option<String> {
        let colon = symbol.find(':')?;
        let (prefix, local) = symbol.split_at(colon + 1);
        let namespace = self.prefixes.get(prefix)?;
        Some(format!("{}{}", namespace, local))
    }
}

fn is_absolute_iri(iri: &str) -> bool {
    let Some(colon) = iri.find(':') else {
        return false;
    };
    let scheme = &iri[..colon];
    let mut chars = scheme.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

/// Heuristic for bare ISO 8601 timestamps, which coerce to xsd:dateTime.
fn looks_like_date_time(symbol: &str) -> bool {
    let bytes = symbol.as_bytes();
    bytes.len() >= 11
        && bytes[..4].iter().all(u8::is_ascii_digit)
        && bytes[4] == b'-'
        && bytes[7] == b'-'
        && bytes[10] == b'T'
}

/// Build a plan from a top-level form with an empty context.
pub fn build_plan(form: &Form) -> Result<Algebra> {
    build_algebra(form, &BuildContext::new())
}

fn operator_and_args<'a>(form: &'a Form) -> Result<(&'a str, &'a [Form])> {
    let items = form
        .as_list()
        .ok_or_else(|| Error::Type(format!("expected an operator form, got {}", form)))?;
    let Some((head, args)) = items.split_first() else {
        return Err(Error::Argument("empty operator form".to_string()));
    };
    let name = head
        .as_symbol()
        .ok_or_else(|| Error::Type(format!("operator name must be a symbol, got {}", head)))?;
    Ok((name, args))
}

fn expect_arity(operator: &str, args: &[Form], arity: usize) -> Result<()> {
    if args.len() == arity {
        Ok(())
    } else {
        Err(Error::Argument(format!(
            "{} expects {} operand(s), got {}",
            operator,
            arity,
            args.len()
        )))
    }
}

/// Build a graph-pattern operator node.
pub fn build_algebra(form: &Form, context: &BuildContext) -> Result<Algebra> {
    let (operator, args) = operator_and_args(form)?;
    match operator {
        "bgp" => {
            let patterns = args
                .iter()
                .map(|arg| build_triple(arg, context))
                .collect::<Result<Vec<_>>>()?;
            Ok(Algebra::Bgp(patterns))
        }
        // A bare triple is a one-pattern BGP
        "triple" => Ok(Algebra::Bgp(vec![build_triple(form, context)?])),
        "join" => {
            expect_arity(operator, args, 2)?;
            Ok(Algebra::Join(
                Box::new(build_algebra(&args[0], context)?),
                Box::new(build_algebra(&args[1], context)?),
            ))
        }
        "union" => {
            expect_arity(operator, args, 2)?;
            Ok(Algebra::Union(
                Box::new(build_algebra(&args[0], context)?),
                Box::new(build_algebra(&args[1], context)?),
            ))
        }
        "leftjoin" => {
            if args.len() != 2 && args.len() != 3 {
                return Err(Error::Argument(format!(
                    "leftjoin expects 2 or 3 operands, got {}",
                    args.len()
                )));
            }
            let expression = match args.get(2) {
                Some(arg) => Some(build_expression(arg, context)?),
                None => None,
            };
            Ok(Algebra::LeftJoin(
                Box::new(build_algebra(&args[0], context)?),
                Box::new(build_algebra(&args[1], context)?),
                expression,
            ))
        }
        "filter" => {
            expect_arity(operator, args, 2)?;
            Ok(Algebra::Filter(
                build_expression(&args[0], context)?,
                Box::new(build_algebra(&args[1], context)?),
            ))
        }
        "graph" => {
            expect_arity(operator, args, 2)?;
            let term = build_term(&args[0], context)?;
            match &term {
                Term::Iri(_) | Term::Variable(_) | Term::Literal(_) => {}
                other => {
                    return Err(Error::Type(format!("invalid graph term {}", other)));
                }
            }
            Ok(Algebra::Graph(term, Box::new(build_algebra(&args[1], context)?)))
        }
        "dataset" => {
            expect_arity(operator, args, 2)?;
            let sources = build_sources(&args[0], context)?;
            Ok(Algebra::Dataset(sources, Box::new(build_algebra(&args[1], context)?)))
        }
        "project" => {
            expect_arity(operator, args, 2)?;
            let variables = build_variable_list(&args[0])?;
            Ok(Algebra::Project(variables, Box::new(build_algebra(&args[1], context)?)))
        }
        "distinct" => {
            expect_arity(operator, args, 1)?;
            Ok(Algebra::Distinct(Box::new(build_algebra(&args[0], context)?)))
        }
        "reduced" => {
            expect_arity(operator, args, 1)?;
            Ok(Algebra::Reduced(Box::new(build_algebra(&args[0], context)?)))
        }
        "order" => {
            expect_arity(operator, args, 2)?;
            let keys = build_order_keys(&args[0], context)?;
            Ok(Algebra::OrderBy(keys, Box::new(build_algebra(&args[1], context)?)))
        }
        "slice" => {
            expect_arity(operator, args, 3)?;
            let offset = build_slice_bound("slice offset", &args[0])?;
            let limit = build_slice_bound("slice limit", &args[1])?;
            Ok(Algebra::Slice(offset, limit, Box::new(build_algebra(&args[2], context)?)))
        }
        "construct" => {
            expect_arity(operator, args, 2)?;
            let template = args[0]
                .as_list()
                .ok_or_else(|| {
                    Error::Type(format!("construct template must be a list, got {}", args[0]))
                })?
                .iter()
                .map(|item| build_triple(item, context))
                .collect::<Result<Vec<_>>>()?;
            Ok(Algebra::Construct(template, Box::new(build_algebra(&args[1], context)?)))
        }
        "base" => {
            expect_arity(operator, args, 2)?;
            let Form::Term(Term::Iri(iri)) = &args[0] else {
                return Err(Error::Type(format!("base expects an IRI, got {}", args[0])));
            };
            let inner_context = context.with_base(iri);
            Ok(Algebra::Base(iri.clone(), Box::new(build_algebra(&args[1], &inner_context)?)))
        }
        "prefix" => {
            expect_arity(operator, args, 2)?;
            let declarations = build_prefix_declarations(&args[0])?;
            let inner_context = context.with_prefixes(&declarations);
            Ok(Algebra::Prefix(declarations, Box::new(build_algebra(&args[1], &inner_context)?)))
        }
        unknown => Err(Error::Argument(format!("unknown operator {:?}", unknown))),
    }
}

/// Build an expression operator node.
pub fn build_expression(form: &Form, context: &BuildContext) -> Result<Expression> {
    if form.as_list().is_none() {
        return Ok(Expression::Term(build_term(form, context)?));
    }
    let (operator, args) = operator_and_args(form)?;
    let unary = |args: &[Form]| -> Result<Box<Expression>> {
        expect_arity(operator, args, 1)?;
        Ok(Box::new(build_expression(&args[0], context)?))
    };
    let binary = |args: &[Form]| -> Result<(Box<Expression>, Box<Expression>)> {
        expect_arity(operator, args, 2)?;
        Ok((
            Box::new(build_expression(&args[0], context)?),
            Box::new(build_expression(&args[1], context)?),
        ))
    };
    match operator {
        "bound" => {
            expect_arity(operator, args, 1)?;
            match &args[0] {
                Form::Term(Term::Variable(name)) => Ok(Expression::Bound(name.clone())),
                other => {
                    Err(Error::Argument(format!("bound expects a variable, got {}", other)))
                }
            }
        }
        "isIRI" | "isURI" => Ok(Expression::IsIri(unary(args)?)),
        "isBlank" => Ok(Expression::IsBlank(unary(args)?)),
        "isLiteral" => Ok(Expression::IsLiteral(unary(args)?)),
        "str" => Ok(Expression::Str(unary(args)?)),
        "lang" => Ok(Expression::Lang(unary(args)?)),
        "datatype" => Ok(Expression::Datatype(unary(args)?)),
        "langMatches" => {
            let (tag, range) = binary(args)?;
            Ok(Expression::LangMatches(tag, range))
        }
        "regex" => {
            if args.len() != 2 && args.len() != 3 {
                return Err(Error::Argument(format!(
                    "regex expects 2 or 3 operands, got {}",
                    args.len()
                )));
            }
            let flags = match args.get(2) {
                Some(arg) => Some(Box::new(build_expression(arg, context)?)),
                None => None,
            };
            Ok(Expression::Regex(
                Box::new(build_expression(&args[0], context)?),
                Box::new(build_expression(&args[1], context)?),
                flags,
            ))
        }
        "sameTerm" => {
            let (left, right) = binary(args)?;
            Ok(Expression::SameTerm(left, right))
        }
        "!" => Ok(Expression::Not(unary(args)?)),
        "&&" => {
            let (left, right) = binary(args)?;
            Ok(Expression::And(left, right))
        }
        "||" => {
            let (left, right) = binary(args)?;
            Ok(Expression::Or(left, right))
        }
        "+" if args.len() == 1 => Ok(Expression::UnaryPlus(unary(args)?)),
        "-" if args.len() == 1 => Ok(Expression::UnaryMinus(unary(args)?)),
        "+" | "-" | "*" | "/" => {
            let op = match operator {
                "+" => ArithmeticOp::Add,
                "-" => ArithmeticOp::Subtract,
                "*" => ArithmeticOp::Multiply,
                _ => ArithmeticOp::Divide,
            };
            let (left, right) = binary(args)?;
            Ok(Expression::Arithmetic(op, left, right))
        }
        "=" | "!=" | "<" | "<=" | ">" | ">=" => {
            let op = match operator {
                "=" => ComparisonOp::Equal,
                "!=" => ComparisonOp::NotEqual,
                "<" => ComparisonOp::Less,
                "<=" => ComparisonOp::LessEqual,
                ">" => ComparisonOp::Greater,
                _ => ComparisonOp::GreaterEqual,
            };
            let (left, right) = binary(args)?;
            Ok(Expression::Comparison(op, left, right))
        }
        unknown => Err(Error::Argument(format!("unknown expression operator {:?}", unknown))),
    }
}

/// Coerce a leaf operand into a term.
fn build_term(form: &Form, context: &BuildContext) -> Result<Term> {
    match form {
        Form::Term(Term::Iri(iri)) => Ok(Term::Iri(context.resolve(iri))),
        Form::Term(term) => Ok(term.clone()),
        Form::Boolean(value) => Ok(Term::Literal(Literal::boolean(*value))),
        Form::Integer(value) => Ok(Term::Literal(Literal::integer(*value))),
        Form::Decimal(lexical) => Ok(Term::Literal(Literal::decimal(lexical.clone()))),
        Form::Double(lexical) => Ok(Term::Literal(Literal::double(lexical.clone()))),
        Form::Symbol(symbol) if looks_like_date_time(symbol) => {
            Ok(Term::Literal(Literal::typed(symbol.clone(), xsd::DATE_TIME)))
        }
        Form::Symbol(symbol) => match context.expand_prefixed(symbol) {
            Some(iri) => Ok(Term::Iri(iri)),
            None => Err(Error::Type(format!("cannot coerce symbol {:?} to a term", symbol))),
        },
        Form::List(_) => Err(Error::Type(format!("expected a term, got {}", form))),
    }
}

fn build_triple(form: &Form, context: &BuildContext) -> Result<TriplePattern> {
    let (operator, args) = operator_and_args(form)?;
    if operator != "triple" {
        return Err(Error::Argument(format!("expected (triple s p o), got {}", form)));
    }
    expect_arity(operator, args, 3)?;
    Ok(TriplePattern::new(
        build_term(&args[0], context)?,
        build_term(&args[1], context)?,
        build_term(&args[2], context)?,
    ))
}

fn build_variable_list(form: &Form) -> Result<Vec<String>> {
    let items = form
        .as_list()
        .ok_or_else(|| Error::Type(format!("expected a variable list, got {}", form)))?;
    items
        .iter()
        .map(|item| match item {
            Form::Term(Term::Variable(name)) => Ok(name.clone()),
            other => Err(Error::Type(format!("expected a variable, got {}", other))),
        })
        .collect()
}

fn build_order_keys(form: &Form, context: &BuildContext) -> Result<Vec<OrderKey>> {
    let items = form
        .as_list()
        .ok_or_else(|| Error::Type(format!("expected a sort-key list, got {}", form)))?;
    items
        .iter()
        .map(|item| {
            if let Some(inner) = item.as_list() {
                match inner.first().and_then(Form::as_symbol) {
                    Some("asc") => {
                        expect_arity("asc", &inner[1..], 1)?;
                        return Ok(OrderKey::Asc(build_expression(&inner[1], context)?));
                    }
                    Some("desc") => {
                        expect_arity("desc", &inner[1..], 1)?;
                        return Ok(OrderKey::Desc(build_expression(&inner[1], context)?));
                    }
                    _ => {}
                }
            }
            // A bare variable or expression sorts ascending
            Ok(OrderKey::Asc(build_expression(item, context)?))
        })
        .collect()
}

fn build_slice_bound(position: &str, form: &Form) -> Result<Option<usize>> {
    match form {
        Form::Symbol(sentinel) if sentinel == "_" => Ok(None),
        Form::Integer(value) if *value >= 0 => Ok(Some(*value as usize)),
        other => Err(Error::Argument(format!(
            "{} must be a non-negative integer or _, got {}",
            position, other
        ))),
    }
}

fn build_sources(form: &Form, context: &BuildContext) -> Result<Vec<DatasetSource>> {
    let items = form
        .as_list()
        .ok_or_else(|| Error::Type(format!("expected a source list, got {}", form)))?;
    items
        .iter()
        .map(|item| match item {
            Form::Term(Term::Iri(iri)) => Ok(DatasetSource::Default(iri.clone())),
            Form::List(inner) => match (inner.first().and_then(Form::as_symbol), inner.get(1)) {
                (Some("named"), Some(Form::Term(Term::Iri(iri)))) if inner.len() == 2 => {
                    Ok(DatasetSource::Named(iri.clone()))
                }
                _ => Err(Error::Argument(format!("invalid named source {}", item))),
            },
            other => Err(Error::Type(format!("invalid dataset source {}", other))),
        })
        .collect()
}

fn build_prefix_declarations(form: &Form) -> Result<Vec<(String, String)>> {
    let items = form
        .as_list()
        .ok_or_else(|| Error::Type(format!("expected prefix declarations, got {}", form)))?;
    items
        .iter()
        .map(|item| {
            let declaration = item.as_list().ok_or_else(|| {
                Error::Type(format!("expected a (prefix: <iri>) pair, got {}", item))
            })?;
            match (declaration.first(), declaration.get(1)) {
                (Some(Form::Symbol(prefix)), Some(Form::Term(Term::Iri(namespace))))
                    if declaration.len() == 2 && prefix.ends_with(':') =>
                {
                    Ok((prefix.clone(), namespace.clone()))
                }
                _ => Err(Error::Type(format!("invalid prefix declaration {}", item))),
            }
        })
        .collect()
}
