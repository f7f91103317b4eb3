use crate::error::{Error, Result};
use chrono::{DateTime, FixedOffset, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;

/// XSD datatype IRIs recognized by the literal classifier.
pub mod xsd {
    pub const STRING: &str = "http://www.w3.org/2001/XMLSchema#string";
    pub const BOOLEAN: &str = "http://www.w3.org/2001/XMLSchema#boolean";
    pub const INTEGER: &str = "http://www.w3.org/2001/XMLSchema#integer";
    pub const DECIMAL: &str = "http://www.w3.org/2001/XMLSchema#decimal";
    pub const FLOAT: &str = "http://www.w3.org/2001/XMLSchema#float";
    pub const DOUBLE: &str = "http://www.w3.org/2001/XMLSchema#double";
    pub const DATE_TIME: &str = "http://www.w3.org/2001/XMLSchema#dateTime";
}

/// Literal sub-kind, derived from the datatype IRI and language tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum LiteralKind {
    /// No datatype, no language tag
    Simple,
    /// Language tag present
    LangString,
    /// Datatype is xsd:string
    TypedString,
    Boolean,
    Integer,
    Decimal,
    Float,
    Double,
    DateTime,
    /// Unrecognized datatype
    Other,
}

impl LiteralKind {
    pub fn is_numeric(self) -> bool {
        matches!(
            self,
            LiteralKind::Integer | LiteralKind::Decimal | LiteralKind::Float | LiteralKind::Double
        )
    }
}

/// Comparison group for literal value equality and ordering.
///
/// Two literals are value-comparable only inside the same group; literals
/// outside every group (language-tagged or unrecognized datatypes) fall back
/// to syntactic identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComparisonGroup {
    /// Simple literals and xsd:string
    Stringy,
    Numeric,
    Boolean,
    DateTime,
}

/// An RDF literal: lexical form plus optional datatype IRI or language tag.
///
/// The sub-kind is classified once in the constructors; use `simple`,
/// `lang_tagged` or `typed` rather than building the struct directly.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Literal {
    lexical: String,
    datatype: Option<String>,
    language: Option<String>,
    kind: LiteralKind,
}

impl Literal {
    /// A plain literal with neither datatype nor language tag.
    pub fn simple(lexical: impl Into<String>) -> Self {
        Self {
            lexical: lexical.into(),
            datatype: None,
            language: None,
            kind: LiteralKind::Simple,
        }
    }

    /// A language-tagged literal.
    pub fn lang_tagged(lexical: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            lexical: lexical.into(),
            datatype: None,
            language: Some(language.into()),
            kind: LiteralKind::LangString,
        }
    }

    /// A typed literal; the sub-kind is classified from the datatype IRI.
    pub fn typed(lexical: impl Into<String>, datatype: impl Into<String>) -> Self {
        let datatype = datatype.into();
        let kind = Self::classify(&datatype);
        Self { lexical: lexical.into(), datatype: Some(datatype), language: None, kind }
    }

    pub fn boolean(value: bool) -> Self {
        Self::typed(if value { "true" } else { "false" }, xsd::BOOLEAN)
    }

    pub fn integer(value: i64) -> Self {
        Self::typed(value.to_string(), xsd::INTEGER)
    }

    pub fn decimal(lexical: impl Into<String>) -> Self {
        Self::typed(lexical, xsd::DECIMAL)
    }

    pub fn double(lexical: impl Into<String>) -> Self {
        Self::typed(lexical, xsd::DOUBLE)
    }

    fn classify(datatype: &str) -> LiteralKind {
        match datatype {
            xsd::STRING => LiteralKind::TypedString,
            xsd::BOOLEAN => LiteralKind::Boolean,
            xsd::INTEGER => LiteralKind::Integer,
            xsd::DECIMAL => LiteralKind::Decimal,
            xsd::FLOAT => LiteralKind::Float,
            xsd::DOUBLE => LiteralKind::Double,
            xsd::DATE_TIME => LiteralKind::DateTime,
            _ => LiteralKind::Other,
        }
    }

    pub fn lexical(&self) -> &str {
        &self.lexical
    }

    pub fn datatype(&self) -> Option<&str> {
        self.datatype.as_deref()
    }

    pub fn language(&self) -> Option<&str> {
        self.language.as_deref()
    }

    pub fn kind(&self) -> LiteralKind {
        self.kind
    }

    pub fn is_numeric(&self) -> bool {
        self.kind.is_numeric()
    }

    pub fn comparison_group(&self) -> Option<ComparisonGroup> {
        match self.kind {
            LiteralKind::Simple | LiteralKind::TypedString => Some(ComparisonGroup::Stringy),
            LiteralKind::Boolean => Some(ComparisonGroup::Boolean),
            LiteralKind::DateTime => Some(ComparisonGroup::DateTime),
            k if k.is_numeric() => Some(ComparisonGroup::Numeric),
            _ => None,
        }
    }

    /// Parse the literal as a numeric value according to its sub-kind.
    pub fn as_numeric(&self) -> Result<Numeric> {
        let parse_err =
            || Error::Type(format!("not a valid {:?} lexical form: {:?}", self.kind, self.lexical));
        match self.kind {
            LiteralKind::Integer => {
                self.lexical.parse::<i64>().map(Numeric::Integer).map_err(|_| parse_err())
            }
            LiteralKind::Decimal => {
                self.lexical.parse::<f64>().map(Numeric::Decimal).map_err(|_| parse_err())
            }
            LiteralKind::Float => {
                self.lexical.parse::<f32>().map(Numeric::Float).map_err(|_| parse_err())
            }
            LiteralKind::Double => {
                self.lexical.parse::<f64>().map(Numeric::Double).map_err(|_| parse_err())
            }
            _ => Err(Error::Type(format!("not a numeric literal: {}", self))),
        }
    }

    /// Parse an xsd:boolean literal value.
    pub fn as_bool(&self) -> Result<bool> {
        if self.kind != LiteralKind::Boolean {
            return Err(Error::Type(format!("not a boolean literal: {}", self)));
        }
        match self.lexical.as_str() {
            "true" | "1" => Ok(true),
            "false" | "0" => Ok(false),
            other => Err(Error::Type(format!("invalid boolean lexical form: {:?}", other))),
        }
    }

    /// Parse an xsd:dateTime literal value.
    ///
    /// Accepts RFC 3339 forms; a missing timezone is read as UTC.
    pub fn as_date_time(&self) -> Result<DateTime<FixedOffset>> {
        if self.kind != LiteralKind::DateTime {
            return Err(Error::Type(format!("not a dateTime literal: {}", self)));
        }
        DateTime::parse_from_rfc3339(&self.lexical)
            .or_else(|_| {
                NaiveDateTime::parse_from_str(&self.lexical, "%Y-%m-%dT%H:%M:%S%.f")
                    .map(|naive| naive.and_utc().fixed_offset())
            })
            .map_err(|_| Error::Type(format!("invalid dateTime lexical form: {:?}", self.lexical)))
    }
}

/// Numeric value extracted from a literal.
///
/// The promotion lattice is Integer → Decimal → Float → Double; binary
/// arithmetic and comparison promote both operands to the higher sub-kind.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Numeric {
    Integer(i64),
    Decimal(f64),
    Float(f32),
    Double(f64),
}

impl Numeric {
    fn rank(self) -> u8 {
        match self {
            Numeric::Integer(_) => 0,
            Numeric::Decimal(_) => 1,
            Numeric::Float(_) => 2,
            Numeric::Double(_) => 3,
        }
    }

    fn as_f64(self) -> f64 {
        match self {
            Numeric::Integer(i) => i as f64,
            Numeric::Decimal(d) | Numeric::Double(d) => d,
            Numeric::Float(f) => f64::from(f),
        }
    }

    fn promote_to(self, rank: u8) -> Numeric {
        match rank {
            0 | 1 => {
                if let Numeric::Integer(i) = self {
                    if rank == 0 {
                        return Numeric::Integer(i);
                    }
                }
                Numeric::Decimal(self.as_f64())
            }
            2 => Numeric::Float(self.as_f64() as f32),
            _ => Numeric::Double(self.as_f64()),
        }
    }

    /// Promote both values to the higher of their sub-kinds.
    pub fn promote_pair(a: Numeric, b: Numeric) -> (Numeric, Numeric) {
        let rank = a.rank().max(b.rank());
        (a.promote_to(rank), b.promote_to(rank))
    }

    pub fn is_zero(self) -> bool {
        match self {
            Numeric::Integer(i) => i == 0,
            Numeric::Decimal(d) | Numeric::Double(d) => d == 0.0,
            Numeric::Float(f) => f == 0.0,
        }
    }

    pub fn is_nan(self) -> bool {
        match self {
            Numeric::Integer(_) => false,
            Numeric::Decimal(d) | Numeric::Double(d) => d.is_nan(),
            Numeric::Float(f) => f.is_nan(),
        }
    }

    pub fn negate(self) -> Numeric {
        match self {
            Numeric::Integer(i) => Numeric::Integer(-i),
            Numeric::Decimal(d) => Numeric::Decimal(-d),
            Numeric::Float(f) => Numeric::Float(-f),
            Numeric::Double(d) => Numeric::Double(-d),
        }
    }

    /// Value equality after promotion to a common sub-kind.
    pub fn equals(a: Numeric, b: Numeric) -> bool {
        match Numeric::promote_pair(a, b) {
            (Numeric::Integer(x), Numeric::Integer(y)) => x == y,
            (x, y) => x.as_f64() == y.as_f64(),
        }
    }

    /// Total comparison after promotion; NaN compares equal to itself.
    pub fn compare(a: Numeric, b: Numeric) -> std::cmp::Ordering {
        match Numeric::promote_pair(a, b) {
            (Numeric::Integer(x), Numeric::Integer(y)) => x.cmp(&y),
            (x, y) => x.as_f64().partial_cmp(&y.as_f64()).unwrap_or(std::cmp::Ordering::Equal),
        }
    }

    /// Render back into a literal of the matching sub-kind.
    pub fn to_literal(self) -> Literal {
        match self {
            Numeric::Integer(i) => Literal::integer(i),
            Numeric::Decimal(d) => Literal::decimal(format_decimal(d)),
            Numeric::Float(f) => Literal::typed(format!("{}", f), xsd::FLOAT),
            Numeric::Double(d) => Literal::double(format!("{}", d)),
        }
    }
}

/// Canonical-ish decimal rendering: always keeps a fractional part so the
/// lexical form stays recognizable as a decimal.
fn format_decimal(value: f64) -> String {
    let rendered = format!("{}", value);
    if rendered.contains('.') || rendered.contains('e') || rendered.contains("inf") {
        rendered
    } else {
        format!("{}.0", rendered)
    }
}

/// An RDF term, or a query variable inside a plan node.
///
/// Variables never appear inside a solution's bound value.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Term {
    Iri(String),
    BlankNode(String),
    Literal(Literal),
    Variable(String),
}

impl Term {
    pub fn is_variable(&self) -> bool {
        matches!(self, Term::Variable(_))
    }

    pub fn is_iri(&self) -> bool {
        matches!(self, Term::Iri(_))
    }

    pub fn is_blank(&self) -> bool {
        matches!(self, Term::BlankNode(_))
    }

    pub fn is_literal(&self) -> bool {
        matches!(self, Term::Literal(_))
    }

    pub fn as_literal(&self) -> Option<&Literal> {
        match self {
            Term::Literal(lit) => Some(lit),
            _ => None,
        }
    }

    /// SPARQL effective boolean value.
    ///
    /// Booleans and numerics coerce by value (a malformed lexical form
    /// coerces to false); string-valued literals test for emptiness; every
    /// other term is a type error.
    pub fn effective_boolean_value(&self) -> Result<bool> {
        let literal = match self {
            Term::Literal(lit) => lit,
            other => {
                return Err(Error::Type(format!("no effective boolean value for {}", other)));
            }
        };
        match literal.kind() {
            LiteralKind::Boolean => Ok(literal.as_bool().unwrap_or(false)),
            kind if kind.is_numeric() => match literal.as_numeric() {
                Ok(n) => Ok(!n.is_zero() && !n.is_nan()),
                Err(_) => Ok(false),
            },
            LiteralKind::Simple | LiteralKind::TypedString | LiteralKind::LangString => {
                Ok(!literal.lexical().is_empty())
            }
            _ => Err(Error::Type(format!("no effective boolean value for {}", self))),
        }
    }
}

/// Escape a lexical form for quoted rendering.
pub(crate) fn escape_literal(lexical: &str) -> String {
    let mut out = String::with_capacity(lexical.len());
    for c in lexical.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            other => out.push(other),
        }
    }
    out
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Canonical numeric and boolean forms render bare so that the reader
        // coerces them back to the same literal.
        match self.kind {
            LiteralKind::Boolean if self.lexical == "true" || self.lexical == "false" => {
                return write!(f, "{}", self.lexical);
            }
            LiteralKind::Integer => {
                if let Ok(i) = self.lexical.parse::<i64>() {
                    if i.to_string() == self.lexical {
                        return write!(f, "{}", self.lexical);
                    }
                }
            }
            LiteralKind::Decimal => {
                if self.lexical.parse::<f64>().is_ok()
                    && self.lexical.contains('.')
                    && !self.lexical.contains(['e', 'E'])
                {
                    return write!(f, "{}", self.lexical);
                }
            }
            LiteralKind::Double => {
                if self.lexical.parse::<f64>().is_ok() && self.lexical.contains(['e', 'E']) {
                    return write!(f, "{}", self.lexical);
                }
            }
            _ => {}
        }
        write!(f, "\"{}\"", escape_literal(&self.lexical))?;
        if let Some(lang) = &self.language {
            write!(f, "@{}", lang)
        } else if let Some(datatype) = &self.datatype {
            write!(f, "^^<{}>", datatype)
        } else {
            Ok(())
        }
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::Iri(iri) => write!(f, "<{}>", iri),
            Term::BlankNode(label) => write!(f, "_:{}", label),
            Term::Literal(lit) => write!(f, "{}", lit),
            Term::Variable(name) => write!(f, "?{}", name),
        }
    }
}
