//! S-expression plan reader.
//!
//! Converts the textual query-plan syntax into nested list/atom [`Form`]
//! values, the exact input contract of the algebra builder. Rendering a
//! built tree and reading it back yields the same tree.

use crate::error::{Error, Result};
use crate::model::{Literal, Term};
use regex::Regex;
use std::fmt;

/// A nested list/atom form.
#[derive(Debug, Clone, PartialEq)]
pub enum Form {
    List(Vec<Form>),
    /// Operator names, keywords, the `_` sentinel, prefixed names
    Symbol(String),
    /// IRIs, blank nodes, variables, and quoted literals
    Term(Term),
    Boolean(bool),
    Integer(i64),
    /// Lexical form kept verbatim so rebuilding preserves it
    Decimal(String),
    Double(String),
}

impl Form {
    pub fn as_list(&self) -> Option<&[Form]> {
        match self {
            Form::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_symbol(&self) -> Option<&str> {
        match self {
            Form::Symbol(name) => Some(name),
            _ => None,
        }
    }
}

impl fmt::Display for Form {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Form::List(items) => {
                write!(f, "(")?;
                for (index, item) in items.iter().enumerate() {
                    if index > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, ")")
            }
            Form::Symbol(name) => write!(f, "{}", name),
            Form::Term(term) => write!(f, "{}", term),
            Form::Boolean(value) => write!(f, "{}", value),
            Form::Integer(value) => write!(f, "{}", value),
            Form::Decimal(lexical) | Form::Double(lexical) => write!(f, "{}", lexical),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Open,
    Close,
    Term(Term),
    Atom(String),
}

/// Reader for the S-expression plan syntax.
pub struct PlanReader {
    integer_regex: Regex,
    decimal_regex: Regex,
    double_regex: Regex,
}

impl PlanReader {
    pub fn new() -> Result<Self> {
        let build = |pattern: &str| {
            Regex::new(pattern).map_err(|err| Error::Parse(format!("reader regex: {}", err)))
        };
        Ok(PlanReader {
            integer_regex: build(r"^[+-]?\d+$")?,
            decimal_regex: build(r"^[+-]?\d*\.\d+$")?,
            double_regex: build(r"^[+-]?(\d+\.?\d*|\.\d+)[eE][+-]?\d+$")?,
        })
    }

    /// Read a single form from `text`; trailing content is an error.
    pub fn read(&self, text: &str) -> Result<Form> {
        let tokens = tokenize(text)?;
        let mut position = 0;
        let form = self.parse(&tokens, &mut position)?;
        if position != tokens.len() {
            return Err(Error::Parse("trailing content after form".to_string()));
        }
        Ok(form)
    }

    fn parse(&self, tokens: &[Token], position: &mut usize) -> Result<Form> {
        let token = tokens
            .get(*position)
            .ok_or_else(|| Error::Parse("unexpected end of input".to_string()))?;
        *position += 1;
        match token {
            Token::Open => {
                let mut items = Vec::new();
                loop {
                    match tokens.get(*position) {
                        Some(Token::Close) => {
                            *position += 1;
                            return Ok(Form::List(items));
                        }
                        Some(_) => items.push(self.parse(tokens, position)?),
                        None => return Err(Error::Parse("unclosed list".to_string())),
                    }
                }
            }
            Token::Close => Err(Error::Parse("unexpected ')'".to_string())),
            Token::Term(term) => Ok(Form::Term(term.clone())),
            Token::Atom(atom) => Ok(self.classify_atom(atom)),
        }
    }

    fn classify_atom(&self, atom: &str) -> Form {
        match atom {
            "true" => Form::Boolean(true),
            "false" => Form::Boolean(false),
            _ => {
                if self.integer_regex.is_match(atom) {
                    if let Ok(value) = atom.parse::<i64>() {
                        return Form::Integer(value);
                    }
                }
                if self.decimal_regex.is_match(atom) {
                    return Form::Decimal(atom.to_string());
                }
                if self.double_regex.is_match(atom) {
                    return Form::Double(atom.to_string());
                }
                Form::Symbol(atom.to_string())
            }
        }
    }
}

/// Convenience wrapper: build a reader and read one form.
pub fn read_form(text: &str) -> Result<Form> {
    PlanReader::new()?.read(text)
}

fn tokenize(text: &str) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut chars = text.char_indices().peekable();

    while let Some(&(index, c)) = chars.peek() {
        match c {
            '(' => {
                tokens.push(Token::Open);
                chars.next();
            }
            ')' => {
                tokens.push(Token::Close);
                chars.next();
            }
            '#' => {
                // Line comment
                for (_, c) in chars.by_ref() {
                    if c == '\n' {
                        break;
                    }
                }
            }
            '"' => tokens.push(read_quoted(text, &mut chars)?),
            '<' if !is_operator_angle(text, index) => {
                tokens.push(read_iri(&mut chars)?);
            }
            '?' => {
                chars.next();
                let name = read_bare(&mut chars);
                if name.is_empty() {
                    return Err(Error::Parse("empty variable name".to_string()));
                }
                tokens.push(Token::Term(Term::Variable(name)));
            }
            '_' if text[index..].starts_with("_:") => {
                chars.next();
                chars.next();
                let label = read_bare(&mut chars);
                if label.is_empty() {
                    return Err(Error::Parse("empty blank node label".to_string()));
                }
                tokens.push(Token::Term(Term::BlankNode(label)));
            }
            c if c.is_whitespace() => {
                chars.next();
            }
            _ => {
                let atom = read_bare(&mut chars);
                tokens.push(Token::Atom(atom));
            }
        }
    }
    Ok(tokens)
}

/// `<` opens an IRI unless it spells a comparison operator (`<`, `<=`).
fn is_operator_angle(text: &str, index: usize) -> bool {
    let rest = &text[index..];
    rest == "<"
        || rest.starts_with("< ")
        || rest.starts_with("<\n")
        || rest.starts_with("<\t")
        || rest.starts_with("<=")
}

fn read_bare(chars: &mut std::iter::Peekable<std::str::CharIndices<'_>>) -> String {
    let mut atom = String::new();
    while let Some(&(_, c)) = chars.peek() {
        if c.is_whitespace() || c == '(' || c == ')' {
            break;
        }
        atom.push(c);
        chars.next();
    }
    atom
}

fn read_iri(chars: &mut std::iter::Peekable<std::str::CharIndices<'_>>) -> Result<Token> {
    chars.next(); // '<'
    let mut iri = String::new();
    for (_, c) in chars.by_ref() {
        if c == '>' {
            return Ok(Token::Term(Term::Iri(iri)));
        }
        iri.push(c);
    }
    Err(Error::Parse("missing closing '>' in IRI".to_string()))
}

fn read_quoted(
    text: &str,
    chars: &mut std::iter::Peekable<std::str::CharIndices<'_>>,
) -> Result<Token> {
    chars.next(); // opening quote
    let mut lexical = String::new();
    let mut closed = false;
    while let Some((_, c)) = chars.next() {
        match c {
            '"' => {
                closed = true;
                break;
            }
            '\\' => match chars.next() {
                Some((_, 'n')) => lexical.push('\n'),
                Some((_, 'r')) => lexical.push('\r'),
                Some((_, 't')) => lexical.push('\t'),
                Some((_, '"')) => lexical.push('"'),
                Some((_, '\\')) => lexical.push('\\'),
                Some((_, other)) => {
                    return Err(Error::Parse(format!("unknown escape \\{}", other)));
                }
                None => return Err(Error::Parse("dangling escape in literal".to_string())),
            },
            other => lexical.push(other),
        }
    }
    if !closed {
        return Err(Error::Parse("missing closing quote".to_string()));
    }

    // Optional datatype or language suffix
    if let Some(&(index, '^')) = chars.peek() {
        if text[index..].starts_with("^^<") {
            chars.next();
            chars.next();
            let iri_token = read_iri(chars)?;
            let Token::Term(Term::Iri(datatype)) = iri_token else {
                return Err(Error::Parse("datatype must be an IRI".to_string()));
            };
            return Ok(Token::Term(Term::Literal(Literal::typed(lexical, datatype))));
        }
        return Err(Error::Parse("malformed datatype suffix".to_string()));
    }
    if let Some(&(_, '@')) = chars.peek() {
        chars.next();
        let tag = read_bare(chars);
        if tag.is_empty() {
            return Err(Error::Parse("empty language tag".to_string()));
        }
        return Ok(Token::Term(Term::Literal(Literal::lang_tagged(lexical, tag))));
    }
    Ok(Token::Term(Term::Literal(Literal::simple(lexical))))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_nested_lists() {
        let form = read_form("(bgp (triple ?s ?p ?o))").unwrap();
        let items = form.as_list().unwrap();
        assert_eq!(items[0], Form::Symbol("bgp".to_string()));
        let triple = items[1].as_list().unwrap();
        assert_eq!(triple[1], Form::Term(Term::Variable("s".to_string())));
    }

    #[test]
    fn test_read_atoms() {
        let form = read_form("(filter (< ?o 3) (bgp))").unwrap();
        let items = form.as_list().unwrap();
        let filter = items[1].as_list().unwrap();
        assert_eq!(filter[0], Form::Symbol("<".to_string()));
        assert_eq!(filter[2], Form::Integer(3));
    }

    #[test]
    fn test_read_literals() {
        let form = read_form(r#"("plain" "typed"^^<http://www.w3.org/2001/XMLSchema#string> "hi"@en 2.5 1.0e6)"#)
            .unwrap();
        let items = form.as_list().unwrap();
        assert_eq!(items[0], Form::Term(Term::Literal(Literal::simple("plain"))));
        assert!(matches!(&items[1], Form::Term(Term::Literal(l)) if l.datatype().is_some()));
        assert!(matches!(&items[2], Form::Term(Term::Literal(l)) if l.language() == Some("en")));
        assert_eq!(items[3], Form::Decimal("2.5".to_string()));
        assert_eq!(items[4], Form::Double("1.0e6".to_string()));
    }

    #[test]
    fn test_angle_is_iri_or_operator() {
        let form = read_form("(< ?a <http://example.org/x>)").unwrap();
        let items = form.as_list().unwrap();
        assert_eq!(items[0], Form::Symbol("<".to_string()));
        assert_eq!(items[2], Form::Term(Term::Iri("http://example.org/x".to_string())));
    }

    #[test]
    fn test_errors() {
        assert!(read_form("(bgp").is_err());
        assert!(read_form(")").is_err());
        assert!(read_form("(a) (b)").is_err());
    }

    #[test]
    fn test_display_round_trip() {
        let text = "(slice _ 10 (project (?s) (bgp (triple ?s ?p ?o))))";
        let form = read_form(text).unwrap();
        assert_eq!(form.to_string(), text);
        assert_eq!(read_form(&form.to_string()).unwrap(), form);
    }
}
