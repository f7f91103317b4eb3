//! Line-oriented N-Triples reader.
//!
//! Produces fully typed terms: datatype IRIs and language tags are kept on
//! literals rather than stripped.

use crate::error::{Error, Result};
use crate::model::{Literal, Term};
use crate::store::Triple;

/// Parse one line of N-Triples.
///
/// Returns `Ok(None)` for blank lines and `#` comments.
pub fn parse_line(line: &str) -> Result<Option<Triple>> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return Ok(None);
    }

    let trimmed = trimmed.strip_suffix('.').unwrap_or(trimmed).trim_end();

    let (subject, rest) = parse_term(trimmed, "subject")?;
    let (predicate, rest) = parse_term(rest, "predicate")?;
    let (object, rest) = parse_term(rest, "object")?;

    if !rest.trim().is_empty() {
        return Err(Error::Parse(format!("trailing content after object: {:?}", rest.trim())));
    }
    if matches!(subject, Term::Literal(_)) {
        return Err(Error::Parse("literal in subject position".to_string()));
    }
    if !matches!(predicate, Term::Iri(_)) {
        return Err(Error::Parse("predicate must be an IRI".to_string()));
    }
    Ok(Some(Triple::new(subject, predicate, object)))
}

fn parse_term<'a>(input: &'a str, position: &str) -> Result<(Term, &'a str)> {
    let input = input.trim_start();
    if input.starts_with('<') {
        let (iri, rest) = parse_iri(input, position)?;
        return Ok((Term::Iri(iri), rest));
    }
    if let Some(rest) = input.strip_prefix("_:") {
        let end = rest
            .find(|c: char| c.is_whitespace())
            .unwrap_or(rest.len());
        if end == 0 {
            return Err(Error::Parse(format!("empty blank node label in {}", position)));
        }
        return Ok((Term::BlankNode(rest[..end].to_string()), &rest[end..]));
    }
    if input.starts_with('"') {
        return parse_literal(input);
    }
    Err(Error::Parse(format!("invalid {} term: {:?}", position, input)))
}

fn parse_iri<'a>(input: &'a str, position: &str) -> Result<(String, &'a str)> {
    let end = input
        .find('>')
        .ok_or_else(|| Error::Parse(format!("missing closing '>' in {} IRI", position)))?;
    Ok((input[1..end].to_string(), &input[end + 1..]))
}

fn parse_literal(input: &str) -> Result<(Term, &str)> {
    let mut lexical = String::new();
    let mut chars = input.char_indices().skip(1);
    let mut closing = None;
    while let Some((index, c)) = chars.next() {
        match c {
            '"' => {
                closing = Some(index);
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
    let closing = closing.ok_or_else(|| Error::Parse("missing closing quote".to_string()))?;
    let after = &input[closing + 1..];

    if let Some(after_caret) = after.strip_prefix("^^") {
        if !after_caret.starts_with('<') {
            return Err(Error::Parse("datatype must be an IRI".to_string()));
        }
        let (datatype, rest) = parse_iri(after_caret, "datatype")?;
        return Ok((Term::Literal(Literal::typed(lexical, datatype)), rest));
    }
    if let Some(after_at) = after.strip_prefix('@') {
        let end = after_at
            .find(|c: char| c.is_whitespace())
            .unwrap_or(after_at.len());
        if end == 0 {
            return Err(Error::Parse("empty language tag".to_string()));
        }
        return Ok((
            Term::Literal(Literal::lang_tagged(lexical, &after_at[..end])),
            &after_at[end..],
        ));
    }
    Ok((Term::Literal(Literal::simple(lexical)), after))
}
