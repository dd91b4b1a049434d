//! Tokenizer for the filter grammar.
//!
//! Clauses split on a
//! whitespace-delimited `AND`, a field prefix is `[a-z_]+:` at the very
//! start of a clause, and the value is everything after the first colon.

const CLAUSE_SEPARATOR: &str = "AND";

///
/// Clause
/// One parsed filter clause. `field` is `None` for free text.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct Clause<'a> {
    pub(crate) field: Option<&'a str>,
    pub(crate) value: String,
}

/// Split an expression into trimmed, non-empty clauses.
pub(crate) fn split_clauses(expr: &str) -> Vec<&str> {
    let bytes = expr.as_bytes();
    let mut clauses = Vec::new();
    let mut start = 0;
    let mut cursor = 0;

    while let Some(pos) = expr[cursor..].find(CLAUSE_SEPARATOR) {
        let at = cursor + pos;
        let end = at + CLAUSE_SEPARATOR.len();
        let spaced_before = at > 0 && bytes[at - 1].is_ascii_whitespace();
        let spaced_after = end < bytes.len() && bytes[end].is_ascii_whitespace();

        if spaced_before && spaced_after {
            clauses.push(expr[start..at].trim());
            start = end;
        }
        cursor = end;
    }
    clauses.push(expr[start..].trim());

    clauses.retain(|clause| !clause.is_empty());
    clauses
}

/// Parse one trimmed clause.
pub(crate) fn parse_clause(clause: &str) -> Clause<'_> {
    match field_prefix(clause) {
        Some((field, rest)) => Clause {
            field: Some(field),
            value: unquote(rest.trim()).to_string(),
        },
        None => Clause {
            field: None,
            value: free_text_value(clause),
        },
    }
}

// `[a-z_]+:` at the start of the clause; splits on the first colon only.
fn field_prefix(clause: &str) -> Option<(&str, &str)> {
    let end = clause.find(|c: char| !(c.is_ascii_lowercase() || c == '_'))?;
    if end == 0 || !clause[end..].starts_with(':') {
        return None;
    }

    Some((&clause[..end], &clause[end + 1..]))
}

// Strip one enclosing pair of double quotes.
fn unquote(value: &str) -> &str {
    if value.len() >= 2 && value.starts_with('"') && value.ends_with('"') {
        &value[1..value.len() - 1]
    } else {
        value
    }
}

// Quoted span (first to last quote) wins; otherwise whitespace is dropped.
fn free_text_value(clause: &str) -> String {
    if let (Some(open), Some(close)) = (clause.find('"'), clause.rfind('"'))
        && close > open
    {
        return clause[open + 1..close].to_string();
    }

    clause.chars().filter(|c| !c.is_whitespace()).collect()
}
