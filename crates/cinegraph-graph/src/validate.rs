//! Cypher validation against the live schema
//!
//! Synthesized statements are checked before they reach the database:
//! relationship types and property keys must be declared in the schema,
//! and single hops between labelled nodes must follow a declared
//! direction. A hop written against the schema's direction is flipped
//! in place; a hop that exists in neither direction is rejected.

use crate::schema::GraphSchema;
use regex::Regex;
use std::collections::HashMap;
use std::sync::OnceLock;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("empty statement")]
    Empty,

    #[error("relationship type '{0}' is not in the schema")]
    UnknownRelationship(String),

    #[error("property '{0}' is not in the schema")]
    UnknownProperty(String),

    #[error("no (:{start})-[:{rel_type}]-(:{end}) relationship in the schema")]
    UnknownPath {
        start: String,
        rel_type: String,
        end: String,
    },
}

/// Plain or backtick-quoted identifier.
const IDENT: &str = r"(?:[A-Za-z_][A-Za-z0-9_]*|`[^`]+`)";

/// Strip the backticks from a quoted identifier.
fn unquote(ident: &str) -> &str {
    ident
        .strip_prefix('`')
        .and_then(|s| s.strip_suffix('`'))
        .unwrap_or(ident)
}

fn fenced_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)```(?:cypher)?\s*(.*?)```").unwrap())
}

fn rel_types_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(&format!(
            r"\[\s*(?:{id})?\s*:\s*!?({id}(?:\s*\|\s*:?\s*{id})*)",
            id = IDENT
        ))
        .unwrap()
    })
}

fn property_access_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(&format!(r"({id})\.({id})", id = IDENT)).unwrap())
}

fn inline_map_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(&format!(
            r"[(\[]((?:\s*{id})?\s*(?::\s*{id}(?:\s*\|\s*{id})*\s*)*)\{{([^}}]*)\}}",
            id = IDENT
        ))
        .unwrap()
    })
}

fn map_key_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(&format!(r"({id})\s*:", id = IDENT)).unwrap())
}

fn binding_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(&format!(r"\(\s*({id})\s*:\s*({id})", id = IDENT)).unwrap())
}

fn hop_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        let node = format!(r"(\(\s*({id})?\s*(?::\s*({id}))?[^()]*\))", id = IDENT);
        Regex::new(&format!(
            r"{node}\s*(<?-)\s*(\[[^\]]*\])\s*(->?)\s*{node}",
            node = node
        ))
        .unwrap()
    })
}

/// Pull the Cypher statement out of a model reply.
///
/// Fenced code blocks win; otherwise the whole reply is the statement.
pub fn extract_cypher(text: &str) -> String {
    let body = fenced_re()
        .captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
        .unwrap_or(text);
    body.trim().trim_end_matches(';').trim().to_string()
}

/// Blank out string literal contents, keeping byte offsets stable.
fn mask_literals(statement: &str) -> String {
    let mut out = String::with_capacity(statement.len());
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for ch in statement.chars() {
        match quote {
            Some(q) => {
                if escaped {
                    escaped = false;
                    out.extend(std::iter::repeat(' ').take(ch.len_utf8()));
                } else if ch == '\\' {
                    escaped = true;
                    out.push(' ');
                } else if ch == q {
                    quote = None;
                    out.push(ch);
                } else {
                    out.extend(std::iter::repeat(' ').take(ch.len_utf8()));
                }
            }
            None => {
                if ch == '\'' || ch == '"' {
                    quote = Some(ch);
                }
                out.push(ch);
            }
        }
    }
    out
}

/// Validate a statement and return it, with hop directions corrected.
pub fn validate_cypher(statement: &str, schema: &GraphSchema) -> Result<String, ValidationError> {
    let statement = statement.trim();
    if statement.is_empty() {
        return Err(ValidationError::Empty);
    }
    let masked = mask_literals(statement);

    check_relationship_types(&masked, schema)?;
    check_properties(&masked, schema)?;
    correct_directions(statement, &masked, schema)
}

fn check_relationship_types(masked: &str, schema: &GraphSchema) -> Result<(), ValidationError> {
    for caps in rel_types_re().captures_iter(masked) {
        for rel_type in caps[1].split('|').map(|t| unquote(t.trim().trim_start_matches(':').trim())) {
            if !rel_type.is_empty() && !schema.has_relationship_type(rel_type) {
                return Err(ValidationError::UnknownRelationship(rel_type.to_string()));
            }
        }
    }
    Ok(())
}

fn check_properties(masked: &str, schema: &GraphSchema) -> Result<(), ValidationError> {
    let bytes = masked.as_bytes();
    for caps in property_access_re().captures_iter(masked) {
        let whole = caps.get(0).map(|m| m.range()).unwrap_or(0..0);
        let before = whole.start.checked_sub(1).map(|i| bytes[i]);
        let after = bytes.get(whole.end).copied();
        // namespaced calls (apoc.meta.data(), db.labels()) and $param.key are not property reads
        if matches!(before, Some(b'.') | Some(b'$')) || matches!(after, Some(b'(') | Some(b'.')) {
            continue;
        }
        if before.is_some_and(|b| b.is_ascii_alphanumeric() || b == b'_') {
            continue;
        }
        let key = unquote(&caps[2]);
        if !schema.has_property(key) {
            return Err(ValidationError::UnknownProperty(key.to_string()));
        }
    }

    for caps in inline_map_re().captures_iter(masked) {
        // ({...}) is a map literal argument, not a pattern
        if caps[1].trim().is_empty() {
            continue;
        }
        for key in map_key_re().captures_iter(&caps[2]) {
            let key = unquote(&key[1]);
            if !schema.has_property(key) {
                return Err(ValidationError::UnknownProperty(key.to_string()));
            }
        }
    }
    Ok(())
}

fn correct_directions(
    statement: &str,
    masked: &str,
    schema: &GraphSchema,
) -> Result<String, ValidationError> {
    let bindings: HashMap<&str, &str> = binding_re()
        .captures_iter(masked)
        .filter_map(|c| Some((unquote(c.get(1)?.as_str()), unquote(c.get(2)?.as_str()))))
        .collect();

    let label_of = |var: Option<regex::Match>, label: Option<regex::Match>| -> Option<String> {
        label
            .map(|l| unquote(l.as_str()).to_string())
            .or_else(|| var.and_then(|v| bindings.get(unquote(v.as_str())).map(|l| l.to_string())))
    };

    let mut edits: Vec<(std::ops::Range<usize>, &'static str)> = Vec::new();
    let mut pos = 0;

    while let Some(caps) = hop_re().captures_at(masked, pos) {
        let (Some(right_node), Some(rel), Some(left_arrow), Some(right_arrow)) =
            (caps.get(7), caps.get(5), caps.get(4), caps.get(6))
        else {
            break;
        };
        // continue from the right node so chained hops share it
        pos = right_node.start();

        let rel_text = rel.as_str();
        let rel_type = match rel_text
            .trim_start_matches('[')
            .trim_end_matches(']')
            .split(':')
            .nth(1)
            .map(|t| t.split(|c: char| c == '{' || c == '*' || c.is_whitespace()).next().unwrap_or("").trim())
        {
            Some(t) if !t.is_empty() && !rel_text.contains('|') && !rel_text.contains('*') => unquote(t).to_string(),
            _ => continue,
        };

        if caps[1].contains('|') || right_node.as_str().contains('|') {
            continue;
        }

        let left = label_of(caps.get(2), caps.get(3));
        let right = label_of(caps.get(8), caps.get(9));
        let (Some(left), Some(right)) = (left, right) else { continue };
        if !schema.has_label(&left) || !schema.has_label(&right) {
            continue;
        }

        let incoming = left_arrow.as_str() == "<-";
        let outgoing = right_arrow.as_str() == "->";
        let forward = schema.has_triple(&left, &rel_type, &right);
        let backward = schema.has_triple(&right, &rel_type, &left);

        match (incoming, outgoing) {
            (false, true) if !forward && backward => {
                debug!(%left, %rel_type, %right, "flipping hop to schema direction");
                edits.push((left_arrow.range(), "<-"));
                edits.push((right_arrow.range(), "-"));
            }
            (true, false) if !backward && forward => {
                debug!(%left, %rel_type, %right, "flipping hop to schema direction");
                edits.push((left_arrow.range(), "-"));
                edits.push((right_arrow.range(), "->"));
            }
            (false, true) if forward => {}
            (true, false) if backward => {}
            (false, false) if forward || backward => {}
            (true, true) => {}
            _ => {
                let (start, end) = if incoming { (right, left) } else { (left, right) };
                return Err(ValidationError::UnknownPath { start, rel_type, end });
            }
        }
    }

    let mut corrected = statement.to_string();
    for (range, replacement) in edits.into_iter().rev() {
        corrected.replace_range(range, replacement);
    }
    Ok(corrected)
}
