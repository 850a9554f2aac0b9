//! Small recognizers shared by the diagram parsers.

use std::borrow::Cow;
use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;

use super::types::Dialect;

/// Member visibility, from the UML prefix symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Public,
    Private,
    Protected,
    Package,
    Unspecified,
}

impl Visibility {
    pub fn from_symbol(c: char) -> Option<Self> {
        match c {
            '+' => Some(Visibility::Public),
            '-' => Some(Visibility::Private),
            '#' => Some(Visibility::Protected),
            '~' => Some(Visibility::Package),
            _ => None,
        }
    }

    /// Splits a leading visibility symbol off `text`.
    pub fn split(text: &str) -> (Self, &str) {
        let text = text.trim_start();
        match text.chars().next().and_then(Self::from_symbol) {
            Some(vis) => (vis, text[1..].trim_start()),
            None => (Visibility::Unspecified, text),
        }
    }
}

/// An arrow located in a line by [`find_arrow`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArrowMatch<'a, T> {
    pub left: &'a str,
    pub right: &'a str,
    pub token: &'static str,
    pub value: T,
}

/// Finds the leftmost arrow token in `line` outside double quotes.
///
/// At every position the longest token from `table` wins, so `--|>` is never
/// read as `--` followed by `|>`. Tokens starting with a letter (`o--`) only
/// match at a word boundary.
pub fn find_arrow<'a, T: Copy>(
    line: &'a str,
    table: &[(&'static str, T)],
) -> Option<ArrowMatch<'a, T>> {
    find_arrow_where(line, table, |_, _| true)
}

/// Like [`find_arrow`], but a candidate token is only taken when
/// `accept(token, text_after_token)` holds.
pub fn find_arrow_where<'a, T: Copy>(
    line: &'a str,
    table: &[(&'static str, T)],
    accept: impl Fn(&str, &str) -> bool,
) -> Option<ArrowMatch<'a, T>> {
    let mut in_quotes = false;
    let mut prev: Option<char> = None;

    for (idx, c) in line.char_indices() {
        if c == '"' {
            in_quotes = !in_quotes;
            prev = Some(c);
            continue;
        }
        if in_quotes {
            prev = Some(c);
            continue;
        }

        let rest = &line[idx..];
        let best = table
            .iter()
            .filter(|(token, _)| rest.starts_with(token))
            .filter(|(token, _)| {
                let starts_alnum = token.chars().next().is_some_and(|t| t.is_alphanumeric());
                !starts_alnum || !prev.is_some_and(|p| p.is_alphanumeric())
            })
            .filter(|(token, _)| accept(token, &rest[token.len()..]))
            .max_by_key(|(token, _)| token.len());

        if let Some((token, value)) = best {
            return Some(ArrowMatch {
                left: line[..idx].trim(),
                right: line[idx + token.len()..].trim(),
                token,
                value: *value,
            });
        }
        prev = Some(c);
    }
    None
}

fn direction_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"([-.])(?:up|down|left|right|do|le|ri|u|d|l|r)?(?:\[[^\]]*\])?([-.])")
            .expect("valid regex")
    })
}

/// Removes PlantUML layout and style hints from arrows: `-down->` becomes
/// `-->`, `.up.|>` becomes `..|>`, `-[#red]->` becomes `-->`.
pub fn strip_arrow_direction(line: &str) -> Cow<'_, str> {
    direction_regex().replace_all(line, "$1$2")
}

/// Whether `text` reads as a UML multiplicity (`1`, `0..*`, `n`, `many`).
pub fn is_multiplicity(text: &str) -> bool {
    let text = text.trim();
    if text.is_empty() {
        return false;
    }
    if text.eq_ignore_ascii_case("many") {
        return true;
    }
    let bound = |part: &str| {
        !part.is_empty()
            && (part == "*"
                || part == "n"
                || part == "m"
                || part.chars().all(|c| c.is_ascii_digit()))
    };
    match text.split_once("..") {
        Some((low, high)) => bound(low.trim()) && bound(high.trim()),
        None => bound(text),
    }
}

/// Strips one pair of surrounding double quotes.
pub fn strip_quotes(text: &str) -> &str {
    let text = text.trim();
    text.strip_prefix('"')
        .and_then(|t| t.strip_suffix('"'))
        .unwrap_or(text)
}

/// Lower-cases the first character.
pub fn lower_first(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Whether `line` is a comment in either dialect.
pub fn is_comment(line: &str) -> bool {
    line.starts_with('\'') || line.starts_with("%%") || line.starts_with("//")
}

/// Guesses the markup dialect of a diagram. Anything without PlantUML
/// `@startuml`/`@enduml` markers is read as Mermaid.
pub fn detect_diagram_format(source: &str) -> Dialect {
    if source.contains("@startuml") || source.contains("@enduml") {
        Dialect::PlantUml
    } else {
        Dialect::Mermaid
    }
}
