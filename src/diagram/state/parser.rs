use std::sync::OnceLock;

use regex::Regex;
use tracing::debug;

use crate::diagram::classify::{find_arrow, is_comment, strip_arrow_direction, strip_quotes};
use crate::diagram::types::*;

const PSEUDO_STATE: &str = "[*]";

pub(crate) const STATE_ARROWS: &[(&str, ())] = &[("-->", ()), ("->", ())];

fn labelled_state_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"^state\s+"([^"]+)"\s+as\s+([^\s{:#<]+)"#).expect("valid regex"))
}

fn aliased_state_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"^state\s+([^\s{:#<"]+)\s+as\s+"([^"]+)""#).expect("valid regex")
    })
}

fn simple_state_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^state\s+([^\s{:#<]+)").expect("valid regex"))
}

/// `Name : description` lines.
fn description_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^([\w.]+)\s*:\s*(.+)$").expect("valid regex"))
}

fn is_skipped(line: &str) -> bool {
    const PREFIXES: &[&str] = &[
        "@", "!", "hide ", "skinparam", "title ", "stateDiagram", "direction ", "scale ",
        "header", "footer", "caption ", "classDef ", "class ", "style ",
    ];
    line == "--" || line == "||" || PREFIXES.iter().any(|p| line.starts_with(p))
}

/// Parse a PlantUML or Mermaid state diagram.
pub fn parse(input: &str) -> StateDiagram {
    let mut diagram = StateDiagram::default();
    let mut depth = 0usize;
    let mut in_note = false;

    for (idx, raw) in input.lines().enumerate() {
        let line_no = idx + 1;
        let line = raw.trim();

        if in_note {
            in_note = !(line == "end note" || line == "endnote");
            continue;
        }
        if line.is_empty() || is_comment(line) || is_skipped(line) {
            continue;
        }
        if line.starts_with("note ") {
            // Single-line notes carry their text after a colon
            in_note = !line.contains(':');
            continue;
        }
        if line == "}" {
            depth = depth.saturating_sub(1);
            continue;
        }

        // Transitions
        if let Some((from, to, label)) = parse_transition(line) {
            add_transition(&mut diagram, from, to, label, depth);
            continue;
        }

        // State declarations
        if line.starts_with("state ") {
            if let Some(caps) = labelled_state_regex().captures(line) {
                declare(&mut diagram, &caps[2], Some(&caps[1]));
            } else if let Some(caps) = aliased_state_regex().captures(line) {
                declare(&mut diagram, &caps[1], Some(&caps[2]));
            } else if let Some(caps) = simple_state_regex().captures(line) {
                declare(&mut diagram, &caps[1], None);
            }
            if line.ends_with('{') {
                depth += 1;
            }
            continue;
        }

        if let Some(caps) = description_regex().captures(line) {
            diagram.states.insert(caps[1].to_string());
            continue;
        }

        debug!(line = line_no, text = line, "skipping unrecognized state diagram line");
    }

    diagram
}

fn declare(diagram: &mut StateDiagram, name: &str, label: Option<&str>) {
    diagram.states.insert(name.to_string());
    if let Some(label) = label {
        diagram.labels.insert(name.to_string(), label.to_string());
    }
}

/// Splits `A --> B : label` into its ends and optional label.
pub(crate) fn parse_transition(line: &str) -> Option<(String, String, Option<String>)> {
    let line = strip_arrow_direction(line);
    let (body, label) = match line.split_once(':') {
        Some((body, label)) => (body, Some(label.trim())),
        None => (line.as_ref(), None),
    };
    let arrow = find_arrow(body, STATE_ARROWS)?;
    let from = state_ref(arrow.left)?;
    let to = state_ref(arrow.right)?;
    let label = label
        .map(|l| strip_quotes(l).to_string())
        .filter(|l| !l.is_empty());
    Some((from, to, label))
}

/// A single state name; anything with spaces is not a transition end.
fn state_ref(text: &str) -> Option<String> {
    let text = strip_quotes(text.trim());
    if text.is_empty() || text.contains(char::is_whitespace) {
        return None;
    }
    Some(text.to_string())
}

fn add_transition(
    diagram: &mut StateDiagram,
    from: String,
    to: String,
    label: Option<String>,
    depth: usize,
) {
    match (from.as_str(), to.as_str()) {
        (PSEUDO_STATE, PSEUDO_STATE) => {}
        (PSEUDO_STATE, _) => {
            if depth == 0 {
                diagram.initial_state = Some(to.clone());
            }
            diagram.states.insert(to);
        }
        (_, PSEUDO_STATE) => {
            if depth == 0 {
                diagram.final_states.insert(from.clone());
            }
            diagram.states.insert(from);
        }
        _ => {
            diagram.states.insert(from.clone());
            diagram.states.insert(to.clone());
            diagram.transitions.push(Transition { from, to, label });
        }
    }
}
