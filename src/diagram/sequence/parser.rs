use tracing::debug;

use crate::diagram::classify::{
    detect_diagram_format, find_arrow, find_arrow_where, is_comment, strip_quotes,
};
use crate::diagram::types::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ArrowSpec {
    kind: MessageKind,
    reverse: bool,
}

const fn call(reverse: bool) -> ArrowSpec {
    ArrowSpec {
        kind: MessageKind::Call,
        reverse,
    }
}

const fn response(reverse: bool) -> ArrowSpec {
    ArrowSpec {
        kind: MessageKind::Response,
        reverse,
    }
}

/// Message arrows; dotted arrows are responses.
const SEQUENCE_ARROWS: &[(&str, ArrowSpec)] = &[
    ("->>", call(false)),
    ("-->>", response(false)),
    ("->", call(false)),
    ("-->", response(false)),
    ("-x", call(false)),
    ("--x", response(false)),
    ("-)", call(false)),
    ("--)", response(false)),
    ("<-", call(true)),
    ("<--", response(true)),
];

const PARTICIPANT_KEYWORDS: &[&str] = &[
    "participant",
    "actor",
    "boundary",
    "control",
    "entity",
    "database",
    "collections",
    "queue",
];

const SKIPPED_PREFIXES: &[&str] = &[
    "@", "!", "sequenceDiagram", "title", "activate ", "deactivate ", "destroy ", "create ",
    "loop", "alt", "else", "opt", "par", "and ", "critical", "break", "rect", "end", "group",
    "box", "==", "...", "|||", "||", "skinparam", "hide ", "show ", "return", "ref ", "links ",
    "link ", "delay", "newpage", "header", "footer",
];

/// Parse a sequence diagram, detecting the dialect from the source.
pub fn parse(input: &str) -> SequenceDiagram {
    parse_with_dialect(input, detect_diagram_format(input))
}

/// Parse a sequence diagram written in `dialect`.
pub fn parse_with_dialect(input: &str, dialect: Dialect) -> SequenceDiagram {
    let mut diagram = SequenceDiagram::default();
    let mut in_note = false;

    for (idx, raw) in input.lines().enumerate() {
        let line = raw.trim();

        if in_note {
            in_note = !matches!(line, "end note" | "endnote" | "end hnote" | "end rnote");
            continue;
        }

        if line.is_empty() || is_comment(line) {
            continue;
        }

        if line.starts_with("autonumber") {
            diagram.has_autonumber = true;
            continue;
        }

        // Notes, one-line (`: text`) or multi-line until `end note`
        let lower = line.to_ascii_lowercase();
        if ["note ", "hnote ", "rnote "].iter().any(|p| lower.starts_with(p)) {
            in_note = dialect == Dialect::PlantUml && !line.contains(':');
            continue;
        }

        if let Some(participant) = parse_participant(line, dialect) {
            declare(&mut diagram, participant);
            continue;
        }

        if let Some(message) = parse_message(line) {
            for id in [&message.from, &message.to] {
                if !id.is_empty() && diagram.participant(id).is_none() {
                    diagram.participants.push(Participant::implicit(id));
                }
            }
            diagram.messages.push(message);
            continue;
        }

        if SKIPPED_PREFIXES.iter().any(|p| line.starts_with(p)) {
            continue;
        }

        debug!(line = idx + 1, text = line, "skipping unrecognized sequence diagram line");
    }

    diagram
}

fn declare(diagram: &mut SequenceDiagram, participant: Participant) {
    match diagram
        .participants
        .iter_mut()
        .find(|p| p.id == participant.id)
    {
        Some(existing) => *existing = participant,
        None => diagram.participants.push(participant),
    }
}

/// Parse a `participant`/`actor` style declaration.
fn parse_participant(line: &str, dialect: Dialect) -> Option<Participant> {
    let (keyword, rest) = line.split_once(char::is_whitespace)?;
    if !PARTICIPANT_KEYWORDS.contains(&keyword) {
        return None;
    }
    let is_actor = keyword == "actor";
    let rest = strip_decorations(rest.trim());
    if rest.is_empty() {
        return None;
    }

    // Quoted display name: participant "name:\nType" as alias
    if let Some(quoted) = rest.strip_prefix('"') {
        let end = quoted.find('"')?;
        let display = &quoted[..end];
        let after = quoted[end + 1..].trim();
        let id = after
            .strip_prefix("as")
            .map(|id| strip_quotes(id.trim()).to_string())
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| display.to_string());
        let (display_alias, type_name) = split_display(display, &id);
        return Some(Participant {
            id,
            display_alias,
            type_name,
            is_actor,
        });
    }

    let (first, alias) = match rest.split_once(" as ") {
        Some((first, alias)) => (first.trim(), Some(alias.trim())),
        None => (rest, None),
    };

    let participant = match (dialect, alias) {
        // PlantUML: participant L as "Long Name"
        (Dialect::PlantUml, Some(alias)) if alias.starts_with('"') => {
            let id = first.to_string();
            let (display_alias, type_name) = split_display(strip_quotes(alias), &id);
            Participant {
                id,
                display_alias,
                type_name,
                is_actor,
            }
        }
        // PlantUML: participant Long as L
        (Dialect::PlantUml, Some(alias)) => {
            let id = strip_quotes(alias).to_string();
            let (display_alias, type_name) = split_display(first, &id);
            Participant {
                id,
                display_alias,
                type_name,
                is_actor,
            }
        }
        // Mermaid: participant A as Alice: Service
        (Dialect::Mermaid, Some(alias)) => {
            let (alias, type_name) = match alias.split_once(':') {
                Some((alias, type_name)) => (alias.trim(), Some(type_name.trim().to_string())),
                None => (alias, None),
            };
            Participant {
                id: first.to_string(),
                display_alias: strip_quotes(alias).to_string(),
                type_name: type_name.filter(|t| !t.is_empty()),
                is_actor,
            }
        }
        (_, None) => {
            let id = strip_quotes(first).to_string();
            Participant {
                display_alias: id.clone(),
                id,
                type_name: None,
                is_actor,
            }
        }
    };
    Some(participant)
}

/// Drops PlantUML colors, stereotypes and ordering from a declaration.
fn strip_decorations(rest: &str) -> &str {
    let mut end = rest.len();
    for marker in [" #", " <<", " order "] {
        if let Some(pos) = rest.find(marker) {
            end = end.min(pos);
        }
    }
    rest[..end].trim()
}

/// `name:\nType` becomes `name` of type `Type`.
fn split_display(display: &str, id: &str) -> (String, Option<String>) {
    let pieces: Vec<&str> = display
        .split("\\n")
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect();
    match pieces.as_slice() {
        [name, rest @ ..] if name.ends_with(':') && !rest.is_empty() => {
            let name = name.trim_end_matches(':').trim();
            let name = if name.is_empty() { id } else { name };
            (name.to_string(), Some(rest.join(" ")))
        }
        _ if pieces.is_empty() => (id.to_string(), None),
        _ => (pieces.join(" "), None),
    }
}

/// `-x` and `-)` end an arrow only when no other arrow follows them, so
/// `web-x->>B` and `box-xyz->B` keep their participant names.
fn is_arrow_head(token: &str, after: &str) -> bool {
    if !token.ends_with(['x', ')']) {
        return true;
    }
    let target = after.split_once(':').map_or(after, |(target, _)| target);
    find_arrow(target, SEQUENCE_ARROWS).is_none()
}

/// Parse one message line such as `A->>+B: hello()` or `[-> A : start`.
pub(crate) fn parse_message(line: &str) -> Option<Message> {
    let (is_external_origin, line) = match line.strip_prefix('[') {
        Some(rest) => (true, rest),
        None => (false, line),
    };

    let found = find_arrow_where(line, SEQUENCE_ARROWS, is_arrow_head)?;
    let (target, text) = match found.right.split_once(':') {
        Some((target, text)) => (target, text.trim()),
        None => (found.right, ""),
    };
    if target.trim_start().starts_with(']') {
        debug!(line, "skipping message to an external receiver");
        return None;
    }

    let target = clean_target(target);
    if !is_participant_ref(found.left) || !is_participant_ref(target) {
        return None;
    }
    let left = strip_quotes(found.left).to_string();
    let right = strip_quotes(target).to_string();
    let spec = found.value;
    let (from, to) = if spec.reverse {
        (right, left)
    } else {
        (left, right)
    };

    if to.is_empty() || (from.is_empty() && !is_external_origin) {
        return None;
    }

    let text = strip_quotes(text).to_string();
    Some(Message {
        is_method_call: text.contains('(') && text.contains(')'),
        from: if is_external_origin { String::new() } else { from },
        to,
        text,
        kind: spec.kind,
        is_external_origin,
    })
}

/// Strips Mermaid `+`/`-` activation and PlantUML `++`/`--`/`**`/`!!` markers.
fn clean_target(target: &str) -> &str {
    let target = target.trim().trim_start_matches(['+', '-']).trim();
    target
        .trim_end_matches(|c: char| matches!(c, '+' | '-' | '*' | '!') || c.is_whitespace())
        .trim()
}

/// A bare id or a quoted display name.
fn is_participant_ref(text: &str) -> bool {
    text.starts_with('"') || !text.contains(char::is_whitespace)
}
