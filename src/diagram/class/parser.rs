use std::sync::OnceLock;

use regex::Regex;
use tracing::debug;

use crate::diagram::classify::{
    Visibility, detect_diagram_format, find_arrow, is_comment, is_multiplicity,
    strip_arrow_direction, strip_quotes,
};
use crate::diagram::types::*;

/// How an arrow token reads: relation kind plus whether `from` sits on the
/// right-hand side of the token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ArrowSpec {
    pub kind: RelationKind,
    pub reverse: bool,
}

const fn arrow(kind: RelationKind, reverse: bool) -> ArrowSpec {
    ArrowSpec { kind, reverse }
}

/// Relation arrows. For composition and aggregation the diamond marks the
/// whole, which becomes `from`.
pub(crate) const CLASS_ARROWS: &[(&str, ArrowSpec)] = &[
    ("--|>", arrow(RelationKind::Inheritance, false)),
    ("<|--", arrow(RelationKind::Inheritance, true)),
    ("-|>", arrow(RelationKind::Inheritance, false)),
    ("<|-", arrow(RelationKind::Inheritance, true)),
    ("..|>", arrow(RelationKind::Implementation, false)),
    ("<|..", arrow(RelationKind::Implementation, true)),
    (".|>", arrow(RelationKind::Implementation, false)),
    ("<|.", arrow(RelationKind::Implementation, true)),
    ("*--", arrow(RelationKind::Composition, false)),
    ("--*", arrow(RelationKind::Composition, true)),
    ("o--", arrow(RelationKind::Aggregation, false)),
    ("--o", arrow(RelationKind::Aggregation, true)),
    ("<-->", arrow(RelationKind::Association, false)),
    ("-->", arrow(RelationKind::Association, false)),
    ("<--", arrow(RelationKind::Association, true)),
    ("->", arrow(RelationKind::Association, false)),
    ("<-", arrow(RelationKind::Association, true)),
    ("..>", arrow(RelationKind::Dependency, false)),
    ("<..", arrow(RelationKind::Dependency, true)),
    (".>", arrow(RelationKind::Dependency, false)),
    ("<.", arrow(RelationKind::Dependency, true)),
    ("--", arrow(RelationKind::Association, false)),
    ("..", arrow(RelationKind::Dependency, false)),
];

enum Frame {
    Class(String),
    Group(String),
}

struct PendingNote {
    class_name: String,
    line: usize,
    text: Vec<String>,
}

/// Parse a class diagram, detecting the dialect from the source.
pub fn parse(input: &str) -> ClassDiagram {
    parse_with_dialect(input, detect_diagram_format(input))
}

/// Parse a class diagram written in `dialect`.
pub fn parse_with_dialect(input: &str, dialect: Dialect) -> ClassDiagram {
    let mut diagram = ClassDiagram::default();
    let mut stack: Vec<Frame> = Vec::new();
    let mut note: Option<PendingNote> = None;

    for (idx, raw) in input.lines().enumerate() {
        let line_no = idx + 1;
        let line = raw.trim();

        // Multi-line note body
        if let Some(pending) = note.as_mut() {
            if is_end_note(line) {
                if let Some(done) = note.take() {
                    diagram.notes.push(Note {
                        class_name: done.class_name,
                        text: done.text.join(" "),
                    });
                }
            } else if !line.is_empty() {
                pending.text.push(line.to_string());
            }
            continue;
        }

        if line.is_empty() || is_comment(line) || is_directive(line) {
            continue;
        }

        if line.starts_with('}') {
            match stack.pop() {
                Some(_) => {}
                None => diagram.diagnostics.push(Diagnostic {
                    line: line_no,
                    message: "closing brace without an open block".to_string(),
                }),
            }
            continue;
        }

        // Class body
        if let Some(Frame::Class(name)) = stack.last() {
            let name = name.clone();
            if let Some(stereo) = standalone_stereotype(line) {
                class_entry(&mut diagram, &name).stereotype = Some(Stereotype::from_label(stereo));
                continue;
            }
            add_member(&mut diagram, &name, line, dialect);
            continue;
        }

        // Notes
        if let Some((class_name, text)) = parse_note(line) {
            match text {
                Some(text) => diagram.notes.push(Note { class_name, text }),
                None => {
                    note = Some(PendingNote {
                        class_name,
                        line: line_no,
                        text: Vec::new(),
                    })
                }
            }
            continue;
        }
        if line.starts_with("note ") {
            debug!(line = line_no, "skipping note without a class");
            continue;
        }

        // package / namespace groups
        if let Some(group) = parse_group(line) {
            stack.push(Frame::Group(group));
            continue;
        }

        // Class declaration
        if let Some(decl) = parse_class_decl(line) {
            let entry = class_entry(&mut diagram, &decl.name);
            if decl.stereotype.is_some() {
                entry.stereotype = decl.stereotype;
            }
            for (parent, kind) in decl.parents {
                class_entry(&mut diagram, &parent);
                diagram.relations.push(Relation {
                    from: decl.name.clone(),
                    to: parent,
                    kind,
                    label: None,
                    multiplicity_from: None,
                    multiplicity_to: None,
                    reverse: false,
                });
            }
            for member in &decl.inline_members {
                add_member(&mut diagram, &decl.name, member, dialect);
            }
            if decl.opens_body {
                stack.push(Frame::Class(decl.name));
            }
            continue;
        }

        // Mermaid annotation on its own line: <<interface>> Shape
        if let Some((stereo, name)) = annotation_line(line) {
            class_entry(&mut diagram, name).stereotype = Some(Stereotype::from_label(stereo));
            continue;
        }

        // Relation
        if let Some(relation) = parse_relation(line) {
            class_entry(&mut diagram, &relation.from);
            class_entry(&mut diagram, &relation.to);
            diagram.relations.push(relation);
            continue;
        }

        // Mermaid one-line member: Shape : +area() double
        if let Some((name, member)) = one_line_member(line) {
            add_member(&mut diagram, name, member, dialect);
            continue;
        }

        // Unrecognized lines are ignored
        debug!(line = line_no, text = line, "skipping unrecognized class diagram line");
    }

    if let Some(pending) = note {
        diagram.diagnostics.push(Diagnostic {
            line: pending.line,
            message: format!("note for `{}` is never closed with `end note`", pending.class_name),
        });
    }
    for frame in stack.into_iter().rev() {
        let message = match frame {
            Frame::Class(name) => format!("class `{name}` is missing a closing brace"),
            Frame::Group(name) => format!("group `{name}` is missing a closing brace"),
        };
        debug!(%message, "unterminated block");
        diagram.diagnostics.push(Diagnostic {
            line: input.lines().count(),
            message,
        });
    }

    diagram
}

fn is_directive(line: &str) -> bool {
    const PREFIXES: &[&str] = &[
        "@", "!", "classDiagram", "direction", "hide ", "show ", "skinparam", "style ",
        "title ", "left to right", "top to bottom", "classDef ", "cssClass ", "click ",
        "link ", "callback ", "set ", "scale ", "caption ",
    ];
    PREFIXES.iter().any(|p| line.starts_with(p))
}

fn is_end_note(line: &str) -> bool {
    line == "end note" || line == "endnote"
}

fn class_entry<'a>(diagram: &'a mut ClassDiagram, name: &str) -> &'a mut ClassDef {
    diagram
        .classes
        .entry(name.to_string())
        .or_insert_with(|| ClassDef::new(name))
}

fn standalone_stereotype(line: &str) -> Option<&str> {
    let inner = line.strip_prefix("<<")?.strip_suffix(">>")?;
    Some(inner.trim())
}

fn annotation_line(line: &str) -> Option<(&str, &str)> {
    let rest = line.strip_prefix("<<")?;
    let end = rest.find(">>")?;
    let name = rest[end + 2..].trim();
    if name.is_empty() || !is_class_name(name) {
        return None;
    }
    Some((rest[..end].trim(), name))
}

fn is_class_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '_' | '.' | '$' | ':'))
}

fn note_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r#"^note\s+(?:for\s+([\w.]+)\s+"(.*)"|(?:left|right|top|bottom)\s+of\s+([\w.]+)\s*(?::\s*(.*))?)$"#,
        )
        .expect("valid regex")
    })
}

/// Returns the class and, for one-line notes, the text. `None` text starts a
/// multi-line note.
fn parse_note(line: &str) -> Option<(String, Option<String>)> {
    let caps = note_regex().captures(line)?;
    if let Some(class) = caps.get(1) {
        let text = caps.get(2).map(|m| m.as_str()).unwrap_or("");
        return Some((class.as_str().to_string(), Some(clean_note(text))));
    }
    let class = caps.get(3)?.as_str().to_string();
    let text = caps.get(4).map(|m| clean_note(m.as_str()));
    Some((class, text))
}

fn clean_note(text: &str) -> String {
    text.replace("\\n", " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn parse_group(line: &str) -> Option<String> {
    let rest = ["package ", "namespace ", "together"]
        .iter()
        .find_map(|kw| line.strip_prefix(kw))?;
    let rest = rest.trim().strip_suffix('{')?;
    Some(strip_quotes(rest.trim()).to_string())
}

struct ClassDecl {
    name: String,
    stereotype: Option<Stereotype>,
    parents: Vec<(String, RelationKind)>,
    opens_body: bool,
    inline_members: Vec<String>,
}

fn parse_class_decl(line: &str) -> Option<ClassDecl> {
    const KEYWORDS: &[(&str, Option<Stereotype>)] = &[
        ("abstract class ", Some(Stereotype::Abstract)),
        ("abstract ", Some(Stereotype::Abstract)),
        ("class ", None),
        ("interface ", Some(Stereotype::Interface)),
        ("enumeration ", Some(Stereotype::Enumeration)),
        ("enum ", Some(Stereotype::Enumeration)),
        ("entity ", None),
        ("annotation ", None),
    ];
    let (rest, mut stereotype) = KEYWORDS
        .iter()
        .find_map(|(kw, st)| line.strip_prefix(kw).map(|rest| (rest.trim(), st.clone())))?;

    let mut rest = rest.to_string();

    // Body markers
    let mut opens_body = false;
    let mut inline_members = Vec::new();
    if let Some(stripped) = rest.strip_suffix('{') {
        rest = stripped.trim().to_string();
        opens_body = true;
    } else if let Some(stripped) = rest.strip_suffix('}')
        && let Some(open) = stripped.find('{')
    {
        // One-line body: class Foo { +x: int; +y(): void }
        inline_members = stripped[open + 1..]
            .split(';')
            .map(str::trim)
            .filter(|member| !member.is_empty())
            .map(str::to_string)
            .collect();
        rest = stripped[..open].trim().to_string();
    }

    // <<stereotype>> anywhere in the declaration
    if let (Some(start), Some(end)) = (rest.find("<<"), rest.find(">>"))
        && start < end
    {
        stereotype = Some(Stereotype::from_label(&rest[start + 2..end]));
        rest = format!("{} {}", &rest[..start], &rest[end + 2..]);
    }

    // Mermaid style class suffix and label
    if let Some(pos) = rest.find(":::") {
        rest.truncate(pos);
    }
    if let Some(pos) = rest.find('[') {
        rest.truncate(pos);
    }

    let rest = rest.trim();
    let (raw_name, after) = if let Some(quoted) = rest.strip_prefix('"') {
        let end = quoted.find('"')?;
        (&quoted[..end], quoted[end + 1..].trim())
    } else {
        let end = rest
            .find(|c: char| c.is_whitespace() || c == '<' || c == '~')
            .unwrap_or(rest.len());
        (&rest[..end], skip_generic(&rest[end..]))
    };

    let mut name = raw_name.trim().to_string();
    let mut parents = Vec::new();
    let mut tokens = after.split_whitespace().peekable();
    while let Some(token) = tokens.next() {
        match token {
            "as" => {
                if let Some(alias) = tokens.next() {
                    name = alias.to_string();
                }
            }
            "extends" | "implements" => {
                let kind = if token == "extends" {
                    RelationKind::Inheritance
                } else {
                    RelationKind::Implementation
                };
                while let Some(next) = tokens.peek() {
                    if *next == "extends" || *next == "implements" {
                        break;
                    }
                    for parent in next.split(',').filter(|p| !p.is_empty()) {
                        parents.push((parent.to_string(), kind));
                    }
                    tokens.next();
                }
            }
            _ => {}
        }
    }

    if !is_class_name(&name) && !raw_name.contains(' ') {
        return None;
    }
    if name.is_empty() {
        return None;
    }
    Some(ClassDecl {
        name,
        stereotype,
        parents,
        opens_body,
        inline_members,
    })
}

/// Skips a `<T>` or `~T~` generic suffix right after a class name.
fn skip_generic(rest: &str) -> &str {
    let (open, close) = match rest.chars().next() {
        Some('<') => ('<', '>'),
        Some('~') => ('~', '~'),
        _ => return rest.trim(),
    };
    let mut depth = 0usize;
    for (idx, c) in rest.char_indices() {
        if c == open && (open != close || depth == 0) {
            depth += 1;
        } else if c == close {
            depth = depth.saturating_sub(1);
            if depth == 0 {
                return rest[idx + c.len_utf8()..].trim();
            }
        }
    }
    ""
}

fn one_line_member(line: &str) -> Option<(&str, &str)> {
    let (name, member) = line.split_once(':')?;
    let name = name.trim();
    if !is_class_name(name) {
        return None;
    }
    let member = member.trim();
    if member.is_empty() {
        return None;
    }
    Some((name, member))
}

fn add_member(diagram: &mut ClassDiagram, class_name: &str, text: &str, dialect: Dialect) {
    let class = class_entry(diagram, class_name);
    match parse_member(text, dialect) {
        Some(Member::Method(method)) => class.methods.push(method),
        Some(Member::Attribute(attr)) => class.attributes.push(attr),
        None => debug!(class = class_name, text, "skipping empty member"),
    }
}

#[derive(Debug, PartialEq)]
pub(crate) enum Member {
    Attribute(Attribute),
    Method(Method),
}

/// Parse one member line of a class body.
pub(crate) fn parse_member(text: &str, dialect: Dialect) -> Option<Member> {
    let mut text = text.trim().to_string();
    let mut force_field = false;
    for modifier in ["{static}", "{abstract}", "{classifier}", "{field}", "{method}"] {
        if text.contains(modifier) {
            force_field |= modifier == "{field}";
            text = text.replace(modifier, " ");
        }
    }
    let text = text.trim();
    // Separators: -- .. == __, optionally with a title
    if ["--", "..", "==", "__"].iter().any(|sep| text.starts_with(sep)) {
        return None;
    }
    let (visibility, body) = Visibility::split(text);
    let body = body.trim().trim_end_matches(['$', '*']).trim();
    if body.is_empty() {
        return None;
    }

    if !force_field
        && let (Some(open), Some(close)) = (body.find('('), body.rfind(')'))
        && open < close
    {
        return Some(Member::Method(parse_method(visibility, body, open, close)));
    }

    Some(Member::Attribute(parse_attribute(visibility, body, dialect)))
}

fn parse_method(visibility: Visibility, body: &str, open: usize, close: usize) -> Method {
    let head = body[..open].trim();
    let (return_prefix, name) = match head.rsplit_once(char::is_whitespace) {
        Some((ret, name)) => (Some(ret.trim().to_string()), name.trim()),
        None => (None, head),
    };

    let after = body[close + 1..].trim().trim_start_matches(['$', '*']).trim();
    let after = after.strip_prefix(':').unwrap_or(after).trim();
    let return_type = if after.is_empty() {
        return_prefix
    } else {
        Some(after.to_string())
    };

    Method {
        visibility,
        name: name.to_string(),
        parameters: parse_parameters(&body[open + 1..close]),
        return_type,
    }
}

fn parse_attribute(visibility: Visibility, body: &str, dialect: Dialect) -> Attribute {
    if let Some((name, type_name)) = body.split_once(':') {
        let type_name = type_name.trim();
        return Attribute {
            visibility,
            name: name.trim().to_string(),
            type_name: (!type_name.is_empty()).then(|| type_name.to_string()),
        };
    }

    // Mermaid puts the type first: String name
    let tokens: Vec<&str> = body.split_whitespace().collect();
    if dialect == Dialect::Mermaid && tokens.len() == 2 {
        return Attribute {
            visibility,
            name: tokens[1].to_string(),
            type_name: Some(tokens[0].to_string()),
        };
    }

    Attribute {
        visibility,
        name: body.to_string(),
        type_name: None,
    }
}

/// Splits on `,` or `;` outside of generic brackets.
fn parse_parameters(text: &str) -> Vec<Parameter> {
    let mut params = Vec::new();
    let mut depth = 0i32;
    let mut start = 0;
    for (idx, c) in text.char_indices() {
        match c {
            '<' | '[' | '{' => depth += 1,
            '>' | ']' | '}' => depth -= 1,
            ',' | ';' if depth <= 0 => {
                params.extend(parse_parameter(&text[start..idx]));
                start = idx + 1;
            }
            _ => {}
        }
    }
    params.extend(parse_parameter(&text[start..]));
    params
}

fn parse_parameter(text: &str) -> Option<Parameter> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    if let Some((name, type_name)) = text.split_once(':') {
        let type_name = type_name.trim();
        return Some(Parameter {
            name: name.trim().to_string(),
            type_name: (!type_name.is_empty()).then(|| type_name.to_string()),
        });
    }
    match text.rsplit_once(char::is_whitespace) {
        Some((type_name, name)) => Some(Parameter {
            name: name.trim().to_string(),
            type_name: Some(type_name.trim().to_string()),
        }),
        None => Some(Parameter {
            name: text.to_string(),
            type_name: None,
        }),
    }
}

/// Parse a relation line such as `Foo "1" *-- "many" Bar : owns >`.
pub(crate) fn parse_relation(line: &str) -> Option<Relation> {
    let line = strip_arrow_direction(line);
    let found = find_arrow(&line, CLASS_ARROWS)?;

    let (right, label) = split_label(found.right);
    let left = parse_end(found.left, true)?;
    let right = parse_end(right, false)?;

    // A quoted text that is not a multiplicity doubles as the label
    let mut label = label;
    if label.is_none() {
        label = left.role.clone().or_else(|| right.role.clone());
    }

    let spec = found.value;
    let (from, to) = if spec.reverse {
        (right, left)
    } else {
        (left, right)
    };

    Some(Relation {
        from: from.name,
        to: to.name,
        kind: spec.kind,
        label,
        multiplicity_from: from.multiplicity,
        multiplicity_to: to.multiplicity,
        reverse: spec.reverse,
    })
}

struct RelationEnd {
    name: String,
    multiplicity: Option<String>,
    role: Option<String>,
}

/// Splits `"*" Bar : label` into the end and the label, ignoring `:` inside
/// quotes.
fn split_label(text: &str) -> (&str, Option<String>) {
    let mut in_quotes = false;
    for (idx, c) in text.char_indices() {
        match c {
            '"' => in_quotes = !in_quotes,
            ':' if !in_quotes => {
                let label = text[idx + 1..]
                    .trim()
                    .trim_start_matches(['<', '>'])
                    .trim_end_matches(['<', '>'])
                    .trim();
                let label = strip_quotes(label);
                return (
                    text[..idx].trim(),
                    (!label.is_empty()).then(|| label.to_string()),
                );
            }
            _ => {}
        }
    }
    (text.trim(), None)
}

/// One side of a relation: a class name plus optional quoted texts.
/// On the left the name comes first, on the right the quotes come first.
fn parse_end(text: &str, is_left: bool) -> Option<RelationEnd> {
    let mut name: Option<&str> = None;
    let mut quoted: Vec<&str> = Vec::new();
    let mut rest = text.trim();

    while !rest.is_empty() {
        if let Some(inner) = rest.strip_prefix('"') {
            let end = inner.find('"')?;
            quoted.push(inner[..end].trim());
            rest = inner[end + 1..].trim_start();
        } else {
            let end = rest
                .find(|c: char| c.is_whitespace() || c == '"')
                .unwrap_or(rest.len());
            if name.is_some() {
                return None;
            }
            name = Some(&rest[..end]);
            rest = rest[end..].trim_start();
        }
    }

    let name = name?;
    if !is_class_name(name) {
        return None;
    }
    // The quote nearest the arrow belongs to the arrow end
    if is_left {
        quoted.reverse();
    }

    let mut multiplicity = None;
    let mut role = None;
    for text in quoted {
        if multiplicity.is_none() && is_multiplicity(text) {
            multiplicity = Some(text.to_string());
        } else if role.is_none() && !text.is_empty() {
            role = Some(text.to_string());
        }
    }

    Some(RelationEnd {
        name: name.to_string(),
        multiplicity,
        role,
    })
}
