use tracing::debug;

use crate::diagram::classify::{is_comment, strip_quotes};
use crate::diagram::types::*;

/// An open block. Elements are always pushed into the innermost frame.
#[derive(Debug)]
enum Frame {
    Partition {
        name: String,
        elements: Vec<ActivityElement>,
    },
    If {
        condition: String,
        yes: Vec<ActivityElement>,
        no: Vec<ActivityElement>,
        in_else: bool,
        /// Opened by `elseif`; closed by the same `endif` as its parent.
        chained: bool,
    },
    While {
        condition: String,
        value: Option<String>,
        elements: Vec<ActivityElement>,
    },
    Repeat {
        elements: Vec<ActivityElement>,
    },
    Fork {
        branches: Vec<Vec<ActivityElement>>,
        current: Vec<ActivityElement>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FrameKind {
    Partition,
    If,
    While,
    Repeat,
    Fork,
}

impl Frame {
    fn kind(&self) -> FrameKind {
        match self {
            Frame::Partition { .. } => FrameKind::Partition,
            Frame::If { .. } => FrameKind::If,
            Frame::While { .. } => FrameKind::While,
            Frame::Repeat { .. } => FrameKind::Repeat,
            Frame::Fork { .. } => FrameKind::Fork,
        }
    }

    fn describe(&self) -> String {
        match self {
            Frame::Partition { name, .. } => format!("partition `{name}`"),
            Frame::If { condition, .. } => format!("if `{condition}`"),
            Frame::While { condition, .. } => format!("while `{condition}`"),
            Frame::Repeat { .. } => "repeat".to_string(),
            Frame::Fork { .. } => "fork".to_string(),
        }
    }

    fn target(&mut self) -> &mut Vec<ActivityElement> {
        match self {
            Frame::Partition { elements, .. }
            | Frame::While { elements, .. }
            | Frame::Repeat { elements } => elements,
            Frame::If { yes, no, in_else, .. } => {
                if *in_else {
                    no
                } else {
                    yes
                }
            }
            Frame::Fork { current, .. } => current,
        }
    }
}

struct Parser {
    root: Vec<ActivityElement>,
    stack: Vec<(Frame, usize)>,
    diagnostics: Vec<Diagnostic>,
}

impl Parser {
    fn push(&mut self, element: ActivityElement) {
        match self.stack.last_mut() {
            Some((frame, _)) => frame.target().push(element),
            None => self.root.push(element),
        }
    }

    fn open(&mut self, frame: Frame, line: usize) {
        self.stack.push((frame, line));
    }

    fn diagnostic(&mut self, line: usize, message: String) {
        debug!(line, %message, "activity diagram diagnostic");
        self.diagnostics.push(Diagnostic { line, message });
    }

    /// Pops up to and including the innermost frame of `kind`. Frames above
    /// it were never closed and are dropped with their contents.
    fn close(&mut self, kind: FrameKind, line: usize, keyword: &str) -> Option<Frame> {
        let Some(pos) = self.stack.iter().rposition(|(f, _)| f.kind() == kind) else {
            self.diagnostic(line, format!("`{keyword}` without a matching block"));
            return None;
        };
        while self.stack.len() > pos + 1 {
            if let Some((dropped, opened)) = self.stack.pop() {
                self.diagnostic(
                    opened,
                    format!("{} is never closed before `{keyword}`", dropped.describe()),
                );
            }
        }
        self.stack.pop().map(|(frame, _)| frame)
    }

    fn top_kind(&self) -> Option<FrameKind> {
        self.stack.last().map(|(f, _)| f.kind())
    }
}

/// Parse a PlantUML activity diagram.
pub fn parse(input: &str) -> ActivityDiagram {
    let mut p = Parser {
        root: Vec::new(),
        stack: Vec::new(),
        diagnostics: Vec::new(),
    };
    let mut pending: Option<(Vec<String>, usize)> = None;
    let mut in_note = false;

    for (idx, raw) in input.lines().enumerate() {
        let line_no = idx + 1;
        let line = raw.trim();

        // Multi-line activity, continued until a line ending in `;`
        if let Some((parts, _)) = pending.as_mut() {
            match line.strip_suffix(';') {
                Some(last) => {
                    parts.push(last.to_string());
                    if let Some((parts, _)) = pending.take() {
                        p.push(activity(&parts.join(" ")));
                    }
                }
                None => parts.push(line.to_string()),
            }
            continue;
        }

        if in_note {
            in_note = !(line == "end note" || line == "endnote");
            continue;
        }

        if line.is_empty() || is_comment(line) || is_skipped(line) {
            continue;
        }

        if is_note_start(line) {
            in_note = !line.contains(':');
            continue;
        }

        // Activities
        if let Some(body) = line
            .strip_prefix(':')
            .or_else(|| line.strip_prefix("backward").and_then(|r| r.trim().strip_prefix(':')))
        {
            match strip_terminator(body) {
                Some(text) => p.push(activity(text)),
                None => pending = Some((vec![body.to_string()], line_no)),
            }
            continue;
        }

        match line {
            "start" => {
                p.push(ActivityElement::Start);
                continue;
            }
            "stop" => {
                p.push(ActivityElement::Stop);
                continue;
            }
            "end" => {
                p.push(ActivityElement::End);
                continue;
            }
            _ => {}
        }

        let keyword = leading_keyword(line);

        // if / elseif / else / endif
        if keyword == "if" {
            let condition = paren_group(&line[2..]).map(|(c, _)| c).unwrap_or("");
            p.open(
                Frame::If {
                    condition: clean_text(condition),
                    yes: Vec::new(),
                    no: Vec::new(),
                    in_else: false,
                    chained: false,
                },
                line_no,
            );
            continue;
        }
        if keyword == "elseif" || line.starts_with("else if") {
            let rest = line.trim_start_matches("elseif").trim_start_matches("else if");
            let condition = paren_group(rest).map(|(c, _)| c).unwrap_or("");
            match p.stack.last_mut() {
                Some((Frame::If { in_else, .. }, _)) => *in_else = true,
                _ => {
                    p.diagnostic(line_no, "`elseif` without a matching `if`".to_string());
                    continue;
                }
            }
            p.open(
                Frame::If {
                    condition: clean_text(condition),
                    yes: Vec::new(),
                    no: Vec::new(),
                    in_else: false,
                    chained: true,
                },
                line_no,
            );
            continue;
        }
        if keyword == "else" {
            match p.stack.last_mut() {
                Some((Frame::If { in_else, .. }, _)) => *in_else = true,
                _ => p.diagnostic(line_no, "`else` without a matching `if`".to_string()),
            }
            continue;
        }
        if keyword == "endif" || line.starts_with("end if") {
            close_if(&mut p, line_no);
            continue;
        }

        // while / endwhile
        if keyword == "while" {
            let (condition, rest) = paren_group(&line[5..]).unwrap_or(("", ""));
            let value = rest
                .trim()
                .strip_prefix("is")
                .and_then(paren_group)
                .map(|(v, _)| clean_text(v));
            p.open(
                Frame::While {
                    condition: clean_text(condition),
                    value,
                    elements: Vec::new(),
                },
                line_no,
            );
            continue;
        }
        if keyword == "endwhile" || line.starts_with("end while") {
            let rest = line.trim_start_matches("endwhile").trim_start_matches("end while");
            let exit_condition = paren_group(rest).map(|(e, _)| clean_text(e));
            if let Some(Frame::While {
                condition,
                value,
                elements,
            }) = p.close(FrameKind::While, line_no, "endwhile")
            {
                p.push(ActivityElement::While {
                    condition,
                    condition_value: value,
                    exit_condition,
                    elements,
                });
            }
            continue;
        }

        // repeat / repeat while
        if line.starts_with("repeat while") || line.starts_with("repeatwhile") {
            let rest = line.trim_start_matches("repeat while").trim_start_matches("repeatwhile");
            let condition = paren_group(rest).map(|(c, _)| clean_text(c)).unwrap_or_default();
            if let Some(Frame::Repeat { elements }) =
                p.close(FrameKind::Repeat, line_no, "repeat while")
            {
                p.push(ActivityElement::Repeat {
                    condition,
                    elements,
                });
            }
            continue;
        }
        if keyword == "repeat" {
            p.open(
                Frame::Repeat {
                    elements: Vec::new(),
                },
                line_no,
            );
            if let Some(text) = line[6..]
                .trim()
                .strip_prefix(':')
                .and_then(strip_terminator)
            {
                p.push(activity(text));
            }
            continue;
        }

        // fork / split
        if matches!(line, "fork again" | "split again") {
            match p.stack.last_mut() {
                Some((Frame::Fork { branches, current }, _)) => {
                    branches.push(std::mem::take(current));
                }
                _ => p.diagnostic(line_no, format!("`{line}` outside a fork")),
            }
            continue;
        }
        if is_fork_end(line) {
            if let Some(Frame::Fork {
                mut branches,
                current,
            }) = p.close(FrameKind::Fork, line_no, line)
            {
                branches.push(current);
                p.push(ActivityElement::Fork { branches });
            }
            continue;
        }
        if matches!(line, "fork" | "split") {
            p.open(
                Frame::Fork {
                    branches: Vec::new(),
                    current: Vec::new(),
                },
                line_no,
            );
            continue;
        }

        // partition
        if keyword == "partition" {
            let name = line[9..].trim().trim_end_matches('{').trim();
            p.open(
                Frame::Partition {
                    name: strip_quotes(name).to_string(),
                    elements: Vec::new(),
                },
                line_no,
            );
            continue;
        }
        if line == "}" || line == "end partition" {
            if line == "}" && p.top_kind() != Some(FrameKind::Partition) {
                debug!(line = line_no, "closing brace outside a partition");
            }
            if let Some(Frame::Partition { name, elements }) =
                p.close(FrameKind::Partition, line_no, line)
            {
                p.push(ActivityElement::Partition { name, elements });
            }
            continue;
        }

        debug!(line = line_no, text = line, "skipping unrecognized activity diagram line");
    }

    if let Some((_, line)) = pending {
        p.diagnostic(line, "activity is never terminated with `;`".to_string());
    }
    while let Some((frame, line)) = p.stack.pop() {
        p.diagnostic(line, format!("{} is never closed", frame.describe()));
    }

    let counts = ActivityCounts::walk(&p.root);
    ActivityDiagram {
        elements: p.root,
        activity_count: counts.activities,
        decision_count: counts.decisions,
        partition_count: counts.partitions,
        diagnostics: p.diagnostics,
    }
}

/// Closes an `if` and every `elseif` chained onto it.
fn close_if(p: &mut Parser, line_no: usize) {
    loop {
        let Some(Frame::If {
            condition,
            yes,
            no,
            chained,
            ..
        }) = p.close(FrameKind::If, line_no, "endif")
        else {
            return;
        };
        p.push(ActivityElement::Decision {
            condition,
            yes_branch: yes,
            no_branch: no,
        });
        if !chained {
            return;
        }
    }
}

fn activity(text: &str) -> ActivityElement {
    ActivityElement::Activity {
        text: clean_text(text),
    }
}

/// First word of a line, with any `(` glued to it removed.
fn leading_keyword(line: &str) -> &str {
    let end = line
        .find(|c: char| c.is_whitespace() || c == '(')
        .unwrap_or(line.len());
    &line[..end]
}

fn is_skipped(line: &str) -> bool {
    const PREFIXES: &[&str] = &[
        "@", "!", "title", "skinparam", "header", "footer", "caption", "legend", "endlegend",
        "end legend", "scale", "detach", "kill", "->", "-[", "left to right", "top to bottom",
    ];
    if line.starts_with('|') && line.ends_with('|') {
        return true;
    }
    PREFIXES.iter().any(|p| line.starts_with(p))
}

fn is_note_start(line: &str) -> bool {
    line.starts_with("note ") || line.starts_with("floating note")
}

fn is_fork_end(line: &str) -> bool {
    ["end fork", "fork end", "end split", "split end", "end merge"]
        .iter()
        .any(|p| line.starts_with(p))
}

/// Text of a single-line activity without its terminator.
fn strip_terminator(body: &str) -> Option<&str> {
    let body = body.trim_end();
    [';', '|', '<', '>', '/', '\\', ']', '}']
        .iter()
        .find_map(|t| body.strip_suffix(*t))
}

/// Returns the contents of the first balanced `( … )` group and what follows.
fn paren_group(text: &str) -> Option<(&str, &str)> {
    let start = text.find('(')?;
    let mut depth = 0usize;
    for (idx, c) in text[start..].char_indices() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    let end = start + idx;
                    return Some((text[start + 1..end].trim(), &text[end + 1..]));
                }
            }
            _ => {}
        }
    }
    None
}

/// Removes line breaks and creole markup.
pub(crate) fn clean_text(text: &str) -> String {
    let text = text
        .replace("\\n", " ")
        .replace("**", "")
        .replace("//", "")
        .replace("__", "")
        .replace("\"\"", "");
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(elements: &[ActivityElement]) -> Vec<&str> {
        elements
            .iter()
            .filter_map(|e| match e {
                ActivityElement::Activity { text } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn simple_flow_with_decision() {
        let input = "@startuml\nstart\n:Read input;\n\
                     if (Graphviz installed?) then (yes)\n  :process all diagrams;\n\
                     else (no)\n  :process only sequence diagrams;\nendif\nstop\n@enduml";
        let diagram = parse(input);

        assert_eq!(diagram.activity_count, 3);
        assert_eq!(diagram.decision_count, 1);
        assert_eq!(diagram.elements.len(), 4);
        match &diagram.elements[2] {
            ActivityElement::Decision {
                condition,
                yes_branch,
                no_branch,
            } => {
                assert_eq!(condition, "Graphviz installed?");
                assert_eq!(texts(yes_branch), ["process all diagrams"]);
                assert_eq!(texts(no_branch), ["process only sequence diagrams"]);
            }
            other => panic!("expected decision, got {other:?}"),
        }
        assert!(diagram.diagnostics.is_empty());
    }

    #[test]
    fn multi_line_activity_and_markup() {
        let diagram = parse("start\n:first line\nsecond **bold**\nthird;\n:a\\nb;\nstop");
        assert_eq!(
            texts(&diagram.elements),
            ["first line second bold third", "a b"]
        );
    }

    #[test]
    fn elseif_chain_closes_with_one_endif() {
        let input = "if (a) then\n:x;\nelseif (b) then\n:y;\nelse\n:z;\nendif\n:after;";
        let diagram = parse(input);
        assert_eq!(diagram.decision_count, 2);
        assert_eq!(diagram.elements.len(), 2);
        let ActivityElement::Decision { no_branch, .. } = &diagram.elements[0] else {
            panic!("expected decision");
        };
        let ActivityElement::Decision {
            condition,
            yes_branch,
            no_branch: inner_no,
        } = &no_branch[0]
        else {
            panic!("expected nested decision");
        };
        assert_eq!(condition, "b");
        assert_eq!(texts(yes_branch), ["y"]);
        assert_eq!(texts(inner_no), ["z"]);
        assert!(diagram.diagnostics.is_empty());
    }

    #[test]
    fn while_with_value_and_exit() {
        let diagram = parse("while (more data?) is (yes)\n:read;\nendwhile (no)");
        assert_eq!(
            diagram.elements,
            vec![ActivityElement::While {
                condition: "more data?".into(),
                condition_value: Some("yes".into()),
                exit_condition: Some("no".into()),
                elements: vec![ActivityElement::Activity {
                    text: "read".into()
                }],
            }]
        );
    }

    #[test]
    fn repeat_with_inline_first_activity() {
        let diagram = parse("repeat :ask;\n:check;\nbackward :retry;\nrepeat while (invalid?)");
        let ActivityElement::Repeat {
            condition,
            elements,
        } = &diagram.elements[0]
        else {
            panic!("expected repeat");
        };
        assert_eq!(condition, "invalid?");
        assert_eq!(texts(elements), ["ask", "check", "retry"]);
    }

    #[test]
    fn nested_forks_and_splits() {
        let input = "fork\n:a;\nfork again\n  split\n  :b;\n  split again\n  :c;\n  end split\n\
                     end fork";
        let diagram = parse(input);
        let ActivityElement::Fork { branches } = &diagram.elements[0] else {
            panic!("expected fork");
        };
        assert_eq!(branches.len(), 2);
        let ActivityElement::Fork { branches: inner } = &branches[1][0] else {
            panic!("expected nested split");
        };
        assert_eq!(inner.len(), 2);
        assert_eq!(diagram.activity_count, 3);
    }

    #[test]
    fn partitions_with_braces_and_end_keyword() {
        let input = "partition \"A: Travel\" {\n:pack;\n}\npartition Checkout\n:pay;\nend partition";
        let diagram = parse(input);
        assert_eq!(diagram.partition_count, 2);
        let ActivityElement::Partition { name, elements } = &diagram.elements[0] else {
            panic!("expected partition");
        };
        assert_eq!(name, "A: Travel");
        assert_eq!(texts(elements), ["pack"]);
    }

    #[test]
    fn notes_and_swimlanes_are_skipped() {
        let input = "|Customer|\nstart\nnote right\n  :not an activity;\nend note\n\
                     note left: short\n:real;\n|Shop|\nstop";
        let diagram = parse(input);
        assert_eq!(texts(&diagram.elements), ["real"]);
        assert_eq!(diagram.activity_count, 1);
    }

    #[test]
    fn unterminated_blocks_drop_contents_with_diagnostics() {
        let diagram = parse("start\nif (x) then\n:lost;\nwhile (y)\n:also lost;");
        assert_eq!(diagram.elements, vec![ActivityElement::Start]);
        assert_eq!(diagram.activity_count, 0);
        assert_eq!(diagram.diagnostics.len(), 2);
    }

    #[test]
    fn mismatched_close_drops_inner_frame() {
        let diagram = parse("if (x) then\nwhile (y)\n:lost;\nendif");
        assert_eq!(diagram.decision_count, 1);
        assert_eq!(diagram.activity_count, 0);
        assert_eq!(diagram.diagnostics.len(), 1);
        assert!(diagram.diagnostics[0].message.contains("while"));
    }

    #[test]
    fn nested_condition_parentheses() {
        assert_eq!(
            paren_group("(count(x) > 0) then (yes)"),
            Some(("count(x) > 0", " then (yes)"))
        );
    }
}
