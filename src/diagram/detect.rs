//! Diagram kind detection.
//!
//! Detection runs in a fixed order: an explicit hint, C4 markers, the Mermaid
//! header keyword, the PlantUML `@start…` marker and finally content
//! heuristics. C4 goes first because C4 sources are full of arrows and
//! `Person(...)` calls that would otherwise read as sequence diagrams.

use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;
use tracing::debug;

use super::classify::{detect_diagram_format, is_comment};
use super::locale::Locale;
use super::types::Dialect;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum DiagramKind {
    #[serde(rename = "classDiagram")]
    Class,
    #[serde(rename = "sequenceDiagram")]
    Sequence,
    #[serde(rename = "activityDiagram")]
    Activity,
    #[serde(rename = "stateDiagram")]
    State,
    #[serde(rename = "c4Diagram")]
    C4,
    #[serde(rename = "erDiagram")]
    Er,
    #[serde(rename = "componentDiagram")]
    Component,
    #[serde(rename = "usecaseDiagram")]
    UseCase,
    #[serde(rename = "pieDiagram")]
    Pie,
    #[serde(rename = "gantt")]
    Gantt,
    #[serde(rename = "diagram")]
    Generic,
}

impl DiagramKind {
    /// Reads an explicit type hint such as `class`, `erDiagram` or `c4plantuml`.
    /// Language names like `plantuml` are not kinds and yield `None`.
    pub fn from_hint(hint: &str) -> Option<Self> {
        let hint = hint.trim().to_ascii_lowercase();
        if hint.starts_with("c4") {
            return Some(DiagramKind::C4);
        }
        let kind = match hint.trim_end_matches("diagram").trim_end_matches(['-', '_', ' ']) {
            "class" => DiagramKind::Class,
            "sequence" => DiagramKind::Sequence,
            "activity" => DiagramKind::Activity,
            "state" => DiagramKind::State,
            "er" | "erd" | "entity" => DiagramKind::Er,
            "component" => DiagramKind::Component,
            "usecase" | "use case" | "use-case" => DiagramKind::UseCase,
            "pie" => DiagramKind::Pie,
            "gantt" => DiagramKind::Gantt,
            _ => return None,
        };
        Some(kind)
    }

    /// Identifier used in JSON output.
    pub fn id(self) -> &'static str {
        match self {
            DiagramKind::Class => "classDiagram",
            DiagramKind::Sequence => "sequenceDiagram",
            DiagramKind::Activity => "activityDiagram",
            DiagramKind::State => "stateDiagram",
            DiagramKind::C4 => "c4Diagram",
            DiagramKind::Er => "erDiagram",
            DiagramKind::Component => "componentDiagram",
            DiagramKind::UseCase => "usecaseDiagram",
            DiagramKind::Pie => "pieDiagram",
            DiagramKind::Gantt => "gantt",
            DiagramKind::Generic => "diagram",
        }
    }

    /// Human readable name, used as a default title.
    pub fn localized_name(self, locale: Locale) -> &'static str {
        let (en, nl) = match self {
            DiagramKind::Class => ("class diagram", "klassendiagram"),
            DiagramKind::Sequence => ("sequence diagram", "sequentiediagram"),
            DiagramKind::Activity => ("activity diagram", "activiteitendiagram"),
            DiagramKind::State => ("state diagram", "toestandsdiagram"),
            DiagramKind::C4 => ("C4 diagram", "C4-diagram"),
            DiagramKind::Er => ("ER diagram", "ER-diagram"),
            DiagramKind::Component => ("component diagram", "componentdiagram"),
            DiagramKind::UseCase => ("use case diagram", "use case diagram"),
            DiagramKind::Pie => ("pie chart", "taartdiagram"),
            DiagramKind::Gantt => ("Gantt chart", "Gantt-diagram"),
            DiagramKind::Generic => ("diagram", "diagram"),
        };
        locale.pick(en, nl)
    }
}

fn c4_macro_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?m)^\s*(?:Person|System|Container|Component)(?:_Ext|Db|Db_Ext|Queue|Queue_Ext|_Boundary)?\s*\(",
        )
        .expect("valid regex")
    })
}

fn use_case_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?m)^\s*(?:usecase\s|\([^)]+\))|-+>\s*\([^)]+\)").expect("valid regex")
    })
}

fn component_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?m)^\s*(?:component\s|\[[^\]*]+\])").expect("valid regex"))
}

/// Decide which kind of diagram `source` is.
///
/// `hint` is an explicit type from the caller (for example an `imgType`
/// attribute); `dialect` defaults to what [`detect_diagram_format`] guesses.
pub fn detect_diagram_kind(
    source: &str,
    hint: Option<&str>,
    dialect: Option<Dialect>,
) -> DiagramKind {
    let kind = detect(source, hint, dialect);
    debug!(kind = kind.id(), "detected diagram kind");
    kind
}

fn detect(source: &str, hint: Option<&str>, dialect: Option<Dialect>) -> DiagramKind {
    if let Some(kind) = hint.and_then(DiagramKind::from_hint) {
        return kind;
    }

    let lower = source.to_ascii_lowercase();
    if is_c4(source, &lower) {
        return DiagramKind::C4;
    }

    let dialect = dialect.unwrap_or_else(|| detect_diagram_format(source));
    if dialect == Dialect::Mermaid
        && let Some(kind) = mermaid_header(source)
    {
        return kind;
    }
    if let Some(kind) = plantuml_marker(&lower) {
        return kind;
    }

    let lines: Vec<&str> = source
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !is_comment(l))
        .collect();
    let any_line = |pred: &dyn Fn(&str) -> bool| lines.iter().any(|l| pred(l));

    if any_line(&is_activity_line) {
        return DiagramKind::Activity;
    }
    if lower.contains("[*]") || any_line(&|l: &str| l.starts_with("state ")) {
        return DiagramKind::State;
    }
    if any_line(&is_class_line) {
        return DiagramKind::Class;
    }
    if use_case_regex().is_match(source) {
        return DiagramKind::UseCase;
    }
    if any_line(&is_sequence_line) {
        return DiagramKind::Sequence;
    }
    if any_line(&is_er_line) {
        return DiagramKind::Er;
    }
    if component_regex().is_match(source) {
        return DiagramKind::Component;
    }
    DiagramKind::Generic
}

fn is_c4(source: &str, lower: &str) -> bool {
    const MARKERS: &[&str] = &[
        "!include <c4/",
        "c4-plantuml",
        "c4_context",
        "c4_container",
        "c4_component",
    ];
    MARKERS.iter().any(|m| lower.contains(m))
        || first_line(source).is_some_and(|l| l.to_ascii_lowercase().starts_with("c4"))
        || c4_macro_regex().is_match(source)
}

/// First line that is not blank, a comment or part of a `---` front matter block.
fn first_line(source: &str) -> Option<&str> {
    let mut in_front_matter = false;
    for line in source.lines().map(str::trim) {
        if line == "---" {
            in_front_matter = !in_front_matter;
            continue;
        }
        if in_front_matter || line.is_empty() || is_comment(line) {
            continue;
        }
        return Some(line);
    }
    None
}

fn mermaid_header(source: &str) -> Option<DiagramKind> {
    let header = first_line(source)?.to_ascii_lowercase();
    let keyword = header.split_whitespace().next().unwrap_or("");
    let kind = match keyword {
        "classdiagram" | "classdiagram-v2" => DiagramKind::Class,
        "sequencediagram" => DiagramKind::Sequence,
        "statediagram" | "statediagram-v2" => DiagramKind::State,
        "erdiagram" => DiagramKind::Er,
        "gantt" => DiagramKind::Gantt,
        "pie" => DiagramKind::Pie,
        "flowchart" | "graph" | "journey" | "mindmap" | "timeline" | "gitgraph"
        | "quadrantchart" | "requirementdiagram" | "xychart-beta" | "sankey-beta"
        | "block-beta" => DiagramKind::Generic,
        _ => return None,
    };
    Some(kind)
}

fn plantuml_marker(lower: &str) -> Option<DiagramKind> {
    let start = lower.find("@start")?;
    let marker: String = lower[start + 6..]
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric())
        .collect();
    match marker.as_str() {
        "uml" => None,
        "gantt" => Some(DiagramKind::Gantt),
        "sequence" => Some(DiagramKind::Sequence),
        "activity" => Some(DiagramKind::Activity),
        "state" => Some(DiagramKind::State),
        "chen" => Some(DiagramKind::Er),
        _ => Some(DiagramKind::Generic),
    }
}

fn is_activity_line(line: &str) -> bool {
    (line.starts_with(':') && line.ends_with(';'))
        || matches!(
            line,
            "start" | "stop" | "endif" | "endwhile" | "fork again" | "end fork" | "split again"
        )
        || line.starts_with("repeat while")
}

fn is_class_line(line: &str) -> bool {
    const KEYWORDS: &[&str] = &[
        "class ",
        "interface ",
        "abstract ",
        "enum ",
        "enumeration ",
        "annotation ",
    ];
    const ARROWS: &[&str] = &["<|--", "--|>", "<|..", "..|>", "*--", "--*", "o--", "--o "];
    KEYWORDS.iter().any(|k| line.starts_with(k)) || ARROWS.iter().any(|a| line.contains(a))
}

fn is_sequence_line(line: &str) -> bool {
    const KEYWORDS: &[&str] = &[
        "participant ",
        "actor ",
        "boundary ",
        "control ",
        "database ",
        "collections ",
        "queue ",
        "autonumber",
        "activate ",
    ];
    KEYWORDS.iter().any(|k| line.starts_with(k)) || line.contains("->")
}

fn is_er_line(line: &str) -> bool {
    (line.starts_with("entity ") && line.ends_with('{'))
        || ["||--", "}o--", "}|--", "--o{", "--|{", "|o--"]
            .iter()
            .any(|t| line.contains(t))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kind(source: &str) -> DiagramKind {
        detect_diagram_kind(source, None, None)
    }

    #[test]
    fn hints_win() {
        assert_eq!(detect_diagram_kind("A -> B", Some("erDiagram"), None), DiagramKind::Er);
        assert_eq!(detect_diagram_kind("", Some("c4plantuml"), None), DiagramKind::C4);
        assert_eq!(detect_diagram_kind("pie\nA: 1", Some("plantuml"), None), DiagramKind::Pie);
        assert_eq!(DiagramKind::from_hint("Use Case"), Some(DiagramKind::UseCase));
        assert_eq!(DiagramKind::from_hint("state-diagram"), Some(DiagramKind::State));
    }

    #[test]
    fn mermaid_headers() {
        assert_eq!(kind("classDiagram\nA <|-- B"), DiagramKind::Class);
        assert_eq!(kind("%% comment\nsequenceDiagram\nA->>B: hi"), DiagramKind::Sequence);
        assert_eq!(kind("stateDiagram-v2\n[*] --> A"), DiagramKind::State);
        assert_eq!(kind("---\ntitle: Pets\n---\npie\n\"Dogs\": 3"), DiagramKind::Pie);
        assert_eq!(kind("gantt\ntitle Plan"), DiagramKind::Gantt);
        assert_eq!(kind("erDiagram\nA ||--o{ B : has"), DiagramKind::Er);
        assert_eq!(kind("flowchart LR\nA --> B"), DiagramKind::Generic);
        assert_eq!(kind("C4Context\nPerson(a, \"A\")"), DiagramKind::C4);
    }

    #[test]
    fn c4_before_sequence() {
        let source = "@startuml\n!include <C4/C4_Context>\nPerson(u, \"User\")\n\
                      Rel(u, s, \"Uses\")\n@enduml";
        assert_eq!(kind(source), DiagramKind::C4);
        assert_eq!(kind("@startuml\nSystem(s, \"Shop\")\n@enduml"), DiagramKind::C4);
    }

    #[test]
    fn plantuml_content_heuristics() {
        assert_eq!(
            kind("@startuml\nstart\n:step;\nif (x) then\n:a;\nendif\n@enduml"),
            DiagramKind::Activity
        );
        assert_eq!(kind("@startuml\n[*] --> Idle\n@enduml"), DiagramKind::State);
        assert_eq!(kind("@startuml\nclass Foo\nFoo --> Bar\n@enduml"), DiagramKind::Class);
        assert_eq!(kind("@startuml\nactor User\nUser --> (Login)\n@enduml"), DiagramKind::UseCase);
        assert_eq!(kind("@startuml\nAlice -> Bob : hi\n@enduml"), DiagramKind::Sequence);
        assert_eq!(kind("@startuml\nentity User {\n  *id : int\n}\n@enduml"), DiagramKind::Er);
        assert_eq!(kind("@startuml\n[Web] ..> [Db]\n@enduml"), DiagramKind::Component);
        assert_eq!(kind("@startuml\nrectangle R\n@enduml"), DiagramKind::Generic);
        assert_eq!(kind("@startgantt\n[Task] lasts 5 days\n@endgantt"), DiagramKind::Gantt);
        assert_eq!(kind("@startmindmap\n* root\n@endmindmap"), DiagramKind::Generic);
    }

    #[test]
    fn bare_start_and_stop_mark_an_activity() {
        assert_eq!(kind("@startuml\nstart\nstop\n@enduml"), DiagramKind::Activity);
        assert_eq!(kind("@startuml\nstart\n@enduml"), DiagramKind::Activity);
        assert_eq!(
            kind("@startuml\nAlice -> Bob : hi\nalt ok\nBob -> Alice : yes\nend\n@enduml"),
            DiagramKind::Sequence
        );
    }

    #[test]
    fn names_and_serialized_ids() {
        assert_eq!(DiagramKind::Er.localized_name(Locale::En), "ER diagram");
        assert_eq!(DiagramKind::State.localized_name(Locale::Nl), "toestandsdiagram");
        assert_eq!(
            serde_json::to_string(&DiagramKind::UseCase).unwrap(),
            "\"usecaseDiagram\""
        );
    }
}
