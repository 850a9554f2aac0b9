//! Diagram parsers and description generators.
//!
//! Every supported kind has a `parse` function producing a plain model from
//! [`types`] and a `describe` function turning that model into an HTML
//! fragment. [`describe_diagram`] ties detection, parsing and description
//! together and never fails.

pub mod activity;
pub mod c4;
pub mod class;
pub mod classify;
pub mod detect;
pub mod locale;
pub mod pie;
pub mod sequence;
pub mod state;
pub mod types;
pub mod unsupported;

use serde::Serialize;
use tracing::{debug, warn};

pub use detect::{DiagramKind, detect_diagram_kind};
pub use locale::Locale;
pub use types::Dialect;

use crate::error::{Error, Result};
use crate::html::escape_html;
use classify::detect_diagram_format;
use types::*;

pub const FALLBACK_EN: &str =
    "Natural language description is not available for this diagram type yet.";
pub const FALLBACK_NL: &str =
    "Natuurlijke taal beschrijving is nog niet beschikbaar voor dit diagram type.";

/// Generic message used when no description can be generated. Unknown
/// locales get English.
pub fn fallback_text(locale: &str) -> &'static str {
    Locale::resolve(locale, Locale::En).pick(FALLBACK_EN, FALLBACK_NL)
}

/// A parsed diagram of any supported kind.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "model", rename_all = "camelCase")]
pub enum Model {
    Class(ClassDiagram),
    Sequence(SequenceDiagram),
    Activity(ActivityDiagram),
    State(StateDiagram),
    C4(C4Diagram),
    Pie(PieChart),
}

impl Model {
    /// Parses `source` as `kind`. Returns `None` for kinds without a parser.
    pub fn parse(source: &str, kind: DiagramKind, dialect: Dialect) -> Option<Self> {
        let model = match kind {
            DiagramKind::Class => Model::Class(class::parse_with_dialect(source, dialect)),
            DiagramKind::Sequence => Model::Sequence(sequence::parse_with_dialect(source, dialect)),
            DiagramKind::Activity => Model::Activity(activity::parse(source)),
            DiagramKind::State => Model::State(state::parse(source)),
            DiagramKind::C4 => Model::C4(c4::parse(source)),
            DiagramKind::Pie => Model::Pie(pie::parse(source)),
            DiagramKind::Er
            | DiagramKind::Component
            | DiagramKind::UseCase
            | DiagramKind::Gantt
            | DiagramKind::Generic => return None,
        };
        Some(model)
    }

    pub fn describe(&self, locale: &str) -> String {
        match self {
            Model::Class(d) => class::describe(d, locale),
            Model::Sequence(d) => sequence::describe(d, locale),
            Model::Activity(d) => activity::describe(d, locale),
            Model::State(d) => state::describe(d, locale),
            Model::C4(d) => c4::describe(d, locale),
            Model::Pie(d) => pie::describe(d, locale),
        }
    }

    /// Parser diagnostics, for the kinds that report them.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        match self {
            Model::Class(d) => &d.diagnostics,
            Model::Activity(d) => &d.diagnostics,
            _ => &[],
        }
    }
}

/// Detects, parses and describes one diagram.
///
/// Unsupported kinds produce the "not supported yet" message. Fails only
/// when `source` holds nothing but whitespace.
pub fn try_describe(
    source: &str,
    hint: Option<&str>,
    dialect: Option<Dialect>,
    locale: &str,
) -> Result<String> {
    if source.trim().is_empty() {
        return Err(Error::EmptySource);
    }
    let dialect = dialect.unwrap_or_else(|| detect_diagram_format(source));
    let kind = detect_diagram_kind(source, hint, Some(dialect));

    let Some(model) = Model::parse(source, kind, dialect) else {
        debug!(kind = kind.id(), "no parser for diagram kind");
        return Ok(unsupported::describe_kind(kind, locale));
    };
    for diagnostic in model.diagnostics() {
        debug!(line = diagnostic.line, message = %diagnostic.message, "parser diagnostic");
    }
    Ok(model.describe(locale))
}

/// Detects and parses one diagram and renders the result as pretty JSON:
/// `kind`, `dialect` and, for supported kinds, `diagnostics` and `parsed`.
pub fn model_json(source: &str, hint: Option<&str>, dialect: Option<Dialect>) -> Result<String> {
    if source.trim().is_empty() {
        return Err(Error::EmptySource);
    }
    let dialect = dialect.unwrap_or_else(|| detect_diagram_format(source));
    let kind = detect_diagram_kind(source, hint, Some(dialect));
    let value = match Model::parse(source, kind, dialect) {
        Some(model) => serde_json::json!({
            "kind": kind,
            "dialect": dialect,
            "diagnostics": model.diagnostics(),
            "parsed": model,
        }),
        None => serde_json::json!({ "kind": kind, "dialect": dialect }),
    };
    Ok(serde_json::to_string_pretty(&value)?)
}

/// Like [`try_describe`], but falls back to the generic message instead of
/// failing.
pub fn describe_diagram(
    source: &str,
    hint: Option<&str>,
    dialect: Option<Dialect>,
    locale: &str,
) -> String {
    match try_describe(source, hint, dialect, locale) {
        Ok(html) => html,
        Err(err) => {
            warn!(error = %err, "using fallback description");
            format!("<p>{}</p>", escape_html(fallback_text(locale)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn dispatches_each_supported_kind() {
        let cases = [
            (
                "class Foo {\n  -bar: String\n}\nclass Qux\nFoo --|> Qux",
                "Class diagram with 2 class(es)",
            ),
            ("participant A\nA->>B: hi()", "Sequence diagram with 2 participants"),
            ("@startuml\nstart\n:go;\nstop\n@enduml", "Activity diagram with 1 activity."),
            ("[*] --> Idle\nIdle --> Running : start", "State diagram with 2 state(s)"),
            ("Person(u, \"User\")", "C4 System Context diagram with:"),
            ("pie\n\"Yes\": 1", "Pie chart showing 1 segment."),
        ];
        for (source, expected) in cases {
            let html = describe_diagram(source, None, None, "en");
            assert!(html.contains(expected), "{source}: {html}");
        }
    }

    #[test]
    fn unsupported_kinds_use_the_contribute_message() {
        let html = describe_diagram("erDiagram\nA ||--o{ B : has", None, None, "en");
        assert!(html.contains("does not yet support ER diagrams."));
        let html = describe_diagram("A -> B", Some("gantt"), None, "nl");
        assert!(html.contains("ondersteunt nog geen Gantt diagrammen."));
    }

    #[test]
    fn empty_source_is_an_error_with_a_fallback() {
        assert!(matches!(try_describe("  \n", None, None, "en"), Err(Error::EmptySource)));
        assert_eq!(
            describe_diagram("", None, None, "en"),
            format!("<p>{FALLBACK_EN}</p>")
        );
        assert_eq!(
            describe_diagram("", None, None, "nl"),
            format!("<p>{FALLBACK_NL}</p>")
        );
    }

    #[test]
    fn models_serialize_with_kind_tag() {
        let model = Model::parse("pie\nA: 1", DiagramKind::Pie, Dialect::Mermaid).unwrap();
        let json = serde_json::to_value(&model).unwrap();
        assert_eq!(json["kind"], "pie");
        assert_eq!(json["model"]["segments"][0]["label"], "A");
        assert!(Model::parse("x", DiagramKind::Gantt, Dialect::Mermaid).is_none());
    }

    #[test]
    fn model_json_reports_kind_and_parsed_model() {
        let json = model_json("classDiagram\nclass A {\n  +x: int", None, None).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["kind"], "classDiagram");
        assert_eq!(value["dialect"], "mermaid");
        assert_eq!(value["parsed"]["kind"], "class");
        assert_eq!(value["diagnostics"].as_array().map(Vec::len), Some(1));

        let json = model_json("gantt\ntitle Plan", None, None).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["kind"], "gantt");
        assert!(value.get("parsed").is_none());

        assert!(matches!(model_json(" ", None, None), Err(Error::EmptySource)));
    }

    #[test]
    fn every_class_arrow_maps_to_its_own_kind() {
        for (token, spec) in class::CLASS_ARROWS {
            let diagram = class::parse(&format!("classDiagram\nA {token} B"));
            assert_eq!(diagram.relations.len(), 1, "{token}");
            assert_eq!(diagram.relations[0].kind, spec.kind, "{token}");
        }
    }

    fn identifier() -> impl Strategy<Value = String> {
        "[A-Z][a-zA-Z0-9]{0,8}"
    }

    fn activity_block() -> impl Strategy<Value = String> {
        let leaf = "[a-z]{1,8}( [a-z]{1,8}){0,2}".prop_map(|t| format!(":{t};"));
        leaf.prop_recursive(4, 32, 4, |inner| {
            let body = prop::collection::vec(inner, 0..4).prop_map(|lines| lines.join("\n"));
            prop_oneof![
                (body.clone(), body.clone())
                    .prop_map(|(a, b)| format!("if (c?) then (yes)\n{a}\nelse (no)\n{b}\nendif")),
                body.clone().prop_map(|b| format!("while (more?)\n{b}\nendwhile")),
                body.clone().prop_map(|b| format!("repeat\n{b}\nrepeat while (again?)")),
                (body.clone(), body.clone())
                    .prop_map(|(a, b)| format!("fork\n{a}\nfork again\n{b}\nend fork")),
                body.prop_map(|b| format!("partition \"P\" {{\n{b}\n}}")),
            ]
        })
    }

    proptest! {
        #[test]
        fn parsing_is_deterministic(source in "\\PC{0,200}") {
            prop_assert_eq!(class::parse(&source), class::parse(&source));
            prop_assert_eq!(sequence::parse(&source), sequence::parse(&source));
            prop_assert_eq!(activity::parse(&source), activity::parse(&source));
            prop_assert_eq!(state::parse(&source), state::parse(&source));
            prop_assert_eq!(c4::parse(&source), c4::parse(&source));
            prop_assert_eq!(pie::parse(&source), pie::parse(&source));
        }

        #[test]
        fn describing_never_fails(source in "\\PC{0,200}", locale in "[a-z]{0,3}") {
            let html = describe_diagram(&source, None, None, &locale);
            prop_assert!(!html.is_empty());
        }

        #[test]
        fn activity_count_matches_tree(blocks in prop::collection::vec(activity_block(), 1..4)) {
            let source = format!("start\n{}\nstop", blocks.join("\n"));
            let diagram = activity::parse(&source);
            let counts = ActivityCounts::walk(&diagram.elements);
            prop_assert_eq!(diagram.activity_count, counts.activities);
            prop_assert_eq!(diagram.activity_count, source.matches(';').count());
            prop_assert!(diagram.diagnostics.is_empty());
        }

        #[test]
        fn special_characters_are_escaped(
            name in identifier(),
            special in "[<>&]",
            tail in "[a-z]{0,5}",
        ) {
            let raw = format!("{name}{special}{tail}");
            let escaped = escape_html(&raw);
            let outputs = [
                sequence::describe(
                    &sequence::parse(&format!("participant A as {raw}\nA->>B: x")),
                    "en",
                ),
                state::describe(&state::parse(&format!("state \"{raw}\" as S\nS --> T")), "en"),
                pie::describe(&pie::parse(&format!("pie\n\"{raw}\": 1")), "en"),
            ];
            for html in &outputs {
                prop_assert!(html.contains(escaped.as_str()), "{}", html);
                if special != "&" {
                    prop_assert!(!html.contains(raw.as_str()), "{}", html);
                }
            }
        }

        #[test]
        fn unknown_locales_fall_back(locale in "[a-df-mo-z]{2}") {
            let state = state::parse("[*] --> A\nA --> B : go");
            prop_assert_eq!(state::describe(&state, &locale), state::describe(&state, "nl"));
            let pie = pie::parse("pie\nA: 1");
            prop_assert_eq!(pie::describe(&pie, &locale), pie::describe(&pie, "en"));
            let c4 = c4::parse("Person(a, \"A\")");
            prop_assert_eq!(c4::describe(&c4, &locale), c4::describe(&c4, "en"));
        }

        #[test]
        fn arrows_are_not_read_as_their_prefixes(
            from in identifier(),
            to in identifier(),
            idx in 0..class::CLASS_ARROWS.len(),
        ) {
            let (token, spec) = class::CLASS_ARROWS[idx];
            let diagram = class::parse(&format!("classDiagram\n{from} {token} {to}"));
            prop_assert_eq!(diagram.relations.len(), 1);
            prop_assert_eq!(diagram.relations[0].kind, spec.kind);
        }
    }
}
