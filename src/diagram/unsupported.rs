//! Message for diagrams that are recognized but cannot be described yet.

use super::detect::{DiagramKind, detect_diagram_kind};
use super::locale::{Locale, fill};
use crate::html::escape_html;

pub const PROJECT_URL: &str = "https://github.com/AIM-ENE/remark-kroki-a11y";

struct Labels {
    /// `{type}` placeholder.
    not_supported: &'static str,
    contribute: &'static str,
    contribute_rest: &'static str,
}

static EN: Labels = Labels {
    not_supported: "The remark-kroki-a11y plugin does not yet support {type} diagrams.",
    contribute: "Contribute to this A11Y project",
    contribute_rest: "to add support for other diagram types or (natural) languages.",
};

static NL: Labels = Labels {
    not_supported: "De remark-kroki-a11y plugin ondersteunt nog geen {type} diagrammen.",
    contribute: "Draag bij aan dit A11Y project",
    contribute_rest: "om ondersteuning toe te voegen voor andere diagram types of (natuurlijke) talen.",
};

/// Word used in place of `{type}`.
fn type_name(kind: DiagramKind, locale: Locale) -> &'static str {
    match kind {
        DiagramKind::Class => "class",
        DiagramKind::Sequence => "sequence",
        DiagramKind::Activity => "activity",
        DiagramKind::State => "state",
        DiagramKind::C4 => "C4",
        DiagramKind::Er => "ER",
        DiagramKind::Component => "component",
        DiagramKind::UseCase => "use case",
        DiagramKind::Pie => "pie chart",
        DiagramKind::Gantt => "Gantt",
        DiagramKind::Generic => locale.pick("this type of", "dit type"),
    }
}

/// Detects the kind of `source` and explains that it is not supported yet.
/// Unknown locales fall back to English.
pub fn describe_unsupported(source: &str, hint: Option<&str>, locale: &str) -> String {
    describe_kind(detect_diagram_kind(source, hint, None), locale)
}

/// The "not supported yet" paragraph for an already detected kind.
pub fn describe_kind(kind: DiagramKind, locale: &str) -> String {
    let locale = Locale::resolve(locale, Locale::En);
    let t = locale.pick(&EN, &NL);
    format!(
        "<p>{} <a href=\"{PROJECT_URL}\" target=\"_blank\" rel=\"noopener noreferrer\">{}</a> {}</p>",
        escape_html(&fill(t.not_supported, &[("type", type_name(kind, locale))])),
        escape_html(t.contribute),
        escape_html(t.contribute_rest),
    )
}
