//! Accessible, localized descriptions of PlantUML and Mermaid diagrams.
//!
//! Class, sequence, activity, state, C4 and pie diagrams are parsed into
//! plain models and described as small HTML fragments in English or Dutch.
//! Other diagram kinds get a "not supported yet" message instead.
//!
//! ```
//! let html = kroki_a11y::describe("pie\n\"Yes\": 3\n\"No\": 1", "en");
//! assert!(html.starts_with("<p>Pie chart showing 2 segments.</p>"));
//! ```

pub mod diagram;
pub mod error;
pub mod html;
pub mod markdown;
pub mod options;

pub use diagram::{
    DiagramKind, Dialect, Locale, Model, describe_diagram, detect_diagram_kind, model_json,
    try_describe, unsupported::describe_unsupported,
};
pub use error::{Error, Result};
pub use options::Options;

/// Describes one diagram, detecting its kind and dialect from the source.
pub fn describe(source: &str, locale: &str) -> String {
    describe_diagram(source, None, None, locale)
}
