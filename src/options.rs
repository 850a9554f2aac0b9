use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::diagram::{FALLBACK_EN, FALLBACK_NL, Locale};
use crate::error::{Error, Result};

const DEFAULT_LOCALE: &str = "en";
const DEFAULT_LANGUAGES: &[&str] = &["kroki", "mermaid", "plantuml"];
const SUMMARY_TEXT: &str = "{type} source code for \"{title}\"";
const A11Y_SUMMARY_TEXT: &str = "Natural language description for \"{title}\"";
const CSS_CLASS: &str = "diagram-expandable-source";
const A11Y_CSS_CLASS: &str = "diagram-a11y-description";

const BUILTIN_PRESETS: &[(&str, &str)] = &[
    ("en", include_str!("../presets/en.toml")),
    ("nl", include_str!("../presets/nl.toml")),
];

/// Display names for Kroki diagram languages, used for `{type}`.
const LANGUAGE_NAMES: &[(&str, &str)] = &[
    ("kroki", "Diagram"),
    ("plantuml", "PlantUML"),
    ("mermaid", "Mermaid"),
    ("graphviz", "GraphViz"),
    ("d2", "D2"),
    ("c4plantuml", "C4 (PlantUML)"),
    ("structurizr", "Structurizr"),
    ("ditaa", "Ditaa"),
    ("erd", "ERD"),
    ("nomnoml", "Nomnoml"),
    ("svgbob", "Svgbob"),
    ("vega", "Vega"),
    ("vegalite", "Vega-Lite"),
    ("wavedrom", "WaveDrom"),
    ("bpmn", "BPMN"),
    ("bytefield", "Bytefield"),
    ("excalidraw", "Excalidraw"),
    ("pikchr", "Pikchr"),
    ("umlet", "UMLet"),
];

/// How markdown documents are annotated.
///
/// `{type}` and `{title}` in the summary templates are replaced with the
/// diagram language and title.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Options {
    #[serde(default = "default_locale")]
    pub locale: String,
    /// Code fence languages treated as diagrams.
    #[serde(default = "default_languages")]
    pub languages: Vec<String>,
    #[serde(default = "default_true")]
    pub show_source: bool,
    #[serde(default = "default_true")]
    pub show_description: bool,
    #[serde(default)]
    pub default_expanded: bool,
    #[serde(default = "default_summary_text")]
    pub summary_text: String,
    #[serde(default = "default_a11y_summary_text")]
    pub a11y_summary_text: String,
    #[serde(default = "default_css_class")]
    pub css_class: String,
    #[serde(default = "default_a11y_css_class")]
    pub a11y_css_class: String,
    /// Locale code to message. Missing locales keep the built-in text.
    #[serde(default = "default_fallback_text")]
    pub fallback_text: IndexMap<String, String>,
}

fn default_locale() -> String {
    DEFAULT_LOCALE.to_string()
}
fn default_languages() -> Vec<String> {
    DEFAULT_LANGUAGES.iter().map(|l| l.to_string()).collect()
}
fn default_true() -> bool {
    true
}
fn default_summary_text() -> String {
    SUMMARY_TEXT.to_string()
}
fn default_a11y_summary_text() -> String {
    A11Y_SUMMARY_TEXT.to_string()
}
fn default_css_class() -> String {
    CSS_CLASS.to_string()
}
fn default_a11y_css_class() -> String {
    A11Y_CSS_CLASS.to_string()
}
fn default_fallback_text() -> IndexMap<String, String> {
    IndexMap::from([
        ("nl".to_string(), FALLBACK_NL.to_string()),
        ("en".to_string(), FALLBACK_EN.to_string()),
    ])
}

impl Default for Options {
    fn default() -> Self {
        Options {
            locale: default_locale(),
            languages: default_languages(),
            show_source: true,
            show_description: true,
            default_expanded: false,
            summary_text: default_summary_text(),
            a11y_summary_text: default_a11y_summary_text(),
            css_class: default_css_class(),
            a11y_css_class: default_a11y_css_class(),
            fallback_text: default_fallback_text(),
        }
    }
}

impl Options {
    pub fn from_builtin(name: &str) -> Result<Self> {
        let normalized = name.trim().to_ascii_lowercase();
        let content = BUILTIN_PRESETS
            .iter()
            .find(|(n, _)| *n == normalized)
            .map(|(_, c)| *c)
            .ok_or_else(|| Error::Config {
                message: format!(
                    "Unknown built-in preset '{}'. Available: {}",
                    name,
                    Self::list_builtins().join(", ")
                ),
            })?;
        Self::from_toml(content)
    }

    pub fn list_builtins() -> Vec<&'static str> {
        BUILTIN_PRESETS.iter().map(|(n, _)| *n).collect()
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let options: Options = toml::from_str(content).map_err(|e| Error::Config {
            message: format!("Failed to parse TOML options: {}", e),
        })?;
        Ok(options.with_default_fallbacks())
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        let options: Options = serde_yaml::from_str(content).map_err(|e| Error::Config {
            message: format!("Failed to parse YAML options: {}", e),
        })?;
        Ok(options.with_default_fallbacks())
    }

    /// Loads options by file extension. Unknown extensions are tried as TOML,
    /// then as YAML.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());

        match ext.as_deref() {
            Some("toml") => Self::from_toml(&content),
            Some("yaml" | "yml") => Self::from_yaml(&content),
            _ => Self::from_toml(&content)
                .or_else(|_| Self::from_yaml(&content))
                .map_err(|_| Error::Config {
                    message: format!(
                        "Failed to parse {} as TOML or YAML",
                        path.display()
                    ),
                }),
        }
    }

    fn with_default_fallbacks(mut self) -> Self {
        for (locale, text) in default_fallback_text() {
            self.fallback_text.entry(locale).or_insert(text);
        }
        self
    }

    /// Fallback message for the configured locale, then English.
    pub fn fallback_message(&self) -> &str {
        let code = Locale::from_code(&self.locale).map(Locale::code);
        self.fallback_text
            .get(&self.locale)
            .or_else(|| code.and_then(|c| self.fallback_text.get(c)))
            .or_else(|| self.fallback_text.get("en"))
            .map(String::as_str)
            .unwrap_or(FALLBACK_EN)
    }

    pub fn handles_language(&self, lang: &str) -> bool {
        self.languages.iter().any(|l| l == lang)
    }
}

/// Human-readable name of a Kroki diagram language. Unknown languages are
/// returned as given.
pub fn language_name(lang: &str) -> &str {
    LANGUAGE_NAMES
        .iter()
        .find(|(id, _)| *id == lang)
        .map(|(_, name)| *name)
        .unwrap_or(lang)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_gives_defaults() {
        let options = Options::from_toml("").expect("empty config");
        assert_eq!(options, Options::default());
        assert_eq!(options.languages, ["kroki", "mermaid", "plantuml"]);
        assert!(options.show_source && options.show_description);
    }

    #[test]
    fn partial_fallback_text_is_merged() {
        let options = Options::from_yaml("locale: nl\nfallback_text:\n  nl: Geen beschrijving.\n")
            .expect("yaml config");
        assert_eq!(options.fallback_message(), "Geen beschrijving.");
        assert_eq!(options.fallback_text["en"], FALLBACK_EN);
    }

    #[test]
    fn fallback_message_uses_primary_subtag_then_english() {
        let mut options = Options::default();
        options.locale = "nl-BE".to_string();
        assert_eq!(options.fallback_message(), FALLBACK_NL);
        options.locale = "fr".to_string();
        assert_eq!(options.fallback_message(), FALLBACK_EN);
    }

    #[test]
    fn builtin_presets() {
        let nl = Options::from_builtin(" NL ").expect("nl preset");
        assert_eq!(nl.locale, "nl");
        assert_eq!(nl.summary_text, "{type} broncode voor \"{title}\"");
        assert_eq!(nl.css_class, CSS_CLASS);
        assert_eq!(Options::from_builtin("en").expect("en preset"), Options::default());
        assert!(matches!(Options::from_builtin("de"), Err(Error::Config { .. })));
    }

    #[test]
    fn invalid_toml_is_a_config_error() {
        assert!(matches!(
            Options::from_toml("show_source = \"maybe\""),
            Err(Error::Config { .. })
        ));
    }

    #[test]
    fn language_names() {
        assert_eq!(language_name("c4plantuml"), "C4 (PlantUML)");
        assert_eq!(language_name("kroki"), "Diagram");
        assert_eq!(language_name("tikz"), "tikz");
    }
}
