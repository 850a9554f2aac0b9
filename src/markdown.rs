//! Finds diagram code fences in a markdown document and splices accessible
//! descriptions in after them.

use std::ops::Range;
use std::sync::OnceLock;

use pulldown_cmark::{CodeBlockKind, Event, Parser, Tag, TagEnd};
use regex::Regex;
use tracing::debug;

use crate::diagram::locale::fill;
use crate::diagram::{Dialect, Locale, detect_diagram_kind, try_describe};
use crate::html::escape_html;
use crate::options::{Options, language_name};

/// Flags and attributes from the info string after the fence language.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlockMeta {
    /// Kroki `imgType`, e.g. `plantuml`.
    pub img_type: Option<String>,
    pub title: Option<String>,
    pub hide_source: bool,
    pub hide_a11y: bool,
}

impl BlockMeta {
    pub fn parse(meta: &str) -> Self {
        let flag = |name: &str| meta.split_whitespace().any(|token| token == name);
        Self {
            img_type: attribute(img_type_regex(), meta),
            title: attribute(img_title_regex(), meta).or_else(|| attribute(title_regex(), meta)),
            hide_source: flag("hideSource"),
            hide_a11y: flag("hideA11y"),
        }
    }
}

fn img_type_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"\bimgType="([^"]+)""#).expect("valid regex"))
}

fn img_title_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"\bimgTitle="([^"]+)""#).expect("valid regex"))
}

fn title_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"\btitle="([^"]+)""#).expect("valid regex"))
}

fn attribute(re: &Regex, meta: &str) -> Option<String> {
    re.captures(meta).map(|caps| caps[1].to_string())
}

/// A fenced code block holding a diagram.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagramBlock {
    pub lang: String,
    pub meta: BlockMeta,
    pub source: String,
    /// Byte range of the whole block, fences included.
    pub range: Range<usize>,
}

impl DiagramBlock {
    /// Dialect from `imgType`, else from the fence language.
    pub fn dialect(&self) -> Option<Dialect> {
        self.meta
            .img_type
            .as_deref()
            .and_then(Dialect::from_name)
            .or_else(|| Dialect::from_name(&self.lang))
    }

    fn kind_hint(&self) -> Option<&str> {
        match self.meta.img_type.as_deref() {
            Some("c4plantuml") => Some("c4"),
            _ => None,
        }
    }

    /// `{type}` shown in summaries.
    fn language_name(&self) -> &str {
        match self.meta.img_type.as_deref() {
            Some(img_type) => language_name(img_type),
            None => language_name(&self.lang),
        }
    }
}

/// Every fenced block whose language is listed in `options.languages`.
pub fn collect_diagram_blocks(markdown: &str, options: &Options) -> Vec<DiagramBlock> {
    let mut blocks = Vec::new();
    let mut current: Option<DiagramBlock> = None;

    for (event, range) in Parser::new(markdown).into_offset_iter() {
        match event {
            Event::Start(Tag::CodeBlock(CodeBlockKind::Fenced(info))) => {
                let info = info.trim();
                let (lang, meta) = info.split_once(char::is_whitespace).unwrap_or((info, ""));
                if options.handles_language(lang) {
                    current = Some(DiagramBlock {
                        lang: lang.to_string(),
                        meta: BlockMeta::parse(meta),
                        source: String::new(),
                        range,
                    });
                }
            }
            Event::Text(text) => {
                if let Some(block) = current.as_mut() {
                    block.source.push_str(&text);
                }
            }
            Event::End(TagEnd::CodeBlock) => {
                if let Some(block) = current.take() {
                    blocks.push(block);
                }
            }
            _ => {}
        }
    }

    debug!(count = blocks.len(), "collected diagram blocks");
    blocks
}

/// Inserts `<details>` elements with the source and the accessible
/// description after every diagram block.
pub fn annotate(markdown: &str, options: &Options) -> String {
    let blocks = collect_diagram_blocks(markdown, options);
    let mut out = String::with_capacity(markdown.len() * 2);
    let mut cursor = 0;

    for block in &blocks {
        let insertion = annotation(block, options);
        if insertion.is_empty() {
            continue;
        }
        out.push_str(&markdown[cursor..block.range.end]);
        if !out.ends_with('\n') {
            out.push('\n');
        }
        out.push_str(&insertion);
        cursor = block.range.end;
    }
    out.push_str(&markdown[cursor..]);
    out
}

/// HTML placed after one block, empty when everything is hidden.
pub fn annotation(block: &DiagramBlock, options: &Options) -> String {
    let show_source = options.show_source && !block.meta.hide_source;
    let show_description = options.show_description && !block.meta.hide_a11y;
    if !show_source && !show_description {
        return String::new();
    }

    let dialect = block.dialect();
    let locale = Locale::resolve(&options.locale, Locale::En);
    let title = block.meta.title.clone().unwrap_or_else(|| {
        detect_diagram_kind(&block.source, block.kind_hint(), dialect)
            .localized_name(locale)
            .to_string()
    });
    let values = [
        ("title", escape_html(&title)),
        ("type", escape_html(block.language_name())),
    ];
    let values: Vec<(&str, &str)> = values.iter().map(|(k, v)| (*k, v.as_str())).collect();
    let open = if options.default_expanded { " open" } else { "" };

    let mut html = String::new();
    if show_source {
        html.push_str(&format!(
            "\n<details class=\"{}\"{open}>\n<summary>{}</summary>\n<pre><code>{}</code></pre>\n</details>\n",
            escape_html(&options.css_class),
            fill(&options.summary_text, &values),
            escape_html(&block.source),
        ));
    }
    if show_description {
        let description = try_describe(&block.source, block.kind_hint(), dialect, &options.locale)
            .unwrap_or_else(|err| {
                debug!(error = %err, "using configured fallback text");
                format!("<p>{}</p>", escape_html(options.fallback_message()))
            });
        html.push_str(&format!(
            "\n<details class=\"{}\"{open}>\n<summary>{}</summary>\n{description}\n</details>\n",
            escape_html(&options.a11y_css_class),
            fill(&options.a11y_summary_text, &values),
        ));
    }
    html
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = "# Shop\n\n```kroki imgType=\"plantuml\" imgTitle=\"Order flow\"\n\
                       @startuml\n[*] --> Open\nOpen --> Paid : pay\n@enduml\n```\n\nText after.\n\
                       \n```rust\nfn main() {}\n```\n";

    #[test]
    fn meta_attributes_and_flags() {
        let meta = BlockMeta::parse("imgType=\"mermaid\" title=\"Flow\" hideSource");
        assert_eq!(meta.img_type.as_deref(), Some("mermaid"));
        assert_eq!(meta.title.as_deref(), Some("Flow"));
        assert!(meta.hide_source);
        assert!(!meta.hide_a11y);

        let meta = BlockMeta::parse("imgTitle=\"Shown\" title=\"Ignored\" hideSourceCode");
        assert_eq!(meta.title.as_deref(), Some("Shown"));
        assert!(!meta.hide_source);
    }

    #[test]
    fn only_configured_languages_are_collected() {
        let blocks = collect_diagram_blocks(DOC, &Options::default());
        assert_eq!(blocks.len(), 1);
        let block = &blocks[0];
        assert_eq!(block.lang, "kroki");
        assert_eq!(block.dialect(), Some(Dialect::PlantUml));
        assert!(block.source.starts_with("@startuml\n[*] --> Open"));
        assert!(DOC[block.range.clone()].starts_with("```kroki"));
    }

    #[test]
    fn annotate_inserts_source_and_description() {
        let out = annotate(DOC, &Options::default());
        assert!(out.starts_with("# Shop\n\n```kroki"));
        assert!(out.contains(
            "<details class=\"diagram-expandable-source\">\n<summary>PlantUML source code for \"Order flow\"</summary>\n<pre><code>@startuml\n[*] --&gt; Open"
        ));
        assert!(out.contains(
            "<details class=\"diagram-a11y-description\">\n<summary>Natural language description for \"Order flow\"</summary>\n<p>State diagram with 2 state(s) and 1 transition(s).</p>"
        ));
        assert!(out.ends_with("Text after.\n\n```rust\nfn main() {}\n```\n"));
    }

    #[test]
    fn hidden_parts_are_left_out() {
        let doc = "```mermaid hideA11y\npie\n\"A\": 1\n```\n";
        let out = annotate(doc, &Options::default());
        assert!(out.contains("diagram-expandable-source"));
        assert!(!out.contains("diagram-a11y-description"));

        let doc = "```mermaid hideA11y hideSource\npie\n\"A\": 1\n```\n";
        assert_eq!(annotate(doc, &Options::default()), doc);
    }

    #[test]
    fn title_defaults_to_localized_kind_name() {
        let doc = "```mermaid\npie\n\"A\": 1\n```\n";
        let mut options = Options::default();
        options.default_expanded = true;
        options.show_source = false;
        let out = annotate(doc, &options);
        assert!(out.contains(
            "<details class=\"diagram-a11y-description\" open>\n<summary>Natural language description for \"pie chart\"</summary>"
        ));
        assert!(out.contains("Pie chart showing 1 segment."));

        let options = Options::from_builtin("nl").expect("nl preset");
        let out = annotate(doc, &options);
        assert!(out.contains("<summary>Mermaid broncode voor \"taartdiagram\"</summary>"));
    }

    #[test]
    fn empty_block_uses_configured_fallback() {
        let doc = "```plantuml\n```\n";
        let options =
            Options::from_yaml("fallback_text:\n  en: Nothing to describe.\n").expect("yaml");
        let out = annotate(doc, &options);
        assert!(out.contains("<p>Nothing to describe.</p>"));
    }
}
