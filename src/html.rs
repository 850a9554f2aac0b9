//! HTML fragments for accessible descriptions.
//!
//! Descriptions only ever use `<p>`, `<strong>`, `<ul>`, `<ol>` and `<li>`.
//! Every piece of free text coming from a diagram goes through [`escape_html`]
//! before it is placed inside one of those tags.

/// XML 1.0 valid char ranges:
/// - 0x09, 0x0A, 0x0D
/// - 0x20..=0xD7FF
/// - 0xE000..=0xFFFD
/// - 0x10000..=0x10FFFF
fn is_valid_xml_char(c: char) -> bool {
    matches!(
        c as u32,
        0x09 | 0x0A | 0x0D | 0x20..=0xD7FF | 0xE000..=0xFFFD | 0x10000..=0x10FFFF
    )
}

/// Escapes `&`, `<`, `>` and `"` and drops control characters that have no
/// place in an HTML document.
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if !is_valid_xml_char(c) {
            continue;
        }
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// A list item. `html` must already be escaped.
#[derive(Debug, Clone, Default)]
pub struct Item {
    html: String,
    children: Vec<List>,
}

impl Item {
    pub fn new(html: impl Into<String>) -> Self {
        Self {
            html: html.into(),
            children: Vec::new(),
        }
    }

    pub fn with_list(mut self, list: List) -> Self {
        self.push_list(list);
        self
    }

    pub fn push_list(&mut self, list: List) {
        if !list.is_empty() {
            self.children.push(list);
        }
    }

    fn write(&self, out: &mut String) {
        out.push_str("<li>");
        out.push_str(&self.html);
        for child in &self.children {
            out.push('\n');
            child.write(out);
            out.push('\n');
        }
        out.push_str("</li>");
    }
}

#[derive(Debug, Clone, Default)]
pub struct List {
    ordered: bool,
    items: Vec<Item>,
}

impl List {
    pub fn unordered() -> Self {
        Self::default()
    }

    pub fn ordered() -> Self {
        Self {
            ordered: true,
            items: Vec::new(),
        }
    }

    pub fn with_ordering(ordered: bool) -> Self {
        Self {
            ordered,
            items: Vec::new(),
        }
    }

    pub fn push(&mut self, item: Item) {
        self.items.push(item);
    }

    /// Pushes an item without children. `html` must already be escaped.
    pub fn push_html(&mut self, html: impl Into<String>) {
        self.items.push(Item::new(html));
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    fn write(&self, out: &mut String) {
        let tag = if self.ordered { "ol" } else { "ul" };
        out.push('<');
        out.push_str(tag);
        out.push('>');
        for item in &self.items {
            out.push('\n');
            item.write(out);
        }
        out.push_str("\n</");
        out.push_str(tag);
        out.push('>');
    }
}

/// Block-level builder producing the final description string.
#[derive(Debug, Clone, Default)]
pub struct Fragment {
    blocks: Vec<String>,
}

impl Fragment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `<p>html</p>`. `html` must already be escaped.
    pub fn paragraph(&mut self, html: impl AsRef<str>) {
        self.blocks.push(format!("<p>{}</p>", html.as_ref()));
    }

    /// Adds a bold section label followed by a colon.
    pub fn heading(&mut self, label: &str) {
        self.blocks
            .push(format!("<p><strong>{}:</strong></p>", escape_html(label)));
    }

    pub fn list(&mut self, list: List) {
        if list.is_empty() {
            return;
        }
        let mut out = String::new();
        list.write(&mut out);
        self.blocks.push(out);
    }

    pub fn finish(self) -> String {
        self.blocks.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::{Fragment, Item, List, escape_html};

    #[test]
    fn remove_invalid_control_chars() {
        let s = "A\u{0007}B\u{000C}C";
        assert_eq!(escape_html(s), "ABC");
    }

    #[test]
    fn keep_valid_whitespace_controls() {
        let s = "a\tb\nc\rd";
        assert_eq!(escape_html(s), s);
    }

    #[test]
    fn escape_special_html_chars() {
        let s = r#"<tag attr="x&y">'z'"#;
        assert_eq!(
            escape_html(s),
            "&lt;tag attr=&quot;x&amp;y&quot;&gt;'z'"
        );
    }

    #[test]
    fn nested_lists_render_inside_their_item() {
        let mut inner = List::unordered();
        inner.push_html("child");
        let mut outer = List::ordered();
        outer.push(Item::new("parent").with_list(inner));
        outer.push_html("sibling");

        let mut fragment = Fragment::new();
        fragment.paragraph("Summary.");
        fragment.list(outer);

        assert_eq!(
            fragment.finish(),
            "<p>Summary.</p>\n<ol>\n<li>parent\n<ul>\n<li>child</li>\n</ul>\n</li>\n<li>sibling</li>\n</ol>"
        );
    }

    #[test]
    fn empty_lists_are_skipped() {
        let mut fragment = Fragment::new();
        fragment.heading("Notes");
        fragment.list(List::unordered());
        assert_eq!(fragment.finish(), "<p><strong>Notes:</strong></p>");
    }
}
