use crate::diagram::locale::{Locale, count_phrase};
use crate::diagram::types::*;
use crate::html::{Fragment, List, escape_html};

struct Labels {
    empty: &'static str,
    /// `{title}` and `{count}` placeholders.
    titled: &'static str,
    titled_plural: &'static str,
    untitled: &'static str,
    untitled_plural: &'static str,
}

static EN: Labels = Labels {
    empty: "Pie chart with no segments.",
    titled: "Pie chart with title \"{title}\" showing {count} segment.",
    titled_plural: "Pie chart with title \"{title}\" showing {count} segments.",
    untitled: "Pie chart showing {count} segment.",
    untitled_plural: "Pie chart showing {count} segments.",
};

static NL: Labels = Labels {
    empty: "Taartdiagram zonder segmenten.",
    titled: "Taartdiagram met titel \"{title}\" met {count} segment.",
    titled_plural: "Taartdiagram met titel \"{title}\" met {count} segmenten.",
    untitled: "Taartdiagram met {count} segment.",
    untitled_plural: "Taartdiagram met {count} segmenten.",
};

/// Share of `value` in `total` as a whole percentage; 0 when the total is 0.
pub(crate) fn percentage(value: f64, total: f64) -> i64 {
    if total > 0.0 {
        (value / total * 100.0).round() as i64
    } else {
        0
    }
}

/// Generate the accessible description of a pie chart. Unknown locales fall
/// back to English.
pub fn describe(chart: &PieChart, locale: &str) -> String {
    let t = Locale::resolve(locale, Locale::En).pick(&EN, &NL);
    let mut out = Fragment::new();

    if chart.segments.is_empty() {
        out.paragraph(escape_html(t.empty));
        return out.finish();
    }

    let count = chart.segments.len();
    let summary = match &chart.title {
        Some(title) => count_phrase(count, t.titled, t.titled_plural).replace("{title}", title),
        None => count_phrase(count, t.untitled, t.untitled_plural),
    };
    out.paragraph(escape_html(&summary));

    let total = chart.total();
    let mut list = List::unordered();
    for segment in &chart.segments {
        list.push_html(escape_html(&format!(
            "{}: {} ({}%)",
            segment.label,
            segment.value,
            percentage(segment.value, total)
        )));
    }
    out.list(list);

    out.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagram::pie::parse;

    #[test]
    fn votes_scenario() {
        let chart = parse("pie\ntitle Votes\n\"Yes\": 3\n\"No\": 1");
        assert_eq!(
            describe(&chart, "en"),
            "<p>Pie chart with title &quot;Votes&quot; showing 2 segments.</p>\n\
             <ul>\n<li>Yes: 3 (75%)</li>\n<li>No: 1 (25%)</li>\n</ul>"
        );
    }

    #[test]
    fn dutch_and_untitled() {
        let chart = parse("pie\n\"Appels\": 1");
        assert_eq!(
            describe(&chart, "nl"),
            "<p>Taartdiagram met 1 segment.</p>\n<ul>\n<li>Appels: 1 (100%)</li>\n</ul>"
        );
    }

    #[test]
    fn fractional_values_and_rounding() {
        let chart = parse("pie\nA: 1.5\nB: 1\nC: 0.5");
        let html = describe(&chart, "en");
        assert!(html.contains("<li>A: 1.5 (50%)</li>"));
        assert!(html.contains("<li>B: 1 (33%)</li>"));
        assert!(html.contains("<li>C: 0.5 (17%)</li>"));
    }

    #[test]
    fn zero_total_gives_zero_percent() {
        let html = describe(&parse("pie\nA: 0\nB: 0"), "en");
        assert!(html.contains("<li>A: 0 (0%)</li>"));
        assert_eq!(percentage(3.0, 0.0), 0);
    }

    #[test]
    fn empty_chart_and_unknown_locale() {
        let empty = PieChart::default();
        assert_eq!(describe(&empty, "xx"), "<p>Pie chart with no segments.</p>");
        assert_eq!(describe(&empty, "nl"), "<p>Taartdiagram zonder segmenten.</p>");
    }

    #[test]
    fn labels_are_escaped() {
        let html = describe(&parse("pie\n\"<b>\": 1"), "en");
        assert!(html.contains("<li>&lt;b&gt;: 1 (100%)</li>"));
    }
}
