use std::sync::OnceLock;

use regex::Regex;
use tracing::debug;

use crate::diagram::classify::{is_comment, strip_quotes};
use crate::diagram::types::*;

fn segment_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"^(?:"([^"]+)"|([^":]+?))\s*:\s*(-?(?:\d+(?:\.\d*)?|\.\d+))\s*$"#)
            .expect("valid regex")
    })
}

/// Parse a Mermaid pie chart. Lines before the `pie` header are ignored.
pub fn parse(input: &str) -> PieChart {
    let mut chart = PieChart::default();
    let mut in_pie = false;

    for (idx, raw) in input.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || is_comment(line) {
            continue;
        }

        if !in_pie {
            if let Some(rest) = line.strip_prefix("pie") {
                in_pie = true;
                read_header(&mut chart, rest);
            }
            continue;
        }

        if let Some(title) = line.strip_prefix("title ") {
            chart.title = Some(strip_quotes(title).to_string());
            continue;
        }
        if line.starts_with("accTitle") || line.starts_with("accDescr") {
            continue;
        }

        let Some(caps) = segment_regex().captures(line) else {
            debug!(line = idx + 1, text = line, "skipping unrecognized pie chart line");
            continue;
        };
        let label = caps
            .get(1)
            .or_else(|| caps.get(2))
            .map(|m| m.as_str().trim())
            .unwrap_or_default();
        match caps[3].parse::<f64>() {
            Ok(value) if value >= 0.0 && value.is_finite() => chart.segments.push(Segment {
                label: label.to_string(),
                value,
            }),
            _ => debug!(line = idx + 1, label, "dropping pie segment with a negative value"),
        }
    }

    chart
}

/// `pie`, `pie showData`, `pie title X` and `pie showData title X`.
fn read_header(chart: &mut PieChart, rest: &str) {
    let mut rest = rest.trim();
    if let Some(after) = rest.strip_prefix("showData") {
        chart.show_data = true;
        rest = after.trim();
    }
    if let Some(title) = rest.strip_prefix("title") {
        let title = strip_quotes(title.trim());
        if !title.is_empty() {
            chart.title = Some(title.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn title_and_quoted_segments() {
        let chart = parse("pie\n    title Votes\n    \"Yes\": 3\n    \"No\": 1");
        assert_eq!(chart.title.as_deref(), Some("Votes"));
        assert_eq!(
            chart.segments,
            vec![
                Segment { label: "Yes".into(), value: 3.0 },
                Segment { label: "No".into(), value: 1.0 },
            ]
        );
    }

    #[test]
    fn inline_header_options() {
        let chart = parse("pie showData title Key elements\n\"Calcium\" : 42.96\nIron: 5");
        assert!(chart.show_data);
        assert_eq!(chart.title.as_deref(), Some("Key elements"));
        assert_eq!(chart.segments[0].value, 42.96);
        assert_eq!(chart.segments[1].label, "Iron");
    }

    #[test]
    fn labels_with_colons_and_spaces() {
        let chart = parse("pie\n\"Ratio: high\": 2\nbare words: 1");
        assert_eq!(chart.segments[0].label, "Ratio: high");
        assert_eq!(chart.segments[1].label, "bare words");
    }

    #[test]
    fn negative_and_malformed_values_are_dropped() {
        let chart = parse("pie\n\"A\": -4\n\"B\": lots\n%% \"C\": 1\n\"D\": 0");
        assert_eq!(chart.segments.len(), 1);
        assert_eq!(chart.segments[0].label, "D");
    }

    #[test]
    fn lines_before_header_are_ignored() {
        let chart = parse("\"A\": 1\npie\n\"B\": 2");
        assert_eq!(chart.segments.len(), 1);
        assert_eq!(chart.total(), 2.0);
    }
}
