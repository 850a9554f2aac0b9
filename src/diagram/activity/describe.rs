use std::sync::OnceLock;

use regex::Regex;

use crate::diagram::locale::{Locale, count_phrase, fill};
use crate::diagram::types::*;
use crate::html::{Fragment, Item, List, escape_html};

struct Labels {
    title: &'static str,
    with: &'static str,
    partition: &'static str,
    partitions: &'static str,
    activity: &'static str,
    activities: &'static str,
    decision: &'static str,
    decisions: &'static str,
    and: &'static str,
    flow: &'static str,
    start: &'static str,
    stop: &'static str,
    end: &'static str,
    decision_label: &'static str,
    yes: &'static str,
    no: &'static str,
    /// `{name}` placeholder.
    partition_open: &'static str,
    partition_close: &'static str,
    /// `{condition}` placeholder.
    loop_open: &'static str,
    loop_close: &'static str,
    /// `{n}` placeholder.
    fork_open: &'static str,
    fork_close: &'static str,
    branch: &'static str,
}

static EN: Labels = Labels {
    title: "Activity diagram",
    with: "with",
    partition: "{count} partition",
    partitions: "{count} partitions",
    activity: "{count} activity",
    activities: "{count} activities",
    decision: "{count} decision point",
    decisions: "{count} decision points",
    and: "and",
    flow: "Flow",
    start: "Start",
    stop: "Stop",
    end: "End",
    decision_label: "Decision",
    yes: "Yes",
    no: "No",
    partition_open: "Partition {name}, consisting of:",
    partition_close: "End partition {name}.",
    loop_open: "Repeat while {condition}, consisting of:",
    loop_close: "End repeat.",
    fork_open: "Parallel execution {n}, consisting of:",
    fork_close: "End parallel execution {n}.",
    branch: "Branch {n}:",
};

static NL: Labels = Labels {
    title: "Activiteitendiagram",
    with: "met",
    partition: "{count} partitie",
    partitions: "{count} partities",
    activity: "{count} activiteit",
    activities: "{count} activiteiten",
    decision: "{count} beslispunt",
    decisions: "{count} beslispunten",
    and: "en",
    flow: "Stroom",
    start: "Start",
    stop: "Stop",
    end: "Einde",
    decision_label: "Beslissing",
    yes: "Ja",
    no: "Nee",
    partition_open: "Partitie {name}, bestaande uit:",
    partition_close: "Einde partitie {name}.",
    loop_open: "Herhaal zolang {condition}, bestaande uit:",
    loop_close: "Einde herhaling.",
    fork_open: "Parallelle uitvoering {n}, bestaande uit:",
    fork_close: "Einde parallelle uitvoering {n}.",
    branch: "Tak {n}:",
};

/// `A: Title` partition names, as used for swimlane-style lettering.
fn lettered_partition_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^([A-Z]):\s*(.+)$").expect("valid regex"))
}

/// Generate the accessible description of an activity diagram. Unknown
/// locales fall back to Dutch.
pub fn describe(diagram: &ActivityDiagram, locale: &str) -> String {
    let t = Locale::resolve(locale, Locale::Nl).pick(&EN, &NL);
    let counts = ActivityCounts::walk(&diagram.elements);
    let mut out = Fragment::new();

    let mut summary = format!("{} {}", t.title, t.with);
    if counts.partitions > 0 {
        summary.push(' ');
        summary.push_str(&count_phrase(counts.partitions, t.partition, t.partitions));
        summary.push(' ');
        summary.push_str(t.and);
    }
    summary.push(' ');
    summary.push_str(&count_phrase(counts.activities, t.activity, t.activities));
    if counts.decisions > 0 {
        summary.push(' ');
        summary.push_str(t.and);
        summary.push(' ');
        summary.push_str(&count_phrase(counts.decisions, t.decision, t.decisions));
    }
    summary.push('.');
    out.paragraph(escape_html(&summary));

    if !diagram.elements.is_empty() {
        out.heading(t.flow);
        let mut forks = 0;
        out.list(flow_list(&diagram.elements, t, &mut forks));
    }

    out.finish()
}

fn flow_list(elements: &[ActivityElement], t: &Labels, forks: &mut usize) -> List {
    let mut list = List::unordered();
    for element in elements {
        match element {
            ActivityElement::Start => list.push_html(t.start),
            ActivityElement::Stop => list.push_html(t.stop),
            ActivityElement::End => list.push_html(t.end),
            ActivityElement::Activity { text } => list.push_html(escape_html(text)),
            ActivityElement::Decision {
                condition,
                yes_branch,
                no_branch,
            } => list.push_html(escape_html(&decision_text(
                condition, yes_branch, no_branch, t,
            ))),
            ActivityElement::Partition { name, elements } => {
                let (full, short) = partition_names(name);
                list.push(
                    Item::new(escape_html(&fill(t.partition_open, &[("name", &full)])))
                        .with_list(flow_list(elements, t, forks)),
                );
                list.push_html(escape_html(&fill(t.partition_close, &[("name", &short)])));
            }
            ActivityElement::While {
                condition,
                condition_value,
                elements,
                ..
            } => {
                let condition = match condition_value {
                    Some(value) => format!("{condition} ({value})"),
                    None => condition.clone(),
                };
                push_loop(&mut list, &condition, elements, t, forks);
            }
            ActivityElement::Repeat {
                condition,
                elements,
            } => push_loop(&mut list, condition, elements, t, forks),
            ActivityElement::Fork { branches } => {
                *forks += 1;
                let n = forks.to_string();
                let mut branch_list = List::unordered();
                for (idx, branch) in branches.iter().enumerate() {
                    let label = fill(t.branch, &[("n", &(idx + 1).to_string())]);
                    branch_list.push(
                        Item::new(escape_html(&label)).with_list(flow_list(branch, t, forks)),
                    );
                }
                list.push(
                    Item::new(escape_html(&fill(t.fork_open, &[("n", &n)])))
                        .with_list(branch_list),
                );
                list.push_html(escape_html(&fill(t.fork_close, &[("n", &n)])));
            }
        }
    }
    list
}

fn push_loop(
    list: &mut List,
    condition: &str,
    elements: &[ActivityElement],
    t: &Labels,
    forks: &mut usize,
) {
    list.push(
        Item::new(escape_html(&fill(t.loop_open, &[("condition", condition)])))
            .with_list(flow_list(elements, t, forks)),
    );
    list.push_html(escape_html(t.loop_close));
}

/// Opening and closing names: `A: Title` closes as just `A`.
fn partition_names(name: &str) -> (String, String) {
    match lettered_partition_regex().captures(name) {
        Some(caps) => (format!("{}: {}", &caps[1], caps[2].trim()), caps[1].to_string()),
        None => (name.to_string(), name.to_string()),
    }
}

fn decision_text(
    condition: &str,
    yes_branch: &[ActivityElement],
    no_branch: &[ActivityElement],
    t: &Labels,
) -> String {
    let mut text = format!("{}: {condition}", t.decision_label);
    for (label, branch) in [(t.yes, yes_branch), (t.no, no_branch)] {
        let mut names = Vec::new();
        collect_texts(branch, &mut names);
        if !names.is_empty() {
            text.push_str(&format!(" - {label}: {}", names.join(", ")));
        }
    }
    text
}

/// Activity texts of a branch in document order, including nested blocks.
fn collect_texts<'a>(elements: &'a [ActivityElement], out: &mut Vec<&'a str>) {
    for element in elements {
        match element {
            ActivityElement::Activity { text } => out.push(text),
            ActivityElement::Decision {
                yes_branch,
                no_branch,
                ..
            } => {
                collect_texts(yes_branch, out);
                collect_texts(no_branch, out);
            }
            ActivityElement::Partition { elements, .. }
            | ActivityElement::While { elements, .. }
            | ActivityElement::Repeat { elements, .. } => collect_texts(elements, out),
            ActivityElement::Fork { branches } => {
                for branch in branches {
                    collect_texts(branch, out);
                }
            }
            ActivityElement::Start | ActivityElement::Stop | ActivityElement::End => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagram::activity::parse;

    const GRAPHVIZ: &str = "@startuml\nstart\n:Read input;\n\
                            if (Graphviz installed?) then (yes)\n  :process all diagrams;\n\
                            else (no)\n  :process only sequence diagrams;\nendif\nstop\n@enduml";

    #[test]
    fn english_decision_flow() {
        let html = describe(&parse(GRAPHVIZ), "en");
        assert_eq!(
            html,
            "<p>Activity diagram with 3 activities and 1 decision point.</p>\n\
             <p><strong>Flow:</strong></p>\n\
             <ul>\n<li>Start</li>\n<li>Read input</li>\n\
             <li>Decision: Graphviz installed? - Yes: process all diagrams - No: process only sequence diagrams</li>\n\
             <li>Stop</li>\n</ul>"
        );
    }

    #[test]
    fn dutch_is_the_default() {
        let html = describe(&parse(GRAPHVIZ), "xx");
        assert!(html.starts_with("<p>Activiteitendiagram met 3 activiteiten en 1 beslispunt.</p>"));
        assert!(
            html.contains("<li>Beslissing: Graphviz installed? - Ja: process all diagrams - Nee: process only sequence diagrams</li>")
        );
        assert!(html.contains("<p><strong>Stroom:</strong></p>"));
    }

    #[test]
    fn partitions_open_and_close() {
        let html = describe(
            &parse("partition \"A: Intake\" {\n:register;\n}\n:done;"),
            "en",
        );
        assert!(html.starts_with("<p>Activity diagram with 1 partition and 2 activities.</p>"));
        assert!(html.contains(
            "<li>Partition A: Intake, consisting of:\n<ul>\n<li>register</li>\n</ul>\n</li>\n<li>End partition A.</li>"
        ));
    }

    #[test]
    fn unlettered_partition_keeps_its_name() {
        let html = describe(&parse("partition Checkout {\n:pay;\n}"), "nl");
        assert!(html.contains("<li>Partitie Checkout, bestaande uit:"));
        assert!(html.contains("<li>Einde partitie Checkout.</li>"));
    }

    #[test]
    fn loops_and_forks_are_numbered() {
        let input = "while (more?) is (yes)\n:read;\nendwhile\nfork\n:a;\nfork again\n:b;\n\
                     end fork\nfork\n:c;\nend fork";
        let html = describe(&parse(input), "en");
        assert!(
            html.contains("<li>Repeat while more? (yes), consisting of:\n<ul>\n<li>read</li>\n</ul>\n</li>\n<li>End repeat.</li>")
        );
        assert!(
            html.contains("<li>Parallel execution 1, consisting of:\n<ul>\n<li>Branch 1:\n<ul>\n<li>a</li>\n</ul>\n</li>\n<li>Branch 2:")
        );
        assert!(html.contains("<li>End parallel execution 1.</li>"));
        assert!(html.contains("<li>End parallel execution 2.</li>"));
    }

    #[test]
    fn decision_collects_nested_activity_texts() {
        let input = "if (x) then\n  while (y)\n  :loop;\n  endwhile\n  :after;\nendif";
        let html = describe(&parse(input), "en");
        assert!(html.contains("<li>Decision: x - Yes: loop, after</li>"));
    }

    #[test]
    fn text_is_escaped() {
        let html = describe(&parse(":a < b & c;"), "en");
        assert!(html.contains("<li>a &lt; b &amp; c</li>"));
    }

    #[test]
    fn empty_diagram() {
        assert_eq!(
            describe(&ActivityDiagram::default(), "en"),
            "<p>Activity diagram with 0 activities.</p>"
        );
    }
}
