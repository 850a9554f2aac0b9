use crate::diagram::locale::{Locale, fill};
use crate::diagram::types::*;
use crate::html::{Fragment, List, escape_html};

struct Labels {
    /// `{states}` and `{transitions}` placeholders.
    summary: &'static str,
    initial_state: &'static str,
    states: &'static str,
    transitions: &'static str,
    final_marker: &'static str,
    final_states: &'static str,
    transitions_to: &'static str,
    stays: &'static str,
    when: &'static str,
}

static EN: Labels = Labels {
    summary: "State diagram with {states} state(s) and {transitions} transition(s).",
    initial_state: "Initial state",
    states: "States",
    transitions: "Transitions",
    final_marker: "final state",
    final_states: "Final state(s)",
    transitions_to: "transitions to",
    stays: "stays in the same state",
    when: "when",
};

static NL: Labels = Labels {
    summary: "Toestandsdiagram met {states} toestand(en) en {transitions} overgang(en).",
    initial_state: "Initiële toestand",
    states: "Toestanden",
    transitions: "Overgangen",
    final_marker: "eindtoestand",
    final_states: "Eindtoestand(en)",
    transitions_to: "gaat over naar",
    stays: "blijft in dezelfde toestand",
    when: "wanneer",
};

/// Generate the accessible description of a state diagram. Unknown locales
/// fall back to Dutch.
pub fn describe(diagram: &StateDiagram, locale: &str) -> String {
    let t = Locale::resolve(locale, Locale::Nl).pick(&EN, &NL);
    let mut out = Fragment::new();

    out.paragraph(escape_html(&fill(
        t.summary,
        &[
            ("states", &diagram.states.len().to_string()),
            ("transitions", &diagram.transitions.len().to_string()),
        ],
    )));

    if let Some(initial) = &diagram.initial_state {
        out.paragraph(format!(
            "{}: {}",
            t.initial_state,
            escape_html(display(diagram, initial))
        ));
    }

    if !diagram.states.is_empty() {
        out.heading(t.states);
        let mut list = List::ordered();
        for state in &diagram.states {
            let mut item = escape_html(display(diagram, state));
            if diagram.final_states.contains(state) {
                item.push_str(&format!(" ({})", t.final_marker));
            }
            list.push_html(item);
        }
        out.list(list);
    }

    if !diagram.transitions.is_empty() {
        out.heading(t.transitions);
        let mut list = List::ordered();
        for transition in &diagram.transitions {
            list.push_html(describe_transition(diagram, transition, t));
        }
        out.list(list);
    }

    if !diagram.final_states.is_empty() {
        let names: Vec<String> = diagram
            .final_states
            .iter()
            .map(|s| escape_html(display(diagram, s)))
            .collect();
        out.paragraph(format!("{}: {}", t.final_states, names.join(", ")));
    }

    out.finish()
}

/// Declared label of a state, or its name.
fn display<'a>(diagram: &'a StateDiagram, state: &'a str) -> &'a str {
    diagram.labels.get(state).map(String::as_str).unwrap_or(state)
}

fn describe_transition(diagram: &StateDiagram, transition: &Transition, t: &Labels) -> String {
    let from = escape_html(display(diagram, &transition.from));
    let mut text = if transition.is_self_loop() {
        format!("{from} {}", t.stays)
    } else {
        let to = escape_html(display(diagram, &transition.to));
        format!("{from} {} {to}", t.transitions_to)
    };
    if let Some(label) = &transition.label {
        text.push_str(&format!(" {} '{}'", t.when, escape_html(label)));
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagram::state::parse;

    const IDLE: &str = "[*] --> Idle\nIdle --> Running : start\nRunning --> [*]";

    #[test]
    fn english_description() {
        assert_eq!(
            describe(&parse(IDLE), "en"),
            "<p>State diagram with 2 state(s) and 1 transition(s).</p>\n\
             <p>Initial state: Idle</p>\n\
             <p><strong>States:</strong></p>\n\
             <ol>\n<li>Idle</li>\n<li>Running (final state)</li>\n</ol>\n\
             <p><strong>Transitions:</strong></p>\n\
             <ol>\n<li>Idle transitions to Running when 'start'</li>\n</ol>\n\
             <p>Final state(s): Running</p>"
        );
    }

    #[test]
    fn dutch_and_fallback() {
        let html = describe(&parse(IDLE), "nl");
        assert!(html.starts_with("<p>Toestandsdiagram met 2 toestand(en) en 1 overgang(en).</p>"));
        assert!(html.contains("<li>Idle gaat over naar Running wanneer 'start'</li>"));
        assert!(html.contains("<li>Running (eindtoestand)</li>"));
        assert_eq!(describe(&parse(IDLE), "xx"), html);
    }

    #[test]
    fn self_loop_phrasing() {
        let html = describe(&parse("Idle --> Idle : tick"), "en");
        assert!(html.contains("<li>Idle stays in the same state when 'tick'</li>"));
    }

    #[test]
    fn labels_replace_names() {
        let html = describe(&parse("state \"Waiting <input>\" as W\n[*] --> W"), "en");
        assert!(html.contains("<p>Initial state: Waiting &lt;input&gt;</p>"));
    }

    #[test]
    fn empty_diagram() {
        assert_eq!(
            describe(&StateDiagram::default(), "en"),
            "<p>State diagram with 0 state(s) and 0 transition(s).</p>"
        );
    }
}
