use crate::diagram::locale::{Locale, count_phrase, join_names};
use crate::diagram::types::*;
use crate::html::{Fragment, List, escape_html};

struct Labels {
    participant: &'static str,
    participants: &'static str,
    of_type: &'static str,
    interactions: &'static str,
    and: &'static str,
    external_caller: &'static str,
    /// `{from}`, `{to}` and `{call}` placeholders.
    calls_method: &'static str,
    calls: &'static str,
    sends_message: &'static str,
    responds: &'static str,
    responds_with: &'static str,
}

static EN: Labels = Labels {
    participant: "Sequence diagram with {count} participant",
    participants: "Sequence diagram with {count} participants",
    of_type: "of type",
    interactions: "Interactions",
    and: "and",
    external_caller: "An external caller",
    calls_method: "{from} calls {to}.{call}",
    calls: "{from} calls {to}",
    sends_message: "{from} sends {to} the message '{text}'",
    responds: "{from} responds to {to}",
    responds_with: "{from} responds to {to}: {text}",
};

static NL: Labels = Labels {
    participant: "Sequentiediagram met {count} deelnemer",
    participants: "Sequentiediagram met {count} deelnemers",
    of_type: "van type",
    interactions: "Interacties",
    and: "en",
    external_caller: "Een externe aanroeper",
    calls_method: "{from} roept {to}.{call} aan",
    calls: "{from} roept {to} aan",
    sends_message: "{from} stuurt {to} het bericht '{text}'",
    responds: "{from} antwoordt {to}",
    responds_with: "{from} antwoordt {to}: {text}",
};

/// Generate the accessible description of a sequence diagram. Unknown
/// locales fall back to Dutch.
pub fn describe(diagram: &SequenceDiagram, locale: &str) -> String {
    let t = Locale::resolve(locale, Locale::Nl).pick(&EN, &NL);
    let mut out = Fragment::new();

    let count = diagram.participants.len();
    let mut summary = escape_html(&count_phrase(count, t.participant, t.participants));
    if count > 0 {
        let names: Vec<String> = diagram
            .participants
            .iter()
            .map(|p| participant_name(p, t))
            .collect();
        summary.push_str(": ");
        summary.push_str(&join_names(&names, t.and));
    }
    summary.push('.');
    out.paragraph(summary);

    if !diagram.messages.is_empty() {
        out.heading(t.interactions);
        let mut list = List::with_ordering(diagram.has_autonumber);
        for message in &diagram.messages {
            list.push_html(describe_message(diagram, message, t));
        }
        out.list(list);
    }

    out.finish()
}

fn participant_name(participant: &Participant, t: &Labels) -> String {
    let name = escape_html(&participant.display_alias);
    match &participant.type_name {
        Some(type_name) => format!("{name} {} {}", t.of_type, escape_html(type_name)),
        None => name,
    }
}

fn is_identifier(text: &str) -> bool {
    !text.is_empty() && text.chars().all(|c| c.is_alphanumeric() || c == '_')
}

fn describe_message(diagram: &SequenceDiagram, message: &Message, t: &Labels) -> String {
    let from = if message.is_external_origin {
        escape_html(t.external_caller)
    } else {
        escape_html(diagram.display_name(&message.from))
    };
    let to = escape_html(diagram.display_name(&message.to));
    let text = message.text.trim();

    let (template, text) = match message.kind {
        MessageKind::Response if text.is_empty() => (t.responds, String::new()),
        MessageKind::Response if text.contains(' ') => {
            (t.responds_with, format!("'{}'", escape_html(text)))
        }
        MessageKind::Response => (t.responds_with, escape_html(text)),
        MessageKind::Call if text.is_empty() => (t.calls, String::new()),
        MessageKind::Call if message.is_method_call => (t.calls_method, escape_html(text)),
        MessageKind::Call if is_identifier(text) => {
            (t.calls_method, format!("{}()", escape_html(text)))
        }
        MessageKind::Call => (t.sends_message, escape_html(text)),
    };

    template
        .replace("{from}", &from)
        .replace("{to}", &to)
        .replace("{call}", &text)
        .replace("{text}", &text)
}
