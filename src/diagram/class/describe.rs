use crate::diagram::locale::{Locale, fill};
use crate::diagram::types::*;
use crate::html::{Fragment, Item, List, escape_html};

struct Labels {
    summary: &'static str,
    classes: &'static str,
    relations: &'static str,
    notes: &'static str,
    class: &'static str,
    interface: &'static str,
    abstract_class: &'static str,
    enumeration: &'static str,
    with_stereotype: &'static str,
    with: &'static str,
    without_members: &'static str,
    no_attributes: &'static str,
    no_methods: &'static str,
    attribute: &'static str,
    method: &'static str,
    value: &'static str,
    /// Attribute visibility: public, private, protected, package.
    attribute_visibility: [&'static str; 4],
    /// Method visibility: public, private, protected, package.
    method_visibility: [&'static str; 4],
    of_type: &'static str,
    array: &'static str,
    without_parameters: &'static str,
    with_parameter: &'static str,
    with_parameters: &'static str,
    return_type: &'static str,
    inheritance: &'static str,
    implementation: &'static str,
    association: &'static str,
    aggregation: &'static str,
    composition: &'static str,
    dependency: &'static str,
    named: &'static str,
    with_target: &'static str,
    multiplicity: &'static str,
    at: &'static str,
    and: &'static str,
    note_for: &'static str,
}

static EN: Labels = Labels {
    summary: "Class diagram with {classes} class(es) and {relations} relation(s).",
    classes: "Classes",
    relations: "Relations",
    notes: "Notes",
    class: "Class",
    interface: "Interface",
    abstract_class: "Abstract class",
    enumeration: "Enumeration",
    with_stereotype: "with stereotype",
    with: "with",
    without_members: "without methods and attributes",
    no_attributes: "no attributes",
    no_methods: "no methods",
    attribute: "attribute",
    method: "method",
    value: "value",
    attribute_visibility: ["public", "private", "protected", "package"],
    method_visibility: ["public", "private", "protected", "package"],
    of_type: "of type",
    array: "array",
    without_parameters: "without parameters",
    with_parameter: "with parameter",
    with_parameters: "with parameters",
    return_type: "return type",
    inheritance: "extends",
    implementation: "implements interface",
    association: "has an association",
    aggregation: "has an aggregation",
    composition: "has a composition",
    dependency: "has a dependency",
    named: "named",
    with_target: "with",
    multiplicity: "multiplicity",
    at: "at",
    and: "and",
    note_for: "For class {class}",
};

static NL: Labels = Labels {
    summary: "Klassendiagram met {classes} klasse(n) en {relations} relatie(s).",
    classes: "Klassen",
    relations: "Relaties",
    notes: "Notities",
    class: "Klasse",
    interface: "Interface",
    abstract_class: "Abstracte klasse",
    enumeration: "Enumeratie",
    with_stereotype: "met stereotype",
    with: "met",
    without_members: "zonder methoden en attributen",
    no_attributes: "geen attributen",
    no_methods: "geen methoden",
    attribute: "attribuut",
    method: "methode",
    value: "waarde",
    attribute_visibility: ["publiek", "privé", "beschermd", "package"],
    method_visibility: ["publieke", "private", "beschermde", "package"],
    of_type: "van type",
    array: "array",
    without_parameters: "zonder parameters",
    with_parameter: "met parameter",
    with_parameters: "met parameters",
    return_type: "return type",
    inheritance: "erft van",
    implementation: "implementeert interface",
    association: "heeft een associatie",
    aggregation: "heeft een aggregatie",
    composition: "heeft een compositie",
    dependency: "heeft een afhankelijkheid",
    named: "met naam",
    with_target: "met",
    multiplicity: "multipliciteit",
    at: "bij",
    and: "en",
    note_for: "Bij klasse {class}",
};

fn labels(locale: Locale) -> &'static Labels {
    locale.pick(&EN, &NL)
}

/// Generate the accessible description of a class diagram. Unknown locales
/// fall back to Dutch.
pub fn describe(diagram: &ClassDiagram, locale: &str) -> String {
    let t = labels(Locale::resolve(locale, Locale::Nl));
    let mut out = Fragment::new();

    out.paragraph(fill(
        t.summary,
        &[
            ("classes", &diagram.classes.len().to_string()),
            ("relations", &diagram.relations.len().to_string()),
        ],
    ));

    if !diagram.classes.is_empty() {
        out.heading(t.classes);
        let mut list = List::unordered();
        for class in diagram.classes.values() {
            list.push(describe_class(class, t));
        }
        out.list(list);
    }

    if !diagram.relations.is_empty() {
        out.heading(t.relations);
        let mut list = List::unordered();
        for relation in &diagram.relations {
            list.push_html(describe_relation(relation, t));
        }
        out.list(list);
    }

    if !diagram.notes.is_empty() {
        out.heading(t.notes);
        let mut list = List::unordered();
        for note in &diagram.notes {
            list.push_html(format!(
                "{}: {}",
                escape_html(&fill(t.note_for, &[("class", &note.class_name)])),
                escape_html(&note.text)
            ));
        }
        out.list(list);
    }

    out.finish()
}

fn class_header(class: &ClassDef, t: &Labels) -> String {
    let name = escape_html(&class.name);
    match &class.stereotype {
        None => format!("{} {name}", t.class),
        Some(Stereotype::Interface) => format!("{} {name}", t.interface),
        Some(Stereotype::Abstract) => format!("{} {name}", t.abstract_class),
        Some(Stereotype::Enumeration) => format!("{} {name}", t.enumeration),
        Some(Stereotype::Custom(label)) => format!(
            "{} {name} {} {}",
            t.class,
            t.with_stereotype,
            escape_html(label)
        ),
    }
}

fn describe_class(class: &ClassDef, t: &Labels) -> Item {
    let header = class_header(class, t);
    if class.attributes.is_empty() && class.methods.is_empty() {
        return Item::new(format!("{header} {}", t.without_members));
    }

    let is_enum = class.stereotype == Some(Stereotype::Enumeration);
    let mut members = List::unordered();
    if class.methods.is_empty() {
        members.push_html(t.no_methods);
    }
    for method in &class.methods {
        members.push_html(describe_method(method, t));
    }
    if class.attributes.is_empty() {
        members.push_html(t.no_attributes);
    }
    for attr in &class.attributes {
        members.push_html(describe_attribute(attr, is_enum, t));
    }

    let joiner = if matches!(class.stereotype, Some(Stereotype::Custom(_))) {
        ","
    } else {
        ""
    };
    Item::new(format!("{header}{joiner} {}:", t.with)).with_list(members)
}

fn visibility_word(visibility: Visibility, words: &[&'static str; 4]) -> Option<&'static str> {
    match visibility {
        Visibility::Public => Some(words[0]),
        Visibility::Private => Some(words[1]),
        Visibility::Protected => Some(words[2]),
        Visibility::Package => Some(words[3]),
        Visibility::Unspecified => None,
    }
}

fn member_kind(visibility: Visibility, words: &[&'static str; 4], noun: &str) -> String {
    match visibility_word(visibility, words) {
        Some(word) => format!("{word} {noun}"),
        None => noun.to_string(),
    }
}

fn describe_attribute(attr: &Attribute, is_enum: bool, t: &Labels) -> String {
    let name = escape_html(&attr.name);
    if is_enum && attr.type_name.is_none() && attr.visibility == Visibility::Unspecified {
        return format!("{} {name}", t.value);
    }
    let kind = member_kind(attr.visibility, &t.attribute_visibility, t.attribute);
    match &attr.type_name {
        Some(type_name) => format!(
            "{kind} {name} {} {}",
            t.of_type,
            escape_html(&readable_type(type_name, t))
        ),
        None => format!("{kind} {name}"),
    }
}

fn describe_method(method: &Method, t: &Labels) -> String {
    let kind = member_kind(method.visibility, &t.method_visibility, t.method);
    let mut text = format!("{kind} {}", escape_html(&method.name));

    match method.parameters.as_slice() {
        [] => {
            text.push_str(", ");
            text.push_str(t.without_parameters);
        }
        params => {
            let label = if params.len() == 1 {
                t.with_parameter
            } else {
                t.with_parameters
            };
            let params: Vec<String> = params.iter().map(|p| describe_parameter(p, t)).collect();
            text.push_str(&format!(", {label} {}", params.join(", ")));
        }
    }

    if let Some(ret) = &method.return_type {
        text.push_str(&format!(
            ", {} {}",
            t.return_type,
            escape_html(&readable_type(ret, t))
        ));
    }
    text
}

fn describe_parameter(param: &Parameter, t: &Labels) -> String {
    let name = escape_html(&param.name);
    match &param.type_name {
        Some(type_name) => format!(
            "{name} {} {}",
            t.of_type,
            escape_html(&readable_type(type_name, t))
        ),
        None => name,
    }
}

/// `List~int~` becomes `List<int>` and `String[]` becomes `String array`.
fn readable_type(type_name: &str, t: &Labels) -> String {
    let chars: Vec<char> = type_name.trim().chars().collect();
    let mut out = String::with_capacity(type_name.len());
    for (idx, &c) in chars.iter().enumerate() {
        if c != '~' {
            out.push(c);
            continue;
        }
        let before = idx.checked_sub(1).map(|i| chars[i]);
        let after = chars.get(idx + 1).copied();
        let opens = before.is_some_and(|b| b.is_alphanumeric())
            && after.is_some_and(|a| a.is_alphanumeric());
        out.push(if opens { '<' } else { '>' });
    }
    match out.strip_suffix("[]") {
        Some(element) => format!("{} {}", element.trim(), t.array),
        None => out,
    }
}

fn describe_relation(relation: &Relation, t: &Labels) -> String {
    let from = escape_html(&relation.from);
    let to = escape_html(&relation.to);

    let mut text = match relation.kind {
        RelationKind::Inheritance => format!("{from} {} {to}", t.inheritance),
        RelationKind::Implementation => format!("{from} {} {to}", t.implementation),
        kind => {
            let verb = match kind {
                RelationKind::Aggregation => t.aggregation,
                RelationKind::Composition => t.composition,
                RelationKind::Dependency => t.dependency,
                _ => t.association,
            };
            let named = relation
                .label
                .as_deref()
                .map(|label| format!(" {} '{}'", t.named, escape_html(label)))
                .unwrap_or_default();
            format!("{from} {verb}{named} {} {to}", t.with_target)
        }
    };

    let ends: Vec<String> = [
        (&relation.multiplicity_from, &from),
        (&relation.multiplicity_to, &to),
    ]
    .into_iter()
    .filter_map(|(mult, class)| {
        mult.as_deref()
            .map(|m| format!("{} {} {class}", escape_html(m), t.at))
    })
    .collect();
    if !ends.is_empty() {
        text.push_str(&format!(
            ", {} {}",
            t.multiplicity,
            ends.join(&format!(" {} ", t.and))
        ));
    }
    text
}
