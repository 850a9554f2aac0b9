use crate::diagram::classify::lower_first;
use crate::diagram::locale::{Locale, count_phrase, fill};
use crate::diagram::types::*;
use crate::html::{Fragment, Item, List, escape_html};

struct Labels {
    context_title: &'static str,
    container_title: &'static str,
    /// `{name}` is the enclosing boundary.
    container_title_named: &'static str,
    component_title: &'static str,
    component_title_named: &'static str,
    actor: &'static str,
    actors: &'static str,
    system: &'static str,
    systems: &'static str,
    internal_system: &'static str,
    internal_systems: &'static str,
    external_system: &'static str,
    external_systems: &'static str,
    container: &'static str,
    containers: &'static str,
    component: &'static str,
    components: &'static str,
    relationship: &'static str,
    relationships: &'static str,
    database: &'static str,
    queue: &'static str,
    external: &'static str,
    related_to: &'static str,
    both_directions: &'static str,
}

static EN: Labels = Labels {
    context_title: "C4 System Context diagram with:",
    container_title: "C4 Container diagram with:",
    container_title_named: "C4 Container diagram of {name} with:",
    component_title: "C4 Component diagram with:",
    component_title_named: "C4 Component diagram of {name} with:",
    actor: "{count} actor",
    actors: "{count} actors",
    system: "{count} system",
    systems: "{count} systems",
    internal_system: "{count} internal system",
    internal_systems: "{count} internal systems",
    external_system: "{count} external system",
    external_systems: "{count} external systems",
    container: "{count} container",
    containers: "{count} containers",
    component: "{count} component",
    components: "{count} components",
    relationship: "{count} relationship",
    relationships: "{count} relationships",
    database: "database",
    queue: "queue",
    external: "external",
    related_to: "is related to",
    both_directions: "in both directions",
};

static NL: Labels = Labels {
    context_title: "C4-systeemcontextdiagram met:",
    container_title: "C4-containerdiagram met:",
    container_title_named: "C4-containerdiagram van {name} met:",
    component_title: "C4-componentdiagram met:",
    component_title_named: "C4-componentdiagram van {name} met:",
    actor: "{count} actor",
    actors: "{count} actoren",
    system: "{count} systeem",
    systems: "{count} systemen",
    internal_system: "{count} intern systeem",
    internal_systems: "{count} interne systemen",
    external_system: "{count} extern systeem",
    external_systems: "{count} externe systemen",
    container: "{count} container",
    containers: "{count} containers",
    component: "{count} component",
    components: "{count} componenten",
    relationship: "{count} relatie",
    relationships: "{count} relaties",
    database: "database",
    queue: "wachtrij",
    external: "extern",
    related_to: "is verbonden met",
    both_directions: "in beide richtingen",
};

/// Generate the accessible description of a C4 diagram. Unknown locales fall
/// back to English.
pub fn describe(diagram: &C4Diagram, locale: &str) -> String {
    let t = Locale::resolve(locale, Locale::En).pick(&EN, &NL);
    let mut out = Fragment::new();
    let mut list = List::unordered();

    match diagram.kind {
        C4Kind::Context => {
            out.paragraph(escape_html(t.context_title));
            list.push_html(named_count(
                &diagram.actors.iter().map(|a| a.name.as_str()).collect::<Vec<_>>(),
                t.actor,
                t.actors,
            ));
            list.push(systems_item(diagram, t));
        }
        C4Kind::Container => {
            let boundaries = [ContainerKind::SystemBoundary, ContainerKind::Boundary];
            let title = match boundary_name(diagram, &boundaries) {
                Some(name) => fill(t.container_title_named, &[("name", name)]),
                None => t.container_title.to_string(),
            };
            out.paragraph(escape_html(&title));
            push_people_and_systems(&mut list, diagram, t);
            let containers: Vec<&C4Container> = diagram
                .containers
                .iter()
                .filter(|c| !c.kind.is_boundary())
                .collect();
            let mut items = List::unordered();
            for container in &containers {
                items.push_html(element_text(
                    &container.name,
                    container_tags(container, t),
                    container.technology.as_deref(),
                    &container.description,
                ));
            }
            let heading = count_phrase(containers.len(), t.container, t.containers);
            list.push(Item::new(escape_html(&heading) + ":").with_list(items));
        }
        C4Kind::Component => {
            let boundaries = [ContainerKind::Boundary, ContainerKind::SystemBoundary];
            let title = match boundary_name(diagram, &boundaries) {
                Some(name) => fill(t.component_title_named, &[("name", name)]),
                None => t.component_title.to_string(),
            };
            out.paragraph(escape_html(&title));
            push_people_and_systems(&mut list, diagram, t);
            let containers: Vec<&str> = diagram
                .containers
                .iter()
                .filter(|c| !c.kind.is_boundary())
                .map(|c| c.name.as_str())
                .collect();
            if !containers.is_empty() {
                list.push_html(named_count(&containers, t.container, t.containers));
            }
            let mut items = List::unordered();
            for component in &diagram.components {
                let tags = if component.database {
                    vec![t.database]
                } else {
                    Vec::new()
                };
                items.push_html(element_text(
                    &component.name,
                    tags,
                    component.technology.as_deref(),
                    &component.description,
                ));
            }
            let heading = count_phrase(diagram.components.len(), t.component, t.components);
            list.push(Item::new(escape_html(&heading) + ":").with_list(items));
        }
    }

    if !diagram.relationships.is_empty() {
        let mut items = List::unordered();
        for rel in &diagram.relationships {
            items.push_html(escape_html(&relationship_text(diagram, rel, t)));
        }
        let heading = count_phrase(diagram.relationships.len(), t.relationship, t.relationships);
        list.push(Item::new(escape_html(&heading) + ":").with_list(items));
    }

    out.list(list);
    out.finish()
}

/// `N things: a, b` or just `0 things`.
fn named_count(names: &[&str], singular: &str, plural: &str) -> String {
    let count = escape_html(&count_phrase(names.len(), singular, plural));
    if names.is_empty() {
        return count;
    }
    format!("{count}: {}", escape_html(&names.join(", ")))
}

fn systems_item(diagram: &C4Diagram, t: &Labels) -> Item {
    let systems = &diagram.systems;
    if systems.len() <= 1 {
        let names: Vec<&str> = systems.iter().map(|s| s.name.as_str()).collect();
        return Item::new(named_count(&names, t.system, t.systems));
    }

    let (external, internal): (Vec<&C4System>, Vec<&C4System>) =
        systems.iter().partition(|s| s.external);
    let internal: Vec<&str> = internal.iter().map(|s| s.name.as_str()).collect();
    let external: Vec<&str> = external.iter().map(|s| s.name.as_str()).collect();
    let mut breakdown = List::unordered();
    if !internal.is_empty() {
        breakdown.push_html(named_count(&internal, t.internal_system, t.internal_systems));
    }
    if !external.is_empty() {
        breakdown.push_html(named_count(&external, t.external_system, t.external_systems));
    }
    let heading = count_phrase(systems.len(), t.system, t.systems);
    Item::new(escape_html(&heading) + ":").with_list(breakdown)
}

/// Actors and surrounding systems, only when present.
fn push_people_and_systems(list: &mut List, diagram: &C4Diagram, t: &Labels) {
    if !diagram.actors.is_empty() {
        let names: Vec<&str> = diagram.actors.iter().map(|a| a.name.as_str()).collect();
        list.push_html(named_count(&names, t.actor, t.actors));
    }
    if !diagram.systems.is_empty() {
        list.push(systems_item(diagram, t));
    }
}

fn boundary_name<'a>(diagram: &'a C4Diagram, preference: &[ContainerKind]) -> Option<&'a str> {
    preference.iter().find_map(|kind| {
        diagram
            .containers
            .iter()
            .find(|c| c.kind == *kind)
            .map(|c| c.name.as_str())
    })
}

fn container_tags(container: &C4Container, t: &Labels) -> Vec<&'static str> {
    let mut tags = Vec::new();
    match container.kind {
        ContainerKind::Database => tags.push(t.database),
        ContainerKind::Queue => tags.push(t.queue),
        _ => {}
    }
    if container.external {
        tags.push(t.external);
    }
    tags
}

/// `Name (tags, technology): description`, escaped.
fn element_text<'a>(
    name: &str,
    mut tags: Vec<&'a str>,
    technology: Option<&'a str>,
    description: &str,
) -> String {
    if let Some(technology) = technology {
        tags.push(technology);
    }
    let mut text = name.to_string();
    if !tags.is_empty() {
        text.push_str(&format!(" ({})", tags.join(", ")));
    }
    if !description.is_empty() {
        text.push_str(": ");
        text.push_str(description);
    }
    escape_html(&text)
}

fn relationship_text(diagram: &C4Diagram, rel: &C4Relationship, t: &Labels) -> String {
    let source = diagram.name_of(&rel.source);
    let target = diagram.name_of(&rel.target);
    let verb = if rel.label.is_empty() {
        t.related_to.to_string()
    } else {
        lower_first(&rel.label)
    };
    let mut text = format!("{source} {verb} {target}");
    if let Some(technology) = &rel.technology {
        text.push_str(&format!(" ({technology})"));
    }
    if rel.bidirectional {
        text.push(' ');
        text.push_str(t.both_directions);
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagram::c4::parse;

    #[test]
    fn context_description() {
        let input = r#"Person(user, "Customer")
System(shop, "Web Shop")
System_Ext(mail, "Mail Server")
Rel(user, shop, "Places orders using")
Rel(shop, mail, "Sends e-mail via")"#;
        assert_eq!(
            describe(&parse(input), "en"),
            "<p>C4 System Context diagram with:</p>\n\
             <ul>\n<li>1 actor: Customer</li>\n\
             <li>2 systems:\n<ul>\n<li>1 internal system: Web Shop</li>\n<li>1 external system: Mail Server</li>\n</ul>\n</li>\n\
             <li>2 relationships:\n<ul>\n<li>Customer places orders using Web Shop</li>\n<li>Web Shop sends e-mail via Mail Server</li>\n</ul>\n</li>\n</ul>"
        );
    }

    #[test]
    fn empty_context_counts() {
        assert_eq!(
            describe(&C4Diagram::default(), "en"),
            "<p>C4 System Context diagram with:</p>\n<ul>\n<li>0 actors</li>\n<li>0 systems</li>\n</ul>"
        );
    }

    #[test]
    fn container_description_with_boundary() {
        let input = r#"Person(u, "User")
System_Boundary(s, "Shop") {
  Container(web, "Web App", "Rust", "Serves pages")
  ContainerDb(db, "Orders", "PostgreSQL")
}
Rel(web, db, "Reads from", "SQL")"#;
        let html = describe(&parse(input), "en");
        assert!(html.starts_with("<p>C4 Container diagram of Shop with:</p>"));
        assert!(html.contains("<li>1 actor: User</li>"));
        assert!(
            html.contains("<li>2 containers:\n<ul>\n<li>Web App (Rust): Serves pages</li>\n<li>Orders (database, PostgreSQL)</li>\n</ul>\n</li>")
        );
        assert!(html.contains("<li>Web App reads from Orders (SQL)</li>"));
    }

    #[test]
    fn component_description_in_dutch() {
        let input = r#"Container_Boundary(api, "API")
Component(ctrl, "Controller", "Spring MVC")
ComponentDb(repo, "Repository")
BiRel(ctrl, repo, "Uses")"#;
        let html = describe(&parse(input), "nl");
        assert!(html.starts_with("<p>C4-componentdiagram van API met:</p>"));
        assert!(
            html.contains("<li>2 componenten:\n<ul>\n<li>Controller (Spring MVC)</li>\n<li>Repository (database)</li>")
        );
        assert!(html.contains("<li>Controller uses Repository in beide richtingen</li>"));
    }

    #[test]
    fn element_text_joins_tags_and_technology() {
        let technology = String::from("Kafka");
        let tags = vec![EN.queue, EN.external];
        assert_eq!(
            element_text("Events", tags, Some(&technology), "Order <events>"),
            "Events (queue, external, Kafka): Order &lt;events&gt;"
        );
        assert_eq!(element_text("Plain", Vec::new(), None, ""), "Plain");
    }

    #[test]
    fn unknown_locale_is_english_and_text_is_escaped() {
        let diagram = parse(r#"Person(a, "A & B")"#);
        let html = describe(&diagram, "xx");
        assert_eq!(html, describe(&diagram, "en"));
        assert!(html.contains("1 actor: A &amp; B"));
    }

    #[test]
    fn unresolved_ids_and_empty_labels() {
        let html = describe(&parse("Rel(a, b)"), "en");
        assert!(html.contains("<li>a is related to b</li>"));
    }
}
