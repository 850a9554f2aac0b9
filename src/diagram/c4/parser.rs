use std::sync::OnceLock;

use regex::Regex;
use tracing::debug;

use crate::diagram::classify::{is_comment, strip_quotes};
use crate::diagram::types::*;

fn macro_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b([A-Za-z_][A-Za-z0-9_]*)\s*\(").expect("valid regex"))
}

/// Parse C4-PlantUML or Mermaid C4 source.
///
/// Element macros are found anywhere in the text, in any order. The diagram
/// kind is inferred from what was found.
pub fn parse(input: &str) -> C4Diagram {
    let text: String = input
        .lines()
        .filter(|line| !is_comment(line.trim_start()))
        .collect::<Vec<_>>()
        .join("\n");

    let mut diagram = C4Diagram::default();
    let mut consumed = 0;

    for caps in macro_regex().captures_iter(&text) {
        let Some(whole) = caps.get(0) else { continue };
        if whole.start() < consumed {
            continue;
        }
        let Some((args, end)) = split_args(&text[whole.end()..]) else {
            continue;
        };
        consumed = whole.end() + end;
        apply_macro(&mut diagram, &caps[1], &args);
    }

    diagram.kind = infer_kind(&diagram);
    diagram
}

fn infer_kind(diagram: &C4Diagram) -> C4Kind {
    if !diagram.components.is_empty() {
        C4Kind::Component
    } else if diagram.containers.iter().any(|c| !c.kind.is_boundary()) {
        C4Kind::Container
    } else {
        C4Kind::Context
    }
}

/// Splits the argument list following an opening parenthesis. Returns the
/// positional arguments (named `$arg=` ones are dropped) and the offset just
/// past the closing parenthesis.
pub(crate) fn split_args(text: &str) -> Option<(Vec<String>, usize)> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut depth = 0usize;

    for (idx, c) in text.char_indices() {
        match c {
            '"' => {
                in_quotes = !in_quotes;
                current.push(c);
            }
            '(' if !in_quotes => {
                depth += 1;
                current.push(c);
            }
            ')' if !in_quotes && depth > 0 => {
                depth -= 1;
                current.push(c);
            }
            ')' if !in_quotes => {
                push_arg(&mut args, &current);
                return Some((args, idx + 1));
            }
            ',' if !in_quotes && depth == 0 => {
                push_arg(&mut args, &current);
                current.clear();
            }
            _ => current.push(c),
        }
    }
    None
}

fn push_arg(args: &mut Vec<String>, raw: &str) {
    let raw = raw.trim();
    if raw.starts_with('$') {
        return;
    }
    args.push(strip_quotes(raw).to_string());
}

fn arg(args: &[String], idx: usize) -> String {
    args.get(idx).cloned().unwrap_or_default()
}

fn optional_arg(args: &[String], idx: usize) -> Option<String> {
    args.get(idx).filter(|a| !a.is_empty()).cloned()
}

fn apply_macro(diagram: &mut C4Diagram, name: &str, args: &[String]) {
    let Some(id) = args.first().filter(|id| !id.is_empty()).cloned() else {
        debug!(name, "skipping C4 macro without an alias");
        return;
    };
    let label = optional_arg(args, 1).unwrap_or_else(|| id.clone());

    match name {
        "Person" | "Person_Ext" => diagram.actors.push(C4Actor {
            id,
            name: label,
            description: arg(args, 2),
            external: name.ends_with("_Ext"),
        }),
        "System" | "System_Ext" | "SystemDb" | "SystemDb_Ext" | "SystemQueue"
        | "SystemQueue_Ext" => {
            let kind = if name.starts_with("SystemDb") {
                SystemKind::Database
            } else if name.starts_with("SystemQueue") {
                SystemKind::Queue
            } else {
                SystemKind::System
            };
            diagram.systems.push(C4System {
                id,
                name: label,
                description: arg(args, 2),
                kind,
                external: name.ends_with("_Ext"),
            });
        }
        "Container" | "Container_Ext" | "ContainerDb" | "ContainerDb_Ext" | "ContainerQueue"
        | "ContainerQueue_Ext" => {
            let kind = if name.starts_with("ContainerDb") {
                ContainerKind::Database
            } else if name.starts_with("ContainerQueue") {
                ContainerKind::Queue
            } else {
                ContainerKind::Container
            };
            diagram.containers.push(C4Container {
                id,
                name: label,
                technology: optional_arg(args, 2),
                description: arg(args, 3),
                kind,
                external: name.ends_with("_Ext"),
            });
        }
        "Container_Boundary" | "Boundary" | "Enterprise_Boundary" | "System_Boundary" => {
            let kind = if name == "System_Boundary" {
                ContainerKind::SystemBoundary
            } else {
                ContainerKind::Boundary
            };
            diagram.containers.push(C4Container {
                id,
                name: label,
                technology: None,
                description: String::new(),
                kind,
                external: false,
            });
        }
        "Component" | "Component_Ext" | "ComponentDb" | "ComponentDb_Ext" | "ComponentQueue"
        | "ComponentQueue_Ext" => diagram.components.push(C4Component {
            id,
            name: label,
            technology: optional_arg(args, 2),
            description: arg(args, 3),
            database: name.starts_with("ComponentDb"),
        }),
        _ if is_relationship(name) => {
            let Some(target) = optional_arg(args, 1) else {
                debug!(name, "skipping relationship without a target");
                return;
            };
            diagram.relationships.push(C4Relationship {
                source: id,
                target,
                label: arg(args, 2),
                technology: optional_arg(args, 3),
                bidirectional: name.starts_with("BiRel"),
            });
        }
        _ => debug!(name, "ignoring C4 macro"),
    }
}

fn is_relationship(name: &str) -> bool {
    const DIRECTIONS: &[&str] = &[
        "U", "Up", "D", "Down", "L", "Left", "R", "Right", "Back", "Neighbor", "Back_Neighbor",
    ];
    ["Rel", "BiRel"].iter().any(|base| {
        name == *base
            || name
                .strip_prefix(base)
                .and_then(|rest| rest.strip_prefix('_'))
                .is_some_and(|dir| DIRECTIONS.contains(&dir))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONTEXT: &str = r#"@startuml
!include <C4/C4_Context>
Person(user, "Customer", "Buys things")
System(shop, "Web Shop", "Sells things")
System_Ext(mail, "Mail Server")
Rel(user, shop, "Places orders using")
Rel_R(shop, mail, "Sends e-mail via", "SMTP")
@enduml"#;

    #[test]
    fn context_elements_and_relationships() {
        let diagram = parse(CONTEXT);
        assert_eq!(diagram.kind, C4Kind::Context);
        assert_eq!(diagram.actors.len(), 1);
        assert_eq!(diagram.actors[0].name, "Customer");
        assert_eq!(diagram.systems.len(), 2);
        assert!(diagram.systems[1].external);
        assert_eq!(diagram.systems[1].description, "");
        assert_eq!(diagram.relationships.len(), 2);
        assert_eq!(diagram.relationships[1].technology.as_deref(), Some("SMTP"));
        assert_eq!(diagram.name_of("mail"), "Mail Server");
    }

    #[test]
    fn container_kind_is_inferred() {
        let input = r#"System_Boundary(c1, "Shop") {
    Container(web, "Web App", "Rust, axum", "Serves pages")
    ContainerDb(db, "Orders", "PostgreSQL", "Stores orders")
}
Rel(web, db, "Reads from and writes to", "SQL")"#;
        let diagram = parse(input);
        assert_eq!(diagram.kind, C4Kind::Container);
        assert_eq!(diagram.containers.len(), 3);
        assert_eq!(diagram.containers[0].kind, ContainerKind::SystemBoundary);
        assert_eq!(diagram.containers[1].technology.as_deref(), Some("Rust, axum"));
        assert_eq!(diagram.containers[2].kind, ContainerKind::Database);
    }

    #[test]
    fn boundary_only_stays_context() {
        let diagram = parse(r#"System_Boundary(b, "Bank") {
  System(core, "Core")
}"#);
        assert_eq!(diagram.kind, C4Kind::Context);
    }

    #[test]
    fn components_win_over_containers() {
        let input = r#"Container(api, "API")
Component(ctrl, "Controller", "Spring MVC")
ComponentDb(cache, "Cache")"#;
        let diagram = parse(input);
        assert_eq!(diagram.kind, C4Kind::Component);
        assert!(diagram.components[1].database);
    }

    #[test]
    fn named_arguments_comments_and_quoted_parens() {
        let input = r#"' Person(ghost, "Commented out")
Person(u, "User (admin)", "Uses System(x) daily", $tags="vip")
BiRel(u, x, "Talks to")"#;
        let diagram = parse(input);
        assert_eq!(diagram.actors.len(), 1);
        assert_eq!(diagram.actors[0].name, "User (admin)");
        assert_eq!(diagram.actors[0].description, "Uses System(x) daily");
        assert!(diagram.systems.is_empty());
        assert!(diagram.relationships[0].bidirectional);
    }

    #[test]
    fn relationship_macro_names() {
        for name in ["Rel", "Rel_U", "Rel_Down", "BiRel_L", "Rel_Back_Neighbor"] {
            assert!(is_relationship(name), "{name}");
        }
        for name in ["Relation", "Rel_", "Rel_Sideways", "BiRelX"] {
            assert!(!is_relationship(name), "{name}");
        }
    }

    #[test]
    fn unclosed_macro_is_ignored() {
        let diagram = parse("Person(user, \"User\"");
        assert!(diagram.actors.is_empty());
    }
}
