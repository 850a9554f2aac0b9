use indexmap::{IndexMap, IndexSet};
use serde::Serialize;

pub use super::classify::Visibility;

/// Markup language a diagram is written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    PlantUml,
    Mermaid,
}

impl Dialect {
    /// Maps a Kroki `imgType` or code fence language to a dialect.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "plantuml" | "puml" | "c4plantuml" => Some(Dialect::PlantUml),
            "mermaid" => Some(Dialect::Mermaid),
            _ => None,
        }
    }
}

/// Something a parser could not make sense of. Never fatal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    /// 1-based source line.
    pub line: usize,
    pub message: String,
}

// ============================================
// CLASS DIAGRAM TYPES
// ============================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "label", rename_all = "lowercase")]
pub enum Stereotype {
    Interface,
    Abstract,
    Enumeration,
    Custom(String),
}

impl Stereotype {
    pub fn from_label(label: &str) -> Self {
        let label = label.trim();
        match label.to_ascii_lowercase().as_str() {
            "interface" => Stereotype::Interface,
            "abstract" | "abstract class" => Stereotype::Abstract,
            "enumeration" | "enum" => Stereotype::Enumeration,
            _ => Stereotype::Custom(label.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Attribute {
    pub visibility: Visibility,
    pub name: String,
    pub type_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Parameter {
    pub name: String,
    pub type_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Method {
    pub visibility: Visibility,
    pub name: String,
    pub parameters: Vec<Parameter>,
    pub return_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassDef {
    pub name: String,
    pub stereotype: Option<Stereotype>,
    pub attributes: Vec<Attribute>,
    pub methods: Vec<Method>,
}

impl ClassDef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            stereotype: None,
            attributes: Vec::new(),
            methods: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RelationKind {
    Inheritance,
    Implementation,
    Association,
    Aggregation,
    Composition,
    Dependency,
}

/// A relation between two classes.
///
/// For aggregation and composition `from` is the whole (the diamond side) and
/// `to` is the part. `reverse` records that the arrow was written right to
/// left, so `from`/`to` are swapped relative to the source text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Relation {
    pub from: String,
    pub to: String,
    pub kind: RelationKind,
    pub label: Option<String>,
    pub multiplicity_from: Option<String>,
    pub multiplicity_to: Option<String>,
    pub reverse: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Note {
    pub class_name: String,
    pub text: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ClassDiagram {
    pub classes: IndexMap<String, ClassDef>,
    pub relations: Vec<Relation>,
    pub notes: Vec<Note>,
    pub diagnostics: Vec<Diagnostic>,
}

// ============================================
// SEQUENCE DIAGRAM TYPES
// ============================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Participant {
    pub id: String,
    /// Name shown in descriptions; the id unless an alias was declared.
    pub display_alias: String,
    pub type_name: Option<String>,
    pub is_actor: bool,
}

impl Participant {
    pub fn implicit(id: &str) -> Self {
        Self {
            id: id.to_string(),
            display_alias: id.to_string(),
            type_name: None,
            is_actor: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    Call,
    Response,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Message {
    pub from: String,
    pub to: String,
    pub text: String,
    pub kind: MessageKind,
    pub is_method_call: bool,
    pub is_external_origin: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SequenceDiagram {
    pub participants: Vec<Participant>,
    pub messages: Vec<Message>,
    pub has_autonumber: bool,
}

impl SequenceDiagram {
    pub fn participant(&self, id: &str) -> Option<&Participant> {
        self.participants.iter().find(|p| p.id == id)
    }

    /// Display name for a participant id, the id itself when undeclared.
    pub fn display_name<'a>(&'a self, id: &'a str) -> &'a str {
        self.participant(id)
            .map(|p| p.display_alias.as_str())
            .unwrap_or(id)
    }
}

// ============================================
// ACTIVITY DIAGRAM TYPES
// ============================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ActivityElement {
    Start,
    Stop,
    End,
    Activity {
        text: String,
    },
    Decision {
        condition: String,
        yes_branch: Vec<ActivityElement>,
        no_branch: Vec<ActivityElement>,
    },
    Partition {
        name: String,
        elements: Vec<ActivityElement>,
    },
    While {
        condition: String,
        condition_value: Option<String>,
        exit_condition: Option<String>,
        elements: Vec<ActivityElement>,
    },
    Repeat {
        condition: String,
        elements: Vec<ActivityElement>,
    },
    Fork {
        branches: Vec<Vec<ActivityElement>>,
    },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ActivityCounts {
    pub activities: usize,
    pub decisions: usize,
    pub partitions: usize,
}

impl ActivityCounts {
    /// Counts by walking every branch of `elements`.
    pub fn walk(elements: &[ActivityElement]) -> Self {
        let mut counts = Self::default();
        counts.add(elements);
        counts
    }

    fn add(&mut self, elements: &[ActivityElement]) {
        for element in elements {
            match element {
                ActivityElement::Start | ActivityElement::Stop | ActivityElement::End => {}
                ActivityElement::Activity { .. } => self.activities += 1,
                ActivityElement::Decision {
                    yes_branch,
                    no_branch,
                    ..
                } => {
                    self.decisions += 1;
                    self.add(yes_branch);
                    self.add(no_branch);
                }
                ActivityElement::Partition { elements, .. } => {
                    self.partitions += 1;
                    self.add(elements);
                }
                ActivityElement::While { elements, .. }
                | ActivityElement::Repeat { elements, .. } => self.add(elements),
                ActivityElement::Fork { branches } => {
                    for branch in branches {
                        self.add(branch);
                    }
                }
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ActivityDiagram {
    pub elements: Vec<ActivityElement>,
    pub activity_count: usize,
    pub decision_count: usize,
    pub partition_count: usize,
    pub diagnostics: Vec<Diagnostic>,
}

// ============================================
// STATE DIAGRAM TYPES
// ============================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Transition {
    pub from: String,
    pub to: String,
    pub label: Option<String>,
}

impl Transition {
    pub fn is_self_loop(&self) -> bool {
        self.from == self.to
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StateDiagram {
    pub states: IndexSet<String>,
    /// Display labels from `state "Label" as Name`.
    pub labels: IndexMap<String, String>,
    pub transitions: Vec<Transition>,
    pub initial_state: Option<String>,
    pub final_states: IndexSet<String>,
}

// ============================================
// C4 DIAGRAM TYPES
// ============================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum C4Kind {
    #[default]
    Context,
    Container,
    Component,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct C4Actor {
    pub id: String,
    pub name: String,
    pub description: String,
    pub external: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SystemKind {
    System,
    Database,
    Queue,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct C4System {
    pub id: String,
    pub name: String,
    pub description: String,
    pub kind: SystemKind,
    pub external: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ContainerKind {
    Container,
    Database,
    Queue,
    Boundary,
    SystemBoundary,
}

impl ContainerKind {
    pub fn is_boundary(self) -> bool {
        matches!(self, ContainerKind::Boundary | ContainerKind::SystemBoundary)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct C4Container {
    pub id: String,
    pub name: String,
    pub technology: Option<String>,
    pub description: String,
    pub kind: ContainerKind,
    pub external: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct C4Component {
    pub id: String,
    pub name: String,
    pub technology: Option<String>,
    pub description: String,
    pub database: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct C4Relationship {
    pub source: String,
    pub target: String,
    pub label: String,
    pub technology: Option<String>,
    pub bidirectional: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct C4Diagram {
    pub kind: C4Kind,
    pub actors: Vec<C4Actor>,
    pub systems: Vec<C4System>,
    pub containers: Vec<C4Container>,
    pub components: Vec<C4Component>,
    pub relationships: Vec<C4Relationship>,
}

impl C4Diagram {
    /// Display name for an element id: actors, then systems, containers and
    /// components. Unknown ids are returned as-is.
    pub fn name_of<'a>(&'a self, id: &'a str) -> &'a str {
        self.actors
            .iter()
            .find(|a| a.id == id)
            .map(|a| a.name.as_str())
            .or_else(|| self.systems.iter().find(|s| s.id == id).map(|s| s.name.as_str()))
            .or_else(|| {
                self.containers
                    .iter()
                    .find(|c| c.id == id)
                    .map(|c| c.name.as_str())
            })
            .or_else(|| {
                self.components
                    .iter()
                    .find(|c| c.id == id)
                    .map(|c| c.name.as_str())
            })
            .unwrap_or(id)
    }
}

// ============================================
// PIE CHART TYPES
// ============================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Segment {
    pub label: String,
    pub value: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PieChart {
    pub title: Option<String>,
    pub show_data: bool,
    pub segments: Vec<Segment>,
}

impl PieChart {
    pub fn total(&self) -> f64 {
        self.segments.iter().map(|s| s.value).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_descend_into_every_branch() {
        let elements = vec![
            ActivityElement::Start,
            ActivityElement::Partition {
                name: "A".into(),
                elements: vec![ActivityElement::Decision {
                    condition: "ok?".into(),
                    yes_branch: vec![ActivityElement::Activity { text: "a".into() }],
                    no_branch: vec![ActivityElement::Fork {
                        branches: vec![
                            vec![ActivityElement::Activity { text: "b".into() }],
                            vec![ActivityElement::Repeat {
                                condition: "more".into(),
                                elements: vec![ActivityElement::Activity { text: "c".into() }],
                            }],
                        ],
                    }],
                }],
            },
            ActivityElement::Stop,
        ];

        let counts = ActivityCounts::walk(&elements);
        assert_eq!(
            counts,
            ActivityCounts {
                activities: 3,
                decisions: 1,
                partitions: 1
            }
        );
    }

    #[test]
    fn c4_names_resolve_in_priority_order() {
        let mut diagram = C4Diagram::default();
        diagram.systems.push(C4System {
            id: "x".into(),
            name: "System X".into(),
            description: String::new(),
            kind: SystemKind::System,
            external: false,
        });
        diagram.actors.push(C4Actor {
            id: "x".into(),
            name: "Person X".into(),
            description: String::new(),
            external: false,
        });

        assert_eq!(diagram.name_of("x"), "Person X");
        assert_eq!(diagram.name_of("missing"), "missing");
    }

    #[test]
    fn stereotype_labels() {
        assert_eq!(Stereotype::from_label("Interface"), Stereotype::Interface);
        assert_eq!(Stereotype::from_label("enum"), Stereotype::Enumeration);
        assert_eq!(
            Stereotype::from_label("Entity"),
            Stereotype::Custom("Entity".into())
        );
    }

    #[test]
    fn dialect_names() {
        assert_eq!(Dialect::from_name("c4plantuml"), Some(Dialect::PlantUml));
        assert_eq!(Dialect::from_name("Mermaid"), Some(Dialect::Mermaid));
        assert_eq!(Dialect::from_name("graphviz"), None);
    }
}
