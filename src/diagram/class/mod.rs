//! Class diagrams in Mermaid and PlantUML.
//!
//! Members, stereotypes, relations with multiplicities and notes are parsed
//! into a [`ClassDiagram`](crate::diagram::types::ClassDiagram); the
//! description lists classes, then relations, then notes.

mod describe;
mod parser;

pub use describe::describe;
pub use parser::{parse, parse_with_dialect};
#[cfg(test)]
pub(crate) use parser::CLASS_ARROWS;
