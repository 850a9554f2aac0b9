//! Sequence diagrams in Mermaid and PlantUML.

mod describe;
mod parser;

pub use describe::describe;
pub use parser::{parse, parse_with_dialect};
