//! State diagrams in PlantUML and Mermaid (`stateDiagram-v2`).

mod describe;
mod parser;

pub use describe::describe;
pub use parser::parse;
