//! C4 model diagrams written with the C4-PlantUML or Mermaid C4 macros.

mod describe;
mod parser;

pub use describe::describe;
pub use parser::parse;
