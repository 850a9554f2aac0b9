//! Mermaid pie charts.

mod describe;
mod parser;

pub use describe::describe;
pub use parser::parse;
