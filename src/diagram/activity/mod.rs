//! PlantUML activity diagrams (the "new" syntax with `:action;` steps).
//!
//! Blocks such as `if`, `while`, `repeat`, `fork` and `partition` nest
//! arbitrarily. Everything the parser does not understand is skipped.

mod describe;
mod parser;

pub use describe::describe;
pub use parser::parse;
