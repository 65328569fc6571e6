//! Command execution and parsing of the text the tools print.

pub mod executor;
pub mod parser;
