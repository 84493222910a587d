//! Lowers an analyzed AST into a [`loks_bytecode::CodeObject`].

mod emit;
mod lower;

pub use lower::compile;
