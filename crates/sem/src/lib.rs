//! The semantic analyzer: scoped name resolution and shallow type checks
//! over the parsed AST.

pub mod analysis;
pub mod scope;
pub mod types;

pub use analysis::Analyzer;
pub use scope::SymbolTable;
pub use types::{SymbolKind, TypeTag};
