//! Shared infrastructure used by every stage of the pipeline: source spans,
//! a symbol interner, diagnostic reporting, and the common error taxonomy.

pub mod diagnostic;
pub mod error;
pub mod index_vec;
pub mod span;
pub mod symbol;

pub use error::{ErrorKind, LoksError};
pub use index_vec::{Idx, IndexVec};
pub use span::{FileId, SourceFile, SourceMap, Span};
pub use symbol::{intern, Symbol};
