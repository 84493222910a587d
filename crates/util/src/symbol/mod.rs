//! Interned identifiers.
//!
//! Every identifier the scanner produces is interned into a [`Symbol`], a
//! cheap `Copy` handle, instead of being passed around as an owned `String`.

mod interner;

pub use interner::{intern, interner, Interner, Symbol, BUILTIN_NAMES, KEYWORDS};
