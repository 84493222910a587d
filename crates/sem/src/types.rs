//! Symbol descriptors and the shallow type-tag lattice the analyzer infers
//! expressions into.

/// What a name in a [`crate::scope::SymbolTable`] refers to.
#[derive(Clone, Debug, PartialEq)]
pub enum SymbolKind {
    /// One of the built-in type names (`int`, `float`, `double`, `string`),
    /// seeded into global scope so code can reference them without
    /// triggering a `NameError`, even though the language has no type
    /// annotations to spend them on.
    Type,
    /// A `var` binding.
    Variable,
    /// A `fun` binding, carrying the arity the analyzer checks calls
    /// against. The source's `(block-ref, param-list)` payload collapses to
    /// just the arity here: nothing downstream needs the block reference,
    /// since the compiler re-derives function bodies from the AST directly.
    Function { arity: usize },
}

/// The shallow type tag an expression infers to.
///
/// Where either operand of a binary/unary operation is `Variable` or
/// `Call`, arithmetic type mismatches are not reported here — they are
/// deferred to the runtime's own `TypeError`s, since a variable's runtime
/// value is not known statically.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TypeTag {
    Number,
    String,
    Boolean,
    Nil,
    Array,
    /// An identifier bound to a `var` — its runtime value is unknown
    /// statically.
    Variable,
    /// The result of a function call — likewise unknown until run time.
    Call,
    /// An identifier bound to a `fun` declaration, referenced as a value
    /// rather than invoked.
    Function,
    /// An identifier that could not be resolved to a declared symbol; used
    /// only to keep inference total after a `NameError` has already been
    /// reported, so later checks do not cascade spurious diagnostics.
    Identifier,
}
