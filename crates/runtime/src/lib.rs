//! The `Value` model, the tree-walking interpreter, and the built-ins they
//! share with the bytecode VM. The interpreter is kept alongside the VM as
//! an independent semantic reference for the same language.
//!
//! This crate has no notion of diagnostics accumulation: unlike the
//! scanner/parser/analyzer, which collect every error in a run, both this
//! interpreter and the VM (in `loks-vm`) stop at the first runtime error.

pub mod builtins;
pub mod environment;
pub mod interpreter;
pub mod value;

pub use builtins::{call_builtin, builtin_index, HostIo, StdIo};
pub use environment::Environment;
pub use interpreter::Interpreter;
pub use value::{display_value, truthy, LoksFunction, Number, Value};
