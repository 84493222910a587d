//! The stack-based bytecode virtual machine.
//!
//! Sits beside `loks-runtime`'s tree-walking interpreter as the other of the
//! two execution engines the driver can choose between; both share the same
//! `Value` model and built-ins so a program observes identical behavior
//! under either one.

mod frame;
mod vm;

pub use vm::Vm;
