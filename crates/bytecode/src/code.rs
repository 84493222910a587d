//! The compiled program: a constant pool, a function pool, and the byte
//! streams the VM executes.

use loks_util::index_vec::{Idx, IndexVec};
use std::fmt;

/// An index into a [`CodeObject`]'s constant pool.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ConstIdx(pub u16);

impl Idx for ConstIdx {
    fn from_usize(value: usize) -> Self {
        ConstIdx(value as u16)
    }
    fn index(self) -> usize {
        self.0 as usize
    }
}

/// An index into a [`CodeObject`]'s function pool. Index 0 is always the
/// program's `main` function.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FuncIdx(pub u8);

impl Idx for FuncIdx {
    fn from_usize(value: usize) -> Self {
        FuncIdx(value as u8)
    }
    fn index(self) -> usize {
        self.0 as usize
    }
}

impl FuncIdx {
    /// The function pool index of the program's entry point.
    pub const MAIN: FuncIdx = FuncIdx(0);
}

/// A single constant-pool entry, tagged as `Integer 0x03`, `Double 0x06`,
/// or `String 0x08`.
#[derive(Clone, Debug, PartialEq)]
pub enum Constant {
    Integer(i64),
    Double(f64),
    String(String),
}

impl Constant {
    /// The tag byte this constant serializes with.
    pub fn tag(&self) -> u8 {
        match self {
            Constant::Integer(_) => 0x03,
            Constant::Double(_) => 0x06,
            Constant::String(_) => 0x08,
        }
    }
}

impl fmt::Display for Constant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Constant::Integer(n) => write!(f, "{n}"),
            Constant::Double(d) => write!(f, "{d}"),
            Constant::String(s) => write!(f, "{s:?}"),
        }
    }
}

/// A single compiled function: its declared arity and its bytecode.
#[derive(Clone, Debug, PartialEq)]
pub struct FunctionInfo {
    pub arg_count: u16,
    pub code: Vec<u8>,
}

/// The constant pool + function pool produced by the compiler.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CodeObject {
    pub constants: IndexVec<ConstIdx, Constant>,
    pub functions: IndexVec<FuncIdx, FunctionInfo>,
}

impl CodeObject {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn main(&self) -> &FunctionInfo {
        &self.functions[FuncIdx::MAIN]
    }
}

impl fmt::Display for CodeObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "constants ({}):", self.constants.len())?;
        for (i, c) in self.constants.iter().enumerate() {
            writeln!(f, "  [{i}] {} = {c}", tag_name(c.tag()))?;
        }
        writeln!(f, "functions ({}):", self.functions.len())?;
        for (i, func) in self.functions.iter().enumerate() {
            writeln!(
                f,
                "  [{i}] argc={} code_len={}",
                func.arg_count,
                func.code.len()
            )?;
        }
        Ok(())
    }
}

fn tag_name(tag: u8) -> &'static str {
    match tag {
        0x03 => "int",
        0x06 => "double",
        0x08 => "string",
        _ => "unknown",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn main_is_function_pool_index_zero() {
        let mut code = CodeObject::new();
        code.functions.push(FunctionInfo { arg_count: 0, code: vec![0xff] });
        assert_eq!(code.main().code, vec![0xff]);
    }

    #[test]
    fn display_lists_constants_and_functions() {
        let mut code = CodeObject::new();
        code.constants.push(Constant::Integer(42));
        code.functions.push(FunctionInfo { arg_count: 0, code: vec![] });
        let rendered = code.to_string();
        assert!(rendered.contains("42"));
        assert!(rendered.contains("argc=0"));
    }
}
