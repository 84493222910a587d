//! Per-call activation records: the VM owns a call stack of frames.
//!
//! Each frame is a name, a 256-slot local array, an operand stack, the
//! executing code, and a saved return address, kept as a plain struct —
//! Rust's `Vec<Frame>` call stack can just push/pop owned frames directly
//! rather than reusing them in place.

use loks_bytecode::FuncIdx;
use loks_runtime::Value;

/// The fixed number of local variable slots every frame reserves, sized to
/// this bytecode's `u8`-sized local-slot operands.
const LOCAL_SLOTS: usize = 256;

/// One activation record: the callee's own operand stack and locals, plus
/// enough to resume the caller once this call returns.
pub(crate) struct Frame {
    /// Which function pool entry this frame is executing.
    pub(crate) func_idx: FuncIdx,
    /// Offset into that function's code this frame is about to execute.
    pub(crate) ip: usize,
    /// Per-frame LIFO the opcodes for this call compute on.
    pub(crate) operand_stack: Vec<Value>,
    /// Local variable slots, addressed by the `u8` operand of
    /// `LOAD_LOCAL`/`STORE_LOCAL` (and, for frame 0 only, also
    /// `LOAD_GLOBAL`/`STORE_GLOBAL`).
    pub(crate) locals: Vec<Value>,
}

impl Frame {
    /// Builds a fresh frame for `func_idx`, with `args` already bound to
    /// local slots `0..args.len()` in declaration order.
    pub(crate) fn new(func_idx: FuncIdx, args: Vec<Value>) -> Self {
        let mut locals = vec![Value::Nil; LOCAL_SLOTS];
        for (slot, value) in args.into_iter().enumerate() {
            locals[slot] = value;
        }
        Frame {
            func_idx,
            ip: 0,
            operand_stack: Vec::new(),
            locals,
        }
    }
}
