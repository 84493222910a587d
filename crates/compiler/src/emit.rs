//! Label-based instruction emission for a single function body.
//!
//! Jumps are emitted against textual labels;
//! [`FuncBuilder::finish`] resolves every label to its absolute byte offset
//! and patches the placeholder operands in a single pass at the end.

use loks_bytecode::Opcode;
use rustc_hash::FxHashMap;

/// An as-yet-unbound jump target within the function currently being
/// compiled.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) struct Label(u32);

pub(crate) struct FuncBuilder {
    code: Vec<u8>,
    next_label: u32,
    positions: FxHashMap<Label, u16>,
    fixups: Vec<(usize, Label)>,
}

impl FuncBuilder {
    pub(crate) fn new() -> Self {
        Self {
            code: Vec::new(),
            next_label: 0,
            positions: FxHashMap::default(),
            fixups: Vec::new(),
        }
    }

    pub(crate) fn new_label(&mut self) -> Label {
        let label = Label(self.next_label);
        self.next_label += 1;
        label
    }

    /// Binds `label` to the current end of the instruction stream.
    pub(crate) fn bind_label(&mut self, label: Label) {
        self.positions.insert(label, self.code.len() as u16);
    }

    pub(crate) fn emit_op(&mut self, op: Opcode) {
        self.code.push(op as u8);
    }

    pub(crate) fn emit_u8(&mut self, value: u8) {
        self.code.push(value);
    }

    pub(crate) fn emit_u16(&mut self, value: u16) {
        self.code.push((value >> 8) as u8);
        self.code.push(value as u8);
    }

    /// Emits a branching opcode followed by a placeholder `u16` operand,
    /// recording a fixup to patch once `label`'s offset is known.
    pub(crate) fn emit_jump(&mut self, op: Opcode, label: Label) {
        self.emit_op(op);
        let operand_pos = self.code.len();
        self.code.push(0);
        self.code.push(0);
        self.fixups.push((operand_pos, label));
    }

    /// Patches every recorded jump and returns the finished byte stream.
    pub(crate) fn finish(mut self) -> Vec<u8> {
        for (pos, label) in &self.fixups {
            let target = *self
                .positions
                .get(label)
                .expect("every label emitted against must be bound before finish()");
            self.code[*pos] = (target >> 8) as u8;
            self.code[*pos + 1] = target as u8;
        }
        self.code
    }
}
