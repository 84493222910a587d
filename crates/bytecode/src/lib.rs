//! The compiled-program representation shared by the compiler and the VM:
//! the opcode table, the `Code Object` (constant pool + function pool), and
//! the binary image serializer/loader.

pub mod code;
pub mod opcode;
pub mod serialize;

pub use code::{CodeObject, Constant, ConstIdx, FuncIdx, FunctionInfo};
pub use opcode::Opcode;
pub use serialize::{deserialize, serialize, MAGIC};
