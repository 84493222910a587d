//! The bytecode execution cycle itself.
//!
//! Non-branching opcodes auto-advance the instruction pointer; branching
//! opcodes set it themselves. Call/return is a `Vec<Frame>` call stack: the
//! caller's IP is advanced past the call instruction before the callee's
//! frame is pushed, so "restore the caller's IP" falls out for free from
//! simply popping back to the caller's already-advanced frame.

use loks_bytecode::{CodeObject, Constant, ConstIdx, FuncIdx, Opcode};
use loks_runtime::{call_builtin, truthy, value, HostIo, Number, Value};
use loks_util::error::ErrorKind;

use crate::frame::Frame;

/// The stack-based bytecode interpreter.
///
/// Holds a borrowed [`CodeObject`] for the lifetime of the run and an
/// injected [`HostIo`] for `CALL_NATIVE`'s built-ins, matching the
/// tree-walking interpreter's own I/O seam in `loks-runtime`.
pub struct Vm<'code, 'io> {
    code: &'code CodeObject,
    frames: Vec<Frame>,
    io: &'io mut dyn HostIo,
    debug: bool,
    halted: bool,
}

impl<'code, 'io> Vm<'code, 'io> {
    pub fn new(code: &'code CodeObject, io: &'io mut dyn HostIo) -> Self {
        Self {
            code,
            frames: Vec::new(),
            io,
            debug: false,
            halted: false,
        }
    }

    /// Enables a `tracing::trace!` line per executed opcode (CLI `-d`).
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Runs `main` to completion (`END`) or the first runtime error, which
    /// aborts execution immediately.
    pub fn run(&mut self) -> Result<(), ErrorKind> {
        self.frames.push(Frame::new(FuncIdx::MAIN, Vec::new()));

        while !self.halted {
            let func_idx = self.current().func_idx;
            let ip = self.current().ip;
            let code = self.code.functions[func_idx].code.as_slice();

            let opcode_byte = *code.get(ip).ok_or_else(|| {
                ErrorKind::InvalidBytecodeError(format!(
                    "instruction pointer {ip} ran off the end of the code stream"
                ))
            })?;
            let op = Opcode::try_from(opcode_byte).map_err(|byte| {
                ErrorKind::InvalidBytecodeError(format!("unknown opcode byte {byte:#x} at offset {ip}"))
            })?;

            if self.debug {
                tracing::trace!(frame = self.frames.len() - 1, ip, ?op, "executing opcode");
            }

            if op == Opcode::End {
                break;
            }
            self.execute(op, ip, code)?;
        }
        Ok(())
    }

    fn current(&self) -> &Frame {
        self.frames.last().expect("the VM always has at least the main frame while running")
    }

    fn current_mut(&mut self) -> &mut Frame {
        self.frames.last_mut().expect("the VM always has at least the main frame while running")
    }

    fn push(&mut self, value: Value) {
        self.current_mut().operand_stack.push(value);
    }

    fn pop(&mut self) -> Result<Value, ErrorKind> {
        self.current_mut()
            .operand_stack
            .pop()
            .ok_or_else(|| ErrorKind::InvalidBytecodeError("operand stack underflow".into()))
    }

    fn advance(&mut self, by: usize) {
        self.current_mut().ip += by;
    }

    fn load_constant(&self, idx: ConstIdx) -> Value {
        match &self.code.constants[idx] {
            Constant::Integer(n) => Value::Number(Number::Integer(*n)),
            Constant::Double(d) => Value::Number(Number::Double(*d)),
            Constant::String(s) => Value::string(s.clone()),
        }
    }

    /// Every binary arithmetic/comparison opcode: pop right then left (the
    /// compiler always pushes left before right), apply `f`, push the
    /// result, advance past this zero-operand instruction.
    fn binary_op(&mut self, f: impl Fn(&Value, &Value) -> Result<Value, ErrorKind>) -> Result<(), ErrorKind> {
        let right = self.pop()?;
        let left = self.pop()?;
        self.push(f(&left, &right)?);
        self.advance(1);
        Ok(())
    }

    fn compare(&mut self, f: impl Fn(&Value, &Value) -> Result<bool, ErrorKind>) -> Result<(), ErrorKind> {
        let right = self.pop()?;
        let left = self.pop()?;
        let result = f(&left, &right)?;
        self.push(Value::Boolean(result));
        self.advance(1);
        Ok(())
    }

    /// Executes one instruction already known not to be `END`.
    fn execute(&mut self, op: Opcode, ip: usize, code: &[u8]) -> Result<(), ErrorKind> {
        use Opcode::*;
        match op {
            LoadNil => {
                self.push(Value::Nil);
                self.advance(1);
            }
            LoadTrue => {
                self.push(Value::Boolean(true));
                self.advance(1);
            }
            LoadFalse => {
                self.push(Value::Boolean(false));
                self.advance(1);
            }
            UnaryNegative => {
                let operand = self.pop()?;
                let result = value::negate(&operand)?;
                self.push(result);
                self.advance(1);
            }
            UnaryNot => {
                let operand = self.pop()?;
                self.push(value::not(&operand));
                self.advance(1);
            }
            BipUsh => {
                let n = read_u8(code, ip + 1);
                self.push(Value::Number(Number::Integer(n as i64)));
                self.advance(2);
            }
            BinaryAdd => self.binary_op(value::add)?,
            BinarySub => self.binary_op(value::sub)?,
            BinaryMul => self.binary_op(value::mul)?,
            BinaryDiv => self.binary_op(value::div)?,
            BinaryModulo => self.binary_op(value::modulo)?,
            BinarySubscr => {
                let index = self.pop()?;
                let array = self.pop()?;
                let result = value::index_get(&array, &index)?;
                self.push(result);
                self.advance(1);
            }
            StoreSubscr => {
                let index = self.pop()?;
                let array = self.pop()?;
                let new_value = self.pop()?;
                value::index_set(&array, &index, new_value)?;
                self.advance(1);
            }
            // The compiler never emits these — `and`/`or` always lower to
            // short-circuiting jumps instead — but a non-short-circuit
            // fallback keeps the opcode meaningful for any bytecode image
            // that does use it directly.
            BinaryAnd | BinaryOr => {
                let right = self.pop()?;
                let left = self.pop()?;
                let result = if op == BinaryAnd {
                    truthy(&left) && truthy(&right)
                } else {
                    truthy(&left) || truthy(&right)
                };
                self.push(Value::Boolean(result));
                self.advance(1);
            }
            LoadLocal => {
                let slot = read_u8(code, ip + 1) as usize;
                let local = self.current().locals[slot].clone();
                self.push(local);
                self.advance(2);
            }
            StoreLocal => {
                let slot = read_u8(code, ip + 1) as usize;
                let new_value = self.pop()?;
                self.current_mut().locals[slot] = new_value;
                self.advance(2);
            }
            // Globals live in the main frame's own locals, regardless of
            // which frame is current.
            StoreGlobal => {
                let slot = read_u8(code, ip + 1) as usize;
                let new_value = self.pop()?;
                self.frames[0].locals[slot] = new_value;
                self.advance(2);
            }
            LoadGlobal => {
                let slot = read_u8(code, ip + 1) as usize;
                let global = self.frames[0].locals[slot].clone();
                self.push(global);
                self.advance(2);
            }
            LoadConst => {
                let idx = read_u16(code, ip + 1);
                let constant = self.load_constant(ConstIdx(idx));
                self.push(constant);
                self.advance(3);
            }
            BuildList => {
                let count = read_u16(code, ip + 1) as usize;
                let stack = &mut self.current_mut().operand_stack;
                let split_at = stack.len().checked_sub(count).ok_or_else(|| {
                    ErrorKind::InvalidBytecodeError("operand stack underflow in BUILD_LIST".into())
                })?;
                let elems = stack.split_off(split_at);
                self.push(Value::array(elems));
                self.advance(3);
            }
            PopJmpIfFalse => {
                let target = read_u16(code, ip + 1) as usize;
                let cond = self.pop()?;
                if truthy(&cond) {
                    self.advance(3);
                } else {
                    self.current_mut().ip = target;
                }
            }
            PopJmpIfTrue => {
                let target = read_u16(code, ip + 1) as usize;
                let cond = self.pop()?;
                if truthy(&cond) {
                    self.current_mut().ip = target;
                } else {
                    self.advance(3);
                }
            }
            Goto => {
                let target = read_u16(code, ip + 1) as usize;
                self.current_mut().ip = target;
            }
            CallFunction => {
                let idx = read_u8(code, ip + 1);
                // advance the caller's IP past this instruction *before*
                // pushing the callee frame: `RETURN_VALUE` resumes the
                // caller simply by popping back to it, so the caller's
                // saved `ip` must already point just past the call.
                self.advance(2);
                self.call_function(FuncIdx(idx))?;
            }
            CallNative => {
                let idx = read_u8(code, ip + 1);
                self.advance(2);
                self.call_native(idx)?;
            }
            CmpEq => self.compare(value::equals)?,
            CmpNe => self.compare(value::not_equals)?,
            CmpGt => self.compare(value::greater_than)?,
            CmpGe => self.compare(value::greater_equal)?,
            CmpLt => self.compare(value::less_than)?,
            CmpLe => self.compare(value::less_equal)?,
            ReturnValue => self.return_value()?,
            End => unreachable!("the run loop breaks on END before dispatching"),
        }
        Ok(())
    }

    /// Function call protocol: pop `argc` arguments off the
    /// caller's stack, push a fresh frame with them bound to locals
    /// `0..argc`, make it current.
    fn call_function(&mut self, func_idx: FuncIdx) -> Result<(), ErrorKind> {
        let argc = self.code.functions[func_idx].arg_count as usize;
        let stack = &mut self.current_mut().operand_stack;
        let split_at = stack.len().checked_sub(argc).ok_or_else(|| {
            ErrorKind::InvalidBytecodeError("not enough operands for CALL_FUNCTION".into())
        })?;
        let args = stack.split_off(split_at);
        self.frames.push(Frame::new(func_idx, args));
        Ok(())
    }

    /// `CALL_NATIVE`: every built-in takes exactly one argument, so its argc
    /// is fixed rather than read from a per-native arity table.
    fn call_native(&mut self, index: u8) -> Result<(), ErrorKind> {
        const NATIVE_ARGC: usize = 1;
        let stack = &mut self.current_mut().operand_stack;
        let split_at = stack.len().checked_sub(NATIVE_ARGC).ok_or_else(|| {
            ErrorKind::InvalidBytecodeError("not enough operands for CALL_NATIVE".into())
        })?;
        let args = stack.split_off(split_at);
        let result = call_builtin(index, &args, self.io)?;
        self.push(result);
        Ok(())
    }

    /// `RETURN_VALUE`: pop the return value, pop this frame, and push the
    /// value onto the now-current (caller's) stack. If there is no caller
    /// — `main` reached a bare `return` instead of ending on `END` — halt
    /// cleanly instead of underflowing the call stack.
    fn return_value(&mut self) -> Result<(), ErrorKind> {
        let retval = self.pop()?;
        if self.frames.len() == 1 {
            self.halted = true;
            return Ok(());
        }
        self.frames.pop();
        self.push(retval);
        Ok(())
    }
}

fn read_u8(code: &[u8], at: usize) -> u8 {
    code[at]
}

fn read_u16(code: &[u8], at: usize) -> u16 {
    u16::from_be_bytes([code[at], code[at + 1]])
}

#[cfg(test)]
mod tests {
    use super::*;
    use loks_compiler::compile;
    use loks_lexer::Lexer;
    use loks_parser::Parser;
    use loks_util::span::FileId;

    #[derive(Default)]
    struct FakeIo {
        out: String,
    }

    impl HostIo for FakeIo {
        fn write_str(&mut self, s: &str) {
            self.out.push_str(s);
        }
        fn read_line(&mut self) -> String {
            String::new()
        }
    }

    fn run_src(src: &str) -> String {
        let (tokens, lex_errors) = Lexer::new(src, FileId::DUMMY).tokenize();
        assert!(lex_errors.is_empty());
        let (program, parse_errors) = Parser::new(tokens).parse();
        assert!(parse_errors.is_empty(), "{parse_errors:?}");
        let code = compile(&program).expect("program should lower to bytecode");
        let mut io = FakeIo::default();
        let mut vm = Vm::new(&code, &mut io);
        vm.run().expect("program should run without error");
        io.out
    }

    #[test]
    fn e1_arithmetic_precedence() {
        assert_eq!(run_src("var x = 2 + 3 * 4; println(x);"), "14\n");
    }

    #[test]
    fn e2_recursive_fibonacci() {
        assert_eq!(
            run_src("fun f(n){ if(n<2){return n;} return f(n-1)+f(n-2); } println(f(10));"),
            "55\n"
        );
    }

    #[test]
    fn e3_array_subscript_assignment() {
        assert_eq!(run_src("var a = [1,2,3]; a[1] = 99; println(a[1]);"), "99\n");
    }

    #[test]
    fn e4_while_loop() {
        assert_eq!(
            run_src("var i=0; while(i<3){ print(i); i=i+1; } println(\"\");"),
            "012\n"
        );
    }

    #[test]
    fn e5_string_concat_and_len() {
        assert_eq!(run_src("var s = \"hi\"+\" \"+\"there\"; println(len(s));"), "8\n");
    }

    #[test]
    fn e6_isinteger_builtin() {
        assert_eq!(
            run_src("println(isinteger(\"-42\")); println(isinteger(\"3.14\"));"),
            "true\nfalse\n"
        );
    }

    #[test]
    fn short_circuit_and_never_calls_the_right_side() {
        let out = run_src(
            "fun boom(){ println(\"called\"); return true; } var x = false and boom(); println(x);",
        );
        assert_eq!(out, "false\n");
    }

    #[test]
    fn division_by_zero_is_a_zero_division_error() {
        let code = compile_ok("println(1/0);");
        let mut io = FakeIo::default();
        let mut vm = Vm::new(&code, &mut io);
        let err = vm.run().unwrap_err();
        assert!(matches!(err, ErrorKind::ZeroDivisionError(_)));
    }

    #[test]
    fn out_of_bounds_array_access_is_an_index_error() {
        let code = compile_ok("var a = [1]; println(a[5]);");
        let mut io = FakeIo::default();
        let mut vm = Vm::new(&code, &mut io);
        let err = vm.run().unwrap_err();
        assert!(matches!(err, ErrorKind::IndexError(_)));
    }

    #[test]
    fn globals_are_shared_across_function_calls() {
        let out = run_src("var total = 0; fun add(n){ total = total + n; } add(3); add(4); println(total);");
        assert_eq!(out, "7\n");
    }

    #[test]
    fn debug_mode_does_not_change_observable_behavior() {
        let code = compile_ok("println(2+2);");
        let mut io = FakeIo::default();
        let mut vm = Vm::new(&code, &mut io).with_debug(true);
        vm.run().unwrap();
        assert_eq!(io.out, "4\n");
    }

    fn compile_ok(src: &str) -> loks_bytecode::CodeObject {
        let (tokens, lex_errors) = Lexer::new(src, FileId::DUMMY).tokenize();
        assert!(lex_errors.is_empty());
        let (program, parse_errors) = Parser::new(tokens).parse();
        assert!(parse_errors.is_empty(), "{parse_errors:?}");
        compile(&program).expect("program should lower to bytecode")
    }
}
