//! AST → [`CodeObject`] lowering.
//!
//! Two passes: [`collect_functions`] walks the whole program (including
//! `fun` declarations nested inside `if`/`while` bodies) to pre-assign every
//! user function a function-pool slot, so forward and mutually-recursive
//! calls resolve without a second compilation pass; [`compile`] then lowers
//! `main` first — populating the table of global variable slots — followed
//! by every other function, each resolving free identifiers against that
//! table: a name local to the function being compiled is local, everything
//! else is global.

use crate::emit::FuncBuilder;
use loks_bytecode::{CodeObject, Constant, FuncIdx, FunctionInfo, Opcode};
use loks_parser::ast::{
    BinOpKind, Block, Decl, Expr, ExprKind, FunDecl, LValue, Program, Stmt, UnOpKind,
};
use loks_util::error::{ErrorKind, LoksError};
use loks_util::span::Span;
use loks_util::symbol::Symbol;
use rustc_hash::FxHashMap;

/// The built-in function table: name paired with its `CALL_NATIVE`
/// operand. Order is part of the wire contract, not incidental.
const BUILTIN_FUNCTIONS: &[&str] = &["print", "println", "input", "len", "int", "str", "isinteger"];

fn builtin_index(name: &str) -> Option<u8> {
    BUILTIN_FUNCTIONS.iter().position(|n| *n == name).map(|i| i as u8)
}

/// Compiles an analyzed program into a [`CodeObject`]. The caller is
/// expected to have already run the program through the analyzer, which
/// guarantees every name is *declared* somewhere visible — but the
/// analyzer's scope chain is richer than what this flat-frame VM can
/// address: a `fun` nested inside another function may legally read an
/// enclosing local (the tree-walking interpreter honors that as a lexical
/// closure), yet this compiler's locals are plain per-frame slots with no
/// upvalue capture. That one case surfaces as a [`LoksError`] here rather
/// than resolving to a slot, matching how the original compiler defers an
/// unresolvable local to a runtime name lookup instead of aborting.
pub fn compile(program: &Program) -> Result<CodeObject, LoksError> {
    let mut funs = Vec::new();
    collect_functions(program, &mut funs);

    let mut code = CodeObject::new();
    code.functions.push(FunctionInfo { arg_count: 0, code: Vec::new() });

    let mut func_indices: FxHashMap<Symbol, FuncIdx> = FxHashMap::default();
    for f in &funs {
        let idx = code.functions.push(FunctionInfo {
            arg_count: f.params.len() as u16,
            code: Vec::new(),
        });
        func_indices.insert(f.name, idx);
    }

    let mut compiler = Compiler {
        code,
        func_indices,
        global_slots: FxHashMap::default(),
    };

    let main_body = compiler.compile_function(&[], program, true)?;
    compiler.code.functions[FuncIdx::MAIN] = main_body;

    for f in &funs {
        let body = compiler.compile_function(&f.params, &f.body.decls, false)?;
        let idx = compiler.func_indices[&f.name];
        compiler.code.functions[idx] = body;
    }

    Ok(compiler.code)
}

/// Recursively finds every `fun` declaration in `decls`, including ones
/// nested inside `if`/`while`/block bodies, in source order.
fn collect_functions<'a>(decls: &'a [Decl], out: &mut Vec<&'a FunDecl>) {
    for decl in decls {
        match decl {
            Decl::Fun(f) => {
                out.push(f);
                collect_functions(&f.body.decls, out);
            }
            Decl::Var(_) => {}
            Decl::Stmt(stmt) => collect_functions_in_stmt(stmt, out),
        }
    }
}

fn collect_functions_in_stmt<'a>(stmt: &'a Stmt, out: &mut Vec<&'a FunDecl>) {
    match stmt {
        Stmt::If { arms, else_body, .. } => {
            for arm in arms {
                collect_functions(&arm.body.decls, out);
            }
            if let Some(else_body) = else_body {
                collect_functions(&else_body.decls, out);
            }
        }
        Stmt::While { body, .. } => collect_functions(&body.decls, out),
        Stmt::BlockStmt(block) => collect_functions(&block.decls, out),
        Stmt::Assign { .. }
        | Stmt::Return { .. }
        | Stmt::Continue { .. }
        | Stmt::Break { .. }
        | Stmt::ExprStmt { .. } => {}
    }
}

/// Where an identifier resolves for codegen purposes: a slot in the current
/// function's own frame, or a slot in `main`'s frame (the global namespace).
enum Where {
    Local(u8),
    Global(u8),
}

struct Compiler {
    code: CodeObject,
    func_indices: FxHashMap<Symbol, FuncIdx>,
    /// Names declared by a `VarDecl` while compiling `main`, with the local
    /// slot `main`'s own frame stores them in. Populated while compiling
    /// `main`; read-only for every other function.
    global_slots: FxHashMap<Symbol, u8>,
}

impl Compiler {
    fn compile_function(
        &mut self,
        params: &[Symbol],
        decls: &[Decl],
        is_main: bool,
    ) -> Result<FunctionInfo, LoksError> {
        let mut fc = FnCompiler {
            compiler: self,
            fb: FuncBuilder::new(),
            scopes: vec![FxHashMap::default()],
            next_slot: 0,
            loop_stack: Vec::new(),
            is_main,
        };
        for param in params {
            fc.declare_local(*param);
        }
        fc.compile_decls(decls)?;

        if is_main {
            fc.fb.emit_op(Opcode::End);
        } else {
            fc.fb.emit_op(Opcode::LoadNil);
            fc.fb.emit_op(Opcode::ReturnValue);
        }

        Ok(FunctionInfo {
            arg_count: params.len() as u16,
            code: fc.fb.finish(),
        })
    }
}

struct FnCompiler<'c> {
    compiler: &'c mut Compiler,
    fb: FuncBuilder,
    scopes: Vec<FxHashMap<Symbol, u8>>,
    next_slot: u8,
    loop_stack: Vec<(crate::emit::Label, crate::emit::Label)>,
    is_main: bool,
}

impl<'c> FnCompiler<'c> {
    fn declare_local(&mut self, name: Symbol) -> u8 {
        let slot = self.next_slot;
        self.next_slot = self.next_slot.checked_add(1).expect("more than 256 locals in one function");
        self.scopes.last_mut().expect("at least one scope always active").insert(name, slot);
        if self.is_main {
            self.compiler.global_slots.insert(name, slot);
        }
        slot
    }

    /// Resolves `name` against this function's own locals, then against the
    /// global table. A name that is neither — declared only in an
    /// *enclosing* function's frame, visible to the analyzer's scope chain
    /// but invisible to this flat-frame compiler — is a [`NameError`],
    /// not an internal bug: it's a real program this bytecode backend
    /// cannot lower, the same boundary the original compiler hits when its
    /// `LOAD_LOCAL` reaches a binding the running frame never stored.
    ///
    /// [`NameError`]: ErrorKind::NameError
    fn resolve(&self, name: Symbol, span: Span) -> Result<Where, LoksError> {
        for scope in self.scopes.iter().rev() {
            if let Some(slot) = scope.get(&name) {
                return Ok(Where::Local(*slot));
            }
        }
        match self.compiler.global_slots.get(&name) {
            Some(slot) => Ok(Where::Global(*slot)),
            None => Err(LoksError::new(
                ErrorKind::NameError(format!(
                    "'{name}' is a local of an enclosing function, which the bytecode \
                     compiler cannot capture as a closure"
                )),
                span,
            )),
        }
    }

    fn add_const(&mut self, constant: Constant) -> u16 {
        self.compiler.code.constants.push(constant).0
    }

    fn push_scope(&mut self) {
        self.scopes.push(FxHashMap::default());
    }

    fn pop_scope(&mut self) {
        self.scopes.pop();
    }

    fn compile_block(&mut self, block: &Block) -> Result<(), LoksError> {
        self.push_scope();
        let result = self.compile_decls(&block.decls);
        self.pop_scope();
        result
    }

    fn compile_decls(&mut self, decls: &[Decl]) -> Result<(), LoksError> {
        for decl in decls {
            match decl {
                Decl::Var(v) => {
                    match &v.init {
                        Some(init) => self.compile_expr(init)?,
                        None => self.fb.emit_op(Opcode::LoadNil),
                    }
                    let slot = self.declare_local(v.name);
                    self.fb.emit_op(Opcode::StoreLocal);
                    self.fb.emit_u8(slot);
                }
                // Already lowered into its own function-pool entry by
                // `compile`; nothing to emit at the declaration site.
                Decl::Fun(_) => {}
                Decl::Stmt(stmt) => self.compile_stmt(stmt)?,
            }
        }
        Ok(())
    }

    fn compile_stmt(&mut self, stmt: &Stmt) -> Result<(), LoksError> {
        match stmt {
            Stmt::Assign { target, value, span } => match target {
                LValue::Identifier(name) => {
                    self.compile_expr(value)?;
                    match self.resolve(*name, *span)? {
                        Where::Local(slot) => {
                            self.fb.emit_op(Opcode::StoreLocal);
                            self.fb.emit_u8(slot);
                        }
                        Where::Global(slot) => {
                            self.fb.emit_op(Opcode::StoreGlobal);
                            self.fb.emit_u8(slot);
                        }
                    }
                }
                LValue::Index { base, index } => {
                    self.compile_expr(value)?;
                    self.compile_expr(base)?;
                    self.compile_expr(index)?;
                    self.fb.emit_op(Opcode::StoreSubscr);
                }
            },
            Stmt::If { arms, else_body, .. } => {
                let end_label = self.fb.new_label();
                for arm in arms {
                    self.compile_expr(&arm.cond)?;
                    let next_label = self.fb.new_label();
                    self.fb.emit_jump(Opcode::PopJmpIfFalse, next_label);
                    self.compile_block(&arm.body)?;
                    self.fb.emit_jump(Opcode::Goto, end_label);
                    self.fb.bind_label(next_label);
                }
                if let Some(else_body) = else_body {
                    self.compile_block(else_body)?;
                }
                self.fb.bind_label(end_label);
            }
            Stmt::While { cond, body, .. } => {
                let loop_label = self.fb.new_label();
                let end_label = self.fb.new_label();
                self.fb.bind_label(loop_label);
                self.compile_expr(cond)?;
                self.fb.emit_jump(Opcode::PopJmpIfFalse, end_label);
                self.loop_stack.push((loop_label, end_label));
                let result = self.compile_block(body);
                self.loop_stack.pop();
                result?;
                self.fb.emit_jump(Opcode::Goto, loop_label);
                self.fb.bind_label(end_label);
            }
            Stmt::Return { value, .. } => {
                match value {
                    Some(expr) => self.compile_expr(expr)?,
                    None => self.fb.emit_op(Opcode::LoadNil),
                }
                self.fb.emit_op(Opcode::ReturnValue);
            }
            Stmt::Continue { .. } => {
                let (loop_label, _) = *self
                    .loop_stack
                    .last()
                    .expect("'continue' outside a loop is rejected by the analyzer");
                self.fb.emit_jump(Opcode::Goto, loop_label);
            }
            Stmt::Break { .. } => {
                let (_, end_label) = *self
                    .loop_stack
                    .last()
                    .expect("'break' outside a loop is rejected by the analyzer");
                self.fb.emit_jump(Opcode::Goto, end_label);
            }
            Stmt::ExprStmt { expr, .. } => {
                // The result is left on the operand stack: the opcode table
                // has no instruction to discard it, matching the source
                // compiler's own expression-statement handling.
                self.compile_expr(expr)?;
            }
            Stmt::BlockStmt(block) => self.compile_block(block)?,
        }
        Ok(())
    }

    fn compile_expr(&mut self, expr: &Expr) -> Result<(), LoksError> {
        match &expr.kind {
            ExprKind::Number(lit) => self.compile_number(*lit),
            ExprKind::String(s) => {
                let idx = self.add_const(Constant::String(s.clone()));
                self.fb.emit_op(Opcode::LoadConst);
                self.fb.emit_u16(idx);
            }
            ExprKind::True => self.fb.emit_op(Opcode::LoadTrue),
            ExprKind::False => self.fb.emit_op(Opcode::LoadFalse),
            ExprKind::Nil => self.fb.emit_op(Opcode::LoadNil),
            ExprKind::Identifier(name) => match self.resolve(*name, expr.span)? {
                Where::Local(slot) => {
                    self.fb.emit_op(Opcode::LoadLocal);
                    self.fb.emit_u8(slot);
                }
                Where::Global(slot) => {
                    self.fb.emit_op(Opcode::LoadGlobal);
                    self.fb.emit_u8(slot);
                }
            },
            ExprKind::Array(elems) => {
                for elem in elems {
                    self.compile_expr(elem)?;
                }
                self.fb.emit_op(Opcode::BuildList);
                self.fb.emit_u16(elems.len() as u16);
            }
            ExprKind::ArrayAccess { base, index } => {
                self.compile_expr(base)?;
                self.compile_expr(index)?;
                self.fb.emit_op(Opcode::BinarySubscr);
            }
            ExprKind::Call { callee, args } => self.compile_call(callee, args)?,
            ExprKind::BinOp { kind, left, right } => self.compile_binop(*kind, left, right)?,
            ExprKind::UnaryOp { kind, expr: inner } => self.compile_unop(*kind, inner)?,
        }
        Ok(())
    }

    fn compile_number(&mut self, lit: loks_parser::ast::NumberLit) {
        use loks_parser::ast::NumberLit;
        match lit {
            NumberLit::Integer(n) => {
                if (0..256).contains(&n) {
                    self.fb.emit_op(Opcode::BipUsh);
                    self.fb.emit_u8(n as u8);
                } else {
                    let idx = self.add_const(Constant::Integer(n));
                    self.fb.emit_op(Opcode::LoadConst);
                    self.fb.emit_u16(idx);
                }
            }
            NumberLit::Double(d) => {
                let idx = self.add_const(Constant::Double(d));
                self.fb.emit_op(Opcode::LoadConst);
                self.fb.emit_u16(idx);
            }
        }
    }

    /// `and`/`or` MUST short-circuit:
    /// lowered as conditional jumps rather than `BINARY_AND`/`BINARY_OR`, so
    /// those two opcodes go unused by this compiler.
    fn compile_short_circuit(&mut self, is_or: bool, left: &Expr, right: &Expr) -> Result<(), LoksError> {
        let short_label = self.fb.new_label();
        let end_label = self.fb.new_label();
        self.compile_expr(left)?;
        let short_circuit_op = if is_or { Opcode::PopJmpIfTrue } else { Opcode::PopJmpIfFalse };
        self.fb.emit_jump(short_circuit_op, short_label);
        self.compile_expr(right)?;
        self.fb.emit_jump(Opcode::Goto, end_label);
        self.fb.bind_label(short_label);
        self.fb.emit_op(if is_or { Opcode::LoadTrue } else { Opcode::LoadFalse });
        self.fb.bind_label(end_label);
        Ok(())
    }

    fn compile_binop(&mut self, kind: BinOpKind, left: &Expr, right: &Expr) -> Result<(), LoksError> {
        match kind {
            BinOpKind::Or => self.compile_short_circuit(true, left, right)?,
            BinOpKind::And => self.compile_short_circuit(false, left, right)?,
            _ => {
                self.compile_expr(left)?;
                self.compile_expr(right)?;
                let op = match kind {
                    BinOpKind::Eq => Opcode::CmpEq,
                    BinOpKind::Ne => Opcode::CmpNe,
                    BinOpKind::Gt => Opcode::CmpGt,
                    BinOpKind::Ge => Opcode::CmpGe,
                    BinOpKind::Lt => Opcode::CmpLt,
                    BinOpKind::Le => Opcode::CmpLe,
                    BinOpKind::Add => Opcode::BinaryAdd,
                    BinOpKind::Sub => Opcode::BinarySub,
                    BinOpKind::Mul => Opcode::BinaryMul,
                    BinOpKind::Div => Opcode::BinaryDiv,
                    BinOpKind::Mod => Opcode::BinaryModulo,
                    BinOpKind::Or | BinOpKind::And => unreachable!("handled above"),
                };
                self.fb.emit_op(op);
            }
        }
        Ok(())
    }

    fn compile_unop(&mut self, kind: UnOpKind, operand: &Expr) -> Result<(), LoksError> {
        self.compile_expr(operand)?;
        match kind {
            UnOpKind::Not => self.fb.emit_op(Opcode::UnaryNot),
            // The parser already folds `-<literal>` into a negative
            // constant, so by the time a
            // `UnaryOp { kind: Neg, .. }` node reaches the compiler its
            // operand is never itself a bare number literal.
            UnOpKind::Neg => self.fb.emit_op(Opcode::UnaryNegative),
        }
        Ok(())
    }

    fn compile_call(&mut self, callee: &Expr, args: &[Expr]) -> Result<(), LoksError> {
        for arg in args {
            self.compile_expr(arg)?;
        }
        let ExprKind::Identifier(name) = callee.kind else {
            panic!("computed callees are rejected by the analyzer before compilation");
        };
        if let Some(native_idx) = builtin_index(name.as_str()) {
            self.fb.emit_op(Opcode::CallNative);
            self.fb.emit_u8(native_idx);
            return Ok(());
        }
        let func_idx = *self
            .compiler
            .func_indices
            .get(&name)
            .expect("every callee resolves to a user function after a clean analyzer pass");
        self.fb.emit_op(Opcode::CallFunction);
        self.fb.emit_u8(func_idx.0);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use loks_bytecode::Opcode;
    use loks_lexer::Lexer;
    use loks_parser::Parser;
    use loks_util::span::FileId;

    fn compile_src(src: &str) -> CodeObject {
        let (tokens, lex_errors) = Lexer::new(src, FileId::DUMMY).tokenize();
        assert!(lex_errors.is_empty());
        let (program, parse_errors) = Parser::new(tokens).parse();
        assert!(parse_errors.is_empty(), "{parse_errors:?}");
        compile(&program).expect("program should lower to bytecode")
    }

    /// Walks a function's byte stream decoding one instruction at a time,
    /// asserting every opcode byte and operand length is well-formed and
    /// that the stream ends on a terminating instruction: every function
    /// ends with at least one `RETURN_VALUE`, and `main` ends with `END`.
    fn assert_well_formed(code: &[u8], is_main: bool) {
        let mut ip = 0usize;
        let mut saw_terminator = false;
        while ip < code.len() {
            let op = Opcode::try_from(code[ip]).unwrap_or_else(|b| panic!("bad opcode byte {b:#x} at {ip}"));
            ip += 1 + op.operand_len();
            saw_terminator = matches!(op, Opcode::End | Opcode::ReturnValue);
        }
        assert_eq!(ip, code.len(), "instruction stream did not end on a boundary");
        assert!(saw_terminator, "function body never reaches a terminating instruction");
        if is_main {
            assert_eq!(code.last().copied(), Some(Opcode::End as u8));
        }
    }

    #[test]
    fn e1_arithmetic_is_well_formed() {
        let code = compile_src("var x = 2 + 3 * 4; println(x);");
        assert_well_formed(&code.main().code, true);
    }

    #[test]
    fn e2_recursive_fibonacci_has_two_functions() {
        let code = compile_src(
            "fun f(n){ if(n<2){return n;} return f(n-1)+f(n-2); } println(f(10));",
        );
        assert_eq!(code.functions.len(), 2);
        assert_well_formed(&code.main().code, true);
        assert_well_formed(&code.functions.as_slice()[1].code, false);
        assert_eq!(code.functions.as_slice()[1].arg_count, 1);
    }

    #[test]
    fn e4_while_loop_round_trips_through_the_binary_loader() {
        let code = compile_src("var i=0; while(i<3){ print(i); i=i+1; } println(\"\");");
        assert_well_formed(&code.main().code, true);
        let bytes = loks_bytecode::serialize(&code);
        let restored = loks_bytecode::deserialize(&bytes).unwrap();
        assert_eq!(restored, code);
    }

    #[test]
    fn short_circuit_and_or_never_emit_the_binary_opcodes() {
        let code = compile_src("var x = (1 < 2) and (3 < 4); var y = (1 < 2) or (3 < 4);");
        assert!(!code.main().code.contains(&(Opcode::BinaryAnd as u8)));
        assert!(!code.main().code.contains(&(Opcode::BinaryOr as u8)));
    }

    #[test]
    fn small_integer_literals_use_bipush() {
        let code = compile_src("var x = 7;");
        assert!(code.main().code.contains(&(Opcode::BipUsh as u8)));
        assert!(code.constants.is_empty());
    }

    #[test]
    fn large_integer_literals_use_the_constant_pool() {
        let code = compile_src("var x = 1000;");
        assert!(code.main().code.contains(&(Opcode::LoadConst as u8)));
        assert_eq!(code.constants.len(), 1);
    }

    #[test]
    fn array_literal_and_subscript_assignment_compile() {
        let code = compile_src("var a = [1,2,3]; a[1] = 99; println(a[1]);");
        assert_well_formed(&code.main().code, true);
        assert!(code.main().code.contains(&(Opcode::BuildList as u8)));
        assert!(code.main().code.contains(&(Opcode::StoreSubscr as u8)));
    }

    #[test]
    fn nested_fun_decl_gets_its_own_pool_slot() {
        let code = compile_src(
            "if (true) { fun helper(x) { return x; } println(helper(1)); }",
        );
        assert_eq!(code.functions.len(), 2);
    }

    /// A nested function reading an enclosing function's local is accepted
    /// by the analyzer (its scope chain resolves the name) and runs fine
    /// under the tree-walking interpreter's lexical closures, but this
    /// flat-frame VM compiler has no slot for it. It must come back as a
    /// `NameError`, not panic the compiler.
    #[test]
    fn nested_function_capturing_an_enclosing_local_is_a_name_error_not_a_panic() {
        let (tokens, lex_errors) = Lexer::new(
            "fun outer(){ var x=1; fun inner(){ return x; } return inner(); } println(outer());",
            FileId::DUMMY,
        )
        .tokenize();
        assert!(lex_errors.is_empty());
        let (program, parse_errors) = Parser::new(tokens).parse();
        assert!(parse_errors.is_empty(), "{parse_errors:?}");

        let err = compile(&program).expect_err("capturing an enclosing local has no VM slot");
        assert!(matches!(err.kind, ErrorKind::NameError(_)));
    }
}
