//! The semantic analyzer: a single-pass walk over the AST that resolves
//! names against a chain of [`SymbolTable`]s and reports a handful of
//! shallow type checks.
//!
//! Like the scanner and parser before it, the analyzer never aborts on the
//! first problem: every diagnostic is pushed onto `errors` and the walk
//! continues, so a single run can surface more than one `NameError`/
//! `TypeError`.

use crate::scope::SymbolTable;
use crate::types::{SymbolKind, TypeTag};
use loks_parser::ast::{
    BinOpKind, Block, Decl, Expr, ExprKind, FunDecl, LValue, Program, Stmt, UnOpKind, VarDecl,
};
use loks_util::error::{ErrorKind, LoksError};
use loks_util::span::Span;
use loks_util::symbol::Symbol;
use rustc_hash::FxHashSet;

/// The built-in type names seeded into the analyzer; the
/// language has no type-annotation syntax to reference them with, so they
/// live in their own namespace rather than the identifier scope chain —
/// seeding them there would collide with the built-in *function* named
/// `int`, which is also a valid type name.
const BUILTIN_TYPE_NAMES: &[&str] = &["int", "float", "double", "string"];

/// The built-in function table, name paired with declared arity.
const BUILTIN_FUNCTIONS: &[(&str, usize)] = &[
    ("print", 1),
    ("println", 1),
    ("input", 1),
    ("len", 1),
    ("int", 1),
    ("str", 1),
    ("isinteger", 1),
];

/// A tag is "deferred" when its runtime kind is not known statically, so
/// arithmetic/subscript checks involving it must be left to the VM/
/// interpreter's own runtime `TypeError`s rather than reported here.
fn is_deferred(tag: TypeTag) -> bool {
    matches!(tag, TypeTag::Variable | TypeTag::Call | TypeTag::Identifier)
}

/// Single-pass semantic analyzer.
pub struct Analyzer {
    scope: SymbolTable,
    #[allow(dead_code)] // seeded for parity with the source analyzer; never looked up (no type-annotation syntax)
    type_names: FxHashSet<Symbol>,
    loop_depth: u32,
    errors: Vec<LoksError>,
}

impl Analyzer {
    fn new() -> Self {
        let mut scope = SymbolTable::new();
        for (name, arity) in BUILTIN_FUNCTIONS {
            scope.declare(
                loks_util::symbol::intern(name),
                SymbolKind::Function { arity: *arity },
            );
        }
        let type_names = BUILTIN_TYPE_NAMES
            .iter()
            .map(|n| loks_util::symbol::intern(n))
            .collect();
        Self {
            scope,
            type_names,
            loop_depth: 0,
            errors: Vec::new(),
        }
    }

    /// Analyzes a complete program, returning every diagnostic collected.
    pub fn analyze(program: &Program) -> Vec<LoksError> {
        let mut analyzer = Analyzer::new();
        analyzer.analyze_decls(program);
        analyzer.errors
    }

    fn error(&mut self, kind: ErrorKind, span: Span) {
        self.errors.push(LoksError::new(kind, span));
    }

    /// Declares every `fun` in `decls` before walking any of them, so a
    /// function can call itself (recursion, testable via E2) or one defined
    /// later in the same block (mutual forward reference).
    fn hoist_functions(&mut self, decls: &[Decl]) {
        for decl in decls {
            if let Decl::Fun(f) = decl {
                let declared = self.scope.declare(f.name, SymbolKind::Function { arity: f.params.len() });
                if !declared {
                    self.error(
                        ErrorKind::NameError(format!("duplicate declaration of '{}'", f.name)),
                        f.span,
                    );
                }
            }
        }
    }

    fn analyze_decls(&mut self, decls: &[Decl]) {
        self.hoist_functions(decls);
        for decl in decls {
            match decl {
                Decl::Var(v) => self.analyze_var_decl(v),
                Decl::Fun(f) => self.analyze_fun_decl(f),
                Decl::Stmt(s) => self.analyze_stmt(s),
            }
        }
    }

    fn analyze_var_decl(&mut self, decl: &VarDecl) {
        if let Some(init) = &decl.init {
            self.infer_expr(init);
        }
        if !self.scope.declare(decl.name, SymbolKind::Variable) {
            self.error(
                ErrorKind::NameError(format!("duplicate declaration of '{}'", decl.name)),
                decl.span,
            );
        }
    }

    /// A function's parameters and body share one scope (no extra nesting
    /// for the body block itself), matching how a single activation record
    /// holds both at run time.
    fn analyze_fun_decl(&mut self, decl: &FunDecl) {
        let saved = std::mem::replace(&mut self.scope, SymbolTable::new());
        self.scope = saved.push();

        let mut seen = FxHashSet::default();
        for param in &decl.params {
            if !seen.insert(*param) {
                self.error(
                    ErrorKind::NameError(format!(
                        "duplicate parameter name '{param}' in function '{}'",
                        decl.name
                    )),
                    decl.span,
                );
                continue;
            }
            self.scope.declare(*param, SymbolKind::Variable);
        }

        self.analyze_decls(&decl.body.decls);

        let saved = std::mem::replace(&mut self.scope, SymbolTable::new());
        self.scope = saved.pop();
    }

    fn analyze_block_scoped(&mut self, block: &Block) {
        let saved = std::mem::replace(&mut self.scope, SymbolTable::new());
        self.scope = saved.push();
        self.analyze_decls(&block.decls);
        let saved = std::mem::replace(&mut self.scope, SymbolTable::new());
        self.scope = saved.pop();
    }

    fn analyze_stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Assign { target, value, span } => {
                let value_tag = self.infer_expr(value);
                if value_tag == TypeTag::Function {
                    self.error(
                        ErrorKind::TypeError("cannot assign a function value".into()),
                        *span,
                    );
                }
                self.analyze_lvalue(target, *span);
            }
            Stmt::If { arms, else_body, .. } => {
                for arm in arms {
                    self.infer_expr(&arm.cond);
                    self.analyze_block_scoped(&arm.body);
                }
                if let Some(else_body) = else_body {
                    self.analyze_block_scoped(else_body);
                }
            }
            Stmt::While { cond, body, .. } => {
                self.infer_expr(cond);
                self.loop_depth += 1;
                self.analyze_block_scoped(body);
                self.loop_depth -= 1;
            }
            Stmt::Return { value, span } => {
                if let Some(value) = value {
                    if self.infer_expr(value) == TypeTag::Function {
                        self.error(
                            ErrorKind::TypeError("cannot return a function value".into()),
                            *span,
                        );
                    }
                }
            }
            Stmt::Continue { span } => {
                if self.loop_depth == 0 {
                    self.error(
                        ErrorKind::SyntaxError("'continue' outside of a loop".into()),
                        *span,
                    );
                }
            }
            Stmt::Break { span } => {
                if self.loop_depth == 0 {
                    self.error(ErrorKind::SyntaxError("'break' outside of a loop".into()), *span);
                }
            }
            Stmt::ExprStmt { expr, .. } => {
                self.infer_expr(expr);
            }
            Stmt::BlockStmt(block) => self.analyze_block_scoped(block),
        }
    }

    fn analyze_lvalue(&mut self, target: &LValue, span: Span) {
        match target {
            LValue::Identifier(name) => {
                if self.scope.resolve(*name).is_none() {
                    self.error(
                        ErrorKind::NameError(format!("undeclared identifier '{name}'")),
                        span,
                    );
                }
            }
            LValue::Index { base, index } => {
                let base_tag = self.infer_expr(base);
                if !is_deferred(base_tag) && base_tag != TypeTag::Array {
                    self.error(
                        ErrorKind::TypeError("cannot index into this value".into()),
                        span,
                    );
                }
                self.infer_expr(index);
            }
        }
    }

    fn infer_expr(&mut self, expr: &Expr) -> TypeTag {
        match &expr.kind {
            ExprKind::Number(_) => TypeTag::Number,
            ExprKind::String(_) => TypeTag::String,
            ExprKind::True | ExprKind::False => TypeTag::Boolean,
            ExprKind::Nil => TypeTag::Nil,
            ExprKind::Identifier(name) => self.infer_identifier(*name, expr.span),
            ExprKind::Array(elems) => {
                for elem in elems {
                    self.infer_expr(elem);
                }
                TypeTag::Array
            }
            ExprKind::ArrayAccess { base, index } => {
                let base_tag = self.infer_expr(base);
                self.infer_expr(index);
                if !is_deferred(base_tag) && base_tag != TypeTag::Array {
                    self.error(
                        ErrorKind::TypeError("cannot subscript this value".into()),
                        expr.span,
                    );
                }
                // the element's kind is unknown until run time regardless
                // of whether the base was known to be an array.
                TypeTag::Variable
            }
            ExprKind::Call { callee, args } => {
                for arg in args {
                    self.infer_expr(arg);
                }
                self.check_call(callee, args.len(), expr.span);
                TypeTag::Call
            }
            ExprKind::BinOp { kind, left, right } => self.infer_binop(*kind, left, right, expr.span),
            ExprKind::UnaryOp { kind, expr: inner } => self.infer_unop(*kind, inner, expr.span),
        }
    }

    fn infer_identifier(&mut self, name: Symbol, span: Span) -> TypeTag {
        match self.scope.resolve(name) {
            Some(SymbolKind::Variable) => TypeTag::Variable,
            Some(SymbolKind::Function { .. }) => TypeTag::Function,
            Some(SymbolKind::Type) => TypeTag::Identifier,
            None => {
                self.error(ErrorKind::NameError(format!("undeclared identifier '{name}'")), span);
                TypeTag::Identifier
            }
        }
    }

    /// Checks call arity when the callee is a plain identifier naming a
    /// known function, raising exactly one `TypeError` per bad call site.
    /// Anything else — a computed callee, or one that failed to resolve at
    /// all — is left to the runtime's own non-callable `TypeError`.
    fn check_call(&mut self, callee: &Expr, argc: usize, call_span: Span) {
        let ExprKind::Identifier(name) = callee.kind else {
            self.infer_expr(callee);
            return;
        };
        match self.scope.resolve(name) {
            Some(SymbolKind::Function { arity }) => {
                if *arity != argc {
                    self.error(
                        ErrorKind::TypeError(format!(
                            "'{name}' expects {arity} argument(s), got {argc}"
                        )),
                        call_span,
                    );
                }
            }
            Some(_) => {
                self.error(ErrorKind::TypeError(format!("'{name}' is not callable")), call_span);
            }
            None => {
                self.error(ErrorKind::NameError(format!("undeclared identifier '{name}'")), call_span);
            }
        }
    }

    fn infer_binop(&mut self, kind: BinOpKind, left: &Expr, right: &Expr, span: Span) -> TypeTag {
        let lt = self.infer_expr(left);
        let rt = self.infer_expr(right);
        match kind {
            BinOpKind::Or | BinOpKind::And => TypeTag::Boolean,
            BinOpKind::Eq
            | BinOpKind::Ne
            | BinOpKind::Gt
            | BinOpKind::Ge
            | BinOpKind::Lt
            | BinOpKind::Le => TypeTag::Boolean,
            BinOpKind::Add => {
                if is_deferred(lt) || is_deferred(rt) {
                    return TypeTag::Number;
                }
                let ok = matches!((lt, rt), (TypeTag::Number, TypeTag::Number) | (TypeTag::String, TypeTag::String));
                if !ok {
                    self.error(
                        ErrorKind::TypeError(format!("cannot add {lt:?} and {rt:?}")),
                        span,
                    );
                }
                TypeTag::Number
            }
            BinOpKind::Sub | BinOpKind::Mul | BinOpKind::Div | BinOpKind::Mod => {
                if is_deferred(lt) || is_deferred(rt) {
                    return TypeTag::Number;
                }
                if lt != TypeTag::Number || rt != TypeTag::Number {
                    self.error(
                        ErrorKind::TypeError(format!("cannot apply {kind:?} to {lt:?} and {rt:?}")),
                        span,
                    );
                }
                TypeTag::Number
            }
        }
    }

    fn infer_unop(&mut self, kind: UnOpKind, operand: &Expr, span: Span) -> TypeTag {
        let tag = self.infer_expr(operand);
        match kind {
            UnOpKind::Not => TypeTag::Boolean,
            UnOpKind::Neg => {
                if !is_deferred(tag) && tag != TypeTag::Number {
                    self.error(ErrorKind::TypeError(format!("cannot negate {tag:?}")), span);
                }
                TypeTag::Number
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use loks_lexer::Lexer;
    use loks_parser::Parser;
    use loks_util::span::FileId;

    fn analyze(src: &str) -> Vec<LoksError> {
        let (tokens, lex_errors) = Lexer::new(src, FileId::DUMMY).tokenize();
        assert!(lex_errors.is_empty());
        let (program, parse_errors) = Parser::new(tokens).parse();
        assert!(parse_errors.is_empty(), "{parse_errors:?}");
        Analyzer::analyze(&program)
    }

    #[test]
    fn duplicate_declaration_in_same_scope_is_a_name_error() {
        let errors = analyze("var x = 1; var x = 2;");
        assert_eq!(errors.len(), 1);
        assert!(matches!(errors[0].kind, ErrorKind::NameError(_)));
    }

    #[test]
    fn shadowing_in_a_nested_block_is_fine() {
        let errors = analyze("var x = 1; { var x = 2; }");
        assert!(errors.is_empty());
    }

    #[test]
    fn undeclared_identifier_is_a_name_error() {
        let errors = analyze("println(y);");
        assert_eq!(errors.len(), 1);
        assert!(matches!(errors[0].kind, ErrorKind::NameError(_)));
    }

    #[test]
    fn wrong_arity_call_is_exactly_one_type_error() {
        let errors = analyze("fun add(a, b) { return a + b; } add(1);");
        assert_eq!(errors.len(), 1);
        assert!(matches!(errors[0].kind, ErrorKind::TypeError(_)));
    }

    #[test]
    fn recursive_call_resolves_via_hoisting() {
        let errors = analyze(
            "fun fib(n) { if (n < 2) { return n; } return fib(n-1) + fib(n-2); } println(fib(10));",
        );
        assert!(errors.is_empty(), "{errors:?}");
    }

    #[test]
    fn assigning_a_function_value_is_a_type_error() {
        let errors = analyze("fun f() { return 1; } var x; x = f;");
        assert_eq!(errors.len(), 1);
        assert!(matches!(errors[0].kind, ErrorKind::TypeError(_)));
    }

    #[test]
    fn break_outside_a_loop_is_reported() {
        let errors = analyze("break;");
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn break_inside_a_while_loop_is_fine() {
        let errors = analyze("while (true) { break; }");
        assert!(errors.is_empty());
    }

    #[test]
    fn subscripting_a_number_literal_is_a_type_error() {
        let errors = analyze("println(5[0]);");
        assert_eq!(errors.len(), 1);
        assert!(matches!(errors[0].kind, ErrorKind::TypeError(_)));
    }

    #[test]
    fn subscripting_an_array_variable_is_fine() {
        let errors = analyze("var a = [1,2,3]; println(a[1]);");
        assert!(errors.is_empty());
    }
}
