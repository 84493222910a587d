//! A tree-walking interpreter, kept alongside the bytecode VM as an
//! independent semantic reference: both engines share the same
//! [`Value`] model and the same arithmetic/comparison rules in `value.rs`,
//! so the two execution strategies can be cross-checked against each other.
//!
//! Control flow (`break`/`continue`/`return`) is represented as an explicit
//! [`Signal`] enum rather than string sentinels or ad hoc `None`/`bool`
//! returns, matching this codebase's closed-tagged-variant style.

use std::rc::Rc;

use loks_parser::ast::{
    BinOpKind, Block, Decl, Expr, ExprKind, LValue, NumberLit, Program, Stmt, UnOpKind,
};
use loks_util::error::{ErrorKind, LoksError};
use loks_util::span::Span;

use crate::builtins::{builtin_index, call_builtin, HostIo};
use crate::environment::Environment;
use crate::value::{self, truthy, LoksFunction, Number, Value};

/// How control left a statement or block: straight through the end, or
/// diverted by `break`/`continue`/`return`. The source threads this through
/// return values instead of exceptions; here it is a closed enum instead.
enum Signal {
    Normal,
    Break,
    Continue,
    Return(Value),
}

/// Walks an analyzed [`Program`] directly against the [`Value`] model,
/// routing built-in I/O through an injected [`HostIo`].
pub struct Interpreter<'io> {
    globals: Environment,
    io: &'io mut dyn HostIo,
}

impl<'io> Interpreter<'io> {
    pub fn new(io: &'io mut dyn HostIo) -> Self {
        Self {
            globals: Environment::new_root(),
            io,
        }
    }

    /// Runs every top-level declaration against a single global scope.
    ///
    /// A bare top-level `return` halts the run rather than erroring: this
    /// mirrors the bytecode VM, which has no caller frame to return to at
    /// `main` and simply halts cleanly on that case (see `loks-vm`).
    pub fn run(&mut self, program: &Program) -> Result<(), LoksError> {
        let globals = self.globals.clone();
        self.exec_decls(&globals, program)?;
        Ok(())
    }

    /// Binds every `fun` declared directly in `decls` before any of them run
    /// (matching `loks-sem::Analyzer::hoist_functions` and
    /// `loks-compiler`'s upfront `collect_functions` pass), so a forward
    /// call to a function declared later in the same block resolves instead
    /// of raising a spurious `NameError` the analyzer already accepted.
    fn hoist_functions(&mut self, env: &Environment, decls: &[Decl]) {
        for decl in decls {
            if let Decl::Fun(f) = decl {
                let function = Value::Function(Rc::new(LoksFunction {
                    name: f.name,
                    params: f.params.clone(),
                    body: Rc::new(f.body.clone()),
                    closure: env.clone(),
                }));
                env.define(f.name, function);
            }
        }
    }

    fn exec_decls(&mut self, env: &Environment, decls: &[Decl]) -> Result<Signal, LoksError> {
        self.hoist_functions(env, decls);
        for decl in decls {
            match self.exec_decl(env, decl)? {
                Signal::Normal => {}
                other => return Ok(other),
            }
        }
        Ok(Signal::Normal)
    }

    fn exec_decl(&mut self, env: &Environment, decl: &Decl) -> Result<Signal, LoksError> {
        match decl {
            Decl::Var(v) => {
                let value = match &v.init {
                    Some(init) => self.eval_expr(env, init)?,
                    None => Value::Nil,
                };
                env.define(v.name, value);
                Ok(Signal::Normal)
            }
            // Already bound by `hoist_functions` before this block's
            // statements started running; nothing left to do here.
            Decl::Fun(_) => Ok(Signal::Normal),
            Decl::Stmt(stmt) => self.exec_stmt(env, stmt),
        }
    }

    fn exec_stmt(&mut self, env: &Environment, stmt: &Stmt) -> Result<Signal, LoksError> {
        match stmt {
            Stmt::Assign { target, value, span } => {
                let value = self.eval_expr(env, value)?;
                match target {
                    LValue::Identifier(name) => {
                        if !env.assign(*name, value) {
                            return Err(LoksError::new(
                                ErrorKind::NameError(format!(
                                    "assignment to undeclared identifier '{name}'"
                                )),
                                *span,
                            ));
                        }
                    }
                    LValue::Index { base, index } => {
                        let array = self.eval_expr(env, base)?;
                        let index = self.eval_expr(env, index)?;
                        value::index_set(&array, &index, value)
                            .map_err(|e| LoksError::new(e, *span))?;
                    }
                }
                Ok(Signal::Normal)
            }
            Stmt::If { arms, else_body, .. } => {
                for arm in arms {
                    let cond = self.eval_expr(env, &arm.cond)?;
                    if truthy(&cond) {
                        return self.exec_block(env, &arm.body);
                    }
                }
                match else_body {
                    Some(else_body) => self.exec_block(env, else_body),
                    None => Ok(Signal::Normal),
                }
            }
            Stmt::While { cond, body, .. } => {
                while truthy(&self.eval_expr(env, cond)?) {
                    match self.exec_block(env, body)? {
                        Signal::Normal | Signal::Continue => {}
                        Signal::Break => break,
                        ret @ Signal::Return(_) => return Ok(ret),
                    }
                }
                Ok(Signal::Normal)
            }
            Stmt::Return { value, .. } => {
                let value = match value {
                    Some(expr) => self.eval_expr(env, expr)?,
                    None => Value::Nil,
                };
                Ok(Signal::Return(value))
            }
            Stmt::Continue { .. } => Ok(Signal::Continue),
            Stmt::Break { .. } => Ok(Signal::Break),
            Stmt::ExprStmt { expr, .. } => {
                self.eval_expr(env, expr)?;
                Ok(Signal::Normal)
            }
            Stmt::BlockStmt(block) => self.exec_block(env, block),
        }
    }

    /// Every block (loop/conditional body) opens its own child scope, so
    /// `var` declarations inside an `if`/`while` body shadow rather than
    /// leak into the enclosing scope — matching the analyzer's and
    /// compiler's own per-block scoping.
    fn exec_block(&mut self, parent: &Environment, block: &Block) -> Result<Signal, LoksError> {
        let child = Environment::child_of(parent);
        self.exec_decls(&child, &block.decls)
    }

    fn eval_expr(&mut self, env: &Environment, expr: &Expr) -> Result<Value, LoksError> {
        let span = expr.span;
        match &expr.kind {
            ExprKind::Number(NumberLit::Integer(n)) => Ok(Value::Number(Number::Integer(*n))),
            ExprKind::Number(NumberLit::Double(d)) => Ok(Value::Number(Number::Double(*d))),
            ExprKind::String(s) => Ok(Value::string(s.clone())),
            ExprKind::True => Ok(Value::Boolean(true)),
            ExprKind::False => Ok(Value::Boolean(false)),
            ExprKind::Nil => Ok(Value::Nil),
            ExprKind::Identifier(name) => env.get(*name).ok_or_else(|| {
                LoksError::new(
                    ErrorKind::NameError(format!("undeclared identifier '{name}'")),
                    span,
                )
            }),
            ExprKind::Array(elems) => {
                let mut items = Vec::with_capacity(elems.len());
                for elem in elems {
                    items.push(self.eval_expr(env, elem)?);
                }
                Ok(Value::array(items))
            }
            ExprKind::ArrayAccess { base, index } => {
                let array = self.eval_expr(env, base)?;
                let index = self.eval_expr(env, index)?;
                value::index_get(&array, &index).map_err(|e| LoksError::new(e, span))
            }
            ExprKind::Call { callee, args } => self.eval_call(env, callee, args, span),
            ExprKind::BinOp { kind, left, right } => self.eval_binop(env, *kind, left, right, span),
            ExprKind::UnaryOp { kind, expr: inner } => {
                let value = self.eval_expr(env, inner)?;
                match kind {
                    UnOpKind::Not => Ok(value::not(&value)),
                    UnOpKind::Neg => value::negate(&value).map_err(|e| LoksError::new(e, span)),
                }
            }
        }
    }

    /// `and`/`or` short-circuit: the right operand is only evaluated when
    /// the left one doesn't already decide the result.
    fn eval_binop(
        &mut self,
        env: &Environment,
        kind: BinOpKind,
        left: &Expr,
        right: &Expr,
        span: Span,
    ) -> Result<Value, LoksError> {
        if matches!(kind, BinOpKind::Or | BinOpKind::And) {
            let left = truthy(&self.eval_expr(env, left)?);
            if (kind == BinOpKind::Or && left) || (kind == BinOpKind::And && !left) {
                return Ok(Value::Boolean(left));
            }
            let right = truthy(&self.eval_expr(env, right)?);
            return Ok(Value::Boolean(right));
        }

        let left = self.eval_expr(env, left)?;
        let right = self.eval_expr(env, right)?;
        let wrap = |e: ErrorKind| LoksError::new(e, span);
        match kind {
            BinOpKind::Add => value::add(&left, &right).map_err(wrap),
            BinOpKind::Sub => value::sub(&left, &right).map_err(wrap),
            BinOpKind::Mul => value::mul(&left, &right).map_err(wrap),
            BinOpKind::Div => value::div(&left, &right).map_err(wrap),
            BinOpKind::Mod => value::modulo(&left, &right).map_err(wrap),
            BinOpKind::Eq => value::equals(&left, &right).map(Value::Boolean).map_err(wrap),
            BinOpKind::Ne => value::not_equals(&left, &right).map(Value::Boolean).map_err(wrap),
            BinOpKind::Gt => value::greater_than(&left, &right).map(Value::Boolean).map_err(wrap),
            BinOpKind::Ge => value::greater_equal(&left, &right).map(Value::Boolean).map_err(wrap),
            BinOpKind::Lt => value::less_than(&left, &right).map(Value::Boolean).map_err(wrap),
            BinOpKind::Le => value::less_equal(&left, &right).map(Value::Boolean).map_err(wrap),
            BinOpKind::Or | BinOpKind::And => unreachable!("handled above"),
        }
    }

    fn eval_call(
        &mut self,
        env: &Environment,
        callee: &Expr,
        args: &[Expr],
        span: Span,
    ) -> Result<Value, LoksError> {
        let ExprKind::Identifier(name) = callee.kind else {
            return Err(LoksError::new(
                ErrorKind::TypeError("call target must be a function name".into()),
                span,
            ));
        };

        let mut arg_values = Vec::with_capacity(args.len());
        for arg in args {
            arg_values.push(self.eval_expr(env, arg)?);
        }

        if let Some(index) = builtin_index(name.as_str()) {
            return call_builtin(index, &arg_values, self.io).map_err(|e| LoksError::new(e, span));
        }

        let callee_value = env.get(name).ok_or_else(|| {
            LoksError::new(ErrorKind::NameError(format!("undeclared identifier '{name}'")), span)
        })?;
        let Value::Function(function) = callee_value else {
            return Err(LoksError::new(
                ErrorKind::TypeError(format!("'{name}' is not callable")),
                span,
            ));
        };
        if function.params.len() != arg_values.len() {
            return Err(LoksError::new(
                ErrorKind::TypeError(format!(
                    "'{name}' expects {} argument(s), got {}",
                    function.params.len(),
                    arg_values.len()
                )),
                span,
            ));
        }

        let call_env = Environment::child_of(&function.closure);
        for (param, value) in function.params.iter().zip(arg_values) {
            call_env.define(*param, value);
        }
        match self.exec_decls(&call_env, &function.body.decls)? {
            Signal::Return(value) => Ok(value),
            _ => Ok(Value::Nil),
        }
    }
}
