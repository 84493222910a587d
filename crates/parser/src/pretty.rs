//! Re-renders an AST back into source text.
//!
//! Exists so the parser can be checked for the property that valid source
//! round-trips through parse → pretty-print → parse to the same shape
//! (spans aside): see the `round_trip` test module for that check. Not
//! meant to reproduce the original formatting, only a parseable
//! normal form.

use crate::ast::{
    BinOpKind, Block, ConditionalArm, Decl, Expr, ExprKind, FunDecl, LValue, NumberLit, Program,
    Stmt, UnOpKind, VarDecl,
};
use std::fmt::Write as _;

/// Renders a whole program as LOKS source text.
pub fn print_program(program: &Program) -> String {
    let mut out = String::new();
    for decl in program {
        print_decl(&mut out, decl);
        out.push('\n');
    }
    out
}

fn print_decl(out: &mut String, decl: &Decl) {
    match decl {
        Decl::Var(v) => print_var_decl(out, v),
        Decl::Fun(f) => print_fun_decl(out, f),
        Decl::Stmt(s) => print_stmt(out, s),
    }
}

fn print_var_decl(out: &mut String, v: &VarDecl) {
    write!(out, "var {}", v.name.as_str()).unwrap();
    if let Some(init) = &v.init {
        out.push_str(" = ");
        print_expr(out, init);
    }
    out.push_str(";");
}

fn print_fun_decl(out: &mut String, f: &FunDecl) {
    write!(out, "fun {}(", f.name.as_str()).unwrap();
    for (i, param) in f.params.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        out.push_str(param.as_str());
    }
    out.push(')');
    print_block(out, &f.body);
}

fn print_block(out: &mut String, block: &Block) {
    out.push_str(" { ");
    for decl in &block.decls {
        print_decl(out, decl);
        out.push(' ');
    }
    out.push('}');
}

fn print_conditional_arm(out: &mut String, keyword: &str, arm: &ConditionalArm) {
    write!(out, "{keyword} (").unwrap();
    print_expr(out, &arm.cond);
    out.push(')');
    print_block(out, &arm.body);
}

fn print_stmt(out: &mut String, stmt: &Stmt) {
    match stmt {
        Stmt::Assign { target, value, .. } => {
            print_lvalue(out, target);
            out.push_str(" = ");
            print_expr(out, value);
            out.push(';');
        }
        Stmt::If { arms, else_body, .. } => {
            for (i, arm) in arms.iter().enumerate() {
                if i > 0 {
                    out.push(' ');
                }
                print_conditional_arm(out, if i == 0 { "if" } else { "elsif" }, arm);
            }
            if let Some(else_body) = else_body {
                out.push_str(" else");
                print_block(out, else_body);
            }
        }
        Stmt::While { cond, body, .. } => {
            out.push_str("while (");
            print_expr(out, cond);
            out.push(')');
            print_block(out, body);
        }
        Stmt::Return { value, .. } => {
            out.push_str("return");
            if let Some(value) = value {
                out.push(' ');
                print_expr(out, value);
            }
            out.push(';');
        }
        Stmt::Continue { .. } => out.push_str("continue;"),
        Stmt::Break { .. } => out.push_str("break;"),
        Stmt::ExprStmt { expr, .. } => {
            print_expr(out, expr);
            out.push(';');
        }
        Stmt::BlockStmt(block) => print_block(out, block),
    }
}

fn print_lvalue(out: &mut String, lvalue: &LValue) {
    match lvalue {
        LValue::Identifier(name) => out.push_str(name.as_str()),
        LValue::Index { base, index } => {
            print_expr(out, base);
            out.push('[');
            print_expr(out, index);
            out.push(']');
        }
    }
}

fn print_expr(out: &mut String, expr: &Expr) {
    match &expr.kind {
        ExprKind::Number(NumberLit::Integer(n)) => write!(out, "{n}").unwrap(),
        ExprKind::Number(NumberLit::Double(d)) => write!(out, "{d}").unwrap(),
        ExprKind::String(s) => write!(out, "{s:?}").unwrap(),
        ExprKind::True => out.push_str("true"),
        ExprKind::False => out.push_str("false"),
        ExprKind::Nil => out.push_str("nil"),
        ExprKind::Identifier(sym) => out.push_str(sym.as_str()),
        ExprKind::Array(elems) => {
            out.push('[');
            for (i, elem) in elems.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                print_expr(out, elem);
            }
            out.push(']');
        }
        ExprKind::ArrayAccess { base, index } => {
            out.push('(');
            print_expr(out, base);
            out.push(')');
            out.push('[');
            print_expr(out, index);
            out.push(']');
        }
        ExprKind::Call { callee, args } => {
            out.push('(');
            print_expr(out, callee);
            out.push(')');
            out.push('(');
            for (i, arg) in args.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                print_expr(out, arg);
            }
            out.push(')');
        }
        ExprKind::BinOp { kind, left, right } => {
            out.push('(');
            print_expr(out, left);
            write!(out, " {} ", binop_symbol(*kind)).unwrap();
            print_expr(out, right);
            out.push(')');
        }
        ExprKind::UnaryOp { kind, expr } => {
            out.push_str(unop_symbol(*kind));
            out.push('(');
            print_expr(out, expr);
            out.push(')');
        }
    }
}

fn binop_symbol(kind: BinOpKind) -> &'static str {
    match kind {
        BinOpKind::Or => "or",
        BinOpKind::And => "and",
        BinOpKind::Eq => "==",
        BinOpKind::Ne => "!=",
        BinOpKind::Gt => ">",
        BinOpKind::Ge => ">=",
        BinOpKind::Lt => "<",
        BinOpKind::Le => "<=",
        BinOpKind::Add => "+",
        BinOpKind::Sub => "-",
        BinOpKind::Mul => "*",
        BinOpKind::Div => "/",
        BinOpKind::Mod => "%",
    }
}

fn unop_symbol(kind: UnOpKind) -> &'static str {
    match kind {
        UnOpKind::Not => "!",
        UnOpKind::Neg => "-",
    }
}
