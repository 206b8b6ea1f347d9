//! AST builders shared by the integration tests.
//!
//! Nodes built without an explicit line sit at 1:1.

#![allow(dead_code)]

use aula_eval::{Interpreter, InterpreterConfig, RunOutput};
use aula_types::ast::*;
use aula_types::{DataType, ErrorCode, Span};

pub fn sp() -> Span {
    Span::point(1, 1)
}

pub fn at(line: u32) -> Span {
    Span::point(line, 1)
}

/// Install a subscriber so `RUST_LOG=aula_eval=trace` shows evaluator logs.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn run(instrs: Vec<Instr>) -> RunOutput {
    init_tracing();
    Interpreter::new().run(&Program::new(instrs))
}

pub fn run_with(config: InterpreterConfig, instrs: Vec<Instr>) -> RunOutput {
    init_tracing();
    Interpreter::with_config(config).run(&Program::new(instrs))
}

pub fn codes(out: &RunOutput) -> Vec<ErrorCode> {
    out.diagnostics.iter().map(|d| d.code).collect()
}

// ══════════════════════════════════════════════════════════════════════════════
// Expressions
// ══════════════════════════════════════════════════════════════════════════════

fn e(kind: ExprKind) -> Expr {
    Expr::new(kind, sp())
}

pub fn int(n: i64) -> Expr {
    e(ExprKind::Literal(Literal::Integer(n)))
}

pub fn dec(d: f64) -> Expr {
    e(ExprKind::Literal(Literal::Decimal(d)))
}

pub fn boolean(b: bool) -> Expr {
    e(ExprKind::Literal(Literal::Boolean(b)))
}

pub fn chr(c: char) -> Expr {
    e(ExprKind::Literal(Literal::Char(c)))
}

pub fn string(s: &str) -> Expr {
    e(ExprKind::Literal(Literal::String(s.to_string())))
}

pub fn null() -> Expr {
    e(ExprKind::Literal(Literal::Null))
}

pub fn var(name: &str) -> Expr {
    e(ExprKind::Access(Ident::new(name, sp())))
}

pub fn var_at(name: &str, line: u32) -> Expr {
    Expr::new(ExprKind::Access(Ident::new(name, at(line))), at(line))
}

pub fn item(name: &str, index: Expr) -> Expr {
    e(ExprKind::VectorAccess {
        name: Ident::new(name, sp()),
        index: Box::new(index),
    })
}

pub fn cell(name: &str, row: Expr, col: Expr) -> Expr {
    e(ExprKind::MatrixAccess {
        name: Ident::new(name, sp()),
        row: Box::new(row),
        col: Box::new(col),
    })
}

pub fn arith(left: Expr, op: ArithOp, right: Expr) -> Expr {
    e(ExprKind::Arithmetic {
        left: Box::new(left),
        op,
        right: Box::new(right),
    })
}

pub fn rel(left: Expr, op: RelOp, right: Expr) -> Expr {
    e(ExprKind::Relational {
        left: Box::new(left),
        op,
        right: Box::new(right),
    })
}

pub fn logic(left: Expr, op: LogicOp, right: Expr) -> Expr {
    e(ExprKind::Logical {
        left: Box::new(left),
        op,
        right: Box::new(right),
    })
}

pub fn neg(operand: Expr) -> Expr {
    e(ExprKind::Negate(Box::new(operand)))
}

pub fn not(operand: Expr) -> Expr {
    e(ExprKind::Not(Box::new(operand)))
}

pub fn ternary(condition: Expr, then_expr: Expr, else_expr: Expr) -> Expr {
    e(ExprKind::Ternary {
        condition: Box::new(condition),
        then_expr: Box::new(then_expr),
        else_expr: Box::new(else_expr),
    })
}

pub fn cast(target: DataType, expr: Expr) -> Expr {
    e(ExprKind::Cast {
        target,
        expr: Box::new(expr),
    })
}

pub fn is_type(expr: Expr, data_type: DataType) -> Expr {
    e(ExprKind::TypeTest {
        expr: Box::new(expr),
        data_type,
    })
}

pub fn builtin(func: Builtin, arg: Expr) -> Expr {
    e(ExprKind::Builtin {
        func,
        args: vec![arg],
    })
}

pub fn call(name: &str, args: Vec<Argument>) -> Expr {
    e(ExprKind::Call(call_expr(name, args)))
}

pub fn call_expr(name: &str, args: Vec<Argument>) -> CallExpr {
    CallExpr {
        name: Ident::new(name, sp()),
        args,
        span: sp(),
    }
}

pub fn pos(value: Expr) -> Argument {
    Argument { name: None, value }
}

pub fn named(name: &str, value: Expr) -> Argument {
    Argument {
        name: Some(Ident::new(name, sp())),
        value,
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Instructions
// ══════════════════════════════════════════════════════════════════════════════

pub fn block(instrs: Vec<Instr>) -> Block {
    Block::new(instrs, sp())
}

pub fn decl(data_type: DataType, name: &str, value: Expr) -> Instr {
    Instr::Declare(Declaration {
        names: vec![Ident::new(name, sp())],
        data_type,
        value: Some(value),
        is_const: false,
        span: sp(),
    })
}

pub fn decl_many(data_type: DataType, names: &[&str], value: Option<Expr>) -> Instr {
    Instr::Declare(Declaration {
        names: names.iter().map(|n| Ident::new(*n, sp())).collect(),
        data_type,
        value,
        is_const: false,
        span: sp(),
    })
}

pub fn decl_at(data_type: DataType, name: &str, value: Expr, line: u32) -> Instr {
    Instr::Declare(Declaration {
        names: vec![Ident::new(name, at(line))],
        data_type,
        value: Some(value),
        is_const: false,
        span: at(line),
    })
}

pub fn constant(data_type: DataType, name: &str, value: Option<Expr>) -> Instr {
    Instr::Declare(Declaration {
        names: vec![Ident::new(name, sp())],
        data_type,
        value,
        is_const: true,
        span: sp(),
    })
}

pub fn assign(name: &str, value: Expr) -> Instr {
    Instr::Assign(Assignment {
        name: Ident::new(name, sp()),
        value,
        span: sp(),
    })
}

pub fn assign_at(name: &str, value: Expr, line: u32) -> Instr {
    Instr::Assign(Assignment {
        name: Ident::new(name, at(line)),
        value,
        span: at(line),
    })
}

pub fn inc(name: &str) -> Instr {
    Instr::IncDec(IncDec {
        name: Ident::new(name, sp()),
        op: IncDecOp::Increment,
        span: sp(),
    })
}

pub fn dec_op(name: &str) -> Instr {
    Instr::IncDec(IncDec {
        name: Ident::new(name, sp()),
        op: IncDecOp::Decrement,
        span: sp(),
    })
}

pub fn vector(elem_type: DataType, name: &str, values: Vec<Expr>) -> Instr {
    Instr::VectorDecl(VectorDecl {
        names: vec![Ident::new(name, sp())],
        elem_type,
        init: VectorInit::Values(values),
        is_const: false,
        span: sp(),
    })
}

pub fn vector_sized(elem_type: DataType, names: &[&str], size: Expr) -> Instr {
    Instr::VectorDecl(VectorDecl {
        names: names.iter().map(|n| Ident::new(*n, sp())).collect(),
        elem_type,
        init: VectorInit::Size(size),
        is_const: false,
        span: sp(),
    })
}

pub fn const_vector(elem_type: DataType, name: &str, values: Vec<Expr>) -> Instr {
    Instr::VectorDecl(VectorDecl {
        names: vec![Ident::new(name, sp())],
        elem_type,
        init: VectorInit::Values(values),
        is_const: true,
        span: sp(),
    })
}

pub fn matrix(elem_type: DataType, name: &str, rows: Vec<Vec<Expr>>) -> Instr {
    Instr::MatrixDecl(MatrixDecl {
        names: vec![Ident::new(name, sp())],
        elem_type,
        init: MatrixInit::Rows(rows),
        is_const: false,
        span: sp(),
    })
}

pub fn matrix_sized(elem_type: DataType, name: &str, rows: Expr, cols: Expr) -> Instr {
    Instr::MatrixDecl(MatrixDecl {
        names: vec![Ident::new(name, sp())],
        elem_type,
        init: MatrixInit::Size { rows, cols },
        is_const: false,
        span: sp(),
    })
}

pub fn set_item(name: &str, index: Expr, value: Expr) -> Instr {
    Instr::VectorAssign(VectorAssign {
        name: Ident::new(name, sp()),
        index,
        value,
        span: sp(),
    })
}

pub fn set_cell(name: &str, row: Expr, col: Expr, value: Expr) -> Instr {
    Instr::MatrixAssign(MatrixAssign {
        name: Ident::new(name, sp()),
        row,
        col,
        value,
        span: sp(),
    })
}

pub fn echo(value: Expr) -> Instr {
    Instr::Echo(Echo { value, span: sp() })
}

pub fn if_else(condition: Expr, then_block: Vec<Instr>, else_block: Option<Vec<Instr>>) -> Instr {
    Instr::If(IfStmt {
        condition,
        then_block: block(then_block),
        else_branch: else_block.map(|b| ElseBranch::Block(block(b))),
        span: sp(),
    })
}

pub fn while_loop(condition: Expr, body: Vec<Instr>) -> Instr {
    Instr::While(WhileStmt {
        condition,
        body: block(body),
        span: sp(),
    })
}

pub fn for_loop(init: Instr, condition: Expr, update: Instr, body: Vec<Instr>) -> Instr {
    Instr::For(ForStmt {
        init: Box::new(init),
        condition,
        update: Box::new(update),
        body: block(body),
        span: sp(),
    })
}

pub fn do_until(body: Vec<Instr>, condition: Expr) -> Instr {
    Instr::DoUntil(DoUntilStmt {
        body: block(body),
        condition,
        span: sp(),
    })
}

pub fn forever(body: Vec<Instr>) -> Instr {
    Instr::Loop(LoopStmt {
        body: block(body),
        span: sp(),
    })
}

pub fn switch(subject: Expr, cases: Vec<(Expr, Vec<Instr>)>, default: Option<Vec<Instr>>) -> Instr {
    Instr::Switch(SwitchStmt {
        subject,
        cases: cases
            .into_iter()
            .map(|(value, body)| SwitchCase {
                value,
                body: block(body),
                span: sp(),
            })
            .collect(),
        default: default.map(block),
        span: sp(),
    })
}

pub fn brk() -> Instr {
    Instr::Break(sp())
}

pub fn cont() -> Instr {
    Instr::Continue(sp())
}

pub fn ret(value: Option<Expr>) -> Instr {
    Instr::Return(ReturnStmt { value, span: sp() })
}

pub fn param(name: &str, data_type: DataType, default: Option<Expr>) -> Param {
    Param {
        name: Ident::new(name, sp()),
        data_type,
        default,
        span: sp(),
    }
}

pub fn function(
    name: &str,
    return_type: Option<DataType>,
    params: Vec<Param>,
    body: Vec<Instr>,
) -> Instr {
    Instr::FunctionDecl(FunctionDecl {
        name: Ident::new(name, sp()),
        return_type,
        params,
        body: block(body),
        span: sp(),
    })
}

pub fn expr_stmt(expr: Expr) -> Instr {
    Instr::Expr(expr)
}

pub fn call_stmt(name: &str, args: Vec<Argument>) -> Instr {
    Instr::Call(call_expr(name, args))
}
