//! AST node types for the Aula language.
//!
//! The parser builds these trees; the evaluator walks them with exhaustive
//! matches. Every node carries a [`Span`] for diagnostics.
//! Large recursive types are boxed to keep enum sizes reasonable.

use crate::{DataType, Span};

// ══════════════════════════════════════════════════════════════════════════════
// Top Level
// ══════════════════════════════════════════════════════════════════════════════

/// A complete program: the ordered top-level instructions.
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub instructions: Vec<Instr>,
    pub span: Span,
}

impl Program {
    pub fn new(instructions: Vec<Instr>) -> Self {
        let span = instructions.first().map(Instr::span).unwrap_or_default();
        Self { instructions, span }
    }
}

/// An ordered instruction sequence sharing the scope it runs in.
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub instrs: Vec<Instr>,
    pub span: Span,
}

impl Block {
    pub fn new(instrs: Vec<Instr>, span: Span) -> Self {
        Self { instrs, span }
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Identifiers
// ══════════════════════════════════════════════════════════════════════════════

/// A spanned identifier.
#[derive(Debug, Clone, PartialEq)]
pub struct Ident {
    pub name: String,
    pub span: Span,
}

impl Ident {
    pub fn new(name: impl Into<String>, span: Span) -> Self {
        Self {
            name: name.into(),
            span,
        }
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Instructions
// ══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq)]
pub enum Instr {
    // ── Bindings ──
    Declare(Declaration),
    Assign(Assignment),
    IncDec(IncDec),
    VectorDecl(VectorDecl),
    MatrixDecl(MatrixDecl),
    VectorAssign(VectorAssign),
    MatrixAssign(MatrixAssign),

    // ── Output ──
    Echo(Echo),

    // ── Control Flow ──
    If(IfStmt),
    While(WhileStmt),
    For(ForStmt),
    DoUntil(DoUntilStmt),
    Loop(LoopStmt),
    Switch(SwitchStmt),
    Break(Span),
    Continue(Span),
    Return(ReturnStmt),

    // ── Functions ──
    FunctionDecl(FunctionDecl),
    Call(CallExpr),

    /// An expression evaluated for its side effects.
    Expr(Expr),
}

impl Instr {
    pub fn span(&self) -> Span {
        match self {
            Instr::Declare(d) => d.span,
            Instr::Assign(a) => a.span,
            Instr::IncDec(i) => i.span,
            Instr::VectorDecl(v) => v.span,
            Instr::MatrixDecl(m) => m.span,
            Instr::VectorAssign(v) => v.span,
            Instr::MatrixAssign(m) => m.span,
            Instr::Echo(e) => e.span,
            Instr::If(i) => i.span,
            Instr::While(w) => w.span,
            Instr::For(f) => f.span,
            Instr::DoUntil(d) => d.span,
            Instr::Loop(l) => l.span,
            Instr::Switch(s) => s.span,
            Instr::Break(span) | Instr::Continue(span) => *span,
            Instr::Return(r) => r.span,
            Instr::FunctionDecl(f) => f.span,
            Instr::Call(c) => c.span,
            Instr::Expr(e) => e.span,
        }
    }
}

// ── Bindings ──────────────────────────────────────────────────────────────────

/// `[const] type a, b, c [= value];`
#[derive(Debug, Clone, PartialEq)]
pub struct Declaration {
    pub names: Vec<Ident>,
    pub data_type: DataType,
    pub value: Option<Expr>,
    pub is_const: bool,
    pub span: Span,
}

/// `name = value;`
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    pub name: Ident,
    pub value: Expr,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IncDecOp {
    Increment,
    Decrement,
}

/// `name++;` / `name--;`
#[derive(Debug, Clone, PartialEq)]
pub struct IncDec {
    pub name: Ident,
    pub op: IncDecOp,
    pub span: Span,
}

/// `type[] a, b = new type[size];` or `= [v1, v2, ...];`
#[derive(Debug, Clone, PartialEq)]
pub struct VectorDecl {
    pub names: Vec<Ident>,
    pub elem_type: DataType,
    pub init: VectorInit,
    pub is_const: bool,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum VectorInit {
    /// Filled with the element type's default value.
    Size(Expr),
    Values(Vec<Expr>),
}

/// `type[][] m = new type[rows][cols];` or `= [[..], [..]];`
#[derive(Debug, Clone, PartialEq)]
pub struct MatrixDecl {
    pub names: Vec<Ident>,
    pub elem_type: DataType,
    pub init: MatrixInit,
    pub is_const: bool,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MatrixInit {
    Size { rows: Expr, cols: Expr },
    Rows(Vec<Vec<Expr>>),
}

/// `name[index] = value;`
#[derive(Debug, Clone, PartialEq)]
pub struct VectorAssign {
    pub name: Ident,
    pub index: Expr,
    pub value: Expr,
    pub span: Span,
}

/// `name[row][col] = value;`
#[derive(Debug, Clone, PartialEq)]
pub struct MatrixAssign {
    pub name: Ident,
    pub row: Expr,
    pub col: Expr,
    pub value: Expr,
    pub span: Span,
}

/// `echo value;`
#[derive(Debug, Clone, PartialEq)]
pub struct Echo {
    pub value: Expr,
    pub span: Span,
}

// ── Control Flow ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct IfStmt {
    pub condition: Expr,
    pub then_block: Block,
    pub else_branch: Option<ElseBranch>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ElseBranch {
    ElseIf(Box<IfStmt>),
    Block(Block),
}

#[derive(Debug, Clone, PartialEq)]
pub struct WhileStmt {
    pub condition: Expr,
    pub body: Block,
    pub span: Span,
}

/// `for (init; condition; update) body`
#[derive(Debug, Clone, PartialEq)]
pub struct ForStmt {
    pub init: Box<Instr>,
    pub condition: Expr,
    pub update: Box<Instr>,
    pub body: Block,
    pub span: Span,
}

/// `do body until (condition);` repeats while the condition is false.
#[derive(Debug, Clone, PartialEq)]
pub struct DoUntilStmt {
    pub body: Block,
    pub condition: Expr,
    pub span: Span,
}

/// `loop body`, left only through `break` or `return`.
#[derive(Debug, Clone, PartialEq)]
pub struct LoopStmt {
    pub body: Block,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SwitchStmt {
    pub subject: Expr,
    pub cases: Vec<SwitchCase>,
    pub default: Option<Block>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SwitchCase {
    pub value: Expr,
    pub body: Block,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReturnStmt {
    pub value: Option<Expr>,
    pub span: Span,
}

// ── Functions ─────────────────────────────────────────────────────────────────

/// A function (typed return) or procedure (`return_type: None`).
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDecl {
    pub name: Ident,
    pub return_type: Option<DataType>,
    pub params: Vec<Param>,
    pub body: Block,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: Ident,
    pub data_type: DataType,
    /// Evaluated in the call scope when no argument is supplied.
    pub default: Option<Expr>,
    pub span: Span,
}

/// `name(arg, other = value)`
#[derive(Debug, Clone, PartialEq)]
pub struct CallExpr {
    pub name: Ident,
    pub args: Vec<Argument>,
    pub span: Span,
}

/// A positional argument, or a named one when `name` is set.
#[derive(Debug, Clone, PartialEq)]
pub struct Argument {
    pub name: Option<Ident>,
    pub value: Expr,
}

// ══════════════════════════════════════════════════════════════════════════════
// Expressions
// ══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

impl Expr {
    pub fn new(kind: ExprKind, span: Span) -> Self {
        Self { kind, span }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    // ── Literals ──
    Literal(Literal),

    // ── Access ──
    Access(Ident),
    VectorAccess {
        name: Ident,
        index: Box<Expr>,
    },
    MatrixAccess {
        name: Ident,
        row: Box<Expr>,
        col: Box<Expr>,
    },

    // ── Operators ──
    Arithmetic {
        left: Box<Expr>,
        op: ArithOp,
        right: Box<Expr>,
    },
    Negate(Box<Expr>),
    Relational {
        left: Box<Expr>,
        op: RelOp,
        right: Box<Expr>,
    },
    Logical {
        left: Box<Expr>,
        op: LogicOp,
        right: Box<Expr>,
    },
    Not(Box<Expr>),
    /// The condition must be a relational, logical or `not` node.
    Ternary {
        condition: Box<Expr>,
        then_expr: Box<Expr>,
        else_expr: Box<Expr>,
    },
    Cast {
        target: DataType,
        expr: Box<Expr>,
    },
    /// `expr is type`
    TypeTest {
        expr: Box<Expr>,
        data_type: DataType,
    },

    // ── Calls ──
    Call(CallExpr),
    Builtin {
        func: Builtin,
        args: Vec<Expr>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Integer(i64),
    Decimal(f64),
    Boolean(bool),
    Char(char),
    String(String),
    Null,
}

// ── Operators ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithOp {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
    /// `radicand √ index`
    Root,
    Mod,
}

impl ArithOp {
    /// Returns the operator symbol for error messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            ArithOp::Add => "+",
            ArithOp::Sub => "-",
            ArithOp::Mul => "*",
            ArithOp::Div => "/",
            ArithOp::Pow => "^",
            ArithOp::Root => "√",
            ArithOp::Mod => "%",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelOp {
    Eq,
    NotEq,
    Less,
    Greater,
    LessEq,
    GreaterEq,
}

impl RelOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            RelOp::Eq => "==",
            RelOp::NotEq => "!=",
            RelOp::Less => "<",
            RelOp::Greater => ">",
            RelOp::LessEq => "<=",
            RelOp::GreaterEq => ">=",
        }
    }

    /// `true` for `==` and `!=`.
    pub fn is_equality(&self) -> bool {
        matches!(self, RelOp::Eq | RelOp::NotEq)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicOp {
    And,
    Or,
}

impl LogicOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogicOp::And => "and",
            LogicOp::Or => "or",
        }
    }
}

/// Native functions the language exposes by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    // Aggregates over arrays
    Sum,
    Average,
    Min,
    Max,
    Reverse,
    Length,
    // Conversions
    Round,
    Truncate,
    Upper,
    Lower,
    ToString,
    ToCharArray,
}

impl Builtin {
    pub fn as_str(&self) -> &'static str {
        match self {
            Builtin::Sum => "sum",
            Builtin::Average => "average",
            Builtin::Min => "min",
            Builtin::Max => "max",
            Builtin::Reverse => "reverse",
            Builtin::Length => "length",
            Builtin::Round => "round",
            Builtin::Truncate => "truncate",
            Builtin::Upper => "upper",
            Builtin::Lower => "lower",
            Builtin::ToString => "toString",
            Builtin::ToCharArray => "toCharArray",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_program_span_from_first_instruction() {
        let prog = Program::new(vec![Instr::Break(Span::point(3, 1))]);
        assert_eq!(prog.span, Span::point(3, 1));
        assert_eq!(Program::new(vec![]).span, Span::default());
    }

    #[test]
    fn test_operator_symbols() {
        assert_eq!(ArithOp::Root.as_str(), "√");
        assert_eq!(RelOp::GreaterEq.as_str(), ">=");
        assert!(RelOp::NotEq.is_equality());
        assert!(!RelOp::Less.is_equality());
        assert_eq!(Builtin::ToCharArray.as_str(), "toCharArray");
    }
}
