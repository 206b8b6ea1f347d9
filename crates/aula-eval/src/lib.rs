//! Aula tree-walking evaluator.
//!
//! Runs a [`Program`](aula_types::ast::Program) directly from its AST:
//! lexically scoped variables, typed scalars, vectors and matrices, control
//! flow, and user-defined functions with default and named arguments.
//!
//! Semantic errors never stop a run. They are recorded as diagnostics and
//! the failing node evaluates to Null. Only the step budget and the call
//! depth limit abort a run.

mod array;
mod builtins;
mod call;
mod config;
mod env;
mod error;
mod evaluator;
mod exec;
mod ops;
mod report;
mod value;

pub use array::{Array, ArrayStore, Shape};
pub use config::InterpreterConfig;
pub use env::{ScopeId, ScopeTree, Symbol};
pub use error::{EvalError, EvalResult, SemanticError};
pub use evaluator::Interpreter;
pub use exec::{echo_text, Flow, Returned};
pub use report::{RunOutput, SymbolEntry};
pub use value::{ArrayRef, Value};

use aula_types::ast::Program;

/// Run `program` with the default limits.
pub fn interpret(program: &Program) -> RunOutput {
    Interpreter::new().run(program)
}
