//! Shared types for the Aula interpreter.
//!
//! This crate holds everything the parser and the evaluator have to agree on:
//! - [`Span`]: source positions attached to every node
//! - [`DataType`]: the closed set of runtime kinds
//! - [`ast`]: the expression and instruction trees
//! - [`Diagnostic`] / [`ErrorCode`]: coded, serializable diagnostics

mod data_type;
mod error;
mod span;
pub mod ast;

pub use data_type::DataType;
pub use error::{Diagnostic, Diagnostics, ErrorCategory, ErrorCode};
pub use span::Span;
