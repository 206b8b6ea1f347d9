//! Evaluation errors.
//!
//! [`SemanticError`] is recoverable: the evaluator records it as a diagnostic
//! and keeps going. [`EvalError`] aborts the whole run.

use aula_types::{DataType, ErrorCode};
use thiserror::Error;

/// A semantic check that failed at one node.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SemanticError {
    #[error("undeclared identifier `{name}`")]
    UndeclaredIdentifier { name: String },

    #[error("`{name}` is already declared in this scope")]
    DuplicateDeclaration { name: String },

    #[error("cannot assign to constant `{name}`")]
    ConstViolation { name: String },

    #[error("type mismatch: {0}")]
    TypeMismatch(String),

    #[error("incompatible types: {0}")]
    IncompatibleTypes(String),

    #[error("unsupported operator: {0}")]
    UnsupportedOperator(String),

    #[error("cannot cast {from} to {to}")]
    UnsupportedCast { from: DataType, to: DataType },

    #[error("division by zero")]
    DivisionByZero,

    #[error("root index must be positive, found {index}")]
    InvalidRootIndex { index: f64 },

    #[error("index {index} is out of bounds for length {len}")]
    IndexOutOfBounds { index: i64, len: usize },

    #[error("array index must be Integer, found {found}")]
    InvalidIndexType { found: DataType },

    #[error("`{func}` of an empty array")]
    EmptyArray { func: &'static str },

    #[error("{0}")]
    ConditionTypeError(String),

    #[error("function `{name}` is already declared")]
    DuplicateFunction { name: String },

    #[error("undefined function `{name}`")]
    UndefinedFunction { name: String },

    #[error("`{name}` takes {expected} argument(s) but {received} were supplied")]
    TooManyArguments {
        name: String,
        expected: usize,
        received: usize,
    },

    #[error("missing argument `{param}` in call to `{name}`")]
    MissingArgument { name: String, param: String },

    #[error("`{name}` must return {expected}, found {found}")]
    ReturnTypeMismatch {
        name: String,
        expected: String,
        found: DataType,
    },

    #[error("function `{name}` must return a {expected} value")]
    MissingReturnValue { name: String, expected: DataType },

    #[error("constant `{name}` must be initialized")]
    UninitializedConstant { name: String },

    #[error("`{name}` has no parameter named `{param}`")]
    UnknownParameter { name: String, param: String },

    #[error("invalid array dimensions: {0}")]
    InvalidDimensions(String),

    #[error("arithmetic trap: {0}")]
    ArithmeticTrap(String),

    #[error("`{keyword}` outside of {context}")]
    MisplacedTransfer {
        keyword: &'static str,
        context: &'static str,
    },
}

impl SemanticError {
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::UndeclaredIdentifier { .. } => ErrorCode::UNDECLARED_IDENTIFIER,
            Self::DuplicateDeclaration { .. } => ErrorCode::DUPLICATE_DECLARATION,
            Self::ConstViolation { .. } => ErrorCode::CONST_VIOLATION,
            Self::TypeMismatch(_) => ErrorCode::TYPE_MISMATCH,
            Self::IncompatibleTypes(_) => ErrorCode::INCOMPATIBLE_TYPES,
            Self::UnsupportedOperator(_) => ErrorCode::UNSUPPORTED_OPERATOR,
            Self::UnsupportedCast { .. } => ErrorCode::UNSUPPORTED_CAST,
            Self::DivisionByZero => ErrorCode::DIVISION_BY_ZERO,
            Self::InvalidRootIndex { .. } => ErrorCode::INVALID_ROOT_INDEX,
            Self::IndexOutOfBounds { .. } => ErrorCode::INDEX_OUT_OF_BOUNDS,
            Self::InvalidIndexType { .. } => ErrorCode::INVALID_INDEX_TYPE,
            Self::EmptyArray { .. } => ErrorCode::EMPTY_ARRAY,
            Self::ConditionTypeError(_) => ErrorCode::CONDITION_TYPE_ERROR,
            Self::DuplicateFunction { .. } => ErrorCode::DUPLICATE_FUNCTION,
            Self::UndefinedFunction { .. } => ErrorCode::UNDEFINED_FUNCTION,
            Self::TooManyArguments { .. } => ErrorCode::TOO_MANY_ARGUMENTS,
            Self::MissingArgument { .. } => ErrorCode::MISSING_ARGUMENT,
            Self::ReturnTypeMismatch { .. } => ErrorCode::RETURN_TYPE_MISMATCH,
            Self::MissingReturnValue { .. } => ErrorCode::MISSING_RETURN_VALUE,
            Self::UninitializedConstant { .. } => ErrorCode::UNINITIALIZED_CONSTANT,
            Self::UnknownParameter { .. } => ErrorCode::UNKNOWN_PARAMETER,
            Self::InvalidDimensions(_) => ErrorCode::INVALID_DIMENSIONS,
            Self::ArithmeticTrap(_) => ErrorCode::ARITHMETIC_TRAP,
            Self::MisplacedTransfer { .. } => ErrorCode::MISPLACED_TRANSFER,
        }
    }
}

/// A structural failure that stops the run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvalError {
    #[error("step limit of {limit} exceeded")]
    StepLimitExceeded { limit: u64 },

    #[error("call depth limit of {limit} exceeded")]
    CallDepthExceeded { limit: usize },
}

impl EvalError {
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::StepLimitExceeded { .. } => ErrorCode::STEP_LIMIT_EXCEEDED,
            Self::CallDepthExceeded { .. } => ErrorCode::CALL_DEPTH_EXCEEDED,
        }
    }
}

/// Result type for evaluation: only structural failures travel in `Err`.
pub type EvalResult<T> = Result<T, EvalError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        let err = SemanticError::TooManyArguments {
            name: "area".into(),
            expected: 2,
            received: 3,
        };
        assert_eq!(
            err.to_string(),
            "`area` takes 2 argument(s) but 3 were supplied"
        );
        assert_eq!(
            SemanticError::UnsupportedCast {
                from: DataType::Boolean,
                to: DataType::Integer
            }
            .to_string(),
            "cannot cast Boolean to Integer"
        );
    }

    #[test]
    fn test_codes_are_semantic() {
        use aula_types::ErrorCategory;
        assert_eq!(SemanticError::DivisionByZero.code(), ErrorCode::DIVISION_BY_ZERO);
        assert_eq!(
            EvalError::StepLimitExceeded { limit: 10 }.code().category(),
            ErrorCategory::Semantic
        );
    }
}
