//! Interpreter context and expression evaluation.

use crate::array::{ArrayStore, Shape};
use crate::builtins;
use crate::config::InterpreterConfig;
use crate::env::{ScopeId, ScopeTree};
use crate::error::{EvalError, EvalResult, SemanticError};
use crate::exec::Flow;
use crate::ops;
use crate::report::{self, RunOutput, SymbolEntry};
use crate::value::{ArrayRef, Value};
use aula_types::ast::*;
use aula_types::{Diagnostic, Diagnostics, Span};
use tracing::{debug, warn};

/// Walks a [`Program`] and owns all state of the current run.
///
/// Every call to [`run`](Self::run) starts from a fresh scope tree, array
/// store, output buffer and diagnostics list. After a run the results stay
/// readable until the next one.
#[derive(Debug)]
pub struct Interpreter {
    config: InterpreterConfig,
    pub(crate) scopes: ScopeTree,
    pub(crate) arrays: ArrayStore,
    pub(crate) output: Vec<String>,
    pub(crate) diagnostics: Diagnostics,
    /// Steps taken so far in this run.
    steps: u64,
    pub(crate) call_depth: usize,
}

impl Interpreter {
    pub fn new() -> Self {
        Self::with_config(InterpreterConfig::default())
    }

    pub fn with_config(config: InterpreterConfig) -> Self {
        Self {
            config,
            scopes: ScopeTree::new(),
            arrays: ArrayStore::new(),
            output: Vec::new(),
            diagnostics: Diagnostics::new(),
            steps: 0,
            call_depth: 0,
        }
    }

    pub fn config(&self) -> &InterpreterConfig {
        &self.config
    }

    /// Execute every top-level instruction of `program` in the global scope.
    pub fn run(&mut self, program: &Program) -> RunOutput {
        self.reset();
        debug!(
            instructions = program.instructions.len(),
            "interpretation started"
        );

        let global = self.scopes.global();
        let mut completed = true;
        for instr in &program.instructions {
            match self.exec_instr(instr, global) {
                Ok(Flow::Next) => {}
                Ok(flow) => self.misplaced(&flow, "a loop or function"),
                Err(err) => {
                    warn!(error = %err, "interpretation aborted");
                    self.diagnostics
                        .push(Diagnostic::new(err.code(), err.to_string(), instr.span()));
                    completed = false;
                    break;
                }
            }
        }

        debug!(
            lines = self.output.len(),
            diagnostics = self.diagnostics.len(),
            steps = self.steps,
            completed,
            "interpretation finished"
        );
        RunOutput {
            output: self.output.clone(),
            diagnostics: self.diagnostics.iter().cloned().collect(),
            completed,
        }
    }

    fn reset(&mut self) {
        self.scopes = ScopeTree::new();
        self.arrays.clear();
        self.output.clear();
        self.diagnostics.clear();
        self.steps = 0;
        self.call_depth = 0;
    }

    /// Lines echoed by the last run.
    pub fn output(&self) -> &[String] {
        &self.output
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    /// Flattened symbol and function table of the last run.
    pub fn symbol_table(&self) -> Vec<SymbolEntry> {
        report::symbol_table(&self.scopes, &self.arrays)
    }

    pub fn scopes(&self) -> &ScopeTree {
        &self.scopes
    }

    pub fn arrays(&self) -> &ArrayStore {
        &self.arrays
    }

    /// Consume one step. Returns error if the budget is exhausted.
    pub(crate) fn tick(&mut self) -> EvalResult<()> {
        self.steps += 1;
        if self.steps > self.config.max_steps {
            Err(EvalError::StepLimitExceeded {
                limit: self.config.max_steps,
            })
        } else {
            Ok(())
        }
    }

    // ══════════════════════════════════════════════════════════════════════
    // Diagnostics
    // ══════════════════════════════════════════════════════════════════════

    /// Record `err` at `span`.
    pub(crate) fn report(&mut self, err: SemanticError, span: Span) {
        let diagnostic = Diagnostic::new(err.code(), err.to_string(), span);
        debug!(%diagnostic, "semantic error");
        self.diagnostics.push(diagnostic);
    }

    /// Report `err` and mark the node as failed.
    pub(crate) fn fail<T>(&mut self, err: SemanticError, span: Span) -> Option<T> {
        self.report(err, span);
        None
    }

    /// Unwrap `result`, reporting the error if there is one.
    pub(crate) fn settle<T>(&mut self, result: Result<T, SemanticError>, span: Span) -> Option<T> {
        match result {
            Ok(v) => Some(v),
            Err(err) => self.fail(err, span),
        }
    }

    pub(crate) fn misplaced(&mut self, flow: &Flow, context: &'static str) {
        let (keyword, span) = match flow {
            Flow::Next => return,
            Flow::Break(span) => ("break", *span),
            Flow::Continue(span) => ("continue", *span),
            Flow::Return(_, span) => ("return", *span),
        };
        self.report(SemanticError::MisplacedTransfer { keyword, context }, span);
    }

    // ══════════════════════════════════════════════════════════════════════
    // Expression evaluation
    // ══════════════════════════════════════════════════════════════════════

    /// Evaluate an expression in `scope`. A failed node yields Null.
    pub fn eval_expr(&mut self, expr: &Expr, scope: ScopeId) -> EvalResult<Value> {
        Ok(self.eval_operand(expr, scope)?.unwrap_or(Value::Null))
    }

    /// Evaluate an expression in `scope`.
    ///
    /// `Ok(None)` means the expression failed and the cause was already
    /// reported, so the caller stays quiet instead of reporting a follow-up
    /// error. A `null` that evaluated fine is `Ok(Some(Value::Null))`.
    pub(crate) fn eval_operand(&mut self, expr: &Expr, scope: ScopeId) -> EvalResult<Option<Value>> {
        self.tick()?;
        match &expr.kind {
            ExprKind::Literal(lit) => Ok(Some(Value::from_literal(lit))),

            ExprKind::Access(name) => Ok(self.eval_access(name, scope)),
            ExprKind::VectorAccess { name, index } => {
                self.eval_element(name, &[index.as_ref()], scope, expr.span)
            }
            ExprKind::MatrixAccess { name, row, col } => {
                self.eval_element(name, &[row.as_ref(), col.as_ref()], scope, expr.span)
            }

            ExprKind::Arithmetic { left, op, right } => {
                self.eval_binary(left, right, scope, expr.span, |l, r| {
                    ops::arithmetic(*op, l, r)
                })
            }
            ExprKind::Relational { left, op, right } => {
                self.eval_binary(left, right, scope, expr.span, |l, r| {
                    ops::relational(*op, l, r)
                })
            }
            // Both sides always run.
            ExprKind::Logical { left, op, right } => {
                self.eval_binary(left, right, scope, expr.span, |l, r| ops::logical(*op, l, r))
            }
            ExprKind::Negate(operand) => self.eval_unary(operand, scope, expr.span, ops::negate),
            ExprKind::Not(operand) => self.eval_unary(operand, scope, expr.span, ops::not),
            ExprKind::Cast { target, expr: inner } => {
                self.eval_unary(inner, scope, expr.span, |v| ops::cast(v, *target))
            }
            ExprKind::TypeTest {
                expr: inner,
                data_type,
            } => {
                let value = self.eval_expr(inner, scope)?;
                Ok(Some(Value::Boolean(value.data_type() == *data_type)))
            }

            ExprKind::Ternary {
                condition,
                then_expr,
                else_expr,
            } => self.eval_ternary(condition, then_expr, else_expr, scope),

            ExprKind::Call(call) => self.eval_call(call, scope),
            ExprKind::Builtin { func, args } => self.eval_builtin(*func, args, scope, expr.span),
        }
    }

    /// Evaluate every expression, in order; `Ok(None)` if any of them failed.
    pub(crate) fn eval_operands(&mut self, exprs: &[Expr], scope: ScopeId) -> EvalResult<Option<Vec<Value>>> {
        let mut values = Vec::with_capacity(exprs.len());
        let mut failed = false;
        for expr in exprs {
            match self.eval_operand(expr, scope)? {
                Some(value) => values.push(value),
                None => failed = true,
            }
        }
        Ok((!failed).then_some(values))
    }

    // ── Access ────────────────────────────────────────────────────────────

    fn eval_access(&mut self, name: &Ident, scope: ScopeId) -> Option<Value> {
        match self.scopes.lookup(scope, &name.name) {
            Some(symbol) => Some(symbol.value.clone()),
            None => self.fail(
                SemanticError::UndeclaredIdentifier {
                    name: name.name.clone(),
                },
                name.span,
            ),
        }
    }

    /// Resolve `name` to an array of the given rank.
    pub(crate) fn array_named(
        &self,
        name: &Ident,
        rank: usize,
        scope: ScopeId,
    ) -> Result<ArrayRef, SemanticError> {
        let symbol = self.scopes.lookup(scope, &name.name).ok_or_else(|| {
            SemanticError::UndeclaredIdentifier {
                name: name.name.clone(),
            }
        })?;
        let Value::Array(handle) = symbol.value else {
            return Err(SemanticError::TypeMismatch(format!(
                "`{}` is {}, not an array",
                name.name, symbol.data_type
            )));
        };
        let actual = match self.arrays.get(handle).shape() {
            Shape::Vector(_) => 1,
            Shape::Matrix(..) => 2,
        };
        if actual != rank {
            return Err(SemanticError::TypeMismatch(format!(
                "`{}` has {actual} dimension(s), indexed with {rank}",
                name.name
            )));
        }
        Ok(handle)
    }

    /// Evaluate index expressions to Integers.
    ///
    /// `Ok(None)` means a diagnostic was already recorded.
    pub(crate) fn eval_indices(
        &mut self,
        indices: &[&Expr],
        scope: ScopeId,
    ) -> EvalResult<Option<Vec<i64>>> {
        let mut out = Vec::with_capacity(indices.len());
        for index in indices {
            match self.eval_operand(index, scope)? {
                Some(Value::Integer(i)) => out.push(i),
                None => return Ok(None),
                Some(v) => {
                    self.report(
                        SemanticError::InvalidIndexType {
                            found: v.data_type(),
                        },
                        index.span,
                    );
                    return Ok(None);
                }
            }
        }
        Ok(Some(out))
    }

    fn eval_element(
        &mut self,
        name: &Ident,
        indices: &[&Expr],
        scope: ScopeId,
        span: Span,
    ) -> EvalResult<Option<Value>> {
        let handle = match self.array_named(name, indices.len(), scope) {
            Ok(handle) => handle,
            Err(err) => return Ok(self.fail(err, name.span)),
        };
        let Some(index) = self.eval_indices(indices, scope)? else {
            return Ok(None);
        };
        let result = self.arrays.get(handle).get(&index).cloned();
        Ok(self.settle(result, span))
    }

    // ── Operators ─────────────────────────────────────────────────────────

    fn eval_binary(
        &mut self,
        left: &Expr,
        right: &Expr,
        scope: ScopeId,
        span: Span,
        op: impl FnOnce(&Value, &Value) -> Result<Value, SemanticError>,
    ) -> EvalResult<Option<Value>> {
        let l = self.eval_operand(left, scope)?;
        let r = self.eval_operand(right, scope)?;
        let (Some(l), Some(r)) = (l, r) else {
            return Ok(None);
        };
        Ok(self.settle(op(&l, &r), span))
    }

    fn eval_unary(
        &mut self,
        operand: &Expr,
        scope: ScopeId,
        span: Span,
        op: impl FnOnce(&Value) -> Result<Value, SemanticError>,
    ) -> EvalResult<Option<Value>> {
        let Some(value) = self.eval_operand(operand, scope)? else {
            return Ok(None);
        };
        Ok(self.settle(op(&value), span))
    }

    fn eval_ternary(
        &mut self,
        condition: &Expr,
        then_expr: &Expr,
        else_expr: &Expr,
        scope: ScopeId,
    ) -> EvalResult<Option<Value>> {
        let is_condition = matches!(
            condition.kind,
            ExprKind::Relational { .. } | ExprKind::Logical { .. } | ExprKind::Not(_)
        );
        if !is_condition {
            return Ok(self.fail(
                SemanticError::ConditionTypeError(
                    "ternary condition must be a relational or logical expression".into(),
                ),
                condition.span,
            ));
        }
        match self.eval_condition(condition, scope)? {
            Some(true) => self.eval_operand(then_expr, scope),
            Some(false) => self.eval_operand(else_expr, scope),
            None => Ok(None),
        }
    }

    /// Evaluate a condition that must be Boolean.
    ///
    /// `Ok(None)` means a diagnostic was recorded.
    pub(crate) fn eval_condition(&mut self, condition: &Expr, scope: ScopeId) -> EvalResult<Option<bool>> {
        match self.eval_operand(condition, scope)? {
            Some(Value::Boolean(b)) => Ok(Some(b)),
            None => Ok(None),
            Some(v) => {
                self.report(
                    SemanticError::ConditionTypeError(format!(
                        "condition must be Boolean, found {}",
                        v.data_type()
                    )),
                    condition.span,
                );
                Ok(None)
            }
        }
    }

    fn eval_builtin(
        &mut self,
        func: Builtin,
        args: &[Expr],
        scope: ScopeId,
        span: Span,
    ) -> EvalResult<Option<Value>> {
        let Some(values) = self.eval_operands(args, scope)? else {
            return Ok(None);
        };
        let result = builtins::apply(&mut self.arrays, func, values);
        Ok(self.settle(result, span))
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}
