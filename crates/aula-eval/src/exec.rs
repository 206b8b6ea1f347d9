//! Instruction execution and control-flow signals.

use crate::array::{Array, Shape};
use crate::env::{ScopeId, Symbol};
use crate::error::{EvalResult, SemanticError};
use crate::evaluator::Interpreter;
use crate::value::Value;
use aula_types::ast::*;
use aula_types::{DataType, Span};
use std::rc::Rc;
use tracing::debug;

/// Outcome of executing an instruction.
///
/// Anything but `Next` bubbles up until a construct consumes it: loops take
/// `Break` and `Continue`, `switch` takes `Break`, and a call boundary takes
/// `Return`.
#[derive(Debug, Clone, PartialEq)]
pub enum Flow {
    Next,
    Break(Span),
    Continue(Span),
    Return(Returned, Span),
}

/// What a `return` hands back to its call.
#[derive(Debug, Clone, PartialEq)]
pub enum Returned {
    /// A bare `return;`.
    Nothing,
    Value(Value),
    /// The returned expression failed; its error is already reported.
    Failed,
}

impl Interpreter {
    // ══════════════════════════════════════════════════════════════════════
    // Blocks & dispatch
    // ══════════════════════════════════════════════════════════════════════

    /// Run `block` in `scope`, stopping at the first signal.
    pub fn exec_block(&mut self, block: &Block, scope: ScopeId) -> EvalResult<Flow> {
        for instr in &block.instrs {
            match self.exec_instr(instr, scope)? {
                Flow::Next => {}
                signal => return Ok(signal),
            }
        }
        Ok(Flow::Next)
    }

    pub fn exec_instr(&mut self, instr: &Instr, scope: ScopeId) -> EvalResult<Flow> {
        self.tick()?;
        match instr {
            Instr::Declare(decl) => self.exec_declare(decl, scope),
            Instr::Assign(assign) => self.exec_assign(assign, scope),
            Instr::IncDec(step) => self.exec_inc_dec(step, scope),
            Instr::VectorDecl(decl) => self.exec_vector_decl(decl, scope),
            Instr::MatrixDecl(decl) => self.exec_matrix_decl(decl, scope),
            Instr::VectorAssign(a) => {
                self.exec_element_assign(&a.name, &[&a.index], &a.value, scope, a.span)
            }
            Instr::MatrixAssign(a) => {
                self.exec_element_assign(&a.name, &[&a.row, &a.col], &a.value, scope, a.span)
            }
            Instr::Echo(echo) => self.exec_echo(echo, scope),

            Instr::If(stmt) => self.exec_if(stmt, scope),
            Instr::While(stmt) => self.exec_while(stmt, scope),
            Instr::For(stmt) => self.exec_for(stmt, scope),
            Instr::DoUntil(stmt) => self.exec_do_until(stmt, scope),
            Instr::Loop(stmt) => self.exec_loop(stmt, scope),
            Instr::Switch(stmt) => self.exec_switch(stmt, scope),
            Instr::Break(span) => Ok(Flow::Break(*span)),
            Instr::Continue(span) => Ok(Flow::Continue(*span)),
            Instr::Return(ret) => {
                let returned = match &ret.value {
                    Some(expr) => match self.eval_operand(expr, scope)? {
                        Some(value) => Returned::Value(value),
                        None => Returned::Failed,
                    },
                    None => Returned::Nothing,
                };
                Ok(Flow::Return(returned, ret.span))
            }

            Instr::FunctionDecl(decl) => {
                let global = self.scopes.global_of(scope);
                let result = self.scopes.declare_function(global, Rc::new(decl.clone()));
                if self.settle(result, decl.name.span).is_some() {
                    debug!(function = %decl.name.name, params = decl.params.len(), "function declared");
                }
                Ok(Flow::Next)
            }
            Instr::Call(call) => {
                self.eval_call(call, scope)?;
                Ok(Flow::Next)
            }
            Instr::Expr(expr) => {
                self.eval_expr(expr, scope)?;
                Ok(Flow::Next)
            }
        }
    }

    // ══════════════════════════════════════════════════════════════════════
    // Bindings
    // ══════════════════════════════════════════════════════════════════════

    fn exec_declare(&mut self, decl: &Declaration, scope: ScopeId) -> EvalResult<Flow> {
        let mut value = None;
        if let Some(expr) = &decl.value {
            match self.eval_operand(expr, scope)? {
                Some(v) if v.data_type() == decl.data_type => value = Some(v),
                Some(v) => self.report(
                    SemanticError::TypeMismatch(format!(
                        "cannot initialize {} with {}",
                        decl.data_type,
                        v.data_type()
                    )),
                    expr.span,
                ),
                None => {}
            }
        } else if decl.is_const {
            for name in &decl.names {
                self.report(
                    SemanticError::UninitializedConstant {
                        name: name.name.clone(),
                    },
                    name.span,
                );
            }
        }

        // A failed initializer still declares the name, holding the default.
        let value = value.unwrap_or_else(|| Value::default_for(decl.data_type));
        for name in &decl.names {
            let symbol = Symbol::new(name.name.clone(), decl.data_type, value.clone(), name.span)
                .with_const(decl.is_const);
            let result = self.scopes.declare(scope, symbol);
            self.settle(result, name.span);
        }
        Ok(Flow::Next)
    }

    fn exec_assign(&mut self, assign: &Assignment, scope: ScopeId) -> EvalResult<Flow> {
        let Some(value) = self.eval_operand(&assign.value, scope)? else {
            return Ok(Flow::Next);
        };
        let result = self
            .check_array_store(&assign.name.name, &value, scope)
            .and_then(|()| self.scopes.assign(scope, &assign.name.name, value));
        self.settle(result, assign.span);
        Ok(Flow::Next)
    }

    /// Arrays may only replace arrays of the same element type.
    fn check_array_store(&self, name: &str, value: &Value, scope: ScopeId) -> Result<(), SemanticError> {
        let Some(symbol) = self.scopes.lookup(scope, name) else {
            return Ok(());
        };
        match (&symbol.value, value) {
            (Value::Array(current), Value::Array(new)) if !symbol.is_const => {
                let (current, new) = (self.arrays.get(*current), self.arrays.get(*new));
                if current.elem_type() == new.elem_type() {
                    Ok(())
                } else {
                    Err(SemanticError::TypeMismatch(format!(
                        "`{name}` holds {} elements, cannot store an array of {}",
                        current.elem_type(),
                        new.elem_type()
                    )))
                }
            }
            _ => Ok(()),
        }
    }

    fn exec_inc_dec(&mut self, step: &IncDec, scope: ScopeId) -> EvalResult<Flow> {
        let delta = match step.op {
            IncDecOp::Increment => 1,
            IncDecOp::Decrement => -1,
        };
        let next = match self.scopes.lookup(scope, &step.name.name) {
            None => Err(SemanticError::UndeclaredIdentifier {
                name: step.name.name.clone(),
            }),
            Some(symbol) => match &symbol.value {
                Value::Integer(n) => n.checked_add(delta).map(Value::Integer).ok_or_else(|| {
                    SemanticError::ArithmeticTrap(format!("`{}` overflows Integer", step.name.name))
                }),
                Value::Decimal(d) => Ok(Value::Decimal(d + delta as f64)),
                other => Err(SemanticError::TypeMismatch(format!(
                    "`{}` requires a numeric variable, `{}` is {}",
                    if delta > 0 { "++" } else { "--" },
                    step.name.name,
                    other.data_type()
                ))),
            },
        };
        let result = next.and_then(|value| self.scopes.assign(scope, &step.name.name, value));
        self.settle(result, step.span);
        Ok(Flow::Next)
    }

    // ── Arrays ────────────────────────────────────────────────────────────

    fn exec_vector_decl(&mut self, decl: &VectorDecl, scope: ScopeId) -> EvalResult<Flow> {
        let template = match &decl.init {
            VectorInit::Size(size) => {
                let Some(len) = self.eval_size(size, scope)? else {
                    return Ok(Flow::Next);
                };
                self.filled(decl.elem_type, Shape::Vector(len))
            }
            VectorInit::Values(exprs) => {
                let Some(values) = self.eval_operands(exprs, scope)? else {
                    return Ok(Flow::Next);
                };
                Array::vector("", decl.elem_type, values)
            }
        };
        if let Some(template) = self.settle(template, decl.span) {
            self.bind_arrays(&decl.names, &template, decl.is_const, scope);
        }
        Ok(Flow::Next)
    }

    fn exec_matrix_decl(&mut self, decl: &MatrixDecl, scope: ScopeId) -> EvalResult<Flow> {
        let template = match &decl.init {
            MatrixInit::Size { rows, cols } => {
                let Some(rows) = self.eval_size(rows, scope)? else {
                    return Ok(Flow::Next);
                };
                let Some(cols) = self.eval_size(cols, scope)? else {
                    return Ok(Flow::Next);
                };
                self.filled(decl.elem_type, Shape::Matrix(rows, cols))
            }
            MatrixInit::Rows(rows) => {
                let mut values = Vec::with_capacity(rows.len());
                for row in rows {
                    let Some(row) = self.eval_operands(row, scope)? else {
                        return Ok(Flow::Next);
                    };
                    values.push(row);
                }
                Array::matrix("", decl.elem_type, values)
            }
        };
        if let Some(template) = self.settle(template, decl.span) {
            self.bind_arrays(&decl.names, &template, decl.is_const, scope);
        }
        Ok(Flow::Next)
    }

    /// A default-filled template, if the run's element limit allows it.
    fn filled(&self, elem_type: DataType, shape: Shape) -> Result<Array, SemanticError> {
        self.arrays.reserve(shape, self.config().max_array_elements)?;
        Array::filled("", elem_type, shape)
    }

    /// Give each name its own copy of `template`.
    fn bind_arrays(&mut self, names: &[Ident], template: &Array, is_const: bool, scope: ScopeId) {
        for name in names {
            if self.scopes.lookup_local(scope, &name.name).is_some() {
                self.report(
                    SemanticError::DuplicateDeclaration {
                        name: name.name.clone(),
                    },
                    name.span,
                );
                continue;
            }
            let reserved = self
                .arrays
                .reserve(template.shape(), self.config().max_array_elements);
            if self.settle(reserved, name.span).is_none() {
                continue;
            }
            let handle = self.arrays.insert(template.renamed(name.name.clone()));
            let symbol = Symbol::new(name.name.clone(), DataType::Array, Value::Array(handle), name.span)
                .with_const(is_const);
            let result = self.scopes.declare(scope, symbol);
            self.settle(result, name.span);
        }
    }

    /// A dimension: a positive Integer. `Ok(None)` means it was reported.
    fn eval_size(&mut self, size: &Expr, scope: ScopeId) -> EvalResult<Option<usize>> {
        let err = match self.eval_operand(size, scope)? {
            None => return Ok(None),
            Some(Value::Integer(n)) if n > 0 => match usize::try_from(n) {
                Ok(len) => return Ok(Some(len)),
                Err(_) => SemanticError::InvalidDimensions(format!("size {n} is too large")),
            },
            Some(Value::Integer(n)) => SemanticError::InvalidDimensions(format!(
                "size must be positive, found {n}"
            )),
            Some(v) => SemanticError::InvalidDimensions(format!(
                "size must be Integer, found {}",
                v.data_type()
            )),
        };
        self.report(err, size.span);
        Ok(None)
    }

    fn exec_element_assign(
        &mut self,
        name: &Ident,
        indices: &[&Expr],
        value: &Expr,
        scope: ScopeId,
        span: Span,
    ) -> EvalResult<Flow> {
        let handle = match self.array_named(name, indices.len(), scope) {
            Ok(handle) => handle,
            Err(err) => {
                self.report(err, name.span);
                return Ok(Flow::Next);
            }
        };
        if self.scopes.lookup(scope, &name.name).is_some_and(|s| s.is_const) {
            self.report(
                SemanticError::ConstViolation {
                    name: name.name.clone(),
                },
                span,
            );
            return Ok(Flow::Next);
        }
        let Some(index) = self.eval_indices(indices, scope)? else {
            return Ok(Flow::Next);
        };
        let Some(value) = self.eval_operand(value, scope)? else {
            return Ok(Flow::Next);
        };
        let result = self.arrays.get_mut(handle).set(&index, value);
        self.settle(result, span);
        Ok(Flow::Next)
    }

    // ── Output ────────────────────────────────────────────────────────────

    fn exec_echo(&mut self, echo: &Echo, scope: ScopeId) -> EvalResult<Flow> {
        let value = self.eval_expr(&echo.value, scope)?;
        let line = match &value {
            Value::String(s) => echo_text(s),
            other => self.arrays.render(other),
        };
        self.output.push(line);
        Ok(Flow::Next)
    }

    // ══════════════════════════════════════════════════════════════════════
    // Control flow
    // ══════════════════════════════════════════════════════════════════════

    /// Branches run in the enclosing scope.
    fn exec_if(&mut self, stmt: &IfStmt, scope: ScopeId) -> EvalResult<Flow> {
        match self.eval_condition(&stmt.condition, scope)? {
            Some(true) => self.exec_block(&stmt.then_block, scope),
            Some(false) => match &stmt.else_branch {
                Some(ElseBranch::ElseIf(next)) => self.exec_if(next, scope),
                Some(ElseBranch::Block(block)) => self.exec_block(block, scope),
                None => Ok(Flow::Next),
            },
            None => Ok(Flow::Next),
        }
    }

    /// One body run; `Some` when the loop must stop and yield that flow.
    /// Each iteration costs a step, so an empty body still hits the limit.
    fn loop_iteration(&mut self, body: &Block, body_scope: ScopeId) -> EvalResult<Option<Flow>> {
        self.tick()?;
        self.scopes.reset(body_scope);
        match self.exec_block(body, body_scope)? {
            Flow::Next | Flow::Continue(_) => Ok(None),
            Flow::Break(_) => Ok(Some(Flow::Next)),
            ret @ Flow::Return(..) => Ok(Some(ret)),
        }
    }

    fn exec_while(&mut self, stmt: &WhileStmt, scope: ScopeId) -> EvalResult<Flow> {
        let body_scope = self.scopes.create_child(scope, "While");
        while let Some(true) = self.eval_condition(&stmt.condition, scope)? {
            if let Some(flow) = self.loop_iteration(&stmt.body, body_scope)? {
                return Ok(flow);
            }
        }
        Ok(Flow::Next)
    }

    fn exec_for(&mut self, stmt: &ForStmt, scope: ScopeId) -> EvalResult<Flow> {
        let for_scope = self.scopes.create_child(scope, "For");
        let init = self.exec_instr(&stmt.init, for_scope)?;
        self.misplaced(&init, "a loop body");
        let body_scope = self.scopes.create_child(for_scope, "For body");
        while let Some(true) = self.eval_condition(&stmt.condition, for_scope)? {
            if let Some(flow) = self.loop_iteration(&stmt.body, body_scope)? {
                return Ok(flow);
            }
            let update = self.exec_instr(&stmt.update, for_scope)?;
            self.misplaced(&update, "a loop body");
        }
        Ok(Flow::Next)
    }

    /// Runs the body, then repeats while the condition is false. The
    /// condition sees the body's declarations from the iteration just run.
    fn exec_do_until(&mut self, stmt: &DoUntilStmt, scope: ScopeId) -> EvalResult<Flow> {
        let body_scope = self.scopes.create_child(scope, "DoUntil");
        loop {
            if let Some(flow) = self.loop_iteration(&stmt.body, body_scope)? {
                return Ok(flow);
            }
            if self.eval_condition(&stmt.condition, body_scope)? != Some(false) {
                return Ok(Flow::Next);
            }
        }
    }

    fn exec_loop(&mut self, stmt: &LoopStmt, scope: ScopeId) -> EvalResult<Flow> {
        let body_scope = self.scopes.create_child(scope, "Loop");
        loop {
            if let Some(flow) = self.loop_iteration(&stmt.body, body_scope)? {
                return Ok(flow);
            }
        }
    }

    /// Falls through from the first matching case until a `break`.
    fn exec_switch(&mut self, stmt: &SwitchStmt, scope: ScopeId) -> EvalResult<Flow> {
        let Some(subject) = self.eval_operand(&stmt.subject, scope)? else {
            return Ok(Flow::Next);
        };

        let mut matched = false;
        for case in &stmt.cases {
            if !matched {
                let candidate = self.eval_expr(&case.value, scope)?;
                matched = crate::ops::values_equal(&subject, &candidate) == Some(true);
            }
            if matched {
                match self.exec_block(&case.body, scope)? {
                    Flow::Next => {}
                    Flow::Break(_) => return Ok(Flow::Next),
                    signal => return Ok(signal),
                }
            }
        }

        match (&stmt.default, matched) {
            (Some(default), false) => match self.exec_block(default, scope)? {
                Flow::Break(_) => Ok(Flow::Next),
                signal => Ok(signal),
            },
            _ => Ok(Flow::Next),
        }
    }
}

/// Text appended by `echo` for a String: escapes resolved, one pair of outer
/// quotes removed, surrounding whitespace trimmed.
pub fn echo_text(raw: &str) -> String {
    let mut text = String::with_capacity(raw.len());
    let mut chars = raw.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\\' {
            text.push(c);
            continue;
        }
        let resolved = match chars.peek() {
            Some('"') => '"',
            Some('n') => '\n',
            Some('t') => '\t',
            Some('r') => '\r',
            Some('\\') => '\\',
            _ => {
                text.push(c);
                continue;
            }
        };
        chars.next();
        text.push(resolved);
    }

    let unquoted = match text.strip_prefix('"').and_then(|t| t.strip_suffix('"')) {
        Some(inner) => inner,
        None => text.as_str(),
    };
    unquoted.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_echo_text_unescapes() {
        assert_eq!(echo_text(r#"a\tb"#), "a\tb");
        assert_eq!(echo_text(r#"say \"hi\""#), "say \"hi\"");
        assert_eq!(echo_text(r"back\\slash"), "back\\slash");
        assert_eq!(echo_text(r"line\nbreak"), "line\nbreak");
        assert_eq!(echo_text(r"keep \q"), "keep \\q");
    }

    #[test]
    fn test_echo_text_strips_quotes_and_trims() {
        assert_eq!(echo_text("\"hello\""), "hello");
        assert_eq!(echo_text("  padded  "), "padded");
        assert_eq!(echo_text("\""), "\"");
        assert_eq!(echo_text("plain"), "plain");
    }
}
