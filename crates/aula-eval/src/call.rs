//! User-defined function calls.

use crate::env::{ScopeId, Symbol};
use crate::error::{EvalError, EvalResult, SemanticError};
use crate::evaluator::Interpreter;
use crate::exec::{Flow, Returned};
use crate::value::Value;
use aula_types::ast::{CallExpr, FunctionDecl};
use aula_types::Span;
use tracing::{debug, trace};

impl Interpreter {
    /// Call a declared function or procedure.
    ///
    /// Arguments are evaluated in the caller's scope; the body runs in a
    /// fresh scope whose parent is the global scope. Procedures yield Null.
    /// `Ok(None)` means the call failed and was reported.
    pub(crate) fn eval_call(&mut self, call: &CallExpr, scope: ScopeId) -> EvalResult<Option<Value>> {
        let name = &call.name.name;
        let Some(decl) = self.scopes.lookup_function(scope, name) else {
            return Ok(self.fail(
                SemanticError::UndefinedFunction { name: name.clone() },
                call.name.span,
            ));
        };
        if call.args.len() > decl.params.len() {
            return Ok(self.fail(
                SemanticError::TooManyArguments {
                    name: name.clone(),
                    expected: decl.params.len(),
                    received: call.args.len(),
                },
                call.span,
            ));
        }

        let mut values = Vec::with_capacity(call.args.len());
        for arg in &call.args {
            values.push(self.eval_operand(&arg.value, scope)?);
        }
        let Some(values) = values.into_iter().collect::<Option<Vec<_>>>() else {
            return Ok(None);
        };
        let Some(mut slots) = self.bind_arguments(call, &decl, values) else {
            return Ok(None);
        };

        if self.call_depth >= self.config().max_call_depth {
            return Err(EvalError::CallDepthExceeded {
                limit: self.config().max_call_depth,
            });
        }

        let global = self.scopes.global_of(scope);
        let call_scope = self.scopes.create_child(global, format!("Function {name}"));
        for (param, slot) in decl.params.iter().zip(slots.iter_mut()) {
            let value = match (slot.take(), &param.default) {
                (Some(value), _) => value,
                (None, Some(default)) => match self.eval_operand(default, call_scope)? {
                    Some(value) => value,
                    None => return Ok(None),
                },
                (None, None) => {
                    return Ok(self.fail(
                        SemanticError::MissingArgument {
                            name: name.clone(),
                            param: param.name.name.clone(),
                        },
                        call.span,
                    ));
                }
            };
            if value.data_type() != param.data_type {
                return Ok(self.fail(
                    SemanticError::TypeMismatch(format!(
                        "parameter `{}` of `{name}` is {}, found {}",
                        param.name.name,
                        param.data_type,
                        value.data_type()
                    )),
                    call.span,
                ));
            }
            let symbol = Symbol::new(param.name.name.clone(), param.data_type, value, param.name.span);
            let result = self.scopes.declare(call_scope, symbol);
            if self.settle(result, param.name.span).is_none() {
                return Ok(None);
            }
        }

        trace!(function = %name, depth = self.call_depth + 1, "entering call");
        self.call_depth += 1;
        let flow = self.exec_block(&decl.body, call_scope);
        self.call_depth -= 1;
        let flow = flow?;
        Ok(self.finish_call(&decl, flow, call.span))
    }

    /// Match argument values to parameter slots: positional ones first, in
    /// order, then named ones by parameter name.
    fn bind_arguments(
        &mut self,
        call: &CallExpr,
        decl: &FunctionDecl,
        values: Vec<Value>,
    ) -> Option<Vec<Option<Value>>> {
        let mut slots: Vec<Option<Value>> = vec![None; decl.params.len()];
        let mut next_positional = 0;
        for (arg, value) in call.args.iter().zip(values) {
            let (slot, span) = match &arg.name {
                None => {
                    next_positional += 1;
                    (next_positional - 1, arg.value.span)
                }
                Some(param) => {
                    match decl.params.iter().position(|p| p.name.name == param.name) {
                        Some(slot) => (slot, param.span),
                        None => {
                            self.report(
                                SemanticError::UnknownParameter {
                                    name: decl.name.name.clone(),
                                    param: param.name.clone(),
                                },
                                param.span,
                            );
                            return None;
                        }
                    }
                }
            };
            if slots[slot].is_some() {
                self.report(
                    SemanticError::DuplicateDeclaration {
                        name: decl.params[slot].name.name.clone(),
                    },
                    span,
                );
                return None;
            }
            slots[slot] = Some(value);
        }
        Some(slots)
    }

    /// Check how the body ended against the declared return type.
    fn finish_call(&mut self, decl: &FunctionDecl, flow: Flow, span: Span) -> Option<Value> {
        let name = &decl.name.name;
        let missing = |expected| SemanticError::MissingReturnValue {
            name: name.clone(),
            expected,
        };
        let result = match (flow, decl.return_type) {
            (Flow::Return(Returned::Failed, _), _) => None,
            (Flow::Return(Returned::Value(value), _), Some(expected))
                if value.data_type() == expected =>
            {
                Some(value)
            }
            (Flow::Return(Returned::Value(value), at), expected) => self.fail(
                SemanticError::ReturnTypeMismatch {
                    name: name.clone(),
                    expected: expected.map_or_else(|| "no value".to_string(), |t| t.to_string()),
                    found: value.data_type(),
                },
                at,
            ),
            (Flow::Return(Returned::Nothing, at), Some(expected)) => self.fail(missing(expected), at),
            (Flow::Next, Some(expected)) => self.fail(missing(expected), span),
            (Flow::Return(Returned::Nothing, _) | Flow::Next, None) => Some(Value::Null),
            (signal @ (Flow::Break(_) | Flow::Continue(_)), _) => {
                self.misplaced(&signal, "a loop");
                None
            }
        };
        match &result {
            Some(value) => debug!(function = %name, result = %value, "call returned"),
            None => debug!(function = %name, "call failed"),
        }
        result
    }
}
