//! Run results and the post-run symbol report.

use crate::array::ArrayStore;
use crate::env::{ScopeId, ScopeTree};
use aula_types::Diagnostic;
use serde::{Deserialize, Serialize};

/// Everything a run hands back to its caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunOutput {
    /// Lines produced by `echo`, in order.
    pub output: Vec<String>,
    pub diagnostics: Vec<Diagnostic>,
    /// `false` when a resource limit aborted the run.
    pub completed: bool,
}

impl RunOutput {
    pub fn has_errors(&self) -> bool {
        !self.diagnostics.is_empty()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// One row of the symbol report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolEntry {
    pub id: String,
    pub kind: String,
    pub scope_name: String,
    pub value: String,
    pub line: u32,
    pub column: u32,
}

const FUNCTION: &str = "Function";

/// Flatten the scope tree depth-first: each scope lists its variables,
/// then its functions, then its children.
pub fn symbol_table(scopes: &ScopeTree, arrays: &ArrayStore) -> Vec<SymbolEntry> {
    let mut entries = Vec::new();
    collect(scopes, arrays, scopes.global(), &mut entries);
    entries
}

fn collect(scopes: &ScopeTree, arrays: &ArrayStore, scope: ScopeId, out: &mut Vec<SymbolEntry>) {
    let scope_name = scopes.name(scope);
    for symbol in scopes.symbols(scope) {
        out.push(SymbolEntry {
            id: symbol.id.clone(),
            kind: arrays.kind_label(&symbol.value),
            scope_name: scope_name.to_string(),
            value: arrays.render(&symbol.value),
            line: symbol.span.line(),
            column: symbol.span.column(),
        });
    }
    for function in scopes.functions(scope) {
        out.push(SymbolEntry {
            id: function.name.name.clone(),
            kind: FUNCTION.to_string(),
            scope_name: scope_name.to_string(),
            value: FUNCTION.to_string(),
            line: function.name.span.line(),
            column: function.name.span.column(),
        });
    }
    for child in scopes.children(scope) {
        collect(scopes, arrays, *child, out);
    }
}
