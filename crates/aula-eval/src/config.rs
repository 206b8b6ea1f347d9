//! Per-run resource limits.

use serde::{Deserialize, Serialize};

/// Resource limits for one run.
///
/// Exceeding the step or call depth limit aborts the run. An array
/// declaration that would pass `max_array_elements` is reported as invalid
/// dimensions and the run carries on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InterpreterConfig {
    /// Evaluated expressions plus executed instructions.
    pub max_steps: u64,
    /// Nested function calls.
    pub max_call_depth: usize,
    /// Elements held by all arrays of a run together.
    pub max_array_elements: usize,
}

impl InterpreterConfig {
    pub const DEFAULT_MAX_STEPS: u64 = 1_000_000;
    pub const DEFAULT_MAX_CALL_DEPTH: usize = 100;
    pub const DEFAULT_MAX_ARRAY_ELEMENTS: usize = 1_000_000;

    pub fn with_max_steps(mut self, max_steps: u64) -> Self {
        self.max_steps = max_steps;
        self
    }

    pub fn with_max_call_depth(mut self, max_call_depth: usize) -> Self {
        self.max_call_depth = max_call_depth;
        self
    }

    pub fn with_max_array_elements(mut self, max_array_elements: usize) -> Self {
        self.max_array_elements = max_array_elements;
        self
    }
}

impl Default for InterpreterConfig {
    fn default() -> Self {
        Self {
            max_steps: Self::DEFAULT_MAX_STEPS,
            max_call_depth: Self::DEFAULT_MAX_CALL_DEPTH,
            max_array_elements: Self::DEFAULT_MAX_ARRAY_ELEMENTS,
        }
    }
}
