//! Shared result types for the CLI.

use elisa_core::PlateEvaluation;

/// Outcome of evaluating a batch of plate exports.
pub struct BatchResult {
    pub plates: Vec<PlateEvaluation>,
    /// Per-plate processing failures; evaluation continues past them.
    pub errors: Vec<String>,
}

impl BatchResult {
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}
