//! Episode-scoped subtask bookkeeping: completion, mask and eligibility.

use crate::core::eligibility::eligibility;
use crate::core::graph::GraphInstance;

/// Result of resolving one subtask attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptOutcome {
    /// Eligible and unattempted: marked complete, reward granted.
    Completed,
    /// Ineligible or already attempted: no reward, subtask forfeited.
    Failed,
}

/// Per-index subtask state for the active graph instance.
///
/// `completion` never goes from true to false and `mask` never goes from
/// false to true within an episode. `eligibility` is always the
/// [`eligibility`] of the current `completion`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionState {
    completion: Vec<bool>,
    mask: Vec<bool>,
    eligibility: Vec<bool>,
}

impl CompletionState {
    /// Fresh state: nothing complete, everything attemptable.
    pub fn new(graph: &GraphInstance) -> Self {
        let completion = vec![false; graph.len()];
        let eligibility = eligibility(&completion, graph);
        Self {
            completion,
            mask: vec![true; graph.len()],
            eligibility,
        }
    }

    /// Resolve an attempt at subtask index `ind`.
    ///
    /// Success requires `eligibility[ind] && mask[ind]`. Either way the mask
    /// bit is cleared, so each subtask resolves at most once per episode.
    pub fn attempt(&mut self, ind: usize, graph: &GraphInstance) -> AttemptOutcome {
        let outcome = if self.eligibility[ind] && self.mask[ind] {
            self.completion[ind] = true;
            AttemptOutcome::Completed
        } else {
            AttemptOutcome::Failed
        };
        self.mask[ind] = false;
        self.eligibility = eligibility(&self.completion, graph);
        outcome
    }

    /// True while some subtask is both eligible and unattempted.
    pub fn has_actionable(&self) -> bool {
        self.eligibility
            .iter()
            .zip(&self.mask)
            .any(|(eligible, open)| *eligible && *open)
    }

    pub fn completion(&self) -> &[bool] {
        &self.completion
    }

    pub fn mask(&self) -> &[bool] {
        &self.mask
    }

    pub fn eligibility(&self) -> &[bool] {
        &self.eligibility
    }
}

/// Scatter an index-space vector onto the global subtask-kind id space.
///
/// Ids not present in `graph` read as `0.0`.
pub fn project_to_ids(bits: &[bool], graph: &GraphInstance, nb_subtask_type: usize) -> Vec<f32> {
    let mut out = vec![0.0; nb_subtask_type];
    for (ind, bit) in bits.iter().enumerate() {
        if *bit {
            out[graph.id_of(ind)] = 1.0;
        }
    }
    out
}
