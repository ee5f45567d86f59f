//! Read-only subtask status classification for renderers.

use std::fmt;

use serde::Serialize;

use crate::core::completion::CompletionState;

/// Display status of one subtask, in precedence order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SubtaskStatus {
    Success,
    Fail,
    Ineligible,
    Eligible,
}

impl SubtaskStatus {
    /// Completed wins over attempted; attempted wins over eligibility.
    pub fn classify(completed: bool, open: bool, eligible: bool) -> Self {
        if completed {
            SubtaskStatus::Success
        } else if !open {
            SubtaskStatus::Fail
        } else if !eligible {
            SubtaskStatus::Ineligible
        } else {
            SubtaskStatus::Eligible
        }
    }
}

impl fmt::Display for SubtaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SubtaskStatus::Success => "Success",
            SubtaskStatus::Fail => "Fail",
            SubtaskStatus::Ineligible => "Ineligible",
            SubtaskStatus::Eligible => "Eligible",
        };
        f.write_str(label)
    }
}

/// Status of every subtask index of the active graph.
pub fn statuses(state: &CompletionState) -> Vec<SubtaskStatus> {
    state
        .completion()
        .iter()
        .zip(state.mask())
        .zip(state.eligibility())
        .map(|((done, open), eligible)| SubtaskStatus::classify(*done, *open, *eligible))
        .collect()
}
