//! Classification task definitions.
//!
//! The model exposes four classification heads followed by one regression
//! head. The order of [`AffectTask::ALL`] is the order of the model outputs.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One of the four affective states the model classifies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum AffectTask {
    Boredom,
    Engagement,
    Confusion,
    Frustration,
}

impl AffectTask {
    /// All classification tasks, in model head order.
    pub const ALL: [AffectTask; 4] = [
        AffectTask::Boredom,
        AffectTask::Engagement,
        AffectTask::Confusion,
        AffectTask::Frustration,
    ];

    /// Returns the task name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            AffectTask::Boredom => "boredom",
            AffectTask::Engagement => "engagement",
            AffectTask::Confusion => "confusion",
            AffectTask::Frustration => "frustration",
        }
    }

    /// Index of this task's head in the model output list.
    pub fn head_index(&self) -> usize {
        match self {
            AffectTask::Boredom => 0,
            AffectTask::Engagement => 1,
            AffectTask::Confusion => 2,
            AffectTask::Frustration => 3,
        }
    }
}

impl fmt::Display for AffectTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_head_order_matches_all() {
        for (i, task) in AffectTask::ALL.iter().enumerate() {
            assert_eq!(task.head_index(), i);
        }
    }

    #[test]
    fn test_task_serializes_lowercase() {
        let json = serde_json::to_string(&AffectTask::Confusion).unwrap();
        assert_eq!(json, "\"confusion\"");
    }
}
