//! Decoded model predictions.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::task::AffectTask;

/// Decoded output of one classification head.
///
/// `level` is the argmax of `probabilities` and `confidence` is the value at
/// that index. Ties resolve to the lowest index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TaskPrediction {
    pub level: usize,
    pub confidence: f32,
    pub probabilities: Vec<f32>,
}

impl TaskPrediction {
    /// Decode a probability vector.
    ///
    /// The vector is expected to be non-empty; an empty vector decodes to
    /// level 0 with zero confidence.
    pub fn from_probabilities(probabilities: Vec<f32>) -> Self {
        let mut level = 0;
        let mut confidence = f32::NEG_INFINITY;
        for (i, &p) in probabilities.iter().enumerate() {
            if p > confidence {
                level = i;
                confidence = p;
            }
        }
        if probabilities.is_empty() {
            confidence = 0.0;
        }

        Self {
            level,
            confidence,
            probabilities,
        }
    }

    /// Number of classes in the probability vector.
    pub fn num_classes(&self) -> usize {
        self.probabilities.len()
    }
}

/// Full decoded result: four task predictions and the raw attention score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct AffectPrediction {
    pub boredom: TaskPrediction,
    pub engagement: TaskPrediction,
    pub confusion: TaskPrediction,
    pub frustration: TaskPrediction,
    /// Regression head output, passed through unmodified.
    pub attention_score: f32,
}

impl AffectPrediction {
    /// Look up the prediction for one task.
    pub fn task(&self, task: AffectTask) -> &TaskPrediction {
        match task {
            AffectTask::Boredom => &self.boredom,
            AffectTask::Engagement => &self.engagement,
            AffectTask::Confusion => &self.confusion,
            AffectTask::Frustration => &self.frustration,
        }
    }
}
