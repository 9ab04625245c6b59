//! Splits raw head outputs into per-task results.

use affect_models::{AffectPrediction, AffectTask, TaskPrediction};

use super::{HeadOutputs, ATTENTION_HEAD};

/// Decode the five head outputs.
///
/// Precondition: each classifier head is a non-empty probability vector for
/// a single batch item and the attention head holds at least one value. This
/// is guaranteed by the model's fixed task/class configuration and is not
/// checked at runtime.
pub fn decode_outputs(outputs: HeadOutputs) -> AffectPrediction {
    let mut heads = outputs.heads;

    debug_assert!(!heads[ATTENTION_HEAD].is_empty(), "attention head is empty");
    let attention_score = heads[ATTENTION_HEAD].first().copied().unwrap_or_default();

    let mut classify = |task: AffectTask| {
        TaskPrediction::from_probabilities(std::mem::take(&mut heads[task.head_index()]))
    };

    let prediction = AffectPrediction {
        boredom: classify(AffectTask::Boredom),
        engagement: classify(AffectTask::Engagement),
        confusion: classify(AffectTask::Confusion),
        frustration: classify(AffectTask::Frustration),
        attention_score,
    };

    debug_assert!(AffectTask::ALL
        .iter()
        .all(|&task| prediction.task(task).num_classes() > 0));

    prediction
}
