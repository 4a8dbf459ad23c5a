use crate::classifier::{Classifier, ScreenLabel};
use crate::model::Detection;
use crate::training::weights::TrainingWeights;

use super::{ScenarioKey, ScenarioPolicy};

/// URA Finale: the default scenario. No seasonal multipliers, no burst
/// filtering — the evaluator runs with scenario-default weights.
pub struct UraPolicy;

impl UraPolicy {
    pub fn new() -> Self {
        Self
    }
}

impl Default for UraPolicy {
    fn default() -> Self {
        Self::new()
    }
}

impl ScenarioPolicy for UraPolicy {
    fn key(&self) -> ScenarioKey {
        ScenarioKey::Ura
    }

    fn classify(&self, classifier: &Classifier, detections: &[Detection]) -> ScreenLabel {
        classifier.classify("ura", detections)
    }

    fn training_weights(&self) -> TrainingWeights {
        TrainingWeights::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ura_has_no_burst_allow_list() {
        let policy = UraPolicy::new();
        assert!(policy.burst_allowed_stats().is_none());
    }
}
