use std::collections::HashMap;

use crate::classifier::{Classifier, ScreenLabel};
use crate::model::{Detection, StatKey};
use crate::training::weights::TrainingWeights;

use super::{ScenarioKey, ScenarioPolicy};

/// Unity Cup: seasonal SV multipliers and burst-stat allow-listing on top
/// of the base evaluator.
pub struct UnityCupPolicy {
    weights: TrainingWeights,
    burst_allowed_stats: Vec<StatKey>,
}

impl UnityCupPolicy {
    pub fn new(burst_allowed_stats: Vec<StatKey>) -> Self {
        let mut seasonal_multipliers = HashMap::new();
        // Senior-year summer months get a boost; Junior/Classic run neutral.
        for month in [6, 7, 8] {
            seasonal_multipliers.insert(month, 1.3_f32);
        }
        let mut weights = TrainingWeights::default();
        weights.seasonal_multipliers = seasonal_multipliers;
        Self {
            weights,
            burst_allowed_stats,
        }
    }
}

impl ScenarioPolicy for UnityCupPolicy {
    fn key(&self) -> ScenarioKey {
        ScenarioKey::UnityCup
    }

    fn classify(&self, classifier: &Classifier, detections: &[Detection]) -> ScreenLabel {
        classifier.classify("unity_cup", detections)
    }

    fn training_weights(&self) -> TrainingWeights {
        self.weights.clone()
    }

    fn burst_allowed_stats(&self) -> Option<Vec<StatKey>> {
        Some(self.burst_allowed_stats.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unity_cup_carries_a_burst_allow_list() {
        let policy = UnityCupPolicy::new(vec![StatKey::Spd, StatKey::Wit]);
        let allowed = policy.burst_allowed_stats().unwrap();
        assert_eq!(allowed, vec![StatKey::Spd, StatKey::Wit]);
    }

    #[test]
    fn unity_cup_applies_summer_seasonal_multiplier() {
        let policy = UnityCupPolicy::new(vec![]);
        let weights = policy.training_weights();
        assert_eq!(
            weights.seasonal_multiplier(crate::model::Date::new(2, 7, 1)),
            1.3
        );
    }
}
