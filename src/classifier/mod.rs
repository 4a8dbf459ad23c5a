//! Screen classifier: a total function from a detection set to a
//! discrete, scenario-specific screen label.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use tracing::info;

use crate::model::Detection;

/// Closed enum of screens the classifier can resolve to. Scenario policies
/// interpret a subset of these; the full set is shared so the Raceday
/// mediator can route without scenario-specific branching on an ad-hoc
/// string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScreenLabel {
    Lobby,
    Raceday,
    Training,
    Event,
    Skills,
    Inspiration,
    KashimotoTeam,
    ClawGame,
    Unknown,
}

/// One classification rule: a required detection class with a primary and
/// a relaxed confidence threshold.
#[derive(Debug, Clone)]
pub struct ClassRule {
    pub class_label: String,
    pub primary_threshold: f32,
    pub relaxed_threshold: f32,
}

/// A scenario's classification rule set: an ordered priority list of
/// (label, rule) pairs used both to decide a match and to tie-break
/// between simultaneously-satisfied candidates.
#[derive(Debug, Clone)]
pub struct ClassifierRules {
    pub priority: Vec<(ScreenLabel, ClassRule)>,
}

impl ClassifierRules {
    fn evaluate(&self, detections: &[Detection], relaxed: bool) -> ScreenLabel {
        self.evaluate_with_confidences(detections, relaxed).0
    }

    /// Same matching as `evaluate`, but also returns every observed
    /// confidence for the matched rule's class label so a relaxed match can
    /// be logged with the evidence that triggered it.
    fn evaluate_with_confidences(&self, detections: &[Detection], relaxed: bool) -> (ScreenLabel, Vec<f32>) {
        for (label, rule) in &self.priority {
            let threshold = if relaxed {
                rule.relaxed_threshold
            } else {
                rule.primary_threshold
            };
            if detections
                .iter()
                .any(|d| d.meets(&rule.class_label, threshold))
            {
                let confidences = detections
                    .iter()
                    .filter(|d| d.class_label == rule.class_label)
                    .map(|d| d.confidence)
                    .collect();
                return (*label, confidences);
            }
        }
        (ScreenLabel::Unknown, Vec::new())
    }
}

/// Stateful classifier: tracks consecutive Unknown ticks and escalates to
/// relaxed thresholds once `patience` is exceeded. A single counter is
/// shared across every registered scenario rather than one per scenario —
/// only one scenario runs per process, so this keeps the fallback simple.
/// See DESIGN.md for the reasoning.
pub struct Classifier {
    rules: HashMap<String, ClassifierRules>,
    patience_threshold: u32,
    consecutive_unknown: AtomicU32,
}

impl Classifier {
    pub fn new(patience_threshold: u32) -> Self {
        Self {
            rules: HashMap::new(),
            patience_threshold,
            consecutive_unknown: AtomicU32::new(0),
        }
    }

    pub fn register(&mut self, scenario: impl Into<String>, rules: ClassifierRules) {
        self.rules.insert(scenario.into(), rules);
    }

    pub fn classify(&self, scenario: &str, detections: &[Detection]) -> ScreenLabel {
        let Some(rules) = self.rules.get(scenario) else {
            return ScreenLabel::Unknown;
        };

        let relaxed = self.consecutive_unknown.load(Ordering::Acquire) >= self.patience_threshold;
        let (label, confidences) = rules.evaluate_with_confidences(detections, relaxed);

        if relaxed && label != ScreenLabel::Unknown {
            info!(
                scenario,
                ?label,
                ?confidences,
                "[classifier] relaxed-threshold classification"
            );
        }

        if label == ScreenLabel::Unknown {
            self.consecutive_unknown.fetch_add(1, Ordering::AcqRel);
        } else {
            self.consecutive_unknown.store(0, Ordering::Release);
        }

        label
    }

    pub fn is_relaxed(&self) -> bool {
        self.consecutive_unknown.load(Ordering::Acquire) >= self.patience_threshold
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::BBox;

    fn bbox() -> BBox {
        BBox {
            x: 0,
            y: 0,
            width: 10,
            height: 10,
        }
    }

    fn rules() -> ClassifierRules {
        ClassifierRules {
            priority: vec![
                (
                    ScreenLabel::Raceday,
                    ClassRule {
                        class_label: "race_day_banner".into(),
                        primary_threshold: 0.8,
                        relaxed_threshold: 0.5,
                    },
                ),
                (
                    ScreenLabel::Lobby,
                    ClassRule {
                        class_label: "lobby_marker".into(),
                        primary_threshold: 0.8,
                        relaxed_threshold: 0.5,
                    },
                ),
            ],
        }
    }

    #[test]
    fn classifies_at_primary_threshold() {
        let mut classifier = Classifier::new(3);
        classifier.register("ura", rules());
        let detections = vec![Detection::new("race_day_banner", bbox(), 0.85)];
        assert_eq!(classifier.classify("ura", &detections), ScreenLabel::Raceday);
    }

    #[test]
    fn falls_back_to_unknown_below_threshold() {
        let mut classifier = Classifier::new(3);
        classifier.register("ura", rules());
        let detections = vec![Detection::new("race_day_banner", bbox(), 0.6)];
        assert_eq!(classifier.classify("ura", &detections), ScreenLabel::Unknown);
    }

    #[test]
    fn escalates_to_relaxed_after_patience_exceeded() {
        let mut classifier = Classifier::new(2);
        classifier.register("ura", rules());
        let weak = vec![Detection::new("race_day_banner", bbox(), 0.6)];
        assert_eq!(classifier.classify("ura", &weak), ScreenLabel::Unknown);
        assert_eq!(classifier.classify("ura", &weak), ScreenLabel::Unknown);
        // Third consecutive Unknown crosses the patience threshold.
        assert_eq!(classifier.classify("ura", &weak), ScreenLabel::Raceday);
    }

    #[test]
    fn a_clean_detection_resets_patience() {
        let mut classifier = Classifier::new(2);
        classifier.register("ura", rules());
        let weak = vec![Detection::new("race_day_banner", bbox(), 0.6)];
        let strong = vec![Detection::new("lobby_marker", bbox(), 0.9)];
        assert_eq!(classifier.classify("ura", &weak), ScreenLabel::Unknown);
        assert_eq!(classifier.classify("ura", &strong), ScreenLabel::Lobby);
        // Patience was reset by the clean Lobby detection, so the very next
        // weak tick is evaluated at the primary threshold again, not relaxed.
        assert_eq!(classifier.classify("ura", &weak), ScreenLabel::Unknown);
        assert!(!classifier.is_relaxed());
    }
}
