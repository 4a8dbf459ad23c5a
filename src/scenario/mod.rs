//! Scenario registry and policy trait: the one seam where URA and
//! Unity Cup diverge. Expressed as a trait + a key-to-Box registry rather
//! than runtime duck-typing, so dispatch is a single vtable call per tick.

pub mod unity_cup;
pub mod ura;

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::classifier::ScreenLabel;
use crate::model::{Date, Detection, StatKey};
use crate::training::weights::TrainingWeights;

/// Late-Senior deadline used by the training evaluator's deadline-boost
/// multiplier. Shared by both scenarios; neither has reason to diverge
/// from this milestone today.
const LATE_SENIOR_MILESTONE: Date = Date { year_code: 3, month: 7, half: 1 };

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioKey {
    Ura,
    UnityCup,
}

impl fmt::Display for ScenarioKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ScenarioKey::Ura => "ura",
            ScenarioKey::UnityCup => "unity_cup",
        };
        f.write_str(s)
    }
}

/// What the lobby/training policy decided to do this tick. The agent loop
/// turns this into the corresponding flow invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LobbyAction {
    Train(StatKey),
    Race,
    Rest,
    Recreate,
    Infirmary,
    Skills,
    NoOp,
}

/// Everything `choose_training_action` needs that isn't already folded
/// into the training evaluator's output.
#[derive(Debug, Clone, Copy)]
pub struct TrainingDecisionInput {
    pub energy: u32,
    pub auto_rest_minimum_energy: u32,
    pub turns_until_summer: Option<i32>,
    pub is_goal_race_within_force_turns: bool,
    pub is_injured: bool,
    pub pal_next_energy: bool,
    pub top_tile: Option<(StatKey, f32)>,
    pub weak_turn_sv_threshold: f32,
    pub race_precheck_sv: f32,
    pub lobby_precheck_enabled: bool,
    pub race_if_no_good_value: bool,
    pub planned_race_today: bool,
    /// Whether today's planned race is tentative, i.e. allowed to be
    /// pre-empted by a strong enough training tile under the lobby precheck.
    pub planned_race_tentative: bool,
}

/// Scenario-specific behavior. URA and Unity Cup each implement this; the
/// registry hands the agent loop a `&dyn ScenarioPolicy` keyed by the
/// active career's scenario.
pub trait ScenarioPolicy: Send + Sync {
    fn key(&self) -> ScenarioKey;

    /// Classify a detection set into a screen label using this scenario's
    /// class-rule priority (backed by the shared `Classifier`).
    fn classify(&self, classifier: &crate::classifier::Classifier, detections: &[Detection]) -> ScreenLabel;

    fn on_lobby(&self, input: &TrainingDecisionInput) -> LobbyAction {
        choose_training_action(input)
    }

    /// Scenario-specific training weights fed to the evaluator
    /// (`preset.scenarioAdvanced` for Unity Cup, scenario defaults for URA).
    fn training_weights(&self) -> TrainingWeights;

    /// Unity Cup only: stats eligible for a blue-burst pick. URA returns
    /// `None`, disabling burst filtering entirely.
    fn burst_allowed_stats(&self) -> Option<Vec<StatKey>> {
        None
    }

    /// Date of this scenario's deadline milestone for the training
    /// evaluator's deadline-boost multiplier. `None` disables the boost.
    fn milestone_date(&self) -> Option<Date> {
        Some(LATE_SENIOR_MILESTONE)
    }
}

/// Decision function shared by every policy's default `on_lobby`, kept
/// free so it can be unit-tested without a concrete policy.
pub fn choose_training_action(input: &TrainingDecisionInput) -> LobbyAction {
    if input.is_goal_race_within_force_turns {
        return LobbyAction::Race;
    }
    if input.is_injured {
        return LobbyAction::Infirmary;
    }
    if input.energy < input.auto_rest_minimum_energy {
        return LobbyAction::Rest;
    }
    if input.turns_until_summer.map_or(false, |t| t <= 2)
        && input.energy < input.auto_rest_minimum_energy.saturating_mul(2)
    {
        return LobbyAction::Rest;
    }

    let mut baseline = if input.planned_race_today {
        LobbyAction::Race
    } else if let Some((stat, sv)) = input.top_tile {
        if sv >= input.weak_turn_sv_threshold {
            LobbyAction::Train(stat)
        } else if input.race_if_no_good_value {
            LobbyAction::Race
        } else if input.pal_next_energy {
            LobbyAction::Recreate
        } else {
            LobbyAction::Rest
        }
    } else if input.pal_next_energy {
        LobbyAction::Recreate
    } else {
        LobbyAction::Rest
    };

    if input.lobby_precheck_enabled {
        if let Some((stat, sv)) = input.top_tile {
            let overridable = matches!(baseline, LobbyAction::Rest | LobbyAction::Infirmary)
                || (baseline == LobbyAction::Race && input.planned_race_tentative);
            if sv >= input.race_precheck_sv
                && overridable
                && input.energy > input.auto_rest_minimum_energy
            {
                baseline = LobbyAction::Train(stat);
            }
        }
    }

    baseline
}

/// Maps a scenario key to its policy object.
#[derive(Default)]
pub struct ScenarioRegistry {
    policies: HashMap<ScenarioKey, Box<dyn ScenarioPolicy>>,
}

impl ScenarioRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, policy: Box<dyn ScenarioPolicy>) {
        self.policies.insert(policy.key(), policy);
    }

    pub fn get(&self, key: ScenarioKey) -> Option<&dyn ScenarioPolicy> {
        self.policies.get(&key).map(|b| b.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_input() -> TrainingDecisionInput {
        TrainingDecisionInput {
            energy: 80,
            auto_rest_minimum_energy: 20,
            turns_until_summer: None,
            is_goal_race_within_force_turns: false,
            is_injured: false,
            pal_next_energy: false,
            top_tile: None,
            weak_turn_sv_threshold: 2.5,
            race_precheck_sv: 3.0,
            lobby_precheck_enabled: true,
            race_if_no_good_value: true,
            planned_race_today: false,
            planned_race_tentative: false,
        }
    }

    #[test]
    fn goal_race_force_turns_overrides_everything() {
        let mut input = base_input();
        input.is_goal_race_within_force_turns = true;
        input.energy = 1;
        assert_eq!(choose_training_action(&input), LobbyAction::Race);
    }

    #[test]
    fn low_energy_forces_rest_even_with_strong_tile() {
        let mut input = base_input();
        input.energy = 5;
        input.top_tile = Some((StatKey::Spd, 10.0));
        assert_eq!(choose_training_action(&input), LobbyAction::Rest);
    }

    #[test]
    fn lobby_precheck_converts_rest_into_training() {
        let mut input = base_input();
        input.race_if_no_good_value = false;
        input.top_tile = Some((StatKey::Spd, 5.0));
        input.weak_turn_sv_threshold = 10.0; // below threshold -> baseline Rest
        assert_eq!(
            choose_training_action(&input),
            LobbyAction::Train(StatKey::Spd)
        );
    }

    #[test]
    fn tentative_planned_race_is_preempted_by_a_strong_tile() {
        let mut input = base_input();
        input.planned_race_today = true;
        input.planned_race_tentative = true;
        input.top_tile = Some((StatKey::Wit, 10.0));
        input.race_precheck_sv = 3.0;
        assert_eq!(
            choose_training_action(&input),
            LobbyAction::Train(StatKey::Wit)
        );
    }

    #[test]
    fn non_tentative_planned_race_is_not_preempted() {
        let mut input = base_input();
        input.planned_race_today = true;
        input.planned_race_tentative = false;
        input.top_tile = Some((StatKey::Wit, 10.0));
        input.race_precheck_sv = 3.0;
        assert_eq!(choose_training_action(&input), LobbyAction::Race);
    }

    #[test]
    fn summer_approach_with_low_energy_forces_rest() {
        let mut input = base_input();
        input.turns_until_summer = Some(1);
        input.energy = 30;
        assert_eq!(choose_training_action(&input), LobbyAction::Rest);
    }

    #[test]
    fn registry_resolves_by_key() {
        let mut registry = ScenarioRegistry::new();
        registry.register(Box::new(ura::UraPolicy::new()));
        assert!(registry.get(ScenarioKey::Ura).is_some());
        assert!(registry.get(ScenarioKey::UnityCup).is_none());
    }
}
