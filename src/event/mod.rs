//! Event decider: picks an option out of an in-game event dialog
//! given per-option outcome records, current energy, and entity/event
//! preference data.

use std::collections::HashMap;

use crate::model::{BBox, StatKey};

/// One reward a single event option grants, as read off its outcome panel.
#[derive(Debug, Clone, Default)]
pub struct EventOutcome {
    pub stat_deltas: HashMap<StatKey, i32>,
    pub energy_delta: i32,
    pub mood_delta: i32,
    pub hints: Vec<String>,
    pub skill_points: i32,
    pub status_effects: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct EventOption {
    pub bbox: BBox,
    pub outcome: EventOutcome,
}

/// The reward categories a priority list can rank, in the order an entity
/// might request them (e.g. skill_pts -> stats -> hints).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RewardCategory {
    SkillPoints,
    Stats,
    Hints,
    Energy,
    Mood,
}

/// Per-entity (support card / scenario / trainee) default behavior.
#[derive(Debug, Clone)]
pub struct EntityPreference {
    pub avoid_energy_overflow: bool,
    pub reward_priority: Vec<RewardCategory>,
}

/// An explicit per-event-step override, keyed by `event_key#step`.
pub type OverrideTable = HashMap<String, usize>;

fn option_reward_value(outcome: &EventOutcome, category: RewardCategory) -> i32 {
    match category {
        RewardCategory::SkillPoints => outcome.skill_points,
        RewardCategory::Stats => outcome.stat_deltas.values().sum(),
        RewardCategory::Hints => outcome.hints.len() as i32,
        RewardCategory::Energy => outcome.energy_delta,
        RewardCategory::Mood => outcome.mood_delta,
    }
}

fn would_overflow(outcome: &EventOutcome, current_energy: i32, energy_cap: i32) -> bool {
    current_energy + outcome.energy_delta > energy_cap
}

/// Pick an index into `options`, by the decision order:
/// 1. explicit override
/// 2. entity default preference (the option with the best score on the
///    preference's first reward category, ties broken by the next category)
/// 3. if the preferred option overflows and the entity avoids overflow,
///    rotate through the reward priority picking the first non-overflowing
///    option
/// 4. otherwise the preferred option
pub fn choose_option(
    event_key: &str,
    step: usize,
    options: &[EventOption],
    preference: &EntityPreference,
    overrides: &OverrideTable,
    current_energy: i32,
    energy_cap: i32,
) -> Option<usize> {
    if options.is_empty() {
        return None;
    }

    let override_key = format!("{event_key}#{step}");
    if let Some(&idx) = overrides.get(&override_key) {
        if idx < options.len() {
            return Some(idx);
        }
    }

    let preferred = best_by_priority(options, &preference.reward_priority);

    let Some(preferred_idx) = preferred else {
        return Some(0);
    };

    let preferred_overflows =
        would_overflow(&options[preferred_idx].outcome, current_energy, energy_cap);

    if preferred_overflows && preference.avoid_energy_overflow {
        for category in &preference.reward_priority {
            if let Some(idx) = best_candidate(options, *category, |opt| {
                !would_overflow(&opt.outcome, current_energy, energy_cap)
            }) {
                return Some(idx);
            }
        }
        // No non-overflowing option exists; fall through to the preferred pick.
    }

    Some(preferred_idx)
}

fn best_by_priority(options: &[EventOption], priority: &[RewardCategory]) -> Option<usize> {
    if priority.is_empty() {
        return Some(0);
    }
    for category in priority {
        if let Some(idx) = best_candidate(options, *category, |_| true) {
            return Some(idx);
        }
    }
    Some(0)
}

/// The index of the option with the highest value for `category` among
/// those passing `filter`, or `None` if none pass.
fn best_candidate(
    options: &[EventOption],
    category: RewardCategory,
    filter: impl Fn(&EventOption) -> bool,
) -> Option<usize> {
    options
        .iter()
        .enumerate()
        .filter(|(_, opt)| filter(opt))
        .map(|(i, opt)| (i, option_reward_value(&opt.outcome, category)))
        .max_by_key(|(_, value)| *value)
        .map(|(i, _)| i)
}

/// Acupuncturist-style two-phase dialogs: a follow-up dialog with
/// only accept/reconsider buttons is always auto-confirmed.
pub fn is_accept_reconsider_dialog(button_labels: &[String]) -> bool {
    let normalized: Vec<String> = button_labels
        .iter()
        .map(|s| s.to_lowercase())
        .collect();
    normalized.len() == 2
        && normalized.iter().any(|s| s.contains("accept"))
        && normalized.iter().any(|s| s.contains("reconsider"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bbox() -> BBox {
        BBox { x: 0, y: 0, width: 10, height: 10 }
    }

    fn option(skill_points: i32, energy_delta: i32) -> EventOption {
        EventOption {
            bbox: bbox(),
            outcome: EventOutcome {
                skill_points,
                energy_delta,
                ..Default::default()
            },
        }
    }

    #[test]
    fn explicit_override_wins_over_preference() {
        let options = vec![option(10, 0), option(0, 0)];
        let preference = EntityPreference {
            avoid_energy_overflow: false,
            reward_priority: vec![RewardCategory::SkillPoints],
        };
        let mut overrides = OverrideTable::new();
        overrides.insert("event_a#0".to_string(), 1);
        let chosen = choose_option("event_a", 0, &options, &preference, &overrides, 50, 100);
        assert_eq!(chosen, Some(1));
    }

    #[test]
    fn preference_picks_highest_priority_category() {
        let options = vec![option(0, 0), option(10, 0)];
        let preference = EntityPreference {
            avoid_energy_overflow: false,
            reward_priority: vec![RewardCategory::SkillPoints],
        };
        let overrides = OverrideTable::new();
        let chosen = choose_option("event_b", 0, &options, &preference, &overrides, 50, 100);
        assert_eq!(chosen, Some(1));
    }

    #[test]
    fn overflowing_preferred_option_is_skipped_when_avoiding_overflow() {
        let options = vec![option(10, 60), option(5, 0)];
        let preference = EntityPreference {
            avoid_energy_overflow: true,
            reward_priority: vec![RewardCategory::SkillPoints],
        };
        let overrides = OverrideTable::new();
        // current_energy 50 + energy_delta 60 > cap 100 for option 0.
        let chosen = choose_option("event_c", 0, &options, &preference, &overrides, 50, 100);
        assert_eq!(chosen, Some(1));
    }

    #[test]
    fn overflow_allowed_when_entity_does_not_avoid_it() {
        let options = vec![option(10, 60), option(5, 0)];
        let preference = EntityPreference {
            avoid_energy_overflow: false,
            reward_priority: vec![RewardCategory::SkillPoints],
        };
        let overrides = OverrideTable::new();
        let chosen = choose_option("event_d", 0, &options, &preference, &overrides, 50, 100);
        assert_eq!(chosen, Some(0));
    }

    #[test]
    fn accept_reconsider_dialog_is_recognized() {
        let labels = vec!["Accept".to_string(), "Reconsider".to_string()];
        assert!(is_accept_reconsider_dialog(&labels));
        let other = vec!["OK".to_string()];
        assert!(!is_accept_reconsider_dialog(&other));
    }
}
