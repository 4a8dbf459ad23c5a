use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::date::Date;
use super::mood::Mood;
use super::stat::{StatKey, StatVector};
use super::style::Style;

fn default_true() -> bool {
    true
}

fn default_false() -> bool {
    false
}

fn default_cooldown() -> u32 {
    2
}

/// One (Date, Style) entry in a preset's ordered style schedule: applied
/// once the career date reaches `from`, and stays applied until superseded
/// by a later entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StyleScheduleEntry {
    pub from: Date,
    pub style: Style,
}

/// A preset-scheduled race. `tentative` races may be pre-empted by a
/// strong-enough training tile (see the training policy's lobby-precheck).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlannedRaceEntry {
    pub date: Date,
    pub race_name: String,
    #[serde(default = "default_false")]
    pub tentative: bool,
}

/// Per-run configuration. Every field that isn't load-bearing to a concrete
/// career has a default, via a per-field `#[serde(default = "default_x")]`
/// convention, so a partially specified preset document still loads.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preset {
    pub name: String,

    /// Stat keys in descending priority order for tie-breaking the training
    /// evaluator and headroom scoring.
    #[serde(default)]
    pub priority_stats: Vec<StatKey>,

    pub target_stats: StatVector,

    #[serde(default = "default_min_mood")]
    pub min_mood: Mood,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub junior_min_mood: Option<Mood>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debut_style: Option<Style>,

    #[serde(default)]
    pub style_schedule: Vec<StyleScheduleEntry>,

    #[serde(default)]
    pub skills_to_buy: Vec<String>,

    #[serde(default)]
    pub planned_races: Vec<PlannedRaceEntry>,

    #[serde(default = "default_true")]
    pub race_if_no_good_value: bool,

    #[serde(default = "default_weak_turn_sv")]
    pub weak_turn_sv_threshold: f32,

    #[serde(default = "default_race_precheck_sv")]
    pub race_precheck_sv: f32,

    #[serde(default = "default_true")]
    pub lobby_precheck_enabled: bool,

    #[serde(default = "default_goal_race_force_turns")]
    pub goal_race_force_turns: u32,

    #[serde(default = "default_true")]
    pub try_again_on_failed_goal: bool,

    #[serde(default = "default_auto_rest_minimum")]
    pub auto_rest_minimum_energy: u32,

    #[serde(default = "default_cooldown")]
    pub planned_race_skip_cooldown: u32,

    /// Whether to refuse the consecutive-race penalty dialog (outside of
    /// the always-accept exception when already inside Raceday).
    #[serde(default = "default_false")]
    pub decline_consecutive_race: bool,

    /// Scenario-specific advanced knobs; left opaque to the base preset and
    /// interpreted by the owning `ScenarioPolicy` (e.g. Unity Cup's burst
    /// allow-list, scoring weights, seasonal multipliers, opponent picks).
    #[serde(default)]
    pub scenario_advanced: HashMap<String, serde_json::Value>,
}

fn default_min_mood() -> Mood {
    Mood::Normal
}

fn default_weak_turn_sv() -> f32 {
    2.5
}

fn default_race_precheck_sv() -> f32 {
    3.0
}

fn default_goal_race_force_turns() -> u32 {
    1
}

fn default_auto_rest_minimum() -> u32 {
    20
}

impl Preset {
    /// The effective minimum mood gate for the given date: junior-only
    /// override when present and the date is still junior, else the base
    /// minimum mood.
    pub fn effective_min_mood(&self, date: Date) -> Mood {
        if date.is_junior() {
            self.junior_min_mood.unwrap_or(self.min_mood)
        } else {
            self.min_mood
        }
    }

    /// The style that should be applied at `date`, per the ordered
    /// schedule: the last entry whose `from` is ≤ `date`, falling back to
    /// `debut_style` before any schedule entry has been reached.
    pub fn style_for(&self, date: Date) -> Option<Style> {
        self.style_schedule
            .iter()
            .filter(|entry| entry.from <= date)
            .max_by_key(|entry| entry.from)
            .map(|entry| entry.style)
            .or(self.debut_style)
    }

    pub fn planned_race_at(&self, date: Date) -> Option<&PlannedRaceEntry> {
        self.planned_races.iter().find(|r| r.date == date)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn preset_with_schedule() -> Preset {
        Preset {
            name: "test".into(),
            priority_stats: vec![],
            target_stats: StatVector::new(),
            min_mood: Mood::Normal,
            junior_min_mood: Some(Mood::Bad),
            debut_style: Some(Style::Late),
            style_schedule: vec![
                StyleScheduleEntry {
                    from: Date::new(2, 1, 1),
                    style: Style::Pace,
                },
                StyleScheduleEntry {
                    from: Date::new(3, 1, 1),
                    style: Style::Front,
                },
            ],
            skills_to_buy: vec![],
            planned_races: vec![],
            race_if_no_good_value: true,
            weak_turn_sv_threshold: 2.5,
            race_precheck_sv: 3.0,
            lobby_precheck_enabled: true,
            goal_race_force_turns: 1,
            try_again_on_failed_goal: true,
            auto_rest_minimum_energy: 20,
            planned_race_skip_cooldown: 2,
            decline_consecutive_race: false,
            scenario_advanced: HashMap::new(),
        }
    }

    #[test]
    fn style_for_falls_back_to_debut_before_first_entry() {
        let preset = preset_with_schedule();
        assert_eq!(preset.style_for(Date::new(1, 6, 1)), Some(Style::Late));
    }

    #[test]
    fn style_for_picks_latest_applicable_entry() {
        let preset = preset_with_schedule();
        assert_eq!(preset.style_for(Date::new(2, 6, 1)), Some(Style::Pace));
        assert_eq!(preset.style_for(Date::new(3, 6, 1)), Some(Style::Front));
    }

    #[test]
    fn effective_min_mood_uses_junior_override() {
        let preset = preset_with_schedule();
        assert_eq!(preset.effective_min_mood(Date::new(1, 1, 1)), Mood::Bad);
        assert_eq!(preset.effective_min_mood(Date::new(2, 1, 1)), Mood::Normal);
    }
}
