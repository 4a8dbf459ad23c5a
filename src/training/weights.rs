use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::model::Date;

fn default_rainbow() -> f32 {
    2.5
}
fn default_rainbow_combo() -> f32 {
    1.0
}
fn default_white_spirit_fill() -> f32 {
    0.3
}
fn default_white_spirit_exploded() -> f32 {
    1.5
}
fn default_white_combo() -> f32 {
    0.5
}
fn default_blue_spirit() -> f32 {
    0.8
}
fn default_blue_combo() -> f32 {
    0.4
}
fn default_hint() -> f32 {
    1.2
}
fn default_deadline_window_turns() -> i32 {
    4
}
fn default_deadline_boost() -> f32 {
    1.2
}
fn default_final_turns_burst_boost() -> f32 {
    1.1
}

/// Per-scenario scoring weights for the training evaluator. A plain
/// `Default` gives URA's weights; Unity Cup presets override the fields
/// that differ (seasonal multiplier, burst weighting) via config.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainingWeights {
    #[serde(default = "default_rainbow")]
    pub rainbow: f32,
    #[serde(default = "default_rainbow_combo")]
    pub rainbow_combo: f32,
    #[serde(default = "default_white_spirit_fill")]
    pub white_spirit_fill: f32,
    #[serde(default = "default_white_spirit_exploded")]
    pub white_spirit_exploded: f32,
    #[serde(default = "default_white_combo")]
    pub white_combo: f32,
    #[serde(default = "default_blue_spirit")]
    pub blue_spirit: f32,
    #[serde(default = "default_blue_combo")]
    pub blue_combo: f32,
    #[serde(default = "default_hint")]
    pub hint: f32,
    /// Per-support-card-name hint multiplier overrides; cards not listed
    /// use a multiplier of 1.0.
    #[serde(default)]
    pub hint_card_multipliers: HashMap<String, f32>,
    /// Unity Cup seasonal months (1..12) mapped to a multiplier applied to
    /// the whole SV; absent months default to 1.0. Empty for URA.
    #[serde(default)]
    pub seasonal_multipliers: HashMap<u8, f32>,
    #[serde(default = "default_deadline_window_turns")]
    pub deadline_window_turns: i32,
    #[serde(default = "default_deadline_boost")]
    pub deadline_boost: f32,
    #[serde(default = "default_final_turns_burst_boost")]
    pub final_turns_burst_boost: f32,
}

impl Default for TrainingWeights {
    fn default() -> Self {
        Self {
            rainbow: default_rainbow(),
            rainbow_combo: default_rainbow_combo(),
            white_spirit_fill: default_white_spirit_fill(),
            white_spirit_exploded: default_white_spirit_exploded(),
            white_combo: default_white_combo(),
            blue_spirit: default_blue_spirit(),
            blue_combo: default_blue_combo(),
            hint: default_hint(),
            hint_card_multipliers: HashMap::new(),
            seasonal_multipliers: HashMap::new(),
            deadline_window_turns: default_deadline_window_turns(),
            deadline_boost: default_deadline_boost(),
            final_turns_burst_boost: default_final_turns_burst_boost(),
        }
    }
}

impl TrainingWeights {
    pub fn hint_card_multiplier(&self, source: &str) -> f32 {
        self.hint_card_multipliers.get(source).copied().unwrap_or(1.0)
    }

    pub fn seasonal_multiplier(&self, date: Date) -> f32 {
        self.seasonal_multipliers
            .get(&date.month)
            .copied()
            .unwrap_or(1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unlisted_month_defaults_to_neutral_multiplier() {
        let weights = TrainingWeights::default();
        assert_eq!(weights.seasonal_multiplier(Date::new(2, 7, 1)), 1.0);
    }

    #[test]
    fn listed_month_uses_configured_multiplier() {
        let mut weights = TrainingWeights::default();
        weights.seasonal_multipliers.insert(7, 1.5);
        assert_eq!(weights.seasonal_multiplier(Date::new(2, 7, 1)), 1.5);
    }
}
