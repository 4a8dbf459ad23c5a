use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

use crate::controller::ControllerKind;
use crate::model::{Preset, StatKey};
use crate::scenario::ScenarioKey;

use super::defaults::*;

fn default_hotkey() -> String {
    DEFAULT_HOTKEY.to_string()
}

fn default_auto_rest() -> u32 {
    DEFAULT_AUTO_REST_MINIMUM_ENERGY
}

fn default_undertrain_threshold() -> u32 {
    DEFAULT_UNDERTRAIN_THRESHOLD
}

fn default_skill_check_interval() -> u32 {
    DEFAULT_SKILL_CHECK_INTERVAL_TURNS
}

fn default_skill_pts_delta() -> i32 {
    DEFAULT_SKILL_PTS_DELTA
}

fn default_scenario() -> ScenarioKey {
    ScenarioKey::Ura
}

fn default_controller_mode() -> ControllerKind {
    ControllerKind::Desktop
}

/// `general` section: hotkey, debug, the few run-wide numeric gates,
/// the active scenario selection, and the controller backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneralConfig {
    #[serde(default = "default_hotkey")]
    pub hotkey: String,

    #[serde(default)]
    pub debug: bool,

    #[serde(default = "default_auto_rest")]
    pub auto_rest_minimum_energy: u32,

    #[serde(default = "default_undertrain_threshold")]
    pub undertrain_threshold: u32,

    #[serde(default)]
    pub top_stats_focus: Vec<StatKey>,

    #[serde(default = "default_skill_check_interval")]
    pub skill_check_interval_turns: u32,

    #[serde(default = "default_skill_pts_delta")]
    pub skill_pts_delta: i32,

    #[serde(default = "default_scenario")]
    pub scenario: ScenarioKey,

    #[serde(default = "default_controller_mode")]
    pub controller_mode: ControllerKind,

    /// Set once the user has confirmed the active scenario/preset pairing
    /// through the presentation UI; the core treats an unconfirmed
    /// scenario as a reason to refuse to start (fatal at load).
    #[serde(default)]
    pub scenario_confirmed: bool,

    /// Base URL of an out-of-process `Perception` backend, which may be
    /// local or remote. `None` means the binary entrypoint wires a local
    /// backend instead of `RemotePerception`.
    #[serde(default)]
    pub perception_backend_url: Option<String>,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            hotkey: default_hotkey(),
            debug: false,
            auto_rest_minimum_energy: default_auto_rest(),
            undertrain_threshold: default_undertrain_threshold(),
            top_stats_focus: Vec::new(),
            skill_check_interval_turns: default_skill_check_interval(),
            skill_pts_delta: default_skill_pts_delta(),
            scenario: default_scenario(),
            controller_mode: default_controller_mode(),
            scenario_confirmed: false,
            perception_backend_url: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioConfig {
    #[serde(default)]
    pub presets: Vec<Preset>,
}

/// Top-level configuration document: `general` plus
/// `scenarios.<key>.presets[]`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,

    #[serde(default)]
    pub scenarios: HashMap<ScenarioKey, ScenarioConfig>,
}

impl Config {
    /// The active scenario's first preset, if the scenario and a preset
    /// both exist. A real career always names a preset explicitly; this
    /// is a convenience for a freshly generated config with one preset.
    pub fn active_preset(&self) -> Option<&Preset> {
        self.scenarios.get(&self.general.scenario)?.presets.first()
    }

    pub fn waiter_interval(&self) -> Duration {
        default_waiter_interval()
    }

    pub fn waiter_overall_timeout(&self) -> Duration {
        default_waiter_overall_timeout()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_general_config_has_ura_scenario() {
        let general = GeneralConfig::default();
        assert_eq!(general.scenario, ScenarioKey::Ura);
        assert!(!general.scenario_confirmed);
    }

    #[test]
    fn active_preset_is_none_without_a_registered_scenario() {
        let config = Config::default();
        assert!(config.active_preset().is_none());
    }
}
