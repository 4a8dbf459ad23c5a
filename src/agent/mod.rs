//! The agent loop: the top-level tick that perceives, classifies,
//! dispatches to a flow, acts, updates memory, and logs. Everything else in
//! this crate is a pure function or a narrow stateful helper the loop
//! calls into; this module is the only place that owns memory, holds the
//! scenario registry, and decides when to stop.

pub mod rules;
pub mod scan;

use tracing::{info, warn};

use crate::catalog::Catalog;
use crate::classifier::{Classifier, ScreenLabel};
use crate::config::Config;
use crate::event::{self, EntityPreference, RewardCategory};
use crate::logging::metrics;
use crate::logging::Metrics;
use crate::memory::{PalMemory, PlannedRaceIndex, SkillMemory};
use crate::model::{ActionResult, Date, HardFailReason, Mood, Preset, SoftFailReason, StatVector};
use crate::race::{run_race_flow, RaceContext};
use crate::scenario::{LobbyAction, ScenarioPolicy, ScenarioRegistry, TrainingDecisionInput};
use crate::skills::matcher::SkillQuery;
use crate::skills::run_skills_flow;
use crate::training::{filter_burst_eligible, rank_tiles, EvaluatorContext};
use crate::waiter::Waiter;

/// Energy is read off the same 0-100 gauge across both scenarios; no preset
/// or catalog entry ever names a different cap, so it's a fixed constant
/// rather than a configurable field.
const ENERGY_CAP: i32 = 100;

/// Everything about the current turn the agent loop needs that isn't
/// resolvable from the closed detection vocabulary alone — trainee energy,
/// mood, injury state, current stats, and the in-career date read off the
/// HUD. Parsing those out of OCR is the caller's job (they're free-form
/// numeric/text reads, not classifier detections); the loop only consumes
/// the result.
#[derive(Debug, Clone)]
pub struct TurnSnapshot {
    pub date: Date,
    pub energy: u32,
    pub mood: Mood,
    pub is_injured: bool,
    pub current_stats: StatVector,
}

/// What happened this tick, for the driver loop (main.rs) to act on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    Continue,
    Stopped,
    Stalled,
}

/// Process-wide state the loop owns exclusively: the three memory
/// managers, the classifier's patience counter, and the
/// date-monotonicity / stall-patience guards.
pub struct AgentLoop {
    config: Config,
    registry: ScenarioRegistry,
    classifier: Classifier,
    catalog: Catalog,
    skill_memory: SkillMemory,
    pal_memory: PalMemory,
    planned_races: PlannedRaceIndex,
    metrics: Metrics,
    last_accepted_date: Option<Date>,
    consecutive_noop_ticks: u32,
    stall_patience: u32,
    last_skill_check_date: Option<Date>,
    last_skill_check_points: i32,
}

impl AgentLoop {
    pub fn new(
        config: Config,
        registry: ScenarioRegistry,
        catalog: Catalog,
        skill_memory: SkillMemory,
        classifier_patience: u32,
        stall_patience: u32,
    ) -> Self {
        let mut classifier = Classifier::new(classifier_patience);
        classifier.register("ura", rules::default_rules());
        classifier.register("unity_cup", rules::default_rules());

        Self {
            config,
            registry,
            classifier,
            catalog,
            skill_memory,
            pal_memory: PalMemory::new(),
            planned_races: PlannedRaceIndex::new(),
            metrics: Metrics::new(),
            last_accepted_date: None,
            consecutive_noop_ticks: 0,
            stall_patience,
            last_skill_check_date: None,
            last_skill_check_points: 0,
        }
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    pub fn load_planned_races(&mut self, preset: &Preset) {
        self.planned_races = PlannedRaceIndex::load(
            preset
                .planned_races
                .iter()
                .map(|r| (r.date, r.race_name.clone(), r.tentative)),
        );
    }

    fn policy(&self) -> &dyn ScenarioPolicy {
        self.registry
            .get(self.config.general.scenario)
            .expect("active scenario must be registered before the loop starts")
    }

    fn preset(&self) -> &Preset {
        self.config
            .active_preset()
            .expect("config validation guarantees an active preset")
    }

    /// Reject a candidate date strictly earlier than the last accepted one.
    /// Returns the date the rest of the tick should treat as current.
    fn accept_date(&mut self, candidate: Date) -> Date {
        match self.last_accepted_date {
            Some(last) if candidate < last => {
                warn!(candidate = %candidate, last = %last, "rejected non-monotonic date, holding previous");
                last
            }
            _ => {
                self.last_accepted_date = Some(candidate);
                candidate
            }
        }
    }

    fn record_outcome(&mut self, result: &ActionResult) {
        match result {
            ActionResult::Ok => self.consecutive_noop_ticks = 0,
            ActionResult::NoMatch => self.consecutive_noop_ticks += 1,
            ActionResult::SoftFail(reason) => {
                self.consecutive_noop_ticks += 1;
                self.metrics.record_soft_fail(&reason.to_string());
            }
            ActionResult::HardFail(_) => {}
        }
    }

    /// Run one tick. `waiter` is borrowed for the duration; the caller owns
    /// the controller/perception backends across ticks.
    pub fn tick(&mut self, waiter: &mut Waiter, snapshot: TurnSnapshot) -> TickOutcome {
        if waiter.is_stopped() {
            return TickOutcome::Stopped;
        }

        let date = self.accept_date(snapshot.date);
        let detections = waiter.all_detections();
        let screen = self.policy().classify(&self.classifier, &detections);
        if self.classifier.is_relaxed() {
            self.metrics.record_relaxed_classification_fallback();
        }

        info!(kind = metrics::KIND_CLASSIFIER, ?screen, date = %date, "tick classified");

        let scenario_key = self.config.general.scenario.to_string();
        let pal = scan::scan_pal_state(waiter);
        self.pal_memory.reset_if_absent(&scenario_key, pal.icon_present);
        if pal.icon_present {
            self.pal_memory
                .record(&scenario_key, pal.icon_present, pal.chain_step, pal.next_step_yields_energy);
        }

        let result = match screen {
            ScreenLabel::Lobby => self.handle_lobby(waiter, &snapshot),
            ScreenLabel::Raceday => self.handle_raceday(waiter, date, true),
            ScreenLabel::Skills => self.handle_skills_only(waiter),
            ScreenLabel::Event => self.handle_event(waiter, &snapshot),
            ScreenLabel::Training
            | ScreenLabel::Inspiration
            | ScreenLabel::KashimotoTeam
            | ScreenLabel::ClawGame
            | ScreenLabel::Unknown => ActionResult::NoMatch,
        };

        self.planned_races.tick();
        if let Err(e) = self.skill_memory.persist() {
            warn!(error = %e, "failed to persist skill memory");
        }
        self.record_outcome(&result);
        self.metrics.log_snapshot();

        if self.consecutive_noop_ticks >= self.stall_patience {
            warn!(reason = %HardFailReason::Stalled, "agent stalled, stopping");
            return TickOutcome::Stalled;
        }
        if waiter.is_stopped() {
            return TickOutcome::Stopped;
        }
        TickOutcome::Continue
    }

    fn handle_lobby(&mut self, waiter: &mut Waiter, snapshot: &TurnSnapshot) -> ActionResult {
        let preset = self.preset().clone();
        let weights = self.policy().training_weights();
        let burst_allowed = self.policy().burst_allowed_stats();

        let tiles = scan::scan_training_tiles(waiter);
        let final_turn = Date::new(Date::FINALS_YEAR, 12, 2);
        let ctx = EvaluatorContext {
            current_date: snapshot.date,
            current_stats: &snapshot.current_stats,
            target_stats: &preset.target_stats,
            max_failure: 40.0,
            skill_memory: &self.skill_memory,
            weights: &weights,
            burst_allowed_stats: burst_allowed.as_deref(),
            turns_until_milestone: self.policy().milestone_date().map(|m| snapshot.date.turns_until(m)),
            turns_remaining: snapshot.date.turns_until(final_turn).max(0),
        };
        let ranked = rank_tiles(&tiles, &ctx);
        let eligible = filter_burst_eligible(&ranked, &ctx);
        let top_tile = eligible.first().map(|s| (s.tile.stat, s.sv));

        let planned = self.planned_races.race_for(snapshot.date);
        let planned_today = planned.is_some();
        let planned_tentative = planned.map(|(_, tentative)| tentative).unwrap_or(false);

        let input = TrainingDecisionInput {
            energy: snapshot.energy,
            auto_rest_minimum_energy: preset.auto_rest_minimum_energy,
            turns_until_summer: Some(snapshot.date.turns_until_next_summer()),
            is_goal_race_within_force_turns: self.is_goal_race_within_force_turns(snapshot.date, &preset),
            is_injured: snapshot.is_injured,
            pal_next_energy: self.pal_memory.any_next_energy(),
            top_tile,
            weak_turn_sv_threshold: preset.weak_turn_sv_threshold,
            race_precheck_sv: preset.race_precheck_sv,
            lobby_precheck_enabled: preset.lobby_precheck_enabled,
            race_if_no_good_value: preset.race_if_no_good_value,
            planned_race_today: planned_today,
            planned_race_tentative: planned_tentative,
        };

        let action = self.policy().on_lobby(&input);
        info!(kind = metrics::KIND_WAITER, ?action, "lobby decision");

        match action {
            LobbyAction::Train(stat) => {
                let class = format!("training_tile_{}", stat.to_string().to_lowercase());
                waiter.try_click_once(&[&class], None, 0.6);
                ActionResult::Ok
            }
            LobbyAction::Race => self.handle_raceday(waiter, snapshot.date, false),
            LobbyAction::Rest => {
                waiter.try_click_once(&["rest_button"], None, 0.6);
                ActionResult::Ok
            }
            LobbyAction::Recreate => {
                waiter.try_click_once(&["recreation_button"], None, 0.6);
                ActionResult::Ok
            }
            LobbyAction::Infirmary => {
                waiter.try_click_once(&["infirmary_button"], None, 0.6);
                ActionResult::Ok
            }
            LobbyAction::Skills => self.handle_skills_only(waiter),
            LobbyAction::NoOp => ActionResult::NoMatch,
        }
    }

    /// A race counts as a forced goal race when the preset's planned-race
    /// list names it within `goal_race_force_turns` of today and the
    /// catalog confirms that date actually carries a goal race.
    fn is_goal_race_within_force_turns(&self, date: Date, preset: &Preset) -> bool {
        preset.planned_races.iter().any(|r| {
            let turns = date.turns_until(r.date);
            turns >= 0
                && (turns as u32) <= preset.goal_race_force_turns
                && self
                    .catalog
                    .races_on(r.date)
                    .iter()
                    .any(|c| c.name == r.race_name && c.is_goal_race)
        })
    }

    /// Gate the skills flow on both a minimum turn interval and a minimum
    /// skill-points gain since the last check, so the flow doesn't re-enter
    /// and re-scroll the skill list every single raceday tick.
    fn skill_check_gate_passes(&self, date: Date, skill_points: i32) -> bool {
        let interval_elapsed = match self.last_skill_check_date {
            None => true,
            Some(last) => last.turns_until(date) >= self.config.general.skill_check_interval_turns as i32,
        };
        let points_gained = skill_points - self.last_skill_check_points;
        interval_elapsed && points_gained >= self.config.general.skill_pts_delta
    }

    /// Raceday mediates Skills then Race, never the other way around.
    /// `already_inside_raceday` distinguishes a tick where the classifier
    /// found the race-day screen directly (true) from one where the Lobby
    /// policy decided to race and still needs `run_race_flow` to navigate
    /// there first (false).
    fn handle_raceday(&mut self, waiter: &mut Waiter, date: Date, already_inside_raceday: bool) -> ActionResult {
        let preset = self.preset().clone();
        if !preset.skills_to_buy.is_empty() {
            let skill_points = scan::scan_skill_points(waiter);
            if self.skill_check_gate_passes(date, skill_points) {
                self.last_skill_check_date = Some(date);
                self.last_skill_check_points = skill_points;
                let skills_result = self.run_skills(waiter);
                if skills_result.is_fatal() {
                    return skills_result;
                }
            }
        }

        let planned = self.planned_races.race_for(date).map(|(name, _)| name.to_string());
        let style = preset.style_for(date);
        let is_debut = date == Date::new(1, 1, 1);

        let ctx = RaceContext {
            planned_race_title: planned.as_deref(),
            scheduled_style: style,
            last_applied_style: None,
            is_debut,
            junior_style: preset.debut_style,
            try_again_on_failed_goal: preset.try_again_on_failed_goal,
            is_goal_race: self.is_goal_race_within_force_turns(date, &preset),
            already_inside_raceday,
            decline_consecutive_race: preset.decline_consecutive_race,
        };

        let result = run_race_flow(waiter, &ctx);
        if matches!(result, ActionResult::SoftFail(SoftFailReason::NoPlannedMatch)) {
            self.planned_races.mark_skipped(date, preset.planned_race_skip_cooldown);
            self.metrics.record_skipped_planned_race_hit();
            info!(kind = metrics::KIND_PLANNED_RACE, %date, "skip_guard=1 after failure");
        }
        info!(kind = metrics::KIND_RACE, ?result, "raceday flow finished");
        result
    }

    fn handle_skills_only(&mut self, waiter: &mut Waiter) -> ActionResult {
        self.run_skills(waiter)
    }

    fn run_skills(&mut self, waiter: &mut Waiter) -> ActionResult {
        let preset = self.preset().clone();
        let queries: Vec<SkillQuery> = preset.skills_to_buy.iter().map(|s| SkillQuery::parse(s)).collect();
        if queries.is_empty() {
            return ActionResult::NoMatch;
        }
        let scroll_positions = scan::scan_skill_scroll_positions(waiter);
        let result = run_skills_flow(waiter, &mut self.skill_memory, &queries, &scroll_positions);
        info!(kind = metrics::KIND_SKILLS, ?result, "skills flow finished");
        result
    }

    /// Default reward-priority ordering per entity type, used whenever the
    /// catalog carries no entry for the scanned event key.
    fn default_preference_for_entity(entity_type: &str) -> EntityPreference {
        let reward_priority = match entity_type {
            "trainee" => vec![RewardCategory::Stats, RewardCategory::SkillPoints, RewardCategory::Hints],
            _ => vec![RewardCategory::SkillPoints, RewardCategory::Stats, RewardCategory::Hints],
        };
        EntityPreference {
            avoid_energy_overflow: true,
            reward_priority,
        }
    }

    fn handle_event(&mut self, waiter: &mut Waiter, snapshot: &TurnSnapshot) -> ActionResult {
        let options = scan::scan_event_options(waiter);
        if options.is_empty() {
            return ActionResult::NoMatch;
        }

        let key = scan::scan_event_key(waiter);
        let (lookup_base, step, entity_type) = match &key {
            Some(k) => (
                format!("{}/{}/{}/{}/{}", k.entity_type, k.entity_name, k.attr, k.rarity, k.event_name),
                k.step,
                k.entity_type.as_str(),
            ),
            None => ("unknown_event".to_string(), 0, "unknown"),
        };

        let catalog_entry = key.as_ref().and_then(|k| self.catalog.event(k));
        let preference = Self::default_preference_for_entity(entity_type);
        let mut overrides = event::OverrideTable::new();
        if let Some(idx) = catalog_entry.and_then(|e| e.option_override) {
            overrides.insert(format!("{lookup_base}#{step}"), idx);
        }

        let chosen = event::choose_option(
            &lookup_base,
            step,
            &options,
            &preference,
            &overrides,
            snapshot.energy as i32,
            ENERGY_CAP,
        );

        match chosen {
            Some(idx) => {
                let (x, y) = options[idx].bbox.center();
                waiter.click_at(x, y);
                info!(kind = metrics::KIND_EVENT, option = idx, "event option chosen");

                let followup = scan::scan_event_buttons(waiter);
                let labels: Vec<String> = followup.iter().map(|(_, label)| label.clone()).collect();
                if event::is_accept_reconsider_dialog(&labels) {
                    if let Some((bbox, _)) = followup.iter().find(|(_, l)| l.to_lowercase().contains("accept")) {
                        let (x, y) = bbox.center();
                        waiter.click_at(x, y);
                    }
                }

                ActionResult::Ok
            }
            None => ActionResult::NoMatch,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::mock::MockController;
    use crate::controller::ControllerKind;
    use crate::memory::SkillMemory;
    use crate::model::{Detection, StatVector};
    use crate::perception::mock::MockPerception;
    use crate::scenario::ura::UraPolicy;
    use crate::waiter::StopFlag;

    fn config_with_preset() -> Config {
        let mut config = Config::default();
        config.general.scenario_confirmed = true;
        config.general.controller_mode = ControllerKind::Mock;
        let preset = Preset {
            name: "test".into(),
            priority_stats: vec![],
            target_stats: StatVector::new(),
            min_mood: Mood::Normal,
            junior_min_mood: None,
            debut_style: None,
            style_schedule: vec![],
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
            scenario_advanced: Default::default(),
        };
        config
            .scenarios
            .entry(crate::scenario::ScenarioKey::Ura)
            .or_default()
            .presets
            .push(preset);
        config
    }

    fn loop_with_lobby_registered() -> AgentLoop {
        let mut registry = ScenarioRegistry::new();
        registry.register(Box::new(UraPolicy::new()));
        let dir = tempfile::tempdir().unwrap();
        let skill_memory = SkillMemory::load(dir.path().join("skills.json"));
        AgentLoop::new(config_with_preset(), registry, Catalog::new(), skill_memory, 3, 5)
    }

    #[test]
    fn date_monotonicity_rejects_earlier_candidate() {
        let mut agent = loop_with_lobby_registered();
        let later = agent.accept_date(Date::new(2, 6, 1));
        assert_eq!(later, Date::new(2, 6, 1));
        let held = agent.accept_date(Date::new(2, 1, 1));
        assert_eq!(held, Date::new(2, 6, 1));
    }

    #[test]
    fn stall_patience_triggers_after_consecutive_noops() {
        let mut agent = loop_with_lobby_registered();
        let mut controller = MockController::new();
        let perception = MockPerception::new();
        let stop = StopFlag::new();
        perception.push_frame(Vec::<Detection>::new());
        let snapshot = TurnSnapshot {
            date: Date::new(1, 1, 1),
            energy: 80,
            mood: Mood::Normal,
            is_injured: false,
            current_stats: StatVector::new(),
        };
        let mut outcome = TickOutcome::Continue;
        for _ in 0..6 {
            perception.push_frame(Vec::<Detection>::new());
            let mut waiter = Waiter::new(&mut controller, &perception, stop.clone(), "test");
            outcome = agent.tick(&mut waiter, snapshot.clone());
            if outcome == TickOutcome::Stalled {
                break;
            }
        }
        assert_eq!(outcome, TickOutcome::Stalled);
    }
}
