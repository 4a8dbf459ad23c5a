//! Race flow: an explicit state machine from the Lobby into a race
//! and back, modeled as a sequence of Waiter-driven steps rather than a
//! trait object per state — the transitions are fixed and linear, so a
//! plain function per state keeps the control flow readable.

use std::time::Duration;
use tracing::{info, warn};

use crate::model::{normalize_text, ActionResult, BBox, Style};
use crate::waiter::{Waiter, WaiterResult};

const RACEDAY_BUTTON: &str = "race_day_banner";
const CONSECUTIVE_DIALOG_ACCEPT: &str = "consecutive_race_accept_button";
const CONSECUTIVE_DIALOG_DECLINE: &str = "consecutive_race_decline_button";
const RACE_SQUARE: &str = "race_square";
const RACE_BUTTON: &str = "race_button_green";
const ADJACENT_FORBID: &[&str] = &["cancel", "back"];
const STRATEGY_BUTTON: &str = "strategy_change_button";
const STRATEGY_OPTION_PREFIX: &str = "strategy_option";
const RACE_START_CONFIRM: &str = "race_start_confirm_button";
const VIEW_RESULTS_BUTTON: &str = "view_results_button";
const NEXT_BUTTON: &str = "next_button";
const RACE_AFTER_NEXT_BUTTON: &str = "race_after_next_button";
const LOSS_MARKER: &str = "race_loss_marker";
const TRY_AGAIN_BUTTON: &str = "try_again_button";
const CONTINUE_WITHOUT_RETRY_BUTTON: &str = "continue_without_retry_button";
const ALARM_CLOCK_CONFIRM: &str = "alarm_clock_confirm_button";
const LOBBY_MARKER: &str = "lobby_marker";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(8);
const MAX_LOSS_RETRIES: u32 = 3;

pub struct RaceContext<'a> {
    /// Title of the currently planned race for this date, if any, used to
    /// disambiguate `PickRaceSquare` via OCR instead of star-count.
    pub planned_race_title: Option<&'a str>,
    pub scheduled_style: Option<Style>,
    pub last_applied_style: Option<Style>,
    pub is_debut: bool,
    pub junior_style: Option<Style>,
    pub try_again_on_failed_goal: bool,
    pub is_goal_race: bool,
    pub already_inside_raceday: bool,
    pub decline_consecutive_race: bool,
}

/// Run the whole flow; returns the terminal `ActionResult` the caller
/// (scenario policy / agent loop) should act on.
pub fn run_race_flow(waiter: &mut Waiter, ctx: &RaceContext) -> ActionResult {
    if let Err(result) = ensure_raceday(waiter, ctx) {
        return result;
    }

    let square = match pick_race_square(waiter, ctx) {
        Ok(square) => square,
        Err(result) => return result,
    };

    if let Err(result) = click_race_button(waiter, &square) {
        return result;
    }

    if let Err(result) = pre_lobby_gate(waiter) {
        return result;
    }

    set_strategy(waiter, ctx);

    if let Err(result) = run_race(waiter) {
        return result;
    }

    post_race_lobby(waiter, ctx, 0)
}

/// A race square as resolved by `pick_race_square`, carrying just enough
/// to click the RACE button afterward.
struct RaceSquare {
    stars: u32,
    bbox: BBox,
}

fn ensure_raceday(waiter: &mut Waiter, ctx: &RaceContext) -> Result<(), ActionResult> {
    if !ctx.already_inside_raceday
        && waiter.seen(&[RACEDAY_BUTTON], 0.7, None, None, DEFAULT_TIMEOUT).is_none()
    {
        let result = waiter.click_when(
            &[RACEDAY_BUTTON],
            None,
            None,
            0.7,
            true,
            true,
            DEFAULT_TIMEOUT,
        );
        if result != WaiterResult::Ok {
            return Err(ActionResult::SoftFail(
                crate::model::SoftFailReason::NoRaceFound,
            ));
        }
    }

    // Consecutive-race penalty dialog, if present. When already inside
    // Raceday the exception is to always accept, never skip the probe.
    let dialog = waiter.snap(
        &[CONSECUTIVE_DIALOG_ACCEPT, CONSECUTIVE_DIALOG_DECLINE],
        0.7,
    );
    if !dialog.is_empty() {
        if ctx.decline_consecutive_race && !ctx.already_inside_raceday {
            waiter.try_click_once(&[CONSECUTIVE_DIALOG_DECLINE], None, 0.7);
            return Err(ActionResult::SoftFail(
                crate::model::SoftFailReason::ConsecutiveRaceRefused,
            ));
        }
        waiter.try_click_once(&[CONSECUTIVE_DIALOG_ACCEPT], None, 0.7);
    }

    Ok(())
}

fn pick_race_square(waiter: &mut Waiter, ctx: &RaceContext) -> Result<RaceSquare, ActionResult> {
    if let Some(title) = ctx.planned_race_title {
        let texts = [title];
        let found = waiter.seen(&[RACE_SQUARE], 0.6, Some(&texts), None, DEFAULT_TIMEOUT);
        let square = match found {
            Some(detection) => RaceSquare { stars: 0, bbox: detection.bbox },
            None => {
                return Err(ActionResult::SoftFail(
                    crate::model::SoftFailReason::NoPlannedMatch,
                ))
            }
        };
        let (x, y) = square.bbox.center();
        waiter.click_at(x, y);
        return Ok(square);
    }

    const STAR_THRESHOLD: u32 = 2;
    let candidates = waiter.snap(&[RACE_SQUARE], 0.6);
    if candidates.is_empty() {
        return Err(ActionResult::SoftFail(
            crate::model::SoftFailReason::NoRaceFound,
        ));
    }
    // Star/badge signal is read by the caller's perception layer and baked
    // into confidence for this prototype; a real implementation would
    // thread star-count through a dedicated detection field. Pick the
    // strongest-confidence candidate as the recommended square.
    let best = candidates
        .into_iter()
        .max_by(|a, b| a.confidence.partial_cmp(&b.confidence).unwrap_or(std::cmp::Ordering::Equal))
        .expect("candidates checked non-empty above");
    let square = RaceSquare { stars: STAR_THRESHOLD, bbox: best.bbox };
    let (x, y) = square.bbox.center();
    waiter.click_at(x, y);
    Ok(square)
}

fn click_race_button(waiter: &mut Waiter, _square: &RaceSquare) -> Result<(), ActionResult> {
    let result = waiter.click_when(
        &[RACE_BUTTON],
        None,
        Some(ADJACENT_FORBID),
        0.7,
        false,
        true,
        DEFAULT_TIMEOUT,
    );
    match result {
        WaiterResult::Ok => Ok(()),
        WaiterResult::NoMatch => Err(ActionResult::SoftFail(
            crate::model::SoftFailReason::NoRaceFound,
        )),
        WaiterResult::Aborted => Err(ActionResult::HardFail(
            crate::model::HardFailReason::Aborted,
        )),
    }
}

fn pre_lobby_gate(waiter: &mut Waiter) -> Result<(), ActionResult> {
    if waiter
        .seen(&[STRATEGY_BUTTON], 0.7, None, None, DEFAULT_TIMEOUT)
        .is_some()
    {
        Ok(())
    } else {
        Err(ActionResult::SoftFail(
            crate::model::SoftFailReason::ButtonsMissing,
        ))
    }
}

fn set_strategy(waiter: &mut Waiter, ctx: &RaceContext) {
    let desired = if ctx.is_debut {
        ctx.junior_style.or(ctx.scheduled_style)
    } else {
        ctx.scheduled_style
    };

    let Some(style) = desired else { return };
    if ctx.last_applied_style == Some(style) {
        return;
    }

    if waiter
        .try_click_once(&[STRATEGY_BUTTON], None, 0.7)
        .is_ok_result()
    {
        let option_class = format!("{STRATEGY_OPTION_PREFIX}_{}", normalize_text(&style.to_string()));
        waiter.try_click_once(&[option_class.as_str()], None, 0.7);
    }
}

fn run_race(waiter: &mut Waiter) -> Result<(), ActionResult> {
    let result = waiter.click_when(
        &[RACE_START_CONFIRM],
        None,
        None,
        0.7,
        true,
        true,
        DEFAULT_TIMEOUT,
    );
    match result {
        WaiterResult::Ok => Ok(()),
        WaiterResult::NoMatch => Err(ActionResult::SoftFail(
            crate::model::SoftFailReason::ButtonsMissing,
        )),
        WaiterResult::Aborted => Err(ActionResult::HardFail(
            crate::model::HardFailReason::Aborted,
        )),
    }
}

fn post_race_lobby(waiter: &mut Waiter, ctx: &RaceContext, retries: u32) -> ActionResult {
    // View Results only becomes clickable once results are ready; an
    // inactive/absent button means the race is still resolving.
    if waiter
        .seen(&[VIEW_RESULTS_BUTTON], 0.75, None, None, Duration::from_secs(30))
        .is_none()
    {
        return ActionResult::SoftFail(crate::model::SoftFailReason::ButtonsMissing);
    }
    waiter.try_click_once(&[VIEW_RESULTS_BUTTON], None, 0.75);

    if waiter.seen(&[LOSS_MARKER], 0.7, None, None, Duration::from_secs(3)).is_some() {
        return loss_retry(waiter, ctx, retries);
    }

    for class in [NEXT_BUTTON, RACE_AFTER_NEXT_BUTTON] {
        waiter.click_when(&[class], None, None, 0.7, true, true, DEFAULT_TIMEOUT);
    }

    info!("[race] race completed without loss");
    ActionResult::Ok
}

fn loss_retry(waiter: &mut Waiter, ctx: &RaceContext, retries: u32) -> ActionResult {
    if retries >= MAX_LOSS_RETRIES {
        warn!(retries, "[race] loss-retry bound exceeded");
        return ActionResult::HardFail(crate::model::HardFailReason::LossLoop);
    }

    if ctx.try_again_on_failed_goal && ctx.is_goal_race {
        waiter.try_click_once(&[ALARM_CLOCK_CONFIRM], None, 0.7);
        waiter.try_click_once(&[TRY_AGAIN_BUTTON], None, 0.7);
        return post_race_lobby(waiter, ctx, retries + 1);
    }

    waiter.try_click_once(&[CONTINUE_WITHOUT_RETRY_BUTTON], None, 0.7);
    if waiter
        .seen(&[LOBBY_MARKER], 0.7, None, None, DEFAULT_TIMEOUT)
        .is_some()
    {
        ActionResult::SoftFail(crate::model::SoftFailReason::NoRaceFound)
    } else {
        ActionResult::SoftFail(crate::model::SoftFailReason::ButtonsMissing)
    }
}

trait WaiterResultExt {
    fn is_ok_result(&self) -> bool;
}

impl WaiterResultExt for WaiterResult {
    fn is_ok_result(&self) -> bool {
        matches!(self, WaiterResult::Ok)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::mock::MockController;
    use crate::model::BBox;
    use crate::perception::mock::MockPerception;
    use crate::waiter::StopFlag;

    fn bbox() -> BBox {
        BBox { x: 0, y: 0, width: 30, height: 20 }
    }

    fn ctx() -> RaceContext<'static> {
        RaceContext {
            planned_race_title: None,
            scheduled_style: None,
            last_applied_style: None,
            is_debut: false,
            junior_style: None,
            try_again_on_failed_goal: true,
            is_goal_race: false,
            already_inside_raceday: true,
            decline_consecutive_race: false,
        }
    }

    #[test]
    fn missing_race_square_returns_no_race_found() {
        let mut controller = MockController::new();
        let perception = MockPerception::new();
        let stop = StopFlag::new();
        let mut waiter = Waiter::new(&mut controller, &perception, stop, "test");
        let c = ctx();
        let result = pick_race_square(&mut waiter, &c);
        assert_eq!(
            result,
            Err(ActionResult::SoftFail(crate::model::SoftFailReason::NoRaceFound))
        );
    }

    #[test]
    fn planned_race_mismatch_returns_no_planned_match() {
        let mut controller = MockController::new();
        let perception = MockPerception::new();
        let stop = StopFlag::new();
        let mut waiter = Waiter::new(&mut controller, &perception, stop, "test");
        let mut c = ctx();
        c.planned_race_title = Some("Arima Kinen");
        let result = pick_race_square(&mut waiter, &c);
        assert_eq!(
            result,
            Err(ActionResult::SoftFail(crate::model::SoftFailReason::NoPlannedMatch))
        );
    }

    #[test]
    fn planned_race_match_succeeds() {
        let mut controller = MockController::new();
        let perception = MockPerception::new();
        perception.push_frame(vec![crate::model::Detection::new(RACE_SQUARE, bbox(), 0.9)]);
        perception.set_ocr(
            bbox(),
            vec![crate::model::OcrToken {
                text: "arima kinen".to_string(),
                confidence: 0.9,
            }],
        );
        let stop = StopFlag::new();
        let mut waiter = Waiter::new(&mut controller, &perception, stop, "test");
        let mut c = ctx();
        c.planned_race_title = Some("Arima Kinen");
        let result = pick_race_square(&mut waiter, &c);
        assert!(result.is_ok());
    }

    #[test]
    fn loss_retry_bound_emits_hard_fail() {
        let mut controller = MockController::new();
        let perception = MockPerception::new();
        let stop = StopFlag::new();
        let mut waiter = Waiter::new(&mut controller, &perception, stop, "test");
        let c = ctx();
        let result = loss_retry(&mut waiter, &c, MAX_LOSS_RETRIES);
        assert_eq!(
            result,
            ActionResult::HardFail(crate::model::HardFailReason::LossLoop)
        );
    }
}
