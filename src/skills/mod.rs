//! Skills flow: scroll-scan the skill list, buy every matched,
//! affordable skill, then drive the Confirm -> Learn -> Close -> Back
//! chain. Returns a tri-state result rather than a bool so the caller can
//! log and act on *why* nothing happened.

pub mod matcher;

use std::time::Duration;
use tracing::{info, warn};

use crate::memory::{SkillGrade, SkillMemory};
use crate::model::{normalize_text, ActionResult, BBox, SoftFailReason};
use crate::waiter::{Waiter, WaiterResult};
use matcher::{best_match, SkillQuery};

/// One tile as read off a single scroll position of the skill list.
#[derive(Debug, Clone)]
pub struct SkillTile {
    pub bbox: BBox,
    pub buy_bbox: BBox,
    pub title_ocr: String,
    pub buy_button_active: bool,
}

const CONFIRM_CLASS: &str = "dialog_confirm_button";
const LEARN_CLASS: &str = "dialog_learn_button";
const CLOSE_CLASS: &str = "dialog_close_button";
const BACK_CLASS: &str = "back_button";
const LOBBY_CLASS: &str = "lobby_marker";
const RACEDAY_CLASS: &str = "race_day_banner";

const CHAIN_STEP_TIMEOUT: Duration = Duration::from_secs(5);
const RECOVERY_BACK_TAPS: u32 = 3;

/// Click every tile matching an allow-list query at the current scroll
/// position, honoring skill memory (never re-buy a grade already owned,
/// and skip a tile entirely once any grade of it is recorded).
fn scan_and_click_position(
    waiter: &mut Waiter,
    tiles: &[SkillTile],
    queries: &[SkillQuery],
    memory: &SkillMemory,
) -> Vec<(String, SkillGrade)> {
    let mut clicked = Vec::new();
    for tile in tiles {
        let normalized = normalize_text(&tile.title_ocr);
        let Some(query) = best_match(queries, &normalized) else {
            continue;
        };
        if memory.has_any_grade(&query.label) {
            continue;
        }
        if memory.is_purchased(&query.label, query.grade) {
            continue;
        }
        if !tile.buy_button_active {
            continue;
        }
        let (x, y) = tile.buy_bbox.center();
        waiter.click_at(x, y);
        clicked.push((query.label.clone(), query.grade));
    }
    clicked
}

/// Run the full flow: one scroll position per entry in `scroll_positions`
/// (each already captured/read by the caller into a `Vec<SkillTile>`),
/// then the purchase-confirmation chain if anything was clicked.
pub fn run_skills_flow(
    waiter: &mut Waiter,
    memory: &mut SkillMemory,
    queries: &[SkillQuery],
    scroll_positions: &[Vec<SkillTile>],
) -> ActionResult {
    let mut all_clicked = Vec::new();

    for tiles in scroll_positions {
        if waiter.is_stopped() {
            return ActionResult::SoftFail(SoftFailReason::SkillsFailedExit(
                "stopped mid-scan".to_string(),
            ));
        }
        let clicked = scan_and_click_position(waiter, tiles, queries, memory);
        all_clicked.extend(clicked);
    }

    if all_clicked.is_empty() {
        waiter.try_click_once(&[BACK_CLASS], None, 0.7);
        info!("[skills] no matching skill found, returning NoMatch");
        return ActionResult::NoMatch;
    }

    match confirm_purchase_chain(waiter) {
        Ok(()) => {
            for (name, grade) in &all_clicked {
                memory.mark_purchased(name, *grade);
            }
            info!(count = all_clicked.len(), "[skills] purchase chain succeeded");
            ActionResult::Ok
        }
        Err(reason) => {
            warn!(reason = %reason, "[skills] purchase chain failed, attempting recovery");
            recover_to_lobby_or_raceday(waiter);
            ActionResult::SoftFail(SoftFailReason::SkillsFailedExit(reason))
        }
    }
}

fn confirm_purchase_chain(waiter: &mut Waiter) -> Result<(), String> {
    let steps: [(&str, &str); 4] = [
        (CONFIRM_CLASS, "confirm"),
        (LEARN_CLASS, "learn"),
        (CLOSE_CLASS, "close"),
        (BACK_CLASS, "back"),
    ];
    for (class, name) in steps {
        let result = waiter.click_when(
            &[class],
            None,
            None,
            0.7,
            false,
            true,
            CHAIN_STEP_TIMEOUT,
        );
        match result {
            WaiterResult::Ok => continue,
            WaiterResult::NoMatch => return Err(format!("{name} step timed out")),
            WaiterResult::Aborted => return Err(format!("{name} step aborted")),
        }
    }
    // The flow never claims Success unless it can also verify the UI
    // landed back on Lobby or Raceday.
    let landed = waiter.seen(
        &[LOBBY_CLASS, RACEDAY_CLASS],
        0.7,
        None,
        None,
        CHAIN_STEP_TIMEOUT,
    );
    if landed.is_none() {
        return Err("did not land back on Lobby/Raceday".to_string());
    }
    Ok(())
}

fn recover_to_lobby_or_raceday(waiter: &mut Waiter) {
    for _ in 0..RECOVERY_BACK_TAPS {
        if waiter.is_stopped() {
            return;
        }
        waiter.try_click_once(&[BACK_CLASS], None, 0.7);
        if waiter
            .seen(&[LOBBY_CLASS, RACEDAY_CLASS], 0.7, None, None, Duration::from_secs(2))
            .is_some()
        {
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::mock::MockController;
    use crate::memory::SkillMemory;
    use crate::perception::mock::MockPerception;
    use crate::waiter::StopFlag;
    use matcher::SkillQuery;

    fn bbox() -> BBox {
        BBox { x: 0, y: 0, width: 50, height: 20 }
    }

    fn tile(title: &str, active: bool) -> SkillTile {
        SkillTile {
            bbox: bbox(),
            buy_bbox: bbox(),
            title_ocr: title.to_string(),
            buy_button_active: active,
        }
    }

    fn memory() -> SkillMemory {
        let dir = tempfile::tempdir().unwrap();
        SkillMemory::load(dir.path().join("skills.json"))
    }

    #[test]
    fn inactive_buy_button_is_skipped() {
        let mut controller = MockController::new();
        let perception = MockPerception::new();
        let stop = StopFlag::new();
        let mut waiter = Waiter::new(&mut controller, &perception, stop, "test");
        let mut mem = memory();
        let queries = vec![SkillQuery::parse("homestretch haste")];
        let positions = vec![vec![tile("homestretch haste", false)]];
        let result = run_skills_flow(&mut waiter, &mut mem, &queries, &positions);
        assert_eq!(result, ActionResult::NoMatch);
    }

    #[test]
    fn already_owned_any_grade_is_not_reclicked() {
        let mut controller = MockController::new();
        let perception = MockPerception::new();
        let stop = StopFlag::new();
        let mut waiter = Waiter::new(&mut controller, &perception, stop, "test");
        let mut mem = memory();
        mem.mark_purchased("homestretch haste", SkillGrade::SingleCircle);
        let queries = vec![SkillQuery::parse("homestretch haste")];
        let positions = vec![vec![tile("homestretch haste", true)]];
        let result = run_skills_flow(&mut waiter, &mut mem, &queries, &positions);
        assert_eq!(result, ActionResult::NoMatch);
    }

    #[test]
    fn no_tiles_match_returns_no_match_and_taps_back() {
        let mut controller = MockController::new();
        let perception = MockPerception::new();
        let stop = StopFlag::new();
        let mut waiter = Waiter::new(&mut controller, &perception, stop, "test");
        let mut mem = memory();
        let queries = vec![SkillQuery::parse("arc sprinter")];
        let positions = vec![vec![tile("unrelated skill", true)]];
        let result = run_skills_flow(&mut waiter, &mut mem, &queries, &positions);
        assert_eq!(result, ActionResult::NoMatch);
    }
}
