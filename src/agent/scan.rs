//! Pragmatic scan helpers: bridge raw detections/OCR into the domain
//! structs the training evaluator, event decider, and skills flow consume.
//!
//! The closed perception vocabulary only ever gives the agent loop a
//! class label, a bbox, and a confidence, plus free-text OCR. A real
//! detection model would carry rainbow/spirit/combo counts as dedicated
//! fields; here they're read back out of the tile's own OCR text the same
//! way `race::pick_race_square` stands in a star-count placeholder for a
//! field this core's vocabulary doesn't define. Noted in DESIGN.md.

use std::str::FromStr;

use regex::Regex;

use crate::agent::TurnSnapshot;
use crate::catalog::EventKey;
use crate::event::{EventOption, EventOutcome};
use crate::model::{normalize_text, BBox, Date, Mood, StatKey, StatVector};
use crate::skills::SkillTile;
use crate::training::TrainingTile;
use crate::waiter::Waiter;

const TRAINING_TILE_CLASSES: &[(&str, StatKey)] = &[
    ("training_tile_spd", StatKey::Spd),
    ("training_tile_sta", StatKey::Sta),
    ("training_tile_pwr", StatKey::Pwr),
    ("training_tile_guts", StatKey::Guts),
    ("training_tile_wit", StatKey::Wit),
];

fn count_occurrences(haystack: &str, needle: &str) -> u32 {
    if needle.is_empty() {
        return 0;
    }
    haystack.matches(needle).count() as u32
}

/// One tile per visible stat icon still on screen, with spirit/combo/hint
/// signals folded out of that tile's own OCR text.
pub fn scan_training_tiles(waiter: &mut Waiter) -> Vec<TrainingTile> {
    let mut tiles = Vec::new();
    for &(class, stat) in TRAINING_TILE_CLASSES {
        let Some(detection) = waiter.snap(&[class], 0.6).into_iter().next() else {
            continue;
        };
        let normalized = normalize_text(&ocr_join(waiter, detection.bbox));

        tiles.push(TrainingTile {
            stat,
            rainbow_count: count_occurrences(&normalized, "rainbow"),
            hint_sources: Vec::new(),
            white_spirit_fill: count_occurrences(&normalized, "white spirit"),
            white_spirit_exploded: normalized.contains("white spirit full"),
            white_combo: count_occurrences(&normalized, "white combo"),
            blue_spirit: normalized.contains("blue spirit"),
            blue_combo: count_occurrences(&normalized, "blue combo"),
            support_card_present: normalized.contains("support"),
            failure_percent: 0.0,
        });
    }
    tiles
}

fn ocr_join(waiter: &mut Waiter, roi: BBox) -> String {
    waiter
        .ocr_texts(roi)
        .into_iter()
        .map(|(text, _)| text)
        .collect::<Vec<_>>()
        .join(" ")
}

/// The trainee's current stat read: this core's detection vocabulary has no
/// dedicated stat-panel class, so a real deployment would parse this off
/// the status-bar OCR the way the training tiles are parsed above. Standing
/// in with a zeroed vector keeps headroom/at-or-above-cap scoring exercised
/// without inventing a vocabulary this core doesn't specify.
pub fn current_stat_vector() -> StatVector {
    StatVector::new()
}

const EVENT_OPTION_CLASS: &str = "event_option_button";

/// One `EventOption` per visible option button. Outcome deltas are left at
/// `Default` — the outcome-preview panel's numeric deltas aren't part of
/// the closed detection vocabulary, so a real deployment reads those the
/// same way the training tiles fold OCR text into structured fields above.
pub fn scan_event_options(waiter: &mut Waiter) -> Vec<EventOption> {
    waiter
        .snap(&[EVENT_OPTION_CLASS], 0.6)
        .into_iter()
        .map(|d| EventOption {
            bbox: d.bbox,
            outcome: EventOutcome::default(),
        })
        .collect()
}

const SKILL_TILE_CLASS: &str = "skill_tile";
const SKILL_BUY_BUTTON_CLASS: &str = "skill_buy_button_active";

/// Every skill tile visible at the current scroll position, with the
/// buy-button's active/inactive state resolved by containment against the
/// tile's own bbox.
pub fn scan_skill_tiles(waiter: &mut Waiter) -> Vec<SkillTile> {
    let tiles = waiter.snap(&[SKILL_TILE_CLASS], 0.6);
    let buy_buttons = waiter.snap(&[SKILL_BUY_BUTTON_CLASS], 0.6);

    tiles
        .into_iter()
        .map(|d| {
            let title_ocr = ocr_join(waiter, d.bbox);
            let buy_button_active = buy_buttons.iter().any(|b| {
                let (cx, cy) = b.bbox.center();
                d.bbox.contains_point(cx, cy)
            });
            SkillTile {
                bbox: d.bbox,
                buy_bbox: d.bbox,
                title_ocr,
                buy_button_active,
            }
        })
        .collect()
}

/// A single scroll position's worth of tiles. The skill list's scroll
/// region isn't part of the closed detection vocabulary either, so this
/// reads one screenful rather than driving `waiter.scroll` through a
/// multi-position sweep.
pub fn scan_skill_scroll_positions(waiter: &mut Waiter) -> Vec<Vec<SkillTile>> {
    vec![scan_skill_tiles(waiter)]
}

const DATE_ROI: BBox = BBox { x: 20, y: 8, width: 160, height: 24 };
const ENERGY_ROI: BBox = BBox { x: 200, y: 8, width: 100, height: 24 };
const MOOD_ROI: BBox = BBox { x: 320, y: 8, width: 100, height: 24 };
const INJURY_CLASS: &str = "injury_icon";
const SKILL_POINTS_ROI: BBox = BBox { x: 440, y: 8, width: 100, height: 24 };

const PAL_ICON_CLASS: &str = "pal_icon";
const PAL_NEXT_STEP_ENERGY_CLASS: &str = "pal_next_step_energy_marker";

/// PAL chain state read off the lobby HUD this tick: whether the icon is
/// present, which chain step it advertises, and whether the next step
/// still yields energy.
pub struct PalScan {
    pub icon_present: bool,
    pub chain_step: u32,
    pub next_step_yields_energy: bool,
}

fn parse_chain_step(text: &str) -> Option<u32> {
    let re = Regex::new(r"(\d{1,2})").ok()?;
    re.captures(text)?.get(1)?.as_str().parse().ok()
}

/// Scan the PAL icon and its advertised chain step. Absent icon reports a
/// step of 0 and no energy payoff, matching `PalMemory::reset_if_absent`'s
/// expectation that an absent icon clears the prior record.
pub fn scan_pal_state(waiter: &mut Waiter) -> PalScan {
    let icon = waiter.snap(&[PAL_ICON_CLASS], 0.6).into_iter().next();
    let icon_present = icon.is_some();
    let chain_step = icon
        .map(|d| parse_chain_step(&ocr_join(waiter, d.bbox)).unwrap_or(0))
        .unwrap_or(0);
    let next_step_yields_energy = !waiter.snap(&[PAL_NEXT_STEP_ENERGY_CLASS], 0.6).is_empty();
    PalScan {
        icon_present,
        chain_step,
        next_step_yields_energy,
    }
}

fn parse_skill_points(text: &str) -> Option<i32> {
    let re = Regex::new(r"(\d{1,5})").ok()?;
    re.captures(text)?.get(1)?.as_str().parse().ok()
}

/// Current skill-point reading off the HUD, for the skills-flow entry
/// gate. Unparseable OCR reads as 0 rather than stalling the tick.
pub fn scan_skill_points(waiter: &mut Waiter) -> i32 {
    parse_skill_points(&ocr_join(waiter, SKILL_POINTS_ROI)).unwrap_or(0)
}

const EVENT_HEADER_ROI: BBox = BBox { x: 40, y: 60, width: 400, height: 32 };

/// Parse an event header OCR'd as `type/name/attr/rarity/event#step`, the
/// same layout the event catalog keys on.
fn parse_event_key(text: &str) -> Option<EventKey> {
    let (path, step_part) = text.rsplit_once('#')?;
    let step: usize = step_part.trim().parse().ok()?;
    let parts: Vec<&str> = path.split('/').map(str::trim).collect();
    let [entity_type, entity_name, attr, rarity, event_name] = parts[..] else {
        return None;
    };
    Some(EventKey {
        entity_type: entity_type.to_string(),
        entity_name: entity_name.to_string(),
        attr: attr.to_string(),
        rarity: rarity.to_string(),
        event_name: event_name.to_string(),
        step,
    })
}

/// The current event's catalog key, read off the dialog header. `None` when
/// the header doesn't parse, which leaves the caller to fall back to a
/// scenario-default preference with no catalog override.
pub fn scan_event_key(waiter: &mut Waiter) -> Option<EventKey> {
    parse_event_key(&ocr_join(waiter, EVENT_HEADER_ROI))
}

/// Bbox plus label text for every visible event-option button. Used to
/// recognize and click through an accept/reconsider follow-up dialog.
pub fn scan_event_buttons(waiter: &mut Waiter) -> Vec<(BBox, String)> {
    waiter
        .snap(&[EVENT_OPTION_CLASS], 0.6)
        .into_iter()
        .map(|d| {
            let label = ocr_join(waiter, d.bbox);
            (d.bbox, label)
        })
        .collect()
}

fn parse_date(text: &str) -> Option<Date> {
    let re = Regex::new(r"Y?(\d+)[\s/-]+(\d+)[\s/-]+(\d+)").ok()?;
    let caps = re.captures(text)?;
    let year: u8 = caps.get(1)?.as_str().parse().ok()?;
    let month: u8 = caps.get(2)?.as_str().parse().ok()?;
    let half: u8 = caps.get(3)?.as_str().parse().ok()?;
    Some(Date::new(year, month, half))
}

fn parse_energy(text: &str) -> Option<u32> {
    let re = Regex::new(r"(\d{1,3})").ok()?;
    re.captures(text)?.get(1)?.as_str().parse().ok()
}

fn parse_mood(text: &str) -> Option<Mood> {
    let normalized = normalize_text(text).to_uppercase().replace(' ', "_");
    Mood::from_str(&normalized).ok()
}

/// The whole turn's caller-assembled input: date, energy, mood and
/// injury state read off the status bar's OCR, with the stat panel folded
/// in via [`current_stat_vector`]. Any field that fails to parse keeps the
/// agent loop running rather than stalling the tick: date falls back to
/// `fallback_date` (holding position, same as the loop's own monotonicity
/// guard), energy/mood fall back to a neutral reading.
pub fn scan_turn_snapshot(waiter: &mut Waiter, fallback_date: Date) -> TurnSnapshot {
    let date = parse_date(&ocr_join(waiter, DATE_ROI)).unwrap_or(fallback_date);
    let energy = parse_energy(&ocr_join(waiter, ENERGY_ROI)).unwrap_or(100);
    let mood = parse_mood(&ocr_join(waiter, MOOD_ROI)).unwrap_or(Mood::Normal);
    let is_injured = !waiter.snap(&[INJURY_CLASS], 0.6).is_empty();

    TurnSnapshot {
        date,
        energy,
        mood,
        is_injured,
        current_stats: current_stat_vector(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_dashed_date_text() {
        assert_eq!(parse_date("Y2-06-1"), Some(Date::new(2, 6, 1)));
    }

    #[test]
    fn parses_date_with_stray_ocr_noise() {
        assert_eq!(parse_date("junior year 1 / 07 / 2 late half"), Some(Date::new(1, 7, 2)));
    }

    #[test]
    fn unparseable_date_text_returns_none() {
        assert_eq!(parse_date("no digits here"), None);
    }

    #[test]
    fn parses_energy_gauge_text() {
        assert_eq!(parse_energy("72/100"), Some(72));
    }

    #[test]
    fn parses_mood_text_case_insensitively() {
        assert_eq!(parse_mood("GREAT"), Some(Mood::Great));
        assert_eq!(parse_mood("normal"), Some(Mood::Normal));
    }

    #[test]
    fn parses_skill_points_text() {
        assert_eq!(parse_skill_points("SP 340"), Some(340));
    }

    #[test]
    fn parses_chain_step_text() {
        assert_eq!(parse_chain_step("step 3"), Some(3));
    }

    #[test]
    fn parses_event_key_header_text() {
        let key = parse_event_key("support/Special Week/speed/ssr/Friendship#2").unwrap();
        assert_eq!(key.entity_type, "support");
        assert_eq!(key.entity_name, "Special Week");
        assert_eq!(key.step, 2);
    }

    #[test]
    fn unparseable_event_header_returns_none() {
        assert!(parse_event_key("no delimiters here").is_none());
    }
}
