//! Training evaluator: scores each training tile found on the
//! Training screen into a support value (SV), honoring scenario weights,
//! seasonal/deadline multipliers, hint ownership, risk, and (Unity Cup)
//! burst allow-listing.

pub mod weights;

use crate::memory::SkillMemory;
use crate::model::{Date, StatKey, StatVector};
use weights::TrainingWeights;

/// A single training tile as read off the Training screen.
#[derive(Debug, Clone)]
pub struct TrainingTile {
    pub stat: StatKey,
    pub rainbow_count: u32,
    pub hint_sources: Vec<String>,
    pub white_spirit_fill: u32,
    pub white_spirit_exploded: bool,
    pub white_combo: u32,
    pub blue_spirit: bool,
    pub blue_combo: u32,
    pub support_card_present: bool,
    pub failure_percent: f32,
}

#[derive(Debug, Clone)]
pub struct ScoredTile {
    pub tile: TrainingTile,
    pub sv: f32,
    pub explanation: String,
    pub disqualified: bool,
}

pub struct EvaluatorContext<'a> {
    pub current_date: Date,
    pub current_stats: &'a StatVector,
    pub target_stats: &'a StatVector,
    pub max_failure: f32,
    pub skill_memory: &'a SkillMemory,
    pub weights: &'a TrainingWeights,
    /// Unity Cup only: stats eligible for a blue-spirit burst pick.
    pub burst_allowed_stats: Option<&'a [StatKey]>,
    /// Turns remaining until the scenario's milestone deadline (e.g. late
    /// Senior for URA); `None` when the scenario has no such deadline.
    pub turns_until_milestone: Option<i32>,
    /// Turns remaining in the career; used for the final-two-turns burst boost.
    pub turns_remaining: i32,
}

/// Base SV: a weighted sum of the tile's signals, adjusted for hint
/// ownership, then multiplied by seasonal/deadline boosts, then checked
/// against the failure-percent risk gate.
pub fn score_tile(tile: &TrainingTile, ctx: &EvaluatorContext) -> ScoredTile {
    let w = ctx.weights;
    let mut sv = 0.0_f32;
    let mut parts = Vec::new();

    if tile.rainbow_count > 0 {
        sv += w.rainbow * tile.rainbow_count as f32;
        parts.push(format!("rainbow x{}", tile.rainbow_count));
    }
    if tile.white_spirit_exploded {
        sv += w.white_spirit_exploded;
        parts.push("white_spirit_exploded".to_string());
    } else if tile.white_spirit_fill > 0 {
        sv += w.white_spirit_fill * tile.white_spirit_fill as f32;
        parts.push(format!("white_spirit_fill x{}", tile.white_spirit_fill));
    }
    if tile.white_combo > 0 {
        sv += w.white_combo * tile.white_combo as f32;
        parts.push(format!("white_combo x{}", tile.white_combo));
    }
    if tile.blue_spirit {
        sv += w.blue_spirit;
        parts.push("blue_spirit".to_string());
    }
    if tile.blue_combo > 0 {
        sv += w.blue_combo * tile.blue_combo as f32;
        parts.push(format!("blue_combo x{}", tile.blue_combo));
    }
    if tile.rainbow_count > 0 && tile.blue_spirit {
        sv += w.rainbow_combo;
        parts.push("rainbow_combo".to_string());
    }

    // Hint adjustment: a hint from a source already in skill memory
    // contributes nothing; otherwise the hint weight applies per source,
    // with any per-card multiplier from the scenario's weight table.
    for source in &tile.hint_sources {
        if ctx.skill_memory.has_any_grade(source) {
            parts.push(format!("hint({source}) already owned, +0"));
            continue;
        }
        let per_card = w.hint_card_multiplier(source);
        sv += w.hint * per_card;
        parts.push(format!("hint({source}) x{per_card:.2}"));
    }

    // Headroom credit: tiles training a stat already at or above its target
    // cap earn no extra credit from that stat's headroom.
    let headroom = ctx.current_stats.headroom(tile.stat, ctx.target_stats);
    if headroom == 0 {
        parts.push(format!("{} at/above cap, no headroom credit", tile.stat));
    }

    // Seasonal multiplier (Unity Cup only; URA scenarios pass 1.0).
    sv *= w.seasonal_multiplier(ctx.current_date);
    if let Some(turns) = ctx.turns_until_milestone {
        if turns >= 0 && turns <= w.deadline_window_turns {
            sv *= w.deadline_boost;
            parts.push(format!("deadline_boost(turns_until={turns})"));
        }
    }
    if ctx.turns_remaining <= 2 {
        sv *= w.final_turns_burst_boost;
        parts.push("final_turns_burst_boost".to_string());
    }

    let disqualified = tile.failure_percent > ctx.max_failure;
    if disqualified {
        parts.push(format!(
            "disqualified: failure_percent {:.1} > max {:.1}",
            tile.failure_percent, ctx.max_failure
        ));
    }

    ScoredTile {
        tile: tile.clone(),
        sv,
        explanation: parts.join("; "),
        disqualified,
    }
}

/// Rank every tile, dropping disqualified ones, highest SV first.
pub fn rank_tiles(tiles: &[TrainingTile], ctx: &EvaluatorContext) -> Vec<ScoredTile> {
    let mut scored: Vec<ScoredTile> = tiles.iter().map(|t| score_tile(t, ctx)).collect();
    scored.retain(|s| !s.disqualified);
    scored.sort_by(|a, b| b.sv.partial_cmp(&a.sv).unwrap_or(std::cmp::Ordering::Equal));
    scored
}

/// Unity Cup burst filtering: a tile is eligible for a blue-burst pick only
/// if its stat is in `burst_allowed_stats` and not already at or above its
/// target cap. The allow-list restriction has a sole-candidate exception;
/// the at-cap restriction does not, so a lone candidate still has to clear
/// the cap check before the exception returns it.
pub fn filter_burst_eligible<'a>(
    candidates: &'a [ScoredTile],
    ctx: &EvaluatorContext,
) -> Vec<&'a ScoredTile> {
    let Some(allowed) = ctx.burst_allowed_stats else {
        return candidates.iter().collect();
    };

    let not_at_cap = |s: &&ScoredTile| !ctx.current_stats.at_or_above_cap(s.tile.stat, ctx.target_stats);

    let eligible: Vec<&ScoredTile> = candidates
        .iter()
        .filter(|s| s.tile.blue_spirit && allowed.contains(&s.tile.stat) && not_at_cap(s))
        .collect();

    if !eligible.is_empty() {
        return eligible;
    }

    let off_allow_list: Vec<&ScoredTile> = candidates
        .iter()
        .filter(|s| s.tile.blue_spirit && not_at_cap(s))
        .collect();
    if off_allow_list.len() == 1 {
        return off_allow_list;
    }

    candidates.iter().filter(|s| !s.tile.blue_spirit).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::SkillMemory;
    use weights::TrainingWeights;

    fn tile(stat: StatKey) -> TrainingTile {
        TrainingTile {
            stat,
            rainbow_count: 0,
            hint_sources: vec![],
            white_spirit_fill: 0,
            white_spirit_exploded: false,
            white_combo: 0,
            blue_spirit: false,
            blue_combo: 0,
            support_card_present: false,
            failure_percent: 5.0,
        }
    }

    fn memory() -> SkillMemory {
        let dir = tempfile::tempdir().unwrap();
        SkillMemory::load(dir.path().join("skills.json"))
    }

    #[test]
    fn rainbow_tiles_outrank_plain_tiles() {
        let memory = memory();
        let weights = TrainingWeights::default();
        let stats = StatVector::new();
        let ctx = EvaluatorContext {
            current_date: Date::new(2, 6, 1),
            current_stats: &stats,
            target_stats: &stats,
            max_failure: 20.0,
            skill_memory: &memory,
            weights: &weights,
            burst_allowed_stats: None,
            turns_until_milestone: None,
            turns_remaining: 10,
        };
        let mut rainbow = tile(StatKey::Spd);
        rainbow.rainbow_count = 2;
        let plain = tile(StatKey::Sta);
        let ranked = rank_tiles(&[plain, rainbow], &ctx);
        assert_eq!(ranked[0].tile.stat, StatKey::Spd);
    }

    #[test]
    fn high_failure_percent_disqualifies_regardless_of_sv() {
        let memory = memory();
        let weights = TrainingWeights::default();
        let stats = StatVector::new();
        let ctx = EvaluatorContext {
            current_date: Date::new(2, 6, 1),
            current_stats: &stats,
            target_stats: &stats,
            max_failure: 20.0,
            skill_memory: &memory,
            weights: &weights,
            burst_allowed_stats: None,
            turns_until_milestone: None,
            turns_remaining: 10,
        };
        let mut risky = tile(StatKey::Pwr);
        risky.rainbow_count = 5;
        risky.failure_percent = 40.0;
        let ranked = rank_tiles(&[risky], &ctx);
        assert!(ranked.is_empty());
    }

    #[test]
    fn owned_hint_source_contributes_nothing() {
        let mut memory = memory();
        memory.mark_purchased("Speed Star", crate::memory::SkillGrade::SingleCircle);
        let weights = TrainingWeights::default();
        let stats = StatVector::new();
        let ctx = EvaluatorContext {
            current_date: Date::new(2, 6, 1),
            current_stats: &stats,
            target_stats: &stats,
            max_failure: 20.0,
            skill_memory: &memory,
            weights: &weights,
            burst_allowed_stats: None,
            turns_until_milestone: None,
            turns_remaining: 10,
        };
        let mut owned_hint = tile(StatKey::Spd);
        owned_hint.hint_sources = vec!["Speed Star".to_string()];
        let mut fresh_hint = tile(StatKey::Spd);
        fresh_hint.hint_sources = vec!["New Support".to_string()];
        let scored_owned = score_tile(&owned_hint, &ctx);
        let scored_fresh = score_tile(&fresh_hint, &ctx);
        assert!(scored_fresh.sv > scored_owned.sv);
    }

    #[test]
    fn burst_filter_excludes_disallowed_stats_unless_sole_candidate() {
        let memory = memory();
        let weights = TrainingWeights::default();
        let current = StatVector::new();
        let mut target = StatVector::new();
        target.set(StatKey::Guts, 600);
        let ctx = EvaluatorContext {
            current_date: Date::new(2, 6, 1),
            current_stats: &current,
            target_stats: &target,
            max_failure: 20.0,
            skill_memory: &memory,
            weights: &weights,
            burst_allowed_stats: Some(&[StatKey::Spd, StatKey::Sta]),
            turns_until_milestone: None,
            turns_remaining: 10,
        };
        let mut disallowed = tile(StatKey::Guts);
        disallowed.blue_spirit = true;
        let scored = vec![score_tile(&disallowed, &ctx)];
        let eligible = filter_burst_eligible(&scored, &ctx);
        // Not in burst_allowed_stats, but it's the only candidate clear of its cap -> allowed.
        assert_eq!(eligible.len(), 1);
    }

    #[test]
    fn burst_filter_sole_candidate_still_excluded_when_at_cap() {
        let memory = memory();
        let weights = TrainingWeights::default();
        let mut current = StatVector::new();
        current.set(StatKey::Guts, 600);
        let mut target = StatVector::new();
        target.set(StatKey::Guts, 600);
        let ctx = EvaluatorContext {
            current_date: Date::new(2, 6, 1),
            current_stats: &current,
            target_stats: &target,
            max_failure: 20.0,
            skill_memory: &memory,
            weights: &weights,
            burst_allowed_stats: Some(&[StatKey::Spd, StatKey::Sta]),
            turns_until_milestone: None,
            turns_remaining: 10,
        };
        let mut disallowed_and_capped = tile(StatKey::Guts);
        disallowed_and_capped.blue_spirit = true;
        let scored = vec![score_tile(&disallowed_and_capped, &ctx)];
        let eligible = filter_burst_eligible(&scored, &ctx);
        // Sole candidate, but at cap -> the at-cap restriction has no exception.
        assert!(eligible.iter().all(|s| s.tile.stat != StatKey::Guts));
    }

    #[test]
    fn burst_filter_never_lands_on_stat_at_cap() {
        let memory = memory();
        let weights = TrainingWeights::default();
        let mut current = StatVector::new();
        current.set(StatKey::Spd, 900);
        let mut cap = StatVector::new();
        cap.set(StatKey::Spd, 900);
        let ctx = EvaluatorContext {
            current_date: Date::new(2, 6, 1),
            current_stats: &current,
            target_stats: &cap,
            max_failure: 20.0,
            skill_memory: &memory,
            weights: &weights,
            burst_allowed_stats: Some(&[StatKey::Spd]),
            turns_until_milestone: None,
            turns_remaining: 10,
        };
        let mut at_cap = tile(StatKey::Spd);
        at_cap.blue_spirit = true;
        let mut other = tile(StatKey::Sta);
        other.blue_spirit = false;
        let scored = vec![score_tile(&at_cap, &ctx), score_tile(&other, &ctx)];
        let eligible = filter_burst_eligible(&scored, &ctx);
        assert!(eligible.iter().all(|s| s.tile.stat != StatKey::Spd));
    }
}
