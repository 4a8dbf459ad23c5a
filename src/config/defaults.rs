//! Default constant values for the `general` config section, mirrored as
//! plain constants rather than inlined literals so `loader.rs` and
//! `types.rs` agree on a single source of truth.

use std::time::Duration;

pub const DEFAULT_HOTKEY: &str = "CmdOrCtrl+Shift+Space";
pub const DEFAULT_AUTO_REST_MINIMUM_ENERGY: u32 = 20;
pub const DEFAULT_UNDERTRAIN_THRESHOLD: u32 = 1;
pub const DEFAULT_SKILL_CHECK_INTERVAL_TURNS: u32 = 4;
pub const DEFAULT_SKILL_PTS_DELTA: i32 = 0;
pub const DEFAULT_WAITER_INTERVAL_MS: u64 = 250;
pub const DEFAULT_WAITER_OVERALL_TIMEOUT_MS: u64 = 8_000;
pub const DEFAULT_CLASSIFIER_PATIENCE: u32 = 3;
pub const DEFAULT_STALL_PATIENCE_TICKS: u32 = 20;

pub fn default_waiter_interval() -> Duration {
    Duration::from_millis(DEFAULT_WAITER_INTERVAL_MS)
}

pub fn default_waiter_overall_timeout() -> Duration {
    Duration::from_millis(DEFAULT_WAITER_OVERALL_TIMEOUT_MS)
}
