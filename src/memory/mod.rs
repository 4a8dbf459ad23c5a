//! Memory managers: skill memory, PAL memory, and the
//! planned-race index. Owned exclusively by the agent loop and mutated
//! only there — nothing else in the crate holds a reference into these
//! stores across a tick boundary.

pub mod pal;
pub mod persist;
pub mod planned_race;
pub mod skill;

pub use pal::PalMemory;
pub use planned_race::PlannedRaceIndex;
pub use skill::{SkillGrade, SkillMemory};
