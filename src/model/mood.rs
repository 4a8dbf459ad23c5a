use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Trainee mood, ordered worst to best. Compared against a preset's minimum
/// mood gate before committing to a race.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum Mood {
    Awful,
    Bad,
    Normal,
    Good,
    Great,
}
