use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Racing style. Applied per the preset's style schedule and debut style.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Style {
    Front,
    Pace,
    Late,
    End,
}
