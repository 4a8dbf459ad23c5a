use std::fmt;

/// Reasons a handler can cite for a soft failure. Kept as data rather
/// than bubbled as an error, so the agent loop can set skip/cooldown guards
/// without treating the condition as fatal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SoftFailReason {
    NoRaceFound,
    NoPlannedMatch,
    ButtonsMissing,
    SkillsFailedExit(String),
    ConsecutiveRaceRefused,
    LossLoop,
}

impl fmt::Display for SoftFailReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoRaceFound => write!(f, "no_race_found"),
            Self::NoPlannedMatch => write!(f, "no_planned_match"),
            Self::ButtonsMissing => write!(f, "buttons_missing"),
            Self::SkillsFailedExit(reason) => write!(f, "skills_failed_exit({reason})"),
            Self::ConsecutiveRaceRefused => write!(f, "consecutive_race_refused"),
            Self::LossLoop => write!(f, "loss_loop"),
        }
    }
}

/// Reasons a handler raises as fatal. Only stall, hotkey stop, config
/// invalidity at load, and unrecoverable loss-retry loops qualify;
/// everything else must be expressed as `ActionResult::SoftFail`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HardFailReason {
    Stalled,
    Aborted,
    LossLoop,
}

impl fmt::Display for HardFailReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stalled => write!(f, "stalled"),
            Self::Aborted => write!(f, "aborted"),
            Self::LossLoop => write!(f, "loss_loop"),
        }
    }
}

/// The outcome of a handler or flow step. A sum type rather than a bool so
/// callers can log and act on *why* something didn't happen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionResult {
    Ok,
    NoMatch,
    SoftFail(SoftFailReason),
    HardFail(HardFailReason),
}

impl ActionResult {
    pub fn is_ok(&self) -> bool {
        matches!(self, ActionResult::Ok)
    }

    pub fn is_recoverable(&self) -> bool {
        matches!(self, ActionResult::Ok | ActionResult::NoMatch | ActionResult::SoftFail(_))
    }

    pub fn is_fatal(&self) -> bool {
        matches!(self, ActionResult::HardFail(_))
    }
}
