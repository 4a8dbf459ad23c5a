use serde::{Deserialize, Serialize};
use std::fmt;

/// In-career calendar position: a year code (0 = pre-debut, 4 = finals),
/// a month (1..12), and a half-month marker (1 or 2).
///
/// Total-ordered lexicographically by (year_code, month, half), matching
/// the turn granularity used throughout the training evaluator and the
/// planned-race index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Date {
    pub year_code: u8,
    pub month: u8,
    pub half: u8,
}

impl Date {
    pub const PRE_DEBUT_YEAR: u8 = 0;
    pub const FINALS_YEAR: u8 = 4;

    pub fn new(year_code: u8, month: u8, half: u8) -> Self {
        debug_assert!(year_code <= Self::FINALS_YEAR);
        debug_assert!((1..=12).contains(&month));
        debug_assert!(half == 1 || half == 2);
        Self {
            year_code,
            month,
            half,
        }
    }

    pub fn is_junior(&self) -> bool {
        self.year_code <= 1
    }

    pub fn is_pre_debut(&self) -> bool {
        self.year_code == Self::PRE_DEBUT_YEAR
    }

    pub fn is_finals(&self) -> bool {
        self.year_code == Self::FINALS_YEAR
    }

    /// Number of half-month turns between `self` and `other` (positive when
    /// `other` is later). Used for "N turns away" deadline/safeguard checks.
    pub fn turns_until(&self, other: Date) -> i32 {
        let a = (self.year_code as i32) * 24 + (self.month as i32 - 1) * 2 + (self.half as i32 - 1);
        let b = (other.year_code as i32) * 24 + (other.month as i32 - 1) * 2 + (other.half as i32 - 1);
        b - a
    }

    /// Turns remaining until the next June-August window opens, or 0 if
    /// `self` already falls inside one. Drives the "summer approaching with
    /// low energy" safeguard, independent of any scenario's milestone.
    pub fn turns_until_next_summer(&self) -> i32 {
        if (6..=8).contains(&self.month) {
            return 0;
        }
        let next_summer = if self.month < 6 {
            Date::new(self.year_code, 6, 1)
        } else {
            Date::new((self.year_code + 1).min(Self::FINALS_YEAR), 6, 1)
        };
        self.turns_until(next_summer)
    }
}

impl fmt::Display for Date {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Y{}-{:02}-{}", self.year_code, self.month, self.half)
    }
}
