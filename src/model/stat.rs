use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use strum::{Display, EnumIter, EnumString};

/// The five trainable stats.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Display,
    EnumString,
    EnumIter,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum StatKey {
    Spd,
    Sta,
    Pwr,
    Guts,
    Wit,
}

/// A mapping from stat key to a nonnegative value. Used for both current
/// stats and target caps; caps are treated as monotonic ceilings by the
/// evaluator (a stat already at or above its cap earns no further headroom
/// credit and is excluded from burst selection in Unity Cup).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatVector(HashMap<StatKey, u32>);

impl StatVector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: StatKey) -> u32 {
        self.0.get(&key).copied().unwrap_or(0)
    }

    pub fn set(&mut self, key: StatKey, value: u32) {
        self.0.insert(key, value);
    }

    /// Headroom remaining before `key` reaches `cap`'s value for the same
    /// key, floored at zero.
    pub fn headroom(&self, key: StatKey, cap: &StatVector) -> u32 {
        cap.get(key).saturating_sub(self.get(key))
    }

    pub fn at_or_above_cap(&self, key: StatKey, cap: &StatVector) -> bool {
        self.get(key) >= cap.get(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headroom_is_nonnegative() {
        let mut current = StatVector::new();
        current.set(StatKey::Spd, 900);
        let mut cap = StatVector::new();
        cap.set(StatKey::Spd, 800);
        assert_eq!(current.headroom(StatKey::Spd, &cap), 0);
        assert!(current.at_or_above_cap(StatKey::Spd, &cap));
    }

    #[test]
    fn missing_key_defaults_to_zero() {
        let v = StatVector::new();
        assert_eq!(v.get(StatKey::Guts), 0);
    }
}
