use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;

use super::persist::{read_json, write_atomic_json};
use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SkillGrade {
    SingleCircle,
    DoubleCircle,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
struct SkillKey {
    name: String,
    grade: SkillGrade,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct SkillMemorySnapshot {
    purchased: HashSet<SkillKey>,
    #[serde(default)]
    last_sighting: std::collections::HashMap<String, DateTime<Utc>>,
}

/// Tracks which (skill_name, grade) pairs have already been bought this
/// career, to enforce a no-double-buy invariant even across a mid-career
/// process restart.
pub struct SkillMemory {
    path: PathBuf,
    snapshot: SkillMemorySnapshot,
}

impl SkillMemory {
    pub fn load(path: PathBuf) -> Self {
        let snapshot = read_json(&path);
        Self { path, snapshot }
    }

    /// Idempotent: marking an already-purchased (name, grade) pair is a no-op.
    pub fn mark_purchased(&mut self, name: &str, grade: SkillGrade) {
        self.snapshot.purchased.insert(SkillKey {
            name: name.to_string(),
            grade,
        });
    }

    pub fn is_purchased(&self, name: &str, grade: SkillGrade) -> bool {
        self.snapshot.purchased.contains(&SkillKey {
            name: name.to_string(),
            grade,
        })
    }

    pub fn has_any_grade(&self, name: &str) -> bool {
        self.snapshot
            .purchased
            .iter()
            .any(|key| key.name == name)
    }

    pub fn record_sighting(&mut self, name: &str, at: DateTime<Utc>) {
        self.snapshot.last_sighting.insert(name.to_string(), at);
    }

    pub fn reset_career(&mut self) {
        self.snapshot = SkillMemorySnapshot::default();
    }

    pub fn persist(&self) -> Result<()> {
        write_atomic_json(&self.path, &self.snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mark_purchased_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let mut mem = SkillMemory::load(dir.path().join("skills.json"));
        mem.mark_purchased("Corner Adept", SkillGrade::SingleCircle);
        mem.mark_purchased("Corner Adept", SkillGrade::SingleCircle);
        assert!(mem.is_purchased("Corner Adept", SkillGrade::SingleCircle));
        assert!(!mem.is_purchased("Corner Adept", SkillGrade::DoubleCircle));
    }

    #[test]
    fn persist_then_reload_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("skills.json");
        {
            let mut mem = SkillMemory::load(path.clone());
            mem.mark_purchased("Arc Sprinter", SkillGrade::DoubleCircle);
            mem.persist().unwrap();
        }
        let reloaded = SkillMemory::load(path);
        assert!(reloaded.is_purchased("Arc Sprinter", SkillGrade::DoubleCircle));
    }

    #[test]
    fn has_any_grade_checks_across_grades() {
        let dir = tempfile::tempdir().unwrap();
        let mut mem = SkillMemory::load(dir.path().join("skills.json"));
        mem.mark_purchased("Homestretch Haste", SkillGrade::SingleCircle);
        assert!(mem.has_any_grade("Homestretch Haste"));
        assert!(!mem.has_any_grade("Unrelated Skill"));
    }

    #[test]
    fn reset_career_clears_purchases() {
        let dir = tempfile::tempdir().unwrap();
        let mut mem = SkillMemory::load(dir.path().join("skills.json"));
        mem.mark_purchased("Corner Adept", SkillGrade::SingleCircle);
        mem.reset_career();
        assert!(!mem.is_purchased("Corner Adept", SkillGrade::SingleCircle));
    }
}
