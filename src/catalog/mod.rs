//! Static, read-only dataset catalogs: skill metadata, a race index
//! keyed by date, and an event catalog keyed by
//! `type/name/attr/rarity/event#step`. The core only ever reads these —
//! there is no write path, and no attempt to model how they're authored.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

use crate::error::{AgentError, Result};
use crate::model::Date;

/// Skill metadata: a catalog entry exists per skill name and carries the
/// disambiguation tokens the skills-flow matcher needs, so presets can
/// reference a skill by name alone and still resolve unambiguously.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillCatalogEntry {
    pub name: String,
    #[serde(default)]
    pub disambiguation_tokens: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RaceCatalogEntry {
    pub date: Date,
    pub name: String,
    #[serde(default)]
    pub is_goal_race: bool,
}

/// Key into the event catalog: `type/name/attr/rarity/event#step`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventKey {
    pub entity_type: String,
    pub entity_name: String,
    pub attr: String,
    pub rarity: String,
    pub event_name: String,
    pub step: usize,
}

impl EventKey {
    pub fn as_lookup_string(&self) -> String {
        format!(
            "{}/{}/{}/{}/{}#{}",
            self.entity_type, self.entity_name, self.attr, self.rarity, self.event_name, self.step
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventCatalogEntry {
    pub option_count: usize,
    /// Explicit per-event-step option override, taking priority over the
    /// entity's default preference.
    #[serde(default)]
    pub option_override: Option<usize>,
    #[serde(default)]
    pub notes: String,
}

/// In-memory index built once at startup from catalog documents.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    skills_by_name: HashMap<String, SkillCatalogEntry>,
    races_by_date: HashMap<Date, Vec<RaceCatalogEntry>>,
    events_by_key: HashMap<EventKey, EventCatalogEntry>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load_skills(&mut self, entries: Vec<SkillCatalogEntry>) {
        for entry in entries {
            self.skills_by_name.insert(entry.name.clone(), entry);
        }
    }

    pub fn load_races(&mut self, entries: Vec<RaceCatalogEntry>) {
        for entry in entries {
            self.races_by_date.entry(entry.date).or_default().push(entry);
        }
    }

    pub fn load_events(&mut self, entries: Vec<(EventKey, EventCatalogEntry)>) {
        for (key, entry) in entries {
            self.events_by_key.insert(key, entry);
        }
    }

    pub fn skill(&self, name: &str) -> Option<&SkillCatalogEntry> {
        self.skills_by_name.get(name)
    }

    pub fn races_on(&self, date: Date) -> &[RaceCatalogEntry] {
        self.races_by_date.get(&date).map(|v| v.as_slice()).unwrap_or(&[])
    }

    pub fn event(&self, key: &EventKey) -> Option<&EventCatalogEntry> {
        self.events_by_key.get(key)
    }

    /// Load `skills.json`/`races.json`/`events.json` from `dir`, each
    /// optional. A present-but-malformed file is a fatal `AgentError::Catalog`
    /// (catalog load failures are fatal, same as config); an absent
    /// file just leaves that part of the catalog empty.
    pub fn load_from_dir(dir: &Path) -> Result<Self> {
        let mut catalog = Self::new();

        if let Some(skills) = read_json_if_present::<Vec<SkillCatalogEntry>>(&dir.join("skills.json"))? {
            catalog.load_skills(skills);
        }
        if let Some(races) = read_json_if_present::<Vec<RaceCatalogEntry>>(&dir.join("races.json"))? {
            catalog.load_races(races);
        }
        if let Some(events) = read_json_if_present::<Vec<EventCatalogRecord>>(&dir.join("events.json"))? {
            catalog.load_events(events.into_iter().map(|r| (r.key, r.entry)).collect());
        }

        Ok(catalog)
    }
}

#[derive(Debug, Clone, Deserialize)]
struct EventCatalogRecord {
    key: EventKey,
    entry: EventCatalogEntry,
}

fn read_json_if_present<T: serde::de::DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    match std::fs::read_to_string(path) {
        Ok(raw) => serde_json::from_str(&raw)
            .map(Some)
            .map_err(|e| AgentError::Catalog(format!("invalid catalog file {}: {e}", path.display()))),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(AgentError::Catalog(format!("cannot read {}: {e}", path.display()))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skill_lookup_by_name() {
        let mut catalog = Catalog::new();
        catalog.load_skills(vec![SkillCatalogEntry {
            name: "Arc Sprinter".to_string(),
            disambiguation_tokens: vec!["sprinter".to_string()],
        }]);
        assert!(catalog.skill("Arc Sprinter").is_some());
        assert!(catalog.skill("Unknown Skill").is_none());
    }

    #[test]
    fn races_on_date_returns_empty_slice_when_absent() {
        let catalog = Catalog::new();
        assert!(catalog.races_on(Date::new(2, 6, 1)).is_empty());
    }

    #[test]
    fn load_from_dir_with_no_files_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = Catalog::load_from_dir(dir.path()).unwrap();
        assert!(catalog.skill("anything").is_none());
    }

    #[test]
    fn load_from_dir_reads_skills_json() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("skills.json"),
            r#"[{"name": "Arc Sprinter", "disambiguation_tokens": ["sprinter"]}]"#,
        )
        .unwrap();
        let catalog = Catalog::load_from_dir(dir.path()).unwrap();
        assert!(catalog.skill("Arc Sprinter").is_some());
    }

    #[test]
    fn event_key_formats_as_slash_path() {
        let key = EventKey {
            entity_type: "support".to_string(),
            entity_name: "Special Week".to_string(),
            attr: "speed".to_string(),
            rarity: "ssr".to_string(),
            event_name: "Friendship".to_string(),
            step: 2,
        };
        assert_eq!(
            key.as_lookup_string(),
            "support/Special Week/speed/ssr/Friendship#2"
        );
    }
}
