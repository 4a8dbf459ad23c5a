use std::collections::HashMap;

use crate::model::Date;

#[derive(Debug, Clone)]
struct PlannedEntry {
    race_name: String,
    tentative: bool,
    skip_cooldown: u32,
}

/// Map Date -> planned race, with a per-entry cooldown guard so a date
/// whose prior match attempt failed isn't reattempted every tick.
#[derive(Debug, Default)]
pub struct PlannedRaceIndex {
    by_date: HashMap<Date, PlannedEntry>,
}

impl PlannedRaceIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load(entries: impl IntoIterator<Item = (Date, String, bool)>) -> Self {
        let mut index = Self::new();
        for (date, name, tentative) in entries {
            index.by_date.insert(
                date,
                PlannedEntry {
                    race_name: name,
                    tentative,
                    skip_cooldown: 0,
                },
            );
        }
        index
    }

    /// Returns the planned race for `date`, or `None` if absent or still
    /// under a skip cooldown.
    pub fn race_for(&self, date: Date) -> Option<(&str, bool)> {
        self.by_date.get(&date).and_then(|entry| {
            if entry.skip_cooldown > 0 {
                None
            } else {
                Some((entry.race_name.as_str(), entry.tentative))
            }
        })
    }

    pub fn mark_skipped(&mut self, date: Date, cooldown: u32) {
        if let Some(entry) = self.by_date.get_mut(&date) {
            entry.skip_cooldown = cooldown;
        }
    }

    /// Decrement every entry's cooldown once per tick; called from the
    /// agent loop's memory-update step.
    pub fn tick(&mut self) {
        for entry in self.by_date.values_mut() {
            if entry.skip_cooldown > 0 {
                entry.skip_cooldown -= 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mark_skipped_hides_entry_until_cooldown_elapses() {
        let date = Date::new(3, 6, 2);
        let mut index = PlannedRaceIndex::load([(date, "Takarazuka Kinen".to_string(), false)]);
        assert!(index.race_for(date).is_some());

        index.mark_skipped(date, 2);
        assert!(index.race_for(date).is_none());

        index.tick();
        assert!(index.race_for(date).is_none());

        index.tick();
        assert!(index.race_for(date).is_some());
    }

    #[test]
    fn tentative_flag_is_preserved() {
        let date = Date::new(2, 3, 1);
        let index = PlannedRaceIndex::load([(date, "Satsuki Sho".to_string(), true)]);
        let (name, tentative) = index.race_for(date).unwrap();
        assert_eq!(name, "Satsuki Sho");
        assert!(tentative);
    }
}
