use std::collections::HashMap;

/// Per-scenario PAL chain state: whether the PAL icon is present this turn,
/// which chain step it advertises, and whether the *next* step still
/// yields energy. Cleared the moment the icon disappears.
#[derive(Debug, Clone, Default)]
struct PalRecord {
    icon_present: bool,
    chain_step: u32,
    next_step_yields_energy: bool,
}

/// Consulted before any decision that would otherwise pick Rest or
/// Recreation, so a present, energy-yielding PAL chain step substitutes for
/// plain Recreation.
#[derive(Debug, Default)]
pub struct PalMemory {
    by_scenario: HashMap<String, PalRecord>,
}

impl PalMemory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(
        &mut self,
        scenario: &str,
        icon_present: bool,
        chain_step: u32,
        next_step_yields_energy: bool,
    ) {
        self.by_scenario.insert(
            scenario.to_string(),
            PalRecord {
                icon_present,
                chain_step,
                next_step_yields_energy,
            },
        );
    }

    pub fn any_next_energy(&self) -> bool {
        self.by_scenario
            .values()
            .any(|r| r.icon_present && r.next_step_yields_energy)
    }

    /// Clear the record for `scenario` once its PAL icon is no longer seen.
    pub fn reset_if_absent(&mut self, scenario: &str, icon_present: bool) {
        if !icon_present {
            self.by_scenario.remove(scenario);
        }
    }
}
