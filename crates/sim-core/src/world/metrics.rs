//! The per-tick history record returned by [`super::Engine::run_headless`].

use crate::agent_store::AgentStore;
use crate::species::Species;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TickCounts {
    pub tick: u64,
    pub zooplankton: usize,
    pub smallfish: usize,
    pub crab: usize,
    pub seal: usize,
    pub seaturtle: usize,
}

pub(crate) fn count_species(store: &AgentStore, tick: u64) -> TickCounts {
    TickCounts {
        tick,
        zooplankton: store.count_species(Species::Zooplankton),
        smallfish: store.count_species(Species::SmallFish),
        crab: store.count_species(Species::Crab),
        seal: store.count_species(Species::Seal),
        seaturtle: store.count_species(Species::SeaTurtle),
    }
}
