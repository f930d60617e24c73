//! Struct-of-arrays storage for all agents: slot reuse, amortized resize, and
//! periodic compaction with target-index remapping.

use crate::config::FaunaConfig;
use crate::environment::Environment;
use crate::species::Species;

pub const DEAD_ENERGY_SENTINEL: f64 = -999.0;

/// Capacity `C`, live count `N ≤ C`, and the parallel per-agent arrays.
pub struct AgentStore {
    capacity: usize,
    pub position: Vec<[f64; 3]>,
    pub energy: Vec<f64>,
    pub species_id: Vec<u8>,
    pub alive: Vec<bool>,
    pub age: Vec<u32>,
    pub cooldown: Vec<u32>,
    pub satiation: Vec<u32>,
    pub target: Vec<i64>,
    pub search_vec: Vec<[i8; 3]>,
    pub threatened: Vec<bool>,
    pub flee_vec: Vec<[f64; 3]>,
}

impl AgentStore {
    pub fn with_capacity(capacity: usize) -> AgentStore {
        AgentStore {
            capacity,
            position: vec![[0.0; 3]; capacity],
            energy: vec![DEAD_ENERGY_SENTINEL; capacity],
            species_id: vec![0; capacity],
            alive: vec![false; capacity],
            age: vec![0; capacity],
            cooldown: vec![0; capacity],
            satiation: vec![0; capacity],
            target: vec![-1; capacity],
            search_vec: vec![[0; 3]; capacity],
            threatened: vec![false; capacity],
            flee_vec: vec![[0.0; 3]; capacity],
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn live_count(&self) -> usize {
        self.alive.iter().filter(|&&a| a).count()
    }

    pub fn count_species(&self, species: Species) -> usize {
        let id = species.as_id();
        (0..self.capacity)
            .filter(|&i| self.alive[i] && self.species_id[i] == id)
            .count()
    }

    /// Directly occupy slot `index` with a freshly born agent. Caller must
    /// have verified `alive[index]` was `false`.
    #[allow(clippy::too_many_arguments)]
    pub fn spawn_at(
        &mut self,
        index: usize,
        species: Species,
        position: [f64; 3],
        energy: f64,
        search_vec: [i8; 3],
    ) {
        self.position[index] = position;
        self.energy[index] = energy;
        self.species_id[index] = species.as_id();
        self.alive[index] = true;
        self.age[index] = 0;
        self.cooldown[index] = 0;
        self.satiation[index] = 0;
        self.target[index] = -1;
        self.search_vec[index] = search_vec;
        self.threatened[index] = false;
        self.flee_vec[index] = [0.0; 3];
    }

    pub fn kill(&mut self, index: usize) {
        self.alive[index] = false;
    }

    /// Find up to `n` free (`alive == false`) slots in ascending order,
    /// growing the store (capped at `absolute_max_agents`) if there aren't
    /// enough. Returns fewer than `n` slots only when the cap itself is hit,
    /// silently truncating the request.
    pub fn allocate_slots(&mut self, n: usize, absolute_max_agents: usize) -> Vec<usize> {
        if n == 0 {
            return Vec::new();
        }
        let mut slots: Vec<usize> = (0..self.capacity).filter(|&i| !self.alive[i]).take(n).collect();
        if slots.len() < n && self.capacity < absolute_max_agents {
            let needed = n - slots.len();
            let old_capacity = self.capacity;
            let grown = ((old_capacity as f64 * 1.5).ceil() as usize)
                .max(old_capacity + needed)
                .min(absolute_max_agents);
            self.resize(grown);
            let more: Vec<usize> = (old_capacity..self.capacity).take(n - slots.len()).collect();
            slots.extend(more);
        }
        slots.truncate(n);
        slots
    }

    pub fn resize(&mut self, new_capacity: usize) {
        if new_capacity <= self.capacity {
            return;
        }
        let extra = new_capacity - self.capacity;
        self.position.extend(std::iter::repeat([0.0; 3]).take(extra));
        self.energy
            .extend(std::iter::repeat(DEAD_ENERGY_SENTINEL).take(extra));
        self.species_id.extend(std::iter::repeat(0u8).take(extra));
        self.alive.extend(std::iter::repeat(false).take(extra));
        self.age.extend(std::iter::repeat(0u32).take(extra));
        self.cooldown.extend(std::iter::repeat(0u32).take(extra));
        self.satiation.extend(std::iter::repeat(0u32).take(extra));
        self.target.extend(std::iter::repeat(-1i64).take(extra));
        self.search_vec.extend(std::iter::repeat([0i8; 3]).take(extra));
        self.threatened.extend(std::iter::repeat(false).take(extra));
        self.flee_vec.extend(std::iter::repeat([0.0; 3]).take(extra));
        self.capacity = new_capacity;
    }

    /// Deposit marine snow for every slot that is dead but hasn't been
    /// deposited yet (guarded by the `-999` sentinel), marking it deposited
    /// in place. Must run after any phase that can kill agents and before
    /// anything that can hand a dead slot back out (`allocate_slots`), or a
    /// same-tick rebirth into that slot would permanently skip its deposit.
    pub fn deposit_dead(&mut self, environment: &mut Environment, fauna: &FaunaConfig) {
        for i in 0..self.capacity {
            if !self.alive[i] && self.energy[i] != DEAD_ENERGY_SENTINEL {
                if let Some(species) = Species::from_id(self.species_id[i]) {
                    if let Some(params) = fauna.get(&species) {
                        let (x, y, z) = environment.cell_of(self.position[i]);
                        environment.deposit_marine_snow(x, y, z, params.size);
                    }
                }
                self.energy[i] = DEAD_ENERGY_SENTINEL;
            }
        }
    }

    /// Deposit marine snow for any stragglers (idempotent, see
    /// `deposit_dead`), then, on `cleanup_interval` ticks, repack live
    /// entries to `[0, N)` and remap `target` indices (dead targets → -1).
    pub fn cleanup(
        &mut self,
        environment: &mut Environment,
        fauna: &FaunaConfig,
        tick: u64,
        cleanup_interval: u64,
    ) {
        self.deposit_dead(environment, fauna);

        if cleanup_interval == 0 || tick % cleanup_interval != 0 {
            return;
        }
        self.compact();
    }

    fn compact(&mut self) {
        let mut remap = vec![-1i64; self.capacity];
        let mut next_slot = 0usize;
        for old in 0..self.capacity {
            if self.alive[old] {
                remap[old] = next_slot as i64;
                next_slot += 1;
            }
        }
        if next_slot == self.capacity {
            return; // already fully dense, nothing to repack
        }

        let mut new_store = AgentStore::with_capacity(self.capacity);
        for old in 0..self.capacity {
            let new_idx = remap[old];
            if new_idx < 0 {
                continue;
            }
            let new_idx = new_idx as usize;
            new_store.position[new_idx] = self.position[old];
            new_store.energy[new_idx] = self.energy[old];
            new_store.species_id[new_idx] = self.species_id[old];
            new_store.alive[new_idx] = true;
            new_store.age[new_idx] = self.age[old];
            new_store.cooldown[new_idx] = self.cooldown[old];
            new_store.satiation[new_idx] = self.satiation[old];
            new_store.search_vec[new_idx] = self.search_vec[old];
            new_store.threatened[new_idx] = self.threatened[old];
            new_store.flee_vec[new_idx] = self.flee_vec[old];
            new_store.target[new_idx] = match self.target[old] {
                t if t < 0 => -1,
                t => remap.get(t as usize).copied().unwrap_or(-1),
            };
        }
        *self = new_store;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compaction_remaps_targets_and_drops_dead_ones() {
        let mut store = AgentStore::with_capacity(4);
        store.spawn_at(0, Species::SmallFish, [0.0; 3], 10.0, [0; 3]);
        store.spawn_at(2, Species::Zooplankton, [1.0; 3], 5.0, [0; 3]);
        store.target[0] = 2; // predator targeting the prey at slot 2
        store.kill(2); // prey dies before compaction
        store.energy[2] = -999.0; // deposition already ran

        store.compact();

        assert_eq!(store.live_count(), 1);
        assert!(store.alive[0]);
        assert_eq!(store.target[0], -1, "target must remap dead slots to -1");
    }

    #[test]
    fn allocate_slots_grows_when_no_free_slots_remain() {
        let mut store = AgentStore::with_capacity(2);
        store.spawn_at(0, Species::Crab, [0.0; 3], 1.0, [0; 3]);
        store.spawn_at(1, Species::Crab, [0.0; 3], 1.0, [0; 3]);
        let slots = store.allocate_slots(3, 100);
        assert_eq!(slots.len(), 3);
        assert!(store.capacity() >= 5);
    }

    #[test]
    fn allocate_slots_truncates_at_absolute_max() {
        let mut store = AgentStore::with_capacity(2);
        store.spawn_at(0, Species::Crab, [0.0; 3], 1.0, [0; 3]);
        store.spawn_at(1, Species::Crab, [0.0; 3], 1.0, [0; 3]);
        let slots = store.allocate_slots(10, 3);
        assert_eq!(slots.len(), 1);
        assert_eq!(store.capacity(), 3);
    }
}
