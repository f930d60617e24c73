//! Metabolism, aging, overcrowding, disease, deaths, and reproduction —
//! run in that order at the start of every tick, before feeding.

use crate::agent_store::AgentStore;
use crate::config::{FaunaConfig, SimConfig};
use crate::environment::Environment;
use crate::species::{Species, ALL_SPECIES};
use rand::Rng;
use rand_chacha::ChaCha12Rng;
use std::collections::HashMap;

pub fn metabolism_and_aging(
    store: &mut AgentStore,
    environment: &Environment,
    fauna: &FaunaConfig,
    config: &SimConfig,
    is_bootstrap: bool,
) {
    for i in 0..store.capacity() {
        if !store.alive[i] {
            continue;
        }
        let Some(species) = Species::from_id(store.species_id[i]) else {
            continue;
        };
        let Some(params) = fauna.get(&species) else {
            continue;
        };
        let (x, y, z) = environment.cell_of(store.position[i]);
        let m = environment.metabolic_modifier[environment.index(x, y, z)];

        let mut rate = params.metabolic_rate;
        if is_bootstrap {
            rate *= config.bootstrap_metabolic_modifier;
        } else if store.age[i] < params.maturity_age {
            if let Some(predator) = &params.predator {
                rate *= predator.juvenile_metabolic_modifier;
            }
        }
        store.energy[i] -= rate * m;
        store.cooldown[i] = store.cooldown[i].saturating_sub(1);
        store.satiation[i] = store.satiation[i].saturating_sub(1);
        if !is_bootstrap {
            store.age[i] += 1;
        }
    }
}

fn count_by_cell(
    store: &AgentStore,
    environment: &Environment,
    species: Species,
) -> HashMap<(usize, usize, usize), Vec<usize>> {
    let mut by_cell: HashMap<(usize, usize, usize), Vec<usize>> = HashMap::new();
    for i in 0..store.capacity() {
        if store.alive[i] && store.species_id[i] == species.as_id() {
            let cell = environment.cell_of(store.position[i]);
            by_cell.entry(cell).or_default().push(i);
        }
    }
    by_cell
}

pub fn overcrowding(
    store: &mut AgentStore,
    environment: &Environment,
    fauna: &FaunaConfig,
    rng: &mut ChaCha12Rng,
) {
    for &species in ALL_SPECIES.iter() {
        let Some(params) = fauna.get(&species) else { continue };
        if params.starvation_chance <= 0.0 {
            continue;
        }
        let by_cell = count_by_cell(store, environment, species);
        for mut members in by_cell.into_values() {
            if members.len() <= params.carrying_capacity_threshold as usize {
                continue;
            }
            members.sort_unstable();
            for i in members {
                if rng.random::<f64>() < params.starvation_chance {
                    store.kill(i);
                }
            }
        }
    }
}

pub fn disease(
    store: &mut AgentStore,
    environment: &Environment,
    fauna: &FaunaConfig,
    rng: &mut ChaCha12Rng,
) {
    for &species in ALL_SPECIES.iter() {
        let Some(params) = fauna.get(&species) else { continue };
        if params.disease_chance <= 0.0 {
            continue;
        }
        if store.count_species(species) <= params.disease_threshold as usize {
            continue;
        }
        let mut members: Vec<usize> = (0..store.capacity())
            .filter(|&i| store.alive[i] && store.species_id[i] == species.as_id())
            .collect();
        members.sort_unstable();
        for i in members {
            let (x, y, z) = environment.cell_of(store.position[i]);
            let risk = environment.disease_risk[environment.index(x, y, z)];
            if rng.random::<f64>() < params.disease_chance * risk {
                store.kill(i);
            }
        }
    }
}

pub fn deaths(store: &mut AgentStore, fauna: &FaunaConfig) {
    for i in 0..store.capacity() {
        if !store.alive[i] {
            continue;
        }
        let Some(species) = Species::from_id(store.species_id[i]) else {
            continue;
        };
        let Some(params) = fauna.get(&species) else {
            continue;
        };
        if store.energy[i] <= 0.0 || store.age[i] >= params.max_lifespan {
            store.kill(i);
        }
    }
}

/// Reproduction with local-density caps. Eligibility is computed per species,
/// but the resulting parents are pooled across every species into a single
/// ascending-global-index list before slots are requested, so the store's
/// one hard ceiling is applied to one combined request rather than being
/// exhausted species-by-species in `ALL_SPECIES` order.
pub fn reproduction(
    store: &mut AgentStore,
    environment: &Environment,
    fauna: &FaunaConfig,
    config: &SimConfig,
    rng: &mut ChaCha12Rng,
) {
    let mut eligible: Vec<(usize, Species)> = Vec::new();

    for &species in ALL_SPECIES.iter() {
        let Some(params) = fauna.get(&species) else { continue };
        let density_cap = count_by_cell(store, environment, species);

        let mut candidates: Vec<usize> = (0..store.capacity())
            .filter(|&i| store.alive[i] && store.species_id[i] == species.as_id())
            .collect();
        candidates.sort_unstable();
        for i in candidates {
            if store.energy[i] <= params.reproduction_threshold {
                continue;
            }
            if let Some(predator) = &params.predator {
                if store.cooldown[i] != 0 {
                    continue;
                }
                let _ = predator;
            }
            if params.maturity_age > 0 && store.age[i] < params.maturity_age {
                continue;
            }
            let cell = environment.cell_of(store.position[i]);
            if density_cap
                .get(&cell)
                .map(|members| members.len() >= params.carrying_capacity_threshold as usize)
                .unwrap_or(false)
            {
                continue;
            }
            if params.reproduction_fear_debuff < 1.0 && store.threatened[i] {
                let fail_chance = 1.0 - params.reproduction_fear_debuff;
                if rng.random::<f64>() < fail_chance {
                    continue;
                }
            }
            eligible.push((i, species));
        }
    }

    if eligible.is_empty() {
        return;
    }
    eligible.sort_unstable_by_key(|&(i, _)| i);

    let slots = store.allocate_slots(eligible.len(), config.absolute_max_agents);
    for (&(parent, species), &child_slot) in eligible.iter().zip(slots.iter()) {
        let params = &fauna[&species];
        store.energy[parent] /= 2.0;
        if let Some(predator) = &params.predator {
            store.cooldown[parent] = predator.reproduction_cooldown_period;
        }
        let child_energy = store.energy[parent];
        let search_vec = [
            rng.random_range(-1i8..=1),
            rng.random_range(-1i8..=1),
            rng.random_range(-1i8..=1),
        ];
        store.spawn_at(child_slot, species, store.position[parent], child_energy, search_vec);
    }
    // Offspring beyond the capped capacity (eligible.len() > slots.len()) are
    // silently dropped, matching the store's single hard ceiling.
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FaunaParams;

    fn prey_params(carrying_capacity_threshold: u32, starvation_chance: f64) -> FaunaParams {
        FaunaParams {
            species: Species::Zooplankton,
            size: 0.1,
            initial_energy: 5.0,
            metabolic_rate: 0.01,
            reproduction_threshold: 8.0,
            max_lifespan: 500,
            eating_rate: 0.1,
            energy_conversion_factor: 1.0,
            plankton_satiation_period: 2,
            carrying_capacity_threshold,
            starvation_chance,
            disease_threshold: u32::MAX,
            disease_chance: 0.0,
            maturity_age: 0,
            reproduction_fear_debuff: 1.0,
            predator: None,
        }
    }

    fn test_config() -> SimConfig {
        SimConfig::from_json_str(
            r#"{"grid_width":10,"grid_height":10,"grid_depth":5,"simulation_ticks":10,
                "initial_agent_capacity":2000,"absolute_max_agents":4000}"#,
        )
        .unwrap()
    }

    #[test]
    fn overcrowded_cell_thins_to_at_most_five() {
        let mut store = AgentStore::with_capacity(1000);
        for i in 0..1000 {
            store.spawn_at(i, Species::Zooplankton, [1.0, 1.0, 1.0], 5.0, [0; 3]);
        }
        let mut fauna = HashMap::new();
        fauna.insert(Species::Zooplankton, prey_params(5, 1.0));
        let config = test_config();
        let mut rng = ChaCha12Rng::seed_from_u64(1000);
        let mut env_rng = ChaCha12Rng::seed_from_u64(3);
        let environment = Environment::new(&config, &mut env_rng);

        overcrowding(&mut store, &environment, &fauna, &mut rng);
        let remaining = store.count_species(Species::Zooplankton);
        assert!(remaining <= 5, "at most 5 zooplankton should remain, got {remaining}");
    }

    #[test]
    fn dead_agents_are_removed() {
        let mut store = AgentStore::with_capacity(2);
        store.spawn_at(0, Species::Zooplankton, [0.0; 3], -1.0, [0; 3]);
        store.spawn_at(1, Species::Zooplankton, [0.0; 3], 5.0, [0; 3]);
        let mut fauna = HashMap::new();
        fauna.insert(Species::Zooplankton, prey_params(10, 0.0));
        deaths(&mut store, &fauna);
        assert!(!store.alive[0]);
        assert!(store.alive[1]);
    }

    #[test]
    fn reproduction_halves_parent_energy_and_spawns_offspring() {
        let mut store = AgentStore::with_capacity(4);
        store.spawn_at(0, Species::Zooplankton, [2.0, 2.0, 2.0], 20.0, [0; 3]);
        let mut fauna = HashMap::new();
        fauna.insert(Species::Zooplankton, prey_params(100, 0.0));
        let config = test_config();
        let mut env_rng = ChaCha12Rng::seed_from_u64(3);
        let environment = Environment::new(&config, &mut env_rng);
        let mut rng = ChaCha12Rng::seed_from_u64(9);

        let alive_before = store.live_count();
        reproduction(&mut store, &environment, &fauna, &config, &mut rng);
        assert_eq!(store.energy[0], 10.0);
        assert_eq!(store.live_count(), alive_before + 1);
    }
}
