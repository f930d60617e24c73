//! Plankton grazing, scavenging, and multi-pair predation with exclusive-kill
//! arbitration. Ordered within a tick as: grazing → scavenging → predation.

use crate::agent_store::AgentStore;
use crate::config::{DietConfig, FaunaConfig, SimConfig};
use crate::environment::Environment;
use crate::spatial;
use crate::species::{Species, ALL_SPECIES};
use rand::Rng;
use rand_chacha::ChaCha12Rng;
use std::collections::HashMap;

const BASELINE_ENERGY_GAIN: f64 = 0.4;

fn grazing_eligible(species: Species) -> bool {
    matches!(species, Species::Zooplankton | Species::SeaTurtle | Species::SmallFish)
}

/// Plankton grazing with per-cell supply arbitration.
pub fn graze(
    store: &mut AgentStore,
    environment: &mut Environment,
    fauna: &FaunaConfig,
    config: &SimConfig,
) {
    let smallfish = fauna.get(&Species::SmallFish);
    let mut by_cell: HashMap<(usize, usize, usize), Vec<usize>> = HashMap::new();

    for i in 0..store.capacity() {
        if !store.alive[i] || store.satiation[i] != 0 {
            continue;
        }
        let Some(species) = Species::from_id(store.species_id[i]) else {
            continue;
        };
        if !grazing_eligible(species) {
            continue;
        }
        if species == Species::SmallFish {
            let Some(params) = smallfish else { continue };
            let Some(predator) = &params.predator else { continue };
            let juvenile = store.age[i] < params.maturity_age;
            if !juvenile {
                let (x, y, z) = environment.cell_of(store.position[i]);
                let tree_points: Vec<(usize, [f64; 3])> = (0..store.capacity())
                    .filter(|&j| store.alive[j] && store.species_id[j] == Species::Zooplankton.as_id())
                    .map(|j| (j, store.position[j]))
                    .collect();
                let count = if tree_points.is_empty() {
                    0
                } else {
                    let tree = spatial::build_index(&tree_points);
                    spatial::radius_query(
                        &tree,
                        [x as f64 + 0.5, y as f64 + 0.5, z as f64 + 0.5],
                        predator.vision_radius,
                    )
                    .len()
                };
                if count >= predator.prey_scarcity_threshold as usize {
                    continue;
                }
            }
        }
        let cell = environment.cell_of(store.position[i]);
        by_cell.entry(cell).or_default().push(i);
    }

    for (cell, eaters) in by_cell {
        let idx = environment.index(cell.0, cell.1, cell.2);
        let supply = environment.plankton[idx];
        let low_plankton_threshold = config.low_plankton_threshold;
        let scaled_rates: Vec<f64> = eaters
            .iter()
            .map(|&i| {
                let species = Species::from_id(store.species_id[i]).unwrap();
                let base_rate = fauna.get(&species).map(|p| p.eating_rate).unwrap_or(0.0);
                if supply < low_plankton_threshold {
                    base_rate * (supply / low_plankton_threshold).max(0.0)
                } else {
                    base_rate
                }
            })
            .collect();
        let demand: f64 = scaled_rates.iter().sum();
        if demand <= 0.0 {
            continue;
        }
        let factor = (supply / demand).min(1.0);
        let mut total_consumed = 0.0;
        for (k, &i) in eaters.iter().enumerate() {
            let consumed = scaled_rates[k] * factor;
            if consumed <= 0.0 {
                continue;
            }
            total_consumed += consumed;
            let species = Species::from_id(store.species_id[i]).unwrap();
            let conversion = fauna.get(&species).map(|p| p.energy_conversion_factor).unwrap_or(0.0);
            store.energy[i] += consumed * conversion + BASELINE_ENERGY_GAIN;
            let satiation_period = fauna.get(&species).map(|p| p.plankton_satiation_period).unwrap_or(0);
            store.satiation[i] = satiation_period;
        }
        environment.plankton[idx] = (environment.plankton[idx] - total_consumed).max(0.0);
    }
}

/// Crab-only two-step sink/search movement followed by eating marine snow.
pub fn scavenge(store: &mut AgentStore, environment: &mut Environment, fauna: &FaunaConfig) {
    let Some(crab) = fauna.get(&Species::Crab) else { return };
    let (w, h, d) = (environment.width, environment.height, environment.depth);

    for i in 0..store.capacity() {
        if !store.alive[i] || store.species_id[i] != Species::Crab.as_id() {
            continue;
        }
        let (x, y, z) = environment.cell_of(store.position[i]);
        if z + 1 < d {
            store.position[i][2] = (z + 1) as f64;
            continue;
        }

        let mut best = (x, y);
        let mut best_snow = f64::MIN;
        for dy in -1i64..=1 {
            for dx in -1i64..=1 {
                let nx = ((x as i64 + dx).rem_euclid(w as i64)) as usize;
                let ny = ((y as i64 + dy).rem_euclid(h as i64)) as usize;
                let snow = environment.marine_snow[environment.index(nx, ny, z)];
                if snow > best_snow {
                    best_snow = snow;
                    best = (nx, ny);
                }
            }
        }
        store.position[i][0] = best.0 as f64;
        store.position[i][1] = best.1 as f64;

        let idx = environment.index(best.0, best.1, z);
        let consumed = crab.eating_rate.min(environment.marine_snow[idx]);
        environment.marine_snow[idx] -= consumed;
        store.energy[i] += consumed * crab.energy_conversion_factor;
    }
}

fn gaussian_efficiency(prey_size: f64, predator: &crate::config::PredatorParams) -> f64 {
    let diff = prey_size - predator.optimal_prey_size;
    predator.max_energy_transfer_efficiency
        * (-(diff * diff) / (2.0 * predator.prey_size_tolerance * predator.prey_size_tolerance)).exp()
}

/// Skipped entirely during bootstrap (callers must not invoke this phase then;
/// `targets` are cleared by the caller when bootstrap begins).
pub fn predate(
    store: &mut AgentStore,
    environment: &Environment,
    fauna: &FaunaConfig,
    diet: &DietConfig,
    config: &SimConfig,
    rng: &mut ChaCha12Rng,
) {
    for &predator_species in ALL_SPECIES.iter() {
        let Some(prey_list) = diet.get(&predator_species) else { continue };
        let Some(predator_params) = fauna.get(&predator_species) else { continue };
        let Some(predator_cfg) = &predator_params.predator else { continue };

        let predator_indices: Vec<usize> = (0..store.capacity())
            .filter(|&i| {
                store.alive[i] && store.species_id[i] == predator_species.as_id() && store.satiation[i] == 0
            })
            .collect();
        if predator_indices.is_empty() {
            continue;
        }

        let prey_points: Vec<(usize, [f64; 3])> = (0..store.capacity())
            .filter(|&i| {
                if !store.alive[i] {
                    return false;
                }
                let Some(species) = Species::from_id(store.species_id[i]) else {
                    return false;
                };
                if !prey_list.contains(&species) {
                    return false;
                }
                let maturity_age = fauna.get(&species).map(|p| p.maturity_age).unwrap_or(0);
                !(maturity_age > 0 && store.age[i] < maturity_age)
            })
            .map(|i| (i, store.position[i]))
            .collect();
        if prey_points.is_empty() {
            continue;
        }
        let prey_tree = spatial::build_index(&prey_points);

        // Acquisition, in ascending predator index order for reproducibility.
        for &pred in &predator_indices {
            let (x, y, z) = environment.cell_of(store.position[pred]);
            let mut vision = predator_cfg.vision_radius * environment.vision_modifier_at(x, y, z);
            if environment.refuge_mask[environment.index(x, y, z)] {
                vision *= predator_cfg.refuge_vision_modifier;
            }
            if let Some((prey_idx, distance)) = spatial::nearest_query(&prey_tree, store.position[pred]) {
                if distance < vision {
                    store.target[pred] = prey_idx as i64;
                } else {
                    store.target[pred] = -1;
                }
            }
        }

        // Strike phase: gather successful strikes, then arbitrate exclusivity.
        let mut strikes: Vec<(usize, usize, f64)> = Vec::new(); // (predator, prey, distance)
        for &pred in &predator_indices {
            let target = store.target[pred];
            if target < 0 {
                continue;
            }
            let prey = target as usize;
            if !store.alive[prey] {
                store.target[pred] = -1;
                continue;
            }
            let distance = squared_distance(store.position[pred], store.position[prey]).sqrt();
            if distance >= predator_cfg.predation_range {
                continue;
            }
            let mut chance = predator_cfg.hunt_success_chance;
            if store.age[pred] < predator_params.maturity_age {
                chance *= predator_cfg.juvenile_hunt_modifier;
            }
            let (px, py, pz) = environment.cell_of(store.position[prey]);
            if environment.refuge_mask[environment.index(px, py, pz)] {
                chance *= config.refuge_hunt_debuff;
            }
            let roll: f64 = rng.random();
            if roll < chance {
                strikes.push((pred, prey, distance));
            }
        }

        // Exclusive kill: first predator (ascending index) wins per prey id.
        let mut claimed: std::collections::HashSet<usize> = std::collections::HashSet::new();
        for (pred, prey, _distance) in strikes {
            if claimed.contains(&prey) {
                continue;
            }
            claimed.insert(prey);
            let prey_species = Species::from_id(store.species_id[prey]).unwrap();
            let prey_size = fauna.get(&prey_species).map(|p| p.size).unwrap_or(0.0);
            let efficiency = gaussian_efficiency(prey_size, predator_cfg);
            store.energy[pred] += prey_size * efficiency;
            store.satiation[pred] = predator_cfg.satiation_period;
            store.kill(prey);
        }
    }
}

fn squared_distance(a: [f64; 3], b: [f64; 3]) -> f64 {
    let dx = a[0] - b[0];
    let dy = a[1] - b[1];
    let dz = a[2] - b[2];
    dx * dx + dy * dy + dz * dz
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PredatorParams;
    use rand::SeedableRng;

    fn seal_params() -> crate::config::FaunaParams {
        crate::config::FaunaParams {
            species: Species::Seal,
            size: 5.0,
            initial_energy: 50.0,
            metabolic_rate: 0.1,
            reproduction_threshold: 40.0,
            max_lifespan: 1000,
            eating_rate: 0.0,
            energy_conversion_factor: 1.0,
            plankton_satiation_period: 0,
            carrying_capacity_threshold: 50,
            starvation_chance: 0.0,
            disease_threshold: u32::MAX,
            disease_chance: 0.0,
            maturity_age: 10,
            reproduction_fear_debuff: 1.0,
            predator: Some(PredatorParams {
                vision_radius: 10.0,
                predation_range: 2.0,
                hunt_success_chance: 1.0,
                satiation_period: 5,
                reproduction_cooldown_period: 10,
                max_energy_transfer_efficiency: 0.9,
                optimal_prey_size: 1.0,
                prey_size_tolerance: 1.0,
                juvenile_hunt_modifier: 0.5,
                juvenile_metabolic_modifier: 1.0,
                refuge_vision_modifier: 1.0,
                prey_scarcity_threshold: 0,
            }),
        }
    }

    fn smallfish_prey_params() -> crate::config::FaunaParams {
        crate::config::FaunaParams {
            species: Species::SmallFish,
            size: 1.0,
            initial_energy: 10.0,
            metabolic_rate: 0.1,
            reproduction_threshold: 15.0,
            max_lifespan: 200,
            eating_rate: 0.2,
            energy_conversion_factor: 0.5,
            plankton_satiation_period: 3,
            carrying_capacity_threshold: 40,
            starvation_chance: 0.0,
            disease_threshold: u32::MAX,
            disease_chance: 0.0,
            maturity_age: 0,
            reproduction_fear_debuff: 1.0,
            predator: Some(PredatorParams {
                vision_radius: 8.0,
                predation_range: 1.5,
                hunt_success_chance: 0.6,
                satiation_period: 5,
                reproduction_cooldown_period: 10,
                max_energy_transfer_efficiency: 0.8,
                optimal_prey_size: 0.2,
                prey_size_tolerance: 0.3,
                juvenile_hunt_modifier: 0.5,
                juvenile_metabolic_modifier: 1.0,
                refuge_vision_modifier: 1.0,
                prey_scarcity_threshold: 5,
            }),
        }
    }

    fn test_env() -> Environment {
        let config = SimConfig::from_json_str(
            r#"{"grid_width":10,"grid_height":10,"grid_depth":5,"simulation_ticks":10,
                "initial_agent_capacity":16,"absolute_max_agents":32}"#,
        )
        .unwrap();
        let mut rng = ChaCha12Rng::seed_from_u64(1);
        Environment::new(&config, &mut rng)
    }

    #[test]
    fn exclusive_kill_credits_exactly_one_predator() {
        let mut store = AgentStore::with_capacity(4);
        store.spawn_at(0, Species::Seal, [0.0, 0.0, 0.0], 30.0, [0; 3]);
        store.spawn_at(1, Species::Seal, [0.5, 0.0, 0.0], 30.0, [0; 3]);
        store.spawn_at(2, Species::SmallFish, [0.2, 0.0, 0.0], 10.0, [0; 3]);
        store.age[0] = 100;
        store.age[1] = 100;

        let mut fauna = HashMap::new();
        fauna.insert(Species::Seal, seal_params());
        fauna.insert(Species::SmallFish, smallfish_prey_params());
        let mut diet = HashMap::new();
        diet.insert(Species::Seal, vec![Species::SmallFish]);

        let config = SimConfig::from_json_str(
            r#"{"grid_width":10,"grid_height":10,"grid_depth":5,"simulation_ticks":10,
                "initial_agent_capacity":16,"absolute_max_agents":32}"#,
        )
        .unwrap();
        let env = test_env();
        let mut rng = ChaCha12Rng::seed_from_u64(42);
        predate(&mut store, &env, &fauna, &diet, &config, &mut rng);

        assert!(!store.alive[2], "prey must be killed");
        let winners = [store.satiation[0] > 0, store.satiation[1] > 0];
        assert_eq!(
            winners.iter().filter(|&&w| w).count(),
            1,
            "exactly one predator must be credited with the kill"
        );
    }
}
