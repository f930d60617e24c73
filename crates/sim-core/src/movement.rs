//! Per-tick position update: flee / chase / search / wander, in that
//! priority order, followed by boundary enforcement.

use crate::agent_store::AgentStore;
use crate::config::FaunaConfig;
use crate::environment::Environment;
use crate::species::Species;
use rand::Rng;
use rand_chacha::ChaCha12Rng;

const SEARCH_RESAMPLE_CHANCE: f64 = 0.1;

pub fn update(
    store: &mut AgentStore,
    environment: &Environment,
    fauna: &FaunaConfig,
    rng: &mut ChaCha12Rng,
) {
    for i in 0..store.capacity() {
        if !store.alive[i] {
            continue;
        }
        let delta = if store.threatened[i] {
            store.flee_vec[i]
        } else if let Some(delta) = chase_delta(store, i) {
            delta
        } else if let Some(delta) = search_delta(store, fauna, i, rng) {
            delta
        } else {
            [
                rng.random_range(-1i8..=1) as f64,
                rng.random_range(-1i8..=1) as f64,
                rng.random_range(-1i8..=1) as f64,
            ]
        };

        store.position[i][0] += delta[0];
        store.position[i][1] += delta[1];
        store.position[i][2] += delta[2];
        apply_boundaries(store, environment, i);
    }
}

fn chase_delta(store: &AgentStore, i: usize) -> Option<[f64; 3]> {
    let species = Species::from_id(store.species_id[i])?;
    if !species.is_predator() {
        return None;
    }
    let target = store.target[i];
    if target < 0 {
        return None;
    }
    let target = target as usize;
    let mut delta = [0.0f64; 3];
    for axis in 0..3 {
        let diff = store.position[target][axis] - store.position[i][axis];
        delta[axis] = diff.signum();
    }
    Some(delta)
}

fn search_delta(
    store: &mut AgentStore,
    fauna: &FaunaConfig,
    i: usize,
    rng: &mut ChaCha12Rng,
) -> Option<[f64; 3]> {
    let species = Species::from_id(store.species_id[i])?;
    if !species.is_predator() {
        return None;
    }
    let params = fauna.get(&species)?;
    let hunger_threshold = params.reproduction_threshold / 2.0;
    if store.energy[i] >= hunger_threshold || store.target[i] != -1 {
        return None;
    }
    if rng.random::<f64>() < SEARCH_RESAMPLE_CHANCE {
        store.search_vec[i] = [
            rng.random_range(-1i8..=1),
            rng.random_range(-1i8..=1),
            rng.random_range(-1i8..=1),
        ];
    }
    let v = store.search_vec[i];
    Some([v[0] as f64, v[1] as f64, v[2] as f64])
}

fn apply_boundaries(store: &mut AgentStore, environment: &Environment, i: usize) {
    let w = environment.width as f64;
    let h = environment.height as f64;
    let d = environment.depth as f64;
    store.position[i][0] = store.position[i][0].rem_euclid(w);
    store.position[i][1] = store.position[i][1].rem_euclid(h);
    store.position[i][2] = store.position[i][2].clamp(0.0, d - 1.0);
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use std::collections::HashMap;

    fn test_env() -> Environment {
        let config = crate::config::SimConfig::from_json_str(
            r#"{"grid_width":5,"grid_height":5,"grid_depth":3,"simulation_ticks":10,
                "initial_agent_capacity":8,"absolute_max_agents":16}"#,
        )
        .unwrap();
        let mut rng = ChaCha12Rng::seed_from_u64(1);
        Environment::new(&config, &mut rng)
    }

    #[test]
    fn positions_wrap_and_clamp_after_movement() {
        let mut store = AgentStore::with_capacity(2);
        store.spawn_at(0, Species::Zooplankton, [4.5, 0.2, 2.9], 5.0, [1, 0, 1]);
        let environment = test_env();
        let fauna = HashMap::new();
        let mut rng = ChaCha12Rng::seed_from_u64(5);
        update(&mut store, &environment, &fauna, &mut rng);
        assert!(store.position[0][0] >= 0.0 && store.position[0][0] < 5.0);
        assert!(store.position[0][2] <= 2.0);
    }

    #[test]
    fn flee_takes_priority_over_chase_and_wander() {
        let mut store = AgentStore::with_capacity(2);
        store.spawn_at(0, Species::SmallFish, [2.0, 2.0, 1.0], 5.0, [0; 3]);
        store.threatened[0] = true;
        store.flee_vec[0] = [-1.0, 0.0, 0.0];
        store.target[0] = 1; // would chase if flee didn't win
        store.spawn_at(1, Species::Zooplankton, [4.0, 2.0, 1.0], 5.0, [0; 3]);

        let environment = test_env();
        let fauna = HashMap::new();
        let mut rng = ChaCha12Rng::seed_from_u64(5);
        update(&mut store, &environment, &fauna, &mut rng);
        assert_eq!(store.position[0][0], 1.0);
    }
}
