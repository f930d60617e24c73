//! Periodic precomputation of prey `threatened` flags and flee vectors.

use crate::agent_store::AgentStore;
use crate::spatial;
use crate::species::Species;

const THREAT_RADIUS: f64 = 15.0;

fn is_prey(species: Species) -> bool {
    matches!(
        species,
        Species::Zooplankton | Species::SmallFish | Species::Crab | Species::SeaTurtle
    )
}

/// Clears `threatened`/`flee_vec`, then sets them for every prey agent with
/// at least one predator ({SmallFish, Seal}) within [`THREAT_RADIUS`].
pub fn update(store: &mut AgentStore) {
    let capacity = store.capacity();
    for i in 0..capacity {
        store.threatened[i] = false;
        store.flee_vec[i] = [0.0; 3];
    }

    let predator_points: Vec<(usize, [f64; 3])> = (0..capacity)
        .filter(|&i| {
            store.alive[i]
                && Species::from_id(store.species_id[i])
                    .map(|s| s.is_predator())
                    .unwrap_or(false)
        })
        .map(|i| (i, store.position[i]))
        .collect();
    if predator_points.is_empty() {
        return;
    }
    let predator_tree = spatial::build_index(&predator_points);

    for prey in 0..capacity {
        if !store.alive[prey] {
            continue;
        }
        let Some(species) = Species::from_id(store.species_id[prey]) else {
            continue;
        };
        if !is_prey(species) {
            continue;
        }
        let nearby = spatial::radius_query(&predator_tree, store.position[prey], THREAT_RADIUS);
        if nearby.is_empty() {
            continue;
        }

        let mut sum = [0.0f64; 3];
        for pred in &nearby {
            for axis in 0..3 {
                sum[axis] += store.position[prey][axis] - store.position[*pred][axis];
            }
        }
        let magnitude = (sum[0] * sum[0] + sum[1] * sum[1] + sum[2] * sum[2]).sqrt();
        let flee = if magnitude > f64::EPSILON {
            [
                (sum[0] / magnitude).round(),
                (sum[1] / magnitude).round(),
                (sum[2] / magnitude).round(),
            ]
        } else {
            [0.0, 0.0, 0.0]
        };
        store.threatened[prey] = true;
        store.flee_vec[prey] = flee;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prey_near_predator_is_marked_threatened() {
        let mut store = AgentStore::with_capacity(4);
        store.spawn_at(0, Species::Zooplankton, [0.0, 0.0, 0.0], 5.0, [0; 3]);
        store.spawn_at(1, Species::SmallFish, [2.0, 0.0, 0.0], 5.0, [0; 3]);
        update(&mut store);
        assert!(store.threatened[0]);
        assert_eq!(store.flee_vec[0], [-1.0, 0.0, 0.0]);
    }

    #[test]
    fn prey_far_from_any_predator_is_not_threatened() {
        let mut store = AgentStore::with_capacity(4);
        store.spawn_at(0, Species::Zooplankton, [0.0, 0.0, 0.0], 5.0, [0; 3]);
        store.spawn_at(1, Species::SmallFish, [100.0, 0.0, 0.0], 5.0, [0; 3]);
        update(&mut store);
        assert!(!store.threatened[0]);
    }
}
