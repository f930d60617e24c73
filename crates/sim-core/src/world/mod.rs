pub mod lifecycle;
pub mod metrics;

pub use metrics::TickCounts;

use crate::agent_store::AgentStore;
use crate::config::{DietConfig, FaunaConfig, SimConfig};
use crate::environment::Environment;
use crate::error::EngineInitError;
use crate::species::ALL_SPECIES;
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha12Rng;

/// The simulation engine: lattice, agent store, configuration, PRNG, and the
/// monotonic tick counter. Constructed once via [`Engine::new`] and then
/// advanced tick-by-tick by [`Engine::run_headless`].
pub struct Engine {
    pub environment: Environment,
    pub store: AgentStore,
    pub fauna: FaunaConfig,
    pub diet: DietConfig,
    pub config: SimConfig,
    pub(crate) rng: ChaCha12Rng,
    pub tick: u64,
}

impl Engine {
    pub fn new(
        config: SimConfig,
        fauna: FaunaConfig,
        diet: DietConfig,
        seed: u64,
    ) -> Result<Engine, EngineInitError> {
        Self::try_new(config, fauna, diet, seed)
    }

    pub fn try_new(
        config: SimConfig,
        fauna: FaunaConfig,
        diet: DietConfig,
        seed: u64,
    ) -> Result<Engine, EngineInitError> {
        if config.grid_width == 0 || config.grid_height == 0 || config.grid_depth == 0 {
            return Err(EngineInitError::ZeroSizedGrid);
        }
        if config.initial_agent_capacity > config.absolute_max_agents {
            return Err(EngineInitError::InitialCapacityExceedsMax {
                initial: config.initial_agent_capacity,
                max: config.absolute_max_agents,
            });
        }
        let requested = config.total_initial_agents();
        if requested > config.initial_agent_capacity {
            return Err(EngineInitError::TooManyInitialAgents {
                requested,
                capacity: config.initial_agent_capacity,
            });
        }
        for &species in ALL_SPECIES.iter() {
            if config.initial_count(species) > 0 && !fauna.contains_key(&species) {
                return Err(EngineInitError::MissingFaunaEntry(species));
            }
        }
        for (&predator, prey_list) in &diet {
            let predator_params = fauna
                .get(&predator)
                .ok_or(EngineInitError::MissingFaunaEntry(predator))?;
            if predator_params.predator.is_none() {
                return Err(EngineInitError::DietReferencesNonPredator(predator));
            }
            for &prey in prey_list {
                if !fauna.contains_key(&prey) {
                    return Err(EngineInitError::MissingFaunaEntry(prey));
                }
            }
        }

        let mut rng = ChaCha12Rng::seed_from_u64(seed);
        let environment = Environment::new(&config, &mut rng);
        let mut store = AgentStore::with_capacity(config.initial_agent_capacity);

        let mut next_slot = 0usize;
        for &species in ALL_SPECIES.iter() {
            let count = config.initial_count(species);
            if count == 0 {
                continue;
            }
            let params = &fauna[&species];
            for _ in 0..count {
                let position = [
                    rng.random::<f64>() * config.grid_width as f64,
                    rng.random::<f64>() * config.grid_height as f64,
                    rng.random::<f64>() * config.grid_depth as f64,
                ];
                let search_vec = [
                    rng.random_range(-1i8..=1),
                    rng.random_range(-1i8..=1),
                    rng.random_range(-1i8..=1),
                ];
                store.spawn_at(next_slot, species, position, params.initial_energy, search_vec);
                next_slot += 1;
            }
        }

        tracing::debug!(
            seed,
            initial_agents = next_slot,
            grid_width = config.grid_width,
            grid_height = config.grid_height,
            grid_depth = config.grid_depth,
            "engine constructed"
        );
        Ok(Engine {
            environment,
            store,
            fauna,
            diet,
            config,
            rng,
            tick: 0,
        })
    }

    pub fn is_bootstrap(&self) -> bool {
        self.tick < self.config.bootstrap_period
    }

    /// Run `tick_count` ticks, returning the per-tick history. Stops early if
    /// both zooplankton and small fish go extinct after the bootstrap period.
    pub fn run_headless(&mut self, tick_count: u64) -> Vec<TickCounts> {
        let mut history = Vec::with_capacity(tick_count as usize);
        for _ in 0..tick_count {
            self.tick();
            let counts = metrics::count_species(&self.store, self.tick);
            let stop = self.tick > self.config.bootstrap_period
                && counts.zooplankton == 0
                && counts.smallfish == 0;
            history.push(counts);
            if stop {
                break;
            }
        }
        history
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{resolve_diet_config, resolve_fauna_config, RawFaunaConfig, RawFaunaEntry};
    use std::collections::HashMap;

    fn minimal_engine(initial_zooplankton: usize) -> Engine {
        let mut config = SimConfig::from_json_str(
            r#"{"grid_width":10,"grid_height":10,"grid_depth":5,"simulation_ticks":50,
                "initial_agent_capacity":2000,"absolute_max_agents":4000}"#,
        )
        .unwrap();
        config.initial_zooplankton_count = initial_zooplankton;

        let mut raw: RawFaunaConfig = HashMap::new();
        raw.insert(
            "zooplankton".to_string(),
            RawFaunaEntry {
                size: Some(0.1),
                initial_energy: Some(5.0),
                metabolic_rate: Some(0.01),
                reproduction_threshold: Some(8.0),
                max_lifespan: Some(500),
                eating_rate: Some(0.1),
                energy_conversion_factor: Some(1.0),
                plankton_satiation_period: Some(2),
                carrying_capacity_threshold: Some(500),
                ..Default::default()
            },
        );
        let fauna = resolve_fauna_config(&raw).unwrap();
        let diet = resolve_diet_config(&HashMap::new()).unwrap();
        Engine::new(config, fauna, diet, 42).unwrap()
    }

    #[test]
    fn construction_rejects_zero_sized_grid() {
        let config = SimConfig::from_json_str(
            r#"{"grid_width":0,"grid_height":10,"grid_depth":5,"simulation_ticks":10,
                "initial_agent_capacity":16,"absolute_max_agents":32}"#,
        )
        .unwrap();
        let err = Engine::new(config, HashMap::new(), HashMap::new(), 1).unwrap_err();
        assert!(matches!(err, EngineInitError::ZeroSizedGrid));
    }

    #[test]
    fn environment_only_run_keeps_species_counts_at_zero() {
        let mut engine = minimal_engine(0);
        let history = engine.run_headless(20);
        assert!(history.iter().all(|c| c.zooplankton == 0));
        let total_plankton: f64 = engine.environment.plankton.iter().sum();
        assert!(total_plankton > 0.0);
        let total_snow: f64 = engine.environment.marine_snow.iter().sum();
        assert_eq!(total_snow, 0.0);
    }

    #[test]
    fn determinism_same_seed_same_history() {
        let mut engine_a = minimal_engine(50);
        let mut engine_b = minimal_engine(50);
        let history_a = engine_a.run_headless(30);
        let history_b = engine_b.run_headless(30);
        assert_eq!(history_a.len(), history_b.len());
        for (a, b) in history_a.iter().zip(history_b.iter()) {
            assert_eq!(a, b);
        }
    }
}
