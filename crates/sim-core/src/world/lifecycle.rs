//! Fixed-order tick orchestration: the single place that decides what phase
//! runs when. See `Engine::tick` for the order.

use super::Engine;
use crate::{feeding, movement, population, threat};

impl Engine {
    /// Advance the simulation by exactly one tick, running every phase in its
    /// fixed order. Every phase is total: no exceptions propagate.
    pub fn tick(&mut self) {
        let is_bootstrap = self.is_bootstrap();
        tracing::trace!(tick = self.tick, is_bootstrap, "tick start");

        self.environment.update(&self.config, &mut self.rng);
        tracing::trace!(tick = self.tick, "environment updated");

        if self.config.threat_update_interval > 0 && self.tick % self.config.threat_update_interval == 0 {
            threat::update(&mut self.store);
            tracing::trace!(tick = self.tick, "threat map updated");
        }

        population::metabolism_and_aging(
            &mut self.store,
            &self.environment,
            &self.fauna,
            &self.config,
            is_bootstrap,
        );
        population::overcrowding(&mut self.store, &self.environment, &self.fauna, &mut self.rng);
        population::disease(&mut self.store, &self.environment, &self.fauna, &mut self.rng);
        population::deaths(&mut self.store, &self.fauna);

        // Deposit every death from this tick's culling before reproduction can
        // hand a dead slot back out via allocate_slots — otherwise a same-tick
        // rebirth into that slot would permanently skip its marine-snow deposit.
        self.store.deposit_dead(&mut self.environment, &self.fauna);

        population::reproduction(
            &mut self.store,
            &self.environment,
            &self.fauna,
            &self.config,
            &mut self.rng,
        );
        tracing::trace!(
            tick = self.tick,
            live = self.store.live_count(),
            "population phase complete"
        );

        feeding::graze(&mut self.store, &mut self.environment, &self.fauna, &self.config);
        feeding::scavenge(&mut self.store, &mut self.environment, &self.fauna);
        if is_bootstrap {
            for i in 0..self.store.capacity() {
                self.store.target[i] = -1;
            }
        } else {
            feeding::predate(
                &mut self.store,
                &self.environment,
                &self.fauna,
                &self.diet,
                &self.config,
                &mut self.rng,
            );
        }
        tracing::trace!(tick = self.tick, "feeding phase complete");

        movement::update(&mut self.store, &self.environment, &self.fauna, &mut self.rng);
        self.store
            .cleanup(&mut self.environment, &self.fauna, self.tick, self.config.cleanup_interval);

        tracing::debug!(tick = self.tick, live = self.store.live_count(), "tick complete");
        self.tick += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{resolve_diet_config, resolve_fauna_config, RawFaunaConfig, RawFaunaEntry};
    use crate::config::SimConfig;
    use std::collections::HashMap;

    fn bootstrap_engine() -> Engine {
        let config = SimConfig::from_json_str(
            r#"{"grid_width":10,"grid_height":10,"grid_depth":5,"simulation_ticks":10,
                "bootstrap_period":5,
                "initial_agent_capacity":200,"absolute_max_agents":400,
                "initial_zooplankton_count":20}"#,
        )
        .unwrap();
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
                maturity_age: Some(5),
                ..Default::default()
            },
        );
        let fauna = resolve_fauna_config(&raw).unwrap();
        let diet = resolve_diet_config(&HashMap::new()).unwrap();
        Engine::new(config, fauna, diet, 7).unwrap()
    }

    #[test]
    fn bootstrap_ticks_do_not_age_agents() {
        let mut engine = bootstrap_engine();
        for _ in 0..3 {
            engine.tick();
        }
        assert!(engine.store.age.iter().all(|&age| age == 0));
    }
}
