//! Deterministic, discrete-time agent-based simulator of a 3-D marine
//! ecosystem. See [`create`] and [`run_headless`] for the two entry points
//! external callers (CLI, Python bindings, benchmarks) are expected to use.

pub mod agent_store;
pub mod biome;
pub mod config;
pub mod environment;
pub mod error;
pub mod feeding;
pub mod movement;
pub mod population;
pub mod spatial;
pub mod species;
pub mod threat;
pub mod world;

pub use config::{DietConfig, FaunaConfig, SimConfig};
pub use error::EngineInitError;
pub use species::Species;
pub use world::{Engine, TickCounts};

/// Construct a new engine from simulation, fauna, and diet configuration and
/// a PRNG seed.
pub fn create(
    sim_config: SimConfig,
    fauna_config: FaunaConfig,
    diet_config: DietConfig,
    seed: u64,
) -> Result<Engine, EngineInitError> {
    Engine::new(sim_config, fauna_config, diet_config, seed)
}

/// Run `tick_count` ticks on an already-constructed engine, returning the
/// per-tick population history.
pub fn run_headless(engine: &mut Engine, tick_count: u64) -> Vec<TickCounts> {
    engine.run_headless(tick_count)
}
