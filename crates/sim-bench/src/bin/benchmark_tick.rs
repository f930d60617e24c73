use sim_core::config::{resolve_diet_config, resolve_fauna_config, RawFaunaConfig, RawFaunaEntry};
use sim_core::SimConfig;
use std::collections::HashMap;
use std::time::Instant;

fn fauna_config() -> sim_core::FaunaConfig {
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
            carrying_capacity_threshold: Some(2000),
            ..Default::default()
        },
    );
    raw.insert(
        "smallfish".to_string(),
        RawFaunaEntry {
            size: Some(1.0),
            initial_energy: Some(10.0),
            metabolic_rate: Some(0.05),
            reproduction_threshold: Some(15.0),
            max_lifespan: Some(300),
            eating_rate: Some(0.2),
            energy_conversion_factor: Some(0.5),
            plankton_satiation_period: Some(3),
            carrying_capacity_threshold: Some(500),
            maturity_age: Some(10),
            vision_radius: Some(8.0),
            predation_range: Some(1.5),
            hunt_success_chance: Some(0.6),
            satiation_period: Some(5),
            reproduction_cooldown_period: Some(10),
            max_energy_transfer_efficiency: Some(0.8),
            optimal_prey_size: Some(0.2),
            prey_size_tolerance: Some(0.3),
            prey_scarcity_threshold: Some(5),
            ..Default::default()
        },
    );
    resolve_fauna_config(&raw).expect("benchmark fauna config is internally consistent")
}

fn main() {
    let mut config = SimConfig::from_json_str(
        r#"{
            "grid_width": 40, "grid_height": 40, "grid_depth": 10,
            "simulation_ticks": 200,
            "initial_agent_capacity": 5000, "absolute_max_agents": 20000,
            "initial_zooplankton_count": 3000, "initial_smallfish_count": 300
        }"#,
    )
    .expect("static benchmark config is valid JSON");
    config.bootstrap_period = 20;

    let fauna = fauna_config();
    let mut diet_raw = HashMap::new();
    diet_raw.insert("smallfish".to_string(), vec!["zooplankton".to_string()]);
    let diet = resolve_diet_config(&diet_raw).expect("diet references only configured species");

    let steps = 50;
    println!("Benchmarking {steps} ticks with {} initial agents", config.total_initial_agents());

    let mut engine =
        sim_core::create(config, fauna, diet, 42).expect("benchmark configuration constructs an engine");

    let start = Instant::now();
    for _ in 0..steps {
        engine.tick();
    }
    let elapsed = start.elapsed();

    println!("Total time for {steps} ticks: {elapsed:?}");
    println!("Average time per tick: {:?}", elapsed / steps as u32);
    println!(
        "Final live agent count: {}",
        engine.store.live_count()
    );
}
