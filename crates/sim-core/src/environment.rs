//! The cubic lattice: plankton, marine snow, biome/modifier maps, and the
//! transient bloom/disease event machine.

use crate::biome::Biome;
use crate::config::{EnvironmentGenerationConfig, SimConfig};
use rand::Rng;
use rand_chacha::ChaCha12Rng;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    None,
    Bloom,
    DiseaseZone,
}

#[derive(Debug, Clone, Copy)]
pub struct EventState {
    pub kind: EventKind,
    pub ticks_remaining: u64,
}

impl Default for EventState {
    fn default() -> Self {
        EventState {
            kind: EventKind::None,
            ticks_remaining: 0,
        }
    }
}

/// Six parallel 3-D fields plus the transient event state, all owned here.
pub struct Environment {
    pub width: usize,
    pub height: usize,
    pub depth: usize,
    pub plankton: Vec<f64>,
    pub marine_snow: Vec<f64>,
    pub sunlight: Vec<f64>,
    pub biome_id: Vec<u8>,
    pub base_nutrient: Vec<f64>,
    pub current_nutrient: Vec<f64>,
    pub metabolic_modifier: Vec<f64>,
    pub disease_risk: Vec<f64>,
    pub refuge_mask: Vec<bool>,
    pub event: EventState,
}

impl Environment {
    #[inline]
    pub fn index(&self, x: usize, y: usize, z: usize) -> usize {
        (z * self.height + y) * self.width + x
    }

    #[inline]
    pub fn cell_of(&self, position: [f64; 3]) -> (usize, usize, usize) {
        let x = (position[0].floor() as isize).clamp(0, self.width as isize - 1) as usize;
        let y = (position[1].floor() as isize).clamp(0, self.height as isize - 1) as usize;
        let z = (position[2].floor() as isize).clamp(0, self.depth as isize - 1) as usize;
        (x, y, z)
    }

    pub fn biome_at(&self, x: usize, y: usize, z: usize) -> Biome {
        Biome::from_id(self.biome_id[self.index(x, y, z)])
    }

    pub fn new(config: &SimConfig, rng: &mut ChaCha12Rng) -> Environment {
        let (w, h, d) = (config.grid_width, config.grid_height, config.grid_depth);
        let len = w * h * d;
        let mut env = Environment {
            width: w,
            height: h,
            depth: d,
            plankton: vec![config.initial_food_density; len],
            marine_snow: vec![0.0; len],
            sunlight: vec![0.0; len],
            biome_id: vec![Biome::OpenOcean.as_id(); len],
            base_nutrient: vec![1.0; len],
            current_nutrient: vec![1.0; len],
            metabolic_modifier: vec![1.0; len],
            disease_risk: vec![1.0; len],
            refuge_mask: vec![false; len],
            event: EventState::default(),
        };
        env.build_biome_map(&config.environment_generation, rng);
        env.derive_modifier_maps();
        env.build_refuge_mask(&config.environment_generation, rng);
        env.build_sunlight_gradient();
        env
    }

    fn build_biome_map(&mut self, gen: &EnvironmentGenerationConfig, rng: &mut ChaCha12Rng) {
        let deep_sea_z = (self.depth as f64 * gen.deep_sea_depth_fraction).floor() as usize;
        let polar_x = (self.width as f64 * gen.polar_zone_width_fraction).floor() as usize;

        for z in 0..self.depth {
            for y in 0..self.height {
                for x in 0..self.width {
                    let idx = self.index(x, y, z);
                    // Sequential fill: OpenOcean base, then DeepSea by depth,
                    // then PolarSea by x on top — PolarSea wins the overlap.
                    let mut biome = Biome::OpenOcean;
                    if z >= deep_sea_z {
                        biome = Biome::DeepSea;
                    }
                    if x < polar_x {
                        biome = Biome::PolarSea;
                    }
                    self.biome_id[idx] = biome.as_id();
                }
            }
        }

        let reef_depth = ((self.depth as f64 * gen.reef_max_depth_fraction).floor() as usize).max(1);
        for _ in 0..gen.num_coral_reefs {
            if self.width <= polar_x.max(10) || self.height < 10 {
                break;
            }
            let x0 = rng.random_range(polar_x..self.width.saturating_sub(10).max(polar_x + 1));
            let y0 = rng.random_range(0..self.height.saturating_sub(10).max(1));
            // Bias the reef toward shallow depths.
            let z0 = rng.random_range(0..(self.depth.saturating_sub(reef_depth).max(1)).min(deep_sea_z.max(1)));
            for dz in 0..reef_depth {
                for dy in 0..10usize.min(self.height) {
                    for dx in 0..10usize.min(self.width) {
                        let x = x0 + dx;
                        let y = y0 + dy;
                        let z = z0 + dz;
                        if x < self.width && y < self.height && z < self.depth {
                            let idx = self.index(x, y, z);
                            self.biome_id[idx] = Biome::CoralReef.as_id();
                        }
                    }
                }
            }
        }
    }

    fn derive_modifier_maps(&mut self) {
        for idx in 0..self.biome_id.len() {
            let props = Biome::from_id(self.biome_id[idx]).properties();
            self.base_nutrient[idx] = props.nutrient_factor;
            self.current_nutrient[idx] = props.nutrient_factor;
            self.metabolic_modifier[idx] = props.metabolic_modifier;
        }
    }

    pub fn vision_modifier_at(&self, x: usize, y: usize, z: usize) -> f64 {
        self.biome_at(x, y, z).properties().vision_modifier
    }

    fn build_refuge_mask(&mut self, gen: &EnvironmentGenerationConfig, rng: &mut ChaCha12Rng) {
        let size = gen.refuge_size.max(1);
        for _ in 0..gen.num_refuges {
            if self.width <= size || self.height <= size {
                break;
            }
            let x0 = rng.random_range(0..self.width - size);
            let y0 = rng.random_range(0..self.height - size);
            let z0 = rng.random_range(0..self.depth);
            for dy in 0..size {
                for dx in 0..size {
                    let x = x0 + dx;
                    let y = y0 + dy;
                    if x < self.width && y < self.height {
                        let idx = self.index(x, y, z0);
                        self.refuge_mask[idx] = true;
                    }
                }
            }
        }
    }

    fn build_sunlight_gradient(&mut self) {
        for z in 0..self.depth {
            let value = (-(z as f64) * 0.5).exp();
            for y in 0..self.height {
                for x in 0..self.width {
                    let idx = self.index(x, y, z);
                    self.sunlight[idx] = value;
                }
            }
        }
    }

    /// Runs event update, plankton dynamics, and marine-snow dynamics in order.
    pub fn update(&mut self, config: &SimConfig, rng: &mut ChaCha12Rng) {
        self.update_event(config, rng);
        self.update_plankton(config);
        self.update_marine_snow(config);
    }

    fn update_event(&mut self, config: &SimConfig, rng: &mut ChaCha12Rng) {
        if self.event.kind == EventKind::None {
            if rng.random::<f64>() < config.event_chance {
                let kind = if rng.random::<bool>() {
                    EventKind::Bloom
                } else {
                    EventKind::DiseaseZone
                };
                self.event = EventState {
                    kind,
                    ticks_remaining: config.event_duration,
                };
                match kind {
                    EventKind::Bloom => {
                        for idx in 0..self.biome_id.len() {
                            if self.biome_id[idx] == Biome::OpenOcean.as_id() {
                                self.current_nutrient[idx] *= config.plankton_bloom_modifier;
                            }
                        }
                    }
                    EventKind::DiseaseZone => {
                        for idx in 0..self.biome_id.len() {
                            if self.biome_id[idx] == Biome::CoralReef.as_id() {
                                self.disease_risk[idx] *= config.disease_zone_modifier;
                            }
                        }
                    }
                    EventKind::None => {}
                }
            }
            return;
        }

        self.event.ticks_remaining = self.event.ticks_remaining.saturating_sub(1);
        if self.event.ticks_remaining == 0 {
            self.current_nutrient.copy_from_slice(&self.base_nutrient);
            self.disease_risk.iter_mut().for_each(|v| *v = 1.0);
            self.event = EventState::default();
        }
    }

    fn update_plankton(&mut self, config: &SimConfig) {
        let (w, h, d) = (self.width, self.height, self.depth);
        let mut next = self.plankton.clone();
        for z in 0..d {
            for y in 0..h {
                for x in 0..w {
                    let idx = self.index(x, y, z);
                    let here = self.plankton[idx];
                    let x_minus = self.plankton[self.index((x + w - 1) % w, y, z)];
                    let x_plus = self.plankton[self.index((x + 1) % w, y, z)];
                    let y_minus = self.plankton[self.index(x, (y + h - 1) % h, z)];
                    let y_plus = self.plankton[self.index(x, (y + 1) % h, z)];
                    let z_minus = if z == 0 { here } else { self.plankton[self.index(x, y, z - 1)] };
                    let z_plus = if z + 1 == d { here } else { self.plankton[self.index(x, y, z + 1)] };
                    let laplacian =
                        x_minus + x_plus + y_minus + y_plus + z_minus + z_plus - 6.0 * here;
                    let diffused = here + laplacian * config.plankton_diffusion_rate;
                    let grown = diffused
                        + diffused
                            * (1.0 - diffused)
                            * self.sunlight[idx]
                            * config.plankton_max_growth_rate
                            * self.current_nutrient[idx];
                    next[idx] = grown.clamp(0.0, 1.0);
                }
            }
        }
        self.plankton = next;
    }

    fn update_marine_snow(&mut self, config: &SimConfig) {
        let (w, h, d) = (self.width, self.height, self.depth);
        let mut next = vec![0.0; self.marine_snow.len()];
        for z in 1..d {
            for y in 0..h {
                for x in 0..w {
                    let idx = self.index(x, y, z);
                    let above = self.marine_snow[self.index(x, y, z - 1)];
                    next[idx] = above * config.marine_snow_sinking_factor;
                }
            }
        }
        self.marine_snow = next;

        for idx in 0..self.plankton.len() {
            self.plankton[idx] =
                (self.plankton[idx] + self.marine_snow[idx] * config.snow_to_plankton_conversion)
                    .clamp(0.0, 1.0);
            self.marine_snow[idx] *= config.marine_snow_decay_rate;
        }
    }

    pub fn deposit_marine_snow(&mut self, x: usize, y: usize, z: usize, amount: f64) {
        let idx = self.index(x, y, z);
        self.marine_snow[idx] += amount;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn test_config() -> SimConfig {
        SimConfig::from_json_str(
            r#"{
                "grid_width": 10, "grid_height": 10, "grid_depth": 5,
                "simulation_ticks": 10,
                "initial_agent_capacity": 16, "absolute_max_agents": 32
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn plankton_and_marine_snow_stay_in_bounds() {
        let config = test_config();
        let mut rng = ChaCha12Rng::seed_from_u64(42);
        let mut env = Environment::new(&config, &mut rng);
        for _ in 0..20 {
            env.update(&config, &mut rng);
            assert!(env.plankton.iter().all(|&p| (0.0..=1.0).contains(&p)));
            assert!(env.marine_snow.iter().all(|&s| s >= 0.0));
        }
    }

    #[test]
    fn event_perturbation_fully_reverts() {
        let mut config = test_config();
        config.event_chance = 1.0;
        config.event_duration = 3;
        let mut rng = ChaCha12Rng::seed_from_u64(7);
        let mut env = Environment::new(&config, &mut rng);
        env.update(&config, &mut rng);
        assert_ne!(env.event.kind, EventKind::None);
        for _ in 0..config.event_duration {
            env.update_event(&config, &mut rng);
        }
        assert_eq!(env.event.kind, EventKind::None);
        assert_eq!(env.current_nutrient, env.base_nutrient);
        assert!(env.disease_risk.iter().all(|&v| v == 1.0));
    }
}
