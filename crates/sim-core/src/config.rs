//! On-disk configuration: simulation parameters, fauna archetypes (with
//! single-level textual inheritance), and the predator/prey diet table.
//!
//! Deserialization uses `serde` + `serde_json`, matching the field set
//! documented for the external configuration schema. Parsing and inheritance
//! failures are reported through [`ConfigError`] and are always fatal at
//! construction time — nothing here is recoverable mid-run.

use crate::species::Species;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config {path}: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("fauna archetype {child:?} declares unknown parent archetype {parent:?}")]
    UnknownArchetype { child: String, parent: String },
    #[error("fauna entry {0:?} does not name a known species")]
    UnknownFaunaSpecies(String),
    #[error("missing required field {field:?} for species {species}")]
    MissingFaunaField {
        species: String,
        field: &'static str,
    },
    #[error("no fauna entry found for species {0}")]
    MissingFaunaEntry(String),
    #[error("diet table references unknown species {0:?}")]
    UnknownDietSpecies(String),
}

fn default_deep_sea_fraction() -> f64 {
    0.4
}
fn default_polar_fraction() -> f64 {
    0.15
}
fn default_num_reefs() -> usize {
    3
}
fn default_reef_fraction() -> f64 {
    0.3
}
fn default_refuge_size() -> usize {
    4
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EnvironmentGenerationConfig {
    pub deep_sea_depth_fraction: f64,
    pub polar_zone_width_fraction: f64,
    pub num_coral_reefs: usize,
    pub reef_max_depth_fraction: f64,
    pub num_refuges: usize,
    pub refuge_size: usize,
}

impl Default for EnvironmentGenerationConfig {
    fn default() -> Self {
        Self {
            deep_sea_depth_fraction: default_deep_sea_fraction(),
            polar_zone_width_fraction: default_polar_fraction(),
            num_coral_reefs: default_num_reefs(),
            reef_max_depth_fraction: default_reef_fraction(),
            num_refuges: 2,
            refuge_size: default_refuge_size(),
        }
    }
}

/// Simulation-wide parameters (grid shape, timing, environment dynamics).
#[derive(Debug, Clone, Deserialize)]
pub struct SimConfig {
    pub grid_width: usize,
    pub grid_height: usize,
    pub grid_depth: usize,
    pub simulation_ticks: u64,
    #[serde(default = "SimConfig::default_bootstrap_period")]
    pub bootstrap_period: u64,
    #[serde(default = "SimConfig::default_cleanup_interval")]
    pub cleanup_interval: u64,
    #[serde(default = "SimConfig::default_threat_update_interval")]
    pub threat_update_interval: u64,
    pub initial_agent_capacity: usize,
    pub absolute_max_agents: usize,
    #[serde(default = "SimConfig::default_initial_food_density")]
    pub initial_food_density: f64,
    #[serde(default = "SimConfig::default_diffusion_rate")]
    pub plankton_diffusion_rate: f64,
    #[serde(default = "SimConfig::default_max_growth")]
    pub plankton_max_growth_rate: f64,
    #[serde(default = "SimConfig::default_snow_decay")]
    pub marine_snow_decay_rate: f64,
    #[serde(default = "SimConfig::default_sinking_factor")]
    pub marine_snow_sinking_factor: f64,
    #[serde(default = "SimConfig::default_snow_to_plankton")]
    pub snow_to_plankton_conversion: f64,
    #[serde(default = "SimConfig::default_event_chance")]
    pub event_chance: f64,
    #[serde(default = "SimConfig::default_event_duration")]
    pub event_duration: u64,
    #[serde(default = "SimConfig::default_bloom_modifier")]
    pub plankton_bloom_modifier: f64,
    #[serde(default = "SimConfig::default_disease_modifier")]
    pub disease_zone_modifier: f64,
    #[serde(default = "SimConfig::default_refuge_hunt_debuff")]
    pub refuge_hunt_debuff: f64,
    #[serde(default = "SimConfig::default_low_plankton_threshold")]
    pub low_plankton_threshold: f64,
    #[serde(default = "SimConfig::default_bootstrap_metabolic_modifier")]
    pub bootstrap_metabolic_modifier: f64,
    #[serde(default)]
    pub environment_generation: EnvironmentGenerationConfig,
    #[serde(default)]
    pub initial_zooplankton_count: usize,
    #[serde(default)]
    pub initial_smallfish_count: usize,
    #[serde(default)]
    pub initial_crab_count: usize,
    #[serde(default)]
    pub initial_seal_count: usize,
    #[serde(default)]
    pub initial_seaturtle_count: usize,
}

impl SimConfig {
    fn default_bootstrap_period() -> u64 {
        20
    }
    fn default_cleanup_interval() -> u64 {
        25
    }
    fn default_threat_update_interval() -> u64 {
        5
    }
    fn default_initial_food_density() -> f64 {
        0.5
    }
    fn default_diffusion_rate() -> f64 {
        0.1
    }
    fn default_max_growth() -> f64 {
        0.05
    }
    fn default_snow_decay() -> f64 {
        0.95
    }
    fn default_sinking_factor() -> f64 {
        0.5
    }
    fn default_snow_to_plankton() -> f64 {
        0.02
    }
    fn default_event_chance() -> f64 {
        0.001
    }
    fn default_event_duration() -> u64 {
        50
    }
    fn default_bloom_modifier() -> f64 {
        2.0
    }
    fn default_disease_modifier() -> f64 {
        3.0
    }
    fn default_refuge_hunt_debuff() -> f64 {
        0.3
    }
    fn default_low_plankton_threshold() -> f64 {
        0.1
    }
    fn default_bootstrap_metabolic_modifier() -> f64 {
        0.2
    }

    pub fn from_json_str(text: &str) -> Result<SimConfig, ConfigError> {
        serde_json::from_str(text).map_err(|source| ConfigError::Json {
            path: "<string>".to_string(),
            source,
        })
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<SimConfig, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Json {
            path: path.display().to_string(),
            source,
        })
    }

    pub fn initial_count(&self, species: Species) -> usize {
        match species {
            Species::Zooplankton => self.initial_zooplankton_count,
            Species::SmallFish => self.initial_smallfish_count,
            Species::Crab => self.initial_crab_count,
            Species::Seal => self.initial_seal_count,
            Species::SeaTurtle => self.initial_seaturtle_count,
        }
    }

    pub fn total_initial_agents(&self) -> usize {
        crate::species::ALL_SPECIES
            .iter()
            .map(|&s| self.initial_count(s))
            .sum()
    }
}

/// A single fauna entry as written in configuration, before archetype
/// inheritance is resolved. Every field is optional so that a child archetype
/// can omit anything it inherits from its parent.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawFaunaEntry {
    pub parent: Option<String>,
    pub size: Option<f64>,
    pub initial_energy: Option<f64>,
    pub metabolic_rate: Option<f64>,
    pub reproduction_threshold: Option<f64>,
    pub max_lifespan: Option<u32>,
    pub eating_rate: Option<f64>,
    pub energy_conversion_factor: Option<f64>,
    pub plankton_satiation_period: Option<u32>,
    pub carrying_capacity_threshold: Option<u32>,
    pub starvation_chance: Option<f64>,
    pub disease_threshold: Option<u32>,
    pub disease_chance: Option<f64>,
    pub maturity_age: Option<u32>,
    pub reproduction_fear_debuff: Option<f64>,
    // Predator-only fields.
    pub vision_radius: Option<f64>,
    pub predation_range: Option<f64>,
    pub hunt_success_chance: Option<f64>,
    pub satiation_period: Option<u32>,
    pub reproduction_cooldown_period: Option<u32>,
    pub max_energy_transfer_efficiency: Option<f64>,
    pub optimal_prey_size: Option<f64>,
    pub prey_size_tolerance: Option<f64>,
    pub juvenile_hunt_modifier: Option<f64>,
    pub juvenile_metabolic_modifier: Option<f64>,
    pub refuge_vision_modifier: Option<f64>,
    pub prey_scarcity_threshold: Option<u32>,
}

macro_rules! inherit {
    ($parent:expr, $child:expr, $($field:ident),+ $(,)?) => {
        RawFaunaEntry {
            parent: $child.parent.clone(),
            $($field: $child.$field.or($parent.$field),)+
        }
    };
}

impl RawFaunaEntry {
    fn merged_with_parent(&self, parent: &RawFaunaEntry) -> RawFaunaEntry {
        inherit!(
            parent,
            self,
            size,
            initial_energy,
            metabolic_rate,
            reproduction_threshold,
            max_lifespan,
            eating_rate,
            energy_conversion_factor,
            plankton_satiation_period,
            carrying_capacity_threshold,
            starvation_chance,
            disease_threshold,
            disease_chance,
            maturity_age,
            reproduction_fear_debuff,
            vision_radius,
            predation_range,
            hunt_success_chance,
            satiation_period,
            reproduction_cooldown_period,
            max_energy_transfer_efficiency,
            optimal_prey_size,
            prey_size_tolerance,
            juvenile_hunt_modifier,
            juvenile_metabolic_modifier,
            refuge_vision_modifier,
            prey_scarcity_threshold,
        )
    }
}

/// Predator-only fields of a resolved fauna archetype.
#[derive(Debug, Clone)]
pub struct PredatorParams {
    pub vision_radius: f64,
    pub predation_range: f64,
    pub hunt_success_chance: f64,
    pub satiation_period: u32,
    pub reproduction_cooldown_period: u32,
    pub max_energy_transfer_efficiency: f64,
    pub optimal_prey_size: f64,
    pub prey_size_tolerance: f64,
    pub juvenile_hunt_modifier: f64,
    pub juvenile_metabolic_modifier: f64,
    pub refuge_vision_modifier: f64,
    pub prey_scarcity_threshold: u32,
}

/// Fully resolved, per-species tuning parameters.
#[derive(Debug, Clone)]
pub struct FaunaParams {
    pub species: Species,
    pub size: f64,
    pub initial_energy: f64,
    pub metabolic_rate: f64,
    pub reproduction_threshold: f64,
    pub max_lifespan: u32,
    pub eating_rate: f64,
    pub energy_conversion_factor: f64,
    pub plankton_satiation_period: u32,
    pub carrying_capacity_threshold: u32,
    pub starvation_chance: f64,
    pub disease_threshold: u32,
    pub disease_chance: f64,
    pub maturity_age: u32,
    pub reproduction_fear_debuff: f64,
    pub predator: Option<PredatorParams>,
}

fn require<T>(value: Option<T>, species: Species, field: &'static str) -> Result<T, ConfigError> {
    value.ok_or_else(|| ConfigError::MissingFaunaField {
        species: species.name().to_string(),
        field,
    })
}

impl FaunaParams {
    fn from_raw(species: Species, raw: &RawFaunaEntry) -> Result<FaunaParams, ConfigError> {
        let predator = if species.is_predator() {
            Some(PredatorParams {
                vision_radius: require(raw.vision_radius, species, "vision_radius")?,
                predation_range: require(raw.predation_range, species, "predation_range")?,
                hunt_success_chance: require(
                    raw.hunt_success_chance,
                    species,
                    "hunt_success_chance",
                )?,
                satiation_period: require(raw.satiation_period, species, "satiation_period")?,
                reproduction_cooldown_period: require(
                    raw.reproduction_cooldown_period,
                    species,
                    "reproduction_cooldown_period",
                )?,
                max_energy_transfer_efficiency: require(
                    raw.max_energy_transfer_efficiency,
                    species,
                    "max_energy_transfer_efficiency",
                )?,
                optimal_prey_size: require(raw.optimal_prey_size, species, "optimal_prey_size")?,
                prey_size_tolerance: require(
                    raw.prey_size_tolerance,
                    species,
                    "prey_size_tolerance",
                )?,
                juvenile_hunt_modifier: raw.juvenile_hunt_modifier.unwrap_or(1.0),
                juvenile_metabolic_modifier: raw.juvenile_metabolic_modifier.unwrap_or(1.0),
                refuge_vision_modifier: raw.refuge_vision_modifier.unwrap_or(1.0),
                prey_scarcity_threshold: raw.prey_scarcity_threshold.unwrap_or(0),
            })
        } else {
            None
        };

        Ok(FaunaParams {
            species,
            size: require(raw.size, species, "size")?,
            initial_energy: require(raw.initial_energy, species, "initial_energy")?,
            metabolic_rate: require(raw.metabolic_rate, species, "metabolic_rate")?,
            reproduction_threshold: require(
                raw.reproduction_threshold,
                species,
                "reproduction_threshold",
            )?,
            max_lifespan: require(raw.max_lifespan, species, "max_lifespan")?,
            eating_rate: raw.eating_rate.unwrap_or(0.0),
            energy_conversion_factor: require(
                raw.energy_conversion_factor,
                species,
                "energy_conversion_factor",
            )?,
            plankton_satiation_period: raw.plankton_satiation_period.unwrap_or(0),
            carrying_capacity_threshold: require(
                raw.carrying_capacity_threshold,
                species,
                "carrying_capacity_threshold",
            )?,
            starvation_chance: raw.starvation_chance.unwrap_or(0.0),
            disease_threshold: raw.disease_threshold.unwrap_or(u32::MAX),
            disease_chance: raw.disease_chance.unwrap_or(0.0),
            maturity_age: raw.maturity_age.unwrap_or(0),
            reproduction_fear_debuff: raw.reproduction_fear_debuff.unwrap_or(1.0),
            predator,
        })
    }
}

pub type RawFaunaConfig = HashMap<String, RawFaunaEntry>;
pub type FaunaConfig = HashMap<Species, FaunaParams>;

/// Resolve single-level archetype inheritance and required fields for every
/// entry, keyed by species name (e.g. `"zooplankton"`, `"smallfish"`, ...).
pub fn resolve_fauna_config(raw: &RawFaunaConfig) -> Result<FaunaConfig, ConfigError> {
    let mut resolved = HashMap::with_capacity(raw.len());
    for (name, entry) in raw {
        let species = Species::from_name(name)
            .ok_or_else(|| ConfigError::UnknownFaunaSpecies(name.clone()))?;
        let merged = match &entry.parent {
            Some(parent_name) => {
                let parent = raw.get(parent_name).ok_or_else(|| ConfigError::UnknownArchetype {
                    child: name.clone(),
                    parent: parent_name.clone(),
                })?;
                entry.merged_with_parent(parent)
            }
            None => entry.clone(),
        };
        resolved.insert(species, FaunaParams::from_raw(species, &merged)?);
    }
    Ok(resolved)
}

pub fn load_fauna_config(text: &str) -> Result<FaunaConfig, ConfigError> {
    let raw: RawFaunaConfig = serde_json::from_str(text).map_err(|source| ConfigError::Json {
        path: "<string>".to_string(),
        source,
    })?;
    resolve_fauna_config(&raw)
}

pub fn load_fauna_config_file(path: impl AsRef<Path>) -> Result<FaunaConfig, ConfigError> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })?;
    load_fauna_config(&text)
}

pub type DietConfig = HashMap<Species, Vec<Species>>;

/// Parse the predator-name → prey-name-list mapping into a species-keyed table.
pub fn load_diet_config(text: &str) -> Result<DietConfig, ConfigError> {
    let raw: HashMap<String, Vec<String>> =
        serde_json::from_str(text).map_err(|source| ConfigError::Json {
            path: "<string>".to_string(),
            source,
        })?;
    resolve_diet_config(&raw)
}

pub fn resolve_diet_config(raw: &HashMap<String, Vec<String>>) -> Result<DietConfig, ConfigError> {
    let mut resolved = HashMap::with_capacity(raw.len());
    for (predator_name, prey_names) in raw {
        let predator = Species::from_name(predator_name)
            .ok_or_else(|| ConfigError::UnknownDietSpecies(predator_name.clone()))?;
        let mut prey = Vec::with_capacity(prey_names.len());
        for prey_name in prey_names {
            prey.push(
                Species::from_name(prey_name)
                    .ok_or_else(|| ConfigError::UnknownDietSpecies(prey_name.clone()))?,
            );
        }
        resolved.insert(predator, prey);
    }
    Ok(resolved)
}

pub fn load_diet_config_file(path: impl AsRef<Path>) -> Result<DietConfig, ConfigError> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })?;
    load_diet_config(&text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn archetype_inheritance_merges_missing_fields() {
        let mut raw: RawFaunaConfig = HashMap::new();
        raw.insert(
            "smallfish".to_string(),
            RawFaunaEntry {
                size: Some(1.0),
                initial_energy: Some(10.0),
                metabolic_rate: Some(0.1),
                reproduction_threshold: Some(15.0),
                max_lifespan: Some(200),
                energy_conversion_factor: Some(0.5),
                carrying_capacity_threshold: Some(40),
                vision_radius: Some(8.0),
                predation_range: Some(1.5),
                hunt_success_chance: Some(0.6),
                satiation_period: Some(5),
                reproduction_cooldown_period: Some(10),
                max_energy_transfer_efficiency: Some(0.8),
                optimal_prey_size: Some(0.5),
                prey_size_tolerance: Some(0.3),
                ..Default::default()
            },
        );
        raw.insert(
            "juvenile_smallfish".to_string(),
            RawFaunaEntry {
                parent: Some("smallfish".to_string()),
                initial_energy: Some(5.0),
                ..Default::default()
            },
        );

        // juvenile_smallfish is not itself a species name, so resolve it manually
        // against the shared merge logic instead of through resolve_fauna_config.
        let parent = raw.get("smallfish").unwrap();
        let child = raw.get("juvenile_smallfish").unwrap();
        let merged = child.merged_with_parent(parent);
        assert_eq!(merged.initial_energy, Some(5.0));
        assert_eq!(merged.size, Some(1.0));
        assert_eq!(merged.vision_radius, Some(8.0));
    }

    #[test]
    fn unknown_parent_is_an_error() {
        let mut raw: RawFaunaConfig = HashMap::new();
        raw.insert(
            "zooplankton".to_string(),
            RawFaunaEntry {
                parent: Some("ghost".to_string()),
                ..Default::default()
            },
        );
        let err = resolve_fauna_config(&raw).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownArchetype { .. }));
    }

    #[test]
    fn diet_table_rejects_unknown_species() {
        let mut raw = HashMap::new();
        raw.insert("seal".to_string(), vec!["kraken".to_string()]);
        let err = resolve_diet_config(&raw).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownDietSpecies(_)));
    }
}
