use crate::config::ConfigError;
use crate::species::Species;
use std::{error::Error, fmt};

/// Errors that can abort engine construction. All are fatal and carry the
/// offending key or value so a caller can fix their configuration.
#[derive(Debug)]
pub enum EngineInitError {
    Config(ConfigError),
    ZeroSizedGrid,
    InitialCapacityExceedsMax {
        initial: usize,
        max: usize,
    },
    TooManyInitialAgents {
        requested: usize,
        capacity: usize,
    },
    MissingFaunaEntry(Species),
    DietReferencesNonPredator(Species),
}

impl fmt::Display for EngineInitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineInitError::Config(e) => write!(f, "{e}"),
            EngineInitError::ZeroSizedGrid => {
                write!(f, "grid_width, grid_height, and grid_depth must all be positive")
            }
            EngineInitError::InitialCapacityExceedsMax { initial, max } => write!(
                f,
                "initial_agent_capacity ({initial}) exceeds absolute_max_agents ({max})"
            ),
            EngineInitError::TooManyInitialAgents { requested, capacity } => write!(
                f,
                "requested initial agent count ({requested}) exceeds initial_agent_capacity ({capacity})"
            ),
            EngineInitError::MissingFaunaEntry(species) => {
                write!(f, "no fauna archetype configured for species {species}")
            }
            EngineInitError::DietReferencesNonPredator(species) => write!(
                f,
                "diet table lists {species} as a predator, but it has no predator parameters"
            ),
        }
    }
}

impl From<ConfigError> for EngineInitError {
    fn from(err: ConfigError) -> Self {
        EngineInitError::Config(err)
    }
}

impl Error for EngineInitError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            EngineInitError::Config(e) => Some(e),
            _ => None,
        }
    }
}
