//! Biome identity and the time-invariant modifier table derived from it.

/// One of the four lattice-cell biomes, time-invariant after construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Biome {
    OpenOcean = 0,
    DeepSea = 1,
    PolarSea = 2,
    CoralReef = 3,
}

impl Biome {
    pub fn from_id(id: u8) -> Biome {
        match id {
            0 => Biome::OpenOcean,
            1 => Biome::DeepSea,
            2 => Biome::PolarSea,
            3 => Biome::CoralReef,
            other => panic!("invalid biome id {other}"),
        }
    }

    pub fn as_id(self) -> u8 {
        self as u8
    }

    pub fn properties(self) -> BiomeProperties {
        match self {
            Biome::OpenOcean => BiomeProperties {
                nutrient_factor: 1.0,
                vision_modifier: 1.0,
                metabolic_modifier: 1.0,
            },
            Biome::DeepSea => BiomeProperties {
                nutrient_factor: 0.3,
                vision_modifier: 0.5,
                metabolic_modifier: 0.8,
            },
            Biome::PolarSea => BiomeProperties {
                nutrient_factor: 0.7,
                vision_modifier: 1.2,
                metabolic_modifier: 0.7,
            },
            Biome::CoralReef => BiomeProperties {
                nutrient_factor: 1.5,
                vision_modifier: 0.8,
                metabolic_modifier: 1.2,
            },
        }
    }
}

/// Per-biome read-only coefficients. Every environment modifier map is
/// derived from this table by indexing `biome_id`, uniformly across revisions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BiomeProperties {
    pub nutrient_factor: f64,
    pub vision_modifier: f64,
    pub metabolic_modifier: f64,
}
