//! Simulation configuration with layered loading
//!
//! Configuration is loaded from multiple sources (lowest to highest priority):
//! 1. Compiled defaults
//! 2. `gridlife.ron` file (if exists) or an explicitly given RON file
//! 3. Environment variables prefixed with `GRIDLIFE_`
//!
//! Example environment variable: `GRIDLIFE_POPULATION__SIZE=120`

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use config::{Config, Environment, File, FileFormat};
use gridlife_core::{Coord, EvolutionParams, Region, WorldSize, DEFAULT_HAZARD_THRESHOLD};
use serde::{Deserialize, Serialize};

/// Main simulation configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SimulationConfig {
    #[serde(default)]
    pub world: WorldConfig,

    #[serde(default)]
    pub population: PopulationConfig,

    #[serde(default)]
    pub evolution: EvolutionConfig,

    #[serde(default)]
    pub hazards: HazardConfig,

    #[serde(default)]
    pub regions: RegionConfig,

    #[serde(default)]
    pub output: OutputConfig,

    #[serde(default)]
    pub debug: DebugConfig,
}

/// Grid dimensions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorldConfig {
    pub height: u32,
    pub width: u32,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            height: 150,
            width: 150,
        }
    }
}

/// Population shape
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PopulationConfig {
    /// Individuals per generation
    pub size: usize,
    /// Genes per brain
    pub num_genes: usize,
    /// Steps per generation
    pub lifespan: u32,
}

impl Default for PopulationConfig {
    fn default() -> Self {
        Self {
            size: 80,
            num_genes: 6,
            lifespan: 60,
        }
    }
}

/// Generational settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvolutionConfig {
    pub generations: u32,
    /// Per hex digit; 0 disables mutation
    pub mute_probability: f32,
    /// Per survivor pair; 0 disables mating
    pub mate_probability: f32,
    /// RNG seed; drawn from entropy when absent
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Default for EvolutionConfig {
    fn default() -> Self {
        Self {
            generations: 100,
            mute_probability: 0.0001,
            mate_probability: 0.5,
            seed: None,
        }
    }
}

/// Heat sources and the tolerated risk
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HazardConfig {
    #[serde(default)]
    pub heat_sources: Vec<Coord>,
    pub threshold: f32,
}

impl Default for HazardConfig {
    fn default() -> Self {
        Self {
            heat_sources: Vec::new(),
            threshold: DEFAULT_HAZARD_THRESHOLD,
        }
    }
}

/// Selection regions; empty lists disable the filter
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RegionConfig {
    #[serde(default)]
    pub safe_boxes: Vec<Region>,
    #[serde(default)]
    pub death_boxes: Vec<Region>,
}

/// Where results are written
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub directory: PathBuf,
    /// Write every step snapshot as a JSON line
    pub write_snapshots: bool,
    pub snapshot_file: String,
    pub population_file: String,
    pub generations_file: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("gridlife_output"),
            write_snapshots: false,
            snapshot_file: "snapshots.jsonl".to_string(),
            population_file: "population.json".to_string(),
            generations_file: "generations.json".to_string(),
        }
    }
}

/// Debug/development settings
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DebugConfig {
    /// Enable verbose logging
    pub verbose_logging: bool,
}

impl SimulationConfig {
    /// Load configuration with layered priority:
    /// 1. Compiled defaults (lowest priority)
    /// 2. `path` if given (must exist), otherwise `gridlife.ron` (if exists)
    /// 3. Environment variables prefixed with `GRIDLIFE_` (highest priority)
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let file = match path {
            Some(path) => File::from(path).format(FileFormat::Ron).required(true),
            None => File::with_name("gridlife")
                .format(FileFormat::Ron)
                .required(false),
        };

        let builder = Config::builder()
            // Layer 1: Compiled defaults
            .set_default("world.height", 150_i64)?
            .set_default("world.width", 150_i64)?
            .set_default("population.size", 80_i64)?
            .set_default("population.num_genes", 6_i64)?
            .set_default("population.lifespan", 60_i64)?
            .set_default("evolution.generations", 100_i64)?
            .set_default("evolution.mute_probability", 0.0001)?
            .set_default("evolution.mate_probability", 0.5)?
            .set_default("hazards.threshold", f64::from(DEFAULT_HAZARD_THRESHOLD))?
            .set_default("output.directory", "gridlife_output")?
            .set_default("output.write_snapshots", false)?
            .set_default("output.snapshot_file", "snapshots.jsonl")?
            .set_default("output.population_file", "population.json")?
            .set_default("output.generations_file", "generations.json")?
            .set_default("debug.verbose_logging", false)?
            // Layer 2: Config file
            .add_source(file)
            // Layer 3: Environment variables (GRIDLIFE_POPULATION__SIZE, etc.)
            .add_source(Environment::with_prefix("GRIDLIFE").separator("__"));

        let config = builder.build().context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }

    /// Engine parameters described by this configuration
    pub fn to_params(&self) -> EvolutionParams {
        let boxes = |regions: &[Region]| (!regions.is_empty()).then(|| regions.to_vec());

        EvolutionParams {
            population_size: self.population.size,
            num_genes: self.population.num_genes,
            world_size: WorldSize::new(self.world.height, self.world.width),
            num_generations: self.evolution.generations,
            lifespan: self.population.lifespan,
            mute_probability: Some(self.evolution.mute_probability),
            mate_probability: Some(self.evolution.mate_probability),
            death_boxes: boxes(&self.regions.death_boxes),
            safe_boxes: boxes(&self.regions.safe_boxes),
            heat_sources: self.hazards.heat_sources.clone(),
            hazard_threshold: self.hazards.threshold,
        }
    }
}
