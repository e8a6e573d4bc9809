//! Grid world and generational evolution for gridlife
//!
//! This crate implements:
//! - Individuals that sense their surroundings and move on a grid
//! - Hazard sensing from heat sources
//! - The evolution session: stepping, selection, mating, refill and mutation

pub mod error;
pub mod evolution;
pub mod individual;
pub mod rng;
pub mod sensors;
pub mod snapshot;
pub mod stats;
pub mod types;
pub mod world;

pub use error::EngineError;
pub use evolution::{
    create_population, evolve, survives, Cursor, EvolutionParams, RunWindow, Session,
};
pub use individual::{Individual, DEFAULT_NUM_GENES, KILL_THRESHOLD, MOVE_DEAD_ZONE};
pub use rng::SimRng;
pub use sensors::{HeatMap, DEFAULT_HAZARD_THRESHOLD};
pub use snapshot::{IndividualView, NoopSink, RecordingSink, SnapshotSink, StepSnapshot};
pub use stats::{GenerationReport, RefillKind};
pub use types::{Coord, Region, WorldSize};
pub use world::Occupancy;
