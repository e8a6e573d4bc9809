//! Error types for the evolution engine

use gridlife_genome::GenomeError;
use thiserror::Error;

/// Errors raised by population setup and the evolution loop
///
/// Hazard deaths, rejected moves and failed matings are ordinary state
/// changes and never show up here.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    /// Gene sequence could not be decoded
    #[error(transparent)]
    Genome(#[from] GenomeError),

    /// More individuals requested than the grid has cells
    #[error("population size {requested} exceeds the {capacity} cells of the world")]
    PopulationTooLarge { requested: usize, capacity: usize },

    /// Parameter outside its allowed range
    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    /// Individual was asked to sense before being placed on the grid
    #[error("individual {id} has no coordinates")]
    Unplaced { id: String },

    /// Individual was asked to step without a sensed input vector
    #[error("individual {id} has no sensed input to act on")]
    NotSensed { id: String },
}
