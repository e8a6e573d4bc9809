//! Gene encoding and brains for gridlife
//!
//! This crate implements:
//! - The 32-bit hex gene codec (decoding, random generation, crossover, point mutation)
//! - The fixed-topology brain expressed from a gene sequence

pub mod brain;
pub mod error;
pub mod gene;

pub use brain::{Brain, InputVector, OutputVector};
pub use error::GenomeError;
pub use gene::{
    Connection, Neuron, NeuronGroup, GENE_LENGTH_HEX, NUM_INNER_NEURONS, NUM_INPUT_NEURONS,
    NUM_OUTPUT_NEURONS, WEIGHT_SCALE,
};
