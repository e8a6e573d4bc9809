//! # gridlife - evolving neural individuals on a grid
//!
//! Individuals carry hex-encoded genes that wire a small fixed-topology
//! brain. Each generation they sense and move on a 2D grid; survivors of
//! the selection rules mate, mutate and repopulate the world.
//!
//! The engine lives in `gridlife-genome` and `gridlife-core`; this crate adds
//! layered configuration and the headless runner behind the binary.

pub mod config;
pub mod headless;

pub use config::SimulationConfig;
pub use gridlife_core::{EvolutionParams, Session};
