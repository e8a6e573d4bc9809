//! Headless simulation runs
//!
//! This module runs evolution offline without any UI:
//! - Progress reporting per generation
//! - JSON-lines snapshot streaming
//! - JSON export of the final population and generation reports

mod report;
mod runner;

pub use report::{write_generation_reports, write_population, JsonLinesSink};
pub use runner::{HeadlessRunner, RunSummary};
