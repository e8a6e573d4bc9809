//! Outbound observation types and the sink they are delivered to

use serde::Serialize;

use crate::stats::GenerationReport;
use crate::types::Coord;

/// World state after one simulation step
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepSnapshot {
    pub generation: u32,
    pub step: u32,
    /// Coordinates of all individuals alive after the step, in population order
    pub coordinates: Vec<Coord>,
}

/// Read-only view of an individual for rendering or export
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndividualView {
    pub id: String,
    pub coords: Option<Coord>,
    /// Raw hex gene sequence
    pub color: String,
}

/// Receiver for per-step snapshots and per-generation reports
///
/// Implementations must not fail; sinks that do I/O keep their own error
/// state.
pub trait SnapshotSink {
    fn record_step(&mut self, snapshot: &StepSnapshot);

    fn record_generation(&mut self, _report: &GenerationReport) {}
}

/// Sink that discards everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSink;

impl SnapshotSink for NoopSink {
    fn record_step(&mut self, _snapshot: &StepSnapshot) {}
}

impl SnapshotSink for Vec<StepSnapshot> {
    fn record_step(&mut self, snapshot: &StepSnapshot) {
        self.push(snapshot.clone());
    }
}

/// Collects both steps and generation reports
#[derive(Debug, Default, Clone)]
pub struct RecordingSink {
    pub steps: Vec<StepSnapshot>,
    pub generations: Vec<GenerationReport>,
}

impl SnapshotSink for RecordingSink {
    fn record_step(&mut self, snapshot: &StepSnapshot) {
        self.steps.push(snapshot.clone());
    }

    fn record_generation(&mut self, report: &GenerationReport) {
        self.generations.push(report.clone());
    }
}
