//! Per-generation statistics

use std::fmt;

use serde::Serialize;

/// How the next generation was filled up to the target population size
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RefillKind {
    /// Enough offspring; no survivors carried over
    OnlyNew,
    /// All offspring plus a random subset of survivors
    NewAndSomeOld,
    /// Everyone carried over and the rest filled with clones
    Cloned,
    /// Nobody left to fill from
    Extinct,
}

impl fmt::Display for RefillKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            RefillKind::OnlyNew => "only new",
            RefillKind::NewAndSomeOld => "new and some old",
            RefillKind::Cloned => "cloned",
            RefillKind::Extinct => "extinct",
        };
        f.write_str(label)
    }
}

/// Outcome of selection and reproduction at the end of a generation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationReport {
    pub generation: u32,
    pub population_at_start: usize,
    pub survivors: usize,
    pub survival_rate: f32,
    pub offspring: usize,
    pub clones: usize,
    pub mutated: usize,
    pub refill: RefillKind,
    /// Size of the population entering the next generation
    pub next_population: usize,
}

impl fmt::Display for GenerationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "gen {}: {}/{} survived ({:.1}%), {} offspring, {} clones, {} mutated, refill {}",
            self.generation,
            self.survivors,
            self.population_at_start,
            self.survival_rate * 100.0,
            self.offspring,
            self.clones,
            self.mutated,
            self.refill
        )
    }
}
