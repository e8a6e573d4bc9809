//! Headless evolution runner
//!
//! Drives a session generation by generation with a progress bar and
//! writes the results to the configured output directory.

use anyhow::{Context, Result};
use gridlife_core::{GenerationReport, NoopSink, Session, SnapshotSink};
use indicatif::{ProgressBar, ProgressStyle};

use crate::config::SimulationConfig;

use super::report::{write_generation_reports, write_population, JsonLinesSink};

/// Outcome of a finished run
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub seed: u64,
    pub generations_run: usize,
    pub final_population: usize,
    pub extinct: bool,
    pub snapshots_written: usize,
}

/// Runs a whole simulation without any UI
pub struct HeadlessRunner {
    /// Run configuration
    pub config: SimulationConfig,
    /// Seed the session RNG was created from
    seed: u64,
    session: Session,
}

impl HeadlessRunner {
    /// Validate the configuration and create the initial population
    pub fn new(config: SimulationConfig) -> Result<Self> {
        let seed = config.evolution.seed.unwrap_or_else(rand::random);
        log::info!("Using seed {}", seed);

        let session = Session::seeded(config.to_params(), seed)
            .context("Failed to set up the simulation")?;

        Ok(Self {
            config,
            seed,
            session,
        })
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Reports of all finished generations
    pub fn stats_history(&self) -> &[GenerationReport] {
        self.session.history()
    }

    /// Create a progress bar style
    fn progress_style() -> ProgressStyle {
        ProgressStyle::default_bar()
            .template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▓░")
    }

    /// Run every generation and write the outputs
    pub fn run(&mut self) -> Result<RunSummary> {
        let output = &self.config.output;
        std::fs::create_dir_all(&output.directory)
            .context("Failed to create output directory")?;

        let mut snapshots = if output.write_snapshots {
            Some(JsonLinesSink::create(
                &output.directory.join(&output.snapshot_file),
            )?)
        } else {
            None
        };

        let generations = self.config.evolution.generations;
        let pb = ProgressBar::new(u64::from(generations));
        pb.set_style(Self::progress_style());
        pb.enable_steady_tick(std::time::Duration::from_millis(100));

        pb.println(format!(
            "Starting evolution: {} generations, {} individuals, {}x{} world",
            generations,
            self.config.population.size,
            self.config.world.height,
            self.config.world.width
        ));

        {
            let mut noop = NoopSink;
            let sink: &mut dyn SnapshotSink = match snapshots.as_mut() {
                Some(writer) => writer,
                None => &mut noop,
            };

            while !self.session.is_finished() {
                if let Some(report) = self.session.run_generation(sink)? {
                    pb.println(report.to_string());
                    pb.set_message(format!("{} alive", report.next_population));
                    pb.inc(1);
                }
            }
        }

        let extinct = self.session.is_extinct();
        if extinct {
            pb.println(format!(
                "Population went extinct after {} generations",
                self.session.history().len()
            ));
        }

        let snapshots_written = match snapshots {
            Some(sink) => {
                let written = sink.written();
                sink.finish()?;
                written
            }
            None => 0,
        };

        write_population(
            &output.directory.join(&output.population_file),
            &self.session.views(),
        )?;
        write_generation_reports(
            &output.directory.join(&output.generations_file),
            self.session.history(),
        )?;

        pb.finish_with_message("Evolution complete!");

        Ok(RunSummary {
            seed: self.seed,
            generations_run: self.session.history().len(),
            final_population: self.session.population().len(),
            extinct,
            snapshots_written,
        })
    }
}
