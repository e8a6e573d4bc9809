use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use gridlife::headless::HeadlessRunner;
use gridlife::SimulationConfig;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file (RON); `gridlife.ron` is used when present
    #[arg(long)]
    config: Option<PathBuf>,

    /// Number of generations to run
    #[arg(long)]
    generations: Option<u32>,

    /// Population size per generation
    #[arg(long)]
    population: Option<usize>,

    /// Steps per generation
    #[arg(long)]
    lifespan: Option<u32>,

    /// RNG seed for a reproducible run
    #[arg(long)]
    seed: Option<u64>,

    /// Write every step snapshot as JSON lines
    #[arg(long)]
    snapshots: bool,

    /// Output directory
    #[arg(long)]
    output: Option<PathBuf>,

    /// Print the effective configuration as RON and exit
    #[arg(long)]
    print_config: bool,
}

impl Args {
    /// Command-line flags override the loaded configuration
    fn apply(&self, config: &mut SimulationConfig) {
        if let Some(generations) = self.generations {
            config.evolution.generations = generations;
        }
        if let Some(population) = self.population {
            config.population.size = population;
        }
        if let Some(lifespan) = self.lifespan {
            config.population.lifespan = lifespan;
        }
        if let Some(seed) = self.seed {
            config.evolution.seed = Some(seed);
        }
        if self.snapshots {
            config.output.write_snapshots = true;
        }
        if let Some(output) = &self.output {
            config.output.directory = output.clone();
        }
    }
}

fn main() -> anyhow::Result<()> {
    // Parse command-line arguments
    let args = Args::parse();

    let mut config = SimulationConfig::load(args.config.as_deref())?;
    args.apply(&mut config);

    let default_filter = if config.debug.verbose_logging {
        "debug"
    } else {
        "info"
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    if args.print_config {
        let text = ron::ser::to_string_pretty(&config, ron::ser::PrettyConfig::default())
            .context("Failed to serialize configuration")?;
        println!("{text}");
        return Ok(());
    }

    log::info!("Starting gridlife");
    log::info!("  Generations: {}", config.evolution.generations);
    log::info!("  Population: {}", config.population.size);
    log::info!(
        "  World: {}x{}",
        config.world.height,
        config.world.width
    );
    log::info!("  Output: {}", config.output.directory.display());

    let mut runner = HeadlessRunner::new(config)?;
    let summary = runner.run()?;

    if summary.extinct {
        log::warn!(
            "Run ended early: population extinct after {} generations (seed {})",
            summary.generations_run,
            summary.seed
        );
    } else {
        log::info!(
            "Finished {} generations with {} individuals (seed {})",
            summary.generations_run,
            summary.final_population,
            summary.seed
        );
    }
    Ok(())
}
