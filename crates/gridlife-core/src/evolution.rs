//! Generational evolution loop
//!
//! A [`Session`] owns the population, the occupancy index, a
//! generation/step cursor and the RNG. Callers drive it one step, one
//! generation or one window at a time and may stop between any two calls.
//!
//! Per generation:
//! 1. `lifespan` steps: every individual senses, then dies or moves
//! 2. Selection by liveness, safe boxes and death boxes
//! 3. Every pair of survivors attempts to mate
//! 4. Refill to `population_size` from offspring, survivors and clones
//! 5. Point mutation and random re-placement

use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256StarStar;
use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::individual::Individual;
use crate::sensors::{HeatMap, DEFAULT_HAZARD_THRESHOLD};
use crate::snapshot::{IndividualView, SnapshotSink, StepSnapshot};
use crate::stats::{GenerationReport, RefillKind};
use crate::types::{Coord, Region, WorldSize};
use crate::world::{random_coordinates, Occupancy};

/// Parameters of an evolution run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvolutionParams {
    pub population_size: usize,
    pub num_genes: usize,
    pub world_size: WorldSize,
    pub num_generations: u32,
    /// Steps per generation
    pub lifespan: u32,
    /// Per-digit mutation probability; `None` skips the mutation pass
    pub mute_probability: Option<f32>,
    /// Per-pair mating probability; `None` disables mating
    pub mate_probability: Option<f32>,
    /// Individuals ending a generation inside any of these do not survive
    pub death_boxes: Option<Vec<Region>>,
    /// If non-empty, only individuals ending inside one of these survive
    pub safe_boxes: Option<Vec<Region>>,
    pub heat_sources: Vec<Coord>,
    pub hazard_threshold: f32,
}

impl Default for EvolutionParams {
    fn default() -> Self {
        Self {
            population_size: 80,
            num_genes: 6,
            world_size: WorldSize::new(150, 150),
            num_generations: 100,
            lifespan: 60,
            mute_probability: Some(0.0001),
            mate_probability: Some(0.5),
            death_boxes: None,
            safe_boxes: None,
            heat_sources: Vec::new(),
            hazard_threshold: DEFAULT_HAZARD_THRESHOLD,
        }
    }
}

impl EvolutionParams {
    /// Check ranges and that the population fits the grid
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.lifespan == 0 {
            return Err(EngineError::InvalidParameter {
                name: "lifespan",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.world_size.height == 0 || self.world_size.width == 0 {
            return Err(EngineError::InvalidParameter {
                name: "world_size",
                reason: format!(
                    "{}x{} has no cells",
                    self.world_size.height, self.world_size.width
                ),
            });
        }
        check_probability("mute_probability", self.mute_probability)?;
        check_probability("mate_probability", self.mate_probability)?;
        if self.hazard_threshold.is_nan() {
            return Err(EngineError::InvalidParameter {
                name: "hazard_threshold",
                reason: "must be a number".to_string(),
            });
        }

        let capacity = self.world_size.cell_count();
        if self.population_size > capacity {
            return Err(EngineError::PopulationTooLarge {
                requested: self.population_size,
                capacity,
            });
        }
        Ok(())
    }

    pub fn heat_map(&self) -> HeatMap {
        HeatMap::new(self.heat_sources.clone(), self.hazard_threshold)
    }
}

fn check_probability(name: &'static str, value: Option<f32>) -> Result<(), EngineError> {
    match value {
        Some(p) if !(0.0..=1.0).contains(&p) => Err(EngineError::InvalidParameter {
            name,
            reason: format!("{p} is not a probability in [0, 1]"),
        }),
        _ => Ok(()),
    }
}

/// Position of a session: the next step to run in the current generation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Cursor {
    pub generation: u32,
    pub step: u32,
}

/// Range of generations and steps to simulate; end bounds are exclusive
///
/// `start_step` applies to the first generation of the window, `end_step`
/// to the last one. Generations in between run all their steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunWindow {
    pub start_generation: u32,
    pub end_generation: u32,
    pub start_step: u32,
    pub end_step: u32,
}

impl RunWindow {
    /// Every step of every generation
    pub fn full(params: &EvolutionParams) -> Self {
        Self {
            start_generation: 0,
            end_generation: params.num_generations,
            start_step: 0,
            end_step: params.lifespan,
        }
    }

    /// Exactly one step
    pub fn single_step(generation: u32, step: u32) -> Self {
        Self {
            start_generation: generation,
            end_generation: generation + 1,
            start_step: step,
            end_step: step + 1,
        }
    }
}

/// Create `population_size` individuals with random genes on distinct random cells
///
/// Ids are `individual_{i}`. Fails before creating anything if the
/// population does not fit the grid.
pub fn create_population<R: Rng + ?Sized>(
    population_size: usize,
    lifespan: u32,
    world_size: WorldSize,
    num_genes: Option<usize>,
    rng: &mut R,
) -> Result<(Vec<Individual>, Vec<Coord>), EngineError> {
    let coordinates = random_coordinates(population_size, world_size, rng)?;
    let population = coordinates
        .iter()
        .enumerate()
        .map(|(i, &coords)| {
            let mut individual =
                Individual::new(format!("individual_{i}"), lifespan, world_size, num_genes, rng);
            individual.set_coords(Some(coords));
            individual
        })
        .collect();

    Ok((population, coordinates))
}

/// Run a window of the simulation and hand back the resulting population
///
/// Without a population a fresh one is created. A supplied population keeps
/// its coordinates if they are a valid placement and is re-placed otherwise.
pub fn evolve<R: Rng, S: SnapshotSink + ?Sized>(
    params: EvolutionParams,
    window: RunWindow,
    population: Option<Vec<Individual>>,
    rng: R,
    sink: &mut S,
) -> Result<(Vec<Individual>, Vec<Coord>), EngineError> {
    let mut session = match population {
        Some(population) => {
            let cursor = Cursor {
                generation: window.start_generation,
                step: window.start_step,
            };
            Session::resume(params, population, cursor, rng)?
        }
        None => Session::new(params, rng)?,
    };

    session.run_window(window, sink)?;
    Ok(session.into_population())
}

/// True if the individual survives selection
///
/// `None` and empty box lists both mean "no filter".
pub fn survives(
    individual: &Individual,
    safe_boxes: Option<&[Region]>,
    death_boxes: Option<&[Region]>,
) -> bool {
    let Some(coords) = individual.coords() else {
        return false;
    };

    individual.is_alive()
        && safe_boxes.map_or(true, |boxes| {
            boxes.is_empty() || boxes.iter().any(|b| b.contains(coords))
        })
        && death_boxes.map_or(true, |boxes| !boxes.iter().any(|b| b.contains(coords)))
}

/// Fill the next generation up to `target` individuals
///
/// Returns the new population, how it was filled and how many clones it
/// contains.
fn refill<R: Rng + ?Sized>(
    mut offspring: Vec<Individual>,
    mut survivors: Vec<Individual>,
    target: usize,
    generation: u32,
    rng: &mut R,
) -> (Vec<Individual>, RefillKind, usize) {
    offspring.shuffle(rng);

    if offspring.len() >= target {
        offspring.truncate(target);
        return (offspring, RefillKind::OnlyNew, 0);
    }

    survivors.shuffle(rng);

    if offspring.len() + survivors.len() >= target {
        survivors.truncate(target - offspring.len());
        offspring.append(&mut survivors);
        return (offspring, RefillKind::NewAndSomeOld, 0);
    }

    let left = target - offspring.len() - survivors.len();
    let (from_offspring, from_survivors) = match (offspring.len(), survivors.len()) {
        (0, 0) => return (Vec::new(), RefillKind::Extinct, 0),
        (0, _) => (0, left),
        (_, 0) => (left, 0),
        _ => (left.div_ceil(2), left / 2),
    };

    let mut clones = Vec::with_capacity(left);
    for k in 0..from_offspring {
        let source = &offspring[k % offspring.len()];
        clones.push(source.clone_as(format!("individual_gen{generation}_clone{}", clones.len())));
    }
    for k in 0..from_survivors {
        let source = &survivors[k % survivors.len()];
        clones.push(source.clone_as(format!("individual_gen{generation}_clone{}", clones.len())));
    }

    let clone_count = clones.len();
    offspring.append(&mut survivors);
    offspring.append(&mut clones);
    (offspring, RefillKind::Cloned, clone_count)
}

/// Assign distinct random cells to every individual
fn place<R: Rng + ?Sized>(
    population: &mut [Individual],
    world_size: WorldSize,
    rng: &mut R,
) -> Result<(), EngineError> {
    let coordinates = random_coordinates(population.len(), world_size, rng)?;
    for (individual, coords) in population.iter_mut().zip(coordinates) {
        individual.set_coords(Some(coords));
    }
    Ok(())
}

/// True if every individual sits on its own in-bounds cell
fn placement_is_valid(population: &[Individual], world_size: WorldSize) -> bool {
    let mut seen = Occupancy::new();
    population.iter().all(|individual| {
        individual
            .coords()
            .is_some_and(|coords| world_size.contains(coords) && seen.insert(coords))
    })
}

/// Caller-owned evolution state with step-granular control
pub struct Session<R = Xoshiro256StarStar> {
    params: EvolutionParams,
    heat: HeatMap,
    population: Vec<Individual>,
    occupancy: Occupancy,
    cursor: Cursor,
    population_at_start: usize,
    history: Vec<GenerationReport>,
    rng: R,
}

impl Session<Xoshiro256StarStar> {
    /// Fresh session with a seeded `Xoshiro256StarStar`
    pub fn seeded(params: EvolutionParams, seed: u64) -> Result<Self, EngineError> {
        Self::new(params, Xoshiro256StarStar::seed_from_u64(seed))
    }
}

impl<R: Rng> Session<R> {
    /// Validate the parameters and create a random initial population
    pub fn new(params: EvolutionParams, mut rng: R) -> Result<Self, EngineError> {
        params.validate()?;
        let (population, _) = create_population(
            params.population_size,
            params.lifespan,
            params.world_size,
            Some(params.num_genes),
            &mut rng,
        )?;

        log::info!(
            "Created population of {} on a {}x{} grid",
            population.len(),
            params.world_size.height,
            params.world_size.width
        );

        Ok(Self::assemble(params, population, Cursor::default(), rng))
    }

    /// Continue from an existing population at the given cursor
    ///
    /// Dead individuals are dropped. Every individual adopts the session's
    /// lifespan and world size. The population is re-placed unless it
    /// already occupies distinct in-bounds cells.
    pub fn resume(
        params: EvolutionParams,
        mut population: Vec<Individual>,
        cursor: Cursor,
        mut rng: R,
    ) -> Result<Self, EngineError> {
        params.validate()?;
        if cursor.step > params.lifespan {
            return Err(EngineError::InvalidParameter {
                name: "cursor.step",
                reason: format!("{} is past the lifespan {}", cursor.step, params.lifespan),
            });
        }

        let capacity = params.world_size.cell_count();
        if population.len() > capacity {
            return Err(EngineError::PopulationTooLarge {
                requested: population.len(),
                capacity,
            });
        }

        population.retain(Individual::is_alive);
        for individual in &mut population {
            individual.set_environment(params.lifespan, params.world_size);
        }
        if !placement_is_valid(&population, params.world_size) {
            log::debug!("Re-placing {} resumed individuals", population.len());
            place(&mut population, params.world_size, &mut rng)?;
        }

        Ok(Self::assemble(params, population, cursor, rng))
    }

    fn assemble(
        params: EvolutionParams,
        population: Vec<Individual>,
        cursor: Cursor,
        rng: R,
    ) -> Self {
        let occupancy = population.iter().filter_map(Individual::coords).collect();
        let heat = params.heat_map();
        if !heat.sources().is_empty() {
            log::debug!(
                "{} heat sources, lethal above risk {}",
                heat.sources().len(),
                heat.threshold()
            );
        }
        Self {
            heat,
            params,
            population_at_start: population.len(),
            population,
            occupancy,
            cursor,
            history: Vec::new(),
            rng,
        }
    }

    pub fn params(&self) -> &EvolutionParams {
        &self.params
    }

    pub fn population(&self) -> &[Individual] {
        &self.population
    }

    /// Coordinates of the current population, in population order
    pub fn coordinates(&self) -> Vec<Coord> {
        self.population
            .iter()
            .filter_map(Individual::coords)
            .collect()
    }

    pub fn views(&self) -> Vec<IndividualView> {
        self.population.iter().map(Individual::view).collect()
    }

    pub fn occupancy(&self) -> &Occupancy {
        &self.occupancy
    }

    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    pub fn is_extinct(&self) -> bool {
        self.population.is_empty()
    }

    /// True once all generations ran or the population died out
    pub fn is_finished(&self) -> bool {
        self.cursor.generation >= self.params.num_generations || self.is_extinct()
    }

    /// Reports of every generation finished by this session
    pub fn history(&self) -> &[GenerationReport] {
        &self.history
    }

    pub fn into_population(self) -> (Vec<Individual>, Vec<Coord>) {
        let coordinates = self.coordinates();
        (self.population, coordinates)
    }

    /// Run one step of the current generation
    ///
    /// Individuals are processed in population order and see the moves and
    /// deaths of those before them. Returns `None` without doing anything
    /// when the generation's steps are used up or the run is finished.
    pub fn step<S: SnapshotSink + ?Sized>(
        &mut self,
        sink: &mut S,
    ) -> Result<Option<StepSnapshot>, EngineError> {
        if self.is_finished() || self.cursor.step >= self.params.lifespan {
            return Ok(None);
        }

        let mut deaths = 0;
        for individual in &mut self.population {
            if individual.sense_env(&self.occupancy, &self.heat, &mut self.rng)? {
                individual.take_step(&mut self.occupancy)?;
            } else {
                if let Some(coords) = individual.coords() {
                    self.occupancy.remove(coords);
                }
                deaths += 1;
            }
        }
        if deaths > 0 {
            self.population.retain(Individual::is_alive);
        }

        let snapshot = StepSnapshot {
            generation: self.cursor.generation,
            step: self.cursor.step,
            coordinates: self.coordinates(),
        };
        log::debug!(
            "gen {} step {}: {} alive, {} died",
            snapshot.generation,
            snapshot.step,
            self.population.len(),
            deaths
        );

        self.cursor.step += 1;
        sink.record_step(&snapshot);
        Ok(Some(snapshot))
    }

    /// Select, reproduce, refill, mutate and re-place
    ///
    /// Can be called before the generation's steps are used up; the
    /// remaining steps are skipped. Returns `None` once all generations ran.
    pub fn finish_generation<S: SnapshotSink + ?Sized>(
        &mut self,
        sink: &mut S,
    ) -> Result<Option<GenerationReport>, EngineError> {
        if self.cursor.generation >= self.params.num_generations {
            return Ok(None);
        }
        let generation = self.cursor.generation;
        let population_at_start = self.population_at_start;

        let population = std::mem::take(&mut self.population);
        let survivors: Vec<Individual> = population
            .into_iter()
            .filter(|individual| {
                survives(
                    individual,
                    self.params.safe_boxes.as_deref(),
                    self.params.death_boxes.as_deref(),
                )
            })
            .collect();
        let survival_rate = if population_at_start == 0 {
            0.0
        } else {
            survivors.len() as f32 / population_at_start as f32
        };

        let offspring = self.reproduce(&survivors, generation)?;
        let survivor_count = survivors.len();
        let offspring_count = offspring.len();

        let (mut next, refill_kind, clones) = refill(
            offspring,
            survivors,
            self.params.population_size,
            generation,
            &mut self.rng,
        );

        let mut mutated = 0;
        if let Some(probability) = self.params.mute_probability {
            for individual in &mut next {
                if individual.mute(probability, &mut self.rng)? {
                    mutated += 1;
                }
            }
        }

        for individual in &mut next {
            individual.reset_for_generation();
        }
        place(&mut next, self.params.world_size, &mut self.rng)?;

        self.occupancy = next.iter().filter_map(Individual::coords).collect();
        self.population = next;
        self.population_at_start = self.population.len();
        self.cursor = Cursor {
            generation: generation + 1,
            step: 0,
        };

        let report = GenerationReport {
            generation,
            population_at_start,
            survivors: survivor_count,
            survival_rate,
            offspring: offspring_count,
            clones,
            mutated,
            refill: refill_kind,
            next_population: self.population.len(),
        };
        if refill_kind == RefillKind::Extinct {
            log::warn!("Population went extinct in generation {generation}");
        } else {
            log::info!("{report}");
        }

        sink.record_generation(&report);
        self.history.push(report.clone());
        Ok(Some(report))
    }

    /// Every unordered pair of survivors attempts to mate, in order
    fn reproduce(
        &mut self,
        survivors: &[Individual],
        generation: u32,
    ) -> Result<Vec<Individual>, EngineError> {
        let Some(probability) = self.params.mate_probability else {
            return Ok(Vec::new());
        };

        let mut offspring = Vec::new();
        let mut pair = 0usize;
        for (i, parent1) in survivors.iter().enumerate() {
            for parent2 in &survivors[i + 1..] {
                let child_ids = (
                    format!("individual_gen{generation}_{pair}_1"),
                    format!("individual_gen{generation}_{pair}_2"),
                );
                if let Some((child1, child2)) =
                    parent1.mate(parent2, probability, child_ids, &mut self.rng)?
                {
                    offspring.push(child1);
                    offspring.push(child2);
                }
                pair += 1;
            }
        }

        log::debug!(
            "gen {generation}: {pair} pairs produced {} offspring",
            offspring.len()
        );
        Ok(offspring)
    }

    /// Run the remaining steps of the current generation and finish it
    pub fn run_generation<S: SnapshotSink + ?Sized>(
        &mut self,
        sink: &mut S,
    ) -> Result<Option<GenerationReport>, EngineError> {
        if self.cursor.generation >= self.params.num_generations {
            return Ok(None);
        }
        while self.step(sink)?.is_some() {}
        self.finish_generation(sink)
    }

    /// Run until all generations are done or the population dies out
    pub fn run<S: SnapshotSink + ?Sized>(&mut self, sink: &mut S) -> Result<(), EngineError> {
        while !self.is_finished() {
            self.run_generation(sink)?;
        }
        Ok(())
    }

    /// Run the steps covered by `window`, moving the cursor to its start first
    ///
    /// A generation is finished only when its steps reach the lifespan (or
    /// everyone died); otherwise the session pauses mid-generation.
    pub fn run_window<S: SnapshotSink + ?Sized>(
        &mut self,
        window: RunWindow,
        sink: &mut S,
    ) -> Result<(), EngineError> {
        let end_generation = window.end_generation.min(self.params.num_generations);
        if window.start_generation >= end_generation {
            return Ok(());
        }

        let lifespan = self.params.lifespan;
        self.cursor = Cursor {
            generation: window.start_generation,
            step: window.start_step.min(lifespan),
        };

        for generation in window.start_generation..end_generation {
            if self.is_extinct() {
                break;
            }

            let end_step = if generation + 1 == end_generation {
                window.end_step.min(lifespan)
            } else {
                lifespan
            };
            while self.cursor.step < end_step {
                if self.step(sink)?.is_none() {
                    break;
                }
            }

            if self.cursor.step < lifespan && !self.is_extinct() {
                break;
            }
            self.finish_generation(sink)?;
        }
        Ok(())
    }
}
