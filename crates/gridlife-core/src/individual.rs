//! A single grid-dwelling individual driven by its brain

use gridlife_genome::{gene, Brain, GenomeError, InputVector, OutputVector};
use rand::Rng;

use crate::error::EngineError;
use crate::rng::SimRng;
use crate::sensors::{build_input_vector, HeatMap};
use crate::snapshot::IndividualView;
use crate::types::{Coord, WorldSize};
use crate::world::Occupancy;

/// Gene count for individuals created without an explicit one
pub const DEFAULT_NUM_GENES: usize = 30;

/// Outputs within `[-MOVE_DEAD_ZONE, MOVE_DEAD_ZONE]` mean "stay" on that axis
pub const MOVE_DEAD_ZONE: f32 = 0.0;

/// Kill output above this is reported as intent; killing is not enacted
pub const KILL_THRESHOLD: f32 = 1.0;

/// Map a raw brain output to a -1/0/+1 step on one axis
fn move_delta(value: f32) -> i32 {
    if value > MOVE_DEAD_ZONE {
        1
    } else if value < -MOVE_DEAD_ZONE {
        -1
    } else {
        0
    }
}

/// One member of the population
#[derive(Debug, Clone)]
pub struct Individual {
    id: String,
    brain: Brain,
    coords: Option<Coord>,
    lifespan: u32,
    world_size: WorldSize,
    step: u32,
    alive: bool,
    input_vector: Option<InputVector>,
}

impl Individual {
    /// Create an individual with a random brain
    pub fn new<R: Rng + ?Sized>(
        id: impl Into<String>,
        lifespan: u32,
        world_size: WorldSize,
        num_genes: Option<usize>,
        rng: &mut R,
    ) -> Self {
        let brain = Brain::random(num_genes.unwrap_or(DEFAULT_NUM_GENES), rng);
        Self::with_brain(id, brain, lifespan, world_size)
    }

    /// Create an unplaced individual around an existing brain
    pub fn with_brain(
        id: impl Into<String>,
        brain: Brain,
        lifespan: u32,
        world_size: WorldSize,
    ) -> Self {
        Self {
            id: id.into(),
            brain,
            coords: None,
            lifespan,
            world_size,
            step: 0,
            alive: true,
            input_vector: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn brain(&self) -> &Brain {
        &self.brain
    }

    pub fn coords(&self) -> Option<Coord> {
        self.coords
    }

    pub fn set_coords(&mut self, coords: Option<Coord>) {
        self.coords = coords;
    }

    pub fn lifespan(&self) -> u32 {
        self.lifespan
    }

    pub fn world_size(&self) -> WorldSize {
        self.world_size
    }

    pub fn step(&self) -> u32 {
        self.step
    }

    pub fn is_alive(&self) -> bool {
        self.alive
    }

    /// Last sensed input, `None` before sensing or after a lethal sensing
    pub fn input_vector(&self) -> Option<&InputVector> {
        self.input_vector.as_ref()
    }

    /// Display color: the raw hex gene sequence
    pub fn color(&self) -> &str {
        self.brain.hex_gene_sequence()
    }

    pub fn view(&self) -> IndividualView {
        IndividualView {
            id: self.id.clone(),
            coords: self.coords,
            color: self.color().to_owned(),
        }
    }

    /// Adopt a new lifespan and world size (used when resuming a run)
    pub fn set_environment(&mut self, lifespan: u32, world_size: WorldSize) {
        self.lifespan = lifespan;
        self.world_size = world_size;
    }

    /// Clear per-generation state before the individual is placed again
    pub fn reset_for_generation(&mut self) {
        self.coords = None;
        self.step = 0;
        self.alive = true;
        self.input_vector = None;
    }

    /// Deep copy under a new id
    pub fn clone_as(&self, id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..self.clone()
        }
    }

    /// Sense hazards and surroundings
    ///
    /// Returns `Ok(false)` if the individual is (or just became) dead. A
    /// lethal cell kills without computing an input vector.
    pub fn sense_env<R: Rng + ?Sized>(
        &mut self,
        occupancy: &Occupancy,
        heat: &HeatMap,
        rng: &mut R,
    ) -> Result<bool, EngineError> {
        if !self.alive {
            return Ok(false);
        }

        let coords = self.coords.ok_or_else(|| EngineError::Unplaced {
            id: self.id.clone(),
        })?;

        match heat.survivable_risk(coords) {
            Some(risk) => {
                self.input_vector = Some(build_input_vector(
                    coords,
                    self.world_size,
                    occupancy,
                    risk,
                    self.step,
                    self.lifespan,
                    rng,
                ));
                Ok(true)
            }
            None => {
                log::debug!(
                    "{} died from heat at {:?} (threshold {})",
                    self.id,
                    coords,
                    heat.threshold()
                );
                self.alive = false;
                self.input_vector = None;
                Ok(false)
            }
        }
    }

    /// Evaluate the brain on the last sensed input and try to move
    ///
    /// The move happens only if the target cell is inside the grid and free;
    /// `occupancy` is updated in place. The step counter advances either way.
    pub fn take_step(&mut self, occupancy: &mut Occupancy) -> Result<OutputVector, EngineError> {
        let input = self.input_vector.as_ref().ok_or_else(|| EngineError::NotSensed {
            id: self.id.clone(),
        })?;
        let coords = self.coords.ok_or_else(|| EngineError::Unplaced {
            id: self.id.clone(),
        })?;

        let output = self.brain.output(input);

        if output[2] > KILL_THRESHOLD {
            log::trace!("{} wants to kill (output {:.3})", self.id, output[2]);
        }

        let target = coords.offset(move_delta(output[0]), move_delta(output[1]));
        if target != coords {
            if self.world_size.contains(target) && !occupancy.is_occupied(target) {
                occupancy.relocate(coords, target);
                self.coords = Some(target);
            } else {
                log::trace!("{} blocked moving {:?} -> {:?}", self.id, coords, target);
            }
        }

        self.step += 1;
        Ok(output)
    }

    /// Point-mutate the gene sequence
    ///
    /// Returns true if the sequence changed; the brain is rebuilt only then.
    pub fn mute<R: Rng + ?Sized>(
        &mut self,
        probability: f32,
        rng: &mut R,
    ) -> Result<bool, GenomeError> {
        match gene::mutate_hex_digits(self.brain.hex_gene_sequence(), probability, rng) {
            Some(mutated) => {
                self.brain.set_gene_sequence(mutated)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// With the given probability, produce two children by midpoint crossover
    ///
    /// The first child inherits lifespan and world size from `self`, the
    /// second from `other`. Children are unplaced.
    pub fn mate<R: Rng + ?Sized>(
        &self,
        other: &Individual,
        probability: f32,
        child_ids: (String, String),
        rng: &mut R,
    ) -> Result<Option<(Individual, Individual)>, GenomeError> {
        if !rng.check_probability(probability) {
            return Ok(None);
        }

        let (genes1, genes2) = gene::crossover(self.color(), other.color());
        let child1 = Individual::with_brain(
            child_ids.0,
            Brain::from_hex(genes1)?,
            self.lifespan,
            self.world_size,
        );
        let child2 = Individual::with_brain(
            child_ids.1,
            Brain::from_hex(genes2)?,
            other.lifespan,
            other.world_size,
        );

        Ok(Some((child1, child2)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_xoshiro::Xoshiro256StarStar;

    // input 1 (distance to bottom) -> output 0 (row move), weight +1.0
    const MOVE_DOWN: &str = "0c0f4240";
    // same connection, weight -1.0
    const MOVE_UP: &str = "0cf0bdc0";

    fn placed(genes: &str, world: WorldSize, at: Coord) -> Individual {
        let brain = Brain::from_hex(genes).unwrap();
        let mut individual = Individual::with_brain("test", brain, 10, world);
        individual.set_coords(Some(at));
        individual
    }

    #[test]
    fn test_new_individual() {
        let mut rng = Xoshiro256StarStar::seed_from_u64(42);
        let individual = Individual::new("individual_0", 60, WorldSize::new(5, 5), Some(6), &mut rng);

        assert_eq!(individual.id(), "individual_0");
        assert_eq!(individual.brain().num_genes(), 6);
        assert_eq!(individual.coords(), None);
        assert_eq!(individual.step(), 0);
        assert!(individual.is_alive());
        assert!(individual.input_vector().is_none());
        assert_eq!(individual.color(), individual.brain().hex_gene_sequence());
    }

    #[test]
    fn test_default_gene_count() {
        let mut rng = Xoshiro256StarStar::seed_from_u64(42);
        let individual = Individual::new("a", 60, WorldSize::new(5, 5), None, &mut rng);

        assert_eq!(individual.brain().num_genes(), DEFAULT_NUM_GENES);
    }

    #[test]
    fn test_move_delta_dead_zone() {
        assert_eq!(move_delta(0.3), 1);
        assert_eq!(move_delta(-0.3), -1);
        assert_eq!(move_delta(0.0), 0);
    }

    #[test]
    fn test_sense_unplaced() {
        let mut rng = Xoshiro256StarStar::seed_from_u64(42);
        let mut individual = Individual::new("lost", 10, WorldSize::new(5, 5), Some(1), &mut rng);

        let result = individual.sense_env(&Occupancy::new(), &HeatMap::default(), &mut rng);

        assert_eq!(
            result,
            Err(EngineError::Unplaced {
                id: "lost".to_string()
            })
        );
    }

    #[test]
    fn test_step_before_sensing() {
        let mut individual = placed(MOVE_DOWN, WorldSize::new(5, 5), Coord::new(0, 0));
        let mut occupancy: Occupancy = [Coord::new(0, 0)].into_iter().collect();

        let result = individual.take_step(&mut occupancy);

        assert_eq!(
            result,
            Err(EngineError::NotSensed {
                id: "test".to_string()
            })
        );
        assert_eq!(individual.step(), 0);
    }

    #[test]
    fn test_sense_stores_input() {
        let mut rng = Xoshiro256StarStar::seed_from_u64(42);
        let mut individual = placed(MOVE_DOWN, WorldSize::new(5, 5), Coord::new(1, 2));
        let occupancy: Occupancy = [Coord::new(1, 2)].into_iter().collect();

        let alive = individual
            .sense_env(&occupancy, &HeatMap::default(), &mut rng)
            .unwrap();

        assert!(alive);
        let input = individual.input_vector().unwrap();
        assert_eq!(&input[0..4], &[1.0, 3.0, 2.0, 2.0]);
    }

    #[test]
    fn test_lethal_heat_kills() {
        let mut rng = Xoshiro256StarStar::seed_from_u64(42);
        let mut individual = placed(MOVE_DOWN, WorldSize::new(5, 5), Coord::new(1, 1));
        let occupancy: Occupancy = [Coord::new(1, 1)].into_iter().collect();
        let heat = HeatMap::new(vec![Coord::new(1, 2)], 0.1);

        let alive = individual.sense_env(&occupancy, &heat, &mut rng).unwrap();

        assert!(!alive);
        assert!(!individual.is_alive());
        assert!(individual.input_vector().is_none());
        // dead individuals stay dead
        assert!(!individual
            .sense_env(&occupancy, &HeatMap::default(), &mut rng)
            .unwrap());
    }

    #[test]
    fn test_step_moves_into_free_cell() {
        let mut rng = Xoshiro256StarStar::seed_from_u64(42);
        let mut individual = placed(MOVE_DOWN, WorldSize::new(5, 5), Coord::new(0, 2));
        let mut occupancy: Occupancy = [Coord::new(0, 2)].into_iter().collect();

        individual
            .sense_env(&occupancy, &HeatMap::default(), &mut rng)
            .unwrap();
        let output = individual.take_step(&mut occupancy).unwrap();

        assert!(output[0] > 0.0);
        assert_eq!(output[1], 0.0);
        assert_eq!(individual.coords(), Some(Coord::new(1, 2)));
        assert!(occupancy.is_occupied(Coord::new(1, 2)));
        assert!(!occupancy.is_occupied(Coord::new(0, 2)));
        assert_eq!(individual.step(), 1);
    }

    #[test]
    fn test_step_blocked_by_neighbor() {
        let mut rng = Xoshiro256StarStar::seed_from_u64(42);
        let mut individual = placed(MOVE_DOWN, WorldSize::new(5, 5), Coord::new(0, 2));
        let mut occupancy: Occupancy = [Coord::new(0, 2), Coord::new(1, 2)].into_iter().collect();

        individual
            .sense_env(&occupancy, &HeatMap::default(), &mut rng)
            .unwrap();
        individual.take_step(&mut occupancy).unwrap();

        assert_eq!(individual.coords(), Some(Coord::new(0, 2)));
        assert_eq!(occupancy.len(), 2);
        assert_eq!(individual.step(), 1);
    }

    #[test]
    fn test_step_blocked_by_edge() {
        let mut rng = Xoshiro256StarStar::seed_from_u64(42);
        let mut individual = placed(MOVE_UP, WorldSize::new(5, 5), Coord::new(0, 2));
        let mut occupancy: Occupancy = [Coord::new(0, 2)].into_iter().collect();

        individual
            .sense_env(&occupancy, &HeatMap::default(), &mut rng)
            .unwrap();
        let output = individual.take_step(&mut occupancy).unwrap();

        assert!(output[0] < 0.0);
        assert_eq!(individual.coords(), Some(Coord::new(0, 2)));
        assert_eq!(individual.step(), 1);
    }

    #[test]
    fn test_mute_zero_is_noop() {
        let mut rng = Xoshiro256StarStar::seed_from_u64(42);
        let mut individual = Individual::new("a", 10, WorldSize::new(5, 5), Some(6), &mut rng);
        let before = individual.brain().clone();

        for _ in 0..50 {
            assert!(!individual.mute(0.0, &mut rng).unwrap());
        }

        assert_eq!(individual.brain(), &before);
    }

    #[test]
    fn test_mute_rebuilds_brain() {
        let mut rng = Xoshiro256StarStar::seed_from_u64(42);
        let mut individual = Individual::new("a", 10, WorldSize::new(5, 5), Some(6), &mut rng);
        let before = individual.color().to_owned();

        assert!(individual.mute(1.0, &mut rng).unwrap());

        assert_ne!(individual.color(), before);
        assert_eq!(individual.color().len(), before.len());
        assert_eq!(
            individual.brain(),
            &Brain::from_hex(individual.color()).unwrap()
        );
    }

    #[test]
    fn test_mate_certain() {
        let mut rng = Xoshiro256StarStar::seed_from_u64(42);
        let parent1 = Individual::with_brain(
            "p1",
            Brain::from_hex("0000000011111111").unwrap(),
            10,
            WorldSize::new(4, 4),
        );
        let parent2 = Individual::with_brain(
            "p2",
            Brain::from_hex("2222222233333333").unwrap(),
            20,
            WorldSize::new(8, 8),
        );

        let (child1, child2) = parent1
            .mate(&parent2, 1.0, ("c1".into(), "c2".into()), &mut rng)
            .unwrap()
            .unwrap();

        assert_eq!(child1.id(), "c1");
        assert_eq!(child1.color(), "0000000033333333");
        assert_eq!(child1.lifespan(), 10);
        assert_eq!(child1.world_size(), WorldSize::new(4, 4));
        assert_eq!(child2.id(), "c2");
        assert_eq!(child2.color(), "2222222211111111");
        assert_eq!(child2.lifespan(), 20);
        assert_eq!(child2.world_size(), WorldSize::new(8, 8));
        assert_eq!(child1.coords(), None);
        assert_eq!(child2.step(), 0);
    }

    #[test]
    fn test_mate_with_copy_reproduces_parent() {
        let mut rng = Xoshiro256StarStar::seed_from_u64(42);
        let parent = Individual::new("p", 10, WorldSize::new(4, 4), Some(5), &mut rng);
        let copy = parent.clone_as("p_copy");

        let (child1, child2) = parent
            .mate(&copy, 1.0, ("c1".into(), "c2".into()), &mut rng)
            .unwrap()
            .unwrap();

        assert_eq!(child1.color(), parent.color());
        assert_eq!(child2.color(), parent.color());
        assert_eq!(child1.brain(), parent.brain());
    }

    #[test]
    fn test_mate_never() {
        let mut rng = Xoshiro256StarStar::seed_from_u64(42);
        let parent1 = Individual::new("p1", 10, WorldSize::new(4, 4), Some(2), &mut rng);
        let parent2 = Individual::new("p2", 10, WorldSize::new(4, 4), Some(2), &mut rng);

        for _ in 0..20 {
            let result = parent1
                .mate(&parent2, 0.0, ("c1".into(), "c2".into()), &mut rng)
                .unwrap();
            assert!(result.is_none());
        }
    }

    #[test]
    fn test_clone_is_deep() {
        let mut rng = Xoshiro256StarStar::seed_from_u64(42);
        let original = Individual::new("orig", 10, WorldSize::new(4, 4), Some(4), &mut rng);
        let mut clone = original.clone_as("copy");

        clone.mute(1.0, &mut rng).unwrap();

        assert_eq!(clone.id(), "copy");
        assert_ne!(clone.color(), original.color());
        assert_eq!(original.brain(), &Brain::from_hex(original.color()).unwrap());
    }

    #[test]
    fn test_view() {
        let individual = placed(MOVE_DOWN, WorldSize::new(5, 5), Coord::new(2, 3));
        let view = individual.view();

        assert_eq!(view.id, "test");
        assert_eq!(view.coords, Some(Coord::new(2, 3)));
        assert_eq!(view.color, MOVE_DOWN);
    }

    #[test]
    fn test_reset_for_generation() {
        let mut rng = Xoshiro256StarStar::seed_from_u64(42);
        let mut individual = placed(MOVE_DOWN, WorldSize::new(5, 5), Coord::new(0, 2));
        let mut occupancy: Occupancy = [Coord::new(0, 2)].into_iter().collect();
        individual
            .sense_env(&occupancy, &HeatMap::default(), &mut rng)
            .unwrap();
        individual.take_step(&mut occupancy).unwrap();

        individual.reset_for_generation();

        assert_eq!(individual.coords(), None);
        assert_eq!(individual.step(), 0);
        assert!(individual.is_alive());
        assert!(individual.input_vector().is_none());
    }
}
