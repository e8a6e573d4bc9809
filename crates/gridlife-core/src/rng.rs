//! Randomness helpers for the simulation
//!
//! Every engine function takes the generator explicitly so a seeded
//! `Xoshiro256StarStar` makes whole runs reproducible.

/// Random draws used by sensing, mating and mutation
pub trait SimRng {
    /// Uniform f32 in [0.0, 1.0)
    fn unit_f32(&mut self) -> f32;

    /// True with the given probability (never for <= 0, always for >= 1)
    fn check_probability(&mut self, probability: f32) -> bool {
        self.unit_f32() < probability
    }

    /// Uniform noise in [-0.5, 0.5)
    fn noise(&mut self) -> f32 {
        self.unit_f32() - 0.5
    }
}

// Blanket implementation for any type implementing rand::Rng
impl<T: ?Sized + rand::Rng> SimRng for T {
    fn unit_f32(&mut self) -> f32 {
        rand::Rng::gen(self)
    }
}
