//! Fixed-topology brain expressed from a hex gene sequence
//!
//! The network has three neuron groups (16 input, 4 inner, 4 output) and four
//! dense weight matrices. Genes only decide which entries are non-zero and
//! their weights; the topology itself never changes.

use rand::Rng;

use crate::error::GenomeError;
use crate::gene::{
    self, NeuronGroup, NUM_INNER_NEURONS, NUM_INPUT_NEURONS, NUM_OUTPUT_NEURONS,
};

/// Sensory input vector fed to [`Brain::output`]
pub type InputVector = [f32; NUM_INPUT_NEURONS];
/// Raw tanh outputs of [`Brain::output`]
pub type OutputVector = [f32; NUM_OUTPUT_NEURONS];

type InputInner = [[f32; NUM_INNER_NEURONS]; NUM_INPUT_NEURONS];
type InnerInner = [[f32; NUM_INNER_NEURONS]; NUM_INNER_NEURONS];
type InnerOutput = [[f32; NUM_OUTPUT_NEURONS]; NUM_INNER_NEURONS];
type InputOutput = [[f32; NUM_OUTPUT_NEURONS]; NUM_INPUT_NEURONS];

/// Gene-encoded feed-forward network
///
/// The weight matrices are private and only ever written by
/// [`Brain::express_genes`], so they always match the gene sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct Brain {
    hex_gene_sequence: String,
    input_inner: InputInner,
    inner_inner: InnerInner,
    inner_output: InnerOutput,
    input_output: InputOutput,
}

impl Brain {
    /// Build a brain from a hex gene sequence
    pub fn from_hex(hex_gene_sequence: impl Into<String>) -> Result<Self, GenomeError> {
        let mut brain = Self {
            hex_gene_sequence: hex_gene_sequence.into(),
            input_inner: [[0.0; NUM_INNER_NEURONS]; NUM_INPUT_NEURONS],
            inner_inner: [[0.0; NUM_INNER_NEURONS]; NUM_INNER_NEURONS],
            inner_output: [[0.0; NUM_OUTPUT_NEURONS]; NUM_INNER_NEURONS],
            input_output: [[0.0; NUM_OUTPUT_NEURONS]; NUM_INPUT_NEURONS],
        };
        brain.express_genes()?;
        Ok(brain)
    }

    /// Build a brain from `num_genes` random genes
    pub fn random<R: Rng + ?Sized>(num_genes: usize, rng: &mut R) -> Self {
        let sequence = gene::random_gene_sequence(num_genes, rng);
        Self::from_hex(sequence)
            .unwrap_or_else(|e| unreachable!("generated gene sequence is invalid: {e}"))
    }

    /// The gene sequence this brain was expressed from
    pub fn hex_gene_sequence(&self) -> &str {
        &self.hex_gene_sequence
    }

    /// Number of genes in the sequence
    pub fn num_genes(&self) -> usize {
        self.hex_gene_sequence.len() / gene::GENE_LENGTH_HEX
    }

    /// Replace the gene sequence and re-express every matrix from scratch
    ///
    /// On error the brain is left unchanged.
    pub fn set_gene_sequence(
        &mut self,
        hex_gene_sequence: impl Into<String>,
    ) -> Result<(), GenomeError> {
        *self = Self::from_hex(hex_gene_sequence)?;
        Ok(())
    }

    /// Zero all matrices and scatter every expressible gene into them
    ///
    /// Later genes overwrite earlier ones targeting the same entry.
    fn express_genes(&mut self) -> Result<(), GenomeError> {
        self.input_inner = [[0.0; NUM_INNER_NEURONS]; NUM_INPUT_NEURONS];
        self.inner_inner = [[0.0; NUM_INNER_NEURONS]; NUM_INNER_NEURONS];
        self.inner_output = [[0.0; NUM_OUTPUT_NEURONS]; NUM_INNER_NEURONS];
        self.input_output = [[0.0; NUM_OUTPUT_NEURONS]; NUM_INPUT_NEURONS];

        for connection in gene::decode(&self.hex_gene_sequence)? {
            let (s, t) = (connection.source.index, connection.target.index);
            match (connection.source.group, connection.target.group) {
                (NeuronGroup::Input, NeuronGroup::Inner) => self.input_inner[s][t] = connection.weight,
                (NeuronGroup::Inner, NeuronGroup::Inner) => self.inner_inner[s][t] = connection.weight,
                (NeuronGroup::Inner, NeuronGroup::Output) => {
                    self.inner_output[s][t] = connection.weight
                }
                (NeuronGroup::Input, NeuronGroup::Output) => {
                    self.input_output[s][t] = connection.weight
                }
                // decode() already drops these
                _ => {}
            }
        }

        log::trace!(
            "Expressed {} genes into brain matrices",
            self.num_genes()
        );
        Ok(())
    }

    /// Forward pass: input -> inner (one inner-inner mixing round, tanh) -> output (tanh)
    ///
    /// Inputs also reach the outputs directly through the input-output matrix.
    pub fn output(&self, input: &InputVector) -> OutputVector {
        let mut inner = [0.0f32; NUM_INNER_NEURONS];
        #[allow(clippy::needless_range_loop)]
        for j in 0..NUM_INNER_NEURONS {
            for i in 0..NUM_INPUT_NEURONS {
                inner[j] += input[i] * self.input_inner[i][j];
            }
        }

        // Exactly one recurrent pass, not iterated to a fixed point
        let mut mixed = inner;
        #[allow(clippy::needless_range_loop)]
        for k in 0..NUM_INNER_NEURONS {
            for j in 0..NUM_INNER_NEURONS {
                mixed[k] += inner[j] * self.inner_inner[j][k];
            }
        }
        let activated = mixed.map(f32::tanh);

        let mut output = [0.0f32; NUM_OUTPUT_NEURONS];
        #[allow(clippy::needless_range_loop)]
        for o in 0..NUM_OUTPUT_NEURONS {
            let mut sum = 0.0;
            for j in 0..NUM_INNER_NEURONS {
                sum += activated[j] * self.inner_output[j][o];
            }
            for i in 0..NUM_INPUT_NEURONS {
                sum += input[i] * self.input_output[i][o];
            }
            output[o] = sum.tanh();
        }

        output
    }

    pub fn input_inner(&self) -> &InputInner {
        &self.input_inner
    }

    pub fn inner_inner(&self) -> &InnerInner {
        &self.inner_inner
    }

    pub fn inner_output(&self) -> &InnerOutput {
        &self.inner_output
    }

    pub fn input_output(&self) -> &InputOutput {
        &self.input_output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gene::tests::encode_gene;
    use crate::gene::WEIGHT_SCALE;
    use rand::SeedableRng;
    use rand_xoshiro::Xoshiro256StarStar;

    fn hex(genes: &[u32]) -> String {
        genes.iter().map(|g| format!("{g:08x}")).collect()
    }

    fn count_nonzero<const N: usize, const M: usize>(matrix: &[[f32; M]; N]) -> usize {
        matrix.iter().flatten().filter(|w| **w != 0.0).count()
    }

    #[test]
    fn test_expression_is_deterministic() {
        let mut rng = Xoshiro256StarStar::seed_from_u64(99);
        let sequence = gene::random_gene_sequence(30, &mut rng);

        let brain1 = Brain::from_hex(sequence.clone()).unwrap();
        let brain2 = Brain::from_hex(sequence).unwrap();

        assert_eq!(brain1, brain2);
    }

    #[test]
    fn test_single_input_inner_gene() {
        let brain = Brain::from_hex(hex(&[encode_gene(false, 5, false, 3, 250_000)])).unwrap();

        assert_eq!(count_nonzero(brain.input_inner()), 1);
        assert_eq!(brain.input_inner()[5][3], 250_000.0 / WEIGHT_SCALE);
        assert_eq!(count_nonzero(brain.inner_inner()), 0);
        assert_eq!(count_nonzero(brain.inner_output()), 0);
        assert_eq!(count_nonzero(brain.input_output()), 0);
    }

    #[test]
    fn test_each_pair_lands_in_its_matrix() {
        let brain = Brain::from_hex(hex(&[
            encode_gene(true, 1, false, 2, 100),
            encode_gene(true, 3, true, 0, 200),
            encode_gene(false, 15, true, 3, 300),
        ]))
        .unwrap();

        assert_eq!(brain.inner_inner()[1][2], 100.0 / WEIGHT_SCALE);
        assert_eq!(brain.inner_output()[3][0], 200.0 / WEIGHT_SCALE);
        assert_eq!(brain.input_output()[15][3], 300.0 / WEIGHT_SCALE);
        assert_eq!(count_nonzero(brain.input_inner()), 0);
    }

    #[test]
    fn test_last_gene_wins() {
        let brain = Brain::from_hex(hex(&[
            encode_gene(false, 0, false, 0, 111),
            encode_gene(false, 0, false, 0, -222),
        ]))
        .unwrap();

        assert_eq!(brain.input_inner()[0][0], -222.0 / WEIGHT_SCALE);
    }

    #[test]
    fn test_set_gene_sequence_clears_stale_weights() {
        let mut brain = Brain::from_hex(hex(&[encode_gene(false, 2, true, 1, 5_000)])).unwrap();
        assert_eq!(count_nonzero(brain.input_output()), 1);

        brain
            .set_gene_sequence(hex(&[encode_gene(true, 0, true, 0, 5_000)]))
            .unwrap();

        assert_eq!(count_nonzero(brain.input_output()), 0);
        assert_eq!(count_nonzero(brain.inner_output()), 1);
    }

    #[test]
    fn test_set_gene_sequence_error_keeps_brain() {
        let sequence = hex(&[encode_gene(false, 2, true, 1, 5_000)]);
        let mut brain = Brain::from_hex(sequence.clone()).unwrap();

        assert!(brain.set_gene_sequence("123").is_err());
        assert_eq!(brain.hex_gene_sequence(), sequence);
        assert_eq!(count_nonzero(brain.input_output()), 1);
    }

    #[test]
    fn test_invalid_length_propagates() {
        assert_eq!(
            Brain::from_hex("1234567"),
            Err(GenomeError::InvalidGeneLength { length: 7 })
        );
    }

    #[test]
    fn test_empty_brain_outputs_zero() {
        let brain = Brain::from_hex("").unwrap();
        assert_eq!(brain.output(&[1.0; NUM_INPUT_NEURONS]), [0.0; NUM_OUTPUT_NEURONS]);
    }

    #[test]
    fn test_direct_input_output_path() {
        // input 0 -> output 1 with weight 1.0
        let brain = Brain::from_hex(hex(&[encode_gene(false, 0, true, 1, 1_000_000)])).unwrap();
        let mut input = [0.0; NUM_INPUT_NEURONS];
        input[0] = 0.5;

        let output = brain.output(&input);
        assert!((output[1] - 0.5f32.tanh()).abs() < 1e-6);
        assert_eq!(output[0], 0.0);
    }

    #[test]
    fn test_single_inner_mixing_round() {
        // input 0 -> inner 0 (w=1), inner 0 -> inner 1 (w=2), inner 1 -> output 0 (w=1)
        let brain = Brain::from_hex(hex(&[
            encode_gene(false, 0, false, 0, 1_000_000),
            encode_gene(true, 0, false, 1, 2_000_000),
            encode_gene(true, 1, true, 0, 1_000_000),
        ]))
        .unwrap();
        let mut input = [0.0; NUM_INPUT_NEURONS];
        input[0] = 0.25;

        // inner = [0.25, 0, 0, 0]; mixed = inner + inner * W = [0.25, 0.5, 0, 0]
        let expected = (0.5f32.tanh()).tanh();
        let output = brain.output(&input);
        assert!((output[0] - expected).abs() < 1e-6);
    }

    #[test]
    fn test_output_is_bounded_and_deterministic() {
        let mut rng = Xoshiro256StarStar::seed_from_u64(5);
        let brain = Brain::random(40, &mut rng);
        let input = [3.0; NUM_INPUT_NEURONS];

        let output1 = brain.output(&input);
        let output2 = brain.output(&input);
        assert_eq!(output1, output2);
        for value in output1 {
            assert!((-1.0..=1.0).contains(&value));
        }
    }

    #[test]
    fn test_random_brain_gene_count() {
        let mut rng = Xoshiro256StarStar::seed_from_u64(11);
        let brain = Brain::random(6, &mut rng);

        assert_eq!(brain.num_genes(), 6);
        assert_eq!(brain.hex_gene_sequence().len(), 48);
    }
}
