//! Hex gene codec
//!
//! A gene sequence is a string of hex digits, 8 digits (32 bits) per gene.
//! Every gene encodes one weighted connection of the brain, read
//! most-significant bit first:
//!
//! ```text
//! ☐|☐☐☐☐|☐|☐☐|☐☐☐☐☐☐☐☐☐☐☐☐☐☐☐☐☐☐☐☐☐☐☐☐
//! │  │   │  │  └ bits 8-31: weight, -(bit 8 << 23) + bits 9-31, over WEIGHT_SCALE
//! │  │   │  └ bits 6-7: target neuron index
//! │  │   └ bit 5: target group (0 = inner, 1 = output)
//! │  └ bits 1-4: source neuron index (inner sources only read bits 3-4)
//! └ bit 0: source group (0 = input, 1 = inner)
//! ```

use rand::Rng;

use crate::error::GenomeError;

/// Sensory inputs: 4 wall distances, 8 neighbor flags, hazard, age, 2 noise
pub const NUM_INPUT_NEURONS: usize = 16;
pub const NUM_INNER_NEURONS: usize = 4;
/// Row move, column move, kill intent, unused
pub const NUM_OUTPUT_NEURONS: usize = 4;

/// Bits per gene
pub const GENE_LENGTH: usize = 32;
/// Hex digits per gene
pub const GENE_LENGTH_HEX: usize = GENE_LENGTH / 4;
/// Divisor mapping the raw 24-bit weight field to a float weight
pub const WEIGHT_SCALE: f32 = 1_000_000.0;

const HEX_DIGITS: &[u8; 16] = b"0123456789abcdef";

/// Neuron group a connection endpoint belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NeuronGroup {
    Input,
    Inner,
    Output,
}

impl NeuronGroup {
    /// Number of neurons in this group
    pub fn size(self) -> usize {
        match self {
            Self::Input => NUM_INPUT_NEURONS,
            Self::Inner => NUM_INNER_NEURONS,
            Self::Output => NUM_OUTPUT_NEURONS,
        }
    }
}

/// A single neuron address
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Neuron {
    pub group: NeuronGroup,
    pub index: usize,
}

impl Neuron {
    pub fn new(group: NeuronGroup, index: usize) -> Self {
        Self { group, index }
    }
}

/// Weighted directed connection expressed by one gene
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Connection {
    pub source: Neuron,
    pub target: Neuron,
    pub weight: f32,
}

impl Connection {
    /// True if the brain has a matrix for this (source, target) pair and both
    /// indices fall inside their groups
    pub fn is_expressible(&self) -> bool {
        use NeuronGroup::*;

        let valid_pair = matches!(
            (self.source.group, self.target.group),
            (Input, Inner) | (Inner, Inner) | (Inner, Output) | (Input, Output)
        );

        valid_pair
            && self.source.index < self.source.group.size()
            && self.target.index < self.target.group.size()
    }
}

/// Decode the signed weight stored in bits 8-31 of a gene
pub fn decode_weight(gene: u32) -> f32 {
    let sign = ((gene >> 23) & 0x1) as i32;
    let magnitude = (gene & 0x7F_FFFF) as i32;
    (-(sign << 23) + magnitude) as f32 / WEIGHT_SCALE
}

/// Decode one 32-bit gene
///
/// Returns `None` for genes whose endpoints do not map onto one of the four
/// connection matrices; such genes are silently ignored by the brain.
pub fn decode_gene(gene: u32) -> Option<Connection> {
    let source_group = if (gene >> 31) & 0x1 == 0 {
        NeuronGroup::Input
    } else {
        NeuronGroup::Inner
    };
    let source_index = match source_group {
        NeuronGroup::Input => (gene >> 27) & 0xF,
        // Inner neurons are addressed by the low 2 bits of the 4-bit field
        _ => (gene >> 27) & 0x3,
    } as usize;

    let target_group = if (gene >> 26) & 0x1 == 0 {
        NeuronGroup::Inner
    } else {
        NeuronGroup::Output
    };
    let target_index = ((gene >> 24) & 0x3) as usize;

    let connection = Connection {
        source: Neuron::new(source_group, source_index),
        target: Neuron::new(target_group, target_index),
        weight: decode_weight(gene),
    };

    connection.is_expressible().then_some(connection)
}

/// Split a hex gene sequence into 32-bit genes
///
/// The length (in bytes) must be a multiple of [`GENE_LENGTH_HEX`] and every
/// character must be a hex digit. Upper and lower case are both accepted.
pub fn parse_genes(hex_gene_sequence: &str) -> Result<Vec<u32>, GenomeError> {
    if hex_gene_sequence.len() % GENE_LENGTH_HEX != 0 {
        return Err(GenomeError::InvalidGeneLength {
            length: hex_gene_sequence.len(),
        });
    }

    if let Some((position, digit)) = hex_gene_sequence
        .char_indices()
        .find(|(_, c)| !c.is_ascii_hexdigit())
    {
        return Err(GenomeError::InvalidHexDigit { position, digit });
    }

    let genes = hex_gene_sequence
        .as_bytes()
        .chunks(GENE_LENGTH_HEX)
        .map(|chunk| {
            chunk
                .iter()
                .fold(0u32, |gene, &digit| (gene << 4) | hex_value(digit))
        })
        .collect();

    Ok(genes)
}

/// Decode a full gene sequence into its expressible connections
pub fn decode(hex_gene_sequence: &str) -> Result<Vec<Connection>, GenomeError> {
    let genes = parse_genes(hex_gene_sequence)?;
    Ok(genes.into_iter().filter_map(decode_gene).collect())
}

/// Generate `num_genes` random genes by hex-encoding `num_genes * 4` random bytes
pub fn random_gene_sequence<R: Rng + ?Sized>(num_genes: usize, rng: &mut R) -> String {
    let mut bytes = vec![0u8; num_genes * (GENE_LENGTH / 8)];
    rng.fill(&mut bytes[..]);
    bytes.iter().map(|byte| format!("{byte:02x}")).collect()
}

/// Single-point crossover at the midpoint of `parent1`
///
/// Returns `(parent1[..half] + parent2[half..], parent2[..half] + parent1[half..])`.
/// The cut is measured in hex digits, so it may fall inside a gene when the
/// gene count is odd. Sequences are not validated here; on non-ASCII input
/// each cut moves back to the previous character boundary.
pub fn crossover(parent1: &str, parent2: &str) -> (String, String) {
    let half = parent1.len() / 2;
    let (head1, tail1) = split_at_boundary(parent1, half);
    let (head2, tail2) = split_at_boundary(parent2, half);

    (format!("{head1}{tail2}"), format!("{head2}{tail1}"))
}

fn split_at_boundary(sequence: &str, at: usize) -> (&str, &str) {
    let mut at = at.min(sequence.len());
    while !sequence.is_char_boundary(at) {
        at -= 1;
    }
    sequence.split_at(at)
}

/// Point-mutate hex digits
///
/// Every digit is independently replaced with probability `probability` by a
/// uniformly drawn hex digit (which may equal the old one). Returns `None`
/// when the sequence came out unchanged.
pub fn mutate_hex_digits<R: Rng + ?Sized>(
    hex_gene_sequence: &str,
    probability: f32,
    rng: &mut R,
) -> Option<String> {
    if probability <= 0.0 {
        return None;
    }

    let mutated: String = hex_gene_sequence
        .chars()
        .map(|digit| {
            if rng.gen::<f32>() < probability {
                HEX_DIGITS[rng.gen_range(0..HEX_DIGITS.len())] as char
            } else {
                digit
            }
        })
        .collect();

    (mutated != hex_gene_sequence).then_some(mutated)
}

fn hex_value(digit: u8) -> u32 {
    (digit as char).to_digit(16).unwrap_or(0)
}
