//! Errors raised while decoding gene sequences

use thiserror::Error;

use crate::gene::GENE_LENGTH_HEX;

/// Error type for gene decoding and brain construction
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GenomeError {
    /// Sequence length is not a whole number of genes
    #[error(
        "gene sequence length {length} is not a multiple of {} hex digits",
        GENE_LENGTH_HEX
    )]
    InvalidGeneLength { length: usize },

    /// Sequence contains a character that is not a hex digit
    #[error("invalid hex digit {digit:?} at position {position}")]
    InvalidHexDigit { position: usize, digit: char },
}
