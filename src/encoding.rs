use ndarray::Array3;

use crate::backend::ALPHABET_SIZE;
use crate::error::{LayerError, Result};

/// Channel index of a nucleotide, `None` for the unknown base `N`
///
/// The alphabet order is `A, C, G, T`; lowercase is accepted.
pub fn symbol_index(symbol: char, position: usize) -> Result<Option<usize>> {
    match symbol.to_ascii_uppercase() {
        'A' => Ok(Some(0)),
        'C' => Ok(Some(1)),
        'G' => Ok(Some(2)),
        'T' => Ok(Some(3)),
        'N' => Ok(None),
        _ => Err(LayerError::InvalidSymbol { symbol, position }),
    }
}

/// Encodes equal-length nucleotide strings into a `(batch, n_in, 4)` one-hot batch
///
/// An unknown base `N` spreads its mass evenly, `0.25` in every channel.
pub fn one_hot_encode(sequences: &[&str]) -> Result<Array3<f32>> {
    let n_in = sequences.first().map_or(0, |s| s.chars().count());
    let mut batch = Array3::zeros((sequences.len(), n_in, ALPHABET_SIZE));

    for (s, sequence) in sequences.iter().enumerate() {
        let length = sequence.chars().count();
        if length != n_in {
            return Err(LayerError::shape("sequence length", n_in, length));
        }

        for (p, symbol) in sequence.chars().enumerate() {
            match symbol_index(symbol, p)? {
                Some(c) => batch[[s, p, c]] = 1.0,
                None => batch
                    .slice_mut(ndarray::s![s, p, ..])
                    .fill(1.0 / ALPHABET_SIZE as f32),
            }
        }
    }

    Ok(batch)
}
