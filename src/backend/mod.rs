//! Convolution kernels the sequence layer delegates its arithmetic to.
//!
//! Tensors follow one layout throughout:
//! - input batch `(batch, n_in, ALPHABET_SIZE)`, one-hot along the last axis
//! - activations and deltas `(batch, n_filters, n_in)`
//! - weights `(n_filters, ALPHABET_SIZE * filter_width)`, column `j * ALPHABET_SIZE + c`
//!   is window offset `j`, symbol `c`
//!
//! Output position `p` reads input positions `p + j - (filter_width - 1) / 2`;
//! positions outside the sequence contribute zero.

mod cpu;

use std::fmt::Debug;

use ndarray::{Array1, Array2, Array3};

use crate::error::Result;

pub use cpu::CpuBackend;

/// Number of symbols in the sequence alphabet
pub const ALPHABET_SIZE: usize = 4;

pub trait ConvolutionBackend: Debug + Clone {
    /// Convolves the one-hot `input` against the filter bank and adds the per-filter bias
    fn convolve_sequence(
        &self,
        input: &Array3<f32>,
        weights: &Array2<f32>,
        bias: &Array1<f32>,
    ) -> Result<Array3<f32>>;

    /// Gradient of the filter bank given the backpropagated `delta`
    fn convolve_sequence_gradient(
        &self,
        input: &Array3<f32>,
        delta: &Array3<f32>,
        filter_width: usize,
        n_filters: usize,
    ) -> Result<Array2<f32>>;

    /// Reduces `delta` over the batch and position axes
    fn sum_delta(&self, delta: &Array3<f32>, n_filters: usize) -> Result<Array1<f32>>;

    /// Element-wise sign, zero at exactly zero
    fn sign(&self, values: &Array2<f32>) -> Array2<f32> {
        values.mapv(|x| {
            if x > 0.0 {
                1.0
            } else if x < 0.0 {
                -1.0
            } else {
                0.0
            }
        })
    }
}

/// Input position read by window offset `j` of output position `p`, if in bounds
pub(crate) fn window_position(p: usize, j: usize, filter_width: usize, n_in: usize) -> Option<usize> {
    let offset = (filter_width - 1) / 2;
    (p + j).checked_sub(offset).filter(|&pos| pos < n_in)
}
