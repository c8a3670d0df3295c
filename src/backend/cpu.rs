use ndarray::{Array1, Array2, Array3, Axis};

use super::{window_position, ConvolutionBackend, ALPHABET_SIZE};
use crate::error::{LayerError, Result};

/// Dense reference implementation of the sequence convolution kernels
#[derive(Debug, Clone, Copy, Default)]
pub struct CpuBackend;

impl CpuBackend {
    fn check_input(input: &Array3<f32>) -> Result<(usize, usize)> {
        let (batch, n_in, alphabet) = input.dim();
        if alphabet != ALPHABET_SIZE {
            return Err(LayerError::shape(
                "input alphabet axis",
                ALPHABET_SIZE,
                alphabet,
            ));
        }
        Ok((batch, n_in))
    }

    fn check_delta(delta: &Array3<f32>, batch: usize, n_filters: usize, n_in: usize) -> Result<()> {
        if delta.dim() != (batch, n_filters, n_in) {
            return Err(LayerError::shape("delta", (batch, n_filters, n_in), delta.dim()));
        }
        Ok(())
    }
}

impl ConvolutionBackend for CpuBackend {
    fn convolve_sequence(
        &self,
        input: &Array3<f32>,
        weights: &Array2<f32>,
        bias: &Array1<f32>,
    ) -> Result<Array3<f32>> {
        let (batch, n_in) = Self::check_input(input)?;
        let (n_filters, span) = weights.dim();
        if span == 0 || span % ALPHABET_SIZE != 0 {
            return Err(LayerError::shape(
                "weights columns",
                format!("a positive multiple of {}", ALPHABET_SIZE),
                span,
            ));
        }
        if bias.len() != n_filters {
            return Err(LayerError::shape("bias", (n_filters,), (bias.len(),)));
        }
        let filter_width = span / ALPHABET_SIZE;

        let mut output = Array3::zeros((batch, n_filters, n_in));
        for ((s, f, p), value) in output.indexed_iter_mut() {
            let mut acc = bias[f];
            for j in 0..filter_width {
                if let Some(pos) = window_position(p, j, filter_width, n_in) {
                    for c in 0..ALPHABET_SIZE {
                        acc += weights[[f, j * ALPHABET_SIZE + c]] * input[[s, pos, c]];
                    }
                }
            }
            *value = acc;
        }
        Ok(output)
    }

    fn convolve_sequence_gradient(
        &self,
        input: &Array3<f32>,
        delta: &Array3<f32>,
        filter_width: usize,
        n_filters: usize,
    ) -> Result<Array2<f32>> {
        let (batch, n_in) = Self::check_input(input)?;
        Self::check_delta(delta, batch, n_filters, n_in)?;
        if filter_width == 0 {
            return Err(LayerError::InvalidConfig("filter_width must be positive".to_string()));
        }

        let mut grad = Array2::zeros((n_filters, ALPHABET_SIZE * filter_width));
        for ((s, f, p), &d) in delta.indexed_iter() {
            if d == 0.0 {
                continue;
            }
            for j in 0..filter_width {
                if let Some(pos) = window_position(p, j, filter_width, n_in) {
                    for c in 0..ALPHABET_SIZE {
                        grad[[f, j * ALPHABET_SIZE + c]] += d * input[[s, pos, c]];
                    }
                }
            }
        }
        Ok(grad)
    }

    fn sum_delta(&self, delta: &Array3<f32>, n_filters: usize) -> Result<Array1<f32>> {
        let filters = delta.len_of(Axis(1));
        if filters != n_filters {
            return Err(LayerError::shape("delta filter axis", n_filters, filters));
        }
        Ok(delta.sum_axis(Axis(2)).sum_axis(Axis(0)))
    }
}
