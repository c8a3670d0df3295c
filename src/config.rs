//! Configuration for the sequence convolution layer
//!
//! The configuration can be built in code or parsed from JSON:
//!
//! ```json
//! {
//!   "n_in": 200,
//!   "filter_width": 12,
//!   "n_filters": 64,
//!   "activation": "relu",
//!   "weights_scale": 0.01,
//!   "l2_penalty_weight": 0.0001
//! }
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::activation::ActivationType;
use crate::error::{LayerError, Result};

fn default_weights_scale() -> f32 {
    0.01
}

/// Sizes, nonlinearity and regularization of a `SequenceConvolutionLayer`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SequenceConvolutionConfig {
    /// Number of positions in each input sequence
    pub n_in: usize,

    /// Width of the convolution window in sequence positions
    pub filter_width: usize,

    /// Number of filters (output channels)
    pub n_filters: usize,

    #[serde(default)]
    pub activation: ActivationType,

    /// Width of the uniform interval weights are sampled from
    #[serde(default = "default_weights_scale")]
    pub weights_scale: f32,

    #[serde(default)]
    pub l1_penalty_weight: f32,

    #[serde(default)]
    pub l2_penalty_weight: f32,
}

impl SequenceConvolutionConfig {
    pub fn new(n_in: usize, filter_width: usize, n_filters: usize) -> Self {
        SequenceConvolutionConfig {
            n_in,
            filter_width,
            n_filters,
            activation: ActivationType::default(),
            weights_scale: default_weights_scale(),
            l1_penalty_weight: 0.0,
            l2_penalty_weight: 0.0,
        }
    }

    pub fn with_activation(mut self, activation: ActivationType) -> Self {
        self.activation = activation;
        self
    }

    pub fn with_weights_scale(mut self, weights_scale: f32) -> Self {
        self.weights_scale = weights_scale;
        self
    }

    pub fn with_l1_penalty(mut self, weight: f32) -> Self {
        self.l1_penalty_weight = weight;
        self
    }

    pub fn with_l2_penalty(mut self, weight: f32) -> Self {
        self.l2_penalty_weight = weight;
        self
    }

    /// Parses and validates a JSON configuration
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: SequenceConvolutionConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads the file at `path` and parses it with [`Self::from_json_str`]
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    /// Shape `(n_filters, 4 * filter_width)` of the filter bank
    pub fn weights_shape(&self) -> (usize, usize) {
        (self.n_filters, crate::backend::ALPHABET_SIZE * self.filter_width)
    }

    /// Total number of outputs per sequence
    pub fn n_units(&self) -> usize {
        self.n_filters * self.n_in
    }

    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("n_in", self.n_in),
            ("filter_width", self.filter_width),
            ("n_filters", self.n_filters),
        ] {
            if value == 0 {
                return Err(LayerError::InvalidConfig(format!("{} must be positive", name)));
            }
        }

        if !self.weights_scale.is_finite() || self.weights_scale < 0.0 {
            return Err(LayerError::InvalidConfig(format!(
                "weights_scale must be finite and non-negative, got {}",
                self.weights_scale
            )));
        }

        for (name, value) in [
            ("l1_penalty_weight", self.l1_penalty_weight),
            ("l2_penalty_weight", self.l2_penalty_weight),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(LayerError::InvalidConfig(format!(
                    "{} must be finite and non-negative, got {}",
                    name, value
                )));
            }
        }

        Ok(())
    }
}
