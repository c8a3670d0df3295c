pub mod sequence_convolution;

use std::fmt::Debug;

use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

use crate::activation::ActivationType;
use crate::error::Result;

/// Gradients of a layer's weight matrix and bias vector
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterGradients {
    pub weights: Array2<f32>,
    pub bias: Array1<f32>,
}

/// Serializable summary of a layer's configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerArchitecture {
    pub class: String,
    pub n_in: usize,
    pub n_units: usize,
    pub activation: ActivationType,
    pub l1_penalty_weight: f32,
    pub l2_penalty_weight: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter_width: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub n_filters: Option<usize>,
}

/// Capabilities a training loop expects from any trainable hidden layer
///
/// Layers never update their own parameters: `backprop` only reports
/// gradients, one per parameter, in the order of `lr_multiplier`.
pub trait HiddenLayer: Debug {
    type Input;
    type Output;
    type Gradients;
    type InputGradient;

    /// Number of learnable parameter tensors
    fn n_parameters(&self) -> usize;

    /// Number of outputs produced per example
    fn n_units(&self) -> usize;

    /// Learning rate scale factor per parameter tensor
    fn lr_multiplier(&self) -> &[f32];

    /// L1 regularization term of the objective
    fn l1_penalty(&self) -> f32;

    /// L2 regularization term of the objective
    fn l2_penalty(&self) -> f32;

    fn architecture(&self) -> LayerArchitecture;

    fn feed_forward(&self, input: &Self::Input, prediction: bool) -> Result<Self::Output>;

    /// Computes parameter gradients for `df_output`, reusing `cache` (the
    /// matching `feed_forward` output) when given
    fn backprop(
        &self,
        input: &Self::Input,
        df_output: &Self::Output,
        cache: Option<&Self::Output>,
    ) -> Result<(Self::Gradients, Option<Self::InputGradient>)>;
}

pub use sequence_convolution::SequenceConvolutionLayer;
