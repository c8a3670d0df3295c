use ndarray::{Array1, Array2, Array3, Axis};
use rand::Rng;
use tracing::{debug, trace};

use super::{HiddenLayer, LayerArchitecture, ParameterGradients};
use crate::backend::{ConvolutionBackend, CpuBackend, ALPHABET_SIZE};
use crate::config::SequenceConvolutionConfig;
use crate::error::{LayerError, Result};
use crate::sampler;

const N_PARAMETERS: usize = 2;

/// One-dimensional convolution over one-hot encoded sequences
///
/// Each of the `n_filters` filters spans `filter_width` positions of the
/// four-symbol alphabet and produces one activation per input position, so a
/// batch `(batch, n_in, 4)` maps to activations `(batch, n_filters, n_in)`.
/// The layer is input-adjacent: `backprop` reports no gradient for its input.
#[derive(Debug, Clone)]
pub struct SequenceConvolutionLayer<B: ConvolutionBackend = CpuBackend> {
    config: SequenceConvolutionConfig,
    weights: Array2<f32>,
    bias: Array1<f32>,
    lr_multiplier: [f32; N_PARAMETERS],
    backend: B,
}

impl SequenceConvolutionLayer<CpuBackend> {
    /// Constructs a layer on the CPU backend with freshly sampled weights
    pub fn new(config: SequenceConvolutionConfig) -> Result<Self> {
        Self::with_rng(config, CpuBackend, &mut rand::rng())
    }
}

impl<B: ConvolutionBackend> SequenceConvolutionLayer<B> {
    /// Constructs a layer whose weights are sampled from `rng`
    pub fn with_rng<R: Rng + ?Sized>(
        config: SequenceConvolutionConfig,
        backend: B,
        rng: &mut R,
    ) -> Result<Self> {
        Self::from_parts(config, None, None, backend, rng)
    }

    /// Constructs a layer around supplied parameters
    pub fn with_parameters(
        config: SequenceConvolutionConfig,
        weights: Array2<f32>,
        bias: Array1<f32>,
        backend: B,
    ) -> Result<Self> {
        Self::from_parts(config, Some(weights), Some(bias), backend, &mut rand::rng())
    }

    /// Constructs a layer from optional parameters
    ///
    /// # Arguments
    ///
    /// * `config` - Sizes, activation and penalty weights, validated here
    /// * `weights` - Filter bank `(n_filters, 4 * filter_width)`; when absent it is
    ///   sampled uniformly in `[-0.5 * weights_scale, 0.5 * weights_scale)`
    /// * `bias` - Bias `(n_filters,)`; zeros when absent
    /// * `backend` - Convolution kernels
    /// * `rng` - Source of randomness for sampled weights
    pub fn from_parts<R: Rng + ?Sized>(
        config: SequenceConvolutionConfig,
        weights: Option<Array2<f32>>,
        bias: Option<Array1<f32>>,
        backend: B,
        rng: &mut R,
    ) -> Result<Self> {
        config.validate()?;

        let sampled = weights.is_none();
        let weights = weights.unwrap_or_else(|| {
            sampler::centered_uniform(config.weights_shape(), config.weights_scale, rng)
        });
        let bias = bias.unwrap_or_else(|| Array1::zeros(config.n_filters));
        check_parameters(&config, &weights, &bias)?;

        debug!(
            n_in = config.n_in,
            filter_width = config.filter_width,
            n_filters = config.n_filters,
            activation = config.activation.name(),
            l1_penalty_weight = config.l1_penalty_weight,
            l2_penalty_weight = config.l2_penalty_weight,
            sampled,
            "created sequence convolution layer"
        );

        Ok(SequenceConvolutionLayer {
            config,
            weights,
            bias,
            lr_multiplier: [1.0; N_PARAMETERS],
            backend,
        })
    }

    pub fn config(&self) -> &SequenceConvolutionConfig {
        &self.config
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn n_in(&self) -> usize {
        self.config.n_in
    }

    pub fn filter_width(&self) -> usize {
        self.config.filter_width
    }

    pub fn n_filters(&self) -> usize {
        self.config.n_filters
    }

    pub fn weights(&self) -> &Array2<f32> {
        &self.weights
    }

    pub fn bias(&self) -> &Array1<f32> {
        &self.bias
    }

    /// Borrows `(weights, bias)` in gradient order
    pub fn parameters(&self) -> (&Array2<f32>, &Array1<f32>) {
        (&self.weights, &self.bias)
    }

    /// Replaces both parameters, e.g. after an optimizer step
    ///
    /// On a shape mismatch the current parameters are kept.
    pub fn set_parameters(&mut self, weights: Array2<f32>, bias: Array1<f32>) -> Result<()> {
        check_parameters(&self.config, &weights, &bias)?;
        self.weights = weights;
        self.bias = bias;
        debug!("replaced sequence convolution parameters");
        Ok(())
    }

    pub fn set_lr_multiplier(&mut self, lr_multiplier: [f32; N_PARAMETERS]) {
        self.lr_multiplier = lr_multiplier;
    }

    fn check_input(&self, input: &Array3<f32>) -> Result<()> {
        let (batch, n_in, alphabet) = input.dim();
        if (n_in, alphabet) != (self.config.n_in, ALPHABET_SIZE) {
            return Err(LayerError::shape(
                "input",
                (batch, self.config.n_in, ALPHABET_SIZE),
                input.dim(),
            ));
        }
        Ok(())
    }

    fn output_shape(&self, batch: usize) -> (usize, usize, usize) {
        (batch, self.config.n_filters, self.config.n_in)
    }

    /// Subtracts the L1 and L2 weight decay terms from a weight gradient
    fn apply_weight_decay(&self, df_weights: &mut Array2<f32>) {
        let l1 = self.config.l1_penalty_weight;
        if l1 > 0.0 {
            df_weights.scaled_add(-l1, &self.backend.sign(&self.weights));
        }

        let l2 = self.config.l2_penalty_weight;
        if l2 > 0.0 {
            df_weights.scaled_add(-l2, &self.weights);
        }
    }
}

fn check_parameters(
    config: &SequenceConvolutionConfig,
    weights: &Array2<f32>,
    bias: &Array1<f32>,
) -> Result<()> {
    if weights.dim() != config.weights_shape() {
        return Err(LayerError::shape("weights", config.weights_shape(), weights.dim()));
    }
    if bias.len() != config.n_filters {
        return Err(LayerError::shape("bias", (config.n_filters,), (bias.len(),)));
    }
    Ok(())
}

impl<B: ConvolutionBackend> HiddenLayer for SequenceConvolutionLayer<B> {
    type Input = Array3<f32>;
    type Output = Array3<f32>;
    type Gradients = ParameterGradients;
    type InputGradient = Array3<f32>;

    fn n_parameters(&self) -> usize {
        N_PARAMETERS
    }

    fn n_units(&self) -> usize {
        self.config.n_units()
    }

    fn lr_multiplier(&self) -> &[f32] {
        &self.lr_multiplier
    }

    fn l1_penalty(&self) -> f32 {
        self.config.l1_penalty_weight * self.weights.mapv(f32::abs).sum()
    }

    fn l2_penalty(&self) -> f32 {
        self.config.l2_penalty_weight * 0.5 * self.weights.mapv(|w| w * w).sum()
    }

    fn architecture(&self) -> LayerArchitecture {
        LayerArchitecture {
            class: "SequenceConvolutionLayer".to_string(),
            n_in: self.config.n_in,
            n_units: self.config.n_units(),
            activation: self.config.activation,
            l1_penalty_weight: self.config.l1_penalty_weight,
            l2_penalty_weight: self.config.l2_penalty_weight,
            filter_width: Some(self.config.filter_width),
            n_filters: Some(self.config.n_filters),
        }
    }

    /// Forward propagation through the layer
    ///
    /// `prediction` makes no difference here; the layer has no stochastic parts.
    fn feed_forward(&self, input: &Array3<f32>, _prediction: bool) -> Result<Array3<f32>> {
        self.check_input(input)?;

        let mut activations = self.backend.convolve_sequence(input, &self.weights, &self.bias)?;
        self.config.activation.apply_inplace(&mut activations);

        trace!(batch = input.len_of(Axis(0)), "sequence convolution forward");
        Ok(activations)
    }

    fn backprop(
        &self,
        input: &Array3<f32>,
        df_output: &Array3<f32>,
        cache: Option<&Array3<f32>>,
    ) -> Result<(ParameterGradients, Option<Array3<f32>>)> {
        self.check_input(input)?;
        let expected = self.output_shape(input.len_of(Axis(0)));

        let recomputed;
        let activations = match cache {
            Some(activations) => activations,
            None => {
                recomputed = self.feed_forward(input, false)?;
                &recomputed
            }
        };
        if activations.dim() != expected {
            return Err(LayerError::shape("cached activations", expected, activations.dim()));
        }
        if df_output.dim() != expected {
            return Err(LayerError::shape("df_output", expected, df_output.dim()));
        }

        // The cache holds activated values; derivatives are taken from the output
        let activation = self.config.activation;
        let mut delta = activations.mapv(|y| activation.derivative(y));
        delta *= df_output;

        let bias = self.backend.sum_delta(&delta, self.config.n_filters)?;
        let mut weights = self.backend.convolve_sequence_gradient(
            input,
            &delta,
            self.config.filter_width,
            self.config.n_filters,
        )?;
        self.apply_weight_decay(&mut weights);

        trace!(
            batch = expected.0,
            cached = cache.is_some(),
            "sequence convolution backprop"
        );
        Ok((ParameterGradients { weights, bias }, None))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activation::ActivationType;
    use ndarray::array;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn single_symbol_layer(activation: ActivationType) -> SequenceConvolutionLayer {
        SequenceConvolutionLayer::with_parameters(
            SequenceConvolutionConfig::new(1, 1, 1).with_activation(activation),
            array![[1.0_f32, 0.0, 0.0, 0.0]],
            array![0.0_f32],
            CpuBackend,
        )
        .unwrap()
    }

    #[test]
    fn test_single_symbol_forward_and_backprop() {
        let layer = single_symbol_layer(ActivationType::Linear);
        let input = array![[[1.0_f32, 0.0, 0.0, 0.0]]];

        let activations = layer.feed_forward(&input, false).unwrap();
        assert_eq!(activations, array![[[1.0_f32]]]);

        let (grads, input_grad) = layer
            .backprop(&input, &array![[[1.0_f32]]], Some(&activations))
            .unwrap();
        assert_eq!(grads.bias, array![1.0_f32]);
        assert_eq!(grads.weights, array![[1.0_f32, 0.0, 0.0, 0.0]]);
        assert!(input_grad.is_none());
    }

    #[test]
    fn test_sampled_parameters_shape_and_range() {
        let config = SequenceConvolutionConfig::new(20, 5, 3).with_weights_scale(0.5);
        let layer =
            SequenceConvolutionLayer::with_rng(config, CpuBackend, &mut StdRng::seed_from_u64(1))
                .unwrap();

        assert_eq!(layer.weights().dim(), (3, 20));
        assert_eq!(layer.bias().dim(), 3);
        assert!(layer.bias().iter().all(|&b| b == 0.0));
        assert!(layer.weights().iter().all(|&w| (-0.25..0.25).contains(&w)));
        assert_eq!(layer.n_units(), 60);
        assert_eq!(layer.n_parameters(), 2);
        assert_eq!(layer.lr_multiplier(), &[1.0_f32, 1.0]);
    }

    #[test]
    fn test_supplied_parameter_shape_errors() {
        let config = SequenceConvolutionConfig::new(10, 2, 3);

        let result = SequenceConvolutionLayer::with_parameters(
            config.clone(),
            Array2::zeros((3, 4)),
            Array1::zeros(3),
            CpuBackend,
        );
        assert!(matches!(result, Err(LayerError::Shape { what: "weights", .. })));

        let result = SequenceConvolutionLayer::with_parameters(
            config,
            Array2::zeros((3, 8)),
            Array1::zeros(2),
            CpuBackend,
        );
        assert!(matches!(result, Err(LayerError::Shape { what: "bias", .. })));
    }

    #[test]
    fn test_set_parameters_keeps_old_values_on_error() {
        let mut layer = single_symbol_layer(ActivationType::Sigmoid);
        assert!(layer
            .set_parameters(Array2::zeros((1, 8)), Array1::zeros(1))
            .is_err());
        assert_eq!(layer.weights(), &array![[1.0_f32, 0.0, 0.0, 0.0]]);

        layer
            .set_parameters(array![[0.0_f32, 2.0, 0.0, 0.0]], array![0.5_f32])
            .unwrap();
        assert_eq!(layer.parameters(), (&array![[0.0_f32, 2.0, 0.0, 0.0]], &array![0.5_f32]));
    }

    #[test]
    fn test_input_shape_errors() {
        let layer = single_symbol_layer(ActivationType::Sigmoid);
        let wrong_length = Array3::<f32>::zeros((1, 2, 4));
        assert!(matches!(
            layer.feed_forward(&wrong_length, false),
            Err(LayerError::Shape { what: "input", .. })
        ));

        let input = array![[[1.0_f32, 0.0, 0.0, 0.0]]];
        let wrong_df = Array3::<f32>::zeros((1, 2, 1));
        assert!(matches!(
            layer.backprop(&input, &wrong_df, None),
            Err(LayerError::Shape { what: "df_output", .. })
        ));

        let wrong_cache = Array3::<f32>::zeros((2, 1, 1));
        assert!(matches!(
            layer.backprop(&input, &array![[[1.0_f32]]], Some(&wrong_cache)),
            Err(LayerError::Shape { what: "cached activations", .. })
        ));
    }

    #[test]
    fn test_penalties() {
        let layer = SequenceConvolutionLayer::with_parameters(
            SequenceConvolutionConfig::new(3, 1, 1)
                .with_l1_penalty(0.5)
                .with_l2_penalty(2.0),
            array![[1.0_f32, -2.0, 0.0, 3.0]],
            array![0.0_f32],
            CpuBackend,
        )
        .unwrap();

        assert!((layer.l1_penalty() - 3.0).abs() < 1e-6);
        assert!((layer.l2_penalty() - 14.0).abs() < 1e-5);
    }

    #[test]
    fn test_architecture() {
        let layer = single_symbol_layer(ActivationType::Tanh);
        let architecture = layer.architecture();
        assert_eq!(architecture.class, "SequenceConvolutionLayer");
        assert_eq!(architecture.n_units, 1);
        assert_eq!(architecture.activation, ActivationType::Tanh);
        assert_eq!(architecture.filter_width, Some(1));
        assert_eq!(architecture.n_filters, Some(1));
    }
}
