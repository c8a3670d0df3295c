use ndarray::{ArrayBase, DataMut, Dimension};
use serde::{Deserialize, Serialize};

/// Enum representing different activation function types
///
/// Every variant has a derivative that can be written in terms of its own
/// output, so `derivative` takes the activated value rather than the
/// pre-activation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivationType {
    #[default]
    Sigmoid,
    Tanh,
    #[serde(rename = "relu")]
    ReLU,
    #[serde(alias = "identity")]
    Linear,
}

impl ActivationType {
    /// Applies the activation function to a given input
    pub fn apply(&self, x: f32) -> f32 {
        match self {
            ActivationType::Sigmoid => 1.0 / (1.0 + (-x).exp()),
            ActivationType::Tanh => x.tanh(),
            ActivationType::ReLU => x.max(0.0),
            ActivationType::Linear => x,
        }
    }

    /// Computes the derivative of the activation function from its output `y`
    pub fn derivative(&self, y: f32) -> f32 {
        match self {
            ActivationType::Sigmoid => y * (1.0 - y),
            ActivationType::Tanh => 1.0 - y * y,
            ActivationType::ReLU => if y > 0.0 { 1.0 } else { 0.0 },
            ActivationType::Linear => 1.0,
        }
    }

    /// Applies the activation function element-wise, overwriting `values`
    pub fn apply_inplace<S, D>(&self, values: &mut ArrayBase<S, D>)
    where
        S: DataMut<Elem = f32>,
        D: Dimension,
    {
        if *self != ActivationType::Linear {
            values.mapv_inplace(|x| self.apply(x));
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ActivationType::Sigmoid => "sigmoid",
            ActivationType::Tanh => "tanh",
            ActivationType::ReLU => "relu",
            ActivationType::Linear => "linear",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use std::f32::EPSILON;

    #[test]
    fn test_activation_functions() {
        // Sigmoid tests
        assert!((ActivationType::Sigmoid.apply(0.0) - 0.5).abs() < EPSILON);

        // ReLU tests
        assert_eq!(ActivationType::ReLU.apply(-1.0), 0.0);
        assert_eq!(ActivationType::ReLU.apply(2.0), 2.0);

        // Tanh tests
        assert!((ActivationType::Tanh.apply(0.0)).abs() < EPSILON);

        // Linear tests
        assert_eq!(ActivationType::Linear.apply(5.0), 5.0);
    }

    #[test]
    fn test_activation_derivatives() {
        // Sigmoid derivative at sigmoid(0) = 0.5
        assert!((ActivationType::Sigmoid.derivative(0.5) - 0.25).abs() < EPSILON);

        // ReLU derivative
        assert_eq!(ActivationType::ReLU.derivative(0.0), 0.0);
        assert_eq!(ActivationType::ReLU.derivative(2.0), 1.0);

        // Tanh derivative at tanh(0) = 0
        assert!((ActivationType::Tanh.derivative(0.0) - 1.0).abs() < EPSILON);

        // Linear derivative
        assert_eq!(ActivationType::Linear.derivative(5.0), 1.0);
    }

    #[test]
    fn test_derivative_matches_finite_difference() {
        let h = 1e-3_f32;
        for activation in [ActivationType::Sigmoid, ActivationType::Tanh] {
            for x in [-1.5_f32, -0.2, 0.3, 2.0] {
                let numeric = (activation.apply(x + h) - activation.apply(x - h)) / (2.0 * h);
                let analytic = activation.derivative(activation.apply(x));
                assert!(
                    (numeric - analytic).abs() < 1e-3,
                    "{:?} at {}: {} vs {}", activation, x, numeric, analytic
                );
            }
        }
    }

    #[test]
    fn test_apply_inplace() {
        let mut values = array![[-1.0_f32, 0.0], [2.0, -3.0]];
        ActivationType::ReLU.apply_inplace(&mut values);
        assert_eq!(values, array![[0.0, 0.0], [2.0, 0.0]]);
    }

    #[test]
    fn test_serde_names() {
        let parsed: ActivationType = serde_json::from_str("\"relu\"").unwrap();
        assert_eq!(parsed, ActivationType::ReLU);
        let parsed: ActivationType = serde_json::from_str("\"identity\"").unwrap();
        assert_eq!(parsed, ActivationType::Linear);
        assert_eq!(serde_json::to_string(&ActivationType::Tanh).unwrap(), "\"tanh\"");
    }
}
