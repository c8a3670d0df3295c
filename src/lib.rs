mod activation;
mod config;
mod error;
mod sampler;

pub mod backend;
pub mod encoding;
pub mod layers;

pub use activation::ActivationType;
pub use backend::{ConvolutionBackend, CpuBackend, ALPHABET_SIZE};
pub use config::SequenceConvolutionConfig;
pub use error::{LayerError, Result};
pub use layers::{HiddenLayer, LayerArchitecture, ParameterGradients, SequenceConvolutionLayer};
pub use sampler::gen_uniform;
