use thiserror::Error;

/// Result type alias for this crate
pub type Result<T> = std::result::Result<T, LayerError>;

/// Errors raised while building or running a layer
#[derive(Error, Debug)]
pub enum LayerError {
    /// A tensor does not have the shape the layer configuration implies
    #[error("Shape mismatch for {what}: expected {expected}, got {got}")]
    Shape {
        what: &'static str,
        expected: String,
        got: String,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Character outside the nucleotide alphabet
    #[error("Invalid symbol {symbol:?} at position {position}")]
    InvalidSymbol { symbol: char, position: usize },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl LayerError {
    pub(crate) fn shape(what: &'static str, expected: impl std::fmt::Debug, got: impl std::fmt::Debug) -> Self {
        LayerError::Shape {
            what,
            expected: format!("{:?}", expected),
            got: format!("{:?}", got),
        }
    }
}
