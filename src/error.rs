use thiserror::Error;

use crate::algorithm::AlgorithmId;

#[derive(Debug, Error)]
pub enum PaletteError {
    #[error("unable to decode image: {0}")]
    DecodeUnavailable(String),

    #[error("pixel buffer length {len} does not match dimensions {width}x{height}")]
    InvalidBuffer { len: usize, width: u32, height: u32 },

    #[error("invalid hex color `{0}`")]
    InvalidHex(String),

    #[error("target count must be at least 1, got {0}")]
    InvalidTargetCount(u32),

    #[error("unknown extraction algorithm `{0}`")]
    UnknownAlgorithm(String),

    #[error("unknown color format `{0}`, expected hex, rgb or hsl")]
    UnknownFormat(String),

    #[error("{algorithm} extraction failed: {reason}")]
    AlgorithmFailure {
        algorithm: AlgorithmId,
        reason: String,
    },

    #[error("no usable colors found with {algorithm}")]
    EmptyPalette { algorithm: AlgorithmId },
}

impl PaletteError {
    pub(crate) fn failure(algorithm: AlgorithmId, reason: impl Into<String>) -> Self {
        Self::AlgorithmFailure {
            algorithm,
            reason: reason.into(),
        }
    }
}

pub type Result<T, E = PaletteError> = std::result::Result<T, E>;
