//! Error type for model construction and encoding.

use crate::video::VideoQuality;

/// Errors raised at the model boundary.
///
/// Missing participant data is not an error: extraction reports it as `None`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModelError {
    /// A quality range whose lower bound is above its upper bound.
    #[error("Invalid quality range: {min:?} is above {max:?}")]
    InvalidQualityRange {
        /// Requested lower bound.
        min: VideoQuality,
        /// Requested upper bound.
        max: VideoQuality,
    },

    /// Snapshot could not be encoded.
    #[error("Encode error: {0}")]
    Encode(String),

    /// Bytes could not be decoded into a snapshot.
    #[error("Decode error: {0}")]
    Decode(String),
}
