//! Error types for the control path and preset handling.
//!
//! The audio path has no error states: inputs reaching it are already
//! clamped, and caller bugs (bad indices, bad notes) panic.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while sending control changes to the audio thread.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ControlError {
    /// The message ring is full; the audio thread is not draining it
    #[error("control queue is full")]
    QueueFull,

    /// A note number outside the MIDI range 0..=127
    #[error("MIDI note out of range: {0}")]
    InvalidNote(u8),
}

/// Errors raised by preset sources and the preset library.
#[derive(Debug, Error)]
pub enum PresetError {
    /// Failed to read or write a preset file
    #[error("preset i/o failed for '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A preset file could not be decoded
    #[cfg(feature = "serde")]
    #[error("failed to parse preset '{path}': {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A preset could not be encoded
    #[cfg(feature = "serde")]
    #[error("failed to serialize preset: {0}")]
    Serialize(#[source] serde_json::Error),

    #[error("preset not found: {0}")]
    NotFound(String),

    #[error("invalid preset: {0}")]
    Invalid(String),
}

impl PresetError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        PresetError::Io {
            path: path.into(),
            source,
        }
    }
}
