//! Error types for the Tickwire logic simulator.
//!
//! This module provides a unified error type [`SimError`] that covers
//! structural violations in the circuit graph, save/load failures and
//! rejected user input.

use thiserror::Error;

use crate::circuit::{CircuitId, PinRef};

/// Result type alias using [`SimError`].
pub type Result<T> = std::result::Result<T, SimError>;

/// Unified error type for all Tickwire operations.
#[derive(Error, Debug)]
pub enum SimError {
    // ============ Structural Errors ============
    /// Circuit id is not attached to the simulation
    #[error("Circuit #{id} not found in simulation")]
    CircuitNotFound { id: CircuitId },

    /// Pin id is not present on the circuit
    #[error("Pin '{pin}' not found on circuit #{circuit}")]
    PinNotFound { circuit: CircuitId, pin: String },

    /// Two linked pins ended up in different networks during a rebuild
    #[error("Linked pins {from} and {to} were assigned to different networks")]
    NetworkConflict { from: PinRef, to: PinRef },

    /// A link points at a pin that no longer exists
    #[error("Pin {from} is linked to missing pin {to}")]
    DanglingLink { from: PinRef, to: PinRef },

    // ============ Save Errors ============
    /// Save was written by a newer format version
    #[error("Cannot load save version {found}, newest supported version is {supported}")]
    UnsupportedVersion { found: u32, supported: u32 },

    /// Missing or malformed field in a save
    #[error("Invalid save: {message}")]
    InvalidSave { message: String },

    /// Circuit type name not known to the registry
    #[error("Unknown circuit type '{type_name}'")]
    UnknownCircuitType { type_name: String },

    /// Save document is not valid JSON for the expected shape
    #[error("Save serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// Compressed save text could not be decoded
    #[error("Failed to decompress save data")]
    Decompression,

    // ============ User Input Errors ============
    /// Colour string could not be parsed
    #[error("Invalid color '{color}'")]
    InvalidColor { color: String },

    /// Logic gate pin count change was refused
    #[error("Cannot change pin count of circuit #{circuit} to {requested}: {message}")]
    PinCountRejected {
        circuit: CircuitId,
        requested: usize,
        message: String,
    },

    /// Parameter value outside its accepted range
    #[error("Invalid parameter '{param}': {message}")]
    InvalidParameter { param: String, message: String },

    /// Operation requires a different circuit variant
    #[error("Circuit #{circuit} is a '{found}', expected '{expected}'")]
    WrongCircuitType {
        circuit: CircuitId,
        expected: &'static str,
        found: &'static str,
    },

    // ============ I/O Errors ============
    /// Error reading a save file
    #[error("Failed to read save file '{path}': {source}")]
    FileReadError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Error writing a save file
    #[error("Failed to write save file '{path}': {source}")]
    FileWriteError {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl SimError {
    /// Create an invalid save error
    pub fn invalid_save(message: impl Into<String>) -> Self {
        Self::InvalidSave {
            message: message.into(),
        }
    }

    /// Create a pin not found error
    pub fn pin_not_found(circuit: CircuitId, pin: impl Into<String>) -> Self {
        Self::PinNotFound {
            circuit,
            pin: pin.into(),
        }
    }

    /// Create an invalid parameter error
    pub fn invalid_parameter(param: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidParameter {
            param: param.into(),
            message: message.into(),
        }
    }

    /// Create a rejected pin count error
    pub fn pin_count_rejected(circuit: CircuitId, requested: usize, message: impl Into<String>) -> Self {
        Self::PinCountRejected {
            circuit,
            requested,
            message: message.into(),
        }
    }
}
