//! Save document structures.

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::components::CircuitType;
use crate::error::{Result, SimError};

/// One link: `[from circuit, from pin, to circuit, to pin]`.
pub type SaveConnection = (u32, String, u32, String);

/// A whole simulation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveSimulation {
    pub version: u32,
    pub world_width: f64,
    pub world_height: f64,
    /// Circuits keyed by their (dense, 1-based) id
    pub circuits: BTreeMap<u32, SaveCircuit>,
    /// Each undirected link once, from its lower id endpoint
    pub connections: Vec<SaveConnection>,
    /// Tick counter, only present when state is included
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tick: Option<u64>,
}

/// One circuit.
///
/// Variant parameters (such as `toggle`, `color` or `pinCount`) sit next to the
/// common fields in the same object and are collected in `params`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveCircuit {
    pub x: f64,
    pub y: f64,
    /// Rotation in degrees, omitted when zero
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub r: Option<f64>,
    #[serde(rename = "type")]
    pub circuit_type: String,
    #[serde(rename = "invertedPins", default, skip_serializing_if = "Vec::is_empty")]
    pub inverted_pins: Vec<String>,
    /// Runtime state, only present when state is included
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<Value>,
    #[serde(flatten)]
    pub params: Map<String, Value>,
}

/// Serialize a parameter struct into flat save fields.
pub(crate) fn to_fields<T: Serialize>(params: &T) -> Result<Map<String, Value>> {
    match serde_json::to_value(params)? {
        Value::Object(map) => Ok(map),
        other => Err(SimError::invalid_save(format!(
            "expected parameter object, got {other}"
        ))),
    }
}

/// Read a parameter struct from flat save fields. Unrelated fields are ignored.
pub(crate) fn from_fields<T: DeserializeOwned>(
    circuit_type: CircuitType,
    fields: &Map<String, Value>,
) -> Result<T> {
    T::deserialize(Value::Object(fields.clone()))
        .map_err(|e| SimError::invalid_save(format!("{circuit_type}: {e}")))
}

/// Read a variant's state record.
pub(crate) fn from_state<T: DeserializeOwned>(circuit_type: CircuitType, state: &Value) -> Result<T> {
    T::deserialize(state)
        .map_err(|e| SimError::invalid_save(format!("{circuit_type} state: {e}")))
}
