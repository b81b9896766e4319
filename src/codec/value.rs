// Copyright 2026 Qutrials Contributors
// SPDX-License-Identifier: Apache-2.0

//! Wire codec for individual heterogeneous values.
//!
//! Every value a trial can carry belongs to the closed kind set in
//! [`TypedValue`]. Scalars pass through as plain JSON; structured kinds are
//! wrapped in a `{"__type__": ..., "__value__": ...}` object so the decoder
//! can dispatch without guessing. An unrecognized discriminator fails the
//! decode rather than dropping data.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use num_complex::Complex64;
use serde_json::{json, Value};

use crate::error::{Error, Result};
use crate::types::{Artifact, Circuit, NumericArray, Operator};

/// Discriminator key in tagged wire objects.
pub const TYPE_KEY: &str = "__type__";
/// Payload key in tagged wire objects.
pub const VALUE_KEY: &str = "__value__";

/// Discriminator for circuit payloads.
pub const CIRCUIT_TAG: &str = "QuantumCircuit";
/// Discriminator for operator payloads.
pub const OPERATOR_TAG: &str = "Operator";
/// Discriminator for numeric array payloads.
pub const ARRAY_TAG: &str = "Array";
/// Discriminator for opaque binary artifacts.
pub const ARTIFACT_TAG: &str = "Artifact";
/// Sentinel discriminator for a storage backend handle. The handle itself is
/// never serialized; decoding yields a placeholder and the caller re-binds.
pub const STORAGE_REF_TAG: &str = "StorageBackendRef";

/// A value paired with its declared kind.
#[derive(Debug, Clone, PartialEq)]
pub enum TypedValue {
    /// Plain string scalar
    Str(String),
    /// Integer scalar
    Int(i64),
    /// Floating-point scalar
    Float(f64),
    /// Quantum circuit payload
    Circuit(Circuit),
    /// Linear operator payload
    Operator(Operator),
    /// Numeric array payload
    Array(NumericArray),
    /// Opaque binary blob
    Blob(Vec<u8>),
    /// Storage backend handle sentinel
    StorageRef,
}

impl TypedValue {
    /// Kind name used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            TypedValue::Str(_) => "string",
            TypedValue::Int(_) => "int",
            TypedValue::Float(_) => "float",
            TypedValue::Circuit(_) => CIRCUIT_TAG,
            TypedValue::Operator(_) => OPERATOR_TAG,
            TypedValue::Array(_) => ARRAY_TAG,
            TypedValue::Blob(_) => ARTIFACT_TAG,
            TypedValue::StorageRef => STORAGE_REF_TAG,
        }
    }

    /// Encode into the JSON-safe wire representation.
    pub fn to_wire(&self) -> Value {
        match self {
            TypedValue::Str(s) => Value::String(s.clone()),
            TypedValue::Int(v) => json!(v),
            TypedValue::Float(v) => json!(v),
            TypedValue::Circuit(circuit) => json!({
                "__type__": CIRCUIT_TAG,
                "__value__": circuit.qasm(),
            }),
            TypedValue::Operator(operator) => {
                let (rows, cols) = operator.dims();
                let data: Vec<Value> = operator
                    .matrix()
                    .iter()
                    .map(|c| json!([c.re, c.im]))
                    .collect();
                json!({
                    "__type__": OPERATOR_TAG,
                    "__value__": { "dims": [rows, cols], "data": data },
                })
            }
            TypedValue::Array(array) => json!({
                "__type__": ARRAY_TAG,
                "__value__": {
                    "shape": array.shape(),
                    "data": array.values().iter().copied().collect::<Vec<f64>>(),
                },
            }),
            TypedValue::Blob(bytes) => json!({
                "__type__": ARTIFACT_TAG,
                "__value__": BASE64.encode(bytes),
            }),
            TypedValue::StorageRef => json!({ "__type__": STORAGE_REF_TAG }),
        }
    }

    /// Decode from the wire representation.
    ///
    /// Raw scalars pass through; tagged objects dispatch on `__type__`.
    /// A JSON kind outside the codec's enumeration (bool, null, bare array,
    /// untagged object) fails with [`Error::UnsupportedType`]; a tag without
    /// a decoder fails with [`Error::UnknownDiscriminator`].
    pub fn from_wire(value: &Value) -> Result<Self> {
        match value {
            Value::String(s) => Ok(TypedValue::Str(s.clone())),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Ok(TypedValue::Int(i))
                } else {
                    n.as_f64()
                        .map(TypedValue::Float)
                        .ok_or_else(|| Error::UnsupportedType("number".into()))
                }
            }
            Value::Object(map) => {
                let tag = match map.get(TYPE_KEY).and_then(Value::as_str) {
                    Some(tag) => tag,
                    None => return Err(Error::UnsupportedType("object".into())),
                };
                match tag {
                    CIRCUIT_TAG => {
                        let qasm = payload_str(map, CIRCUIT_TAG)?;
                        Ok(TypedValue::Circuit(Circuit::from_qasm(qasm)))
                    }
                    OPERATOR_TAG => decode_operator(map),
                    ARRAY_TAG => decode_array(map),
                    ARTIFACT_TAG => {
                        let encoded = payload_str(map, ARTIFACT_TAG)?;
                        let bytes = BASE64.decode(encoded).map_err(|e| {
                            Error::Serialization(format!("invalid base64 in artifact: {}", e))
                        })?;
                        Ok(TypedValue::Blob(bytes))
                    }
                    STORAGE_REF_TAG => Ok(TypedValue::StorageRef),
                    other => Err(Error::UnknownDiscriminator(other.to_string())),
                }
            }
            other => Err(Error::UnsupportedType(json_kind(other).into())),
        }
    }
}

fn payload_str<'a>(map: &'a serde_json::Map<String, Value>, tag: &str) -> Result<&'a str> {
    map.get(VALUE_KEY).and_then(Value::as_str).ok_or_else(|| {
        Error::Serialization(format!("{} payload must be a string", tag))
    })
}

#[derive(serde::Deserialize)]
struct OperatorWire {
    dims: [usize; 2],
    data: Vec<[f64; 2]>,
}

fn decode_operator(map: &serde_json::Map<String, Value>) -> Result<TypedValue> {
    let payload = map
        .get(VALUE_KEY)
        .cloned()
        .ok_or_else(|| Error::Serialization("Operator payload missing".into()))?;
    let wire: OperatorWire = serde_json::from_value(payload)
        .map_err(|e| Error::Serialization(format!("malformed Operator payload: {}", e)))?;
    let entries: Vec<Complex64> = wire
        .data
        .iter()
        .map(|[re, im]| Complex64::new(*re, *im))
        .collect();
    let operator = Operator::from_flat(wire.dims[0], wire.dims[1], entries)?;
    Ok(TypedValue::Operator(operator))
}

#[derive(serde::Deserialize)]
struct ArrayWire {
    shape: Vec<usize>,
    data: Vec<f64>,
}

fn decode_array(map: &serde_json::Map<String, Value>) -> Result<TypedValue> {
    let payload = map
        .get(VALUE_KEY)
        .cloned()
        .ok_or_else(|| Error::Serialization("Array payload missing".into()))?;
    let wire: ArrayWire = serde_json::from_value(payload)
        .map_err(|e| Error::Serialization(format!("malformed Array payload: {}", e)))?;
    let array = NumericArray::from_shape_vec(wire.shape, wire.data)?;
    Ok(TypedValue::Array(array))
}

/// JSON kind name for error messages.
fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Encode an [`Artifact`] to its wire form.
pub fn artifact_to_wire(artifact: &Artifact) -> Value {
    match artifact {
        Artifact::Bytes(bytes) => TypedValue::Blob(bytes.clone()).to_wire(),
        Artifact::StorageRef => TypedValue::StorageRef.to_wire(),
    }
}
