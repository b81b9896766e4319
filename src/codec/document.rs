// Copyright 2026 Qutrials Contributors
// SPDX-License-Identifier: Apache-2.0

//! Whole-trial document codec.
//!
//! A trial persists as exactly one JSON object: `uuid`/`name`/`description`
//! as plain strings, `tags` as an array of strings, and every other
//! collection as an array of `[name, encoded_value]` pairs with each value
//! passed through the typed-value codec. The storage binding is excluded
//! from the document entirely, and decoding always produces an unbound
//! trial so a loaded record can never write back to its origin by accident.

use serde_json::{json, Map, Value};
use uuid::Uuid;

use crate::codec::value::{artifact_to_wire, TypedValue, ARTIFACT_TAG, CIRCUIT_TAG};
use crate::error::{Error, Result};
use crate::trial::Trial;
use crate::types::{Artifact, Circuit, MetricValue, NumericArray, Operator};

/// Encode a trial into its JSON document.
pub fn encode(trial: &Trial) -> Value {
    json!({
        "uuid": trial.uuid().to_string(),
        "name": trial.name(),
        "description": trial.description(),
        "tags": trial.tags(),
        "metrics": encode_pairs(trial.metrics(), metric_to_wire),
        "parameters": encode_pairs(trial.parameters(), |v| Value::String(v.clone())),
        "circuits": encode_pairs(trial.circuits(), |c| {
            TypedValue::Circuit(c.clone()).to_wire()
        }),
        "operators": encode_pairs(trial.operators(), |o| {
            TypedValue::Operator(o.clone()).to_wire()
        }),
        "arrays": encode_pairs(trial.arrays(), |a| TypedValue::Array(a.clone()).to_wire()),
        "artifacts": encode_pairs(trial.artifacts(), artifact_to_wire),
        "texts": encode_pairs(trial.texts(), |v| Value::String(v.clone())),
        "versions": encode_pairs(trial.versions(), |v| Value::String(v.clone())),
    })
}

/// Encode a trial to pretty-printed JSON bytes.
pub fn to_json_bytes(trial: &Trial) -> Result<Vec<u8>> {
    Ok(serde_json::to_vec_pretty(&encode(trial))?)
}

/// Decode a trial from its JSON document.
///
/// Fields absent from the document take their constructor defaults. A
/// backend-assigned `id` property is ignored; `uuid` is retained when
/// present. The returned trial is bound to no storage backend.
pub fn decode(document: &Value) -> Result<Trial> {
    let map = document
        .as_object()
        .ok_or_else(|| Error::Serialization("trial document must be a JSON object".into()))?;

    let name = optional_str(map, "name")?.unwrap_or_default();
    let mut trial = Trial::new(name);

    if let Some(raw) = optional_str(map, "uuid")? {
        trial.uuid = Uuid::parse_str(&raw)
            .map_err(|e| Error::Serialization(format!("invalid uuid: {}", e)))?;
    }
    if let Some(description) = optional_str(map, "description")? {
        trial.description = description;
    }

    trial.tags = decode_tags(map)?;
    trial.metrics = decode_pairs(map, "metrics", expect_metric)?;
    trial.parameters = decode_pairs(map, "parameters", expect_string)?;
    trial.circuits = decode_pairs(map, "circuits", expect_circuit)?;
    trial.operators = decode_pairs(map, "operators", expect_operator)?;
    trial.arrays = decode_pairs(map, "arrays", expect_array)?;
    trial.artifacts = decode_pairs(map, "artifacts", expect_artifact)?;
    trial.texts = decode_pairs(map, "texts", expect_string)?;
    trial.versions = decode_pairs(map, "versions", expect_string)?;

    Ok(trial)
}

/// Decode a trial from raw JSON bytes.
pub fn from_json_bytes(bytes: &[u8]) -> Result<Trial> {
    let document: Value = serde_json::from_slice(bytes)?;
    decode(&document)
}

fn encode_pairs<T>(items: &[(String, T)], encode_value: impl Fn(&T) -> Value) -> Value {
    Value::Array(
        items
            .iter()
            .map(|(name, value)| json!([name, encode_value(value)]))
            .collect(),
    )
}

fn optional_str(map: &Map<String, Value>, field: &str) -> Result<Option<String>> {
    match map.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(Error::Serialization(format!(
            "{} must be a string",
            field
        ))),
    }
}

fn decode_tags(map: &Map<String, Value>) -> Result<Vec<String>> {
    let Some(value) = map.get("tags") else {
        return Ok(Vec::new());
    };
    let items = value
        .as_array()
        .ok_or_else(|| Error::Serialization("tags must be an array".into()))?;
    items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            item.as_str()
                .map(str::to_string)
                .ok_or_else(|| Error::Serialization(format!("tags[{}] must be a string", i)))
        })
        .collect()
}

fn decode_pairs<T>(
    map: &Map<String, Value>,
    field: &str,
    decode_value: impl Fn(&str, &Value) -> Result<T>,
) -> Result<Vec<(String, T)>> {
    let Some(value) = map.get(field) else {
        return Ok(Vec::new());
    };
    let items = value
        .as_array()
        .ok_or_else(|| Error::Serialization(format!("{} must be an array", field)))?;

    let mut decoded = Vec::with_capacity(items.len());
    for (i, item) in items.iter().enumerate() {
        let context = format!("{}[{}]", field, i);
        let pair = item
            .as_array()
            .filter(|pair| pair.len() == 2)
            .ok_or_else(|| {
                Error::Serialization(format!("{} must be a [name, value] pair", context))
            })?;
        let name = pair[0].as_str().ok_or_else(|| {
            Error::Serialization(format!("{} name must be a string", context))
        })?;
        decoded.push((name.to_string(), decode_value(&context, &pair[1])?));
    }
    Ok(decoded)
}

fn expect_metric(context: &str, wire: &Value) -> Result<MetricValue> {
    match TypedValue::from_wire(wire)? {
        TypedValue::Int(v) => Ok(MetricValue::Int(v)),
        TypedValue::Float(v) => Ok(MetricValue::Float(v)),
        other => Err(Error::Serialization(format!(
            "{}: expected a number, found {}",
            context,
            other.kind()
        ))),
    }
}

fn expect_string(context: &str, wire: &Value) -> Result<String> {
    match TypedValue::from_wire(wire)? {
        TypedValue::Str(s) => Ok(s),
        other => Err(Error::Serialization(format!(
            "{}: expected a string, found {}",
            context,
            other.kind()
        ))),
    }
}

fn expect_circuit(context: &str, wire: &Value) -> Result<Circuit> {
    match TypedValue::from_wire(wire)? {
        TypedValue::Circuit(circuit) => Ok(circuit),
        other => Err(Error::Serialization(format!(
            "{}: expected {}, found {}",
            context,
            CIRCUIT_TAG,
            other.kind()
        ))),
    }
}

fn expect_operator(context: &str, wire: &Value) -> Result<Operator> {
    match TypedValue::from_wire(wire)? {
        TypedValue::Operator(operator) => Ok(operator),
        other => Err(Error::Serialization(format!(
            "{}: expected Operator, found {}",
            context,
            other.kind()
        ))),
    }
}

fn expect_array(context: &str, wire: &Value) -> Result<NumericArray> {
    match TypedValue::from_wire(wire)? {
        TypedValue::Array(array) => Ok(array),
        other => Err(Error::Serialization(format!(
            "{}: expected Array, found {}",
            context,
            other.kind()
        ))),
    }
}

fn expect_artifact(context: &str, wire: &Value) -> Result<Artifact> {
    match TypedValue::from_wire(wire)? {
        TypedValue::Blob(bytes) => Ok(Artifact::Bytes(bytes)),
        TypedValue::StorageRef => Ok(Artifact::StorageRef),
        other => Err(Error::Serialization(format!(
            "{}: expected {}, found {}",
            context,
            ARTIFACT_TAG,
            other.kind()
        ))),
    }
}

fn metric_to_wire(value: &MetricValue) -> Value {
    match value {
        MetricValue::Int(v) => json!(v),
        MetricValue::Float(v) => json!(v),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use num_complex::Complex64;
    use std::sync::Arc;

    use crate::test_utils::MemoryStorage;

    fn populated_trial() -> Trial {
        let mut trial = Trial::new("bell-state");
        trial.set_description("entanglement witness sweep");
        trial.add_tag("quantum");
        trial.add_tag("bell");
        trial.add_metric("qubits", 2);
        trial.add_metric("fidelity", 0.97);
        trial.add_parameter("OS", "Ubuntu");
        trial.add_circuit(
            "bell",
            Circuit::from_qasm("OPENQASM 3.0;\nqubit[2] q;\nh q[0];\ncx q[0], q[1];"),
        );
        trial.add_operator(
            "X",
            Operator::new(array![
                [Complex64::new(0.0, 0.0), Complex64::new(1.0, 0.0)],
                [Complex64::new(1.0, 0.0), Complex64::new(0.0, 0.0)],
            ]),
        );
        trial.add_array(
            "counts",
            NumericArray::from_shape_vec(vec![2, 2], vec![480.0, 20.0, 12.0, 488.0]).unwrap(),
        );
        trial.add_artifact("logo", Artifact::from_bytes(vec![0x89, 0x50, 0x4E, 0x47]));
        trial.add_text("notes", "ran on the evening calibration");
        trial.add_version("qutrials", "0.1.0");
        trial
    }

    #[test]
    fn test_round_trip_preserves_every_field() {
        let trial = populated_trial();
        let recovered = decode(&encode(&trial)).unwrap();
        assert_eq!(recovered, trial);
        assert_eq!(recovered.uuid(), trial.uuid());
    }

    #[test]
    fn test_round_trip_through_bytes() {
        let trial = populated_trial();
        let bytes = to_json_bytes(&trial).unwrap();
        let recovered = from_json_bytes(&bytes).unwrap();
        assert_eq!(recovered, trial);
    }

    #[test]
    fn test_storage_binding_is_excluded_from_document() {
        let mut trial = populated_trial();
        trial.bind(Arc::new(MemoryStorage::new()));

        let document = encode(&trial);
        let keys: Vec<&String> = document.as_object().unwrap().keys().collect();
        assert!(!keys.iter().any(|k| k.contains("storage")));

        let recovered = decode(&document).unwrap();
        assert!(recovered.storage().is_none());
    }

    #[test]
    fn test_empty_collections_encode_to_empty_arrays() {
        let document = encode(&Trial::new("empty"));
        assert_eq!(document["metrics"], json!([]));
        assert_eq!(document["artifacts"], json!([]));
        assert_eq!(document["tags"], json!([]));

        let recovered = decode(&document).unwrap();
        assert!(recovered.metrics().is_empty());
        assert!(recovered.artifacts().is_empty());
    }

    #[test]
    fn test_absent_fields_take_defaults() {
        let recovered = decode(&json!({ "name": "sparse" })).unwrap();
        assert_eq!(recovered.name(), "sparse");
        assert_eq!(recovered.description(), "");
        assert!(recovered.metrics().is_empty());
        assert!(recovered.tags().is_empty());
    }

    #[test]
    fn test_backend_assigned_id_is_ignored_and_uuid_retained() {
        let trial = populated_trial();
        let mut document = encode(&trial);
        document["id"] = json!(42);

        let recovered = decode(&document).unwrap();
        assert_eq!(recovered.uuid(), trial.uuid());
        assert_eq!(recovered, trial);
    }

    #[test]
    fn test_non_object_document_fails() {
        assert!(matches!(
            decode(&json!([1, 2, 3])),
            Err(Error::Serialization(_))
        ));
    }

    #[test]
    fn test_invalid_uuid_fails() {
        let result = decode(&json!({ "name": "t", "uuid": "not-a-uuid" }));
        assert!(matches!(result, Err(Error::Serialization(_))));
    }

    #[test]
    fn test_unknown_discriminator_fails_the_decode() {
        let document = json!({
            "name": "t",
            "circuits": [["c", { "__type__": "HologramCircuit", "__value__": "x" }]],
        });
        assert!(matches!(
            decode(&document),
            Err(Error::UnknownDiscriminator(_))
        ));
    }

    #[test]
    fn test_wrong_kind_in_circuits_fails() {
        let document = json!({
            "name": "t",
            "circuits": [["c", { "__type__": "Operator",
                                 "__value__": { "dims": [1, 1], "data": [[1.0, 0.0]] } }]],
        });
        assert!(matches!(decode(&document), Err(Error::Serialization(_))));
    }

    #[test]
    fn test_malformed_pair_fails() {
        let document = json!({ "name": "t", "metrics": [["qubits"]] });
        assert!(matches!(decode(&document), Err(Error::Serialization(_))));
    }

    #[test]
    fn test_storage_ref_artifact_round_trips_as_sentinel() {
        let mut trial = Trial::new("t");
        trial.add_artifact("backend", Artifact::StorageRef);

        let document = encode(&trial);
        assert_eq!(
            document["artifacts"][0][1],
            json!({ "__type__": "StorageBackendRef" })
        );

        let recovered = decode(&document).unwrap();
        assert_eq!(recovered.artifacts()[0].1, Artifact::StorageRef);
    }
}
