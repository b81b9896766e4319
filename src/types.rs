// Copyright 2026 Qutrials Contributors
// SPDX-License-Identifier: Apache-2.0

//! Domain payload types carried by a trial.
//!
//! The tracking core never interprets these payloads beyond their declared
//! kind: a [`Circuit`] is OpenQASM source text, an [`Operator`] is a dense
//! complex matrix, a [`NumericArray`] is a shaped `f64` array, and an
//! [`Artifact`] is an opaque byte blob. How such objects are built belongs to
//! the caller's toolchain, not to this crate.

use ndarray::{Array2, ArrayD, IxDyn};
use num_complex::Complex64;

use crate::error::{Error, Result};

/// A metric value. Integers and floats are kept distinct so a recorded
/// `("shots", 1024)` round-trips as an integer, not as `1024.0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MetricValue {
    /// Integer metric
    Int(i64),
    /// Floating-point metric
    Float(f64),
}

impl MetricValue {
    /// Numeric value as `f64`, regardless of representation.
    pub fn as_f64(&self) -> f64 {
        match self {
            MetricValue::Int(v) => *v as f64,
            MetricValue::Float(v) => *v,
        }
    }
}

impl From<i64> for MetricValue {
    fn from(v: i64) -> Self {
        MetricValue::Int(v)
    }
}

impl From<i32> for MetricValue {
    fn from(v: i32) -> Self {
        MetricValue::Int(v as i64)
    }
}

impl From<f64> for MetricValue {
    fn from(v: f64) -> Self {
        MetricValue::Float(v)
    }
}

/// A quantum circuit, carried as its OpenQASM textual serialization.
///
/// The text is treated as the circuit's full structural content; the core
/// stores and returns it byte-for-byte.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Circuit {
    qasm: String,
}

impl Circuit {
    /// Wrap OpenQASM source text.
    pub fn from_qasm(qasm: impl Into<String>) -> Self {
        Self { qasm: qasm.into() }
    }

    /// The OpenQASM source text.
    pub fn qasm(&self) -> &str {
        &self.qasm
    }
}

/// A linear operator, carried as a dense matrix of complex amplitudes.
#[derive(Debug, Clone, PartialEq)]
pub struct Operator {
    matrix: Array2<Complex64>,
}

impl Operator {
    /// Wrap a dense complex matrix.
    pub fn new(matrix: Array2<Complex64>) -> Self {
        Self { matrix }
    }

    /// Build an operator from row-major entries.
    ///
    /// Fails when `entries.len() != rows * cols`.
    pub fn from_flat(rows: usize, cols: usize, entries: Vec<Complex64>) -> Result<Self> {
        let matrix = Array2::from_shape_vec((rows, cols), entries).map_err(|e| {
            Error::Serialization(format!("operator matrix shape mismatch: {}", e))
        })?;
        Ok(Self { matrix })
    }

    /// The underlying matrix.
    pub fn matrix(&self) -> &Array2<Complex64> {
        &self.matrix
    }

    /// Matrix dimensions as `(rows, cols)`.
    pub fn dims(&self) -> (usize, usize) {
        self.matrix.dim()
    }
}

/// A numeric array of arbitrary rank, e.g. measurement counts or a sampled
/// expectation-value sweep. Shape and `f64` precision survive serialization.
#[derive(Debug, Clone, PartialEq)]
pub struct NumericArray {
    values: ArrayD<f64>,
}

impl NumericArray {
    /// Wrap an n-dimensional array.
    pub fn new(values: ArrayD<f64>) -> Self {
        Self { values }
    }

    /// Build a one-dimensional array.
    pub fn from_vec(data: Vec<f64>) -> Self {
        let len = data.len();
        Self {
            // A flat vec always satisfies its own length as shape.
            values: ArrayD::from_shape_vec(IxDyn(&[len]), data)
                .unwrap_or_else(|_| ArrayD::zeros(IxDyn(&[len]))),
        }
    }

    /// Build an array from an explicit shape and row-major data.
    ///
    /// Fails when the data length does not match the shape's element count.
    pub fn from_shape_vec(shape: Vec<usize>, data: Vec<f64>) -> Result<Self> {
        let values = ArrayD::from_shape_vec(IxDyn(&shape), data)
            .map_err(|e| Error::Serialization(format!("array shape mismatch: {}", e)))?;
        Ok(Self { values })
    }

    /// The underlying array.
    pub fn values(&self) -> &ArrayD<f64> {
        &self.values
    }

    /// Array shape.
    pub fn shape(&self) -> &[usize] {
        self.values.shape()
    }
}

impl From<Vec<f64>> for NumericArray {
    fn from(data: Vec<f64>) -> Self {
        NumericArray::from_vec(data)
    }
}

/// An opaque artifact attached to a trial.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Artifact {
    /// Raw bytes (file content, pickled result, image, ...)
    Bytes(Vec<u8>),
    /// Placeholder for a storage backend handle that was intentionally not
    /// serialized; carries no credentials and cannot be restored.
    StorageRef,
}

impl Artifact {
    /// Wrap raw bytes.
    pub fn from_bytes(data: impl Into<Vec<u8>>) -> Self {
        Artifact::Bytes(data.into())
    }

    /// The raw bytes, when this artifact carries any.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Artifact::Bytes(data) => Some(data),
            Artifact::StorageRef => None,
        }
    }

    /// Payload size in bytes; a backend placeholder has none.
    pub fn size_bytes(&self) -> usize {
        match self {
            Artifact::Bytes(data) => data.len(),
            Artifact::StorageRef => 0,
        }
    }
}
