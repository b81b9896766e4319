// Copyright 2026 Qutrials Contributors
// SPDX-License-Identifier: Apache-2.0

//! Serialization of trials and their heterogeneous values.
//!
//! - [`value`]: per-value codec over the closed set of encodable kinds
//! - [`document`]: whole-trial JSON document codec

pub mod document;
pub mod value;

pub use document::{decode, encode, from_json_bytes, to_json_bytes};
pub use value::TypedValue;
