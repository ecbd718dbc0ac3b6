//! Core types for maskdb
//!
//! This crate holds the leaf types shared by the store layer:
//! - `Value`: tagged value union with its text codec
//! - `Feature` / `FeatureRegistry`: typed secondary attribute declarations
//! - `Error` / `Result`: the error taxonomy

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod feature;
pub mod value;

pub use error::{Error, Result};
pub use feature::{Feature, FeatureKind, FeatureRegistry, FeatureValue};
pub use value::Value;
