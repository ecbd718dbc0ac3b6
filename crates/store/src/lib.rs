//! Store layer for maskdb
//!
//! - `store`: the SQLite-backed [`Store`] and its open-time options
//! - `scan`: range operators and the scan result iterator
//! - `namespace`: the key-prefix [`Namespace`] proxy

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod namespace;
pub mod scan;
pub mod store;

pub use namespace::Namespace;
pub use scan::{Op, Scan};
pub use store::{Store, StoreOptions};
