//! maskdb — namespaced key-value store with ordered range scans
//!
//! A thin key-value layer over SQLite with three things the flat engine
//! does not give you directly:
//!
//! - **Namespaces**: keys are partitioned by a `"<mask>:"` prefix
//!   convention; [`Store::namespace`] returns a view that scopes every
//!   operation to one mask.
//! - **Ordered range scans**: [`Store::keys`] anchors a scan at an existing
//!   key and walks above or below it, by key or by creation order, bounded
//!   by a limit.
//! - **Feature columns**: typed secondary attributes declared at open time,
//!   readable per key and filterable with [`Store::select`].
//!
//! # Example
//!
//! ```no_run
//! use maskdb::{Op, Store, StoreOptions};
//!
//! # fn main() -> maskdb::Result<()> {
//! let store = Store::open("app.db", StoreOptions::new())?;
//! let area = store.namespace("area");
//!
//! area.put("0001", "a")?;
//! area.put("0002", "b")?;
//! area.put("0003", "c")?;
//!
//! for (key, value) in area.keys(Op::Gt, "0001", false, -1)? {
//!     println!("{key} = {value:?}");
//! }
//! store.close()?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

pub use maskdb_core::{Error, Feature, FeatureKind, FeatureRegistry, FeatureValue, Result, Value};
pub use maskdb_store::{Namespace, Op, Scan, Store, StoreOptions};
