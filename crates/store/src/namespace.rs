//! Namespace proxy
//!
//! A namespace is a key-prefix convention (`"<mask>:"`), not a persisted
//! entity. The proxy is a stateless-per-call view over a store: every
//! operation prefixes the caller's key with the mask and delegates, and
//! every scan filters on the mask so results never cross namespace
//! boundaries.

use std::collections::BTreeMap;

use maskdb_core::{FeatureValue, Result, Value};

use crate::scan::{Op, Scan};
use crate::store::Store;

/// View over a [`Store`] restricted to keys under `"<mask>:"`.
///
/// Created by [`Store::namespace`]. Holds no state beyond the mask; cloning
/// the view or creating it fresh per call is equivalent.
#[derive(Debug, Clone)]
pub struct Namespace<'a> {
    store: &'a Store,
    mask: String,
}

impl<'a> Namespace<'a> {
    pub(crate) fn new(store: &'a Store, mask: String) -> Self {
        Namespace { store, mask }
    }

    /// The namespace mask, without the trailing separator.
    pub fn mask(&self) -> &str {
        &self.mask
    }

    /// Full key for `key` inside this namespace.
    fn scoped(&self, key: &str) -> String {
        format!("{}:{}", self.mask, key)
    }

    /// Scan filter for this namespace. The trailing colon matters: mask
    /// `"area"` must never match keys under `"areaother:"`.
    fn prefix(&self) -> String {
        format!("{}:", self.mask)
    }

    /// Point lookup of `"<mask>:<key>"`.
    pub fn get(&self, key: &str) -> Result<Option<Value>> {
        self.store.get(&self.scoped(key))
    }

    /// Upsert `"<mask>:<key>"`.
    pub fn put(&self, key: &str, value: impl Into<Value>) -> Result<()> {
        self.store.put(&self.scoped(key), value)
    }

    /// Upsert value and/or features of `"<mask>:<key>"`.
    pub fn put_with_features(
        &self,
        key: &str,
        value: Option<Value>,
        features: &[(&str, FeatureValue)],
    ) -> Result<()> {
        self.store.put_with_features(&self.scoped(key), value, features)
    }

    /// Delete `"<mask>:<key>"`. Idempotent.
    pub fn delete(&self, key: &str) -> Result<()> {
        self.store.delete(&self.scoped(key))
    }

    /// Feature columns of `"<mask>:<key>"`.
    pub fn features(&self, key: &str) -> Result<BTreeMap<String, FeatureValue>> {
        self.store.features(&self.scoped(key))
    }

    /// Range scan anchored at `"<mask>:<key>"`, filtered to this namespace.
    pub fn keys(&self, op: Op, key: &str, by_timestamp: bool, limit: i64) -> Result<Scan> {
        self.store
            .keys(op, &self.scoped(key), &self.prefix(), by_timestamp, limit)
    }

    /// Feature equality scan filtered to this namespace.
    pub fn select(&self, feature: &str, target: FeatureValue, limit: i64) -> Result<Scan> {
        self.store.select(feature, target, &self.prefix(), limit)
    }
}
