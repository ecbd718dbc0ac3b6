//! Feature declarations and the feature registry
//!
//! Features are typed secondary attributes stored alongside an entry's
//! value, declared once at store-open time. Each declaration fixes a name,
//! a kind, and a default; the registry validates declarations up front and
//! gates every later write and select against them.

use crate::error::{Error, Result};

/// Column names reserved by the store schema.
const RESERVED_NAMES: &[&str] = &["key", "value", "created_at"];

/// Kind of a feature column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeatureKind {
    /// Boolean, stored as 0/1.
    Bool,
    /// Signed 64-bit integer.
    Int,
    /// UTF-8 string.
    Str,
}

/// A typed feature value.
#[derive(Debug, Clone, PartialEq)]
pub enum FeatureValue {
    /// Boolean payload.
    Bool(bool),
    /// Integer payload.
    Int(i64),
    /// String payload.
    Str(String),
}

impl FeatureValue {
    /// Kind tag of this value.
    pub fn kind(&self) -> FeatureKind {
        match self {
            FeatureValue::Bool(_) => FeatureKind::Bool,
            FeatureValue::Int(_) => FeatureKind::Int,
            FeatureValue::Str(_) => FeatureKind::Str,
        }
    }
}

impl From<bool> for FeatureValue {
    fn from(v: bool) -> Self {
        FeatureValue::Bool(v)
    }
}

impl From<i64> for FeatureValue {
    fn from(v: i64) -> Self {
        FeatureValue::Int(v)
    }
}

impl From<&str> for FeatureValue {
    fn from(v: &str) -> Self {
        FeatureValue::Str(v.to_string())
    }
}

impl From<String> for FeatureValue {
    fn from(v: String) -> Self {
        FeatureValue::Str(v)
    }
}

/// A single feature declaration: name, kind, and default value.
#[derive(Debug, Clone)]
pub struct Feature {
    name: String,
    kind: FeatureKind,
    default: FeatureValue,
}

impl Feature {
    /// Declare a feature.
    ///
    /// Fails with `InvalidFeature` when the name is not a valid column
    /// identifier, shadows a reserved column, or the default's kind does not
    /// match `kind`.
    pub fn new(name: impl Into<String>, kind: FeatureKind, default: FeatureValue) -> Result<Self> {
        let name = name.into();
        validate_feature_name(&name)?;
        if default.kind() != kind {
            return Err(Error::InvalidFeature(format!(
                "default for {:?} does not match declared kind {:?}",
                name, kind
            )));
        }
        Ok(Feature {
            name,
            kind,
            default,
        })
    }

    /// Declare a boolean feature.
    pub fn bool(name: impl Into<String>, default: bool) -> Result<Self> {
        Self::new(name, FeatureKind::Bool, FeatureValue::Bool(default))
    }

    /// Declare an integer feature.
    pub fn int(name: impl Into<String>, default: i64) -> Result<Self> {
        Self::new(name, FeatureKind::Int, FeatureValue::Int(default))
    }

    /// Declare a string feature.
    pub fn str(name: impl Into<String>, default: impl Into<String>) -> Result<Self> {
        Self::new(name, FeatureKind::Str, FeatureValue::Str(default.into()))
    }

    /// Feature name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared kind.
    pub fn kind(&self) -> FeatureKind {
        self.kind
    }

    /// Declared default value.
    pub fn default_value(&self) -> &FeatureValue {
        &self.default
    }
}

/// Feature names become SQL column names, so they are restricted to plain
/// identifiers: `[A-Za-z_][A-Za-z0-9_]*`, non-reserved.
fn validate_feature_name(name: &str) -> Result<()> {
    let mut chars = name.chars();
    let valid_head = chars
        .next()
        .map(|c| c.is_ascii_alphabetic() || c == '_')
        .unwrap_or(false);
    if !valid_head || !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(Error::InvalidFeature(format!(
            "{:?} is not a valid feature name",
            name
        )));
    }
    if RESERVED_NAMES
        .iter()
        .any(|r| r.eq_ignore_ascii_case(name))
    {
        return Err(Error::InvalidFeature(format!(
            "{:?} is a reserved column name",
            name
        )));
    }
    Ok(())
}

/// The fixed, open-time declared set of features.
///
/// Built once when the store opens; lookups are linear over what is expected
/// to be a handful of declarations.
#[derive(Debug, Clone, Default)]
pub struct FeatureRegistry {
    features: Vec<Feature>,
}

impl FeatureRegistry {
    /// Build a registry from declarations, rejecting duplicates.
    pub fn new(features: Vec<Feature>) -> Result<Self> {
        for (i, feature) in features.iter().enumerate() {
            if features[..i].iter().any(|f| f.name == feature.name) {
                return Err(Error::InvalidFeature(format!(
                    "duplicate feature {:?}",
                    feature.name
                )));
            }
        }
        Ok(FeatureRegistry { features })
    }

    /// Look up a declaration by name.
    pub fn get(&self, name: &str) -> Option<&Feature> {
        self.features.iter().find(|f| f.name == name)
    }

    /// Look up a declaration and verify that `value` matches its kind.
    ///
    /// An unknown name and a kind mismatch both fail with `FeatureNotFound`:
    /// callers supplied a (feature, value) pair the schema cannot satisfy.
    pub fn check(&self, name: &str, value: &FeatureValue) -> Result<&Feature> {
        match self.get(name) {
            Some(feature) if feature.kind == value.kind() => Ok(feature),
            _ => Err(Error::FeatureNotFound(name.to_string())),
        }
    }

    /// Iterate declarations in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &Feature> {
        self.features.iter()
    }

    /// Number of declared features.
    pub fn len(&self) -> usize {
        self.features.len()
    }

    /// True when no features are declared.
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feature_constructors() {
        let f = Feature::bool("active", true).unwrap();
        assert_eq!(f.name(), "active");
        assert_eq!(f.kind(), FeatureKind::Bool);
        assert_eq!(f.default_value(), &FeatureValue::Bool(true));

        assert!(Feature::int("rank", 0).is_ok());
        assert!(Feature::str("tag", "none").is_ok());
    }

    #[test]
    fn test_mismatched_default_rejected() {
        let err = Feature::new("rank", FeatureKind::Int, FeatureValue::Str("x".into()));
        assert!(matches!(err, Err(Error::InvalidFeature(_))));
    }

    #[test]
    fn test_bad_names_rejected() {
        for name in ["", "1abc", "a-b", "a b", "a;drop", "key", "VALUE", "created_at"] {
            assert!(
                matches!(Feature::int(name, 0), Err(Error::InvalidFeature(_))),
                "{:?} should be rejected",
                name
            );
        }
    }

    #[test]
    fn test_registry_rejects_duplicates() {
        let features = vec![Feature::int("rank", 0).unwrap(), Feature::int("rank", 1).unwrap()];
        assert!(matches!(
            FeatureRegistry::new(features),
            Err(Error::InvalidFeature(_))
        ));
    }

    #[test]
    fn test_registry_check() {
        let registry =
            FeatureRegistry::new(vec![Feature::bool("active", false).unwrap()]).unwrap();

        assert!(registry.check("active", &FeatureValue::Bool(true)).is_ok());

        // Unknown name
        assert!(matches!(
            registry.check("missing", &FeatureValue::Bool(true)),
            Err(Error::FeatureNotFound(name)) if name == "missing"
        ));

        // Declared name, wrong kind
        assert!(matches!(
            registry.check("active", &FeatureValue::Int(1)),
            Err(Error::FeatureNotFound(_))
        ));
    }

    #[test]
    fn test_registry_iteration_order() {
        let registry = FeatureRegistry::new(vec![
            Feature::int("b", 0).unwrap(),
            Feature::int("a", 0).unwrap(),
        ])
        .unwrap();
        let names: Vec<_> = registry.iter().map(Feature::name).collect();
        assert_eq!(names, ["b", "a"]);
    }
}
