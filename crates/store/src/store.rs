//! SQLite-backed namespaced key-value store
//!
//! One logical table holds every entry:
//!
//! ```sql
//! CREATE TABLE entries (
//!     key        TEXT PRIMARY KEY,
//!     value      TEXT,                -- NULL for feature-only rows
//!     created_at INTEGER NOT NULL,    -- monotonic creation sequence
//!     -- one column per declared feature, with a column-level DEFAULT
//! )
//! ```
//!
//! `created_at` is assigned exactly once at first insert and never changes
//! on overwrite: it is a creation-order marker, not a last-modified marker,
//! and by-timestamp range scans depend on that.
//!
//! Every operation is a single atomic statement against the connection;
//! there are no multi-statement transactions and no internal retries.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::atomic::{AtomicI64, Ordering};

use parking_lot::Mutex;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};
use tracing::{debug, trace};

use maskdb_core::{Error, Feature, FeatureKind, FeatureRegistry, FeatureValue, Result, Value};

use crate::namespace::Namespace;
use crate::scan::{Op, Scan};

/// Open-time configuration: schema strictness, feature declarations, and
/// first-writer-wins seed entries.
#[derive(Debug, Default)]
pub struct StoreOptions {
    ignore_existing: bool,
    features: Vec<Feature>,
    defaults: Vec<(String, Value)>,
}

impl StoreOptions {
    /// Options with strict creation, no features, no seed entries.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adopt an existing schema instead of failing with
    /// `CantCreateDatabase`.
    pub fn ignore_existing(mut self, ignore: bool) -> Self {
        self.ignore_existing = ignore;
        self
    }

    /// Declare a feature column.
    pub fn feature(mut self, feature: Feature) -> Self {
        self.features.push(feature);
        self
    }

    /// Seed an entry at open time. Seeding is first-writer-wins: a key that
    /// already exists keeps its stored value.
    pub fn seed(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.defaults.push((key.into(), value.into()));
        self
    }
}

/// The store.
///
/// Owns a single SQLite connection behind a mutex; every operation locks,
/// runs one statement, and unlocks. `close` takes the connection out, after
/// which every operation (including a second `close`) fails with
/// `NotInitialized`.
pub struct Store {
    conn: Mutex<Option<Connection>>,
    registry: FeatureRegistry,
    seq: AtomicI64,
}

impl Store {
    /// Open or create a file-backed store.
    ///
    /// Configures WAL journaling and FULL synchronous mode on the
    /// connection. Fails with `CantCreateDatabase` when the schema already
    /// exists and `ignore_existing` was not set.
    pub fn open(path: impl AsRef<Path>, options: StoreOptions) -> Result<Store> {
        let path = path.as_ref();
        let conn = Connection::open(path).map_err(Error::storage)?;
        conn.pragma_update(None, "journal_mode", "WAL")
            .map_err(Error::storage)?;
        conn.pragma_update(None, "synchronous", "FULL")
            .map_err(Error::storage)?;
        Self::init(conn, &path.display().to_string(), options)
    }

    /// Open an in-memory store. Used mostly by tests.
    pub fn open_in_memory(options: StoreOptions) -> Result<Store> {
        let conn = Connection::open_in_memory().map_err(Error::storage)?;
        Self::init(conn, ":memory:", options)
    }

    fn init(conn: Connection, path: &str, options: StoreOptions) -> Result<Store> {
        let registry = FeatureRegistry::new(options.features)?;

        let exists = table_exists(&conn)?;
        if exists && !options.ignore_existing {
            return Err(Error::CantCreateDatabase {
                path: path.to_string(),
            });
        }
        if exists {
            adopt_schema(&conn, &registry)?;
        } else {
            create_schema(&conn, &registry)?;
        }

        // Seed the creation sequence past everything already stored so that
        // reopened stores keep assigning strictly increasing timestamps.
        let seq: i64 = conn
            .query_row("SELECT COALESCE(MAX(created_at), 0) FROM entries", [], |row| {
                row.get(0)
            })
            .map_err(Error::storage)?;

        let store = Store {
            conn: Mutex::new(Some(conn)),
            registry,
            seq: AtomicI64::new(seq),
        };

        for (key, value) in &options.defaults {
            store.seed_entry(key, value)?;
        }

        debug!(path, features = store.registry.len(), "store opened");
        Ok(store)
    }

    /// Run `f` against the live connection, or fail with `NotInitialized`
    /// after `close`.
    fn with_conn<T>(&self, f: impl FnOnce(&Connection) -> Result<T>) -> Result<T> {
        let guard = self.conn.lock();
        match guard.as_ref() {
            Some(conn) => f(conn),
            None => Err(Error::NotInitialized),
        }
    }

    /// Next creation-sequence value.
    fn next_seq(&self) -> i64 {
        self.seq.fetch_add(1, Ordering::AcqRel) + 1
    }

    /// First-writer-wins seeding: insert only when the key is absent.
    fn seed_entry(&self, key: &str, value: &Value) -> Result<()> {
        let encoded = value.encode();
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO entries (key, value, created_at) VALUES (?1, ?2, ?3) \
                 ON CONFLICT(key) DO NOTHING",
                params![key, encoded, self.next_seq()],
            )
            .map_err(Error::storage)?;
            Ok(())
        })
    }

    /// Point lookup.
    ///
    /// Returns `None` when the key is absent or holds no value
    /// (feature-only row). Stored text that fails to decode comes back as a
    /// raw `Value::Str` rather than an error.
    pub fn get(&self, key: &str) -> Result<Option<Value>> {
        self.with_conn(|conn| {
            let row: Option<Option<String>> = conn
                .query_row("SELECT value FROM entries WHERE key = ?1", [key], |row| {
                    row.get(0)
                })
                .optional()
                .map_err(Error::storage)?;
            Ok(row.flatten().map(|text| Value::decode(&text)))
        })
    }

    /// Upsert a value for a key.
    ///
    /// Insert-or-replace: overwriting an existing key replaces its value
    /// and leaves its creation timestamp untouched.
    pub fn put(&self, key: &str, value: impl Into<Value>) -> Result<()> {
        self.put_with_features(key, Some(value.into()), &[])
    }

    /// Upsert a value and/or feature columns in one atomic statement.
    ///
    /// - `Some(value)` upserts the value; any `features` are set in the same
    ///   write.
    /// - `None` with non-empty `features` is a feature-only partial update:
    ///   an existing row keeps its value and creation timestamp; an absent
    ///   key gets a row with no value.
    /// - `None` with empty `features` is a no-op.
    ///
    /// An undeclared feature name or a kind-mismatched feature value fails
    /// with `FeatureNotFound` before anything is written.
    pub fn put_with_features(
        &self,
        key: &str,
        value: Option<Value>,
        features: &[(&str, FeatureValue)],
    ) -> Result<()> {
        if value.is_none() && features.is_empty() {
            // No-op, but still subject to the close contract.
            return self.with_conn(|_| Ok(()));
        }
        for (name, target) in features {
            self.registry.check(name, target)?;
        }

        let mut columns = String::from("key, created_at");
        let mut values: Vec<rusqlite::types::Value> =
            vec![key.to_string().into(), self.next_seq().into()];
        let mut updates: Vec<String> = Vec::new();

        if let Some(value) = &value {
            values.push(value.encode().into());
            columns.push_str(", value");
            updates.push("value = excluded.value".to_string());
        }
        for (name, target) in features {
            values.push(feature_sql(target));
            let column = quote_ident(name);
            columns.push_str(", ");
            columns.push_str(&column);
            updates.push(format!("{column} = excluded.{column}"));
        }

        let placeholders = (1..=values.len())
            .map(|i| format!("?{i}"))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "INSERT INTO entries ({columns}) VALUES ({placeholders}) \
             ON CONFLICT(key) DO UPDATE SET {}",
            updates.join(", ")
        );

        self.with_conn(|conn| {
            conn.execute(&sql, params_from_iter(values)).map_err(Error::storage)?;
            Ok(())
        })
    }

    /// Delete a key. Idempotent: deleting an absent key is not an error.
    pub fn delete(&self, key: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute("DELETE FROM entries WHERE key = ?1", [key])
                .map_err(Error::storage)?;
            Ok(())
        })
    }

    /// Read every declared feature column for one key.
    ///
    /// Fails with `CantFoundKey` when the key does not exist.
    pub fn features(&self, key: &str) -> Result<BTreeMap<String, FeatureValue>> {
        self.with_conn(|conn| {
            if self.registry.is_empty() {
                let exists = conn
                    .query_row("SELECT 1 FROM entries WHERE key = ?1", [key], |_| Ok(()))
                    .optional()
                    .map_err(Error::storage)?;
                return match exists {
                    Some(()) => Ok(BTreeMap::new()),
                    None => Err(Error::CantFoundKey(key.to_string())),
                };
            }

            let columns = self
                .registry
                .iter()
                .map(|f| quote_ident(f.name()))
                .collect::<Vec<_>>()
                .join(", ");
            let sql = format!("SELECT {columns} FROM entries WHERE key = ?1");
            let row = conn
                .query_row(&sql, [key], |row| {
                    let mut out = BTreeMap::new();
                    for (i, feature) in self.registry.iter().enumerate() {
                        let value = match feature.kind() {
                            FeatureKind::Bool => FeatureValue::Bool(row.get::<_, i64>(i)? != 0),
                            FeatureKind::Int => FeatureValue::Int(row.get(i)?),
                            FeatureKind::Str => FeatureValue::Str(row.get(i)?),
                        };
                        out.insert(feature.name().to_string(), value);
                    }
                    Ok(out)
                })
                .optional()
                .map_err(Error::storage)?;
            row.ok_or_else(|| Error::CantFoundKey(key.to_string()))
        })
    }

    /// Equality scan over one feature column.
    ///
    /// Returns every entry under `mask` whose `feature` column equals
    /// `target`, ordered by key ascending. `limit < 0` means unbounded.
    /// Fails with `FeatureNotFound` when `feature` is undeclared or
    /// `target`'s kind does not match the declaration.
    pub fn select(
        &self,
        feature: &str,
        target: FeatureValue,
        mask: &str,
        limit: i64,
    ) -> Result<Scan> {
        self.registry.check(feature, &target)?;
        let sql = format!(
            "SELECT key, value FROM entries \
             WHERE {} = ?1 AND key LIKE ?2 ESCAPE '\\' \
             ORDER BY key ASC LIMIT ?3",
            quote_ident(feature)
        );
        self.with_conn(|conn| {
            trace!(%sql, mask, "feature select");
            let mut stmt = conn.prepare(&sql).map_err(Error::storage)?;
            let rows = stmt
                .query_map(params![feature_sql(&target), like_pattern(mask), limit], scan_row)
                .map_err(Error::storage)?
                .collect::<rusqlite::Result<Vec<_>>>()
                .map_err(Error::storage)?;
            Ok(Scan::new(rows))
        })
    }

    /// Ordered range scan anchored at an existing key.
    ///
    /// Resolves `anchor`'s current row (absent → `CantFoundKey`), compares
    /// on the key or, with `by_timestamp`, on the creation timestamp, and
    /// scans ascending for the `Gt` family / descending for the `Lt`
    /// family. Only keys under `mask` are returned; `limit < 0` means
    /// unbounded. Inclusive operators include the anchor's own row.
    pub fn keys(
        &self,
        op: Op,
        anchor: &str,
        mask: &str,
        by_timestamp: bool,
        limit: i64,
    ) -> Result<Scan> {
        self.with_conn(|conn| {
            let created_at: Option<i64> = conn
                .query_row(
                    "SELECT created_at FROM entries WHERE key = ?1",
                    [anchor],
                    |row| row.get(0),
                )
                .optional()
                .map_err(Error::storage)?;
            let Some(created_at) = created_at else {
                return Err(Error::CantFoundKey(anchor.to_string()));
            };

            let field = if by_timestamp { "created_at" } else { "key" };
            let direction = if op.descending() { "DESC" } else { "ASC" };
            let sql = format!(
                "SELECT key, value FROM entries \
                 WHERE {field} {op} ?1 AND key LIKE ?2 ESCAPE '\\' \
                 ORDER BY {field} {direction} LIMIT ?3",
                op = op.symbol(),
            );
            trace!(%sql, anchor, mask, "range scan");

            let boundary: rusqlite::types::Value = if by_timestamp {
                created_at.into()
            } else {
                anchor.to_string().into()
            };
            let mut stmt = conn.prepare(&sql).map_err(Error::storage)?;
            let rows = stmt
                .query_map(params![boundary, like_pattern(mask), limit], scan_row)
                .map_err(Error::storage)?
                .collect::<rusqlite::Result<Vec<_>>>()
                .map_err(Error::storage)?;
            Ok(Scan::new(rows))
        })
    }

    /// View of this store restricted to keys under `"<mask>:"`.
    pub fn namespace(&self, mask: impl Into<String>) -> Namespace<'_> {
        Namespace::new(self, mask.into())
    }

    /// Release the connection. Every later operation fails with
    /// `NotInitialized`.
    pub fn close(&self) -> Result<()> {
        let conn = self.conn.lock().take().ok_or(Error::NotInitialized)?;
        conn.close().map_err(|(_, err)| Error::storage(err))?;
        debug!("store closed");
        Ok(())
    }
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("open", &self.conn.lock().is_some())
            .field("features", &self.registry.len())
            .field("seq", &self.seq.load(Ordering::Acquire))
            .finish()
    }
}

/// Row mapper shared by `keys` and `select`.
fn scan_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<(String, Option<String>)> {
    Ok((row.get(0)?, row.get(1)?))
}

fn table_exists(conn: &Connection) -> Result<bool> {
    conn.query_row(
        "SELECT name FROM sqlite_master WHERE type = 'table' AND name = 'entries'",
        [],
        |_| Ok(()),
    )
    .optional()
    .map_err(Error::storage)
    .map(|row| row.is_some())
}

fn create_schema(conn: &Connection, registry: &FeatureRegistry) -> Result<()> {
    let mut ddl = String::from(
        "CREATE TABLE entries (key TEXT PRIMARY KEY, value TEXT, created_at INTEGER NOT NULL",
    );
    for feature in registry.iter() {
        ddl.push_str(&format!(
            ", {} {} NOT NULL DEFAULT {}",
            quote_ident(feature.name()),
            column_type(feature.kind()),
            default_literal(feature.default_value()),
        ));
    }
    ddl.push(')');
    conn.execute(&ddl, []).map_err(Error::storage)?;
    debug!(features = registry.len(), "created store schema");
    Ok(())
}

/// Add feature columns missing from an adopted schema. Rows predating a
/// declaration read as the declared default.
fn adopt_schema(conn: &Connection, registry: &FeatureRegistry) -> Result<()> {
    let mut stmt = conn
        .prepare("PRAGMA table_info(entries)")
        .map_err(Error::storage)?;
    let existing: Vec<String> = stmt
        .query_map([], |row| row.get(1))
        .map_err(Error::storage)?
        .collect::<rusqlite::Result<_>>()
        .map_err(Error::storage)?;

    for feature in registry.iter() {
        if !existing.iter().any(|c| c.eq_ignore_ascii_case(feature.name())) {
            let ddl = format!(
                "ALTER TABLE entries ADD COLUMN {} {} NOT NULL DEFAULT {}",
                quote_ident(feature.name()),
                column_type(feature.kind()),
                default_literal(feature.default_value()),
            );
            conn.execute(&ddl, []).map_err(Error::storage)?;
            debug!(feature = feature.name(), "added feature column");
        }
    }
    Ok(())
}

/// Feature names are validated identifiers; quoting keeps them from
/// colliding with SQL keywords.
fn quote_ident(name: &str) -> String {
    format!("\"{name}\"")
}

fn column_type(kind: FeatureKind) -> &'static str {
    match kind {
        FeatureKind::Bool | FeatureKind::Int => "INTEGER",
        FeatureKind::Str => "TEXT",
    }
}

/// DDL DEFAULT literal for a feature default. Bool → 0/1, Int → integer
/// literal, Str → quoted literal.
fn default_literal(value: &FeatureValue) -> String {
    match value {
        FeatureValue::Bool(b) => if *b { "1" } else { "0" }.to_string(),
        FeatureValue::Int(i) => i.to_string(),
        FeatureValue::Str(s) => format!("'{}'", s.replace('\'', "''")),
    }
}

/// Bind-parameter rendering of a feature value. Bool → 0/1.
fn feature_sql(value: &FeatureValue) -> rusqlite::types::Value {
    match value {
        FeatureValue::Bool(b) => rusqlite::types::Value::Integer(*b as i64),
        FeatureValue::Int(i) => rusqlite::types::Value::Integer(*i),
        FeatureValue::Str(s) => rusqlite::types::Value::Text(s.clone()),
    }
}

/// LIKE pattern for "starts with mask": escape LIKE metacharacters in the
/// mask, then append `%`.
fn like_pattern(mask: &str) -> String {
    let mut pattern = String::with_capacity(mask.len() + 1);
    for c in mask.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}
