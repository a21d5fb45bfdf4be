//! Test builders: ergonomic constructors for dump records and record tables.
//!
//! These builders are designed for readability in test assertions, not for
//! production use. They panic on invalid input rather than returning `Result`.

use bpx_core::config::SearchConfig;
use bpx_core::{BlueprintDb, Guid, RawRecord};
use serde_json::{json, Map, Value};

/// Deterministic GUID for fixture `n`.
pub fn guid(n: u128) -> Guid {
    Guid::from_u128(n)
}

/// Bare-hex spelling of [`guid`], as it appears in dumps.
pub fn guid_text(n: u128) -> String {
    guid(n).to_string()
}

/// Short-form reference token pointing at fixture `n`.
pub fn short_ref(n: u128) -> String {
    format!("!bp_{}", guid_text(n))
}

/// Composite-form reference token pointing at fixture `n`.
pub fn composite_ref(n: u128) -> String {
    format!("Blueprint:{}:Fixture{n}", guid_text(n))
}

// ---------------------------------------------------------------------------
// RecordBuilder
// ---------------------------------------------------------------------------

/// Fluent builder for [`RawRecord`] test fixtures.
///
/// # Example
///
/// ```rust
/// let record = RecordBuilder::new(1, "Fireball")
///     .type_name("Kingmaker.Blueprints.BlueprintAbility")
///     .member("Icon", short_ref(2))
///     .build();
/// ```
pub struct RecordBuilder {
    guid: String,
    name: String,
    type_name: String,
    payload: Map<String, Value>,
    raw: Option<String>,
}

impl RecordBuilder {
    pub fn new(n: u128, name: impl Into<String>) -> Self {
        let mut payload = Map::new();
        payload.insert("$type".into(), json!(format!("{}, BlueprintFixture", guid_text(1_000 + n))));
        Self {
            guid: guid_text(n),
            name: name.into(),
            type_name: "Kingmaker.Blueprints.BlueprintFixture".to_string(),
            payload,
            raw: None,
        }
    }

    pub fn type_name(mut self, type_name: impl Into<String>) -> Self {
        self.type_name = type_name.into();
        self
    }

    /// Replace the GUID with arbitrary text (for invalid-GUID fixtures).
    pub fn guid_text(mut self, guid: impl Into<String>) -> Self {
        self.guid = guid.into();
        self
    }

    pub fn member(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.payload.insert(key.into(), value.into());
        self
    }

    /// Add a member referencing fixture `target` with a short-form token.
    pub fn references(self, key: impl Into<String>, target: u128) -> Self {
        self.member(key, short_ref(target))
    }

    /// Use this exact text as the payload, bypassing the member map.
    pub fn raw(mut self, raw: impl Into<String>) -> Self {
        self.raw = Some(raw.into());
        self
    }

    pub fn build(self) -> RawRecord {
        let raw = self
            .raw
            .unwrap_or_else(|| Value::Object(self.payload).to_string());
        RawRecord::new(self.guid, self.name, self.type_name, raw)
    }
}

// ---------------------------------------------------------------------------
// Record table helpers
// ---------------------------------------------------------------------------

/// Load `records` with the default search settings.
pub fn db(records: Vec<RawRecord>) -> BlueprintDb {
    BlueprintDb::load(records, &SearchConfig::default())
}

/// Load `records`, checking for cancellation after every record.
pub fn db_with_tight_cancellation(records: Vec<RawRecord>) -> BlueprintDb {
    let config = SearchConfig {
        cancel_check_interval: 1,
        ..SearchConfig::default()
    };
    BlueprintDb::load(records, &config)
}

/// Write `records` to a dump file inside `dir` and return its path.
pub fn dump_file(dir: &tempfile::TempDir, records: &[RawRecord]) -> std::path::PathBuf {
    let path = dir.path().join("blueprints.jsonl");
    std::fs::write(&path, bpx_core::loader::render_dump(records)).expect("write dump");
    path
}
