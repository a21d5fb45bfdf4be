//! Core types for bpx-core.
//!
//! This module defines the record ("blueprint") that every other layer refers
//! to, the [`Guid`] that identifies it, and the [`RawRecord`] shape the loader
//! hands over before a record is admitted to the table.

use crate::document::{self, Elements};
use crate::error::DocumentError;
use crate::matcher::MatchSlots;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::OnceLock;

/// Identifier of a blueprint.
///
/// Dumps spell GUIDs as 32 bare hex digits; the hyphenated form is accepted
/// too. [`Display`](std::fmt::Display) always renders the bare form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Guid(uuid::Uuid);

impl Guid {
    /// Parse a GUID, returning `None` for anything that is not one.
    pub fn parse(text: &str) -> Option<Guid> {
        uuid::Uuid::try_parse(text).ok().map(Guid)
    }

    pub fn from_u128(value: u128) -> Guid {
        Guid(uuid::Uuid::from_u128(value))
    }
}

impl std::fmt::Display for Guid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.simple())
    }
}

impl std::str::FromStr for Guid {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Guid::parse(s).ok_or_else(|| format!("not a guid: {s:?}"))
    }
}

/// One entry of a blueprint dump, as read from disk.
///
/// `raw` holds the serialized payload verbatim; it is only parsed when the
/// record is first walked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRecord {
    pub guid: String,
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
    pub raw: String,
}

impl RawRecord {
    pub fn new(
        guid: impl Into<String>,
        name: impl Into<String>,
        type_name: impl Into<String>,
        raw: impl Into<String>,
    ) -> Self {
        Self {
            guid: guid.into(),
            name: name.into(),
            type_name: type_name.into(),
            raw: raw.into(),
        }
    }
}

/// Split a dotted type name into `(short name, namespace)`.
///
/// `"Kingmaker.Blueprints.BlueprintFeature"` becomes
/// `("BlueprintFeature", "Kingmaker.Blueprints")`. A name without dots has an
/// empty namespace.
pub fn split_type_name(full: &str) -> (&str, &str) {
    match full.rsplit_once('.') {
        Some((namespace, short)) => (short, namespace),
        None => (full, ""),
    }
}

/// A named, typed, GUID-identified document.
///
/// Identity and text fields are fixed at construction. The parsed tree is
/// computed at most once, on first structural access, and shared by every
/// caller after that.
pub struct Blueprint {
    guid: Guid,
    guid_text: String,
    name: String,
    full_type: String,
    type_name: String,
    namespace: String,
    raw: String,
    tree: OnceLock<Result<Value, DocumentError>>,

    // Lower-cased copies of the searchable fields, computed once at load.
    pub(crate) name_lower: String,
    pub(crate) type_lower: String,
    pub(crate) namespace_lower: String,

    pub(crate) matches: MatchSlots,
}

impl Blueprint {
    pub fn new(guid: Guid, name: impl Into<String>, full_type: impl Into<String>, raw: impl Into<String>) -> Self {
        let name = name.into();
        let full_type = full_type.into();
        let (type_name, namespace) = split_type_name(&full_type);
        let (type_name, namespace) = (type_name.to_string(), namespace.to_string());

        Blueprint {
            guid,
            guid_text: guid.to_string(),
            name_lower: name.to_lowercase(),
            type_lower: type_name.to_lowercase(),
            namespace_lower: namespace.to_lowercase(),
            name,
            full_type,
            type_name,
            namespace,
            raw: raw.into(),
            tree: OnceLock::new(),
            matches: MatchSlots::default(),
        }
    }

    pub fn guid(&self) -> Guid {
        self.guid
    }

    /// The GUID as it is matched and displayed (32 lower-case hex digits).
    pub fn guid_text(&self) -> &str {
        &self.guid_text
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The dotted type name as supplied by the dump.
    pub fn full_type(&self) -> &str {
        &self.full_type
    }

    /// Last segment of the dotted type name.
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Everything before the last dot of the type name; empty if there is none.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Whether the payload has already been parsed (successfully or not).
    pub fn is_parsed(&self) -> bool {
        self.tree.get().is_some()
    }

    /// The parsed payload. Parses on first call; later calls, including
    /// concurrent ones, observe the same cached outcome.
    pub fn tree(&self) -> Result<&Value, DocumentError> {
        self.tree
            .get_or_init(|| {
                serde_json::from_str(&self.raw).map_err(|err| DocumentError::Malformed {
                    guid: self.guid_text.clone(),
                    line: err.line(),
                    column: err.column(),
                    message: err.to_string(),
                })
            })
            .as_ref()
            .map_err(Clone::clone)
    }

    /// Walk the parsed payload, labelling the root with the record's name.
    pub fn elements(&self) -> Result<Elements<'_>, DocumentError> {
        Ok(document::traverse(self.tree()?, &self.name))
    }

    /// Targets of every reference token in the payload, in traversal order.
    /// Duplicates are kept; callers dedupe if they need to.
    pub fn direct_references(&self) -> Result<Vec<Guid>, DocumentError> {
        Ok(document::direct_references(self.tree()?, &self.name).collect())
    }
}

impl std::fmt::Debug for Blueprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Blueprint")
            .field("guid", &self.guid_text)
            .field("name", &self.name)
            .field("type", &self.full_type)
            .field("parsed", &self.is_parsed())
            .finish()
    }
}
