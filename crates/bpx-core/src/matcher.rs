//! Match engine: scores blueprints against a query and ranks them.
//!
//! Each record is matched on four fields, in priority order:
//!
//! | Field       | Weight |
//! |-------------|--------|
//! | `name`      | 64     |
//! | `type`      | 16     |
//! | `space`     | 4      |
//! | `guid`      | 1      |
//!
//! A field's [`MatchLevel`] (contained, prefix, exact) is multiplied by its
//! weight and the products are summed. The highest level is 3, so every tier
//! outweighs all tiers below it combined: a record matching on `name` always
//! outranks one that does not.
//!
//! Outcomes are written into per-record scratch slots, one per search buffer
//! (see [`MatchSlots`]). Two searches in flight at once use different buffers
//! and therefore never write the same slot; the slots are atomics, so neither
//! side needs a lock.

use crate::types::Blueprint;
use std::sync::atomic::{AtomicU32, Ordering};
use tokio_util::sync::CancellationToken;

/// Number of searches that may be in flight at once.
pub const BUFFER_COUNT: usize = 2;

/// Aggregate score given to every record by the empty query.
pub const BASELINE_SCORE: u32 = 1;

/// Which scratch slot a search writes into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BufferId(u8);

impl BufferId {
    pub const FIRST: BufferId = BufferId(0);
    pub const SECOND: BufferId = BufferId(1);

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for BufferId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A searchable field of a blueprint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Name,
    Type,
    Namespace,
    Guid,
}

impl Field {
    /// All fields, highest priority first.
    pub const ALL: [Field; 4] = [Field::Name, Field::Type, Field::Namespace, Field::Guid];

    pub fn weight(self) -> u32 {
        match self {
            Field::Name => 64,
            Field::Type => 16,
            Field::Namespace => 4,
            Field::Guid => 1,
        }
    }

    fn text(self, bp: &Blueprint) -> &str {
        match self {
            Field::Name => &bp.name_lower,
            Field::Type => &bp.type_lower,
            Field::Namespace => &bp.namespace_lower,
            Field::Guid => bp.guid_text(),
        }
    }
}

/// How well a single field matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum MatchLevel {
    #[default]
    None = 0,
    Contains = 1,
    Prefix = 2,
    Exact = 3,
}

impl MatchLevel {
    fn from_bits(bits: u32) -> MatchLevel {
        match bits {
            1 => MatchLevel::Contains,
            2 => MatchLevel::Prefix,
            3 => MatchLevel::Exact,
            _ => MatchLevel::None,
        }
    }
}

/// Outcome of matching one field: the level and the byte offset of the first
/// occurrence of the query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FieldMatch {
    pub level: MatchLevel,
    pub position: Option<usize>,
}

const POSITION_BITS: u32 = 24;
const POSITION_MASK: u32 = (1 << POSITION_BITS) - 1;

impl FieldMatch {
    pub const NONE: FieldMatch = FieldMatch {
        level: MatchLevel::None,
        position: None,
    };

    pub fn is_match(&self) -> bool {
        self.level != MatchLevel::None
    }

    // level in the top byte, position + 1 below it (0 = no position)
    fn pack(self) -> u32 {
        let position = self
            .position
            .map(|p| (p as u32).saturating_add(1).min(POSITION_MASK))
            .unwrap_or(0);
        ((self.level as u32) << POSITION_BITS) | position
    }

    fn unpack(bits: u32) -> FieldMatch {
        let position = bits & POSITION_MASK;
        FieldMatch {
            level: MatchLevel::from_bits(bits >> POSITION_BITS),
            position: (position != 0).then(|| (position - 1) as usize),
        }
    }
}

/// Match `needle` against `haystack`; both must already be lower-cased.
pub fn match_field(haystack: &str, needle: &str) -> FieldMatch {
    match haystack.find(needle) {
        None => FieldMatch::NONE,
        Some(position) => {
            let level = if haystack.len() == needle.len() {
                MatchLevel::Exact
            } else if position == 0 {
                MatchLevel::Prefix
            } else {
                MatchLevel::Contains
            };
            FieldMatch {
                level,
                position: Some(position),
            }
        }
    }
}

/// Per-record outcome of one query: one [`FieldMatch`] per [`Field`] (in
/// [`Field::ALL`] order) and the aggregate score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MatchRecord {
    pub fields: [FieldMatch; 4],
    pub score: u32,
}

impl MatchRecord {
    fn baseline() -> MatchRecord {
        MatchRecord {
            fields: [FieldMatch::NONE; 4],
            score: BASELINE_SCORE,
        }
    }

    pub fn field(&self, field: Field) -> FieldMatch {
        self.fields[field as usize]
    }

    pub fn is_match(&self) -> bool {
        self.score > 0
    }
}

/// Weighted sum of the field levels.
pub fn aggregate(fields: &[FieldMatch; 4]) -> u32 {
    Field::ALL
        .iter()
        .zip(fields)
        .map(|(field, m)| field.weight() * m.level as u32)
        .sum()
}

#[derive(Default)]
struct Slot {
    fields: [AtomicU32; 4],
    score: AtomicU32,
}

/// Per-record scratch space: one slot per search buffer.
///
/// Allocated once with the record and overwritten by every search that
/// evaluates it. A slot is only written by the search that owns its buffer.
#[derive(Default)]
pub struct MatchSlots {
    slots: [Slot; BUFFER_COUNT],
}

impl MatchSlots {
    pub fn write(&self, buffer: BufferId, record: &MatchRecord) {
        let slot = &self.slots[buffer.index()];
        for (cell, m) in slot.fields.iter().zip(&record.fields) {
            cell.store(m.pack(), Ordering::Relaxed);
        }
        slot.score.store(record.score, Ordering::Relaxed);
    }

    pub fn read(&self, buffer: BufferId) -> MatchRecord {
        let slot = &self.slots[buffer.index()];
        let mut fields = [FieldMatch::NONE; 4];
        for (m, cell) in fields.iter_mut().zip(&slot.fields) {
            *m = FieldMatch::unpack(cell.load(Ordering::Relaxed));
        }
        MatchRecord {
            fields,
            score: slot.score.load(Ordering::Relaxed),
        }
    }

    pub fn score(&self, buffer: BufferId) -> u32 {
        self.slots[buffer.index()].score.load(Ordering::Relaxed)
    }
}

/// Score one record against an already lower-cased query.
pub fn score(bp: &Blueprint, query_lower: &str) -> MatchRecord {
    if query_lower.is_empty() {
        return MatchRecord::baseline();
    }
    let mut fields = [FieldMatch::NONE; 4];
    for (m, field) in fields.iter_mut().zip(Field::ALL) {
        *m = match_field(field.text(bp), query_lower);
    }
    MatchRecord {
        score: aggregate(&fields),
        fields,
    }
}

/// Ranks candidates for a query, checking for cancellation as it goes.
#[derive(Debug, Clone, Copy)]
pub struct MatchEngine {
    /// Records scored between two looks at the cancellation token.
    check_interval: usize,
}

impl Default for MatchEngine {
    fn default() -> Self {
        Self { check_interval: 256 }
    }
}

impl MatchEngine {
    pub fn new(check_interval: usize) -> Self {
        Self {
            check_interval: check_interval.max(1),
        }
    }

    /// Score every candidate into `buffer` and return the matching ones,
    /// best first.
    ///
    /// `candidates` are indices into `records`, in load order; ties keep that
    /// order. Returns `None` if `cancel` fires before the ranking is complete.
    pub fn score_all(
        &self,
        records: &[Blueprint],
        candidates: &[usize],
        query: &str,
        buffer: BufferId,
        cancel: &CancellationToken,
    ) -> Option<Vec<usize>> {
        let query = query.to_lowercase();
        let interval = self.check_interval.max(1);
        let mut hits: Vec<(usize, u32)> = Vec::new();

        for (n, &index) in candidates.iter().enumerate() {
            if n % interval == 0 && cancel.is_cancelled() {
                return None;
            }
            let bp = &records[index];
            let outcome = score(bp, &query);
            bp.matches.write(buffer, &outcome);
            if outcome.is_match() {
                hits.push((index, outcome.score));
            }
        }

        if cancel.is_cancelled() {
            return None;
        }
        hits.sort_by(|a, b| b.1.cmp(&a.1));
        Some(hits.into_iter().map(|(index, _)| index).collect())
    }
}
