//! Record table: every loaded blueprint, its reference graph and its match
//! scratch space.
//!
//! Loading runs in strictly ordered phases:
//!
//! ```text
//! admit (guid, dedupe) ──► parse ──► forward edges ──► back-index
//! ```
//!
//! The back-index is only built once the forward edges of every record exist.
//! Records whose payload does not parse stay in the table (so they can be
//! looked up and shown as skipped) but are not searchable and are not graph
//! nodes: they have no edges, and edges pointing at them count as dangling.

use crate::config::SearchConfig;
use crate::document::{type_refs, TypeRef};
use crate::error::LoadError;
use crate::graph::{self, BackIndex, Edge};
use crate::matcher::{BufferId, MatchEngine, MatchRecord};
use crate::scheduler::Searcher;
use crate::types::{Blueprint, Guid, RawRecord};
use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};
use std::ops::Range;
use tokio_util::sync::CancellationToken;

/// Parse progress, reported once per admitted record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadProgress {
    pub loaded: usize,
    pub total: usize,
}

/// A dump entry that did not make it into search.
#[derive(Debug)]
pub struct SkippedRecord {
    pub guid: String,
    pub name: String,
    pub error: LoadError,
}

/// Summary of a load, for the presentation layer.
#[derive(Debug)]
pub struct LoadReport {
    /// Entries in the dump.
    pub total: usize,
    /// Entries that are searchable.
    pub loaded: usize,
    pub skipped: Vec<SkippedRecord>,
    /// Forward edges extracted, dangling ones included.
    pub edges: usize,
    /// Forward edges whose target is not a loaded record.
    pub dangling: usize,
    pub loaded_at: chrono::DateTime<chrono::Utc>,
}

pub struct BlueprintDb {
    records: Vec<Blueprint>,
    by_guid: HashMap<Guid, usize>,
    searchable: Vec<usize>,
    edges: Vec<Edge>,
    edge_spans: Vec<Range<usize>>,
    back: BackIndex,
    engine: MatchEngine,
    report: LoadReport,
}

impl BlueprintDb {
    pub fn load(raw: Vec<RawRecord>, config: &SearchConfig) -> BlueprintDb {
        Self::load_with_progress(raw, config, |_| {})
    }

    pub fn load_with_progress<F>(raw: Vec<RawRecord>, config: &SearchConfig, mut progress: F) -> BlueprintDb
    where
        F: FnMut(LoadProgress),
    {
        let total = raw.len();
        let mut records: Vec<Blueprint> = Vec::with_capacity(total);
        let mut by_guid: HashMap<Guid, usize> = HashMap::with_capacity(total);
        let mut skipped = Vec::new();

        for entry in raw {
            let Some(guid) = Guid::parse(&entry.guid) else {
                tracing::warn!(guid = %entry.guid, name = %entry.name, "skipping record with invalid guid");
                skipped.push(SkippedRecord {
                    error: LoadError::BadGuid {
                        guid: entry.guid.clone(),
                        name: entry.name.clone(),
                    },
                    guid: entry.guid,
                    name: entry.name,
                });
                continue;
            };
            match by_guid.entry(guid) {
                Entry::Occupied(first) => {
                    let first = records[*first.get()].name().to_string();
                    tracing::warn!(%guid, name = %entry.name, %first, "skipping duplicate guid");
                    skipped.push(SkippedRecord {
                        guid: entry.guid,
                        name: entry.name,
                        error: LoadError::DuplicateGuid { guid, first },
                    });
                }
                Entry::Vacant(slot) => {
                    slot.insert(records.len());
                    records.push(Blueprint::new(guid, entry.name, entry.type_name, entry.raw));
                }
            }
        }

        let mut searchable = Vec::with_capacity(records.len());
        for (i, bp) in records.iter().enumerate() {
            match bp.tree() {
                Ok(_) => searchable.push(i),
                Err(err) => {
                    tracing::warn!(guid = %bp.guid(), name = %bp.name(), error = %err, "skipping malformed record");
                    skipped.push(SkippedRecord {
                        guid: bp.guid_text().to_string(),
                        name: bp.name().to_string(),
                        error: err.into(),
                    });
                }
            }
            progress(LoadProgress {
                loaded: i + 1,
                total: records.len(),
            });
        }

        let edges = graph::build_edges(&records);
        let edge_spans = spans_by_source(&edges, records.len());

        let back = graph::build_back_index(&edges, |target| {
            by_guid
                .get(target)
                .copied()
                .filter(|&i| records[i].tree().is_ok())
        });

        let report = LoadReport {
            total,
            loaded: searchable.len(),
            skipped,
            edges: edges.len(),
            dangling: back.dangling(),
            loaded_at: chrono::Utc::now(),
        };
        tracing::info!(
            total = report.total,
            loaded = report.loaded,
            skipped = report.skipped.len(),
            edges = report.edges,
            dangling = report.dangling,
            "blueprints loaded"
        );

        BlueprintDb {
            records,
            by_guid,
            searchable,
            edges,
            edge_spans,
            back,
            engine: MatchEngine::new(config.cancel_check_interval),
            report,
        }
    }

    // -----------------------------------------------------------------------
    // Lookup
    // -----------------------------------------------------------------------

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// All admitted records, in load order.
    pub fn records(&self) -> &[Blueprint] {
        &self.records
    }

    pub fn by_index(&self, index: usize) -> Option<&Blueprint> {
        self.records.get(index)
    }

    pub fn index_of(&self, guid: &Guid) -> Option<usize> {
        self.by_guid.get(guid).copied()
    }

    pub fn get(&self, guid: &Guid) -> Option<&Blueprint> {
        self.index_of(guid).map(|i| &self.records[i])
    }

    /// First record, in load order, whose name equals `name` ignoring case.
    pub fn find_by_name(&self, name: &str) -> Option<usize> {
        let name = name.to_lowercase();
        self.records.iter().position(|bp| bp.name_lower == name)
    }

    /// Resolve a GUID or a record name.
    pub fn resolve(&self, text: &str) -> Option<usize> {
        Guid::parse(text)
            .and_then(|guid| self.index_of(&guid))
            .or_else(|| self.find_by_name(text))
    }

    pub fn report(&self) -> &LoadReport {
        &self.report
    }

    /// Indices of the records that take part in search, in load order.
    pub fn searchable(&self) -> &[usize] {
        &self.searchable
    }

    pub fn is_searchable(&self, index: usize) -> bool {
        self.searchable.binary_search(&index).is_ok()
    }

    // -----------------------------------------------------------------------
    // Graph
    // -----------------------------------------------------------------------

    /// Every forward edge, grouped by source in load order.
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn edges_from(&self, index: usize) -> &[Edge] {
        self.edge_spans
            .get(index)
            .map(|span| &self.edges[span.clone()])
            .unwrap_or(&[])
    }

    /// Targets referenced by a record, in traversal order, duplicates kept.
    /// Empty for a malformed record.
    pub fn direct_references(&self, index: usize) -> Vec<Guid> {
        self.records
            .get(index)
            .and_then(|bp| bp.direct_references().ok())
            .unwrap_or_default()
    }

    /// Records referencing `index`, in load order.
    pub fn back_references(&self, index: usize) -> impl Iterator<Item = usize> + '_ {
        self.back.referrers(index)
    }

    pub fn back_index(&self) -> &BackIndex {
        &self.back
    }

    /// Distinct types of the objects embedded in a record, excluding the
    /// record's own root type.
    pub fn components(&self, index: usize) -> Vec<TypeRef> {
        let Some(tree) = self.records.get(index).and_then(|bp| bp.tree().ok()) else {
            return Vec::new();
        };
        let root = tree.get("$type").and_then(|t| t.as_str()).and_then(TypeRef::parse);
        let mut seen = HashSet::new();
        type_refs(tree)
            .into_iter()
            .skip(usize::from(root.is_some()))
            .filter(|t| seen.insert(t.type_guid.clone()))
            .collect()
    }

    // -----------------------------------------------------------------------
    // Matching
    // -----------------------------------------------------------------------

    /// Scores left in `buffer` by the last search that ran in it.
    pub fn matches(&self, index: usize, buffer: BufferId) -> MatchRecord {
        self.records[index].matches.read(buffer)
    }

    pub fn score(&self, index: usize, buffer: BufferId) -> u32 {
        self.records[index].matches.score(buffer)
    }

    /// Rank every searchable record against `query`, writing into `buffer`.
    pub fn score_all(&self, query: &str, buffer: BufferId, cancel: &CancellationToken) -> Option<Vec<usize>> {
        self.engine
            .score_all(&self.records, &self.searchable, query, buffer, cancel)
    }
}

impl Searcher for BlueprintDb {
    fn search(&self, query: &str, buffer: BufferId, cancel: &CancellationToken) -> Option<Vec<usize>> {
        self.score_all(query, buffer, cancel)
    }
}

fn spans_by_source(edges: &[Edge], records: usize) -> Vec<Range<usize>> {
    let mut spans = vec![0..0; records];
    let mut start = 0;
    while start < edges.len() {
        let source = edges[start].source;
        let end = start + edges[start..].iter().take_while(|e| e.source == source).count();
        spans[source] = start..end;
        start = end;
    }
    spans
}
