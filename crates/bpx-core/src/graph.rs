//! Reference graph: forward edges between blueprints and the back-index.
//!
//! Forward edges come from walking each parsed record (see
//! [`document`](crate::document)). The back-index is built in a strictly
//! later phase, once the forward edges of every record are known.
//!
//! The back-index is a set: a source that references the same target from
//! several fields is listed once for that target. Referrers are kept in load
//! order.

use crate::document::{traverse, Nesting};
use crate::error::DocumentError;
use crate::types::{Blueprint, Guid};
use std::collections::{BTreeSet, HashMap};

/// A directed reference from one record to another.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edge {
    /// Index of the referring record in the record table.
    pub source: usize,
    /// Slash-joined path of the referring field, for display only.
    pub path: String,
    pub target: Guid,
}

/// Forward edges of one record, in traversal order.
pub fn edges_of(source: usize, bp: &Blueprint) -> Result<Vec<Edge>, DocumentError> {
    let tree = bp.tree()?;
    Ok(traverse(tree, bp.name())
        .with_paths()
        .filter(|(e, _)| e.nesting == Nesting::Leaf)
        .filter_map(|(e, path)| {
            e.link.map(|target| Edge {
                source,
                path,
                target,
            })
        })
        .collect())
}

/// Forward edges of every record that parses, grouped by source in load
/// order. Records whose payload is malformed contribute nothing.
pub fn build_edges(records: &[Blueprint]) -> Vec<Edge> {
    records
        .iter()
        .enumerate()
        .filter_map(|(i, bp)| edges_of(i, bp).ok())
        .flatten()
        .collect()
}

/// Reverse adjacency: for each record, the records that reference it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BackIndex {
    referrers: HashMap<usize, BTreeSet<usize>>,
    dangling: usize,
}

impl BackIndex {
    /// Indices of the records referencing `target`, in load order.
    pub fn referrers(&self, target: usize) -> impl Iterator<Item = usize> + '_ {
        self.referrers.get(&target).into_iter().flatten().copied()
    }

    pub fn referrer_count(&self, target: usize) -> usize {
        self.referrers.get(&target).map_or(0, BTreeSet::len)
    }

    /// Sum of all referrer set sizes.
    pub fn total(&self) -> usize {
        self.referrers.values().map(BTreeSet::len).sum()
    }

    /// Edges whose target is not in the record table.
    pub fn dangling(&self) -> usize {
        self.dangling
    }
}

/// Build the back-index in a single pass over `edges`.
///
/// `lookup` maps a GUID to its index in the record table; edges whose target
/// it does not know are counted as dangling and otherwise ignored.
pub fn build_back_index<F>(edges: &[Edge], lookup: F) -> BackIndex
where
    F: Fn(&Guid) -> Option<usize>,
{
    let mut index = BackIndex::default();
    for edge in edges {
        match lookup(&edge.target) {
            Some(target) => {
                index.referrers.entry(target).or_default().insert(edge.source);
            }
            None => index.dangling += 1,
        }
    }
    index
}
