//! Reference graph integration harness.
//!
//! # What this covers
//!
//! - **Dangling edges excluded**: an edge whose target is not a loaded,
//!   parseable record is counted as dangling and never enters the back-index.
//! - **Back-index completeness**: the back-index sizes sum to the number of
//!   distinct (source, target) pairs among resolvable edges. A source that
//!   references a target from several fields is listed once.
//! - **Load phases**: invalid GUIDs, duplicate GUIDs and malformed payloads
//!   are reported and skipped without stopping the load.
//! - **Components**: distinct embedded `$type`s, root excluded.
//!
//! # Running
//!
//! ```sh
//! cargo test --test graph_harness
//! ```

mod common;
use common::*;

use bpx_core::LoadError;
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use std::collections::HashSet;

// ---------------------------------------------------------------------------
// Forward edges
// ---------------------------------------------------------------------------

#[test]
fn forward_edges_carry_field_paths() {
    let db = db(campaign());
    let fireball = db.find_by_name("Fireball").unwrap();
    let edges: Vec<(&str, String)> = db
        .edges_from(fireball)
        .iter()
        .map(|e| (e.path.as_str(), e.target.to_string()))
        .collect();
    assert_eq!(
        edges,
        vec![
            ("Fireball/Components/0/m_Projectiles/0", guid_text(2)),
            ("Fireball/Components/1/m_School", guid_text(4)),
        ]
    );
}

#[test]
fn report_counts_edges_and_dangling() {
    let db = db(campaign());
    let report = db.report();
    assert_eq!(report.total, 5);
    assert_eq!(report.loaded, 5);
    assert_eq!(report.edges, 6);
    assert_eq!(report.dangling, 1);
    assert!(report.skipped.is_empty());
}

// ---------------------------------------------------------------------------
// Back-index
// ---------------------------------------------------------------------------

#[test]
fn back_references_are_deduplicated_and_load_ordered() {
    let db = db(campaign());
    assert_referrers!(db, "FireballBuff", ["FireballProjectile", "Wizard"]);
    assert_referrers!(db, "FireballProjectile", ["Fireball"]);
    assert_referrers!(db, "EvocationSchool", ["Fireball"]);
    assert_referrers!(db, "Wizard", []);
}

#[test]
fn dangling_edges_never_reach_the_back_index() {
    let db = db(campaign());
    let referrers: usize = (0..db.len()).map(|i| db.back_index().referrer_count(i)).sum();
    assert_eq!(referrers, db.back_index().total());
    assert_eq!(db.back_index().dangling(), 1);
    // Wizard's reference to the missing record is still a forward edge.
    let wizard = db.find_by_name("Wizard").unwrap();
    assert!(db.direct_references(wizard).contains(&guid(99)));
}

#[test]
fn references_into_malformed_records_dangle() {
    let records = vec![
        RecordBuilder::new(1, "Caster").references("m_Spell", 2).build(),
        RecordBuilder::new(2, "Broken").raw("{\"m_Spell\": ").build(),
    ];
    let db = db(records);
    assert_eq!(db.report().loaded, 1);
    assert_eq!(db.report().dangling, 1);
    assert_eq!(db.back_index().total(), 0);
    assert_skipped!(db, guid_text(2), LoadError::Document(_));
    // The broken record is still in the table, just not searchable.
    let broken = db.find_by_name("Broken").unwrap();
    assert!(!db.is_searchable(broken));
    assert!(db.edges_from(broken).is_empty());
}

fn distinct_resolvable_pairs(db: &bpx_core::BlueprintDb) -> usize {
    db.edges()
        .iter()
        .filter_map(|e| db.index_of(&e.target).map(|t| (e.source, t)))
        .filter(|(_, t)| db.is_searchable(*t))
        .collect::<HashSet<_>>()
        .len()
}

#[test]
fn back_index_sizes_sum_to_distinct_pairs() {
    let db = db(campaign());
    assert_eq!(db.back_index().total(), distinct_resolvable_pairs(&db));
    assert_eq!(db.back_index().total(), 4);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// For random graphs, with repeated and missing targets, no edge is lost
    /// or double-counted beyond the per-source dedup.
    #[test]
    fn prop_back_index_is_complete(
        links in prop::collection::vec(prop::collection::vec(1u128..=12, 0..5), 1..10)
    ) {
        let records = links
            .iter()
            .enumerate()
            .map(|(i, targets)| {
                let n = i as u128 + 1;
                let tokens: Vec<String> = targets.iter().map(|&t| short_ref(t)).collect();
                RecordBuilder::new(n, format!("Record{n}")).member("m_Links", tokens).build()
            })
            .collect();
        let db = db(records);

        let edges: usize = links.iter().map(Vec::len).sum();
        let missing: usize = links.iter().flatten().filter(|&&t| t as usize > links.len()).count();
        prop_assert_eq!(db.report().edges, edges);
        prop_assert_eq!(db.back_index().dangling(), missing);
        prop_assert_eq!(db.back_index().total(), distinct_resolvable_pairs(&db));
    }
}

// ---------------------------------------------------------------------------
// Load phases
// ---------------------------------------------------------------------------

#[test]
fn invalid_and_duplicate_guids_are_skipped() {
    let records = vec![
        RecordBuilder::new(1, "First").build(),
        RecordBuilder::new(2, "NoGuid").guid_text("not-a-guid").build(),
        RecordBuilder::new(1, "Second").build(),
    ];
    let db = db(records);
    assert_eq!(db.len(), 1);
    assert_eq!(db.get(&guid(1)).map(|b| b.name()), Some("First"));
    assert_skipped!(db, "not-a-guid", LoadError::BadGuid { .. });
    assert_skipped!(db, guid_text(1), LoadError::DuplicateGuid { .. });
}

#[test]
fn progress_is_reported_once_per_record() {
    let mut seen = Vec::new();
    bpx_core::BlueprintDb::load_with_progress(chain(4), &Default::default(), |p| seen.push((p.loaded, p.total)));
    assert_eq!(seen, vec![(1, 4), (2, 4), (3, 4), (4, 4)]);
}

// ---------------------------------------------------------------------------
// Components
// ---------------------------------------------------------------------------

#[test]
fn components_list_embedded_types_without_root() {
    let db = db(campaign());
    let fireball = db.find_by_name("Fireball").unwrap();
    let names: Vec<String> = db.components(fireball).into_iter().map(|t| t.name).collect();
    assert_eq!(names, vec!["AbilityDeliverProjectile", "SpellComponent"]);

    let buff = db.find_by_name("FireballBuff").unwrap();
    assert!(db.components(buff).is_empty());
}
