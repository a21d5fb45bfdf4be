//! Domain-specific assertion macros for bpx harnesses.
//!
//! These wrap `pretty_assertions` and add failure messages that name the
//! records involved instead of bare table indices.

// ---------------------------------------------------------------------------
// Ranking assertions
// ---------------------------------------------------------------------------

/// Assert that a ranking lists exactly the named records, in order.
///
/// ```rust
/// assert_ranking!(db, results, ["Fireball", "Burn", "Ember"]);
/// ```
#[macro_export]
macro_rules! assert_ranking {
    ($db:expr, $results:expr, [$($name:expr),* $(,)?]) => {{
        let db: &bpx_core::BlueprintDb = &$db;
        let actual: Vec<&str> = $results
            .iter()
            .map(|&i| db.by_index(i).expect("ranked index is in the table").name())
            .collect();
        let expected: Vec<&str> = vec![$($name),*];
        pretty_assertions::assert_eq!(actual, expected, "assert_ranking! failed");
    }};
}

// ---------------------------------------------------------------------------
// Graph assertions
// ---------------------------------------------------------------------------

/// Assert the names of the records referencing `target`, in load order.
///
/// ```rust
/// assert_referrers!(db, "FireballBuff", ["FireballProjectile", "Wizard"]);
/// ```
#[macro_export]
macro_rules! assert_referrers {
    ($db:expr, $target:expr, [$($name:expr),* $(,)?]) => {{
        let db: &bpx_core::BlueprintDb = &$db;
        let target = match db.find_by_name($target) {
            Some(index) => index,
            None => panic!("assert_referrers! failed: no record named {:?}", $target),
        };
        let actual: Vec<&str> = db
            .back_references(target)
            .map(|i| db.by_index(i).expect("referrer is in the table").name())
            .collect();
        let expected: Vec<&str> = vec![$($name),*];
        pretty_assertions::assert_eq!(
            actual, expected,
            "assert_referrers! failed for {:?}", $target
        );
    }};
}

/// Assert that a record was skipped at load time with a matching error.
///
/// ```rust
/// assert_skipped!(db, guid_text(7), bpx_core::LoadError::Document(_));
/// ```
#[macro_export]
macro_rules! assert_skipped {
    ($db:expr, $guid:expr, $pattern:pat) => {{
        let db: &bpx_core::BlueprintDb = &$db;
        let guid: String = $guid.to_string();
        match db.report().skipped.iter().find(|s| s.guid == guid) {
            Some(skipped) if matches!(skipped.error, $pattern) => {}
            Some(skipped) => panic!(
                "assert_skipped! failed: {:?} skipped with unexpected error {:?}",
                guid, skipped.error
            ),
            None => panic!(
                "assert_skipped! failed: {:?} was not skipped.\n  Skipped: {:?}",
                guid,
                db.report().skipped.iter().map(|s| &s.guid).collect::<Vec<_>>()
            ),
        }
    }};
}
