//! Plain-text rendering of result sets, record trees and reference lists.
//!
//! Everything here returns a `String` so the CLI and the tests share one
//! code path; nothing writes to the terminal directly.

use bpx_core::config::DisplayConfig;
use bpx_core::document::{prune, Element, Nesting, NodeKind};
use bpx_core::matcher::BufferId;
use bpx_core::{BlueprintDb, DocumentError, LoadReport};
use std::fmt::Write as _;

/// Shorten `value` to at most `max` characters, marking the cut with `…`.
pub fn truncate(value: &str, max: usize) -> String {
    match value.char_indices().nth(max) {
        Some((cut, _)) => format!("{}…", &value[..cut]),
        None => value.to_string(),
    }
}

/// One line per result: name, type, namespace, score and GUID, in columns.
///
/// Scores are read from `buffer`, the buffer the ranking was computed in.
/// `limit` of 0 prints every row.
pub fn result_rows(db: &BlueprintDb, results: &[usize], buffer: BufferId, limit: usize) -> String {
    let shown = if limit == 0 { results.len() } else { limit.min(results.len()) };
    let rows: Vec<[String; 5]> = results[..shown]
        .iter()
        .filter_map(|&i| db.by_index(i).map(|bp| (i, bp)))
        .map(|(i, bp)| {
            [
                bp.name().to_string(),
                bp.type_name().to_string(),
                bp.namespace().to_string(),
                db.score(i, buffer).to_string(),
                bp.guid_text().to_string(),
            ]
        })
        .collect();

    let mut widths = [0usize; 4];
    for row in &rows {
        for (w, cell) in widths.iter_mut().zip(row.iter()) {
            *w = (*w).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    for [name, type_name, namespace, score, guid] in &rows {
        let _ = writeln!(
            out,
            "{name:<w0$}  {type_name:<w1$}  {namespace:<w2$}  {score:>w3$}  {guid}",
            w0 = widths[0],
            w1 = widths[1],
            w2 = widths[2],
            w3 = widths[3],
        );
    }
    if shown < results.len() {
        let _ = writeln!(out, "… {} more", results.len() - shown);
    }
    out
}

/// Indented tree view of a record.
///
/// Empty containers are shown inline as `key: []` or `key: {}`.
///
/// With a non-empty `filter`, only branches whose key or value contains it
/// (ignoring case) are shown, together with everything under a matching
/// container. Reference leaves are followed by the link marker and the target.
pub fn tree(db: &BlueprintDb, index: usize, filter: &str, display: &DisplayConfig) -> Result<String, DocumentError> {
    let Some(bp) = db.by_index(index) else {
        return Ok(String::new());
    };
    let elements: Vec<Element> = bp.elements()?.collect();
    let filter = filter.trim().to_lowercase();
    let mask = prune(&elements, |e| {
        filter.is_empty()
            || e.key.to_lowercase().contains(&filter)
            || e.value.as_ref().is_some_and(|v| v.to_lowercase().contains(&filter))
    });

    let mut out = String::new();
    let mut depth = 0usize;
    for (element, keep) in elements.iter().zip(mask) {
        match element.nesting {
            Nesting::Enter => {
                if keep {
                    let empty = match (element.is_empty_container(), element.kind) {
                        (true, NodeKind::Array) => ": []",
                        (true, _) => ": {}",
                        (false, _) => "",
                    };
                    let _ = writeln!(out, "{:indent$}{}{empty}", "", element.key, indent = depth * 2);
                }
                depth += 1;
            }
            Nesting::Exit => depth = depth.saturating_sub(1),
            Nesting::Leaf => {
                if !keep {
                    continue;
                }
                let value = element.value.as_deref().unwrap_or_default();
                let _ = write!(
                    out,
                    "{:indent$}{}: {}",
                    "",
                    element.key,
                    truncate(value, display.truncate_values),
                    indent = depth * 2
                );
                if let Some(target) = element.link {
                    let name = db.get(&target).map(|t| t.name()).unwrap_or("<missing>");
                    let _ = write!(out, " {} {name}", display.link_marker);
                }
                out.push('\n');
            }
        }
    }
    Ok(out)
}

/// Forward edges (with their paths) and back-references of a record.
pub fn references(db: &BlueprintDb, index: usize) -> String {
    let mut out = String::new();
    let edges = db.edges_from(index);
    let _ = writeln!(out, "references ({}):", edges.len());
    for edge in edges {
        let target = db.get(&edge.target).map(|t| t.name()).unwrap_or("<missing>");
        let _ = writeln!(out, "  {}  {}  {}", edge.path, target, edge.target);
    }

    let back: Vec<usize> = db.back_references(index).collect();
    let _ = writeln!(out, "referenced by ({}):", back.len());
    for source in back {
        if let Some(bp) = db.by_index(source) {
            let _ = writeln!(out, "  {}  {}", bp.name(), bp.guid_text());
        }
    }
    out
}

/// Distinct component types embedded in a record.
pub fn components(db: &BlueprintDb, index: usize) -> String {
    db.components(index)
        .into_iter()
        .map(|t| format!("{}  {}\n", t.name, t.type_guid))
        .collect()
}

/// One-line load summary followed by one line per skipped record.
pub fn load_summary(report: &LoadReport) -> String {
    let mut out = format!(
        "loaded {} of {} blueprints ({} skipped, {} references, {} dangling)\n",
        report.loaded,
        report.total,
        report.skipped.len(),
        report.edges,
        report.dangling,
    );
    for skipped in &report.skipped {
        let _ = writeln!(out, "  skipped {} {:?}: {}", skipped.guid, skipped.name, skipped.error);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use bpx_core::{Guid, RawRecord};

    #[test]
    fn truncate_counts_characters() {
        assert_eq!(truncate("fireball", 4), "fire…");
        assert_eq!(truncate("fire", 4), "fire");
        assert_eq!(truncate("éèêë", 2), "éè…");
    }

    #[test]
    fn tree_marks_links_and_empty_containers() {
        let (target, missing) = (Guid::from_u128(2), Guid::from_u128(9));
        let payload = format!(r#"{{"m_Buff":"!bp_{target}","m_Missing":"!bp_{missing}","m_Flags":[],"m_Extra":{{}}}}"#);
        let db = BlueprintDb::load(
            vec![
                RawRecord::new(Guid::from_u128(1).to_string(), "Caster", "T", payload),
                RawRecord::new(target.to_string(), "Haste", "T", "{}"),
            ],
            &Default::default(),
        );
        let text = tree(&db, 0, "", &DisplayConfig::default()).unwrap();
        assert_eq!(
            text,
            format!(
                "Caster\n  m_Buff: !bp_{target} -> Haste\n  m_Missing: !bp_{missing} -> <missing>\n  m_Flags: []\n  m_Extra: {{}}\n"
            )
        );
    }
}
