//! Loader: reads blueprint dumps from disk.
//!
//! A dump is a JSON Lines file. Every non-blank line is one record:
//!
//! ```text
//! {"guid":"<32 hex>","name":"Fireball","type":"Kingmaker.Blueprints.BlueprintAbility","raw":"{...}"}
//! ```
//!
//! `raw` is the payload as text. It is not parsed here; a payload that turns
//! out to be malformed only costs its own record, later, in the record table.
//! A line that is not a dump entry at all means the dump is corrupt and fails
//! the whole read.

use crate::error::LoadError;
use crate::types::RawRecord;
use std::path::Path;
use tokio::io::AsyncWriteExt;

/// Parse dump text into records, in file order.
pub fn parse_dump(text: &str) -> Result<Vec<RawRecord>, LoadError> {
    text.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(n, line)| {
            serde_json::from_str::<RawRecord>(line).map_err(|err| LoadError::BadLine {
                line: n + 1,
                message: err.to_string(),
            })
        })
        .collect()
}

/// Read and parse the dump at `path`.
pub async fn read_dump(path: &Path) -> Result<Vec<RawRecord>, LoadError> {
    let text = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
    let records = parse_dump(&text)?;
    tracing::debug!(path = %path.display(), records = records.len(), "dump read");
    Ok(records)
}

/// Render records in dump format, one line each.
pub fn render_dump(records: &[RawRecord]) -> String {
    let mut out = String::new();
    for record in records {
        // A struct of four strings always serializes.
        if let Ok(line) = serde_json::to_string(record) {
            out.push_str(&line);
            out.push('\n');
        }
    }
    out
}

/// Write records to `path` in dump format.
pub async fn write_dump(path: &Path, records: &[RawRecord]) -> Result<(), LoadError> {
    let io_err = |source: std::io::Error| LoadError::Io {
        path: path.to_path_buf(),
        source,
    };
    let mut file = tokio::fs::File::create(path).await.map_err(io_err)?;
    file.write_all(render_dump(records).as_bytes()).await.map_err(io_err)?;
    file.flush().await.map_err(io_err)?;
    Ok(())
}
