//! Local profile import.
//!
//! Loads a JSON-lines export of evaluated profiles into the store. Each
//! line holds one system: `{"inventory_id": "...", "profile": {...}}`.

use crate::store::SqliteProfileStore;
use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::Path;
use tracing::{debug, info};

#[derive(Debug, Deserialize)]
struct ImportRecord {
    inventory_id: String,
    profile: serde_json::Value,
}

/// Counts from one import.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportStats {
    /// Records read from the file.
    pub read: usize,
    /// Records inserted; the rest already existed.
    pub inserted: usize,
}

/// Parse a JSON-lines export into `(inventory_id, profile_json)` rows.
///
/// Blank lines are skipped. Profiles are stored as given; they are
/// validated when sampled.
pub fn parse_import(content: &str) -> Result<Vec<(String, String)>> {
    let mut rows = Vec::new();

    for (index, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let record: ImportRecord = serde_json::from_str(line)
            .with_context(|| format!("Invalid import record on line {}", index + 1))?;
        if record.inventory_id.trim().is_empty() {
            bail!("Empty inventory_id on line {}", index + 1);
        }
        rows.push((record.inventory_id, record.profile.to_string()));
    }

    Ok(rows)
}

/// Import a JSON-lines file into the store in one transaction.
pub fn import_profiles(store: &mut SqliteProfileStore, path: &Path) -> Result<ImportStats> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read import file: {}", path.display()))?;

    let rows = parse_import(&content)?;
    debug!("Parsed {} records from {}", rows.len(), path.display());

    let inserted = store
        .insert_profiles(&rows)
        .context("Failed to write profiles to the store")?;
    info!(
        "Imported {} of {} profiles ({} already present)",
        inserted,
        rows.len(),
        rows.len() - inserted
    );

    Ok(ImportStats {
        read: rows.len(),
        inserted,
    })
}
