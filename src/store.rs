use std::io::Write;
use std::path::Path;

use anyhow::Context;
use serde::Serialize;
use tempfile::NamedTempFile;

use crate::models::{Dataset, WeekIndex};

pub const WORKBOOK_FILE: &str = "AEM_Sites_Optimizer-CustomerExperience.xlsx";
pub const DATASET_FILE: &str = "customers.json";
pub const WEEK_INDEX_FILE: &str = "weeks.json";

pub fn load_dataset(path: &Path) -> anyhow::Result<Dataset> {
    if !path.exists() {
        anyhow::bail!("data file not found at {}", path.display());
    }

    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let dataset: Dataset = serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse {}", path.display()))?;

    Ok(dataset)
}

pub fn save_dataset(path: &Path, dataset: &Dataset) -> anyhow::Result<()> {
    write_json_atomic(path, dataset)
}

pub fn save_week_index(path: &Path, dataset: &Dataset) -> anyhow::Result<()> {
    write_json_atomic(path, &WeekIndex::from_dataset(dataset))
}

/// Writes the dataset, then the week index derived from it.
///
/// The dataset goes first: it is the source of truth and the index can be
/// rebuilt from it, so a failed index write leaves an index that merely
/// lacks the newest week instead of one naming weeks with no records.
pub fn save_dataset_with_index(
    dataset_path: &Path,
    week_index_path: &Path,
    dataset: &Dataset,
) -> anyhow::Result<()> {
    save_dataset(dataset_path, dataset)?;
    save_week_index(week_index_path, dataset).with_context(|| {
        format!(
            "{} was saved but the week index {} is stale",
            dataset_path.display(),
            week_index_path.display()
        )
    })
}

/// Serializes `value` completely, then swaps it in with a rename so readers
/// only ever see the previous or the new document.
pub fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> anyhow::Result<()> {
    let mut body = serde_json::to_string_pretty(value).context("failed to serialize json")?;
    body.push('\n');

    let dir = path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create {}", dir.display()))?;

    let mut tmp = NamedTempFile::new_in(dir)
        .with_context(|| format!("failed to create temp file in {}", dir.display()))?;
    tmp.write_all(body.as_bytes())?;
    tmp.as_file().sync_all()?;
    tmp.persist(path)
        .with_context(|| format!("failed to write {}", path.display()))?;

    Ok(())
}
