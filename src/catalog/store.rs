//! Flat-file stores for the decision-prompt catalog and the character
//! roster. Both are read and rewritten wholesale as a single JSON blob;
//! there is no cross-process locking. The resolver's single-flight guard is
//! the only thing keeping the read-modify-write sequence safe, so these
//! stores must never be shared with a second concurrent access path.

use anyhow::{Context, Result};
use std::{fs, path::PathBuf, sync::RwLock};

use super::models::{CatalogRecord, Choice, EventKind};

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_info, log_warn};

pub struct CatalogStore {
    path: PathBuf,
    data: RwLock<Vec<CatalogRecord>>,
}

impl CatalogStore {
    /// Load the whole catalog. A missing file is an empty catalog; a
    /// corrupt file is treated the same after a warning.
    pub fn new(path: PathBuf) -> Result<Self> {
        let data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read catalog from {}", path.display()))?;
            match serde_json::from_str(&contents) {
                Ok(records) => records,
                Err(err) => {
                    log_warn!("catalog file {} is unreadable: {err}", path.display());
                    Vec::new()
                }
            }
        } else {
            Vec::new()
        };

        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    pub fn len(&self) -> usize {
        self.data.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn records(&self) -> Vec<CatalogRecord> {
        self.data.read().unwrap().clone()
    }

    /// Candidate filter + first-prefix-match selection, in original catalog
    /// order. Trainee prompts are owned per character, so they filter on
    /// ownership; everything else filters on the prompt kind.
    pub fn find_match(
        &self,
        kind: EventKind,
        active_character: &str,
        ocr_title: &str,
    ) -> Option<CatalogRecord> {
        let title = ocr_title.trim();
        if title.is_empty() {
            return None;
        }

        let guard = self.data.read().unwrap();
        guard
            .iter()
            .filter(|record| match kind {
                EventKind::Trainee => record.owned_by(active_character),
                _ => record.kind == kind,
            })
            .find(|record| record.title_matches(title))
            .cloned()
    }

    /// Populate a record's choices and rewrite the catalog file. Cached
    /// choices are immutable: a second write to the same record is a
    /// logged no-op.
    pub fn set_choices(&self, archive_id: i64, choices: Vec<Choice>) -> Result<()> {
        let mut guard = self.data.write().unwrap();

        let Some(record) = guard.iter_mut().find(|r| r.archive_id == archive_id) else {
            anyhow::bail!("no catalog record with archive id {archive_id}");
        };

        if record.has_choices() {
            log_warn!(
                "record {} ({}) already has choices; keeping cached data",
                archive_id,
                record.title
            );
            return Ok(());
        }

        record.choices = Some(choices);
        log_info!("cached choices for record {} ({})", archive_id, record.title);
        self.persist(&guard)
    }

    fn persist(&self, data: &[CatalogRecord]) -> Result<()> {
        let serialized = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("Failed to write catalog to {}", self.path.display()))
    }

    #[cfg(test)]
    pub(crate) fn with_records(path: PathBuf, records: Vec<CatalogRecord>) -> Self {
        Self {
            path,
            data: RwLock::new(records),
        }
    }
}

/// Flat list of valid character names used to reject OCR noise during
/// character detection.
pub struct RosterStore {
    data: RwLock<Vec<String>>,
}

impl RosterStore {
    pub fn new(path: PathBuf) -> Result<Self> {
        let data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read roster from {}", path.display()))?;
            serde_json::from_str(&contents).unwrap_or_default()
        } else {
            Vec::new()
        };

        Ok(Self {
            data: RwLock::new(data),
        })
    }

    pub fn from_names(names: Vec<String>) -> Self {
        Self {
            data: RwLock::new(names),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return false;
        }
        self.data
            .read()
            .unwrap()
            .iter()
            .any(|known| known.eq_ignore_ascii_case(trimmed))
    }

    pub fn names(&self) -> Vec<String> {
        self.data.read().unwrap().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn record(index: i64, title: &str, kind: EventKind, owner: &str) -> CatalogRecord {
        CatalogRecord {
            index,
            archive_id: 100 + index,
            title: title.into(),
            kind,
            owning_character: owner.into(),
            choices: None,
        }
    }

    #[test]
    fn missing_file_is_empty_catalog() {
        let dir = tempdir().unwrap();
        let store = CatalogStore::new(dir.path().join("events.json")).unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn corrupt_file_is_empty_catalog() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("events.json");
        fs::write(&path, "[{broken").unwrap();
        let store = CatalogStore::new(path).unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn find_match_filters_scenario_by_kind() {
        let dir = tempdir().unwrap();
        let store = CatalogStore::with_records(
            dir.path().join("events.json"),
            vec![
                record(0, "Sick", EventKind::Support, "Kitasan Black"),
                record(1, "Sick", EventKind::Scenario, ""),
            ],
        );

        let found = store.find_match(EventKind::Scenario, "", "Sick Day").unwrap();
        assert_eq!(found.index, 1);
    }

    #[test]
    fn find_match_trainee_filters_by_owner_only() {
        let dir = tempdir().unwrap();
        let store = CatalogStore::with_records(
            dir.path().join("events.json"),
            vec![
                record(0, "Extra Training", EventKind::Trainee, "Gold Ship"),
                record(1, "Extra Training", EventKind::Trainee, "All Umamusume"),
            ],
        );

        let found = store
            .find_match(EventKind::Trainee, "Special Week", "Extra Training!")
            .unwrap();
        assert_eq!(found.index, 1);

        let owned = store
            .find_match(EventKind::Trainee, "Gold Ship", "Extra Training!")
            .unwrap();
        assert_eq!(owned.index, 0);
    }

    #[test]
    fn find_match_prefers_first_in_catalog_order() {
        let dir = tempdir().unwrap();
        let store = CatalogStore::with_records(
            dir.path().join("events.json"),
            vec![
                record(0, "New Year", EventKind::Scenario, ""),
                record(1, "New Year's Resolution", EventKind::Scenario, ""),
            ],
        );

        let found = store
            .find_match(EventKind::Scenario, "", "New Year's Resolution")
            .unwrap();
        assert_eq!(found.index, 0);
    }

    #[test]
    fn find_match_rejects_blank_titles() {
        let dir = tempdir().unwrap();
        let store = CatalogStore::with_records(
            dir.path().join("events.json"),
            vec![record(0, "Sick", EventKind::Scenario, "")],
        );
        assert!(store.find_match(EventKind::Scenario, "", "   ").is_none());
    }

    #[test]
    fn set_choices_persists_and_is_write_once() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("events.json");
        let store = CatalogStore::with_records(
            path.clone(),
            vec![record(0, "Sick", EventKind::Scenario, "")],
        );

        let first = vec![Choice {
            number: 1,
            label: None,
            success_outcomes: vec!["Speed +10".into()],
            failure_outcomes: vec![],
        }];
        store.set_choices(100, first.clone()).unwrap();

        // Second write must not clobber the cache
        store
            .set_choices(100, vec![Choice::new(9)])
            .unwrap();

        let reloaded = CatalogStore::new(path).unwrap();
        let records = reloaded.records();
        assert_eq!(records[0].choices.as_ref().unwrap(), &first);
    }

    #[test]
    fn set_choices_unknown_record_is_an_error() {
        let dir = tempdir().unwrap();
        let store = CatalogStore::with_records(dir.path().join("events.json"), vec![]);
        assert!(store.set_choices(42, vec![]).is_err());
    }

    #[test]
    fn roster_contains_ignores_case_and_whitespace() {
        let roster = RosterStore::from_names(vec!["Special Week".into(), "Gold Ship".into()]);
        assert!(roster.contains("special week"));
        assert!(roster.contains("  Gold Ship  "));
        assert!(!roster.contains("Oguri Cap"));
        assert!(!roster.contains("   "));
    }

    #[test]
    fn roster_reads_flat_json_array() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("roster.json");
        fs::write(&path, r#"["Special Week","Silence Suzuka"]"#).unwrap();
        let roster = RosterStore::new(path).unwrap();
        assert_eq!(roster.names().len(), 2);
        assert!(roster.contains("Silence Suzuka"));
    }
}
