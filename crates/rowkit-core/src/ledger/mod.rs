//! # Run Ledger
//!
//! Every committed provisioning run leaves one JSON file behind:
//!
//! ```text
//! <root>/<profile>_<scenario>/run_<run_id>.json
//! ```
//!
//! The file records the primary keys the database generated, which is all
//! rollback needs. Entries are written once and never modified; a rollback
//! leaves its entry in place.

pub mod types;

use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

use self::types::{LedgerSummary, RunLedgerEntry};
use crate::error::{Result, RowKitError};

/// Default ledger root, relative to the working directory.
pub const DEFAULT_LEDGER_DIR: &str = "work";

/// File-backed store of run ledger entries.
#[derive(Debug, Clone)]
pub struct RunLedger {
    root: PathBuf,
}

impl RunLedger {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Where `entry` is (or would be) stored.
    pub fn entry_path(&self, entry: &RunLedgerEntry) -> PathBuf {
        self.root
            .join(group_dir_name(&entry.profile, &entry.scenario))
            .join(format!("run_{}.json", entry.run_id))
    }

    /// Persist a new entry and return its path.
    ///
    /// Writes to a temporary file in the target directory, syncs it, then
    /// renames it into place, so a crash never leaves a half-written entry.
    /// An existing entry with the same path is never overwritten.
    pub fn save(&self, entry: &RunLedgerEntry) -> Result<PathBuf> {
        use std::io::Write;

        let path = self.entry_path(entry);
        let dir = path.parent().unwrap_or(&self.root).to_path_buf();

        if path.exists() {
            return Err(RowKitError::Ledger {
                message: format!(
                    "Entry for run {} already exists at {}",
                    entry.run_id,
                    path.display()
                ),
            });
        }

        fs::create_dir_all(&dir).map_err(|e| RowKitError::Io {
            message: format!("Failed to create ledger directory {}", dir.display()),
            source: e,
        })?;

        let json = serde_json::to_string_pretty(entry).map_err(|e| RowKitError::Ledger {
            message: format!("Failed to serialize entry for run {}: {}", entry.run_id, e),
        })?;

        let tmp_path = dir.join(format!(".run_{}.json.tmp", entry.run_id));
        let mut file = fs::File::create(&tmp_path).map_err(|e| RowKitError::Io {
            message: format!("Failed to create temp ledger file at {}", tmp_path.display()),
            source: e,
        })?;
        file.write_all(json.as_bytes())
            .map_err(|e| RowKitError::Io {
                message: format!("Failed to write temp ledger file at {}", tmp_path.display()),
                source: e,
            })?;
        file.sync_all().map_err(|e| RowKitError::Io {
            message: "Failed to sync ledger entry to disk".to_string(),
            source: e,
        })?;

        fs::rename(&tmp_path, &path).map_err(|e| RowKitError::Io {
            message: format!(
                "Failed to rename {} → {}",
                tmp_path.display(),
                path.display()
            ),
            source: e,
        })?;

        Ok(path)
    }

    /// Read one entry from disk.
    pub fn load(path: &Path) -> Result<RunLedgerEntry> {
        let content = fs::read_to_string(path).map_err(|e| RowKitError::Io {
            message: format!("Failed to read ledger entry {}", path.display()),
            source: e,
        })?;
        serde_json::from_str(&content).map_err(|e| RowKitError::Ledger {
            message: format!("Failed to parse {}: {}", path.display(), e),
        })
    }

    /// Summaries of every readable entry, newest run id first.
    ///
    /// A missing root yields an empty list. Unreadable or malformed files are
    /// skipped with a warning.
    pub fn list_all(&self) -> Result<Vec<LedgerSummary>> {
        let mut summaries = Vec::new();
        if !self.root.is_dir() {
            return Ok(summaries);
        }

        for group in read_dir_sorted(&self.root)? {
            if !group.is_dir() {
                continue;
            }
            for path in group_entries(&group) {
                if !is_entry_file(&path) {
                    continue;
                }
                match Self::load(&path) {
                    Ok(entry) => summaries.push(LedgerSummary::from_entry(&entry, path)),
                    Err(e) => warn!("Skipping ledger file {}: {}", path.display(), e),
                }
            }
        }

        summaries.sort_by(|a, b| b.run_id.cmp(&a.run_id));
        Ok(summaries)
    }

    /// Summaries for one profile/scenario pair, newest first.
    pub fn list_for(&self, profile: &str, scenario: &str) -> Result<Vec<LedgerSummary>> {
        Ok(self
            .list_all()?
            .into_iter()
            .filter(|s| s.profile == profile && s.scenario == scenario)
            .collect())
    }

    /// Find an entry by run id.
    ///
    /// Run ids are only unique per profile/scenario directory; when several
    /// directories hold the same id the first one in listing order wins.
    pub fn find(&self, run_id: &str) -> Result<(RunLedgerEntry, PathBuf)> {
        let summary = self
            .list_all()?
            .into_iter()
            .find(|s| s.run_id == run_id)
            .ok_or_else(|| RowKitError::Ledger {
                message: format!(
                    "No run with id {} under {}",
                    run_id,
                    self.root.display()
                ),
            })?;
        let entry = Self::load(&summary.path)?;
        Ok((entry, summary.path))
    }

    /// The most recent entry, if any.
    pub fn latest(&self) -> Result<Option<(RunLedgerEntry, PathBuf)>> {
        match self.list_all()?.into_iter().next() {
            Some(summary) => {
                let entry = Self::load(&summary.path)?;
                Ok(Some((entry, summary.path)))
            }
            None => Ok(None),
        }
    }
}

/// Directory name for a profile/scenario pair. Path separators are replaced
/// so an odd name can never escape the ledger root.
pub fn group_dir_name(profile: &str, scenario: &str) -> String {
    let clean = |s: &str| s.replace(['/', '\\'], "_").replace("..", "_");
    format!("{}_{}", clean(profile), clean(scenario))
}

fn is_entry_file(path: &Path) -> bool {
    path.is_file()
        && path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.starts_with("run_") && n.ends_with(".json"))
}

/// Files of one profile/scenario directory. An unreadable directory is
/// skipped with a warning rather than failing the whole listing.
fn group_entries(group: &Path) -> Vec<PathBuf> {
    match read_dir_sorted(group) {
        Ok(paths) => paths,
        Err(e) => {
            warn!("Skipping ledger directory {}: {}", group.display(), e);
            Vec::new()
        }
    }
}

fn read_dir_sorted(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = fs::read_dir(dir).map_err(|e| RowKitError::Io {
        message: format!("Failed to list {}", dir.display()),
        source: e,
    })?;
    let mut paths: Vec<PathBuf> = entries.filter_map(|e| e.ok().map(|e| e.path())).collect();
    paths.sort();
    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::IndexMap;
    use tempfile::tempdir;

    fn make_entry(run_id: &str, profile: &str, scenario: &str) -> RunLedgerEntry {
        let mut rows = IndexMap::new();
        rows.insert("users".to_string(), vec![1, 2, 3]);
        rows.insert("orders".to_string(), vec![10, 11]);
        let mut entry = RunLedgerEntry::new(profile.to_string(), scenario.to_string(), rows);
        entry.run_id = run_id.to_string();
        entry.seed = Some(42);
        entry
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempdir().unwrap();
        let ledger = RunLedger::new(dir.path());

        let entry = make_entry("20250101120000000001", "local", "smoke");
        let path = ledger.save(&entry).unwrap();

        assert_eq!(
            path,
            dir.path()
                .join("local_smoke")
                .join("run_20250101120000000001.json")
        );
        let loaded = RunLedger::load(&path).unwrap();
        assert_eq!(loaded, entry);
        // key order survives the round trip
        let tables: Vec<_> = loaded.inserted_rows.keys().cloned().collect();
        assert_eq!(tables, vec!["users", "orders"]);
    }

    #[test]
    fn test_save_leaves_no_tmp_behind() {
        let dir = tempdir().unwrap();
        let ledger = RunLedger::new(dir.path());
        let entry = make_entry("1", "local", "smoke");
        ledger.save(&entry).unwrap();

        let group = dir.path().join("local_smoke");
        let names: Vec<_> = fs::read_dir(&group)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["run_1.json"]);
    }

    #[test]
    fn test_save_refuses_overwrite() {
        let dir = tempdir().unwrap();
        let ledger = RunLedger::new(dir.path());
        let entry = make_entry("1", "local", "smoke");
        ledger.save(&entry).unwrap();

        let err = ledger.save(&entry).unwrap_err();
        assert!(matches!(err, RowKitError::Ledger { .. }));
    }

    #[test]
    fn test_list_all_newest_first_and_skips_bad_files() {
        let dir = tempdir().unwrap();
        let ledger = RunLedger::new(dir.path());

        ledger.save(&make_entry("20250101000000000001", "local", "smoke")).unwrap();
        ledger.save(&make_entry("20250301000000000001", "local", "smoke")).unwrap();
        ledger.save(&make_entry("20250201000000000001", "ci", "full")).unwrap();

        fs::write(dir.path().join("local_smoke").join("run_broken.json"), "{ nope").unwrap();
        fs::write(dir.path().join("local_smoke").join("notes.txt"), "ignored").unwrap();
        fs::write(dir.path().join("stray.json"), "{}").unwrap();

        let runs = ledger.list_all().unwrap();
        let ids: Vec<_> = runs.iter().map(|r| r.run_id.as_str()).collect();
        assert_eq!(
            ids,
            vec![
                "20250301000000000001",
                "20250201000000000001",
                "20250101000000000001"
            ]
        );
        assert_eq!(runs[0].rows, 5);
        assert_eq!(runs[0].tables, 2);

        let smoke = ledger.list_for("local", "smoke").unwrap();
        assert_eq!(smoke.len(), 2);
    }

    #[test]
    fn test_list_missing_root_is_empty() {
        let dir = tempdir().unwrap();
        let ledger = RunLedger::new(dir.path().join("does-not-exist"));
        assert!(ledger.list_all().unwrap().is_empty());
        assert!(ledger.latest().unwrap().is_none());
    }

    #[test]
    fn test_find_and_latest() {
        let dir = tempdir().unwrap();
        let ledger = RunLedger::new(dir.path());
        ledger.save(&make_entry("100", "local", "smoke")).unwrap();
        ledger.save(&make_entry("200", "local", "smoke")).unwrap();

        let (entry, _) = ledger.find("100").unwrap();
        assert_eq!(entry.run_id, "100");
        assert!(ledger.find("999").is_err());

        let (latest, _) = ledger.latest().unwrap().unwrap();
        assert_eq!(latest.run_id, "200");
    }

    #[test]
    fn test_unreadable_group_is_skipped() {
        let dir = tempdir().unwrap();
        let ledger = RunLedger::new(dir.path());
        ledger.save(&make_entry("100", "local", "smoke")).unwrap();

        assert!(group_entries(&dir.path().join("local_gone")).is_empty());
        assert_eq!(group_entries(&dir.path().join("local_smoke")).len(), 1);
        assert_eq!(ledger.list_all().unwrap().len(), 1);
    }

    #[test]
    fn test_group_dir_name_stays_inside_root() {
        assert_eq!(group_dir_name("local", "smoke"), "local_smoke");
        assert_eq!(group_dir_name("../etc", "a/b"), "__etc_a_b");
    }
}
