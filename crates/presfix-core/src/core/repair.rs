use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use presfix_domain::{BackupId, CacheKey, ContentDescriptor, Removal, DESCRIPTOR_FILE};
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::fs::{copy_preserving, starts_with_magic};

/// Leading bytes of a cache entry left behind by the broken video importer.
const CORRUPT_MAGIC: &[u8] = b"FLV";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepairOutcome {
    NoDescriptor,
    /// A backup for this run's id already sits in the directory.
    BackupConflict,
    Unchanged,
    Patched {
        /// Set when this call wrote the backup; `None` if one was already present.
        backup_created: Option<PathBuf>,
        descriptor: PathBuf,
        removals: Vec<Removal>,
    },
}

#[derive(Debug, Clone)]
pub struct RepairReport {
    pub content_dir: PathBuf,
    pub outcome: RepairOutcome,
}

impl RepairReport {
    #[must_use]
    pub fn changed(&self) -> bool {
        matches!(self.outcome, RepairOutcome::Patched { .. })
    }

    #[must_use]
    pub fn transcript(&self) -> Vec<String> {
        match &self.outcome {
            RepairOutcome::NoDescriptor | RepairOutcome::Unchanged => Vec::new(),
            RepairOutcome::BackupConflict => vec![format!(
                "warning: backup file to be used already exists in {}",
                self.content_dir.display()
            )],
            RepairOutcome::Patched {
                backup_created,
                descriptor,
                removals,
            } => {
                let mut lines = Vec::with_capacity(removals.len() + 2);
                if let Some(backup) = backup_created {
                    lines.push(format!("Creating backup xml {}", backup.display()));
                }
                lines.push(format!("Patching {}", descriptor.display()));
                lines.extend(removals.iter().map(ToString::to_string));
                lines
            }
        }
    }

    pub(crate) fn details(&self) -> Value {
        let (state, removals, backup) = match &self.outcome {
            RepairOutcome::NoDescriptor => ("no-descriptor", Vec::new(), None),
            RepairOutcome::BackupConflict => ("backup-conflict", Vec::new(), None),
            RepairOutcome::Unchanged => ("unchanged", Vec::new(), None),
            RepairOutcome::Patched {
                backup_created,
                removals,
                ..
            } => (
                "patched",
                removals.iter().map(ToString::to_string).collect(),
                backup_created.as_ref().map(|path| path.display().to_string()),
            ),
        };
        json!({
            "content_dir": self.content_dir.display().to_string(),
            "state": state,
            "removals": removals,
            "backup": backup,
        })
    }
}

/// Removes references to missing or corrupt cached media from the descriptor
/// in `content_dir`, backing up the original under `backup_id` first.
///
/// # Errors
/// Returns an error if the descriptor cannot be parsed or written, or if a
/// cache entry exists but cannot be read.
pub fn repair_descriptor(content_dir: &Path, backup_id: &BackupId) -> Result<RepairReport> {
    let report = |outcome| RepairReport {
        content_dir: content_dir.to_path_buf(),
        outcome,
    };
    let descriptor_path = content_dir.join(DESCRIPTOR_FILE);
    if !descriptor_path.is_file() {
        return Ok(report(RepairOutcome::NoDescriptor));
    }
    let backup_path = backup_id.path_in(content_dir);
    if backup_path.exists() {
        warn!(dir = %content_dir.display(), backup = %backup_path.display(), "backup already exists; skipping");
        return Ok(report(RepairOutcome::BackupConflict));
    }

    let mut descriptor = ContentDescriptor::read(&descriptor_path)
        .with_context(|| format!("failed to load {}", descriptor_path.display()))?;

    let mut read_error = None;
    let removals = descriptor.prune_unavailable_media(|locator| {
        match cache_entry_usable(content_dir, locator) {
            Ok(usable) => usable,
            Err(err) => {
                read_error.get_or_insert(err);
                true
            }
        }
    });
    if let Some(err) = read_error {
        return Err(err);
    }
    if removals.is_empty() {
        return Ok(report(RepairOutcome::Unchanged));
    }

    let backup_created = if backup_path.exists() {
        None
    } else {
        copy_preserving(&descriptor_path, &backup_path)?;
        info!(backup = %backup_path.display(), "created descriptor backup");
        Some(backup_path)
    };
    let bytes = descriptor
        .to_ascii_bytes()
        .with_context(|| format!("failed to serialize {}", descriptor_path.display()))?;
    fs::write(&descriptor_path, bytes)
        .with_context(|| format!("failed to write {}", descriptor_path.display()))?;
    info!(descriptor = %descriptor_path.display(), removed = removals.len(), "patched descriptor");

    Ok(report(RepairOutcome::Patched {
        backup_created,
        descriptor: descriptor_path,
        removals,
    }))
}

fn cache_entry_usable(content_dir: &Path, locator: &str) -> Result<bool> {
    let entry = CacheKey::current(locator).entry_path(content_dir);
    if !entry.is_file() {
        return Ok(false);
    }
    Ok(!starts_with_magic(&entry, CORRUPT_MAGIC)?)
}
