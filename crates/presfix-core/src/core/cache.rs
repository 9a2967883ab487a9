use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use presfix_domain::{CacheKey, ContentDescriptor, DESCRIPTOR_FILE};
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::fs::move_file;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheMove {
    pub from: PathBuf,
    pub to: PathBuf,
}

#[derive(Debug, Clone, Default)]
pub struct CacheReport {
    pub content_dir: PathBuf,
    pub moves: Vec<CacheMove>,
    /// Legacy entries that were expected but absent.
    pub missing: Vec<PathBuf>,
}

impl CacheReport {
    #[must_use]
    pub fn changed(&self) -> bool {
        !self.moves.is_empty()
    }

    #[must_use]
    pub fn transcript(&self) -> Vec<String> {
        if self.moves.is_empty() {
            return Vec::new();
        }
        let mut lines = vec![format!("Fixing cache in {}", self.content_dir.display())];
        for entry in &self.moves {
            lines.push(format!(
                "- Moving {} to {}",
                relative(&self.content_dir, &entry.from),
                relative(&self.content_dir, &entry.to)
            ));
        }
        lines
    }

    pub(crate) fn details(&self) -> Value {
        json!({
            "content_dir": self.content_dir.display().to_string(),
            "moved": self.moves.iter().map(|entry| json!({
                "from": entry.from.display().to_string(),
                "to": entry.to.display().to_string(),
            })).collect::<Vec<_>>(),
            "missing": self.missing.iter().map(|path| path.display().to_string()).collect::<Vec<_>>(),
        })
    }
}

/// Moves cache entries referenced by `content_dir`'s descriptor from their
/// legacy names to their current names.
///
/// # Errors
/// Returns an error if the descriptor cannot be parsed or a move fails.
pub fn relocate_cache_entries(content_dir: &Path) -> Result<CacheReport> {
    let descriptor_path = content_dir.join(DESCRIPTOR_FILE);
    if !descriptor_path.exists() {
        return Ok(CacheReport {
            content_dir: content_dir.to_path_buf(),
            ..CacheReport::default()
        });
    }
    let descriptor = ContentDescriptor::read(&descriptor_path)
        .with_context(|| format!("failed to load {}", descriptor_path.display()))?;
    relocate_locators(content_dir, &descriptor.local_media_locators())
}

/// Relocates the cache entries of `locators` below `content_dir`.
///
/// # Errors
/// Returns an error if a destination directory cannot be created or a move
/// fails.
pub fn relocate_locators(content_dir: &Path, locators: &[String]) -> Result<CacheReport> {
    let pairs: BTreeSet<(PathBuf, PathBuf)> = locators
        .iter()
        .map(|locator| {
            (
                CacheKey::legacy(locator).entry_path(content_dir),
                CacheKey::current(locator).entry_path(content_dir),
            )
        })
        .collect();

    let mut report = CacheReport {
        content_dir: content_dir.to_path_buf(),
        ..CacheReport::default()
    };
    let mut queued = Vec::new();
    for (legacy, current) in pairs {
        if current.exists() {
            continue;
        }
        if !legacy.exists() {
            warn!(path = %legacy.display(), "cache entry missing under both names");
            report.missing.push(legacy);
            continue;
        }
        queued.push(CacheMove {
            from: legacy,
            to: current,
        });
    }

    for entry in queued {
        if let Some(parent) = entry.to.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create {}", parent.display()))?;
            }
        }
        info!(from = %entry.from.display(), to = %entry.to.display(), "moving cache entry");
        move_file(&entry.from, &entry.to)?;
        report.moves.push(entry);
    }

    Ok(report)
}

fn relative(base: &Path, path: &Path) -> String {
    path.strip_prefix(base)
        .unwrap_or(path)
        .display()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const LOCATOR: &str = "//prezi-local/abc";

    fn write_entry(path: &Path, contents: &[u8]) {
        fs::create_dir_all(path.parent().expect("parent")).expect("dirs");
        fs::write(path, contents).expect("write entry");
    }

    #[test]
    fn legacy_entry_moves_to_current_name() -> Result<()> {
        let temp = tempdir()?;
        let dir = temp.path();
        let legacy = CacheKey::legacy(LOCATOR).entry_path(dir);
        let current = CacheKey::current(LOCATOR).entry_path(dir);
        write_entry(&legacy, b"image-bytes");

        let report = relocate_locators(dir, &[LOCATOR.to_string(), LOCATOR.to_string()])?;

        assert!(report.changed());
        assert_eq!(report.moves.len(), 1);
        assert!(!legacy.exists());
        assert_eq!(fs::read(&current)?, b"image-bytes");
        assert_eq!(
            report.transcript(),
            vec![
                format!("Fixing cache in {}", dir.display()),
                "- Moving repos/2B/2B4D8210A0608DF0D832F0DBC873A551 to repos/AA/AA620B4A7560E59B588D1E598481142D"
                    .to_string(),
            ]
        );
        Ok(())
    }

    #[test]
    fn existing_current_entry_leaves_legacy_untouched() -> Result<()> {
        let temp = tempdir()?;
        let dir = temp.path();
        let legacy = CacheKey::legacy(LOCATOR).entry_path(dir);
        let current = CacheKey::current(LOCATOR).entry_path(dir);
        write_entry(&legacy, b"old");
        write_entry(&current, b"new");

        let report = relocate_locators(dir, &[LOCATOR.to_string()])?;

        assert!(!report.changed());
        assert!(report.transcript().is_empty());
        assert_eq!(fs::read(&legacy)?, b"old");
        assert_eq!(fs::read(&current)?, b"new");
        Ok(())
    }

    #[test]
    fn absent_entries_are_reported_missing() -> Result<()> {
        let temp = tempdir()?;
        let dir = temp.path();

        let report = relocate_locators(dir, &[LOCATOR.to_string()])?;

        assert!(!report.changed());
        assert_eq!(report.missing, vec![CacheKey::legacy(LOCATOR).entry_path(dir)]);
        assert!(!dir.join("repos").exists());
        Ok(())
    }

    #[test]
    fn missing_descriptor_is_not_an_error() -> Result<()> {
        let temp = tempdir()?;
        let report = relocate_cache_entries(temp.path())?;
        assert!(!report.changed());
        assert!(report.missing.is_empty());
        Ok(())
    }

    #[test]
    fn malformed_descriptor_is_an_error() -> Result<()> {
        let temp = tempdir()?;
        fs::write(temp.path().join(DESCRIPTOR_FILE), "<zui-table>")?;
        let err = relocate_cache_entries(temp.path()).expect_err("parse failure");
        assert!(err.to_string().contains("failed to load"));
        Ok(())
    }
}
