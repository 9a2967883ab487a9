use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use presfix_domain::{BackupId, DESCRIPTOR_FILE};
use tracing::info;

use crate::fs::copy_preserving;

/// Ids of the backups stored directly in `content_dir`.
///
/// # Errors
/// Returns an error if the directory cannot be listed.
pub fn find_backups(content_dir: &Path) -> Result<BTreeSet<BackupId>> {
    let mut ids = BTreeSet::new();
    let entries = fs::read_dir(content_dir)
        .with_context(|| format!("failed to list {}", content_dir.display()))?;
    for entry in entries {
        let entry = entry.with_context(|| format!("failed to list {}", content_dir.display()))?;
        if !entry.file_type().map(|kind| kind.is_file()).unwrap_or(false) {
            continue;
        }
        if let Some(id) = entry.file_name().to_str().and_then(BackupId::from_file_name) {
            ids.insert(id);
        }
    }
    Ok(ids)
}

/// Copies `backup-<id>.xml` over `content.xml` in `content_dir`.
///
/// Returns the restored descriptor path, or `None` when the directory holds
/// no backup for `id`.
///
/// # Errors
/// Returns an error if the copy fails.
pub fn restore_backup(content_dir: &Path, id: &BackupId) -> Result<Option<PathBuf>> {
    let backup = id.path_in(content_dir);
    if !backup.is_file() {
        return Ok(None);
    }
    let descriptor = content_dir.join(DESCRIPTOR_FILE);
    copy_preserving(&backup, &descriptor)?;
    info!(backup = %backup.display(), descriptor = %descriptor.display(), "restored descriptor");
    Ok(Some(descriptor))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const ID: &str = "2022-03-01--14-05-09--qwerty";

    #[test]
    fn lists_only_well_formed_backup_files() -> Result<()> {
        let temp = tempdir()?;
        let dir = temp.path();
        fs::write(dir.join(format!("backup-{ID}.xml")), "<a/>")?;
        fs::write(dir.join("backup-2022-03-02--09-00-00--asdfgh.xml"), "<b/>")?;
        fs::write(dir.join("backup-short.xml"), "<c/>")?;
        fs::write(dir.join(format!("backup-{ID}.txt")), "<d/>")?;
        fs::create_dir(dir.join("backup-2022-03-03--09-00-00--zxcvbn.xml"))?;
        fs::create_dir_all(dir.join("nested"))?;
        fs::write(
            dir.join("nested/backup-2022-03-04--09-00-00--poiuyt.xml"),
            "<e/>",
        )?;

        let ids: Vec<String> = find_backups(dir)?
            .iter()
            .map(|id| id.as_str().to_string())
            .collect();

        assert_eq!(ids, vec![ID, "2022-03-02--09-00-00--asdfgh"]);
        Ok(())
    }

    #[test]
    fn restore_copies_backup_bytes() -> Result<()> {
        let temp = tempdir()?;
        let dir = temp.path();
        let id = BackupId::parse(ID)?;
        fs::write(dir.join(DESCRIPTOR_FILE), "<patched/>")?;
        fs::write(id.path_in(dir), "<original/>")?;

        let restored = restore_backup(dir, &id)?;

        assert_eq!(restored, Some(dir.join(DESCRIPTOR_FILE)));
        assert_eq!(fs::read_to_string(dir.join(DESCRIPTOR_FILE))?, "<original/>");
        assert!(id.path_in(dir).exists());
        Ok(())
    }

    #[test]
    fn restore_without_backup_touches_nothing() -> Result<()> {
        let temp = tempdir()?;
        let dir = temp.path();
        fs::write(dir.join(DESCRIPTOR_FILE), "<patched/>")?;

        let restored = restore_backup(dir, &BackupId::parse(ID)?)?;

        assert_eq!(restored, None);
        assert_eq!(fs::read_to_string(dir.join(DESCRIPTOR_FILE))?, "<patched/>");
        Ok(())
    }
}
