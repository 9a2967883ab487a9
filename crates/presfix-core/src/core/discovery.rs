use std::path::{Path, PathBuf};

use presfix_domain::DESCRIPTOR_FILE;
use tracing::debug;
use walkdir::WalkDir;

/// Every directory at or below `app_root` holding a `content.xml`, in
/// file-name order. A missing root yields nothing.
#[must_use]
pub fn find_content_dirs(app_root: &Path) -> Vec<PathBuf> {
    if !app_root.is_dir() {
        debug!(root = %app_root.display(), "application directory not found");
        return Vec::new();
    }
    WalkDir::new(app_root)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(err) => {
                debug!(%err, "skipping unreadable path during discovery");
                None
            }
        })
        .filter(|entry| entry.file_type().is_dir())
        .map(walkdir::DirEntry::into_path)
        .filter(|dir| dir.join(DESCRIPTOR_FILE).is_file())
        .collect()
}
