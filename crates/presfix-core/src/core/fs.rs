use std::fs::{self, File};
use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use filetime::FileTime;

/// Copies `src` over `dest`, carrying permissions and access/modification
/// times along with the contents.
pub(crate) fn copy_preserving(src: &Path, dest: &Path) -> Result<()> {
    fs::copy(src, dest)
        .with_context(|| format!("failed to copy {} to {}", src.display(), dest.display()))?;
    let meta = fs::metadata(src).with_context(|| format!("failed to stat {}", src.display()))?;
    filetime::set_file_times(
        dest,
        FileTime::from_last_access_time(&meta),
        FileTime::from_last_modification_time(&meta),
    )
    .with_context(|| format!("failed to set file times on {}", dest.display()))?;
    Ok(())
}

/// Renames `src` to `dest`, falling back to copy + delete when the rename is
/// refused (for example across devices).
pub(crate) fn move_file(src: &Path, dest: &Path) -> Result<()> {
    if let Err(err) = fs::rename(src, dest) {
        tracing::debug!(%err, from = %src.display(), "rename failed; copying instead");
        copy_preserving(src, dest)?;
        fs::remove_file(src).with_context(|| format!("failed to remove {}", src.display()))?;
    }
    Ok(())
}

/// Whether the file at `path` begins with `magic`.
pub(crate) fn starts_with_magic(path: &Path, magic: &[u8]) -> Result<bool> {
    let file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    let mut head = Vec::with_capacity(magic.len());
    file.take(magic.len() as u64)
        .read_to_end(&mut head)
        .with_context(|| format!("failed to read {}", path.display()))?;
    Ok(head == magic)
}
