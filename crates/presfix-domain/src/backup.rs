use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use rand::Rng;
use time::macros::format_description;
use time::OffsetDateTime;

pub const BACKUP_ID_LEN: usize = 28;

const BACKUP_PREFIX: &str = "backup-";
const BACKUP_EXT: &str = ".xml";
const SUFFIX_LEN: usize = 6;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid backup id")]
pub struct InvalidBackupId {
    pub raw: String,
}

/// Identifier of one repair run, e.g. `2022-03-01--14-05-09--qwerty`.
///
/// Only the length is validated; ids written by older runs may use any
/// characters.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BackupId(String);

impl BackupId {
    /// Validates `raw` as a backup id.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidBackupId`] unless `raw` is exactly 28 characters long.
    pub fn parse(raw: &str) -> Result<Self, InvalidBackupId> {
        if raw.chars().count() == BACKUP_ID_LEN {
            Ok(Self(raw.to_string()))
        } else {
            Err(InvalidBackupId {
                raw: raw.to_string(),
            })
        }
    }

    /// Builds a fresh id from a timestamp and six random lowercase letters.
    ///
    /// # Errors
    ///
    /// Returns an error if the timestamp cannot be formatted.
    pub fn generate<R: Rng>(
        now: OffsetDateTime,
        rng: &mut R,
    ) -> Result<Self, time::error::Format> {
        let stamp = now.format(format_description!(
            "[year]-[month]-[day]--[hour]-[minute]-[second]"
        ))?;
        let suffix: String = (0..SUFFIX_LEN)
            .map(|_| char::from(rng.gen_range(b'a'..=b'z')))
            .collect();
        Ok(Self(format!("{stamp}--{suffix}")))
    }

    /// Extracts the id from a `backup-<id>.xml` file name.
    #[must_use]
    pub fn from_file_name(name: &str) -> Option<Self> {
        let raw = name.strip_prefix(BACKUP_PREFIX)?.strip_suffix(BACKUP_EXT)?;
        Self::parse(raw).ok()
    }

    #[must_use]
    pub fn file_name(&self) -> String {
        format!("{BACKUP_PREFIX}{}{BACKUP_EXT}", self.0)
    }

    #[must_use]
    pub fn path_in(&self, content_dir: &Path) -> PathBuf {
        content_dir.join(self.file_name())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for BackupId {
    type Err = InvalidBackupId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for BackupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
