use std::fmt;
use std::path::{Path, PathBuf};

use md5::{Digest, Md5};

use crate::bplist::{self, Value};

/// Scheme prefix of locators that point into the local media cache.
pub const LOCAL_SCHEME_PREFIX: &str = "//prezi-local/";

/// Directory, relative to a content directory, holding cache entries.
pub const CACHE_DIR: &str = "repos";

const ARCHIVER_VERSION: u64 = 100_000;
const ARCHIVER_NAME: &str = "NSKeyedArchiver";
const NULL_SENTINEL: &str = "$null";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum EnvelopeField {
    Version,
    Archiver,
    Top,
    Objects,
}

/// Field order used by application releases before the cache rename.
const LEGACY_ORDER: [EnvelopeField; 4] = [
    EnvelopeField::Version,
    EnvelopeField::Objects,
    EnvelopeField::Archiver,
    EnvelopeField::Top,
];

const CURRENT_ORDER: [EnvelopeField; 4] = [
    EnvelopeField::Version,
    EnvelopeField::Archiver,
    EnvelopeField::Top,
    EnvelopeField::Objects,
];

#[must_use]
pub fn is_local_locator(locator: &str) -> bool {
    locator.starts_with(LOCAL_SCHEME_PREFIX)
}

/// Uppercase MD5 name of a cache entry.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    /// Key under which older application releases stored `locator`.
    #[must_use]
    pub fn legacy(locator: &str) -> Self {
        Self::derive(locator, &LEGACY_ORDER)
    }

    /// Key under which the current application release looks up `locator`.
    #[must_use]
    pub fn current(locator: &str) -> Self {
        Self::derive(locator, &CURRENT_ORDER)
    }

    fn derive(locator: &str, order: &[EnvelopeField]) -> Self {
        let envelope = archived_envelope(locator, order);
        let digest = Md5::digest(bplist::to_bytes(&envelope));
        Self(hex::encode_upper(digest))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Two-character shard directory name.
    #[must_use]
    pub fn shard(&self) -> &str {
        &self.0[..2]
    }

    /// Location of this entry below `content_dir`.
    #[must_use]
    pub fn entry_path(&self, content_dir: &Path) -> PathBuf {
        content_dir.join(CACHE_DIR).join(self.shard()).join(&self.0)
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn archived_envelope(locator: &str, order: &[EnvelopeField]) -> Value {
    let entries = order
        .iter()
        .map(|field| match field {
            EnvelopeField::Version => ("$version".to_string(), Value::Integer(ARCHIVER_VERSION)),
            EnvelopeField::Archiver => ("$archiver".to_string(), Value::string(ARCHIVER_NAME)),
            EnvelopeField::Top => (
                "$top".to_string(),
                Value::Dictionary(vec![("root".to_string(), Value::Uid(1))]),
            ),
            EnvelopeField::Objects => (
                "$objects".to_string(),
                Value::Array(vec![Value::string(NULL_SENTINEL), Value::string(locator)]),
            ),
        })
        .collect();
    Value::Dictionary(entries)
}
