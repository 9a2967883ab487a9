#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::must_use_candidate
)]

pub mod backup;
pub mod bplist;
pub mod cache_key;
pub mod descriptor;

pub use backup::{BackupId, InvalidBackupId, BACKUP_ID_LEN};
pub use cache_key::{is_local_locator, CacheKey, CACHE_DIR, LOCAL_SCHEME_PREFIX};
pub use descriptor::{
    plan_step_removals, ContentDescriptor, DescriptorError, Removal, StepRefs, StepVerdict,
    DESCRIPTOR_FILE,
};
