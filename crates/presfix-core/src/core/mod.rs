//! Filesystem-facing implementation modules for `presfix-core`.

pub mod backups;
pub mod cache;
pub mod config;
pub mod context;
pub mod discovery;
pub mod effects;
pub(crate) mod fs;
pub mod outcome;
pub mod platform;
pub mod repair;
