#![deny(clippy::all)]
#![allow(clippy::missing_errors_doc, clippy::must_use_candidate)]

mod commands;
mod core;

pub(crate) use crate::core::{backups, cache, discovery, fs, repair};

pub use crate::core::config;
pub use crate::core::effects;

pub use crate::commands::fix::{fix_presentations, FixRequest};
pub use crate::commands::restore::{restore_presentations, RestoreRequest};
pub use crate::core::cache::{relocate_cache_entries, CacheMove, CacheReport};
pub use crate::core::config::{Config, EnvSnapshot, GlobalOptions};
pub use crate::core::context::{to_json_response, CommandContext, TranscriptSink};
pub use crate::core::discovery::find_content_dirs;
pub use crate::core::effects::{Effects, SharedEffects, SystemEffects};
pub use crate::core::outcome::{CommandStatus, ExecutionOutcome};
pub use crate::core::platform::{ensure_supported, PlatformError};
pub use crate::core::repair::{repair_descriptor, RepairOutcome, RepairReport};

use anyhow::Result;
use serde_json::json;

/// What a single invocation asks for.
#[derive(Clone, Debug)]
pub enum Command {
    Fix(FixRequest),
    Restore(RestoreRequest),
}

impl Command {
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Command::Fix(_) => "fix",
            Command::Restore(_) => "restore",
        }
    }
}

/// Runs `command` after checking that the host platform is supported.
///
/// # Errors
/// Returns an error when the command fails for reasons other than invalid
/// user input or an unsupported platform.
pub fn execute(ctx: &CommandContext, command: Command) -> Result<ExecutionOutcome> {
    if let Err(err) = ensure_supported(ctx.platform()) {
        return Ok(ExecutionOutcome::user_error(
            err.to_string(),
            json!({ "os": ctx.platform().os_family() }),
        ));
    }
    match command {
        Command::Fix(request) => fix_presentations(ctx, request),
        Command::Restore(request) => restore_presentations(ctx, request),
    }
}
