use anyhow::Result;
use presfix_domain::BackupId;
use serde_json::json;
use tracing::warn;

use crate::backups::restore_backup;
use crate::discovery::find_content_dirs;
use crate::{CommandContext, ExecutionOutcome};

#[derive(Clone, Debug)]
pub struct RestoreRequest {
    pub backup_id: String,
}

/// Puts back every descriptor saved under `request.backup_id`.
///
/// # Errors
/// Returns an error if copying a backup over its descriptor fails.
pub fn restore_presentations(
    ctx: &CommandContext,
    request: RestoreRequest,
) -> Result<ExecutionOutcome> {
    let id = match BackupId::parse(&request.backup_id) {
        Ok(id) => id,
        Err(err) => {
            return Ok(ExecutionOutcome::user_error(
                err.to_string(),
                json!({ "backup_id": err.raw }),
            ))
        }
    };

    let mut transcript = Vec::new();
    let mut restored = Vec::new();
    for content_dir in find_content_dirs(ctx.app_root()) {
        if let Some(descriptor) = restore_backup(&content_dir, &id)? {
            let line = format!("Restoring content.xml in {}", content_dir.display());
            ctx.emit(std::slice::from_ref(&line));
            transcript.push(line);
            restored.push(descriptor.display().to_string());
        }
    }

    if restored.is_empty() {
        warn!(backup_id = %id, "no content directory holds this backup");
        let line = format!("no backup named {id} was found");
        ctx.emit(std::slice::from_ref(&line));
        transcript.push(line);
    }

    Ok(ExecutionOutcome::success(
        transcript.join("\n"),
        json!({
            "backup_id": id.as_str(),
            "restored": restored,
        }),
    ))
}
