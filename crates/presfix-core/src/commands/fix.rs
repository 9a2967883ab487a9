use std::collections::BTreeSet;

use anyhow::{Context, Result};
use presfix_domain::BackupId;
use serde_json::json;
use time::OffsetDateTime;
use tracing::debug;

use crate::backups::find_backups;
use crate::cache::relocate_cache_entries;
use crate::discovery::find_content_dirs;
use crate::repair::repair_descriptor;
use crate::{CommandContext, ExecutionOutcome};

#[derive(Clone, Debug, Default)]
pub struct FixRequest {
    /// Id to back descriptors up under; a fresh one is generated when unset.
    pub backup_id: Option<BackupId>,
}

/// Relocates stale cache entries and repairs descriptors in every
/// presentation below the application root.
///
/// # Errors
/// Returns an error if a descriptor cannot be parsed or a filesystem
/// operation fails.
pub fn fix_presentations(ctx: &CommandContext, request: FixRequest) -> Result<ExecutionOutcome> {
    let backup_id = match request.backup_id {
        Some(id) => id,
        None => generate_backup_id()?,
    };
    debug!(backup_id = %backup_id, root = %ctx.app_root().display(), "starting repair run");

    let mut transcript = Vec::new();
    let mut directories = Vec::new();
    let mut changed_cache = false;
    let mut changed_content = false;
    let mut backups = BTreeSet::new();

    for content_dir in find_content_dirs(ctx.app_root()) {
        let cache = relocate_cache_entries(&content_dir)?;
        report_lines(ctx, &mut transcript, cache.transcript());
        changed_cache |= cache.changed();

        let repair = repair_descriptor(&content_dir, &backup_id)?;
        report_lines(ctx, &mut transcript, repair.transcript());
        changed_content |= repair.changed();

        let found = find_backups(&content_dir)?;
        directories.push(json!({
            "content_dir": content_dir.display().to_string(),
            "cache": cache.details(),
            "descriptor": repair.details(),
            "backups": found.iter().map(BackupId::as_str).collect::<Vec<_>>(),
        }));
        backups.extend(found);
    }

    if changed_content {
        report_lines(ctx, &mut transcript, restore_guidance(ctx.program(), &backup_id));
    } else if !changed_cache && !backups.is_empty() {
        let mut lines = vec!["* All presentations look good!".to_string()];
        lines.extend(restore_all_guidance(ctx.program(), &backups));
        report_lines(ctx, &mut transcript, lines);
    }

    Ok(ExecutionOutcome::success(
        transcript.join("\n"),
        json!({
            "backup_id": backup_id.as_str(),
            "cache_changed": changed_cache,
            "content_changed": changed_content,
            "directories": directories,
            "backups": backups.iter().map(BackupId::as_str).collect::<Vec<_>>(),
        }),
    ))
}

fn report_lines(ctx: &CommandContext, transcript: &mut Vec<String>, lines: Vec<String>) {
    ctx.emit(&lines);
    transcript.extend(lines);
}

fn generate_backup_id() -> Result<BackupId> {
    let now = OffsetDateTime::now_local().unwrap_or_else(|err| {
        debug!(%err, "local offset unavailable; using UTC");
        OffsetDateTime::now_utc()
    });
    BackupId::generate(now, &mut rand::thread_rng()).context("failed to format backup id")
}

fn restore_guidance(program: &str, id: &BackupId) -> Vec<String> {
    vec![
        String::new(),
        "* Your presentation(s) have changed!".to_string(),
        "* To restore the previous state of your presentation(s), please run:".to_string(),
        String::new(),
        format!("  {program} {id}"),
        String::new(),
    ]
}

fn restore_all_guidance(program: &str, ids: &BTreeSet<BackupId>) -> Vec<String> {
    let header = if ids.len() == 1 {
        "* If you need to restore your presentations, please run:"
    } else {
        "* If you need to restore your presentations, please run one of these commands:"
    };
    let mut lines = vec![header.to_string(), String::new()];
    lines.extend(ids.iter().map(|id| format!("  {program} {id}")));
    lines.push(String::new());
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(raw: &str) -> BackupId {
        BackupId::parse(raw).expect("valid id")
    }

    #[test]
    fn single_backup_uses_singular_header() {
        let ids = BTreeSet::from([id("2022-03-01--14-05-09--qwerty")]);
        assert_eq!(
            restore_all_guidance("presfix", &ids).join("\n"),
            "* If you need to restore your presentations, please run:\n\n  presfix 2022-03-01--14-05-09--qwerty\n"
        );
    }

    #[test]
    fn several_backups_are_listed_sorted() {
        let ids = BTreeSet::from([
            id("2022-03-02--09-00-00--asdfgh"),
            id("2022-03-01--14-05-09--qwerty"),
        ]);
        let lines = restore_all_guidance("presfix", &ids);
        assert_eq!(
            lines[0],
            "* If you need to restore your presentations, please run one of these commands:"
        );
        assert_eq!(
            &lines[2..4],
            [
                "  presfix 2022-03-01--14-05-09--qwerty",
                "  presfix 2022-03-02--09-00-00--asdfgh",
            ]
        );
    }

    #[test]
    fn changed_guidance_names_the_run_id() {
        let text = restore_guidance("presfix", &id("2022-03-01--14-05-09--qwerty")).join("\n");
        assert_eq!(
            text,
            "\n* Your presentation(s) have changed!\n* To restore the previous state of your presentation(s), please run:\n\n  presfix 2022-03-01--14-05-09--qwerty\n"
        );
    }
}
