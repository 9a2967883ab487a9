use clap::Parser;

pub const PRESFIX_AFTER_HELP: &str = concat!(
    "Without arguments, moves cached media to their current names and drops\n",
    "references to media that is missing or broken, keeping a backup of every\n",
    "changed content.xml. Pass a BACKUP_ID printed by an earlier run to put\n",
    "those backups back.\n\n",
    "Environment:\n",
    "  PRESFIX_APP_DIR   application data directory to scan\n",
    "  PRESFIX_JSON=1    emit {status,command,message,details} JSON\n",
    "  PRESFIX_LOG       tracing filter (default: presfix=warn)\n",
    "  NO_COLOR          disable colored output\n",
);

#[derive(Parser, Debug)]
#[command(
    name = "presfix",
    author,
    version,
    about = "Repair locally cached Prezi presentations",
    after_help = PRESFIX_AFTER_HELP
)]
pub struct PresfixCli {
    /// Restore the presentations saved under this backup id
    #[arg(value_name = "BACKUP_ID")]
    pub backup_id: Option<String>,
}
