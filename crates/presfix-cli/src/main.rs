use std::env;
use std::path::Path;
use std::sync::Arc;

use atty::Stream;
use clap::Parser;
use color_eyre::{eyre::eyre, Result};
use presfix_core::config::LOG_ENV;
use presfix_core::{
    self, Command, CommandContext, CommandStatus, FixRequest, GlobalOptions, RestoreRequest,
    SystemEffects,
};
use tracing_subscriber::EnvFilter;

mod cli;
mod style;

use cli::PresfixCli;
use style::Style;

const DEFAULT_PROGRAM: &str = "presfix";
const DEFAULT_LOG_FILTER: &str = "presfix=warn,presfix_core=warn,presfix_domain=warn";

fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = PresfixCli::parse();
    init_tracing();

    let global = GlobalOptions {
        program: program_name(),
    };
    let command = build_command(&cli);
    let ctx = CommandContext::new(&global, Arc::new(SystemEffects::new()))
        .map_err(|err| eyre!("{err:?}"))?;
    let json = ctx.config().output().json;
    let ctx = if json {
        ctx
    } else {
        let style = Style::new(atty::is(Stream::Stdout));
        ctx.with_transcript_sink(move |line| println!("{}", style.transcript_line(line)))
    };
    let name = command.name();
    let outcome = presfix_core::execute(&ctx, command).map_err(|err| eyre!("{err:?}"))?;

    if json {
        let payload = presfix_core::to_json_response(name, &outcome);
        println!("{}", serde_json::to_string_pretty(&payload)?);
    } else if outcome.status == CommandStatus::UserError {
        let style = Style::new(atty::is(Stream::Stdout));
        println!("{}", style.error(&outcome.message));
    }

    let code = outcome.exit_code();
    if code == 0 {
        Ok(())
    } else {
        std::process::exit(code);
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_level(true)
        .finish();

    let _ = tracing::subscriber::set_global_default(subscriber);
}

fn program_name() -> String {
    env::args_os()
        .next()
        .as_deref()
        .and_then(|arg0| Path::new(arg0).file_name())
        .map(|name| name.to_string_lossy().into_owned())
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| DEFAULT_PROGRAM.to_string())
}

fn build_command(cli: &PresfixCli) -> Command {
    match &cli.backup_id {
        Some(id) => Command::Restore(RestoreRequest {
            backup_id: id.clone(),
        }),
        None => Command::Fix(FixRequest::default()),
    }
}
