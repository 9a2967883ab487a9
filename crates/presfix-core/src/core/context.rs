use std::path::Path;

use anyhow::Result;
use serde_json::{json, Value};

use crate::config::{Config, EnvSnapshot, GlobalOptions};
use crate::effects::{self, SharedEffects};
use crate::{CommandStatus, ExecutionOutcome};

/// Receives transcript lines as soon as a command produces them.
pub type TranscriptSink<'a> = Box<dyn Fn(&str) + 'a>;

pub struct CommandContext<'a> {
    pub global: &'a GlobalOptions,
    config: Config,
    effects: SharedEffects,
    sink: Option<TranscriptSink<'a>>,
}

impl<'a> CommandContext<'a> {
    /// Creates a command context from the current process environment.
    ///
    /// # Errors
    /// Returns an error if the configuration cannot be resolved.
    pub fn new(global: &'a GlobalOptions, effects: SharedEffects) -> Result<Self> {
        Self::with_env(global, effects, &EnvSnapshot::capture())
    }

    /// Creates a command context from an explicit environment snapshot.
    ///
    /// # Errors
    /// Returns an error if the configuration cannot be resolved.
    pub fn with_env(
        global: &'a GlobalOptions,
        effects: SharedEffects,
        env: &EnvSnapshot,
    ) -> Result<Self> {
        let config = Config::from_snapshot(env, effects.locations())?;
        Ok(Self {
            global,
            config,
            effects,
            sink: None,
        })
    }

    /// Streams transcript lines to `sink` while the command runs, so work
    /// already done stays visible if a later step fails.
    #[must_use]
    pub fn with_transcript_sink(mut self, sink: impl Fn(&str) + 'a) -> Self {
        self.sink = Some(Box::new(sink));
        self
    }

    pub(crate) fn emit(&self, lines: &[String]) {
        if let Some(sink) = &self.sink {
            for line in lines {
                sink(line);
            }
        }
    }

    pub fn platform(&self) -> &dyn effects::Platform {
        self.effects.platform()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn app_root(&self) -> &Path {
        self.config.app_root()
    }

    pub fn program(&self) -> &str {
        &self.global.program
    }
}

#[must_use]
pub fn to_json_response(command: &str, outcome: &ExecutionOutcome) -> Value {
    let status = match outcome.status {
        CommandStatus::Ok => "ok",
        CommandStatus::UserError => "user-error",
    };
    let details = match &outcome.details {
        Value::Object(_) => outcome.details.clone(),
        Value::Null => json!({}),
        other => json!({ "value": other }),
    };
    json!({
        "status": status,
        "command": command,
        "message": outcome.message,
        "details": details,
    })
}
