//! Scripted executor for unit tests.

use std::sync::Mutex;
use std::time::Duration;

use super::{Executor, SvnCommand, ToolError};

type Script = dyn Fn(&SvnCommand) -> Result<String, ToolError> + Send + Sync;

/// Answers each invocation with a closure and records what was run.
pub(crate) struct ScriptedExecutor {
    script: Box<Script>,
    calls: Mutex<Vec<SvnCommand>>,
}

impl ScriptedExecutor {
    pub(crate) fn new<F>(script: F) -> Self
    where
        F: Fn(&SvnCommand) -> Result<String, ToolError> + Send + Sync + 'static,
    {
        Self {
            script: Box::new(script),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Every command succeeds with empty output.
    pub(crate) fn ok() -> Self {
        Self::new(|_| Ok(String::new()))
    }

    pub(crate) fn calls(&self) -> Vec<SvnCommand> {
        self.calls.lock().expect("calls lock poisoned").clone()
    }

    pub(crate) fn subcommands(&self) -> Vec<String> {
        self.calls()
            .iter()
            .map(|cmd| cmd.subcommand().to_string())
            .collect()
    }
}

impl Executor for ScriptedExecutor {
    fn run(&self, command: &SvnCommand, _timeout: Duration) -> Result<String, ToolError> {
        self.calls
            .lock()
            .expect("calls lock poisoned")
            .push(command.clone());
        (self.script)(command)
    }
}
