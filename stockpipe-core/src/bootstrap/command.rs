//! External programs run by bootstrap steps.

use std::fmt;
use std::process::Command;

/// Program plus arguments. Relative paths resolve against the invoking
/// directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for a in &self.args {
            write!(f, " {a}")?;
        }
        Ok(())
    }
}

/// Why a command did not succeed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandFailure {
    /// The program could not be started.
    Spawn(String),
    /// It ran and exited unsuccessfully.
    Exit(String),
}

impl fmt::Display for CommandFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandFailure::Spawn(msg) => write!(f, "could not start: {msg}"),
            CommandFailure::Exit(status) => write!(f, "exited with {status}"),
        }
    }
}

/// Runs commands to completion.
pub trait CommandRunner {
    fn run(&self, command: &CommandSpec) -> Result<(), CommandFailure>;
}

/// Runs commands as child processes that inherit stdio.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, command: &CommandSpec) -> Result<(), CommandFailure> {
        tracing::debug!(%command, "spawning");
        let status = Command::new(&command.program)
            .args(&command.args)
            .status()
            .map_err(|e| CommandFailure::Spawn(e.to_string()))?;
        if status.success() {
            Ok(())
        } else {
            Err(CommandFailure::Exit(status.to_string()))
        }
    }
}
