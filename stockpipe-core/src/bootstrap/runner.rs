//! Executes a [`BootstrapPlan`] one step at a time.

use super::command::{CommandFailure, CommandRunner, CommandSpec, SystemRunner};
use super::plan::{BootstrapPlan, Initializer, Step};
use super::BootstrapError;
use crate::env_file::EnvFile;
use crate::store::{init_pipeline_tables, TableStore};
use std::fs;
use std::path::{Path, PathBuf};

/// What a completed run did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BootstrapReport {
    /// Names of the steps that finished, in order.
    pub completed: Vec<&'static str>,
    /// Tables created by the builtin initializer.
    pub created_tables: Vec<String>,
}

pub struct Bootstrapper<R: CommandRunner = SystemRunner> {
    runner: R,
}

impl Default for Bootstrapper<SystemRunner> {
    fn default() -> Self {
        Self::new(SystemRunner)
    }
}

impl<R: CommandRunner> Bootstrapper<R> {
    pub fn new(runner: R) -> Self {
        Self { runner }
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    /// Run every step in order. The first failure aborts the rest; nothing
    /// already done is undone.
    pub fn run(&self, plan: &BootstrapPlan) -> Result<BootstrapReport, BootstrapError> {
        let mut report = BootstrapReport::default();
        let total = plan.len();

        for (i, step) in plan.steps().iter().enumerate() {
            tracing::info!("[{}/{}] {}", i + 1, total, step.describe());
            self.execute(step, &mut report)?;
            report.completed.push(step.name());
        }

        tracing::info!("setup complete");
        Ok(report)
    }

    /// Step descriptions, without touching anything.
    pub fn dry_run(&self, plan: &BootstrapPlan) -> Vec<String> {
        plan.steps().iter().map(Step::describe).collect()
    }

    fn execute(&self, step: &Step, report: &mut BootstrapReport) -> Result<(), BootstrapError> {
        match step {
            Step::CreateRuntime(cmd) | Step::InstallDependencies(cmd) => {
                self.run_command(step.name(), cmd)
            }
            Step::CreateDirectories { root, names } => create_directories(root, names),
            Step::WriteEnvFile { path, env } => write_env_file(path, env),
            Step::InitializeDatabase(Initializer::External(cmd)) => {
                self.run_command(step.name(), cmd)
            }
            Step::InitializeDatabase(Initializer::Builtin { store_root }) => {
                let store = TableStore::open(store_root.clone())?;
                let created = init_pipeline_tables(&store)?;
                if created.is_empty() {
                    tracing::info!("pipeline tables already present");
                } else {
                    tracing::info!(tables = %created.join(", "), "created");
                }
                report.created_tables = created;
                Ok(())
            }
        }
    }

    fn run_command(&self, step: &'static str, cmd: &CommandSpec) -> Result<(), BootstrapError> {
        self.runner.run(cmd).map_err(|failure| match failure {
            CommandFailure::Spawn(message) => BootstrapError::Spawn {
                step,
                command: cmd.to_string(),
                message,
            },
            CommandFailure::Exit(status) => BootstrapError::Exit {
                step,
                command: cmd.to_string(),
                status,
            },
        })
    }
}

fn create_directories(root: &Path, names: &[String]) -> Result<(), BootstrapError> {
    for name in names {
        let dir: PathBuf = root.join(name);
        fs::create_dir_all(&dir).map_err(|source| BootstrapError::Io {
            step: "create-directories",
            path: dir.display().to_string(),
            source,
        })?;
    }
    Ok(())
}

fn write_env_file(path: &Path, env: &EnvFile) -> Result<(), BootstrapError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| BootstrapError::Io {
            step: "write-env-file",
            path: parent.display().to_string(),
            source,
        })?;
    }
    env.write(path)?;
    Ok(())
}
