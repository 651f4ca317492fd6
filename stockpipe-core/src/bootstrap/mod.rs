//! Host setup for the orchestration stack: runtime environment, Python
//! dependencies, directory layout, `.env` file and database initialization.
//!
//! Steps run strictly in order and the first failure stops the run. There is
//! no rollback; rerunning is safe because directory creation is idempotent
//! and the `.env` file is rewritten every time.

pub mod command;
pub mod identity;
pub mod plan;
pub mod runner;

pub use command::{CommandFailure, CommandRunner, CommandSpec, SystemRunner};
pub use identity::{host_uid, DEFAULT_AIRFLOW_UID};
pub use plan::{env_file_for, BootstrapPlan, Initializer, Step};
pub use runner::{BootstrapReport, Bootstrapper};

use crate::env_file::EnvFileError;
use crate::store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("{step}: could not start `{command}`: {message}")]
    Spawn {
        step: &'static str,
        command: String,
        message: String,
    },

    #[error("{step}: `{command}` exited with {status}")]
    Exit {
        step: &'static str,
        command: String,
        status: String,
    },

    #[error("{step}: I/O error at {path}: {source}")]
    Io {
        step: &'static str,
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("write-env-file: {0}")]
    EnvFile(#[from] EnvFileError),

    #[error("initialize-database: {0}")]
    Store(#[from] StoreError),
}

impl BootstrapError {
    /// Name of the step that failed.
    pub fn step(&self) -> &'static str {
        match self {
            BootstrapError::Spawn { step, .. }
            | BootstrapError::Exit { step, .. }
            | BootstrapError::Io { step, .. } => step,
            BootstrapError::EnvFile(_) => "write-env-file",
            BootstrapError::Store(_) => "initialize-database",
        }
    }
}
