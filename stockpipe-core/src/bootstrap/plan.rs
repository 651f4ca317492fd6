//! The ordered steps of `stockpipe setup`.

use super::command::CommandSpec;
use super::identity::host_uid;
use crate::config::{InitializerConfig, PipelineConfig};
use crate::env_file::EnvFile;
use std::path::{Path, PathBuf};

pub const AIRFLOW_IMAGE_NAME: &str = "AIRFLOW_IMAGE_NAME";
pub const AIRFLOW_UID: &str = "AIRFLOW_UID";
pub const FINNHUB_API_KEY: &str = "FINNHUB_API_KEY";

/// How the database is brought up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Initializer {
    /// Create the pipeline tables in the embedded store at this root.
    Builtin { store_root: PathBuf },
    /// Run a program; setup fails unless it exits successfully.
    External(CommandSpec),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    CreateRuntime(CommandSpec),
    InstallDependencies(CommandSpec),
    CreateDirectories { root: PathBuf, names: Vec<String> },
    WriteEnvFile { path: PathBuf, env: EnvFile },
    InitializeDatabase(Initializer),
}

impl Step {
    pub fn name(&self) -> &'static str {
        match self {
            Step::CreateRuntime(_) => "create-runtime",
            Step::InstallDependencies(_) => "install-dependencies",
            Step::CreateDirectories { .. } => "create-directories",
            Step::WriteEnvFile { .. } => "write-env-file",
            Step::InitializeDatabase(_) => "initialize-database",
        }
    }

    /// One-line human description.
    pub fn describe(&self) -> String {
        match self {
            Step::CreateRuntime(cmd) | Step::InstallDependencies(cmd) => format!("run `{cmd}`"),
            Step::CreateDirectories { root, names } => format!(
                "create {} under {}",
                names.join(", "),
                root.display()
            ),
            Step::WriteEnvFile { path, env } => format!(
                "write {} ({})",
                path.display(),
                env.keys().collect::<Vec<_>>().join(", ")
            ),
            Step::InitializeDatabase(Initializer::Builtin { store_root }) => {
                format!("create pipeline tables in {}", store_root.display())
            }
            Step::InitializeDatabase(Initializer::External(cmd)) => format!("run `{cmd}`"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootstrapPlan {
    steps: Vec<Step>,
}

impl BootstrapPlan {
    pub fn new(steps: Vec<Step>) -> Self {
        Self { steps }
    }

    /// The standard setup sequence for `config`.
    pub fn from_config(config: &PipelineConfig) -> Self {
        let b = &config.bootstrap;
        let venv = b.resolve(&b.venv_dir);

        let create_runtime = CommandSpec::new(&b.python)
            .args(["-m", "venv"])
            .arg(venv.display().to_string());
        let install = CommandSpec::new(pip_path(&venv).display().to_string())
            .args(["install", "-r"])
            .arg(b.resolve(&b.requirements).display().to_string());

        let initializer = match &b.initializer {
            InitializerConfig::Builtin => Initializer::Builtin {
                store_root: config.store_root(),
            },
            InitializerConfig::External { program, args } => {
                Initializer::External(CommandSpec::new(program).args(args.iter().cloned()))
            }
        };

        Self::new(vec![
            Step::CreateRuntime(create_runtime),
            Step::InstallDependencies(install),
            Step::CreateDirectories {
                root: b.root.clone(),
                names: b.directories.clone(),
            },
            Step::WriteEnvFile {
                path: b.env_file_path(),
                env: env_file_for(config, host_uid()),
            },
            Step::InitializeDatabase(initializer),
        ])
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

/// `.env` content: image, host uid, key placeholder, then configured extras.
pub fn env_file_for(config: &PipelineConfig, uid: u32) -> EnvFile {
    let b = &config.bootstrap;
    let mut env = EnvFile::new();
    env.set(AIRFLOW_IMAGE_NAME, b.image.clone());
    env.set(AIRFLOW_UID, uid.to_string());
    env.set(FINNHUB_API_KEY, b.api_key_placeholder.clone());
    for (k, v) in &b.extra_env {
        if [AIRFLOW_IMAGE_NAME, AIRFLOW_UID, FINNHUB_API_KEY].contains(&k.as_str()) {
            tracing::warn!(key = %k, "extra_env cannot override a fixed key, skipping");
            continue;
        }
        env.set(k.clone(), v.clone());
    }
    env
}

#[cfg(windows)]
fn pip_path(venv: &Path) -> PathBuf {
    venv.join("Scripts").join("pip.exe")
}

#[cfg(not(windows))]
fn pip_path(venv: &Path) -> PathBuf {
    venv.join("bin").join("pip")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_plan_order() {
        let plan = BootstrapPlan::from_config(&PipelineConfig::default());
        let names: Vec<_> = plan.steps().iter().map(Step::name).collect();
        assert_eq!(
            names,
            vec![
                "create-runtime",
                "install-dependencies",
                "create-directories",
                "write-env-file",
                "initialize-database"
            ]
        );
    }

    #[cfg(not(windows))]
    #[test]
    fn runtime_commands_use_venv() {
        let plan = BootstrapPlan::from_config(&PipelineConfig::default());
        assert_eq!(plan.steps()[0].describe(), "run `python3 -m venv ./.venv`");
        assert_eq!(
            plan.steps()[1].describe(),
            "run `./.venv/bin/pip install -r ./requirements.txt`"
        );
    }

    #[test]
    fn env_has_fixed_keys_first() {
        let mut config = PipelineConfig::default();
        config
            .bootstrap
            .extra_env
            .insert("ALPACA_KEY".into(), "changeme".into());
        config
            .bootstrap
            .extra_env
            .insert(AIRFLOW_UID.into(), "0".into());

        let env = env_file_for(&config, 1000);
        assert_eq!(
            env.render(),
            "AIRFLOW_IMAGE_NAME=apache/airflow:2.10.4\n\
             AIRFLOW_UID=1000\n\
             FINNHUB_API_KEY=your_finnhub_api_key_here\n\
             ALPACA_KEY=changeme\n"
        );
    }

    #[test]
    fn external_initializer_is_passed_through() {
        let mut config = PipelineConfig::default();
        config.bootstrap.initializer = InitializerConfig::External {
            program: "db/init.sh".into(),
            args: vec![],
        };
        let plan = BootstrapPlan::from_config(&config);
        assert_eq!(
            plan.steps()[4],
            Step::InitializeDatabase(Initializer::External(CommandSpec::new("db/init.sh")))
        );
    }
}
