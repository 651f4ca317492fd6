//! Integration tests for `stockpipe setup` against a scratch project root.
//!
//! External programs are replaced by a scripted runner so the tests never
//! create a real virtualenv or touch pip.

use std::cell::RefCell;
use std::path::Path;
use stockpipe_core::bootstrap::{
    host_uid, BootstrapError, BootstrapPlan, Bootstrapper, CommandFailure, CommandRunner,
    CommandSpec,
};
use stockpipe_core::config::{InitializerConfig, PipelineConfig};
use stockpipe_core::env_file::EnvFile;
use stockpipe_core::store::{TableStore, STOCK_AI_SUMMARY, STOCK_DATA};

// ── Helpers ──────────────────────────────────────────────────────────

/// Records every command; fails the first one whose line contains `fail_on`.
struct Scripted {
    fail_on: Option<&'static str>,
    seen: RefCell<Vec<String>>,
}

impl Scripted {
    fn ok() -> Self {
        Self {
            fail_on: None,
            seen: RefCell::new(Vec::new()),
        }
    }

    fn failing_on(pattern: &'static str) -> Self {
        Self {
            fail_on: Some(pattern),
            seen: RefCell::new(Vec::new()),
        }
    }

    fn calls(&self) -> usize {
        self.seen.borrow().len()
    }
}

impl CommandRunner for Scripted {
    fn run(&self, command: &CommandSpec) -> Result<(), CommandFailure> {
        let line = command.to_string();
        self.seen.borrow_mut().push(line.clone());
        match self.fail_on {
            Some(p) if line.contains(p) => Err(CommandFailure::Exit("exit status: 1".into())),
            _ => Ok(()),
        }
    }
}

fn config_in(root: &Path) -> PipelineConfig {
    let mut config = PipelineConfig::default();
    config.bootstrap.root = root.to_path_buf();
    config
}

// ── Successful runs ──────────────────────────────────────────────────

#[test]
fn setup_creates_layout_env_and_tables() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path());
    let boot = Bootstrapper::new(Scripted::ok());

    let report = boot.run(&BootstrapPlan::from_config(&config)).unwrap();

    assert_eq!(report.completed.len(), 5);
    for name in ["dags", "logs", "plugins", "config"] {
        assert!(dir.path().join(name).is_dir(), "{name} missing");
    }
    assert_eq!(report.created_tables, vec![STOCK_DATA, STOCK_AI_SUMMARY]);

    let store = TableStore::open(config.store_root()).unwrap();
    assert_eq!(store.list_tables().unwrap(), vec![STOCK_AI_SUMMARY, STOCK_DATA]);
    assert_eq!(boot.runner().calls(), 2);
}

#[test]
fn env_file_has_fixed_keys_and_host_uid() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path());
    Bootstrapper::new(Scripted::ok())
        .run(&BootstrapPlan::from_config(&config))
        .unwrap();

    let env = EnvFile::load(&dir.path().join(".env")).unwrap();
    let keys: Vec<&str> = env.keys().collect();
    assert_eq!(keys, vec!["AIRFLOW_IMAGE_NAME", "AIRFLOW_UID", "FINNHUB_API_KEY"]);
    assert_eq!(env.get("AIRFLOW_IMAGE_NAME"), Some("apache/airflow:2.10.4"));
    assert_eq!(env.get("FINNHUB_API_KEY"), Some("your_finnhub_api_key_here"));

    let uid: u32 = env.get("AIRFLOW_UID").unwrap().parse().unwrap();
    assert_eq!(uid, host_uid());
}

#[test]
fn second_run_is_identical() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path());
    let plan = BootstrapPlan::from_config(&config);
    let env_path = dir.path().join(".env");

    Bootstrapper::new(Scripted::ok()).run(&plan).unwrap();
    let first = std::fs::read(&env_path).unwrap();

    let again = Bootstrapper::new(Scripted::ok()).run(&plan).unwrap();
    let second = std::fs::read(&env_path).unwrap();

    assert_eq!(first, second);
    assert!(again.created_tables.is_empty());
}

#[test]
fn env_file_is_overwritten_not_merged() {
    let dir = tempfile::tempdir().unwrap();
    let env_path = dir.path().join(".env");
    std::fs::write(&env_path, "STALE=1\nAIRFLOW_UID=0\n").unwrap();

    let config = config_in(dir.path());
    Bootstrapper::new(Scripted::ok())
        .run(&BootstrapPlan::from_config(&config))
        .unwrap();

    let env = EnvFile::load(&env_path).unwrap();
    assert_eq!(env.get("STALE"), None);
    assert_eq!(env.len(), 3);
}

// ── Failures ─────────────────────────────────────────────────────────

#[test]
fn install_failure_stops_before_layout() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path());
    let boot = Bootstrapper::new(Scripted::failing_on("install -r"));

    let err = boot.run(&BootstrapPlan::from_config(&config)).unwrap_err();

    assert_eq!(err.step(), "install-dependencies");
    assert!(matches!(err, BootstrapError::Exit { .. }));
    for name in ["dags", "logs", "plugins", "config"] {
        assert!(!dir.path().join(name).exists(), "{name} should not exist");
    }
    assert!(!dir.path().join(".env").exists());
    assert!(!config.store_root().exists());
    assert_eq!(boot.runner().calls(), 2);
}

#[test]
fn failing_external_initializer_fails_setup_without_rollback() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = config_in(dir.path());
    config.bootstrap.initializer = InitializerConfig::External {
        program: "db-init".into(),
        args: vec![],
    };
    let boot = Bootstrapper::new(Scripted::failing_on("db-init"));

    let err = boot.run(&BootstrapPlan::from_config(&config)).unwrap_err();

    assert_eq!(err.step(), "initialize-database");
    assert!(err.to_string().contains("`db-init`"));
    assert!(dir.path().join("dags").is_dir());
    assert!(dir.path().join(".env").is_file());
    assert_eq!(boot.runner().seen.borrow().last().unwrap(), "db-init");
}

#[test]
fn missing_program_reports_spawn_failure() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = config_in(dir.path());
    config.bootstrap.python = "stockpipe-no-such-python".into();

    let err = Bootstrapper::default()
        .run(&BootstrapPlan::from_config(&config))
        .unwrap_err();

    assert_eq!(err.step(), "create-runtime");
    assert!(matches!(err, BootstrapError::Spawn { .. }));
    assert!(!dir.path().join("dags").exists());
}
