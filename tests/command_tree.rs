//! Tests for the assembled mgrpxy command tree

use std::cell::RefCell;
use std::rc::Rc;

use mgrpxy::cli::{
    BuildError, COMPLETION_COMMAND, ConfigHelpTemplate, DispatchError, LogBootstrap,
    LogLevelError, build_root_command, dispatch, to_clap,
};
use mgrpxy::commands::ProxyCommands;
use mgrpxy::commands::completion::write_completion;

/// Bootstrap recording the levels it was asked to apply
#[derive(Default)]
struct RecordingBootstrap {
    inits: RefCell<usize>,
    levels: RefCell<Vec<String>>,
}

impl LogBootstrap for RecordingBootstrap {
    fn init(&self) {
        *self.inits.borrow_mut() += 1;
    }

    fn set_level(&self, level: &str) -> Result<(), LogLevelError> {
        mgrpxy::cli::logging::parse_level(level)?;
        self.levels.borrow_mut().push(level.to_string());
        Ok(())
    }
}

fn factory(search_path: &std::path::Path) -> ProxyCommands {
    ProxyCommands::new("mgrpxy").with_search_path(Some(search_path.as_os_str().to_owned()))
}

#[test]
fn test_root_has_three_subcommands_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let bootstrap = Rc::new(RecordingBootstrap::default());

    let root =
        build_root_command("mgrpxy", &factory(dir.path()), &ConfigHelpTemplate, bootstrap)
            .unwrap();

    assert_eq!(root.child_names(), vec!["install", "uninstall", COMPLETION_COMMAND]);
    assert!(root.silence_usage);
}

#[test]
fn test_root_persistent_flags() {
    let dir = tempfile::tempdir().unwrap();
    let bootstrap = Rc::new(RecordingBootstrap::default());

    let root =
        build_root_command("mgrpxy", &factory(dir.path()), &ConfigHelpTemplate, bootstrap)
            .unwrap();

    let names: Vec<&str> = root
        .persistent_flags
        .iter()
        .map(|flag| flag.long_name.as_str())
        .collect();
    assert_eq!(names, vec!["config", "logLevel"]);
    assert!(root.persistent_flags.iter().all(|flag| flag.default.is_empty()));
}

#[test]
fn test_uninstall_factory_failure_aborts_build() {
    let bootstrap = Rc::new(RecordingBootstrap::default());
    let factory = ProxyCommands::new("mgrpxy").with_search_path(None);

    let failure =
        build_root_command("mgrpxy", &factory, &ConfigHelpTemplate, bootstrap).unwrap_err();

    assert!(matches!(failure.error, BuildError::Uninstall(_)));
    assert_eq!(failure.root.child_names(), vec!["install"]);
    assert!(failure.root.silence_usage);
}

#[test]
fn test_log_level_applied_before_install_runs() {
    let dir = tempfile::tempdir().unwrap();
    let archive = dir.path().join("proxy.tar.gz");
    std::fs::write(&archive, b"").unwrap();
    let bootstrap = Rc::new(RecordingBootstrap::default());

    let root = build_root_command(
        "mgrpxy",
        &factory(dir.path()),
        &ConfigHelpTemplate,
        bootstrap.clone(),
    )
    .unwrap();

    let archive_arg = archive.display().to_string();
    dispatch(
        &root,
        ["mgrpxy", "--logLevel", "debug", "install", "podman", archive_arg.as_str()],
    )
    .unwrap();

    assert_eq!(*bootstrap.inits.borrow(), 1);
    assert_eq!(*bootstrap.levels.borrow(), vec!["debug".to_string()]);
}

#[test]
fn test_invalid_log_level_is_rejected_by_bootstrap() {
    let dir = tempfile::tempdir().unwrap();
    let bootstrap = Rc::new(RecordingBootstrap::default());
    let root =
        build_root_command("mgrpxy", &factory(dir.path()), &ConfigHelpTemplate, bootstrap)
            .unwrap();

    let err = dispatch(&root, ["mgrpxy", "--logLevel", "chatty", "uninstall"]).unwrap_err();

    assert!(matches!(
        err,
        DispatchError::PreRun(LogLevelError::Unknown(ref level)) if level == "chatty"
    ));
}

#[test]
fn test_missing_archive_fails_install() {
    let dir = tempfile::tempdir().unwrap();
    let bootstrap = Rc::new(RecordingBootstrap::default());
    let root =
        build_root_command("mgrpxy", &factory(dir.path()), &ConfigHelpTemplate, bootstrap)
            .unwrap();

    let missing = dir.path().join("missing.tar.gz").display().to_string();
    let err = dispatch(&root, ["mgrpxy", "install", "kubernetes", missing.as_str()]).unwrap_err();

    match err {
        DispatchError::Command { command, source } => {
            assert_eq!(command, "kubernetes");
            assert!(format!("{source:#}").contains("File not found"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn test_uninstall_without_backend_fails() {
    let dir = tempfile::tempdir().unwrap();
    let bootstrap = Rc::new(RecordingBootstrap::default());
    let root =
        build_root_command("mgrpxy", &factory(dir.path()), &ConfigHelpTemplate, bootstrap)
            .unwrap();

    let err = dispatch(&root, ["mgrpxy", "uninstall"]).unwrap_err();
    assert_eq!(err.exit_code(), 1);
}

#[test]
fn test_subcommand_help_inherits_config_section() {
    let dir = tempfile::tempdir().unwrap();
    let bootstrap = Rc::new(RecordingBootstrap::default());
    let root =
        build_root_command("mgrpxy", &factory(dir.path()), &ConfigHelpTemplate, bootstrap)
            .unwrap();

    let mut cli = to_clap(&root);
    let uninstall = cli.find_subcommand_mut("uninstall").unwrap();
    let help = uninstall.render_help().to_string();
    assert!(help.contains("Configuration:"));
    assert!(help.contains("--purge-volumes"));
}

#[test]
fn test_completion_script_covers_tree() {
    let dir = tempfile::tempdir().unwrap();
    let bootstrap = Rc::new(RecordingBootstrap::default());
    let root =
        build_root_command("mgrpxy", &factory(dir.path()), &ConfigHelpTemplate, bootstrap)
            .unwrap();

    let mut out = Vec::new();
    write_completion(clap_complete::Shell::Zsh, &to_clap(&root), &mut out).unwrap();
    let script = String::from_utf8(out).unwrap();

    assert!(script.contains("#compdef mgrpxy"));
    assert!(script.contains("uninstall"));
    assert!(script.contains("--logLevel"));
}
