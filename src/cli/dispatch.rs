//! Argument parsing and command execution
//!
//! Renders a [`CommandNode`] tree into clap, parses the process arguments,
//! then runs the inherited pre-run hook followed by the selected body.

use std::ffi::OsString;

use clap::{ArgMatches, Command};
use thiserror::Error;

use super::flags::GlobalConfig;
use super::logging::LogLevelError;
use super::node::{CommandNode, RunContext};

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error(transparent)]
    Parse(#[from] clap::Error),

    #[error("failed to initialize logging")]
    PreRun(#[from] LogLevelError),

    #[error("{command} failed")]
    Command {
        command: String,
        #[source]
        source: anyhow::Error,
    },
}

impl DispatchError {
    pub fn exit_code(&self) -> i32 {
        match self {
            DispatchError::Parse(e) => e.exit_code(),
            _ => 1,
        }
    }
}

/// Render the tree into a clap command
///
/// Persistent flags become global arguments and usage templates are
/// inherited by descendants that do not define their own.
pub fn to_clap(node: &CommandNode) -> Command {
    render(node, None)
}

fn render(node: &CommandNode, inherited_template: Option<&str>) -> Command {
    let mut cmd = Command::new(node.name.clone());

    if !node.short_description.is_empty() {
        cmd = cmd.about(node.short_description.clone());
    }
    if !node.long_description.is_empty() {
        cmd = cmd.long_about(node.long_description.clone());
    }
    if let Some(version) = &node.version {
        cmd = cmd.version(version.clone());
    }

    let template = node.usage_template.as_deref().or(inherited_template);
    if let Some(template) = template {
        cmd = cmd.help_template(template.to_string());
    }

    for flag in &node.persistent_flags {
        cmd = cmd.arg(flag.to_arg());
    }
    for arg in &node.args {
        cmd = cmd.arg(arg.clone());
    }

    if !node.children.is_empty() {
        // A group without a body only makes sense with a subcommand
        if !node.is_runnable() {
            cmd = cmd.subcommand_required(true).arg_required_else_help(true);
        }
        for child in &node.children {
            cmd = cmd.subcommand(render(child, template));
        }
    }
    cmd
}

/// Parse `args` against the tree and execute the selected command
pub fn dispatch<I, T>(root: &CommandNode, args: I) -> Result<(), DispatchError>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = to_clap(root);
    let matches = cli.clone().try_get_matches_from(args)?;
    let (path, selected_matches) = selected_path(root, &matches);
    let selected = path[path.len() - 1];

    let config = GlobalConfig::from_matches(
        path.iter().flat_map(|node| node.persistent_flags.iter()),
        selected_matches,
    );

    if let Some(hook) = path.iter().rev().find_map(|node| node.pre_run.as_ref()) {
        hook.run(&selected.name, &config)?;
    }

    let Some(body) = &selected.run else {
        tracing::debug!("Command {} has nothing to run", selected.name);
        return Ok(());
    };

    let ctx = RunContext {
        config: &config,
        matches: selected_matches,
        cli: &cli,
    };
    body(&ctx).map_err(|source| {
        if !path.iter().any(|node| node.silence_usage) {
            eprintln!("{}", usage_for(&cli, &path));
        }
        DispatchError::Command {
            command: selected.name.clone(),
            source,
        }
    })
}

/// Nodes from the root down to the selected command, with its matches
fn selected_path<'a>(
    root: &'a CommandNode,
    matches: &'a ArgMatches,
) -> (Vec<&'a CommandNode>, &'a ArgMatches) {
    let mut path = vec![root];
    let mut node = root;
    let mut node_matches = matches;

    while let Some((name, sub_matches)) = node_matches.subcommand() {
        let Some(child) = node.find_child(name) else {
            break;
        };
        path.push(child);
        node = child;
        node_matches = sub_matches;
    }
    (path, node_matches)
}

fn usage_for(cli: &Command, path: &[&CommandNode]) -> String {
    let mut cmd = cli.clone();
    cmd.build();
    for node in path.iter().skip(1) {
        match cmd.find_subcommand(&node.name) {
            Some(sub) => cmd = sub.clone(),
            None => break,
        }
    }
    cmd.render_usage().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::logging::{LogBootstrap, MockLogBootstrap};
    use crate::cli::root::{MockSubcommandFactory, build_root_command};
    use crate::cli::usage::ConfigHelpTemplate;
    use clap::error::ErrorKind;
    use std::rc::Rc;
    use std::sync::{Arc, Mutex};

    type Events = Arc<Mutex<Vec<String>>>;

    fn recording_bootstrap(events: &Events) -> Rc<dyn LogBootstrap> {
        let mut mock = MockLogBootstrap::new();
        let init_events = events.clone();
        mock.expect_init()
            .returning(move || init_events.lock().unwrap().push("init".to_string()));
        let level_events = events.clone();
        mock.expect_set_level().returning(move |level| {
            level_events.lock().unwrap().push(format!("level:{level}"));
            Ok(())
        });
        Rc::new(mock)
    }

    fn recording_factory(events: &Events) -> MockSubcommandFactory {
        let mut factory = MockSubcommandFactory::new();
        let install_events = events.clone();
        factory.expect_install().returning(move || {
            let events = install_events.clone();
            CommandNode::new("install").run(move |ctx| {
                events
                    .lock()
                    .unwrap()
                    .push(format!("install:{}", ctx.config.log_level));
                Ok(())
            })
        });
        factory.expect_uninstall().returning(|| {
            Ok(CommandNode::new("uninstall")
                .run(|_| Err(anyhow::anyhow!("nothing to uninstall"))))
        });
        factory
            .expect_completion()
            .returning(|| CommandNode::new("completion").run(|_| Ok(())));
        factory
    }

    fn root(events: &Events) -> CommandNode {
        build_root_command(
            "mgrpxy",
            &recording_factory(events),
            &ConfigHelpTemplate,
            recording_bootstrap(events),
        )
        .unwrap()
    }

    #[test]
    fn test_log_level_resolved_before_body_runs() {
        let events = Events::default();
        let root = root(&events);

        dispatch(&root, ["mgrpxy", "--logLevel", "debug", "install"]).unwrap();

        assert_eq!(
            *events.lock().unwrap(),
            vec!["init", "level:debug", "install:debug"]
        );
    }

    #[test]
    fn test_global_flag_accepted_after_subcommand() {
        let events = Events::default();
        let root = root(&events);

        dispatch(&root, ["mgrpxy", "install", "--logLevel", "warn", "-c", "x.yaml"]).unwrap();

        assert_eq!(events.lock().unwrap().last().unwrap(), "install:warn");
    }

    #[test]
    fn test_body_failure_is_reported_with_command_name() {
        let events = Events::default();
        let root = root(&events);

        let err = dispatch(&root, ["mgrpxy", "uninstall"]).unwrap_err();

        assert!(matches!(err, DispatchError::Command { ref command, .. } if command == "uninstall"));
        assert_eq!(err.exit_code(), 1);
        let chain = format!("{:#}", anyhow::Error::new(err));
        assert!(chain.contains("nothing to uninstall"));
    }

    #[test]
    fn test_bare_root_requires_subcommand() {
        let events = Events::default();
        let root = root(&events);

        let err = dispatch(&root, ["mgrpxy"]).unwrap_err();
        match err {
            DispatchError::Parse(e) => assert_eq!(
                e.kind(),
                ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand
            ),
            other => panic!("unexpected error: {other:?}"),
        }
        // Nothing ran, not even the hook
        assert!(events.lock().unwrap().is_empty());
    }

    #[test]
    fn test_unknown_subcommand_is_parse_error() {
        let events = Events::default();
        let root = root(&events);

        let err = dispatch(&root, ["mgrpxy", "upgrade"]).unwrap_err();
        assert!(matches!(err, DispatchError::Parse(_)));
        assert_ne!(err.exit_code(), 0);
    }

    #[test]
    fn test_rejected_log_level_aborts_before_body() {
        let events = Events::default();
        let mut mock = MockLogBootstrap::new();
        mock.expect_init().return_const(());
        mock.expect_set_level()
            .returning(|level| Err(LogLevelError::Unknown(level.to_string())));
        let root = build_root_command(
            "mgrpxy",
            &recording_factory(&events),
            &ConfigHelpTemplate,
            Rc::new(mock),
        )
        .unwrap();

        let err = dispatch(&root, ["mgrpxy", "--logLevel", "loud", "install"]).unwrap_err();

        assert!(matches!(err, DispatchError::PreRun(_)));
        assert!(events.lock().unwrap().is_empty());
    }

    #[test]
    fn test_rendered_tree_mirrors_nodes() {
        let events = Events::default();
        let cli = to_clap(&root(&events));

        let names: Vec<&str> = cli.get_subcommands().map(|c| c.get_name()).collect();
        assert_eq!(names, vec!["install", "uninstall", "completion"]);
        assert!(cli.get_arguments().any(|a| a.get_id() == "config" && a.is_global_set()));
        assert!(cli.get_arguments().any(|a| a.get_id() == "logLevel" && a.is_global_set()));
    }

    #[test]
    fn test_help_mentions_configuration() {
        let events = Events::default();
        let mut cli = to_clap(&root(&events));
        let help = cli.render_help().to_string();
        assert!(help.contains("Configuration:"));
        assert!(help.contains("install"));
    }
}
