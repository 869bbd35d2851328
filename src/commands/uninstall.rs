//! Uninstall command

use anyhow::{Context, Result};
use clap::{Arg, ArgAction, ArgMatches, value_parser};

use super::install::{POD_NAME, PROXY_COMPONENTS, RELEASE_NAME};
use super::{Backend, Plan};
use crate::cli::{CommandNode, RunContext};
use crate::config::{ConfigLoader, ProxyConfig};

/// Volumes holding the proxy caches on podman
pub const PODMAN_VOLUMES: &[&str] = &[
    "uyuni-proxy-rhn-cache",
    "uyuni-proxy-squid-cache",
    "uyuni-proxy-tftpboot",
];

/// Build the uninstall command for the backends found on this host
pub fn new_command(program: &str, detected: Vec<Backend>) -> CommandNode {
    let program = program.to_string();

    CommandNode::new("uninstall")
        .short("Uninstall a proxy")
        .long(
            "Uninstall a proxy and optionally the corresponding volumes.\n\
             By default it will only print what would be done, use --force to actually remove.",
        )
        .arg(
            Arg::new("backend")
                .long("backend")
                .value_parser(value_parser!(Backend))
                .help("tool used to uninstall the proxy, detected when not given"),
        )
        .arg(
            Arg::new("force")
                .long("force")
                .action(ArgAction::SetTrue)
                .help("actually remove the proxy"),
        )
        .arg(
            Arg::new("purge-volumes")
                .long("purge-volumes")
                .action(ArgAction::SetTrue)
                .help("also remove the volumes"),
        )
        .arg(
            Arg::new("kubernetes-namespace")
                .long("kubernetes-namespace")
                .help("kubernetes namespace the proxy is installed in"),
        )
        .run(move |ctx| uninstall(&program, &detected, ctx))
}

/// Pick the backend from the flag or from the single detected one
pub fn select_backend(requested: Option<Backend>, detected: &[Backend]) -> Result<Backend> {
    if let Some(backend) = requested {
        return Ok(backend);
    }
    match detected {
        [backend] => Ok(*backend),
        [] => anyhow::bail!("Neither podman nor kubectl found, cannot uninstall"),
        _ => anyhow::bail!("Both podman and kubectl found, use --backend to choose one"),
    }
}

fn uninstall(program: &str, detected: &[Backend], ctx: &RunContext<'_>) -> Result<()> {
    let matches: &ArgMatches = ctx.matches;
    let backend = select_backend(matches.get_one::<Backend>("backend").copied(), detected)?;
    let force = matches.get_flag("force");
    let purge = matches.get_flag("purge-volumes");

    let mut config =
        ConfigLoader::load(ctx.config, program).context("Failed to load configuration")?;
    if let Some(namespace) = matches.get_one::<String>("kubernetes-namespace") {
        config.kubernetes.namespace = namespace.clone();
    }

    let mut plan = match backend {
        Backend::Podman => podman_plan(purge),
        Backend::Kubectl => kubernetes_plan(&config, purge),
    };
    plan.dry_run = !force;

    if plan.dry_run {
        tracing::warn!("Nothing will be removed, run with --force to uninstall");
    }
    tracing::info!("Uninstalling proxy with {}", backend);
    print!("{plan}");
    Ok(())
}

/// Steps removing the podman pod, its services and optionally its volumes
pub fn podman_plan(purge_volumes: bool) -> Plan {
    let mut plan = Plan::new("Uninstalling proxy from podman");

    plan.step(format!("systemctl disable --now {POD_NAME}"));
    for component in PROXY_COMPONENTS {
        plan.step(format!("podman rm -f uyuni-proxy-{component}"));
    }
    plan.step(format!("podman pod rm -f {POD_NAME}"));
    if purge_volumes {
        for volume in PODMAN_VOLUMES {
            plan.step(format!("podman volume rm {volume}"));
        }
    }
    plan
}

/// Steps removing the helm release and optionally its persistent volumes
pub fn kubernetes_plan(config: &ProxyConfig, purge_volumes: bool) -> Plan {
    let namespace = &config.kubernetes.namespace;
    let mut plan = Plan::new(format!("Uninstalling proxy from kubernetes namespace {namespace}"));

    plan.step(format!("helm uninstall -n {namespace} {RELEASE_NAME}"));
    plan.step(format!("kubectl delete secret proxy-config -n {namespace}"));
    if purge_volumes {
        plan.step(format!(
            "kubectl delete pvc -n {namespace} -l app.kubernetes.io/part-of={RELEASE_NAME}"
        ));
    }
    plan
}
