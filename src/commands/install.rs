//! Install command
//!
//! `install podman <archive>` and `install kubernetes <archive>` resolve the
//! proxy settings and print the deployment plan.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Arg, ArgAction, ArgMatches, value_parser};

use super::{Plan, existing_file};
use crate::cli::{CommandNode, RunContext};
use crate::config::{ConfigLoader, ProxyConfig};

/// Proxy container images, one per service
pub const PROXY_COMPONENTS: &[&str] = &["httpd", "salt-broker", "squid", "ssh", "tftpd"];

/// Pod grouping the proxy containers on podman
pub const POD_NAME: &str = "uyuni-proxy-pod";

/// Helm release name on kubernetes
pub const RELEASE_NAME: &str = "uyuni-proxy";

const PODMAN_CONFIG_DIR: &str = "/etc/uyuni/proxy";

pub fn new_command(program: &str) -> CommandNode {
    let podman_program = program.to_string();
    let kubernetes_program = program.to_string();

    CommandNode::new("install")
        .short("Install a new proxy from scratch")
        .long("Install a new proxy on a podman host or a kubernetes cluster")
        .child(
            with_image_args(CommandNode::new("podman"))
                .short("Install a new proxy on podman")
                .arg(
                    Arg::new("podman-arg")
                        .long("podman-arg")
                        .action(ArgAction::Append)
                        .help("extra argument passed to podman pod create, can be repeated"),
                )
                .run(move |ctx| install_podman(&podman_program, ctx)),
        )
        .child(
            with_image_args(CommandNode::new("kubernetes"))
                .short("Install a new proxy on a running kubernetes cluster")
                .arg(
                    Arg::new("kubernetes-namespace")
                        .long("kubernetes-namespace")
                        .help("kubernetes namespace to install the proxy to"),
                )
                .run(move |ctx| install_kubernetes(&kubernetes_program, ctx)),
        )
}

fn with_image_args(node: CommandNode) -> CommandNode {
    node.arg(
        Arg::new("archive")
            .required(true)
            .value_parser(value_parser!(PathBuf))
            .help("proxy configuration archive generated on the server (.tar.gz)"),
    )
    .arg(
        Arg::new("registry")
            .long("registry")
            .help("registry hosting the proxy images"),
    )
    .arg(Arg::new("tag").long("tag").help("tag of the proxy images"))
    .arg(
        Arg::new("pullPolicy")
            .long("pullPolicy")
            .help("image pull policy (Always, IfNotPresent, Never)"),
    )
}

/// Apply image flags given on the command line over the loaded settings
pub fn apply_image_flags(config: &mut ProxyConfig, matches: &ArgMatches) {
    if let Some(registry) = matches.get_one::<String>("registry") {
        config.registry = registry.clone();
    }
    if let Some(tag) = matches.get_one::<String>("tag") {
        config.tag = tag.clone();
    }
    if let Some(policy) = matches.get_one::<String>("pullPolicy") {
        config.pull_policy = policy.clone();
    }
}

fn archive(matches: &ArgMatches) -> Result<&Path> {
    let path = matches
        .get_one::<PathBuf>("archive")
        .context("Missing proxy configuration archive")?;
    existing_file(path).context("Invalid proxy configuration archive")
}

fn image(config: &ProxyConfig, component: &str) -> String {
    format!("{}/proxy-{}:{}", config.registry, component, config.tag)
}

fn install_podman(program: &str, ctx: &RunContext<'_>) -> Result<()> {
    let mut config = ConfigLoader::load(ctx.config, program)?;
    apply_image_flags(&mut config, ctx.matches);
    if let Some(args) = ctx.matches.get_many::<String>("podman-arg") {
        config.podman.args = args.cloned().collect();
    }

    let plan = podman_plan(&config, archive(ctx.matches)?)?;
    tracing::info!("Installing proxy on podman with {} steps", plan.steps.len());
    print!("{plan}");
    Ok(())
}

fn install_kubernetes(program: &str, ctx: &RunContext<'_>) -> Result<()> {
    let mut config = ConfigLoader::load(ctx.config, program)?;
    apply_image_flags(&mut config, ctx.matches);
    if let Some(namespace) = ctx.matches.get_one::<String>("kubernetes-namespace") {
        config.kubernetes.namespace = namespace.clone();
    }

    let plan = kubernetes_plan(&config, archive(ctx.matches)?);
    tracing::info!(
        "Installing proxy in namespace {} with {} steps",
        config.kubernetes.namespace,
        plan.steps.len()
    );
    print!("{plan}");
    Ok(())
}

/// Translate a kubernetes image pull policy into a `podman --pull` value
pub fn podman_pull_policy(policy: &str) -> Result<&'static str> {
    match policy.to_ascii_lowercase().as_str() {
        "always" => Ok("always"),
        "ifnotpresent" => Ok("missing"),
        "never" => Ok("never"),
        _ => anyhow::bail!(
            "Unsupported pull policy '{}' (expected Always, IfNotPresent or Never)",
            policy
        ),
    }
}

/// Steps deploying the proxy as a podman pod managed by systemd
pub fn podman_plan(config: &ProxyConfig, archive: &Path) -> Result<Plan> {
    let pull = podman_pull_policy(&config.pull_policy)?;
    let mut plan = Plan::new("Installing proxy on podman");

    plan.step(format!("mkdir -p {PODMAN_CONFIG_DIR}"));
    plan.step(format!(
        "tar xzf {} -C {PODMAN_CONFIG_DIR}",
        archive.display()
    ));
    for component in PROXY_COMPONENTS {
        plan.step(format!("podman pull {}", image(config, component)));
    }

    let mut create = format!("podman pod create --name {POD_NAME}");
    for arg in &config.podman.args {
        create.push(' ');
        create.push_str(arg);
    }
    plan.step(create);

    for component in PROXY_COMPONENTS {
        plan.step(format!(
            "podman create --pod {POD_NAME} --pull {pull} --name uyuni-proxy-{component} -v {PODMAN_CONFIG_DIR}:{PODMAN_CONFIG_DIR}:ro {}",
            image(config, component)
        ));
    }
    plan.step(format!("systemctl enable --now {POD_NAME}"));
    Ok(plan)
}

/// Steps deploying the proxy helm chart
pub fn kubernetes_plan(config: &ProxyConfig, archive: &Path) -> Plan {
    let namespace = &config.kubernetes.namespace;
    let mut plan = Plan::new(format!("Installing proxy in kubernetes namespace {namespace}"));

    plan.step(format!(
        "kubectl create namespace {namespace} --dry-run=client -o yaml | kubectl apply -f -"
    ));
    plan.step(format!(
        "kubectl create secret generic proxy-config -n {namespace} --from-file=config.tar.gz={}",
        archive.display()
    ));
    plan.step(format!(
        "helm upgrade --install {RELEASE_NAME} oci://{}/proxy-helm --version {} -n {namespace} --set images.tag={} --set images.pullPolicy={}",
        config.registry, config.tag, config.tag, config.pull_policy
    ));
    plan
}
