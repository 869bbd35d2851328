//! mgrpxy - Uyuni proxy administration tool
//!
//! Installs and removes Uyuni proxies on podman hosts and kubernetes clusters.

use std::process;
use std::rc::Rc;

use mgrpxy::cli::{
    ConfigHelpTemplate, DispatchError, LogBootstrap, TracingBootstrap, build_root_command,
    dispatch, program_name,
};
use mgrpxy::commands::ProxyCommands;

fn main() {
    let name = program_name();
    let bootstrap: Rc<dyn LogBootstrap> = Rc::new(TracingBootstrap::new());

    let root = match build_root_command(
        &name,
        &ProxyCommands::new(&name),
        &ConfigHelpTemplate,
        bootstrap,
    ) {
        Ok(root) => root,
        Err(failure) => {
            // The partially built tree must not be executed
            eprintln!("Error: {:#}", anyhow::Error::from(failure.error));
            process::exit(1);
        }
    };

    if let Err(err) = dispatch(&root, std::env::args_os()) {
        match err {
            DispatchError::Parse(e) => e.exit(),
            other => {
                let code = other.exit_code();
                eprintln!("Error: {:#}", anyhow::Error::new(other));
                process::exit(code);
            }
        }
    }
}
