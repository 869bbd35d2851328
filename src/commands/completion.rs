//! Shell completion command

use std::io::{self, Write};

use anyhow::Context;
use clap::{Arg, Command, value_parser};
use clap_complete::{Generator, Shell};

use crate::cli::{COMPLETION_COMMAND, CommandNode};

pub fn new_command(program: &str) -> CommandNode {
    CommandNode::new(COMPLETION_COMMAND)
        .short("Generate shell completion script")
        .long(format!(
            "Generate the completion script for the given shell.\n\
             Source the output from the shell profile, for example:\n  \
             {program} completion bash > /etc/bash_completion.d/{program}"
        ))
        .arg(
            Arg::new("shell")
                .required(true)
                .value_parser(value_parser!(Shell))
                .help("shell to generate the completion script for"),
        )
        .run(|ctx| {
            let shell = ctx
                .matches
                .get_one::<Shell>("shell")
                .copied()
                .context("Missing shell name")?;
            let mut stdout = io::stdout().lock();
            write_completion(shell, ctx.cli, &mut stdout)
                .and_then(|()| stdout.flush())
                .context("Failed to write completion script")?;
            Ok(())
        })
}

/// Write the completion script of `cli` for `shell` to `out`
///
/// Write failures, such as a closed pipe, are returned to the caller.
pub fn write_completion(shell: Shell, cli: &Command, out: &mut dyn Write) -> io::Result<()> {
    let mut cmd = cli.clone();
    let bin_name = cmd.get_name().to_string();
    cmd.set_bin_name(bin_name);
    cmd.build();
    shell.try_generate(&cmd, out)
}
