mod common;
mod compare;
mod completions;
mod config;
mod help;

use anyhow::Result;

use crate::cli::{CliArgs, CommandKind};

pub use compare::EXIT_DIFFERENCES;

pub fn dispatch(args: &CliArgs) -> Result<()> {
    match &args.command {
        CommandKind::Help { all, command } => help::run(*all, command.as_deref()),
        CommandKind::Compare(cmd) => compare::run(args, cmd),
        CommandKind::Config(_) => config::run(args),
        CommandKind::Completions(cmd) => completions::run(cmd),
    }
}
