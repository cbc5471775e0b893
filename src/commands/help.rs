use std::io::{self, Write};

use anyhow::{Result, anyhow};

use crate::cli::build_cli;

pub fn run(show_all: bool, command: Option<&str>) -> Result<()> {
    let mut cmd = build_cli(show_all);

    if let Some(name) = command {
        let sub = cmd
            .find_subcommand_mut(name)
            .ok_or_else(|| anyhow!("Unknown command: {}", name))?;
        sub.print_long_help()?;
        io::stdout().flush()?;
        return Ok(());
    }

    cmd.print_long_help()?;
    io::stdout().flush()?;
    Ok(())
}
