use std::io;

use anyhow::{Result, anyhow};
use clap_complete::{Shell, generate};

use crate::cli::{CompletionsArgs, build_cli};

pub fn run(cmd: &CompletionsArgs) -> Result<()> {
    let shell_name = cmd
        .shell
        .as_deref()
        .ok_or_else(|| anyhow!("--shell is required"))?;

    let shell = match shell_name {
        "bash" => Shell::Bash,
        "zsh" => Shell::Zsh,
        "fish" => Shell::Fish,
        "powershell" => Shell::PowerShell,
        "elvish" => Shell::Elvish,
        _ => return Err(anyhow!("Unsupported shell: {}", shell_name)),
    };

    let mut cli = build_cli(true);
    generate(shell, &mut cli, "rowcmp", &mut io::stdout());
    Ok(())
}
