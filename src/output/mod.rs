pub mod csv;
pub mod html;
pub mod json;
pub mod table;
pub mod xlsx;

use std::io::IsTerminal;

use crate::cli::OutputFlags;
use crate::config::{OutputFormat, SettingsResolved};

pub use table::{ComparisonView, TableOptions};

pub fn select_format(flags: &OutputFlags, settings: &SettingsResolved) -> OutputFormat {
    if flags.json {
        return OutputFormat::Json;
    }
    if flags.markdown {
        return OutputFormat::Markdown;
    }
    if flags.pretty {
        return OutputFormat::Pretty;
    }

    let is_tty = std::io::stdout().is_terminal();
    if is_tty {
        settings.output.default_format
    } else {
        OutputFormat::Markdown
    }
}

/// Colors only for an interactive stdout and only when `NO_COLOR` is unset.
pub fn should_color_stdout() -> bool {
    std::env::var_os("NO_COLOR").is_none() && std::io::stdout().is_terminal()
}
