use std::io::{self, Write};

use anyhow::Result;

use crate::cli::CliArgs;
use crate::commands::common;
use crate::config::{self, ResolvedConfig};
use crate::output::{self, TableOptions, json, table};

pub fn run(args: &CliArgs) -> Result<()> {
    let resolved = common::load_config(args)?;
    let format = output::select_format(&args.output, &resolved.settings);

    if args.quiet {
        return Ok(());
    }

    match format {
        config::OutputFormat::Json => {
            let payload = json::config_to_json(&resolved);
            let body = json::emit_json_value(&payload, resolved.settings.output.json_pretty)?;
            println!("{}", body);
        }
        _ => {
            let rows = config_rows(&resolved);
            let options = TableOptions {
                max_cell_width: 80,
                ..TableOptions::default()
            };
            let rendered = table::render_key_value_table("Config", &rows, format, &options);
            writeln!(io::stdout(), "{}", rendered)?;
        }
    }

    Ok(())
}

fn config_rows(resolved: &ResolvedConfig) -> Vec<(String, String)> {
    let connection = &resolved.connection;
    let compare = &resolved.settings.compare;
    let mut rows = vec![
        (
            "configPath".to_string(),
            resolved
                .config_path
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "(none)".to_string()),
        ),
        ("profileName".to_string(), resolved.profile_name.clone()),
        ("server".to_string(), connection.server.clone()),
        ("port".to_string(), connection.port.to_string()),
        ("database".to_string(), connection.database.clone()),
    ];
    if let Some(user) = &connection.user {
        rows.push(("user".to_string(), user.clone()));
    }
    if connection.password.is_some() {
        rows.push(("password".to_string(), "********".to_string()));
    }
    rows.extend([
        ("encrypt".to_string(), connection.encrypt.to_string()),
        ("trustCert".to_string(), connection.trust_cert.to_string()),
        ("timeoutMs".to_string(), connection.timeout_ms.to_string()),
        ("defaultSchema".to_string(), connection.default_schema.clone()),
        ("compare.maxRows".to_string(), compare.max_rows.to_string()),
        (
            "compare.duplicateKeys".to_string(),
            compare.duplicate_keys.as_str().to_string(),
        ),
        (
            "compare.maxCellWidth".to_string(),
            compare.max_cell_width.to_string(),
        ),
    ]);
    rows
}
