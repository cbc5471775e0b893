use std::io::{self, Write};
use std::path::Path;

use anyhow::Result;
use tokio::runtime::Runtime;

use crate::cli::{CliArgs, CompareArgs};
use crate::commands::common;
use crate::compare::{self as engine, ComparisonRequest, ComparisonResult, column_stats};
use crate::config::{
    CliOverrides, ConnectionSettings, DuplicateKeyPolicy, OutputFormat, ResolvedConfig,
    parse_connection_string,
};
use crate::error::{AppError, ErrorKind};
use crate::output::{self, ComparisonView, TableOptions, csv, html, json as json_out, table, xlsx};
use crate::source::{self, DataSet, SourceSpec, TableRef};

/// Exit status when `--fail-on-diff` is set and differences were found.
pub const EXIT_DIFFERENCES: i32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Source,
    Target,
}

impl Side {
    fn as_str(self) -> &'static str {
        match self {
            Side::Source => "source",
            Side::Target => "target",
        }
    }
}

/// One side after resolving flags and configuration.
#[derive(Debug)]
struct SidePlan {
    spec: SourceSpec,
    label: String,
    connection: Option<ConnectionSettings>,
}

/// Execute the `compare` command: load both sides, compare, render, export.
pub fn run(args: &CliArgs, cmd: &CompareArgs) -> Result<()> {
    let base_overrides = common::overrides_from_args(args);
    let source_cfg = resolve_side_config(
        &base_overrides,
        cmd.source_profile.as_deref().or(args.profile.as_deref()),
        cmd.source_connection.as_deref(),
    )?;
    let target_cfg = resolve_side_config(
        &base_overrides,
        cmd.target_profile.as_deref().or(args.profile.as_deref()),
        cmd.target_connection.as_deref(),
    )?;

    let settings = &source_cfg.settings;
    let policy = match cmd.duplicate_keys.as_deref() {
        Some(raw) => DuplicateKeyPolicy::parse(raw).ok_or_else(|| {
            AppError::new(
                ErrorKind::Input,
                format!("Unknown duplicate key policy: {}", raw),
            )
        })?,
        None => settings.compare.duplicate_keys,
    };
    let max_rows = cmd.max_rows.unwrap_or(settings.compare.max_rows);

    let source_plan = plan_side(Side::Source, cmd, &source_cfg, max_rows, args.allow_write)?;
    let target_plan = plan_side(Side::Target, cmd, &target_cfg, max_rows, args.allow_write)?;
    tracing::info!(
        source = %source_plan.label,
        target = %target_plan.label,
        "comparing"
    );

    let rt = Runtime::new()?;
    let (source_data, target_data) = rt.block_on(async {
        tokio::try_join!(
            source::fetch(
                &source_plan.spec,
                &source_plan.label,
                source_plan.connection.as_ref()
            ),
            source::fetch(
                &target_plan.spec,
                &target_plan.label,
                target_plan.connection.as_ref()
            ),
        )
    })?;

    let request = ComparisonRequest::resolve(
        &source_data.columns,
        &target_data.columns,
        &cmd.keys,
        &cmd.columns,
        &cmd.exclude,
    )?;
    request.check_duplicates(policy, &source_data.rows, &target_data.rows)?;

    let table_name = cmd.name.clone().unwrap_or_else(|| source_data.name.clone());
    let result = rt.block_on(run_comparison(table_name, source_data, target_data, request))?;
    let stats = column_stats(&result);

    let written = write_exports(cmd, &result)?;

    let format = common::output_format(args, &source_cfg);
    if !args.quiet {
        match format {
            OutputFormat::Json => {
                let payload = json_out::comparison_to_json(&result, &stats);
                let body = json_out::emit_json_value(&payload, common::json_pretty(&source_cfg))?;
                println!("{}", body);
            }
            _ => {
                let options = TableOptions {
                    max_cell_width: settings.compare.max_cell_width,
                    color: output::should_color_stdout(),
                    ..TableOptions::default()
                };
                let view = ComparisonView {
                    only_diff: cmd.only_diff,
                    limit: cmd.limit,
                    summary_only: cmd.summary,
                };
                let rendered = table::render_comparison(&result, &stats, format, &options, &view);
                println!("{}", rendered);
                for (kind, path) in &written {
                    println!("Wrote {} report to {}", kind, path.display());
                }
            }
        }
    }

    if cmd.fail_on_diff && result.summary.has_differences() {
        io::stdout().flush()?;
        std::process::exit(EXIT_DIFFERENCES);
    }

    Ok(())
}

/// Run the comparator on a blocking worker so the runtime stays free.
async fn run_comparison(
    table_name: String,
    source_data: DataSet,
    target_data: DataSet,
    request: ComparisonRequest,
) -> Result<ComparisonResult> {
    let result = tokio::task::spawn_blocking(move || {
        engine::compare(
            &table_name,
            &source_data.label,
            &target_data.label,
            &source_data.rows,
            &target_data.rows,
            &request.compare_columns,
            &request.key_columns,
        )
    })
    .await
    .map_err(|err| AppError::new(ErrorKind::Internal, format!("Comparison task failed: {}", err)))?;
    Ok(result)
}

fn resolve_side_config(
    base: &CliOverrides,
    profile: Option<&str>,
    connection_string: Option<&str>,
) -> Result<ResolvedConfig> {
    let mut overrides = base.clone();
    overrides.profile = profile.map(str::to_string);
    let mut resolved = common::load_with_overrides(&overrides)?;
    if let Some(raw) = connection_string {
        let parsed = parse_connection_string(raw)
            .map_err(|err| AppError::new(ErrorKind::Config, err.to_string()))?;
        parsed.apply_to(&mut resolved.connection);
    }
    Ok(resolved)
}

fn plan_side(
    side: Side,
    cmd: &CompareArgs,
    resolved: &ResolvedConfig,
    max_rows: u64,
    allow_write: bool,
) -> Result<SidePlan> {
    let spec = side_spec(side, cmd, resolved, max_rows, allow_write)?;
    let (label, connection) = match &spec {
        SourceSpec::Csv { path } | SourceSpec::Json { path } => (path.display().to_string(), None),
        _ => (
            connection_label(resolved),
            Some(resolved.connection.clone()),
        ),
    };
    Ok(SidePlan {
        spec,
        label,
        connection,
    })
}

fn side_spec(
    side: Side,
    cmd: &CompareArgs,
    resolved: &ResolvedConfig,
    max_rows: u64,
    allow_write: bool,
) -> Result<SourceSpec> {
    let (file, query, table) = match side {
        Side::Source => (&cmd.source_file, &cmd.source_query, &cmd.source_table),
        Side::Target => (&cmd.target_file, &cmd.target_query, &cmd.target_table),
    };

    if let Some(path) = file {
        return SourceSpec::from_file(path.as_path());
    }
    if let Some(sql) = query {
        return Ok(SourceSpec::Query {
            sql: sql.clone(),
            allow_write,
        });
    }

    let Some(name) = table.as_deref().or(cmd.table.as_deref()) else {
        return Err(AppError::new(
            ErrorKind::Input,
            format!(
                "Nothing to read for the {side} side. Use --table, --{side}-table, --{side}-query or --{side}-file.",
                side = side.as_str()
            ),
        )
        .into());
    };

    let schema = cmd
        .schema
        .as_deref()
        .unwrap_or(resolved.connection.default_schema.as_str());
    Ok(SourceSpec::Table {
        table: TableRef::parse(name, schema)?,
        filter: cmd.where_clause.clone(),
        max_rows,
        allow_write,
    })
}

fn connection_label(resolved: &ResolvedConfig) -> String {
    if resolved.profile_name == "default" {
        resolved.connection.describe()
    } else {
        format!(
            "{} ({})",
            resolved.profile_name,
            resolved.connection.describe()
        )
    }
}

fn write_exports(
    cmd: &CompareArgs,
    result: &ComparisonResult,
) -> Result<Vec<(&'static str, std::path::PathBuf)>> {
    type Exporter = fn(&ComparisonResult, &Path) -> Result<()>;
    let targets: [(&'static str, &Option<std::path::PathBuf>, Exporter); 3] = [
        ("CSV", &cmd.csv, csv::export_comparison),
        ("HTML", &cmd.html, html::export_comparison),
        ("XLSX", &cmd.xlsx, xlsx::export_comparison),
    ];

    let mut written = Vec::new();
    for (kind, path, export) in targets {
        if let Some(path) = path {
            export(result, path)?;
            written.push((kind, path.clone()));
        }
    }
    Ok(written)
}
