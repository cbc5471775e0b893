use std::path::PathBuf;

use clap::{Arg, ArgAction, ArgMatches, Command, ValueHint};

#[derive(Debug, Clone)]
pub struct OutputFlags {
    pub json: bool,
    pub markdown: bool,
    pub pretty: bool,
}

#[derive(Debug, Clone)]
pub struct CliArgs {
    pub config_path: Option<PathBuf>,
    pub env_file: Option<PathBuf>,
    pub profile: Option<String>,
    pub server: Option<String>,
    pub port: Option<u16>,
    pub database: Option<String>,
    pub user: Option<String>,
    pub password: Option<String>,
    pub timeout_ms: Option<u64>,
    pub allow_write: bool,
    pub encrypt: Option<bool>,
    pub trust_cert: Option<bool>,
    pub output: OutputFlags,
    pub verbose: u8,
    pub quiet: bool,
    pub command: CommandKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandKind {
    Help { all: bool, command: Option<String> },
    Compare(Box<CompareArgs>),
    Config(ConfigArgs),
    Completions(CompletionsArgs),
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CompareArgs {
    pub source_profile: Option<String>,
    pub target_profile: Option<String>,
    pub source_connection: Option<String>,
    pub target_connection: Option<String>,
    pub table: Option<String>,
    pub source_table: Option<String>,
    pub target_table: Option<String>,
    pub source_query: Option<String>,
    pub target_query: Option<String>,
    pub source_file: Option<PathBuf>,
    pub target_file: Option<PathBuf>,
    pub schema: Option<String>,
    pub where_clause: Option<String>,
    pub max_rows: Option<u64>,
    pub keys: Vec<String>,
    pub columns: Vec<String>,
    pub exclude: Vec<String>,
    pub name: Option<String>,
    pub only_diff: bool,
    pub limit: Option<usize>,
    pub summary: bool,
    pub fail_on_diff: bool,
    pub duplicate_keys: Option<String>,
    pub csv: Option<PathBuf>,
    pub html: Option<PathBuf>,
    pub xlsx: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ConfigArgs;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionsArgs {
    pub shell: Option<String>,
}

pub fn build_cli(show_all: bool) -> Command {
    let mut cmd = Command::new("rowcmp")
        .about("Row-by-row, cell-by-cell comparison of SQL Server tables, queries and data files")
        .version(env!("CARGO_PKG_VERSION"))
        .arg_required_else_help(true)
        .disable_help_subcommand(true)
        .subcommand_value_name("COMMAND");

    cmd = add_global_args(cmd);

    cmd = cmd.subcommand(command_help());
    cmd = cmd.subcommand(command_compare(show_all));
    cmd = cmd.subcommand(command_config(show_all));
    cmd = cmd.subcommand(command_completions(show_all));

    cmd
}

pub fn parse_args() -> CliArgs {
    let matches = build_cli(false).get_matches();
    parse_matches(&matches)
}

/// Parse an explicit argument list (first item is the binary name).
pub fn try_parse_from<I, T>(args: I) -> Result<CliArgs, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    let matches = build_cli(false).try_get_matches_from(args)?;
    Ok(parse_matches(&matches))
}

fn add_global_args(cmd: Command) -> Command {
    cmd.arg(
        Arg::new("config")
            .long("config")
            .value_name("PATH")
            .value_hint(ValueHint::FilePath)
            .global(true)
            .help("Override config file location"),
    )
    .arg(
        Arg::new("env-file")
            .long("env-file")
            .value_name("PATH")
            .value_hint(ValueHint::FilePath)
            .global(true)
            .help("Load environment variables from file (default: .env)"),
    )
    .arg(
        Arg::new("profile")
            .long("profile")
            .value_name("NAME")
            .global(true)
            .help("Select connection profile"),
    )
    .arg(
        Arg::new("server")
            .long("server")
            .value_name("HOST")
            .global(true)
            .help("SQL Server hostname"),
    )
    .arg(
        Arg::new("port")
            .long("port")
            .value_name("PORT")
            .value_parser(clap::value_parser!(u16))
            .global(true)
            .help("SQL Server port (default: 1433)"),
    )
    .arg(
        Arg::new("database")
            .long("database")
            .value_name("NAME")
            .global(true)
            .help("Database name (default: master)"),
    )
    .arg(
        Arg::new("user")
            .long("user")
            .value_name("USER")
            .global(true)
            .help("SQL Server username"),
    )
    .arg(
        Arg::new("password")
            .long("password")
            .value_name("PASS")
            .global(true)
            .help("SQL Server password"),
    )
    .arg(
        Arg::new("timeout")
            .long("timeout")
            .value_name("MS")
            .value_parser(clap::value_parser!(u64))
            .global(true)
            .help("Connection timeout in milliseconds"),
    )
    .arg(
        Arg::new("allow-write")
            .long("allow-write")
            .action(ArgAction::SetTrue)
            .global(true)
            .help("Skip the read-only check on --source-query/--target-query/--where"),
    )
    .arg(
        Arg::new("encrypt")
            .long("encrypt")
            .value_parser(clap::value_parser!(bool))
            .global(true)
            .help("Enable connection encryption"),
    )
    .arg(
        Arg::new("trust-cert")
            .long("trust-cert")
            .value_parser(clap::value_parser!(bool))
            .global(true)
            .help("Trust server certificate"),
    )
    .arg(
        Arg::new("json")
            .long("json")
            .action(ArgAction::SetTrue)
            .global(true)
            .help("Output as JSON"),
    )
    .arg(
        Arg::new("markdown")
            .long("markdown")
            .action(ArgAction::SetTrue)
            .global(true)
            .help("Force markdown table output"),
    )
    .arg(
        Arg::new("pretty")
            .long("pretty")
            .action(ArgAction::SetTrue)
            .global(true)
            .help("Force pretty-printed table output"),
    )
    .arg(
        Arg::new("verbose")
            .short('v')
            .long("verbose")
            .action(ArgAction::Count)
            .global(true)
            .help("Increase log verbosity (-v info, -vv debug, -vvv trace)"),
    )
    .arg(
        Arg::new("quiet")
            .short('q')
            .long("quiet")
            .action(ArgAction::SetTrue)
            .global(true)
            .help("Suppress non-error output"),
    )
}

fn command_help() -> Command {
    Command::new("help")
        .about("Show help for commands")
        .arg(
            Arg::new("all")
                .long("all")
                .action(ArgAction::SetTrue)
                .help("Show all commands, including advanced ones"),
        )
        .arg(Arg::new("command").value_name("COMMAND"))
}

fn command_core(
    name: &'static str,
    about: &'static str,
    aliases: &'static [&'static str],
    _show_all: bool,
) -> Command {
    let mut cmd = Command::new(name).about(about);
    for alias in aliases {
        cmd = cmd.visible_alias(*alias);
    }
    cmd
}

fn command_advanced(
    name: &'static str,
    about: &'static str,
    aliases: &'static [&'static str],
    show_all: bool,
) -> Command {
    let mut cmd = Command::new(name).about(about);
    for alias in aliases {
        cmd = cmd.visible_alias(*alias);
    }
    if !show_all {
        cmd = cmd.hide(true);
    }
    cmd
}

fn list_arg(name: &'static str, value_name: &'static str, help: &'static str) -> Arg {
    Arg::new(name)
        .long(name)
        .value_name(value_name)
        .action(ArgAction::Append)
        .value_delimiter(',')
        .help(help)
}

fn path_arg(name: &'static str, help: &'static str) -> Arg {
    Arg::new(name)
        .long(name)
        .value_name("PATH")
        .value_hint(ValueHint::FilePath)
        .help(help)
}

fn command_compare(show_all: bool) -> Command {
    command_core(
        "compare",
        "Compare rows of two tables, queries or data files",
        &["diff"],
        show_all,
    )
    .arg(
        Arg::new("source-profile")
            .long("source-profile")
            .value_name("NAME")
            .help("Connection profile for the source side (default: --profile)"),
    )
    .arg(
        Arg::new("target-profile")
            .long("target-profile")
            .value_name("NAME")
            .help("Connection profile for the target side (default: --profile)"),
    )
    .arg(
        Arg::new("source-connection")
            .long("source-connection")
            .value_name("CONN")
            .help("Source connection string (ADO or sqlserver:// URL)"),
    )
    .arg(
        Arg::new("target-connection")
            .long("target-connection")
            .value_name("CONN")
            .help("Target connection string (ADO or sqlserver:// URL)"),
    )
    .arg(
        Arg::new("table")
            .long("table")
            .value_name("[SCHEMA.]TABLE")
            .help("Table read on both sides unless a side is given explicitly"),
    )
    .arg(
        Arg::new("source-table")
            .long("source-table")
            .value_name("[SCHEMA.]TABLE")
            .conflicts_with_all(["source-query", "source-file"]),
    )
    .arg(
        Arg::new("target-table")
            .long("target-table")
            .value_name("[SCHEMA.]TABLE")
            .conflicts_with_all(["target-query", "target-file"]),
    )
    .arg(
        Arg::new("source-query")
            .long("source-query")
            .value_name("SQL")
            .conflicts_with("source-file"),
    )
    .arg(
        Arg::new("target-query")
            .long("target-query")
            .value_name("SQL")
            .conflicts_with("target-file"),
    )
    .arg(path_arg("source-file", "Read the source side from a .csv or .json file"))
    .arg(path_arg("target-file", "Read the target side from a .csv or .json file"))
    .arg(
        Arg::new("schema")
            .long("schema")
            .value_name("NAME")
            .help("Schema for unqualified table names (default: profile defaultSchema)"),
    )
    .arg(
        Arg::new("where")
            .long("where")
            .value_name("FILTER")
            .help("WHERE clause applied to table reads on both sides"),
    )
    .arg(
        Arg::new("max-rows")
            .long("max-rows")
            .value_name("n")
            .value_parser(clap::value_parser!(u64))
            .help("Rows read per table (0 = no limit, default: compare.maxRows)"),
    )
    .arg(list_arg(
        "key",
        "COLUMN",
        "Identification column(s); repeat or separate with commas",
    ))
    .arg(list_arg(
        "columns",
        "COLUMN",
        "Compare only these columns",
    ))
    .arg(list_arg("exclude", "COLUMN", "Leave these columns out of the comparison"))
    .arg(
        Arg::new("name")
            .long("name")
            .value_name("NAME")
            .help("Name shown in reports (default: source table or file name)"),
    )
    .arg(
        Arg::new("only-diff")
            .long("only-diff")
            .action(ArgAction::SetTrue)
            .help("Hide matched rows in the row grid"),
    )
    .arg(
        Arg::new("limit")
            .long("limit")
            .value_name("n")
            .value_parser(clap::value_parser!(usize))
            .help("Show at most n rows in the row grid"),
    )
    .arg(
        Arg::new("summary")
            .long("summary")
            .action(ArgAction::SetTrue)
            .help("Print summary and column statistics only"),
    )
    .arg(
        Arg::new("fail-on-diff")
            .long("fail-on-diff")
            .action(ArgAction::SetTrue)
            .help("Exit with status 3 when any difference is found"),
    )
    .arg(
        Arg::new("duplicate-keys")
            .long("duplicate-keys")
            .value_name("POLICY")
            .value_parser(["last-wins", "reject"])
            .help("Handling of repeated identification keys (default: compare.duplicateKeys)"),
    )
    .arg(path_arg("csv", "Also write the comparison as CSV"))
    .arg(path_arg("html", "Also write the comparison as an HTML report"))
    .arg(path_arg("xlsx", "Also write the comparison as an Excel workbook"))
}

fn command_config(show_all: bool) -> Command {
    command_core("config", "Display resolved config", &[], show_all)
}

fn command_completions(show_all: bool) -> Command {
    command_advanced("completions", "Generate shell completions", &[], show_all).arg(
        Arg::new("shell")
            .long("shell")
            .value_name("name")
            .value_parser(["bash", "zsh", "fish", "powershell", "elvish"]),
    )
}

fn strings(matches: &ArgMatches, name: &str) -> Vec<String> {
    matches
        .get_many::<String>(name)
        .map(|values| {
            values
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .collect()
        })
        .unwrap_or_default()
}

fn parse_compare(sub_m: &ArgMatches) -> CompareArgs {
    CompareArgs {
        source_profile: sub_m.get_one::<String>("source-profile").cloned(),
        target_profile: sub_m.get_one::<String>("target-profile").cloned(),
        source_connection: sub_m.get_one::<String>("source-connection").cloned(),
        target_connection: sub_m.get_one::<String>("target-connection").cloned(),
        table: sub_m.get_one::<String>("table").cloned(),
        source_table: sub_m.get_one::<String>("source-table").cloned(),
        target_table: sub_m.get_one::<String>("target-table").cloned(),
        source_query: sub_m.get_one::<String>("source-query").cloned(),
        target_query: sub_m.get_one::<String>("target-query").cloned(),
        source_file: sub_m.get_one::<String>("source-file").map(PathBuf::from),
        target_file: sub_m.get_one::<String>("target-file").map(PathBuf::from),
        schema: sub_m.get_one::<String>("schema").cloned(),
        where_clause: sub_m.get_one::<String>("where").cloned(),
        max_rows: sub_m.get_one::<u64>("max-rows").copied(),
        keys: strings(sub_m, "key"),
        columns: strings(sub_m, "columns"),
        exclude: strings(sub_m, "exclude"),
        name: sub_m.get_one::<String>("name").cloned(),
        only_diff: sub_m.get_flag("only-diff"),
        limit: sub_m.get_one::<usize>("limit").copied(),
        summary: sub_m.get_flag("summary"),
        fail_on_diff: sub_m.get_flag("fail-on-diff"),
        duplicate_keys: sub_m.get_one::<String>("duplicate-keys").cloned(),
        csv: sub_m.get_one::<String>("csv").map(PathBuf::from),
        html: sub_m.get_one::<String>("html").map(PathBuf::from),
        xlsx: sub_m.get_one::<String>("xlsx").map(PathBuf::from),
    }
}

fn parse_matches(matches: &ArgMatches) -> CliArgs {
    let config_path = matches.get_one::<String>("config").map(PathBuf::from);
    let env_file = matches.get_one::<String>("env-file").map(PathBuf::from);
    let profile = matches.get_one::<String>("profile").cloned();
    let server = matches.get_one::<String>("server").cloned();
    let port = matches.get_one::<u16>("port").copied();
    let database = matches.get_one::<String>("database").cloned();
    let user = matches.get_one::<String>("user").cloned();
    let password = matches.get_one::<String>("password").cloned();
    let timeout_ms = matches.get_one::<u64>("timeout").copied();
    let allow_write = matches.get_flag("allow-write");
    let encrypt = matches.get_one::<bool>("encrypt").copied();
    let trust_cert = matches.get_one::<bool>("trust-cert").copied();
    let output = OutputFlags {
        json: matches.get_flag("json"),
        markdown: matches.get_flag("markdown"),
        pretty: matches.get_flag("pretty"),
    };
    let verbose = matches.get_count("verbose");
    let quiet = matches.get_flag("quiet");

    let command = match matches.subcommand() {
        Some(("help", sub_m)) => CommandKind::Help {
            all: sub_m.get_flag("all"),
            command: sub_m.get_one::<String>("command").cloned(),
        },
        Some(("compare", sub_m)) => CommandKind::Compare(Box::new(parse_compare(sub_m))),
        Some(("config", _)) => CommandKind::Config(ConfigArgs),
        Some(("completions", sub_m)) => CommandKind::Completions(CompletionsArgs {
            shell: sub_m.get_one::<String>("shell").cloned(),
        }),
        _ => CommandKind::Help {
            all: false,
            command: None,
        },
    };

    CliArgs {
        config_path,
        env_file,
        profile,
        server,
        port,
        database,
        user,
        password,
        timeout_ms,
        allow_write,
        encrypt,
        trust_cert,
        output,
        verbose,
        quiet,
        command,
    }
}
