use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};

use super::connection_string::parse_connection_url;
use super::env::{Env, parse_bool};
use super::schema::{
    CompareSettings, ConfigFile, DuplicateKeyPolicy, OutputFormat, OutputSettings, Profile,
    Settings,
};

const DEFAULT_MAX_ROWS: u64 = 1000;
const DEFAULT_MAX_CELL_WIDTH: usize = 40;

#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub config_path: Option<PathBuf>,
    pub env_file: Option<PathBuf>,
    pub profile: Option<String>,
    pub server: Option<String>,
    pub port: Option<u16>,
    pub database: Option<String>,
    pub user: Option<String>,
    pub password: Option<String>,
    pub timeout_ms: Option<u64>,
    pub encrypt: Option<bool>,
    pub trust_cert: Option<bool>,
}

#[derive(Debug, Clone)]
pub struct LoadOptions {
    pub cli: CliOverrides,
    pub cwd: PathBuf,
    pub home_dir: Option<PathBuf>,
    pub xdg_config_dir: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub config_path: Option<PathBuf>,
    pub profile_name: String,
    pub connection: ConnectionSettings,
    pub settings: SettingsResolved,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConnectionSettings {
    pub server: String,
    pub port: u16,
    pub database: String,
    pub user: Option<String>,
    pub password: Option<String>,
    pub encrypt: bool,
    pub trust_cert: bool,
    pub timeout_ms: u64,
    pub default_schema: String,
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        Self {
            server: "localhost".to_string(),
            port: 1433,
            database: "master".to_string(),
            user: None,
            password: None,
            encrypt: true,
            trust_cert: true,
            timeout_ms: 30_000,
            default_schema: "dbo".to_string(),
        }
    }
}

impl ConnectionSettings {
    /// Short human label, e.g. `sa@db.example:1433/sales`.
    pub fn describe(&self) -> String {
        let user = self
            .user
            .as_deref()
            .map(|u| format!("{}@", u))
            .unwrap_or_default();
        format!("{}{}:{}/{}", user, self.server, self.port, self.database)
    }
}

#[derive(Debug, Clone)]
pub struct SettingsResolved {
    pub output: OutputSettingsResolved,
    pub compare: CompareSettingsResolved,
}

#[derive(Debug, Clone)]
pub struct OutputSettingsResolved {
    pub default_format: OutputFormat,
    pub json_pretty: bool,
}

#[derive(Debug, Clone)]
pub struct CompareSettingsResolved {
    pub max_rows: u64,
    pub duplicate_keys: DuplicateKeyPolicy,
    pub max_cell_width: usize,
}

impl Default for SettingsResolved {
    fn default() -> Self {
        Self {
            output: OutputSettingsResolved {
                default_format: OutputFormat::Pretty,
                json_pretty: true,
            },
            compare: CompareSettingsResolved {
                max_rows: DEFAULT_MAX_ROWS,
                duplicate_keys: DuplicateKeyPolicy::LastWins,
                max_cell_width: DEFAULT_MAX_CELL_WIDTH,
            },
        }
    }
}

pub fn load_config(options: &LoadOptions, env: &Env) -> Result<ResolvedConfig> {
    let config_path = resolve_config_path(options, env)?;
    let config_file = match &config_path {
        Some(path) => load_config_file(path)?,
        None => ConfigFile::default(),
    };

    let profile_name = resolve_profile_name(options, env, config_file.default_profile.as_deref());

    let mut connection = ConnectionSettings::default();
    let mut settings = SettingsResolved::default();

    if let Some(settings_cfg) = &config_file.settings {
        apply_settings(&mut settings, settings_cfg);
    }

    match config_file.profiles.get(&profile_name) {
        Some(profile) => apply_profile(&mut connection, &mut settings, profile, env),
        None if options.cli.profile.is_some() && config_path.is_some() => {
            return Err(anyhow!("Profile '{}' not found in config", profile_name));
        }
        None => {}
    }

    apply_env_overrides(&mut connection, env);
    apply_cli_overrides(&mut connection, &options.cli);

    tracing::debug!(
        profile = %profile_name,
        connection = %connection.describe(),
        "resolved configuration"
    );

    Ok(ResolvedConfig {
        config_path,
        profile_name,
        connection,
        settings,
    })
}

fn resolve_profile_name(options: &LoadOptions, env: &Env, default_profile: Option<&str>) -> String {
    if let Some(profile) = options.cli.profile.as_deref() {
        return profile.to_string();
    }
    if let Some(profile) = env.get("ROWCMP_PROFILE") {
        return profile;
    }
    if let Some(profile) = default_profile {
        return profile.to_string();
    }
    "default".to_string()
}

fn resolve_config_path(options: &LoadOptions, env: &Env) -> Result<Option<PathBuf>> {
    if let Some(path) = &options.cli.config_path {
        if !path.exists() {
            return Err(anyhow!("Config file not found: {}", path.display()));
        }
        return Ok(Some(path.clone()));
    }

    if let Some(path) = env.get("ROWCMP_CONFIG") {
        let path = PathBuf::from(path);
        if !path.exists() {
            return Err(anyhow!("Config file not found: {}", path.display()));
        }
        return Ok(Some(path));
    }

    if let Some(path) = find_local_config(&options.cwd, options.home_dir.as_deref()) {
        return Ok(Some(path));
    }

    Ok(find_global_config(options.xdg_config_dir.as_deref()))
}

fn find_local_config(start: &Path, home: Option<&Path>) -> Option<PathBuf> {
    let candidates = [
        ".rowcmp/config.yaml",
        ".rowcmp/config.yml",
        ".rowcmp/config.json",
    ];

    for dir in start.ancestors() {
        for candidate in &candidates {
            let path = dir.join(candidate);
            if path.is_file() {
                return Some(path);
            }
        }

        if home.is_some_and(|home_dir| dir == home_dir) {
            break;
        }
    }

    None
}

fn find_global_config(xdg_config: Option<&Path>) -> Option<PathBuf> {
    let base = xdg_config?;
    ["rowcmp/config.yaml", "rowcmp/config.yml", "rowcmp/config.json"]
        .iter()
        .map(|candidate| base.join(candidate))
        .find(|path| path.is_file())
}

fn load_config_file(path: &Path) -> Result<ConfigFile> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    match path.extension().and_then(|ext| ext.to_str()) {
        Some("yaml") | Some("yml") => {
            serde_yaml::from_str(&content).context("Failed to parse YAML config")
        }
        Some("json") => serde_json::from_str(&content).context("Failed to parse JSON config"),
        _ => Err(anyhow!("Unsupported config file extension")),
    }
}

fn apply_profile(
    connection: &mut ConnectionSettings,
    settings: &mut SettingsResolved,
    profile: &Profile,
    env: &Env,
) {
    if let Some(server) = &profile.server {
        connection.server = server.clone();
    }
    if let Some(port) = profile.port {
        connection.port = port;
    }
    if let Some(database) = &profile.database {
        connection.database = database.clone();
    }
    if let Some(user) = &profile.user {
        connection.user = Some(user.clone());
    }
    if let Some(password) = &profile.password {
        connection.password = Some(password.clone());
    } else if let Some(env_key) = &profile.password_env {
        if let Some(value) = env.get(env_key) {
            connection.password = Some(value);
        }
    }
    if let Some(encrypt) = profile.encrypt {
        connection.encrypt = encrypt;
    }
    if let Some(trust_cert) = profile.trust_cert {
        connection.trust_cert = trust_cert;
    }
    if let Some(timeout) = profile.timeout {
        connection.timeout_ms = timeout;
    }
    if let Some(schema) = &profile.default_schema {
        connection.default_schema = schema.clone();
    }

    if let Some(settings_profile) = &profile.settings {
        apply_settings(settings, settings_profile);
    }
}

fn apply_settings(settings: &mut SettingsResolved, overrides: &Settings) {
    if let Some(output) = &overrides.output {
        apply_output_settings(&mut settings.output, output);
    }
    if let Some(compare) = &overrides.compare {
        apply_compare_settings(&mut settings.compare, compare);
    }
}

fn apply_output_settings(settings: &mut OutputSettingsResolved, overrides: &OutputSettings) {
    if let Some(default_format) = overrides.default_format {
        settings.default_format = default_format;
    }
    if let Some(pretty) = overrides.json.as_ref().and_then(|json| json.pretty) {
        settings.json_pretty = pretty;
    }
}

fn apply_compare_settings(settings: &mut CompareSettingsResolved, overrides: &CompareSettings) {
    if let Some(max_rows) = overrides.max_rows {
        settings.max_rows = max_rows;
    }
    if let Some(policy) = overrides.duplicate_keys {
        settings.duplicate_keys = policy;
    }
    if let Some(width) = overrides.max_cell_width {
        settings.max_cell_width = width;
    }
}

fn apply_env_overrides(connection: &mut ConnectionSettings, env: &Env) {
    if let Some(url) = env.get_any(&["DATABASE_URL", "DB_URL", "SQLSERVER_URL"]) {
        match parse_connection_url(&url) {
            Ok(parsed) => parsed.apply_to(connection),
            Err(err) => tracing::warn!("Ignoring DATABASE_URL: {}", err),
        }
    }

    if let Some(server) = env.get_any(&["SQL_SERVER", "SQLSERVER_HOST", "DB_HOST"]) {
        connection.server = server;
    }
    if let Some(port) = env.get_any(&["SQL_PORT", "SQLSERVER_PORT", "DB_PORT"]) {
        if let Ok(port) = port.parse::<u16>() {
            connection.port = port;
        }
    }
    if let Some(database) = env.get_any(&["SQL_DATABASE", "SQLSERVER_DB", "DB_NAME"]) {
        connection.database = database;
    }
    if let Some(user) = env.get_any(&["SQL_USER", "SQLSERVER_USER", "DB_USER"]) {
        connection.user = Some(user);
    }
    if let Some(password) = env.get_any(&["SQL_PASSWORD", "SQLSERVER_PASSWORD", "DB_PASSWORD"]) {
        connection.password = Some(password);
    }
    if let Some(encrypt) = env.get("SQL_ENCRYPT").and_then(|v| parse_bool(&v)) {
        connection.encrypt = encrypt;
    }
    if let Some(trust_cert) = env
        .get("SQL_TRUST_SERVER_CERTIFICATE")
        .and_then(|v| parse_bool(&v))
    {
        connection.trust_cert = trust_cert;
    }
    if let Some(timeout) = env.get_any(&["SQL_CONNECT_TIMEOUT", "DB_CONNECT_TIMEOUT"]) {
        if let Ok(timeout) = timeout.parse::<u64>() {
            connection.timeout_ms = timeout;
        }
    }
}

fn apply_cli_overrides(connection: &mut ConnectionSettings, cli: &CliOverrides) {
    if let Some(server) = &cli.server {
        connection.server = server.clone();
    }
    if let Some(port) = cli.port {
        connection.port = port;
    }
    if let Some(database) = &cli.database {
        connection.database = database.clone();
    }
    if let Some(user) = &cli.user {
        connection.user = Some(user.clone());
    }
    if let Some(password) = &cli.password {
        connection.password = Some(password.clone());
    }
    if let Some(timeout_ms) = cli.timeout_ms {
        connection.timeout_ms = timeout_ms;
    }
    if let Some(encrypt) = cli.encrypt {
        connection.encrypt = encrypt;
    }
    if let Some(trust_cert) = cli.trust_cert {
        connection.trust_cert = trust_cert;
    }
}
