use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ConfigFile {
    pub default_profile: Option<String>,
    pub settings: Option<Settings>,
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub output: Option<OutputSettings>,
    pub compare: Option<CompareSettings>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct OutputSettings {
    pub default_format: Option<OutputFormat>,
    pub json: Option<JsonSettings>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct JsonSettings {
    pub pretty: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct CompareSettings {
    pub max_rows: Option<u64>,
    pub duplicate_keys: Option<DuplicateKeyPolicy>,
    pub max_cell_width: Option<usize>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub server: Option<String>,
    pub port: Option<u16>,
    pub database: Option<String>,
    pub user: Option<String>,
    pub password_env: Option<String>,
    pub password: Option<String>,
    pub encrypt: Option<bool>,
    pub trust_cert: Option<bool>,
    pub timeout: Option<u64>,
    pub default_schema: Option<String>,
    pub settings: Option<Settings>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Pretty,
    Markdown,
    Json,
}

impl OutputFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Pretty => "pretty",
            OutputFormat::Markdown => "markdown",
            OutputFormat::Json => "json",
        }
    }
}

/// What to do when the identification key repeats within one side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DuplicateKeyPolicy {
    LastWins,
    Reject,
}

impl DuplicateKeyPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            DuplicateKeyPolicy::LastWins => "last-wins",
            DuplicateKeyPolicy::Reject => "reject",
        }
    }

    pub fn parse(input: &str) -> Option<Self> {
        match input.trim().to_lowercase().as_str() {
            "last-wins" | "last_wins" | "lastwins" => Some(DuplicateKeyPolicy::LastWins),
            "reject" => Some(DuplicateKeyPolicy::Reject),
            _ => None,
        }
    }
}
