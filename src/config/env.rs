use std::collections::HashMap;
use std::path::Path;

#[derive(Debug, Clone, Default)]
pub struct Env {
    vars: HashMap<String, String>,
}

impl Env {
    /// Process environment, after loading `env_file` (or `.env` when present).
    pub fn from_system(env_file: Option<&Path>) -> Self {
        match env_file {
            Some(path) => {
                if let Err(err) = dotenvy::from_path(path) {
                    tracing::warn!("Failed to load env file {}: {}", path.display(), err);
                }
            }
            None => {
                let _ = dotenvy::dotenv();
            }
        }
        let vars = std::env::vars().collect();
        Self { vars }
    }

    pub fn from_pairs(pairs: &[(&str, &str)]) -> Self {
        let mut vars = HashMap::new();
        for (k, v) in pairs {
            vars.insert((*k).to_string(), (*v).to_string());
        }
        Self { vars }
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.vars.get(key).cloned()
    }

    pub fn get_any(&self, keys: &[&str]) -> Option<String> {
        keys.iter().find_map(|key| self.vars.get(*key).cloned())
    }
}

pub fn parse_bool(input: &str) -> Option<bool> {
    match input.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "y" | "on" => Some(true),
        "0" | "false" | "no" | "n" | "off" => Some(false),
        _ => None,
    }
}
