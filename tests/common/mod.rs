#![allow(dead_code)]

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use serde_json::Value;
use std::env;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub fn integration_enabled() -> bool {
    env::var("ROWCMP_INTEGRATION_TESTS")
        .map(|value| value == "1" || value.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

/// Scratch directory holding the data files of one test.
pub struct Workspace {
    dir: TempDir,
}

impl Workspace {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("temp dir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn file(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        std::fs::write(&path, contents).expect("write fixture");
        path
    }

    /// Binary running inside the workspace, isolated from the caller's config.
    pub fn command(&self) -> Command {
        let mut cmd = cargo_bin_cmd!("rowcmp");
        cmd.current_dir(self.dir.path())
            .env("XDG_CONFIG_HOME", self.dir.path())
            .env("NO_COLOR", "1");
        for key in [
            "ROWCMP_CONFIG",
            "ROWCMP_PROFILE",
            "DATABASE_URL",
            "DB_URL",
            "SQLSERVER_URL",
            "SQL_SERVER",
            "SQL_DATABASE",
            "SQL_USER",
            "SQL_PASSWORD",
            "RUST_LOG",
        ] {
            cmd.env_remove(key);
        }
        cmd
    }

    pub fn run_json(&self, args: &[&str]) -> Value {
        let mut cmd = self.command();
        cmd.args(args).arg("--json");
        let output = cmd.assert().success().get_output().stdout.clone();
        serde_json::from_slice(&output).expect("json")
    }
}

pub const PEOPLE_SOURCE: &str = "\
id,name,city,score
1,Ann,Oslo,10
2,Bob,Rome,20
3,Cy,Lima,30
";

pub const PEOPLE_TARGET: &str = "\
id,name,city,score
1,Ann,Oslo,10
2,Bob,Paris,20.0
4,Dee,Kyiv,40
";
