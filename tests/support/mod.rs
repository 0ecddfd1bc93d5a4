#![allow(dead_code)]

use anyhow::{Context, Result, bail};
use serde_json::{Value, json};
use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Output};
use tempfile::NamedTempFile;

pub fn cli_binary() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_cui-utils"))
}

/// A `cui-utils` command with registry selection cleared from the environment.
pub fn cli() -> Command {
    let mut cmd = Command::new(cli_binary());
    cmd.env_remove("CUI_DATABASE");
    cmd.env_remove("RUST_LOG");
    cmd
}

pub fn run_command(mut cmd: Command) -> Result<Output> {
    let output = cmd
        .output()
        .with_context(|| format!("failed to run command: {:?}", cmd))?;
    if output.status.success() {
        Ok(output)
    } else {
        bail!(
            "command {:?} failed: status {:?}\nstdout: {}\nstderr: {}",
            cmd,
            output.status.code(),
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        )
    }
}

/// Run a command that is expected to exit non-zero.
pub fn run_failing(mut cmd: Command) -> Result<Output> {
    let output = cmd
        .output()
        .with_context(|| format!("failed to run command: {:?}", cmd))?;
    if output.status.success() {
        bail!(
            "command {:?} unexpectedly succeeded\nstdout: {}",
            cmd,
            String::from_utf8_lossy(&output.stdout)
        );
    }
    Ok(output)
}

pub fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

pub fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

/// Registry document around the given category entries.
pub fn registry_document(categories: Value) -> Value {
    json!({
        "schema_version": "cui_registry_v1",
        "source": {"title": "test fixture"},
        "organizations": {
            "TEST_ORG": "Test Organization",
            "OTHER_ORG": "Other Organization"
        },
        "controls": [
            {"code": "NOFORN", "name": "No Foreign Dissemination"},
            {"code": "FED ONLY", "name": "Federal Employees Only", "excludes": ["FEDCON"]},
            {"code": "FEDCON", "name": "Federal Employees and Contractors Only"}
        ],
        "categories": categories
    })
}

pub fn category(code: &str, name: &str, specified: bool, organization: &str) -> Value {
    let marking = if specified {
        format!("SP-{code}")
    } else {
        code.to_string()
    };
    json!({
        "code": code,
        "marking": marking,
        "name": name,
        "description": format!("{name} description"),
        "specified": specified,
        "organization": organization
    })
}

/// Three categories across two organizations.
pub fn standard_categories() -> Value {
    json!([
        category("TEST-001", "Test Category One", true, "TEST_ORG"),
        category("TEST-002", "Test Category Two", false, "TEST_ORG"),
        category("OTHER-001", "Other Category", true, "OTHER_ORG"),
    ])
}

pub fn write_registry(document: &Value) -> Result<NamedTempFile> {
    let mut file = NamedTempFile::new().context("failed to allocate registry file")?;
    serde_json::to_writer_pretty(&mut file, document)?;
    file.flush()?;
    Ok(file)
}
