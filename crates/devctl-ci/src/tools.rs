//! Installing the Go tools declared in a tools manifest.
//!
//! A tools manifest is a Go file that only exists to pin tool dependencies:
//!
//! ```go
//! //go:build tools
//! package tools
//!
//! import (
//!     _ "github.com/golangci/golangci-lint/cmd/golangci-lint"
//!     _ "gotest.tools/gotestsum"
//! )
//! ```
//!
//! Every blank-identifier import is a tool to `go install`.

use std::path::Path;

use devctl_core::{DevError, Result};
use regex::Regex;
use tracing::{info, warn};

use crate::runner::StepRunner;
use crate::step::StepConfig;

/// Default manifest location, relative to the project root.
pub const DEFAULT_MANIFEST: &str = "tools.go";

/// Extract the import paths of blank-identifier imports, first occurrence wins.
pub fn parse_tools_manifest(source: &str) -> Result<Vec<String>> {
    let blank_import = Regex::new(r#"^\s*(?:import\s+)?_\s+"([^"]+)""#)
        .map_err(|e| DevError::Manifest(e.to_string()))?;

    let mut paths: Vec<String> = Vec::new();
    for line in source.lines() {
        if let Some(caps) = blank_import.captures(line) {
            let path = caps[1].to_string();
            if !paths.contains(&path) {
                paths.push(path);
            }
        }
    }
    Ok(paths)
}

/// Install every tool declared in `manifest` with `<go_bin> install`.
///
/// Tools are installed in declaration order; the first failure stops the run.
/// Returns the installed import paths.
pub async fn install_tools(manifest: &Path, go_bin: &str) -> Result<Vec<String>> {
    let source = tokio::fs::read_to_string(manifest)
        .await
        .map_err(|e| DevError::Manifest(format!("{}: {}", manifest.display(), e)))?;
    let tools = parse_tools_manifest(&source)?;

    if tools.is_empty() {
        warn!(manifest = %manifest.display(), "No tools declared");
        return Ok(tools);
    }

    for tool in &tools {
        info!(tool = %tool, "Installing tool");
        let result = StepRunner::execute(&StepConfig::go_install(go_bin, tool)).await?;
        if !result.passed() {
            return Err(DevError::ToolInstall {
                tool: tool.clone(),
                status: result.exit_code,
            });
        }
    }

    info!(count = tools.len(), "Installed tools");
    Ok(tools)
}
