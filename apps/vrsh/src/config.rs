// Copyright © 2025 Lukas Bower
// SPDX-License-Identifier: Apache-2.0
// Purpose: Load and validate the vrsh console configuration.
// Author: Lukas Bower

//! Console configuration loaded from `vrsh.toml`.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use vrsh_core::DEFAULT_SCREEN_SETS;

/// Prompt shown when no configuration overrides it.
pub const DEFAULT_PROMPT: &str = "vrsh> ";

/// File name probed in the working directory when no path is supplied.
pub const DEFAULT_CONFIG_FILE: &str = "vrsh.toml";

/// Console configuration resolved at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsoleConfig {
    /// Prompt printed before each command.
    pub prompt: String,
    /// Screen set labels offered when completing `screenSet` arguments.
    pub screen_sets: Vec<String>,
    /// Optional command catalog replacing the built-in one.
    pub catalog: Option<PathBuf>,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            prompt: DEFAULT_PROMPT.to_owned(),
            screen_sets: DEFAULT_SCREEN_SETS.iter().map(|s| (*s).to_owned()).collect(),
            catalog: None,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigToml {
    #[serde(default)]
    console: ConsoleTomlSection,
    #[serde(default)]
    completion: CompletionTomlSection,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConsoleTomlSection {
    prompt: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct CompletionTomlSection {
    screen_sets: Option<Vec<String>>,
    catalog: Option<PathBuf>,
}

/// Return `./vrsh.toml` when it exists.
pub fn default_config_path() -> Option<PathBuf> {
    let cwd = std::env::current_dir().ok()?;
    let candidate = cwd.join(DEFAULT_CONFIG_FILE);
    candidate.is_file().then_some(candidate)
}

/// Load the configuration at `path`, or the defaults when `path` is `None`.
pub fn load_config(path: Option<&Path>) -> Result<ConsoleConfig> {
    let Some(path) = path else {
        return Ok(ConsoleConfig::default());
    };
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read vrsh config {}", path.display()))?;
    let parsed: ConfigToml = toml::from_str(&text)
        .with_context(|| format!("invalid vrsh config TOML in {}", path.display()))?;
    let mut config = ConsoleConfig::default();
    if let Some(prompt) = parsed.console.prompt {
        config.prompt = prompt;
    }
    if let Some(screen_sets) = parsed.completion.screen_sets {
        config.screen_sets = screen_sets;
    }
    if let Some(catalog) = parsed.completion.catalog {
        let base = path.parent().unwrap_or_else(|| Path::new("."));
        config.catalog = Some(base.join(catalog));
    }
    validate_config(&config)
        .with_context(|| format!("invalid vrsh config {}", path.display()))?;
    Ok(config)
}

fn validate_config(config: &ConsoleConfig) -> Result<()> {
    if config.prompt.trim().is_empty() {
        return Err(anyhow!("prompt must not be empty"));
    }
    let mut seen = HashSet::new();
    for label in &config.screen_sets {
        if label.is_empty() {
            return Err(anyhow!("screen set labels must not be empty"));
        }
        if label.chars().any(char::is_whitespace) {
            return Err(anyhow!("screen set label '{label}' contains whitespace"));
        }
        if !seen.insert(label.as_str()) {
            return Err(anyhow!("screen set label '{label}' is duplicated"));
        }
    }
    Ok(())
}
