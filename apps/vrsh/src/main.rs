// Copyright © 2025 Lukas Bower
// SPDX-License-Identifier: Apache-2.0
// Purpose: CLI entry point for the vrsh controller console.
// Author: Lukas Bower
#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! CLI entry point for the vrsh controller console.

use std::env;
use std::fs::File;
use std::io::{self, BufReader, IsTerminal};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use env_logger::Env;
use log::{info, warn, LevelFilter};
use vrsh_core::{Catalog, CompletionEngine, RegistryBuilder, Strategies};

use vrsh::config::default_config_path;
use vrsh::{
    load_config, EditorReader, PlainReader, Shell, TcpTransport, VRSH_CONTROLLER_PORT,
};

const DEFAULT_HOST: &str = "localhost";

/// vrsh command-line arguments.
#[derive(Debug, Parser)]
#[command(author = "Lukas Bower", version, about = "Operator console for the VR controller", long_about = None)]
struct Cli {
    /// Hostname or IP address of the controller.
    #[arg(long)]
    host: Option<String>,

    /// TCP port of the controller console listener.
    #[arg(long)]
    port: Option<u16>,

    /// Enable debug logging.
    #[arg(short = 'd', long, default_value_t = false)]
    debug: bool,

    /// Path to the console configuration file.
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Command catalog replacing the built-in command set.
    #[arg(long, value_name = "FILE")]
    catalog: Option<PathBuf>,

    /// Execute commands from a script file instead of reading stdin.
    #[arg(long, value_name = "FILE")]
    script: Option<PathBuf>,
}

fn init_logging(debug: bool) {
    let default_level = if debug {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    let mut builder =
        env_logger::Builder::from_env(Env::default().default_filter_or(default_level.as_str()));
    builder.format_timestamp_millis();
    let _ = builder.try_init();
}

fn env_string(key: &str) -> Result<Option<String>> {
    match env::var(key) {
        Ok(value) => {
            let trimmed = value.trim();
            if trimmed.is_empty() {
                Ok(None)
            } else {
                Ok(Some(trimmed.to_owned()))
            }
        }
        Err(env::VarError::NotPresent) => Ok(None),
        Err(err) => Err(anyhow!("failed to read {key}: {err}")),
    }
}

fn resolve_port(cli_port: Option<u16>) -> Result<u16> {
    if let Some(port) = cli_port {
        return Ok(port);
    }
    match env_string("VRSH_PORT")? {
        Some(value) => value
            .parse::<u16>()
            .map_err(|err| anyhow!("invalid VRSH_PORT value '{value}': {err}")),
        None => Ok(VRSH_CONTROLLER_PORT),
    }
}

fn resolve_config_path(cli_path: Option<PathBuf>) -> Result<Option<PathBuf>> {
    if cli_path.is_some() {
        return Ok(cli_path);
    }
    if let Some(value) = env_string("VRSH_CONFIG")? {
        return Ok(Some(PathBuf::from(value)));
    }
    Ok(default_config_path())
}

fn load_catalog(path: Option<PathBuf>) -> Catalog {
    let Some(path) = path else {
        return Catalog::builtin();
    };
    match Catalog::load(&path) {
        Ok(catalog) => catalog,
        Err(err) => {
            warn!("{err}; using the built-in command set");
            Catalog::builtin()
        }
    }
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_logging(cli.debug);
    info!("vrsh version: {}", env!("CARGO_PKG_VERSION"));

    let config_path = resolve_config_path(cli.config)?;
    let config = load_config(config_path.as_deref())?;
    let host = match cli.host {
        Some(host) => host,
        None => env_string("VRSH_HOST")?.unwrap_or_else(|| DEFAULT_HOST.to_owned()),
    };
    let port = resolve_port(cli.port)?;
    let catalog_path = match cli.catalog {
        Some(path) => Some(path),
        None => env_string("VRSH_CATALOG")?
            .map(PathBuf::from)
            .or_else(|| config.catalog.clone()),
    };

    let catalog = load_catalog(catalog_path);
    let tree = Arc::new(catalog.build_tree(&RegistryBuilder::default()));
    let strategies = Strategies::new(config.screen_sets.clone());

    let address = format!("{host}:{port}");
    let transport = match TcpTransport::connect(address.as_str()) {
        Ok(transport) => transport,
        Err(err) => {
            warn!("{err}");
            return Ok(ExitCode::FAILURE);
        }
    };

    let stdout = io::stdout();
    let writer = stdout.lock();
    let mut shell = Shell::new(transport, Arc::clone(&tree), writer).with_prompt(config.prompt);
    shell.write_line(&format!(
        "Connected to controller at {address}. Type 'help' for commands."
    ))?;

    if let Some(script_path) = cli.script {
        let file = File::open(&script_path)
            .with_context(|| format!("failed to open script {}", script_path.display()))?;
        shell.run_script(BufReader::new(file))?;
    } else if io::stdin().is_terminal() {
        let mut reader = EditorReader::new(CompletionEngine::new(tree, strategies))?;
        shell.run(&mut reader)?;
    } else {
        let mut reader = PlainReader::new(io::stdin().lock());
        shell.run(&mut reader)?;
    }
    Ok(ExitCode::SUCCESS)
}
