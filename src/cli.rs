//! Command-line interface.

use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde_json::Value;

use crate::config::{Config, Defaults};
use crate::patch::{apply_document, parse_patch};
use crate::settings::{patch_for, toggle_registry, toggle_states, LiveSettings, ToggleId};

#[derive(Debug, Parser)]
#[command(
    name = "ccpatch",
    version,
    about = "Apply JSON Merge Patches (RFC 7396) to AI CLI settings files"
)]
pub struct Cli {
    /// Config file (default: ~/.config/ccpatch/config.toml)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Merge a patch into a JSON file and print the result
    Merge {
        /// Target document ("-" for stdin)
        target: PathBuf,
        /// Patch document ("-" for stdin)
        patch: PathBuf,
    },
    /// Apply a patch to a settings file
    Apply {
        /// Patch document ("-" for stdin)
        patch: PathBuf,
        #[command(flatten)]
        target: TargetArgs,
        /// Print the result without writing
        #[arg(long)]
        dry_run: bool,
    },
    /// Switch a named toggle on or off
    Toggle {
        /// Toggle key (e.g. hide_attribution, agent_teams)
        #[arg(value_parser = parse_toggle_id)]
        id: ToggleId,
        state: Switch,
        #[command(flatten)]
        target: TargetArgs,
        /// Print the result without writing
        #[arg(long)]
        dry_run: bool,
    },
    /// Show the state of every toggle
    Status {
        #[command(flatten)]
        target: TargetArgs,
    },
    /// List configured apps and their settings files
    Apps,
}

/// Which settings file a command operates on.
#[derive(Debug, Args)]
pub struct TargetArgs {
    /// Configured app name (default from config)
    #[arg(long, conflicts_with = "file")]
    pub app: Option<String>,

    /// Settings file path, bypassing the app list
    #[arg(long, value_name = "PATH")]
    pub file: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Switch {
    On,
    Off,
}

fn parse_toggle_id(s: &str) -> Result<ToggleId, String> {
    ToggleId::parse(s).ok_or_else(|| {
        let known: Vec<&str> = ToggleId::all().iter().map(|id| id.as_str()).collect();
        format!("unknown toggle '{}' (known: {})", s, known.join(", "))
    })
}

/// Execute a parsed command, writing user-facing output to `out`.
pub fn run(cli: Cli, out: &mut dyn Write) -> Result<()> {
    match cli.command {
        Command::Merge { target, patch } => {
            if target.as_os_str() == "-" && patch.as_os_str() == "-" {
                bail!("Only one of TARGET and PATCH can be read from stdin");
            }
            let mut document: Value = serde_json::from_str(&read_input(&target)?)
                .with_context(|| format!("Invalid JSON in '{}'", target.display()))?;
            let patch: Value = serde_json::from_str(&read_input(&patch)?)
                .with_context(|| format!("Invalid JSON in '{}'", patch.display()))?;
            apply_document(&mut document, &patch);
            print_json(out, &document)
        }
        Command::Apply {
            patch,
            target,
            dry_run,
        } => {
            let text = read_input(&patch)?;
            let patch = Value::Object(
                parse_patch(&text).with_context(|| format!("Invalid patch '{}'", patch.display()))?,
            );
            let settings = open_target(cli.config.as_deref(), &target)?;
            write_patch(out, &settings, &patch, dry_run)
        }
        Command::Toggle {
            id,
            state,
            target,
            dry_run,
        } => {
            let settings = open_target(cli.config.as_deref(), &target)?;
            let patch = patch_for(id, state == Switch::On);
            tracing::debug!(toggle = %id, ?state, "toggling");
            write_patch(out, &settings, &patch, dry_run)
        }
        Command::Status { target } => {
            let settings = open_target(cli.config.as_deref(), &target)?;
            let document = settings.snapshot();
            writeln!(out, "{}", settings.path().display())?;
            for state in toggle_states(&document) {
                let mark = if state.enabled { "on" } else { "off" };
                writeln!(out, "  {:<18} {:<4} {}", state.id.as_str(), mark, state.label)?;
            }
            Ok(())
        }
        Command::Apps => {
            let config = load_config(cli.config.as_deref())?;
            for app in &config.apps {
                let marker = if app.name == config.defaults.app { "*" } else { " " };
                writeln!(
                    out,
                    "{} {:<10} {:<14} {}",
                    marker,
                    app.name,
                    app.display_name,
                    app.resolved_path().display()
                )?;
            }
            writeln!(out)?;
            writeln!(out, "Toggles:")?;
            for def in toggle_registry() {
                writeln!(out, "  {:<18} {}", def.id.as_str(), def.description)?;
            }
            Ok(())
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    let config = match path {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    Ok(config)
}

/// Resolve the settings file a command targets.
///
/// `--file` bypasses the app list, so an unreadable config only costs the
/// backup preference there.
fn open_target(config_path: Option<&Path>, target: &TargetArgs) -> Result<LiveSettings> {
    let (path, backup) = match (&target.file, &target.app) {
        (Some(file), _) => {
            let backup = match load_config(config_path) {
                Ok(config) => config.defaults.backup,
                Err(err) => {
                    tracing::warn!(error = %format!("{:#}", err), "ignoring config for --file");
                    Defaults::default().backup
                }
            };
            (file.clone(), backup)
        }
        (None, app) => {
            let config = load_config(config_path)?;
            let name = app.as_deref().unwrap_or(&config.defaults.app);
            let Some(app) = config.find_app(name) else {
                bail!(
                    "App '{}' not found in config. Available apps: {}",
                    name,
                    config.app_names()
                );
            };
            (app.resolved_path(), config.defaults.backup)
        }
    };

    let settings = LiveSettings::open(path)?.with_backup(backup);
    Ok(settings)
}

fn write_patch(
    out: &mut dyn Write,
    settings: &LiveSettings,
    patch: &Value,
    dry_run: bool,
) -> Result<()> {
    if dry_run {
        let preview = settings.preview(patch)?;
        return print_json(out, &preview);
    }

    let outcome = settings.apply(patch)?;
    if outcome.changed {
        writeln!(out, "Updated {}", settings.path().display())?;
    } else {
        writeln!(out, "No changes to {}", settings.path().display())?;
    }
    Ok(())
}

fn read_input(path: &Path) -> Result<String> {
    if path.as_os_str() == "-" {
        let mut buffer = String::new();
        std::io::stdin()
            .read_to_string(&mut buffer)
            .context("Failed to read stdin")?;
        return Ok(buffer);
    }
    std::fs::read_to_string(path).with_context(|| format!("Failed to read '{}'", path.display()))
}

fn print_json(out: &mut dyn Write, value: &Value) -> Result<()> {
    writeln!(out, "{}", serde_json::to_string_pretty(value)?)?;
    Ok(())
}
