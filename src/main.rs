//! Sentinel main entry point
//!
//! Runs a live feed session in the terminal. Each stdin line is either a
//! key combo (`down`, `enter`, `esc`, `ctrl+k`, `cmd+a`) or a command such
//! as `filter risk high`; type `help` for the list.

mod render;

use anyhow::Context;
use clap::Parser;
use render::Renderer;
use sentinel_config::{Config, ConfigError};
use sentinel_core::{
    source, Command, Department, Dispatch, FeedSession, KeyEvent, RiskLevel, SessionCommand,
    SessionHandle, TransactionStatus,
};
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::runtime::Runtime;

#[derive(Parser, Debug)]
#[command(name = "sentinel")]
#[command(version = "0.1.0")]
#[command(about = "Live transaction feed with filtering and keyboard navigation")]
#[command(long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long, default_value = "config.yaml")]
    config: PathBuf,

    /// Print the default configuration and exit
    #[arg(long)]
    print_config: bool,

    /// Emit snapshots and events as JSON lines
    #[arg(long)]
    json: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    if args.print_config {
        print!("{}", Config::generate_default());
        return Ok(());
    }

    let (config, missing) = match Config::load(&args.config) {
        Ok(config) => (config, false),
        Err(ConfigError::FileNotFound { .. }) => (Config::default(), true),
        Err(e) => {
            return Err(e).with_context(|| format!("Failed to load {}", args.config.display()));
        }
    };

    let env = env_logger::Env::default().default_filter_or(&config.logging.level);
    env_logger::Builder::from_env(env).init();
    if missing {
        log::warn!("Config file {} not found, using defaults", args.config.display());
    }

    let rt = Runtime::new()?;
    rt.block_on(run(config, args.json))
}

async fn run(config: Config, json: bool) -> anyhow::Result<()> {
    let source = source::from_config(&config.source)
        .await
        .context("Failed to open transaction source")?;
    log::info!("Using {} transaction source", source.name());

    let (handle, mut events) = FeedSession::start(&config, source).await?;
    let mut snapshots = handle.subscribe();
    let mut renderer = Renderer::new(json);
    renderer.snapshot(handle.snapshot());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                match line? {
                    Some(line) => {
                        if !handle_line(&handle, &line)? {
                            break;
                        }
                    }
                    None => break,
                }
            }
            Some(event) = events.recv() => renderer.event(&event),
            changed = snapshots.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = snapshots.borrow_and_update().clone();
                renderer.snapshot(snapshot);
            }
            _ = tokio::signal::ctrl_c() => {
                log::info!("Interrupted");
                break;
            }
        }
    }

    handle.shutdown().await;
    Ok(())
}

/// Returns false when the user asked to quit
fn handle_line(handle: &SessionHandle, line: &str) -> anyhow::Result<bool> {
    let mut words = line.split_whitespace();
    match words.next() {
        None => {}
        Some("quit") | Some("exit") => return Ok(false),
        Some("help") => print_help(),
        Some("clear") => handle.send(SessionCommand::ClearFilters)?,
        Some("cancel") => handle.send(SessionCommand::CancelAudit)?,
        Some("click") => match words.next() {
            Some(id) => handle.send(SessionCommand::Click(id.to_string()))?,
            None => println!("usage: click <id>"),
        },
        Some("filter") => {
            let kind = words.next().unwrap_or_default();
            let value = words.collect::<Vec<_>>().join(" ");
            match filter_command(kind, &value) {
                Ok(command) => handle.send(command)?,
                Err(e) => println!("{}", e),
            }
        }
        Some(_) => match line.parse::<KeyEvent>() {
            Ok(event) => {
                if handle.key(&event)? == Dispatch::PassThrough {
                    println!("No shortcut for '{}'", line.trim());
                }
            }
            Err(e) => println!("{} (type 'help' for commands)", e),
        },
    }
    Ok(true)
}

fn filter_command(kind: &str, value: &str) -> Result<SessionCommand, String> {
    match kind {
        "dept" | "department" => {
            Ok(SessionCommand::ToggleDepartment(value.parse::<Department>()?))
        }
        "risk" => Ok(SessionCommand::ToggleRiskLevel(value.parse::<RiskLevel>()?)),
        "status" => Ok(SessionCommand::ToggleStatus(value.parse::<TransactionStatus>()?)),
        _ => Err("usage: filter dept|risk|status <value>".to_string()),
    }
}

fn print_help() {
    println!("Shortcuts:");
    for command in Command::all() {
        println!("  {:<6} {}", command.shortcut_hint(), command.description());
    }
    println!("Key combos: esc, enter, up, down, ctrl+k, cmd+a");
    println!("  prefix a combo with input: to press it inside the search box");
    println!("Commands:");
    println!("  filter dept <name>     toggle a department filter");
    println!("  filter risk <level>    toggle low, medium or high");
    println!("  filter status <name>   toggle pending, flagged or cleared");
    println!("  clear                  clear all filters");
    println!("  click <id>             open a transaction");
    println!("  cancel                 cancel a running audit");
    println!("  quit");
}
