//! CLI entrypoint for Guild Jukebox
//!
//! This is the main binary that wires together all layers using
//! dependency injection, then replays a command script against them.

mod app;
mod args;
mod output;
mod script;

use anyhow::{Context, Result, bail};
use app::Jukebox;
use args::Cli;
use clap::Parser;
use colored::Colorize;
use jukebox_application::{
    AudioResolver, CommandError, CompositeEventPublisher, SessionRegistry, SessionStore,
};
use jukebox_domain::{ConfigIssue, GuildId, Severity};
use jukebox_infrastructure::{
    CatalogResolver, ConfigLoader, FileLoggingConfig, InMemorySessionRepository,
    JsonlEventLogger, SimulatedVoiceTransport, TracingEventPublisher,
};
use script::{Command, parse_script};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.show_config {
        ConfigLoader::print_config_sources();
        return Ok(());
    }

    let config = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        ConfigLoader::load(cli.config.as_ref())
            .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))?
    };

    // Keep the guard alive so the file writer flushes on exit
    let _log_guard = init_logging(cli.verbose, &config.logging)?;

    let issues = config.validate();
    report_issues(&issues);
    if ConfigIssue::has_errors(&issues) {
        bail!("Configuration has errors");
    }

    info!("Starting Guild Jukebox");

    // === Dependency Injection ===
    let playback = config.to_playback_config();
    let voting = config.to_voting_config().to_service();

    let mut events = CompositeEventPublisher::new().with(TracingEventPublisher::new());
    if let Some(path) = &config.logging.event_log {
        match JsonlEventLogger::new(path) {
            Some(logger) => {
                info!(path = %logger.path().display(), "Writing session events");
                events = events.with(logger);
            }
            None => warn!(path = %path.display(), "Event log disabled"),
        }
    }

    let resolver: Arc<dyn AudioResolver> = match &cli.catalog {
        Some(path) => Arc::new(CatalogResolver::load(path)?),
        None => Arc::new(CatalogResolver::new(Vec::new())),
    };

    let store = SessionStore::new(
        Arc::new(SessionRegistry::new()),
        Arc::new(InMemorySessionRepository::new()),
        Arc::new(events),
        playback.clone(),
    );
    let mut jukebox = Jukebox::new(
        GuildId::new(cli.guild)?,
        store,
        resolver,
        Arc::new(SimulatedVoiceTransport::new()),
        voting,
    );

    // Background reaper, stopped once the script is done
    let cancel = CancellationToken::new();
    let reaper = jukebox.reaper();
    let reaper_cancel = cancel.clone();
    let reaper_task = tokio::spawn(async move {
        reaper.run(playback.reaper_interval, reaper_cancel).await;
    });

    let result = match &cli.script {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("Could not read script {}", path.display()))?;
            let commands = parse_script(&text)?;
            run_commands(&mut jukebox, commands, cli.fail_fast).await
        }
        None => run_stdin(&mut jukebox, cli.fail_fast).await,
    };

    cancel.cancel();
    reaper_task.await?;
    result
}

/// Initialize tracing: stderr always, plus a plain-text file when configured
fn init_logging(verbose: u8, logging: &FileLoggingConfig) -> Result<Option<WorkerGuard>> {
    let level = match verbose {
        0 => logging.parse_level().0,
        1 => "info".to_string(),
        2 => "debug".to_string(),
        _ => "trace".to_string(), // -vvv or more
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let (file_layer, guard) = match &logging.file {
        Some(path) => {
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| std::path::Path::new("."));
            let name = path
                .file_name()
                .context("logging.file must name a file")?;
            let appender = tracing_appender::rolling::never(dir, name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().with_ansi(false).with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .with(file_layer)
        .init();

    Ok(guard)
}

fn report_issues(issues: &[ConfigIssue]) {
    for issue in issues {
        match issue.severity {
            Severity::Error => eprintln!("{}", issue.to_string().red()),
            Severity::Warning => eprintln!("{}", issue.to_string().yellow()),
        }
    }
}

async fn run_commands(
    jukebox: &mut Jukebox,
    commands: Vec<(usize, Command)>,
    fail_fast: bool,
) -> Result<()> {
    for (line, command) in commands {
        if !run_one(jukebox, line, command).await && fail_fast {
            bail!("Stopped at line {}", line);
        }
    }
    Ok(())
}

async fn run_stdin(jukebox: &mut Jukebox, fail_fast: bool) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut line_number = 0;
    while let Some(line) = lines.next_line().await? {
        line_number += 1;
        let command = match Command::parse(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(message) => {
                eprintln!("{} line {}: {}", "error:".red().bold(), line_number, message);
                if fail_fast {
                    bail!("Stopped at line {}", line_number);
                }
                continue;
            }
        };
        if !run_one(jukebox, line_number, command).await && fail_fast {
            bail!("Stopped at line {}", line_number);
        }
    }
    Ok(())
}

/// Print the result of one command; returns whether it succeeded
async fn run_one(jukebox: &mut Jukebox, line: usize, command: Command) -> bool {
    match jukebox.execute(command).await {
        Ok(message) => {
            println!("[{}] {}", jukebox.guild_id(), message);
            true
        }
        Err(e) => {
            let code = e
                .downcast_ref::<CommandError>()
                .map(CommandError::code)
                .unwrap_or("ERROR");
            eprintln!(
                "{} line {}: {} ({})",
                "error:".red().bold(),
                line,
                e,
                code.dimmed()
            );
            false
        }
    }
}
