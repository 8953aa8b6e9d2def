//! pf - pageflow command-line entry point
//!
//! Simulates navigations over a site definition, inspects documents and
//! fetches routes through the HTTP loader.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use clap::Parser;
use colored::Colorize;
use eyre::{Context, Result};
use serde_json::json;
use tracing::{debug, info, warn};

use pageflow::cli::{Cli, Command, OutputFormat};
use pageflow::config::Config;
use pageflow::{
    FetchedDocument, HttpLoader, LoadEvent, LoadOutcome, LoadReporter, LoadRequest, Loader, Mediator, ModuleRegistry,
    Priority, Site, TraceEntry, TraceModule,
};

fn setup_logging(cli_log_level: Option<&str>, config_log_level: Option<&str>) {
    // Determine log level with priority: CLI --log-level > config file > default (INFO)
    let level = match cli_log_level.or(config_log_level) {
        Some(s) => match s.to_uppercase().as_str() {
            "TRACE" => tracing::Level::TRACE,
            "DEBUG" => tracing::Level::DEBUG,
            "INFO" => tracing::Level::INFO,
            "WARN" | "WARNING" => tracing::Level::WARN,
            "ERROR" => tracing::Level::ERROR,
            _ => {
                eprintln!("Warning: Unknown log-level '{}', defaulting to INFO", s);
                tracing::Level::INFO
            }
        },
        None => tracing::Level::INFO,
    };

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    debug!(?level, "Logging initialized");
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load log level from config file early (before full config load)
    let config_log_level = Config::load_log_level(cli.config.as_ref());

    // Setup logging with priority: CLI > config > INFO default
    setup_logging(cli.log_level.as_deref(), config_log_level.as_deref());

    // Load configuration
    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;

    debug!(command = ?cli.command, "main: dispatching command");
    match cli.command {
        Command::Simulate {
            site,
            routes,
            root,
            format,
        } => cmd_simulate(&config, &site, &routes, root.as_deref(), format).await,
        Command::Inspect { file, key, root, format } => cmd_inspect(&file, &key, &root, format),
        Command::Fetch {
            route,
            base_url,
            priority,
        } => cmd_fetch(&config, &route, base_url, priority).await,
    }
}

/// Bootstrap a site and visit each route in turn
async fn cmd_simulate(
    config: &Config,
    site_path: &Path,
    routes: &[String],
    root: Option<&str>,
    format: OutputFormat,
) -> Result<()> {
    debug!(site = %site_path.display(), ?routes, ?root, "cmd_simulate: called");
    let site = Site::load(site_path)?;
    let parts = site.build().context("Invalid page routes in site file")?;
    let host = Arc::clone(&parts.host);

    let trace = Arc::new(TraceModule::new());
    let mut modules = ModuleRegistry::new();
    modules.register(trace.clone());

    let mediator = Mediator::new(
        config.mediator.clone(),
        parts.pages,
        modules,
        Arc::new(parts.loader),
        parts.host,
    );
    let handle = mediator.handle();
    let task = tokio::spawn(mediator.run());

    handle.run(root).await?;
    // Round trip so the startup enter is processed before reading the trace
    handle.snapshot().await?;
    let boot_events = trace.entries();
    trace.clear();

    let mut visits = Vec::new();
    for route in routes {
        let outcome = handle.goto(route).await?;
        let settled = tokio::time::timeout(config.mediator.idle_timeout(), handle.idle())
            .await
            .is_ok();
        if !settled {
            warn!(%route, "Navigation did not settle");
        }
        let snapshot = handle.snapshot().await?;
        if outcome.is_started() && !snapshot.is_loading_page && snapshot.current_page.is_some() {
            host.set_url(route.clone());
        }
        info!(%route, %outcome, "Visited route");
        visits.push((route.clone(), outcome, settled, trace.entries()));
        trace.clear();
    }

    let state = handle.snapshot().await?.summary();
    handle.shutdown().await?;
    task.await.context("Mediator task failed")?;

    match format {
        OutputFormat::Json => {
            let navigations: Vec<_> = visits
                .iter()
                .map(|(route, outcome, settled, events)| {
                    json!({
                        "route": route,
                        "outcome": outcome,
                        "settled": settled,
                        "events": events,
                    })
                })
                .collect();
            let output = json!({
                "bootstrap": boot_events,
                "navigations": navigations,
                "state": state,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Text => {
            println!("{}", "bootstrap".bold());
            print_events(&boot_events);
            for (route, outcome, settled, events) in &visits {
                let outcome = if outcome.is_started() {
                    outcome.to_string().green()
                } else {
                    outcome.to_string().yellow()
                };
                let suffix = if *settled { String::new() } else { " (did not settle)".red().to_string() };
                println!("{} {} -> {}{}", "goto".bold(), route, outcome, suffix);
                print_events(events);
            }
            println!("{}", "state".bold());
            println!("  current:  {}", state["currentPage"].as_str().unwrap_or("-"));
            println!("  previous: {}", state["previousPage"].as_str().unwrap_or("-"));
            println!("  previous url: {}", state["previousUrl"].as_str().unwrap_or(""));
            println!("  busy: {}", state["isLoadingPage"]);
        }
    }

    Ok(())
}

fn print_events(events: &[TraceEntry]) {
    for entry in events {
        println!("  {} {}", entry.key.cyan(), entry.data);
    }
}

/// Report the page node and redirect marker of a document
fn cmd_inspect(file: &Path, key: &str, root: &str, format: OutputFormat) -> Result<()> {
    debug!(file = %file.display(), %key, %root, "cmd_inspect: called");
    let body = fs::read_to_string(file).context(format!("Failed to read {}", file.display()))?;
    let document = FetchedDocument::parse(&body);

    let redirect = document.redirect_target(root)?;
    let node = document.select_node(key)?;

    match format {
        OutputFormat::Json => {
            let output = json!({
                "key": key,
                "root": root,
                "found": node.is_some(),
                "redirect": redirect,
                "node": node,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Text => {
            match &node {
                Some(node) => println!("{} {} ({} bytes)", "found".green(), key, node.len()),
                None => println!("{} {}", "missing".red(), key),
            }
            match &redirect {
                Some(url) => println!("redirect: {}", url),
                None => println!("redirect: none"),
            }
        }
    }
    Ok(())
}

/// Fetch one route through the HTTP loader
async fn cmd_fetch(config: &Config, route: &str, base_url: Option<String>, priority: Priority) -> Result<()> {
    debug!(%route, ?base_url, %priority, "cmd_fetch: called");
    let mut loader_config = config.loader.clone();
    if base_url.is_some() {
        loader_config.base_url = base_url;
    }
    let loader = HttpLoader::new(&loader_config)?;

    let reporter = LoadReporter::new(|event| match event {
        LoadEvent::Progress { loaded, total } => eprintln!("progress: {}/{}", loaded, total),
        LoadEvent::Error { reason } => eprintln!("{} {}", "error:".red(), reason),
    });

    let request = LoadRequest {
        priority,
        ..LoadRequest::navigation(route)
    };
    match loader.load(request, reporter).await {
        LoadOutcome::Success(response) => {
            println!(
                "{} {} {} ({} bytes)",
                "ok".green(),
                response.status,
                response.transport.url,
                response.body.len()
            );
            Ok(())
        }
        LoadOutcome::GaveUp { reason } => Err(eyre::eyre!("Gave up on {}: {}", route, reason)),
    }
}
