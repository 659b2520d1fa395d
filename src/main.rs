#![allow(dead_code)]

use anyhow::Context;
use clap::Parser;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::{fs::OpenOptions, io};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod api;
mod app;
mod classify;
mod cli;
mod config;
mod error;
mod fetch;
mod forecast;
mod search;
mod units;
mod weather;

use crate::api::ApiClient;
use crate::app::{run_app, App};
use crate::cli::Args;
use crate::config::{app_dir, Config, PreferenceStore};
use crate::fetch::{DisplayState, Orchestrator};

fn init_logging(path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("cannot open log file {}", path.display()))?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "wetter=info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(file)),
        )
        .init();
    Ok(())
}

/// The command line wins and is remembered; otherwise the last city, otherwise the default.
fn startup_city(args: &Args, prefs: &PreferenceStore, config: &Config) -> String {
    match args.city.as_deref().map(str::trim).filter(|c| !c.is_empty()) {
        Some(city) => {
            if let Err(e) = prefs.save_city(city) {
                tracing::warn!(error = %e, "could not persist last city");
            }
            city.to_string()
        }
        None => prefs
            .last_city()
            .unwrap_or_else(|| config.default_city.clone()),
    }
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config_path = args.config.clone().unwrap_or_else(Config::default_path);
    let config = Config::load_from(&config_path)?;

    let log_path = args
        .log_file
        .clone()
        .unwrap_or_else(|| app_dir().join("wetter.log"));
    init_logging(&log_path)?;

    let api_key = args
        .api_key
        .clone()
        .or_else(|| config.api_key.clone())
        .ok_or_else(|| error::Error::MissingApiKey(config_path.clone()))?;

    let prefs = PreferenceStore::new(PreferenceStore::default_path());
    let city = startup_city(&args, &prefs, &config);
    tracing::info!(city = %city, config = %config_path.display(), "starting wetter");

    let client = ApiClient::new(api_key, config.endpoints.clone(), config.timeout())?;
    let mut orchestrator = Orchestrator::new(
        Arc::new(client),
        prefs,
        config.default_city.clone(),
        DisplayState {
            city,
            unit: args.unit,
            period: args.period,
        },
    );
    orchestrator.load_cities(&config.country);
    orchestrator.retry();
    let mut app = App::new(orchestrator);

    // setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, &mut app);

    // restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        tracing::error!(error = %err, "terminal loop failed");
        println!("{:?}", err)
    }

    tracing::info!("shutdown complete");
    Ok(())
}
