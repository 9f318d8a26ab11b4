use std::net::SocketAddr;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use roast_monitor::acquisition::AcquisitionLoop;
use roast_monitor::config::AppConfig;
use roast_monitor::context::AcquisitionContext;
use roast_monitor::history;
use roast_monitor::managers::RecordingEvent;
use roast_monitor::recording::RecordingState;
use roast_monitor::store::{JsonFileStore, RoastId, RoastStore};

#[derive(Parser, Debug)]
#[command(
    name = "roast-monitor",
    about = "Coffee roast temperature monitor: live acquisition, recording, and history"
)]
struct Cli {
    /// JSON config file (defaults to $ROAST_MONITOR_CONFIG or config/roast_monitor.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the acquisition loop and the HTTP server
    Serve {
        /// Override http.bind_addr
        #[arg(long)]
        bind: Option<SocketAddr>,
    },
    /// List saved roasts, newest first
    List,
    /// Print a saved roast as JSON
    Show { id: RoastId },
    /// Record for a fixed duration without the HTTP server, then save
    Record {
        #[arg(long, default_value_t = 60)]
        seconds: u64,
        #[arg(long)]
        bean_info: Option<String>,
    },
    /// Delete a saved roast
    Delete { id: RoastId },
}

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err:?}");
            ExitCode::from(1)
        }
    }
}

fn run() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = match &cli.config {
        Some(path) => AppConfig::load_from_file(path),
        None => AppConfig::load(),
    };

    match cli.command {
        Commands::Serve { bind } => run_serve(config, bind),
        Commands::List => run_list(&config),
        Commands::Show { id } => run_show(&config, id),
        Commands::Record { seconds, bean_info } => run_record(config, seconds, bean_info),
        Commands::Delete { id } => run_delete(&config, id),
    }
}

fn init_tracing(verbose: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

fn open_store(config: &AppConfig) -> JsonFileStore {
    JsonFileStore::new(config.store.data_dir.clone())
}

fn build_context(config: &AppConfig) -> Result<Arc<AcquisitionContext>> {
    let context =
        AcquisitionContext::from_config(config).context("creating acquisition context")?;
    Ok(Arc::new(context))
}

fn run_serve(config: AppConfig, bind: Option<SocketAddr>) -> Result<ExitCode> {
    let addr = match bind {
        Some(addr) => addr,
        None => config
            .http
            .bind_addr
            .parse()
            .with_context(|| format!("parsing http.bind_addr {:?}", config.http.bind_addr))?,
    };
    let context = build_context(&config)?;
    let acquisition = AcquisitionLoop::new(context.clone())
        .context("spawning persist thread")?
        .spawn()
        .context("spawning acquisition thread")?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("building tokio runtime")?;

    let state = roast_monitor::http::HttpState::new(context.clone());
    let served = runtime.block_on(roast_monitor::http::run_http_server(state, addr, async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!("[Serve] Failed to listen for ctrl-c: {}", err);
        }
        tracing::info!("[Serve] Shutdown requested");
    }));

    acquisition.stop();
    // Persist a session still in progress.
    if context.recording_status()?.state == RecordingState::Recording {
        context.toggle_recording(false, None)?;
    }

    served?;
    Ok(ExitCode::SUCCESS)
}

fn run_list(config: &AppConfig) -> Result<ExitCode> {
    let store = open_store(config);
    let entries = history::list_history(&store).context("listing saved roasts")?;
    if entries.is_empty() {
        println!("No saved roasts in {}", store.data_dir().display());
    }
    for entry in entries {
        println!("{:>5}  {}", entry.id, entry.label);
    }
    Ok(ExitCode::SUCCESS)
}

fn run_show(config: &AppConfig, id: RoastId) -> Result<ExitCode> {
    let record = open_store(config)
        .load(id)
        .with_context(|| format!("loading roast {}", id))?;
    println!("{}", serde_json::to_string_pretty(&record)?);
    Ok(ExitCode::SUCCESS)
}

fn run_record(config: AppConfig, seconds: u64, bean_info: Option<String>) -> Result<ExitCode> {
    let context = build_context(&config)?;
    let mut events = context.subscribe_events();

    context.toggle_recording(true, bean_info)?;
    let acquisition = AcquisitionLoop::new(context.clone())
        .context("spawning persist thread")?
        .spawn()
        .context("spawning acquisition thread")?;
    tracing::info!("[Record] Recording for {}s", seconds);
    std::thread::sleep(Duration::from_secs(seconds));
    acquisition.stop();
    context.toggle_recording(false, None)?;

    // The session may have been force-stopped earlier; report every save.
    let mut saved = 0;
    while let Ok(event) = events.try_recv() {
        if let RecordingEvent::Stopped {
            roast_id: Some(id),
            sample_count,
            reason,
        } = event
        {
            println!("Saved roast {} ({} samples, {:?})", id, sample_count, reason);
            saved += 1;
        }
    }

    let stats = context.acquisition_stats();
    println!(
        "{} ticks, {} read failures, {} persist failures",
        stats.ticks, stats.read_failures, stats.persist_failures
    );
    if saved == 0 {
        println!("Nothing was saved");
        return Ok(ExitCode::from(2));
    }
    Ok(ExitCode::SUCCESS)
}

fn run_delete(config: &AppConfig, id: RoastId) -> Result<ExitCode> {
    open_store(config)
        .delete(id)
        .with_context(|| format!("deleting roast {}", id))?;
    println!("Deleted roast {}", id);
    Ok(ExitCode::SUCCESS)
}
