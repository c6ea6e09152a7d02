// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Switchboard control-plane daemon (swbd)
//!
//! Background process that dispatches sessions to workers, journals
//! their event streams, and fans events out to UI subscribers.
//!
//! Architecture:
//! - Listener task: Unix-socket RPC surface for UIs
//! - Relay task: TCP reverse proxy toward worker RPC services
//! - Reconciler task: pending-session dispatch loop
//! - One state-sync watcher task per configured worker

use std::fs::File;
use std::sync::Arc;

use fs2::FileExt;
use swb_core::SystemClock;
use swb_daemon::config::Config;
use swb_daemon::listener::{ListenCtx, Listener};
use swb_daemon::relay::Relay;
use swb_daemon::statesync::{StateSyncHandler, StateSyncWatcher};
use swb_daemon::threads::NoopThreadTopics;
use swb_daemon::workers::HttpWorkerClient;
use swb_daemon::{EventBus, Reconciler, SessionService, SystemPromptRenderer};
use swb_storage::FileStore;
use tokio::signal::unix::{signal, SignalKind};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Handle info flags before any config/lock acquisition
    if let Some(arg) = std::env::args().nth(1) {
        match arg.as_str() {
            "--version" | "-V" | "-v" => {
                println!("swbd {VERSION}");
                return Ok(());
            }
            "--help" | "-h" | "help" => {
                println!("swbd {VERSION}");
                println!("Switchboard control-plane daemon - dispatches agent sessions to workers");
                println!();
                println!("USAGE:");
                println!("    swbd");
                println!();
                println!("Listens on a Unix socket for UI requests and relays worker RPCs");
                println!("on the configured TCP address. Configure via");
                println!("$SWB_STATE_DIR/config.toml.");
                println!();
                println!("OPTIONS:");
                println!("    -h, --help       Print help information");
                println!("    -v, --version    Print version information");
                return Ok(());
            }
            _ => {
                eprintln!("error: unexpected argument '{arg}'");
                eprintln!("Usage: swbd [--help | --version]");
                std::process::exit(1);
            }
        }
    }

    let config = Config::load()?;
    std::fs::create_dir_all(&config.state_dir)?;

    rotate_log_if_needed(&config.log_path);
    let _log_guard = setup_logging(&config)?;

    info!(version = VERSION, "starting switchboard daemon");

    // Exactly one daemon per state dir: the reconciler must not run twice
    let lock_file = acquire_lock(&config)?;

    let store = Arc::new(FileStore::open(&config.data_dir)?);
    let registry = Arc::new(config.build_registry());
    let bus = EventBus::new();
    let topics = Arc::new(NoopThreadTopics);
    let clock = SystemClock;
    let workers = Arc::new(HttpWorkerClient::new());

    let mut renderer =
        SystemPromptRenderer::new(config.plans_root.clone(), config.extra_plan_dirs.clone());
    if let Some(template) = &config.system_prompt_template {
        renderer = renderer.with_template(template.clone());
    }

    let shutdown = CancellationToken::new();

    // Reconciler
    let (reconciler, reconciler_handle) = Reconciler::new(
        Arc::clone(&store),
        Arc::clone(&workers),
        Arc::clone(&registry),
        renderer,
        clock.clone(),
        config.reconcile.clone(),
    );
    tokio::spawn(reconciler.run(shutdown.clone()));

    // One state-sync watcher per configured worker
    let handler = Arc::new(StateSyncHandler::new(
        Arc::clone(&store),
        bus.clone(),
        topics.clone() as Arc<dyn swb_daemon::ThreadTopics>,
        clock.clone(),
    ));
    for worker in registry.entries() {
        info!(worker_id = %worker.id, base_url = %worker.base_url, "starting state-sync watcher");
        let watcher = StateSyncWatcher::new(worker, Arc::clone(&handler));
        tokio::spawn(watcher.run(shutdown.clone()));
    }

    // Relay
    let relay_listener = tokio::net::TcpListener::bind(&config.relay_addr).await?;
    info!(addr = %config.relay_addr, "relay listening");
    tokio::spawn(Relay::new(Arc::clone(&registry)).run(relay_listener, shutdown.clone()));

    // UI listener
    if config.socket_path.exists() {
        std::fs::remove_file(&config.socket_path)?;
    }
    let socket = tokio::net::UnixListener::bind(&config.socket_path)?;
    let service = SessionService::new(
        Arc::clone(&store),
        workers,
        registry,
        topics as Arc<dyn swb_daemon::ThreadTopics>,
        reconciler_handle,
        bus,
        clock,
    );
    let ctx = Arc::new(ListenCtx { service, shutdown: shutdown.clone() });
    tokio::spawn(Listener::new(socket, ctx).run());

    info!(socket = %config.socket_path.display(), "daemon ready");
    println!("READY");

    // Wait for a shutdown signal
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;
    tokio::select! {
        _ = sigterm.recv() => info!("received SIGTERM, shutting down"),
        _ = sigint.recv() => info!("received SIGINT, shutting down"),
    }

    // Cancelling the token stops every task; watchers flush their
    // accumulators on the way out
    shutdown.cancel();
    tokio::time::sleep(std::time::Duration::from_millis(200)).await;

    if config.socket_path.exists() {
        if let Err(e) = std::fs::remove_file(&config.socket_path) {
            error!(error = %e, "failed to remove socket file");
        }
    }
    if config.lock_path.exists() {
        if let Err(e) = std::fs::remove_file(&config.lock_path) {
            error!(error = %e, "failed to remove PID file");
        }
    }
    drop(lock_file);

    info!("daemon stopped");
    Ok(())
}

/// Take the exclusive daemon lock, writing our PID into it.
fn acquire_lock(config: &Config) -> Result<File, Box<dyn std::error::Error>> {
    use std::io::Write;

    let file = std::fs::OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(false)
        .open(&config.lock_path)?;
    if file.try_lock_exclusive().is_err() {
        let pid = std::fs::read_to_string(&config.lock_path).unwrap_or_default();
        eprintln!("swbd is already running");
        if !pid.trim().is_empty() {
            eprintln!("  pid: {}", pid.trim());
        }
        std::process::exit(1);
    }
    let mut file = file;
    file.set_len(0)?;
    writeln!(file, "{}", std::process::id())?;
    Ok(file)
}

/// Maximum log file size before rotation (10 MB).
const MAX_LOG_SIZE: u64 = 10 * 1024 * 1024;

/// Number of rotated log files to keep (daemon.log.1, .2, .3).
const MAX_ROTATED_LOGS: u32 = 3;

/// Rotate the daemon log file if it exceeds [`MAX_LOG_SIZE`].
///
/// Shifts `daemon.log` → `daemon.log.1` → `daemon.log.2` → `daemon.log.3`,
/// deleting the oldest. Best-effort: rotation failures are silently
/// ignored so the daemon still starts.
fn rotate_log_if_needed(log_path: &std::path::Path) {
    let size = match std::fs::metadata(log_path) {
        Ok(m) => m.len(),
        Err(_) => return,
    };

    if size < MAX_LOG_SIZE {
        return;
    }

    let log_str = log_path.display().to_string();
    for i in (1..MAX_ROTATED_LOGS).rev() {
        let from = format!("{log_str}.{i}");
        let to = format!("{log_str}.{}", i + 1);
        let _ = std::fs::rename(&from, &to);
    }
    let _ = std::fs::rename(log_path, format!("{log_str}.1"));
}

fn setup_logging(
    config: &Config,
) -> Result<tracing_appender::non_blocking::WorkerGuard, Box<dyn std::error::Error>> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    if let Some(parent) = config.log_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let dir = config.log_path.parent().ok_or("log path has no parent directory")?;
    let file_name = config.log_path.file_name().ok_or("log path has no file name")?;
    let file_appender = tracing_appender::rolling::never(dir, file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(non_blocking))
        .init();

    Ok(guard)
}
