//! Coverswitch Daemon
//!
//! Long-running process hosting the window switcher.
//!
//! Responsibilities:
//! - Own the switcher controller and its window inventory
//! - Handle IPC commands from the CLI and the platform bridge
//! - Drive animations with a fixed-rate tick while anything is moving
//! - Reload configuration on request

mod config;
mod state;

use anyhow::{Context, Result};
use config::Config;
use coverswitch_ipc::{IpcCommand, IpcResponse, MAX_IPC_MESSAGE_SIZE};
use state::AppState;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info, warn, Level};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Events that the daemon event loop processes.
enum DaemonEvent {
    /// An IPC command from a client.
    IpcCommand {
        cmd: IpcCommand,
        responder: oneshot::Sender<IpcResponse>,
    },
    /// Animation tick (16ms intervals during animation).
    AnimationTick,
    /// Shutdown signal.
    Shutdown,
}

/// Animation tick interval in milliseconds (~60 FPS).
const ANIMATION_TICK_MS: u64 = 16;

/// IPC read timeout - clients must send within this period.
const IPC_READ_TIMEOUT: Duration = Duration::from_secs(5);

/// Capacity of the event channel.
const EVENT_CHANNEL_CAPACITY: usize = 100;

const SERIALIZATION_ERROR: &str =
    "{\"status\":\"error\",\"message\":\"Internal serialization error\"}\n";

/// Serialize a response as one line, falling back to a canned error.
fn response_line(response: &IpcResponse) -> String {
    match coverswitch_ipc::encode_line(response) {
        Ok(line) => line,
        Err(e) => {
            warn!("Failed to serialize IPC response: {}", e);
            SERIALIZATION_ERROR.to_string()
        }
    }
}

/// Run the IPC server, accepting connections and dispatching commands.
async fn run_ipc_server(listener: UnixListener, event_tx: mpsc::Sender<DaemonEvent>) {
    loop {
        let stream = match listener.accept().await {
            Ok((stream, _)) => stream,
            Err(e) => {
                error!("Failed to accept client connection: {}", e);
                tokio::time::sleep(Duration::from_millis(100)).await;
                continue;
            }
        };

        debug!("Client connected");

        let event_tx = event_tx.clone();
        tokio::spawn(async move {
            let (reader, writer) = stream.into_split();
            if let Err(e) = handle_client(reader, writer, event_tx).await {
                warn!("Client handler error: {}", e);
            }
        });
    }
}

/// Handle a single client connection: one request line, one response line.
async fn handle_client<R, W>(
    reader: R,
    mut writer: W,
    event_tx: mpsc::Sender<DaemonEvent>,
) -> Result<()>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let limited_reader = reader.take(MAX_IPC_MESSAGE_SIZE as u64);
    let mut reader = BufReader::new(limited_reader);
    let mut line = String::new();

    // Read command (single line of JSON) with timeout and size bound
    let read_result = tokio::time::timeout(IPC_READ_TIMEOUT, reader.read_line(&mut line)).await;
    let bytes_read = match read_result {
        Ok(Ok(n)) => n,
        Ok(Err(e)) => return Err(e.into()),
        Err(_) => {
            // Client did not send in time
            return Ok(());
        }
    };
    if bytes_read == 0 {
        return Ok(());
    }

    let line = line.trim();
    debug!("Received command: {}", line);

    let cmd: IpcCommand = match serde_json::from_str(line) {
        Ok(cmd) => cmd,
        Err(e) => {
            let response = IpcResponse::error(format!("Invalid command: {}", e));
            writer.write_all(response_line(&response).as_bytes()).await?;
            return Ok(());
        }
    };

    let is_stop = matches!(cmd, IpcCommand::Stop);

    let (resp_tx, resp_rx) = oneshot::channel();
    if event_tx
        .send(DaemonEvent::IpcCommand {
            cmd,
            responder: resp_tx,
        })
        .await
        .is_err()
    {
        let response = IpcResponse::error("Daemon is shutting down");
        writer.write_all(response_line(&response).as_bytes()).await?;
        return Ok(());
    }

    let response = match resp_rx.await {
        Ok(resp) => resp,
        Err(_) => IpcResponse::error("Failed to get response from daemon"),
    };
    writer.write_all(response_line(&response).as_bytes()).await?;
    writer.flush().await?;

    if is_stop {
        let _ = event_tx.send(DaemonEvent::Shutdown).await;
    }

    Ok(())
}

/// Check if another daemon instance is already listening on the socket.
async fn check_already_running(path: &Path) -> bool {
    UnixStream::connect(path).await.is_ok()
}

/// Bind the socket, replacing a stale file left behind by a crashed daemon.
fn bind_socket(path: &Path) -> Result<UnixListener> {
    if path.exists() {
        debug!("Removing stale socket {}", path.display());
        std::fs::remove_file(path)
            .with_context(|| format!("Failed to remove stale socket: {}", path.display()))?;
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create socket directory: {}", parent.display()))?;
    }
    UnixListener::bind(path).with_context(|| format!("Failed to bind socket: {}", path.display()))
}

/// Map a configured level name to a tracing level.
fn parse_log_level(level: &str) -> Level {
    match level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    }
}

fn start_animation_timer(
    animation_tx: mpsc::Sender<DaemonEvent>,
    animation_running: Arc<AtomicBool>,
) -> tokio::task::JoinHandle<()> {
    animation_running.store(true, Ordering::SeqCst);
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_millis(ANIMATION_TICK_MS));
        loop {
            interval.tick().await;
            if !animation_running.load(Ordering::SeqCst) {
                break;
            }
            if animation_tx.send(DaemonEvent::AnimationTick).await.is_err() {
                break;
            }
        }
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (needed for log level)
    let mut config = Config::load().unwrap_or_else(|e| {
        // Can't use tracing yet, fall back to eprintln
        eprintln!("Failed to load configuration: {:#}. Using defaults.", e);
        Config::default()
    });

    // RUST_LOG wins over the configured level when set
    let subscriber =
        FmtSubscriber::builder().with_max_level(parse_log_level(&config.behavior.log_level));
    match EnvFilter::try_from_default_env() {
        Ok(filter) => {
            tracing::subscriber::set_global_default(subscriber.with_env_filter(filter).finish())?
        }
        Err(_) => tracing::subscriber::set_global_default(subscriber.finish())?,
    }

    let config_warnings = config.validate();
    for w in &config_warnings {
        warn!("Config: {} - {}", w.field, w.message);
    }

    info!("Coverswitch daemon starting...");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let socket_path: PathBuf = config.ipc.socket_path();
    if check_already_running(&socket_path).await {
        error!(
            "Another coverswitch daemon is already running (socket {} is active)",
            socket_path.display()
        );
        return Ok(());
    }

    info!(
        "Configuration loaded: style={:?}, looping={:?}, animation_time={}s, log_level={}",
        config.switcher.switcher_style,
        config.switcher.switcher_looping_method,
        config.switcher.animation_time,
        config.behavior.log_level
    );

    let listener = bind_socket(&socket_path)?;
    let mut state = AppState::new(config);

    let (event_tx, mut event_rx) = mpsc::channel::<DaemonEvent>(EVENT_CHANNEL_CAPACITY);

    let ipc_tx = event_tx.clone();
    tokio::spawn(async move {
        run_ipc_server(listener, ipc_tx).await;
    });
    info!("IPC server listening on {}", socket_path.display());

    // Ctrl+C triggers graceful shutdown
    {
        let shutdown_tx = event_tx.clone();
        tokio::spawn(async move {
            if let Ok(()) = tokio::signal::ctrl_c().await {
                info!("Ctrl+C received, initiating shutdown...");
                let _ = shutdown_tx.send(DaemonEvent::Shutdown).await;
            }
        });
    }

    info!("Ready. Use coverswitch-cli to send commands.");

    let mut animation_timer_handle: Option<tokio::task::JoinHandle<()>> = None;
    let animation_running = Arc::new(AtomicBool::new(false));

    while let Some(event) = event_rx.recv().await {
        match event {
            DaemonEvent::IpcCommand { cmd, responder } => {
                let is_reload = matches!(cmd, IpcCommand::Reload);
                let response = state.handle_command(cmd);
                if is_reload && state.config.ipc.socket_path() != socket_path {
                    warn!("Socket path changes take effect after a restart");
                }
                if responder.send(response).is_err() {
                    debug!("Client disconnected before receiving IPC response");
                }

                if state.is_animating() && !animation_running.load(Ordering::SeqCst) {
                    animation_timer_handle = Some(start_animation_timer(
                        event_tx.clone(),
                        animation_running.clone(),
                    ));
                }
            }
            DaemonEvent::AnimationTick => {
                if !state.tick_animations(ANIMATION_TICK_MS as u32) {
                    animation_running.store(false, Ordering::SeqCst);
                    if let Some(handle) = animation_timer_handle.take() {
                        handle.abort();
                    }
                    debug!("All animations complete");
                }
            }
            DaemonEvent::Shutdown => {
                info!("Shutdown signal received");
                break;
            }
        }
    }

    if let Some(handle) = animation_timer_handle {
        handle.abort();
    }
    if let Err(e) = std::fs::remove_file(&socket_path) {
        debug!("Failed to remove socket {}: {}", socket_path.display(), e);
    }

    info!("Coverswitch daemon shutting down.");
    Ok(())
}
