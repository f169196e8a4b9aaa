//! Coverswitch CLI
//!
//! Command-line interface for controlling the coverswitch daemon.
//!
//! Commands are sent to the daemon as one JSON line over its Unix socket.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use coverswitch_ipc::{IpcCommand, IpcResponse, LaunchTarget, MAX_IPC_MESSAGE_SIZE};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::UnixStream;

/// How long to wait for the daemon's answer.
const RESPONSE_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Parser)]
#[command(name = "coverswitch-cli")]
#[command(author, version, about = "Control the coverswitch window switcher")]
struct Cli {
    /// Daemon socket (default: $XDG_RUNTIME_DIR/coverswitch.sock)
    #[arg(short, long, global = true)]
    socket: Option<PathBuf>,

    /// Print the raw JSON response
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Open the switcher, or step forward if it is open
    Launch {
        #[command(subcommand)]
        what: LaunchType,
    },
    /// Select the next entry
    Next,
    /// Select the previous entry
    Previous,
    /// Activate the selected window and close the switcher
    Select,
    /// Close the switcher without activating anything
    Cancel,
    /// Send a key action (next, previous, next_window_of_app, show_desktop, ...)
    Key {
        action: String,
    },
    /// Query switcher state
    Query,
    /// Reload configuration
    Reload,
    /// Stop the daemon
    Stop,
}

#[derive(Subcommand)]
enum LaunchType {
    /// Switch between windows
    Windows,
    /// Switch between applications
    Applications,
}

impl Commands {
    fn to_ipc(&self) -> IpcCommand {
        match self {
            Commands::Launch { what } => IpcCommand::Launch {
                target: match what {
                    LaunchType::Windows => LaunchTarget::Windows,
                    LaunchType::Applications => LaunchTarget::Applications,
                },
            },
            Commands::Next => IpcCommand::Next,
            Commands::Previous => IpcCommand::Previous,
            Commands::Select => IpcCommand::Select,
            Commands::Cancel => IpcCommand::Cancel,
            Commands::Key { action } => IpcCommand::Key {
                action: action.clone(),
            },
            Commands::Query => IpcCommand::Query,
            Commands::Reload => IpcCommand::Reload,
            Commands::Stop => IpcCommand::Stop,
        }
    }
}

/// Send one command and wait for its response.
async fn send_command(socket: &Path, cmd: &IpcCommand) -> Result<IpcResponse> {
    let stream = UnixStream::connect(socket).await.with_context(|| {
        format!(
            "Failed to connect to {} (is the coverswitch daemon running?)",
            socket.display()
        )
    })?;
    let (reader, mut writer) = stream.into_split();

    let line = coverswitch_ipc::encode_line(cmd)?;
    writer.write_all(line.as_bytes()).await?;
    writer.flush().await?;

    let mut reader = BufReader::new(reader.take(MAX_IPC_MESSAGE_SIZE as u64));
    let mut response = String::new();
    tokio::time::timeout(RESPONSE_TIMEOUT, reader.read_line(&mut response))
        .await
        .context("Timed out waiting for the daemon")??;

    Ok(coverswitch_ipc::decode_line(&response)?)
}

/// Render a response for humans.
fn format_response(response: &IpcResponse) -> String {
    match response {
        IpcResponse::Ok => "ok".to_string(),
        IpcResponse::Ignored { reason } => format!("ignored: {}", reason),
        IpcResponse::Error { message } => format!("error: {}", message),
        IpcResponse::SwitcherState {
            open: false, ..
        } => "switcher: closed".to_string(),
        IpcResponse::SwitcherState {
            open: true,
            mode,
            state,
            current_index,
            window_count,
            selected_window,
        } => {
            let mut out = format!(
                "switcher: {} ({})\n  windows: {}",
                state.as_deref().unwrap_or("unknown"),
                mode.as_deref().unwrap_or("unknown"),
                window_count
            );
            if let Some(index) = current_index {
                out.push_str(&format!("\n  index: {}", index));
            }
            if let Some(window) = selected_window {
                out.push_str(&format!("\n  selected: {}", window));
            }
            out
        }
        IpcResponse::HostRequests {
            activate,
            minimize,
            close,
        } => format!(
            "activate: {:?}\nminimize: {:?}\nclose: {:?}",
            activate, minimize, close
        ),
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let socket = cli.socket.clone().unwrap_or_else(coverswitch_ipc::default_socket_path);

    let response = send_command(&socket, &cli.command.to_ipc()).await?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&response)?);
    } else {
        println!("{}", format_response(&response));
    }

    if let IpcResponse::Error { message } = response {
        bail!("daemon reported an error: {}", message);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("coverswitch-cli").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_launch_subcommands() {
        let cli = parse(&["launch", "windows"]);
        assert_eq!(
            cli.command.to_ipc(),
            IpcCommand::Launch {
                target: LaunchTarget::Windows
            }
        );

        let cli = parse(&["launch", "applications"]);
        assert_eq!(
            cli.command.to_ipc(),
            IpcCommand::Launch {
                target: LaunchTarget::Applications
            }
        );

        assert!(Cli::try_parse_from(["coverswitch-cli", "launch"]).is_err());
    }

    #[test]
    fn test_simple_commands() {
        for (arg, expected) in [
            ("next", IpcCommand::Next),
            ("previous", IpcCommand::Previous),
            ("select", IpcCommand::Select),
            ("cancel", IpcCommand::Cancel),
            ("query", IpcCommand::Query),
            ("reload", IpcCommand::Reload),
            ("stop", IpcCommand::Stop),
        ] {
            assert_eq!(parse(&[arg]).command.to_ipc(), expected);
        }
    }

    #[test]
    fn test_key_and_global_flags() {
        let cli = parse(&["key", "show_desktop", "--socket", "/tmp/cs.sock", "--json"]);
        assert_eq!(
            cli.command.to_ipc(),
            IpcCommand::Key {
                action: "show_desktop".to_string()
            }
        );
        assert_eq!(cli.socket, Some(PathBuf::from("/tmp/cs.sock")));
        assert!(cli.json);
    }

    #[test]
    fn test_format_closed_state() {
        let response = IpcResponse::SwitcherState {
            open: false,
            mode: None,
            state: None,
            current_index: None,
            window_count: 0,
            selected_window: None,
        };
        assert_eq!(format_response(&response), "switcher: closed");
    }

    #[test]
    fn test_format_open_state() {
        let response = IpcResponse::SwitcherState {
            open: true,
            mode: Some("windows".to_string()),
            state: Some("idle".to_string()),
            current_index: Some(1.0),
            window_count: 3,
            selected_window: Some(42),
        };
        assert_eq!(
            format_response(&response),
            "switcher: idle (windows)\n  windows: 3\n  index: 1\n  selected: 42"
        );
    }

    #[test]
    fn test_format_simple_responses() {
        assert_eq!(format_response(&IpcResponse::Ok), "ok");
        assert_eq!(
            format_response(&IpcResponse::ignored("Switcher is not open")),
            "ignored: Switcher is not open"
        );
        assert_eq!(format_response(&IpcResponse::error("boom")), "error: boom");
    }

    #[test]
    fn test_send_command_without_daemon_fails() {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_io()
            .enable_time()
            .build()
            .unwrap();
        let socket = std::env::temp_dir().join("coverswitch-cli-test-missing.sock");
        let result = runtime.block_on(send_command(&socket, &IpcCommand::Query));
        let message = format!("{:#}", result.unwrap_err());
        assert!(message.contains("is the coverswitch daemon running"));
    }
}
