//! Coverswitch IPC Protocol
//!
//! Shared types for daemon-CLI communication over a Unix domain socket.
//! Every message is one JSON object terminated by a newline.

use std::path::PathBuf;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// File name of the daemon socket.
pub const SOCKET_NAME: &str = "coverswitch.sock";

/// Upper bound for a single request or response line.
pub const MAX_IPC_MESSAGE_SIZE: usize = 64 * 1024;

/// Socket path used when the configuration does not override it.
///
/// Lives in `$XDG_RUNTIME_DIR` when set, otherwise in the temp directory.
pub fn default_socket_path() -> PathBuf {
    std::env::var_os("XDG_RUNTIME_DIR")
        .filter(|dir| !dir.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(std::env::temp_dir)
        .join(SOCKET_NAME)
}

/// Errors raised while framing IPC messages.
#[derive(Debug, Error)]
pub enum IpcError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed message: {0}")]
    Json(#[from] serde_json::Error),
    #[error("message of {0} bytes exceeds the IPC size limit")]
    TooLarge(usize),
    #[error("connection closed before a message arrived")]
    Closed,
}

/// Serialize a message into one newline-terminated line.
pub fn encode_line<T: Serialize>(message: &T) -> Result<String, IpcError> {
    let mut line = serde_json::to_string(message)?;
    if line.len() > MAX_IPC_MESSAGE_SIZE {
        return Err(IpcError::TooLarge(line.len()));
    }
    line.push('\n');
    Ok(line)
}

/// Parse one received line, ignoring surrounding whitespace.
pub fn decode_line<T: DeserializeOwned>(line: &str) -> Result<T, IpcError> {
    if line.len() > MAX_IPC_MESSAGE_SIZE {
        return Err(IpcError::TooLarge(line.len()));
    }
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Err(IpcError::Closed);
    }
    Ok(serde_json::from_str(trimmed)?)
}

/// What `launch` lists.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LaunchTarget {
    #[default]
    Windows,
    Applications,
}

/// Phase of a touchpad swipe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GesturePhase {
    Begin,
    Update,
    End,
}

/// Rectangle in screen pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct IpcRect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl IpcRect {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self { x, y, width, height }
    }
}

/// A window as pushed by the platform bridge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowInfo {
    pub window_id: u64,
    pub title: String,
    /// Application identifier (desktop file id or WM class).
    pub app: String,
    #[serde(default)]
    pub minimized: bool,
    #[serde(default)]
    pub workspace: u32,
    #[serde(default)]
    pub monitor: u32,
    /// Last time the window had focus; larger is more recent.
    #[serde(default)]
    pub focus_timestamp: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transient_for: Option<u64>,
    pub rect: IpcRect,
}

/// Commands sent to the daemon, by the CLI or by the platform bridge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum IpcCommand {
    /// Open the switcher, or step forward if it is already open.
    Launch {
        #[serde(default)]
        target: LaunchTarget,
    },
    /// Select the next entry.
    Next,
    /// Select the previous entry.
    Previous,
    /// Activate the selected window and close.
    Select,
    /// Close without activating anything.
    Cancel,

    /// Forward a resolved keybinding (`next`, `cancel`, `show_desktop`, ...).
    Key {
        action: String,
    },
    /// The switcher's modifier keys were released.
    ModifiersReleased,
    /// Drive the switcher from a swipe gesture.
    Gesture {
        phase: GesturePhase,
        progress: f64,
    },

    /// Replace the daemon's window inventory.
    SyncWindows {
        windows: Vec<WindowInfo>,
    },
    /// A window was destroyed.
    WindowDestroyed {
        window_id: u64,
    },
    /// The active workspace changed.
    SetWorkspace {
        workspace: u32,
    },
    /// Geometry of the active monitor.
    SetMonitor {
        monitor: u32,
        rect: IpcRect,
    },

    /// Query the switcher state.
    Query,
    /// Fetch and clear the window operations the daemon wants performed.
    DrainRequests,
    /// Reload configuration from file.
    Reload,
    /// Stop the daemon.
    Stop,
}

/// Responses from the daemon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum IpcResponse {
    /// Command executed successfully.
    Ok,
    /// Command was valid but there was nothing to act on.
    Ignored {
        reason: String,
    },
    /// Command failed with an error.
    Error {
        message: String,
    },
    /// Switcher state query response.
    SwitcherState {
        open: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        mode: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        state: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        current_index: Option<f64>,
        window_count: usize,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        selected_window: Option<u64>,
    },
    /// Window operations for the platform bridge to carry out.
    HostRequests {
        activate: Vec<u64>,
        minimize: Vec<u64>,
        close: Vec<u64>,
    },
}

impl IpcResponse {
    /// Create an error response.
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }

    /// Create an ignored response.
    pub fn ignored(reason: impl Into<String>) -> Self {
        Self::Ignored {
            reason: reason.into(),
        }
    }
}
