//! Coverswitch Core
//!
//! Platform-agnostic window switcher engine.
//!
//! This crate implements an animated, navigable carousel of window previews:
//! - A [`Switcher`] state machine owns the selection over an ordered window list
//! - Three interchangeable [`Strategy`] variants map selection to preview transforms
//!   (stacked coverflow flip, continuous carousel ring, receding timeline)
//! - Application mode composes a root switcher with per-application child switchers
//! - Animations are submitted to an external [`TweenScheduler`]; completions come back
//!   as [`Continuation`] tokens instead of closures
//!
//! The host environment (window enumeration, rendering, input grabs) is abstracted
//! behind the traits in [`host`]. [`headless::HeadlessHost`] is an in-memory host
//! driven by the built-in [`TweenEngine`].

pub mod config;
pub mod error;
pub mod headless;
pub mod host;
pub mod preview;
pub mod remote;
pub mod strategy;
pub mod switcher;
pub mod tween;

use serde::{Deserialize, Serialize};

pub use config::{
    ConfigWarning, IconStyle, LoopingMethod, SwitcherConfig, SwitcherStyle, TitlePosition,
    WorkspaceFilter,
};
pub use error::SwitcherError;
pub use host::{
    Continuation, Host, ModalInputGrab, Scene, Scope, Step, Tween, TweenScheduler, TweenTarget,
    WindowSource,
};
pub use preview::{Effect, Preview, PreviewId, Transform};
pub use remote::{Controller, LaunchKind, RemoteCommand};
pub use strategy::{LayoutStrategy, Strategy};
pub use switcher::{
    CloseReason, Direction, InputEvent, KeyAction, OpenRequest, Switcher, SwitcherMode,
    SwitcherState,
};
pub use tween::{Easing, TweenEngine};

/// Unique identifier for a window, as handed out by the host.
pub type WindowId = u64;

/// Identifier of a workspace (virtual desktop).
pub type WorkspaceId = u32;

/// Identifier of a monitor.
pub type MonitorId = u32;

/// Fallback stage dimensions when the host cannot report monitor geometry.
pub const FALLBACK_STAGE_WIDTH: i32 = 1920;
pub const FALLBACK_STAGE_HEIGHT: i32 = 1080;

/// Key grouping windows that belong to the same application.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AppKey(pub String);

impl AppKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for AppKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A rectangle in screen coordinates (pixels).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    /// Create a new rectangle.
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self { x, y, width, height }
    }

    /// Horizontal center.
    pub fn center_x(&self) -> f64 {
        self.x as f64 + self.width as f64 / 2.0
    }

    /// Vertical center.
    pub fn center_y(&self) -> f64 {
        self.y as f64 + self.height as f64 / 2.0
    }

    /// Get the right edge x-coordinate.
    pub fn right(&self) -> i32 {
        self.x + self.width
    }

    /// Get the bottom edge y-coordinate.
    pub fn bottom(&self) -> i32 {
        self.y + self.height
    }

    /// Fallback stage used when no monitor geometry is available.
    pub fn fallback_stage() -> Self {
        Self::new(0, 0, FALLBACK_STAGE_WIDTH, FALLBACK_STAGE_HEIGHT)
    }
}

/// A window as reported by the host.
///
/// Owned by the host; the engine only reads it, except for the minimized flag
/// which it mirrors after `show_desktop`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Window {
    pub id: WindowId,
    pub title: String,
    pub minimized: bool,
    pub workspace: WorkspaceId,
    pub monitor: MonitorId,
    pub app: AppKey,
    /// Last time the window had focus; larger is more recent.
    pub focus_timestamp: u64,
    /// Set for dialogs and other transient windows.
    pub transient_for: Option<WindowId>,
    /// On-screen geometry of the real window.
    pub frame: Rect,
}

impl Window {
    /// Convenience constructor used by hosts and tests.
    pub fn new(id: WindowId, title: impl Into<String>, app: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            minimized: false,
            workspace: 0,
            monitor: 0,
            app: AppKey::new(app),
            focus_timestamp: 0,
            transient_for: None,
            frame: Rect::new(100, 100, 800, 600),
        }
    }

    pub fn with_workspace(mut self, workspace: WorkspaceId) -> Self {
        self.workspace = workspace;
        self
    }

    pub fn with_monitor(mut self, monitor: MonitorId) -> Self {
        self.monitor = monitor;
        self
    }

    pub fn with_frame(mut self, frame: Rect) -> Self {
        self.frame = frame;
        self
    }

    pub fn with_focus_timestamp(mut self, timestamp: u64) -> Self {
        self.focus_timestamp = timestamp;
        self
    }

    pub fn minimized(mut self) -> Self {
        self.minimized = true;
        self
    }
}
