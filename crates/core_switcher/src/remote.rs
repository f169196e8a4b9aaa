//! Remote command channel.
//!
//! A [`Controller`] owns at most one live root switcher and maps the remote
//! commands `launch`, `next`, `previous` and `select` onto it. Launching
//! also decides which windows are offered, from the host inventory and the
//! configuration.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::{SwitcherConfig, WorkspaceFilter};
use crate::error::SwitcherError;
use crate::headless::HeadlessHost;
use crate::host::{Continuation, Host};
use crate::switcher::{
    Direction, InputEvent, OpenRequest, Switcher, SwitcherMode, SwitcherState,
};
use crate::{AppKey, MonitorId, Window, WindowId, WorkspaceId};

/// What a launch lists.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LaunchKind {
    #[default]
    Windows,
    Applications,
}

impl std::str::FromStr for LaunchKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "windows" => Ok(LaunchKind::Windows),
            "applications" => Ok(LaunchKind::Applications),
            other => Err(format!("unknown launch kind: {}", other)),
        }
    }
}

/// Commands accepted from outside the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum RemoteCommand {
    Launch { kind: LaunchKind },
    Next,
    Previous,
    /// Activate the current selection.
    Select,
}

/// Snapshot of the controller for status queries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControllerStatus {
    pub open: bool,
    pub mode: Option<SwitcherMode>,
    pub state: Option<SwitcherState>,
    pub current_index: Option<f64>,
    pub window_count: usize,
    pub selected_window: Option<WindowId>,
}

/// Windows chosen for a launch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selection {
    /// Navigable windows, most recently focused first.
    pub windows: Vec<Window>,
    /// Windows only excluded by the workspace filter.
    pub siblings: Vec<Window>,
}

/// Pick and order the windows for a launch.
pub fn select_windows(
    mut windows: Vec<Window>,
    config: &SwitcherConfig,
    active_workspace: WorkspaceId,
    active_monitor: MonitorId,
    group_by_app: bool,
) -> Selection {
    windows.retain(|w| w.transient_for.is_none());
    if config.switch_per_monitor {
        windows.retain(|w| w.monitor == active_monitor);
    }
    windows.sort_by(|a, b| b.focus_timestamp.cmp(&a.focus_timestamp));

    let (current, elsewhere): (Vec<Window>, Vec<Window>) = windows
        .into_iter()
        .partition(|w| w.workspace == active_workspace);
    let mut selection = match config.current_workspace_only {
        WorkspaceFilter::CurrentWorkspace => Selection {
            windows: current,
            siblings: elsewhere,
        },
        WorkspaceFilter::CurrentWorkspaceFirst => Selection {
            windows: current.into_iter().chain(elsewhere).collect(),
            siblings: Vec::new(),
        },
        WorkspaceFilter::AllWorkspaces => {
            let mut all: Vec<Window> = current.into_iter().chain(elsewhere).collect();
            all.sort_by(|a, b| b.focus_timestamp.cmp(&a.focus_timestamp));
            Selection {
                windows: all,
                siblings: Vec::new(),
            }
        }
    };

    if group_by_app {
        selection.windows = group_windows(selection.windows);
    }
    selection
}

/// Stable grouping: applications in order of first appearance.
fn group_windows(windows: Vec<Window>) -> Vec<Window> {
    let mut groups: Vec<(AppKey, Vec<Window>)> = Vec::new();
    for window in windows {
        match groups.iter_mut().find(|(app, _)| *app == window.app) {
            Some((_, members)) => members.push(window),
            None => groups.push((window.app.clone(), vec![window])),
        }
    }
    groups.into_iter().flat_map(|(_, members)| members).collect()
}

/// Owner of the live switcher.
#[derive(Debug)]
pub struct Controller {
    config: Arc<SwitcherConfig>,
    live: Option<Switcher>,
}

impl Controller {
    pub fn new(config: SwitcherConfig) -> Self {
        Self {
            config: Arc::new(config),
            live: None,
        }
    }

    /// Replace the configuration. A live switcher keeps the one it opened with.
    pub fn set_config(&mut self, config: SwitcherConfig) {
        self.config = Arc::new(config);
    }

    pub fn config(&self) -> &SwitcherConfig {
        &self.config
    }

    pub fn switcher(&self) -> Option<&Switcher> {
        self.live.as_ref()
    }

    pub fn is_live(&self) -> bool {
        self.live.as_ref().is_some_and(|s| s.state() != SwitcherState::Destroyed)
    }

    pub fn status(&self) -> ControllerStatus {
        match &self.live {
            Some(switcher) => ControllerStatus {
                open: true,
                mode: Some(switcher.mode()),
                state: Some(switcher.state()),
                current_index: Some(switcher.current_index()),
                window_count: switcher.windows().len(),
                selected_window: switcher.selected_window().map(|w| w.id),
            },
            None => ControllerStatus {
                open: false,
                mode: None,
                state: None,
                current_index: None,
                window_count: 0,
                selected_window: None,
            },
        }
    }

    /// Run a remote command. Returns whether it reached a switcher.
    pub fn execute(
        &mut self,
        host: &mut dyn Host,
        command: RemoteCommand,
    ) -> Result<bool, SwitcherError> {
        match command {
            RemoteCommand::Launch { kind } => self.launch(host, kind),
            RemoteCommand::Next => self.next(host),
            RemoteCommand::Previous => self.previous(host),
            RemoteCommand::Select => self.select(host),
        }
    }

    /// Open a switcher, or step forward if one is already showing.
    pub fn launch(&mut self, host: &mut dyn Host, kind: LaunchKind) -> Result<bool, SwitcherError> {
        self.reap();
        if let Some(switcher) = self.live.as_mut() {
            if switcher.state() != SwitcherState::Closing {
                switcher.next(host)?;
                return Ok(true);
            }
            debug!("Replacing a switcher that is still closing");
            switcher.destroy(host);
            self.live = None;
        }

        let like_windows = self.config.switch_application_behaves_like_switch_windows;
        let (mode, group_by_app) = match kind {
            LaunchKind::Windows => (SwitcherMode::Windows, false),
            LaunchKind::Applications if like_windows => (SwitcherMode::Windows, true),
            LaunchKind::Applications => (SwitcherMode::Applications, false),
        };
        let selection = select_windows(
            host.list_windows(),
            &self.config,
            host.active_workspace(),
            host.active_monitor(),
            group_by_app,
        );
        if selection.windows.is_empty() {
            info!("No windows to switch between");
            return Ok(false);
        }

        let request = OpenRequest::new(selection.windows)
            .with_siblings(selection.siblings)
            .in_mode(mode)
            .with_initial_step(Direction::Next);
        let switcher = Switcher::open(host, self.config.clone(), request)?;
        self.live = Some(switcher);
        self.reap();
        Ok(true)
    }

    pub fn next(&mut self, host: &mut dyn Host) -> Result<bool, SwitcherError> {
        self.with_live(|switcher| switcher.next(host))
    }

    pub fn previous(&mut self, host: &mut dyn Host) -> Result<bool, SwitcherError> {
        self.with_live(|switcher| switcher.previous(host))
    }

    /// Activate the selected window.
    pub fn select(&mut self, host: &mut dyn Host) -> Result<bool, SwitcherError> {
        self.with_live(|switcher| switcher.activate_selected(host))
    }

    /// Close without activating anything.
    pub fn cancel(&mut self, host: &mut dyn Host) -> Result<bool, SwitcherError> {
        self.with_live(|switcher| switcher.activate_without_selection(host))
    }

    pub fn handle_input(
        &mut self,
        host: &mut dyn Host,
        event: InputEvent,
    ) -> Result<bool, SwitcherError> {
        self.with_live(|switcher| switcher.handle_input(host, event))
    }

    pub fn gesture_begin(
        &mut self,
        host: &mut dyn Host,
        progress: f64,
    ) -> Result<bool, SwitcherError> {
        self.with_live(|switcher| switcher.gesture_begin(host, progress))
    }

    pub fn gesture_update(
        &mut self,
        host: &mut dyn Host,
        progress: f64,
    ) -> Result<bool, SwitcherError> {
        self.with_live(|switcher| switcher.gesture_update(host, progress))
    }

    pub fn gesture_end(
        &mut self,
        host: &mut dyn Host,
        progress: f64,
    ) -> Result<bool, SwitcherError> {
        self.with_live(|switcher| switcher.gesture_end(host, progress))
    }

    /// Forward a destroyed-window notification to the live switcher.
    pub fn window_destroyed(&mut self, host: &mut dyn Host, window: WindowId) -> bool {
        let removed = self
            .live
            .as_mut()
            .is_some_and(|switcher| switcher.remove_window(host, window));
        self.reap();
        removed
    }

    pub fn on_tween_complete(&mut self, host: &mut dyn Host, continuation: Continuation) {
        if let Some(switcher) = self.live.as_mut() {
            switcher.on_tween_complete(host, continuation);
        }
        self.reap();
    }

    /// Advance the headless host's animations and route their completions.
    pub fn advance(&mut self, host: &mut HeadlessHost, elapsed_ms: u32) -> usize {
        let completed = host.tweens.tick(elapsed_ms);
        let count = completed.len();
        for continuation in completed {
            self.on_tween_complete(host, continuation);
        }
        count
    }

    fn with_live<F>(&mut self, op: F) -> Result<bool, SwitcherError>
    where
        F: FnOnce(&mut Switcher) -> Result<(), SwitcherError>,
    {
        self.reap();
        let Some(switcher) = self.live.as_mut() else {
            debug!("No live switcher");
            return Ok(false);
        };
        let result = op(switcher);
        self.reap();
        result.map(|()| true)
    }

    /// Drop the switcher once it destroyed itself.
    fn reap(&mut self) {
        if self
            .live
            .as_ref()
            .is_some_and(|s| s.state() == SwitcherState::Destroyed)
        {
            debug!("Releasing destroyed switcher");
            self.live = None;
        }
    }
}
