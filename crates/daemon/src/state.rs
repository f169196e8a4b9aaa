//! Daemon state: the switcher controller, its host and the loaded configuration.

use std::collections::HashSet;

use coverswitch_core::headless::HeadlessHost;
use coverswitch_core::{
    AppKey, Controller, InputEvent, KeyAction, LaunchKind, Rect, SwitcherError, SwitcherMode,
    Window, WindowSource,
};
use coverswitch_ipc::{GesturePhase, IpcCommand, IpcResponse, IpcRect, LaunchTarget, WindowInfo};
use tracing::{debug, info, warn};

use crate::config::{Config, RuleSet};

/// Everything the event loop mutates.
pub struct AppState {
    pub config: Config,
    controller: Controller,
    host: HeadlessHost,
    rules: RuleSet,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let (rules, warnings) = RuleSet::compile(&config.window_rules);
        for w in &warnings {
            warn!("Config: {} - {}", w.field, w.message);
        }
        Self {
            controller: Controller::new(config.switcher.clone()),
            host: HeadlessHost::new(),
            rules,
            config,
        }
    }

    /// Whether any animation is still running.
    pub fn is_animating(&self) -> bool {
        !self.host.tweens.is_idle()
    }

    /// Advance animations and route completions. Returns whether more ticks are needed.
    pub fn tick_animations(&mut self, elapsed_ms: u32) -> bool {
        let completed = self.controller.advance(&mut self.host, elapsed_ms);
        if completed > 0 {
            debug!("{} animation(s) completed", completed);
        }
        self.is_animating()
    }

    pub fn handle_command(&mut self, cmd: IpcCommand) -> IpcResponse {
        match cmd {
            IpcCommand::Launch { target } => {
                let kind = match target {
                    LaunchTarget::Windows => LaunchKind::Windows,
                    LaunchTarget::Applications => LaunchKind::Applications,
                };
                let result = self.controller.launch(&mut self.host, kind);
                outcome(result, "No windows to switch between")
            }
            IpcCommand::Next => outcome(self.controller.next(&mut self.host), NOT_OPEN),
            IpcCommand::Previous => outcome(self.controller.previous(&mut self.host), NOT_OPEN),
            IpcCommand::Select => outcome(self.controller.select(&mut self.host), NOT_OPEN),
            IpcCommand::Cancel => outcome(self.controller.cancel(&mut self.host), NOT_OPEN),
            IpcCommand::Key { action } => {
                let action: KeyAction =
                    match serde_json::from_value(serde_json::Value::String(action.clone())) {
                        Ok(action) => action,
                        Err(_) => {
                            return IpcResponse::error(format!("Unknown key action: {}", action));
                        }
                    };
                let result = self.controller.handle_input(&mut self.host, InputEvent::Key(action));
                outcome(result, NOT_OPEN)
            }
            IpcCommand::ModifiersReleased => {
                let result = self
                    .controller
                    .handle_input(&mut self.host, InputEvent::ModifiersReleased);
                outcome(result, NOT_OPEN)
            }
            IpcCommand::Gesture { phase, progress } => {
                if !progress.is_finite() {
                    return IpcResponse::error("Gesture progress must be a finite number");
                }
                let result = match phase {
                    GesturePhase::Begin => self.controller.gesture_begin(&mut self.host, progress),
                    GesturePhase::Update => {
                        self.controller.gesture_update(&mut self.host, progress)
                    }
                    GesturePhase::End => self.controller.gesture_end(&mut self.host, progress),
                };
                outcome(result, NOT_OPEN)
            }
            IpcCommand::SyncWindows { windows } => {
                self.sync_windows(windows);
                IpcResponse::Ok
            }
            IpcCommand::WindowDestroyed { window_id } => {
                let known = self.host.remove_window(window_id);
                let removed = self.controller.window_destroyed(&mut self.host, window_id);
                if known || removed {
                    IpcResponse::Ok
                } else {
                    IpcResponse::ignored(format!("Unknown window {}", window_id))
                }
            }
            IpcCommand::SetWorkspace { workspace } => {
                self.host.set_active_workspace(workspace);
                IpcResponse::Ok
            }
            IpcCommand::SetMonitor { monitor, rect } => {
                if rect.width <= 0 || rect.height <= 0 {
                    return IpcResponse::error(format!(
                        "Invalid monitor size {}x{}",
                        rect.width, rect.height
                    ));
                }
                self.host.set_monitor(monitor, to_rect(rect));
                IpcResponse::Ok
            }
            IpcCommand::Query => self.query(),
            IpcCommand::DrainRequests => {
                let requests = self.host.take_requests();
                IpcResponse::HostRequests {
                    activate: requests.activate,
                    minimize: requests.minimize,
                    close: requests.close,
                }
            }
            IpcCommand::Reload => match Config::load() {
                Ok(config) => {
                    self.apply_config(config);
                    IpcResponse::Ok
                }
                Err(e) => IpcResponse::error(format!("Failed to reload config: {:#}", e)),
            },
            IpcCommand::Stop => IpcResponse::Ok,
        }
    }

    /// Install a new configuration. A switcher already showing keeps the old one.
    pub fn apply_config(&mut self, mut config: Config) {
        for w in config.validate() {
            warn!("Config: {} - {}", w.field, w.message);
        }
        let (rules, warnings) = RuleSet::compile(&config.window_rules);
        for w in &warnings {
            warn!("Config: {} - {}", w.field, w.message);
        }
        self.rules = rules;
        self.controller.set_config(config.switcher.clone());
        self.config = config;
        info!("Configuration reloaded ({} window rules)", self.rules.len());
    }

    /// Replace the window inventory, dropping ignored windows.
    ///
    /// Windows missing from the new inventory are treated as destroyed.
    fn sync_windows(&mut self, windows: Vec<WindowInfo>) {
        let before: HashSet<u64> = self.host.list_windows().iter().map(|w| w.id).collect();

        let kept: Vec<Window> = windows
            .into_iter()
            .filter(|info| {
                let ignored = self.rules.is_ignored(&info.title, &info.app);
                if ignored {
                    debug!("Ignoring window {} ({}) per window rules", info.window_id, info.title);
                }
                !ignored
            })
            .map(to_window)
            .collect();
        let after: HashSet<u64> = kept.iter().map(|w| w.id).collect();
        debug!("Synced {} windows", kept.len());
        self.host.set_windows(kept);

        let mut vanished: Vec<u64> = before.difference(&after).copied().collect();
        vanished.sort_unstable();
        for id in vanished {
            self.controller.window_destroyed(&mut self.host, id);
        }
    }

    fn query(&self) -> IpcResponse {
        let status = self.controller.status();
        IpcResponse::SwitcherState {
            open: status.open,
            mode: status.mode.map(|mode| {
                match mode {
                    SwitcherMode::Windows => "windows",
                    SwitcherMode::Applications => "applications",
                }
                .to_string()
            }),
            state: status.state.map(|state| state.name().to_string()),
            current_index: status.current_index,
            window_count: status.window_count,
            selected_window: status.selected_window,
        }
    }
}

const NOT_OPEN: &str = "Switcher is not open";

/// Map a controller result onto a response.
fn outcome(result: Result<bool, SwitcherError>, ignored: &str) -> IpcResponse {
    match result {
        Ok(true) => IpcResponse::Ok,
        Ok(false) => IpcResponse::ignored(ignored),
        Err(e) => {
            warn!("Switcher error: {}", e);
            IpcResponse::error(e.to_string())
        }
    }
}

fn to_rect(rect: IpcRect) -> Rect {
    Rect::new(rect.x, rect.y, rect.width, rect.height)
}

fn to_window(info: WindowInfo) -> Window {
    Window {
        id: info.window_id,
        title: info.title,
        minimized: info.minimized,
        workspace: info.workspace,
        monitor: info.monitor,
        app: AppKey::new(info.app),
        focus_timestamp: info.focus_timestamp,
        transient_for: info.transient_for,
        frame: to_rect(info.rect),
    }
}
