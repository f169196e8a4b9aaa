//! In-memory host.
//!
//! [`HeadlessHost`] keeps the window inventory, scene state and requested
//! window actions in plain collections and runs animations on a
//! [`TweenEngine`]. The daemon uses it as its scene model; tests use it to
//! observe what a switcher asked of its environment.

use std::collections::{HashMap, HashSet};

use serde::Serialize;
use tracing::{debug, trace};

use crate::config::TitlePosition;
use crate::host::{
    GrabHandle, ModalInputGrab, Scene, Scope, Signal, SignalSource, SubscriptionId, Tween,
    TweenHandle, TweenScheduler, TweenTarget, WindowSource,
};
use crate::preview::{Effect, IconId, Preview, PreviewId, Transform};
use crate::switcher::Switcher;
use crate::tween::TweenEngine;
use crate::{AppKey, MonitorId, Rect, Window, WindowId, WorkspaceId};

/// Upper bound for [`HeadlessHost::settle`], in simulated milliseconds.
const SETTLE_LIMIT_MS: u32 = 60_000;

/// Frame length used when settling animations.
pub const FRAME_MS: u32 = 16;

/// Window actions a switcher requested, in order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HostRequests {
    pub activate: Vec<WindowId>,
    pub minimize: Vec<WindowId>,
    pub close: Vec<WindowId>,
}

impl HostRequests {
    pub fn is_empty(&self) -> bool {
        self.activate.is_empty() && self.minimize.is_empty() && self.close.is_empty()
    }
}

#[derive(Debug)]
pub struct HeadlessHost {
    pub tweens: TweenEngine,

    windows: Vec<Window>,
    active_workspace: WorkspaceId,
    active_monitor: MonitorId,
    monitors: HashMap<MonitorId, Rect>,
    icons: HashMap<AppKey, IconId>,
    focus_clock: u64,

    deny_grabs: bool,
    grab: Option<GrabHandle>,
    next_grab: u64,

    subscriptions: HashSet<SubscriptionId>,
    next_subscription: u64,

    attached: HashMap<PreviewId, Scope>,
    stacks: HashMap<Scope, Vec<PreviewId>>,
    effects: HashSet<(PreviewId, Effect)>,
    title: Option<String>,
    title_position: TitlePosition,
    focus: Option<Scope>,

    requests: HostRequests,
}

impl Default for HeadlessHost {
    fn default() -> Self {
        Self::new()
    }
}

impl HeadlessHost {
    /// Host with one full-HD monitor and no windows.
    pub fn new() -> Self {
        let mut monitors = HashMap::new();
        monitors.insert(0, Rect::fallback_stage());
        Self {
            tweens: TweenEngine::new(),
            windows: Vec::new(),
            active_workspace: 0,
            active_monitor: 0,
            monitors,
            icons: HashMap::new(),
            focus_clock: 0,
            deny_grabs: false,
            grab: None,
            next_grab: 0,
            subscriptions: HashSet::new(),
            next_subscription: 0,
            attached: HashMap::new(),
            stacks: HashMap::new(),
            effects: HashSet::new(),
            title: None,
            title_position: TitlePosition::default(),
            focus: None,
            requests: HostRequests::default(),
        }
    }

    pub fn with_windows(mut self, windows: Vec<Window>) -> Self {
        self.set_windows(windows);
        self
    }

    /// Replace the whole window inventory.
    pub fn set_windows(&mut self, windows: Vec<Window>) {
        self.focus_clock = windows
            .iter()
            .map(|w| w.focus_timestamp)
            .max()
            .unwrap_or(0)
            .max(self.focus_clock);
        self.windows = windows;
    }

    pub fn window(&self, id: WindowId) -> Option<&Window> {
        self.windows.iter().find(|w| w.id == id)
    }

    /// Drop a window from the inventory. Returns false if it was unknown.
    pub fn remove_window(&mut self, id: WindowId) -> bool {
        let before = self.windows.len();
        self.windows.retain(|w| w.id != id);
        self.windows.len() != before
    }

    pub fn set_active_workspace(&mut self, workspace: WorkspaceId) {
        self.active_workspace = workspace;
    }

    /// Register a monitor's geometry and make it the active one.
    pub fn set_monitor(&mut self, monitor: MonitorId, rect: Rect) {
        self.monitors.insert(monitor, rect);
        self.active_monitor = monitor;
    }

    pub fn set_icon(&mut self, app: AppKey, icon: IconId) {
        self.icons.insert(app, icon);
    }

    /// Make every following grab request fail (or succeed again).
    pub fn deny_grabs(&mut self, deny: bool) {
        self.deny_grabs = deny;
    }

    pub fn requests(&self) -> &HostRequests {
        &self.requests
    }

    pub fn take_requests(&mut self) -> HostRequests {
        std::mem::take(&mut self.requests)
    }

    /// Number of previews currently in the scene.
    pub fn attached_count(&self) -> usize {
        self.attached.len()
    }

    pub fn is_attached(&self, preview: PreviewId) -> bool {
        self.attached.contains_key(&preview)
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn title_position(&self) -> TitlePosition {
        self.title_position
    }

    pub fn has_effect(&self, preview: PreviewId, effect: Effect) -> bool {
        self.effects.contains(&(preview, effect))
    }

    /// Stacking order of a container, back to front.
    pub fn stack(&self, container: &Scope) -> &[PreviewId] {
        self.stacks.get(container).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn subscription_count(&self) -> usize {
        self.subscriptions.len()
    }

    pub fn grab_held(&self) -> bool {
        self.grab.is_some()
    }

    /// Container holding the modal focus, if any was routed.
    pub fn focus(&self) -> Option<&Scope> {
        self.focus.as_ref()
    }

    /// Current transform of a preview or container.
    pub fn transform(&self, target: &TweenTarget) -> Option<Transform> {
        self.tweens.value(target)
    }

    /// Advance animations and feed completions back into `switcher`.
    pub fn advance(&mut self, switcher: &mut Switcher, elapsed_ms: u32) {
        for continuation in self.tweens.tick(elapsed_ms) {
            switcher.on_tween_complete(self, continuation);
        }
    }

    /// Run frames until no animation is left. Returns the simulated time.
    pub fn settle(&mut self, switcher: &mut Switcher) -> u32 {
        let mut elapsed = 0;
        while !self.tweens.is_idle() && elapsed < SETTLE_LIMIT_MS {
            self.advance(switcher, FRAME_MS);
            elapsed += FRAME_MS;
        }
        elapsed
    }
}

impl WindowSource for HeadlessHost {
    fn list_windows(&self) -> Vec<Window> {
        self.windows.clone()
    }

    fn active_workspace(&self) -> WorkspaceId {
        self.active_workspace
    }

    fn active_monitor(&self) -> MonitorId {
        self.active_monitor
    }

    fn monitor_rect(&self, monitor: MonitorId) -> Option<Rect> {
        self.monitors.get(&monitor).copied()
    }

    fn app_icon(&self, app: &AppKey) -> Option<IconId> {
        self.icons.get(app).copied()
    }

    fn activate(&mut self, window: WindowId) {
        self.requests.activate.push(window);
        self.focus_clock += 1;
        let stamp = self.focus_clock;
        if let Some(w) = self.windows.iter_mut().find(|w| w.id == window) {
            w.minimized = false;
            w.focus_timestamp = stamp;
        }
        debug!("Activated window {}", window);
    }

    fn minimize(&mut self, window: WindowId) {
        self.requests.minimize.push(window);
        if let Some(w) = self.windows.iter_mut().find(|w| w.id == window) {
            w.minimized = true;
        }
    }

    fn request_close(&mut self, window: WindowId) {
        self.requests.close.push(window);
    }
}

impl TweenScheduler for HeadlessHost {
    fn animate(&mut self, tween: Tween) -> TweenHandle {
        self.tweens.animate(tween)
    }

    fn set(&mut self, target: TweenTarget, value: Transform) {
        self.tweens.set(target, value);
    }

    fn cancel_all(&mut self, target: &TweenTarget) {
        self.tweens.cancel_all(target);
    }
}

impl ModalInputGrab for HeadlessHost {
    fn acquire(&mut self, scope: &Scope) -> Option<GrabHandle> {
        if self.deny_grabs || self.grab.is_some() {
            debug!("Denying modal grab for {:?}", scope);
            return None;
        }
        self.next_grab += 1;
        let handle = GrabHandle(self.next_grab);
        self.grab = Some(handle);
        Some(handle)
    }

    fn release(&mut self, handle: GrabHandle) {
        if self.grab == Some(handle) {
            self.grab = None;
        }
    }
}

impl Scene for HeadlessHost {
    fn attach_preview(&mut self, container: &Scope, preview: &Preview) {
        trace!("Attaching {:?} to {:?}", preview.id(), container);
        self.attached.insert(preview.id(), container.clone());
        self.stacks
            .entry(container.clone())
            .or_default()
            .push(preview.id());
    }

    fn detach_preview(&mut self, preview: PreviewId) {
        if let Some(container) = self.attached.remove(&preview) {
            if let Some(stack) = self.stacks.get_mut(&container) {
                stack.retain(|id| *id != preview);
            }
        }
        self.effects.retain(|(id, _)| *id != preview);
        self.tweens.forget(&TweenTarget::Preview(preview));
    }

    fn restack(&mut self, container: &Scope, order: &[PreviewId]) {
        self.stacks.insert(container.clone(), order.to_vec());
    }

    fn set_effect(&mut self, preview: PreviewId, effect: Effect, enabled: bool) {
        if enabled {
            self.effects.insert((preview, effect));
        } else {
            self.effects.remove(&(preview, effect));
        }
    }

    fn show_title(&mut self, title: Option<&str>, position: TitlePosition) {
        self.title = title.map(str::to_string);
        self.title_position = position;
    }

    fn focus_container(&mut self, container: &Scope) {
        self.focus = Some(container.clone());
    }
}

impl SignalSource for HeadlessHost {
    fn connect(&mut self, signal: Signal) -> SubscriptionId {
        self.next_subscription += 1;
        let id = SubscriptionId(self.next_subscription);
        trace!("Connected {:?} as {:?}", signal, id);
        self.subscriptions.insert(id);
        id
    }

    fn disconnect(&mut self, id: SubscriptionId) {
        self.subscriptions.remove(&id);
    }
}
