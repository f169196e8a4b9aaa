//! The switcher state machine.
//!
//! A [`Switcher`] owns an ordered window list, an index-aligned list of
//! previews and a (possibly fractional) selection position. It turns input
//! into layout passes, submits the resulting tweens to the host and reacts to
//! the continuations that come back.
//!
//! In application mode the root switcher browses one representative window
//! per application and owns a child switcher for every application with more
//! than one window. The root mediates everything: children are only reached
//! through it, and continuations are routed by [`Scope`].

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::{IconStyle, SwitcherConfig, TitlePosition};
use crate::error::SwitcherError;
use crate::host::{
    Continuation, GrabHandle, Host, Scope, Signal, Step, SubscriptionId, Tween, TweenTarget,
};
use crate::preview::{DeferredTween, Effect, LoopPhase, Preview, PreviewId, StackOrder, Transform};
use crate::strategy::{
    LayoutContext, LayoutStrategy, Placement, Position, PreviewPlan, Staged, Strategy,
};
use crate::tween::Easing;
use crate::{AppKey, Rect, Window, WindowId, WorkspaceId};

mod apps;
mod closing;
mod gesture;
mod input;
mod navigation;

pub use apps::ChildTransition;
pub use input::{InputEvent, KeyAction, ScrollDirection};

/// Lifecycle state, derived from the switcher's flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SwitcherState {
    Initializing,
    Idle,
    Gesturing,
    Looping,
    Closing,
    Destroyed,
}

impl SwitcherState {
    pub fn name(self) -> &'static str {
        match self {
            SwitcherState::Initializing => "initializing",
            SwitcherState::Idle => "idle",
            SwitcherState::Gesturing => "gesturing",
            SwitcherState::Looping => "looping",
            SwitcherState::Closing => "closing",
            SwitcherState::Destroyed => "destroyed",
        }
    }

    /// Idle, gesturing or looping.
    pub fn is_active(self) -> bool {
        matches!(
            self,
            SwitcherState::Idle | SwitcherState::Gesturing | SwitcherState::Looping
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Next,
    Previous,
}

impl Direction {
    pub fn sign(self) -> f64 {
        match self {
            Direction::Next => 1.0,
            Direction::Previous => -1.0,
        }
    }
}

/// What the navigable list contains.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SwitcherMode {
    /// Every window is navigable.
    #[default]
    Windows,
    /// One representative per application, with sub-switchers.
    Applications,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CloseReason {
    ActivateSelected,
    NoActivation,
}

/// Everything needed to open a switcher.
#[derive(Debug, Clone, PartialEq)]
pub struct OpenRequest {
    /// Navigable windows, already ordered.
    pub windows: Vec<Window>,
    /// Windows that get a preview but are not navigable.
    pub siblings: Vec<Window>,
    pub start_index: usize,
    pub mode: SwitcherMode,
    /// Step taken right after opening to highlight the first item.
    pub initial_step: Option<Direction>,
}

impl OpenRequest {
    pub fn new(windows: Vec<Window>) -> Self {
        Self {
            windows,
            siblings: Vec::new(),
            start_index: 0,
            mode: SwitcherMode::Windows,
            initial_step: None,
        }
    }

    pub fn with_siblings(mut self, siblings: Vec<Window>) -> Self {
        self.siblings = siblings;
        self
    }

    pub fn starting_at(mut self, index: usize) -> Self {
        self.start_index = index;
        self
    }

    pub fn in_mode(mut self, mode: SwitcherMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_initial_step(mut self, direction: Direction) -> Self {
        self.initial_step = Some(direction);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FlipPhase {
    Collapsing,
    Revealing,
}

/// Bookkeeping of an in-flight stack flip.
#[derive(Debug, Clone)]
struct FlipState {
    generation: u64,
    phase: FlipPhase,
    outstanding: HashSet<PreviewId>,
    reveal_from: HashMap<PreviewId, Staged>,
    target_index: usize,
}

#[derive(Debug, Clone, PartialEq)]
struct GestureSession {
    start: f64,
    /// Which switcher of the tree the gesture scrubs.
    driver: Scope,
}

/// Animated, navigable carousel of window previews.
#[derive(Debug)]
pub struct Switcher {
    scope: Scope,
    /// Non-owning link to the owning switcher.
    parent: Option<Scope>,
    mode: SwitcherMode,
    config: Arc<SwitcherConfig>,
    strategy: Strategy,
    ctx: LayoutContext,
    easing: Easing,
    active_workspace: WorkspaceId,

    windows: Vec<Window>,
    previews: Vec<Preview>,
    /// Non-navigable previews: siblings, and children's previews adopted while closing.
    extras: Vec<(Window, Preview)>,
    /// Previews playing their removal animation.
    removing: Vec<Preview>,
    stack: StackOrder,

    current_index: f64,
    previous_index: f64,

    children: BTreeMap<AppKey, Switcher>,
    transition: Option<ChildTransition>,
    focus: Scope,

    grab: Option<GrabHandle>,
    subscriptions: Vec<SubscriptionId>,

    opened: bool,
    looping: bool,
    pending_update: bool,
    flip: Option<FlipState>,
    flip_generation: u64,
    gesture: Option<GestureSession>,

    closing: bool,
    close_reason: Option<CloseReason>,
    closing_outstanding: HashSet<PreviewId>,
    destroyed: bool,

    rng: fastrand::Rng,
    layout_passes: u64,
}

impl Switcher {
    /// Open a root switcher and present it.
    ///
    /// If the modal input grab is denied the switcher activates the initial
    /// selection right away and starts closing.
    pub fn open(
        host: &mut dyn Host,
        config: Arc<SwitcherConfig>,
        request: OpenRequest,
    ) -> Result<Switcher, SwitcherError> {
        if request.windows.is_empty() {
            return Err(SwitcherError::EmptyWindowList);
        }

        let monitor = host.active_monitor();
        let stage = host.monitor_rect(monitor).unwrap_or_else(|| {
            warn!("No geometry for monitor {}, using fallback stage", monitor);
            Rect::fallback_stage()
        });

        let mut groups: Vec<(AppKey, Vec<Window>)> = Vec::new();
        let navigable = match request.mode {
            SwitcherMode::Windows => request.windows,
            SwitcherMode::Applications => {
                for window in request.windows {
                    match groups.iter_mut().find(|(app, _)| *app == window.app) {
                        Some((_, members)) => members.push(window),
                        None => groups.push((window.app.clone(), vec![window])),
                    }
                }
                groups.iter().map(|(_, members)| members[0].clone()).collect()
            }
        };
        if request.start_index >= navigable.len() {
            return Err(SwitcherError::StartIndexOutOfBounds(
                request.start_index,
                navigable.len(),
            ));
        }

        let mut switcher = Switcher::new(
            Scope::Root,
            None,
            request.mode,
            config,
            stage,
            host.active_workspace(),
        );
        switcher.populate(host, navigable, request.siblings);

        for (app, members) in groups {
            if members.len() > 1 {
                let child = switcher.build_child(host, app.clone(), members);
                switcher.children.insert(app, child);
            }
        }
        host.set(
            TweenTarget::Container(Scope::Root),
            switcher.container_transform(0.0),
        );

        switcher.grab = host.acquire(&Scope::Root);
        for signal in [Signal::WindowDestroyed, Signal::Gestures, Signal::Input] {
            switcher.subscriptions.push(host.connect(signal));
        }

        let start = request.start_index;
        switcher.current_index = start as f64;
        switcher.previous_index = start as f64;
        switcher.opened = true;

        if let Some(direction) = request.initial_step {
            switcher.current_index =
                step_index(start, switcher.windows.len(), direction) as f64;
        }
        switcher.apply_layout(host, None, true);
        let selected = switcher.selected_index().unwrap_or(0);
        switcher.after_root_move(host, start, selected);

        info!(
            "Opened {:?} switcher with {} entries ({} siblings, {} sub-switchers) using {}",
            switcher.mode,
            switcher.windows.len(),
            switcher.extras.len(),
            switcher.children.len(),
            switcher.strategy.name()
        );

        if switcher.grab.is_none() {
            warn!("Modal input grab denied, activating the current selection");
            switcher.animate_closed(host, CloseReason::ActivateSelected);
        }

        Ok(switcher)
    }

    fn new(
        scope: Scope,
        parent: Option<Scope>,
        mode: SwitcherMode,
        config: Arc<SwitcherConfig>,
        stage: Rect,
        active_workspace: WorkspaceId,
    ) -> Self {
        let rng = match config.random_seed {
            Some(seed) => fastrand::Rng::with_seed(seed),
            None => fastrand::Rng::new(),
        };
        Self {
            focus: Scope::Root,
            parent,
            mode,
            strategy: Strategy::from_config(&config),
            ctx: LayoutContext::new(stage, &config),
            easing: config.easing(),
            config,
            active_workspace,
            windows: Vec::new(),
            previews: Vec::new(),
            extras: Vec::new(),
            removing: Vec::new(),
            stack: StackOrder::new(),
            current_index: 0.0,
            previous_index: 0.0,
            children: BTreeMap::new(),
            transition: None,
            grab: None,
            subscriptions: Vec::new(),
            opened: false,
            looping: false,
            pending_update: false,
            flip: None,
            flip_generation: 0,
            gesture: None,
            closing: false,
            close_reason: None,
            closing_outstanding: HashSet::new(),
            destroyed: false,
            rng,
            layout_passes: 0,
            scope,
        }
    }

    /// Create previews over their windows and attach them to this switcher's container.
    fn populate(&mut self, host: &mut dyn Host, windows: Vec<Window>, siblings: Vec<Window>) {
        for window in siblings {
            let mut preview = self.make_preview(host, &window);
            preview.set_transform(Transform::over_frame(window.frame).with_opacity(0.0));
            host.set(TweenTarget::Preview(preview.id()), preview.transform());
            preview.make_bottom_layer(&mut self.stack);
            self.extras.push((window, preview));
        }
        for window in windows {
            let preview = self.make_preview(host, &window);
            host.set(TweenTarget::Preview(preview.id()), preview.transform());
            self.stack.push(preview.id());
            self.windows.push(window);
            self.previews.push(preview);
        }
    }

    fn make_preview(&self, host: &mut dyn Host, window: &Window) -> Preview {
        let icon = host.app_icon(&window.app);
        if icon.is_none() && self.config.icon_style != IconStyle::Classic {
            debug!("No icon for {}, using placeholder", window.app);
        }
        let mut preview = Preview::new(window, self.ctx.stage, &self.config, icon);
        host.attach_preview(&self.scope, &preview);
        if window.minimized && preview.enable_effect(Effect::Desaturate) {
            host.set_effect(preview.id(), Effect::Desaturate, true);
        }
        preview
    }

    // --- accessors ---

    pub fn state(&self) -> SwitcherState {
        if self.destroyed {
            SwitcherState::Destroyed
        } else if self.closing {
            SwitcherState::Closing
        } else if !self.opened {
            SwitcherState::Initializing
        } else if self.gesture.is_some() {
            SwitcherState::Gesturing
        } else if self.looping {
            SwitcherState::Looping
        } else {
            SwitcherState::Idle
        }
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    pub fn parent(&self) -> Option<&Scope> {
        self.parent.as_ref()
    }

    pub fn mode(&self) -> SwitcherMode {
        self.mode
    }

    pub fn config(&self) -> &SwitcherConfig {
        &self.config
    }

    pub fn strategy(&self) -> &Strategy {
        &self.strategy
    }

    pub fn current_index(&self) -> f64 {
        self.current_index
    }

    pub fn windows(&self) -> &[Window] {
        &self.windows
    }

    pub fn previews(&self) -> &[Preview] {
        &self.previews
    }

    /// Every preview this switcher owns, navigable or not.
    pub fn all_previews(&self) -> impl Iterator<Item = &Preview> {
        self.previews
            .iter()
            .chain(self.extras.iter().map(|(_, preview)| preview))
            .chain(self.removing.iter())
    }

    pub fn is_looping(&self) -> bool {
        self.looping
    }

    pub fn has_pending_update(&self) -> bool {
        self.pending_update
    }

    pub fn close_reason(&self) -> Option<CloseReason> {
        self.close_reason
    }

    /// Number of full layout passes applied so far.
    pub fn layout_passes(&self) -> u64 {
        self.layout_passes
    }

    pub fn children(&self) -> impl Iterator<Item = (&AppKey, &Switcher)> {
        self.children.iter()
    }

    pub fn child(&self, app: &AppKey) -> Option<&Switcher> {
        self.children.get(app)
    }

    /// Which switcher of the tree holds the modal focus.
    pub fn focus(&self) -> &Scope {
        &self.focus
    }

    pub fn transition(&self) -> Option<&ChildTransition> {
        self.transition.as_ref()
    }

    pub fn has_grab(&self) -> bool {
        self.grab.is_some()
    }

    /// Index of the highlighted entry, if any.
    pub fn selected_index(&self) -> Option<usize> {
        let len = self.windows.len();
        if len == 0 {
            return None;
        }
        Some(self.current_index.round().max(0.0) as usize % len)
    }

    /// The window that would be activated right now.
    pub fn selected_window(&self) -> Option<&Window> {
        if let Scope::App(app) = &self.focus {
            if let Some(child) = self.children.get(app) {
                return child.selected_window();
            }
        }
        self.selected_index().and_then(|i| self.windows.get(i))
    }

    fn index_of(&self, window: WindowId) -> Option<usize> {
        self.windows.iter().position(|w| w.id == window)
    }

    fn contains(&self, window: WindowId) -> bool {
        self.index_of(window).is_some()
    }

    // --- guards ---

    fn ensure_alive(&self) -> Result<(), SwitcherError> {
        if self.destroyed {
            Err(SwitcherError::Destroyed)
        } else {
            Ok(())
        }
    }

    /// Discrete navigation requires an open switcher that is not closing or scrubbing.
    fn ensure_navigable(&self, op: &'static str) -> Result<(), SwitcherError> {
        self.ensure_alive()?;
        match self.state() {
            SwitcherState::Idle | SwitcherState::Looping => Ok(()),
            state => Err(SwitcherError::InvalidState { op, state }),
        }
    }

    // --- layout ---

    /// Animation duration for one preview, randomized when configured.
    fn duration(&mut self) -> u32 {
        let base = self.ctx.duration_ms;
        if self.config.randomize_animation_times {
            let factor = 0.5 + 0.5 * self.rng.f64();
            (base as f64 * factor).round() as u32
        } else {
            base
        }
    }

    /// Lay out every navigable preview for the current position.
    ///
    /// While a stack flip is in flight the pass is deferred; several deferred
    /// requests collapse into one pass once the flip completes.
    fn apply_layout(&mut self, host: &mut dyn Host, stepping: Option<Direction>, animate: bool) {
        if self.looping {
            if !self.pending_update {
                debug!("Deferring layout of {:?} until the wrap finishes", self.scope);
            }
            self.pending_update = true;
            return;
        }
        if self.previews.is_empty() {
            return;
        }

        self.layout_passes += 1;
        let position = Position {
            current: self.current_index,
            previous: self.previous_index,
            stepping,
        };
        let placements = self.strategy.layout(&self.previews, &position, &self.ctx);
        for (index, placement) in placements.iter().enumerate() {
            if animate {
                let duration = self.duration();
                self.submit(host, index, placement.plan, duration);
            } else {
                let preview = &mut self.previews[index];
                let to = placement.target();
                preview.set_transform(to);
                host.set(TweenTarget::Preview(preview.id()), to);
            }
        }

        self.restack(host, &placements);
        self.refresh_effects(host);
        self.previous_index = self.current_index;
    }

    /// Submit one preview's plan, deferring it if the preview is mid-wrap.
    fn submit(&mut self, host: &mut dyn Host, index: usize, plan: PreviewPlan, duration_ms: u32) {
        let scope = self.scope.clone();
        let easing = self.easing;
        let preview = &mut self.previews[index];
        let id = preview.id();
        let target = TweenTarget::Preview(id);

        if preview.is_looping() {
            let to = match plan {
                PreviewPlan::Move(to) => to,
                PreviewPlan::Wrap { enter, .. } => enter,
            };
            preview.final_tween = Some(DeferredTween { to, duration_ms });
            return;
        }

        match plan {
            PreviewPlan::Move(to) => {
                preview.set_transform(to);
                host.animate(Tween::new(target, to, duration_ms, easing));
            }
            PreviewPlan::Wrap {
                exit,
                relocate,
                enter,
            } => {
                let half = (duration_ms / 2).max(1);
                preview.looping = Some(LoopPhase::Exiting {
                    relocate,
                    enter,
                    duration_ms: half,
                });
                preview.final_tween = None;
                preview.set_transform(exit);
                host.animate(
                    Tween::new(target, exit, half, easing)
                        .then(Continuation::new(scope, Step::WrapExit { preview: id })),
                );
            }
        }
    }

    /// Rebuild the stacking order from placement depths, selection on top.
    fn restack(&mut self, host: &mut dyn Host, placements: &[Placement]) {
        let mut order: Vec<usize> = (0..placements.len()).collect();
        order.sort_by_key(|&i| placements[i].depth);

        self.stack = StackOrder::new();
        for &i in &order {
            self.stack.push(self.previews[i].id());
        }
        if let Some(selected) = self.selected_index() {
            self.previews[selected].make_top_layer(&mut self.stack);
        }
        for (_, preview) in &self.extras {
            preview.make_bottom_layer(&mut self.stack);
        }
        host.restack(&self.scope, self.stack.order());
    }

    /// Tint every preview except the selection when dimming is configured.
    fn refresh_effects(&mut self, host: &mut dyn Host) {
        let dim = self.config.dim_factor < 1.0;
        let selected = self.selected_index();
        for (index, preview) in self.previews.iter_mut().enumerate() {
            let wanted = dim && Some(index) != selected;
            if wanted && !preview.selection_tint {
                preview.selection_tint = true;
                if preview.enable_effect(Effect::Tint) {
                    host.set_effect(preview.id(), Effect::Tint, true);
                }
            } else if !wanted && preview.selection_tint {
                preview.selection_tint = false;
                if preview.disable_effect(Effect::Tint) {
                    host.set_effect(preview.id(), Effect::Tint, false);
                }
            }
        }
    }

    /// Show the selected window's title. Only the root owns the label.
    fn refresh_title(&self, host: &mut dyn Host) {
        if self.parent.is_some() {
            return;
        }
        let position = self.config.title_position;
        if position == TitlePosition::Hidden || self.closing {
            host.show_title(None, position);
            return;
        }
        let title = self.selected_window().map(|w| w.title.as_str());
        host.show_title(title, position);
    }

    /// Replay the current layout with a short settle animation.
    fn reaffirm(&mut self, host: &mut dyn Host) {
        let placements = self
            .strategy
            .layout(&self.previews, &Position::at(self.current_index), &self.ctx);
        let duration = (self.ctx.duration_ms / 2).max(1);
        for (preview, placement) in self.previews.iter_mut().zip(&placements) {
            let to = placement.target();
            preview.set_transform(to);
            host.animate(
                Tween::new(TweenTarget::Preview(preview.id()), to, duration, self.easing)
                    .then(Continuation::new(self.scope.clone(), Step::Settle)),
            );
        }
        debug!("Re-affirmed single entry of {:?}", self.scope);
    }

    /// Stop every animation on the navigable previews, discarding their completions.
    fn cancel_tweens(&mut self, host: &mut dyn Host) {
        for preview in &mut self.previews {
            host.cancel_all(&TweenTarget::Preview(preview.id()));
            preview.looping = None;
            preview.final_tween = None;
        }
    }

    // --- continuations ---

    /// Feed a delivered continuation back into the tree.
    pub fn on_tween_complete(&mut self, host: &mut dyn Host, continuation: Continuation) {
        if self.destroyed {
            return;
        }
        if continuation.scope == self.scope {
            self.handle_step(host, continuation.step);
            return;
        }
        if let Scope::App(app) = &continuation.scope {
            if let Some(child) = self.children.get_mut(app) {
                child.handle_step(host, continuation.step);
                return;
            }
        }
        debug!("Dropping stale continuation {:?}", continuation);
    }

    fn handle_step(&mut self, host: &mut dyn Host, step: Step) {
        match step {
            Step::FlipOut {
                preview,
                generation,
            } => self.flip_progress(host, preview, generation, FlipPhase::Collapsing),
            Step::FlipIn {
                preview,
                generation,
            } => self.flip_progress(host, preview, generation, FlipPhase::Revealing),
            Step::WrapExit { preview } => self.wrap_exit_finished(host, preview),
            Step::WrapEnter { preview } => self.wrap_enter_finished(host, preview),
            Step::Removed { preview } => {
                if let Some(pos) = self.removing.iter().position(|p| p.id() == preview) {
                    self.removing.remove(pos);
                    host.detach_preview(preview);
                }
            }
            Step::Closed { preview } => {
                if self.closing_outstanding.remove(&preview)
                    && self.closing_outstanding.is_empty()
                {
                    debug!("Closing animation of {:?} finished", self.scope);
                    self.destroy(host);
                }
            }
            Step::Settle => {}
        }
    }

    /// Timeline preview faded out: jump to the re-entry point and fade in.
    fn wrap_exit_finished(&mut self, host: &mut dyn Host, id: PreviewId) {
        let scope = self.scope.clone();
        let easing = self.easing;
        let Some(preview) = self.previews.iter_mut().find(|p| p.id() == id) else {
            return;
        };
        let Some(LoopPhase::Exiting {
            relocate,
            enter,
            duration_ms,
        }) = preview.looping
        else {
            return;
        };

        let target = TweenTarget::Preview(id);
        host.set(target.clone(), relocate);
        preview.looping = Some(LoopPhase::Entering);
        preview.set_transform(enter);
        host.animate(
            Tween::new(target, enter, duration_ms, easing)
                .then(Continuation::new(scope, Step::WrapEnter { preview: id })),
        );
    }

    /// Timeline wrap done: replay whatever layout arrived in the meantime.
    fn wrap_enter_finished(&mut self, host: &mut dyn Host, id: PreviewId) {
        let easing = self.easing;
        let Some(preview) = self.previews.iter_mut().find(|p| p.id() == id) else {
            return;
        };
        if preview.looping != Some(LoopPhase::Entering) {
            return;
        }
        preview.looping = None;
        if let Some(deferred) = preview.final_tween.take() {
            preview.set_transform(deferred.to);
            host.animate(Tween::new(
                TweenTarget::Preview(id),
                deferred.to,
                deferred.duration_ms,
                easing,
            ));
        }
    }

    // --- teardown ---

    /// Tear everything down. Safe to call more than once.
    pub fn destroy(&mut self, host: &mut dyn Host) {
        if self.destroyed {
            return;
        }

        let ids: Vec<PreviewId> = self.all_previews().map(|p| p.id()).collect();
        for id in ids {
            host.cancel_all(&TweenTarget::Preview(id));
            host.detach_preview(id);
        }
        host.cancel_all(&TweenTarget::Container(self.scope.clone()));

        if let Some(grab) = self.grab.take() {
            host.release(grab);
        }
        for subscription in self.subscriptions.drain(..) {
            host.disconnect(subscription);
        }
        for child in self.children.values_mut() {
            child.destroy(host);
        }
        self.children.clear();
        if self.parent.is_none() {
            host.show_title(None, self.config.title_position);
        }

        self.windows.clear();
        self.previews.clear();
        self.extras.clear();
        self.removing.clear();
        self.stack = StackOrder::new();
        self.flip = None;
        self.looping = false;
        self.pending_update = false;
        self.gesture = None;
        self.transition = None;
        self.closing_outstanding.clear();
        self.destroyed = true;
        info!("Destroyed switcher {:?}", self.scope);
    }
}

/// Index one step away from `from` in a list of `len`, wrapping around.
pub(crate) fn step_index(from: usize, len: usize, direction: Direction) -> usize {
    if len == 0 {
        return 0;
    }
    match direction {
        Direction::Next => (from + 1) % len,
        Direction::Previous => (from + len - 1) % len,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headless::HeadlessHost;

    fn windows(n: u64) -> Vec<Window> {
        (1..=n)
            .map(|id| Window::new(id, format!("Window {}", id), format!("app{}", id)))
            .collect()
    }

    #[test]
    fn test_step_index_wraps() {
        assert_eq!(step_index(2, 3, Direction::Next), 0);
        assert_eq!(step_index(0, 3, Direction::Previous), 2);
        assert_eq!(step_index(0, 1, Direction::Next), 0);
        assert_eq!(step_index(0, 0, Direction::Next), 0);
    }

    #[test]
    fn test_open_rejects_empty_list() {
        let mut host = HeadlessHost::new();
        let result = Switcher::open(&mut host, Arc::default(), OpenRequest::new(Vec::new()));
        assert_eq!(result.err(), Some(SwitcherError::EmptyWindowList));
    }

    #[test]
    fn test_open_rejects_bad_start_index() {
        let mut host = HeadlessHost::new();
        let result = Switcher::open(
            &mut host,
            Arc::default(),
            OpenRequest::new(windows(2)).starting_at(2),
        );
        assert_eq!(result.err(), Some(SwitcherError::StartIndexOutOfBounds(2, 2)));
    }

    #[test]
    fn test_open_is_idle_and_aligned() {
        let mut host = HeadlessHost::new();
        let switcher = Switcher::open(
            &mut host,
            Arc::default(),
            OpenRequest::new(windows(3)).with_initial_step(Direction::Next),
        )
        .unwrap();
        assert_eq!(switcher.state(), SwitcherState::Idle);
        assert_eq!(switcher.current_index(), 1.0);
        assert_eq!(switcher.windows().len(), switcher.previews().len());
        for (window, preview) in switcher.windows().iter().zip(switcher.previews()) {
            assert_eq!(window.id, preview.window());
        }
        assert!(switcher.has_grab());
        assert_eq!(host.attached_count(), 3);
        assert_eq!(host.title(), Some("Window 2"));
    }

    #[test]
    fn test_siblings_get_hidden_previews() {
        let mut host = HeadlessHost::new();
        let sibling = Window::new(9, "Elsewhere", "other").with_workspace(3);
        let switcher = Switcher::open(
            &mut host,
            Arc::default(),
            OpenRequest::new(windows(2)).with_siblings(vec![sibling]),
        )
        .unwrap();
        assert_eq!(switcher.previews().len(), 2);
        assert_eq!(switcher.all_previews().count(), 3);
        assert_eq!(host.attached_count(), 3);
    }

    #[test]
    fn test_denied_grab_activates_selection() {
        let mut host = HeadlessHost::new();
        host.deny_grabs(true);
        let switcher = Switcher::open(
            &mut host,
            Arc::default(),
            OpenRequest::new(windows(3)).with_initial_step(Direction::Next),
        )
        .unwrap();
        assert_eq!(switcher.state(), SwitcherState::Closing);
        assert_eq!(switcher.close_reason(), Some(CloseReason::ActivateSelected));
        assert_eq!(host.requests().activate, vec![2]);
    }

    #[test]
    fn test_dimming_tints_unselected_previews() {
        let mut host = HeadlessHost::new();
        let config = SwitcherConfig {
            dim_factor: 0.5,
            ..Default::default()
        };
        let mut switcher =
            Switcher::open(&mut host, Arc::new(config), OpenRequest::new(windows(3))).unwrap();
        let ids: Vec<PreviewId> = switcher.previews().iter().map(|p| p.id()).collect();
        assert!(!host.has_effect(ids[0], Effect::Tint));
        assert!(host.has_effect(ids[1], Effect::Tint));
        assert!(host.has_effect(ids[2], Effect::Tint));

        switcher.next(&mut host).unwrap();
        assert!(host.has_effect(ids[0], Effect::Tint));
        assert!(!host.has_effect(ids[1], Effect::Tint));
    }

    #[test]
    fn test_minimized_windows_are_desaturated() {
        let mut host = HeadlessHost::new();
        let mut list = windows(2);
        list[1] = list[1].clone().minimized();
        let switcher = Switcher::open(&mut host, Arc::default(), OpenRequest::new(list)).unwrap();
        assert!(host.has_effect(switcher.previews()[1].id(), Effect::Desaturate));
        assert!(!host.has_effect(switcher.previews()[0].id(), Effect::Desaturate));
    }

    #[test]
    fn test_selected_preview_is_on_top() {
        let mut host = HeadlessHost::new();
        let mut switcher =
            Switcher::open(&mut host, Arc::default(), OpenRequest::new(windows(3))).unwrap();
        switcher.next(&mut host).unwrap();
        let top = host.stack(&Scope::Root).last().copied();
        assert_eq!(top, Some(switcher.previews()[1].id()));
    }

    #[test]
    fn test_randomized_durations_stay_in_range() {
        let config = Arc::new(SwitcherConfig {
            randomize_animation_times: true,
            random_seed: Some(7),
            ..Default::default()
        });
        let mut switcher = Switcher::new(
            Scope::Root,
            None,
            SwitcherMode::Windows,
            config,
            Rect::fallback_stage(),
            0,
        );
        for _ in 0..100 {
            let d = switcher.duration();
            assert!((100..=200).contains(&d), "{}", d);
        }
    }

    #[test]
    fn test_destroy_tears_down() {
        let mut host = HeadlessHost::new();
        let mut switcher =
            Switcher::open(&mut host, Arc::default(), OpenRequest::new(windows(3))).unwrap();
        assert_eq!(host.subscription_count(), 3);

        switcher.destroy(&mut host);
        assert_eq!(switcher.state(), SwitcherState::Destroyed);
        assert_eq!(host.subscription_count(), 0);
        assert_eq!(host.attached_count(), 0);
        assert!(!host.grab_held());
        assert_eq!(switcher.next(&mut host), Err(SwitcherError::Destroyed));

        // Second destroy is a no-op
        switcher.destroy(&mut host);
        assert_eq!(switcher.state(), SwitcherState::Destroyed);
    }
}
