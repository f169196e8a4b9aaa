//! Application sub-switchers.
//!
//! Moving the root selection onto or away from an application with several
//! windows cross-fades that application's child container while the root
//! container shrinks to make room.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{step_index, Direction, Switcher, SwitcherMode};
use crate::error::SwitcherError;
use crate::host::{Continuation, Host, Scope, Step, Tween, TweenTarget};
use crate::preview::Transform;
use crate::{AppKey, Window};

/// How much the root container shrinks when a child is fully shown.
const ROOM_SCALE: f64 = 0.4;
/// Vertical shift of the root container when a child is fully shown, relative to stage height.
const ROOM_SHIFT: f64 = 0.25;
/// Vertical position of child containers below the stage center, relative to stage height.
const CHILD_DROP: f64 = 0.15;

/// Cross-fade between the sub-switchers of two root entries.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChildTransition {
    pub from: usize,
    pub to: usize,
    /// 0.0 shows `from`, 1.0 shows `to`.
    pub progress: f64,
}

impl ChildTransition {
    /// Progress of a fractional root position between `from` and `to`.
    pub fn progress_between(current: f64, from: usize, to: usize) -> f64 {
        if from == to {
            return 1.0;
        }
        ((current - from as f64) / (to as f64 - from as f64)).clamp(0.0, 1.0)
    }
}

impl Switcher {
    /// Build the hidden child switcher for one application.
    pub(super) fn build_child(
        &mut self,
        host: &mut dyn Host,
        app: AppKey,
        windows: Vec<Window>,
    ) -> Switcher {
        let scope = Scope::App(app);
        let mut child = Switcher::new(
            scope.clone(),
            Some(self.scope.clone()),
            SwitcherMode::Windows,
            self.config.clone(),
            self.ctx.stage,
            self.active_workspace,
        );
        child.populate(host, windows, Vec::new());
        child.opened = true;
        child.apply_layout(host, None, false);
        host.set(TweenTarget::Container(scope), self.child_container_transform(0.0));
        debug!("Built sub-switcher with {} windows", child.windows.len());
        child
    }

    /// Root container transform with `room` (0..1) made for a child.
    pub(super) fn container_transform(&self, room: f64) -> Transform {
        let stage = self.ctx.stage;
        Transform::at(
            stage.center_x(),
            stage.center_y() - stage.height as f64 * ROOM_SHIFT * room,
        )
        .with_scale(1.0 - ROOM_SCALE * room)
    }

    fn child_container_transform(&self, visibility: f64) -> Transform {
        let stage = self.ctx.stage;
        Transform::at(
            stage.center_x(),
            stage.center_y() + stage.height as f64 * CHILD_DROP,
        )
        .with_scale(visibility)
        .with_opacity(visibility)
    }

    /// Application of a root entry, if that application has a sub-switcher.
    fn child_app(&self, index: usize) -> Option<&AppKey> {
        let app = &self.windows.get(index)?.app;
        self.children.contains_key(app).then_some(app)
    }

    /// Focus owner when the root selection rests on `index`.
    pub(super) fn scope_for_index(&self, index: usize) -> Scope {
        match self.child_app(index) {
            Some(app) => Scope::App(app.clone()),
            None => Scope::Root,
        }
    }

    /// Drive the cross-fade between the children of root entries `from` and `to`.
    ///
    /// With a duration the change is animated, otherwise it is applied at once
    /// (gesture frames).
    pub(super) fn stage_transition(
        &mut self,
        host: &mut dyn Host,
        from: usize,
        to: usize,
        progress: f64,
        duration_ms: Option<u32>,
    ) {
        let progress = if from == to { 1.0 } else { progress.clamp(0.0, 1.0) };
        let from_app = if from == to { None } else { self.child_app(from).cloned() };
        let to_app = self.child_app(to).cloned();

        let room = from_app.as_ref().map_or(0.0, |_| 1.0 - progress)
            + to_app.as_ref().map_or(0.0, |_| progress);
        let root = self.container_transform(room);
        self.submit_container(host, Scope::Root, root, duration_ms);

        let apps: Vec<AppKey> = self.children.keys().cloned().collect();
        for app in apps {
            let visibility = if Some(&app) == to_app.as_ref() {
                progress
            } else if Some(&app) == from_app.as_ref() {
                1.0 - progress
            } else {
                0.0
            };
            let transform = self.child_container_transform(visibility);
            self.submit_container(host, Scope::App(app), transform, duration_ms);
        }

        self.transition = Some(ChildTransition { from, to, progress });
    }

    fn submit_container(
        &mut self,
        host: &mut dyn Host,
        scope: Scope,
        transform: Transform,
        duration_ms: Option<u32>,
    ) {
        let target = TweenTarget::Container(scope);
        match duration_ms {
            Some(duration) => {
                host.animate(
                    Tween::new(target, transform, duration, self.easing)
                        .then(Continuation::new(self.scope.clone(), Step::Settle)),
                );
            }
            None => host.set(target, transform),
        }
    }

    pub(super) fn set_focus(&mut self, host: &mut dyn Host, scope: Scope) {
        if self.focus == scope {
            return;
        }
        debug!("Modal focus {:?} -> {:?}", self.focus, scope);
        self.focus = scope;
        host.focus_container(&self.focus);
    }

    /// Re-settle transition and focus on the current root selection.
    pub(super) fn settle_on_selection(&mut self, host: &mut dyn Host) {
        if self.parent.is_some() || (self.children.is_empty() && self.transition.is_none()) {
            return;
        }
        let Some(selected) = self.selected_index() else {
            return;
        };
        let duration = self.ctx.duration_ms;
        self.stage_transition(host, selected, selected, 1.0, Some(duration));
        let scope = self.scope_for_index(selected);
        self.set_focus(host, scope);
    }

    /// Tear down a child that no longer has more than one window.
    pub(super) fn dissolve_child(&mut self, host: &mut dyn Host, app: &AppKey) {
        let Some(mut child) = self.children.remove(app) else {
            return;
        };
        debug!("Dissolving sub-switcher of {}", app);
        child.destroy(host);
        if self.focus == Scope::App(app.clone()) {
            self.set_focus(host, Scope::Root);
        }
    }

    /// Step within the windows of the selected application.
    ///
    /// In application mode this drives the focused sub-switcher; in window
    /// mode it jumps to the next window sharing the selection's application.
    pub(super) fn step_within_app(
        &mut self,
        host: &mut dyn Host,
        direction: Direction,
    ) -> Result<(), SwitcherError> {
        if let Scope::App(app) = self.focus.clone() {
            if let Some(child) = self.children.get_mut(&app) {
                child.step(host, direction)?;
                self.refresh_title(host);
                return Ok(());
            }
        }

        let len = self.windows.len();
        let Some(from) = self.selected_index() else {
            return Ok(());
        };
        let app = self.windows[from].app.clone();
        let mut index = from;
        for _ in 1..len {
            index = step_index(index, len, direction);
            if self.windows[index].app == app {
                return self.select(host, index);
            }
        }
        debug!("No other window of {} to step to", app);
        Ok(())
    }
}
