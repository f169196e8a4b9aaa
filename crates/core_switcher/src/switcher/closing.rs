//! Window removal, activation and the closing animation.

use std::collections::HashSet;

use tracing::{debug, info};

use super::{CloseReason, Switcher};
use crate::error::SwitcherError;
use crate::host::{Continuation, Host, Scope, Step, Tween, TweenTarget};
use crate::preview::{Effect, Preview, Transform};
use crate::{Window, WindowId};

impl Switcher {
    /// Drop a window that vanished from the host.
    ///
    /// Returns false when the window is not tracked, so repeated calls are
    /// harmless. Removing the last navigable window closes the switcher.
    pub fn remove_window(&mut self, host: &mut dyn Host, window: WindowId) -> bool {
        if self.destroyed {
            return false;
        }
        if self.closing {
            return self.remove_while_closing(host, window);
        }

        let mut removed = false;
        if let Some(pos) = self.extras.iter().position(|(w, _)| w.id == window) {
            let (_, preview) = self.extras.remove(pos);
            self.stack.remove(preview.id());
            host.cancel_all(&TweenTarget::Preview(preview.id()));
            host.detach_preview(preview.id());
            removed = true;
        }

        // Application mode: the window may live in a sub-switcher too.
        let mut replacement = None;
        let owner = self
            .children
            .iter()
            .find(|(_, child)| child.contains(window))
            .map(|(app, _)| app.clone());
        if let Some(app) = owner {
            if let Some(child) = self.children.get_mut(&app) {
                child.remove_local(host, window);
                replacement = child.windows.first().cloned();
                if child.windows.len() <= 1 {
                    self.dissolve_child(host, &app);
                }
            }
            removed = true;
        }

        if let Some(index) = self.index_of(window) {
            match replacement {
                Some(next) if self.parent.is_none() => self.promote(host, index, next),
                _ => {
                    self.remove_local(host, window);
                }
            }
            removed = true;
        }

        if removed && !self.closing && !self.destroyed {
            self.settle_on_selection(host);
            self.refresh_title(host);
        }
        removed
    }

    /// Remove an entry of this switcher's own list and repair the selection.
    pub(super) fn remove_local(&mut self, host: &mut dyn Host, window: WindowId) -> bool {
        let Some(index) = self.index_of(window) else {
            return false;
        };
        self.windows.remove(index);
        let preview = self.previews.remove(index);
        let id = preview.id();
        self.stack.remove(id);

        let len = self.windows.len();
        if len > 0 {
            // Entries before the selection shift it down; at or after it the
            // selection stays, wrapped into the shorter list.
            if (index as f64) < self.current_index.floor() {
                self.current_index -= 1.0;
            }
            if self.current_index >= len as f64 && self.gesture.is_none() {
                self.current_index = self.current_index.rem_euclid(len as f64);
            }
            self.current_index = self.current_index.min(len as f64);
            self.previous_index = self.current_index;
        }

        if let Some(flip) = self.flip.as_mut() {
            flip.outstanding.remove(&id);
            flip.reveal_from.remove(&id);
            if index < flip.target_index {
                flip.target_index -= 1;
            }
        }

        debug!("Removed window {} at index {} from {:?}", window, index, self.scope);
        self.play_removal(host, preview);

        if len == 0 {
            self.abort_flip();
            if self.parent.is_none() {
                info!("Last window removed, closing");
                self.animate_closed(host, CloseReason::NoActivation);
            }
            return true;
        }

        if self.flip.is_some() {
            self.advance_flip(host);
        }
        let animate = self.gesture.is_none();
        self.apply_layout(host, None, animate);
        true
    }

    /// Replace a root representative by another window of the same application.
    fn promote(&mut self, host: &mut dyn Host, index: usize, window: Window) {
        let mut preview = self.make_preview(host, &window);
        let at = self.previews[index].transform();
        preview.set_transform(at);
        host.set(TweenTarget::Preview(preview.id()), at);
        self.stack.push(preview.id());
        let old = std::mem::replace(&mut self.previews[index], preview);
        self.stack.remove(old.id());
        debug!(
            "Window {} now represents {} in place of {}",
            window.id,
            window.app,
            self.windows[index].id
        );
        self.windows[index] = window;
        self.play_removal(host, old);
        let animate = self.gesture.is_none();
        self.apply_layout(host, None, animate);
    }

    /// Short glitch-and-vanish animation for a preview whose window is gone.
    fn play_removal(&mut self, host: &mut dyn Host, mut preview: Preview) {
        let id = preview.id();
        if preview.enable_effect(Effect::Glitch) {
            host.set_effect(id, Effect::Glitch, true);
        }
        let to = preview.transform().with_scale(0.0).with_opacity(0.0);
        preview.set_transform(to);
        preview.looping = None;
        preview.final_tween = None;
        let duration = (self.ctx.duration_ms / 2).max(1);
        host.animate(
            Tween::new(TweenTarget::Preview(id), to, duration, self.easing)
                .then(Continuation::new(self.scope.clone(), Step::Removed { preview: id })),
        );
        self.removing.push(preview);
    }

    /// Drop every closing preview of `window`. An application representative
    /// can own two: its root preview and the one adopted from its sub-switcher.
    fn remove_while_closing(&mut self, host: &mut dyn Host, window: WindowId) -> bool {
        let mut gone = Vec::new();
        while let Some(index) = self.index_of(window) {
            self.windows.remove(index);
            gone.push(self.previews.remove(index));
        }
        let (dropped, kept) = std::mem::take(&mut self.extras)
            .into_iter()
            .partition::<Vec<_>, _>(|(w, _)| w.id == window);
        self.extras = kept;
        gone.extend(dropped.into_iter().map(|(_, preview)| preview));
        if gone.is_empty() {
            return false;
        }

        let mut finished = false;
        for preview in gone {
            let id = preview.id();
            host.cancel_all(&TweenTarget::Preview(id));
            host.detach_preview(id);
            self.stack.remove(id);
            finished |= self.closing_outstanding.remove(&id);
        }
        debug!("Removed window {} while closing {:?}", window, self.scope);
        if finished && self.closing_outstanding.is_empty() {
            self.destroy(host);
        }
        true
    }

    /// Close and activate the selected window.
    pub fn activate_selected(&mut self, host: &mut dyn Host) -> Result<(), SwitcherError> {
        self.ensure_alive()?;
        self.animate_closed(host, CloseReason::ActivateSelected);
        Ok(())
    }

    /// Close without activating anything.
    pub fn activate_without_selection(&mut self, host: &mut dyn Host) -> Result<(), SwitcherError> {
        self.ensure_alive()?;
        self.animate_closed(host, CloseReason::NoActivation);
        Ok(())
    }

    /// Minimize every tracked window, then close.
    pub fn show_desktop(&mut self, host: &mut dyn Host) -> Result<(), SwitcherError> {
        self.ensure_alive()?;
        if self.closing {
            return Ok(());
        }
        self.minimize_all(host);
        self.animate_closed(host, CloseReason::NoActivation);
        Ok(())
    }

    fn minimize_all(&mut self, host: &mut dyn Host) {
        let mut minimized = HashSet::new();
        let windows = self
            .windows
            .iter_mut()
            .chain(self.extras.iter_mut().map(|(window, _)| window))
            .chain(
                self.children
                    .values_mut()
                    .flat_map(|child| child.windows.iter_mut()),
            );
        for window in windows {
            if !window.minimized && minimized.insert(window.id) {
                host.minimize(window.id);
            }
            window.minimized = true;
        }
        debug!("Minimized {} windows", minimized.len());
    }

    /// Play the closing animation and destroy once every preview finished.
    ///
    /// Only the first call has an effect.
    pub fn animate_closed(&mut self, host: &mut dyn Host, reason: CloseReason) {
        if self.closing || self.destroyed {
            return;
        }
        let selected = self.selected_window().map(|w| w.id);
        self.closing = true;
        self.close_reason = Some(reason);
        self.abort_flip();
        self.gesture = None;
        info!("Closing switcher {:?} ({:?})", self.scope, reason);

        if reason == CloseReason::ActivateSelected {
            if let Some(id) = selected {
                host.activate(id);
            }
        }
        if let Some(grab) = self.grab.take() {
            host.release(grab);
        }
        self.refresh_title(host);

        // Children do not close on their own; their previews finish here.
        for (_, mut child) in std::mem::take(&mut self.children) {
            self.extras.extend(child.surrender_previews());
            child.destroy(host);
        }

        let stage = self.ctx.stage;
        let vanish = Transform::at(stage.x as f64, stage.y as f64)
            .with_scale(0.0)
            .with_opacity(0.0);
        let mut closing = Vec::new();
        for (window, preview) in self
            .windows
            .iter()
            .zip(self.previews.iter_mut())
            .chain(self.extras.iter_mut().map(|(w, p)| (&*w, p)))
        {
            let returns = reason == CloseReason::ActivateSelected
                && !window.minimized
                && window.workspace == self.active_workspace;
            let to = if returns {
                Transform::over_frame(window.frame)
            } else {
                vanish
            };
            preview.set_transform(to);
            closing.push((preview.id(), to));
        }

        for (id, to) in closing {
            let duration = self.duration();
            host.animate(
                Tween::new(TweenTarget::Preview(id), to, duration, self.easing)
                    .then(Continuation::new(self.scope.clone(), Step::Closed { preview: id })),
            );
            self.closing_outstanding.insert(id);
        }
        host.animate(Tween::new(
            TweenTarget::Container(Scope::Root),
            self.container_transform(0.0),
            self.ctx.duration_ms,
            self.easing,
        ));

        if self.closing_outstanding.is_empty() {
            self.destroy(host);
        }
    }

    /// Hand every preview over to the parent, leaving this switcher empty.
    fn surrender_previews(&mut self) -> Vec<(Window, Preview)> {
        let mut surrendered: Vec<(Window, Preview)> = self
            .windows
            .drain(..)
            .zip(self.previews.drain(..))
            .collect();
        surrendered.append(&mut self.extras);
        surrendered
    }
}
