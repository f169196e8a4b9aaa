//! Continuous gesture scrubbing.
//!
//! Gesture progress sets the selection position directly. A sub-switcher
//! scrubbed past either end pre-stages the root's move to the neighboring
//! application so the cross-fade follows the finger.

use tracing::debug;

use super::{step_index, ChildTransition, Direction, GestureSession, Switcher};
use crate::error::SwitcherError;
use crate::host::{Host, Scope, TweenTarget};
use crate::AppKey;

/// Overshoot at which a gesture ending beyond a sub-switcher commits to the neighbor.
const COMMIT_THRESHOLD: f64 = 0.5;

impl Switcher {
    /// Start a gesture. Any running animation, a stack flip included, is
    /// cancelled so the gesture has sole control.
    pub fn gesture_begin(
        &mut self,
        host: &mut dyn Host,
        progress: f64,
    ) -> Result<(), SwitcherError> {
        self.ensure_navigable("gesture_begin")?;

        let driver = match &self.focus {
            Scope::App(app) if self.children.contains_key(app) => self.focus.clone(),
            _ => Scope::Root,
        };
        if let Scope::App(app) = &driver {
            if let Some(child) = self.children.get_mut(app) {
                child.seize(host, progress, driver.clone());
            }
        }
        self.seize(host, progress, driver);
        debug!("Gesture began at {}", progress);
        Ok(())
    }

    /// Take manual control of this switcher's previews and containers.
    fn seize(&mut self, host: &mut dyn Host, start: f64, driver: Scope) {
        self.abort_flip();
        self.cancel_tweens(host);
        host.cancel_all(&TweenTarget::Container(self.scope.clone()));
        for app in self.children.keys() {
            host.cancel_all(&TweenTarget::Container(Scope::App(app.clone())));
        }
        self.gesture = Some(GestureSession { start, driver });
    }

    pub fn gesture_update(
        &mut self,
        host: &mut dyn Host,
        progress: f64,
    ) -> Result<(), SwitcherError> {
        let session = self.gesture_session("gesture_update")?;
        let position = self.mirror(&session, progress);

        match &session.driver {
            Scope::App(app) => {
                let overshoot = match self.children.get_mut(app) {
                    Some(child) => child.scrub_bounded(host, position),
                    None => 0.0,
                };
                self.stage_overshoot(host, app.clone(), overshoot);
            }
            Scope::Root => self.scrub_ring(host, position),
        }
        Ok(())
    }

    /// Finish a gesture: snap to the nearest entry and settle any transition.
    pub fn gesture_end(&mut self, host: &mut dyn Host, progress: f64) -> Result<(), SwitcherError> {
        let session = self.gesture_session("gesture_end")?;
        let position = self.mirror(&session, progress);
        self.gesture = None;

        match &session.driver {
            Scope::App(app) => self.end_in_child(host, app.clone(), position),
            Scope::Root => {
                let len = self.windows.len();
                let from = (session.start.round().max(0.0) as usize) % len.max(1);
                let snapped = if len == 0 {
                    0
                } else {
                    (position.rem_euclid(len as f64).round() as usize) % len
                };
                self.current_index = snapped as f64;
                self.apply_layout(host, None, true);
                // Focus moves only now, never mid-scrub.
                self.after_root_move(host, from, snapped);
            }
        }
        debug!("Gesture ended at {}", self.current_index);
        Ok(())
    }

    fn gesture_session(&self, op: &'static str) -> Result<GestureSession, SwitcherError> {
        self.ensure_alive()?;
        match (&self.gesture, self.closing) {
            (Some(session), false) => Ok(session.clone()),
            _ => Err(SwitcherError::InvalidState {
                op,
                state: self.state(),
            }),
        }
    }

    /// Apply `invert_swipes` by mirroring progress around the gesture start.
    fn mirror(&self, session: &GestureSession, progress: f64) -> f64 {
        if self.config.invert_swipes {
            2.0 * session.start - progress
        } else {
            progress
        }
    }

    /// Parentless scrub: the list is a ring, progress wraps modulo its length.
    fn scrub_ring(&mut self, host: &mut dyn Host, position: f64) {
        let len = self.windows.len();
        if len == 0 {
            return;
        }
        let current = position.rem_euclid(len as f64);
        self.current_index = current;
        self.apply_layout(host, None, false);

        if !self.children.is_empty() {
            let from = current.floor() as usize % len;
            let to = step_index(from, len, Direction::Next);
            let progress = ChildTransition::progress_between(current, from, from + 1);
            self.stage_transition(host, from, to, progress, None);
        }
    }

    /// Sub-switcher scrub. Returns how far progress went beyond the list:
    /// positive past the last entry, negative before the first.
    fn scrub_bounded(&mut self, host: &mut dyn Host, position: f64) -> f64 {
        let len = self.windows.len();
        if len == 0 {
            return 0.0;
        }
        let last = (len - 1) as f64;
        let overshoot = if position > last {
            position - last
        } else if position < 0.0 {
            position
        } else {
            0.0
        };
        // `len` itself is allowed as the wrap sentinel.
        self.current_index = position.clamp(0.0, len as f64);
        self.apply_layout(host, None, false);
        overshoot
    }

    /// Pre-stage the root's move away from `app` while its child is overscrolled.
    fn stage_overshoot(&mut self, host: &mut dyn Host, app: AppKey, overshoot: f64) {
        let len = self.windows.len();
        let Some(rep) = self.windows.iter().position(|w| w.app == app) else {
            return;
        };
        let amount = overshoot.abs().min(1.0);
        let direction = if overshoot < 0.0 {
            Direction::Previous
        } else {
            Direction::Next
        };
        let neighbor = step_index(rep, len, direction);

        self.current_index = (rep as f64 + direction.sign() * amount).rem_euclid(len as f64);
        self.apply_layout(host, None, false);
        if amount > 0.0 {
            self.stage_transition(host, rep, neighbor, amount, None);
        } else {
            self.stage_transition(host, rep, rep, 1.0, None);
        }
    }

    /// End of a gesture that scrubbed a sub-switcher.
    fn end_in_child(&mut self, host: &mut dyn Host, app: AppKey, position: f64) {
        let len = self.windows.len();
        let rep = self.windows.iter().position(|w| w.app == app).unwrap_or(0);

        let overshoot = match self.children.get_mut(&app) {
            Some(child) => {
                child.gesture = None;
                let last = child.windows.len().saturating_sub(1) as f64;
                let overshoot = if position > last {
                    position - last
                } else if position < 0.0 {
                    position
                } else {
                    0.0
                };
                if overshoot.abs() >= COMMIT_THRESHOLD {
                    child.current_index = 0.0;
                } else {
                    child.current_index = position.clamp(0.0, last).round();
                }
                child.apply_layout(host, None, true);
                overshoot
            }
            None => 0.0,
        };

        if overshoot.abs() >= COMMIT_THRESHOLD && len > 1 {
            let direction = if overshoot < 0.0 {
                Direction::Previous
            } else {
                Direction::Next
            };
            let target = step_index(rep, len, direction);
            debug!("Gesture left sub-switcher of {} towards entry {}", app, target);
            self.current_index = target as f64;
            self.apply_layout(host, None, true);
            self.after_root_move(host, rep, target);
        } else {
            self.current_index = rep as f64;
            self.apply_layout(host, None, true);
            self.after_root_move(host, rep, rep);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::config::SwitcherConfig;
    use crate::headless::HeadlessHost;
    use crate::switcher::OpenRequest;
    use crate::Window;

    fn open(host: &mut HeadlessHost, config: SwitcherConfig, n: u64) -> Switcher {
        let windows = (1..=n)
            .map(|id| Window::new(id, format!("Window {}", id), format!("app{}", id)))
            .collect();
        Switcher::open(host, Arc::new(config), OpenRequest::new(windows)).unwrap()
    }

    fn session(start: f64) -> GestureSession {
        GestureSession {
            start,
            driver: Scope::Root,
        }
    }

    #[test]
    fn test_mirror_reflects_around_start() {
        let mut host = HeadlessHost::new();
        let config = SwitcherConfig {
            invert_swipes: true,
            ..Default::default()
        };
        let switcher = open(&mut host, config, 3);
        assert_eq!(switcher.mirror(&session(2.0), 2.5), 1.5);
        assert_eq!(switcher.mirror(&session(2.0), 1.0), 3.0);
        assert_eq!(switcher.mirror(&session(2.0), 2.0), 2.0);
    }

    #[test]
    fn test_mirror_passes_through_by_default() {
        let mut host = HeadlessHost::new();
        let switcher = open(&mut host, SwitcherConfig::default(), 3);
        assert_eq!(switcher.mirror(&session(2.0), 2.5), 2.5);
    }

    #[test]
    fn test_update_without_begin_is_rejected() {
        let mut host = HeadlessHost::new();
        let mut switcher = open(&mut host, SwitcherConfig::default(), 3);
        assert!(matches!(
            switcher.gesture_update(&mut host, 1.0),
            Err(SwitcherError::InvalidState { op: "gesture_update", .. })
        ));
        assert!(switcher.gesture_end(&mut host, 1.0).is_err());
    }

    #[test]
    fn test_scrub_bounded_reports_overshoot() {
        let mut host = HeadlessHost::new();
        let mut switcher = open(&mut host, SwitcherConfig::default(), 3);
        assert_eq!(switcher.scrub_bounded(&mut host, 2.75), 0.75);
        assert_eq!(switcher.current_index(), 2.75);
        assert_eq!(switcher.scrub_bounded(&mut host, -0.25), -0.25);
        assert_eq!(switcher.current_index(), 0.0);
        assert_eq!(switcher.scrub_bounded(&mut host, 1.5), 0.0);
        assert_eq!(switcher.current_index(), 1.5);
    }
}
