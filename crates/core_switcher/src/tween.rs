//! Tick-driven tween engine.
//!
//! [`TweenEngine`] is a deterministic [`TweenScheduler`]: nothing moves until
//! the owner calls [`TweenEngine::tick`], which advances every active tween and
//! returns the continuations that became due.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::host::{Continuation, Tween, TweenHandle, TweenScheduler, TweenTarget};
use crate::preview::Transform;

/// Easing curves, named as in the configuration file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Easing {
    Linear,
    EaseInQuad,
    #[default]
    EaseOutQuad,
    EaseInOutQuad,
    EaseInCubic,
    EaseOutCubic,
    EaseInOutCubic,
    EaseInSine,
    EaseOutSine,
    EaseInOutSine,
    EaseOutExpo,
}

impl Easing {
    /// Parse a snake_case easing name.
    pub fn parse(name: &str) -> Option<Self> {
        let easing = match name {
            "linear" => Easing::Linear,
            "ease_in_quad" => Easing::EaseInQuad,
            "ease_out_quad" => Easing::EaseOutQuad,
            "ease_in_out_quad" => Easing::EaseInOutQuad,
            "ease_in_cubic" => Easing::EaseInCubic,
            "ease_out_cubic" => Easing::EaseOutCubic,
            "ease_in_out_cubic" => Easing::EaseInOutCubic,
            "ease_in_sine" => Easing::EaseInSine,
            "ease_out_sine" => Easing::EaseOutSine,
            "ease_in_out_sine" => Easing::EaseInOutSine,
            "ease_out_expo" => Easing::EaseOutExpo,
            _ => return None,
        };
        Some(easing)
    }

    /// Parse a name, falling back to [`Easing::EaseOutQuad`].
    pub fn parse_or_default(name: &str) -> Self {
        Self::parse(name).unwrap_or_else(|| {
            warn!("Unknown easing '{}', using ease_out_quad", name);
            Easing::EaseOutQuad
        })
    }

    /// Map linear progress `t` (0..1) onto the curve.
    pub fn apply(self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Easing::Linear => t,
            Easing::EaseInQuad => t * t,
            Easing::EaseOutQuad => 1.0 - (1.0 - t) * (1.0 - t),
            Easing::EaseInOutQuad => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(2) / 2.0
                }
            }
            Easing::EaseInCubic => t * t * t,
            Easing::EaseOutCubic => 1.0 - (1.0 - t).powi(3),
            Easing::EaseInOutCubic => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
                }
            }
            Easing::EaseInSine => 1.0 - (t * std::f64::consts::PI / 2.0).cos(),
            Easing::EaseOutSine => (t * std::f64::consts::PI / 2.0).sin(),
            Easing::EaseInOutSine => -((std::f64::consts::PI * t).cos() - 1.0) / 2.0,
            Easing::EaseOutExpo => {
                if t >= 1.0 {
                    1.0
                } else {
                    1.0 - 2f64.powf(-10.0 * t)
                }
            }
        }
    }
}

#[derive(Debug)]
struct ActiveTween {
    target: TweenTarget,
    from: Transform,
    to: Transform,
    delay_ms: u32,
    duration_ms: u32,
    elapsed_ms: u32,
    easing: Easing,
    on_complete: Option<Continuation>,
}

/// Deterministic implementation of [`TweenScheduler`].
#[derive(Debug, Default)]
pub struct TweenEngine {
    active: Vec<ActiveTween>,
    values: HashMap<TweenTarget, Transform>,
    /// Completions of superseded tweens, delivered on the next tick.
    ready: Vec<Continuation>,
    next_handle: u64,
}

impl TweenEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// True when no tween is running and no completion is waiting.
    pub fn is_idle(&self) -> bool {
        self.active.is_empty() && self.ready.is_empty()
    }

    /// Number of running tweens.
    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    /// Current value of a target, if it was ever set or animated.
    pub fn value(&self, target: &TweenTarget) -> Option<Transform> {
        self.values.get(target).copied()
    }

    /// Whether a tween is running on `target`.
    pub fn is_animating(&self, target: &TweenTarget) -> bool {
        self.active.iter().any(|t| &t.target == target)
    }

    /// Forget a target entirely. Running tweens on it are cancelled silently.
    pub fn forget(&mut self, target: &TweenTarget) {
        self.active.retain(|t| &t.target != target);
        self.values.remove(target);
    }

    /// Advance time by `elapsed_ms` and collect due continuations, oldest first.
    pub fn tick(&mut self, elapsed_ms: u32) -> Vec<Continuation> {
        let mut done = std::mem::take(&mut self.ready);

        let mut still_running = Vec::with_capacity(self.active.len());
        for mut tween in std::mem::take(&mut self.active) {
            let mut budget = elapsed_ms;
            if tween.delay_ms > 0 {
                let consumed = budget.min(tween.delay_ms);
                tween.delay_ms -= consumed;
                budget -= consumed;
                if tween.delay_ms > 0 {
                    still_running.push(tween);
                    continue;
                }
            }

            tween.elapsed_ms = tween.elapsed_ms.saturating_add(budget);
            let progress = if tween.duration_ms == 0 {
                1.0
            } else {
                (tween.elapsed_ms as f64 / tween.duration_ms as f64).min(1.0)
            };
            let value = tween.from.lerp(&tween.to, tween.easing.apply(progress));
            self.values.insert(tween.target.clone(), value);

            if progress >= 1.0 {
                self.values.insert(tween.target.clone(), tween.to);
                if let Some(continuation) = tween.on_complete.take() {
                    done.push(continuation);
                }
            } else {
                still_running.push(tween);
            }
        }
        self.active = still_running;

        done
    }

    /// Remove the running tween on `target`, keeping its continuation for delivery.
    fn supersede(&mut self, target: &TweenTarget) {
        let mut kept = Vec::with_capacity(self.active.len());
        for mut tween in std::mem::take(&mut self.active) {
            if &tween.target == target {
                if let Some(continuation) = tween.on_complete.take() {
                    self.ready.push(continuation);
                }
            } else {
                kept.push(tween);
            }
        }
        self.active = kept;
    }
}

impl TweenScheduler for TweenEngine {
    fn animate(&mut self, tween: Tween) -> TweenHandle {
        self.supersede(&tween.target);
        self.next_handle += 1;
        let handle = TweenHandle(self.next_handle);
        let from = self.values.get(&tween.target).copied().unwrap_or(tween.to);
        self.active.push(ActiveTween {
            target: tween.target,
            from,
            to: tween.to.clamped(),
            delay_ms: tween.delay_ms,
            duration_ms: tween.duration_ms,
            elapsed_ms: 0,
            easing: tween.easing,
            on_complete: tween.on_complete,
        });
        handle
    }

    fn set(&mut self, target: TweenTarget, value: Transform) {
        self.supersede(&target);
        self.values.insert(target, value.clamped());
    }

    fn cancel_all(&mut self, target: &TweenTarget) {
        self.active.retain(|t| &t.target != target);
    }
}
