//! Host boundary.
//!
//! The engine never talks to a compositor directly. Everything it needs from
//! the environment goes through the traits in this module, bundled as [`Host`]
//! and passed to every switcher operation as `&mut dyn Host`.

use serde::{Deserialize, Serialize};

use crate::config::TitlePosition;
use crate::preview::{Effect, IconId, Preview, PreviewId, Transform};
use crate::tween::Easing;
use crate::{AppKey, MonitorId, Rect, Window, WindowId, WorkspaceId};

/// Which switcher in a tree something belongs to.
///
/// The root switcher is `Root`; application sub-switchers are addressed by the
/// application they browse.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Scope {
    Root,
    App(AppKey),
}

/// Something that can be animated.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TweenTarget {
    Preview(PreviewId),
    /// The container holding all previews of one switcher.
    Container(Scope),
}

/// Next step of a chained animation sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Step {
    /// One preview finished the collapse phase of a stack flip.
    FlipOut { preview: PreviewId, generation: u64 },
    /// One preview finished the reveal phase of a stack flip.
    FlipIn { preview: PreviewId, generation: u64 },
    /// A timeline preview faded out at the trailing edge.
    WrapExit { preview: PreviewId },
    /// A timeline preview faded back in at the leading edge.
    WrapEnter { preview: PreviewId },
    /// Removal animation of a vanished window finished.
    Removed { preview: PreviewId },
    /// Closing animation of one preview finished.
    Closed { preview: PreviewId },
    /// Nothing to do.
    Settle,
}

/// Completion token handed back to the owning switcher tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Continuation {
    pub scope: Scope,
    pub step: Step,
}

impl Continuation {
    pub fn new(scope: Scope, step: Step) -> Self {
        Self { scope, step }
    }
}

/// A single animation request.
#[derive(Debug, Clone, PartialEq)]
pub struct Tween {
    pub target: TweenTarget,
    pub to: Transform,
    pub duration_ms: u32,
    pub delay_ms: u32,
    pub easing: Easing,
    pub on_complete: Option<Continuation>,
}

impl Tween {
    pub fn new(target: TweenTarget, to: Transform, duration_ms: u32, easing: Easing) -> Self {
        Self {
            target,
            to,
            duration_ms,
            delay_ms: 0,
            easing,
            on_complete: None,
        }
    }

    pub fn delayed(mut self, delay_ms: u32) -> Self {
        self.delay_ms = delay_ms;
        self
    }

    pub fn then(mut self, continuation: Continuation) -> Self {
        self.on_complete = Some(continuation);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TweenHandle(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GrabHandle(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubscriptionId(pub u64);

/// Host notifications a switcher listens to while it is alive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Signal {
    WindowDestroyed,
    Gestures,
    Input,
}

/// Window inventory and window actions.
pub trait WindowSource {
    fn list_windows(&self) -> Vec<Window>;
    fn active_workspace(&self) -> WorkspaceId;
    fn active_monitor(&self) -> MonitorId;
    /// Geometry of a monitor, if the host knows it.
    fn monitor_rect(&self, monitor: MonitorId) -> Option<Rect>;
    /// Application icon, or `None` when unavailable.
    fn app_icon(&self, app: &AppKey) -> Option<IconId>;
    fn activate(&mut self, window: WindowId);
    fn minimize(&mut self, window: WindowId);
    /// Ask the window to close. Its disappearance is reported later through
    /// the destroyed-window notification.
    fn request_close(&mut self, window: WindowId);
}

/// Time-based animation of transforms.
///
/// Implementations must deliver each tween's continuation exactly once and
/// never from inside `animate` itself. A tween superseded by a newer one on the
/// same target still delivers its continuation; `cancel_all` drops them.
pub trait TweenScheduler {
    fn animate(&mut self, tween: Tween) -> TweenHandle;
    /// Jump to a value without animating.
    fn set(&mut self, target: TweenTarget, value: Transform);
    /// Hard-cancel every tween on `target`, suppressing completions.
    fn cancel_all(&mut self, target: &TweenTarget);
}

/// Exclusive keyboard/pointer grab for the switcher overlay.
pub trait ModalInputGrab {
    fn acquire(&mut self, scope: &Scope) -> Option<GrabHandle>;
    fn release(&mut self, handle: GrabHandle);
}

/// The scene graph the previews live in.
pub trait Scene {
    fn attach_preview(&mut self, container: &Scope, preview: &Preview);
    fn detach_preview(&mut self, preview: PreviewId);
    /// Stacking order of a container, back to front.
    fn restack(&mut self, container: &Scope, order: &[PreviewId]);
    fn set_effect(&mut self, preview: PreviewId, effect: Effect, enabled: bool);
    /// Show a title label, or hide it with `None`.
    fn show_title(&mut self, title: Option<&str>, position: TitlePosition);
    /// Route modal keyboard focus to a container.
    fn focus_container(&mut self, container: &Scope);
}

/// Subscription management for host signals.
pub trait SignalSource {
    fn connect(&mut self, signal: Signal) -> SubscriptionId;
    fn disconnect(&mut self, id: SubscriptionId);
}

/// Everything a switcher needs from its environment.
pub trait Host: WindowSource + TweenScheduler + ModalInputGrab + Scene + SignalSource {}

impl<T> Host for T where T: WindowSource + TweenScheduler + ModalInputGrab + Scene + SignalSource {}
