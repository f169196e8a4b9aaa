//! Window previews.
//!
//! A [`Preview`] is the animatable stand-in for one window. It owns a single
//! [`Transform`], an optional overlay icon bound to that transform, and
//! reference counts for shared visual effects.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

use crate::config::{IconStyle, SwitcherConfig};
use crate::{Rect, Window, WindowId};

static NEXT_PREVIEW_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique preview identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PreviewId(pub u64);

impl PreviewId {
    fn next() -> Self {
        Self(NEXT_PREVIEW_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// Animatable state of a preview or container.
///
/// `x`/`y` address the pivot point; with the default pivot of (0.5, 0.5)
/// that is the preview's center.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub x: f64,
    pub y: f64,
    pub scale_x: f64,
    pub scale_y: f64,
    pub scale_z: f64,
    /// Rotation around the vertical axis in degrees.
    pub rotation_y: f64,
    /// 0.0 (transparent) to 1.0 (opaque).
    pub opacity: f64,
    pub pivot_x: f64,
    pub pivot_y: f64,
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform {
    pub const IDENTITY: Transform = Transform {
        x: 0.0,
        y: 0.0,
        scale_x: 1.0,
        scale_y: 1.0,
        scale_z: 1.0,
        rotation_y: 0.0,
        opacity: 1.0,
        pivot_x: 0.5,
        pivot_y: 0.5,
    };

    /// Fully visible, unscaled transform at a position.
    pub fn at(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            ..Self::IDENTITY
        }
    }

    /// Transform placing a preview exactly over a window frame.
    pub fn over_frame(frame: Rect) -> Self {
        Self::at(frame.center_x(), frame.center_y())
    }

    /// Set a uniform scale. Negative scales clamp to zero.
    pub fn with_scale(mut self, scale: f64) -> Self {
        let scale = scale.max(0.0);
        self.scale_x = scale;
        self.scale_y = scale;
        self.scale_z = scale;
        self
    }

    pub fn with_rotation(mut self, degrees: f64) -> Self {
        self.rotation_y = degrees;
        self
    }

    pub fn with_opacity(mut self, opacity: f64) -> Self {
        self.opacity = opacity;
        self
    }

    /// Enforce the numeric contract: no negative scale, opacity within 0..1.
    pub fn clamped(mut self) -> Self {
        self.scale_x = self.scale_x.max(0.0);
        self.scale_y = self.scale_y.max(0.0);
        self.scale_z = self.scale_z.max(0.0);
        self.opacity = self.opacity.clamp(0.0, 1.0);
        self
    }

    /// Linear interpolation towards `other`; `t` of 0 yields `self`.
    pub fn lerp(&self, other: &Transform, t: f64) -> Transform {
        let mix = |a: f64, b: f64| a + (b - a) * t;
        Transform {
            x: mix(self.x, other.x),
            y: mix(self.y, other.y),
            scale_x: mix(self.scale_x, other.scale_x),
            scale_y: mix(self.scale_y, other.scale_y),
            scale_z: mix(self.scale_z, other.scale_z),
            rotation_y: mix(self.rotation_y, other.rotation_y),
            opacity: mix(self.opacity, other.opacity),
            pivot_x: mix(self.pivot_x, other.pivot_x),
            pivot_y: mix(self.pivot_y, other.pivot_y),
        }
        .clamped()
    }
}

/// Shared visual effects with reference-counted activation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Effect {
    Desaturate,
    Tint,
    Glitch,
}

impl Effect {
    fn slot(self) -> usize {
        match self {
            Effect::Desaturate => 0,
            Effect::Tint => 1,
            Effect::Glitch => 2,
        }
    }
}

/// Opaque handle to an application icon owned by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IconId(pub u64);

/// Where an overlay icon comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IconSource {
    App(IconId),
    /// Generic icon used when the application icon is unavailable.
    Placeholder,
}

/// Icon drawn with a preview; it shares the preview's transform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverlayIcon {
    pub source: IconSource,
    pub size: u32,
    pub style: IconStyle,
}

impl OverlayIcon {
    /// Build the icon for a style, or `None` for the classic (iconless) style.
    pub fn for_style(style: IconStyle, size: u32, icon: Option<IconId>) -> Option<Self> {
        if style == IconStyle::Classic {
            return None;
        }
        let source = match icon {
            Some(id) => IconSource::App(id),
            None => IconSource::Placeholder,
        };
        Some(Self {
            source,
            size,
            style,
        })
    }
}

/// A layout request held back while the preview runs its own wrap sequence.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct DeferredTween {
    pub to: Transform,
    pub duration_ms: u32,
}

/// Progress of a preview's own fade-out/fade-in wrap.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum LoopPhase {
    /// Fading out; will reappear at `relocate` and settle at `enter`.
    Exiting {
        relocate: Transform,
        enter: Transform,
        duration_ms: u32,
    },
    Entering,
}

/// Visual proxy bound to one window.
#[derive(Debug, Clone)]
pub struct Preview {
    id: PreviewId,
    window: WindowId,
    transform: Transform,
    base_scale: f64,
    icon: Option<OverlayIcon>,
    effects: [u32; 3],
    /// Whether the "selection" requester currently holds a tint on this preview.
    pub(crate) selection_tint: bool,
    pub(crate) looping: Option<LoopPhase>,
    pub(crate) final_tween: Option<DeferredTween>,
}

impl Preview {
    /// Create a preview sitting exactly over its window.
    pub fn new(
        window: &Window,
        stage: Rect,
        config: &SwitcherConfig,
        icon: Option<IconId>,
    ) -> Self {
        Self {
            id: PreviewId::next(),
            window: window.id,
            transform: Transform::over_frame(window.frame),
            base_scale: fit_scale(window.frame, stage, config.preview_to_monitor_ratio),
            icon: OverlayIcon::for_style(config.icon_style, config.overlay_icon_size, icon),
            effects: [0; 3],
            selection_tint: false,
            looping: None,
            final_tween: None,
        }
    }

    pub fn id(&self) -> PreviewId {
        self.id
    }

    pub fn window(&self) -> WindowId {
        self.window
    }

    /// The last transform submitted for this preview.
    pub fn transform(&self) -> Transform {
        self.transform
    }

    pub(crate) fn set_transform(&mut self, transform: Transform) {
        self.transform = transform.clamped();
    }

    /// Scale at which the preview fills its share of the monitor.
    pub fn base_scale(&self) -> f64 {
        self.base_scale
    }

    pub fn icon(&self) -> Option<&OverlayIcon> {
        self.icon.as_ref()
    }

    /// Register one more requester for `effect`.
    ///
    /// Returns true when the effect just became active.
    pub fn enable_effect(&mut self, effect: Effect) -> bool {
        let count = &mut self.effects[effect.slot()];
        *count += 1;
        *count == 1
    }

    /// Drop one requester for `effect`.
    ///
    /// Returns true when the effect just became inactive. Extra disables are ignored.
    pub fn disable_effect(&mut self, effect: Effect) -> bool {
        let count = &mut self.effects[effect.slot()];
        if *count == 0 {
            return false;
        }
        *count -= 1;
        *count == 0
    }

    pub fn effect_count(&self, effect: Effect) -> u32 {
        self.effects[effect.slot()]
    }

    pub fn is_effect_enabled(&self, effect: Effect) -> bool {
        self.effect_count(effect) > 0
    }

    /// True while the preview runs its own fade-out/fade-in wrap.
    pub fn is_looping(&self) -> bool {
        self.looping.is_some()
    }

    /// Bring this preview to the front of its container.
    pub fn make_top_layer(&self, stack: &mut StackOrder) {
        stack.raise(self.id);
    }

    /// Send this preview to the back of its container.
    pub fn make_bottom_layer(&self, stack: &mut StackOrder) {
        stack.lower(self.id);
    }
}

/// Scale that fits `frame` into `ratio` of the stage, never enlarging.
fn fit_scale(frame: Rect, stage: Rect, ratio: f64) -> f64 {
    if frame.width <= 0 || frame.height <= 0 {
        return ratio.clamp(0.0, 1.0);
    }
    let by_width = ratio * stage.width as f64 / frame.width as f64;
    let by_height = ratio * stage.height as f64 / frame.height as f64;
    by_width.min(by_height).clamp(0.0, 1.0)
}

/// Back-to-front stacking order of the previews in one container.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StackOrder {
    order: Vec<PreviewId>,
}

impl StackOrder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a preview on top.
    pub fn push(&mut self, id: PreviewId) {
        self.remove(id);
        self.order.push(id);
    }

    pub fn remove(&mut self, id: PreviewId) {
        self.order.retain(|&p| p != id);
    }

    fn raise(&mut self, id: PreviewId) {
        self.push(id);
    }

    fn lower(&mut self, id: PreviewId) {
        self.remove(id);
        self.order.insert(0, id);
    }

    /// Previews from back to front.
    pub fn order(&self) -> &[PreviewId] {
        &self.order
    }

    pub fn top(&self) -> Option<PreviewId> {
        self.order.last().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn preview() -> Preview {
        let window = Window::new(1, "Editor", "editor").with_frame(Rect::new(0, 0, 1920, 1080));
        Preview::new(&window, Rect::new(0, 0, 1920, 1080), &SwitcherConfig::default(), None)
    }

    #[test]
    fn test_preview_starts_over_window() {
        let p = preview();
        assert_eq!(p.transform().x, 960.0);
        assert_eq!(p.transform().y, 540.0);
        assert_eq!(p.transform().scale_x, 1.0);
        assert_eq!(p.base_scale(), 0.5);
    }

    #[test]
    fn test_small_window_is_not_enlarged() {
        let window = Window::new(1, "Dialog", "app").with_frame(Rect::new(0, 0, 200, 100));
        let p = Preview::new(
            &window,
            Rect::new(0, 0, 1920, 1080),
            &SwitcherConfig::default(),
            None,
        );
        assert_eq!(p.base_scale(), 1.0);
    }

    #[test]
    fn test_ids_are_unique() {
        assert_ne!(preview().id(), preview().id());
    }

    #[test]
    fn test_effect_reference_counting() {
        let mut p = preview();
        assert!(p.enable_effect(Effect::Tint));
        assert!(!p.enable_effect(Effect::Tint));
        assert_eq!(p.effect_count(Effect::Tint), 2);

        assert!(!p.disable_effect(Effect::Tint));
        assert!(p.is_effect_enabled(Effect::Tint));
        assert!(p.disable_effect(Effect::Tint));
        assert!(!p.is_effect_enabled(Effect::Tint));

        // Unbalanced disable does not underflow
        assert!(!p.disable_effect(Effect::Tint));
        assert_eq!(p.effect_count(Effect::Tint), 0);
        assert!(!p.is_effect_enabled(Effect::Glitch));
    }

    #[test]
    fn test_negative_scale_is_clamped() {
        let t = Transform::at(0.0, 0.0).with_scale(-2.0);
        assert_eq!(t.scale_x, 0.0);

        let mut raw = Transform::IDENTITY;
        raw.scale_y = -1.0;
        raw.opacity = 3.0;
        let c = raw.clamped();
        assert_eq!(c.scale_y, 0.0);
        assert_eq!(c.opacity, 1.0);
    }

    #[test]
    fn test_lerp_midpoint() {
        let a = Transform::at(0.0, 0.0).with_opacity(0.0);
        let b = Transform::at(100.0, 50.0).with_rotation(60.0);
        let mid = a.lerp(&b, 0.5);
        assert_eq!(mid.x, 50.0);
        assert_eq!(mid.y, 25.0);
        assert_eq!(mid.rotation_y, 30.0);
        assert_eq!(mid.opacity, 0.5);
    }

    #[test]
    fn test_overlay_icon_placeholder() {
        assert!(OverlayIcon::for_style(IconStyle::Classic, 64, Some(IconId(3))).is_none());
        let icon = OverlayIcon::for_style(IconStyle::Overlay, 64, None).unwrap();
        assert_eq!(icon.source, IconSource::Placeholder);
        let icon = OverlayIcon::for_style(IconStyle::Attached, 64, Some(IconId(3))).unwrap();
        assert_eq!(icon.source, IconSource::App(IconId(3)));
    }

    #[test]
    fn test_stack_order_layering() {
        let a = preview();
        let b = preview();
        let c = preview();
        let mut stack = StackOrder::new();
        stack.push(a.id());
        stack.push(b.id());
        stack.push(c.id());
        assert_eq!(stack.top(), Some(c.id()));

        a.make_top_layer(&mut stack);
        assert_eq!(stack.order(), &[b.id(), c.id(), a.id()]);

        a.make_bottom_layer(&mut stack);
        assert_eq!(stack.order(), &[a.id(), b.id(), c.id()]);

        stack.remove(b.id());
        assert_eq!(stack.order(), &[a.id(), c.id()]);
    }
}
