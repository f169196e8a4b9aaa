//! Layout strategies.
//!
//! A strategy is a pure mapping from the selection position to one target
//! [`Transform`] per preview. Non-ring strategies additionally describe the
//! two-phase animation used to cross the ends of the list.

use enum_dispatch::enum_dispatch;

use crate::config::{LoopingMethod, SwitcherConfig, SwitcherStyle};
use crate::preview::{Preview, Transform};
use crate::switcher::Direction;
use crate::Rect;

mod coverflow;
mod timeline;

pub use coverflow::{Carousel, Coverflow};
pub use timeline::Timeline;

/// Side rotation of previews away from the selection, in degrees.
pub const SIDE_ANGLE: f64 = 60.0;

/// Geometry and timing shared by every strategy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutContext {
    pub stage: Rect,
    /// Vertical offset of the preview center.
    pub offset: f64,
    pub scaling_factor: f64,
    pub duration_ms: u32,
}

impl LayoutContext {
    pub fn new(stage: Rect, config: &SwitcherConfig) -> Self {
        Self {
            stage,
            offset: config.offset as f64,
            scaling_factor: config.preview_scaling_factor,
            duration_ms: config.animation_ms(),
        }
    }

    pub fn center_x(&self) -> f64 {
        self.stage.center_x()
    }

    pub fn center_y(&self) -> f64 {
        self.stage.center_y() + self.offset
    }
}

/// Selection position handed to a layout pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position {
    pub current: f64,
    /// Position of the previous layout pass.
    pub previous: f64,
    /// Set when the pass follows a single discrete step.
    pub stepping: Option<Direction>,
}

impl Position {
    pub fn at(current: f64) -> Self {
        Self {
            current,
            previous: current,
            stepping: None,
        }
    }
}

/// How one preview gets to its new place.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PreviewPlan {
    /// Plain tween to the target.
    Move(Transform),
    /// Fade out at `exit`, jump invisibly to `relocate`, fade in at `enter`.
    Wrap {
        exit: Transform,
        relocate: Transform,
        enter: Transform,
    },
}

/// Layout result for one preview.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub plan: PreviewPlan,
    /// Stacking depth; larger is closer to the viewer.
    pub depth: i32,
}

impl Placement {
    pub fn moving(to: Transform, depth: i32) -> Self {
        Self {
            plan: PreviewPlan::Move(to),
            depth,
        }
    }

    /// Where the preview ends up once its animation finishes.
    pub fn target(&self) -> Transform {
        match self.plan {
            PreviewPlan::Move(to) => to,
            PreviewPlan::Wrap { enter, .. } => enter,
        }
    }
}

/// One staggered tween of a wrap phase.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Staged {
    pub to: Transform,
    pub delay_ms: u32,
    pub duration_ms: u32,
}

/// The list-wide boundary crossing of a non-ring strategy.
#[derive(Debug, Clone, PartialEq)]
pub struct WrapPlan {
    /// Phase one: where each preview departs to.
    pub collapse: Vec<Staged>,
    /// Phase two: where each preview reappears before moving to its layout
    /// target. `to` is the starting point here.
    pub reveal_from: Vec<Staged>,
}

#[enum_dispatch]
pub trait LayoutStrategy {
    fn name(&self) -> &'static str;

    /// Ring strategies have no boundary and never wrap.
    fn is_ring(&self) -> bool;

    /// Target placement of every preview, index-aligned with `previews`.
    fn layout(
        &self,
        previews: &[Preview],
        position: &Position,
        ctx: &LayoutContext,
    ) -> Vec<Placement>;

    /// Boundary crossing from index `from` to `to`, or `None` for ring strategies.
    fn wrap(
        &self,
        direction: Direction,
        previews: &[Preview],
        from: usize,
        to: usize,
        ctx: &LayoutContext,
    ) -> Option<WrapPlan>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[enum_dispatch(LayoutStrategy)]
pub enum Strategy {
    Coverflow(Coverflow),
    Carousel(Carousel),
    Timeline(Timeline),
}

impl Strategy {
    pub fn from_config(config: &SwitcherConfig) -> Self {
        match (config.switcher_style, config.switcher_looping_method) {
            (SwitcherStyle::Coverflow, LoopingMethod::FlipStack) => Coverflow.into(),
            (SwitcherStyle::Coverflow, LoopingMethod::Carousel) => Carousel.into(),
            (SwitcherStyle::Timeline, _) => Timeline.into(),
        }
    }
}
