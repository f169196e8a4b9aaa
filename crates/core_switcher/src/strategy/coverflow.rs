//! Coverflow and its ring variant, Carousel.

use std::f64::consts::TAU;

use super::{LayoutContext, LayoutStrategy, Placement, Position, Staged, WrapPlan, SIDE_ANGLE};
use crate::preview::{Preview, Transform};
use crate::switcher::Direction;

/// Extra horizontal distance per step away from the selection.
const STEP_SPACING: f64 = 50.0;
/// Gap between the selection and its first neighbor, relative to stage width.
const MARGIN_RATIO: f64 = 0.2;
/// Rotation of previews while they fly out during a flip.
const BLEND_OUT_ANGLE: f64 = 30.0;
/// How far off-screen the vanishing point sits, relative to stage width.
const VANISH_RATIO: f64 = 0.5;
/// Ring radius of the carousel, relative to stage width.
const CAROUSEL_RADIUS_RATIO: f64 = 0.3;

/// Stacked 3D cover flow with a stack flip at the list boundary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Coverflow;

/// Fixed ring centered on the selection; never wraps.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Carousel;

/// Coverflow placement of a preview at signed distance `d` from the selection.
fn flow_transform(base_scale: f64, d: f64, ctx: &LayoutContext) -> (Transform, i32) {
    let distance = d.abs();
    let margin = ctx.stage.width as f64 * MARGIN_RATIO;
    let offset = if distance < 1.0 {
        distance * (margin + STEP_SPACING)
    } else {
        margin + STEP_SPACING * distance
    };
    let side = if d < 0.0 { -1.0 } else { 1.0 };

    let transform = Transform::at(ctx.center_x() + side * offset, ctx.center_y())
        .with_scale(base_scale * ctx.scaling_factor.powf(distance))
        .with_rotation(-side * distance.min(1.0) * SIDE_ANGLE);
    (transform, -(distance * 100.0).round() as i32)
}

/// Off-screen point the stack collapses into (or reappears from).
fn vanishing_point(base_scale: f64, left: bool, angle: f64, ctx: &LayoutContext) -> Transform {
    let reach = ctx.stage.width as f64 * VANISH_RATIO;
    let x = if left {
        ctx.stage.x as f64 - reach
    } else {
        ctx.stage.right() as f64 + reach
    };
    Transform::at(x, ctx.center_y())
        .with_scale(base_scale * ctx.scaling_factor)
        .with_rotation(angle)
        .with_opacity(0.0)
}

impl LayoutStrategy for Coverflow {
    fn name(&self) -> &'static str {
        "coverflow"
    }

    fn is_ring(&self) -> bool {
        false
    }

    fn layout(
        &self,
        previews: &[Preview],
        position: &Position,
        ctx: &LayoutContext,
    ) -> Vec<Placement> {
        previews
            .iter()
            .enumerate()
            .map(|(i, preview)| {
                let (to, depth) =
                    flow_transform(preview.base_scale(), i as f64 - position.current, ctx);
                Placement::moving(to, depth)
            })
            .collect()
    }

    fn wrap(
        &self,
        direction: Direction,
        previews: &[Preview],
        from: usize,
        to: usize,
        ctx: &LayoutContext,
    ) -> Option<WrapPlan> {
        let count = previews.len();
        if count < 2 {
            return None;
        }

        // Going forward past the end the stack leaves to the left and comes back from the right.
        let exit_left = direction == Direction::Next;
        let half = (ctx.duration_ms / 2).max(1);
        let tween_ms = (half / 2).max(1);
        let stagger = (half - tween_ms) / count as u32;
        let exit_angle = if exit_left { BLEND_OUT_ANGLE } else { -BLEND_OUT_ANGLE };

        let farthest = previews.len().saturating_sub(1);
        let collapse = previews
            .iter()
            .enumerate()
            .map(|(i, preview)| {
                // Far end of the stack departs first, the selection last.
                let distance = i.abs_diff(from);
                Staged {
                    to: vanishing_point(preview.base_scale(), exit_left, exit_angle, ctx),
                    delay_ms: (farthest - distance.min(farthest)) as u32 * stagger,
                    duration_ms: tween_ms,
                }
            })
            .collect();

        let reveal_from = previews
            .iter()
            .enumerate()
            .map(|(i, preview)| Staged {
                to: vanishing_point(preview.base_scale(), !exit_left, -exit_angle, ctx),
                delay_ms: i.abs_diff(to) as u32 * stagger,
                duration_ms: tween_ms,
            })
            .collect();

        Some(WrapPlan {
            collapse,
            reveal_from,
        })
    }
}

impl LayoutStrategy for Carousel {
    fn name(&self) -> &'static str {
        "carousel"
    }

    fn is_ring(&self) -> bool {
        true
    }

    fn layout(
        &self,
        previews: &[Preview],
        position: &Position,
        ctx: &LayoutContext,
    ) -> Vec<Placement> {
        let count = previews.len() as f64;
        let half = (count / 2.0).floor();
        let radius = ctx.stage.width as f64 * CAROUSEL_RADIUS_RATIO;

        previews
            .iter()
            .enumerate()
            .map(|(i, preview)| {
                let slot = (i as f64 - position.current + half + count).rem_euclid(count);
                let theta = (slot - half) * TAU / count;
                // 1.0 at the front of the ring, 0.0 at the back
                let front = (1.0 + theta.cos()) / 2.0;
                let factor = ctx.scaling_factor + (1.0 - ctx.scaling_factor) * front;

                let to = Transform::at(
                    ctx.center_x() + radius * theta.sin(),
                    ctx.center_y() - (1.0 - front) * ctx.stage.height as f64 * 0.1,
                )
                .with_scale(preview.base_scale() * factor)
                .with_rotation((-theta.to_degrees()).clamp(-SIDE_ANGLE, SIDE_ANGLE))
                .with_opacity(0.5 + 0.5 * front);
                Placement::moving(to, (front * 1000.0).round() as i32)
            })
            .collect()
    }

    fn wrap(
        &self,
        _direction: Direction,
        _previews: &[Preview],
        _from: usize,
        _to: usize,
        _ctx: &LayoutContext,
    ) -> Option<WrapPlan> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SwitcherConfig;
    use crate::{Rect, Window};

    fn ctx() -> LayoutContext {
        LayoutContext::new(Rect::new(0, 0, 1000, 800), &SwitcherConfig::default())
    }

    fn previews(n: usize) -> Vec<Preview> {
        let stage = Rect::new(0, 0, 1000, 800);
        (0..n)
            .map(|i| {
                let window = Window::new(i as u64 + 1, format!("w{}", i), "app")
                    .with_frame(Rect::new(0, 0, 1000, 800));
                Preview::new(&window, stage, &SwitcherConfig::default(), None)
            })
            .collect()
    }

    #[test]
    fn test_coverflow_selected_is_centered() {
        let previews = previews(3);
        let placements = Coverflow.layout(&previews, &Position::at(1.0), &ctx());
        let center = placements[1].target();
        assert_eq!(center.x, 500.0);
        assert_eq!(center.y, 400.0);
        assert_eq!(center.rotation_y, 0.0);
        assert_eq!(center.scale_x, previews[1].base_scale());
        assert!(placements[1].depth > placements[0].depth);
        assert!(placements[1].depth > placements[2].depth);
    }

    #[test]
    fn test_coverflow_sides() {
        let previews = previews(4);
        let placements = Coverflow.layout(&previews, &Position::at(1.0), &ctx());
        let left = placements[0].target();
        let right = placements[2].target();
        let far = placements[3].target();

        // margin 200 + 50 per step
        assert_eq!(left.x, 250.0);
        assert_eq!(right.x, 750.0);
        assert_eq!(far.x, 800.0);
        assert_eq!(left.rotation_y, SIDE_ANGLE);
        assert_eq!(right.rotation_y, -SIDE_ANGLE);
        assert!(far.scale_x < right.scale_x);
        assert!((right.scale_x - previews[2].base_scale() * 0.8).abs() < 1e-9);
        assert!(placements[2].depth > placements[3].depth);
    }

    #[test]
    fn test_coverflow_fractional_is_continuous() {
        let previews = previews(3);
        let a = Coverflow.layout(&previews, &Position::at(0.999), &ctx());
        let b = Coverflow.layout(&previews, &Position::at(1.0), &ctx());
        assert!((a[1].target().x - b[1].target().x).abs() < 1.0);
    }

    #[test]
    fn test_coverflow_wrap_plan() {
        let previews = previews(3);
        let plan = Coverflow.wrap(Direction::Next, &previews, 2, 0, &ctx()).unwrap();
        assert_eq!(plan.collapse.len(), 3);
        assert_eq!(plan.reveal_from.len(), 3);

        // Exits left, comes back from the right
        assert!(plan.collapse.iter().all(|s| s.to.x < 0.0 && s.to.opacity == 0.0));
        assert!(plan.reveal_from.iter().all(|s| s.to.x > 1000.0));

        // Selection leaves last, new selection arrives first
        assert!(plan.collapse[2].delay_ms > plan.collapse[0].delay_ms);
        assert_eq!(plan.reveal_from[0].delay_ms, 0);
        assert!(plan.reveal_from[2].delay_ms > 0);

        let total = plan.collapse.iter().map(|s| s.delay_ms + s.duration_ms).max().unwrap();
        assert!(total <= 100);
    }

    #[test]
    fn test_coverflow_no_wrap_for_single_preview() {
        assert!(Coverflow.wrap(Direction::Next, &previews(1), 0, 0, &ctx()).is_none());
    }

    #[test]
    fn test_carousel_slots() {
        let previews = previews(5);
        let placements = Carousel.layout(&previews, &Position::at(0.0), &ctx());
        let front = placements[0].target();
        assert!((front.x - 500.0).abs() < 1e-9);
        assert_eq!(front.opacity, 1.0);
        assert!(placements.iter().skip(1).all(|p| p.depth < placements[0].depth));

        // Neighbors are mirrored around the center
        let right = placements[1].target();
        let left = placements[4].target();
        assert!((right.x - 500.0 + (left.x - 500.0)).abs() < 1e-6);
        assert!(right.x > 500.0);
    }

    #[test]
    fn test_carousel_never_wraps() {
        assert!(Carousel.is_ring());
        assert!(Carousel.wrap(Direction::Next, &previews(3), 2, 0, &ctx()).is_none());
    }

    #[test]
    fn test_scale_never_negative() {
        let previews = previews(3);
        let config = SwitcherConfig {
            preview_scaling_factor: 0.0,
            ..Default::default()
        };
        let ctx = LayoutContext::new(Rect::new(0, 0, 1000, 800), &config);
        for placement in Coverflow.layout(&previews, &Position::at(0.0), &ctx) {
            assert!(placement.target().scale_x >= 0.0);
        }
    }
}
