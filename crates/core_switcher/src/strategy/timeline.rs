//! Previews receding along a tilted line.

use super::{LayoutContext, LayoutStrategy, Placement, Position, PreviewPlan, WrapPlan};
use crate::preview::{Preview, Transform};
use crate::switcher::Direction;

/// Number of previews visible behind (and including) the selection.
const VISIBLE: f64 = 6.0;
const STEP_X: f64 = 150.0;
const STEP_Y: f64 = 100.0;
/// Constant tilt of the whole line, in degrees.
const TILT_ANGLE: f64 = 15.0;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Timeline;

/// Placement at ring distance `d` behind the selection. Negative `d` lies in
/// front of the selection, where previews leave the line.
fn line_transform(base_scale: f64, d: f64, ctx: &LayoutContext) -> Transform {
    let reach = d.signum() * d.abs().sqrt();
    let opacity = if d < 0.0 {
        (1.0 + d).clamp(0.0, 1.0)
    } else {
        (VISIBLE - d).clamp(0.0, 1.0)
    };
    Transform::at(ctx.center_x() + reach * STEP_X, ctx.center_y() - reach * STEP_Y)
        .with_scale(base_scale * ctx.scaling_factor.powf(d))
        .with_rotation(-TILT_ANGLE)
        .with_opacity(opacity)
}

fn depth(d: f64) -> i32 {
    -(d * 100.0).round() as i32
}

impl LayoutStrategy for Timeline {
    fn name(&self) -> &'static str {
        "timeline"
    }

    /// The line has no list-wide boundary; single previews wrap on their own.
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

        previews
            .iter()
            .enumerate()
            .map(|(i, preview)| {
                let base = preview.base_scale();
                let d_now = (i as f64 - position.current).rem_euclid(count);
                let d_prev = (i as f64 - position.previous).rem_euclid(count);
                let target = line_transform(base, d_now, ctx);

                let crossed = match position.stepping {
                    Some(Direction::Next) => d_now > d_prev,
                    Some(Direction::Previous) => d_now < d_prev,
                    None => false,
                };
                if !crossed || previews.len() < 2 {
                    return Placement::moving(target, depth(d_now));
                }

                // Leaving the front goes out towards the viewer, leaving the back goes
                // further back; re-entry happens on the opposite end.
                let (exit, relocate) = match position.stepping {
                    Some(Direction::Previous) => (
                        line_transform(base, count, ctx).with_opacity(0.0),
                        line_transform(base, -1.0, ctx).with_opacity(0.0),
                    ),
                    _ => (
                        line_transform(base, -1.0, ctx).with_opacity(0.0),
                        target.with_opacity(0.0),
                    ),
                };
                Placement {
                    plan: PreviewPlan::Wrap {
                        exit,
                        relocate,
                        enter: target,
                    },
                    depth: depth(d_now),
                }
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
