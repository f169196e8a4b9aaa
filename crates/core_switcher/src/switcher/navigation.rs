//! Discrete navigation and the stack flip at the list boundary.

use std::collections::{HashMap, HashSet};

use tracing::debug;

use super::{step_index, Direction, FlipPhase, FlipState, Switcher};
use crate::error::SwitcherError;
use crate::host::{Continuation, Host, Step, Tween, TweenTarget};
use crate::preview::PreviewId;
use crate::strategy::{LayoutStrategy, Position};

impl Switcher {
    pub fn next(&mut self, host: &mut dyn Host) -> Result<(), SwitcherError> {
        self.step(host, Direction::Next)
    }

    pub fn previous(&mut self, host: &mut dyn Host) -> Result<(), SwitcherError> {
        self.step(host, Direction::Previous)
    }

    /// Move the selection by one entry.
    ///
    /// Crossing the boundary of a non-ring strategy plays the stack flip. While
    /// a flip is in flight the index still moves but the layout is deferred.
    pub(super) fn step(
        &mut self,
        host: &mut dyn Host,
        direction: Direction,
    ) -> Result<(), SwitcherError> {
        let op = match direction {
            Direction::Next => "next",
            Direction::Previous => "previous",
        };
        self.ensure_navigable(op)?;

        let len = self.windows.len();
        if len <= 1 {
            self.reaffirm(host);
            return Ok(());
        }

        let from = self.selected_index().unwrap_or(0);
        let to = step_index(from, len, direction);
        let crosses = match direction {
            Direction::Next => from == len - 1,
            Direction::Previous => from == 0,
        };
        self.current_index = to as f64;

        if crosses && !self.looping && !self.strategy.is_ring() {
            self.start_flip(host, direction, from, to);
        } else {
            self.apply_layout(host, Some(direction), true);
        }

        self.after_root_move(host, from, to);
        Ok(())
    }

    /// Jump straight to `index`.
    pub fn select(&mut self, host: &mut dyn Host, index: usize) -> Result<(), SwitcherError> {
        self.ensure_navigable("select")?;
        let len = self.windows.len();
        if index >= len {
            return Err(SwitcherError::IndexOutOfBounds(index, len));
        }
        let from = self.selected_index().unwrap_or(0);
        self.current_index = index as f64;
        self.apply_layout(host, None, true);
        self.after_root_move(host, from, index);
        Ok(())
    }

    /// Root bookkeeping after its selection moved: sub-switcher transition,
    /// focus transfer and the title label.
    pub(super) fn after_root_move(&mut self, host: &mut dyn Host, from: usize, to: usize) {
        if self.parent.is_some() {
            return;
        }
        if !self.children.is_empty() {
            let duration = self.ctx.duration_ms;
            self.stage_transition(host, from, to, 1.0, Some(duration));
            let scope = self.scope_for_index(to);
            self.set_focus(host, scope);
        }
        self.refresh_title(host);
    }

    fn start_flip(&mut self, host: &mut dyn Host, direction: Direction, from: usize, to: usize) {
        let Some(plan) = self.strategy.wrap(direction, &self.previews, from, to, &self.ctx) else {
            self.apply_layout(host, Some(direction), true);
            return;
        };

        self.flip_generation += 1;
        let generation = self.flip_generation;
        self.looping = true;
        debug!("Flipping {:?} from {} to {} (generation {})", self.scope, from, to, generation);

        let mut outstanding = HashSet::new();
        let mut reveal_from = HashMap::new();
        for ((preview, collapse), reveal) in self
            .previews
            .iter_mut()
            .zip(plan.collapse)
            .zip(plan.reveal_from)
        {
            let id = preview.id();
            preview.set_transform(collapse.to);
            host.animate(
                Tween::new(TweenTarget::Preview(id), collapse.to, collapse.duration_ms, self.easing)
                    .delayed(collapse.delay_ms)
                    .then(Continuation::new(
                        self.scope.clone(),
                        Step::FlipOut {
                            preview: id,
                            generation,
                        },
                    )),
            );
            outstanding.insert(id);
            reveal_from.insert(id, reveal);
        }

        self.flip = Some(FlipState {
            generation,
            phase: FlipPhase::Collapsing,
            outstanding,
            reveal_from,
            target_index: to,
        });
    }

    /// One preview finished its part of a flip phase.
    pub(super) fn flip_progress(
        &mut self,
        host: &mut dyn Host,
        preview: PreviewId,
        generation: u64,
        phase: FlipPhase,
    ) {
        let Some(flip) = self.flip.as_mut() else {
            return;
        };
        if flip.generation != generation || flip.phase != phase {
            return;
        }
        flip.outstanding.remove(&preview);
        self.advance_flip(host);
    }

    /// Move to the next flip phase once every preview reported in.
    pub(super) fn advance_flip(&mut self, host: &mut dyn Host) {
        let Some(flip) = self.flip.as_ref() else {
            return;
        };
        if !flip.outstanding.is_empty() {
            return;
        }
        match flip.phase {
            FlipPhase::Collapsing => self.begin_reveal(host),
            FlipPhase::Revealing => self.finish_flip(host),
        }
    }

    /// Second flip phase: reappear on the opposite edge and settle into the layout.
    fn begin_reveal(&mut self, host: &mut dyn Host) {
        let Some(mut flip) = self.flip.take() else {
            return;
        };
        if self.previews.is_empty() {
            self.flip = Some(flip);
            self.finish_flip(host);
            return;
        }

        let target = flip.target_index.min(self.previews.len() - 1) as f64;
        let placements = self
            .strategy
            .layout(&self.previews, &Position::at(target), &self.ctx);

        flip.phase = FlipPhase::Revealing;
        flip.outstanding.clear();
        for (preview, placement) in self.previews.iter_mut().zip(&placements) {
            let id = preview.id();
            let to = placement.target();
            let (delay, duration) = match flip.reveal_from.get(&id) {
                Some(staged) => {
                    host.set(TweenTarget::Preview(id), staged.to);
                    (staged.delay_ms, staged.duration_ms)
                }
                None => (0, (self.ctx.duration_ms / 2).max(1)),
            };
            preview.set_transform(to);
            host.animate(
                Tween::new(TweenTarget::Preview(id), to, duration, self.easing)
                    .delayed(delay)
                    .then(Continuation::new(
                        self.scope.clone(),
                        Step::FlipIn {
                            preview: id,
                            generation: flip.generation,
                        },
                    )),
            );
            flip.outstanding.insert(id);
        }
        self.flip = Some(flip);

        self.restack(host, &placements);
        self.refresh_effects(host);
        self.previous_index = target;
    }

    fn finish_flip(&mut self, host: &mut dyn Host) {
        self.flip = None;
        self.looping = false;
        debug!("Flip of {:?} finished", self.scope);
        if self.pending_update {
            self.pending_update = false;
            self.apply_layout(host, None, true);
        }
    }

    /// Drop an in-flight flip without finishing it.
    pub(super) fn abort_flip(&mut self) {
        if self.flip.take().is_some() {
            debug!("Aborting flip of {:?}", self.scope);
        }
        self.looping = false;
        self.pending_update = false;
    }
}
