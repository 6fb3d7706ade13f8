//! Per-tile gesture resolution
//!
//! Each tile keeps the last two frames of pointer samples and a press
//! debounce timer. While the timer runs the tile ignores all input; once it
//! reaches zero the tile is armed and resolves every sample of the frame:
//!
//! * samples over a HUD region are dropped before any world transform,
//! * `Pressed`/`Moved` over the hitbox register a press (and hover),
//! * `Released` over the hitbox registers a click only when the same pointer
//!   was `Moved` in the previous frame. A tap that goes straight from
//!   `Pressed` to `Released` is not a click.
//!
//! A click re-arms the debounce timer.

use serde::Serialize;
use tracing::trace;

use crate::geometry::Rect;
use crate::input::{Camera, Hud, TouchSample, TouchState};

/// Seconds a tile ignores input after an accepted click.
pub const TOUCH_DEBOUNCE_SECONDS: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum GesturePhase {
    /// Tile is hidden or locked and never evaluates gestures.
    Idle,
    Debouncing,
    ArmedForGesture,
}

/// Outcome of one tile's gesture pass, consumed by the grid in the same tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct TileInteraction {
    pub hovered: bool,
    pub pressed: bool,
    pub clicked: bool,
}

impl TileInteraction {
    pub fn is_empty(&self) -> bool {
        !(self.hovered || self.pressed || self.clicked)
    }

    /// Whether this tile should become the grid's selected tile.
    pub fn selects(&self) -> bool {
        self.pressed || self.clicked
    }
}

/// Per-frame collaborators for gesture resolution.
pub struct GestureContext<'a> {
    pub camera: &'a dyn Camera,
    pub hud: &'a dyn Hud,
    pub dt_seconds: f64,
}

#[derive(Debug, Clone, Default)]
pub struct InteractionState {
    debounce_remaining: f64,
    previous: Vec<TouchSample>,
    current: Vec<TouchSample>,
}

impl InteractionState {
    pub fn debounce_remaining(&self) -> f64 {
        self.debounce_remaining
    }

    pub fn phase(&self, visible: bool) -> GesturePhase {
        if !visible {
            GesturePhase::Idle
        } else if self.debounce_remaining > 0.0 {
            GesturePhase::Debouncing
        } else {
            GesturePhase::ArmedForGesture
        }
    }

    pub fn previous_samples(&self) -> &[TouchSample] {
        &self.previous
    }

    pub fn current_samples(&self) -> &[TouchSample] {
        &self.current
    }

    pub fn update(
        &mut self,
        visible: bool,
        hitbox: Rect,
        touches: &[TouchSample],
        ctx: &GestureContext<'_>,
    ) -> TileInteraction {
        std::mem::swap(&mut self.previous, &mut self.current);
        self.current.clear();
        self.current.extend_from_slice(touches);

        let mut outcome = TileInteraction::default();
        if !visible {
            return outcome;
        }

        if self.debounce_remaining > 0.0 {
            let dt = if ctx.dt_seconds.is_finite() {
                ctx.dt_seconds.max(0.0)
            } else {
                0.0
            };
            self.debounce_remaining = (self.debounce_remaining - dt).max(0.0);
            return outcome;
        }

        for sample in touches {
            if !sample.position.is_finite() {
                trace!(pointer = sample.id, "dropping non-finite pointer sample");
                continue;
            }
            if ctx.hud.swallows(sample.position) {
                continue;
            }
            let world = ctx.camera.screen_to_world(sample.position);
            if !world.is_finite() || !Rect::probe(world).intersects(&hitbox) {
                continue;
            }

            match sample.state {
                TouchState::Pressed | TouchState::Moved => {
                    outcome.hovered = true;
                    outcome.pressed = true;
                }
                TouchState::Released => {
                    if !self.was_moving(sample.id) {
                        continue;
                    }
                    outcome.clicked = true;
                    self.debounce_remaining = TOUCH_DEBOUNCE_SECONDS;
                }
            }
        }
        outcome
    }

    fn was_moving(&self, pointer: u32) -> bool {
        self.previous
            .iter()
            .rev()
            .find(|sample| sample.id == pointer)
            .is_some_and(|sample| sample.state == TouchState::Moved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Point;
    use crate::input::{HudLayout, ViewCamera};
    use proptest::prelude::*;

    const DT: f64 = 1.0 / 60.0;

    fn hitbox() -> Rect {
        Rect::new(100.0, 100.0, 50.0, 20.0)
    }

    fn frame(
        state: &mut InteractionState,
        hud: &HudLayout,
        touches: &[TouchSample],
    ) -> TileInteraction {
        timed_frame(state, hud, DT, touches)
    }

    fn timed_frame(
        state: &mut InteractionState,
        hud: &HudLayout,
        dt_seconds: f64,
        touches: &[TouchSample],
    ) -> TileInteraction {
        let camera = ViewCamera::default();
        let ctx = GestureContext {
            camera: &camera,
            hud,
            dt_seconds,
        };
        state.update(true, hitbox(), touches, &ctx)
    }

    fn at(state: TouchState) -> TouchSample {
        TouchSample::new(0, 110.0, 105.0, state)
    }

    #[test]
    fn press_move_release_is_one_click() {
        let hud = HudLayout::default();
        let mut state = InteractionState::default();
        let mut clicks = 0;

        let pressed = frame(&mut state, &hud, &[at(TouchState::Pressed)]);
        assert!(pressed.pressed && pressed.hovered && !pressed.clicked);
        clicks += usize::from(pressed.clicked);

        let moved = frame(&mut state, &hud, &[at(TouchState::Moved)]);
        assert!(moved.pressed);
        clicks += usize::from(moved.clicked);

        let released = frame(&mut state, &hud, &[at(TouchState::Released)]);
        assert!(released.clicked);
        assert!(!released.hovered);
        clicks += usize::from(released.clicked);

        assert_eq!(clicks, 1);
        assert_eq!(state.debounce_remaining(), TOUCH_DEBOUNCE_SECONDS);
        assert_eq!(state.phase(true), GesturePhase::Debouncing);
    }

    #[test]
    fn bare_tap_is_not_a_click() {
        let hud = HudLayout::default();
        let mut state = InteractionState::default();
        frame(&mut state, &hud, &[at(TouchState::Pressed)]);
        let released = frame(&mut state, &hud, &[at(TouchState::Released)]);
        assert!(!released.clicked);
        assert_eq!(state.debounce_remaining(), 0.0);
        assert_eq!(state.phase(true), GesturePhase::ArmedForGesture);
    }

    #[test]
    fn release_needs_the_same_pointer_to_have_moved() {
        let hud = HudLayout::default();
        let mut state = InteractionState::default();
        let other_finger = TouchSample::new(7, 300.0, 300.0, TouchState::Moved);
        frame(&mut state, &hud, &[at(TouchState::Pressed), other_finger]);
        let released = frame(&mut state, &hud, &[at(TouchState::Released)]);
        assert!(!released.clicked);
    }

    #[test]
    fn debounce_blocks_gestures_and_counts_down_to_zero() {
        let hud = HudLayout::default();
        let mut state = InteractionState::default();
        frame(&mut state, &hud, &[at(TouchState::Moved)]);
        assert!(frame(&mut state, &hud, &[at(TouchState::Released)]).clicked);

        let mut last = state.debounce_remaining();
        for _ in 0..59 {
            let outcome = frame(&mut state, &hud, &[at(TouchState::Pressed)]);
            assert!(outcome.is_empty());
            assert!(state.debounce_remaining() <= last);
            last = state.debounce_remaining();
        }
        // 60 frames of 1/60s drain the full second; allow float drift of one frame.
        for _ in 0..2 {
            frame(&mut state, &hud, &[]);
        }
        assert_eq!(state.debounce_remaining(), 0.0);
        assert!(frame(&mut state, &hud, &[at(TouchState::Pressed)]).pressed);
    }

    #[test]
    fn hud_swallows_samples_before_tile_test() {
        let hud = HudLayout::new(vec![Rect::new(0.0, 0.0, 500.0, 500.0)]);
        let mut state = InteractionState::default();
        assert!(frame(&mut state, &hud, &[at(TouchState::Pressed)]).is_empty());
        assert!(frame(&mut state, &hud, &[at(TouchState::Moved)]).is_empty());
        assert!(frame(&mut state, &hud, &[at(TouchState::Released)]).is_empty());
    }

    #[test]
    fn hud_is_tested_in_screen_space() {
        // The camera moves the sample onto the hitbox, but the HUD covers the
        // raw screen position.
        let hud = HudLayout::new(vec![Rect::new(0.0, 0.0, 20.0, 20.0)]);
        let camera = ViewCamera::new(Point::new(100.0, 100.0), 1.0);
        let ctx = GestureContext {
            camera: &camera,
            hud: &hud,
            dt_seconds: DT,
        };
        let mut state = InteractionState::default();
        let sample = TouchSample::new(0, 10.0, 5.0, TouchState::Pressed);
        assert!(state.update(true, hitbox(), &[sample], &ctx).is_empty());

        let open_hud = HudLayout::default();
        let ctx = GestureContext {
            camera: &camera,
            hud: &open_hud,
            dt_seconds: DT,
        };
        assert!(state.update(true, hitbox(), &[sample], &ctx).pressed);
    }

    #[test]
    fn samples_outside_hitbox_are_ignored() {
        let hud = HudLayout::default();
        let mut state = InteractionState::default();
        let miss = TouchSample::new(0, 10.0, 10.0, TouchState::Pressed);
        assert!(frame(&mut state, &hud, &[miss]).is_empty());
    }

    #[test]
    fn non_finite_samples_are_dropped() {
        let hud = HudLayout::default();
        let mut state = InteractionState::default();
        let bad = TouchSample::new(0, f32::NAN, 105.0, TouchState::Pressed);
        let worse = TouchSample::new(1, f32::INFINITY, 105.0, TouchState::Moved);
        assert!(frame(&mut state, &hud, &[bad, worse]).is_empty());
    }

    #[test]
    fn invisible_tiles_never_resolve_gestures() {
        let hud = HudLayout::default();
        let camera = ViewCamera::default();
        let ctx = GestureContext {
            camera: &camera,
            hud: &hud,
            dt_seconds: DT,
        };
        let mut state = InteractionState::default();
        assert_eq!(state.phase(false), GesturePhase::Idle);
        state.update(false, hitbox(), &[at(TouchState::Moved)], &ctx);
        let outcome = state.update(false, hitbox(), &[at(TouchState::Released)], &ctx);
        assert!(outcome.is_empty());
        assert_eq!(state.current_samples().len(), 1);
        assert_eq!(state.previous_samples()[0].state, TouchState::Moved);
    }

    fn frame_step() -> impl Strategy<Value = (f64, Option<TouchState>)> {
        let dt = prop_oneof![Just(0.0), 0.0..2.0f64];
        let touch = prop::option::of(prop::sample::select(vec![
            TouchState::Pressed,
            TouchState::Moved,
            TouchState::Released,
        ]));
        (dt, touch)
    }

    proptest! {
        #[test]
        fn debounce_drains_monotonically_and_blocks_gestures(
            steps in prop::collection::vec(frame_step(), 1..80),
        ) {
            let hud = HudLayout::default();
            let mut state = InteractionState::default();
            frame(&mut state, &hud, &[at(TouchState::Moved)]);
            prop_assert!(frame(&mut state, &hud, &[at(TouchState::Released)]).clicked);

            for (dt, touch) in steps {
                let before = state.debounce_remaining();
                let touches: Vec<_> = touch.map(at).into_iter().collect();
                let outcome = timed_frame(&mut state, &hud, dt, &touches);
                let after = state.debounce_remaining();
                prop_assert!(after >= 0.0);
                if before > 0.0 {
                    prop_assert!(outcome.is_empty());
                    prop_assert!(after <= before);
                    prop_assert_eq!(after, (before - dt).max(0.0));
                }
            }
        }
    }
}
