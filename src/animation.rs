//! Sprite-sheet frame advancing for idle loops and the destruction effect

use crate::catalog::AnimationSpec;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameStep {
    /// Time carried into the next call.
    pub elapsed: f64,
    pub index: u32,
}

/// Consumes whole frames from `elapsed`, wrapping the index.
pub fn advance_looping(elapsed: f64, frame_time: f64, frame_count: u32, index: u32) -> FrameStep {
    step(elapsed, frame_time, frame_count, index, |i, frames| {
        let count = u64::from(frame_count);
        ((u64::from(i) + frames % count) % count) as u32
    })
}

/// Consumes whole frames from `elapsed`, holding the index on the last frame.
pub fn advance_clamped(elapsed: f64, frame_time: f64, frame_count: u32, index: u32) -> FrameStep {
    let last = frame_count.saturating_sub(1);
    step(elapsed, frame_time, frame_count, index, |i, frames| {
        u64::from(i).saturating_add(frames).min(u64::from(last)) as u32
    })
}

/// A frame is consumed only while strictly more than `frame_time` is left, so
/// the carried remainder lands in `(0, frame_time]` once anything was consumed.
fn step(
    elapsed: f64,
    frame_time: f64,
    frame_count: u32,
    index: u32,
    skip: impl Fn(u32, u64) -> u32,
) -> FrameStep {
    if frame_count == 0
        || !(frame_time.is_finite() && frame_time > 0.0)
        || !elapsed.is_finite()
        || elapsed <= frame_time
    {
        return FrameStep { elapsed, index };
    }
    let mut whole = (elapsed / frame_time).ceil() - 1.0;
    let mut rest = elapsed - whole * frame_time;
    if rest > frame_time {
        rest -= frame_time;
        whole += 1.0;
    } else if rest <= 0.0 && whole > 1.0 {
        rest += frame_time;
        whole -= 1.0;
    }
    if !rest.is_finite() {
        rest = frame_time;
    }
    FrameStep {
        elapsed: rest.clamp(0.0, frame_time),
        index: skip(index, whole as u64),
    }
}

/// Looping idle animation attached to an animated object texture.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameClock {
    spec: AnimationSpec,
    elapsed: f64,
    index: u32,
}

impl FrameClock {
    pub fn new(spec: AnimationSpec) -> Self {
        Self {
            spec,
            elapsed: 0.0,
            index: 0,
        }
    }

    pub fn frame(&self) -> u32 {
        self.index
    }

    pub fn frame_count(&self) -> u32 {
        self.spec.frame_count
    }

    pub fn advance(&mut self, dt: f64) {
        let step = advance_looping(
            self.elapsed + dt,
            self.spec.frame_time,
            self.spec.frame_count,
            self.index,
        );
        self.elapsed = step.elapsed;
        self.index = step.index;
    }
}

/// Play-once effect shown after demolition. Resets itself the tick the last
/// frame is reached.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DestructionEffect {
    spec: AnimationSpec,
    active: bool,
    elapsed: f64,
    index: u32,
}

impl DestructionEffect {
    pub fn new(spec: AnimationSpec) -> Self {
        Self {
            spec,
            active: false,
            elapsed: 0.0,
            index: 0,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn frame(&self) -> u32 {
        self.index
    }

    pub fn start(&mut self) {
        self.active = true;
        self.elapsed = 0.0;
        self.index = 0;
    }

    /// Returns `true` on the tick the effect completes.
    pub fn advance(&mut self, dt: f64) -> bool {
        if !self.active {
            return false;
        }
        let step = advance_clamped(
            self.elapsed + dt,
            self.spec.frame_time,
            self.spec.frame_count,
            self.index,
        );
        self.elapsed = step.elapsed;
        self.index = step.index;
        if self.index >= self.spec.frame_count.saturating_sub(1) {
            self.active = false;
            self.elapsed = 0.0;
            self.index = 0;
            return true;
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const SPEC: AnimationSpec = AnimationSpec {
        frame_count: 4,
        frame_time: 0.25,
    };

    #[test]
    fn looping_wraps_around() {
        let step = advance_looping(1.3, 0.25, 4, 2);
        // five whole frames consumed: 2 -> 3 -> 0 -> 1 -> 2 -> 3
        assert_eq!(step.index, 3);
        assert!((step.elapsed - 0.05).abs() < 1e-9);
    }

    #[test]
    fn exact_frame_time_does_not_advance() {
        let step = advance_looping(0.25, 0.25, 4, 0);
        assert_eq!(step.index, 0);
        assert_eq!(step.elapsed, 0.25);
    }

    #[test]
    fn clamped_holds_last_frame() {
        let step = advance_clamped(10.0, 0.25, 4, 0);
        assert_eq!(step.index, 3);
    }

    #[test]
    fn zero_frames_is_a_no_op() {
        let step = advance_looping(5.0, 0.25, 0, 0);
        assert_eq!(step, FrameStep { elapsed: 5.0, index: 0 });
    }

    #[test]
    fn frame_clock_cycles() {
        let mut clock = FrameClock::new(SPEC);
        for _ in 0..5 {
            clock.advance(0.125);
        }
        // 0.625s accumulated: two frames consumed
        assert_eq!(clock.frame(), 2);
    }

    #[test]
    fn destruction_plays_once_then_resets() {
        let mut effect = DestructionEffect::new(SPEC);
        assert!(!effect.advance(1.0));

        effect.start();
        assert!(effect.is_active());
        assert!(!effect.advance(0.3));
        assert_eq!(effect.frame(), 1);
        assert!(!effect.advance(0.25));
        assert_eq!(effect.frame(), 2);
        assert!(effect.advance(0.25));
        assert!(!effect.is_active());
        assert_eq!(effect.frame(), 0);
        assert!(!effect.advance(1.0));
    }

    #[test]
    fn long_gaps_skip_frames_without_stepping_through_them() {
        // 2^40 frames plus half a frame
        let step = advance_looping(274_877_906_944.125, 0.25, 3, 0);
        assert_eq!(step.index, 1);
        assert_eq!(step.elapsed, 0.125);

        let step = advance_clamped(274_877_906_944.125, 0.25, 4, 1);
        assert_eq!(step.index, 3);
        assert_eq!(step.elapsed, 0.125);
    }

    #[test]
    fn huge_elapsed_keeps_index_and_carry_in_range() {
        for index in 0..4 {
            let step = advance_looping(1.0e20, 0.25, 4, index);
            assert!(step.index < 4);
            assert!(step.elapsed > 0.0 && step.elapsed <= 0.25);
        }
        let mut effect = DestructionEffect::new(SPEC);
        effect.start();
        assert!(effect.advance(1.0e20));
        assert!(!effect.is_active());
    }

    fn sixty_fourths() -> impl Strategy<Value = f64> {
        (0u32..64).prop_map(|n| f64::from(n) / 64.0)
    }

    proptest! {
        #[test]
        fn looping_is_associative(
            steps in prop::collection::vec(sixty_fourths(), 1..40),
            start in 0u32..6,
        ) {
            let frame_time = 0.25;
            let frames = 6;
            let mut split = FrameStep { elapsed: 0.0, index: start };
            for dt in &steps {
                split = advance_looping(split.elapsed + dt, frame_time, frames, split.index);
            }
            let total: f64 = steps.iter().sum();
            let whole = advance_looping(total, frame_time, frames, start);
            prop_assert_eq!(split, whole);
        }

        #[test]
        fn clamped_is_associative(
            steps in prop::collection::vec(sixty_fourths(), 1..40),
        ) {
            let frame_time = 0.125;
            let frames = 8;
            let mut split = FrameStep { elapsed: 0.0, index: 0 };
            for dt in &steps {
                split = advance_clamped(split.elapsed + dt, frame_time, frames, split.index);
            }
            let total: f64 = steps.iter().sum();
            let whole = advance_clamped(total, frame_time, frames, 0);
            prop_assert_eq!(split.index, whole.index);
            prop_assert!(split.index < frames);
        }
    }
}
