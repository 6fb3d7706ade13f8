//! Production cycle timers

use serde::{Deserialize, Serialize};

/// Elapsed time inside the current cycle plus the number of finished cycles.
///
/// `elapsed` always stays in `[0, cycle_time)`; overflow past a rollover is
/// carried into the next cycle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CycleTimer {
    cycle_time: f64,
    elapsed: f64,
    completed: u64,
}

impl CycleTimer {
    /// `cycle_time` is validated by the catalog; non-positive values are
    /// treated as a timer that never fires.
    pub fn new(cycle_time: f64) -> Self {
        Self {
            cycle_time,
            elapsed: 0.0,
            completed: 0,
        }
    }

    pub fn cycle_time(&self) -> f64 {
        self.cycle_time
    }

    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    pub fn cycles_completed(&self) -> u64 {
        self.completed
    }

    /// Advances by `dt` seconds and returns how many cycles rolled over.
    ///
    /// Rollovers are counted in one division, so the cost does not grow with
    /// `dt`. Counts past `u64::MAX` saturate.
    pub fn advance(&mut self, dt: f64) -> u64 {
        if !(self.cycle_time.is_finite() && self.cycle_time > 0.0) || !dt.is_finite() || dt <= 0.0 {
            return 0;
        }
        let total = self.elapsed + dt;
        let whole = (total / self.cycle_time).floor();
        let mut rollovers = whole as u64;
        let mut rest = total - whole * self.cycle_time;
        if !rest.is_finite() {
            rest = 0.0;
        }
        // rounding in the division can leave the remainder one cycle off
        if rest >= self.cycle_time {
            rest -= self.cycle_time;
            rollovers = rollovers.saturating_add(1);
        } else if rest < 0.0 && rollovers > 0 {
            rest += self.cycle_time;
            rollovers -= 1;
        }
        self.elapsed = if (0.0..self.cycle_time).contains(&rest) {
            rest
        } else {
            0.0
        };
        self.completed = self.completed.saturating_add(rollovers);
        rollovers
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_large_step_rolls_over_once() {
        let mut timer = CycleTimer::new(30.0);
        assert_eq!(timer.advance(45.0), 1);
        assert_eq!(timer.cycles_completed(), 1);
        assert_eq!(timer.elapsed(), 15.0);
    }

    #[test]
    fn larger_step_rolls_over_twice() {
        let mut timer = CycleTimer::new(30.0);
        assert_eq!(timer.advance(65.0), 2);
        assert_eq!(timer.cycles_completed(), 2);
        assert_eq!(timer.elapsed(), 5.0);
    }

    #[test]
    fn exact_boundary_resets_to_zero() {
        let mut timer = CycleTimer::new(30.0);
        assert_eq!(timer.advance(10.0), 0);
        assert_eq!(timer.advance(20.0), 1);
        assert_eq!(timer.elapsed(), 0.0);
    }

    #[test]
    fn partial_cycles_do_not_fire() {
        let mut timer = CycleTimer::new(10.0);
        for _ in 0..9 {
            assert_eq!(timer.advance(1.0), 0);
        }
        assert_eq!(timer.cycles_completed(), 0);
        assert_eq!(timer.advance(1.0), 1);
    }

    #[test]
    fn ignores_non_finite_and_negative_steps() {
        let mut timer = CycleTimer::new(10.0);
        assert_eq!(timer.advance(f64::NAN), 0);
        assert_eq!(timer.advance(-5.0), 0);
        assert_eq!(timer.elapsed(), 0.0);
    }

    #[test]
    fn huge_steps_return_promptly_with_elapsed_in_range() {
        let mut timer = CycleTimer::new(30.0);
        let rollovers = timer.advance(1.0e20);
        assert!(rollovers > u64::from(u32::MAX));
        assert_eq!(timer.cycles_completed(), rollovers);
        assert!((0.0..30.0).contains(&timer.elapsed()));
    }

    #[test]
    fn rollover_counts_past_u32_are_exact() {
        let mut timer = CycleTimer::new(10.0);
        assert_eq!(timer.advance(5.0e10), 5_000_000_000);
        assert_eq!(timer.elapsed(), 0.0);
        assert_eq!(timer.advance(5.0), 0);
        assert_eq!(timer.cycles_completed(), 5_000_000_000);
    }

    #[test]
    fn counts_saturate_instead_of_wrapping() {
        let mut timer = CycleTimer::new(1.0e-300);
        assert_eq!(timer.advance(1.0e300), u64::MAX);
        assert_eq!(timer.advance(1.0e300), u64::MAX);
        assert_eq!(timer.cycles_completed(), u64::MAX);
        assert!((0.0..1.0e-300).contains(&timer.elapsed()));
    }
}
