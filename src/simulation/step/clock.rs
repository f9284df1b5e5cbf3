/// Turns wall-clock time into whole fixed steps.
///
/// Leftover time below one step is carried to the next call. The backlog is
/// capped at `max_steps` steps so a stalled host does not spiral.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FixedStepClock {
    accumulator: f64,
}

impl FixedStepClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `elapsed` seconds and return how many steps of `dt` are due.
    pub fn advance(&mut self, elapsed: f64, dt: f64, max_steps: u32) -> u32 {
        if !(elapsed.is_finite() && elapsed > 0.0) || !(dt.is_finite() && dt > 0.0) {
            return 0;
        }
        let cap = dt * max_steps as f64;
        self.accumulator = (self.accumulator + elapsed).min(cap);

        let due = ((self.accumulator / dt).floor() as u32).min(max_steps);
        self.accumulator = (self.accumulator - dt * due as f64).max(0.0);
        due
    }

    /// Time carried over (s).
    pub fn pending(&self) -> f64 {
        self.accumulator
    }

    pub fn reset(&mut self) {
        self.accumulator = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f64 = 1.0 / 60.0;

    #[test]
    fn carries_remainder() {
        let mut clock = FixedStepClock::new();
        assert_eq!(clock.advance(DT * 0.6, DT, 8), 0);
        assert_eq!(clock.advance(DT * 0.6, DT, 8), 1);
        assert!((clock.pending() - DT * 0.2).abs() < 1e-9);
    }

    #[test]
    fn backlog_is_capped() {
        let mut clock = FixedStepClock::new();
        assert_eq!(clock.advance(10.0, DT, 4), 4);
        assert!(clock.pending() < DT);
    }

    #[test]
    fn ignores_bad_input() {
        let mut clock = FixedStepClock::new();
        assert_eq!(clock.advance(f64::NAN, DT, 4), 0);
        assert_eq!(clock.advance(-1.0, DT, 4), 0);
        assert_eq!(clock.pending(), 0.0);
    }
}
