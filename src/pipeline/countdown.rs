//! Seconds-until-refresh counter.

/// Counts down once per second and wraps back to the full period.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Countdown {
    period: u64,
    remaining: u64,
}

impl Countdown {
    /// A zero period is treated as one second.
    pub fn new(period_secs: u64) -> Self {
        let period = period_secs.max(1);
        Self {
            period,
            remaining: period,
        }
    }

    pub fn period(&self) -> u64 {
        self.period
    }

    pub fn remaining(&self) -> u64 {
        self.remaining
    }

    pub fn reset(&mut self) {
        self.remaining = self.period;
    }

    /// Advance one second. Returns `true` when the period has elapsed, in
    /// which case the counter is already back at the full period.
    pub fn tick(&mut self) -> bool {
        if self.remaining <= 1 {
            self.remaining = self.period;
            true
        } else {
            self.remaining -= 1;
            false
        }
    }
}

/// `m:ss` rendering of a second count.
pub fn format_remaining(secs: u64) -> String {
    format!("{}:{:02}", secs / 60, secs % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fires_once_per_period() {
        let mut countdown = Countdown::new(180);
        let fired: Vec<u64> = (1..=360).filter(|_| countdown.tick()).collect();
        assert_eq!(fired.len(), 2);
        assert_eq!(countdown.remaining(), 180);
    }

    #[test]
    fn fires_exactly_at_period_boundary() {
        let mut countdown = Countdown::new(180);
        for _ in 0..179 {
            assert!(!countdown.tick());
        }
        assert_eq!(countdown.remaining(), 1);
        assert!(countdown.tick());
        assert_eq!(countdown.remaining(), 180);
    }

    #[test]
    fn reset_restores_full_period() {
        let mut countdown = Countdown::new(10);
        countdown.tick();
        countdown.tick();
        countdown.reset();
        assert_eq!(countdown.remaining(), 10);
    }

    #[test]
    fn zero_period_is_clamped() {
        let mut countdown = Countdown::new(0);
        assert_eq!(countdown.period(), 1);
        assert!(countdown.tick());
    }

    #[test]
    fn formats_minutes_and_seconds() {
        assert_eq!(format_remaining(180), "3:00");
        assert_eq!(format_remaining(65), "1:05");
        assert_eq!(format_remaining(9), "0:09");
    }
}
