use std::time::Duration;

/// IntervalTimer is the periodic tick source of the race engine. It does not run on its own:
/// elapsed (virtual or wall-clock) time is fed in and full periods are taken out one by one.
#[derive(Debug, Clone)]
pub struct IntervalTimer {
    period: Duration,
    accumulated: Duration,
}

impl IntervalTimer {
    pub fn new(period: Duration) -> IntervalTimer {
        IntervalTimer {
            period,
            accumulated: Duration::ZERO,
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Lets `dt` of time pass on the timer.
    pub fn elapse(&mut self, dt: Duration) {
        self.accumulated += dt;
    }

    /// take_due consumes one full period if one is pending and reports whether the timer fires.
    pub fn take_due(&mut self) -> bool {
        if self.period.is_zero() || self.accumulated < self.period {
            return false;
        }
        self.accumulated -= self.period;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fires_once_per_full_period() {
        let mut timer = IntervalTimer::new(Duration::from_millis(10));
        timer.elapse(Duration::from_millis(35));

        let mut fired = 0;
        while timer.take_due() {
            fired += 1;
        }
        assert_eq!(fired, 3);

        // the partial period carries over
        timer.elapse(Duration::from_millis(5));
        assert!(timer.take_due());
        assert!(!timer.take_due());
    }

    #[test]
    fn does_not_fire_before_first_period() {
        let mut timer = IntervalTimer::new(Duration::from_millis(10));
        timer.elapse(Duration::from_millis(9));
        assert!(!timer.take_due());
    }

    #[test]
    fn zero_period_never_fires() {
        let mut timer = IntervalTimer::new(Duration::ZERO);
        timer.elapse(Duration::from_secs(1));
        assert!(!timer.take_due());
    }
}
