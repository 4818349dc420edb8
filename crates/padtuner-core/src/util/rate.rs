use std::time::{Duration, Instant};

/// Counts ticks in a rolling wall-clock window, reporting an integer
/// per-window rate each time the window elapses.
pub struct RateCounter {
    window: Duration,
    window_start: Instant,
    ticks: u32,
}

impl RateCounter {
    pub fn start(window: Duration) -> Self {
        Self {
            window,
            window_start: Instant::now(),
            ticks: 0,
        }
    }

    /// Records one tick. Returns the closed window's tick count when at
    /// least one full window has elapsed, resetting the window.
    pub fn tick(&mut self) -> Option<u32> {
        self.tick_at(Instant::now())
    }

    fn tick_at(&mut self, now: Instant) -> Option<u32> {
        self.ticks = self.ticks.saturating_add(1);

        if now.duration_since(self.window_start) >= self.window {
            let rate = self.ticks;
            self.ticks = 0;
            self.window_start = now;
            Some(rate)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use super::RateCounter;

    #[test]
    fn reports_ticks_per_window() {
        let mut counter = RateCounter::start(Duration::from_secs(1));
        let start = counter.window_start;

        for n in 1..=59 {
            let now = start + Duration::from_millis(n * 16);
            assert_eq!(counter.tick_at(now), None, "window closed early at tick {n}");
        }

        assert_eq!(counter.tick_at(start + Duration::from_secs(1)), Some(60));
    }

    #[test]
    fn window_resets_after_report() {
        let mut counter = RateCounter::start(Duration::from_secs(1));
        let start = counter.window_start;

        assert_eq!(counter.tick_at(start + Duration::from_secs(1)), Some(1));
        assert_eq!(counter.tick_at(start + Duration::from_millis(1500)), None);
        assert_eq!(counter.tick_at(start + Duration::from_secs(2)), Some(2));
    }
}
