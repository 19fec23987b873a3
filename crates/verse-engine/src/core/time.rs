/// One-second countdown driver.
/// Accumulates variable frame time and reports how many whole seconds elapsed.
/// A stopped countdown swallows all frame time, so no tick from a finished
/// session can leak into the next one.
#[derive(Debug, Clone, Default)]
pub struct Countdown {
    /// Accumulated time since the last whole second.
    accumulator: f32,
    running: bool,
}

impl Countdown {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start (or restart) from a clean second boundary.
    pub fn start(&mut self) {
        self.accumulator = 0.0;
        self.running = true;
    }

    /// Cancel the countdown and discard any partial second.
    pub fn stop(&mut self) {
        self.accumulator = 0.0;
        self.running = false;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Add frame time. Returns the number of whole seconds to tick.
    pub fn accumulate(&mut self, frame_dt: f32) -> u32 {
        if !self.running || !frame_dt.is_finite() || frame_dt <= 0.0 {
            return 0;
        }
        self.accumulator += frame_dt;
        let seconds = self.accumulator.floor();
        self.accumulator -= seconds;
        seconds as u32
    }

    /// Fraction of the current second already elapsed (0.0 to 1.0).
    pub fn alpha(&self) -> f32 {
        self.accumulator
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_second_exact() {
        let mut cd = Countdown::new();
        cd.start();
        assert_eq!(cd.accumulate(1.0), 1);
    }

    #[test]
    fn accumulates_partial() {
        let mut cd = Countdown::new();
        cd.start();
        assert_eq!(cd.accumulate(0.6), 0);
        assert_eq!(cd.accumulate(0.6), 1);
        assert!((cd.alpha() - 0.2).abs() < 1e-4, "alpha was {}", cd.alpha());
    }

    #[test]
    fn long_frames_yield_several_seconds() {
        let mut cd = Countdown::new();
        cd.start();
        assert_eq!(cd.accumulate(3.5), 3);
    }

    #[test]
    fn stopped_countdown_ignores_time() {
        let mut cd = Countdown::new();
        cd.start();
        cd.accumulate(0.9);
        cd.stop();
        assert_eq!(cd.accumulate(5.0), 0);
        cd.start();
        // Partial second from before the stop is gone
        assert_eq!(cd.accumulate(0.2), 0);
    }

    #[test]
    fn rejects_bad_frame_time() {
        let mut cd = Countdown::new();
        cd.start();
        assert_eq!(cd.accumulate(f32::NAN), 0);
        assert_eq!(cd.accumulate(-1.0), 0);
    }
}
