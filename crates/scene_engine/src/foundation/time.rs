//! Time management utilities

use std::time::Instant;

/// High-precision timer for host frame timing
pub struct Timer {
    last_frame: Instant,
    delta_time: f64,
    total_time: f64,
    frame_count: u64,
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}

impl Timer {
    /// Create a new timer
    pub fn new() -> Self {
        Self {
            last_frame: Instant::now(),
            delta_time: 0.0,
            total_time: 0.0,
            frame_count: 0,
        }
    }

    /// Update the timer (should be called once per frame)
    pub fn update(&mut self) {
        let now = Instant::now();
        self.delta_time = now.duration_since(self.last_frame).as_secs_f64();
        self.total_time += self.delta_time;
        self.last_frame = now;
        self.frame_count += 1;
    }

    /// Get the time since the last frame in seconds
    pub fn delta_time(&self) -> f64 {
        self.delta_time
    }

    /// Get the total elapsed time since timer creation
    pub fn total_time(&self) -> f64 {
        self.total_time
    }

    /// Get the current frame count
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }
}

/// Fixed-timestep accumulator
///
/// Variable frame times are accumulated and paid out in whole steps of
/// `step`. Leftover time carries over to the next frame.
#[derive(Debug, Clone)]
pub struct FixedTimestep {
    step: f64,
    accumulator: f64,
}

impl FixedTimestep {
    /// Create an accumulator that pays out steps of `step` seconds
    pub fn new(step: f64) -> Self {
        Self {
            step,
            accumulator: 0.0,
        }
    }

    /// Length of one fixed step in seconds
    pub fn step(&self) -> f64 {
        self.step
    }

    /// Time accumulated but not yet consumed
    pub fn accumulated(&self) -> f64 {
        self.accumulator
    }

    /// Add elapsed frame time
    pub fn accumulate(&mut self, delta_time: f64) {
        self.accumulator += delta_time;
    }

    /// Consume one step if enough time has accumulated
    pub fn consume_step(&mut self) -> bool {
        if self.step > 0.0 && self.accumulator >= self.step {
            self.accumulator -= self.step;
            true
        } else {
            false
        }
    }

    /// Drop any accumulated time
    pub fn reset(&mut self) {
        self.accumulator = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_fixed_timestep_pays_whole_steps() {
        let mut fixed = FixedTimestep::new(0.25);
        fixed.accumulate(0.6);

        let mut steps = 0;
        while fixed.consume_step() {
            steps += 1;
        }

        assert_eq!(steps, 2);
        assert_relative_eq!(fixed.accumulated(), 0.1, epsilon = 1e-12);
    }

    #[test]
    fn test_fixed_timestep_carries_remainder() {
        let mut fixed = FixedTimestep::new(0.5);
        fixed.accumulate(0.3);
        assert!(!fixed.consume_step());

        fixed.accumulate(0.3);
        assert!(fixed.consume_step());
        assert!(!fixed.consume_step());
    }

    #[test]
    fn test_zero_step_never_pays_out() {
        let mut fixed = FixedTimestep::new(0.0);
        fixed.accumulate(1.0);
        assert!(!fixed.consume_step());
    }

    #[test]
    fn test_timer_counts_frames() {
        let mut timer = Timer::new();
        timer.update();
        timer.update();
        assert_eq!(timer.frame_count(), 2);
        assert!(timer.total_time() >= timer.delta_time());
    }
}
