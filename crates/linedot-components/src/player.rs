//! Drives tween frames on the browser clock
//!
//! One player exists per playing generation. Dropping it cancels the
//! interval, so replacing the player is how a new render interrupts the
//! previous animation.

use gloo_timers::callback::Interval;
use linedot_state::VisualStore;

/// Roughly one frame at 60 Hz
pub const FRAME_INTERVAL_MS: u32 = 16;

/// Milliseconds since a generation started playing
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaybackClock {
    started_ms: f64,
}

impl PlaybackClock {
    pub fn starting_at(started_ms: f64) -> Self {
        Self { started_ms }
    }

    pub fn now() -> Self {
        Self::starting_at(js_sys::Date::now())
    }

    pub fn elapsed(&self, now_ms: f64) -> f64 {
        (now_ms - self.started_ms).max(0.0)
    }
}

pub struct AnimationPlayer {
    generation: u64,
    _interval: Interval,
}

impl AnimationPlayer {
    pub fn start(store: VisualStore, generation: u64) -> Self {
        let clock = PlaybackClock::now();
        let mut settled = false;

        let interval = Interval::new(FRAME_INTERVAL_MS, move || {
            if settled {
                return;
            }
            settled = store.advance(generation, clock.elapsed(js_sys::Date::now()));
            if settled {
                tracing::debug!(generation, "animation settled");
            }
        });

        tracing::debug!(generation, "animation player started");
        Self {
            generation,
            _interval: interval,
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

impl Drop for AnimationPlayer {
    fn drop(&mut self) {
        tracing::debug!(generation = self.generation, "animation player stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clock_never_runs_backwards() {
        let clock = PlaybackClock::starting_at(1_000.0);
        assert_eq!(clock.elapsed(1_250.0), 250.0);
        assert_eq!(clock.elapsed(900.0), 0.0);
    }
}
