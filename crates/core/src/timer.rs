use thiserror::Error;

/// Countdowns never start below this many seconds.
pub const MIN_COUNTDOWN_SECONDS: u32 = 5;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum TimerError {
    #[error("timer is already running")]
    AlreadyRunning,
}

/// How the timer moves on each tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerMode {
    /// Stopwatch for exercise steps.
    CountUp,
    /// Countdown for treadmill steps, starting at `initial_seconds`.
    CountDown { initial_seconds: u32 },
}

/// Outcome of a single one-second tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerTick {
    /// Nothing is running; the tick was ignored.
    Idle,
    /// The timer moved; `seconds` is the new displayed value.
    Running { seconds: u32 },
    /// A countdown just reached zero.
    Expired,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Running {
    mode: TimerMode,
    seconds: u32,
}

/// Single ticking timer shared by all steps of a run.
///
/// The timer does not read the wall clock. The caller decides when a second
/// has passed and calls [`SessionTimer::tick`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SessionTimer {
    running: Option<Running>,
}

impl SessionTimer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Countdown length for a treadmill target: `max(5, round(minutes * 60))`.
    ///
    /// Non-finite or negative targets yield the minimum.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn countdown_seconds(duration_minutes: f64) -> u32 {
        let seconds = (duration_minutes * 60.0).round();
        if !seconds.is_finite() || seconds <= f64::from(MIN_COUNTDOWN_SECONDS) {
            return MIN_COUNTDOWN_SECONDS;
        }
        if seconds >= f64::from(u32::MAX) {
            return u32::MAX;
        }
        seconds as u32
    }

    /// Arm a stopwatch starting at zero.
    ///
    /// # Errors
    ///
    /// Returns `TimerError::AlreadyRunning` if the timer is running.
    pub fn start_count_up(&mut self) -> Result<(), TimerError> {
        self.arm(TimerMode::CountUp, 0)?;
        Ok(())
    }

    /// Arm a countdown for the given target and return its initial value.
    ///
    /// # Errors
    ///
    /// Returns `TimerError::AlreadyRunning` if the timer is running.
    pub fn start_count_down(&mut self, duration_minutes: f64) -> Result<u32, TimerError> {
        let initial_seconds = Self::countdown_seconds(duration_minutes);
        self.arm(TimerMode::CountDown { initial_seconds }, initial_seconds)?;
        Ok(initial_seconds)
    }

    fn arm(&mut self, mode: TimerMode, seconds: u32) -> Result<(), TimerError> {
        if self.running.is_some() {
            return Err(TimerError::AlreadyRunning);
        }
        self.running = Some(Running { mode, seconds });
        Ok(())
    }

    /// Advance by one second. A countdown floors at zero and reports
    /// `Expired` on every tick once it gets there, until it is stopped.
    pub fn tick(&mut self) -> TimerTick {
        let Some(running) = self.running.as_mut() else {
            return TimerTick::Idle;
        };

        match running.mode {
            TimerMode::CountUp => {
                running.seconds = running.seconds.saturating_add(1);
                TimerTick::Running {
                    seconds: running.seconds,
                }
            }
            TimerMode::CountDown { .. } => {
                running.seconds = running.seconds.saturating_sub(1);
                if running.seconds == 0 {
                    TimerTick::Expired
                } else {
                    TimerTick::Running {
                        seconds: running.seconds,
                    }
                }
            }
        }
    }

    /// Stop the timer and return the elapsed seconds, or `None` if idle.
    ///
    /// Count-up reports the accumulated value; count-down reports
    /// `initial - remaining`.
    pub fn stop(&mut self) -> Option<u32> {
        let running = self.running.take()?;
        Some(match running.mode {
            TimerMode::CountUp => running.seconds,
            TimerMode::CountDown { initial_seconds } => {
                initial_seconds.saturating_sub(running.seconds)
            }
        })
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running.is_some()
    }

    #[must_use]
    pub fn mode(&self) -> Option<TimerMode> {
        self.running.map(|r| r.mode)
    }

    /// Value to display: elapsed for a stopwatch, remaining for a countdown.
    #[must_use]
    pub fn seconds(&self) -> u32 {
        self.running.map_or(0, |r| r.seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn countdown_length_rounds_and_has_floor() {
        assert_eq!(SessionTimer::countdown_seconds(10.0), 600);
        assert_eq!(SessionTimer::countdown_seconds(0.51), 31);
        assert_eq!(SessionTimer::countdown_seconds(0.05), 5);
        assert_eq!(SessionTimer::countdown_seconds(-3.0), 5);
        assert_eq!(SessionTimer::countdown_seconds(f64::NAN), 5);
    }

    #[test]
    fn count_up_accumulates() {
        let mut timer = SessionTimer::new();
        timer.start_count_up().unwrap();
        for _ in 0..42 {
            timer.tick();
        }
        assert_eq!(timer.seconds(), 42);
        assert_eq!(timer.stop(), Some(42));
        assert!(!timer.is_running());
    }

    #[test]
    fn count_down_expires_at_zero() {
        let mut timer = SessionTimer::new();
        assert_eq!(timer.start_count_down(0.1).unwrap(), 6);
        for remaining in (1..6).rev() {
            assert_eq!(timer.tick(), TimerTick::Running { seconds: remaining });
        }
        assert_eq!(timer.tick(), TimerTick::Expired);
        assert_eq!(timer.tick(), TimerTick::Expired);
        assert_eq!(timer.seconds(), 0);
        assert_eq!(timer.stop(), Some(6));
    }

    #[test]
    fn count_down_stopped_early_reports_elapsed() {
        let mut timer = SessionTimer::new();
        timer.start_count_down(10.0).unwrap();
        for _ in 0..75 {
            timer.tick();
        }
        assert_eq!(timer.stop(), Some(75));
    }

    #[test]
    fn rejects_re_entrant_start() {
        let mut timer = SessionTimer::new();
        timer.start_count_up().unwrap();
        assert_eq!(timer.start_count_down(1.0), Err(TimerError::AlreadyRunning));
        assert_eq!(timer.mode(), Some(TimerMode::CountUp));
    }

    #[test]
    fn idle_timer_ignores_ticks() {
        let mut timer = SessionTimer::new();
        assert_eq!(timer.tick(), TimerTick::Idle);
        assert_eq!(timer.stop(), None);
    }
}
