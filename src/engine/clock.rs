//! The shared game clock. A [`TimerWindow`] stores the absolute instant a
//! phase was entered plus its fixed duration; the remaining time is recomputed
//! on every read instead of being decremented by a background task, so there
//! is no counter to drift and no timer callback racing with command handlers.

use std::time::{Duration, Instant};

/// A time-bounded interval attached to a round phase.
///
/// A window is created fresh on every phase entry; it is never adjusted in
/// place. "Resetting" a timer always means replacing the window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerWindow {
    started_at: Option<Instant>,
    duration: Duration,
}

impl TimerWindow {
    /// A window that has not started counting down yet. `remaining` reports
    /// the full duration until [`TimerWindow::start`] replaces it.
    pub fn armed(duration: Duration) -> Self {
        Self {
            started_at: None,
            duration,
        }
    }

    /// Begin a fresh window at `now`. A zero duration yields a window that is
    /// already expired; callers must treat that as "time's up", not an error.
    pub fn start(duration: Duration, now: Instant) -> Self {
        Self {
            started_at: Some(now),
            duration,
        }
    }

    /// The instant this window started, if it has.
    pub fn started_at(&self) -> Option<Instant> {
        self.started_at
    }

    /// The fixed duration this window was created with.
    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Time left in the window as observed at `now`, saturating at zero.
    pub fn remaining(&self, now: Instant) -> Duration {
        match self.started_at {
            Some(started) => self
                .duration
                .saturating_sub(now.saturating_duration_since(started)),
            None => self.duration,
        }
    }

    /// Whether the window has run out as observed at `now`.
    pub fn is_expired(&self, now: Instant) -> bool {
        self.remaining(now).is_zero()
    }

    /// Milliseconds elapsed since the window started, if it has started.
    ///
    /// Used by the serializing authority to timestamp presses and answers
    /// relative to the question opening.
    pub fn elapsed_ms(&self, now: Instant) -> Option<u64> {
        self.started_at
            .map(|started| now.saturating_duration_since(started).as_millis() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn armed_window_reports_full_duration() {
        let window = TimerWindow::armed(Duration::from_secs(30));
        assert_eq!(window.remaining(Instant::now()), Duration::from_secs(30));
        assert!(window.started_at().is_none());
    }

    #[test]
    fn remaining_counts_down_from_start() {
        let t0 = Instant::now();
        let window = TimerWindow::start(Duration::from_secs(10), t0);

        assert_eq!(window.remaining(t0), Duration::from_secs(10));
        assert_eq!(
            window.remaining(t0 + Duration::from_secs(4)),
            Duration::from_secs(6)
        );
        assert_eq!(
            window.remaining(t0 + Duration::from_secs(10)),
            Duration::ZERO
        );
        assert_eq!(
            window.remaining(t0 + Duration::from_secs(25)),
            Duration::ZERO
        );
    }

    #[test]
    fn remaining_is_monotonic_for_an_unchanged_window() {
        let t0 = Instant::now();
        let window = TimerWindow::start(Duration::from_secs(10), t0);

        let mut previous = window.remaining(t0);
        for secs in 1..15 {
            let current = window.remaining(t0 + Duration::from_secs(secs));
            assert!(current <= previous);
            previous = current;
        }
    }

    #[test]
    fn zero_duration_window_is_immediately_expired() {
        let t0 = Instant::now();
        let window = TimerWindow::start(Duration::ZERO, t0);
        assert!(window.is_expired(t0));
        assert_eq!(window.remaining(t0), Duration::ZERO);
    }

    #[test]
    fn elapsed_ms_tracks_time_since_start() {
        let t0 = Instant::now();
        let window = TimerWindow::start(Duration::from_secs(10), t0);
        assert_eq!(window.elapsed_ms(t0 + Duration::from_millis(1500)), Some(1500));
        assert_eq!(TimerWindow::armed(Duration::from_secs(5)).elapsed_ms(t0), None);
    }
}
