//! Stage timing.

use std::{
    cell::{Cell, RefCell},
    fmt,
    time::{Duration, Instant},
};

use itertools::Itertools;

const MAX_DURATIONS: usize = 250;

/// A timer that can measure and average the time a pipeline stage takes.
///
/// Collected timings are averaged and reset when the timer is displayed using `{}`
/// ([`std::fmt::Display`]), so printing the timers once per frame (or once per second) always
/// shows the timings of the most recent measurement window.
pub struct Timer {
    name: &'static str,
    durations: RefCell<Vec<Duration>>,
    forgotten: Cell<bool>,
}

impl Timer {
    /// Creates a new timer.
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            durations: Default::default(),
            forgotten: Cell::new(false),
        }
    }

    /// Returns the name this timer was created with.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Invokes a closure, measuring and recording the time it takes.
    pub fn time<T>(&mut self, timee: impl FnOnce() -> T) -> T {
        let _guard = self.start();
        timee()
    }

    /// Starts timing an operation using a drop guard.
    ///
    /// When the returned [`TimerGuard`] is dropped, the time between the call to `start` and the
    /// drop is measured and recorded.
    pub fn start(&mut self) -> TimerGuard<'_> {
        TimerGuard {
            start: Instant::now(),
            timer: self,
        }
    }

    fn record(&mut self, duration: Duration) {
        if self.forgotten.get() {
            return;
        }

        let durations = self.durations.get_mut();
        if durations.len() < MAX_DURATIONS {
            durations.push(duration);
        } else {
            // Nobody is displaying the timer. Keep the memory bounded.
            self.forgotten.set(true);
            durations.clear();
        }
    }

    /// Returns the average of the durations recorded since the timer was last displayed.
    pub fn average(&self) -> Option<Duration> {
        let durations = self.durations.borrow();
        if durations.is_empty() {
            return None;
        }
        Some(durations.iter().sum::<Duration>() / durations.len() as u32)
    }
}

/// Displays the average recorded time and resets it.
impl fmt::Display for Timer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.forgotten.get() {
            self.forgotten.set(false);
            return write!(f, "{}: <forgotten>", self.name);
        }

        let average = self.average();
        let mut durations = self.durations.borrow_mut();
        let len = durations.len();
        durations.clear();

        match average {
            Some(avg) => write!(
                f,
                "{}: {len}x{:.02}ms",
                self.name,
                avg.as_secs_f32() * 1000.0
            ),
            None => write!(f, "{}: -", self.name),
        }
    }
}

/// Guard returned by [`Timer::start`]. Stops timing the operation when dropped.
pub struct TimerGuard<'a> {
    start: Instant,
    timer: &'a mut Timer,
}

impl Drop for TimerGuard<'_> {
    fn drop(&mut self) {
        self.timer.record(self.start.elapsed());
    }
}

/// Formats a set of timers on a single line, resetting each of them.
pub fn format_timers<'a>(timers: impl IntoIterator<Item = &'a Timer>) -> String {
    timers.into_iter().join(", ")
}
