//! Elapsed-time checkpoints for build logging.

use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Records named checkpoints and reports time elapsed since them.
#[derive(Debug)]
pub struct PerfTimer {
    start: Instant,
    events: HashMap<&'static str, Instant>,
}

impl Default for PerfTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl PerfTimer {
    #[must_use]
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
            events: HashMap::new(),
        }
    }

    /// Start (or restart) a named checkpoint.
    pub fn add_event(&mut self, name: &'static str) {
        self.events.insert(name, Instant::now());
    }

    /// Time since the named checkpoint, or since creation if it was never added.
    #[must_use]
    pub fn since(&self, name: &'static str) -> Duration {
        self.events.get(name).unwrap_or(&self.start).elapsed()
    }

    /// Milliseconds since the named checkpoint.
    #[must_use]
    pub fn since_ms(&self, name: &'static str) -> u64 {
        duration_ms(self.since(name))
    }

    /// Milliseconds since creation.
    #[must_use]
    pub fn elapsed_ms(&self) -> u64 {
        duration_ms(self.start.elapsed())
    }

    /// Time since creation.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

fn duration_ms(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_event_falls_back_to_start() {
        let timer = PerfTimer::new();
        assert!(timer.since("never") >= Duration::ZERO);
        assert!(timer.since("never") <= timer.elapsed() + Duration::from_millis(1));
    }

    #[test]
    fn test_event_is_more_recent_than_start() {
        let mut timer = PerfTimer::new();
        std::thread::sleep(Duration::from_millis(5));
        timer.add_event("emit");
        assert!(timer.since("emit") < timer.elapsed());
    }
}
