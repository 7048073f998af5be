use crate::constant::{RESTORE_RELEASE_MS, RESTORE_SETTLE_MS};
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq)]
enum Phase {
    Idle,
    /// Waiting for the layout cache of the new content before scrolling
    Settling { target: f32, until: Instant },
    /// Programmatic scroll issued; scroll events are still ours
    Releasing { until: Instant },
}

/// Puts a saved scroll offset back after the content changes.
///
/// While a restore is in flight [`ScrollRestore::is_restoring`] is true and
/// scroll observations must not count as the reader scrolling.
#[derive(Debug, Clone)]
pub struct ScrollRestore {
    phase: Phase,
    settle: Duration,
    release: Duration,
}

impl Default for ScrollRestore {
    fn default() -> Self {
        Self::new(
            Duration::from_millis(RESTORE_SETTLE_MS),
            Duration::from_millis(RESTORE_RELEASE_MS),
        )
    }
}

impl ScrollRestore {
    pub fn new(settle: Duration, release: Duration) -> Self {
        Self {
            phase: Phase::Idle,
            settle,
            release,
        }
    }

    /// Start over for freshly swapped content
    pub fn begin(&mut self, target: f32, now: Instant) {
        self.phase = if target > 0.0 && target.is_finite() {
            Phase::Settling {
                target,
                until: now + self.settle,
            }
        } else {
            Phase::Releasing {
                until: now + self.release,
            }
        };
    }

    /// Advance the state machine. Returns the offset to scroll to when the
    /// settle delay has just elapsed.
    pub fn tick(&mut self, now: Instant) -> Option<f32> {
        match self.phase {
            Phase::Settling { target, until } if now >= until => {
                self.phase = Phase::Releasing {
                    until: now + self.release,
                };
                Some(target)
            }
            Phase::Releasing { until } if now >= until => {
                self.phase = Phase::Idle;
                None
            }
            _ => None,
        }
    }

    pub fn is_restoring(&self) -> bool {
        self.phase != Phase::Idle
    }

    /// When the next transition is due, for scheduling a repaint
    pub fn next_deadline(&self) -> Option<Instant> {
        match self.phase {
            Phase::Idle => None,
            Phase::Settling { until, .. } | Phase::Releasing { until } => Some(until),
        }
    }

    pub fn cancel(&mut self) {
        self.phase = Phase::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_restore_waits_then_scrolls_then_releases() {
        let start = Instant::now();
        let mut restore = ScrollRestore::default();
        restore.begin(1234.0, start);
        assert!(restore.is_restoring());

        assert_eq!(restore.tick(start + ms(50)), None);
        assert_eq!(restore.tick(start + ms(100)), Some(1234.0));
        assert!(restore.is_restoring());

        assert_eq!(restore.tick(start + ms(250)), None);
        assert!(restore.is_restoring());
        assert_eq!(restore.tick(start + ms(300)), None);
        assert!(!restore.is_restoring());
        assert_eq!(restore.next_deadline(), None);
    }

    #[test]
    fn test_nothing_to_restore_still_holds_the_flag() {
        let start = Instant::now();
        let mut restore = ScrollRestore::default();
        restore.begin(0.0, start);
        assert!(restore.is_restoring());
        assert_eq!(restore.next_deadline(), Some(start + ms(200)));

        assert_eq!(restore.tick(start + ms(199)), None);
        assert!(restore.is_restoring());
        assert_eq!(restore.tick(start + ms(200)), None);
        assert!(!restore.is_restoring());
    }

    #[test]
    fn test_new_content_restarts_restore() {
        let start = Instant::now();
        let mut restore = ScrollRestore::default();
        restore.begin(500.0, start);
        restore.begin(900.0, start + ms(80));
        assert_eq!(restore.tick(start + ms(120)), None);
        assert_eq!(restore.tick(start + ms(180)), Some(900.0));

        restore.cancel();
        assert!(!restore.is_restoring());
    }
}
