use std::time::Duration;

use instant::Instant;

/// A periodic deadline. A cadence with tolerance may fire up to `tolerance`
/// late so it can share a wakeup with another cadence.
#[derive(Debug, Clone, Copy)]
pub struct Cadence {
    period: Duration,
    tolerance: Duration,
    next: Instant,
}

impl Cadence {
    /// First firing is due at `start`.
    pub fn new(period: Duration, tolerance: Duration, start: Instant) -> Self {
        Self {
            period,
            tolerance,
            next: start,
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn is_due(&self, now: Instant) -> bool {
        now >= self.next
    }

    /// Latest instant the event loop may sleep until.
    pub fn deadline(&self) -> Instant {
        self.next + self.tolerance
    }

    /// Mark one firing. If we fell a whole period or more behind, skip the
    /// missed firings rather than bursting through them.
    pub fn fire(&mut self, now: Instant) {
        self.next += self.period;
        if self.next <= now {
            self.next = now + self.period;
        }
    }

    /// Fire if due. Returns whether it fired.
    pub fn poll(&mut self, now: Instant) -> bool {
        if self.is_due(now) {
            self.fire(now);
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MS: Duration = Duration::from_millis(1);

    #[test]
    fn due_immediately_then_every_period() {
        let t0 = Instant::now();
        let mut c = Cadence::new(200 * MS, Duration::ZERO, t0);
        assert!(c.poll(t0));
        assert!(!c.poll(t0 + 199 * MS));
        assert!(c.poll(t0 + 200 * MS));
        assert!(!c.is_due(t0 + 399 * MS));
        assert!(c.is_due(t0 + 400 * MS));
    }

    #[test]
    fn keeps_phase_when_slightly_late() {
        let t0 = Instant::now();
        let mut c = Cadence::new(200 * MS, Duration::ZERO, t0);
        c.fire(t0);
        // Woken 30ms late: next firing is still on the original grid.
        assert!(c.poll(t0 + 230 * MS));
        assert_eq!(c.deadline(), t0 + 400 * MS);
    }

    #[test]
    fn skips_missed_periods() {
        let t0 = Instant::now();
        let mut c = Cadence::new(200 * MS, Duration::ZERO, t0);
        c.fire(t0);
        let stalled = t0 + 1_050 * MS;
        assert!(c.poll(stalled));
        // One firing, then back to a full period from now.
        assert!(!c.is_due(stalled));
        assert_eq!(c.deadline(), stalled + 200 * MS);
    }

    #[test]
    fn tolerance_extends_deadline_only() {
        let t0 = Instant::now();
        let mut c = Cadence::new(3_000 * MS, 200 * MS, t0);
        c.fire(t0);
        assert_eq!(c.deadline(), t0 + 3_200 * MS);
        assert!(!c.is_due(t0 + 2_999 * MS));
        assert!(c.is_due(t0 + 3_000 * MS));
        assert_eq!(c.period(), 3_000 * MS);
    }
}
