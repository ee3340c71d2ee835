use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Time source seam for the limiter, so window behavior is testable with a
/// deterministic clock.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

/// Wall-clock time source used in production.
#[derive(Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Deterministic clock for tests: starts at a fixed instant and only moves
/// when advanced.
#[derive(Debug)]
pub struct ManualClock {
    base: Instant,
    offset: Mutex<Duration>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            base: Instant::now(),
            offset: Mutex::new(Duration::ZERO),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut offset = self
            .offset
            .lock()
            .expect("manual clock offset should not be poisoned");
        *offset += by;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        let offset = self
            .offset
            .lock()
            .expect("manual clock offset should not be poisoned");
        self.base + *offset
    }
}

/// Sliding-window admission control for one upstream provider.
///
/// Tracks the instants of admitted requests; at most `max_requests` are
/// admitted within any trailing window. Clones share state, so one limiter
/// instance governs every caller of its provider within the process. State
/// is in-memory only: a restart resets the counter, which can briefly
/// overshoot the upstream quota (accepted risk), and horizontally scaled
/// deployments each enforce the quota independently.
#[derive(Clone)]
pub struct SlidingWindowLimiter {
    clock: Arc<dyn Clock>,
    admitted: Arc<Mutex<VecDeque<Instant>>>,
}

impl SlidingWindowLimiter {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            admitted: Arc::new(Mutex::new(VecDeque::new())),
        }
    }

    /// Admission check: prunes instants older than the window, then either
    /// records now and admits, or denies without recording anything.
    pub fn try_acquire(&self, max_requests: u32, window: Duration) -> bool {
        let now = self.clock.now();
        let mut admitted = self
            .admitted
            .lock()
            .expect("limiter state should not be poisoned");
        prune(&mut admitted, now, window);

        if admitted.len() >= max_requests as usize {
            return false;
        }

        admitted.push_back(now);
        true
    }

    /// Time until the oldest counted request leaves the window. Zero exactly
    /// when `try_acquire` would admit. Prunes, but never records.
    pub fn wait_time(&self, max_requests: u32, window: Duration) -> Duration {
        let now = self.clock.now();
        let mut admitted = self
            .admitted
            .lock()
            .expect("limiter state should not be poisoned");
        prune(&mut admitted, now, window);

        if admitted.len() < max_requests as usize {
            return Duration::ZERO;
        }

        match admitted.front() {
            Some(oldest) => window.saturating_sub(now.saturating_duration_since(*oldest)),
            None => Duration::ZERO,
        }
    }
}

impl Default for SlidingWindowLimiter {
    fn default() -> Self {
        Self::new()
    }
}

fn prune(admitted: &mut VecDeque<Instant>, now: Instant, window: Duration) {
    while let Some(oldest) = admitted.front() {
        if now.saturating_duration_since(*oldest) < window {
            break;
        }
        admitted.pop_front();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WINDOW: Duration = Duration::from_secs(60);

    fn limiter_with_manual_clock() -> (SlidingWindowLimiter, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new());
        let limiter = SlidingWindowLimiter::with_clock(clock.clone());
        (limiter, clock)
    }

    #[test]
    fn denies_after_quota_and_recovers_after_window() {
        let (limiter, clock) = limiter_with_manual_clock();

        for _ in 0..5 {
            assert!(limiter.try_acquire(5, WINDOW));
        }
        assert!(!limiter.try_acquire(5, WINDOW));

        clock.advance(WINDOW);
        assert!(limiter.try_acquire(5, WINDOW));
    }

    #[test]
    fn denied_call_records_nothing() {
        let (limiter, clock) = limiter_with_manual_clock();

        assert!(limiter.try_acquire(1, WINDOW));
        assert!(!limiter.try_acquire(1, WINDOW));
        assert!(!limiter.try_acquire(1, WINDOW));

        // Only the single admitted instant counts; once it ages out the
        // quota is whole again.
        clock.advance(WINDOW);
        assert!(limiter.try_acquire(1, WINDOW));
    }

    #[test]
    fn wait_time_is_zero_iff_acquire_would_admit() {
        let (limiter, clock) = limiter_with_manual_clock();

        assert_eq!(limiter.wait_time(2, WINDOW), Duration::ZERO);
        assert!(limiter.try_acquire(2, WINDOW));
        assert_eq!(limiter.wait_time(2, WINDOW), Duration::ZERO);
        assert!(limiter.try_acquire(2, WINDOW));

        clock.advance(Duration::from_secs(10));
        let wait = limiter.wait_time(2, WINDOW);
        assert_eq!(wait, Duration::from_secs(50));

        clock.advance(wait);
        assert_eq!(limiter.wait_time(2, WINDOW), Duration::ZERO);
        assert!(limiter.try_acquire(2, WINDOW));
    }

    #[test]
    fn wait_time_only_prunes() {
        let (limiter, clock) = limiter_with_manual_clock();

        assert!(limiter.try_acquire(1, WINDOW));
        clock.advance(Duration::from_secs(59));
        assert!(limiter.wait_time(1, WINDOW) > Duration::ZERO);

        clock.advance(Duration::from_secs(1));
        // Repeated wait_time calls must not consume quota.
        assert_eq!(limiter.wait_time(1, WINDOW), Duration::ZERO);
        assert_eq!(limiter.wait_time(1, WINDOW), Duration::ZERO);
        assert!(limiter.try_acquire(1, WINDOW));
    }

    #[test]
    fn clones_share_quota() {
        let (limiter, _clock) = limiter_with_manual_clock();
        let other = limiter.clone();

        assert!(limiter.try_acquire(1, WINDOW));
        assert!(!other.try_acquire(1, WINDOW));
    }

    #[test]
    fn separate_instances_enforce_independently() {
        // Each process (or each constructed limiter) has its own window;
        // scaled-out deployments multiply the effective quota.
        let first = SlidingWindowLimiter::new();
        let second = SlidingWindowLimiter::new();

        assert!(first.try_acquire(1, WINDOW));
        assert!(second.try_acquire(1, WINDOW));
        assert!(!first.try_acquire(1, WINDOW));
    }
}
