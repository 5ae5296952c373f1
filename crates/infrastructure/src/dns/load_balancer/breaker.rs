use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Consecutive failures that trip a closed breaker.
const FAILURE_THRESHOLD: u32 = 5;
/// Consecutive half-open successes that re-close the breaker.
const SUCCESS_THRESHOLD: u32 = 3;
/// How long an open breaker refuses traffic before probing.
const OPEN_COOLDOWN: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakerState {
    Closed,
    Open,
    HalfOpen,
}

#[derive(Debug)]
struct BreakerInner {
    state: BreakerState,
    consecutive_failures: u32,
    half_open_successes: u32,
    last_failure: Option<Instant>,
    last_success: Option<Instant>,
    opened_at: Option<Instant>,
}

/// Per-upstream circuit breaker.
///
/// All timing flows through explicit `now` arguments so transitions are
/// exactly reproducible; callers pass `Instant::now()`.
#[derive(Debug)]
pub struct CircuitBreaker {
    inner: Mutex<BreakerInner>,
}

impl Default for CircuitBreaker {
    fn default() -> Self {
        Self::new()
    }
}

impl CircuitBreaker {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(BreakerInner {
                state: BreakerState::Closed,
                consecutive_failures: 0,
                half_open_successes: 0,
                last_failure: None,
                last_success: None,
                opened_at: None,
            }),
        }
    }

    pub fn state(&self) -> BreakerState {
        self.inner.lock().unwrap().state
    }

    /// Whether a request may be sent now. An open breaker whose cooldown
    /// has elapsed flips to half-open and admits the probe.
    pub fn allow_request(&self, now: Instant) -> bool {
        let mut inner = self.inner.lock().unwrap();
        match inner.state {
            BreakerState::Closed | BreakerState::HalfOpen => true,
            BreakerState::Open => {
                let cooled = inner
                    .opened_at
                    .is_some_and(|opened| now.duration_since(opened) >= OPEN_COOLDOWN);
                if cooled {
                    inner.state = BreakerState::HalfOpen;
                    inner.half_open_successes = 0;
                    true
                } else {
                    false
                }
            }
        }
    }

    /// Flip open → half-open once the cooldown has elapsed. Called by the
    /// maintenance scan so state stays fresh between queries.
    pub fn maintain(&self, now: Instant) {
        let mut inner = self.inner.lock().unwrap();
        if inner.state == BreakerState::Open {
            let cooled = inner
                .opened_at
                .is_some_and(|opened| now.duration_since(opened) >= OPEN_COOLDOWN);
            if cooled {
                inner.state = BreakerState::HalfOpen;
                inner.half_open_successes = 0;
            }
        }
    }

    pub fn record_success(&self, now: Instant) {
        let mut inner = self.inner.lock().unwrap();
        inner.last_success = Some(now);
        match inner.state {
            BreakerState::Closed => {
                inner.consecutive_failures = 0;
            }
            BreakerState::HalfOpen => {
                inner.half_open_successes += 1;
                if inner.half_open_successes >= SUCCESS_THRESHOLD {
                    inner.state = BreakerState::Closed;
                    inner.consecutive_failures = 0;
                    inner.half_open_successes = 0;
                    inner.opened_at = None;
                }
            }
            // A straggler success after the breaker opened changes nothing.
            BreakerState::Open => {}
        }
    }

    pub fn record_failure(&self, now: Instant) {
        let mut inner = self.inner.lock().unwrap();
        inner.last_failure = Some(now);
        match inner.state {
            BreakerState::Closed => {
                inner.consecutive_failures += 1;
                if inner.consecutive_failures >= FAILURE_THRESHOLD {
                    inner.state = BreakerState::Open;
                    inner.opened_at = Some(now);
                }
            }
            BreakerState::HalfOpen => {
                inner.state = BreakerState::Open;
                inner.opened_at = Some(now);
                inner.half_open_successes = 0;
            }
            BreakerState::Open => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn five_consecutive_failures_open_the_breaker() {
        let breaker = CircuitBreaker::new();
        let now = Instant::now();
        for _ in 0..4 {
            breaker.record_failure(now);
            assert_eq!(breaker.state(), BreakerState::Closed);
        }
        breaker.record_failure(now);
        assert_eq!(breaker.state(), BreakerState::Open);
        assert!(!breaker.allow_request(now));
    }

    #[test]
    fn success_resets_the_failure_streak() {
        let breaker = CircuitBreaker::new();
        let now = Instant::now();
        for _ in 0..4 {
            breaker.record_failure(now);
        }
        breaker.record_success(now);
        for _ in 0..4 {
            breaker.record_failure(now);
        }
        assert_eq!(breaker.state(), BreakerState::Closed);
    }

    #[test]
    fn cooldown_admits_a_half_open_probe() {
        let breaker = CircuitBreaker::new();
        let now = Instant::now();
        for _ in 0..5 {
            breaker.record_failure(now);
        }
        assert!(!breaker.allow_request(now + Duration::from_secs(29)));
        assert!(breaker.allow_request(now + Duration::from_secs(30)));
        assert_eq!(breaker.state(), BreakerState::HalfOpen);
    }

    #[test]
    fn three_half_open_successes_close_the_breaker() {
        let breaker = CircuitBreaker::new();
        let now = Instant::now();
        for _ in 0..5 {
            breaker.record_failure(now);
        }
        let probe_time = now + Duration::from_secs(31);
        assert!(breaker.allow_request(probe_time));
        breaker.record_success(probe_time);
        breaker.record_success(probe_time);
        assert_eq!(breaker.state(), BreakerState::HalfOpen);
        breaker.record_success(probe_time);
        assert_eq!(breaker.state(), BreakerState::Closed);
    }

    #[test]
    fn half_open_failure_reopens_immediately() {
        let breaker = CircuitBreaker::new();
        let now = Instant::now();
        for _ in 0..5 {
            breaker.record_failure(now);
        }
        let probe_time = now + Duration::from_secs(31);
        assert!(breaker.allow_request(probe_time));
        breaker.record_failure(probe_time);
        assert_eq!(breaker.state(), BreakerState::Open);
        assert!(!breaker.allow_request(probe_time + Duration::from_secs(29)));
        assert!(breaker.allow_request(probe_time + Duration::from_secs(30)));
    }

    #[test]
    fn maintain_promotes_cooled_breaker() {
        let breaker = CircuitBreaker::new();
        let now = Instant::now();
        for _ in 0..5 {
            breaker.record_failure(now);
        }
        breaker.maintain(now + Duration::from_secs(29));
        assert_eq!(breaker.state(), BreakerState::Open);
        breaker.maintain(now + Duration::from_secs(30));
        assert_eq!(breaker.state(), BreakerState::HalfOpen);
    }
}
