use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;

pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(5);

/// Source of the pause between attempts. Tests swap in a recorder.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Bounded retry with a constant delay. Every error is retried the same way.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            delay: DEFAULT_RETRY_DELAY,
        }
    }
}

#[derive(Debug)]
pub struct RetryExhausted<E> {
    pub attempts: u32,
    pub last_error: E,
}

impl RetryPolicy {
    /// `max_attempts` is raised to 1 if zero.
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
        }
    }

    /// Run `operation` until it succeeds or the attempt budget is spent.
    ///
    /// The closure receives the 1-based attempt number. The delay is slept
    /// between attempts, not after the last one.
    pub async fn run<T, E, F, Fut>(
        &self,
        sleeper: &dyn Sleeper,
        mut operation: F,
    ) -> Result<T, RetryExhausted<E>>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match operation(attempt).await {
                Ok(value) => return Ok(value),
                Err(last_error) if attempt >= max_attempts => {
                    return Err(RetryExhausted {
                        attempts: attempt,
                        last_error,
                    })
                }
                Err(_) => {
                    sleeper.sleep(self.delay).await;
                    attempt += 1;
                }
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Mutex;
    use std::time::Duration;

    use async_trait::async_trait;

    use super::Sleeper;

    /// Records requested pauses instead of sleeping.
    #[derive(Default)]
    pub struct RecordingSleeper {
        pub slept: Mutex<Vec<Duration>>,
    }

    impl RecordingSleeper {
        pub fn calls(&self) -> Vec<Duration> {
            self.slept.lock().expect("sleeper lock").clone()
        }
    }

    #[async_trait]
    impl Sleeper for RecordingSleeper {
        async fn sleep(&self, duration: Duration) {
            self.slept.lock().expect("sleeper lock").push(duration);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::testing::RecordingSleeper;
    use super::*;

    async fn flaky(calls: &AtomicU32, failures: u32) -> Result<&'static str, String> {
        let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
        if n <= failures {
            Err(format!("boom {n}"))
        } else {
            Ok("report")
        }
    }

    #[tokio::test]
    async fn succeeds_after_fewer_failures_than_the_bound() {
        let sleeper = RecordingSleeper::default();
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy::new(3, Duration::from_secs(5));

        let result = policy.run(&sleeper, |_| flaky(&calls, 2)).await;

        assert_eq!(result.expect("success"), "report");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(sleeper.calls(), vec![Duration::from_secs(5); 2]);
    }

    #[tokio::test]
    async fn exhausts_after_exactly_max_attempts() {
        let sleeper = RecordingSleeper::default();
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy::new(3, Duration::from_secs(5));

        let err = policy
            .run(&sleeper, |_| flaky(&calls, 10))
            .await
            .expect_err("exhausted");

        assert_eq!(err.attempts, 3);
        assert_eq!(err.last_error, "boom 3");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(sleeper.calls().len(), 2);
    }

    #[tokio::test]
    async fn failing_exactly_max_times_is_terminal() {
        let sleeper = RecordingSleeper::default();
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy::default();

        let result = policy.run(&sleeper, |_| flaky(&calls, 3)).await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn attempt_numbers_are_one_based() {
        let sleeper = RecordingSleeper::default();
        let mut seen = Vec::new();
        let policy = RetryPolicy::new(4, Duration::ZERO);

        let _ = policy
            .run(&sleeper, |attempt| {
                seen.push(attempt);
                async { Err::<(), _>("nope") }
            })
            .await;

        assert_eq!(seen, vec![1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn zero_attempts_still_tries_once() {
        let sleeper = RecordingSleeper::default();
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy::new(0, Duration::ZERO);
        assert_eq!(policy.max_attempts, 1);

        let _ = policy.run(&sleeper, |_| flaky(&calls, 5)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn tokio_sleeper_waits_the_delay() {
        let started = tokio::time::Instant::now();
        TokioSleeper.sleep(Duration::from_secs(5)).await;
        assert!(started.elapsed() >= Duration::from_secs(5));
    }
}
