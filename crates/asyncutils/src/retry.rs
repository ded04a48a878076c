use derive_more::Display;
use std::fmt;
use std::time::Duration;

const DEFAULT_MAX_ATTEMPTS: usize = 3;
const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(1_000);
const DEFAULT_TIMEOUT: Duration = Duration::from_millis(30_000);

/// How a single attempt failed.
#[derive(Debug, Display, Clone, PartialEq, Eq)]
pub enum Attempt<E> {
    #[display("timed out after {}ms", _0.as_millis())]
    TimedOut(Duration),
    #[display("{_0}")]
    Failed(E),
}
impl<E> Attempt<E> {
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::TimedOut(_))
    }

    /// The underlying error, if the attempt did not time out.
    pub fn into_error(self) -> Option<E> {
        match self {
            Self::TimedOut(_) => None,
            Self::Failed(err) => Some(err),
        }
    }
}

/// Every attempt failed; carries the count and the last failure.
#[derive(Debug, Display, Clone, PartialEq, Eq)]
#[display("gave up after {attempts} attempt(s): {last}")]
pub struct Exhausted<E> {
    pub attempts: usize,
    pub last: Attempt<E>,
}
impl<E: fmt::Debug + fmt::Display> std::error::Error for Exhausted<E> {}

/// Timeout race plus linear-backoff retry loop.
///
/// Each attempt is raced against [`timeout`](Self::timeout); a timed-out
/// attempt's future is dropped, which does not guarantee that the remote
/// work it started stops. After failed attempt `n` (1-based) the loop sleeps
/// `n × base_delay` before trying again. No sleep follows the final attempt.
///
/// ```
/// use scriptorium_asyncutils::RetryPolicy;
/// use std::time::Duration;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let policy = RetryPolicy::new(3, Duration::ZERO, Duration::from_secs(1));
/// let value = policy
///     .run(|attempt| async move { if attempt < 2 { Err("flaky") } else { Ok(attempt) } })
///     .await
///     .unwrap();
/// assert_eq!(value, 2);
/// # }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: usize,
    base_delay: Duration,
    timeout: Duration,
}
impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ATTEMPTS, DEFAULT_BASE_DELAY, DEFAULT_TIMEOUT)
    }
}
impl RetryPolicy {
    pub fn new(max_attempts: usize, base_delay: Duration, timeout: Duration) -> Self {
        Self { max_attempts, base_delay, timeout }
    }

    /// Number of attempts made before giving up. Never less than one.
    pub fn max_attempts(&self) -> usize {
        self.max_attempts.max(1)
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Delay slept after failed attempt `attempt` (1-based).
    pub fn delay_after(&self, attempt: usize) -> Duration {
        self.base_delay.saturating_mul(u32::try_from(attempt).unwrap_or(u32::MAX))
    }

    /// Run `operation` until it succeeds or the attempts run out.
    ///
    /// The closure receives the 1-based attempt number and must produce a
    /// fresh future every time it is called.
    pub async fn run<T, E, F, Fut>(&self, mut operation: F) -> Result<T, Exhausted<E>>
    where
        F: FnMut(usize) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: fmt::Display,
    {
        let max_attempts = self.max_attempts();
        let mut attempt = 1;
        loop {
            let failure = match tokio::time::timeout(self.timeout, operation(attempt)).await {
                Ok(Ok(value)) => {
                    if attempt > 1 {
                        tracing::debug!(attempt, "Operation succeeded after retries");
                    }
                    return Ok(value);
                },
                Ok(Err(err)) => Attempt::Failed(err),
                Err(_) => Attempt::TimedOut(self.timeout),
            };
            if attempt >= max_attempts {
                return Err(Exhausted { attempts: attempt, last: failure });
            }
            let delay = self.delay_after(attempt);
            tracing::debug!(
                attempt,
                max_attempts,
                delay_ms = delay.as_millis() as u64,
                error = %failure,
                "Operation failed, retrying",
            );
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::cell::Cell;
    use tokio::time::Instant;

    fn policy() -> RetryPolicy {
        RetryPolicy::new(3, Duration::from_secs(1), Duration::from_secs(30))
    }

    fn assert_elapsed(start: Instant, expected: Duration) {
        let elapsed = start.elapsed();
        assert!(
            elapsed >= expected && elapsed < expected + Duration::from_millis(50),
            "expected ~{expected:?}, got {elapsed:?}"
        );
    }

    #[rstest]
    #[case(1, 1_000)]
    #[case(2, 2_000)]
    #[case(3, 3_000)]
    #[case(10, 10_000)]
    fn test_delay_is_linear(#[case] attempt: usize, #[case] millis: u64) {
        assert_eq!(policy().delay_after(attempt), Duration::from_millis(millis));
    }

    #[test]
    fn test_delay_is_monotonic() {
        let policy = policy();
        let delays: Vec<_> = (1..=8).map(|attempt| policy.delay_after(attempt)).collect();
        assert!(delays.windows(2).all(|pair| pair[0] < pair[1]));
    }

    #[test]
    fn test_zero_attempts_still_tries_once() {
        assert_eq!(RetryPolicy::new(0, Duration::ZERO, Duration::from_secs(1)).max_attempts(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_success_does_not_sleep() {
        let start = Instant::now();
        let value = policy().run(|_| async { Ok::<_, &str>(42) }).await.unwrap();
        assert_eq!(value, 42);
        assert_elapsed(start, Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_after_failures() {
        let start = Instant::now();
        let value = policy()
            .run(|attempt| async move { if attempt < 3 { Err("flaky") } else { Ok(attempt) } })
            .await
            .unwrap();
        assert_eq!(value, 3);
        // 1s after the first failure, 2s after the second.
        assert_elapsed(start, Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausted_after_max_attempts() {
        let calls = Cell::new(0);
        let start = Instant::now();
        let err = policy()
            .run(|attempt| {
                calls.set(calls.get() + 1);
                async move { Err::<(), _>(format!("boom {attempt}")) }
            })
            .await
            .unwrap_err();
        assert_eq!(calls.get(), 3);
        assert_eq!(err.attempts, 3);
        assert_eq!(err.last, Attempt::Failed("boom 3".to_string()));
        assert_eq!(err.to_string(), "gave up after 3 attempt(s): boom 3");
        assert_elapsed(start, Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn test_attempt_times_out() {
        let policy = RetryPolicy::new(2, Duration::from_secs(1), Duration::from_secs(30));
        let start = Instant::now();
        let err = policy
            .run(|_| async {
                tokio::time::sleep(Duration::from_secs(60)).await;
                Ok::<_, &str>(())
            })
            .await
            .unwrap_err();
        assert_eq!(err.attempts, 2);
        assert!(err.last.is_timeout());
        assert_eq!(err.last.into_error(), None);
        assert_elapsed(start, Duration::from_secs(61));
    }
}
