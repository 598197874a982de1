//! # Retry executor.
//!
//! Runs an operation up to [`RetryPolicy::attempts`] times, sleeping the
//! backoff delay between failures. The token is checked before every attempt
//! and raced against every sleep, so cancellation never waits out a delay.

use std::future::Future;

use tokio_util::sync::CancellationToken;

use crate::error::RetryError;
use crate::policies::RetryPolicy;

/// Runs `f` until it succeeds or the attempts are used up.
///
/// `f` receives the 1-based attempt number.
///
/// # Example
/// ```rust
/// use std::time::Duration;
/// use tokio_util::sync::CancellationToken;
/// use flowguard::{BackoffPolicy, RetryPolicy, retry};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let policy = RetryPolicy {
///     max_attempts: 4,
///     backoff: BackoffPolicy::constant(Duration::from_millis(1)),
/// };
/// let res = retry(&policy, &CancellationToken::new(), |attempt| async move {
///     if attempt < 3 { Err("not yet") } else { Ok(attempt) }
/// })
/// .await;
/// assert_eq!(res, Ok(3));
/// # }
/// ```
pub async fn retry<T, E, F, Fut>(
    policy: &RetryPolicy,
    token: &CancellationToken,
    f: F,
) -> Result<T, RetryError<E>>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    retry_if(policy, token, |_| true, f).await
}

/// Like [`retry`], but stops early when `retryable` returns `false` for an error.
pub async fn retry_if<T, E, P, F, Fut>(
    policy: &RetryPolicy,
    token: &CancellationToken,
    retryable: P,
    mut f: F,
) -> Result<T, RetryError<E>>
where
    P: Fn(&E) -> bool,
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let attempts = policy.attempts();
    let mut attempt = 0u32;
    loop {
        if token.is_cancelled() {
            return Err(RetryError::Cancelled);
        }
        attempt += 1;

        let err = match f(attempt).await {
            Ok(v) => return Ok(v),
            Err(e) => e,
        };
        if attempt >= attempts || !retryable(&err) {
            return Err(RetryError::Exhausted { attempts: attempt, last: err });
        }

        let delay = policy.backoff.delay(attempt - 1);
        tracing::debug!(attempt, ?delay, "attempt failed, backing off");
        tokio::select! {
            _ = tokio::time::sleep(delay) => {}
            _ = token.cancelled() => return Err(RetryError::Cancelled),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policies::BackoffPolicy;
    use std::time::Duration;
    use tokio::time::Instant;

    fn policy(attempts: u32, delay_ms: u64) -> RetryPolicy {
        RetryPolicy {
            max_attempts: attempts,
            backoff: BackoffPolicy::constant(Duration::from_millis(delay_ms)),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn gives_up_with_last_error() {
        let start = Instant::now();
        let res: Result<(), _> = retry(&policy(3, 50), &CancellationToken::new(), |n| async move {
            Err(format!("fail {n}"))
        })
        .await;

        assert_eq!(
            res,
            Err(RetryError::Exhausted {
                attempts: 3,
                last: "fail 3".to_string()
            })
        );
        let waited = start.elapsed();
        assert!(waited >= Duration::from_millis(100) && waited < Duration::from_millis(150));
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_interrupts_backoff() {
        let token = CancellationToken::new();
        let canceller = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            canceller.cancel();
        });

        let start = Instant::now();
        let res: Result<(), RetryError<&str>> =
            retry(&policy(5, 1_000), &token, |_| async { Err("down") }).await;
        assert_eq!(res, Err(RetryError::Cancelled));
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test]
    async fn non_retryable_errors_stop_immediately() {
        let mut calls = 0;
        let res: Result<(), _> = retry_if(
            &policy(5, 1),
            &CancellationToken::new(),
            |e: &&str| *e != "fatal",
            |_| {
                calls += 1;
                async { Err("fatal") }
            },
        )
        .await;
        assert_eq!(res, Err(RetryError::Exhausted { attempts: 1, last: "fatal" }));
        assert_eq!(calls, 1);
    }

    #[tokio::test]
    async fn zero_attempts_still_runs_once() {
        let res = retry(&policy(0, 1), &CancellationToken::new(), |n| async move {
            Ok::<_, ()>(n)
        })
        .await;
        assert_eq!(res, Ok(1));
    }
}
