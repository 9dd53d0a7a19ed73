//! Readiness polling — block until an observed condition becomes true, or a
//! timeout budget runs out.
//!
//! A background task probes on a fixed interval and delivers the ready value
//! over a single-slot channel; the caller races that channel against the
//! timeout. On timeout the task is told to stop through a cancellation
//! signal rather than being abandoned.

use std::future::Future;
use std::time::Duration;

use certo_core::error::{CertoError, Result};
use tokio::sync::{oneshot, watch};

/// Fixed retry interval used by the deployment check's waits.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Poll `probe` every `interval` until it reports ready, errors, or
/// `timeout` elapses.
///
/// The probe returns `Ok(Some(value))` when the condition holds,
/// `Ok(None)` when it does not hold yet, and `Err` for a terminal API
/// failure. Exactly one outcome is produced per invocation: the ready
/// value, the probe's error, or [`CertoError::Timeout`].
///
/// A probe already in flight when the timeout fires is allowed to finish;
/// the background task observes the cancellation signal between probes and
/// exits promptly instead of sleeping out its next cycle.
pub async fn wait_for<T, F, Fut>(probe: F, timeout: Duration, interval: Duration) -> Result<T>
where
    T: Send + 'static,
    F: Fn() -> Fut + Send + 'static,
    Fut: Future<Output = Result<Option<T>>> + Send,
{
    let (result_tx, result_rx) = oneshot::channel();
    let (cancel_tx, mut cancel_rx) = watch::channel(false);

    tokio::spawn(async move {
        loop {
            match probe().await {
                Ok(Some(value)) => {
                    let _ = result_tx.send(Ok(value));
                    return;
                }
                Err(e) => {
                    let _ = result_tx.send(Err(e));
                    return;
                }
                Ok(None) => {}
            }

            tokio::select! {
                _ = tokio::time::sleep(interval) => {}
                // Fires on cancellation and when the caller goes away.
                _ = cancel_rx.changed() => return,
            }
        }
    });

    tokio::select! {
        result = result_rx => match result {
            Ok(outcome) => outcome,
            Err(_) => Err(CertoError::Other(
                "readiness probe task exited without a result".to_string(),
            )),
        },
        _ = tokio::time::sleep(timeout) => {
            let _ = cancel_tx.send(true);
            Err(CertoError::Timeout(format!(
                "condition not met within {:.1}s",
                timeout.as_secs_f64()
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Instant;

    #[tokio::test]
    async fn test_ready_value_is_returned() {
        let result = wait_for(
            || async { Ok(Some(42)) },
            Duration::from_millis(500),
            Duration::from_millis(10),
        )
        .await;
        assert_eq!(result.unwrap(), 42);
    }

    #[tokio::test]
    async fn test_timeout_when_never_ready() {
        let started = Instant::now();
        let result: Result<()> = wait_for(
            || async { Ok(None) },
            Duration::from_millis(50),
            Duration::from_millis(10),
        )
        .await;
        let elapsed = started.elapsed();

        assert!(matches!(result, Err(CertoError::Timeout(_))));
        // Bounded overshoot: the timeout plus at most one in-flight cycle.
        assert!(elapsed >= Duration::from_millis(50));
        assert!(elapsed < Duration::from_millis(200), "took {elapsed:?}");
    }

    #[tokio::test]
    async fn test_success_race_beats_timeout() {
        let calls = Arc::new(AtomicUsize::new(0));
        let probe_calls = Arc::clone(&calls);
        let started = Instant::now();

        let result = wait_for(
            move || {
                let calls = Arc::clone(&probe_calls);
                async move {
                    if calls.fetch_add(1, Ordering::SeqCst) + 1 >= 3 {
                        Ok(Some("ready"))
                    } else {
                        Ok(None)
                    }
                }
            },
            Duration::from_secs(5),
            Duration::from_millis(10),
        )
        .await;
        let elapsed = started.elapsed();

        assert_eq!(result.unwrap(), "ready");
        // Third probe lands around two intervals in, nowhere near the
        // 5s budget.
        assert!(elapsed < Duration::from_millis(500), "took {elapsed:?}");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_probe_error_is_terminal() {
        let calls = Arc::new(AtomicUsize::new(0));
        let probe_calls = Arc::clone(&calls);

        let result: Result<()> = wait_for(
            move || {
                let calls = Arc::clone(&probe_calls);
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Err(CertoError::ClusterError {
                        kind: "Subscription".to_string(),
                        message: "api unavailable".to_string(),
                    })
                }
            },
            Duration::from_secs(5),
            Duration::from_millis(10),
        )
        .await;

        assert!(matches!(result, Err(CertoError::ClusterError { .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_probe_stops_after_timeout() {
        let calls = Arc::new(AtomicUsize::new(0));
        let probe_calls = Arc::clone(&calls);

        let result: Result<()> = wait_for(
            move || {
                let calls = Arc::clone(&probe_calls);
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(None)
                }
            },
            Duration::from_millis(40),
            Duration::from_millis(10),
        )
        .await;
        assert!(matches!(result, Err(CertoError::Timeout(_))));

        // The cancellation signal reaches the task between probes; after a
        // settling window the call count must stop moving.
        tokio::time::sleep(Duration::from_millis(30)).await;
        let settled = calls.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(calls.load(Ordering::SeqCst), settled);
    }

    #[tokio::test]
    async fn test_each_invocation_is_independent() {
        let first: Result<u8> = wait_for(
            || async { Ok(None) },
            Duration::from_millis(30),
            Duration::from_millis(10),
        )
        .await;
        assert!(first.is_err());

        let second = wait_for(
            || async { Ok(Some(7u8)) },
            Duration::from_millis(30),
            Duration::from_millis(10),
        )
        .await;
        assert_eq!(second.unwrap(), 7);
    }
}
