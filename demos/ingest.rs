//! # Rate-limited ingest pipeline
//!
//! Demonstrates the flowguard building blocks working together:
//! - `Pipeline` source → `RateLimiter` → `fan_out` workers → `fan_in`
//! - a flaky dependency guarded by `CircuitBreaker` and `retry`
//! - `ServiceManager` with `LogWriter` and graceful shutdown
//!
//! Run with: `cargo run --example ingest --features logging`
//! Stops by itself after a few seconds, or on Ctrl+C.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use flowguard::{
    BackoffPolicy, CircuitBreaker, CircuitBreakerConfig, Config, LogWriter, Pipeline, RateLimiter,
    RetryPolicy, ServiceError, ServiceFn, ServiceManager, ServiceRef, retry,
};

/// Pretends to call a remote store that fails every third request.
async fn store(calls: &AtomicU64, id: u64) -> Result<String, String> {
    let n = calls.fetch_add(1, Ordering::Relaxed);
    tokio::time::sleep(Duration::from_millis(20)).await;
    if n % 3 == 2 {
        Err(format!("store timeout for #{id}"))
    } else {
        Ok(format!("#{id} stored"))
    }
}

fn ingest(breaker: Arc<CircuitBreaker>) -> ServiceRef {
    let calls = Arc::new(AtomicU64::new(0));

    ServiceFn::arc("ingest", move |token: CancellationToken| {
        let breaker = breaker.clone();
        let calls = calls.clone();

        async move {
            let pipe = Pipeline::new(token.clone()).with_buffer(4);
            let ids = pipe.source(0u64..);
            let paced = RateLimiter::with_burst(Duration::from_millis(100), 3)
                .wrap(&token, ids, |id| async move { id });

            let policy = RetryPolicy {
                max_attempts: 3,
                backoff: BackoffPolicy::constant(Duration::from_millis(50)),
            };
            let workers = pipe.fan_out(paced, 2, move |id| {
                let (breaker, calls, token) = (breaker.clone(), calls.clone(), token.clone());
                async move {
                    retry(&policy, &token, |_| breaker.call(|| store(&calls, id)))
                        .await
                        .map_err(|e| e.to_string())
                }
            });

            let mut results = pipe.fan_in(workers);
            while let Some(res) = results.recv().await {
                match res {
                    Ok(line) => println!("✅ {line}"),
                    Err(e) => println!("⚠️  {e}"),
                }
            }
            Ok::<_, ServiceError>(())
        }
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_target(false).init();

    let manager = ServiceManager::builder(Config {
        stop_timeout: Duration::from_secs(3),
        ..Config::default()
    })
    .with_subscribers(vec![Arc::new(LogWriter::new())])
    .build();

    let breaker = Arc::new(
        CircuitBreaker::new(CircuitBreakerConfig {
            name: "store".into(),
            failure_threshold: 2,
            open_timeout: Duration::from_millis(300),
            single_probe: true,
        })
        .with_bus(manager.bus().clone()),
    );
    manager.register(ingest(breaker))?;

    let token = manager.token();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(3)).await;
        token.cancel();
    });

    manager.run_until_signal().await?;
    println!("\n✅ ingest stopped cleanly");
    Ok(())
}
