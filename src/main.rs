//! Inflight Cache demo
//!
//! Puts the cache in front of a simulated slow lookup and fires a burst of
//! concurrent requests for the same keys. Only one request per key reaches
//! the lookup; the rest wait for its result.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use inflight_cache::{Cache, CacheOptions, Wait};

const CALLERS_PER_KEY: usize = 5;
const KEYS: [&str; 3] = ["user:1", "user:2", "user:3"];

/// Stand-in for a remote call.
async fn slow_lookup(key: &str, calls: &AtomicU32) -> String {
    calls.fetch_add(1, Ordering::Relaxed);
    tokio::time::sleep(Duration::from_millis(200)).await;
    format!("profile for {key}")
}

async fn cached_lookup(
    cache: &Cache<String>,
    key: &str,
    calls: &AtomicU32,
) -> anyhow::Result<String> {
    if let Some(value) = cache.get(key, Wait::Timeout(Duration::from_secs(2))).await {
        return Ok(value);
    }

    // Either we are the producer or the wait timed out: compute it ourselves
    let value = slow_lookup(key, calls).await;
    cache
        .set(key, value.clone(), None)
        .with_context(|| format!("failed to cache {key}"))?;
    Ok(value)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to debug for this crate, can be overridden with RUST_LOG
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "inflight_cache=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let options = CacheOptions::from_env();
    info!(
        "Options loaded: disabled={}, default_ttl={}ms, clean_interval={}ms, max_keys={:?}",
        options.disabled,
        options.default_ttl_ms,
        options.clean_cache_interval_ms,
        options.key_limit()
    );

    let cache = Arc::new(Cache::new(options));
    let calls = Arc::new(AtomicU32::new(0));

    let mut handles = Vec::new();
    for key in KEYS {
        for _ in 0..CALLERS_PER_KEY {
            let cache = cache.clone();
            let calls = calls.clone();
            handles.push(tokio::spawn(async move {
                cached_lookup(&cache, key, &calls).await
            }));
        }
    }

    for handle in handles {
        let value = handle.await.context("lookup task panicked")??;
        info!("Resolved: {}", value);
    }

    info!(
        "{} requests served with {} slow lookups",
        KEYS.len() * CALLERS_PER_KEY,
        calls.load(Ordering::Relaxed)
    );
    let stats = cache.stats();
    info!(
        "Stats: {} (hit rate {:.2})",
        serde_json::to_string(&stats).context("failed to encode stats")?,
        stats.hit_rate()
    );
    if let Some(ttl) = cache.ttl(KEYS[0]) {
        info!("{} stays cached for another {:?}", KEYS[0], ttl);
    }

    cache.shutdown();
    info!("Demo complete");
    Ok(())
}
