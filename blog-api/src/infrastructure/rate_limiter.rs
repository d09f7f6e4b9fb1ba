use std::collections::HashMap;
use std::num::NonZeroU32;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use anyhow::{Result, anyhow};
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use tokio::task::JoinHandle;

use super::settings::LimiterSettings;

struct Client {
    limiter: DefaultDirectRateLimiter,
    last_seen: Instant,
}

/// Token bucket per client key (usually the client IP).
///
/// The map lock covers lookup, allocation, the `last_seen` touch and the admit
/// decision, and nothing else.
pub(crate) struct ClientRateLimiter {
    clients: Mutex<HashMap<String, Client>>,
    quota: Quota,
    idle_timeout: Duration,
    enabled: bool,
}

impl ClientRateLimiter {
    pub(crate) fn new(settings: &LimiterSettings) -> Result<Self> {
        let period = Duration::from_secs_f64(1.0 / settings.rps);
        let burst = NonZeroU32::new(settings.burst)
            .ok_or_else(|| anyhow!("limiter burst must be > 0"))?;
        let quota = Quota::with_period(period)
            .ok_or_else(|| anyhow!("limiter rate {} is too high", settings.rps))?
            .allow_burst(burst);

        Ok(Self {
            clients: Mutex::new(HashMap::new()),
            quota,
            idle_timeout: settings.idle_timeout,
            enabled: settings.enabled,
        })
    }

    pub(crate) fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Returns `true` when the request from `key` is admitted.
    pub(crate) fn check(&self, key: &str) -> bool {
        if !self.enabled {
            return true;
        }

        let mut clients = self.clients.lock().unwrap_or_else(PoisonError::into_inner);
        let client = clients.entry(key.to_string()).or_insert_with(|| Client {
            limiter: RateLimiter::direct(self.quota),
            last_seen: Instant::now(),
        });
        client.last_seen = Instant::now();
        client.limiter.check().is_ok()
    }

    /// Drops clients not seen within the idle timeout as of `now`. Returns how many went.
    pub(crate) fn evict_idle(&self, now: Instant) -> usize {
        let mut clients = self.clients.lock().unwrap_or_else(PoisonError::into_inner);
        let before = clients.len();
        clients.retain(|_, client| now.saturating_duration_since(client.last_seen) <= self.idle_timeout);
        before - clients.len()
    }

    pub(crate) fn tracked_clients(&self) -> usize {
        self.clients
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Periodically evicts idle clients until the returned handle is aborted.
    pub(crate) fn spawn_sweeper(self: &Arc<Self>, every: Duration) -> JoinHandle<()> {
        let limiter = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            // first tick completes immediately
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let evicted = limiter.evict_idle(Instant::now());
                if evicted > 0 {
                    tracing::debug!(
                        evicted,
                        remaining = limiter.tracked_clients(),
                        "evicted idle rate-limit clients"
                    );
                }
            }
        })
    }
}
