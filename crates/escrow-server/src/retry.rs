use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use rand::Rng;
use tracing::{error, info, warn};

/// Exponential backoff for startup checks. `attempts` counts every try,
/// including the first.
#[derive(Debug, Clone, PartialEq)]
pub struct BackoffPolicy {
    pub attempts: u32,
    pub base_delay: Duration,
    pub multiplier: f64,
    pub max_delay: Duration,
    pub jitter: Duration,
}

impl BackoffPolicy {
    /// Wait after the `failed`-th failure (1-based), before jitter.
    pub fn delay_for(&self, failed: u32) -> Duration {
        let exponent = failed.saturating_sub(1).min(i32::MAX as u32) as i32;
        let secs = self.base_delay.as_secs_f64() * self.multiplier.powi(exponent);
        Duration::try_from_secs_f64(secs)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }

    fn jittered(&self, failed: u32) -> Duration {
        let delay = self.delay_for(failed);
        let jitter_ms = self.jitter.as_millis() as u64;
        if jitter_ms == 0 {
            return delay;
        }
        delay + Duration::from_millis(rand::rng().random_range(0..=jitter_ms))
    }
}

/// Run `op` until it succeeds or the policy runs out of attempts. The last
/// error is returned unchanged.
pub async fn retry<T, E, F, Fut>(what: &str, policy: &BackoffPolicy, mut op: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    let mut failed = 0;
    loop {
        match op().await {
            Ok(value) => {
                if failed > 0 {
                    info!("{} succeeded after {} failed attempt(s)", what, failed);
                }
                return Ok(value);
            }
            Err(e) => {
                failed += 1;
                if failed >= policy.attempts {
                    error!("{} failed after {} attempts: {:#}", what, failed, e);
                    return Err(e);
                }
                let delay = policy.jittered(failed);
                warn!(
                    "{} attempt {}/{} failed: {:#}; retrying in {:?}",
                    what, failed, policy.attempts, e, delay
                );
                tokio::time::sleep(delay).await;
            }
        }
    }
}
