use anyhow::{bail, Result};
use rand::Rng;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::debug;

/// Random spacing between consecutive requests of one crawler, across pages
/// and authors alike.
#[derive(Debug)]
pub struct Politeness {
    min: Duration,
    max: Duration,
    last_request: Mutex<Option<Instant>>,
}

impl Politeness {
    pub fn new(min: Duration, max: Duration) -> Result<Self> {
        if min > max {
            bail!("Delay minimum {:?} exceeds maximum {:?}", min, max);
        }
        Ok(Self {
            min,
            max,
            last_request: Mutex::new(None),
        })
    }

    pub fn from_millis(min_ms: u64, max_ms: u64) -> Result<Self> {
        Self::new(Duration::from_millis(min_ms), Duration::from_millis(max_ms))
    }

    pub fn next_delay(&self) -> Duration {
        if self.min == self.max {
            return self.min;
        }
        let min_ms = self.min.as_millis() as u64;
        let max_ms = self.max.as_millis() as u64;
        Duration::from_millis(rand::thread_rng().gen_range(min_ms..=max_ms))
    }

    /// Waits out whatever is left of the delay since the previous request,
    /// then marks a new request as started. The first call never waits.
    pub async fn pace(&self) -> Duration {
        let mut last = self.last_request.lock().await;

        let mut waited = Duration::ZERO;
        if let Some(previous) = *last {
            let remaining = self.next_delay().saturating_sub(previous.elapsed());
            if !remaining.is_zero() {
                debug!("Waiting {:?} before next request", remaining);
                tokio::time::sleep(remaining).await;
                waited = remaining;
            }
        }

        *last = Some(Instant::now());
        waited
    }
}
