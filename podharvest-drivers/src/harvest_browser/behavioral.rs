use rand::rngs::OsRng;
use rand::Rng;
use std::time::Duration;
use tokio::time::sleep;

#[derive(Debug, Clone)]
/// Inserts short randomized pauses so UI interactions are not fired back to back.
pub struct BehavioralEngine {
    min_ms: u64,
    max_ms: u64,
}

impl Default for BehavioralEngine {
    fn default() -> Self {
        Self::new(250, 900)
    }
}

impl BehavioralEngine {
    pub fn new(min_ms: u64, max_ms: u64) -> Self {
        Self {
            min_ms: min_ms.min(max_ms),
            max_ms: max_ms.max(min_ms),
        }
    }

    /// Pick a pause within the configured bounds.
    pub fn pick(&self) -> Duration {
        let ms = OsRng.gen_range(self.min_ms..=self.max_ms);
        Duration::from_millis(ms)
    }

    /// Sleep for a random duration within the configured bounds.
    pub async fn jitter(&self) {
        sleep(self.pick()).await;
    }
}
