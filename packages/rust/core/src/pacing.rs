//! Minimum-interval pacing between batch targets.

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use prospector_shared::PacingConfig;

/// Spaces target starts at least `min_interval` apart.
#[derive(Debug)]
pub struct Pacer {
    config: PacingConfig,
    last_start: Option<Instant>,
}

impl Pacer {
    pub fn new(config: PacingConfig) -> Self {
        Self {
            config,
            last_start: None,
        }
    }

    /// Wait until the next start is allowed and record it.
    ///
    /// Returns `false` without recording a start if `cancel` fires while waiting.
    pub async fn ready(&mut self, cancel: &CancellationToken) -> bool {
        if let Some(last) = self.last_start {
            let due = last + self.config.min_interval;
            if due > Instant::now() {
                tokio::select! {
                    _ = tokio::time::sleep_until(due) => {}
                    _ = cancel.cancelled() => return false,
                }
            }
        }

        if cancel.is_cancelled() {
            return false;
        }

        self.last_start = Some(Instant::now());
        true
    }
}
