use std::time::Duration;
use tokio::time::Instant;

/// Per-worker politeness delay
///
/// Each worker owns one throttle and calls [`Throttle::wait`] before every
/// fetch. The first fetch goes out immediately; later ones wait until at
/// least `delay` has passed since the previous fetch started.
#[derive(Debug)]
pub struct Throttle {
    delay: Duration,
    last_fetch: Option<Instant>,
}

impl Throttle {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            last_fetch: None,
        }
    }

    /// How long the next fetch would have to wait if issued at `now`
    pub fn remaining(&self, now: Instant) -> Duration {
        match self.last_fetch {
            Some(last) => self.delay.saturating_sub(now.saturating_duration_since(last)),
            None => Duration::ZERO,
        }
    }

    /// Sleeps out the remainder of the delay, then records the fetch
    pub async fn wait(&mut self) {
        let remaining = self.remaining(Instant::now());
        if !remaining.is_zero() {
            tokio::time::sleep(remaining).await;
        }
        self.last_fetch = Some(Instant::now());
    }
}
