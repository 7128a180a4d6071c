use std::time::Duration;

use tokio::time::{Instant, Interval, MissedTickBehavior, interval_at};

/// Periodic keep-alive trigger polled from the session loop.
///
/// While stopped, [`tick`](KeepAlive::tick) never resolves, so the select
/// branch stays idle without a separate guard.
#[derive(Debug, Default)]
pub struct KeepAlive {
    interval: Option<Interval>,
}

impl KeepAlive {
    /// First tick fires one full period after start.
    pub fn start(&mut self, period: Duration) {
        let mut interval = interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        self.interval = Some(interval);
    }

    pub fn cancel(&mut self) {
        self.interval = None;
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.interval.is_some()
    }

    pub async fn tick(&mut self) {
        match self.interval.as_mut() {
            Some(interval) => {
                interval.tick().await;
            }
            None => std::future::pending::<()>().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::timeout;

    #[tokio::test(start_paused = true)]
    async fn test_ticks_after_each_period() {
        let mut keepalive = KeepAlive::default();
        keepalive.start(Duration::from_secs(3));

        let started = Instant::now();
        keepalive.tick().await;
        assert_eq!(started.elapsed(), Duration::from_secs(3));
        keepalive.tick().await;
        assert_eq!(started.elapsed(), Duration::from_secs(6));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_never_ticks() {
        let mut keepalive = KeepAlive::default();
        keepalive.start(Duration::from_secs(1));
        keepalive.cancel();
        assert!(!keepalive.is_active());

        let result = timeout(Duration::from_secs(60), keepalive.tick()).await;
        assert!(result.is_err());
    }
}
