// Shared clock driver: one periodic tick fans out to every watching session.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Result};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::registry::SessionRegistry;

pub struct ClockDriver {
    shutdown_token: CancellationToken,
    handle: Option<JoinHandle<()>>,
    period: Duration,
}

impl ClockDriver {
    /// Spawn the tick loop on the current Tokio runtime.
    ///
    /// The first tick fires one `period` after spawning. Missed ticks are
    /// replayed in a burst so no simulated second is lost when the runtime
    /// falls behind.
    pub fn spawn(registry: Arc<SessionRegistry>, period: Duration) -> Result<Self> {
        if period.is_zero() {
            return Err(anyhow!("clock period must be > 0"));
        }
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| anyhow!("clock driver requires a tokio runtime: {}", e))?;

        let shutdown_token = CancellationToken::new();
        let token = shutdown_token.clone();
        let handle = runtime.spawn(async move {
            Self::run(registry, period, token).await;
        });

        info!("clock driver started, period={}ms", period.as_millis());
        Ok(Self {
            shutdown_token,
            handle: Some(handle),
            period,
        })
    }

    async fn run(registry: Arc<SessionRegistry>, period: Duration, token: CancellationToken) {
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Burst);

        loop {
            tokio::select! {
                biased;
                _ = token.cancelled() => {
                    debug!("clock driver cancelled");
                    break;
                }
                _ = ticker.tick() => {
                    registry.tick_all();
                }
            }
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn is_running(&self) -> bool {
        !self.shutdown_token.is_cancelled()
            && self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Stop ticking. Idempotent. A pass already holding the registry lock
    /// runs to completion.
    pub fn shutdown(&self) {
        if !self.shutdown_token.is_cancelled() {
            info!("clock driver shutting down");
        }
        self.shutdown_token.cancel();
    }

    /// Shut down and wait for the tick task to exit.
    pub async fn join(mut self) {
        self.shutdown();
        if let Some(handle) = self.handle.take() {
            if let Err(e) = handle.await {
                warn!("clock driver task ended abnormally: {}", e);
            }
        }
    }
}

impl Drop for ClockDriver {
    fn drop(&mut self) {
        debug!("ClockDriver dropped, cancelling tick loop");
        self.shutdown_token.cancel();
    }
}
