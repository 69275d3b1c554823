//! Heartbeat loop: periodically probes the write side of a transport
//! handle so a connection that stopped responding is torn down.

use std::time::Duration;

use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::monitor::SessionEnd;
use crate::ports::Prober;

pub(super) struct Heartbeat<P> {
    pub prober: P,
    pub interval: Duration,
    pub probe_timeout: Duration,
    pub cancel: CancellationToken,
}

impl<P: Prober> Heartbeat<P> {
    /// Probe every `interval`, starting one interval after the session
    /// opened. The first failed probe ends the session.
    pub(super) async fn run(mut self) -> SessionEnd {
        let mut ticker = tokio::time::interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                () = self.cancel.cancelled() => return SessionEnd::Cancelled,
                _ = ticker.tick() => {}
            }

            let probe = tokio::select! {
                biased;
                () = self.cancel.cancelled() => return SessionEnd::Cancelled,
                probe = tokio::time::timeout(self.probe_timeout, self.prober.probe()) => probe,
            };

            match probe {
                Ok(Ok(())) => tracing::trace!("keepalive sent"),
                Ok(Err(err)) => {
                    tracing::error!(%err, "keepalive failed");
                    return SessionEnd::ProbeFailed(err);
                }
                Err(_) => {
                    tracing::error!(
                        timeout_secs = self.probe_timeout.as_secs(),
                        "keepalive timed out"
                    );
                    return SessionEnd::ProbeTimedOut(self.probe_timeout);
                }
            }
        }
    }
}
