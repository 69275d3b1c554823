//! Read loop: turns lines from one transport handle into published events.

use std::time::Duration;

use tokio_util::sync::CancellationToken;

use viamon_domain::event::{EventTemplate, now};
use viamon_domain::protocol::{self, Decoded};

use crate::monitor::SessionEnd;
use crate::ports::{EventPublisher, LineReader};

/// Owns the read side of a transport handle until the session ends.
pub(super) struct ReadLoop<R, P> {
    pub reader: R,
    pub publisher: P,
    pub template: EventTemplate,
    pub read_timeout: Duration,
    pub cancel: CancellationToken,
}

impl<R: LineReader, P: EventPublisher> ReadLoop<R, P> {
    /// Read, decode and publish until a read fails, times out, or the
    /// session is cancelled. Publish failures are logged and skipped.
    pub(super) async fn run(mut self) -> SessionEnd {
        loop {
            let read = tokio::select! {
                biased;
                () = self.cancel.cancelled() => return SessionEnd::Cancelled,
                read = tokio::time::timeout(self.read_timeout, self.reader.read_line()) => read,
            };

            let line = match read {
                Ok(Ok(line)) => line,
                Ok(Err(err)) => {
                    tracing::error!(%err, "error reading from device");
                    return SessionEnd::ReadFailed(err);
                }
                Err(_) => {
                    tracing::error!(
                        timeout_secs = self.read_timeout.as_secs(),
                        "no data from device within read timeout"
                    );
                    return SessionEnd::ReadTimedOut(self.read_timeout);
                }
            };

            let record = match protocol::decode(&line) {
                Decoded::Record(record) => record,
                Decoded::Ignored(reason) if reason.is_anomaly() => {
                    tracing::warn!(%reason, line = line.trim(), "dropping malformed line");
                    continue;
                }
                Decoded::Ignored(reason) => {
                    tracing::trace!(%reason, "ignoring line");
                    continue;
                }
            };

            let event = self.template.stamp(record, now());
            tracing::debug!(
                kind = %event.kind,
                action = %event.action,
                state = %event.state,
                user = event.user.as_deref(),
                "publishing event"
            );
            if let Err(err) = self.publisher.publish(event).await {
                tracing::warn!(%err, "failed to publish event, dropping it");
            }
        }
    }
}
