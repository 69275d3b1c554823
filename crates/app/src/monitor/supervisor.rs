//! Connection supervisor: keeps one device's monitoring session moving
//! towards "connected and observed".
//!
//! The supervisor is an explicit state machine
//! (`Connecting → Active → Closing → Connecting …`). It is the only owner
//! of the transport handle: the two loops each receive one half, and the
//! supervisor waits for both to return before asking for a fresh handle,
//! so two generations of a connection never coexist.

use tokio::sync::watch;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::Instrument as _;

use viamon_domain::device::DeviceIdentity;
use viamon_domain::event::EventTemplate;
use viamon_domain::session::{SessionState, SessionStatus};

use crate::monitor::heartbeat::Heartbeat;
use crate::monitor::read_loop::ReadLoop;
use crate::monitor::{MonitorPolicy, SessionEnd};
use crate::ports::{Connector, EventPublisher, Transport};

/// Per-device control loop owning the connect/reconnect lifecycle.
pub struct Supervisor<C, P> {
    device: DeviceIdentity,
    connector: C,
    publisher: P,
    template: EventTemplate,
    policy: MonitorPolicy,
    cancel: CancellationToken,
    status: watch::Sender<SessionStatus>,
}

type Handle<C> = Transport<<C as Connector>::Reader, <C as Connector>::Prober>;

impl<C, P> Supervisor<C, P>
where
    C: Connector + 'static,
    P: EventPublisher + Clone + Send + Sync + 'static,
{
    /// Create a supervisor and the receiver its status is reported on.
    ///
    /// Nothing happens until [`run`](Self::run) is awaited or spawned.
    pub fn new(
        device: DeviceIdentity,
        connector: C,
        publisher: P,
        template: EventTemplate,
        policy: MonitorPolicy,
        cancel: CancellationToken,
    ) -> (Self, watch::Receiver<SessionStatus>) {
        let (status, receiver) = watch::channel(SessionStatus::new(&device));
        let supervisor = Self {
            device,
            connector,
            publisher,
            template,
            policy,
            cancel,
            status,
        };
        (supervisor, receiver)
    }

    /// Run until cancelled or, with a bounded retry policy, until the
    /// device could not be reached `max_attempts` times in a row.
    pub async fn run(self) {
        let terminal = loop {
            self.transition(SessionState::Connecting);
            let transport = match self.connect().await {
                Ok(transport) => transport,
                Err(terminal) => break terminal,
            };

            self.transition(SessionState::Active);
            tracing::info!("connected to device, monitoring");

            let end = self.observe(transport).await;
            self.transition(SessionState::Closing);
            if matches!(end, SessionEnd::Cancelled) {
                break SessionState::Stopped;
            }
            tracing::warn!(reason = %end, "connection to device is dying, reconnecting");
        };

        self.transition(terminal);
        tracing::info!(state = %terminal, "monitoring ended");
    }

    fn transition(&self, state: SessionState) {
        self.status.send_modify(|status| status.transition(state));
    }

    /// Obtain a fresh handle, retrying at a fixed interval.
    ///
    /// Returns the terminal state to enter when no handle will be obtained.
    async fn connect(&self) -> Result<Handle<C>, SessionState> {
        let mut attempt: u32 = 0;
        loop {
            attempt = attempt.saturating_add(1);
            let result = tokio::select! {
                biased;
                () = self.cancel.cancelled() => return Err(SessionState::Stopped),
                result = self.connector.connect(&self.device.address) => result,
            };

            let err = match result {
                Ok(transport) => return Ok(transport),
                Err(err) => err,
            };
            self.status
                .send_modify(|status| status.failed_attempts = attempt);

            if self.policy.max_attempts.is_some_and(|max| attempt >= max) {
                tracing::error!(%err, attempt, "connect failed, giving up on device");
                return Err(SessionState::GaveUp);
            }
            tracing::warn!(
                %err,
                attempt,
                retry_in_secs = self.policy.reconnect_interval.as_secs(),
                "connect failed, retrying"
            );

            tokio::select! {
                biased;
                () = self.cancel.cancelled() => return Err(SessionState::Stopped),
                () = tokio::time::sleep(self.policy.reconnect_interval) => {}
            }
        }
    }

    /// Run both loops on `transport` until the first one ends, then stop
    /// the other and wait for it so the handle is fully released.
    async fn observe(&self, transport: Handle<C>) -> SessionEnd {
        let session = self.cancel.child_token();
        let Transport { reader, prober } = transport;

        let mut loops = JoinSet::new();
        loops.spawn(
            ReadLoop {
                reader,
                publisher: self.publisher.clone(),
                template: self.template.clone(),
                read_timeout: self.policy.read_timeout,
                cancel: session.clone(),
            }
            .run()
            .in_current_span(),
        );
        loops.spawn(
            Heartbeat {
                prober,
                interval: self.policy.heartbeat_interval,
                probe_timeout: self.policy.probe_timeout,
                cancel: session.clone(),
            }
            .run()
            .in_current_span(),
        );

        let end = match loops.join_next().await {
            Some(Ok(end)) => end,
            Some(Err(err)) => SessionEnd::LoopAborted(err),
            None => SessionEnd::Cancelled,
        };

        session.cancel();
        while let Some(result) = loops.join_next().await {
            if let Err(err) = result {
                tracing::warn!(%err, "loop aborted while closing session");
            }
        }
        end
    }
}
