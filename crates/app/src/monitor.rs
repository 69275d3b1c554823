//! Device monitoring: one supervised session per device.
//!
//! Each device gets a [`Supervisor`] task that obtains a transport handle,
//! runs a read loop and a heartbeat loop on it, and starts over when either
//! loop ends. The [`Fleet`] owns all supervisors under one cancellation
//! scope so that shutdown releases every socket deterministically.

mod heartbeat;
mod read_loop;
mod supervisor;

#[cfg(test)]
pub(crate) mod testing;

use std::fmt;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinError;
use tokio_util::sync::CancellationToken;
use tracing::Instrument as _;

use viamon_domain::device::DeviceIdentity;
use viamon_domain::error::{NotFoundError, ViamonError};
use viamon_domain::event::EventTemplate;
use viamon_domain::id::DeviceId;
use viamon_domain::session::SessionStatus;

use crate::ports::{Connector, EventPublisher};

pub use supervisor::Supervisor;

/// Timing and retry policy shared by every supervisor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonitorPolicy {
    /// Pause between failed connect attempts.
    pub reconnect_interval: Duration,
    /// Inactivity after which a connection is considered dead.
    pub read_timeout: Duration,
    /// Interval between liveness probes.
    pub heartbeat_interval: Duration,
    /// Upper bound on a single probe write.
    pub probe_timeout: Duration,
    /// Consecutive failed connects before giving up; `None` retries forever.
    pub max_attempts: Option<u32>,
}

impl Default for MonitorPolicy {
    fn default() -> Self {
        Self {
            reconnect_interval: Duration::from_secs(10),
            read_timeout: Duration::from_secs(300),
            heartbeat_interval: Duration::from_secs(60),
            probe_timeout: Duration::from_secs(10),
            max_attempts: None,
        }
    }
}

/// Why a monitoring session ended.
#[derive(Debug)]
pub enum SessionEnd {
    /// Reading from the device failed (reset, EOF, …).
    ReadFailed(ViamonError),
    /// Nothing was read within the read timeout.
    ReadTimedOut(Duration),
    /// Sending the keepalive failed.
    ProbeFailed(ViamonError),
    /// Sending the keepalive did not complete within the probe timeout.
    ProbeTimedOut(Duration),
    /// One of the loops panicked.
    LoopAborted(JoinError),
    /// Monitoring was cancelled.
    Cancelled,
}

impl fmt::Display for SessionEnd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ReadFailed(err) => write!(f, "read failed: {err}"),
            Self::ReadTimedOut(after) => write!(f, "no data for {}s", after.as_secs()),
            Self::ProbeFailed(err) => write!(f, "keepalive failed: {err}"),
            Self::ProbeTimedOut(after) => {
                write!(f, "keepalive not sent within {}s", after.as_secs())
            }
            Self::LoopAborted(err) => write!(f, "loop aborted: {err}"),
            Self::Cancelled => f.write_str("cancelled"),
        }
    }
}

struct Monitor {
    device_id: DeviceId,
    status: watch::Receiver<SessionStatus>,
}

/// All running device monitors of the process.
pub struct Fleet {
    cancel: CancellationToken,
    monitors: Vec<Monitor>,
}

impl Fleet {
    /// Spawn one supervisor per device.
    ///
    /// `connector` and `publisher` are shared by every device (typically
    /// `Arc`s). Events are stamped with `generating_system` as their origin.
    /// Must be called from within a tokio runtime.
    pub fn start<C, P>(
        devices: impl IntoIterator<Item = DeviceIdentity>,
        connector: &C,
        publisher: &P,
        generating_system: &str,
        policy: MonitorPolicy,
    ) -> Self
    where
        C: Connector + Clone + 'static,
        P: EventPublisher + Clone + Send + Sync + 'static,
    {
        let cancel = CancellationToken::new();
        let monitors: Vec<Monitor> = devices
            .into_iter()
            .map(|device| {
                let span = tracing::info_span!(
                    "monitor",
                    device_id = %device.id,
                    address = %device.address,
                );
                let template = EventTemplate::for_device(&device, generating_system);
                let device_id = device.id.clone();
                let (supervisor, status) = Supervisor::new(
                    device,
                    connector.clone(),
                    publisher.clone(),
                    template,
                    policy,
                    cancel.child_token(),
                );
                tokio::spawn(supervisor.run().instrument(span));
                Monitor { device_id, status }
            })
            .collect();

        tracing::info!(devices = monitors.len(), "device monitoring started");
        Self { cancel, monitors }
    }

    /// Number of monitored devices.
    #[must_use]
    pub fn len(&self) -> usize {
        self.monitors.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.monitors.is_empty()
    }

    /// Current status of every monitored device, in inventory order.
    #[must_use]
    pub fn statuses(&self) -> Vec<SessionStatus> {
        self.monitors
            .iter()
            .map(|monitor| monitor.status.borrow().clone())
            .collect()
    }

    /// Current status of one device.
    ///
    /// # Errors
    ///
    /// Returns [`ViamonError::NotFound`] when the device is not monitored.
    pub fn status(&self, device_id: &DeviceId) -> Result<SessionStatus, ViamonError> {
        self.monitors
            .iter()
            .find(|monitor| &monitor.device_id == device_id)
            .map(|monitor| monitor.status.borrow().clone())
            .ok_or_else(|| {
                NotFoundError {
                    entity: "Device",
                    id: device_id.to_string(),
                }
                .into()
            })
    }

    /// Cancel every supervisor and wait until each one has released its
    /// transport handle.
    pub async fn shutdown(&self) {
        self.cancel.cancel();
        for monitor in &self.monitors {
            let mut status = monitor.status.clone();
            // An error means the supervisor task is already gone.
            let _ = status.wait_for(|s| s.state.is_terminal()).await;
        }
        tracing::info!("device monitoring stopped");
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::event_bus::InProcessEventBus;
    use crate::monitor::testing::{
        ScriptedConnector, closed, device, fake_transport, test_policy, wait_for,
    };
    use viamon_domain::event::Action;
    use viamon_domain::session::SessionState;

    #[tokio::test(start_paused = true)]
    async fn should_report_status_for_every_device() {
        let (first, _first_link) = fake_transport();
        let (second, _second_link) = fake_transport();
        let connector = Arc::new(
            ScriptedConnector::default()
                .script("10.0.0.1", [first])
                .script("10.0.0.2", [second]),
        );
        let bus = Arc::new(InProcessEventBus::new(16));

        let fleet = Fleet::start(
            [device("VIA1", "10.0.0.1"), device("VIA2", "10.0.0.2")],
            &connector,
            &bus,
            "ITB-1101-CP1",
            test_policy(),
        );
        assert_eq!(fleet.len(), 2);

        for monitor in &fleet.monitors {
            wait_for(monitor.status.clone(), |s| s.state == SessionState::Active).await;
        }

        let statuses = fleet.statuses();
        assert_eq!(statuses[0].device_id.as_str(), "ITB-1101-VIA1");
        assert_eq!(statuses[1].device_id.as_str(), "ITB-1101-VIA2");

        let one = fleet
            .status(&DeviceId::new("ITB-1101-VIA2").unwrap())
            .unwrap();
        assert_eq!(one.address, "10.0.0.2");

        fleet.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn should_return_not_found_for_unknown_device() {
        let connector = Arc::new(ScriptedConnector::default());
        let bus = Arc::new(InProcessEventBus::new(16));
        let fleet = Fleet::start(
            Vec::new(),
            &connector,
            &bus,
            "ITB-1101-CP1",
            test_policy(),
        );

        assert!(fleet.is_empty());
        let result = fleet.status(&DeviceId::new("ITB-1101-VIA9").unwrap());
        assert!(matches!(result, Err(ViamonError::NotFound(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn should_isolate_failures_between_devices() {
        let (first, first_link) = fake_transport();
        let (second, second_link) = fake_transport();
        let connector = Arc::new(
            ScriptedConnector::default()
                .script("10.0.0.1", [first])
                .script("10.0.0.2", [second]),
        );
        let bus = Arc::new(InProcessEventBus::new(16));
        let mut events = bus.subscribe();

        let fleet = Fleet::start(
            [device("VIA1", "10.0.0.1"), device("VIA2", "10.0.0.2")],
            &connector,
            &bus,
            "ITB-1101-CP1",
            test_policy(),
        );
        for monitor in &fleet.monitors {
            wait_for(monitor.status.clone(), |s| s.state == SessionState::Active).await;
        }

        // Kill the first device's connection; it has no further sessions scripted.
        first_link.lines.send(Err(closed())).unwrap();
        wait_for(fleet.monitors[0].status.clone(), |s| s.failed_attempts >= 2).await;

        second_link
            .lines
            .send(Ok("DisplayStatus|Get|jdoe|1".to_string()))
            .unwrap();
        let event = events.recv().await.unwrap();
        assert_eq!(event.device_id.as_str(), "ITB-1101-VIA2");
        assert_eq!(event.action, Action::PresentationStarted);

        let second_status = fleet.statuses().remove(1);
        assert_eq!(second_status.state, SessionState::Active);
        assert_eq!(second_status.sessions, 1);
        assert_eq!(connector.attempts("10.0.0.2"), 1);
        assert!(!second_link.lines.is_closed());

        fleet.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn should_release_every_handle_on_shutdown() {
        let (first, first_link) = fake_transport();
        let connector = Arc::new(ScriptedConnector::default().script("10.0.0.1", [first]));
        let bus = Arc::new(InProcessEventBus::new(16));

        let fleet = Fleet::start(
            [device("VIA1", "10.0.0.1")],
            &connector,
            &bus,
            "ITB-1101-CP1",
            test_policy(),
        );
        wait_for(fleet.monitors[0].status.clone(), |s| {
            s.state == SessionState::Active
        })
        .await;

        fleet.shutdown().await;

        assert_eq!(fleet.statuses()[0].state, SessionState::Stopped);
        assert!(first_link.lines.is_closed());
        assert!(first_link.prober_dropped());
    }

    #[test]
    fn should_default_to_baseline_timings() {
        let policy = MonitorPolicy::default();
        assert_eq!(policy.reconnect_interval, Duration::from_secs(10));
        assert_eq!(policy.read_timeout, Duration::from_secs(300));
        assert_eq!(policy.heartbeat_interval, Duration::from_secs(60));
        assert_eq!(policy.max_attempts, None);
    }

    #[test]
    fn should_describe_session_end() {
        let end = SessionEnd::ReadTimedOut(Duration::from_secs(300));
        assert_eq!(end.to_string(), "no data for 300s");
        assert_eq!(SessionEnd::Cancelled.to_string(), "cancelled");
    }
}
