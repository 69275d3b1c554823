//! In-memory transports and helpers shared by the monitor tests.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::{mpsc, watch};

use viamon_domain::device::DeviceIdentity;
use viamon_domain::error::ViamonError;
use viamon_domain::session::SessionStatus;

use crate::monitor::MonitorPolicy;
use crate::ports::{Connector, LineReader, Prober, Transport};

pub(crate) type LineResult = Result<String, ViamonError>;

/// Reader fed by a channel; a dropped sender reads as a closed socket.
pub(crate) struct FakeReader {
    lines: mpsc::UnboundedReceiver<LineResult>,
}

impl LineReader for FakeReader {
    async fn read_line(&mut self) -> Result<String, ViamonError> {
        self.lines.recv().await.unwrap_or_else(|| Err(closed()))
    }
}

pub(crate) struct FakeProber {
    probes: Arc<AtomicU32>,
    fail: Arc<AtomicBool>,
    hang: Arc<AtomicBool>,
    dropped: Arc<AtomicBool>,
}

impl Prober for FakeProber {
    async fn probe(&mut self) -> Result<(), ViamonError> {
        self.probes.fetch_add(1, Ordering::SeqCst);
        if self.hang.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        if self.fail.load(Ordering::SeqCst) {
            return Err(ViamonError::Transport("broken pipe".into()));
        }
        Ok(())
    }
}

impl Drop for FakeProber {
    fn drop(&mut self) {
        self.dropped.store(true, Ordering::SeqCst);
    }
}

/// The test's end of a fake transport.
pub(crate) struct FakeLink {
    pub lines: mpsc::UnboundedSender<LineResult>,
    pub probes: Arc<AtomicU32>,
    pub fail_probes: Arc<AtomicBool>,
    pub hang_probes: Arc<AtomicBool>,
    dropped: Arc<AtomicBool>,
}

impl FakeLink {
    pub fn probe_count(&self) -> u32 {
        self.probes.load(Ordering::SeqCst)
    }

    pub fn prober_dropped(&self) -> bool {
        self.dropped.load(Ordering::SeqCst)
    }
}

pub(crate) fn fake_transport() -> (Transport<FakeReader, FakeProber>, FakeLink) {
    let (tx, rx) = mpsc::unbounded_channel();
    let probes = Arc::new(AtomicU32::new(0));
    let fail = Arc::new(AtomicBool::new(false));
    let hang = Arc::new(AtomicBool::new(false));
    let dropped = Arc::new(AtomicBool::new(false));

    let transport = Transport {
        reader: FakeReader { lines: rx },
        prober: FakeProber {
            probes: Arc::clone(&probes),
            fail: Arc::clone(&fail),
            hang: Arc::clone(&hang),
            dropped: Arc::clone(&dropped),
        },
    };
    let link = FakeLink {
        lines: tx,
        probes,
        fail_probes: fail,
        hang_probes: hang,
        dropped,
    };
    (transport, link)
}

#[derive(Default)]
struct Script {
    transports: HashMap<String, VecDeque<Transport<FakeReader, FakeProber>>>,
    attempts: HashMap<String, u32>,
}

/// Connector handing out pre-built transports per address, refusing once
/// an address has none left.
#[derive(Default)]
pub(crate) struct ScriptedConnector {
    script: Mutex<Script>,
    in_flight: AtomicU32,
    max_in_flight: AtomicU32,
}

impl ScriptedConnector {
    pub fn script(
        self,
        address: &str,
        transports: impl IntoIterator<Item = Transport<FakeReader, FakeProber>>,
    ) -> Self {
        for transport in transports {
            self.push(address, transport);
        }
        self
    }

    /// Queue one more transport for `address` on a running connector.
    pub fn push(&self, address: &str, transport: Transport<FakeReader, FakeProber>) {
        self.script
            .lock()
            .unwrap()
            .transports
            .entry(address.to_string())
            .or_default()
            .push_back(transport);
    }

    pub fn attempts(&self, address: &str) -> u32 {
        self.script
            .lock()
            .unwrap()
            .attempts
            .get(address)
            .copied()
            .unwrap_or(0)
    }

    pub fn max_in_flight(&self) -> u32 {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

impl Connector for ScriptedConnector {
    type Reader = FakeReader;
    type Prober = FakeProber;

    async fn connect(
        &self,
        address: &str,
    ) -> Result<Transport<FakeReader, FakeProber>, ViamonError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        tokio::task::yield_now().await;

        let next = {
            let mut script = self.script.lock().unwrap();
            *script.attempts.entry(address.to_string()).or_default() += 1;
            script
                .transports
                .get_mut(address)
                .and_then(VecDeque::pop_front)
        };
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        next.ok_or_else(|| ViamonError::Transport("connection refused".into()))
    }
}

pub(crate) fn closed() -> ViamonError {
    ViamonError::Transport(Box::new(std::io::Error::new(
        std::io::ErrorKind::UnexpectedEof,
        "connection closed",
    )))
}

pub(crate) fn device(name: &str, address: &str) -> DeviceIdentity {
    DeviceIdentity::builder()
        .id(format!("ITB-1101-{name}"))
        .address(address)
        .room_id("ITB-1101")
        .build()
        .unwrap()
}

/// Fast reconnects, heartbeats every minute, and a read timeout long
/// enough that it never fires unless a test wants it to.
pub(crate) fn test_policy() -> MonitorPolicy {
    MonitorPolicy {
        reconnect_interval: Duration::from_secs(10),
        read_timeout: Duration::from_secs(24 * 3600),
        heartbeat_interval: Duration::from_secs(60),
        probe_timeout: Duration::from_secs(5),
        max_attempts: None,
    }
}

/// Wait (in virtual time) until the status matches, failing after an hour.
pub(crate) async fn wait_for(
    mut status: watch::Receiver<SessionStatus>,
    predicate: impl FnMut(&SessionStatus) -> bool,
) -> SessionStatus {
    let matched = tokio::time::timeout(Duration::from_secs(3600), status.wait_for(predicate))
        .await
        .expect("status never matched")
        .expect("supervisor dropped its status")
        .clone();
    matched
}
