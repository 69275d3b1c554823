//! TCP implementation of the [`Connector`] port.

use std::time::Duration;

use tokio::io::AsyncWriteExt as _;
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio_stream::StreamExt as _;
use tokio_util::codec::{AnyDelimiterCodec, FramedRead};

use viamon_app::ports::{Connector, LineReader, Prober, Transport};
use viamon_domain::error::ViamonError;
use viamon_domain::protocol::LINE_DELIMITER;

use crate::command;
use crate::config::ViaConfig;
use crate::error::ViaError;

/// Opens logged-in VIA sessions over TCP.
#[derive(Debug, Clone)]
pub struct TcpConnector {
    config: ViaConfig,
}

impl TcpConnector {
    #[must_use]
    pub fn new(config: ViaConfig) -> Self {
        Self { config }
    }

    async fn open(&self, address: &str) -> Result<Transport<ViaReader, ViaProber>, ViaError> {
        let connect_timeout = self.config.connect_timeout();
        let stream = tokio::time::timeout(
            connect_timeout,
            TcpStream::connect((address, self.config.port)),
        )
        .await
        .map_err(|_| ViaError::ConnectTimeout(connect_timeout))?
        .map_err(ViaError::Connect)?;
        if let Err(err) = stream.set_nodelay(true) {
            tracing::debug!(%err, "unable to disable nagle");
        }

        let (read_half, write_half) = stream.into_split();
        let mut reader = ViaReader::new(read_half, self.config.max_line_length);
        let mut prober = ViaProber {
            writer: write_half,
            keepalive: self.encode(&self.config.keepalive_command),
            write_timeout: self.config.write_timeout(),
        };

        send(&mut prober.writer, &self.encode(command::LOGIN), prober.write_timeout).await?;
        let reply = tokio::time::timeout(connect_timeout, reader.next_line())
            .await
            .map_err(|_| ViaError::ConnectTimeout(connect_timeout))??;
        if reply.contains("Error") {
            return Err(ViaError::LoginRejected {
                reply: reply.trim().to_string(),
            });
        }
        tracing::debug!(reply = reply.trim(), "logged in");

        Ok(Transport { reader, prober })
    }

    fn encode(&self, name: &str) -> Vec<u8> {
        command::encode(&self.config.username, &self.config.password, name, &[]).into_bytes()
    }
}

impl Connector for TcpConnector {
    type Reader = ViaReader;
    type Prober = ViaProber;

    async fn connect(&self, address: &str) -> Result<Transport<ViaReader, ViaProber>, ViamonError> {
        self.open(address).await.map_err(ViaError::into_domain)
    }
}

/// Read half of a VIA session, yielding `\r`-delimited lines.
pub struct ViaReader {
    lines: FramedRead<OwnedReadHalf, AnyDelimiterCodec>,
}

impl ViaReader {
    fn new(read_half: OwnedReadHalf, max_line_length: usize) -> Self {
        let codec = AnyDelimiterCodec::new_with_max_length(
            vec![LINE_DELIMITER],
            vec![LINE_DELIMITER],
            max_line_length,
        );
        Self {
            lines: FramedRead::new(read_half, codec),
        }
    }

    /// Next line without its delimiter. An over-long line ends the
    /// stream, as does any other decode error.
    async fn next_line(&mut self) -> Result<String, ViaError> {
        match self.lines.next().await {
            Some(Ok(bytes)) => Ok(String::from_utf8_lossy(&bytes).into_owned()),
            Some(Err(err)) => Err(ViaError::Read(err)),
            None => Err(ViaError::Closed),
        }
    }
}

impl LineReader for ViaReader {
    async fn read_line(&mut self) -> Result<String, ViamonError> {
        self.next_line().await.map_err(ViaError::into_domain)
    }
}

/// Write half of a VIA session, used to send keepalives.
pub struct ViaProber {
    writer: OwnedWriteHalf,
    keepalive: Vec<u8>,
    write_timeout: Duration,
}

impl Prober for ViaProber {
    async fn probe(&mut self) -> Result<(), ViamonError> {
        send(&mut self.writer, &self.keepalive, self.write_timeout)
            .await
            .map_err(ViaError::into_domain)
    }
}

async fn send(writer: &mut OwnedWriteHalf, request: &[u8], limit: Duration) -> Result<(), ViaError> {
    let write = async {
        writer.write_all(request).await?;
        writer.flush().await
    };
    tokio::time::timeout(limit, write)
        .await
        .map_err(|_| ViaError::WriteTimeout(limit))?
        .map_err(ViaError::Write)
}

#[cfg(test)]
mod tests {
    use tokio::io::{AsyncBufReadExt as _, AsyncWriteExt as _, BufReader};
    use tokio::net::TcpListener;

    use super::*;

    /// Device side of a loopback session.
    struct FakeDevice {
        requests: BufReader<OwnedReadHalf>,
        replies: OwnedWriteHalf,
    }

    impl FakeDevice {
        async fn next_request(&mut self) -> String {
            let mut buf = Vec::new();
            self.requests.read_until(b'\r', &mut buf).await.unwrap();
            String::from_utf8(buf).unwrap()
        }

        async fn send(&mut self, data: &str) {
            self.replies.write_all(data.as_bytes()).await.unwrap();
        }
    }

    async fn listen() -> (TcpListener, TcpConnector) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let config = ViaConfig {
            port: listener.local_addr().unwrap().port(),
            username: "su".to_string(),
            password: "secret".to_string(),
            max_line_length: 64,
            ..ViaConfig::default()
        };
        (listener, TcpConnector::new(config))
    }

    async fn accept(listener: &TcpListener, login_reply: &str) -> FakeDevice {
        let (stream, _) = listener.accept().await.unwrap();
        let (read_half, write_half) = stream.into_split();
        let mut device = FakeDevice {
            requests: BufReader::new(read_half),
            replies: write_half,
        };
        let login = device.next_request().await;
        assert!(login.starts_with("<P><UN>su</UN><Pwd>secret</Pwd><Cmd>Login</Cmd>"));
        device.send(login_reply).await;
        device
    }

    #[tokio::test]
    async fn should_log_in_and_read_lines() {
        let (listener, connector) = listen().await;
        let device = tokio::spawn(async move {
            let mut device = accept(&listener, "Login|Successful\r").await;
            device.send("PList|all|cnt|2\rMediaStatus|ALL|1\r").await;
            device
        });

        let mut transport = connector.connect("127.0.0.1").await.unwrap();
        let _device = device.await.unwrap();

        assert_eq!(transport.reader.read_line().await.unwrap(), "PList|all|cnt|2");
        assert_eq!(transport.reader.read_line().await.unwrap(), "MediaStatus|ALL|1");
    }

    #[tokio::test]
    async fn should_reject_login_error_reply() {
        let (listener, connector) = listen().await;
        let device = tokio::spawn(async move {
            accept(&listener, "Login|Error: invalid credentials\r").await
        });

        let result = connector.connect("127.0.0.1").await;
        let _device = device.await.unwrap();

        let Err(err) = result else {
            panic!("login should have been rejected");
        };
        assert!(err.to_string().contains("login rejected"));
    }

    #[tokio::test]
    async fn should_send_keepalive_on_probe() {
        let (listener, connector) = listen().await;
        let device = tokio::spawn(async move { accept(&listener, "Login|Successful\r").await });

        let mut transport = connector.connect("127.0.0.1").await.unwrap();
        let mut device = device.await.unwrap();

        transport.prober.probe().await.unwrap();
        transport.prober.probe().await.unwrap();

        for _ in 0..2 {
            let request = device.next_request().await;
            assert!(request.contains("<Cmd>IpInfo</Cmd>"));
            assert!(request.ends_with("</P>\r"));
        }
    }

    #[tokio::test]
    async fn should_fail_read_when_device_closes() {
        let (listener, connector) = listen().await;
        let device = tokio::spawn(async move { accept(&listener, "Login|Successful\r").await });

        let mut transport = connector.connect("127.0.0.1").await.unwrap();
        drop(device.await.unwrap());

        let err = transport.reader.read_line().await.unwrap_err();
        assert!(err.to_string().contains("connection closed by device"));
    }

    #[tokio::test]
    async fn should_fail_read_on_over_long_line() {
        let (listener, connector) = listen().await;
        let device = tokio::spawn(async move {
            let mut device = accept(&listener, "Login|Successful\r").await;
            let long = "x".repeat(200);
            device.send(&format!("{long}\rMediaStatus|ALL|0\r")).await;
            device
        });

        let mut transport = connector.connect("127.0.0.1").await.unwrap();
        let _device = device.await.unwrap();

        let err = transport.reader.read_line().await.unwrap_err();
        assert!(err.to_string().contains("failed to read"));
    }

    #[tokio::test]
    async fn should_fail_when_nothing_listens() {
        let (listener, connector) = listen().await;
        drop(listener);

        let result = connector.connect("127.0.0.1").await;
        assert!(matches!(result, Err(ViamonError::Transport(_))));
    }
}
