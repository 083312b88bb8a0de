//! Shared utilities for integration testing.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use bank_server::config::BankConfig;
use bank_server::net::{ConnectionTracker, ServerError};
use bank_server::protocol::frame::write_frame;
use bank_server::protocol::{FrameReader, REQUEST_FRAME_LEN, RESPONSE_FRAME_LEN};
use bank_server::{AccountStore, BankServer, Listener, Shutdown};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::task::JoinHandle;

/// A server running on an ephemeral local port.
pub struct TestServer {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
    pub store: Arc<AccountStore>,
    pub tracker: ConnectionTracker,
    pub task: JoinHandle<Result<(), ServerError>>,
}

/// Config suited to tests: loopback, no snapshots, no idle timeout.
pub fn test_config() -> BankConfig {
    let mut config = BankConfig::default();
    config.listener.bind_address = "127.0.0.1:0".into();
    config.snapshot.enabled = false;
    config.session.idle_timeout_secs = 0;
    config.shutdown.drain_timeout_secs = 10;
    config
}

pub async fn start_server(config: BankConfig) -> TestServer {
    let listener = Listener::bind(&config.listener).await.unwrap();
    let addr = listener.local_addr().unwrap();

    let server = BankServer::new(config);
    let store = server.store();
    let tracker = server.tracker();
    let shutdown = Shutdown::new();
    let task = tokio::spawn(server.run(listener, shutdown.subscribe()));

    TestServer {
        addr,
        shutdown,
        store,
        tracker,
        task,
    }
}

/// Framed client speaking the bank protocol.
pub struct TestClient {
    reader: FrameReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
}

impl TestClient {
    pub async fn connect(addr: SocketAddr) -> Self {
        let stream = TcpStream::connect(addr).await.unwrap();
        let (read_half, writer) = stream.into_split();
        Self {
            reader: FrameReader::new(read_half, RESPONSE_FRAME_LEN),
            writer,
        }
    }

    pub async fn send(&mut self, line: &str) {
        write_frame(&mut self.writer, line, REQUEST_FRAME_LEN).await.unwrap();
    }

    /// Send `payload` as one request frame without any encoding checks.
    #[allow(dead_code)]
    pub async fn send_raw(&mut self, payload: &[u8]) {
        let mut frame = vec![0u8; REQUEST_FRAME_LEN];
        frame[..payload.len()].copy_from_slice(payload);
        self.writer.write_all(&frame).await.unwrap();
    }

    /// Next response, or `None` once the server closed the connection.
    pub async fn recv(&mut self) -> Option<String> {
        tokio::time::timeout(Duration::from_secs(5), self.reader.read_frame())
            .await
            .expect("timed out waiting for the server")
            .unwrap()
    }

    pub async fn request(&mut self, line: &str) -> String {
        self.send(line).await;
        self.recv().await.expect("connection closed before a response")
    }
}

/// Poll `check` until it holds or a few seconds pass.
#[allow(dead_code)]
pub async fn eventually<F: Fn() -> bool>(check: F) -> bool {
    for _ in 0..100 {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    check()
}
