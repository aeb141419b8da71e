//! Scripted controller for gateway tests

#![allow(dead_code)]

use std::future::Future;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpListener;

pub const STEP: Duration = Duration::from_secs(5);

/// Listens where the gateway under test connects to
pub struct Controller {
    listener: TcpListener,
}

impl Controller {
    pub async fn bind() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        Self { listener }
    }

    pub fn port(&self) -> u16 {
        self.listener.local_addr().unwrap().port()
    }

    pub async fn accept(&self) -> Peer {
        let (stream, _) = within(self.listener.accept()).await.unwrap();
        let (read_half, write_half) = stream.into_split();
        Peer {
            reader: BufReader::new(read_half),
            writer: write_half,
        }
    }
}

/// Controller side of one accepted connection
pub struct Peer {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
}

impl Peer {
    /// Next message ending in `delimiter`, without it; `None` on EOF
    pub async fn read_message(&mut self, delimiter: &str) -> Option<String> {
        let mut buffer = Vec::new();
        loop {
            let n = within(self.reader.read_until(b'\n', &mut buffer))
                .await
                .unwrap();
            if n == 0 {
                return None;
            }
            if buffer.ends_with(delimiter.as_bytes()) {
                buffer.truncate(buffer.len() - delimiter.len());
                return Some(String::from_utf8(buffer).unwrap());
            }
        }
    }

    pub async fn expect(&mut self, delimiter: &str, expected: &str) {
        assert_eq!(self.read_message(delimiter).await.as_deref(), Some(expected));
    }

    pub async fn read_bytes(&mut self, n: usize) -> Vec<u8> {
        let mut bytes = vec![0u8; n];
        within(self.reader.read_exact(&mut bytes)).await.unwrap();
        bytes
    }

    pub async fn send(&mut self, bytes: &[u8]) {
        self.writer.write_all(bytes).await.unwrap();
        self.writer.flush().await.unwrap();
    }

    /// Wait for the gateway to hang up, returning whatever it still sent
    pub async fn closed(&mut self) -> Vec<u8> {
        let mut rest = Vec::new();
        within(self.reader.read_to_end(&mut rest)).await.unwrap();
        rest
    }
}

/// Fail the test instead of hanging
pub async fn within<F: Future>(future: F) -> F::Output {
    tokio::time::timeout(STEP, future)
        .await
        .expect("step timed out")
}

/// Poll `condition` until it holds
pub async fn eventually(mut condition: impl FnMut() -> bool) {
    within(async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
}
