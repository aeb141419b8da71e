//! TCP transport: connecting and line framing
//!
//! Both controllers speak line-oriented text over TCP. The Lutron link is
//! a telnet session, so its reader strips option negotiation via
//! [`TelnetFilter`].

mod error;
mod lines;
mod telnet;

pub use error::TransportError;
pub use lines::LineReader;
pub use telnet::TelnetFilter;

use std::time::Duration;

use tokio::net::TcpStream;
use tracing::debug;

/// Open a TCP connection, giving up after `timeout`
pub async fn connect(host: &str, port: u16, timeout: Duration) -> Result<TcpStream, TransportError> {
    debug!(host, port, "Connecting");
    match tokio::time::timeout(timeout, TcpStream::connect((host, port))).await {
        Ok(Ok(stream)) => {
            // commands are small and latency sensitive
            let _ = stream.set_nodelay(true);
            Ok(stream)
        }
        Ok(Err(e)) => Err(TransportError::ConnectionFailed(e)),
        Err(_) => Err(TransportError::Timeout(format!(
            "connect to {}:{} after {:?}",
            host, port, timeout
        ))),
    }
}
