//! Connection supervisor shared by all line-based gateways
//!
//! One supervisor task per gateway connects, spawns a reader and a writer
//! for the socket, awaits the reader and starts over. Transport errors
//! never leave this module; they are logged and answered with a reconnect.

use std::fmt::Display;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::io::AsyncWriteExt;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::queue::{Coalescable, MessageQueue};
use crate::session::{Session, SessionState};
use crate::transport::{self, LineReader, TransportError};

/// Where and how patiently to connect
#[derive(Debug, Clone)]
pub struct LinkSettings {
    pub host: String,
    pub port: u16,
    pub connect_timeout: Duration,
    /// Pause after a failed connect attempt
    pub retry_delay: Duration,
}

/// What the reader does after handling a line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineOutcome {
    Continue,
    /// End the session, optionally waiting before the next connect
    Disconnect { cool_down: Option<Duration> },
}

/// Protocol-specific half of a gateway
pub trait LineProtocol: Send + Sync + 'static {
    type Message: Coalescable + Display + Send + 'static;

    /// Short protocol name used in log fields
    const NAME: &'static str;

    fn link(&self) -> &Link<Self::Message>;

    /// Terminator appended to every written message
    fn delimiter(&self) -> &'static str;

    /// Whether inbound bytes carry telnet negotiation
    fn telnet(&self) -> bool {
        false
    }

    /// Credentials sent on connect and whenever the peer asks again
    fn login_line(&self) -> Option<String> {
        None
    }

    /// Whether the writer may drain the queue in `state`
    fn is_ready(&self, state: SessionState) -> bool;

    /// Handle one inbound line; must not fail on malformed input
    fn handle_line(&self, line: &str) -> LineOutcome;
}

/// Connection resources owned by a gateway
pub struct Link<M> {
    settings: LinkSettings,
    session: Session,
    queue: MessageQueue<M>,
    supervisor: Mutex<Supervisor>,
}

/// The running supervisor task and the generation it was started with
///
/// A supervisor only touches the session while its generation is current,
/// so a task that is still winding down after `shutdown` cannot move the
/// state away from `NotConnected`.
#[derive(Default)]
struct Supervisor {
    handle: Option<JoinHandle<()>>,
    generation: u64,
}

impl<M: Coalescable + Display + Send + 'static> Link<M> {
    pub fn new(settings: LinkSettings, queue: MessageQueue<M>) -> Self {
        Self {
            settings,
            session: Session::new(),
            queue,
            supervisor: Mutex::new(Supervisor::default()),
        }
    }

    pub fn settings(&self) -> &LinkSettings {
        &self.settings
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn queue(&self) -> &MessageQueue<M> {
        &self.queue
    }

    pub fn is_running(&self) -> bool {
        self.supervisor
            .lock()
            .handle
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Stop the supervisor together with its reader and writer
    ///
    /// Pending messages stay queued for the next start.
    pub fn shutdown(&self) {
        let mut supervisor = self.supervisor.lock();
        supervisor.generation += 1;
        if let Some(handle) = supervisor.handle.take() {
            handle.abort();
        }
        self.session.reset();
    }

    /// Run `change` on the session unless `generation` was shut down
    fn guarded<R>(&self, generation: u64, change: impl FnOnce(&Session) -> R) -> Option<R> {
        let supervisor = self.supervisor.lock();
        (supervisor.generation == generation).then(|| change(&self.session))
    }
}

/// Spawn the supervisor for `protocol` unless it is already running
///
/// Does nothing outside a tokio runtime.
pub fn start<P: LineProtocol>(protocol: &Arc<P>) {
    let link = protocol.link();
    let mut supervisor = link.supervisor.lock();
    if supervisor.handle.as_ref().is_some_and(|h| !h.is_finished()) {
        return;
    }
    if tokio::runtime::Handle::try_current().is_err() {
        warn!(gateway = P::NAME, "No async runtime, connection not started");
        return;
    }
    info!(
        gateway = P::NAME,
        host = %link.settings.host,
        port = link.settings.port,
        "Starting connection supervisor"
    );
    supervisor.generation += 1;
    let generation = supervisor.generation;
    supervisor.handle = Some(tokio::spawn(supervise(protocol.clone(), generation)));
}

/// Aborts the wrapped task when dropped
struct AbortOnDrop<T>(JoinHandle<T>);

impl<T> Drop for AbortOnDrop<T> {
    fn drop(&mut self) {
        self.0.abort();
    }
}

async fn supervise<P: LineProtocol>(protocol: Arc<P>, generation: u64) {
    let link = protocol.link();
    let settings = &link.settings;
    loop {
        let connecting = link.guarded(generation, |session| {
            session.reset();
            session.transition(SessionState::Connecting)
        });
        match connecting {
            None => return,
            Some(Err(e)) => {
                error!(gateway = P::NAME, %e, "Cannot start connecting");
                return;
            }
            Some(Ok(_)) => {}
        }

        let stream =
            match transport::connect(&settings.host, settings.port, settings.connect_timeout).await
            {
                Ok(stream) => stream,
                Err(e) => {
                    warn!(
                        gateway = P::NAME,
                        host = %settings.host,
                        port = settings.port,
                        %e,
                        "Connection failed, retrying in {:?}",
                        settings.retry_delay
                    );
                    if link.guarded(generation, Session::reset).is_none() {
                        return;
                    }
                    tokio::time::sleep(settings.retry_delay).await;
                    continue;
                }
            };

        match link.guarded(generation, |session| session.transition(SessionState::Connected)) {
            None => return,
            Some(Err(e)) => {
                error!(gateway = P::NAME, %e, "Unexpected session state");
                continue;
            }
            Some(Ok(_)) => {}
        }
        info!(gateway = P::NAME, host = %settings.host, port = settings.port, "Connected");

        let cool_down = run_session(&protocol, stream).await;
        if link.guarded(generation, Session::reset).is_none() {
            return;
        }

        match cool_down {
            Some(delay) => {
                info!(gateway = P::NAME, "Session ended, reconnecting in {:?}", delay);
                tokio::time::sleep(delay).await;
            }
            None => info!(gateway = P::NAME, "Session ended, reconnecting"),
        }
    }
}

/// Drive one socket until the reader or writer stops
async fn run_session<P: LineProtocol>(protocol: &Arc<P>, stream: TcpStream) -> Option<Duration> {
    let (read_half, write_half) = stream.into_split();
    let (reply_tx, reply_rx) = mpsc::unbounded_channel();

    let mut reader = AbortOnDrop(tokio::spawn(read_loop(protocol.clone(), read_half, reply_tx)));
    let mut writer = AbortOnDrop(tokio::spawn(write_loop(
        protocol.clone(),
        write_half,
        reply_rx,
    )));

    tokio::select! {
        finished = &mut reader.0 => match finished {
            Ok(cool_down) => cool_down,
            Err(e) => {
                error!(gateway = P::NAME, %e, "Reader task failed");
                None
            }
        },
        finished = &mut writer.0 => {
            if let Err(e) = finished {
                error!(gateway = P::NAME, %e, "Writer task failed");
            }
            None
        }
    }
}

async fn read_loop<P: LineProtocol>(
    protocol: Arc<P>,
    read_half: OwnedReadHalf,
    replies: mpsc::UnboundedSender<Vec<u8>>,
) -> Option<Duration> {
    let mut lines = LineReader::new(read_half);
    if protocol.telnet() {
        lines = lines.with_telnet(replies);
    }

    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                debug!(gateway = P::NAME, line = %line, "Received");
                if let LineOutcome::Disconnect { cool_down } = protocol.handle_line(&line) {
                    return cool_down;
                }
            }
            Ok(None) => {
                info!(gateway = P::NAME, "Connection closed by peer");
                return None;
            }
            Err(e) => {
                warn!(gateway = P::NAME, %e, "Read failed");
                return None;
            }
        }
    }
}

async fn write_loop<P: LineProtocol>(
    protocol: Arc<P>,
    mut write_half: OwnedWriteHalf,
    mut replies: mpsc::UnboundedReceiver<Vec<u8>>,
) {
    let link = protocol.link();
    let delimiter = protocol.delimiter();
    let mut states = link.session.subscribe();
    let mut replies_open = true;

    if let Err(e) = send_login(&*protocol, &mut write_half).await {
        warn!(gateway = P::NAME, %e, "Write failed");
        return;
    }

    loop {
        let state = *states.borrow_and_update();

        if state == SessionState::LoginRequested {
            match link
                .session
                .transition_from(SessionState::LoginRequested, SessionState::Connected)
            {
                Ok(true) => {
                    if let Err(e) = send_login(&*protocol, &mut write_half).await {
                        warn!(gateway = P::NAME, %e, "Write failed");
                        return;
                    }
                }
                Ok(false) => {}
                Err(e) => error!(gateway = P::NAME, %e, "Cannot acknowledge login request"),
            }
            continue;
        }

        let result = if protocol.is_ready(state) {
            tokio::select! {
                message = link.queue.blocking_poll() => {
                    let text = message.to_string();
                    debug!(gateway = P::NAME, message = %text, "Sending");
                    write_text(&mut write_half, &text, delimiter).await
                }
                changed = states.changed() => match changed {
                    Ok(()) => Ok(()),
                    Err(_) => return,
                },
                reply = replies.recv(), if replies_open => forward_reply(&mut write_half, reply, &mut replies_open).await,
            }
        } else {
            tokio::select! {
                changed = states.changed() => match changed {
                    Ok(()) => Ok(()),
                    Err(_) => return,
                },
                reply = replies.recv(), if replies_open => forward_reply(&mut write_half, reply, &mut replies_open).await,
            }
        };

        if let Err(e) = result {
            warn!(gateway = P::NAME, %e, "Write failed");
            return;
        }
    }
}

async fn send_login<P: LineProtocol>(
    protocol: &P,
    write_half: &mut OwnedWriteHalf,
) -> Result<(), TransportError> {
    match protocol.login_line() {
        Some(login) => {
            debug!(gateway = P::NAME, "Sending credentials");
            write_text(write_half, &login, protocol.delimiter()).await
        }
        None => Ok(()),
    }
}

async fn forward_reply(
    write_half: &mut OwnedWriteHalf,
    reply: Option<Vec<u8>>,
    open: &mut bool,
) -> Result<(), TransportError> {
    match reply {
        Some(bytes) => {
            write_half
                .write_all(&bytes)
                .await
                .map_err(TransportError::SendFailed)?;
            write_half.flush().await.map_err(TransportError::SendFailed)
        }
        None => {
            *open = false;
            Ok(())
        }
    }
}

async fn write_text(
    write_half: &mut OwnedWriteHalf,
    text: &str,
    delimiter: &str,
) -> Result<(), TransportError> {
    let mut line = String::with_capacity(text.len() + delimiter.len());
    line.push_str(text);
    line.push_str(delimiter);
    write_half
        .write_all(line.as_bytes())
        .await
        .map_err(TransportError::SendFailed)?;
    write_half.flush().await.map_err(TransportError::SendFailed)
}
