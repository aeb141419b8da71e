//! Telnet session with a HomeWorks processor
//!
//! The writer sends `username,password` as soon as the socket is open and
//! again whenever the processor prompts with `LOGIN:`. Queued commands are
//! only written once the processor confirms the login; the monitoring
//! setup commands are queued ahead of them at that moment.

use std::sync::Arc;

use hagw_core::connection::{self, Link, LineOutcome, LineProtocol};
use hagw_core::{DeviceCache, DeviceError, MessageQueue, Session, SessionState};
use tracing::{debug, error, info, warn};

use crate::address::Address;
use crate::config::LutronConfig;
use crate::device::{Dimmer, GrafikEye, Keypad, LutronDevice};
use crate::message::{setup_messages, FeedbackKind, LutronMessage, Response};

/// Handle to one HomeWorks processor connection
///
/// Cheap to clone; all clones share the queue, session and device cache.
#[derive(Clone)]
pub struct LutronGateway {
    inner: Arc<GatewayInner>,
}

pub(crate) struct GatewayInner {
    config: LutronConfig,
    link: Link<LutronMessage>,
    devices: DeviceCache<Address, LutronDevice>,
}

impl LutronGateway {
    pub fn new(config: LutronConfig) -> Self {
        let link = Link::new(config.link_settings(), MessageQueue::with_ttl(config.command_ttl()));
        Self {
            inner: Arc::new(GatewayInner {
                config,
                link,
                devices: DeviceCache::new(),
            }),
        }
    }

    pub fn config(&self) -> &LutronConfig {
        &self.inner.config
    }

    /// Start connecting in the background (no-op if already running)
    pub fn start(&self) {
        connection::start(&self.inner);
    }

    pub fn shutdown(&self) {
        info!("Shutting down Lutron HomeWorks gateway");
        self.inner.link.shutdown();
    }

    pub fn is_running(&self) -> bool {
        self.inner.link.is_running()
    }

    /// Queue a message; the connection is started on first use
    pub fn send_command(&self, message: LutronMessage) {
        debug!(message = %message, "Queueing");
        self.inner.link.queue().add(message);
        if !self.inner.link.is_running() {
            self.start();
        }
    }

    pub fn session(&self) -> &Session {
        self.inner.link.session()
    }

    pub fn state(&self) -> SessionState {
        self.inner.link.session().state()
    }

    pub fn queue(&self) -> &MessageQueue<LutronMessage> {
        self.inner.link.queue()
    }

    pub fn dimmer(&self, address: &Address) -> Result<Arc<Dimmer>, DeviceError> {
        self.inner.dimmer(address)
    }

    pub fn keypad(&self, address: &Address) -> Result<Arc<Keypad>, DeviceError> {
        self.inner.keypad(address)
    }

    pub fn grafik_eye(&self, address: &Address) -> Result<Arc<GrafikEye>, DeviceError> {
        self.inner.grafik_eye(address)
    }

    /// Feed one line as if the processor had sent it
    pub fn handle_line(&self, line: &str) -> LineOutcome {
        self.inner.handle_line(line)
    }
}

impl GatewayInner {
    fn dimmer(&self, address: &Address) -> Result<Arc<Dimmer>, DeviceError> {
        self.devices.get_or_create(
            address,
            "Dimmer",
            || LutronDevice::Dimmer(Arc::new(Dimmer::new(address.clone()))),
            LutronDevice::as_dimmer,
        )
    }

    fn keypad(&self, address: &Address) -> Result<Arc<Keypad>, DeviceError> {
        self.devices.get_or_create(
            address,
            "Keypad",
            || LutronDevice::Keypad(Arc::new(Keypad::new(address.clone()))),
            LutronDevice::as_keypad,
        )
    }

    fn grafik_eye(&self, address: &Address) -> Result<Arc<GrafikEye>, DeviceError> {
        self.devices.get_or_create(
            address,
            "GrafikEye",
            || LutronDevice::GrafikEye(Arc::new(GrafikEye::new(address.clone()))),
            LutronDevice::as_grafik_eye,
        )
    }

    fn logged_in(&self) {
        let session = self.link.session();
        let state = session.state();
        if !state.can_transition_to(SessionState::LoggedIn) {
            warn!(%state, "Unexpected login confirmation");
            return;
        }
        // setup goes out before anything the writer may drain once logged in
        for message in setup_messages() {
            self.link.queue().priority_add(message);
        }
        match session.transition(SessionState::LoggedIn) {
            Ok(_) => info!(host = %self.config.host, "Logged in"),
            Err(e) => warn!(%e, "Unexpected login confirmation"),
        }
    }

    fn route_feedback(&self, kind: FeedbackKind, address: &Address, parameter: &str) {
        let routed = match kind {
            FeedbackKind::DimmerLevel => self.dimmer(address).map(|d| d.process_update(parameter)),
            FeedbackKind::KeypadLeds => self.keypad(address).map(|k| k.process_update(parameter)),
            FeedbackKind::Scene => self
                .grafik_eye(address)
                .map(|g| g.process_update(parameter)),
        };
        if let Err(e) = routed {
            warn!(%e, ?kind, "Feedback for a device of another type");
        }
    }
}

impl LineProtocol for GatewayInner {
    type Message = LutronMessage;

    const NAME: &'static str = "lutron_homeworks";

    fn link(&self) -> &Link<LutronMessage> {
        &self.link
    }

    fn delimiter(&self) -> &'static str {
        "\n"
    }

    fn telnet(&self) -> bool {
        true
    }

    fn login_line(&self) -> Option<String> {
        Some(format!("{},{}", self.config.username, self.config.password))
    }

    fn is_ready(&self, state: SessionState) -> bool {
        state == SessionState::LoggedIn
    }

    fn handle_line(&self, line: &str) -> LineOutcome {
        let session = self.link.session();
        match Response::parse(line) {
            Response::LoginSuccessful => {
                self.logged_in();
                LineOutcome::Continue
            }
            Response::LoginPrompt => {
                if session.state() != SessionState::LoginRequested {
                    if let Err(e) = session.transition(SessionState::LoginRequested) {
                        warn!(%e, "Login prompt in unexpected state");
                    }
                }
                LineOutcome::Continue
            }
            Response::LoginIncorrect => {
                error!(
                    username = %self.config.username,
                    "Login rejected, retrying in {:?}",
                    self.config.invalid_login_delay()
                );
                if let Err(e) = session.transition(SessionState::InvalidLogin) {
                    warn!(%e, "Login rejection in unexpected state");
                }
                LineOutcome::Disconnect {
                    cool_down: Some(self.config.invalid_login_delay()),
                }
            }
            Response::ClosingConnection => {
                info!("Processor is closing the connection");
                if let Err(e) = session.transition(SessionState::Closing) {
                    debug!(%e, "Close announced in unexpected state");
                }
                LineOutcome::Disconnect { cool_down: None }
            }
            Response::Feedback {
                kind,
                address,
                parameter,
            } => {
                self.route_feedback(kind, &address, &parameter);
                LineOutcome::Continue
            }
            Response::Unrecognized => {
                info!(line, "Ignoring unrecognized response");
                LineOutcome::Continue
            }
        }
    }
}
