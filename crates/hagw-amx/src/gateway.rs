//! TCP session with an AMX NI controller
//!
//! No login: the writer drains the queue as soon as the socket is
//! connected. Every message is terminated by a blank line.

use std::sync::Arc;

use hagw_core::connection::{self, Link, LineOutcome, LineProtocol};
use hagw_core::{DeviceCache, DeviceError, MessageQueue, Session, SessionState};
use tracing::{debug, error, info, warn};

use crate::command::TextKind;
use crate::config::AmxConfig;
use crate::device::{AmxDevice, Channels, DeviceKey, DeviceKind, Levels, TextDevice};
use crate::message::{AmxMessage, Response};

/// Handle to one AMX NI controller connection
#[derive(Clone)]
pub struct AmxGateway {
    inner: Arc<GatewayInner>,
}

pub(crate) struct GatewayInner {
    config: AmxConfig,
    link: Link<AmxMessage>,
    devices: DeviceCache<DeviceKey, AmxDevice>,
}

impl AmxGateway {
    pub fn new(config: AmxConfig) -> Self {
        let link = Link::new(config.link_settings(), MessageQueue::with_ttl(config.command_ttl()));
        Self {
            inner: Arc::new(GatewayInner {
                config,
                link,
                devices: DeviceCache::new(),
            }),
        }
    }

    pub fn config(&self) -> &AmxConfig {
        &self.inner.config
    }

    pub fn start(&self) {
        connection::start(&self.inner);
    }

    pub fn shutdown(&self) {
        info!("Shutting down AMX NI gateway");
        self.inner.link.shutdown();
    }

    pub fn is_running(&self) -> bool {
        self.inner.link.is_running()
    }

    /// Queue a message; the connection is started on first use
    pub fn send_command(&self, message: AmxMessage) {
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

    pub fn queue(&self) -> &MessageQueue<AmxMessage> {
        self.inner.link.queue()
    }

    pub fn channels(&self, index: u32) -> Result<Arc<Channels>, DeviceError> {
        self.inner.channels(index)
    }

    pub fn levels(&self, index: u32) -> Result<Arc<Levels>, DeviceError> {
        self.inner.levels(index)
    }

    pub fn text_device(&self, index: u32, kind: TextKind) -> Result<Arc<TextDevice>, DeviceError> {
        self.inner.text_device(index, kind)
    }

    /// Feed one line as if the controller had sent it
    pub fn handle_line(&self, line: &str) -> LineOutcome {
        self.inner.handle_line(line)
    }
}

impl GatewayInner {
    fn channels(&self, index: u32) -> Result<Arc<Channels>, DeviceError> {
        let key = DeviceKey {
            index,
            kind: DeviceKind::Channels,
        };
        self.devices.get_or_create(
            &key,
            "channel device",
            || AmxDevice::create(key),
            AmxDevice::as_channels,
        )
    }

    fn levels(&self, index: u32) -> Result<Arc<Levels>, DeviceError> {
        let key = DeviceKey {
            index,
            kind: DeviceKind::Levels,
        };
        self.devices.get_or_create(
            &key,
            "level device",
            || AmxDevice::create(key),
            AmxDevice::as_levels,
        )
    }

    fn text_device(&self, index: u32, kind: TextKind) -> Result<Arc<TextDevice>, DeviceError> {
        let key = DeviceKey {
            index,
            kind: kind.into(),
        };
        self.devices.get_or_create(
            &key,
            "text device",
            || AmxDevice::create(key),
            AmxDevice::as_text,
        )
    }

    fn route(&self, response: Response) -> Result<(), DeviceError> {
        match response {
            Response::ChannelStatus {
                device_index,
                channel,
                on,
            } => self.channels(device_index)?.process_update(channel, on),
            Response::LevelStatus {
                device_index,
                level,
                value,
            } => self.levels(device_index)?.process_update(level, &value),
            Response::StringRead { device_index, text } => self
                .text_device(device_index, TextKind::String)?
                .process_update(&text),
            Response::CommandRead { device_index, text } => self
                .text_device(device_index, TextKind::Command)?
                .process_update(&text),
            Response::Error { device_index, text } => {
                error!(device_index, error = %text, "Controller reported an error")
            }
            Response::Unrecognized => {}
        }
        Ok(())
    }
}

impl LineProtocol for GatewayInner {
    type Message = AmxMessage;

    const NAME: &'static str = "amx_ni";

    fn link(&self) -> &Link<AmxMessage> {
        &self.link
    }

    fn delimiter(&self) -> &'static str {
        "\r\n\r\n"
    }

    fn is_ready(&self, state: SessionState) -> bool {
        state == SessionState::Connected
    }

    fn handle_line(&self, line: &str) -> LineOutcome {
        if line.trim().is_empty() {
            return LineOutcome::Continue;
        }
        match Response::parse(line) {
            Response::Unrecognized => info!(line, "Ignoring unrecognized response"),
            response => {
                if let Err(e) = self.route(response) {
                    warn!(%e, "Feedback for a device of another type");
                }
            }
        }
        LineOutcome::Continue
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{AmxCommandBuilder, PROTOCOL};
    use hagw_core::testing::RecordingSensor;
    use hagw_core::{Command, CommandElement, SensorKind};
    use pretty_assertions::assert_eq;

    fn build(gw: &AmxGateway, props: &[(&str, &str)]) -> crate::command::AmxCommand {
        let element = props
            .iter()
            .fold(CommandElement::new("test", PROTOCOL), |e, (n, v)| {
                e.with_property(*n, *v)
            });
        AmxCommandBuilder::new(gw.clone()).build(&element).unwrap()
    }

    #[test]
    fn test_queue_keeps_duplicates() {
        let gw = AmxGateway::new(AmxConfig::default());
        let on = build(&gw, &[("command", "ON"), ("deviceIndex", "1"), ("channel", "2")]);
        on.send();
        on.send();
        assert_eq!(gw.queue().len(), 2);
    }

    #[test]
    fn test_feedback_reaches_sensors() {
        let gw = AmxGateway::new(AmxConfig::default());
        let channel = build(
            &gw,
            &[("command", "CHANNEL_STATUS"), ("deviceIndex", "5"), ("channel", "2")],
        );
        let level = build(
            &gw,
            &[("command", "LEVEL_STATUS"), ("deviceIndex", "5"), ("level", "1")],
        );
        let read = build(
            &gw,
            &[
                ("command", "STRING_READ"),
                ("deviceIndex", "5"),
                ("statusFilter", r"INPUT (\d)"),
                ("statusFilterGroup", "1"),
            ],
        );
        let switch: Arc<RecordingSensor> = Arc::new(RecordingSensor::new("sw", SensorKind::Switch));
        let dial = Arc::new(RecordingSensor::new("dial", SensorKind::Level));
        let input = Arc::new(RecordingSensor::new("input", SensorKind::Range));
        channel.set_sensor(switch.clone()).unwrap();
        level.set_sensor(dial.clone()).unwrap();
        read.set_sensor(input.clone()).unwrap();

        for line in [
            "CHANNEL_STATUS, 5, 2, ON",
            "LEVEL_STATUS, 5, 1, 42",
            "STRING_READ, 5, INPUT 3",
            "STRING_READ, 5, POWER OFF",
            "COMMAND_READ, 5, INPUT 4",
            "ERROR, 5, bad channel",
            "",
            "garbage",
        ] {
            assert_eq!(gw.handle_line(line), LineOutcome::Continue);
        }

        assert_eq!(switch.updates(), vec!["on"]);
        assert_eq!(dial.updates(), vec!["42"]);
        assert_eq!(input.updates(), vec!["3"]);
    }

    #[test]
    fn test_initial_queries() {
        let gw = AmxGateway::new(AmxConfig::default());
        let channel = build(
            &gw,
            &[("command", "CHANNEL_STATUS"), ("deviceIndex", "5"), ("channel", "2")],
        );
        let sensor = Arc::new(RecordingSensor::new("a", SensorKind::Switch));
        let other = Arc::new(RecordingSensor::new("b", SensorKind::Switch));
        channel.set_sensor(sensor.clone()).unwrap();
        channel.set_sensor(other).unwrap();

        let sent: Vec<String> = std::iter::from_fn(|| gw.queue().poll())
            .map(|m| m.to_string())
            .collect();
        assert_eq!(sent, vec!["CHANNEL_STATUS, 5, 2"]);
        assert_eq!(gw.channels(5).unwrap().observer_count(), 1);
    }

    #[test]
    fn test_last_sensor_stop_deregisters() {
        let gw = AmxGateway::new(AmxConfig::default());
        let level = build(
            &gw,
            &[("command", "LEVEL_STATUS"), ("deviceIndex", "2"), ("level", "1")],
        );
        let first: hagw_core::SharedSensor = Arc::new(RecordingSensor::new("a", SensorKind::Range));
        let second: hagw_core::SharedSensor =
            Arc::new(RecordingSensor::new("b", SensorKind::Range));
        level.set_sensor(first.clone()).unwrap();
        level.set_sensor(second.clone()).unwrap();

        level.stop(&first);
        assert_eq!(gw.levels(2).unwrap().observer_count(), 1);
        level.stop(&second);
        assert_eq!(gw.levels(2).unwrap().observer_count(), 0);
    }

    #[tokio::test]
    async fn test_send_starts_connection() {
        let gw = AmxGateway::new(AmxConfig {
            port: 1,
            retry_delay_ms: 60_000,
            ..Default::default()
        });
        assert!(!gw.is_running());
        build(&gw, &[("command", "OFF"), ("deviceIndex", "1"), ("channel", "1")]).send();
        assert!(gw.is_running());
        gw.shutdown();
        assert!(!gw.is_running());
        assert_eq!(gw.state(), SessionState::NotConnected);
    }
}
