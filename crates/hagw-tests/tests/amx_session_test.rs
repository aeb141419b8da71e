//! AMX NI gateway against a scripted controller
//!
//! Run with: cargo test -p hagw-tests --test amx_session_test

mod common;

use std::sync::Arc;

use common::{eventually, Controller};
use hagw_amx::{AmxCommand, AmxCommandBuilder, AmxConfig, AmxGateway, PROTOCOL};
use hagw_core::testing::RecordingSensor;
use hagw_core::{Command, CommandElement, SensorKind, SessionState};
use pretty_assertions::assert_eq;

const END: &str = "\r\n\r\n";

fn gateway(port: u16) -> AmxGateway {
    AmxGateway::new(AmxConfig {
        port,
        connect_timeout_ms: 1_000,
        retry_delay_ms: 50,
        ..Default::default()
    })
}

fn command(gw: &AmxGateway, props: &[(&str, &str)]) -> AmxCommand {
    let element = props
        .iter()
        .fold(CommandElement::new("test", PROTOCOL), |e, (n, v)| {
            e.with_property(*n, *v)
        });
    AmxCommandBuilder::new(gw.clone()).build(&element).unwrap()
}

#[tokio::test]
async fn test_messages_are_framed_and_not_coalesced() {
    let controller = Controller::bind().await;
    let gw = gateway(controller.port());

    let pulse = command(
        &gw,
        &[("command", "PULSE"), ("deviceIndex", "5"), ("channel", "1"), ("pulseTime", "3")],
    );
    let volume = command(
        &gw,
        &[("command", "SEND_LEVEL"), ("deviceIndex", "5"), ("level", "2"), ("value", "70")],
    );
    let text = command(
        &gw,
        &[("command", "SEND_COMMAND"), ("deviceIndex", "7"), ("value", "INPUT-HDMI,1")],
    );
    pulse.send();
    pulse.send();
    volume.send();
    text.send();

    let mut peer = controller.accept().await;
    for expected in [
        "PULSE, 5, 1, 3",
        "PULSE, 5, 1, 3",
        "SEND_LEVEL, 5, 2, 70",
        "SEND_COMMAND, 7, INPUT-HDMI,1",
    ] {
        peer.expect(END, expected).await;
    }
    assert_eq!(gw.state(), SessionState::Connected);
    gw.shutdown();
}

#[tokio::test]
async fn test_feedback_reaches_sensors() {
    let controller = Controller::bind().await;
    let gw = gateway(controller.port());

    let power = command(
        &gw,
        &[("command", "CHANNEL_STATUS"), ("deviceIndex", "5"), ("channel", "1")],
    );
    let volume = command(
        &gw,
        &[("command", "LEVEL_STATUS"), ("deviceIndex", "5"), ("level", "2")],
    );
    let input = command(
        &gw,
        &[
            ("command", "COMMAND_READ"),
            ("deviceIndex", "7"),
            ("statusFilter", r"INPUT-(\w+),\d"),
            ("statusFilterGroup", "1"),
        ],
    );
    let power_sensor = Arc::new(RecordingSensor::new("power", SensorKind::Switch));
    let volume_sensor = Arc::new(RecordingSensor::new("volume", SensorKind::Level));
    let input_sensor = Arc::new(RecordingSensor::new("input", SensorKind::Custom));
    power.set_sensor(power_sensor.clone()).unwrap();
    volume.set_sensor(volume_sensor.clone()).unwrap();
    input.set_sensor(input_sensor.clone()).unwrap();

    let mut peer = controller.accept().await;
    peer.expect(END, "CHANNEL_STATUS, 5, 1").await;
    peer.expect(END, "LEVEL_STATUS, 5, 2").await;

    peer.send(b"CHANNEL_STATUS, 5, 1, ON\r\n").await;
    peer.send(b"LEVEL_STATUS, 5, 2, 180\r\n").await;
    peer.send(b"COMMAND_READ, 7, POWER=1\r\n").await;
    peer.send(b"COMMAND_READ, 7, INPUT-HDMI,1\r\n").await;
    peer.send(b"ERROR, 7, unknown channel\r\n").await;
    peer.send(b"CHANNEL_STATUS, 5, 1, OFF\r\n").await;

    eventually(|| power_sensor.updates().len() == 2).await;
    assert_eq!(power_sensor.updates(), vec!["on", "off"]);
    assert_eq!(volume_sensor.updates(), vec!["100"]);
    assert_eq!(input_sensor.updates(), vec!["HDMI"]);
    gw.shutdown();
}

#[tokio::test]
async fn test_reconnects_after_peer_hangs_up() {
    let controller = Controller::bind().await;
    let gw = gateway(controller.port());
    gw.start();

    let first = controller.accept().await;
    drop(first);

    let mut second = controller.accept().await;
    eventually(|| gw.state() == SessionState::Connected).await;
    command(&gw, &[("command", "ON"), ("deviceIndex", "2"), ("channel", "9")]).send();
    second.expect(END, "ON, 2, 9").await;
    gw.shutdown();
}
