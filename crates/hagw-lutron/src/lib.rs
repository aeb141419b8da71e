//! hagw-lutron - Lutron HomeWorks gateway
//!
//! Talks to a HomeWorks processor over its telnet interface.
//!
//! # Architecture
//!
//! ```text
//! CommandElement ──► LutronCommandBuilder ──► LutronCommand
//!                                                │  send() / set_sensor()
//!                                                ▼
//!                    ┌──────────────────── LutronGateway ───────────────────┐
//!                    │ MessageQueue ──► writer ──► "FADEDIM, 50, 1, 0, [..]" │
//!                    │ DeviceCache<Address, LutronDevice>                    │
//!                    │ reader ◄── "DL, [01:01:00:02:04], 50"                 │
//!                    └───────────────────────────────────────────────────────┘
//!                                                │ process_update
//!                                                ▼
//!                          Dimmer / Keypad / GrafikEye ──► commands ──► sensors
//! ```

pub mod address;
pub mod builder;
pub mod command;
pub mod config;
pub mod device;
pub mod gateway;
pub mod message;

pub use address::{Address, AddressError};
pub use builder::{LutronCommandBuilder, PROTOCOL};
pub use command::{
    DimmerCommand, DimmerVerb, GrafikEyeCommand, GrafikEyeVerb, KeypadCommand, KeypadVerb,
    LutronCommand, LutronVerb,
};
pub use config::LutronConfig;
pub use device::{Dimmer, GrafikEye, Keypad, LutronDevice};
pub use gateway::LutronGateway;
pub use message::{LutronMessage, Response};
