//! hagw-core - protocol independent building blocks for device gateways
//!
//! A gateway keeps one long-lived TCP session to a home-automation
//! controller, feeds it commands from a priority queue and turns the
//! unsolicited feedback it sends back into sensor updates.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                     Protocol gateway                          │
//! │          (implements LineProtocol, owns DeviceCache)          │
//! │                                                              │
//! │  send_command ──► MessageQueue ──► writer task ──► socket     │
//! │                        ▲                │                     │
//! │                  priority_add       Session (watch)           │
//! │                        │                │                     │
//! │  Device ◄── handle_line ◄── reader task ◄── LineReader        │
//! │    │                                                          │
//! │    └──► Observers ──► Command ──► SensorSet ──► Sensor        │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! The supervisor in [`connection`] connects, spawns the reader and
//! writer, waits for the reader to finish and reconnects.

pub mod cache;
pub mod command;
pub mod connection;
pub mod error;
pub mod queue;
pub mod sensor;
pub mod session;
pub mod testing;
pub mod transport;
pub mod xml;

pub use cache::DeviceCache;
pub use command::{Command, Observers, SensorSet};
pub use connection::{Link, LinkSettings, LineOutcome, LineProtocol};
pub use error::{CommandError, CommandResult, DeviceError};
pub use queue::{Coalescable, MessageQueue};
pub use sensor::{CachedSensor, Sensor, SensorKind, SharedSensor, StatusCache};
pub use session::{Session, SessionError, SessionState};
pub use transport::{LineReader, TransportError};
pub use xml::{CommandElement, CommandFile, Property, SensorBinding, XmlError};
