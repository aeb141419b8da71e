//! hagw-amx - AMX NI gateway
//!
//! Each device index of the controller is split into four facets
//! (channels, levels, strings, commands), cached separately:
//!
//! ```text
//! "CHANNEL_STATUS, 5, 2, ON" ──► Channels(5)  ──► ChannelCommand ──► sensors
//! "LEVEL_STATUS, 5, 1, 42"   ──► Levels(5)    ──► LevelCommand   ──► sensors
//! "STRING_READ, 5, ..."      ──► TextDevice(5, String)  ──► TextCommand (filter)
//! "COMMAND_READ, 5, ..."     ──► TextDevice(5, Command) ──► TextCommand (filter)
//! ```

pub mod builder;
pub mod command;
pub mod config;
pub mod device;
pub mod gateway;
pub mod message;

pub use builder::{AmxCommandBuilder, PROTOCOL};
pub use command::{
    AmxCommand, AmxVerb, ChannelCommand, ChannelVerb, LevelCommand, LevelVerb, StatusFilter,
    TextCommand, TextKind, TextVerb,
};
pub use config::AmxConfig;
pub use device::{AmxDevice, Channels, DeviceKey, DeviceKind, Levels, TextDevice};
pub use gateway::AmxGateway;
pub use message::{AmxMessage, Response};
