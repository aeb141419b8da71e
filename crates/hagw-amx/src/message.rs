//! AMX NI wire format
//!
//! Outbound: `VERB, <device index>[, field]...` followed by `\r\n\r\n`.
//! Inbound fields are separated by `", "`.

use std::fmt;

use hagw_core::Coalescable;

/// One outbound message, without terminator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AmxMessage {
    verb: &'static str,
    device_index: u32,
    fields: Vec<String>,
}

impl AmxMessage {
    pub fn new(verb: &'static str, device_index: u32) -> Self {
        Self {
            verb,
            device_index,
            fields: Vec::new(),
        }
    }

    pub fn field(mut self, value: impl fmt::Display) -> Self {
        self.fields.push(value.to_string());
        self
    }

    pub fn verb(&self) -> &str {
        self.verb
    }

    pub fn device_index(&self) -> u32 {
        self.device_index
    }
}

impl fmt::Display for AmxMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, {}", self.verb, self.device_index)?;
        for field in &self.fields {
            write!(f, ", {}", field)?;
        }
        Ok(())
    }
}

impl Coalescable for AmxMessage {
    // every AMX message is delivered
    fn coalesces_with(&self, _newer: &Self) -> bool {
        false
    }
}

/// A parsed inbound line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    ChannelStatus {
        device_index: u32,
        channel: u32,
        on: bool,
    },
    LevelStatus {
        device_index: u32,
        level: u32,
        value: String,
    },
    StringRead {
        device_index: u32,
        text: String,
    },
    CommandRead {
        device_index: u32,
        text: String,
    },
    Error {
        device_index: u32,
        text: String,
    },
    /// Anything else; never an error
    Unrecognized,
}

impl Response {
    pub fn parse(line: &str) -> Self {
        let parts: Vec<&str> = line.trim().split(", ").collect();
        if parts.len() < 3 {
            return Response::Unrecognized;
        }
        let Ok(device_index) = parts[1].trim().parse::<u32>() else {
            return Response::Unrecognized;
        };
        let tail = || parts[2..].join(", ");

        match parts[0] {
            "STRING_READ" => Response::StringRead {
                device_index,
                text: tail(),
            },
            "COMMAND_READ" => Response::CommandRead {
                device_index,
                text: tail(),
            },
            "ERROR" => Response::Error {
                device_index,
                text: tail(),
            },
            "CHANNEL_STATUS" if parts.len() == 4 => match parts[2].trim().parse() {
                Ok(channel) => Response::ChannelStatus {
                    device_index,
                    channel,
                    on: is_on(parts[3]),
                },
                Err(_) => Response::Unrecognized,
            },
            "LEVEL_STATUS" if parts.len() == 4 => match parts[2].trim().parse() {
                Ok(level) => Response::LevelStatus {
                    device_index,
                    level,
                    value: parts[3].trim().to_string(),
                },
                Err(_) => Response::Unrecognized,
            },
            _ => Response::Unrecognized,
        }
    }
}

fn is_on(state: &str) -> bool {
    let state = state.trim();
    state.eq_ignore_ascii_case("on") || state == "1" || state.eq_ignore_ascii_case("true")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render() {
        assert_eq!(AmxMessage::new("ON", 5).field(2).to_string(), "ON, 5, 2");
        assert_eq!(
            AmxMessage::new("SEND_LEVEL", 1).field(3).field(80).to_string(),
            "SEND_LEVEL, 1, 3, 80"
        );
        assert_eq!(AmxMessage::new("X", 0).to_string(), "X, 0");
    }

    #[test]
    fn test_never_coalesces() {
        let on = AmxMessage::new("ON", 5).field(2);
        assert!(!on.coalesces_with(&on.clone()));
    }

    #[test]
    fn test_parse_status() {
        assert_eq!(
            Response::parse("CHANNEL_STATUS, 5, 2, ON"),
            Response::ChannelStatus {
                device_index: 5,
                channel: 2,
                on: true
            }
        );
        assert_eq!(
            Response::parse("CHANNEL_STATUS, 5, 2, 0"),
            Response::ChannelStatus {
                device_index: 5,
                channel: 2,
                on: false
            }
        );
        assert_eq!(
            Response::parse("LEVEL_STATUS, 1, 3, 128"),
            Response::LevelStatus {
                device_index: 1,
                level: 3,
                value: "128".into()
            }
        );
    }

    #[test]
    fn test_parse_reads_rejoin_tail() {
        assert_eq!(
            Response::parse("STRING_READ, 7, VOL=12, MUTE=0"),
            Response::StringRead {
                device_index: 7,
                text: "VOL=12, MUTE=0".into()
            }
        );
        assert_eq!(
            Response::parse("COMMAND_READ, 7, POWER ON"),
            Response::CommandRead {
                device_index: 7,
                text: "POWER ON".into()
            }
        );
        assert_eq!(
            Response::parse("ERROR, 0, unknown command, SEND_X"),
            Response::Error {
                device_index: 0,
                text: "unknown command, SEND_X".into()
            }
        );
    }

    #[test]
    fn test_parse_noise() {
        for line in [
            "",
            "HELLO",
            "STRING_READ, 7",
            "CHANNEL_STATUS, 5, 2",
            "CHANNEL_STATUS, 5, 2, ON, extra",
            "CHANNEL_STATUS, x, 2, ON",
            "CHANNEL_STATUS, 5, two, ON",
            "LEVEL_STATUS,1,3,128",
            "PING, 1, 2",
        ] {
            assert_eq!(Response::parse(line), Response::Unrecognized, "{line:?}");
        }
    }
}
