//! Wire messages: what we send and what the processor answers

use std::fmt;

use hagw_core::Coalescable;

use crate::address::Address;

/// One outbound line, without terminator
///
/// Rendered as `VERB[, field]...`. The address is kept separately because
/// queued messages coalesce on verb and address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LutronMessage {
    verb: &'static str,
    address: Option<Address>,
    fields: Vec<String>,
}

impl LutronMessage {
    /// Bare verb, e.g. `PROMPTOFF`
    pub fn new(verb: &'static str) -> Self {
        Self {
            verb,
            address: None,
            fields: Vec::new(),
        }
    }

    /// `VERB, <address>`
    pub fn for_address(verb: &'static str, address: &Address) -> Self {
        Self {
            verb,
            address: Some(address.clone()),
            fields: vec![address.to_string()],
        }
    }

    /// `VERB, <address>, <parameter>`
    pub fn with_parameter(verb: &'static str, address: &Address, parameter: impl fmt::Display) -> Self {
        Self {
            verb,
            address: Some(address.clone()),
            fields: vec![address.to_string(), parameter.to_string()],
        }
    }

    /// `FADEDIM, <level>, <fade secs>, <delay secs>, <address>`
    pub fn fade(level: u32, address: &Address) -> Self {
        Self {
            verb: "FADEDIM",
            address: Some(address.clone()),
            fields: vec![
                level.to_string(),
                "1".to_string(),
                "0".to_string(),
                address.to_string(),
            ],
        }
    }

    pub fn verb(&self) -> &str {
        self.verb
    }

    pub fn address(&self) -> Option<&Address> {
        self.address.as_ref()
    }
}

impl fmt::Display for LutronMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.verb)?;
        for field in &self.fields {
            write!(f, ", {}", field)?;
        }
        Ok(())
    }
}

impl Coalescable for LutronMessage {
    // two messages without an address coalesce when their verbs match
    fn coalesces_with(&self, newer: &Self) -> bool {
        self.verb == newer.verb && self.address == newer.address
    }
}

/// Session setup sent ahead of everything else after each login
pub fn setup_messages() -> [LutronMessage; 4] {
    [
        LutronMessage::new("PROMPTOFF"),
        LutronMessage::new("DLMON"),
        LutronMessage::new("GSMON"),
        LutronMessage::new("KLMON"),
    ]
}

/// Device feedback verbs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedbackKind {
    /// `GSS`: GRAFIK Eye selected scene
    Scene,
    /// `KLS`: keypad LED states
    KeypadLeds,
    /// `DL`: dimmer level
    DimmerLevel,
}

impl FeedbackKind {
    fn from_verb(verb: &str) -> Option<Self> {
        match verb {
            "GSS" => Some(Self::Scene),
            "KLS" => Some(Self::KeypadLeds),
            "DL" => Some(Self::DimmerLevel),
            _ => None,
        }
    }
}

/// A parsed inbound line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    LoginSuccessful,
    LoginPrompt,
    LoginIncorrect,
    ClosingConnection,
    Feedback {
        kind: FeedbackKind,
        address: Address,
        parameter: String,
    },
    /// Anything else; never an error
    Unrecognized,
}

impl Response {
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        if line.starts_with("LOGIN: login successful") {
            return Response::LoginSuccessful;
        }
        if line.starts_with("LOGIN:") {
            return Response::LoginPrompt;
        }
        if line.starts_with("login incorrect") {
            return Response::LoginIncorrect;
        }
        if line.starts_with("closing connection") {
            return Response::ClosingConnection;
        }

        let parts: Vec<&str> = line.split(',').map(str::trim).collect();
        let [verb, address, parameter] = parts.as_slice() else {
            return Response::Unrecognized;
        };
        let Some(kind) = FeedbackKind::from_verb(verb) else {
            return Response::Unrecognized;
        };
        match Address::parse(address) {
            Ok(address) => Response::Feedback {
                kind,
                address,
                parameter: parameter.to_string(),
            },
            Err(_) => Response::Unrecognized,
        }
    }
}
