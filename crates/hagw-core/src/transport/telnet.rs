//! Minimal telnet option handling
//!
//! Every option the peer offers or asks for is refused. Subnegotiation
//! blocks are skipped and `IAC IAC` yields a literal 0xFF data byte.

const IAC: u8 = 255;
const DONT: u8 = 254;
const DO: u8 = 253;
const WONT: u8 = 252;
const WILL: u8 = 251;
const SB: u8 = 250;
const SE: u8 = 240;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Data,
    Iac,
    Option(u8),
    Subnegotiation,
    SubnegotiationIac,
}

/// Streaming filter separating data bytes from negotiation
#[derive(Debug)]
pub struct TelnetFilter {
    state: State,
}

impl TelnetFilter {
    pub fn new() -> Self {
        Self { state: State::Data }
    }

    /// Append the data bytes of `input` to `data` and the replies owed to
    /// the peer to `replies`
    pub fn filter(&mut self, input: &[u8], data: &mut Vec<u8>, replies: &mut Vec<u8>) {
        for &byte in input {
            self.state = match (self.state, byte) {
                (State::Data, IAC) => State::Iac,
                (State::Data, b) => {
                    data.push(b);
                    State::Data
                }
                (State::Iac, IAC) => {
                    data.push(IAC);
                    State::Data
                }
                (State::Iac, DO | DONT | WILL | WONT) => State::Option(byte),
                (State::Iac, SB) => State::Subnegotiation,
                // NOP, GA and friends carry no data
                (State::Iac, _) => State::Data,
                (State::Option(verb), option) => {
                    match verb {
                        DO => replies.extend_from_slice(&[IAC, WONT, option]),
                        WILL => replies.extend_from_slice(&[IAC, DONT, option]),
                        _ => {}
                    }
                    State::Data
                }
                (State::Subnegotiation, IAC) => State::SubnegotiationIac,
                (State::Subnegotiation, _) => State::Subnegotiation,
                (State::SubnegotiationIac, SE) => State::Data,
                (State::SubnegotiationIac, _) => State::Subnegotiation,
            };
        }
    }
}

impl Default for TelnetFilter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(filter: &mut TelnetFilter, input: &[u8]) -> (Vec<u8>, Vec<u8>) {
        let mut data = Vec::new();
        let mut replies = Vec::new();
        filter.filter(input, &mut data, &mut replies);
        (data, replies)
    }

    #[test]
    fn test_plain_data_passes() {
        let mut filter = TelnetFilter::new();
        let (data, replies) = run(&mut filter, b"LOGIN: \r\n");
        assert_eq!(data, b"LOGIN: \r\n");
        assert!(replies.is_empty());
    }

    #[test]
    fn test_refuses_options() {
        let mut filter = TelnetFilter::new();
        let (data, replies) = run(&mut filter, &[IAC, DO, 1, b'a', IAC, WILL, 3, IAC, WONT, 5]);
        assert_eq!(data, b"a");
        assert_eq!(replies, vec![IAC, WONT, 1, IAC, DONT, 3]);
    }

    #[test]
    fn test_sequence_split_across_reads() {
        let mut filter = TelnetFilter::new();
        let (data, replies) = run(&mut filter, &[b'x', IAC]);
        assert_eq!(data, b"x");
        assert!(replies.is_empty());
        let (data, replies) = run(&mut filter, &[DO, 24, b'y']);
        assert_eq!(data, b"y");
        assert_eq!(replies, vec![IAC, WONT, 24]);
    }

    #[test]
    fn test_escaped_iac_and_subnegotiation() {
        let mut filter = TelnetFilter::new();
        let (data, _) = run(
            &mut filter,
            &[IAC, IAC, IAC, SB, 24, 1, IAC, IAC, IAC, SE, b'z'],
        );
        assert_eq!(data, vec![IAC, b'z']);
    }
}
