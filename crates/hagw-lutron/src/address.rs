//! HomeWorks device addresses
//!
//! An address is 3 to 5 numbers, e.g. `[01:04:01]` or `1.1.0.2.4`. The
//! second number selects the link type and with it how many elements the
//! address has and which ranges they may take:
//!
//! | link | elements | meaning                                   |
//! |------|----------|-------------------------------------------|
//! | 1    | 5        | RPM dimmer: processor, 1, router, module, output |
//! | 4-6  | 3        | keypad (or GRAFIK Eye unit) 1-32          |
//! | 4-6  | 4        | GRAFIK Eye 1-8, output 1-8                |
//! | 4-6  | 5        | D48 dimmer: router 1-4, bus 1-12, dimmer 1-8 |
//! | 8    | 4        | RF: 1 = dimmer 1-64, 2 = keypad 1-32, 3 = repeater 1-4 |

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;
use thiserror::Error;

const ADDRESS_PATTERN: &str = r"^\[?(\d{1,2})[.:/\\-](\d{1,2})[.:/\\-](\d{1,2})(?:[.:/\\-](\d{1,2}))?(?:[.:/\\-](\d{1,2}))?\]?$";

/// Address parse failure, always carrying the raw input
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid Lutron HomeWorks address '{address}': {reason}")]
pub struct AddressError {
    pub address: String,
    pub reason: String,
}

impl AddressError {
    fn new(address: &str, reason: impl Into<String>) -> Self {
        Self {
            address: address.to_string(),
            reason: reason.into(),
        }
    }
}

/// A validated HomeWorks address
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Address {
    elements: Vec<u8>,
}

fn pattern() -> Result<&'static Regex, &'static regex::Error> {
    static PATTERN: OnceLock<Result<Regex, regex::Error>> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(ADDRESS_PATTERN)).as_ref()
}

fn in_range(value: u8, min: u8, max: u8) -> bool {
    (min..=max).contains(&value)
}

impl Address {
    pub fn parse(text: &str) -> Result<Self, AddressError> {
        let cleaned: String = text
            .chars()
            .filter(|c| !c.is_whitespace() && !c.is_ascii_alphabetic())
            .collect();

        if cleaned.starts_with('[') != cleaned.ends_with(']') {
            return Err(AddressError::new(text, "unbalanced brackets"));
        }

        let pattern = pattern().map_err(|e| AddressError::new(text, e.to_string()))?;
        let captures = pattern
            .captures(&cleaned)
            .ok_or_else(|| AddressError::new(text, "not 3 to 5 numbers separated by . : / \\ or -"))?;

        let mut elements = Vec::with_capacity(5);
        for group in captures.iter().skip(1).flatten() {
            let value = group
                .as_str()
                .parse::<u8>()
                .map_err(|e| AddressError::new(text, e.to_string()))?;
            elements.push(value);
        }

        validate(text, &elements)?;
        Ok(Self { elements })
    }

    pub fn elements(&self) -> &[u8] {
        &self.elements
    }

    pub fn processor(&self) -> u8 {
        self.elements[0]
    }

    pub fn link(&self) -> u8 {
        self.elements[1]
    }

    fn wired_link(&self) -> bool {
        in_range(self.link(), 4, 6)
    }

    pub fn is_valid_keypad_address(&self) -> bool {
        let e = &self.elements;
        match e.len() {
            3 => self.wired_link() && in_range(e[2], 1, 32),
            4 => e[1] == 8 && e[2] == 2 && in_range(e[3], 1, 32),
            _ => false,
        }
    }

    pub fn is_valid_dimmer_address(&self) -> bool {
        let e = &self.elements;
        match e.len() {
            // RF dimmer
            4 => e[1] == 8 && e[2] == 1 && in_range(e[3], 1, 64),
            // RPM dimmer
            5 if e[1] == 1 => in_range(e[2], 0, 15) && in_range(e[3], 1, 8) && in_range(e[4], 1, 4),
            // D48 dimmer, buses 7-12 only carry dimmers 1-4
            5 if self.wired_link() => {
                in_range(e[2], 1, 4)
                    && in_range(e[3], 1, 12)
                    && in_range(e[4], 1, 8)
                    && !(e[3] > 6 && e[4] > 4)
            }
            _ => false,
        }
    }

    pub fn is_valid_grafik_eye_address(&self) -> bool {
        self.elements.len() == 3 && self.wired_link() && in_range(self.elements[2], 1, 8)
    }

    pub fn is_valid_grafik_eye_single_zone_address(&self) -> bool {
        self.elements.len() == 4 && self.wired_link()
    }
}

fn validate(text: &str, e: &[u8]) -> Result<(), AddressError> {
    let fail = |reason: &str| Err(AddressError::new(text, reason));

    if !(3..=5).contains(&e.len()) {
        return fail("an address has 3 to 5 elements");
    }
    if !in_range(e[0], 1, 16) {
        return fail("processor must be 1-16");
    }

    match e[1] {
        1 => {
            if e.len() != 5 {
                return fail("RPM dimmer addresses have 5 elements");
            }
            if !in_range(e[2], 0, 15) {
                return fail("router must be 0-15");
            }
            if !in_range(e[3], 1, 8) {
                return fail("module must be 1-8");
            }
            if !in_range(e[4], 1, 4) {
                return fail("output must be 1-4");
            }
        }
        4..=6 => match e.len() {
            3 => {
                if !in_range(e[2], 1, 32) {
                    return fail("keypad must be 1-32");
                }
            }
            4 => {
                if !in_range(e[2], 1, 8) {
                    return fail("GRAFIK Eye must be 1-8");
                }
                if !in_range(e[3], 1, 8) {
                    return fail("GRAFIK Eye output must be 1-8");
                }
            }
            _ => {
                if !in_range(e[2], 1, 4) {
                    return fail("router must be 1-4");
                }
                if !in_range(e[3], 1, 12) {
                    return fail("bus must be 1-12");
                }
                if !in_range(e[4], 1, 8) {
                    return fail("dimmer must be 1-8");
                }
            }
        },
        8 => {
            if e.len() != 4 {
                return fail("RF addresses have 4 elements");
            }
            match e[2] {
                1 if !in_range(e[3], 1, 64) => return fail("RF dimmer must be 1-64"),
                2 if !in_range(e[3], 1, 32) => return fail("RF keypad must be 1-32"),
                3 if !in_range(e[3], 1, 4) => return fail("repeater must be 1-4"),
                1..=3 => {}
                _ => return fail("RF device type must be 1-3"),
            }
        }
        _ => return fail("not a supported address"),
    }
    Ok(())
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, element) in self.elements.iter().enumerate() {
            if i > 0 {
                f.write_str(":")?;
            }
            write!(f, "{:02}", element)?;
        }
        f.write_str("]")
    }
}
