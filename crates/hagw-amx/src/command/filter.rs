use std::fmt;

use regex::Regex;

/// Regular expression a read must match before it reaches the sensors
///
/// The expression has to match the whole text. With a group index only
/// that group is forwarded.
#[derive(Clone)]
pub struct StatusFilter {
    pattern: String,
    regex: Regex,
    group: Option<usize>,
}

impl StatusFilter {
    pub fn new(pattern: &str, group: Option<usize>) -> Result<Self, regex::Error> {
        let regex = Regex::new(&format!("^(?:{})$", pattern))?;
        Ok(Self {
            pattern: pattern.to_string(),
            regex,
            group,
        })
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn group(&self) -> Option<usize> {
        self.group
    }

    /// The text to forward, or `None` if nothing should be forwarded
    pub fn apply<'t>(&self, text: &'t str) -> Option<&'t str> {
        let captures = self.regex.captures(text)?;
        let forwarded = match self.group {
            Some(group) => captures.get(group)?,
            None => captures.get(0)?,
        };
        Some(forwarded.as_str())
    }
}

impl fmt::Debug for StatusFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StatusFilter")
            .field("pattern", &self.pattern)
            .field("group", &self.group)
            .finish()
    }
}
