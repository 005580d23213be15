use std::fmt::Write;

use chrono::NaiveDate;

use crate::date::{Daisy, Date};
use crate::error::DateSeqError;

/// Input formats tried when the caller supplies none.
pub const DEFAULT_INPUT_FORMATS: &[&str] = &["%Y-%m-%d", "%Y%m%d"];

pub const DEFAULT_OUTPUT_FORMAT: &str = "%Y-%m-%d";

/// Parse a date by trying each format in order.
pub fn parse_date<S: AsRef<str>>(input: &str, formats: &[S]) -> Result<Date, DateSeqError> {
    let input = input.trim();
    let parsed = if formats.is_empty() {
        DEFAULT_INPUT_FORMATS
            .iter()
            .find_map(|fmt| NaiveDate::parse_from_str(input, fmt).ok())
    } else {
        formats
            .iter()
            .find_map(|fmt| NaiveDate::parse_from_str(input, fmt.as_ref()).ok())
    };
    parsed
        .map(Date::Ymd)
        .ok_or_else(|| DateSeqError::ParseDate(input.to_string()))
}

/// A validated strftime pattern for printing dates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputFormat {
    pattern: String,
}

impl OutputFormat {
    /// Rejects unknown specifiers as well as those a bare date cannot fill,
    /// such as `%H` or `%z`; chrono only reports the latter while rendering.
    pub fn new(pattern: impl Into<String>) -> Result<Self, DateSeqError> {
        let format = Self {
            pattern: pattern.into(),
        };
        format.render(Daisy::epoch())?;
        Ok(format)
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn format(&self, date: &Date) -> Result<String, DateSeqError> {
        self.render(date.naive())
    }

    fn render(&self, date: NaiveDate) -> Result<String, DateSeqError> {
        let mut out = String::new();
        write!(out, "{}", date.format(&self.pattern))
            .map_err(|_| DateSeqError::InvalidFormat(self.pattern.clone()))?;
        Ok(out)
    }
}

impl Default for OutputFormat {
    fn default() -> Self {
        Self {
            pattern: DEFAULT_OUTPUT_FORMAT.to_string(),
        }
    }
}

/// Interpret backslash escapes such as `\n` and `\t`.
/// Unknown escapes are kept verbatim, backslash included.
pub fn unescape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('a') => out.push('\u{07}'),
            Some('b') => out.push('\u{08}'),
            Some('f') => out.push('\u{0c}'),
            Some('v') => out.push('\u{0b}'),
            Some('0') => out.push('\0'),
            Some('\\') => out.push('\\'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}
