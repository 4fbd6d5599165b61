use std::io::BufRead;
use std::num::ParseIntError;
use lazy_static::lazy_static;
use regex::Regex;
use thiserror::Error;
use crate::cache::AccessKind;

lazy_static! {
    // Two whitespace separated fields, anything else is malformed
    static ref LINE_PATTERN: Regex = Regex::new(r"^\s*(?P<op>\S+)\s+(?P<address>\S+)\s*$").unwrap();
}

/// One memory reference from a trace
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct TraceEvent {
    pub kind: AccessKind,
    pub address: u64,
}

/// How addresses are written in a trace. Hex addresses may carry a `0x` prefix.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub enum AddressRadix {
    #[default]
    Hex,
    Decimal,
}

/// Errors found while reading a trace. Line numbers start at 1.
#[derive(Debug, Error)]
pub enum TraceError {
    #[error("couldn't read the trace: {0}")]
    Io(#[from] std::io::Error),
    #[error("line {line}: expected `<op> <address>`, found {text:?}")]
    Malformed { line: usize, text: String },
    #[error("line {line}: not valid UTF-8, found {text:?}")]
    InvalidUtf8 { line: usize, text: String },
    #[error("line {line}: unknown operation {op:?}, expected r or w")]
    UnknownOp { line: usize, op: String },
    #[error("line {line}: couldn't parse address {text:?}: {source}")]
    BadAddress {
        line: usize,
        text: String,
        source: ParseIntError,
    },
}

impl AccessKind {
    /// Parses a single letter operation code, `r` or `w` in either case
    pub fn from_op(op: &str) -> Option<Self> {
        match op {
            "r" | "R" => Some(AccessKind::Read),
            "w" | "W" => Some(AccessKind::Write),
            _ => None,
        }
    }
}

impl AddressRadix {
    /// Parses an address in this radix
    ///
    /// # Examples
    ///
    /// ```
    /// use hierlib::trace::AddressRadix;
    /// assert_eq!(AddressRadix::Hex.parse("0x7fff"), Ok(0x7fff));
    /// assert_eq!(AddressRadix::Hex.parse("7FFF"), Ok(0x7fff));
    /// assert_eq!(AddressRadix::Decimal.parse("4096"), Ok(4096));
    /// ```
    pub fn parse(&self, text: &str) -> Result<u64, ParseIntError> {
        match self {
            AddressRadix::Hex => {
                let digits = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")).unwrap_or(text);
                u64::from_str_radix(digits, 16)
            }
            AddressRadix::Decimal => text.parse::<u64>(),
        }
    }
}

/// Parses one trace line
///
/// Blank lines carry no event and give `Ok(None)`
///
/// # Arguments
///
/// * `text`: The line, with or without its trailing newline
/// * `line`: The line number, used in errors
/// * `radix`: How addresses are written
///
/// returns: Result<Option<TraceEvent>, TraceError>
pub fn parse_line(text: &str, line: usize, radix: AddressRadix) -> Result<Option<TraceEvent>, TraceError> {
    if text.trim().is_empty() {
        return Ok(None);
    }
    let captures = LINE_PATTERN.captures(text).ok_or_else(|| TraceError::Malformed {
        line,
        text: text.trim_end().to_string(),
    })?;
    let op = &captures["op"];
    let kind = AccessKind::from_op(op).ok_or_else(|| TraceError::UnknownOp { line, op: op.to_string() })?;
    let address_text = &captures["address"];
    let address = radix.parse(address_text).map_err(|source| TraceError::BadAddress {
        line,
        text: address_text.to_string(),
        source,
    })?;
    Ok(Some(TraceEvent { kind, address }))
}

/// Iterates the events of a trace, one line at a time
///
/// Errors are yielded in place of the offending line; iteration can carry on past them
pub struct TraceReader<R: BufRead> {
    reader: R,
    radix: AddressRadix,
    line: usize,
    buffer: Vec<u8>,
}

impl<R: BufRead> TraceReader<R> {
    pub fn new(reader: R, radix: AddressRadix) -> Self {
        Self {
            reader,
            radix,
            line: 0,
            buffer: Vec::new(),
        }
    }

    /// Number of lines read so far
    pub fn lines_read(&self) -> usize {
        self.line
    }
}

impl<R: BufRead> Iterator for TraceReader<R> {
    type Item = Result<TraceEvent, TraceError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            self.buffer.clear();
            match self.reader.read_until(b'\n', &mut self.buffer) {
                Ok(0) => return None,
                Ok(_) => {}
                Err(e) => return Some(Err(e.into())),
            }
            self.line += 1;
            // A line that is not UTF-8 still counts towards the line number
            let text = match std::str::from_utf8(&self.buffer) {
                Ok(text) => text,
                Err(_) => {
                    return Some(Err(TraceError::InvalidUtf8 {
                        line: self.line,
                        text: String::from_utf8_lossy(&self.buffer).trim_end().to_string(),
                    }))
                }
            };
            match parse_line(text, self.line, self.radix) {
                Ok(Some(event)) => return Some(Ok(event)),
                Ok(None) => continue,
                Err(e) => return Some(Err(e)),
            }
        }
    }
}
