use std::{convert::TryFrom, fmt};

/// Lines of a string table dump are separated by CRLF.
pub const LINE_SEPARATOR: &str = "\r\n";
/// Fields of a line are separated by a single tab.
pub const FIELD_SEPARATOR: char = '\t';

/// The hash field of a record, i.e. the first column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HashKey {
    /// A decimal number. Values above `u32::MAX` are kept so they can be reported, but never match.
    Value(u64),
    /// Anything that is not a decimal number, including an empty field.
    Malformed,
}

impl HashKey {
    /// Only plain ASCII digits count, a sign or whitespace makes the field malformed.
    pub fn parse(field: &str) -> Self {
        if field.is_empty() || !field.bytes().all(|byte| byte.is_ascii_digit()) {
            return Self::Malformed;
        }
        match field.parse::<u64>() {
            Ok(value) => Self::Value(value),
            Err(_) => Self::Malformed,
        }
    }

    /// The key as a lookup2 hash, if it is one.
    pub fn as_hash(self) -> Option<u32> {
        match self {
            Self::Value(value) => u32::try_from(value).ok(),
            Self::Malformed => None,
        }
    }
}

/// Lowercase hexadecimal for numbers, `NaN` for anything else.
impl fmt::Display for HashKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(value) => write!(f, "{:x}", value),
            Self::Malformed => f.write_str("NaN"),
        }
    }
}

/// One line of the input: `hash\t<ignored>\ttext`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputRecord<'a> {
    pub hash: HashKey,
    pub text: &'a str,
}

impl<'a> InputRecord<'a> {
    /// Only the first three fields count, missing ones are treated as empty.
    pub fn parse(line: &'a str) -> Self {
        let mut fields = line.split(FIELD_SEPARATOR);
        let hash = HashKey::parse(fields.next().unwrap_or_default());
        // the second column is skipped
        let text = fields.nth(1).unwrap_or_default();
        Self { hash, text }
    }
}

/// Splits the whole input into records. An empty line (e.g. after the final CRLF) still yields a record.
pub fn parse_records(input: &str) -> impl Iterator<Item = InputRecord<'_>> {
    input.split(LINE_SEPARATOR).map(InputRecord::parse)
}
