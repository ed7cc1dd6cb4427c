use std::fmt;
use std::str::FromStr;

use crate::error::DebuggerError;

pub mod breakpoint_set;
pub mod breakpoint_site;

/// A virtual address in the inferior's address space.
///
/// Nothing is validated beyond parsing; a bad address only shows up when
/// the peek/poke against it fails.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct VirtualAddress {
    address: u64,
}

impl VirtualAddress {
    pub const fn new(address: u64) -> Self {
        Self { address }
    }

    pub fn addr(&self) -> u64 {
        self.address
    }
}

impl From<u64> for VirtualAddress {
    fn from(address: u64) -> Self {
        Self::new(address)
    }
}

impl FromStr for VirtualAddress {
    type Err = DebuggerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_hex(s).map(Self::new)
    }
}

impl fmt::Display for VirtualAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.address)
    }
}

/// Parses a `0x`-prefixed hexadecimal literal.
///
/// The prefix is mandatory: `400100` is rejected rather than silently
/// losing its first two digits.
pub fn parse_hex(s: &str) -> Result<u64, DebuggerError> {
    let digits = s
        .strip_prefix("0x")
        .ok_or_else(|| DebuggerError::MalformedArgument(format!("expected 0x-prefixed hex, got {s:?}")))?;
    if digits.starts_with('+') {
        return Err(DebuggerError::MalformedArgument(format!("{s:?} is not valid hex")));
    }

    u64::from_str_radix(digits, 16)
        .map_err(|e| DebuggerError::MalformedArgument(format!("{s:?} is not valid hex: {e}")))
}

/// This is the `int3` instruction, which causes the process to break/signal.
pub const INTERRUPT_INSTRUCTION: i64 = 0xCC;

/// Replaces the low byte of `word` with `byte`, keeping the other seven.
pub(crate) fn with_low_byte(word: i64, byte: u8) -> i64 {
    (word & !0xFF) | i64::from(byte)
}
