//! Telnet framing primitives used by TN3270
//!
//! Command and option codes (RFC 854, RFC 855, RFC 885, RFC 1091) plus the
//! small builders used to put negotiation replies and escaped data on the
//! wire.

/// Telnet commands a TN3270 stream can carry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TelnetCommand {
    IAC = 255,
    DONT = 254,
    DO = 253,
    WONT = 252,
    WILL = 251,
    SB = 250,
    GA = 249,
    NOP = 241,
    SE = 240,
    /// RFC 885 end of record, the 3270 record terminator
    EOR = 239,
}

impl TelnetCommand {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            255 => Some(TelnetCommand::IAC),
            254 => Some(TelnetCommand::DONT),
            253 => Some(TelnetCommand::DO),
            252 => Some(TelnetCommand::WONT),
            251 => Some(TelnetCommand::WILL),
            250 => Some(TelnetCommand::SB),
            249 => Some(TelnetCommand::GA),
            241 => Some(TelnetCommand::NOP),
            240 => Some(TelnetCommand::SE),
            239 => Some(TelnetCommand::EOR),
            _ => None,
        }
    }

    /// True for the four option verbs that take an option byte
    pub fn is_verb(self) -> bool {
        matches!(self, Self::DO | Self::DONT | Self::WILL | Self::WONT)
    }
}

/// Options a TN3270 client deals with. Echo is only ever refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TelnetOption {
    Binary = 0,
    Echo = 1,
    SuppressGoAhead = 3,
    TerminalType = 24,
    EndOfRecord = 25,
}

impl TelnetOption {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(TelnetOption::Binary),
            1 => Some(TelnetOption::Echo),
            3 => Some(TelnetOption::SuppressGoAhead),
            24 => Some(TelnetOption::TerminalType),
            25 => Some(TelnetOption::EndOfRecord),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            TelnetOption::Binary => "Binary",
            TelnetOption::Echo => "Echo",
            TelnetOption::SuppressGoAhead => "Suppress Go Ahead",
            TelnetOption::TerminalType => "Terminal Type",
            TelnetOption::EndOfRecord => "End of Record",
        }
    }
}

/// Terminal-type subnegotiation: IS
pub const TERMINAL_TYPE_IS: u8 = 0;
/// Terminal-type subnegotiation: SEND
pub const TERMINAL_TYPE_SEND: u8 = 1;

/// Build a telnet negotiation sequence
///
/// ```
/// use tn3270r::protocol_common::telnet_base::{build_negotiation, TelnetCommand, TelnetOption};
///
/// // Build "IAC WILL BINARY"
/// let seq = build_negotiation(TelnetCommand::WILL, TelnetOption::Binary as u8);
/// assert_eq!(seq, vec![255, 251, 0]);
/// ```
pub fn build_negotiation(command: TelnetCommand, option: u8) -> Vec<u8> {
    vec![TelnetCommand::IAC as u8, command as u8, option]
}

/// Build a telnet subnegotiation sequence, escaping IAC bytes in `data`
pub fn build_subnegotiation(option: u8, data: &[u8]) -> Vec<u8> {
    let mut result = vec![TelnetCommand::IAC as u8, TelnetCommand::SB as u8, option];
    push_escaped(&mut result, data);
    result.push(TelnetCommand::IAC as u8);
    result.push(TelnetCommand::SE as u8);
    result
}

/// Append `data` to `out`, doubling every IAC byte
pub fn push_escaped(out: &mut Vec<u8>, data: &[u8]) {
    for &byte in data {
        out.push(byte);
        if byte == TelnetCommand::IAC as u8 {
            out.push(TelnetCommand::IAC as u8);
        }
    }
}

/// Append the `IAC EOR` record terminator
pub fn push_end_of_record(out: &mut Vec<u8>) {
    out.push(TelnetCommand::IAC as u8);
    out.push(TelnetCommand::EOR as u8);
}
