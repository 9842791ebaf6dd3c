//! Telnet option negotiation for TN3270 (RFC 1576)
//!
//! A TN3270 session must agree on Binary, End-of-Record and Terminal-Type
//! before the host starts sending 3270 records. [`TelnetNegotiator`] is a
//! byte-at-a-time state machine: feed it every byte read from the host and it
//! separates data bytes from Telnet commands, queuing any replies. The same
//! instance keeps running after connect so that late negotiation requests are
//! still answered.

use std::collections::HashMap;
use std::io::{ErrorKind, Read, Write};
use std::time::{Duration, Instant};

use log::{debug, trace, warn};

use crate::error::{Result, TN3270Error};
use crate::protocol_common::telnet_base::{
    build_negotiation, build_subnegotiation, TelnetCommand, TelnetOption, TERMINAL_TYPE_IS,
    TERMINAL_TYPE_SEND,
};

/// Terminal type sent when the host asks, unless configured otherwise
pub const DEFAULT_TERMINAL_TYPE: &str = "IBM-3279-2-E";

const IAC: u8 = TelnetCommand::IAC as u8;

/// Subnegotiation payload kept per `IAC SB`; bytes past this are dropped
/// until `IAC SE`
pub const MAX_SUBNEGOTIATION_SIZE: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NegotiationState {
    /// Nothing sent or received yet
    #[default]
    Initial,
    /// We offered, waiting for the peer to agree
    Requested,
    /// Both sides agree the option is on
    Active,
    /// Both sides agree the option is off
    Inactive,
}

/// Negotiation state of one option in each direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OptionState {
    /// Our side (WILL/WONT)
    pub local: NegotiationState,
    /// Their side (DO/DONT from us)
    pub remote: NegotiationState,
}

/// What one fed byte turned out to be
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TelnetEvent {
    /// A data byte for the 3270 layer (IAC IAC already unescaped)
    Data(u8),
    /// Part of a command sequence; nothing to act on yet
    Pending,
    /// An option or subnegotiation was handled; replies may be queued
    Negotiation,
    /// `IAC EOR`: the current 3270 record is complete
    EndOfRecord,
    /// `IAC SE` outside a subnegotiation
    EndMarker,
    /// Any other two-byte command (NOP, GA, ...)
    Command(u8),
}

/// Snapshot of the negotiated session options
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelnetOptions {
    pub binary: bool,
    pub end_of_record: bool,
    pub suppress_go_ahead: bool,
    pub terminal_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum ParserState {
    Data,
    Iac,
    /// Got a verb, waiting for its option byte
    Verb(TelnetCommand),
    SubNegotiation { data: Vec<u8>, expecting_se: bool },
}

#[derive(Debug)]
pub struct TelnetNegotiator {
    state: ParserState,
    options: HashMap<TelnetOption, OptionState>,
    terminal_type: String,
    output: Vec<u8>,
}

impl TelnetNegotiator {
    pub fn new(terminal_type: impl Into<String>) -> Self {
        Self {
            state: ParserState::Data,
            options: HashMap::new(),
            terminal_type: terminal_type.into(),
            output: Vec::new(),
        }
    }

    pub fn terminal_type(&self) -> &str {
        &self.terminal_type
    }

    /// Build the opening offer: WILL/DO Binary, WILL/DO End-of-Record,
    /// WILL Terminal-Type, WILL/DO Suppress-Go-Ahead.
    pub fn initial_offer(&mut self) -> Vec<u8> {
        let mut offer = Vec::new();
        let both = [
            TelnetOption::Binary,
            TelnetOption::EndOfRecord,
        ];
        for option in both {
            offer.extend(self.request_local(option));
            offer.extend(self.request_remote(option));
        }
        offer.extend(self.request_local(TelnetOption::TerminalType));
        offer.extend(self.request_local(TelnetOption::SuppressGoAhead));
        offer.extend(self.request_remote(TelnetOption::SuppressGoAhead));
        offer
    }

    fn request_local(&mut self, option: TelnetOption) -> Vec<u8> {
        self.options.entry(option).or_default().local = NegotiationState::Requested;
        build_negotiation(TelnetCommand::WILL, option as u8)
    }

    fn request_remote(&mut self, option: TelnetOption) -> Vec<u8> {
        self.options.entry(option).or_default().remote = NegotiationState::Requested;
        build_negotiation(TelnetCommand::DO, option as u8)
    }

    /// Feed one byte from the host
    pub fn feed(&mut self, byte: u8) -> TelnetEvent {
        let state = std::mem::replace(&mut self.state, ParserState::Data);
        match state {
            ParserState::Data => {
                if byte == IAC {
                    self.state = ParserState::Iac;
                    TelnetEvent::Pending
                } else {
                    TelnetEvent::Data(byte)
                }
            }
            ParserState::Iac => self.feed_command(byte),
            ParserState::Verb(verb) => {
                self.handle_verb(verb, byte);
                TelnetEvent::Negotiation
            }
            ParserState::SubNegotiation { mut data, expecting_se } => {
                if expecting_se {
                    if byte == TelnetCommand::SE as u8 {
                        self.handle_subnegotiation(&data);
                        return TelnetEvent::Negotiation;
                    }
                    // IAC IAC inside SB is an escaped 0xFF; anything else is kept as-is
                    if byte != IAC {
                        push_bounded(&mut data, IAC);
                    }
                    push_bounded(&mut data, byte);
                    self.state = ParserState::SubNegotiation { data, expecting_se: false };
                } else if byte == IAC {
                    self.state = ParserState::SubNegotiation { data, expecting_se: true };
                } else {
                    push_bounded(&mut data, byte);
                    self.state = ParserState::SubNegotiation { data, expecting_se: false };
                }
                TelnetEvent::Pending
            }
        }
    }

    fn feed_command(&mut self, byte: u8) -> TelnetEvent {
        match TelnetCommand::from_u8(byte) {
            Some(TelnetCommand::IAC) => TelnetEvent::Data(IAC),
            Some(verb) if verb.is_verb() => {
                self.state = ParserState::Verb(verb);
                TelnetEvent::Pending
            }
            Some(TelnetCommand::SB) => {
                self.state = ParserState::SubNegotiation {
                    data: Vec::new(),
                    expecting_se: false,
                };
                TelnetEvent::Pending
            }
            Some(TelnetCommand::EOR) => TelnetEvent::EndOfRecord,
            Some(TelnetCommand::SE) => TelnetEvent::EndMarker,
            _ => {
                trace!("ignoring telnet command {}", byte);
                TelnetEvent::Command(byte)
            }
        }
    }

    fn handle_verb(&mut self, verb: TelnetCommand, raw_option: u8) {
        debug!("received IAC {:?} {}", verb, raw_option);
        let Some(option) = TelnetOption::from_u8(raw_option) else {
            // Unknown options are refused outright
            match verb {
                TelnetCommand::DO => self.queue(build_negotiation(TelnetCommand::WONT, raw_option)),
                TelnetCommand::WILL => self.queue(build_negotiation(TelnetCommand::DONT, raw_option)),
                _ => {}
            }
            return;
        };

        match verb {
            TelnetCommand::DO => self.handle_do(option),
            TelnetCommand::DONT => self.handle_dont(option),
            TelnetCommand::WILL => self.handle_will(option),
            TelnetCommand::WONT => self.handle_wont(option),
            _ => {}
        }
    }

    /// Options we are willing to perform
    fn accepts_local(option: TelnetOption) -> bool {
        matches!(
            option,
            TelnetOption::Binary
                | TelnetOption::EndOfRecord
                | TelnetOption::TerminalType
                | TelnetOption::SuppressGoAhead
        )
    }

    /// Options we let the host perform
    fn accepts_remote(option: TelnetOption) -> bool {
        matches!(
            option,
            TelnetOption::Binary | TelnetOption::EndOfRecord | TelnetOption::SuppressGoAhead
        )
    }

    fn handle_do(&mut self, option: TelnetOption) {
        let state = self.options.entry(option).or_default();
        if !Self::accepts_local(option) {
            state.local = NegotiationState::Inactive;
            warn!("refusing to perform telnet option {}", option.name());
            self.queue(build_negotiation(TelnetCommand::WONT, option as u8));
            return;
        }
        match state.local {
            NegotiationState::Active => {}
            NegotiationState::Requested => state.local = NegotiationState::Active,
            NegotiationState::Initial | NegotiationState::Inactive => {
                state.local = NegotiationState::Active;
                self.queue(build_negotiation(TelnetCommand::WILL, option as u8));
            }
        }
    }

    fn handle_dont(&mut self, option: TelnetOption) {
        let state = self.options.entry(option).or_default();
        let was = state.local;
        state.local = NegotiationState::Inactive;
        if matches!(was, NegotiationState::Active | NegotiationState::Requested) {
            self.queue(build_negotiation(TelnetCommand::WONT, option as u8));
        }
    }

    fn handle_will(&mut self, option: TelnetOption) {
        let state = self.options.entry(option).or_default();
        if !Self::accepts_remote(option) {
            state.remote = NegotiationState::Inactive;
            debug!("not accepting host option {}", option.name());
            self.queue(build_negotiation(TelnetCommand::DONT, option as u8));
            return;
        }
        match state.remote {
            NegotiationState::Active => {}
            NegotiationState::Requested => state.remote = NegotiationState::Active,
            NegotiationState::Initial | NegotiationState::Inactive => {
                state.remote = NegotiationState::Active;
                self.queue(build_negotiation(TelnetCommand::DO, option as u8));
            }
        }
    }

    fn handle_wont(&mut self, option: TelnetOption) {
        let state = self.options.entry(option).or_default();
        let was = state.remote;
        state.remote = NegotiationState::Inactive;
        if matches!(was, NegotiationState::Active | NegotiationState::Requested) {
            self.queue(build_negotiation(TelnetCommand::DONT, option as u8));
        }
    }

    fn handle_subnegotiation(&mut self, data: &[u8]) {
        match data {
            [option, TERMINAL_TYPE_SEND, ..] if *option == TelnetOption::TerminalType as u8 => {
                debug!("sending terminal type {}", self.terminal_type);
                let mut payload = vec![TERMINAL_TYPE_IS];
                payload.extend_from_slice(self.terminal_type.as_bytes());
                self.queue(build_subnegotiation(TelnetOption::TerminalType as u8, &payload));
            }
            _ => trace!("ignoring subnegotiation {:?}", data),
        }
    }

    fn queue(&mut self, bytes: Vec<u8>) {
        self.output.extend(bytes);
    }

    /// Replies queued since the last call
    pub fn take_output(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.output)
    }

    pub fn option_state(&self, option: TelnetOption) -> OptionState {
        self.options.get(&option).copied().unwrap_or_default()
    }

    fn is_active_both_ways(&self, option: TelnetOption) -> bool {
        let state = self.option_state(option);
        state.local == NegotiationState::Active && state.remote == NegotiationState::Active
    }

    pub fn options(&self) -> TelnetOptions {
        let sga = self.option_state(TelnetOption::SuppressGoAhead);
        TelnetOptions {
            binary: self.is_active_both_ways(TelnetOption::Binary),
            end_of_record: self.is_active_both_ways(TelnetOption::EndOfRecord),
            suppress_go_ahead: sga.local == NegotiationState::Active
                || sga.remote == NegotiationState::Active,
            terminal_type: self.terminal_type.clone(),
        }
    }

    fn flush_output<W: Write>(&mut self, writer: &mut W) -> Result<()> {
        let output = self.take_output();
        if !output.is_empty() {
            writer.write_all(&output)?;
            writer.flush()?;
        }
        Ok(())
    }

    /// Send the opening offer and answer the host until the first 3270 data
    /// byte arrives, which is returned.
    ///
    /// `on_end_marker` runs for each stray `IAC SE`. Reads that time out are
    /// retried until `timeout` has elapsed since the call started.
    pub fn negotiate<R, W, F>(
        &mut self,
        reader: &mut R,
        writer: &mut W,
        timeout: Duration,
        mut on_end_marker: F,
    ) -> Result<u8>
    where
        R: Read,
        W: Write,
        F: FnMut(),
    {
        let started = Instant::now();
        let offer = self.initial_offer();
        writer.write_all(&offer)?;
        writer.flush()?;

        let mut byte = [0u8; 1];
        loop {
            if started.elapsed() >= timeout {
                return Err(TN3270Error::NegotiationTimeout {
                    elapsed_ms: started.elapsed().as_millis() as u64,
                });
            }

            match reader.read(&mut byte) {
                Ok(0) => return Err(TN3270Error::ConnectionClosed),
                Ok(_) => {}
                Err(e)
                    if matches!(
                        e.kind(),
                        ErrorKind::WouldBlock | ErrorKind::TimedOut | ErrorKind::Interrupted
                    ) =>
                {
                    continue
                }
                Err(e) => return Err(e.into()),
            }

            match self.feed(byte[0]) {
                TelnetEvent::Data(first) => {
                    self.flush_output(writer)?;
                    debug!("negotiation finished: {:?}", self.options());
                    return Ok(first);
                }
                TelnetEvent::Negotiation => self.flush_output(writer)?,
                TelnetEvent::EndMarker => on_end_marker(),
                TelnetEvent::EndOfRecord => trace!("end of record before any data"),
                TelnetEvent::Pending | TelnetEvent::Command(_) => {}
            }
        }
    }
}

fn push_bounded(data: &mut Vec<u8>, byte: u8) {
    if data.len() < MAX_SUBNEGOTIATION_SIZE {
        data.push(byte);
    }
}

impl Default for TelnetNegotiator {
    fn default() -> Self {
        Self::new(DEFAULT_TERMINAL_TYPE)
    }
}
