//! 3270 Protocol Implementation
//!
//! This module decodes host records into screen buffer mutations and runs
//! the reader loop that frames the Telnet byte stream into those records.
//!
//! A record is everything between two `IAC EOR` markers. Its first byte is a
//! command; Write-class commands are followed by a WCC and then any mix of
//! orders and data bytes. Short records are tolerated: a truncated order
//! simply ends the record.

use std::io::{ErrorKind, Read};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use log::{debug, info, trace, warn};

use super::codes::*;
use super::display::{addressing, Display3270};
use super::field::FieldAttribute;
use super::shared::{DisplayGuard, HostWriter, SharedDisplay};
use crate::error::{Result, TN3270Error};
use crate::telnet_negotiation::{TelnetEvent, TelnetNegotiator};

/// Records larger than this are dropped
pub const MAX_RECORD_SIZE: usize = 64 * 1024;

const READ_CHUNK_SIZE: usize = 4096;

/// 3270 Protocol Processor
///
/// Applies one host record at a time to a [`Display3270`]. The lenient
/// default writes unrecognised command bytes to the screen as data; strict
/// mode rejects them.
#[derive(Debug, Clone, Default)]
pub struct ProtocolProcessor3270 {
    strict_commands: bool,
}

impl ProtocolProcessor3270 {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_strict_commands(strict_commands: bool) -> Self {
        Self { strict_commands }
    }

    pub fn is_strict(&self) -> bool {
        self.strict_commands
    }

    /// Process one complete record (without its `IAC EOR` terminator)
    pub fn process_record(&self, data: &[u8], display: &mut Display3270) -> Result<()> {
        if data.is_empty() {
            return Ok(());
        }
        DataStreamParser::new(data).parse(display, self.strict_commands)
    }
}

/// Cursor over one record
struct DataStreamParser<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> DataStreamParser<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn next_byte(&mut self) -> Option<u8> {
        let byte = self.data.get(self.pos).copied()?;
        self.pos += 1;
        Some(byte)
    }

    fn read_address(&mut self) -> Option<usize> {
        let b1 = self.next_byte()?;
        let b2 = self.next_byte()?;
        Some(addressing::decode_12bit_address(b1, b2) as usize)
    }

    fn read_pair(&mut self) -> Option<(u8, u8)> {
        Some((self.next_byte()?, self.next_byte()?))
    }

    /// Parameter count followed by that many (type, value) pairs
    fn read_pairs(&mut self) -> Option<Vec<(u8, u8)>> {
        let count = self.next_byte()? as usize;
        (0..count).map(|_| self.read_pair()).collect()
    }

    fn parse(&mut self, display: &mut Display3270, strict: bool) -> Result<()> {
        let Some(raw) = self.next_byte() else {
            return Ok(());
        };
        let normalized = CommandCode::normalize(raw);
        display.cycle_mut().record_command(normalized);

        match CommandCode::from_u8(normalized) {
            Some(command) if command.is_write() => {
                debug!("processing {:?} ({} bytes)", command, self.data.len());
                self.process_write(command, display);
            }
            Some(command) => debug!("{:?} received, nothing to apply", command),
            None if strict => return Err(TN3270Error::InvalidCommand { byte: raw }),
            None => {
                debug!("command byte 0x{:02X} not recognised, writing as data", raw);
                write_data(display, raw);
                self.process_orders(display);
            }
        }
        Ok(())
    }

    /// Process Write, Erase/Write, or Erase/Write Alternate command
    fn process_write(&mut self, command: CommandCode, display: &mut Display3270) {
        if command != CommandCode::Write {
            display.clear();
        }

        let Some(wcc) = self.next_byte() else {
            return;
        };
        display.cycle_mut().record_wcc(wcc);

        let is_write = command == CommandCode::Write;
        if is_write && wcc & WCC_ERASE_ALL_UNPROTECTED != 0 {
            display.reset_modified_data_tags();
            display.erase_all_unprotected();
        }

        let start_printer = is_write && wcc & WCC_START_PRINTER != 0;
        if start_printer {
            display.copy_to_background();
        }

        self.process_orders(display);

        if start_printer {
            display.restore_from_background();
        }
    }

    fn process_orders(&mut self, display: &mut Display3270) {
        while let Some(byte) = self.next_byte() {
            match OrderCode::from_u8(byte) {
                Some(order) => {
                    display.cycle_mut().count_order();
                    trace!("order {:?} at {}", order, display.cursor());
                    if self.process_order(order, display).is_none() {
                        debug!("record ends inside {:?}", order);
                        return;
                    }
                }
                None => write_data(display, byte),
            }
        }
    }

    /// Apply one order. `None` means its operands were cut short and the
    /// buffer was left alone.
    fn process_order(&mut self, order: OrderCode, display: &mut Display3270) -> Option<()> {
        let size = display.buffer_size();
        match order {
            OrderCode::StartField => {
                let attr = FieldAttribute::from_byte(self.next_byte()?);
                display.start_field(display.cursor(), attr);
                display.advance_cursor();
            }
            OrderCode::StartFieldExtended => {
                let pairs = self.read_pairs()?;
                let mut attr = FieldAttribute::default();
                for (kind, value) in pairs {
                    if kind == XA_3270 {
                        attr = FieldAttribute::from_byte(value);
                    }
                }
                display.start_field(display.cursor(), attr);
                display.advance_cursor();
            }
            OrderCode::SetBufferAddress => {
                let address = self.read_address()?;
                display.set_cursor(address);
            }
            OrderCode::SetAttribute => {
                let (kind, value) = self.read_pair()?;
                if kind == XA_3270 {
                    display.set_attribute(display.cursor(), FieldAttribute::from_byte(value));
                }
            }
            OrderCode::ModifyField => {
                let pairs = self.read_pairs()?;
                for (kind, value) in pairs {
                    if kind == XA_3270 {
                        display.set_attribute(display.cursor(), FieldAttribute::from_byte(value));
                    }
                }
            }
            OrderCode::InsertCursor => {}
            OrderCode::ProgramTab => {
                if let Some(start) = display.find_next_unprotected_field(display.cursor()) {
                    display.set_cursor((start + 1) % size);
                }
            }
            OrderCode::RepeatToAddress => {
                let target = self.read_address()?;
                let fill = self.next_byte()?;
                if target >= size {
                    return Some(());
                }
                let mut pos = display.cursor();
                while pos != target {
                    display.set_host_byte(pos, fill);
                    pos = (pos + 1) % size;
                }
                display.set_cursor(target);
            }
            OrderCode::EraseUnprotectedToAddress => {
                let target = self.read_address()?;
                if target >= size {
                    return Some(());
                }
                let mut pos = display.cursor();
                while pos != target {
                    if !display.is_field_start(pos) && !display.is_protected(pos) {
                        display.set_host_byte(pos, HOST_NULL);
                    }
                    pos = (pos + 1) % size;
                }
            }
            OrderCode::GraphicEscape => {
                let byte = self.next_byte()?;
                write_data(display, byte);
            }
        }
        Some(())
    }
}

fn write_data(display: &mut Display3270, byte: u8) {
    display.set_host_byte(display.cursor(), byte);
    display.advance_cursor();
}

/// Reader loop for an established connection.
///
/// Splits the incoming byte stream into Telnet commands and 3270 records,
/// answers late negotiation requests, and hands each complete record to the
/// processor under the buffer lock. After every record the completion rules
/// are evaluated and screen update waiters are woken.
pub struct DataStreamReader<R> {
    reader: R,
    negotiator: TelnetNegotiator,
    processor: ProtocolProcessor3270,
    record: Vec<u8>,
    discarding: bool,
    running: Arc<AtomicBool>,
}

impl<R: Read> DataStreamReader<R> {
    pub fn new(
        reader: R,
        negotiator: TelnetNegotiator,
        processor: ProtocolProcessor3270,
        running: Arc<AtomicBool>,
    ) -> Self {
        Self {
            reader,
            negotiator,
            processor,
            record: Vec::new(),
            discarding: false,
            running,
        }
    }

    pub fn negotiator(&self) -> &TelnetNegotiator {
        &self.negotiator
    }

    /// Append one 3270 data byte to the pending record
    pub fn push_data(&mut self, byte: u8) {
        if self.discarding {
            return;
        }
        if self.record.len() >= MAX_RECORD_SIZE {
            warn!("record exceeds {} bytes, discarding it", MAX_RECORD_SIZE);
            self.record.clear();
            self.discarding = true;
            return;
        }
        self.record.push(byte);
    }

    /// Read until the host closes the stream or the running flag drops.
    ///
    /// End of stream and a cleared running flag are a normal exit. Read
    /// timeouts only serve to re-check the flag.
    pub fn run(&mut self, shared: &SharedDisplay, writer: &HostWriter) -> Result<()> {
        let mut buf = [0u8; READ_CHUNK_SIZE];
        while self.running.load(Ordering::SeqCst) {
            let n = match self.reader.read(&mut buf) {
                Ok(0) => {
                    info!("host closed the connection");
                    return Ok(());
                }
                Ok(n) => n,
                Err(e)
                    if matches!(
                        e.kind(),
                        ErrorKind::WouldBlock | ErrorKind::TimedOut | ErrorKind::Interrupted
                    ) =>
                {
                    continue
                }
                Err(_) if !self.running.load(Ordering::SeqCst) => return Ok(()),
                Err(e) => return Err(e.into()),
            };

            for &byte in &buf[..n] {
                self.handle_byte(byte, shared, writer)?;
            }
        }
        debug!("reader stopped");
        Ok(())
    }

    fn handle_byte(&mut self, byte: u8, shared: &SharedDisplay, writer: &HostWriter) -> Result<()> {
        match self.negotiator.feed(byte) {
            TelnetEvent::Data(data) => self.push_data(data),
            TelnetEvent::EndOfRecord => self.dispatch_record(shared)?,
            TelnetEvent::Negotiation => {
                let reply = self.negotiator.take_output();
                if !reply.is_empty() {
                    writer.send(&reply)?;
                }
            }
            TelnetEvent::EndMarker => {
                let mut guard = self.lock_display(shared)?;
                shared.notify_update(&mut guard);
            }
            TelnetEvent::Pending | TelnetEvent::Command(_) => {}
        }
        Ok(())
    }

    fn dispatch_record(&mut self, shared: &SharedDisplay) -> Result<()> {
        let record = std::mem::take(&mut self.record);
        if std::mem::replace(&mut self.discarding, false) {
            return Ok(());
        }
        if record.is_empty() {
            trace!("empty record");
            return Ok(());
        }

        let mut guard = self.lock_display(shared)?;
        self.processor.process_record(&record, &mut guard)?;
        shared.finish_record(&mut guard);
        shared.notify_update(&mut guard);
        Ok(())
    }

    /// Take the buffer lock, retrying on timeout while still running
    fn lock_display<'s>(&self, shared: &'s SharedDisplay) -> Result<DisplayGuard<'s>> {
        loop {
            match shared.lock() {
                Ok(guard) => return Ok(guard),
                Err(e @ TN3270Error::LockTimeout { .. }) => {
                    if !self.running.load(Ordering::SeqCst) {
                        return Err(e);
                    }
                }
                Err(e) => return Err(e),
            }
        }
    }
}
