//! Operator-side access to the screen: typing, field navigation and
//! attention keys.
//!
//! Every AID is sent under the buffer lock and then waits, still holding the
//! lock between wake-ups, until the reader thread judges the host reply
//! complete. A reply that never completes surfaces as
//! [`TN3270Error::CompletionTimeout`].

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use log::{debug, warn};

use super::codes::{AidKey, ORDER_SBA};
use super::display::{addressing, Display3270};
use super::shared::{HostWriter, SharedDisplay};
use crate::error::{Result, TN3270Error};
use crate::protocol_common::telnet_base::{push_end_of_record, push_escaped};

/// Build the inbound record for `aid`: AID byte, cursor address, one
/// SBA-prefixed run per modified field, then `IAC EOR`.
///
/// Only formatted screens carry data: text typed on an unformatted screen
/// is not sent.
pub fn encode_aid_request(display: &Display3270, aid: AidKey) -> Vec<u8> {
    let mut request = vec![aid.to_u8()];
    let (b1, b2) = addressing::encode_12bit_address(display.cursor() as u16);
    request.extend([b1, b2]);

    for (address, data) in display.modified_fields() {
        let (b1, b2) = addressing::encode_12bit_address(address as u16);
        request.extend([ORDER_SBA, b1, b2]);
        push_escaped(&mut request, &data);
    }

    push_end_of_record(&mut request);
    request
}

#[derive(Debug)]
pub struct Screen {
    shared: Arc<SharedDisplay>,
    writer: HostWriter,
    insert_mode: AtomicBool,
    completion_timeout: Duration,
}

impl Screen {
    pub fn new(shared: Arc<SharedDisplay>, writer: HostWriter, completion_timeout: Duration) -> Self {
        Self {
            shared,
            writer,
            insert_mode: AtomicBool::new(false),
            completion_timeout,
        }
    }

    pub fn completion_timeout(&self) -> Duration {
        self.completion_timeout
    }

    pub fn is_insert_mode(&self) -> bool {
        self.insert_mode.load(Ordering::Relaxed)
    }

    pub fn set_insert_mode(&self, enabled: bool) {
        self.insert_mode.store(enabled, Ordering::Relaxed);
    }

    /// Type `text` at the cursor
    pub fn put_string(&self, text: &str) -> Result<()> {
        let mut display = self.shared.lock()?;
        let cursor = display.cursor();
        self.type_into(&mut display, cursor, text);
        Ok(())
    }

    /// Type `text` starting at `pos`, one character per cell. Characters
    /// that land on protected or attribute cells are dropped. The cursor ends
    /// after the last cell visited.
    pub fn put_string_at(&self, pos: usize, text: &str) -> Result<()> {
        let mut display = self.shared.lock()?;
        self.type_into(&mut display, pos, text);
        Ok(())
    }

    fn type_into(&self, display: &mut Display3270, pos: usize, text: &str) {
        let size = display.buffer_size();
        if text.is_empty() || pos >= size {
            return;
        }

        let insert = self.is_insert_mode();
        let mut current = pos;
        for ch in text.chars() {
            if current >= size {
                break;
            }
            if !display.is_field_start(current) && !display.is_protected(current) {
                if insert {
                    shift_right(display, current);
                }
                display.set_display_char(current, ch);
            }
            current += 1;
        }
        display.set_cursor(current.min(size - 1));
    }

    /// Move the cursor into the next unprotected field
    pub fn tab(&self) -> Result<()> {
        let mut display = self.shared.lock()?;
        if let Some(start) = display.find_next_unprotected_field(display.cursor()) {
            let size = display.buffer_size();
            display.set_cursor((start + 1) % size);
        }
        Ok(())
    }

    /// Move the cursor into the first unprotected field, or to 0 on an
    /// unformatted screen
    pub fn home(&self) -> Result<()> {
        let mut display = self.shared.lock()?;
        let size = display.buffer_size();
        let target = display
            .first_unprotected_field()
            .map_or(0, |start| (start + 1) % size);
        display.set_cursor(target);
        Ok(())
    }

    pub fn enter(&self) -> Result<()> {
        self.send_aid(AidKey::Enter)
    }

    /// Clear the local screen, then send the Clear AID
    pub fn clear(&self) -> Result<()> {
        self.transmit(AidKey::Clear, true)
    }

    /// Send PF1 through PF12
    pub fn pf(&self, number: u8) -> Result<()> {
        let aid = AidKey::pf(number).ok_or_else(|| TN3270Error::InvalidKey {
            key: format!("PF{}", number),
        })?;
        self.send_aid(aid)
    }

    /// Send PA1 through PA3
    pub fn pa(&self, number: u8) -> Result<()> {
        let aid = AidKey::pa(number).ok_or_else(|| TN3270Error::InvalidKey {
            key: format!("PA{}", number),
        })?;
        self.send_aid(aid)
    }

    pub fn send_aid(&self, aid: AidKey) -> Result<()> {
        self.transmit(aid, false)
    }

    fn transmit(&self, aid: AidKey, clear_first: bool) -> Result<()> {
        let mut display = self.shared.lock()?;
        if clear_first {
            display.clear();
        }
        display.cycle_mut().begin(aid);

        let request = encode_aid_request(&display, aid);
        debug!("sending {:?} ({} bytes)", aid, request.len());
        self.writer.send(&request)?;

        if self.shared.wait_for_completion(&mut display, self.completion_timeout) {
            Ok(())
        } else {
            warn!("no complete reply to {:?} within {:?}", aid, self.completion_timeout);
            Err(TN3270Error::CompletionTimeout {
                timeout_ms: self.completion_timeout.as_millis() as u64,
            })
        }
    }

    /// Whole screen as text, one line per row
    pub fn screen_text(&self) -> Result<String> {
        Ok(self.shared.lock()?.to_string())
    }

    pub fn cursor(&self) -> Result<usize> {
        Ok(self.shared.lock()?.cursor())
    }
}

/// Open a cell at `pos` by moving the rest of its field one to the right.
/// Cells move raw, so nulls stay nulls. The last cell of the field falls off.
fn shift_right(display: &mut Display3270, pos: usize) {
    let end = display
        .find_next_field(pos)
        .filter(|&next| next > pos)
        .unwrap_or(display.buffer_size());

    for i in (pos + 1..end).rev() {
        if display.is_protected(i) {
            continue;
        }
        display.copy_cell(i - 1, i);
    }
}
