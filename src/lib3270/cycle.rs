//! Response cycle bookkeeping
//!
//! A response cycle starts when the terminal sends an AID and ends when the
//! host reply is judged complete. Hosts do not mark the last record of a
//! reply, so completion is decided per record from the counters kept here.

use super::codes::{AidKey, WCC_START_PRINTER};

/// Why a record was judged to complete the current cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionReason {
    /// No command or no AID recorded yet (first data after connect)
    Unsolicited,
    /// WCC requested start printer, so a full page was rendered
    StartPrinter,
    /// A previous record in this cycle was already counted, or counting is disabled
    Acknowledged,
    /// Orders were processed and more than one host byte written
    VisibleContent,
    /// No orders, and the key was one that may get an empty reply
    EmptyReply,
}

/// Per-cycle counters and the completion heuristic
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResponseCycle {
    command: Option<u8>,
    wcc: Option<u8>,
    aid: Option<AidKey>,
    order_count: usize,
    host_byte_count: usize,
    ack_count: usize,
    ignore_ack_count: bool,
    completions: u64,
}

impl ResponseCycle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new cycle for `aid`, dropping the counts of the previous one
    pub fn begin(&mut self, aid: AidKey) {
        self.aid = Some(aid);
        self.clear_counts();
    }

    pub fn clear_counts(&mut self) {
        self.order_count = 0;
        self.host_byte_count = 0;
        self.ack_count = 0;
    }

    pub fn record_command(&mut self, command: u8) {
        self.command = Some(command);
    }

    pub fn record_wcc(&mut self, wcc: u8) {
        self.wcc = Some(wcc);
    }

    pub fn count_order(&mut self) {
        self.order_count += 1;
    }

    pub fn count_host_byte(&mut self) {
        self.host_byte_count += 1;
    }

    pub fn set_ignore_ack_count(&mut self, ignore: bool) {
        self.ignore_ack_count = ignore;
    }

    pub fn command(&self) -> Option<u8> {
        self.command
    }

    pub fn wcc(&self) -> Option<u8> {
        self.wcc
    }

    pub fn aid(&self) -> Option<AidKey> {
        self.aid
    }

    pub fn order_count(&self) -> usize {
        self.order_count
    }

    pub fn host_byte_count(&self) -> usize {
        self.host_byte_count
    }

    pub fn ack_count(&self) -> usize {
        self.ack_count
    }

    /// Number of records that have completed a cycle so far
    pub fn completions(&self) -> u64 {
        self.completions
    }

    /// Evaluate the completion rules in order; the first match wins.
    pub fn completion_reason(&self) -> Option<CompletionReason> {
        let aid = match (self.command, self.aid) {
            (Some(_), Some(aid)) => aid,
            _ => return Some(CompletionReason::Unsolicited),
        };

        if self.wcc.is_some_and(|wcc| wcc & WCC_START_PRINTER != 0) {
            return Some(CompletionReason::StartPrinter);
        }

        if self.ack_count > 0 || self.ignore_ack_count {
            return Some(CompletionReason::Acknowledged);
        }

        if self.order_count > 0 && self.host_byte_count > 1 {
            return Some(CompletionReason::VisibleContent);
        }

        if self.order_count == 0 && aid.allows_empty_reply() {
            return Some(CompletionReason::EmptyReply);
        }

        None
    }

    /// Close out one processed record.
    ///
    /// Returns the reason when the cycle is complete. Otherwise the ack
    /// counter is bumped so the next record of the same reply completes it.
    pub fn complete_record(&mut self) -> Option<CompletionReason> {
        match self.completion_reason() {
            Some(reason) => {
                self.completions += 1;
                Some(reason)
            }
            None => {
                self.ack_count += 1;
                None
            }
        }
    }
}
