//! TN3270 Display Buffer Management
//!
//! The 3270 presentation space: host bytes, the display characters derived
//! from them, field starts and their attributes, the cursor, and a background
//! copy used around print-oriented redraws. Geometry is fixed at 24x80.
//!
//! Field starts are kept in a sorted set, so "which field owns this cell"
//! lookups are logarithmic while keeping the circular semantics of a 3270
//! buffer: a cell belongs to the nearest field start at or before it,
//! wrapping to the last field start in the buffer.

use std::collections::BTreeSet;
use std::fmt;
use std::ops::Range;

use super::codes::{HOST_BLANK, HOST_NULL};
use super::cycle::ResponseCycle;
use super::field::FieldAttribute;
use crate::protocol_common::ebcdic::{to_display, to_host};

/// Rows of the Model 2 presentation space
pub const ROWS: usize = 24;
/// Columns of the Model 2 presentation space
pub const COLS: usize = 80;
/// Total number of cells
pub const BUFFER_SIZE: usize = ROWS * COLS;

/// Row/column view of a linear buffer position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferPosition {
    pub row: usize,
    pub col: usize,
}

impl BufferPosition {
    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    /// Position of a buffer address, `None` when it is off the screen
    pub fn from_address(address: usize) -> Option<Self> {
        if address < BUFFER_SIZE {
            Some(Self {
                row: address / COLS,
                col: address % COLS,
            })
        } else {
            None
        }
    }

    /// Linear buffer address, `None` when row or column is out of range
    pub fn address(&self) -> Option<usize> {
        if self.is_valid() {
            Some(self.row * COLS + self.col)
        } else {
            None
        }
    }

    pub fn is_valid(&self) -> bool {
        self.row < ROWS && self.col < COLS
    }
}

impl fmt::Display for BufferPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// 3270 Display Buffer
///
/// All mutation is expected to happen while the buffer lock is held (see
/// [`SharedDisplay`](super::shared::SharedDisplay)).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Display3270 {
    display: Vec<char>,
    host_bytes: Vec<u8>,
    background_display: Vec<char>,
    background_host_bytes: Vec<u8>,
    modified_since_write: Vec<bool>,
    attributes: Vec<FieldAttribute>,
    field_starts: BTreeSet<usize>,
    /// Field starts set since the last clear; never decremented
    field_count: usize,
    cursor: usize,
    cycle: ResponseCycle,
    updates: u64,
}

impl Display3270 {
    /// Create a blank 24x80 buffer
    pub fn new() -> Self {
        Self {
            display: vec![' '; BUFFER_SIZE],
            host_bytes: vec![HOST_NULL; BUFFER_SIZE],
            background_display: vec![' '; BUFFER_SIZE],
            background_host_bytes: vec![HOST_NULL; BUFFER_SIZE],
            modified_since_write: vec![false; BUFFER_SIZE],
            attributes: vec![FieldAttribute::default(); BUFFER_SIZE],
            field_starts: BTreeSet::new(),
            field_count: 0,
            cursor: 0,
            cycle: ResponseCycle::new(),
            updates: 0,
        }
    }

    pub fn rows(&self) -> usize {
        ROWS
    }

    pub fn cols(&self) -> usize {
        COLS
    }

    pub fn buffer_size(&self) -> usize {
        BUFFER_SIZE
    }

    /// Reset every cell to blank and unprotected, drop all fields, home the
    /// cursor and zero the per-cycle counters.
    pub fn clear(&mut self) {
        self.display.fill(' ');
        self.host_bytes.fill(HOST_NULL);
        self.background_display.fill(' ');
        self.background_host_bytes.fill(HOST_NULL);
        self.modified_since_write.fill(false);
        self.attributes.fill(FieldAttribute::default());
        self.field_starts.clear();
        self.field_count = 0;
        self.cursor = 0;
        self.cycle.clear_counts();
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn cursor_position(&self) -> BufferPosition {
        BufferPosition {
            row: self.cursor / COLS,
            col: self.cursor % COLS,
        }
    }

    /// Move the cursor. Addresses outside the buffer are ignored.
    pub fn set_cursor(&mut self, address: usize) {
        if address < BUFFER_SIZE {
            self.cursor = address;
        }
    }

    /// Advance the cursor by one cell, wrapping at the end of the buffer
    pub fn advance_cursor(&mut self) {
        self.cursor = (self.cursor + 1) % BUFFER_SIZE;
    }

    pub fn host_byte(&self, pos: usize) -> Option<u8> {
        self.host_bytes.get(pos).copied()
    }

    pub fn display_char(&self, pos: usize) -> Option<char> {
        self.display.get(pos).copied()
    }

    pub fn is_modified_since_write(&self, pos: usize) -> bool {
        self.modified_since_write.get(pos).copied().unwrap_or(false)
    }

    /// Store a byte received from the host
    pub fn set_host_byte(&mut self, pos: usize, byte: u8) {
        self.cycle.count_host_byte();
        if pos >= BUFFER_SIZE {
            return;
        }

        self.host_bytes[pos] = byte;
        self.display[pos] = to_display(byte);

        if self.field_attribute(pos).is_some_and(|attr| attr.is_modified()) {
            self.modified_since_write[pos] = true;
        }
    }

    /// Store a character typed locally; marks the owning field modified
    pub fn set_display_char(&mut self, pos: usize, ch: char) {
        if pos >= BUFFER_SIZE {
            return;
        }

        self.display[pos] = ch;
        self.host_bytes[pos] = to_host(ch);
        self.modified_since_write[pos] = true;

        if let Some(start) = self.find_field_start(pos) {
            self.attributes[start].set_modified(true);
        }
    }

    /// Copy the contents of cell `from` into cell `to` as-is: host byte,
    /// display character and modified flag. Nulls stay nulls and no field
    /// is marked modified.
    pub fn copy_cell(&mut self, from: usize, to: usize) {
        if from >= BUFFER_SIZE || to >= BUFFER_SIZE {
            return;
        }
        self.host_bytes[to] = self.host_bytes[from];
        self.display[to] = self.display[from];
        self.modified_since_write[to] = self.modified_since_write[from];
    }

    pub fn is_field_start(&self, pos: usize) -> bool {
        self.field_starts.contains(&pos)
    }

    pub fn set_field_start(&mut self, pos: usize, is_start: bool) {
        if pos >= BUFFER_SIZE {
            return;
        }
        if is_start {
            self.field_starts.insert(pos);
            self.field_count += 1;
        } else {
            self.field_starts.remove(&pos);
        }
    }

    /// Start a field at `pos`: attribute, field-start marker and a blank cell
    pub fn start_field(&mut self, pos: usize, attr: FieldAttribute) {
        self.set_field_start(pos, true);
        self.set_attribute(pos, attr);
        self.set_host_byte(pos, HOST_BLANK);
    }

    pub fn field_count(&self) -> usize {
        self.field_count
    }

    pub fn has_fields(&self) -> bool {
        self.field_count > 0
    }

    /// Field start positions in ascending order
    pub fn field_starts(&self) -> impl Iterator<Item = usize> + '_ {
        self.field_starts.iter().copied()
    }

    /// Attribute stored at `pos`, meaningful at field starts
    pub fn attribute(&self, pos: usize) -> FieldAttribute {
        self.attributes.get(pos).copied().unwrap_or_default()
    }

    pub fn set_attribute(&mut self, pos: usize, attr: FieldAttribute) {
        if let Some(slot) = self.attributes.get_mut(pos) {
            *slot = attr;
        }
    }

    /// Attribute of the field owning `pos`
    pub fn field_attribute(&self, pos: usize) -> Option<FieldAttribute> {
        self.find_field_start(pos).map(|start| self.attributes[start])
    }

    /// True when `pos` lies in a protected field. Unformatted screens are
    /// entirely unprotected.
    pub fn is_protected(&self, pos: usize) -> bool {
        if pos >= BUFFER_SIZE {
            return true;
        }
        self.field_attribute(pos).is_some_and(|attr| attr.is_protected())
    }

    /// Nearest field start at or before `pos`, wrapping to the last field
    /// start in the buffer. `None` when there are no fields.
    pub fn find_field_start(&self, pos: usize) -> Option<usize> {
        if !self.has_fields() {
            return None;
        }
        self.field_starts
            .range(..=pos)
            .next_back()
            .or_else(|| self.field_starts.iter().next_back())
            .copied()
    }

    /// Next field start after `pos`, wrapping once around the buffer.
    /// Returns `pos` itself when nothing qualifies.
    pub fn find_next_field(&self, pos: usize) -> Option<usize> {
        self.find_forward(pos, |_| true)
    }

    /// Next unprotected field start after `pos`, wrapping once around the
    /// buffer. Returns `pos` itself when nothing qualifies.
    pub fn find_next_unprotected_field(&self, pos: usize) -> Option<usize> {
        self.find_forward(pos, |attr| !attr.is_protected())
    }

    /// Unprotected field start before the field owning `pos`, wrapping once
    /// around the buffer. Returns `pos` itself when nothing qualifies.
    pub fn find_previous_unprotected_field(&self, pos: usize) -> Option<usize> {
        let current = self.find_field_start(pos)?;
        let unprotected = |start: &&usize| !self.attributes[**start].is_protected();

        let found = self
            .field_starts
            .range(..current)
            .rev()
            .find(unprotected)
            .or_else(|| {
                self.field_starts
                    .range(current + 1..)
                    .rev()
                    .find(unprotected)
            })
            .copied();
        Some(found.unwrap_or(pos))
    }

    /// First unprotected field start in buffer order
    pub fn first_unprotected_field(&self) -> Option<usize> {
        self.field_starts
            .iter()
            .copied()
            .find(|&start| !self.attributes[start].is_protected())
    }

    fn find_forward(&self, pos: usize, accept: impl Fn(&FieldAttribute) -> bool) -> Option<usize> {
        if !self.has_fields() {
            return None;
        }
        let accept = |start: &&usize| accept(&self.attributes[**start]);

        let found = self
            .field_starts
            .range(pos.saturating_add(1)..)
            .find(accept)
            .or_else(|| self.field_starts.range(..=pos).find(accept))
            .copied();
        Some(found.unwrap_or(pos))
    }

    /// Cell ranges covered by each field, including its start cell.
    ///
    /// The last field runs to the end of the buffer and continues from 0 up
    /// to the first field start, so it may come back as two ranges.
    pub fn field_spans(&self) -> Vec<(usize, Range<usize>, Range<usize>)> {
        let starts: Vec<usize> = self.field_starts.iter().copied().collect();
        let mut spans = Vec::with_capacity(starts.len());

        for (index, &start) in starts.iter().enumerate() {
            let end = starts[(index + 1) % starts.len()];
            if end > start {
                spans.push((start, start..end, 0..0));
            } else {
                spans.push((start, start..BUFFER_SIZE, 0..end));
            }
        }
        spans
    }

    /// Clear the MDT of every unprotected field that has it set
    pub fn reset_modified_data_tags(&mut self) {
        if !self.has_fields() {
            return;
        }
        for &start in &self.field_starts {
            let attr = &mut self.attributes[start];
            if !attr.is_protected() && attr.is_modified() {
                attr.set_modified(false);
            }
        }
    }

    /// Overwrite the data cells of every unprotected field with host nulls
    pub fn erase_all_unprotected(&mut self) {
        for (start, head, tail) in self.field_spans() {
            if self.attributes[start].is_protected() {
                continue;
            }
            for pos in head.chain(tail) {
                if !self.is_field_start(pos) {
                    self.set_host_byte(pos, HOST_NULL);
                }
            }
        }
    }

    /// Snapshot the live buffer into the background copy and blank it
    pub fn copy_to_background(&mut self) {
        self.background_display.copy_from_slice(&self.display);
        self.background_host_bytes.copy_from_slice(&self.host_bytes);
        self.display.fill(' ');
        self.host_bytes.fill(HOST_NULL);
    }

    /// Bring back every field the host left untouched since
    /// [`copy_to_background`](Self::copy_to_background).
    ///
    /// A field counts as untouched when all of its live host bytes are null.
    pub fn restore_from_background(&mut self) {
        if !self.has_fields() {
            return;
        }
        for (_, head, tail) in self.field_spans() {
            let untouched = head
                .clone()
                .chain(tail.clone())
                .all(|pos| self.host_bytes[pos] == HOST_NULL);
            if !untouched {
                continue;
            }
            for range in [head, tail] {
                self.host_bytes[range.clone()].copy_from_slice(&self.background_host_bytes[range.clone()]);
                self.display[range.clone()].copy_from_slice(&self.background_display[range]);
            }
        }
    }

    /// Host bytes of every field with its MDT set, keyed by the address of
    /// the field's first data cell. Null bytes are left out.
    pub fn modified_fields(&self) -> Vec<(usize, Vec<u8>)> {
        let mut fields = Vec::new();
        for (start, head, tail) in self.field_spans() {
            if !self.attributes[start].is_modified() {
                continue;
            }
            let data = head
                .chain(tail)
                .filter(|&pos| pos != start)
                .map(|pos| self.host_bytes[pos])
                .filter(|&byte| byte != HOST_NULL)
                .collect();
            fields.push(((start + 1) % BUFFER_SIZE, data));
        }
        fields
    }

    pub fn cycle(&self) -> &ResponseCycle {
        &self.cycle
    }

    pub fn cycle_mut(&mut self) -> &mut ResponseCycle {
        &mut self.cycle
    }

    /// Number of screen update notifications raised so far
    pub fn updates(&self) -> u64 {
        self.updates
    }

    pub(crate) fn mark_updated(&mut self) {
        self.updates += 1;
    }

    /// Text of one row as shown on screen, `None` past the last row.
    /// Field-start cells and non-display fields render as blanks.
    pub fn row_text(&self, row: usize) -> Option<String> {
        if row >= ROWS {
            return None;
        }
        let start = row * COLS;
        Some(self.text_at(start, COLS))
    }

    /// Screen text of `len` cells from `pos`, wrapping around the buffer
    pub fn text_at(&self, pos: usize, len: usize) -> String {
        (0..len)
            .map(|offset| self.visible_char((pos + offset) % BUFFER_SIZE))
            .collect()
    }

    /// Whole screen as text, rows joined with `separator`
    pub fn to_string_with(&self, separator: &str) -> String {
        (0..ROWS)
            .filter_map(|row| self.row_text(row))
            .collect::<Vec<_>>()
            .join(separator)
    }

    fn visible_char(&self, pos: usize) -> char {
        if self.is_field_start(pos) {
            return ' ';
        }
        match self.field_attribute(pos) {
            Some(attr) if attr.is_hidden() => ' ',
            _ => self.display[pos],
        }
    }
}

impl fmt::Display for Display3270 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_string_with("\n"))
    }
}

impl Default for Display3270 {
    fn default() -> Self {
        Self::new()
    }
}

/// Buffer addressing utilities for 3270
pub mod addressing {
    /// Graphic characters used to carry six address bits per byte.
    /// The low six bits of each entry equal its index.
    const ADDRESS_CODES: [u8; 64] = [
        0x40, 0xC1, 0xC2, 0xC3, 0xC4, 0xC5, 0xC6, 0xC7,
        0xC8, 0xC9, 0x4A, 0x4B, 0x4C, 0x4D, 0x4E, 0x4F,
        0x50, 0xD1, 0xD2, 0xD3, 0xD4, 0xD5, 0xD6, 0xD7,
        0xD8, 0xD9, 0x5A, 0x5B, 0x5C, 0x5D, 0x5E, 0x5F,
        0x60, 0x61, 0xE2, 0xE3, 0xE4, 0xE5, 0xE6, 0xE7,
        0xE8, 0xE9, 0x6A, 0x6B, 0x6C, 0x6D, 0x6E, 0x6F,
        0xF0, 0xF1, 0xF2, 0xF3, 0xF4, 0xF5, 0xF6, 0xF7,
        0xF8, 0xF9, 0x7A, 0x7B, 0x7C, 0x7D, 0x7E, 0x7F,
    ];

    /// Decode a 12-bit buffer address from two bytes
    ///
    /// Only the low six bits of each byte are significant, so both the
    /// graphic encoding and raw six-bit values decode.
    pub fn decode_12bit_address(byte1: u8, byte2: u8) -> u16 {
        (((byte1 & 0x3F) as u16) << 6) | (byte2 & 0x3F) as u16
    }

    /// Encode a 12-bit buffer address to two bytes
    pub fn encode_12bit_address(address: u16) -> (u8, u8) {
        let high = ((address >> 6) & 0x3F) as usize;
        let low = (address & 0x3F) as usize;
        (ADDRESS_CODES[high], ADDRESS_CODES[low])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn protected() -> FieldAttribute {
        FieldAttribute::from_byte(0x20)
    }

    fn unprotected() -> FieldAttribute {
        FieldAttribute::from_byte(0x00)
    }

    fn write_text(display: &mut Display3270, pos: usize, text: &str) {
        for (offset, ch) in text.chars().enumerate() {
            display.set_host_byte(pos + offset, to_host(ch));
        }
    }

    #[test]
    fn test_display_creation() {
        let display = Display3270::new();
        assert_eq!(display.rows(), 24);
        assert_eq!(display.cols(), 80);
        assert_eq!(display.buffer_size(), 1920);
        assert_eq!(display.cursor(), 0);
        assert!(!display.has_fields());
    }

    #[test]
    fn test_buffer_position() {
        assert_eq!(BufferPosition::from_address(81), Some(BufferPosition::new(1, 1)));
        assert_eq!(BufferPosition::from_address(1920), None);
        assert_eq!(BufferPosition::new(23, 79).address(), Some(1919));
        assert_eq!(BufferPosition::new(24, 0).address(), None);
    }

    #[test]
    fn test_cursor_ignores_out_of_range() {
        let mut display = Display3270::new();
        display.set_cursor(81);
        assert_eq!(display.cursor_position(), BufferPosition::new(1, 1));
        display.set_cursor(4000);
        assert_eq!(display.cursor(), 81);
        display.set_cursor(1919);
        display.advance_cursor();
        assert_eq!(display.cursor(), 0);
    }

    #[test]
    fn test_set_host_byte_counts_and_converts() {
        let mut display = Display3270::new();
        display.set_host_byte(0, 0xC1);
        assert_eq!(display.display_char(0), Some('A'));
        assert_eq!(display.host_byte(0), Some(0xC1));
        assert_eq!(display.cycle().host_byte_count(), 1);
        assert!(!display.is_modified_since_write(0));
    }

    #[test]
    fn test_set_host_byte_in_modified_field() {
        let mut display = Display3270::new();
        display.start_field(10, FieldAttribute::from_byte(0x01));
        display.set_host_byte(11, 0xC1);
        assert!(display.is_modified_since_write(11));
    }

    #[test]
    fn test_set_display_char_marks_field() {
        let mut display = Display3270::new();
        display.start_field(10, unprotected());
        display.set_display_char(12, 'x');
        assert_eq!(display.host_byte(12), Some(0xA7));
        assert!(display.is_modified_since_write(12));
        assert!(display.attribute(10).is_modified());
    }

    #[test]
    fn test_field_count_is_cumulative() {
        let mut display = Display3270::new();
        display.set_field_start(5, true);
        display.set_field_start(5, true);
        display.set_field_start(5, false);
        assert_eq!(display.field_count(), 2);
        assert!(!display.is_field_start(5));
    }

    #[test]
    fn test_find_field_start_wraps() {
        let mut display = Display3270::new();
        assert_eq!(display.find_field_start(100), None);

        display.start_field(100, protected());
        display.start_field(1800, unprotected());
        assert_eq!(display.find_field_start(100), Some(100));
        assert_eq!(display.find_field_start(500), Some(100));
        assert_eq!(display.find_field_start(1900), Some(1800));
        // Before the first field start the owner is the last field
        assert_eq!(display.find_field_start(50), Some(1800));
    }

    #[test]
    fn test_field_navigation_wraps() {
        let mut display = Display3270::new();
        display.start_field(5, unprotected());
        display.start_field(100, protected());
        display.start_field(1800, unprotected());

        assert_eq!(display.find_next_field(1800), Some(5));
        assert_eq!(display.find_next_field(5), Some(100));
        assert_eq!(display.find_next_unprotected_field(5), Some(1800));
        assert_eq!(display.find_next_unprotected_field(1850), Some(5));
        assert_eq!(display.find_previous_unprotected_field(5), Some(1800));
        assert_eq!(display.find_previous_unprotected_field(150), Some(5));
    }

    #[test]
    fn test_navigation_returns_start_when_nothing_qualifies() {
        let mut display = Display3270::new();
        display.start_field(40, protected());
        assert_eq!(display.find_next_unprotected_field(10), Some(10));
        assert_eq!(display.find_previous_unprotected_field(60), Some(60));
        assert_eq!(display.first_unprotected_field(), None);
    }

    #[test]
    fn test_clear_idempotence() {
        let mut once = Display3270::new();
        once.clear();

        let mut twice = Display3270::new();
        twice.start_field(3, protected());
        write_text(&mut twice, 4, "DATA");
        twice.clear();
        twice.clear();

        assert_eq!(once, twice);
    }

    #[test]
    fn test_erase_all_unprotected_preserves_protected() {
        let mut display = Display3270::new();
        display.start_field(0, protected());
        write_text(&mut display, 1, "AAAA");
        display.start_field(10, unprotected());
        write_text(&mut display, 11, "BBBB");

        display.erase_all_unprotected();

        assert_eq!(display.text_at(1, 4), "AAAA");
        for pos in 11..15 {
            assert_eq!(display.host_byte(pos), Some(HOST_NULL));
        }
    }

    #[test]
    fn test_reset_modified_data_tags() {
        let mut display = Display3270::new();
        display.start_field(0, FieldAttribute::from_byte(0x21));
        display.start_field(10, FieldAttribute::from_byte(0x01));
        display.reset_modified_data_tags();
        assert!(display.attribute(0).is_modified());
        assert!(!display.attribute(10).is_modified());
    }

    #[test]
    fn test_background_restore_untouched_field() {
        let mut display = Display3270::new();
        display.start_field(0, unprotected());
        write_text(&mut display, 1, "HELLO");

        display.copy_to_background();
        assert_eq!(display.host_byte(1), Some(HOST_NULL));

        display.restore_from_background();
        assert_eq!(display.text_at(1, 5), "HELLO");
    }

    #[test]
    fn test_background_restore_skips_rewritten_field() {
        let mut display = Display3270::new();
        display.start_field(0, unprotected());
        write_text(&mut display, 1, "HELLO");

        display.copy_to_background();
        display.set_host_byte(1, to_host('X'));
        display.restore_from_background();

        assert_eq!(display.display_char(1), Some('X'));
        assert_eq!(display.host_byte(2), Some(HOST_NULL));
    }

    #[test]
    fn test_background_restore_wrapping_field() {
        let mut display = Display3270::new();
        display.start_field(100, protected());
        display.start_field(1900, unprotected());
        write_text(&mut display, 1915, "TAIL");
        write_text(&mut display, 0, "HEAD");
        write_text(&mut display, 101, "KEEP");

        display.copy_to_background();
        write_text(&mut display, 101, "NEW!");
        display.restore_from_background();

        assert_eq!(display.text_at(1915, 4), "TAIL");
        assert_eq!(display.text_at(0, 4), "HEAD");
        assert_eq!(display.text_at(101, 4), "NEW!");
    }

    #[test]
    fn test_modified_fields() {
        let mut display = Display3270::new();
        display.start_field(0, protected());
        display.start_field(10, unprotected());
        display.start_field(20, protected());
        display.set_display_char(11, 'H');
        display.set_display_char(12, 'I');

        let fields = display.modified_fields();
        assert_eq!(fields, vec![(11, vec![0xC8, 0xC9])]);
    }

    #[test]
    fn test_row_text_hides_attributes_and_hidden_fields() {
        let mut display = Display3270::new();
        display.start_field(0, protected());
        write_text(&mut display, 1, "USER");
        display.start_field(5, FieldAttribute::from_byte(0x0C));
        write_text(&mut display, 6, "PASS");

        let row = display.row_text(0).unwrap();
        assert_eq!(&row[..10], " USER     ");
        assert_eq!(display.row_text(24), None);
        assert_eq!(display.to_string().lines().count(), 24);
    }

    #[test]
    fn test_addressing_12bit() {
        use addressing::*;

        assert_eq!(encode_12bit_address(0), (0x40, 0x40));
        assert_eq!(encode_12bit_address(81), (0xC1, 0xD1));
        assert_eq!(decode_12bit_address(0xC1, 0xD1), 81);
        // Raw six-bit form decodes to the same address
        assert_eq!(decode_12bit_address(0x01, 0x11), 81);
        let (b1, b2) = encode_12bit_address(1919);
        assert_eq!(decode_12bit_address(b1, b2), 1919);
    }
}
