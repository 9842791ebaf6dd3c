//! Data stream scenarios
//!
//! Host byte streams fed through the record reader, checking the screen
//! buffer and the completion signal the way a waiting sender sees them.

use std::io::sink;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use tn3270r::lib3270::codes::*;
use tn3270r::lib3270::display::addressing::encode_12bit_address;
use tn3270r::lib3270::{
    AidKey, CompletionReason, DataStreamReader, Display3270, HostWriter, ProtocolProcessor3270,
    SharedDisplay,
};
use tn3270r::telnet_negotiation::TelnetNegotiator;
use tn3270r::TN3270Error;

const IAC_EOR: [u8; 2] = [0xFF, 0xEF];

fn run_stream(shared: &SharedDisplay, stream: &[u8], strict: bool) -> tn3270r::Result<()> {
    let mut reader = DataStreamReader::new(
        stream,
        TelnetNegotiator::default(),
        ProtocolProcessor3270::with_strict_commands(strict),
        Arc::new(AtomicBool::new(true)),
    );
    reader.run(shared, &HostWriter::new(sink()))
}

fn sba(address: u16) -> Vec<u8> {
    let (b1, b2) = encode_12bit_address(address);
    vec![ORDER_SBA, b1, b2]
}

/// WRITE with start-printer, SBA to 0, "HI"
#[test]
fn test_write_with_start_printer() {
    let shared = SharedDisplay::default();
    shared.lock().unwrap().cycle_mut().begin(AidKey::Enter);

    let mut stream = vec![CMD_WRITE, WCC_START_PRINTER, ORDER_SBA, 0x40, 0x40, 0xC8, 0xC9];
    stream.extend(IAC_EOR);
    run_stream(&shared, &stream, false).unwrap();

    let display = shared.lock().unwrap();
    assert_eq!(display.display_char(0), Some('H'));
    assert_eq!(display.display_char(1), Some('I'));
    assert_eq!(display.cycle().completions(), 1);
    assert_eq!(display.cycle().completion_reason(), Some(CompletionReason::StartPrinter));
}

/// Clear with an empty reply still completes
#[test]
fn test_clear_with_empty_reply_completes() {
    let shared = SharedDisplay::default();
    shared.lock().unwrap().cycle_mut().begin(AidKey::Clear);

    let mut stream = vec![CMD_ERASE_WRITE, WCC_KEYBOARD_RESTORE];
    stream.extend(IAC_EOR);
    run_stream(&shared, &stream, false).unwrap();

    let display = shared.lock().unwrap();
    assert_eq!(display.cycle().order_count(), 0);
    assert_eq!(display.cycle().host_byte_count(), 0);
    assert_eq!(display.cycle().completions(), 1);
}

/// Enter answered by a bare keyboard-restore record, then data
#[test]
fn test_enter_waits_for_second_record() {
    let shared = SharedDisplay::default();
    shared.lock().unwrap().cycle_mut().begin(AidKey::Enter);

    let mut stream = vec![CMD_WRITE, WCC_KEYBOARD_RESTORE];
    stream.extend(IAC_EOR);
    run_stream(&shared, &stream, false).unwrap();
    {
        let display = shared.lock().unwrap();
        assert_eq!(display.cycle().completions(), 0);
        assert_eq!(display.cycle().ack_count(), 1);
    }

    let mut stream = vec![CMD_WRITE, WCC_KEYBOARD_RESTORE, 0xC1];
    stream.extend(IAC_EOR);
    run_stream(&shared, &stream, false).unwrap();
    let display = shared.lock().unwrap();
    assert_eq!(display.cycle().completions(), 1);
    assert_eq!(display.cycle().completion_reason(), Some(CompletionReason::Acknowledged));
}

/// Repeat to Address wraps around the end of the buffer
#[test]
fn test_repeat_to_address_wraps() {
    let shared = SharedDisplay::default();
    let mut stream = vec![CMD_WRITE, 0x00];
    stream.extend(sba(1919));
    let (b1, b2) = encode_12bit_address(2);
    stream.extend([ORDER_RA, b1, b2, 0xE7]);
    stream.extend(IAC_EOR);
    run_stream(&shared, &stream, false).unwrap();

    let display = shared.lock().unwrap();
    assert_eq!(display.display_char(1919), Some('X'));
    assert_eq!(display.display_char(0), Some('X'));
    assert_eq!(display.display_char(1), Some('X'));
    assert_eq!(display.display_char(2), Some(' '));
    assert_eq!(display.cursor(), 2);
}

/// Erase Unprotected to Address wraps around the end of the buffer and
/// leaves field starts and protected cells alone
#[test]
fn test_erase_unprotected_to_address_wraps() {
    let shared = SharedDisplay::default();
    let mut stream = vec![CMD_ERASE_WRITE, 0x00];
    // Input field at 1900 filled through 4, protected field at 2
    stream.extend(sba(1900));
    stream.extend([ORDER_SF, 0x00]);
    let (b1, b2) = encode_12bit_address(5);
    stream.extend([ORDER_RA, b1, b2, 0xC1]);
    stream.extend(sba(2));
    stream.extend([ORDER_SF, ATTR_PROTECTED]);
    stream.extend(sba(1918));
    let (b1, b2) = encode_12bit_address(3);
    stream.extend([ORDER_EUA, b1, b2]);
    stream.extend(IAC_EOR);
    run_stream(&shared, &stream, false).unwrap();

    let display = shared.lock().unwrap();
    for pos in [1918, 1919, 0, 1] {
        assert_eq!(display.host_byte(pos), Some(HOST_NULL), "cell {}", pos);
    }
    assert_eq!(display.host_byte(1917), Some(0xC1));
    assert_eq!(display.host_byte(2), Some(HOST_BLANK));
    assert!(display.is_field_start(2));
    assert_eq!(display.host_byte(3), Some(0xC1));
    assert!(display.is_protected(3));
    assert_eq!(display.cursor(), 1918);
}

/// A formatted screen built over several records
#[test]
fn test_login_screen() {
    let shared = SharedDisplay::default();
    let mut stream = vec![CMD_ERASE_WRITE, WCC_KEYBOARD_RESTORE, ORDER_SF, ATTR_SKIP];
    stream.extend([0xE4, 0xE2, 0xC5, 0xD9, 0x7A]); // "USER:"
    stream.extend([ORDER_SF, ATTR_MDT, ORDER_IC]);
    stream.extend(sba(20));
    stream.extend([ORDER_SF, ATTR_PROTECTED]);
    stream.extend(IAC_EOR);
    run_stream(&shared, &stream, false).unwrap();

    let display = shared.lock().unwrap();
    assert_eq!(display.field_count(), 3);
    assert_eq!(display.row_text(0).unwrap().trim_end(), " USER:");
    assert!(display.is_protected(3));
    assert!(!display.is_protected(8));
    assert!(display.attribute(6).is_modified());
    assert_eq!(display.find_next_unprotected_field(20), Some(6));
}

#[test]
fn test_unknown_command_lenient_and_strict() {
    let mut stream = vec![0xC8, 0xC9];
    stream.extend(IAC_EOR);

    let shared = SharedDisplay::default();
    run_stream(&shared, &stream, false).unwrap();
    assert_eq!(shared.lock().unwrap().text_at(0, 2), "HI");

    let shared = SharedDisplay::default();
    let err = run_stream(&shared, &stream, true).unwrap_err();
    assert!(matches!(err, TN3270Error::InvalidCommand { byte: 0xC8 }));
    assert_eq!(shared.lock().unwrap().text_at(0, 2), "  ");
}

/// A record cut short inside an order stops without touching the buffer
#[test]
fn test_truncated_record_stops_quietly() {
    let processor = ProtocolProcessor3270::new();
    let mut display = Display3270::new();
    processor.process_record(&[CMD_ERASE_WRITE, 0x00, ORDER_SBA, 0x40], &mut display).unwrap();
    assert_eq!(display.cursor(), 0);
    assert_eq!(display.cycle().order_count(), 1);
}
