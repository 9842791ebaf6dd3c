//! End-to-end session against a scripted host on a loopback socket

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

use tn3270r::config::COMPLETION_TIMEOUT_MS;
use tn3270r::lib3270::codes::*;
use tn3270r::lib3270::display::addressing::encode_12bit_address;
use tn3270r::{SessionConfig, Session, TN3270Error};

const IAC_EOR: [u8; 2] = [0xFF, 0xEF];

fn read_exact_len(stream: &mut TcpStream, len: usize) -> Vec<u8> {
    let mut buf = vec![0u8; len];
    stream.read_exact(&mut buf).unwrap();
    buf
}

/// Read one inbound record up to and including `IAC EOR`
fn read_record(stream: &mut TcpStream) -> Vec<u8> {
    let mut record = Vec::new();
    let mut byte = [0u8; 1];
    while !record.ends_with(&IAC_EOR) {
        stream.read_exact(&mut byte).unwrap();
        record.push(byte[0]);
    }
    record
}

fn wait_until<F: Fn() -> bool>(timeout: Duration, condition: F) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(10));
    }
    condition()
}

#[test]
fn test_login_round_trip() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    let (request_tx, request_rx) = mpsc::channel();

    let host = thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        let offer = read_exact_len(&mut stream, 21);
        assert_eq!(&offer[..3], &[0xFF, 0xFB, 0x00]);

        // One unprotected field with the cursor in it
        let mut screen = vec![CMD_ERASE_WRITE, WCC_KEYBOARD_RESTORE, ORDER_SF, 0x00, ORDER_IC];
        screen.extend(IAC_EOR);
        stream.write_all(&screen).unwrap();

        let request = read_record(&mut stream);
        request_tx.send(request).unwrap();

        let (b1, b2) = encode_12bit_address(80);
        let mut reply = vec![CMD_WRITE, WCC_KEYBOARD_RESTORE, ORDER_SBA, b1, b2, 0xD6, 0xD2];
        reply.extend(IAC_EOR);
        stream.write_all(&reply).unwrap();

        // Hold the socket open until the client hangs up
        let mut rest = Vec::new();
        let _ = stream.read_to_end(&mut rest);
    });

    let mut session = Session::new(SessionConfig::new("unused.json"));
    session.connect("127.0.0.1", port).unwrap();
    assert!(session.is_connected());
    assert_eq!(session.connection_info().unwrap().port, port);
    assert!(matches!(session.connect("127.0.0.1", port), Err(TN3270Error::AlreadyConnected)));

    assert!(wait_until(Duration::from_secs(5), || {
        session.display().map(|d| d.field_count() == 1).unwrap_or(false)
    }));

    let screen = session.screen().unwrap();
    assert_eq!(screen.cursor().unwrap(), 1);
    screen.put_string("ABC").unwrap();
    screen.enter().unwrap();

    let request = request_rx.recv_timeout(Duration::from_secs(5)).unwrap();
    let (c1, c2) = encode_12bit_address(4);
    let (f1, f2) = encode_12bit_address(1);
    let mut expected = vec![AidKey::Enter.to_u8(), c1, c2, ORDER_SBA, f1, f2, 0xC1, 0xC2, 0xC3];
    expected.extend(IAC_EOR);
    assert_eq!(request, expected);

    {
        let display = session.display().unwrap();
        assert_eq!(display.text_at(80, 2), "OK");
        assert_eq!(display.text_at(1, 3), "ABC");
    }

    session.disconnect();
    assert!(!session.is_connected());
    assert!(matches!(session.screen(), Err(TN3270Error::NotConnected)));
    host.join().unwrap();
}

#[test]
fn test_enter_times_out_without_reply() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();

    let host = thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        read_exact_len(&mut stream, 21);
        let mut screen = vec![CMD_ERASE_WRITE, WCC_KEYBOARD_RESTORE];
        screen.extend(IAC_EOR);
        stream.write_all(&screen).unwrap();
        // Swallow the request and never answer
        let mut rest = Vec::new();
        let _ = stream.read_to_end(&mut rest);
    });

    let mut config = SessionConfig::new("unused.json");
    config.set_property(COMPLETION_TIMEOUT_MS, 100i64);
    let mut session = Session::new(config);
    session.connect("127.0.0.1", port).unwrap();

    let screen = session.screen().unwrap();
    let err = screen.enter().unwrap_err();
    assert!(matches!(err, TN3270Error::CompletionTimeout { .. }));

    session.disconnect();
    host.join().unwrap();
}

#[test]
fn test_host_hangup_ends_session() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();

    let host = thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        read_exact_len(&mut stream, 21);
        let mut screen = vec![CMD_WRITE, 0x00, 0xC8, 0xC9];
        screen.extend(IAC_EOR);
        stream.write_all(&screen).unwrap();
    });

    let mut session = Session::new(SessionConfig::new("unused.json"));
    session.connect("127.0.0.1", port).unwrap();
    host.join().unwrap();

    assert!(wait_until(Duration::from_secs(5), || !session.is_connected()));
    assert_eq!(session.display().unwrap().text_at(0, 2), "HI");
    assert!(matches!(session.screen(), Err(TN3270Error::NotConnected)));
}
