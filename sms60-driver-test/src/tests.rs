use super::Interface;
use std::io::{ErrorKind, Read, Write};

#[test]
fn read_queued() {
    let mut i = Interface::new();
    let mut buf = [0u8; 64];
    i.add_read(b"first");
    i.add_read(b"second");
    assert_eq!(i.read(&mut buf).unwrap(), 5);
    assert_eq!(&buf[..5], b"first");
    assert_eq!(i.read(&mut buf).unwrap(), 6);
    assert_eq!(&buf[..6], b"second");
    assert!(i.is_empty());
}

#[test]
fn read_small_buffer() {
    let mut i = Interface::new();
    let mut buf = [0u8; 8];
    let expected = b"thisisatest";
    i.add_read(expected);
    assert_eq!(i.read(&mut buf).unwrap(), 8);
    assert_eq!(buf, expected[..8]);
    assert_eq!(i.read(&mut buf).unwrap(), expected.len() - 8);
    assert_eq!(buf[..expected.len() - 8], expected[8..]);
}

#[test]
fn read_empty_times_out() {
    let mut i = Interface::new();
    let mut buf = [0u8; 32];
    let e = i.read(&mut buf).unwrap_err();
    assert_eq!(e.kind(), ErrorKind::TimedOut);
}

#[test]
fn responder_gets_last_line() {
    let mut i = Interface::new();
    i.set_responder(|line| Some(format!("<{}>", line)));
    i.write_all(b"?CNT1\r").unwrap();
    let mut buf = [0u8; 32];
    let n = i.read(&mut buf).unwrap();
    assert_eq!(&buf[..n], b"<?CNT1>");
}

#[test]
fn queue_before_responder() {
    let mut i = Interface::new();
    i.set_responder(|_| Some("later".into()));
    i.add_read(b"now");
    let mut buf = [0u8; 32];
    let n = i.read(&mut buf).unwrap();
    assert_eq!(&buf[..n], b"now");
    let n = i.read(&mut buf).unwrap();
    assert_eq!(&buf[..n], b"later");
}

#[test]
fn lines() {
    let mut i = Interface::new();
    i.write_all(b"RST0\r").unwrap();
    i.write_all(b"TERM0=1\r").unwrap();
    i.write_all(b"RST0\r").unwrap();
    assert_eq!(i.lines(), vec!["RST0", "TERM0=1", "RST0"]);
    assert_eq!(i.count("RST0"), 2);
    assert_eq!(i.last_line().as_deref(), Some("RST0"));
    i.clear_written();
    assert!(i.lines().is_empty());
}

#[test]
fn failing_writes() {
    let mut i = Interface::new();
    i.fail_writes(true);
    assert!(i.write(b"GO1\r").is_err());
    i.fail_writes(false);
    assert_eq!(i.write(b"GO1\r").unwrap(), 4);
}
