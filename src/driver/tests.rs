use super::{axis::Axis, config::Config, DriverError, FaultKind, Sms60};
use sms60_driver_test::Interface;
use std::io::ErrorKind;

fn driver(interface: &Interface) -> Sms60<Interface> {
    let mut i = interface.clone();
    let sms = Sms60::new(interface.clone(), Config::without_delays()).unwrap();
    i.clear_written();
    sms
}

#[test]
fn initialize() {
    let interface = Interface::new();
    let sms = Sms60::new(interface.clone(), Config::without_delays()).unwrap();
    assert_eq!(interface.lines(), vec!["RST0", "TERM0=1"]);
    assert!(sms.last_fault().is_none());
    assert_eq!(sms.device_port(), "");
}

#[test]
fn initialize_strict() {
    let mut interface = Interface::new();
    interface.add_read(b"V1.23\r\n");
    let config = Config {
        strict_init: true,
        ..Config::without_delays()
    };
    let mut sms = Sms60::new(interface.clone(), config).unwrap();
    assert_eq!(interface.lines(), vec!["RST0", "TERM0=1", "?VD0"]);
    assert_eq!(sms.firmware_version(), "1.23");
    assert_eq!(interface.count("?VD0"), 1);
}

#[test]
fn initialize_strict_silent() {
    let interface = Interface::new();
    let config = Config {
        strict_init: true,
        ..Config::without_delays()
    };
    let r = Sms60::new(interface, config);
    assert!(matches!(r, Err(DriverError::NoFirmwareResponse)));
}

#[test]
fn initialize_strict_write_fails() {
    let mut interface = Interface::new();
    interface.fail_writes(true);
    let config = Config {
        strict_init: true,
        ..Config::without_delays()
    };
    let r = Sms60::new(interface, config);
    assert!(matches!(r, Err(DriverError::IoError(_))));
}

#[test]
fn initialize_write_fails_softly() {
    let mut interface = Interface::new();
    interface.fail_writes(true);
    let sms = Sms60::new(interface, Config::without_delays()).unwrap();
    assert!(matches!(
        sms.last_fault().map(|f| &f.kind),
        Some(FaultKind::WriteFailed { command, .. }) if command == "TERM0=1"
    ));
}

#[test]
fn dispatch() {
    let interface = Interface::new();
    let mut sms = driver(&interface);
    assert!(sms.dispatch("SET", Axis::X, "5"));
    assert!(sms.dispatch("GO", Axis::Y, ""));
    assert_eq!(interface.written(), b"SET1=5\rGO2\r");
}

#[test]
fn dispatch_suppressed() {
    let interface = Interface::new();
    let mut sms = driver(&interface);
    for axis in [Axis::All, Axis::Physical(0), Axis::Physical(3), Axis::Physical(255)] {
        assert!(!sms.dispatch("GO", axis, ""));
        assert_eq!(
            sms.take_fault().map(|f| f.kind),
            Some(FaultKind::AxisSuppressed(axis))
        );
    }
    assert!(interface.written().is_empty());
}

#[test]
fn dispatch_more_axes() {
    let interface = Interface::new();
    let config = Config {
        axis_count: 3,
        ..Config::without_delays()
    };
    let mut sms = Sms60::new(interface.clone(), config).unwrap();
    assert!(sms.dispatch("GO", Axis::Physical(3), ""));
    assert_eq!(interface.last_line().as_deref(), Some("GO3"));
}

#[test]
fn dispatch_write_fails() {
    let mut interface = Interface::new();
    let mut sms = driver(&interface);
    interface.fail_writes(true);
    assert!(!sms.dispatch("GO", Axis::X, ""));
    assert_eq!(
        sms.last_fault().map(|f| f.kind.clone()),
        Some(FaultKind::WriteFailed {
            command: "GO1".into(),
            kind: ErrorKind::TimedOut
        })
    );
}

#[test]
fn send_and_read() {
    let mut interface = Interface::new();
    let mut sms = driver(&interface);
    interface.add_read(b"MOTION=0 REF=0\r");
    assert_eq!(sms.send_and_read_plain("?ST"), "MOTION=0 REF=0\r");
    interface.add_read(b"2000\r");
    assert_eq!(sms.send_and_read_axis("?VEL", Axis::Y), "2000\r");
    interface.add_read(b"");
    assert_eq!(sms.send_and_read_param("TERM", "1"), "");
    assert_eq!(interface.lines(), vec!["?ST0", "?VEL2", "TERM0=1"]);
    assert!(sms.last_fault().is_none());
}

#[test]
fn send_and_read_suppressed() {
    let mut interface = Interface::new();
    let mut sms = driver(&interface);
    interface.add_read(b"42");
    assert_eq!(sms.send_and_read("?CNT", Axis::Physical(3), ""), "");
    // nothing sent, nothing read
    assert!(interface.lines().is_empty());
    assert!(!interface.is_empty());
}

#[test]
fn send_and_read_timeout() {
    let interface = Interface::new();
    let mut sms = driver(&interface);
    assert_eq!(sms.send_and_read_plain("?VD"), "");
    assert_eq!(
        sms.take_fault().map(|f| f.kind),
        Some(FaultKind::ReadFailed(ErrorKind::TimedOut))
    );
    assert!(sms.last_fault().is_none());
}

#[test]
fn send_and_read_non_ascii() {
    let mut interface = Interface::new();
    let mut sms = driver(&interface);
    interface.add_read(&[b'o', 0xfc, b'k']);
    assert_eq!(sms.send_and_read_plain("?VD"), "o?k");
}

#[test]
fn integer_parameter() {
    let mut interface = Interface::new();
    let mut sms = driver(&interface);
    interface.add_read(b"-17\r\n");
    assert_eq!(sms.get_integer_parameter("?CNT", Axis::X), -17);
    assert_eq!(interface.count("?CNT1"), 1);
}

#[test]
fn integer_parameter_retry() {
    let mut interface = Interface::new();
    let mut sms = driver(&interface);
    interface.add_read(b"garbage");
    interface.add_read(b"42");
    assert_eq!(sms.get_integer_parameter("?CNT", Axis::X), 42);
    assert_eq!(interface.lines(), vec!["?CNT1", "?CNT1"]);
    assert!(sms.last_fault().is_none());
}

#[test]
fn integer_parameter_give_up() {
    let mut interface = Interface::new();
    let mut sms = driver(&interface);
    interface.add_read(b"garbage");
    interface.add_read(b"more garbage");
    interface.add_read(b"42");
    assert_eq!(sms.get_integer_parameter("?VEL", Axis::Y), 0);
    // only a single retry
    assert_eq!(interface.count("?VEL2"), 2);
    assert!(!interface.is_empty());
    assert_eq!(
        sms.last_fault().map(|f| f.kind.clone()),
        Some(FaultKind::UnparsableInteger {
            command: "?VEL".into(),
            reply: "more garbage".into()
        })
    );
}

#[test]
fn integer_parameter_suppressed() {
    let mut interface = Interface::new();
    let mut sms = driver(&interface);
    interface.add_read(b"42");
    assert_eq!(sms.get_integer_parameter("?CNT", Axis::All), 0);
    assert_eq!(sms.get_integer_parameter("?CNT", Axis::Physical(3)), 0);
    assert!(interface.lines().is_empty());
    assert!(!interface.is_empty());
    assert_eq!(
        sms.last_fault().map(|f| f.kind.clone()),
        Some(FaultKind::AxisSuppressed(Axis::Physical(3)))
    );
}

#[test]
fn firmware_version() {
    let mut interface = Interface::new();
    let mut sms = driver(&interface);
    interface.add_read(b"V2.10\r");
    assert_eq!(sms.firmware_version(), "2.10");
    assert_eq!(sms.firmware_version(), "2.10");
    assert_eq!(interface.count("?VD0"), 1);
}

#[test]
fn firmware_version_too_short() {
    let mut interface = Interface::new();
    let mut sms = driver(&interface);
    interface.add_read(b"V1");
    assert_eq!(sms.firmware_version(), "");
    // not known yet, so ask again
    assert_eq!(sms.firmware_version(), "");
    assert_eq!(interface.count("?VD0"), 2);
}

#[test]
fn properties() {
    let interface = Interface::new();
    let sms = driver(&interface);
    assert_eq!(sms.manufacturer(), "OWIS GmbH Staufen");
    assert_eq!(sms.instrument_type(), "SMS60");
    assert_eq!(sms.axis_count(), 2);
    assert_eq!(sms.x_scale_factor(), 0.00008);
    assert_eq!(sms.y_scale_factor(), 0.00008);
    assert!(sms.scale_factor(Axis::None).is_nan());
    assert!(sms.scale_factor(Axis::All).is_nan());
    assert!(sms.scale_factor(Axis::Physical(3)).is_nan());
}

#[test]
fn into_inner() {
    let interface = Interface::new();
    let sms = driver(&interface);
    let i = sms.into_inner();
    assert!(i.lines().is_empty());
}
