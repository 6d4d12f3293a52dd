mod utils;

use flp::{EventStream, FlVersion};
use std::fmt::{Debug, Display, Formatter};
use tempfile::TempDir;
use utils::{data_event, enable_logging, param_record, scalar16, scalar32, utf16_text};

type RtResult = std::result::Result<(), RtErr>;

enum RtErr {
    BadByteValue(BadByte),
    Length(WrongLength),
    ExpectedError(String),
}

impl Display for RtErr {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            RtErr::BadByteValue(x) => Display::fmt(x, f),
            RtErr::Length(x) => Display::fmt(x, f),
            RtErr::ExpectedError(name) => write!(f, "scenario {} was expected to fail to parse, but did not", name),
        }
    }
}

macro_rules! impldebug {
    ($symbol:ident) => {
        impl Debug for $symbol {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                Display::fmt(self, f)
            }
        }
    };
}

impldebug!(RtErr);

struct BadByte {
    scenario: String,
    byte_position: usize,
    expected: u8,
    actual: u8,
}

impl Display for BadByte {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "round trip error in scenario '{}', byte position: {}, expected: {:#04X}, actual: {:#04X}",
            self.scenario, self.byte_position, self.expected, self.actual
        )
    }
}

impldebug!(BadByte);

struct WrongLength {
    scenario: String,
    expected: usize,
    actual: usize,
}

impl Display for WrongLength {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "round trip error in scenario '{}', expected {} bytes, got {} bytes",
            self.scenario, self.expected, self.actual
        )
    }
}

impldebug!(WrongLength);

macro_rules! rtfail {
    ($scenario:expr, $ix:expr, $expected:expr, $actual:expr) => {
        return Err(RtErr::BadByteValue(BadByte {
            scenario: $scenario.into(),
            byte_position: $ix,
            expected: $expected,
            actual: $actual,
        }));
    };
}

/// Parses `bytes`, serializes the result back out through a temp file, and
/// asserts the saved bytes are identical to the original . Persisting through disk rather than comparing in-memory
/// buffers exercises the same write path a caller actually uses.
fn round_trip_test<S: AsRef<str>>(scenario: S, version: FlVersion, bytes: &[u8]) -> RtResult {
    enable_logging();
    let stream = EventStream::parse(bytes, version).unwrap();
    let td = TempDir::new().unwrap();
    let out_path = td.path().join("output.bin");
    std::fs::write(&out_path, stream.serialize()).unwrap();
    let saved_bytes = std::fs::read(&out_path).unwrap();

    if bytes.len() != saved_bytes.len() {
        return Err(RtErr::Length(WrongLength {
            scenario: scenario.as_ref().into(),
            expected: bytes.len(),
            actual: saved_bytes.len(),
        }));
    }

    for (ix, expected) in bytes.iter().enumerate() {
        let actual = saved_bytes[ix];
        if actual != *expected {
            rtfail!(scenario, ix, *expected, actual);
        }
    }

    // Reloading the saved bytes must reproduce an identical byte stream.
    let reloaded = EventStream::parse(&saved_bytes, version).unwrap();
    assert_eq!(saved_bytes, reloaded.serialize());
    Ok(())
}

type BadStreamResult = std::result::Result<(), RtErr>;

/// Asserts that parsing `bytes` fails.
fn bad_stream_test<S: AsRef<str>>(scenario: S, version: FlVersion, bytes: &[u8]) -> BadStreamResult {
    enable_logging();
    match EventStream::parse(bytes, version) {
        Ok(_) => Err(RtErr::ExpectedError(scenario.as_ref().into())),
        Err(_) => Ok(()),
    }
}

fn v() -> FlVersion {
    FlVersion::new(20, 9, 1, None)
}

#[test]
fn empty_stream() {
    round_trip_test("empty_stream", v(), &[]).unwrap();
}

#[test]
fn single_scalar_events() {
    let mut bytes = Vec::new();
    scalar16(&mut bytes, 64, 7);
    scalar32(&mut bytes, 147, -1);
    round_trip_test("single_scalar_events", v(), &bytes).unwrap();
}

#[test]
fn mixer_insert_with_params_and_a_slot() {
    let mut params = Vec::new();
    params.extend(param_record(192, 0, 0, 12800));
    params.extend(param_record(0, 0, 0, 1));

    let mut bytes = Vec::new();
    data_event(&mut bytes, 225, &params);
    data_event(&mut bytes, 204, &utf16_text("Master"));
    scalar16(&mut bytes, 98, 0);
    data_event(&mut bytes, 203, &utf16_text("Kick"));
    scalar32(&mut bytes, 147, 0);
    round_trip_test("mixer_insert_with_params_and_a_slot", v(), &bytes).unwrap();
}

#[test]
fn pattern_with_a_double_emitted_new_pair() {
    let mut bytes = Vec::new();
    scalar16(&mut bytes, 65, 1);
    data_event(&mut bytes, 193, &utf16_text("Verse"));
    scalar16(&mut bytes, 65, 1);
    round_trip_test("pattern_with_a_double_emitted_new_pair", v(), &bytes).unwrap();
}

#[test]
fn an_unrecognized_tag_survives_the_round_trip() {
    let mut bytes = Vec::new();
    data_event(&mut bytes, 250, &[0xde, 0xad, 0xbe, 0xef]);
    round_trip_test("an_unrecognized_tag_survives_the_round_trip", v(), &bytes).unwrap();
}

#[test]
fn truncated_scalar32_is_rejected() {
    let bytes = [147u8, 0x01, 0x02]; // scalar32 needs 4 body bytes, only 2 given
    bad_stream_test("truncated_scalar32_is_rejected", v(), &bytes).unwrap();
}

#[test]
fn truncated_varlen_body_is_rejected() {
    let bytes = [225u8, 0x05, 0x01]; // declares 5 bytes, only 1 given
    bad_stream_test("truncated_varlen_body_is_rejected", v(), &bytes).unwrap();
}
