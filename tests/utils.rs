#![allow(dead_code)]

use log::LevelFilter;
use std::sync::Once;

static LOGGER: Once = Once::new();

pub fn enable_logging() {
    LOGGER.call_once(|| {
        env_logger::Builder::new().filter(None, LevelFilter::Warn).init();
    });
}

/// Appends a scalar8 event (tag in `0..64`) to `out`.
pub fn scalar8(out: &mut Vec<u8>, tag: u8, value: u8) {
    out.push(tag);
    out.push(value);
}

/// Appends a scalar16 event (tag in `64..128`) to `out`.
pub fn scalar16(out: &mut Vec<u8>, tag: u8, value: u16) {
    out.push(tag);
    out.extend_from_slice(&value.to_le_bytes());
}

/// Appends a scalar32 event (tag in `128..192`) to `out`.
pub fn scalar32(out: &mut Vec<u8>, tag: u8, value: i32) {
    out.push(tag);
    out.extend_from_slice(&value.to_le_bytes());
}

/// Appends a varlen-framed data event (tag in `192..256`) to `out`.
pub fn data_event(out: &mut Vec<u8>, tag: u8, body: &[u8]) {
    out.push(tag);
    out.extend(varlen(body.len() as u32));
    out.extend_from_slice(body);
}

/// Low-bits-first varlen, matching the framing the library itself writes.
fn varlen(n: u32) -> Vec<u8> {
    let mut bytes = Vec::new();
    let mut remaining = n;
    loop {
        let mut byte = (remaining & 0x7f) as u8;
        remaining >>= 7;
        if remaining != 0 {
            byte |= 0x80;
        }
        bytes.push(byte);
        if remaining == 0 {
            break;
        }
    }
    bytes
}

/// A little-endian UTF-16 text body with a null terminator, matching
/// `StringEncoding::Utf16Le`.
pub fn utf16_text(s: &str) -> Vec<u8> {
    let mut out = Vec::new();
    for unit in s.encode_utf16() {
        out.extend_from_slice(&unit.to_le_bytes());
    }
    out.extend_from_slice(&[0, 0]);
    out
}

/// A mixer-params record: 4 reserved bytes, param id, 1 reserved byte, a
/// packed insert/slot channel word, then the signed message.
pub fn param_record(param_id: u8, insert_idx: u8, slot_idx: u8, msg: i32) -> Vec<u8> {
    let channel_data = ((insert_idx as u16 & 0x7f) << 6) | (slot_idx as u16 & 0x3f);
    let mut out = vec![0u8; 12];
    out[4] = param_id;
    out[6..8].copy_from_slice(&channel_data.to_le_bytes());
    out[8..12].copy_from_slice(&msg.to_le_bytes());
    out
}
