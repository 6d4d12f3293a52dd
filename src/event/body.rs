//! Typed decode/encode helpers for event bodies that are more than a bare
//! scalar or string: colors, optional-trailing-field structs, and the
//! packed mixer-params blob.

use crate::error::{self, ModelError};

/// Reads an RGBA color packed as four bytes, least byte first, the way
/// `pyflp`'s `ColorEvent` unpacks a native `int` (grounded on
/// `pyflp._event.ColorEvent`, used by both `InsertID.Color` and
/// `PatternID.Color`).
pub(crate) fn decode_color(body: &[u8]) -> (u8, u8, u8, u8) {
    (body[0], body[1], body[2], body[3])
}

pub(crate) fn encode_color(rgba: (u8, u8, u8, u8)) -> [u8; 4] {
    [rgba.0, rgba.1, rgba.2, rgba.3]
}

/// A struct body whose trailing fields may be absent on older project
/// versions: the body is read up to whatever length is present, and
/// fields past the end keep their default.
pub(crate) struct TruncatableReader<'a> {
    body: &'a [u8],
    offset: usize,
}

impl<'a> TruncatableReader<'a> {
    pub(crate) fn new(body: &'a [u8]) -> Self {
        Self { body, offset: 0 }
    }

    /// Reads `n` bytes if present, otherwise returns `None` and leaves the
    /// cursor at the end of the body.
    pub(crate) fn read(&mut self, n: usize) -> Option<&'a [u8]> {
        if self.offset + n > self.body.len() {
            self.offset = self.body.len();
            return None;
        }
        let slice = &self.body[self.offset..self.offset + n];
        self.offset += n;
        Some(slice)
    }

    pub(crate) fn read_u32(&mut self) -> Option<u32> {
        self.read(4).map(|s| u32::from_le_bytes([s[0], s[1], s[2], s[3]]))
    }
}

/// Byte width of one entry in the packed mixer-params blob
/// (`MixerID.Params`): 4 reserved, 1 param id, 1 reserved, 2 channel
/// data, 4 signed message.
pub(crate) const PARAM_RECORD_LEN: usize = 12;

/// One decoded entry from the mixer-params blob.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) struct ParamRecord {
    pub(crate) param_id: u8,
    pub(crate) insert_idx: u8,
    pub(crate) slot_idx: u8,
    pub(crate) msg: i32,
}

impl ParamRecord {
    fn decode(record: &[u8]) -> Self {
        let param_id = record[4];
        let channel_data = u16::from_le_bytes([record[6], record[7]]);
        let insert_idx = ((channel_data >> 6) & 0x7f) as u8;
        let slot_idx = (channel_data & 0x3f) as u8;
        let msg = i32::from_le_bytes([record[8], record[9], record[10], record[11]]);
        Self {
            param_id,
            insert_idx,
            slot_idx,
            msg,
        }
    }

    fn encode_into(&self, record: &mut [u8]) {
        record[4] = self.param_id;
        let channel_data = ((self.insert_idx as u16 & 0x7f) << 6) | (self.slot_idx as u16 & 0x3f);
        record[6..8].copy_from_slice(&channel_data.to_le_bytes());
        record[8..12].copy_from_slice(&self.msg.to_le_bytes());
    }
}

/// Param id ranges, grounded on `pyflp.mixer._MixerParamsItem` /
/// `EventEnum` member values referenced by `Mixer.__iter__`.
pub(crate) mod param_id {
    pub(crate) const SLOT_ENABLED: u8 = 0;
    pub(crate) const SLOT_MIX: u8 = 1;
    pub(crate) const SEND_LOW: u8 = 64;
    pub(crate) const SEND_HIGH: u8 = 191;
    pub(crate) const VOLUME: u8 = 192;
    pub(crate) const PAN: u8 = 193;
    pub(crate) const STEREO_SEPARATION: u8 = 194;
    pub(crate) const EQ_GAIN_LOW: u8 = 208;
    pub(crate) const EQ_GAIN_HIGH: u8 = 210;
    pub(crate) const EQ_FREQ_LOW: u8 = 216;
    pub(crate) const EQ_FREQ_HIGH: u8 = 218;
    pub(crate) const EQ_Q_LOW: u8 = 224;
    pub(crate) const EQ_Q_HIGH: u8 = 226;
}

/// The unpacked mixer-params blob: every record partitioned by which
/// insert it targets, with `unparsed` set when the body length is not a
/// multiple of the record size.
#[derive(Clone)]
pub(crate) struct MixerParams {
    records: Vec<ParamRecord>,
    unparsed: bool,
}

impl MixerParams {
    pub(crate) fn decode(body: &[u8]) -> Self {
        if body.len() % PARAM_RECORD_LEN != 0 {
            log::warn!(
                "mixer params blob length {} is not a multiple of {}",
                body.len(),
                PARAM_RECORD_LEN
            );
            return Self {
                records: Vec::new(),
                unparsed: true,
            };
        }
        let records = body
            .chunks_exact(PARAM_RECORD_LEN)
            .map(ParamRecord::decode)
            .collect();
        Self {
            records,
            unparsed: false,
        }
    }

    pub(crate) fn is_unparsed(&self) -> bool {
        self.unparsed
    }

    pub(crate) fn records(&self) -> &[ParamRecord] {
        &self.records
    }

    pub(crate) fn records_for_insert(&self, insert_idx: u8) -> impl Iterator<Item = &ParamRecord> {
        self.records
            .iter()
            .filter(move |r| r.insert_idx == insert_idx)
    }

    /// Finds the first record for `insert_idx` (and, if given, `slot_idx`)
    /// whose param id matches and updates its `msg` in place, returning the
    /// patched blob. Leaves every other record's bytes untouched.
    pub(crate) fn with_updated(
        &self,
        body: &[u8],
        insert_idx: u8,
        slot_idx: Option<u8>,
        param_id: u8,
        msg: i32,
    ) -> Result<Vec<u8>, ModelError> {
        let position = self.records.iter().position(|r| {
            r.insert_idx == insert_idx
                && r.param_id == param_id
                && slot_idx.map_or(true, |s| r.slot_idx == s)
        });
        let position = position.ok_or_else(|| {
            error::PropertyCannotBeSet {
                property: format!("mixer param {} on insert {}", param_id, insert_idx),
            }
            .build()
        })?;
        let mut out = body.to_vec();
        let mut record = self.records[position];
        record.msg = msg;
        let start = position * PARAM_RECORD_LEN;
        record.encode_into(&mut out[start..start + PARAM_RECORD_LEN]);
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record_bytes(param_id: u8, insert_idx: u8, slot_idx: u8, msg: i32) -> [u8; PARAM_RECORD_LEN] {
        let mut out = [0u8; PARAM_RECORD_LEN];
        let record = ParamRecord {
            param_id,
            insert_idx,
            slot_idx,
            msg,
        };
        record.encode_into(&mut out);
        out
    }

    #[test]
    fn color_roundtrips() {
        let body = encode_color((10, 20, 30, 40));
        assert_eq!((10, 20, 30, 40), decode_color(&body));
    }

    #[test]
    fn truncatable_reader_returns_none_past_the_end() {
        let body = [1u8, 2, 3, 4];
        let mut r = TruncatableReader::new(&body);
        assert_eq!(Some(0x0403_0201), r.read_u32());
        assert_eq!(None, r.read_u32());
    }

    #[test]
    fn channel_data_splits_insert_and_slot() {
        let bytes = record_bytes(param_id::VOLUME, 5, 3, -100);
        let record = ParamRecord::decode(&bytes);
        assert_eq!(5, record.insert_idx);
        assert_eq!(3, record.slot_idx);
        assert_eq!(-100, record.msg);
        assert_eq!(param_id::VOLUME, record.param_id);
    }

    #[test]
    fn mixer_params_unparsed_on_bad_length() {
        let params = MixerParams::decode(&[1, 2, 3]);
        assert!(params.is_unparsed());
        assert!(params.records().is_empty());
    }

    #[test]
    fn mixer_params_filters_by_insert() {
        let mut body = Vec::new();
        body.extend_from_slice(&record_bytes(param_id::VOLUME, 0, 0, 0));
        body.extend_from_slice(&record_bytes(param_id::PAN, 1, 0, 0));
        let params = MixerParams::decode(&body);
        assert_eq!(1, params.records_for_insert(0).count());
        assert_eq!(1, params.records_for_insert(1).count());
    }

    #[test]
    fn with_updated_patches_only_the_matching_record() {
        let mut body = Vec::new();
        body.extend_from_slice(&record_bytes(param_id::VOLUME, 0, 0, 100));
        body.extend_from_slice(&record_bytes(param_id::PAN, 0, 0, 0));
        let params = MixerParams::decode(&body);
        let patched = params
            .with_updated(&body, 0, None, param_id::VOLUME, 222)
            .unwrap();
        let reparsed = MixerParams::decode(&patched);
        assert_eq!(222, reparsed.records()[0].msg);
        assert_eq!(0, reparsed.records()[1].msg);
    }

    #[test]
    fn with_updated_rejects_an_unknown_target() {
        let body = record_bytes(param_id::VOLUME, 0, 0, 0).to_vec();
        let params = MixerParams::decode(&body);
        assert!(params
            .with_updated(&body, 9, None, param_id::VOLUME, 1)
            .is_err());
    }
}
