//! Mixer / Insert / Slot / EQ projection.

use crate::error::ModelError;
use crate::event::body::{self, param_id, MixerParams};
use crate::event::tag;
use crate::event::Event;
use crate::model::{model_not_found, no_models_found};
use crate::text::{StringEncoding, Text};
use crate::version::FlVersion;
use log::warn;
use std::ops::Range;

fn read_u16(body: &[u8]) -> Option<u16> {
    (body.len() >= 2).then(|| u16::from_le_bytes([body[0], body[1]]))
}

fn read_i32(body: &[u8]) -> Option<i32> {
    (body.len() >= 4).then(|| i32::from_le_bytes([body[0], body[1], body[2], body[3]]))
}

fn find(events: &[Event], tag_value: u8) -> Option<&Event> {
    events.iter().find(|e| e.tag() == tag_value)
}

/// Ranges of events belonging to each insert, split on `Insert.Output`
/// (inclusive of the marker itself) rather than on `InsertID.Flags`.
fn insert_ranges(events: &[Event]) -> Vec<Range<usize>> {
    let mut ranges = Vec::new();
    let mut start = 0;
    for (i, event) in events.iter().enumerate() {
        if event.tag() == tag::insert::OUTPUT {
            ranges.push(start..i + 1);
            start = i + 1;
        }
    }
    ranges
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Dock {
    Left,
    Middle,
    Right,
}

/// Bit positions within `InsertID.Flags` (`pyflp.mixer._InsertFlags`):
/// `DockMiddle = 1 << 6`, `DockRight = 1 << 7`.
const DOCK_MIDDLE_BIT: u32 = 1 << 6;
const DOCK_RIGHT_BIT: u32 = 1 << 7;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum EqBandKind {
    Low,
    Mid,
    High,
}

impl EqBandKind {
    fn gain_id(self) -> u8 {
        match self {
            EqBandKind::Low => param_id::EQ_GAIN_LOW,
            EqBandKind::Mid => param_id::EQ_GAIN_LOW + 1,
            EqBandKind::High => param_id::EQ_GAIN_HIGH,
        }
    }

    fn freq_id(self) -> u8 {
        match self {
            EqBandKind::Low => param_id::EQ_FREQ_LOW,
            EqBandKind::Mid => param_id::EQ_FREQ_LOW + 1,
            EqBandKind::High => param_id::EQ_FREQ_HIGH,
        }
    }

    fn q_id(self) -> u8 {
        match self {
            EqBandKind::Low => param_id::EQ_Q_LOW,
            EqBandKind::Mid => param_id::EQ_Q_LOW + 1,
            EqBandKind::High => param_id::EQ_Q_HIGH,
        }
    }
}

/// A read-only view of the mixer: an ordered list of Inserts projected
/// from the event stream . Cheap to construct;
/// borrows the stream and copies nothing but the small decoded params
/// table.
pub struct Mixer<'a> {
    events: &'a [Event],
    version: FlVersion,
}

impl<'a> Mixer<'a> {
    pub(crate) fn new(events: &'a [Event], version: FlVersion) -> Self {
        Self { events, version }
    }

    fn params(&self) -> Option<MixerParams> {
        find(self.events, tag::mixer::PARAMS)
            .map(|e| MixerParams::decode(e.body()))
            .filter(|p| !p.is_unparsed())
    }

    /// Number of inserts: counts `Insert.Output` markers. Raises
    /// `NoModelsFound` when none are present.
    pub fn len(&self) -> Result<usize, ModelError> {
        let n = insert_ranges(self.events).len();
        if n == 0 {
            return Err(no_models_found("inserts"));
        }
        Ok(n)
    }

    pub fn is_empty(&self) -> bool {
        insert_ranges(self.events).is_empty()
    }

    pub fn max_inserts(&self) -> u16 {
        self.version.max_inserts()
    }

    pub fn max_slots(&self) -> u16 {
        self.version.max_slots()
    }

    pub fn iter(&self) -> impl Iterator<Item = Insert<'a>> {
        let params = self.params();
        let version = self.version;
        let events = self.events;
        insert_ranges(events)
            .into_iter()
            .enumerate()
            .map(move |(index, range)| Insert::new(&events[range], index as u16, params.clone(), version))
    }

    pub fn get(&self, index: u16) -> Result<Insert<'a>, ModelError> {
        self.iter()
            .nth(index as usize)
            .ok_or_else(|| model_not_found(format!("insert at index {}", index)))
    }

    pub fn by_name(&self, name: &str) -> Result<Insert<'a>, ModelError> {
        self.iter()
            .find(|insert| insert.name().map(|t| t.as_str() == name).unwrap_or(false))
            .ok_or_else(|| model_not_found(format!("insert named {:?}", name)))
    }
}

/// A read-only Insert view. `index` is the insert's position, not its
/// `Input`/`Output` routing target.
#[derive(Clone)]
pub struct Insert<'a> {
    events: &'a [Event],
    index: u16,
    params: Option<MixerParams>,
    version: FlVersion,
}

impl<'a> Insert<'a> {
    fn new(events: &'a [Event], index: u16, params: Option<MixerParams>, version: FlVersion) -> Self {
        Self {
            events,
            index,
            params,
            version,
        }
    }

    pub fn index(&self) -> u16 {
        self.index
    }

    pub fn name(&self) -> Option<Text> {
        find(self.events, tag::insert::NAME)
            .map(|e| Text::decode(e.body(), StringEncoding::for_version(self.version)))
    }

    pub fn color(&self) -> Option<(u8, u8, u8, u8)> {
        find(self.events, tag::insert::COLOR).map(|e| body::decode_color(e.body()))
    }

    pub fn icon(&self) -> Option<u16> {
        find(self.events, tag::insert::ICON).and_then(|e| read_u16(e.body()))
    }

    pub fn output(&self) -> Option<i32> {
        find(self.events, tag::insert::OUTPUT).and_then(|e| read_i32(e.body()))
    }

    pub fn input(&self) -> Option<i32> {
        find(self.events, tag::insert::INPUT).and_then(|e| read_i32(e.body()))
    }

    fn flags(&self) -> Option<u32> {
        let event = find(self.events, tag::insert::FLAGS)?;
        let mut reader = body::TruncatableReader::new(event.body());
        reader.read(4)?;
        reader.read_u32()
    }

    pub fn dock(&self) -> Dock {
        match self.flags() {
            Some(flags) if flags & DOCK_MIDDLE_BIT != 0 => Dock::Middle,
            Some(flags) if flags & DOCK_RIGHT_BIT != 0 => Dock::Right,
            _ => Dock::Left,
        }
    }

    /// Zips the routing bitmap with the send-level params in declared
    /// order, stopping at the shorter sequence . Yields `(target_index, msg)` for every
    /// routed send.
    pub fn routes(&self) -> Vec<(usize, i32)> {
        let routing = match find(self.events, tag::insert::ROUTING) {
            Some(e) => e.body(),
            None => return Vec::new(),
        };
        let mut sends: Vec<i32> = self
            .params
            .as_ref()
            .map(|p| {
                let mut records: Vec<_> = p
                    .records_for_insert(self.index as u8)
                    .filter(|r| r.param_id >= param_id::SEND_LOW && r.param_id <= param_id::SEND_HIGH)
                    .collect();
                records.sort_by_key(|r| r.param_id);
                records.into_iter().map(|r| r.msg).collect()
            })
            .unwrap_or_default();
        if routing.len() != sends.len() {
            warn!(
                "insert {}: routing bitmap length {} does not match send record count {}",
                self.index,
                routing.len(),
                sends.len()
            );
        }
        sends.truncate(routing.len());
        routing
            .iter()
            .zip(sends.iter())
            .enumerate()
            .filter(|(_, (&flag, _))| flag != 0)
            .map(|(i, (_, &msg))| (i, msg))
            .collect()
    }

    fn own_param(&self, id: u8) -> Option<i32> {
        self.params
            .as_ref()?
            .records_for_insert(self.index as u8)
            .find(|r| r.param_id == id)
            .map(|r| r.msg)
    }

    pub fn volume(&self) -> Option<i32> {
        self.own_param(param_id::VOLUME)
    }

    pub fn pan(&self) -> Option<i32> {
        self.own_param(param_id::PAN)
    }

    pub fn stereo_separation(&self) -> Option<i32> {
        self.own_param(param_id::STEREO_SEPARATION)
    }

    pub fn eq(&self) -> InsertEq<'_> {
        InsertEq {
            params: self.params.as_ref(),
            insert_idx: self.index as u8,
        }
    }

    pub fn slots(&self) -> Vec<Slot<'a>> {
        slot_groups(
            self.events,
            self.version.max_slots(),
            self.index as u8,
            self.params.as_ref(),
        )
    }

    pub fn slot(&self, index: u16) -> Result<Slot<'a>, ModelError> {
        self.slots()
            .into_iter()
            .find(|s| s.index() == index)
            .ok_or_else(|| model_not_found(format!("slot at index {}", index)))
    }
}

/// Tags that carry per-slot state: `Slot.Index` itself plus the plugin
/// wrapper's tag family.
fn is_slot_tag(tag_value: u8) -> bool {
    tag_value == tag::slot::INDEX
        || tag_value == tag::plugin::NAME
        || tag_value == tag::plugin::INTERNAL_NAME
        || tag_value == tag::plugin::COLOR
        || tag_value == tag::plugin::ICON
        || tag_value == tag::plugin::DATA
}

/// Builds slot `i`'s event list by taking the `i`-th occurrence of each
/// slot-associated tag family among the insert's events (if that many
/// occurrences exist), for `i` in `0..=max_slots`. Mirrors iterating each
/// tag family's own event list in lockstep rather than splitting the
/// insert's events into positional ranges, so a slot-family event is never
/// misattributed to a neighboring slot by its position relative to a
/// `Slot.Index` marker.
fn slot_groups<'a>(
    events: &'a [Event],
    max_slots: u16,
    insert_idx: u8,
    params: Option<&MixerParams>,
) -> Vec<Slot<'a>> {
    let mut by_tag: std::collections::BTreeMap<u8, Vec<&'a Event>> = std::collections::BTreeMap::new();
    for event in events {
        if is_slot_tag(event.tag()) {
            by_tag.entry(event.tag()).or_default().push(event);
        }
    }
    let mut out = Vec::with_capacity(max_slots as usize + 1);
    for slot_idx in 0..=max_slots {
        let i = slot_idx as usize;
        let slice: Vec<&'a Event> = by_tag
            .values()
            .filter_map(|occurrences| occurrences.get(i).copied())
            .collect();
        out.push(Slot::new(slice, slot_idx, params.cloned(), insert_idx));
    }
    out
}

fn find_one<'a>(events: &[&'a Event], tag_value: u8) -> Option<&'a Event> {
    events.iter().copied().find(|e| e.tag() == tag_value)
}

/// A read-only Slot view: the plugin-related events plus the two
/// per-slot parameter records.
#[derive(Clone)]
pub struct Slot<'a> {
    events: Vec<&'a Event>,
    index: u16,
    params: Option<MixerParams>,
    insert_idx: u8,
}

impl<'a> Slot<'a> {
    fn new(events: Vec<&'a Event>, index: u16, params: Option<MixerParams>, insert_idx: u8) -> Self {
        Self {
            events,
            index,
            params,
            insert_idx,
        }
    }

    pub fn index(&self) -> u16 {
        self.index
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn name(&self) -> Option<Text> {
        find_one(&self.events, tag::plugin::NAME).map(|e| Text::decode(e.body(), StringEncoding::Ansi))
    }

    pub fn internal_name(&self) -> Option<Text> {
        find_one(&self.events, tag::plugin::INTERNAL_NAME).map(|e| Text::decode(e.body(), StringEncoding::Ansi))
    }

    pub fn color(&self) -> Option<(u8, u8, u8, u8)> {
        find_one(&self.events, tag::plugin::COLOR).map(|e| body::decode_color(e.body()))
    }

    pub fn icon(&self) -> Option<u16> {
        find_one(&self.events, tag::plugin::ICON).and_then(|e| read_u16(e.body()))
    }

    pub fn plugin_data(&self) -> Option<&'a [u8]> {
        find_one(&self.events, tag::plugin::DATA).map(|e| e.body())
    }

    fn slot_param(&self, id: u8) -> Option<i32> {
        self.params
            .as_ref()?
            .records()
            .iter()
            .find(|r| r.insert_idx == self.insert_idx && r.slot_idx == self.index as u8 && r.param_id == id)
            .map(|r| r.msg)
    }

    pub fn is_enabled(&self) -> Option<bool> {
        self.slot_param(param_id::SLOT_ENABLED).map(|m| m != 0)
    }

    pub fn mix(&self) -> Option<i32> {
        self.slot_param(param_id::SLOT_MIX)
    }
}

/// A read-only view over an insert's 3 EQ bands.
pub struct InsertEq<'a> {
    params: Option<&'a MixerParams>,
    insert_idx: u8,
}

impl<'a> InsertEq<'a> {
    pub fn band(&self, band: EqBandKind) -> InsertEqBand<'a> {
        InsertEqBand {
            params: self.params,
            insert_idx: self.insert_idx,
            band,
        }
    }

    pub fn low(&self) -> InsertEqBand<'a> {
        self.band(EqBandKind::Low)
    }

    pub fn mid(&self) -> InsertEqBand<'a> {
        self.band(EqBandKind::Mid)
    }

    pub fn high(&self) -> InsertEqBand<'a> {
        self.band(EqBandKind::High)
    }
}

pub struct InsertEqBand<'a> {
    params: Option<&'a MixerParams>,
    insert_idx: u8,
    band: EqBandKind,
}

impl<'a> InsertEqBand<'a> {
    fn lookup(&self, id: u8) -> Option<i32> {
        self.params?
            .records_for_insert(self.insert_idx)
            .find(|r| r.param_id == id)
            .map(|r| r.msg)
    }

    pub fn gain(&self) -> Option<i32> {
        self.lookup(self.band.gain_id())
    }

    pub fn freq(&self) -> Option<i32> {
        self.lookup(self.band.freq_id())
    }

    pub fn reso(&self) -> Option<i32> {
        self.lookup(self.band.q_id())
    }
}

/// The mutation half of the mixer projection: re-derives insert/slot
/// boundaries on each call rather than holding a live sub-slice, since a
/// lending iterator over `&mut [Event]` isn't expressible through the
/// standard `Iterator` trait.
pub struct MixerMut<'a> {
    events: &'a mut Vec<Event>,
    version: FlVersion,
}

impl<'a> MixerMut<'a> {
    pub(crate) fn new(events: &'a mut Vec<Event>, version: FlVersion) -> Self {
        Self { events, version }
    }

    pub fn insert_mut(&mut self, index: u16) -> Result<InsertMut<'_>, ModelError> {
        let range = insert_ranges(self.events)
            .into_iter()
            .nth(index as usize)
            .ok_or_else(|| model_not_found(format!("insert at index {}", index)))?;
        Ok(InsertMut {
            events: self.events,
            range,
            index,
            version: self.version,
        })
    }
}

/// A mutable Insert handle. Field setters patch the owning event's body
/// directly; parameter setters patch the shared params blob via
/// `MixerParams::with_updated`, preserving every other record's bytes.
pub struct InsertMut<'a> {
    events: &'a mut Vec<Event>,
    range: Range<usize>,
    index: u16,
    version: FlVersion,
}

impl<'a> InsertMut<'a> {
    pub fn index(&self) -> u16 {
        self.index
    }

    fn find_mut(&mut self, tag_value: u8) -> Option<&mut Event> {
        self.events[self.range.clone()]
            .iter_mut()
            .find(|e| e.tag() == tag_value)
    }

    pub fn set_name(&mut self, name: &str) {
        let encoding = StringEncoding::for_version(self.version);
        if let Some(event) = self.find_mut(tag::insert::NAME) {
            let mut text = Text::decode(event.body(), encoding);
            text.set(name);
            *event.body_mut() = text.encode(encoding);
        }
    }

    pub fn set_color(&mut self, rgba: (u8, u8, u8, u8)) {
        if let Some(event) = self.find_mut(tag::insert::COLOR) {
            *event.body_mut() = body::encode_color(rgba).to_vec();
        }
    }

    fn patch_param(&mut self, slot_idx: Option<u8>, id: u8, msg: i32) -> Result<(), ModelError> {
        let insert_idx = self.index as u8;
        let position = self
            .events
            .iter()
            .position(|e| e.tag() == tag::mixer::PARAMS)
            .ok_or_else(|| {
                crate::error::PropertyCannotBeSet {
                    property: format!("mixer param {} on insert {}", id, insert_idx),
                }
                .build()
            })?;
        let body = self.events[position].body().to_vec();
        let params = MixerParams::decode(&body);
        let patched = params.with_updated(&body, insert_idx, slot_idx, id, msg)?;
        *self.events[position].body_mut() = patched;
        Ok(())
    }

    pub fn set_volume(&mut self, msg: i32) -> Result<(), ModelError> {
        self.patch_param(None, param_id::VOLUME, msg)
    }

    pub fn set_pan(&mut self, msg: i32) -> Result<(), ModelError> {
        self.patch_param(None, param_id::PAN, msg)
    }

    pub fn set_stereo_separation(&mut self, msg: i32) -> Result<(), ModelError> {
        self.patch_param(None, param_id::STEREO_SEPARATION, msg)
    }

    pub fn eq_band_mut(&mut self, band: EqBandKind) -> InsertEqBandMut<'_, 'a> {
        InsertEqBandMut { insert: self, band }
    }

    pub fn slot_mut(&mut self, index: u16) -> SlotMut<'_, 'a> {
        SlotMut {
            insert: self,
            index,
        }
    }
}

pub struct InsertEqBandMut<'i, 'a> {
    insert: &'i mut InsertMut<'a>,
    band: EqBandKind,
}

impl<'i, 'a> InsertEqBandMut<'i, 'a> {
    pub fn set_gain(&mut self, msg: i32) -> Result<(), ModelError> {
        self.insert.patch_param(None, self.band.gain_id(), msg)
    }

    pub fn set_freq(&mut self, msg: i32) -> Result<(), ModelError> {
        self.insert.patch_param(None, self.band.freq_id(), msg)
    }

    pub fn set_reso(&mut self, msg: i32) -> Result<(), ModelError> {
        self.insert.patch_param(None, self.band.q_id(), msg)
    }
}

/// A mutable Slot handle, reached through its owning `InsertMut`.
pub struct SlotMut<'i, 'a> {
    insert: &'i mut InsertMut<'a>,
    index: u16,
}

impl<'i, 'a> SlotMut<'i, 'a> {
    pub fn set_enabled(&mut self, enabled: bool) -> Result<(), ModelError> {
        let slot_idx = self.index as u8;
        self.insert
            .patch_param(Some(slot_idx), param_id::SLOT_ENABLED, enabled as i32)
    }

    pub fn set_mix(&mut self, msg: i32) -> Result<(), ModelError> {
        let slot_idx = self.index as u8;
        self.insert.patch_param(Some(slot_idx), param_id::SLOT_MIX, msg)
    }
}
