//! Patterns / Pattern / Note / Controller projection.

use crate::error::ModelError;
use crate::event::body;
use crate::event::tag;
use crate::event::Event;
use crate::model::{invalid_value, model_not_found, no_models_found};
use crate::text::{StringEncoding, Text};
use crate::version::FlVersion;
use log::warn;
use std::convert::TryInto;
use std::ops::Range;

fn read_u16(body: &[u8]) -> Option<u16> {
    (body.len() >= 2).then(|| u16::from_le_bytes([body[0], body[1]]))
}

fn read_u32(body: &[u8]) -> Option<u32> {
    (body.len() >= 4).then(|| u32::from_le_bytes([body[0], body[1], body[2], body[3]]))
}

fn find(events: &[Event], tag_value: u8) -> Option<&Event> {
    events.iter().find(|e| e.tag() == tag_value)
}

fn find_mut(events: &mut [Event], tag_value: u8) -> Option<&mut Event> {
    events.iter_mut().find(|e| e.tag() == tag_value)
}

const NOTE_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

fn key_name(raw: u16) -> String {
    format!("{}{}", NOTE_NAMES[(raw % 12) as usize], raw / 12)
}

/// Parses a human note name (e.g. `"C#5"`) back into its raw key,
/// trying the two-character sharp names before their one-character
/// prefix so `"C#5"` is not mistaken for `"C"` followed by `"#5"`.
fn parse_key_name(s: &str) -> Option<u16> {
    let mut candidates: Vec<(u16, &str)> = NOTE_NAMES
        .iter()
        .enumerate()
        .map(|(i, name)| (i as u16, *name))
        .collect();
    candidates.sort_by_key(|(_, name)| std::cmp::Reverse(name.len()));
    for (index, name) in candidates {
        if let Some(rest) = s.strip_prefix(name) {
            if let Ok(octave) = rest.parse::<u16>() {
                let raw = octave * 12 + index;
                if raw < 132 {
                    return Some(raw);
                }
            }
        }
    }
    None
}

const NOTE_RECORD_LEN: usize = 24;

/// A note record: offsets `position u32(0), flags u16(4), rack_channel
/// u16(6), length u32(8), key u16(12), group u16(14), fine_pitch u8(16),
/// _reserved u8(17), release u8(18), midi_channel u8(19), pan u8(20),
/// velocity u8(21), mod_x u8(22), mod_y u8(23)`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Note {
    position: u32,
    flags: u16,
    rack_channel: u16,
    length: u32,
    key: u16,
    group: u16,
    fine_pitch: u8,
    reserved: u8,
    release: u8,
    midi_channel: u8,
    pan: u8,
    velocity: u8,
    mod_x: u8,
    mod_y: u8,
}

impl Note {
    fn decode(record: &[u8]) -> Self {
        Self {
            position: u32::from_le_bytes(record[0..4].try_into().unwrap()),
            flags: u16::from_le_bytes(record[4..6].try_into().unwrap()),
            rack_channel: u16::from_le_bytes(record[6..8].try_into().unwrap()),
            length: u32::from_le_bytes(record[8..12].try_into().unwrap()),
            key: u16::from_le_bytes(record[12..14].try_into().unwrap()),
            group: u16::from_le_bytes(record[14..16].try_into().unwrap()),
            fine_pitch: record[16],
            reserved: record[17],
            release: record[18],
            midi_channel: record[19],
            pan: record[20],
            velocity: record[21],
            mod_x: record[22],
            mod_y: record[23],
        }
    }

    fn encode_into(&self, record: &mut [u8]) {
        record[0..4].copy_from_slice(&self.position.to_le_bytes());
        record[4..6].copy_from_slice(&self.flags.to_le_bytes());
        record[6..8].copy_from_slice(&self.rack_channel.to_le_bytes());
        record[8..12].copy_from_slice(&self.length.to_le_bytes());
        record[12..14].copy_from_slice(&self.key.to_le_bytes());
        record[14..16].copy_from_slice(&self.group.to_le_bytes());
        record[16] = self.fine_pitch;
        record[17] = self.reserved;
        record[18] = self.release;
        record[19] = self.midi_channel;
        record[20] = self.pan;
        record[21] = self.velocity;
        record[22] = self.mod_x;
        record[23] = self.mod_y;
    }

    pub fn position(&self) -> u32 {
        self.position
    }

    pub fn length(&self) -> u32 {
        self.length
    }

    pub fn key(&self) -> u16 {
        self.key
    }

    /// The human note name, e.g. `"C5"` for `key == 60`.
    pub fn key_name(&self) -> String {
        key_name(self.key)
    }

    pub fn rack_channel(&self) -> u16 {
        self.rack_channel
    }

    pub fn group(&self) -> u16 {
        self.group
    }

    pub fn fine_pitch(&self) -> u8 {
        self.fine_pitch
    }

    pub fn release(&self) -> u8 {
        self.release
    }

    pub fn midi_channel(&self) -> u8 {
        self.midi_channel
    }

    pub fn pan(&self) -> u8 {
        self.pan
    }

    pub fn velocity(&self) -> u8 {
        self.velocity
    }

    pub fn mod_x(&self) -> u8 {
        self.mod_x
    }

    pub fn mod_y(&self) -> u8 {
        self.mod_y
    }

    fn set_key(&mut self, key: u16) -> Result<(), ModelError> {
        if key >= 132 {
            return Err(invalid_value(
                "note key",
                format!("{} is outside [0, 132)", key),
            ));
        }
        self.key = key;
        Ok(())
    }

    fn set_key_name(&mut self, name: &str) -> Result<(), ModelError> {
        let key = parse_key_name(name)
            .ok_or_else(|| invalid_value("note key", format!("{:?} is not a recognized note name", name)))?;
        self.key = key;
        Ok(())
    }
}

const CONTROLLER_RECORD_LEN: usize = 12;

/// A controller automation record: offsets `position u32(0), _u1 u8(4),
/// _u2 u8(5), channel u8(6), _flags u8(7), value f32(8)`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Controller {
    position: u32,
    u1: u8,
    u2: u8,
    channel: u8,
    flags: u8,
    value: f32,
}

impl Controller {
    fn decode(record: &[u8]) -> Self {
        Self {
            position: u32::from_le_bytes(record[0..4].try_into().unwrap()),
            u1: record[4],
            u2: record[5],
            channel: record[6],
            flags: record[7],
            value: f32::from_le_bytes(record[8..12].try_into().unwrap()),
        }
    }

    fn encode_into(&self, record: &mut [u8]) {
        record[0..4].copy_from_slice(&self.position.to_le_bytes());
        record[4] = self.u1;
        record[5] = self.u2;
        record[6] = self.channel;
        record[7] = self.flags;
        record[8..12].copy_from_slice(&self.value.to_le_bytes());
    }

    pub fn position(&self) -> u32 {
        self.position
    }

    pub fn channel(&self) -> u8 {
        self.channel
    }

    pub fn value(&self) -> f32 {
        self.value
    }
}

/// A read-only view over the ordered Patterns collection.
pub struct Patterns<'a> {
    events: &'a [Event],
    version: FlVersion,
}

impl<'a> Patterns<'a> {
    pub(crate) fn new(events: &'a [Event], version: FlVersion) -> Self {
        Self { events, version }
    }

    /// Pairs up the two `PatternID.New` occurrences bracketing each
    /// pattern.
    fn ranges(&self) -> Vec<(u16, Range<usize>)> {
        let mut out = Vec::new();
        let mut open: Option<(u16, usize)> = None;
        for (i, event) in self.events.iter().enumerate() {
            if event.tag() != tag::pattern::NEW {
                continue;
            }
            let value = match read_u16(event.body()) {
                Some(v) => v,
                None => continue,
            };
            match open {
                None => open = Some((value, i)),
                Some((open_value, start)) if open_value == value => {
                    out.push((value, start..i + 1));
                    open = None;
                }
                Some(_) => {
                    warn!("PatternID.New at position {} opened before its predecessor closed", i);
                    open = Some((value, i));
                }
            }
        }
        out
    }

    fn distinct_values(&self) -> Vec<u16> {
        let mut values: Vec<u16> = self
            .events
            .iter()
            .filter(|e| e.tag() == tag::pattern::NEW)
            .filter_map(|e| read_u16(e.body()))
            .collect();
        values.sort_unstable();
        values.dedup();
        values
    }

    /// Count of distinct `PatternID.New` values, not occurrences. Raises
    /// `NoModelsFound` when none are present.
    pub fn len(&self) -> Result<usize, ModelError> {
        let n = self.distinct_values().len();
        if n == 0 {
            return Err(no_models_found("patterns"));
        }
        Ok(n)
    }

    pub fn is_empty(&self) -> bool {
        self.distinct_values().is_empty()
    }

    /// `PatternsID.CurrentlySelected`: the index of the pattern currently
    /// shown in the UI, if the project recorded one.
    pub fn current(&self) -> Option<u16> {
        find(self.events, tag::patterns::CURRENTLY_SELECTED).and_then(|e| read_u16(e.body()))
    }

    /// `PatternsID.PlayTruncatedNotes`: whether notes that extend past a
    /// looped pattern's end are still played.
    pub fn play_cut_notes(&self) -> Option<bool> {
        find(self.events, tag::patterns::PLAY_TRUNCATED_NOTES)
            .and_then(|e| e.body().first())
            .map(|&b| b != 0)
    }

    pub fn iter(&self) -> impl Iterator<Item = Pattern<'a>> {
        let version = self.version;
        let events = self.events;
        self.ranges()
            .into_iter()
            .map(move |(value, range)| Pattern::new(&events[range], value, version))
    }

    pub fn get(&self, index: u16) -> Result<Pattern<'a>, ModelError> {
        if index == 0 {
            return Err(invalid_value(
                "pattern index",
                "patterns are 1-based; 0 is invalid",
            ));
        }
        self.iter()
            .find(|p| p.index() == index)
            .ok_or_else(|| model_not_found(format!("pattern at index {}", index)))
    }
}

/// A read-only Pattern view.
pub struct Pattern<'a> {
    events: &'a [Event],
    index: u16,
    version: FlVersion,
}

impl<'a> Pattern<'a> {
    fn new(events: &'a [Event], index: u16, version: FlVersion) -> Self {
        Self {
            events,
            index,
            version,
        }
    }

    pub fn index(&self) -> u16 {
        self.index
    }

    pub fn name(&self) -> Option<Text> {
        find(self.events, tag::pattern::NAME)
            .map(|e| Text::decode(e.body(), StringEncoding::for_version(self.version)))
    }

    pub fn color(&self) -> Option<(u8, u8, u8, u8)> {
        find(self.events, tag::pattern::COLOR).map(|e| body::decode_color(e.body()))
    }

    pub fn length(&self) -> Option<u32> {
        find(self.events, tag::pattern::LENGTH).and_then(|e| read_u32(e.body()))
    }

    pub fn looped(&self) -> Option<bool> {
        find(self.events, tag::pattern::LOOPED)
            .and_then(|e| e.body().first())
            .map(|&v| v != 0)
    }

    pub fn notes(&self) -> Vec<Note> {
        find(self.events, tag::pattern::NOTES)
            .map(|e| e.body().chunks_exact(NOTE_RECORD_LEN).map(Note::decode).collect())
            .unwrap_or_default()
    }

    pub fn controllers(&self) -> Vec<Controller> {
        find(self.events, tag::pattern::CONTROLLERS)
            .map(|e| {
                e.body()
                    .chunks_exact(CONTROLLER_RECORD_LEN)
                    .map(Controller::decode)
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// The mutation half of the pattern projection, mirroring
/// `mixer::MixerMut`'s re-derive-on-each-call design.
pub struct PatternsMut<'a> {
    events: &'a mut Vec<Event>,
    version: FlVersion,
}

impl<'a> PatternsMut<'a> {
    pub(crate) fn new(events: &'a mut Vec<Event>, version: FlVersion) -> Self {
        Self { events, version }
    }

    pub fn pattern_mut(&mut self, index: u16) -> Result<PatternMut<'_>, ModelError> {
        if index == 0 {
            return Err(invalid_value(
                "pattern index",
                "patterns are 1-based; 0 is invalid",
            ));
        }
        let range = Patterns::new(self.events, self.version)
            .ranges()
            .into_iter()
            .find(|(value, _)| *value == index)
            .map(|(_, range)| range)
            .ok_or_else(|| model_not_found(format!("pattern at index {}", index)))?;
        Ok(PatternMut {
            events: self.events,
            range,
            index,
            version: self.version,
        })
    }

    pub fn set_current(&mut self, index: u16) {
        if let Some(event) = find_mut(self.events, tag::patterns::CURRENTLY_SELECTED) {
            *event.body_mut() = index.to_le_bytes().to_vec();
        }
    }

    pub fn set_play_cut_notes(&mut self, play: bool) {
        if let Some(event) = find_mut(self.events, tag::patterns::PLAY_TRUNCATED_NOTES) {
            *event.body_mut() = vec![play as u8];
        }
    }
}

pub struct PatternMut<'a> {
    events: &'a mut Vec<Event>,
    range: Range<usize>,
    index: u16,
    version: FlVersion,
}

impl<'a> PatternMut<'a> {
    pub fn index(&self) -> u16 {
        self.index
    }

    pub fn set_name(&mut self, name: &str) {
        let encoding = StringEncoding::for_version(self.version);
        if let Some(event) = find_mut(&mut self.events[self.range.clone()], tag::pattern::NAME) {
            let mut text = Text::decode(event.body(), encoding);
            text.set(name);
            *event.body_mut() = text.encode(encoding);
        }
    }

    pub fn set_color(&mut self, rgba: (u8, u8, u8, u8)) {
        if let Some(event) = find_mut(&mut self.events[self.range.clone()], tag::pattern::COLOR) {
            *event.body_mut() = body::encode_color(rgba).to_vec();
        }
    }

    pub fn set_length(&mut self, length: u32) {
        if let Some(event) = find_mut(&mut self.events[self.range.clone()], tag::pattern::LENGTH) {
            *event.body_mut() = length.to_le_bytes().to_vec();
        }
    }

    pub fn set_looped(&mut self, looped: bool) {
        if let Some(event) = find_mut(&mut self.events[self.range.clone()], tag::pattern::LOOPED) {
            *event.body_mut() = vec![looped as u8];
        }
    }

    pub fn note_mut(&mut self, index: usize) -> Result<NoteMut<'_>, ModelError> {
        let event = find_mut(&mut self.events[self.range.clone()], tag::pattern::NOTES)
            .ok_or_else(|| crate::model::no_models_found("notes"))?;
        let body = event.body_mut();
        let start = index * NOTE_RECORD_LEN;
        let end = start + NOTE_RECORD_LEN;
        let record = body
            .get_mut(start..end)
            .ok_or_else(|| model_not_found(format!("note at index {}", index)))?;
        Ok(NoteMut { record })
    }

    pub fn controller_mut(&mut self, index: usize) -> Result<ControllerMut<'_>, ModelError> {
        let event = find_mut(&mut self.events[self.range.clone()], tag::pattern::CONTROLLERS)
            .ok_or_else(|| crate::model::no_models_found("controllers"))?;
        let body = event.body_mut();
        let start = index * CONTROLLER_RECORD_LEN;
        let end = start + CONTROLLER_RECORD_LEN;
        let record = body
            .get_mut(start..end)
            .ok_or_else(|| model_not_found(format!("controller at index {}", index)))?;
        Ok(ControllerMut { record })
    }
}

/// A mutable handle onto a single 24-byte note record.
pub struct NoteMut<'p> {
    record: &'p mut [u8],
}

impl<'p> NoteMut<'p> {
    pub fn get(&self) -> Note {
        Note::decode(self.record)
    }

    pub fn set_key(&mut self, key: u16) -> Result<(), ModelError> {
        let mut note = Note::decode(self.record);
        note.set_key(key)?;
        note.encode_into(self.record);
        Ok(())
    }

    pub fn set_key_name(&mut self, name: &str) -> Result<(), ModelError> {
        let mut note = Note::decode(self.record);
        note.set_key_name(name)?;
        note.encode_into(self.record);
        Ok(())
    }

    pub fn set_velocity(&mut self, velocity: u8) {
        let mut note = Note::decode(self.record);
        note.velocity = velocity;
        note.encode_into(self.record);
    }

    pub fn set_pan(&mut self, pan: u8) {
        let mut note = Note::decode(self.record);
        note.pan = pan;
        note.encode_into(self.record);
    }
}

pub struct ControllerMut<'p> {
    record: &'p mut [u8],
}

impl<'p> ControllerMut<'p> {
    pub fn get(&self) -> Controller {
        Controller::decode(self.record)
    }

    pub fn set_value(&mut self, value: f32) {
        let mut controller = Controller::decode(self.record);
        controller.value = value;
        controller.encode_into(self.record);
    }
}
