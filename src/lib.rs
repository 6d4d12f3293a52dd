#![allow(dead_code)]

#[macro_use]
mod error;

mod byte_iter;
mod event;
mod model;
mod text;
mod version;

pub mod vlq;

pub use error::{Error, Result};
pub use model::{
    Controller, ControllerMut, Dock, EqBandKind, Insert, InsertEq, InsertEqBand, InsertEqBandMut,
    InsertMut, Mixer, MixerMut, Note, NoteMut, Pattern, PatternMut, Patterns, PatternsMut, Slot,
    SlotMut,
};
pub use text::Text;
pub use version::FlVersion;

use event::Event;
use log::debug;

/// The core of an FL Studio project: an ordered sequence of events, plus
/// the format version used to select string encoding and the mixer's
/// version-gated limits. Does not own the outer
/// RIFF-like container; the caller hands it the raw event byte run and
/// receives one back.
#[derive(Clone, Debug)]
pub struct EventStream {
    events: Vec<Event>,
    version: FlVersion,
}

impl EventStream {
    /// Parses the event byte run into a stream. Fails if a read
    /// underruns the buffer mid-event.
    pub fn parse(bytes: &[u8], version: FlVersion) -> Result<Self> {
        let events = event::parse_stream(bytes)?;
        debug!("parsed event stream with {} events at version {}", events.len(), version);
        Ok(Self { events, version })
    }

    /// Serializes the stream back to bytes. Byte-exact for every event
    /// whose body was not mutated since it was parsed.
    pub fn serialize(&self) -> Vec<u8> {
        event::serialize_stream(&self.events)
    }

    pub fn version(&self) -> FlVersion {
        self.version
    }

    pub fn set_version(&mut self, version: FlVersion) {
        self.version = version;
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn mixer(&self) -> Mixer<'_> {
        Mixer::new(&self.events, self.version)
    }

    pub fn mixer_mut(&mut self) -> MixerMut<'_> {
        MixerMut::new(&mut self.events, self.version)
    }

    pub fn patterns(&self) -> Patterns<'_> {
        Patterns::new(&self.events, self.version)
    }

    pub fn patterns_mut(&mut self) -> PatternsMut<'_> {
        PatternsMut::new(&mut self.events, self.version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_stream_round_trips() {
        let stream = EventStream::parse(&[], FlVersion::new(20, 9, 1, None)).unwrap();
        assert_eq!(Vec::<u8>::new(), stream.serialize());
        assert!(stream.mixer().is_empty());
        assert!(stream.patterns().is_empty());
    }

    #[test]
    fn truncated_stream_is_rejected() {
        let bytes = [0x80u8, 0x01, 0x02];
        assert!(EventStream::parse(&bytes, FlVersion::new(20, 9, 1, None)).is_err());
    }

    #[test]
    fn round_trip_identity_for_a_mixed_stream() {
        let bytes = [
            0x00u8, 0x2a, // scalar8
            0x40u8, 0x01, 0x00, // scalar16
            0xc0u8, 0x02, 0xaa, 0xbb, // data
        ];
        let stream = EventStream::parse(&bytes, FlVersion::new(20, 9, 1, None)).unwrap();
        assert_eq!(bytes.to_vec(), stream.serialize());
    }
}
