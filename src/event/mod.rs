/*!
The `event` module is for the tag/length/value framing layer: the atomic
`Event`, the framer (`parse_stream`/`serialize_stream`), the tag registry,
and the typed-body codecs.
!*/

pub(crate) mod body;
pub(crate) mod tag;

use crate::byte_iter::ByteIter;
use crate::error::LibResult;
use crate::vlq;
use log::{debug, trace};
use snafu::ResultExt;
use std::io::{Read, Write};

/// The four body-length encodings selected by a tag's range.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum EventKind {
    /// Tags `0..64`: a 1-byte payload.
    Scalar8,
    /// Tags `64..128`: a 2-byte payload.
    Scalar16,
    /// Tags `128..192`: a 4-byte payload.
    Scalar32,
    /// Tags `192..256`: a varlen-prefixed payload.
    Data,
}

impl EventKind {
    pub(crate) fn for_tag(tag: u8) -> Self {
        match tag {
            0..=63 => EventKind::Scalar8,
            64..=127 => EventKind::Scalar16,
            128..=191 => EventKind::Scalar32,
            192..=255 => EventKind::Data,
        }
    }

    /// The fixed body length for the three scalar kinds, or `None` for
    /// `Data`, whose length is carried by the varlen prefix.
    pub(crate) fn fixed_len(&self) -> Option<usize> {
        match self {
            EventKind::Scalar8 => Some(1),
            EventKind::Scalar16 => Some(2),
            EventKind::Scalar32 => Some(4),
            EventKind::Data => None,
        }
    }
}

/// A single tagged event: the atomic unit of the stream.
///
/// `Event` owns its raw body bytes and nothing else; it does not interpret
/// them. Interpreting and mutating a body's fields is the job of
/// `event::body` and the model layer, which read and patch these bytes in
/// place so that an unmodified event always round-trips byte for byte.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct Event {
    tag: u8,
    body: Vec<u8>,
}

impl Event {
    pub(crate) fn new(tag: u8, body: Vec<u8>) -> Self {
        Self { tag, body }
    }

    pub fn tag(&self) -> u8 {
        self.tag
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub(crate) fn body_mut(&mut self) -> &mut Vec<u8> {
        &mut self.body
    }

    pub fn kind(&self) -> EventKind {
        EventKind::for_tag(self.tag)
    }

    fn parse<R: Read>(iter: &mut ByteIter<R>, tag: u8) -> LibResult<Self> {
        let kind = EventKind::for_tag(tag);
        let body = match kind.fixed_len() {
            Some(len) => iter.read_n(len).context(io!())?,
            None => {
                let len = vlq::read_varlen(&mut ByteIterReadAdapter(iter)).context(varlen!())?;
                iter.read_n(len as usize).context(io!())?
            }
        };
        trace!("parsed event tag={} body_len={}", tag, body.len());
        Ok(Self { tag, body })
    }

    fn write<W: Write>(&self, w: &mut W) -> std::io::Result<()> {
        w.write_all(&[self.tag])?;
        if self.kind().fixed_len().is_none() {
            vlq::write_varlen(w, self.body.len() as u32)?;
        }
        w.write_all(&self.body)
    }
}

/// Adapts `ByteIter` (which reads via its own position-tracking `fill`) to
/// the plain `Read` that `vlq::read_varlen` expects.
struct ByteIterReadAdapter<'a, R: Read>(&'a mut ByteIter<R>);

impl<'a, R: Read> Read for ByteIterReadAdapter<'a, R> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        let byte = self.0.read_u8().map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::UnexpectedEof, e.to_string())
        })?;
        buf[0] = byte;
        Ok(1)
    }
}

/// Parses the inner event byte run into an ordered sequence of events.
/// Fails if a read underruns the buffer.
pub(crate) fn parse_stream<R: Read>(r: R) -> LibResult<Vec<Event>> {
    let mut iter = ByteIter::new(r);
    let mut events = Vec::new();
    while let Some(tag) = iter.try_read_tag().context(io!())? {
        let event = Event::parse(&mut iter, tag)?;
        events.push(event);
    }
    debug!("parsed {} events", events.len());
    Ok(events)
}

/// Serializes events back into the wire format. Byte-exact for every event
/// whose body was not mutated since it was parsed.
pub(crate) fn serialize_stream(events: &[Event]) -> Vec<u8> {
    let mut out = Vec::new();
    for event in events {
        event
            .write(&mut out)
            .expect("writing to a Vec<u8> is infallible");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scenario_a_scalar8() {
        let bytes = [0x00u8, 0x2a];
        let events = parse_stream(&bytes[..]).unwrap();
        assert_eq!(1, events.len());
        assert_eq!(0, events[0].tag());
        assert_eq!(&[0x2a], events[0].body());
        assert_eq!(EventKind::Scalar8, events[0].kind());
        assert_eq!(bytes.to_vec(), serialize_stream(&events));
    }

    #[test]
    fn scenario_b_varlen() {
        let bytes = [0xc0u8, 0x03, 0x01, 0x02, 0x03];
        let events = parse_stream(&bytes[..]).unwrap();
        assert_eq!(1, events.len());
        assert_eq!(192, events[0].tag());
        assert_eq!(&[1, 2, 3], events[0].body());
        assert_eq!(bytes.to_vec(), serialize_stream(&events));
    }

    #[test]
    fn scalar16_and_scalar32_round_trip() {
        let bytes = [
            0x40u8, 0xaa, 0xbb, // scalar16 tag 64
            0x80u8, 0x01, 0x02, 0x03, 0x04, // scalar32 tag 128
        ];
        let events = parse_stream(&bytes[..]).unwrap();
        assert_eq!(2, events.len());
        assert_eq!(EventKind::Scalar16, events[0].kind());
        assert_eq!(EventKind::Scalar32, events[1].kind());
        assert_eq!(bytes.to_vec(), serialize_stream(&events));
    }

    #[test]
    fn unknown_tags_are_preserved_verbatim() {
        // An unrecognized but well-framed event round-trips untouched.
        let bytes = [250u8, 0x02, 0xde, 0xad];
        let events = parse_stream(&bytes[..]).unwrap();
        assert_eq!(bytes.to_vec(), serialize_stream(&events));
    }

    #[test]
    fn order_is_preserved() {
        let bytes = [0x00u8, 0x01, 0x00u8, 0x02, 0xc0u8, 0x00];
        let events = parse_stream(&bytes[..]).unwrap();
        let tags: Vec<u8> = events.iter().map(Event::tag).collect();
        let reparsed = parse_stream(serialize_stream(&events).as_slice()).unwrap();
        let tags2: Vec<u8> = reparsed.iter().map(Event::tag).collect();
        assert_eq!(tags, tags2);
    }

    #[test]
    fn truncated_stream_is_an_error() {
        let bytes = [0x40u8, 0x01]; // scalar16 needs 2 body bytes, only 1 given
        assert!(parse_stream(&bytes[..]).is_err());
    }

    #[test]
    fn truncated_varlen_body_is_an_error() {
        let bytes = [0xc0u8, 0x05, 0x01]; // declares 5 bytes, only 1 given
        assert!(parse_stream(&bytes[..]).is_err());
    }

    #[test]
    fn framing_length_matches_the_formula() {
        // Invariant 2: serialized length == 1 + size_prefix_len + body_len
        let event = Event::new(200, vec![1, 2, 3, 4, 5]);
        let mut out = Vec::new();
        event.write(&mut out).unwrap();
        let size_prefix_len = crate::vlq::varlen_len(event.body().len() as u32);
        assert_eq!(1 + size_prefix_len + event.body().len(), out.len());
    }
}
