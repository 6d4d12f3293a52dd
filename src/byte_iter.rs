//! A thin wrapper around `Read` that tracks byte position for error
//! messages. Simplified relative to a lookahead-capable reader: the event
//! framer never needs to peek ahead, so this type only tracks how many
//! bytes have been consumed.

use log::trace;
use snafu::Snafu;
use std::io::Read;

#[derive(Debug, Snafu)]
pub enum ByteError {
    #[snafu(display("unexpected end of stream at byte {}", position))]
    End { position: u64 },

    #[snafu(display("io error around byte {}: {}", position, source))]
    Io {
        position: u64,
        source: std::io::Error,
    },
}

pub(crate) type ByteResult<T> = std::result::Result<T, ByteError>;

pub(crate) struct ByteIter<R: Read> {
    inner: R,
    position: u64,
}

impl<R: Read> ByteIter<R> {
    pub(crate) fn new(inner: R) -> Self {
        Self { inner, position: 0 }
    }

    pub(crate) fn position(&self) -> u64 {
        self.position
    }

    fn fill(&mut self, buf: &mut [u8]) -> ByteResult<()> {
        match self.inner.read_exact(buf) {
            Ok(()) => {
                self.position += buf.len() as u64;
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                End {
                    position: self.position,
                }
                .fail()
            }
            Err(e) => Io {
                position: self.position,
                source: e,
            }
            .fail(),
        }
    }

    pub(crate) fn read_u8(&mut self) -> ByteResult<u8> {
        let mut buf = [0u8; 1];
        self.fill(&mut buf)?;
        trace!("read u8 {:#x} at position {}", buf[0], self.position);
        Ok(buf[0])
    }

    pub(crate) fn read_n(&mut self, n: usize) -> ByteResult<Vec<u8>> {
        let mut buf = vec![0u8; n];
        self.fill(&mut buf)?;
        trace!("read {} bytes ending at position {}", n, self.position);
        Ok(buf)
    }

    pub(crate) fn read_u16(&mut self) -> ByteResult<u16> {
        let mut buf = [0u8; 2];
        self.fill(&mut buf)?;
        Ok(u16::from_le_bytes(buf))
    }

    pub(crate) fn read_u32(&mut self) -> ByteResult<u32> {
        let mut buf = [0u8; 4];
        self.fill(&mut buf)?;
        Ok(u32::from_le_bytes(buf))
    }

    /// Reads the next tag byte, returning `Ok(None)` at a clean end of
    /// stream (as opposed to an underrun mid-event, which is an error).
    pub(crate) fn try_read_tag(&mut self) -> ByteResult<Option<u8>> {
        let mut buf = [0u8; 1];
        match self.inner.read(&mut buf) {
            Ok(0) => Ok(None),
            Ok(_) => {
                self.position += 1;
                trace!("read tag {:#x} at position {}", buf[0], self.position);
                Ok(Some(buf[0]))
            }
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => Ok(None),
            Err(e) => Io {
                position: self.position,
                source: e,
            }
            .fail(),
        }
    }
}
