//! The bitstream model shared by the driver and all test kernels.
//!
//! A [Bitstream] is an ordered sample from the source under test, stored as
//! one byte per bit (value 0 or 1). The driver performs the expansion from
//! packed input exactly once; kernels only ever see the expanded buffer,
//! borrowed for the duration of one execute call.
//!
//! Packed input is expanded MSB-first: the most significant bit of the
//! first input byte becomes bit 0 of the stream.

use crate::{Error, BYTE_SIZE};
use std::collections::VecDeque;
use std::io::{ErrorKind, Read};

/// One bitstream: id (1-based ordinal in the run), the expanded bit buffer
/// and the precomputed ones/zeros counts.
#[derive(Clone, Debug)]
pub struct Bitstream {
    id: u64,
    bits: Box<[u8]>,
    ones: u64,
    zeros: u64,
}

impl Bitstream {
    /// Create a bitstream from an already expanded buffer. Every byte must
    /// be 0 or 1.
    pub fn from_bits(id: u64, bits: Vec<u8>) -> Result<Self, Error> {
        let mut ones = 0_u64;
        for (idx, &bit) in bits.iter().enumerate() {
            match bit {
                0 => {}
                1 => ones += 1,
                other => {
                    return Err(Error::InvalidParameter(format!(
                        "bit {idx} has value {other}, expected 0 or 1"
                    )))
                }
            }
        }

        let zeros = bits.len() as u64 - ones;
        Ok(Self {
            id,
            bits: bits.into_boxed_slice(),
            ones,
            zeros,
        })
    }

    /// Expand packed bytes (8 bits each, MSB first) into a bitstream.
    pub fn from_packed_bytes(id: u64, bytes: &[u8]) -> Self {
        let mut bits = Vec::with_capacity(bytes.len() * BYTE_SIZE);
        let mut ones = 0_u64;

        for &byte in bytes {
            for shift in (0..BYTE_SIZE).rev() {
                let bit = (byte >> shift) & 0x01;
                ones += bit as u64;
                bits.push(bit);
            }
        }

        let zeros = bits.len() as u64 - ones;
        Self {
            id,
            bits: bits.into_boxed_slice(),
            ones,
            zeros,
        }
    }

    /// Create a bitstream from a string, with the ASCII char "0" mapping to
    /// 0 and "1" mapping to 1. No other character is allowed.
    pub fn from_ascii_str(id: u64, value: &str) -> Result<Self, Error> {
        let bits = value
            .bytes()
            .map(|char| match char {
                b'0' => Ok(0_u8),
                b'1' => Ok(1_u8),
                other => Err(Error::InvalidParameter(format!(
                    "invalid character {:?} in bitstream text",
                    other as char
                ))),
            })
            .collect::<Result<Vec<_>, _>>()?;

        Self::from_bits(id, bits)
    }

    /// The 1-based ordinal of this stream within the run.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// The stream length in bits.
    pub fn len(&self) -> usize {
        self.bits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    /// The expanded bit buffer, one byte per bit.
    pub fn bits(&self) -> &[u8] {
        &self.bits
    }

    pub fn ones(&self) -> u64 {
        self.ones
    }

    pub fn zeros(&self) -> u64 {
        self.zeros
    }
}

/// An ordered source of bitstreams. The driver asks for one stream at a
/// time; a source returns `Ok(None)` once it is cleanly exhausted.
pub trait BitstreamSource {
    /// Produce the next bitstream with the given id and bit length.
    ///
    /// Running out of data mid-stream is an error; running out exactly at a
    /// stream boundary is the regular end of the source.
    fn next_bitstream(&mut self, id: u64, bit_length: usize) -> Result<Option<Bitstream>, Error>;
}

/// Reads packed binary input: every input byte carries 8 bits, MSB first.
pub struct PackedByteSource<R: Read> {
    bytes: std::io::Bytes<R>,
}

impl<R: Read> PackedByteSource<R> {
    pub fn new(inner: R) -> Self {
        Self {
            bytes: inner.bytes(),
        }
    }
}

impl<R: Read> BitstreamSource for PackedByteSource<R> {
    fn next_bitstream(&mut self, id: u64, bit_length: usize) -> Result<Option<Bitstream>, Error> {
        let byte_length = bit_length / BYTE_SIZE;
        let mut buffer = Vec::with_capacity(byte_length);

        for _ in 0..byte_length {
            match self.bytes.next() {
                Some(byte) => buffer.push(byte?),
                None if buffer.is_empty() => return Ok(None),
                None => {
                    return Err(Error::Io(std::io::Error::new(
                        ErrorKind::UnexpectedEof,
                        format!(
                            "bitstream {id} is incomplete: got {} of {byte_length} bytes",
                            buffer.len()
                        ),
                    )))
                }
            }
        }

        Ok(Some(Bitstream::from_packed_bytes(id, &buffer)))
    }
}

/// Reads ASCII input: one '0' or '1' character per bit, as used by the NIST
/// reference data files. Whitespace is skipped, anything else is rejected.
pub struct AsciiSource<R: Read> {
    bytes: std::io::Bytes<R>,
}

impl<R: Read> AsciiSource<R> {
    pub fn new(inner: R) -> Self {
        Self {
            bytes: inner.bytes(),
        }
    }
}

impl<R: Read> BitstreamSource for AsciiSource<R> {
    fn next_bitstream(&mut self, id: u64, bit_length: usize) -> Result<Option<Bitstream>, Error> {
        let mut bits = Vec::with_capacity(bit_length);

        while bits.len() < bit_length {
            match self.bytes.next() {
                Some(byte) => match byte? {
                    b'0' => bits.push(0),
                    b'1' => bits.push(1),
                    byte if byte.is_ascii_whitespace() => {}
                    other => {
                        return Err(Error::InvalidParameter(format!(
                            "invalid character {:?} in ASCII bitstream input",
                            other as char
                        )))
                    }
                },
                None if bits.is_empty() => return Ok(None),
                None => {
                    return Err(Error::Io(std::io::Error::new(
                        ErrorKind::UnexpectedEof,
                        format!(
                            "bitstream {id} is incomplete: got {} of {bit_length} bits",
                            bits.len()
                        ),
                    )))
                }
            }
        }

        // counts are correct by construction, from_bits only re-validates
        Bitstream::from_bits(id, bits).map(Some)
    }
}

/// An in-memory source, mostly useful for tests and library consumers that
/// already hold their streams.
pub struct MemorySource {
    pending: VecDeque<Vec<u8>>,
}

impl MemorySource {
    /// One entry per bitstream, each a buffer of 0/1 bytes.
    pub fn new(streams: Vec<Vec<u8>>) -> Self {
        Self {
            pending: streams.into(),
        }
    }

    /// One entry per bitstream, each a string of '0'/'1' characters.
    pub fn from_ascii(streams: &[&str]) -> Result<Self, Error> {
        let pending = streams
            .iter()
            .map(|text| Bitstream::from_ascii_str(0, text).map(|stream| stream.bits.into_vec()))
            .collect::<Result<VecDeque<_>, _>>()?;

        Ok(Self { pending })
    }
}

impl BitstreamSource for MemorySource {
    fn next_bitstream(&mut self, id: u64, bit_length: usize) -> Result<Option<Bitstream>, Error> {
        let Some(bits) = self.pending.pop_front() else {
            return Ok(None);
        };

        if bits.len() != bit_length {
            return Err(Error::InvalidParameter(format!(
                "in-memory bitstream {id} has {} bits, expected {bit_length}",
                bits.len()
            )));
        }

        Bitstream::from_bits(id, bits).map(Some)
    }
}
