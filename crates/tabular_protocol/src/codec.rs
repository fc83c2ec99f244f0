//! Change-set serializer.
//!
//! Frame format (12 bytes header, Network Byte Order / Big Endian):
//! ```text
//! [VER:1][CODEC:1][RES:2][RAW_LEN:4][LEN:4][PAYLOAD:LEN]
//! ```
//!
//! - VER (u8): Frame version (0x01)
//! - CODEC (u8): Payload encoding, see [`Codec`]
//! - RES (u16): Reserved, always zero
//! - RAW_LEN (u32): Length of the JSON document before compression
//! - LEN (u32): Length of the payload that follows the header
//!
//! The payload is the `serde_json` encoding of a [`SparseChangeSetDto`],
//! compressed with zstd unless the codec says otherwise.

use std::io::{Cursor, Read, Write};

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};

use crate::error::{ProtocolError, Result};
use crate::types::SparseChangeSetDto;

/// Frame version
pub const FRAME_VERSION: u8 = 0x01;

/// Header size in bytes
pub const HEADER_SIZE: usize = 12;

/// Upper bound on both the compressed and the raw payload.
pub const MAX_PAYLOAD_SIZE: usize = 256 * 1024 * 1024;

const ZSTD_LEVEL: i32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Codec {
    /// Uncompressed JSON
    Json = 0,
    /// zstd-compressed JSON
    ZstdJson = 1,
}

impl Codec {
    pub fn from_u8(value: u8) -> Result<Self> {
        match value {
            0 => Ok(Codec::Json),
            1 => Ok(Codec::ZstdJson),
            _ => Err(ProtocolError::UnknownCodec(value)),
        }
    }

    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

/// Frame header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameHeader {
    pub version: u8,
    pub codec: Codec,
    pub reserved: u16,
    pub raw_len: u32,
    pub payload_len: u32,
}

impl FrameHeader {
    pub fn new(codec: Codec, raw_len: u32, payload_len: u32) -> Self {
        Self {
            version: FRAME_VERSION,
            codec,
            reserved: 0,
            raw_len,
            payload_len,
        }
    }

    pub fn pack(&self) -> Result<[u8; HEADER_SIZE]> {
        let mut buf = [0u8; HEADER_SIZE];
        let mut cursor = Cursor::new(&mut buf[..]);

        cursor.write_u8(self.version)?;
        cursor.write_u8(self.codec.as_u8())?;
        cursor.write_u16::<BigEndian>(self.reserved)?;
        cursor.write_u32::<BigEndian>(self.raw_len)?;
        cursor.write_u32::<BigEndian>(self.payload_len)?;

        Ok(buf)
    }

    pub fn unpack(data: &[u8]) -> Result<Self> {
        if data.len() < HEADER_SIZE {
            return Err(ProtocolError::HeaderTooShort {
                expected: HEADER_SIZE,
                got: data.len(),
            });
        }

        let mut cursor = Cursor::new(&data[..HEADER_SIZE]);

        let version = cursor.read_u8()?;
        let codec_raw = cursor.read_u8()?;
        let reserved = cursor.read_u16::<BigEndian>()?;
        let raw_len = cursor.read_u32::<BigEndian>()?;
        let payload_len = cursor.read_u32::<BigEndian>()?;

        if version != FRAME_VERSION {
            return Err(ProtocolError::VersionMismatch {
                expected: FRAME_VERSION,
                got: version,
            });
        }

        for len in [raw_len, payload_len] {
            if len as usize > MAX_PAYLOAD_SIZE {
                return Err(ProtocolError::PayloadTooLarge {
                    size: len as usize,
                    max: MAX_PAYLOAD_SIZE,
                });
            }
        }

        Ok(Self {
            version,
            codec: Codec::from_u8(codec_raw)?,
            reserved,
            raw_len,
            payload_len,
        })
    }
}

/// Encode a change set as a zstd-compressed frame.
pub fn encode_change_set(change_set: &SparseChangeSetDto) -> Result<Vec<u8>> {
    encode_change_set_with(change_set, Codec::ZstdJson)
}

pub fn encode_change_set_with(change_set: &SparseChangeSetDto, codec: Codec) -> Result<Vec<u8>> {
    let json = serde_json::to_vec(change_set)?;
    let payload = match codec {
        Codec::Json => json.clone(),
        Codec::ZstdJson => {
            zstd::encode_all(&json[..], ZSTD_LEVEL).map_err(ProtocolError::Compression)?
        }
    };

    let raw_len = checked_len(json.len())?;
    let payload_len = checked_len(payload.len())?;
    let header = FrameHeader::new(codec, raw_len, payload_len).pack()?;

    let mut frame = Vec::with_capacity(HEADER_SIZE + payload.len());
    frame.extend_from_slice(&header);
    frame.extend_from_slice(&payload);
    Ok(frame)
}

/// Decode a frame produced by [`encode_change_set`]. Trailing bytes are rejected.
pub fn decode_change_set(data: &[u8]) -> Result<SparseChangeSetDto> {
    let header = FrameHeader::unpack(data)?;
    let payload = &data[HEADER_SIZE..];
    if payload.len() != header.payload_len as usize {
        return Err(ProtocolError::PayloadLengthMismatch {
            expected: header.payload_len as usize,
            got: payload.len(),
        });
    }
    decode_payload(&header, payload)
}

/// Write one frame to a stream.
pub fn write_change_set<W: Write>(writer: &mut W, change_set: &SparseChangeSetDto) -> Result<()> {
    let frame = encode_change_set(change_set)?;
    writer.write_all(&frame)?;
    Ok(())
}

/// Read exactly one frame from a stream.
pub fn read_change_set<R: Read>(reader: &mut R) -> Result<SparseChangeSetDto> {
    let mut header_buf = [0u8; HEADER_SIZE];
    reader.read_exact(&mut header_buf)?;
    let header = FrameHeader::unpack(&header_buf)?;

    let mut payload = Vec::with_capacity(header.payload_len as usize);
    reader
        .take(u64::from(header.payload_len))
        .read_to_end(&mut payload)?;
    if payload.len() != header.payload_len as usize {
        return Err(ProtocolError::PayloadLengthMismatch {
            expected: header.payload_len as usize,
            got: payload.len(),
        });
    }
    decode_payload(&header, &payload)
}

fn decode_payload(header: &FrameHeader, payload: &[u8]) -> Result<SparseChangeSetDto> {
    let json = match header.codec {
        Codec::Json => payload.to_vec(),
        Codec::ZstdJson => inflate_bounded(payload, header.raw_len)?,
    };
    if json.len() != header.raw_len as usize {
        return Err(ProtocolError::PayloadLengthMismatch {
            expected: header.raw_len as usize,
            got: json.len(),
        });
    }
    Ok(serde_json::from_slice(&json)?)
}

/// Inflate at most `raw_len + 1` bytes, so an oversized body is caught without
/// decompressing all of it.
fn inflate_bounded(payload: &[u8], raw_len: u32) -> Result<Vec<u8>> {
    let decoder = zstd::stream::read::Decoder::new(payload).map_err(ProtocolError::Compression)?;
    let mut json = Vec::with_capacity(raw_len as usize);
    decoder
        .take(u64::from(raw_len) + 1)
        .read_to_end(&mut json)
        .map_err(ProtocolError::Compression)?;
    Ok(json)
}

fn checked_len(len: usize) -> Result<u32> {
    if len > MAX_PAYLOAD_SIZE {
        return Err(ProtocolError::PayloadTooLarge {
            size: len,
            max: MAX_PAYLOAD_SIZE,
        });
    }
    Ok(len as u32)
}
