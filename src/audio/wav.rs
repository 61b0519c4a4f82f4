//! # WAV Container Encoding
//!
//! Wraps raw PCM bytes in the canonical 44-byte RIFF/WAVE header.
//!
//! ## Audio Format (fixed):
//! - **Sample Rate**: 16kHz (16,000 Hz)
//! - **Bit Depth**: 16-bit PCM
//! - **Channels**: Mono (1 channel)
//!
//! The format is a constant of this service. Clients may declare a
//! `sample_rate` on upload, but it is only logged; the header never changes.

use byteorder::{ByteOrder, LittleEndian};

pub const CHANNELS: u16 = 1;
pub const SAMPLE_RATE: u32 = 16_000;
pub const BITS_PER_SAMPLE: u16 = 16;

/// Size of the header written in front of every payload.
pub const HEADER_LEN: usize = 44;

/// PCM format tag in the `fmt ` chunk.
const FORMAT_PCM: u16 = 1;
/// Size of a PCM `fmt ` chunk body.
const FMT_CHUNK_LEN: u32 = 16;

pub const BYTE_RATE: u32 = SAMPLE_RATE * CHANNELS as u32 * BITS_PER_SAMPLE as u32 / 8;
pub const BLOCK_ALIGN: u16 = CHANNELS * BITS_PER_SAMPLE / 8;

/// Build the WAV header for a payload of `payload_len` bytes.
///
/// ## Layout (all integers little-endian):
/// ```text
///  0..4   "RIFF"          4..8   36 + payload_len
///  8..12  "WAVE"         12..16  "fmt "
/// 16..20  16             20..22  1 (PCM)
/// 22..24  channels       24..28  sample rate
/// 28..32  byte rate      32..34  block align
/// 34..36  bits/sample    36..40  "data"
/// 40..44  payload_len
/// ```
///
/// Lengths beyond `u32::MAX` wrap; uploads of that size are not expected.
pub fn build_wav_header(payload_len: usize) -> [u8; HEADER_LEN] {
    let data_len = payload_len as u32;
    let mut header = [0u8; HEADER_LEN];

    // RIFF chunk descriptor
    header[0..4].copy_from_slice(b"RIFF");
    LittleEndian::write_u32(&mut header[4..8], data_len.wrapping_add(36));
    header[8..12].copy_from_slice(b"WAVE");

    // fmt sub-chunk
    header[12..16].copy_from_slice(b"fmt ");
    LittleEndian::write_u32(&mut header[16..20], FMT_CHUNK_LEN);
    LittleEndian::write_u16(&mut header[20..22], FORMAT_PCM);
    LittleEndian::write_u16(&mut header[22..24], CHANNELS);
    LittleEndian::write_u32(&mut header[24..28], SAMPLE_RATE);
    LittleEndian::write_u32(&mut header[28..32], BYTE_RATE);
    LittleEndian::write_u16(&mut header[32..34], BLOCK_ALIGN);
    LittleEndian::write_u16(&mut header[34..36], BITS_PER_SAMPLE);

    // data sub-chunk
    header[36..40].copy_from_slice(b"data");
    LittleEndian::write_u32(&mut header[40..44], data_len);

    header
}

/// Produce a complete WAV file: header followed by the untouched payload.
pub fn encode_wav(payload: &[u8]) -> Vec<u8> {
    let mut file = Vec::with_capacity(HEADER_LEN + payload.len());
    file.extend_from_slice(&build_wav_header(payload.len()));
    file.extend_from_slice(payload);
    file
}
