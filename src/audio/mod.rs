//! # Audio Module
//!
//! Everything that turns an uploaded byte stream into a file on its way to
//! storage.
//!
//! ## Key Components:
//! - **WAV Encoder**: 44-byte canonical header for mono 16kHz 16-bit PCM
//! - **Filenames**: timestamp-based names for stored uploads
//!
//! ## Expected Upload Format:
//! - **Encoding**: Little-endian signed 16-bit integers, no header
//! - **Sample Rate / Channels**: 16kHz mono (not checked, only assumed)

pub mod filename; // DD_MM_YYYY_HH_MM_SS.wav naming
pub mod wav;      // RIFF/WAVE header construction
