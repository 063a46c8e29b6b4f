//! # dpsyx
//!
//! `dpsyx` is a collection of helpers for decoding and encoding the MIDI
//! System Exclusive messages spoken by the Akai DPS series of digital
//! multitrack recorders (DPS12/DPS16/DPS24).
//!
//! The crate is a pure protocol layer: the transport hands in a raw message
//! buffer with a timestamp, and gets back display text for inbound messages
//! or a ready-to-send frame for outbound commands. Opening MIDI ports and
//! moving bytes is left to the caller.

pub mod decode;
pub mod dps;
pub mod manufacturer;
pub mod module;

pub use crate::decode::{Decoder, RawMessage};
pub use crate::dps::DpsModule;
pub use crate::manufacturer::Manufacturer;
pub use crate::module::{CommandReply, ModuleRegistry, SysexModule};

/// Manufacturer specific SysEx message initiator.
pub const INITIATOR: u8 = 0xf0;

/// Manufacturer specific SysEx message terminator.
pub const TERMINATOR: u8 = 0xf7;

/// Development/non-commercial SysEx manufacturer ID.
pub const DEVELOPMENT: u8 = 0x7d;

/// Universal non-real-time SysEx message indicator.
pub const NON_REAL_TIME: u8 = 0x7e;

/// Universal real-time SysEx message indicator.
pub const REAL_TIME: u8 = 0x7f;

/// Universal identity request, addressed to all devices. The transport
/// prepends the initiator status byte when sending.
pub const IDENTITY_REQUEST: [u8; 5] = [NON_REAL_TIME, 0x7f, 0x06, 0x01, TERMINATOR];

/// Returns the number of System Exclusive messages in this buffer,
/// based on the count of terminator bytes.
pub fn message_count(data: &[u8]) -> usize {
    data.iter().filter(|&n| *n == TERMINATOR).count()
}

/// Splits the buffer by the terminator byte, including it.
pub fn split_messages(data: &[u8]) -> Vec<Vec<u8>> {
    let mut parts: Vec<Vec<u8>> = Vec::new();
    for part in data.split_inclusive(|&n| n == TERMINATOR) {
        parts.push(part.to_vec());
    }
    parts
}
