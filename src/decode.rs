//! Inbound message decoding: status-byte classification, System Exclusive
//! manufacturer dispatch, and the universal identity reply.

use log::debug;

use crate::manufacturer::Manufacturer;
use crate::module::ModuleRegistry;
use crate::{NON_REAL_TIME, REAL_TIME};

// Channel voice messages, status 0x80..0xEF.
const VOICE_NAMES: [&str; 7] = [
    "NoteOff",
    "NoteOn",
    "Aftertouch",
    "ControlChange",
    "ProgramChange",
    "ChannelPressure",
    "PitchBend",
];

// System common and real-time messages, low nibble of the status byte.
const SYSTEM_NAMES: [&str; 16] = [
    "SysEx",
    "QuarterFrame",
    "SongPosition",
    "SongSelect",
    "?F4",
    "?F5",
    "TuneRequest",
    "EndOfSysEx",
    "Clock",
    "Tick",
    "Start",
    "Continue",
    "Stop",
    "?FD",
    "ActiveSensing",
    "Reset",
];

/// One raw MIDI message as delivered by the transport. The buffer includes
/// the leading status byte and is only borrowed for the decode call.
#[derive(Debug, Clone, Copy)]
pub struct RawMessage<'a> {
    pub bytes: &'a [u8],
    pub timestamp: u64,
}

impl<'a> RawMessage<'a> {
    pub fn new(bytes: &'a [u8], timestamp: u64) -> Self {
        RawMessage { bytes, timestamp }
    }
}

/// Decodes inbound messages to display text, dispatching System Exclusive
/// payloads to the manufacturer module registry it owns.
pub struct Decoder {
    registry: ModuleRegistry,
}

impl Decoder {
    pub fn new() -> Self {
        Decoder {
            registry: ModuleRegistry::new(),
        }
    }

    /// The registry, for command dispatch and help listings by the caller.
    pub fn registry_mut(&mut self) -> &mut ModuleRegistry {
        &mut self.registry
    }

    /// Decodes one message. Returns `None` for messages suppressed from
    /// output (active sensing, unless `verbose`) and for empty buffers.
    pub fn decode(&mut self, message: &RawMessage, verbose: bool) -> Option<String> {
        let bytes = message.bytes;
        let status = *bytes.first()?;
        debug!("decoding {} bytes at {}", bytes.len(), message.timestamp);

        let mut out = String::new();
        if (0x80..0xf0).contains(&status) {
            let channel = status & 0x0f;
            out.push_str(VOICE_NAMES[(status >> 4) as usize - 8]);
            out.push_str(&format!("[{}]", channel));
            match status & 0xf0 {
                0x80 | 0x90 => {
                    if let (Some(key), Some(velocity)) = (bytes.get(1), bytes.get(2)) {
                        out.push_str(&format!(": {} V:{}", key, velocity));
                    }
                }
                0xb0 => {
                    if let (Some(id), Some(value)) = (bytes.get(1), bytes.get(2)) {
                        out.push_str(&format!(": ID:{} V:{}", id, value));
                    }
                }
                _ => {}
            }
        } else {
            out.push_str(SYSTEM_NAMES[(status & 0x0f) as usize]);
            match status {
                0xf0 => self.decode_sysex(bytes, &mut out),
                0xf2 => {
                    if let (Some(&lsb), Some(&msb)) = (bytes.get(1), bytes.get(2)) {
                        let position = (msb as u16) << 7 | (lsb as u16 & 0x7f);
                        out.push_str(&format!(": Pos:{}", position));
                    }
                }
                0xf3 => {
                    if let Some(song) = bytes.get(1) {
                        out.push_str(&format!(" Song:{}", song));
                    }
                }
                0xfe => {
                    if !verbose {
                        return None;
                    }
                }
                _ => {}
            }
        }
        Some(out)
    }

    fn decode_sysex(&mut self, bytes: &[u8], out: &mut String) {
        let Some((manufacturer, used)) = Manufacturer::parse(&bytes[1..]) else {
            return;
        };
        let offset = 1 + used;
        match manufacturer {
            Manufacturer::Development => out.push_str(": EDU"),
            Manufacturer::Standard(NON_REAL_TIME) => {
                out.push_str(": Universal Non-Real-time");
                self.decode_non_real_time(bytes, offset, out);
            }
            Manufacturer::Standard(REAL_TIME) => {
                out.push_str(": Universal Real-time: unimplemented");
            }
            _ => match manufacturer.name() {
                Some(name) => {
                    out.push_str(&format!(": {}", name));
                    match self.registry.resolve(name) {
                        Some(module) => module.decode(bytes, offset, out),
                        None => out.push_str(": unable to load decoder"),
                    }
                }
                None => out.push_str(": ??"),
            },
        }
    }

    /// Universal non-real-time sub-decoding. Only the identity reply
    /// (sub-ids 06 02) is handled; its fields are rendered and forwarded to
    /// the manufacturer's module so it can adapt to the reported product.
    fn decode_non_real_time(&mut self, bytes: &[u8], offset: usize, out: &mut String) {
        // channel byte, then the sub-id pair
        let (Some(&sub1), Some(&sub2)) = (bytes.get(offset + 1), bytes.get(offset + 2)) else {
            return;
        };
        if sub1 != 0x06 || sub2 != 0x02 {
            return;
        }
        let Some(fields) = bytes.get(offset + 3..offset + 12) else {
            return;
        };
        let id = fields[0] as u16;
        let family = (fields[1] as u16) << 8 | fields[2] as u16;
        let product = (fields[3] as u16) << 8 | fields[4] as u16;
        let version = (fields[5] as u32) << 24
            | (fields[6] as u32) << 16
            | (fields[7] as u32) << 8
            | fields[8] as u32;

        let name = Manufacturer::Standard(fields[0]).name();
        out.push_str(&format!(
            ": Identity: {}({:02x}): family:{:04x}: product:{:04x}: version:{:08x}",
            name.unwrap_or("Unknown"),
            id,
            family,
            product,
            version
        ));
        if let Some(module) = name.and_then(|name| self.registry.resolve(name)) {
            module.identity(id, family, product, version);
        }
    }
}

impl Default for Decoder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(bytes: &[u8]) -> Option<String> {
        Decoder::new().decode(&RawMessage::new(bytes, 0), false)
    }

    #[test]
    fn note_on_with_fields() {
        assert_eq!(decode(&[0x90, 60, 100]).unwrap(), "NoteOn[0]: 60 V:100");
        assert_eq!(decode(&[0x82, 60, 0]).unwrap(), "NoteOff[2]: 60 V:0");
    }

    #[test]
    fn note_on_truncated() {
        // Missing velocity drops the field clause, not the message.
        assert_eq!(decode(&[0x90, 60]).unwrap(), "NoteOn[0]");
    }

    #[test]
    fn control_change() {
        assert_eq!(
            decode(&[0xb3, 7, 127]).unwrap(),
            "ControlChange[3]: ID:7 V:127"
        );
    }

    #[test]
    fn song_position_is_fourteen_bits() {
        assert_eq!(decode(&[0xf2, 0x01, 0x40]).unwrap(), "SongPosition: Pos:8193");
    }

    #[test]
    fn song_select() {
        assert_eq!(decode(&[0xf3, 4]).unwrap(), "SongSelect Song:4");
    }

    #[test]
    fn active_sensing_suppressed() {
        let mut decoder = Decoder::new();
        assert_eq!(decoder.decode(&RawMessage::new(&[0xfe], 0), false), None);
        assert_eq!(
            decoder.decode(&RawMessage::new(&[0xfe], 0), true).unwrap(),
            "ActiveSensing"
        );
    }

    #[test]
    fn empty_message() {
        assert_eq!(decode(&[]), None);
    }

    #[test]
    fn sysex_unknown_manufacturer() {
        assert_eq!(decode(&[0xf0, 0x42, 0x00, 0xf7]).unwrap(), "SysEx: ??");
    }

    #[test]
    fn sysex_known_manufacturer_without_module() {
        assert_eq!(
            decode(&[0xf0, 0x43, 0x00, 0xf7]).unwrap(),
            "SysEx: Yamaha: unable to load decoder"
        );
    }

    #[test]
    fn sysex_development() {
        assert_eq!(decode(&[0xf0, 0x7d, 0xf7]).unwrap(), "SysEx: EDU");
    }

    #[test]
    fn sysex_extended_id_unknown() {
        assert_eq!(decode(&[0xf0, 0x00, 0x1f, 0x6b, 0xf7]).unwrap(), "SysEx: ??");
    }

    #[test]
    fn sysex_dispatches_to_module() {
        assert_eq!(
            decode(&[0xf0, 0x47, 0x00, 0x07, 0x5a, 0xf7]).unwrap(),
            "SysEx: AkaiPro: lock keys"
        );
    }

    #[test]
    fn universal_real_time_marker() {
        assert_eq!(
            decode(&[0xf0, 0x7f, 0x7f, 0x01, 0x01, 0xf7]).unwrap(),
            "SysEx: Universal Real-time: unimplemented"
        );
    }

    #[test]
    fn identity_reply_renders_and_reconfigures() {
        let mut decoder = Decoder::new();
        let reply = [
            0xf0, 0x7e, 0x7f, 0x06, 0x02, 0x47, 0x00, 0x00, 0x10, 0x00, 0x00, 0x00, 0x01, 0x00,
            0xf7,
        ];
        let text = decoder.decode(&RawMessage::new(&reply, 0), false).unwrap();
        assert_eq!(
            text,
            "SysEx: Universal Non-Real-time: Identity: AkaiPro(47): \
             family:0000: product:1000: version:00000100"
        );

        // Product 0x1000 identified a DPS16, so output assign is now allowed.
        let reply = decoder
            .registry_mut()
            .resolve("AkaiPro")
            .unwrap()
            .command("mix outputs");
        assert!(reply.frame.is_some());
    }

    #[test]
    fn identity_reply_truncated() {
        let text = decode(&[0xf0, 0x7e, 0x7f, 0x06, 0x02, 0x47, 0xf7]).unwrap();
        assert_eq!(text, "SysEx: Universal Non-Real-time");
    }

    #[test]
    fn arbitrary_buffers_never_fault() {
        let mut decoder = Decoder::new();
        let mut seed: u32 = 0x2545_f491;
        let mut next = move || {
            seed = seed.wrapping_mul(1_103_515_245).wrapping_add(12_345);
            (seed >> 16) as u8
        };
        for round in 0..500 {
            let len = round % 40;
            let mut bytes: Vec<u8> = (0..len).map(|_| next()).collect();
            if round % 3 == 0 && !bytes.is_empty() {
                // Steer a third of the rounds into the SysEx decoder.
                bytes[0] = 0xf0;
                if bytes.len() > 1 {
                    bytes[1] = 0x47;
                }
            }
            decoder.decode(&RawMessage::new(&bytes, round as u64), true);
        }
    }
}
