//! MIDI manufacturer identifiers as they appear at the head of a System
//! Exclusive message.

use std::collections::HashMap;
use std::fmt;

use lazy_static::lazy_static;

use crate::DEVELOPMENT;

/// MIDI manufacturer. The identifier on the wire is either a single byte for
/// standard IDs, or three bytes for extended IDs: a zero escape byte followed
/// by two bytes composed into one number as `((hi + 1) << 8) | lo`.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum Manufacturer {
    Standard(u8),
    Extended(u16),
    Development,
}

impl Manufacturer {
    /// Reads a manufacturer identifier from the start of `data` (the bytes
    /// following the SysEx initiator). Returns the identifier and the number
    /// of bytes it occupied, or `None` if the buffer ran out.
    pub fn parse(data: &[u8]) -> Option<(Self, usize)> {
        match *data.first()? {
            0x00 => {
                if data.len() < 3 {
                    return None;
                }
                let id = ((data[1] as u16) + 1) << 8 | data[2] as u16;
                Some((Manufacturer::Extended(id), 3))
            }
            DEVELOPMENT => Some((Manufacturer::Development, 1)),
            b => Some((Manufacturer::Standard(b), 1)),
        }
    }

    /// The numeric identifier used for table lookups.
    pub fn id(&self) -> u16 {
        match self {
            Manufacturer::Standard(b) => *b as u16,
            Manufacturer::Extended(id) => *id,
            Manufacturer::Development => DEVELOPMENT as u16,
        }
    }

    /// Gets the manufacturer System Exclusive bytes.
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            Manufacturer::Standard(b) => vec![*b],
            Manufacturer::Extended(id) => {
                vec![0x00, ((id >> 8) as u8).wrapping_sub(1), (id & 0xff) as u8]
            }
            Manufacturer::Development => vec![DEVELOPMENT],
        }
    }

    /// Gets the manufacturer SysEx bytes as a hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.to_bytes()).to_uppercase()
    }

    /// Gets the name of this manufacturer, if it is a known one. The name is
    /// also the key under which a decoder module may be registered.
    pub fn name(&self) -> Option<&'static str> {
        if *self == Manufacturer::Development {
            return Some("Development");
        }
        MANUFACTURER_NAMES.get(&self.id()).copied()
    }
}

impl fmt::Display for Manufacturer {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name().unwrap_or("Unknown manufacturer"))
    }
}

lazy_static! {
    static ref MANUFACTURER_NAMES: HashMap<u16, &'static str> = {
        HashMap::from([
            (0x43, "Yamaha"),
            (0x44, "Casio"),
            (0x45, "Akai"),
            (0x47, "AkaiPro"),
        ])
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_standard() {
        assert_eq!(
            Manufacturer::parse(&[0x47, 0x00, 0x07]),
            Some((Manufacturer::Standard(0x47), 1))
        );
    }

    #[test]
    fn parse_extended_composes_id() {
        // (0, hi, lo) resolves to ((hi + 1) << 8) | lo
        for (hi, lo) in [(0x00, 0x00), (0x00, 0x7f), (0x1f, 0x6b), (0x7f, 0x7f)] {
            let (m, used) = Manufacturer::parse(&[0x00, hi, lo]).unwrap();
            assert_eq!(used, 3);
            assert_eq!(m.id(), ((hi as u16 + 1) << 8) | lo as u16);
        }
    }

    #[test]
    fn parse_truncated_extended() {
        assert_eq!(Manufacturer::parse(&[0x00, 0x20]), None);
        assert_eq!(Manufacturer::parse(&[]), None);
    }

    #[test]
    fn extended_bytes_round_trip() {
        let (m, _) = Manufacturer::parse(&[0x00, 0x20, 0x6b]).unwrap();
        assert_eq!(m.to_bytes(), vec![0x00, 0x20, 0x6b]);
    }

    #[test]
    fn known_names() {
        assert_eq!(Manufacturer::Standard(0x43).name(), Some("Yamaha"));
        assert_eq!(Manufacturer::Standard(0x47).name(), Some("AkaiPro"));
        assert_eq!(Manufacturer::Standard(0x42).name(), None);
    }

    #[test]
    fn display_name() {
        assert_eq!(format!("{}", Manufacturer::Standard(0x44)), "Casio");
        assert_eq!(
            format!("{}", Manufacturer::Standard(0x30)),
            "Unknown manufacturer"
        );
    }

    #[test]
    fn hex_id() {
        assert_eq!(Manufacturer::Standard(0x47).to_hex(), "47");
        assert_eq!(Manufacturer::Extended(0x216b).to_hex(), "00206B");
    }
}
