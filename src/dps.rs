//! Decoder and command encoder for the Akai DPS series of digital
//! multitrack recorders.
//!
//! Outbound frames are wrapped in a fixed five-byte envelope:
//! manufacturer byte, device id, function code, product code, terminator.
//! Mixer requests and replies carry a sub-payload of their own: a length
//! byte (payload size minus one), a mix command byte, a kind byte, and one
//! byte per channel. Channel counts are never stored in replies; they are
//! derived from the length byte and the per-channel record width of the mix
//! command.

use log::info;

use crate::module::{CommandReply, SysexModule};
use crate::TERMINATOR;

/// Akai professional products manufacturer byte, the first byte of every
/// outbound DPS frame.
pub const AKAI_PRO_ID: u8 = 0x47;

// DPS product code carried in the frame envelope.
const PRODUCT_CODE: u8 = 0x5a;

// Slot 0 is only reachable by modular wrap of out-of-range channel bytes; a
// zero channel byte selects the master tables instead.
const CHANNEL_NAMES: [&str; 21] = [
    "?", "1", "2", "3", "4", "5", "6", "7", "8", "9", "10", "11", "12", "T1", "T2", "T3", "T4",
    "T5", "T6", "T7", "T8",
];

const MASTER_NAMES: [&str; 5] = ["MASTER", "A Master", "B Master", "C Master", "D Master"];

const INPUT_NAMES: [&str; 14] = [
    "INP 1",
    "INP 2",
    "INP 3",
    "INP 4",
    "INP 5",
    "INP 6",
    "DIGITAL-L",
    "DIGITAL-R",
    "MASTER-L",
    "MASTER-R",
    "AUX A",
    "AUX B",
    "bus-l",
    "bus-r",
];

const OUTPUT_SOURCES: [&str; 8] = [
    "MASTER-L",
    "MASTER-R",
    "MONITOR-L",
    "MONITOR-R",
    "SEND A",
    "SEND B",
    "SEND C",
    "SEND D",
];

const OUTPUT_DESTINATIONS: [&str; 26] = [
    "MASTER-L",
    "MASTER-R",
    "MONITOR-L",
    "MONITOR-R",
    "BUS-L",
    "BUS-R",
    "SEND A",
    "SEND B",
    "SEND C",
    "SEND D",
    "TRK1",
    "TRK2",
    "TRK3",
    "TRK4",
    "TRK5",
    "TRK6",
    "TRK7",
    "TRK8",
    "TRK9",
    "TRK10",
    "TRK11",
    "TRK12",
    "TRK13",
    "TRK14",
    "TRK15",
    "TRK16",
];

fn channel_name(value: u8) -> &'static str {
    CHANNEL_NAMES[value as usize % CHANNEL_NAMES.len()]
}

/// Track-count class of the recorder, reported by the identity reply.
/// Output assign and effect inserts only exist on the DPS16 and DPS24.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DpsVariant {
    Dps12,
    Dps16,
    Dps24,
}

impl DpsVariant {
    /// Number of mixer channels on this recorder.
    pub fn tracks(&self) -> u8 {
        match self {
            DpsVariant::Dps12 => 12,
            DpsVariant::Dps16 => 16,
            DpsVariant::Dps24 => 24,
        }
    }

    fn from_product(product: u16) -> Option<Self> {
        match product {
            0x0c00 => Some(DpsVariant::Dps12),
            0x1000 => Some(DpsVariant::Dps16),
            0x1800 => Some(DpsVariant::Dps24),
            _ => None,
        }
    }
}

/// Session state and codec for one DPS recorder. Defaults to addressing
/// device 0 and the smallest variant until an identity reply says otherwise.
pub struct DpsModule {
    device_id: u8,
    variant: DpsVariant,
}

/// Boxed constructor, as registered with the module registry.
pub fn module() -> Box<dyn SysexModule> {
    Box::new(DpsModule::new())
}

impl DpsModule {
    pub fn new() -> Self {
        info!("Akai DPS SysEx module");
        DpsModule {
            device_id: 0,
            variant: DpsVariant::Dps12,
        }
    }

    pub fn variant(&self) -> DpsVariant {
        self.variant
    }

    fn frame(&self, function: u8, payload: &[u8]) -> Vec<u8> {
        let mut frame = Vec::with_capacity(5 + payload.len());
        frame.push(AKAI_PRO_ID);
        frame.push(self.device_id);
        frame.push(function);
        frame.push(PRODUCT_CODE);
        frame.extend_from_slice(payload);
        frame.push(TERMINATOR);
        frame
    }

    fn mix_command(&self, aspect: MixerAspect, range: Option<(u8, u8)>) -> CommandReply {
        let (begin, end) = range.unwrap_or((1, self.variant.tracks()));
        let count = (end as i32 - begin as i32 + 1).max(0) as u8;
        let requested = format!(" ({}->{}) requested", begin, end);
        match aspect {
            MixerAspect::Levels => CommandReply::send(
                self.frame(0x7a, &mix_payload(0x01, 0, begin, count)),
                Some(format!("Mixer levels{}", requested)),
            ),
            MixerAspect::AuxSend(kind) => CommandReply::send(
                self.frame(0x7a, &mix_payload(0x01, kind, begin, count)),
                Some(format!(
                    "Mixer aux send ({}){}",
                    (b'A' + kind - 1) as char,
                    requested
                )),
            ),
            MixerAspect::Inputs => CommandReply::send(
                self.frame(0x7a, &mix_payload(0x02, 0, begin, count)),
                Some(format!("Mixer input assign{}", requested)),
            ),
            MixerAspect::Outputs => {
                if self.variant.tracks() < 16 {
                    CommandReply::report("Mixer output assign only possible on DPS16 and above")
                } else {
                    CommandReply::send(
                        self.frame(0x7a, &mix_payload(0x03, 0, 0, OUTPUT_SOURCES.len() as u8)),
                        Some("Mixer output assign requested".to_string()),
                    )
                }
            }
            MixerAspect::Effects => {
                if self.variant.tracks() < 16 {
                    CommandReply::report("Mixer effect inserts only possible on DPS16 and above")
                } else {
                    CommandReply::send(
                        self.frame(0x7a, &mix_payload(0x04, 0, begin, count)),
                        Some(format!("Mixer effect inserts{}", requested)),
                    )
                }
            }
            MixerAspect::Eq(band) => {
                let letter = match band {
                    2 => 'h',
                    1 => 'm',
                    _ => 'l',
                };
                CommandReply::send(
                    self.frame(0x7a, &mix_payload(0x11, band, begin, count)),
                    Some(format!("Mixer eq ({}) requested", letter)),
                )
            }
        }
    }

    fn decode_mix(&mut self, message: &[u8], offset: usize, out: &mut String) {
        // product code byte, then the byte count and the mix command
        let Some(&count) = message.get(offset + 1) else {
            return;
        };
        let Some(&command) = message.get(offset + 2) else {
            return;
        };
        let mut o = offset + 3;
        match command {
            0x00 => out.push_str(": NOP"),
            0x01 => {
                out.push_str(": levels: ");
                let Some(&kind) = message.get(o) else {
                    return;
                };
                o += 1;
                let channels = count.saturating_sub(2) as usize / 5;
                for _ in 0..channels {
                    let Some(record) = message.get(o..o + 5) else {
                        break;
                    };
                    let name = if record[0] != 0 {
                        channel_name(record[0])
                    } else {
                        MASTER_NAMES[kind as usize % MASTER_NAMES.len()]
                    };
                    out.push_str(&format!("{}={}/{} ", name, record[1], record[3]));
                    o += 5;
                }
            }
            0x02 => {
                out.push_str(": input map: ");
                // reserved byte
                o += 1;
                let channels = count.saturating_sub(2) as usize / 2;
                for _ in 0..channels {
                    let Some(pair) = message.get(o..o + 2) else {
                        break;
                    };
                    out.push_str(&format!(
                        "{}<-{} ",
                        channel_name(pair[0]),
                        INPUT_NAMES[pair[1] as usize % INPUT_NAMES.len()]
                    ));
                    o += 2;
                }
            }
            0x03 => {
                out.push_str(": output map: ");
                // reserved byte
                o += 1;
                let channels = count.saturating_sub(2) as usize / 2;
                for _ in 0..channels {
                    let Some(pair) = message.get(o..o + 2) else {
                        break;
                    };
                    out.push_str(&format!(
                        "{}->{} ",
                        OUTPUT_SOURCES[pair[0] as usize % OUTPUT_SOURCES.len()],
                        OUTPUT_DESTINATIONS[pair[1] as usize % OUTPUT_DESTINATIONS.len()]
                    ));
                    o += 2;
                }
            }
            0x04 => out.push_str(": effect insert"),
            0x11 => {
                let Some(&band) = message.get(o) else {
                    return;
                };
                o += 1;
                let band = match band {
                    2 => "High",
                    1 => "Mid",
                    _ => "Low",
                };
                out.push_str(&format!(": EQ ({}): ", band));
                let channels = count.saturating_sub(2) as usize / 7;
                for _ in 0..channels {
                    let Some(record) = message.get(o..o + 7) else {
                        break;
                    };
                    out.push_str(&format!(
                        "{}={}/{}/{}/ ",
                        channel_name(record[0]),
                        record[1],
                        record[3],
                        record[5]
                    ));
                    o += 7;
                }
            }
            _ => out.push_str(": unimplemented command"),
        }
    }
}

impl Default for DpsModule {
    fn default() -> Self {
        Self::new()
    }
}

impl SysexModule for DpsModule {
    fn identity(&mut self, _id: u16, _family: u16, product: u16, _version: u32) {
        if let Some(variant) = DpsVariant::from_product(product) {
            self.variant = variant;
            info!("identified DPS{}", variant.tracks());
        }
    }

    fn decode(&mut self, message: &[u8], offset: usize, out: &mut String) {
        // device id byte, then the function code
        let Some(&function) = message.get(offset + 1) else {
            return;
        };
        match function {
            0x07 => out.push_str(": lock keys"),
            0x08 => out.push_str(": unlock keys"),
            0x09 => out.push_str(": lock faders"),
            0x0a => out.push_str(": unlock faders"),
            0x0e => out.push_str(": MTC mode"),
            0x0f => out.push_str(": MIDI clock mode"),
            0x10 => out.push_str(": transport"),
            0x51 => out.push_str(": tempo map"),
            0x52 => out.push_str(": tempo map request"),
            0x7a => out.push_str(": mixer request"),
            0x7b => {
                out.push_str(": mixer");
                self.decode_mix(message, offset + 2, out);
            }
            0x7c => out.push_str(": other request"),
            0x7d => out.push_str(": other"),
            _ => {}
        }
    }

    fn command(&mut self, line: &str) -> CommandReply {
        match parse_command(line) {
            Some(Command::Device(Some(arg))) => match arg.parse::<u8>() {
                Ok(id) => {
                    self.device_id = id;
                    CommandReply::report(format!("Device: {}", id))
                }
                Err(_) => CommandReply::report("invalid device id"),
            },
            Some(Command::Device(None)) => CommandReply::default(),
            Some(Command::Lock { what, unlock }) => {
                let (base, name) = match what {
                    Lockable::Keys => (0x07, "keys"),
                    Lockable::Faders => (0x09, "faders"),
                };
                CommandReply::send(
                    self.frame(base + unlock as u8, &[]),
                    Some(format!(
                        "{} {}",
                        if unlock { "Unlocked" } else { "Locked" },
                        name
                    )),
                )
            }
            Some(Command::Transport(Some(motion))) => {
                CommandReply::send(self.frame(0x10, &[motion.code()]), None)
            }
            Some(Command::Transport(None)) => CommandReply::report("invalid transport command"),
            Some(Command::Mixer { aspect, range }) => self.mix_command(aspect, range),
            Some(Command::Other) => CommandReply::report("other data requests not implemented"),
            None => CommandReply::default(),
        }
    }

    fn commands(&self) -> &'static [&'static str] {
        &[
            "dev[ice] <id>",
            "[un]lock k[eys]|f[aders]",
            "tr[ansport] s[top]|p[lay]|REC|r[ew]|f[wd]",
            "mix[er] l[evels]|a|b|c|d|i[nputs]|o[utputs]|ef[fects]|eq[l|m|h] \
             [<begin channel> <end channel>]",
            "oth[er]",
        ]
    }
}

// Request payload: length byte, mix command, kind, one byte per channel.
fn mix_payload(command: u8, kind: u8, begin: u8, count: u8) -> Vec<u8> {
    let size = 3 + count as usize;
    let mut payload = Vec::with_capacity(size);
    payload.push((size - 1) as u8);
    payload.push(command);
    payload.push(kind);
    for channel in 0..count {
        payload.push(begin.wrapping_add(channel));
    }
    payload
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lockable {
    Keys,
    Faders,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Motion {
    Stop,
    Play,
    Record,
    Rewind,
    Forward,
}

impl Motion {
    fn code(&self) -> u8 {
        match self {
            Motion::Stop => 0x00,
            Motion::Play => 0x09,
            Motion::Record => 0x08,
            Motion::Rewind => 0x03,
            Motion::Forward => 0x04,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MixerAspect {
    Levels,
    /// Aux send A-D as kind byte 1-4.
    AuxSend(u8),
    Inputs,
    Outputs,
    Effects,
    /// EQ band: 0 low, 1 mid, 2 high.
    Eq(u8),
}

#[derive(Debug, PartialEq, Eq)]
enum Command<'a> {
    Device(Option<&'a str>),
    Lock { what: Lockable, unlock: bool },
    Transport(Option<Motion>),
    Mixer {
        aspect: MixerAspect,
        range: Option<(u8, u8)>,
    },
    Other,
}

/// Splits a command line into its leading word and arguments and resolves it
/// against the rule table. `None` means no rule matched at all, which is
/// distinct from a matched command with a bad argument.
fn parse_command(line: &str) -> Option<Command<'_>> {
    let mut words = line.split_whitespace();
    let head = words.next()?;

    if head.starts_with("dev") {
        return Some(Command::Device(words.next()));
    }
    // "un..." is checked before the overlapping "lock" rule.
    let unlock = head.starts_with("un");
    if unlock || head.starts_with("lock") {
        let what = match words.next() {
            Some(t) if t.starts_with('k') => Lockable::Keys,
            Some(t) if t.starts_with('f') => Lockable::Faders,
            _ => return None,
        };
        return Some(Command::Lock { what, unlock });
    }
    if head.starts_with("tr") {
        return Some(Command::Transport(words.next().and_then(motion)));
    }
    if head.starts_with("mix") {
        let aspect = mixer_aspect(words.next()?)?;
        let range = match (words.next(), words.next(), words.next()) {
            (Some(begin), Some(end), None) => match (begin.parse(), end.parse()) {
                (Ok(begin), Ok(end)) => Some((begin, end)),
                _ => None,
            },
            _ => None,
        };
        return Some(Command::Mixer { aspect, range });
    }
    if head.starts_with("oth") {
        return Some(Command::Other);
    }
    None
}

// A shortened token is accepted when it is a prefix of the full word.
fn abbrev(word: &str, token: &str) -> bool {
    !token.is_empty() && word.starts_with(token)
}

// REC is an exact literal; everything else abbreviates. "rec" matches
// neither and is rejected.
fn motion(token: &str) -> Option<Motion> {
    if abbrev("stop", token) {
        Some(Motion::Stop)
    } else if abbrev("play", token) {
        Some(Motion::Play)
    } else if token == "REC" {
        Some(Motion::Record)
    } else if abbrev("rew", token) {
        Some(Motion::Rewind)
    } else if abbrev("fwd", token) {
        Some(Motion::Forward)
    } else {
        None
    }
}

fn mixer_aspect(sub: &str) -> Option<MixerAspect> {
    let first = sub.as_bytes()[0];
    if sub.starts_with('l') {
        Some(MixerAspect::Levels)
    } else if (b'a'..=b'd').contains(&first) {
        Some(MixerAspect::AuxSend(first - b'a' + 1))
    } else if sub.starts_with('i') {
        Some(MixerAspect::Inputs)
    } else if sub.starts_with('o') {
        Some(MixerAspect::Outputs)
    } else if sub.starts_with("ef") {
        Some(MixerAspect::Effects)
    } else if sub.starts_with("eq") {
        let band = match sub.as_bytes().get(2) {
            Some(b'h') => 2,
            Some(b'm') => 1,
            _ => 0,
        };
        Some(MixerAspect::Eq(band))
    } else {
        None
    }
}
