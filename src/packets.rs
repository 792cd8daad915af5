//! SNTP packet structure as defined in RFC 4330 / RFC 5905.
//!
//! The packet is a fixed 48-byte record. Its layout is described once by [`LAYOUT`] and
//! both serialization directions walk that schema, so field order and widths live in a
//! single place. All multi-byte integers are big-endian.

use std::fmt;

use thiserror::Error;

use crate::{
    modes::{AssociationMode, LeapIndicator},
    offset::compute_offset,
    time::{encode_ntp_timestamp, Clock, NtpTimestamp, TimeError},
};

/// Size of an SNTP packet on the wire.
pub const PACKET_SIZE: usize = 48;

/// Protocol version placed in client requests.
pub const NTP_VERSION: u8 = 4;

/// Mode value of a client request.
pub const MODE_CLIENT: u8 = 3;

/// Mode value of a server response.
pub const MODE_SERVER: u8 = 4;

const LI_MAX: u8 = 0b11;
const VN_MAX: u8 = 0b111;
const MODE_MAX: u8 = 0b111;

/// Errors that can occur while encoding or decoding a packet.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PacketError {
    /// Input buffer is not exactly [`PACKET_SIZE`] bytes long.
    #[error("Malformed packet: expected {expected} bytes, got {actual}")]
    Malformed { expected: usize, actual: usize },
    /// A bit-packed field does not fit its width.
    #[error("{field} value {value} exceeds maximum of {max}")]
    FieldOutOfRange { field: Field, value: u8, max: u8 },
    /// A timestamp could not be represented in NTP format.
    #[error("Invalid timestamp: {0}")]
    Timestamp(#[from] TimeError),
}

/// Wire fields in transmission order.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    LiVnMode,
    Stratum,
    Poll,
    Precision,
    RootDelay,
    RootDispersion,
    ReferenceIdentifier,
    ReferenceTimestamp,
    OriginateTimestamp,
    ReceiveTimestamp,
    TransmitTimestamp,
}

/// The packet schema: every field in wire order.
///
/// ```text
///  0                   1                   2                   3
///  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |LI | VN  |Mode |    Stratum    |     Poll      |   Precision   |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                          Root Delay                           |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                       Root Dispersion                         |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                     Reference Identifier                      |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                   Reference Timestamp (64)                    |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                   Originate Timestamp (64)                    |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                    Receive Timestamp (64)                     |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                    Transmit Timestamp (64)                    |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// ```
pub const LAYOUT: [Field; 11] = [
    Field::LiVnMode,
    Field::Stratum,
    Field::Poll,
    Field::Precision,
    Field::RootDelay,
    Field::RootDispersion,
    Field::ReferenceIdentifier,
    Field::ReferenceTimestamp,
    Field::OriginateTimestamp,
    Field::ReceiveTimestamp,
    Field::TransmitTimestamp,
];

const fn layout_size() -> usize {
    let mut size = 0;
    let mut i = 0;
    while i < LAYOUT.len() {
        size += LAYOUT[i].width();
        i += 1;
    }
    size
}

// Compile-time size assertion for the schema
const _: () = assert!(layout_size() == PACKET_SIZE);

impl Field {
    /// Width of the field on the wire, in bytes.
    pub const fn width(self) -> usize {
        match self {
            Field::LiVnMode | Field::Stratum | Field::Poll | Field::Precision => 1,
            Field::RootDelay | Field::RootDispersion | Field::ReferenceIdentifier => 4,
            Field::ReferenceTimestamp
            | Field::OriginateTimestamp
            | Field::ReceiveTimestamp
            | Field::TransmitTimestamp => 8,
        }
    }

    /// Byte offset of the field, derived from [`LAYOUT`].
    pub const fn offset(self) -> usize {
        let mut offset = 0;
        let mut i = 0;
        while i < LAYOUT.len() {
            if LAYOUT[i] as u8 == self as u8 {
                break;
            }
            offset += LAYOUT[i].width();
            i += 1;
        }
        offset
    }

    pub fn name(self) -> &'static str {
        match self {
            Field::LiVnMode => "li_vn_mode",
            Field::Stratum => "stratum",
            Field::Poll => "poll",
            Field::Precision => "precision",
            Field::RootDelay => "root_delay",
            Field::RootDispersion => "root_dispersion",
            Field::ReferenceIdentifier => "reference_identifier",
            Field::ReferenceTimestamp => "reference_timestamp",
            Field::OriginateTimestamp => "originate_timestamp",
            Field::ReceiveTimestamp => "receive_timestamp",
            Field::TransmitTimestamp => "transmit_timestamp",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// One SNTP message.
///
/// `li`, `vn` and `mode` hold the unpacked sub-fields of the first byte. Decoding accepts
/// any values; encoding rejects sub-fields wider than their bit allocation.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct SntpPacket {
    /// Leap indicator (2 bits).
    pub li: u8,
    /// Version number (3 bits).
    pub vn: u8,
    /// Association mode (3 bits).
    pub mode: u8,
    /// Distance from the reference clock.
    pub stratum: u8,
    /// Maximum interval between messages, log2 seconds.
    pub poll: u8,
    /// Clock precision, log2 seconds.
    pub precision: i8,
    /// Round-trip delay to the reference clock, 16.16 fixed point seconds.
    pub root_delay: u32,
    /// Dispersion to the reference clock, 16.16 fixed point seconds.
    pub root_dispersion: u32,
    /// Reference source identifier.
    pub reference_identifier: u32,
    /// Time the local clock was last set or corrected.
    pub reference_timestamp: NtpTimestamp,
    /// Client transmit time echoed by the server.
    pub originate_timestamp: NtpTimestamp,
    /// Time the request arrived at the server.
    pub receive_timestamp: NtpTimestamp,
    /// Time the packet departed its sender.
    pub transmit_timestamp: NtpTimestamp,
}

impl SntpPacket {
    /// Builds a client request stamped with the current time of `clock`.
    ///
    /// # Errors
    /// Returns `TimeError` if the clock reports a time outside NTP era 0.
    pub fn client_request<C: Clock + ?Sized>(clock: &C) -> Result<Self, TimeError> {
        build_client_request(clock.now())
    }

    /// Serializes the packet to its 48-byte big-endian wire format.
    ///
    /// # Errors
    /// Returns `PacketError::FieldOutOfRange` if `li`, `vn` or `mode` do not fit their bits.
    pub fn to_bytes(&self) -> Result<[u8; PACKET_SIZE], PacketError> {
        let li_vn_mode = encode_li_vn_mode(self.li, self.vn, self.mode)?;

        let mut buf = [0u8; PACKET_SIZE];
        let mut offset = 0;
        for field in LAYOUT {
            let end = offset + field.width();
            self.write_field(field, li_vn_mode, &mut buf[offset..end]);
            offset = end;
        }

        log::trace!("Encoded packet: {:02x?}", buf);
        Ok(buf)
    }

    /// Deserializes a packet from its wire format.
    ///
    /// # Errors
    /// Returns `PacketError::Malformed` unless `buf` is exactly 48 bytes long.
    pub fn from_bytes(buf: &[u8]) -> Result<Self, PacketError> {
        if buf.len() != PACKET_SIZE {
            log::debug!("Rejecting {}-byte packet", buf.len());
            return Err(PacketError::Malformed {
                expected: PACKET_SIZE,
                actual: buf.len(),
            });
        }

        let mut packet = Self::default();
        let mut offset = 0;
        for field in LAYOUT {
            let end = offset + field.width();
            packet.read_field(field, &buf[offset..end]);
            offset = end;
        }

        log::debug!(
            "Decoded packet: li={} vn={} mode={} stratum={}",
            packet.li,
            packet.vn,
            packet.mode,
            packet.stratum
        );
        Ok(packet)
    }

    #[must_use]
    pub fn leap_indicator(&self) -> LeapIndicator {
        LeapIndicator::from_bits(self.li)
    }

    #[must_use]
    pub fn association_mode(&self) -> AssociationMode {
        AssociationMode::from_bits(self.mode)
    }

    /// Clock offset implied by this server response and the local receive time.
    ///
    /// The originate timestamp is taken as the client's transmit time, so this only makes
    /// sense for a response that echoes the request.
    #[must_use]
    pub fn offset_from_response(&self, client_receive: NtpTimestamp) -> f64 {
        compute_offset(
            self.originate_timestamp,
            self.receive_timestamp,
            self.transmit_timestamp,
            client_receive,
        )
    }

    fn write_field(&self, field: Field, li_vn_mode: u8, out: &mut [u8]) {
        match field {
            Field::LiVnMode => out[0] = li_vn_mode,
            Field::Stratum => out[0] = self.stratum,
            Field::Poll => out[0] = self.poll,
            Field::Precision => out.copy_from_slice(&self.precision.to_be_bytes()),
            Field::RootDelay => out.copy_from_slice(&self.root_delay.to_be_bytes()),
            Field::RootDispersion => out.copy_from_slice(&self.root_dispersion.to_be_bytes()),
            Field::ReferenceIdentifier => {
                out.copy_from_slice(&self.reference_identifier.to_be_bytes())
            }
            Field::ReferenceTimestamp => {
                out.copy_from_slice(&self.reference_timestamp.to_be_bytes())
            }
            Field::OriginateTimestamp => {
                out.copy_from_slice(&self.originate_timestamp.to_be_bytes())
            }
            Field::ReceiveTimestamp => out.copy_from_slice(&self.receive_timestamp.to_be_bytes()),
            Field::TransmitTimestamp => {
                out.copy_from_slice(&self.transmit_timestamp.to_be_bytes())
            }
        }
    }

    fn read_field(&mut self, field: Field, raw: &[u8]) {
        match field {
            Field::LiVnMode => {
                let (li, vn, mode) = decode_li_vn_mode(raw[0]);
                self.li = li;
                self.vn = vn;
                self.mode = mode;
            }
            Field::Stratum => self.stratum = raw[0],
            Field::Poll => self.poll = raw[0],
            Field::Precision => self.precision = i8::from_be_bytes([raw[0]]),
            Field::RootDelay => self.root_delay = be_u32(raw),
            Field::RootDispersion => self.root_dispersion = be_u32(raw),
            Field::ReferenceIdentifier => self.reference_identifier = be_u32(raw),
            Field::ReferenceTimestamp => self.reference_timestamp = be_timestamp(raw),
            Field::OriginateTimestamp => self.originate_timestamp = be_timestamp(raw),
            Field::ReceiveTimestamp => self.receive_timestamp = be_timestamp(raw),
            Field::TransmitTimestamp => self.transmit_timestamp = be_timestamp(raw),
        }
    }
}

fn be_u32(raw: &[u8]) -> u32 {
    u32::from_be_bytes([raw[0], raw[1], raw[2], raw[3]])
}

fn be_timestamp(raw: &[u8]) -> NtpTimestamp {
    NtpTimestamp::new(be_u32(&raw[0..4]), be_u32(&raw[4..8]))
}

/// Packs leap indicator, version and mode into the first packet byte.
///
/// # Errors
/// Returns `PacketError::FieldOutOfRange` for `li > 3`, `vn > 7` or `mode > 7`.
pub fn encode_li_vn_mode(li: u8, vn: u8, mode: u8) -> Result<u8, PacketError> {
    for (field_value, max) in [(li, LI_MAX), (vn, VN_MAX), (mode, MODE_MAX)] {
        if field_value > max {
            return Err(PacketError::FieldOutOfRange {
                field: Field::LiVnMode,
                value: field_value,
                max,
            });
        }
    }
    Ok((li << 6) | (vn << 3) | mode)
}

/// Splits the first packet byte into (leap indicator, version, mode).
pub fn decode_li_vn_mode(value: u8) -> (u8, u8, u8) {
    ((value >> 6) & LI_MAX, (value >> 3) & VN_MAX, value & MODE_MAX)
}

/// Builds an SNTPv4 client request whose transmit timestamp is `now` (Unix seconds).
///
/// # Errors
/// Returns `TimeError` if `now` cannot be encoded as an NTP timestamp.
pub fn build_client_request(now: f64) -> Result<SntpPacket, TimeError> {
    Ok(SntpPacket {
        li: 0,
        vn: NTP_VERSION,
        mode: MODE_CLIENT,
        transmit_timestamp: encode_ntp_timestamp(now)?,
        ..SntpPacket::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::{FixedClock, NTP_UNIX_OFFSET};

    fn sample_packet() -> SntpPacket {
        SntpPacket {
            li: 1,
            vn: 4,
            mode: MODE_SERVER,
            stratum: 2,
            poll: 6,
            precision: -20,
            root_delay: 0x0000_1234,
            root_dispersion: 0x0001_8000,
            reference_identifier: 0xC0A8_0001,
            reference_timestamp: NtpTimestamp::new(3_908_988_700, 1),
            originate_timestamp: NtpTimestamp::new(3_908_988_800, 0x8000_0000),
            receive_timestamp: NtpTimestamp::new(3_908_988_801, 0x1000_0000),
            transmit_timestamp: NtpTimestamp::new(3_908_988_801, 0x2000_0000),
        }
    }

    #[test]
    fn test_layout_offsets_match_rfc() {
        let expected = [0, 1, 2, 3, 4, 8, 12, 16, 24, 32, 40];
        for (field, offset) in LAYOUT.iter().zip(expected) {
            assert_eq!(field.offset(), offset, "offset of {}", field);
        }
        assert_eq!(layout_size(), PACKET_SIZE);
    }

    #[test]
    fn test_packet_serialization() {
        let packet = sample_packet();
        let serialized = packet.to_bytes().unwrap();
        let deserialized = SntpPacket::from_bytes(&serialized).unwrap();
        assert_eq!(packet, deserialized);
    }

    #[test]
    fn test_to_bytes_size() {
        let bytes = SntpPacket::default().to_bytes().unwrap();
        assert_eq!(bytes.len(), PACKET_SIZE);
    }

    #[test]
    fn test_all_zero_buffer() {
        let packet = SntpPacket::from_bytes(&[0u8; PACKET_SIZE]).unwrap();
        assert_eq!(packet, SntpPacket::default());
        assert_eq!(packet.transmit_timestamp.to_unix_seconds(), -(NTP_UNIX_OFFSET as f64));
        assert_eq!(
            packet.reference_timestamp.to_string(),
            "1900-01-01T00:00:00.000000000Z"
        );
    }

    #[test]
    fn test_buffer_length_must_be_exact() {
        for len in [0usize, 1, 47, 49, 68, 1024] {
            let buf = vec![0u8; len];
            assert_eq!(
                SntpPacket::from_bytes(&buf),
                Err(PacketError::Malformed {
                    expected: PACKET_SIZE,
                    actual: len
                })
            );
        }
    }

    #[test]
    fn test_first_byte_packing() {
        let packet = SntpPacket {
            li: 3,
            vn: 4,
            mode: 3,
            ..SntpPacket::default()
        };
        let bytes = packet.to_bytes().unwrap();
        assert_eq!(bytes[0], 0b11_100_011);
    }

    #[test]
    fn test_li_vn_mode_all_values() {
        for li in 0..=3u8 {
            for vn in 0..=7u8 {
                for mode in 0..=7u8 {
                    let byte = encode_li_vn_mode(li, vn, mode).unwrap();
                    assert_eq!(decode_li_vn_mode(byte), (li, vn, mode));
                }
            }
        }
    }

    #[test]
    fn test_li_vn_mode_out_of_range() {
        assert_eq!(
            encode_li_vn_mode(4, 0, 0),
            Err(PacketError::FieldOutOfRange {
                field: Field::LiVnMode,
                value: 4,
                max: 3
            })
        );
        assert!(encode_li_vn_mode(0, 8, 0).is_err());
        assert!(encode_li_vn_mode(0, 0, 8).is_err());

        let packet = SntpPacket {
            mode: 9,
            ..SntpPacket::default()
        };
        assert!(packet.to_bytes().is_err());
    }

    #[test]
    fn test_big_endian_wire_format() {
        let packet = SntpPacket {
            root_delay: 0x1234_5678,
            root_dispersion: 0x9ABC_DEF0,
            reference_identifier: 0x4C4F_434C,
            ..SntpPacket::default()
        };
        let bytes = packet.to_bytes().unwrap();

        assert_eq!(bytes[4..8], [0x12, 0x34, 0x56, 0x78]);
        assert_eq!(bytes[8..12], [0x9A, 0xBC, 0xDE, 0xF0]);
        assert_eq!(&bytes[12..16], b"LOCL");
    }

    #[test]
    fn test_timestamps_at_correct_offsets() {
        let packet = SntpPacket {
            reference_timestamp: NtpTimestamp::new(0x0102_0304, 0x0506_0708),
            originate_timestamp: NtpTimestamp::new(0x1112_1314, 0x1516_1718),
            receive_timestamp: NtpTimestamp::new(0x2122_2324, 0x2526_2728),
            transmit_timestamp: NtpTimestamp::new(0x3132_3334, 0x3536_3738),
            ..SntpPacket::default()
        };
        let bytes = packet.to_bytes().unwrap();

        assert_eq!(bytes[16..24], [1, 2, 3, 4, 5, 6, 7, 8]);
        assert_eq!(bytes[24..32], [0x11, 0x12, 0x13, 0x14, 0x15, 0x16, 0x17, 0x18]);
        assert_eq!(bytes[32..40], [0x21, 0x22, 0x23, 0x24, 0x25, 0x26, 0x27, 0x28]);
        assert_eq!(bytes[40..48], [0x31, 0x32, 0x33, 0x34, 0x35, 0x36, 0x37, 0x38]);
    }

    #[test]
    fn test_precision_is_twos_complement() {
        let packet = SntpPacket {
            precision: -20,
            ..SntpPacket::default()
        };
        let bytes = packet.to_bytes().unwrap();
        assert_eq!(bytes[3], 0xEC);

        let mut raw = [0u8; PACKET_SIZE];
        raw[3] = 0x80;
        assert_eq!(SntpPacket::from_bytes(&raw).unwrap().precision, i8::MIN);
    }

    #[test]
    fn test_decode_passes_through_unusual_values() {
        let mut raw = [0xFFu8; PACKET_SIZE];
        raw[0] = 0b11_111_111;
        let packet = SntpPacket::from_bytes(&raw).unwrap();

        assert_eq!((packet.li, packet.vn, packet.mode), (3, 7, 7));
        assert_eq!(packet.stratum, 255);
        assert_eq!(packet.precision, -1);
        assert_eq!(packet.transmit_timestamp, NtpTimestamp::new(u32::MAX, u32::MAX));
        assert_eq!(packet.association_mode(), AssociationMode::Private);
        assert_eq!(packet.leap_indicator(), LeapIndicator::Unsynchronized);

        assert_eq!(packet.to_bytes().unwrap(), raw);
    }

    #[test]
    fn test_client_request() {
        let now = 1_700_000_000.5;
        let packet = build_client_request(now).unwrap();

        assert_eq!(packet.li, 0);
        assert_eq!(packet.vn, 4);
        assert_eq!(packet.mode, MODE_CLIENT);
        assert_eq!(packet.stratum, 0);
        assert_eq!(packet.originate_timestamp, NtpTimestamp::ZERO);
        assert_eq!(
            packet.transmit_timestamp,
            encode_ntp_timestamp(now).unwrap()
        );
        assert_ne!(packet.transmit_timestamp, NtpTimestamp::ZERO);

        let bytes = packet.to_bytes().unwrap();
        assert_eq!(bytes[0], 0x23);
        assert!(bytes[1..40].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_client_request_from_clock() {
        let packet = SntpPacket::client_request(&FixedClock(1_700_000_000.5)).unwrap();
        assert_eq!(packet, build_client_request(1_700_000_000.5).unwrap());
        assert!(SntpPacket::client_request(&FixedClock(f64::NAN)).is_err());
    }

    #[test]
    fn test_offset_from_response() {
        let response = SntpPacket {
            mode: MODE_SERVER,
            originate_timestamp: NtpTimestamp::new(100, 0),
            receive_timestamp: NtpTimestamp::new(105, 0),
            transmit_timestamp: NtpTimestamp::new(105, 0),
            ..SntpPacket::default()
        };
        assert_eq!(response.offset_from_response(NtpTimestamp::new(100, 0)), 5.0);
    }

    #[test]
    fn test_error_messages() {
        let err = SntpPacket::from_bytes(&[0u8; 12]).unwrap_err();
        assert_eq!(err.to_string(), "Malformed packet: expected 48 bytes, got 12");

        let err = encode_li_vn_mode(0, 9, 0).unwrap_err();
        assert_eq!(err.to_string(), "li_vn_mode value 9 exceeds maximum of 7");
    }
}
