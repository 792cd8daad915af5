//! SNTP packet codec - encoding and decoding of the 48-byte Simple Network Time
//! Protocol message (RFC 4330) and clock offset calculation.
//!
//! The crate performs no network I/O. Callers supply the transport and hand the
//! received bytes to [`packets::SntpPacket::from_bytes`].
//!
//! # Usage
//!
//! ```
//! use sntp_packet::packets::{build_client_request, SntpPacket};
//! use sntp_packet::time::NtpTimestamp;
//!
//! let request = build_client_request(1_700_000_000.5).unwrap();
//! let bytes = request.to_bytes().unwrap();
//! assert_eq!(bytes.len(), 48);
//!
//! let decoded = SntpPacket::from_bytes(&bytes).unwrap();
//! assert_eq!(decoded.transmit_timestamp, NtpTimestamp::new(3_908_988_800, 1 << 31));
//! ```

/// Command-line configuration and validation.
pub mod configuration;
/// Leap indicator and association mode names.
pub mod modes;
/// Clock offset calculation.
pub mod offset;
/// SNTP packet structure and serialization.
pub mod packets;
/// Packet reports in text, JSON and CSV.
pub mod report;
/// NTP timestamp format and clock sources.
pub mod time;
