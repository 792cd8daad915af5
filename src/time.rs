//! NTP timestamp format (RFC 5905 Section 6) and clock sources.
//!
//! An NTP timestamp is a pair of unsigned 32-bit integers: whole seconds since
//! 1900-01-01T00:00:00Z and a binary fraction of a second (`fraction / 2^32`).

use std::fmt;

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Seconds between the NTP epoch (1900-01-01) and the Unix epoch (1970-01-01).
pub const NTP_UNIX_OFFSET: i64 = 2208988800;

/// Unix timestamp of the NTP epoch, 1900-01-01T00:00:00Z.
pub const NTP_EPOCH_UNIX: i64 = -NTP_UNIX_OFFSET;

/// Number of fraction units in one second.
pub const FRACTION_SCALE: f64 = 4_294_967_296.0;

/// Errors produced when a calendar time cannot be expressed as an NTP timestamp.
#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum TimeError {
    /// The input was NaN or infinite.
    #[error("Timestamp is not a finite number")]
    NotFinite,
    /// The input falls before 1900-01-01 or past the end of NTP era 0 (2036-02-07).
    #[error("Unix time {0} is outside the NTP era 0 range")]
    OutOfRange(f64),
}

/// 64-bit NTP timestamp kept as its two wire halves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct NtpTimestamp {
    /// Whole seconds since 1900-01-01T00:00:00Z.
    pub seconds: u32,
    /// Sub-second part in units of 2^-32 seconds.
    pub fraction: u32,
}

impl NtpTimestamp {
    /// The NTP epoch itself, also used for "unset" timestamps.
    pub const ZERO: NtpTimestamp = NtpTimestamp {
        seconds: 0,
        fraction: 0,
    };

    pub const fn new(seconds: u32, fraction: u32) -> Self {
        Self { seconds, fraction }
    }

    /// Converts a Unix timestamp with sub-second precision.
    ///
    /// # Errors
    /// See [`encode_ntp_timestamp`].
    pub fn from_unix_seconds(unix: f64) -> Result<Self, TimeError> {
        encode_ntp_timestamp(unix)
    }

    /// Converts back to a Unix timestamp. See [`decode_ntp_timestamp`].
    #[must_use]
    pub fn to_unix_seconds(self) -> f64 {
        decode_ntp_timestamp(self.seconds, self.fraction)
    }

    /// Converts a chrono UTC date time, truncating below one fraction unit.
    ///
    /// # Errors
    /// Returns `TimeError::OutOfRange` for dates outside NTP era 0.
    pub fn from_datetime(date: DateTime<Utc>) -> Result<Self, TimeError> {
        let ntp_secs = date.timestamp() + NTP_UNIX_OFFSET;
        let seconds = u32::try_from(ntp_secs)
            .map_err(|_| TimeError::OutOfRange(date.timestamp() as f64))?;
        // Leap seconds report up to 1_999_999_999 ns
        let fraction = (((date.timestamp_subsec_nanos() as u64) << 32) / 1_000_000_000)
            .min(u32::MAX as u64);
        Ok(Self::new(seconds, fraction as u32))
    }

    /// Converts to a chrono UTC date time with nanosecond resolution.
    #[must_use]
    pub fn to_datetime(self) -> Option<DateTime<Utc>> {
        let secs = self.seconds as i64 - NTP_UNIX_OFFSET;
        let nanos = ((self.fraction as u64 * 1_000_000_000) >> 32) as u32;
        DateTime::<Utc>::from_timestamp(secs, nanos)
    }

    /// Wire form: seconds then fraction, both big-endian.
    #[must_use]
    pub fn to_be_bytes(self) -> [u8; 8] {
        let mut buf = [0u8; 8];
        buf[0..4].copy_from_slice(&self.seconds.to_be_bytes());
        buf[4..8].copy_from_slice(&self.fraction.to_be_bytes());
        buf
    }

    #[must_use]
    pub fn from_be_bytes(buf: [u8; 8]) -> Self {
        Self {
            seconds: u32::from_be_bytes([buf[0], buf[1], buf[2], buf[3]]),
            fraction: u32::from_be_bytes([buf[4], buf[5], buf[6], buf[7]]),
        }
    }
}

impl From<(u32, u32)> for NtpTimestamp {
    fn from((seconds, fraction): (u32, u32)) -> Self {
        Self::new(seconds, fraction)
    }
}

impl fmt::Display for NtpTimestamp {
    /// RFC 3339 UTC rendering, e.g. `2023-11-14T22:13:20.500000000Z`.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.to_datetime() {
            Some(dt) => write!(f, "{}", dt.to_rfc3339_opts(chrono::SecondsFormat::Nanos, true)),
            None => write!(f, "{}.{:010}", self.seconds, self.fraction),
        }
    }
}

/// Encodes a Unix timestamp (seconds since 1970, fractional part allowed) as NTP.
///
/// The fractional part is truncated, not rounded, to 32 bits.
///
/// # Errors
/// Returns `TimeError::NotFinite` for NaN or infinity and `TimeError::OutOfRange` when the
/// time lies before 1900-01-01T00:00:00Z or after 2036-02-07T06:28:15Z.
///
/// ```
/// use sntp_packet::time::encode_ntp_timestamp;
/// let ts = encode_ntp_timestamp(1_700_000_000.5).unwrap();
/// assert_eq!(ts.seconds, 3_908_988_800);
/// assert_eq!(ts.fraction, 2_147_483_648);
/// ```
pub fn encode_ntp_timestamp(unix: f64) -> Result<NtpTimestamp, TimeError> {
    if !unix.is_finite() {
        return Err(TimeError::NotFinite);
    }

    // Split before shifting epochs; `unix - whole` is exact in f64.
    let whole = unix.floor();
    let frac = unix - whole;

    let ntp_secs = whole + NTP_UNIX_OFFSET as f64;
    if ntp_secs < 0.0 || ntp_secs > u32::MAX as f64 {
        return Err(TimeError::OutOfRange(unix));
    }

    Ok(NtpTimestamp {
        seconds: ntp_secs as u32,
        fraction: (frac * FRACTION_SCALE).floor() as u32,
    })
}

/// Decodes an NTP seconds/fraction pair to a Unix timestamp.
pub fn decode_ntp_timestamp(seconds: u32, fraction: u32) -> f64 {
    (seconds as i64 - NTP_UNIX_OFFSET) as f64 + fraction as f64 / FRACTION_SCALE
}

/// Converts an NTP short-format (16.16 fixed point) value such as root delay to seconds.
pub fn fixed_16_16_to_seconds(value: u32) -> f64 {
    value as f64 / 65536.0
}

/// Source of the current wall-clock time.
pub trait Clock {
    /// Current time as Unix seconds with sub-second precision.
    fn now(&self) -> f64;
}

/// Clock backed by the operating system's UTC time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> f64 {
        let now = Utc::now();
        now.timestamp() as f64 + now.timestamp_subsec_nanos() as f64 / 1e9
    }
}

/// Clock that always reports the same instant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedClock(pub f64);

impl Clock for FixedClock {
    fn now(&self) -> f64 {
        self.0
    }
}
