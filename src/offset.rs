//! Clock offset from a four-timestamp client/server exchange.

use crate::time::{NtpTimestamp, FRACTION_SCALE};

/// Estimates the offset of the server clock relative to the client clock, in seconds.
///
/// * `t1` - client transmit time
/// * `t2` - server receive time
/// * `t3` - server transmit time
/// * `t4` - client receive time
///
/// offset = ((t2 - t1) + (t3 - t4)) / 2
///
/// Seconds and fractions are subtracted separately in signed 64-bit arithmetic, so the
/// result is defined for any input. Network delay is assumed symmetric; round-trip delay
/// is not computed here.
///
/// ```
/// use sntp_packet::offset::compute_offset;
/// use sntp_packet::time::NtpTimestamp;
/// let zero = NtpTimestamp::new(0, 0);
/// let one = NtpTimestamp::new(1, 0);
/// assert_eq!(compute_offset(zero, one, one, zero), 1.0);
/// ```
pub fn compute_offset(
    t1: NtpTimestamp,
    t2: NtpTimestamp,
    t3: NtpTimestamp,
    t4: NtpTimestamp,
) -> f64 {
    let theta1 = difference(t2, t1);
    let theta2 = difference(t3, t4);
    (theta1 + theta2) / 2.0
}

fn difference(a: NtpTimestamp, b: NtpTimestamp) -> f64 {
    let seconds = a.seconds as i64 - b.seconds as i64;
    let fraction = a.fraction as i64 - b.fraction as i64;
    seconds as f64 + fraction as f64 / FRACTION_SCALE
}
