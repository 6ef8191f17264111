//! Timetable offsets are whole minutes since midnight; the feed wants
//! `HH:MM:SS` strings.

/// Value a missing arrival or departure decodes to.
pub const ZERO_TIME: &str = "00:00:00";

/// `610` becomes `10:10:00`, `301` becomes `05:01:00`.
///
/// Offsets past midnight keep counting hours (`1500` is `25:00:00`), which is
/// how the feed expresses services running after midnight.
pub fn minutes_to_time(minutes: u32) -> String {
    format!("{:02}:{:02}:00", minutes / 60, minutes % 60)
}

/// Decodes an offset field. Anything that is not a number, including an
/// empty field, is treated as the zero sentinel.
pub fn decode_time(offset: &str) -> String {
    minutes_to_time(offset.trim().parse().unwrap_or(0))
}
