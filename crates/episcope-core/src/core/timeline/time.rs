//! Time formatting for reports and playback displays

use crate::core::TimeMs;

/// Formats milliseconds as `mm:ss`.
///
/// Minutes are not wrapped into hours, so one hour reads `60:00`.
pub fn format_minutes_seconds(millis: TimeMs) -> String {
    let total_secs = millis.div_euclid(1000);
    let mins = total_secs.div_euclid(60);
    let secs = total_secs.rem_euclid(60);

    format!("{:02}:{:02}", mins, secs)
}

/// Formats milliseconds as `hh:mm:ss` (playback clock)
pub fn format_clock(millis: TimeMs) -> String {
    let total_secs = millis.div_euclid(1000);
    let secs = total_secs.rem_euclid(60);
    let total_mins = total_secs.div_euclid(60);
    let mins = total_mins.rem_euclid(60);
    let hours = total_mins.div_euclid(60);

    format!("{:02}:{:02}:{:02}", hours, mins, secs)
}
