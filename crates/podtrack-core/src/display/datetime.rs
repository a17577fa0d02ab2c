//! Upload time formatting.

use std::fmt;

use jiff::{tz::TimeZone, Timestamp};

/// Formats a `Timestamp` in the system timezone as `YYYY-MM-DD HH:MM TZ`.
pub struct LocalDateTime<'a>(pub &'a Timestamp);

impl fmt::Display for LocalDateTime<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let zoned = self.0.to_zoned(TimeZone::system());
        write!(f, "{}", zoned.strftime("%Y-%m-%d %H:%M %Z"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minute_precision() {
        let timestamp = Timestamp::from_second(1_709_287_230).unwrap();
        let output = LocalDateTime(&timestamp).to_string();

        let parts: Vec<_> = output.split(' ').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0].len(), "2024-03-01".len());
        assert_eq!(parts[1].len(), "10:00".len());
    }
}
