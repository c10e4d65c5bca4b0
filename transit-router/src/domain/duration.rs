//! Human-readable trip durations.

/// Round a duration in minutes up to a whole number of minutes.
///
/// Negative and non-finite inputs are treated as zero.
pub fn whole_minutes(minutes: f64) -> u32 {
    if !minutes.is_finite() || minutes <= 0.0 {
        return 0;
    }
    let rounded = minutes.ceil();
    if rounded >= f64::from(u32::MAX) {
        u32::MAX
    } else {
        rounded as u32
    }
}

/// Format a duration for display.
///
/// Durations under an hour render as `"<n> min"`, longer ones as
/// `"<h> h <m> min"`. Fractional minutes are rounded up.
///
/// # Examples
///
/// ```
/// use transit_router::domain::format_duration;
///
/// assert_eq!(format_duration(45.0), "45 min");
/// assert_eq!(format_duration(65.0), "1 h 5 min");
/// assert_eq!(format_duration(120.0), "2 h 0 min");
/// assert_eq!(format_duration(2.5), "3 min");
/// ```
pub fn format_duration(minutes: f64) -> String {
    let minutes = whole_minutes(minutes);
    if minutes < 60 {
        return format!("{minutes} min");
    }
    format!("{} h {} min", minutes / 60, minutes % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn under_an_hour() {
        assert_eq!(format_duration(0.0), "0 min");
        assert_eq!(format_duration(45.0), "45 min");
        assert_eq!(format_duration(59.0), "59 min");
    }

    #[test]
    fn hours_and_minutes() {
        assert_eq!(format_duration(60.0), "1 h 0 min");
        assert_eq!(format_duration(65.0), "1 h 5 min");
        assert_eq!(format_duration(120.0), "2 h 0 min");
        assert_eq!(format_duration(185.0), "3 h 5 min");
    }

    #[test]
    fn fractions_round_up() {
        assert_eq!(format_duration(59.2), "1 h 0 min");
        assert_eq!(format_duration(0.5), "1 min");
        assert_eq!(whole_minutes(4.0), 4);
        assert_eq!(whole_minutes(4.01), 5);
    }

    #[test]
    fn degenerate_inputs() {
        assert_eq!(whole_minutes(-3.0), 0);
        assert_eq!(whole_minutes(f64::NAN), 0);
        assert_eq!(format_duration(f64::INFINITY), "0 min");
    }
}
