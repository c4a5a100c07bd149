//! Conversions between elapsed plank time and the strings shown to or typed by users.

/// Shortest duration, in seconds, accepted for an attempt.
pub const MIN_DURATION_SECS: u32 = 1;
/// Longest duration, in seconds, accepted for an attempt (one hour).
pub const MAX_DURATION_SECS: u32 = 3600;

/// Render whole seconds as `mm:ss`, or `h:mm:ss` from one hour upwards.
pub fn format(seconds: u64) -> String {
    let hours = seconds / 3600;
    let mins = (seconds % 3600) / 60;
    let secs = seconds % 60;

    if hours > 0 {
        format!("{hours}:{mins:02}:{secs:02}")
    } else {
        format!("{mins:02}:{secs:02}")
    }
}

/// Render milliseconds as `mm:ss.cc` for the running timer display.
///
/// There is no hour component: minutes keep counting past 59.
pub fn format_with_centiseconds(millis: u64) -> String {
    let total_secs = millis / 1000;
    let mins = total_secs / 60;
    let secs = total_secs % 60;
    let centis = (millis % 1000) / 10;
    format!("{mins:02}:{secs:02}.{centis:02}")
}

/// Parse user input into whole seconds.
///
/// Accepts `m:ss` / `mm:ss` (seconds below 60) or a bare number of seconds,
/// after trimming surrounding whitespace.
///
/// ```
/// use plank_back::duration::parse;
///
/// assert_eq!(parse("1:30"), Some(90));
/// assert_eq!(parse(" 90 "), Some(90));
/// assert_eq!(parse("1:60"), None);
/// ```
pub fn parse(input: &str) -> Option<u32> {
    let trimmed = input.trim();

    if let Some((mins, secs)) = trimmed.split_once(':') {
        if mins.is_empty() || mins.len() > 2 || !all_digits(mins) {
            return None;
        }
        if secs.len() != 2 || !all_digits(secs) {
            return None;
        }
        let mins: u32 = mins.parse().ok()?;
        let secs: u32 = secs.parse().ok()?;
        if secs >= 60 {
            return None;
        }
        return Some(mins * 60 + secs);
    }

    if trimmed.is_empty() || !all_digits(trimmed) {
        return None;
    }
    trimmed.parse().ok()
}

/// Whether `seconds` is an acceptable attempt duration.
pub fn is_valid(seconds: u32) -> bool {
    (MIN_DURATION_SECS..=MAX_DURATION_SECS).contains(&seconds)
}

fn all_digits(value: &str) -> bool {
    value.bytes().all(|b| b.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_pads_minutes_and_seconds() {
        assert_eq!(format(0), "00:00");
        assert_eq!(format(5), "00:05");
        assert_eq!(format(90), "01:30");
        assert_eq!(format(3599), "59:59");
    }

    #[test]
    fn format_switches_to_hours_at_one_hour() {
        assert_eq!(format(3600), "1:00:00");
        assert_eq!(format(3661), "1:01:01");
        assert_eq!(format(359_999), "99:59:59");
    }

    #[test]
    fn format_with_centiseconds_floors_sub_second_part() {
        assert_eq!(format_with_centiseconds(0), "00:00.00");
        assert_eq!(format_with_centiseconds(9), "00:00.00");
        assert_eq!(format_with_centiseconds(1_234), "00:01.23");
        assert_eq!(format_with_centiseconds(61_999), "01:01.99");
        assert_eq!(format_with_centiseconds(3_600_000), "60:00.00");
    }

    #[test]
    fn parse_accepts_documented_shapes() {
        assert_eq!(parse("1:30"), Some(90));
        assert_eq!(parse("01:30"), Some(90));
        assert_eq!(parse("90"), Some(90));
        assert_eq!(parse("0"), Some(0));
        assert_eq!(parse("  2:05\n"), Some(125));
        assert_eq!(parse("99:59"), Some(5999));
    }

    #[test]
    fn parse_rejects_everything_else() {
        assert_eq!(parse("1:60"), None);
        assert_eq!(parse(""), None);
        assert_eq!(parse("   "), None);
        assert_eq!(parse("abc"), None);
        assert_eq!(parse("1:5"), None);
        assert_eq!(parse("100:00"), None);
        assert_eq!(parse(":30"), None);
        assert_eq!(parse("1:30:00"), None);
        assert_eq!(parse("-5"), None);
        assert_eq!(parse("+5"), None);
        assert_eq!(parse("1.5"), None);
        assert_eq!(parse("99999999999"), None);
    }

    #[test]
    fn parse_inverts_format_below_one_hour() {
        for seconds in 0..MAX_DURATION_SECS {
            assert_eq!(parse(&format(seconds.into())), Some(seconds), "seconds = {seconds}");
        }
    }

    #[test]
    fn hour_form_is_not_parseable() {
        assert_eq!(parse(&format(3600)), None);
    }

    #[test]
    fn validity_bounds() {
        assert!(!is_valid(0));
        assert!(is_valid(1));
        assert!(is_valid(3600));
        assert!(!is_valid(3601));
    }
}
