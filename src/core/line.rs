//! Line format
//!
//! Every emitted line is `<date> <time> <module> <message>\n`, where the time
//! carries microseconds. Consumers split lines on spaces, so the prefix layout
//! must stay fixed.

use chrono::{DateTime, TimeZone};
use std::fmt::{self, Display, Write as _};

/// strftime layout of the date and time fields
pub const LINE_TIMESTAMP_FORMAT: &str = "%Y/%m/%d %H:%M:%S%.6f";

/// Render one log line, including the trailing newline.
///
/// Newlines, carriage returns and tabs in the message are escaped so a single
/// call can never produce more than one line. Backslashes are doubled, which
/// keeps the escaping reversible: `\n` in a line is always an escaped newline,
/// `\\n` a literal backslash followed by `n`.
pub fn format_line<Tz>(timestamp: &DateTime<Tz>, module: &str, message: &dyn Display) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let mut line = String::with_capacity(64 + module.len());
    // Writing into a String cannot fail
    let _ = write!(
        line,
        "{} {} ",
        timestamp.format(LINE_TIMESTAMP_FORMAT),
        module
    );
    let _ = write!(Sanitizer(&mut line), "{}", message);
    line.push('\n');
    line
}

/// Escapes control characters while the message is formatted, avoiding a
/// second pass over the rendered text.
struct Sanitizer<'a>(&'a mut String);

impl fmt::Write for Sanitizer<'_> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        for c in s.chars() {
            match c {
                '\n' => self.0.push_str("\\n"),
                '\r' => self.0.push_str("\\r"),
                '\t' => self.0.push_str("\\t"),
                '\\' => self.0.push_str("\\\\"),
                c => self.0.push(c),
            }
        }
        Ok(())
    }
}

/// Displays a sequence of values separated by single spaces.
///
/// Used by the logging macros to accept any number of arguments.
///
/// ```
/// use lll_logger::Joined;
///
/// let port = 8080;
/// let joined = Joined(&[&"listening on", &port]);
/// assert_eq!(joined.to_string(), "listening on 8080");
/// ```
pub struct Joined<'a>(pub &'a [&'a dyn Display]);

impl Display for Joined<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, part) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            part.fmt(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Local, NaiveDate, Utc};

    fn fixed_datetime() -> DateTime<Utc> {
        NaiveDate::from_ymd_opt(2024, 3, 9)
            .unwrap()
            .and_hms_micro_opt(7, 5, 2, 42)
            .unwrap()
            .and_utc()
    }

    #[test]
    fn test_line_layout() {
        let line = format_line(&fixed_datetime(), "TEST", &"hi0");
        assert_eq!(line, "2024/03/09 07:05:02.000042 TEST hi0\n");
    }

    #[test]
    fn test_four_fields() {
        let line = format_line(&Local::now(), "conn", &"accepted");
        let fields: Vec<&str> = line.trim_end_matches('\n').split(' ').collect();
        assert_eq!(fields.len(), 4);
        assert_eq!(fields[2], "conn");
        assert_eq!(fields[3], "accepted");
        assert_eq!(fields[1].split('.').nth(1).map(str::len), Some(6));
    }

    #[test]
    fn test_control_characters_escaped() {
        let line = format_line(&fixed_datetime(), "TEST", &"a\nb\r\tc");
        assert_eq!(line, "2024/03/09 07:05:02.000042 TEST a\\nb\\r\\tc\n");
        assert_eq!(line.matches('\n').count(), 1);
    }

    #[test]
    fn test_backslash_escaped() {
        let literal = format_line(&fixed_datetime(), "TEST", &"path\\name");
        assert_eq!(literal, "2024/03/09 07:05:02.000042 TEST path\\\\name\n");

        // A literal backslash-n and a real newline render differently
        let escaped = format_line(&fixed_datetime(), "TEST", &"a\nb");
        let verbatim = format_line(&fixed_datetime(), "TEST", &"a\\nb");
        assert_eq!(escaped, "2024/03/09 07:05:02.000042 TEST a\\nb\n");
        assert_eq!(verbatim, "2024/03/09 07:05:02.000042 TEST a\\\\nb\n");
        assert_ne!(escaped, verbatim);
    }

    #[test]
    fn test_joined() {
        assert_eq!(Joined(&[]).to_string(), "");
        assert_eq!(Joined(&[&"one"]).to_string(), "one");
        assert_eq!(Joined(&[&"read", &42, &'b', &1.5]).to_string(), "read 42 b 1.5");
    }
}
