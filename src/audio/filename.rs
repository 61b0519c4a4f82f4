//! Naming of stored uploads.
//!
//! Files are named after the server's local wall-clock time, to the second:
//! `DD_MM_YYYY_HH_MM_SS.wav`. Two uploads landing in the same second share a
//! name and the later write wins.

use chrono::{DateTime, Local, TimeZone};

const FILENAME_FORMAT: &str = "%d_%m_%Y_%H_%M_%S.wav";

/// Filename for an upload handled right now.
pub fn upload_filename() -> String {
    filename_at(&Local::now())
}

/// Filename for an upload handled at `time`.
pub fn filename_at<Tz: TimeZone>(time: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    time.format(FILENAME_FORMAT).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, Utc};

    #[test]
    fn test_filename_is_zero_padded() {
        let time = Utc.with_ymd_and_hms(2024, 3, 7, 4, 5, 9).unwrap();
        assert_eq!(filename_at(&time), "07_03_2024_04_05_09.wav");
    }

    #[test]
    fn test_filename_uses_given_offset() {
        let offset = FixedOffset::east_opt(2 * 3600).unwrap();
        let time = offset.with_ymd_and_hms(2023, 12, 31, 23, 59, 58).unwrap();
        assert_eq!(filename_at(&time), "31_12_2023_23_59_58.wav");
    }

    #[test]
    fn test_current_filename_shape() {
        let name = upload_filename();
        assert!(name.ends_with(".wav"));
        assert_eq!(name.len(), "DD_MM_YYYY_HH_MM_SS.wav".len());
        assert_eq!(name.matches('_').count(), 5);
    }
}
