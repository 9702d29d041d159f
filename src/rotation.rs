use std::path::{Path, PathBuf};

use serde::{Deserialize, Deserializer, Serialize};
use time::{Date, Duration, OffsetDateTime};

/// Extension shared by every file the logger writes.
pub const LOG_EXTENSION: &str = "log";

/// Calendar granularity for log rotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Rotation {
    /// Rotate when the calendar day changes.
    #[default]
    Daily,
    /// Rotate when the ISO-8601 week changes.
    Weekly,
    /// Rotate when the calendar month changes.
    Monthly,
    /// Never rotate. Unrecognized granularity names map here.
    Never,
}

impl From<&str> for Rotation {
    fn from(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "daily" => Self::Daily,
            "weekly" => Self::Weekly,
            "monthly" => Self::Monthly,
            _ => Self::Never,
        }
    }
}

impl<'de> Deserialize<'de> for Rotation {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let name = String::deserialize(deserializer)?;
        Ok(Rotation::from(name.as_str()))
    }
}

impl Rotation {
    /// Date stamp naming the period `date` belongs to.
    ///
    /// Daily and unrecognized granularities use the day itself (`YYYYMMDD`),
    /// weekly uses the Monday of the week (`YYYYMMDD`) and monthly uses
    /// `YYYYMM`.
    pub fn period_stamp(&self, date: Date) -> String {
        match self {
            Self::Weekly => day_stamp(monday_of(date)),
            Self::Monthly => format!("{:04}{:02}", date.year(), u8::from(date.month())),
            Self::Daily | Self::Never => day_stamp(date),
        }
    }
}

/// Decide whether a write at `now` belongs to a different period than `last`.
///
/// Each timestamp is compared in its own offset, so callers pass local time
/// to get local calendar boundaries.
pub fn should_rotate(now: OffsetDateTime, last: Option<OffsetDateTime>, rotation: Rotation) -> bool {
    let Some(last) = last else {
        return true;
    };
    let (now, last) = (now.date(), last.date());

    match rotation {
        Rotation::Daily => now != last,
        Rotation::Weekly => iso_week(now) != iso_week(last),
        Rotation::Monthly => now.year() != last.year() || now.month() != last.month(),
        Rotation::Never => false,
    }
}

/// Canonical file name for `date` under `rotation`.
pub fn file_name_for(base_name: &str, rotation: Rotation, date: Date) -> String {
    LogFileName::for_date(rotation, date).render(base_name)
}

/// [`file_name_for`] joined with the log directory.
pub fn log_file_path(directory: &Path, base_name: &str, rotation: Rotation, date: Date) -> PathBuf {
    directory.join(file_name_for(base_name, rotation, date))
}

/// ISO-8601 `(week-year, week)` of `date`.
///
/// The date is moved to the Thursday of its Monday-based week; that Thursday
/// decides the week-year, and week 1 is the week holding January 4, whose
/// Thursday always falls on one of the first seven days of the year.
pub fn iso_week(date: Date) -> (i32, u8) {
    let shift = 3 - i64::from(date.weekday().number_days_from_monday());
    let thursday = date.saturating_add(Duration::days(shift));
    let week = (thursday.ordinal() - 1) / 7 + 1;
    (thursday.year(), week as u8)
}

/// Monday of the week `date` falls in (Sunday counts as day 7).
pub fn monday_of(date: Date) -> Date {
    let back = i64::from(date.weekday().number_days_from_monday());
    date.saturating_sub(Duration::days(back))
}

fn day_stamp(date: Date) -> String {
    format!(
        "{:04}{:02}{:02}",
        date.year(),
        u8::from(date.month()),
        date.day()
    )
}

/// Identity of one log file: the period stamp plus a size-rollover sequence.
///
/// Sequence 0 is the period's base file `{base}-{stamp}.log`; rollovers are
/// named `{base}-{stamp}.{n}.log`. The derived ordering is chronological.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LogFileName {
    /// Period stamp (`YYYYMMDD` or `YYYYMM`).
    pub stamp: String,
    /// Size-rollover sequence within the period.
    pub sequence: u32,
}

impl LogFileName {
    /// Base file of the period `date` belongs to.
    pub fn for_date(rotation: Rotation, date: Date) -> Self {
        Self {
            stamp: rotation.period_stamp(date),
            sequence: 0,
        }
    }

    /// The rollover successor in the same period.
    pub fn next(&self) -> Self {
        Self {
            stamp: self.stamp.clone(),
            sequence: self.sequence.saturating_add(1),
        }
    }

    /// Render the on-disk file name.
    pub fn render(&self, base_name: &str) -> String {
        if self.sequence == 0 {
            format!("{}-{}.{}", base_name, self.stamp, LOG_EXTENSION)
        } else {
            format!(
                "{}-{}.{}.{}",
                base_name, self.stamp, self.sequence, LOG_EXTENSION
            )
        }
    }

    /// Recognise a file written for `base_name`.
    ///
    /// Only `{base}-{stamp}.log` and `{base}-{stamp}.{n}.log` match, where the
    /// stamp is six or eight ASCII digits. Files of another base name that
    /// merely starts with `{base}-` are rejected.
    pub fn parse(base_name: &str, file_name: &str) -> Option<Self> {
        let rest = file_name
            .strip_prefix(base_name)?
            .strip_prefix('-')?
            .strip_suffix(LOG_EXTENSION)?
            .strip_suffix('.')?;

        let (stamp, sequence) = match rest.split_once('.') {
            Some((stamp, sequence)) => {
                if sequence.is_empty() || !sequence.bytes().all(|b| b.is_ascii_digit()) {
                    return None;
                }
                (stamp, sequence.parse::<u32>().ok()?)
            }
            None => (rest, 0),
        };

        if !matches!(stamp.len(), 6 | 8) || !stamp.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }

        Some(Self {
            stamp: stamp.to_string(),
            sequence,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::{date, datetime};

    #[test]
    fn test_first_decision_always_rotates() {
        let now = datetime!(2024-03-15 10:00 UTC);
        assert!(should_rotate(now, None, Rotation::Daily));
        assert!(should_rotate(now, None, Rotation::Weekly));
        assert!(should_rotate(now, None, Rotation::Monthly));
        assert!(should_rotate(now, None, Rotation::Never));
    }

    #[test]
    fn test_daily_rotation() {
        let morning = datetime!(2024-03-15 00:00:01 UTC);
        let night = datetime!(2024-03-15 23:59:59 UTC);
        assert!(!should_rotate(night, Some(morning), Rotation::Daily));

        let next_day = datetime!(2024-03-16 00:00 UTC);
        assert!(should_rotate(next_day, Some(night), Rotation::Daily));

        // Same day-of-month, different month
        let next_month = datetime!(2024-04-15 10:00 UTC);
        assert!(should_rotate(next_month, Some(morning), Rotation::Daily));

        // Same day and month, different year
        let next_year = datetime!(2025-03-15 10:00 UTC);
        assert!(should_rotate(next_year, Some(morning), Rotation::Daily));
    }

    #[test]
    fn test_daily_rotation_uses_each_offset() {
        // 23:30 at +02:00 is still the 15th locally even though UTC says 21:30.
        let late = datetime!(2024-03-15 23:30 +2);
        let early = datetime!(2024-03-15 00:30 +2);
        assert!(!should_rotate(late, Some(early), Rotation::Daily));

        let after_midnight = datetime!(2024-03-16 00:10 +2);
        assert!(should_rotate(after_midnight, Some(late), Rotation::Daily));
    }

    #[test]
    fn test_weekly_rotation() {
        let week1 = datetime!(2024-01-01 09:00 UTC);
        let week2 = datetime!(2024-01-08 09:00 UTC);
        assert!(should_rotate(week2, Some(week1), Rotation::Weekly));

        // Monday through Sunday is one week
        let sunday = datetime!(2024-01-07 23:00 UTC);
        assert!(!should_rotate(sunday, Some(week1), Rotation::Weekly));

        // 2024-12-31 and 2025-01-01 are both in 2025-W01
        let tuesday = datetime!(2024-12-31 12:00 UTC);
        let wednesday = datetime!(2025-01-01 12:00 UTC);
        assert!(!should_rotate(wednesday, Some(tuesday), Rotation::Weekly));

        // 2023-12-31 is the Sunday closing 2023-W52
        let sunday = datetime!(2023-12-31 12:00 UTC);
        assert!(should_rotate(week1, Some(sunday), Rotation::Weekly));
    }

    #[test]
    fn test_monthly_rotation() {
        let last = datetime!(2024-01-31 23:59 UTC);
        let now = datetime!(2024-02-01 00:00 UTC);
        assert!(should_rotate(now, Some(last), Rotation::Monthly));

        let first = datetime!(2024-01-01 00:00 UTC);
        assert!(!should_rotate(last, Some(first), Rotation::Monthly));

        let next_year = datetime!(2025-01-15 00:00 UTC);
        assert!(should_rotate(next_year, Some(first), Rotation::Monthly));
    }

    #[test]
    fn test_never_rotation() {
        let last = datetime!(2020-01-01 00:00 UTC);
        let now = datetime!(2024-06-01 00:00 UTC);
        assert!(!should_rotate(now, Some(last), Rotation::Never));
    }

    #[test]
    fn test_iso_week_matches_calendar() {
        let mut day = date!(2014 - 12 - 20);
        for _ in 0..(366 * 12) {
            let (year, week, _) = day.to_iso_week_date();
            assert_eq!(iso_week(day), (year, week), "iso week of {}", day);
            day = day.next_day().unwrap();
        }
    }

    #[test]
    fn test_iso_week_known_values() {
        assert_eq!(iso_week(date!(2024 - 01 - 01)), (2024, 1));
        assert_eq!(iso_week(date!(2023 - 12 - 31)), (2023, 52));
        assert_eq!(iso_week(date!(2020 - 12 - 31)), (2020, 53));
        assert_eq!(iso_week(date!(2021 - 01 - 03)), (2020, 53));
        assert_eq!(iso_week(date!(2025 - 01 - 01)), (2025, 1));
    }

    #[test]
    fn test_file_names() {
        let friday = date!(2024 - 03 - 15);
        assert_eq!(
            file_name_for("app", Rotation::Daily, friday),
            "app-20240315.log"
        );
        assert_eq!(
            file_name_for("app", Rotation::Weekly, friday),
            "app-20240311.log"
        );
        assert_eq!(
            file_name_for("app", Rotation::Monthly, friday),
            "app-202403.log"
        );
        assert_eq!(
            file_name_for("app", Rotation::Never, friday),
            "app-20240315.log"
        );
    }

    #[test]
    fn test_weekly_file_name_uses_monday() {
        let sunday = date!(2024 - 03 - 17);
        let monday = date!(2024 - 03 - 11);
        assert_eq!(monday_of(sunday), monday);
        assert_eq!(monday_of(monday), monday);
        assert_eq!(
            file_name_for("security", Rotation::Weekly, sunday),
            "security-20240311.log"
        );

        // The week straddling new year is named after the December Monday.
        assert_eq!(
            file_name_for("app", Rotation::Weekly, date!(2025 - 01 - 01)),
            "app-20241230.log"
        );
    }

    #[test]
    fn test_file_name_is_deterministic() {
        let day = date!(2024 - 07 - 04);
        let first = log_file_path(Path::new("./logs"), "app", Rotation::Daily, day);
        let second = log_file_path(Path::new("./logs"), "app", Rotation::Daily, day);
        assert_eq!(first, second);
        assert_eq!(first, Path::new("./logs").join("app-20240704.log"));
    }

    #[test]
    fn test_log_file_name_sequence() {
        let base = LogFileName::for_date(Rotation::Daily, date!(2024 - 01 - 01));
        assert_eq!(base.render("app"), "app-20240101.log");

        let next = base.next();
        assert_eq!(next.render("app"), "app-20240101.1.log");
        assert_eq!(next.next().render("app"), "app-20240101.2.log");
    }

    #[test]
    fn test_log_file_name_parse() {
        assert_eq!(
            LogFileName::parse("app", "app-20240101.log"),
            Some(LogFileName {
                stamp: "20240101".to_string(),
                sequence: 0
            })
        );
        assert_eq!(
            LogFileName::parse("app", "app-202401.12.log"),
            Some(LogFileName {
                stamp: "202401".to_string(),
                sequence: 12
            })
        );
        assert_eq!(LogFileName::parse("app", "app-20240101.txt"), None);
        assert_eq!(LogFileName::parse("app", "other-20240101.log"), None);
        assert_eq!(LogFileName::parse("app", "app-.log"), None);
        assert_eq!(LogFileName::parse("app", "application.log"), None);
    }

    #[test]
    fn test_log_file_name_parse_rejects_other_bases() {
        assert_eq!(LogFileName::parse("app", "app-audit-20240101.log"), None);
        assert_eq!(LogFileName::parse("app", "app-audit.log"), None);
        assert_eq!(LogFileName::parse("app", "app-2024010.log"), None);
        assert_eq!(LogFileName::parse("app", "app-20240101.x.log"), None);
        assert_eq!(LogFileName::parse("app", "app-20240101..log"), None);
        assert_eq!(LogFileName::parse("app", "app-20240101.1.2.log"), None);
    }

    #[test]
    fn test_log_file_name_ordering_is_chronological() {
        let mut names: Vec<_> = [
            "app-20240102.log",
            "app-20240101.10.log",
            "app-20240101.log",
            "app-20240101.2.log",
        ]
        .iter()
        .filter_map(|name| LogFileName::parse("app", name))
        .collect();
        names.sort();

        let rendered: Vec<_> = names.iter().map(|n| n.render("app")).collect();
        assert_eq!(
            rendered,
            vec![
                "app-20240101.log",
                "app-20240101.2.log",
                "app-20240101.10.log",
                "app-20240102.log",
            ]
        );
    }

    #[test]
    fn test_rotation_deserialize() {
        let rotation: Rotation = serde_yaml::from_str("weekly").unwrap();
        assert_eq!(rotation, Rotation::Weekly);

        let rotation: Rotation = serde_yaml::from_str("Monthly").unwrap();
        assert_eq!(rotation, Rotation::Monthly);

        // Unknown granularities disable rotation instead of failing
        let rotation: Rotation = serde_yaml::from_str("hourly").unwrap();
        assert_eq!(rotation, Rotation::Never);
    }

    #[test]
    fn test_rotation_from_str() {
        assert_eq!(Rotation::from("daily"), Rotation::Daily);
        assert_eq!(Rotation::from(" WEEKLY "), Rotation::Weekly);
        assert_eq!(Rotation::from("yearly"), Rotation::Never);
        assert_eq!(Rotation::default(), Rotation::Daily);
    }
}
