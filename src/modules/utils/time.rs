use chrono::{DateTime, Local, Utc};

/// Format a stored timestamp as a readable UTC date
pub fn format_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Convert a stored UTC timestamp to a local time string
pub fn utc_to_local(timestamp: &DateTime<Utc>) -> String {
    let local_time: DateTime<Local> = DateTime::from(*timestamp);
    local_time.format("%Y-%m-%d %H:%M:%S %Z").to_string()
}

/// Format a duration in seconds as a coarse human readable string
pub fn format_duration(seconds: i64) -> String {
    if seconds < 60 {
        format!("{} seconds", seconds)
    } else if seconds < 3600 {
        format!("{} minutes", seconds / 60)
    } else if seconds < 86400 {
        format!("{} hours", seconds / 3600)
    } else {
        format!("{} days", seconds / 86400)
    }
}

/// How long ago `timestamp` was, e.g. "5 minutes ago"
pub fn time_since(timestamp: &DateTime<Utc>) -> String {
    let elapsed = (Utc::now() - *timestamp).num_seconds().max(0);
    format!("{} ago", format_duration(elapsed))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    #[test]
    fn test_timestamp_formatting() {
        let timestamp = Utc.with_ymd_and_hms(2021, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(format_timestamp(&timestamp), "2021-01-01 00:00:00");
    }

    #[test]
    fn test_duration_formatting() {
        assert_eq!(format_duration(30), "30 seconds");
        assert_eq!(format_duration(90), "1 minutes");
        assert_eq!(format_duration(3600), "1 hours");
        assert_eq!(format_duration(86400), "1 days");
    }

    #[test]
    fn test_time_since() {
        let two_hours_ago = Utc::now() - Duration::hours(2);
        assert_eq!(time_since(&two_hours_ago), "2 hours ago");

        // Clock skew into the future reads as zero
        let ahead = Utc::now() + Duration::minutes(5);
        assert_eq!(time_since(&ahead), "0 seconds ago");
    }

    #[test]
    fn test_utc_to_local() {
        let local_time = utc_to_local(&Utc::now());
        assert!(local_time.contains(':'));
        assert!(local_time.len() > 15);
    }
}
