use crate::history::HistoryEntry;
use serde::{Deserialize, Serialize};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

/// Coarse freshness tier derived from the most recent scan. Never stored,
/// always recomputed from history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceStatus {
    Green,
    Yellow,
    Red,
}

impl DeviceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceStatus::Green => "green",
            DeviceStatus::Yellow => "yellow",
            DeviceStatus::Red => "red",
        }
    }
}

impl std::fmt::Display for DeviceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Derive the device status from a newest-first history list.
///
/// Empty history is red. Otherwise the whole-day difference between `now`
/// and the newest entry decides: <=1 day green, <=7 days yellow, else red.
/// An unparseable newest date counts as stale.
pub fn derive_status(history: &[HistoryEntry], now: OffsetDateTime) -> DeviceStatus {
    let Some(newest) = history.first() else {
        return DeviceStatus::Red;
    };
    let Ok(last) = OffsetDateTime::parse(&newest.date, &Rfc3339) else {
        return DeviceStatus::Red;
    };
    let days = (now - last).whole_hours() / 24;
    if days <= 1 {
        DeviceStatus::Green
    } else if days <= 7 {
        DeviceStatus::Yellow
    } else {
        DeviceStatus::Red
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::target::TargetKind;
    use crate::verdict::{VerdictStats, VerdictStatus};
    use time::Duration;

    fn entry_at(date: OffsetDateTime) -> HistoryEntry {
        HistoryEntry {
            id: "0".into(),
            date: date.format(&Rfc3339).unwrap(),
            target: "example.com".into(),
            kind: TargetKind::Url,
            result: VerdictStats::default(),
            status: VerdictStatus::Clean,
        }
    }

    #[test]
    fn empty_history_is_red() {
        assert_eq!(derive_status(&[], OffsetDateTime::now_utc()), DeviceStatus::Red);
    }

    #[test]
    fn scan_just_now_is_green() {
        let now = OffsetDateTime::now_utc();
        assert_eq!(derive_status(&[entry_at(now)], now), DeviceStatus::Green);
    }

    #[test]
    fn scan_three_days_ago_is_yellow() {
        let now = OffsetDateTime::now_utc();
        let h = [entry_at(now - Duration::days(3))];
        assert_eq!(derive_status(&h, now), DeviceStatus::Yellow);
    }

    #[test]
    fn scan_ten_days_ago_is_red() {
        let now = OffsetDateTime::now_utc();
        let h = [entry_at(now - Duration::days(10))];
        assert_eq!(derive_status(&h, now), DeviceStatus::Red);
    }

    #[test]
    fn one_day_boundary_floors_hours() {
        let now = OffsetDateTime::now_utc();
        // 47 hours floors to 1 day: still green.
        let h = [entry_at(now - Duration::hours(47))];
        assert_eq!(derive_status(&h, now), DeviceStatus::Green);
        // 49 hours floors to 2 days: yellow.
        let h = [entry_at(now - Duration::hours(49))];
        assert_eq!(derive_status(&h, now), DeviceStatus::Yellow);
    }

    #[test]
    fn unparseable_newest_date_is_red() {
        let mut e = entry_at(OffsetDateTime::now_utc());
        e.date = "not-a-date".into();
        assert_eq!(derive_status(&[e], OffsetDateTime::now_utc()), DeviceStatus::Red);
    }
}
