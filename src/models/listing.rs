use chrono::{Datelike, Duration, NaiveDate, TimeZone};
use serde::{Deserialize, Serialize};

/// Placeholder the leaderboard page yields when a field could not be read
pub const PLACEHOLDER: &str = "N/A";

/// A scraped leaderboard product entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Listing {
    /// 1-based position on the source page
    pub rank: u32,
    pub title: String,
    pub description: Option<String>,
    pub link: Option<String>,
    pub image: Option<String>,
    pub topics: Vec<String>,
    /// Leaderboard day in `Y/M/D` form
    pub date: String,
}

impl Listing {
    /// A listing without a real title cannot be persisted
    pub fn has_title(&self) -> bool {
        let title = self.title.trim();
        !title.is_empty() && title != PLACEHOLDER
    }
}

/// The calendar day a leaderboard represents
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LeaderboardDate(pub NaiveDate);

impl LeaderboardDate {
    /// The day before `now`, in `now`'s timezone
    pub fn yesterday<Tz: TimeZone>(now: &chrono::DateTime<Tz>) -> Self {
        Self(now.date_naive() - Duration::days(1))
    }

    /// Parse `YYYY-MM-DD` or `YYYY/M/D`
    pub fn parse(s: &str) -> Result<Self, String> {
        let s = s.trim();
        NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .or_else(|_| NaiveDate::parse_from_str(s, "%Y/%m/%d"))
            .map(Self)
            .map_err(|_| format!("Invalid date: '{}'. Expected YYYY-MM-DD or YYYY/M/D", s))
    }

    /// URL path segment without zero padding, e.g. "2024/3/7"
    pub fn path_segment(&self) -> String {
        format!("{}/{}/{}", self.0.year(), self.0.month(), self.0.day())
    }

    /// File-name friendly form, e.g. "2024-3-7"
    pub fn file_stem(&self) -> String {
        format!("{}-{}-{}", self.0.year(), self.0.month(), self.0.day())
    }
}

impl std::fmt::Display for LeaderboardDate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.path_segment())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn listing(title: &str) -> Listing {
        Listing {
            rank: 1,
            title: title.to_string(),
            description: None,
            link: None,
            image: None,
            topics: vec![],
            date: "2024/3/7".to_string(),
        }
    }

    #[test]
    fn test_has_title() {
        assert!(listing("Raycast").has_title());
        assert!(!listing("").has_title());
        assert!(!listing("   ").has_title());
        assert!(!listing("N/A").has_title());
    }

    #[test]
    fn test_path_segment_has_no_padding() {
        let date = LeaderboardDate(NaiveDate::from_ymd_opt(2024, 3, 7).unwrap());
        assert_eq!(date.path_segment(), "2024/3/7");
        assert_eq!(date.file_stem(), "2024-3-7");
        assert_eq!(date.to_string(), "2024/3/7");
    }

    #[test]
    fn test_yesterday_in_local_timezone() {
        // 2024-03-07 20:00 UTC is already 2024-03-08 03:00 in Ho Chi Minh City
        let utc = Utc.with_ymd_and_hms(2024, 3, 7, 20, 0, 0).unwrap();
        let local = utc.with_timezone(&chrono_tz::Asia::Ho_Chi_Minh);
        assert_eq!(LeaderboardDate::yesterday(&local).path_segment(), "2024/3/7");
        assert_eq!(LeaderboardDate::yesterday(&utc).path_segment(), "2024/3/6");
    }

    #[test]
    fn test_parse() {
        let expected = LeaderboardDate(NaiveDate::from_ymd_opt(2024, 1, 5).unwrap());
        assert_eq!(LeaderboardDate::parse("2024-01-05").unwrap(), expected);
        assert_eq!(LeaderboardDate::parse("2024/1/5").unwrap(), expected);
        assert!(LeaderboardDate::parse("yesterday").is_err());
    }
}
