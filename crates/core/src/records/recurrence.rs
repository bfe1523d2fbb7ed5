//! Recurrence rules and per-occurrence evaluation.

use std::str::FromStr;

use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use serde_yaml::Value;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown recurrence frequency '{0}'")]
pub struct UnknownFrequency(pub String);

impl FromStr for Frequency {
    type Err = UnknownFrequency;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "daily" => Ok(Self::Daily),
            "weekly" => Ok(Self::Weekly),
            "monthly" => Ok(Self::Monthly),
            "yearly" | "annually" => Ok(Self::Yearly),
            _ => Err(UnknownFrequency(s.to_string())),
        }
    }
}

/// A structured recurrence rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recurrence {
    pub frequency: Frequency,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub days_of_week: Vec<Weekday>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub day_of_month: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub month_of_year: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct RawRecurrence {
    frequency: String,
    #[serde(default)]
    days_of_week: Vec<String>,
    #[serde(default)]
    day_of_month: Option<u32>,
    #[serde(default)]
    month_of_year: Option<u32>,
}

impl Recurrence {
    /// Read a rule from a frontmatter value. Returns `None` when the value is
    /// not a mapping or names an unknown frequency.
    pub fn from_value(value: &Value) -> Option<Self> {
        let raw: RawRecurrence = match serde_yaml::from_value(value.clone()) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::debug!("ignoring malformed recurrence: {e}");
                return None;
            }
        };

        let frequency = match raw.frequency.parse::<Frequency>() {
            Ok(frequency) => frequency,
            Err(e) => {
                tracing::debug!("ignoring recurrence: {e}");
                return None;
            }
        };

        Some(Self {
            frequency,
            days_of_week: raw.days_of_week.iter().filter_map(|d| parse_weekday(d)).collect(),
            day_of_month: raw.day_of_month.filter(|d| (1..=31).contains(d)),
            month_of_year: raw.month_of_year.filter(|m| (1..=12).contains(m)),
        })
    }

    /// Whether an occurrence falls on `date`.
    ///
    /// `anchor` is the task's own scheduled or due date; it fills in whatever
    /// the rule leaves unspecified (weekday, day of month, month).
    pub fn is_due_on(&self, date: NaiveDate, anchor: Option<NaiveDate>) -> bool {
        if anchor.is_some_and(|a| date < a) {
            return false;
        }

        match self.frequency {
            Frequency::Daily => true,
            Frequency::Weekly => {
                if self.days_of_week.is_empty() {
                    anchor.is_some_and(|a| a.weekday() == date.weekday())
                } else {
                    self.days_of_week.contains(&date.weekday())
                }
            }
            Frequency::Monthly => self
                .day_of_month
                .or_else(|| anchor.map(|a| a.day()))
                .is_some_and(|day| matches_day_of_month(date, day)),
            Frequency::Yearly => {
                let month = self.month_of_year.or_else(|| anchor.map(|a| a.month()));
                let day = self.day_of_month.or_else(|| anchor.map(|a| a.day()));
                match (month, day) {
                    (Some(m), Some(d)) => date.month() == m && matches_day_of_month(date, d),
                    _ => false,
                }
            }
        }
    }
}

/// A rule for the 31st fires on the last day of shorter months.
fn matches_day_of_month(date: NaiveDate, day: u32) -> bool {
    let last = days_in_month(date.year(), date.month());
    date.day() == day.min(last)
}

fn days_in_month(year: i32, month: u32) -> u32 {
    let (next_year, next_month) = if month == 12 { (year + 1, 1) } else { (year, month + 1) };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|d| d.pred_opt())
        .map_or(31, |d| d.day())
}

fn parse_weekday(s: &str) -> Option<Weekday> {
    match s.trim().to_lowercase().as_str() {
        "monday" | "mon" => Some(Weekday::Mon),
        "tuesday" | "tue" => Some(Weekday::Tue),
        "wednesday" | "wed" => Some(Weekday::Wed),
        "thursday" | "thu" => Some(Weekday::Thu),
        "friday" | "fri" => Some(Weekday::Fri),
        "saturday" | "sat" => Some(Weekday::Sat),
        "sunday" | "sun" => Some(Weekday::Sun),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn rule(yaml: &str) -> Recurrence {
        let value: Value = serde_yaml::from_str(yaml).unwrap();
        Recurrence::from_value(&value).expect("rule should parse")
    }

    #[test]
    fn unknown_frequency_is_dropped() {
        let value: Value = serde_yaml::from_str("frequency: hourly").unwrap();
        assert!(Recurrence::from_value(&value).is_none());
    }

    #[rstest]
    #[case("daily", Frequency::Daily)]
    #[case(" Weekly ", Frequency::Weekly)]
    #[case("annually", Frequency::Yearly)]
    fn frequency_parses(#[case] raw: &str, #[case] expected: Frequency) {
        assert_eq!(raw.parse::<Frequency>(), Ok(expected));
    }

    #[test]
    fn unknown_frequency_names_the_input() {
        let err = "hourly".parse::<Frequency>().unwrap_err();
        assert_eq!(err.to_string(), "unknown recurrence frequency 'hourly'");
    }

    #[test]
    fn non_mapping_is_dropped() {
        let value: Value = serde_yaml::from_str("\"every day\"").unwrap();
        assert!(Recurrence::from_value(&value).is_none());
    }

    #[test]
    fn weekday_names_are_normalised() {
        let r = rule("frequency: weekly\ndays_of_week: [mon, Friday, bogus]");
        assert_eq!(r.days_of_week, vec![Weekday::Mon, Weekday::Fri]);
    }

    #[rstest]
    #[case("frequency: daily", "2024-03-13", true)]
    #[case("frequency: weekly\ndays_of_week: [mon, wed]", "2024-03-13", true)]
    #[case("frequency: weekly\ndays_of_week: [mon, wed]", "2024-03-14", false)]
    #[case("frequency: monthly\nday_of_month: 13", "2024-03-13", true)]
    #[case("frequency: monthly\nday_of_month: 13", "2024-03-14", false)]
    #[case("frequency: monthly\nday_of_month: 31", "2024-04-30", true)]
    #[case("frequency: yearly\nmonth_of_year: 3\nday_of_month: 13", "2025-03-13", true)]
    #[case("frequency: yearly\nmonth_of_year: 4\nday_of_month: 13", "2025-03-13", false)]
    fn is_due_on_without_anchor(#[case] yaml: &str, #[case] day: &str, #[case] expected: bool) {
        assert_eq!(rule(yaml).is_due_on(date(day), None), expected);
    }

    #[test]
    fn anchor_fills_missing_weekday() {
        let r = rule("frequency: weekly");
        let anchor = Some(date("2024-03-04")); // a Monday
        assert!(r.is_due_on(date("2024-03-11"), anchor));
        assert!(!r.is_due_on(date("2024-03-12"), anchor));
    }

    #[test]
    fn nothing_is_due_before_anchor() {
        let r = rule("frequency: daily");
        assert!(!r.is_due_on(date("2024-03-01"), Some(date("2024-03-10"))));
    }
}
