//! Domain models for Pennywise

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A single historical expense
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpenseRecord {
    pub date: NaiveDate,
    pub category: String,
    /// Always finite and non-negative once parsed
    pub amount: f64,
}

impl ExpenseRecord {
    pub fn new(date: NaiveDate, category: impl Into<String>, amount: f64) -> Self {
        Self {
            date,
            category: category.into(),
            amount,
        }
    }

    pub fn month(&self) -> Month {
        Month::of(self.date)
    }
}

/// Priority tier a spending category belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CategoryGroup {
    Necessary,
    Unnecessary,
    Other,
}

impl CategoryGroup {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Necessary => "Necessary",
            Self::Unnecessary => "Unnecessary",
            Self::Other => "Other",
        }
    }

    pub fn all() -> &'static [CategoryGroup] {
        &[Self::Necessary, Self::Unnecessary, Self::Other]
    }
}

impl FromStr for CategoryGroup {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "necessary" => Ok(Self::Necessary),
            "unnecessary" => Ok(Self::Unnecessary),
            "other" => Ok(Self::Other),
            _ => Err(format!("Unknown category group: {}", s)),
        }
    }
}

impl fmt::Display for CategoryGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A calendar month, displayed and serialized as `YYYY-MM`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Month {
    year: i32,
    month: u32,
}

impl Month {
    /// Returns None unless `month` is 1..=12
    pub fn new(year: i32, month: u32) -> Option<Self> {
        if (1..=12).contains(&month) {
            Some(Self { year, month })
        } else {
            None
        }
    }

    /// The month containing `date`
    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn first_day(&self) -> NaiveDate {
        // year/month are validated on construction, day 1 always exists
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or(NaiveDate::MIN)
    }

    pub fn succ(&self) -> Self {
        if self.month == 12 {
            Self {
                year: self.year + 1,
                month: 1,
            }
        } else {
            Self {
                year: self.year,
                month: self.month + 1,
            }
        }
    }

    pub fn pred(&self) -> Self {
        if self.month == 1 {
            Self {
                year: self.year - 1,
                month: 12,
            }
        } else {
            Self {
                year: self.year,
                month: self.month - 1,
            }
        }
    }

    /// Whole months from `earlier` to `self` (negative if `earlier` is later)
    pub fn months_since(&self, earlier: Month) -> i64 {
        (self.year as i64 - earlier.year as i64) * 12 + (self.month as i64 - earlier.month as i64)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date.year() == self.year && date.month() == self.month
    }
}

impl fmt::Display for Month {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for Month {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let s = s.trim();
        let (year, month) = s
            .split_once('-')
            .ok_or_else(|| format!("Invalid month (use YYYY-MM): {}", s))?;
        let year = year
            .parse::<i32>()
            .map_err(|_| format!("Invalid month (use YYYY-MM): {}", s))?;
        let month = month
            .parse::<u32>()
            .map_err(|_| format!("Invalid month (use YYYY-MM): {}", s))?;
        Month::new(year, month).ok_or_else(|| format!("Month out of range: {}", s))
    }
}

impl Serialize for Month {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Month {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Summed spending of one group in one calendar month
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyGroupTotal {
    pub group: CategoryGroup,
    pub month: Month,
    pub amount: f64,
}

/// Summed spending of one category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategorySpend {
    pub category: String,
    pub amount: f64,
}

/// Round to a fixed number of decimal places
pub(crate) fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

pub(crate) fn round2(value: f64) -> f64 {
    round_to(value, 2)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_month_navigation_wraps_years() {
        let jan = Month::new(2025, 1).unwrap();
        assert_eq!(jan.pred(), Month::new(2024, 12).unwrap());
        assert_eq!(jan.pred().succ(), jan);
        assert_eq!(Month::new(2024, 12).unwrap().succ(), jan);
    }

    #[test]
    fn test_months_since() {
        let start = Month::new(2024, 11).unwrap();
        let end = Month::new(2025, 2).unwrap();
        assert_eq!(end.months_since(start), 3);
        assert_eq!(start.months_since(end), -3);
        assert_eq!(start.months_since(start), 0);
    }

    #[test]
    fn test_month_parse_and_display() {
        let month: Month = "2025-09".parse().unwrap();
        assert_eq!(month, Month::of(date(2025, 9, 30)));
        assert_eq!(month.to_string(), "2025-09");
        assert_eq!(month.first_day(), date(2025, 9, 1));
        assert!("2025-13".parse::<Month>().is_err());
        assert!("september".parse::<Month>().is_err());
    }

    #[test]
    fn test_month_serde_as_string() {
        let month = Month::new(2025, 3).unwrap();
        let json = serde_json::to_string(&month).unwrap();
        assert_eq!(json, "\"2025-03\"");
        let back: Month = serde_json::from_str(&json).unwrap();
        assert_eq!(back, month);
    }

    #[test]
    fn test_category_group_from_str() {
        assert_eq!(
            "necessary".parse::<CategoryGroup>().unwrap(),
            CategoryGroup::Necessary
        );
        assert_eq!(
            " Other ".parse::<CategoryGroup>().unwrap(),
            CategoryGroup::Other
        );
        assert!("Luxury".parse::<CategoryGroup>().is_err());
    }

    #[test]
    fn test_round2() {
        assert_eq!(round2(1.005_1), 1.01);
        assert_eq!(round2(-2.344), -2.34);
        assert_eq!(round_to(0.833_333, 4), 0.8333);
    }
}
