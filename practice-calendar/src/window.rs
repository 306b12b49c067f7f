use std::fmt;
use std::mem;
use std::str::FromStr;

use chrono::{Datelike, Days, Duration, Months, NaiveDate, NaiveDateTime};
use serde::{de, Deserialize, Deserializer, Serialize};

use crate::{CalendarEvent, ViewModeError};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    Day,
    #[default]
    Week,
    Month,
}

impl FromStr for ViewMode {
    type Err = ViewModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "day" => Ok(Self::Day),
            "week" => Ok(Self::Week),
            "month" => Ok(Self::Month),
            _ => Err(ViewModeError(s.to_string())),
        }
    }
}

impl<'de> Deserialize<'de> for ViewMode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer)?
            .parse()
            .map_err(de::Error::custom)
    }
}

impl fmt::Display for ViewMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Day => "day",
            Self::Week => "week",
            Self::Month => "month",
        })
    }
}

/// Half-open date range `[start, end)` shown by a calendar view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct ViewWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl ViewWindow {
    /// Weeks start on Monday. Month windows cover the whole calendar grid,
    /// including the partial weeks before the 1st and after the last day.
    ///
    /// Returns `None` only at the edges of the representable date range.
    pub fn new(current: NaiveDate, mode: ViewMode) -> Option<Self> {
        let (start, end) = match mode {
            ViewMode::Day => (current, current.succ_opt()?),
            ViewMode::Week => {
                let monday = start_of_week(current)?;
                (monday, monday.checked_add_days(Days::new(7))?)
            }
            ViewMode::Month => {
                let first = current.with_day(1)?;
                let last = first.checked_add_months(Months::new(1))?.pred_opt()?;
                (
                    start_of_week(first)?,
                    start_of_week(last)?.checked_add_days(Days::new(7))?,
                )
            }
        };

        Some(Self { start, end })
    }

    /// Whole weeks from `weeks` before the week of `center` to `weeks` after it.
    pub fn around(center: NaiveDate, weeks: u32) -> Option<Self> {
        let monday = start_of_week(center)?;
        let span = Days::new(7 * u64::from(weeks));

        Some(Self {
            start: monday.checked_sub_days(span)?,
            end: monday.checked_add_days(span)?.checked_add_days(Days::new(7))?,
        })
    }

    #[must_use]
    pub fn contains(&self, timestamp: NaiveDateTime) -> bool {
        let date = timestamp.date();
        self.start <= date && date < self.end
    }

    #[must_use]
    pub fn covers(&self, other: &ViewWindow) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    #[must_use]
    pub fn len_days(&self) -> i64 {
        (self.end - self.start).num_days()
    }

    pub fn days(&self) -> DayRange {
        DayRange {
            next: self.start,
            end: self.end,
        }
    }

    /// Events whose start lies inside the window. Events without a valid start
    /// belong to no window.
    pub fn filter<'a>(
        &self,
        events: &'a [CalendarEvent],
    ) -> impl Iterator<Item = &'a CalendarEvent> + 'a {
        let window = *self;
        events
            .iter()
            .filter(move |event| event.start.is_some_and(|start| window.contains(start)))
    }
}

pub struct DayRange {
    next: NaiveDate,
    end: NaiveDate,
}

impl Iterator for DayRange {
    type Item = NaiveDate;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next < self.end {
            let following = self.next.succ_opt()?;
            Some(mem::replace(&mut self.next, following))
        } else {
            None
        }
    }
}

/// Moves `current` by `steps` days, weeks or calendar months. Month steps clamp
/// the day to the length of the target month.
pub fn navigate(current: NaiveDate, mode: ViewMode, steps: i32) -> Option<NaiveDate> {
    match mode {
        ViewMode::Day => current.checked_add_signed(Duration::try_days(i64::from(steps))?),
        ViewMode::Week => current.checked_add_signed(Duration::try_weeks(i64::from(steps))?),
        ViewMode::Month if steps >= 0 => current.checked_add_months(Months::new(steps.unsigned_abs())),
        ViewMode::Month => current.checked_sub_months(Months::new(steps.unsigned_abs())),
    }
}

fn start_of_week(date: NaiveDate) -> Option<NaiveDate> {
    date.checked_sub_days(Days::new(u64::from(
        date.weekday().num_days_from_monday(),
    )))
}
