use chrono::prelude::*;
use chrono::{Days, Months};
use serde::{Deserialize, Serialize};

use crate::{DayType, ServiceLabels, WeekdayFlags};

/// Dates the generated feed declares itself valid for.
///
/// The window only depends on the processing date: it opens on the first
/// of the current month and closes a year later, the day before the same
/// date next year. Running on another month legitimately moves it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedWindow {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub version: String,
}

impl FeedWindow {
    pub fn anchored_at(today: NaiveDate, version: impl Into<String>) -> Self {
        let start_date = today - Days::new(u64::from(today.day0()));
        let end_date = start_date + Months::new(12) - Days::new(1);
        Self {
            start_date,
            end_date,
            version: version.into(),
        }
    }
}

/// `YYYYMMDD`, as the feed writes dates.
pub fn format_date(date: NaiveDate) -> String {
    date.format("%Y%m%d").to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceCalendar {
    pub service_id: String,
    pub weekdays: WeekdayFlags,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl ServiceCalendar {
    /// The four day-type services, whatever the timetable contains.
    pub fn fixed_set(window: &FeedWindow, labels: &ServiceLabels) -> Vec<ServiceCalendar> {
        DayType::CALENDAR_ORDER
            .iter()
            .map(|day_type| ServiceCalendar {
                service_id: labels.get(*day_type).to_owned(),
                weekdays: day_type.weekdays(),
                start_date: window.start_date,
                end_date: window.end_date,
            })
            .collect()
    }
}
