use serde::{Deserialize, Serialize};

use crate::WeekdayFlags;

/// Service pattern a timetable row runs under.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum DayType {
    Weekday,
    SundayHoliday,
    Special,
    Saturday,
}

impl DayType {
    /// Row order of `calendar.txt`.
    pub const CALENDAR_ORDER: [DayType; 4] = [
        DayType::Weekday,
        DayType::SundayHoliday,
        DayType::Saturday,
        DayType::Special,
    ];

    /// Maps the timetable's day-type column. Codes outside `1..=4` have no
    /// day type.
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim() {
            "1" => Some(DayType::Weekday),
            "2" => Some(DayType::SundayHoliday),
            "3" => Some(DayType::Special),
            "4" => Some(DayType::Saturday),
            _ => None,
        }
    }

    /// Special days run on the Sunday pattern.
    pub fn weekdays(&self) -> WeekdayFlags {
        match self {
            DayType::Weekday => WeekdayFlags::WORKDAYS,
            DayType::SundayHoliday => WeekdayFlags::SUNDAY,
            DayType::Special => WeekdayFlags::SUNDAY,
            DayType::Saturday => WeekdayFlags::SATURDAY,
        }
    }
}

/// The service id written for each day type. Export variants disagree on
/// the wording, so it comes from the format profile.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ServiceLabels {
    pub weekday: String,
    pub sunday_holiday: String,
    pub special: String,
    pub saturday: String,
}

impl ServiceLabels {
    pub fn get(&self, day_type: DayType) -> &str {
        match day_type {
            DayType::Weekday => &self.weekday,
            DayType::SundayHoliday => &self.sunday_holiday,
            DayType::Special => &self.special,
            DayType::Saturday => &self.saturday,
        }
    }

    pub fn english() -> Self {
        Self {
            weekday: "1_weekday".to_owned(),
            sunday_holiday: "2_sunday_holiday".to_owned(),
            special: "3_special".to_owned(),
            saturday: "4_saturday".to_owned(),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn codes() {
        assert_eq!(DayType::from_code("1"), Some(DayType::Weekday));
        assert_eq!(DayType::from_code("2"), Some(DayType::SundayHoliday));
        assert_eq!(DayType::from_code("3"), Some(DayType::Special));
        assert_eq!(DayType::from_code("4"), Some(DayType::Saturday));
        assert_eq!(DayType::from_code("5"), None);
        assert_eq!(DayType::from_code(""), None);
        assert_eq!(DayType::from_code(" 4 "), Some(DayType::Saturday));
    }

    #[test]
    fn labels() {
        let labels = ServiceLabels::english();
        assert_eq!(labels.get(DayType::Saturday), "4_saturday");
        assert_eq!(labels.get(DayType::Special), "3_special");
    }

    #[test]
    fn special_runs_like_sunday() {
        assert_eq!(DayType::Special.weekdays(), DayType::SundayHoliday.weekdays());
    }
}
