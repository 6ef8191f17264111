//! Entities shared by the timetable converter: what is loaded from the
//! operator's master tables and what ends up in the feed.

use serde::{Deserialize, Serialize};

mod calendar;
mod day_type;
mod identifier;
mod time;
mod weekday_flags;

pub use calendar::{format_date, FeedWindow, ServiceCalendar};
pub use day_type::{DayType, ServiceLabels};
pub use identifier::{pad, split_compound};
pub use time::{decode_time, minutes_to_time, ZERO_TIME};
pub use weekday_flags::WeekdayFlags;

/// A logical stop from the stop master.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stop {
    pub id: String,
    pub name: String,
    pub phonetic_name: String,
}

/// A boarding position. Several poles share one stop and often one name.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pole {
    pub id: String,
    pub stop_id: String,
    pub name: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Route {
    pub id: String,
    pub name: String,
    pub destination: String,
    /// Authoritative stop codes, by stop sequence. Empty until the
    /// itinerary table is loaded.
    pub stop_ids: Vec<String>,
    pub long_name: String,
}

impl Route {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            ..Default::default()
        }
    }

    /// Name written to the routes table: the long name built from the
    /// itinerary when there is one.
    pub fn display_name(&self) -> &str {
        if self.long_name.is_empty() {
            &self.name
        } else {
            &self.long_name
        }
    }
}

/// One stop visit of a trip, as decoded from a timetable block.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StopTimeSlot {
    /// Stop token as found in the timetable. Replaced by the route
    /// itinerary's code at emission.
    pub stop_token: String,
    pub arrival_time: String,
    pub departure_time: String,
}

impl StopTimeSlot {
    /// Decodes both offsets and fills a missing one from the other. When
    /// both are missing the slot keeps two zero times.
    pub fn from_offsets(stop_token: &str, arrival: &str, departure: &str) -> Self {
        let mut slot = Self {
            stop_token: stop_token.to_owned(),
            arrival_time: decode_time(arrival),
            departure_time: decode_time(departure),
        };
        if slot.arrival_time == ZERO_TIME {
            slot.arrival_time = slot.departure_time.clone();
        }
        if slot.departure_time == ZERO_TIME {
            slot.departure_time = slot.arrival_time.clone();
        }
        slot
    }
}

/// One timetable row: a single run of a route on a day type.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trip {
    /// Empty when the row had no stop block.
    pub id: String,
    pub route_id: String,
    pub day_type: Option<DayType>,
    /// Empty when the day type is unknown.
    pub service_id: String,
    pub record_kind: String,
    /// Line of the timetable file the trip was decoded from.
    pub line: usize,
    pub stop_times: Vec<StopTimeSlot>,
}

impl Trip {
    /// `route_service_departure`, e.g. `101_1_weekday_06:10:00`.
    pub fn compose_id(route_id: &str, service_id: &str, first_departure: &str) -> String {
        format!("{route_id}_{service_id}_{first_departure}")
    }

    pub fn has_id(&self) -> bool {
        !self.id.is_empty()
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// A zero arrival always ends up equal to a non-zero departure
        #[test]
        fn backfill_arrival(departure in 1u32..2000) {
            let slot = StopTimeSlot::from_offsets("s", "0", &departure.to_string());
            prop_assert_eq!(&slot.arrival_time, &slot.departure_time);
            prop_assert_eq!(slot.departure_time, minutes_to_time(departure));
        }

        #[test]
        fn backfill_departure(arrival in 1u32..2000) {
            let slot = StopTimeSlot::from_offsets("s", &arrival.to_string(), "0");
            prop_assert_eq!(&slot.arrival_time, &slot.departure_time);
        }
    }
}
