//! Timetable rows into trips.
//!
//! A row is a five field header (day type, record kind and route among
//! them) followed by one five field block per stop visit. Each block
//! becomes a [`StopTimeSlot`], in row order.

use std::fmt;

use diafeed_model::{DayType, StopTimeSlot, Trip};
use log::{debug, info, warn};

use crate::error::MalformedRecord;
use crate::profile::FormatProfile;
use crate::record::Record;

pub const TIMETABLE_TABLE: &str = "timetable";

const STOP_OFFSET: usize = 0;
const ARRIVAL_OFFSET: usize = 1;
const DEPARTURE_OFFSET: usize = 2;

/// Day-type code outside `1..=4`. The trip is kept with an empty service id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnmappedDayType {
    pub line: usize,
    pub code: String,
}

impl fmt::Display for UnmappedDayType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{TIMETABLE_TABLE} line {}: unmapped day-type code {:?}",
            self.line, self.code
        )
    }
}

#[derive(Debug, Default)]
pub struct DecodedTimetable {
    pub trips: Vec<Trip>,
    pub malformed: Vec<MalformedRecord>,
    pub unmapped_day_types: Vec<UnmappedDayType>,
    /// Placeholder rows dropped by the profile's sentinel.
    pub placeholders: usize,
}

pub struct TimetableDecoder<'a> {
    profile: &'a FormatProfile,
}

impl<'a> TimetableDecoder<'a> {
    pub fn new(profile: &'a FormatProfile) -> Self {
        Self { profile }
    }

    pub fn decode(&self, records: &[Record]) -> DecodedTimetable {
        let mut decoded = DecodedTimetable::default();
        for record in records {
            match self.decode_record(record) {
                Ok(Some(trip)) => {
                    if trip.day_type.is_none() {
                        let unmapped = UnmappedDayType {
                            line: record.line,
                            code: record
                                .field(self.profile.timetable.day_type)
                                .unwrap_or_default()
                                .to_owned(),
                        };
                        warn!("{unmapped}");
                        decoded.unmapped_day_types.push(unmapped);
                    }
                    decoded.trips.push(trip);
                }
                Ok(None) => decoded.placeholders += 1,
                Err(err) => {
                    warn!("{err}, record skipped");
                    decoded.malformed.push(err);
                }
            }
        }
        info!(
            "decoded {} trips, {} placeholder rows, {} malformed rows",
            decoded.trips.len(),
            decoded.placeholders,
            decoded.malformed.len()
        );
        decoded
    }

    /// `Ok(None)` for placeholder rows.
    pub fn decode_record(&self, record: &Record) -> Result<Option<Trip>, MalformedRecord> {
        let layout = &self.profile.timetable;
        if record.len() < layout.first_block {
            return Err(MalformedRecord {
                table: TIMETABLE_TABLE,
                line: record.line,
                field_count: record.len(),
                expected: layout.first_block,
            });
        }
        if let Some(sentinel) = &self.profile.skip_sentinel {
            if record
                .require(TIMETABLE_TABLE, sentinel.field)?
                .ends_with(sentinel.suffix.as_str())
            {
                debug!("{TIMETABLE_TABLE} line {}: placeholder row", record.line);
                return Ok(None);
            }
        }

        let day_type = DayType::from_code(record.require(TIMETABLE_TABLE, layout.day_type)?);
        let service_id = day_type
            .map(|day_type| self.profile.service_labels.get(day_type).to_owned())
            .unwrap_or_default();
        let stop_times: Vec<_> = record
            .blocks(layout.first_block, layout.block_width)
            .map(|block| {
                StopTimeSlot::from_offsets(
                    block.get_or_empty(STOP_OFFSET),
                    block.get_or_empty(ARRIVAL_OFFSET),
                    block.get_or_empty(DEPARTURE_OFFSET),
                )
            })
            .collect();
        let trailing = record.trailing_fields(layout.first_block, layout.block_width);
        if trailing > 0 {
            debug!(
                "{TIMETABLE_TABLE} line {}: {trailing} fields after the last block ignored",
                record.line
            );
        }

        let route_id = record.require(TIMETABLE_TABLE, layout.route_id)?.to_owned();
        let id = match stop_times.first() {
            Some(first) => Trip::compose_id(&route_id, &service_id, &first.departure_time),
            None => String::new(),
        };
        Ok(Some(Trip {
            id,
            route_id,
            day_type,
            service_id,
            record_kind: record.require(TIMETABLE_TABLE, layout.record_kind)?.to_owned(),
            line: record.line,
            stop_times,
        }))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use diafeed_model::ServiceLabels;

    fn profile() -> FormatProfile {
        FormatProfile {
            service_labels: ServiceLabels::english(),
            ..FormatProfile::current()
        }
    }

    fn row(line: usize, day_type: &str, kind: &str, route: &str, blocks: &[(&str, &str, &str)]) -> Record {
        let mut fields = vec!["0", day_type, "0", kind, route];
        for (stop, arrival, departure) in blocks {
            fields.extend([*stop, *arrival, *departure, "", ""]);
        }
        Record::from_fields(line, fields)
    }

    #[test]
    fn decode_blocks_in_order() {
        let profile = profile();
        let record = row(
            4,
            "1",
            "3",
            "101",
            &[("1201", "0", "370"), ("1202", "375", "376"), ("1203", "380", "0")],
        );
        let trip = TimetableDecoder::new(&profile)
            .decode_record(&record)
            .unwrap()
            .unwrap();
        assert_eq!(trip.id, "101_1_weekday_06:10:00");
        assert_eq!(trip.route_id, "101");
        assert_eq!(trip.day_type, Some(DayType::Weekday));
        assert_eq!(trip.service_id, "1_weekday");
        assert_eq!(trip.record_kind, "3");
        assert_eq!(trip.line, 4);
        let tokens: Vec<_> = trip.stop_times.iter().map(|s| s.stop_token.as_str()).collect();
        assert_eq!(tokens, ["1201", "1202", "1203"]);
        assert_eq!(trip.stop_times[0].arrival_time, "06:10:00");
        assert_eq!(trip.stop_times[1].arrival_time, "06:15:00");
        assert_eq!(trip.stop_times[1].departure_time, "06:16:00");
        assert_eq!(trip.stop_times[2].departure_time, "06:20:00");
    }

    #[test]
    fn placeholder_rows_skipped() {
        let profile = profile();
        // first stop token ends with "00"
        let record = row(1, "1", "3", "101", &[("1200", "0", "370")]);
        assert_eq!(TimetableDecoder::new(&profile).decode_record(&record), Ok(None));

        let legacy = FormatProfile::legacy();
        assert!(TimetableDecoder::new(&legacy)
            .decode_record(&record)
            .unwrap()
            .is_some());
    }

    #[test]
    fn short_row_is_malformed() {
        let profile = profile();
        let record = Record::from_fields(9, ["0", "1", "0"]);
        assert_eq!(
            TimetableDecoder::new(&profile).decode_record(&record),
            Err(MalformedRecord {
                table: TIMETABLE_TABLE,
                line: 9,
                field_count: 3,
                expected: 5,
            })
        );
    }

    #[test]
    fn header_only_row_needs_sentinel_column() {
        let record = row(2, "1", "3", "101", &[]);
        let err = TimetableDecoder::new(&profile())
            .decode_record(&record)
            .unwrap_err();
        assert_eq!(err.expected, 6);

        let legacy = FormatProfile::legacy();
        let trip = TimetableDecoder::new(&legacy)
            .decode_record(&record)
            .unwrap()
            .unwrap();
        assert!(trip.stop_times.is_empty());
        assert!(!trip.has_id());
    }

    #[test]
    fn partial_block_yields_no_trip_id() {
        let profile = profile();
        let record = Record::from_fields(3, ["0", "1", "0", "3", "101", "1201", "370"]);
        let trip = TimetableDecoder::new(&profile)
            .decode_record(&record)
            .unwrap()
            .unwrap();
        assert!(trip.stop_times.is_empty());
        assert_eq!(trip.id, "");
    }

    #[test]
    fn unmapped_day_type_kept() {
        let profile = profile();
        let records = [
            row(1, "7", "3", "101", &[("1201", "0", "370")]),
            row(2, "4", "3", "101", &[("1201", "0", "370")]),
        ];
        let decoded = TimetableDecoder::new(&profile).decode(&records);
        assert_eq!(decoded.trips.len(), 2);
        assert_eq!(decoded.trips[0].service_id, "");
        assert_eq!(decoded.trips[0].id, "101__06:10:00");
        assert_eq!(decoded.trips[1].service_id, "4_saturday");
        assert_eq!(
            decoded.unmapped_day_types,
            [UnmappedDayType {
                line: 1,
                code: "7".to_owned()
            }]
        );
    }

    #[test]
    fn decode_collects_problems_and_continues() {
        let profile = profile();
        let records = [
            Record::from_fields(1, ["0", "1"]),
            row(2, "1", "3", "101", &[("1200", "0", "370")]),
            row(3, "2", "3", "101", &[("1201", "0", "370")]),
        ];
        let decoded = TimetableDecoder::new(&profile).decode(&records);
        assert_eq!(decoded.malformed.len(), 1);
        assert_eq!(decoded.malformed[0].line, 1);
        assert_eq!(decoded.placeholders, 1);
        assert_eq!(decoded.trips.len(), 1);
        assert_eq!(decoded.trips[0].id, "101_2_sunday_holiday_06:10:00");
    }

    #[test]
    fn tab_only_row_is_malformed() {
        let profile = profile();
        let records = crate::record::parse_records("\t\t\t\n0\t1\n");
        let decoded = TimetableDecoder::new(&profile).decode(&records);
        let lines: Vec<_> = decoded.malformed.iter().map(|err| err.line).collect();
        assert_eq!(lines, [1, 2]);
        assert_eq!(decoded.malformed[0].field_count, 4);
        assert!(decoded.trips.is_empty());
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// One slot per complete block, whatever the trailing fields
        #[test]
        fn slot_count_from_field_count(extra in prop::collection::vec("[1-9][0-9]{0,2}", 0..60)) {
            let profile = FormatProfile::legacy();
            let mut fields = vec!["0".to_owned(), "1".to_owned(), "0".to_owned(), "3".to_owned(), "101".to_owned()];
            fields.extend(extra);
            let record = Record::from_fields(1, fields.clone());
            let trip = TimetableDecoder::new(&profile).decode_record(&record).unwrap().unwrap();
            prop_assert_eq!(trip.stop_times.len(), (fields.len() - 5) / 5);
        }

        /// Trip id is fixed by the first block's departure
        #[test]
        fn id_from_first_departure(first in 1u32..1440, later in 1u32..1440) {
            let profile = FormatProfile::legacy();
            let record = Record::from_fields(1, [
                "0".to_owned(), "1".to_owned(), "0".to_owned(), "3".to_owned(), "9".to_owned(),
                "1201".to_owned(), "0".to_owned(), first.to_string(), String::new(), String::new(),
                "1202".to_owned(), "0".to_owned(), later.to_string(), String::new(), String::new(),
            ]);
            let trip = TimetableDecoder::new(&profile).decode_record(&record).unwrap().unwrap();
            prop_assert_eq!(trip.id, format!("9_平_{}", diafeed_model::minutes_to_time(first)));
        }
    }
}
