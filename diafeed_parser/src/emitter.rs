//! Feed tables as CSV files.
//!
//! Every table gets its header row even when it has no entity, so the
//! header is written by hand and rows are serialized without one.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use diafeed_model::{format_date, FeedWindow, ServiceCalendar, Trip};
use log::{debug, info};
use serde::Serialize;

use crate::aligner::AlignedTrip;
use crate::error::Result;
use crate::profile::FormatProfile;
use crate::reference::ReferenceTables;

pub const STOPS_FILE: &str = "stops.txt";
pub const ROUTES_FILE: &str = "routes.txt";
pub const TRIPS_FILE: &str = "trips.txt";
pub const STOP_TIMES_FILE: &str = "stop_times.txt";
pub const CALENDAR_FILE: &str = "calendar.txt";
pub const AGENCY_FILE: &str = "agency.txt";
pub const TRANSLATIONS_FILE: &str = "translations.txt";
pub const FEED_INFO_FILE: &str = "feed_info.txt";

#[derive(Serialize)]
struct StopRow<'a> {
    stop_id: String,
    stop_name: &'a str,
    stop_lat: &'a str,
    stop_lon: &'a str,
}

#[derive(Serialize)]
struct RouteRow<'a> {
    route_id: &'a str,
    agency_id: &'a str,
    route_name: &'a str,
}

#[derive(Serialize)]
struct TripRow<'a> {
    route_id: &'a str,
    service_id: &'a str,
    trip_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    trip_headsign: Option<&'a str>,
}

#[derive(Serialize)]
struct StopTimeRow<'a> {
    trip_id: &'a str,
    arrival_time: &'a str,
    departure_time: &'a str,
    stop_id: &'a str,
    stop_sequence: usize,
}

#[derive(Serialize)]
struct CalendarRow<'a> {
    service_id: &'a str,
    monday: u8,
    tuesday: u8,
    wednesday: u8,
    thursday: u8,
    friday: u8,
    saturday: u8,
    sunday: u8,
    start_date: String,
    end_date: String,
}

impl<'a> From<&'a ServiceCalendar> for CalendarRow<'a> {
    fn from(calendar: &'a ServiceCalendar) -> Self {
        let [monday, tuesday, wednesday, thursday, friday, saturday, sunday] =
            calendar.weekdays.columns();
        Self {
            service_id: &calendar.service_id,
            monday,
            tuesday,
            wednesday,
            thursday,
            friday,
            saturday,
            sunday,
            start_date: format_date(calendar.start_date),
            end_date: format_date(calendar.end_date),
        }
    }
}

#[derive(Serialize)]
struct AgencyRow<'a> {
    agency_id: &'a str,
    agency_name: &'a str,
    agency_url: &'a str,
    agency_timezone: &'a str,
}

#[derive(Serialize)]
struct TranslationRow<'a> {
    table_name: &'a str,
    field_name: &'a str,
    language: &'a str,
    field_value: &'a str,
    translation: &'a str,
}

#[derive(Serialize)]
struct FeedInfoRow<'a> {
    feed_publisher_name: &'a str,
    feed_publisher_url: &'a str,
    feed_lang: &'a str,
    feed_start_date: String,
    feed_end_date: String,
    feed_version: &'a str,
}

pub struct FeedEmitter<'a> {
    out_dir: PathBuf,
    profile: &'a FormatProfile,
}

impl<'a> FeedEmitter<'a> {
    /// Creates `out_dir` if needed.
    pub fn create(out_dir: &Path, profile: &'a FormatProfile) -> Result<Self> {
        std::fs::create_dir_all(out_dir)?;
        Ok(Self {
            out_dir: out_dir.to_owned(),
            profile,
        })
    }

    fn write_table<R, I>(&self, file: &str, header: &[&str], rows: I) -> Result<usize>
    where
        R: Serialize,
        I: IntoIterator<Item = R>,
    {
        let path = self.out_dir.join(file);
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .terminator(csv::Terminator::CRLF)
            .from_path(&path)?;
        writer.write_record(header)?;
        let mut count = 0;
        for row in rows {
            writer.serialize(row)?;
            count += 1;
        }
        writer.flush()?;
        debug!("{}: {count} rows", path.display());
        Ok(count)
    }

    /// One row per pole, coordinates left empty.
    pub fn write_stops(&self, tables: &ReferenceTables) -> Result<usize> {
        self.write_table(
            STOPS_FILE,
            &["stop_id", "stop_name", "stop_lat", "stop_lon"],
            tables.poles().iter().map(|pole| StopRow {
                stop_id: self.profile.feed_pole_id(&pole.id),
                stop_name: &pole.name,
                stop_lat: "",
                stop_lon: "",
            }),
        )
    }

    pub fn write_routes(&self, tables: &ReferenceTables) -> Result<usize> {
        self.write_table(
            ROUTES_FILE,
            &["route_id", "agency_id", self.profile.route_name_column.header()],
            tables.routes().iter().map(|route| RouteRow {
                route_id: &route.id,
                agency_id: &self.profile.agency.id,
                route_name: route.display_name(),
            }),
        )
    }

    pub fn write_trips(&self, trips: &[&Trip], tables: &ReferenceTables) -> Result<usize> {
        let mut header = vec!["route_id", "service_id", "trip_id"];
        if self.profile.headsign {
            header.push("trip_headsign");
        }
        self.write_table(
            TRIPS_FILE,
            &header,
            trips.iter().map(|trip| TripRow {
                route_id: &trip.route_id,
                service_id: &trip.service_id,
                trip_id: &trip.id,
                trip_headsign: self.profile.headsign.then(|| {
                    tables
                        .route(&trip.route_id)
                        .map(|route| route.destination.as_str())
                        .unwrap_or_default()
                }),
            }),
        )
    }

    pub fn write_stop_times(&self, trips: &[AlignedTrip<'_>]) -> Result<usize> {
        self.write_table(
            STOP_TIMES_FILE,
            &[
                "trip_id",
                "arrival_time",
                "departure_time",
                "stop_id",
                "stop_sequence",
            ],
            trips.iter().flat_map(|aligned| {
                aligned
                    .stops()
                    .map(move |(stop_sequence, stop_id, slot)| StopTimeRow {
                        trip_id: &aligned.trip.id,
                        arrival_time: &slot.arrival_time,
                        departure_time: &slot.departure_time,
                        stop_id,
                        stop_sequence,
                    })
            }),
        )
    }

    pub fn write_calendar(&self, calendars: &[ServiceCalendar]) -> Result<usize> {
        self.write_table(
            CALENDAR_FILE,
            &[
                "service_id",
                "monday",
                "tuesday",
                "wednesday",
                "thursday",
                "friday",
                "saturday",
                "sunday",
                "start_date",
                "end_date",
            ],
            calendars.iter().map(CalendarRow::from),
        )
    }

    pub fn write_agency(&self) -> Result<usize> {
        let agency = &self.profile.agency;
        self.write_table(
            AGENCY_FILE,
            &["agency_id", "agency_name", "agency_url", "agency_timezone"],
            [AgencyRow {
                agency_id: &agency.id,
                agency_name: &agency.name,
                agency_url: &agency.url,
                agency_timezone: &agency.timezone,
            }],
        )
    }

    /// Two rows per distinct pole name: the name itself and the reading of
    /// the owning stop. Only the first pole carrying a name counts, and it
    /// is skipped when its stop is unknown.
    pub fn write_translations(&self, tables: &ReferenceTables) -> Result<usize> {
        let mut seen = HashSet::new();
        let mut rows = vec![];
        for pole in tables.poles() {
            if !seen.insert(pole.name.as_str()) {
                continue;
            }
            let Some(stop) = tables.stop(&pole.stop_id) else {
                debug!("pole {}: stop {} unknown, no translation", pole.id, pole.stop_id);
                continue;
            };
            rows.push(TranslationRow {
                table_name: "stops",
                field_name: "stop_name",
                language: "ja",
                field_value: &pole.name,
                translation: &pole.name,
            });
            rows.push(TranslationRow {
                table_name: "stops",
                field_name: "stop_name",
                language: "ja-Hrkt",
                field_value: &pole.name,
                translation: &stop.phonetic_name,
            });
        }
        self.write_table(
            TRANSLATIONS_FILE,
            &[
                "table_name",
                "field_name",
                "language",
                "field_value",
                "translation",
            ],
            rows,
        )
    }

    pub fn write_feed_info(&self, window: &FeedWindow) -> Result<usize> {
        let publisher = &self.profile.publisher;
        self.write_table(
            FEED_INFO_FILE,
            &[
                "feed_publisher_name",
                "feed_publisher_url",
                "feed_lang",
                "feed_start_date",
                "feed_end_date",
                "feed_version",
            ],
            [FeedInfoRow {
                feed_publisher_name: &publisher.name,
                feed_publisher_url: &publisher.url,
                feed_lang: &publisher.lang,
                feed_start_date: format_date(window.start_date),
                feed_end_date: format_date(window.end_date),
                feed_version: &window.version,
            }],
        )
    }

    /// Writes the two tables that do not depend on the timetable and logs
    /// where the feed goes.
    pub fn write_static(&self, window: &FeedWindow) -> Result<()> {
        info!("writing feed to {}", self.out_dir.display());
        self.write_agency()?;
        self.write_feed_info(window)?;
        Ok(())
    }
}
