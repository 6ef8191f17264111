//! One conversion run: load the reference tables, decode the timetable,
//! align trips on their route itineraries, then write the feed.

use std::collections::HashSet;
use std::fmt;
use std::path::PathBuf;

use chrono::NaiveDate;
use diafeed_model::{format_date, FeedWindow, ServiceCalendar, Trip};
use log::{debug, info, warn};
use multimap::MultiMap;

use crate::aligner::RouteStopAligner;
use crate::decoder::{TimetableDecoder, UnmappedDayType};
use crate::emitter::FeedEmitter;
use crate::error::{AlignmentMismatch, MalformedRecord, Result};
use crate::profile::FormatProfile;
use crate::reference::{Generation, ReferenceTables};
use crate::source::{read_records, InputEncoding, InputSet};

#[derive(Debug, Clone)]
pub struct ConversionRequest {
    pub input_dir: PathBuf,
    pub out_dir: PathBuf,
    pub profile: FormatProfile,
    pub encoding: InputEncoding,
    /// Anchors the feed window.
    pub today: NaiveDate,
}

/// Several timetable rows that produce the same trip id. Only the row on
/// the first line is kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TripIdCollision {
    pub trip_id: String,
    pub lines: Vec<usize>,
}

impl fmt::Display for TripIdCollision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let lines: Vec<_> = self.lines.iter().map(usize::to_string).collect();
        write!(
            f,
            "trip id {} produced by timetable lines {}",
            self.trip_id,
            lines.join(", ")
        )
    }
}

#[derive(Debug, Clone, Default)]
pub struct ConversionReport {
    pub stops: usize,
    pub poles: usize,
    pub routes: usize,
    pub decoded_trips: usize,
    pub trips: usize,
    pub stop_times: usize,
    pub calendars: usize,
    pub translations: usize,
    pub placeholders: usize,
    pub remarks: usize,
    /// Rows that had no stop block, hence no trip id.
    pub without_id: usize,
    pub malformed: Vec<MalformedRecord>,
    pub unmapped_day_types: Vec<UnmappedDayType>,
    pub collisions: Vec<TripIdCollision>,
    pub alignment_failures: Vec<AlignmentMismatch>,
    pub halted: bool,
    pub window: Option<FeedWindow>,
}

impl ConversionReport {
    /// The mismatch that stopped a halted run.
    pub fn halting_mismatch(&self) -> Option<&AlignmentMismatch> {
        if self.halted {
            self.alignment_failures.first()
        } else {
            None
        }
    }
}

impl fmt::Display for ConversionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "== Conversion summary ==")?;
        if let Some(window) = &self.window {
            writeln!(
                f,
                "feed {} valid {} to {}",
                window.version,
                format_date(window.start_date),
                format_date(window.end_date)
            )?;
        }
        writeln!(
            f,
            "loaded {} stops, {} poles, {} routes",
            self.stops, self.poles, self.routes
        )?;
        writeln!(
            f,
            "decoded {} trips ({} placeholder rows, {} remark rows, {} without stops)",
            self.decoded_trips, self.placeholders, self.remarks, self.without_id
        )?;
        writeln!(
            f,
            "wrote {} trips, {} stop times, {} calendars, {} translations",
            self.trips, self.stop_times, self.calendars, self.translations
        )?;
        if !self.malformed.is_empty() {
            writeln!(f, "{} malformed records skipped", self.malformed.len())?;
        }
        if !self.unmapped_day_types.is_empty() {
            writeln!(
                f,
                "{} trips with an unmapped day type",
                self.unmapped_day_types.len()
            )?;
        }
        for collision in &self.collisions {
            writeln!(f, "{collision}")?;
        }
        for mismatch in &self.alignment_failures {
            writeln!(f, "{mismatch}")?;
        }
        if self.halted {
            writeln!(f, "alignment halted, later trips have no stop times")?;
        }
        Ok(())
    }
}

/// State of a single run, passed along the phases.
pub struct PipelineContext<'a> {
    request: &'a ConversionRequest,
    inputs: InputSet,
    tables: ReferenceTables,
    report: ConversionReport,
}

impl<'a> PipelineContext<'a> {
    /// Fails when a master table is missing, before anything is read.
    pub fn new(request: &'a ConversionRequest) -> Result<Self> {
        let inputs = InputSet::locate(&request.input_dir, &request.profile.files)?;
        Ok(Self {
            request,
            inputs,
            tables: ReferenceTables::new(),
            report: ConversionReport::default(),
        })
    }

    fn profile(&self) -> &'a FormatProfile {
        &self.request.profile
    }

    pub fn load_reference(&mut self) -> Result<()> {
        let profile = self.profile();
        let encoding = self.request.encoding;

        let records = read_records(&self.inputs.stops, encoding)?;
        let skipped = self.tables.load_stops(&records, profile);
        self.report.malformed.extend(skipped);

        let records = read_records(&self.inputs.poles, encoding)?;
        let skipped = self.tables.load_poles(&records, profile);
        self.report.malformed.extend(skipped);

        let records = read_records(&self.inputs.routes, encoding)?;
        let skipped = self.tables.load_routes(&records);
        self.report.malformed.extend(skipped);

        let records = read_records(&self.inputs.itineraries, encoding)?;
        let skipped = self.tables.load_itineraries(&records, profile);
        self.report.malformed.extend(skipped);

        self.report.stops = self.tables.stop_count();
        self.report.poles = self.tables.poles().len();
        self.report.routes = self.tables.routes().len();
        info!(
            "loaded {} stops, {} poles, {} routes",
            self.report.stops, self.report.poles, self.report.routes
        );
        Ok(())
    }

    /// Feed window from the processing date, versioned by the generation
    /// master.
    pub fn feed_window(&mut self) -> Result<FeedWindow> {
        let records = read_records(&self.inputs.generation, self.request.encoding)?;
        let generation = Generation::from_records(&records).unwrap_or_else(|err| {
            warn!("{err}, feed version left empty");
            self.report.malformed.push(err);
            Generation::default()
        });
        info!("generation {}", generation.version);
        let window = FeedWindow::anchored_at(self.request.today, generation.version);
        self.report.window = Some(window.clone());
        Ok(window)
    }

    pub fn decode_timetable(&mut self) -> Result<Vec<Trip>> {
        let records = read_records(&self.inputs.timetable, self.request.encoding)?;
        let decoded = TimetableDecoder::new(self.profile()).decode(&records);
        self.report.decoded_trips = decoded.trips.len();
        self.report.placeholders = decoded.placeholders;
        self.report.malformed.extend(decoded.malformed);
        self.report.unmapped_day_types = decoded.unmapped_day_types;
        Ok(decoded.trips)
    }

    /// Trips that go to the feed: with an id, not remarks, first of their
    /// id.
    pub fn select_trips<'t>(&mut self, trips: &'t [Trip]) -> Vec<&'t Trip> {
        let profile = self.profile();
        let mut candidates = vec![];
        for trip in trips {
            if profile.is_remark(&trip.record_kind) {
                self.report.remarks += 1;
            } else if !trip.has_id() {
                self.report.without_id += 1;
            } else {
                candidates.push(trip);
            }
        }

        let mut lines_by_id = MultiMap::new();
        for trip in &candidates {
            lines_by_id.insert(trip.id.as_str(), trip.line);
        }
        let mut collisions: Vec<_> = lines_by_id
            .iter_all()
            .filter(|(_, lines)| lines.len() > 1)
            .map(|(trip_id, lines)| TripIdCollision {
                trip_id: (*trip_id).to_owned(),
                lines: lines.clone(),
            })
            .collect();
        collisions.sort_by_key(|collision| collision.lines[0]);
        for collision in &collisions {
            warn!("{collision}, keeping line {}", collision.lines[0]);
        }
        self.report.collisions = collisions;

        let mut seen = HashSet::new();
        candidates.retain(|trip| seen.insert(trip.id.as_str()));
        candidates
    }

    /// Aligns and writes every table. The report says whether alignment
    /// halted.
    pub fn emit(&mut self, trips: &[&Trip], window: &FeedWindow) -> Result<()> {
        let profile = self.profile();
        let emitter = FeedEmitter::create(&self.request.out_dir, profile)?;
        emitter.write_static(window)?;
        emitter.write_stops(&self.tables)?;
        emitter.write_routes(&self.tables)?;
        self.report.translations = emitter.write_translations(&self.tables)?;
        let calendars = ServiceCalendar::fixed_set(window, &profile.service_labels);
        for calendar in &calendars {
            debug!("service {} runs {}", calendar.service_id, calendar.weekdays);
        }
        self.report.calendars = emitter.write_calendar(&calendars)?;

        let alignment =
            RouteStopAligner::new(&self.tables, profile).align(trips.iter().copied(), profile.on_mismatch);
        let failed: HashSet<&str> = alignment
            .failures
            .iter()
            .map(|mismatch| mismatch.trip_id.as_str())
            .collect();
        let kept: Vec<&Trip> = trips
            .iter()
            .copied()
            .filter(|trip| !failed.contains(trip.id.as_str()))
            .collect();
        self.report.trips = emitter.write_trips(&kept, &self.tables)?;
        self.report.stop_times = emitter.write_stop_times(&alignment.trips)?;
        self.report.halted = alignment.halted;
        self.report.alignment_failures = alignment.failures;
        Ok(())
    }

    pub fn finish(self) -> ConversionReport {
        self.report
    }
}

/// Runs every phase, naming each one to `progress` as it starts.
///
/// A halted alignment is not an error here: the feed is complete apart
/// from the stop times of the failing trip and those after it, and the
/// report carries the mismatch.
pub fn convert(
    request: &ConversionRequest,
    progress: &mut dyn FnMut(&'static str),
) -> Result<ConversionReport> {
    progress("Checking inputs");
    let mut context = PipelineContext::new(request)?;
    progress("Loading reference tables");
    context.load_reference()?;
    let window = context.feed_window()?;
    progress("Decoding timetable");
    let decoded = context.decode_timetable()?;
    let trips = context.select_trips(&decoded);
    progress("Writing feed");
    context.emit(&trips, &window)?;
    Ok(context.finish())
}
