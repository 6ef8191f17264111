//! Stops, poles and routes, loaded once before the timetable.

use std::collections::HashMap;

use diafeed_model::{Pole, Route, Stop};
use log::{debug, warn};

use crate::error::MalformedRecord;
use crate::profile::FormatProfile;
use crate::record::Record;

pub const STOP_TABLE: &str = "stop master";
pub const POLE_TABLE: &str = "pole master";
pub const ROUTE_TABLE: &str = "route master";
pub const ITINERARY_TABLE: &str = "route itinerary";
pub const GENERATION_TABLE: &str = "generation master";

#[derive(Debug, Default)]
pub struct ReferenceTables {
    stops: HashMap<String, Stop>,
    poles: Vec<Pole>,
    routes: Vec<Route>,
    route_index: HashMap<String, usize>,
}

impl ReferenceTables {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop(&self, id: &str) -> Option<&Stop> {
        self.stops.get(id)
    }

    pub fn stop_count(&self) -> usize {
        self.stops.len()
    }

    pub fn poles(&self) -> &[Pole] {
        &self.poles
    }

    /// Routes in order of first appearance in the route master.
    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    pub fn route(&self, id: &str) -> Option<&Route> {
        self.route_index.get(id).map(|index| &self.routes[*index])
    }

    fn route_mut(&mut self, id: &str) -> Option<&mut Route> {
        let index = *self.route_index.get(id)?;
        self.routes.get_mut(index)
    }

    pub fn insert_stop(&mut self, stop: Stop) {
        self.stops.insert(stop.id.clone(), stop);
    }

    pub fn push_pole(&mut self, pole: Pole) {
        self.poles.push(pole);
    }

    /// A route id seen again replaces the earlier route but keeps its
    /// position.
    pub fn insert_route(&mut self, route: Route) {
        match self.route_index.get(&route.id) {
            Some(index) => self.routes[*index] = route,
            None => {
                self.route_index.insert(route.id.clone(), self.routes.len());
                self.routes.push(route);
            }
        }
    }

    pub fn load_stops(&mut self, records: &[Record], profile: &FormatProfile) -> Vec<MalformedRecord> {
        load_each(records, |record| {
            let stop = Stop {
                id: profile.stop_id(record.require(STOP_TABLE, 1)?),
                name: record.require(STOP_TABLE, 2)?.to_owned(),
                phonetic_name: record.require(STOP_TABLE, 3)?.to_owned(),
            };
            self.insert_stop(stop);
            Ok(())
        })
    }

    pub fn load_poles(&mut self, records: &[Record], profile: &FormatProfile) -> Vec<MalformedRecord> {
        load_each(records, |record| {
            let pole = Pole {
                id: profile.pole_id(record.require(POLE_TABLE, 1)?),
                stop_id: profile.stop_id(record.require(POLE_TABLE, 2)?),
                name: record.require(POLE_TABLE, 4)?.to_owned(),
            };
            self.push_pole(pole);
            Ok(())
        })
    }

    pub fn load_routes(&mut self, records: &[Record]) -> Vec<MalformedRecord> {
        load_each(records, |record| {
            let route = Route::new(
                record.require(ROUTE_TABLE, 1)?,
                record.require(ROUTE_TABLE, 5)?,
            );
            self.insert_route(route);
            Ok(())
        })
    }

    /// Fills each route's stop codes and long name from the itinerary
    /// table. Must run after [`ReferenceTables::load_routes`].
    pub fn load_itineraries(&mut self, records: &[Record], profile: &FormatProfile) -> Vec<MalformedRecord> {
        let layout = &profile.itinerary;
        load_each(records, |record| {
            let route_id = record.require(ITINERARY_TABLE, layout.route_id)?;
            let destination = record.require(ITINERARY_TABLE, layout.destination)?;
            let Some(route) = self.route_mut(route_id) else {
                warn!(
                    "{ITINERARY_TABLE} line {}: unknown route {route_id}, ignored",
                    record.line
                );
                return Ok(());
            };

            let mut markers: Vec<&str> = vec![];
            route.stop_ids = record
                .blocks(layout.first_block, layout.block_width)
                .map(|block| {
                    let marker = block.get_or_empty(layout.marker_offset);
                    if !marker.is_empty() && !markers.contains(&marker) {
                        markers.push(marker);
                    }
                    block.get_or_empty(layout.stop_offset).to_owned()
                })
                .collect();
            route.destination = destination.to_owned();
            route.long_name = markers.join(&profile.marker_separator);
            if !route.long_name.is_empty() && !route.destination.is_empty() {
                route.long_name.push(' ');
                route.long_name.push_str(&route.destination);
            }
            debug!(
                "route {}: {} stops, long name {:?}",
                route.id,
                route.stop_ids.len(),
                route.long_name
            );
            Ok(())
        })
    }
}

/// Header of the generation master. Only the version label is used; the
/// feed window does not follow the export's own start date.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Generation {
    pub version: String,
}

impl Generation {
    pub fn from_records(records: &[Record]) -> Result<Self, MalformedRecord> {
        let Some(record) = records.first() else {
            return Err(MalformedRecord {
                table: GENERATION_TABLE,
                line: 1,
                field_count: 0,
                expected: 2,
            });
        };
        Ok(Self {
            version: record.require(GENERATION_TABLE, 1)?.to_owned(),
        })
    }
}

fn load_each<F>(records: &[Record], mut load: F) -> Vec<MalformedRecord>
where
    F: FnMut(&Record) -> Result<(), MalformedRecord>,
{
    records
        .iter()
        .filter_map(|record| load(record).err())
        .inspect(|err| warn!("{err}, record skipped"))
        .collect()
}
