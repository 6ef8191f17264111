//! The timetable's stop tokens are not the codes the feed uses. The stop
//! at position `i` of a trip is the route itinerary's `i`-th stop.

use diafeed_model::{StopTimeSlot, Trip};
use log::{info, warn};

use crate::error::AlignmentMismatch;
use crate::profile::{FormatProfile, MismatchPolicy};
use crate::reference::ReferenceTables;

/// A trip with the feed stop id of each of its slots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlignedTrip<'a> {
    pub trip: &'a Trip,
    pub stop_ids: Vec<String>,
}

impl<'a> AlignedTrip<'a> {
    /// `(stop_sequence, stop_id, slot)`, sequence starting at 1.
    pub fn stops(&self) -> impl Iterator<Item = (usize, &str, &'a StopTimeSlot)> + '_ {
        self.trip
            .stop_times
            .iter()
            .zip(&self.stop_ids)
            .enumerate()
            .map(|(index, (slot, stop_id))| (index + 1, stop_id.as_str(), slot))
    }
}

#[derive(Debug, Default)]
pub struct Alignment<'a> {
    pub trips: Vec<AlignedTrip<'a>>,
    pub failures: Vec<AlignmentMismatch>,
    /// Set when the halt policy stopped the pass early.
    pub halted: bool,
}

pub struct RouteStopAligner<'a> {
    tables: &'a ReferenceTables,
    profile: &'a FormatProfile,
}

impl<'a> RouteStopAligner<'a> {
    pub fn new(tables: &'a ReferenceTables, profile: &'a FormatProfile) -> Self {
        Self { tables, profile }
    }

    pub fn align<'t, I>(&self, trips: I, policy: MismatchPolicy) -> Alignment<'t>
    where
        I: IntoIterator<Item = &'t Trip>,
    {
        let mut alignment = Alignment::default();
        for trip in trips {
            match self.align_trip(trip) {
                Ok(stop_ids) => alignment.trips.push(AlignedTrip { trip, stop_ids }),
                Err(mismatch) => {
                    warn!("{mismatch}");
                    alignment.failures.push(mismatch);
                    if policy == MismatchPolicy::Halt {
                        alignment.halted = true;
                        break;
                    }
                }
            }
        }
        info!(
            "aligned {} trips, {} mismatches",
            alignment.trips.len(),
            alignment.failures.len()
        );
        alignment
    }

    /// Feed stop ids for each slot of `trip`, in slot order.
    pub fn align_trip(&self, trip: &Trip) -> Result<Vec<String>, AlignmentMismatch> {
        let itinerary: &[String] = match self.tables.route(&trip.route_id) {
            Some(route) => &route.stop_ids,
            None => {
                if !trip.stop_times.is_empty() {
                    warn!("trip {}: route {} is unknown", trip.id, trip.route_id);
                }
                &[]
            }
        };
        if trip.stop_times.len() > itinerary.len() {
            return Err(AlignmentMismatch {
                trip_id: trip.id.clone(),
                observed: trip.stop_times.len(),
                expected: itinerary.len(),
            });
        }
        Ok(itinerary
            .iter()
            .take(trip.stop_times.len())
            .map(|code| self.profile.itinerary_stop_id(code))
            .collect())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use diafeed_model::Route;

    fn tables() -> ReferenceTables {
        let mut tables = ReferenceTables::new();
        let mut route = Route::new("101", "Station line");
        route.stop_ids = vec!["1201001".into(), "1202001".into(), "1203001".into()];
        tables.insert_route(route);
        tables
    }

    fn trip(id: &str, route_id: &str, stops: usize) -> Trip {
        Trip {
            id: id.to_owned(),
            route_id: route_id.to_owned(),
            day_type: None,
            service_id: String::new(),
            record_kind: "3".to_owned(),
            line: 1,
            stop_times: (0..stops)
                .map(|i| StopTimeSlot::from_offsets(&format!("raw{i}"), "0", &(360 + i).to_string()))
                .collect(),
        }
    }

    #[test]
    fn stop_ids_follow_itinerary() {
        let tables = tables();
        let profile = FormatProfile::current();
        let aligner = RouteStopAligner::new(&tables, &profile);
        let trip = trip("t1", "101", 3);
        assert_eq!(
            aligner.align_trip(&trip).unwrap(),
            ["1201_001", "1202_001", "1203_001"]
        );
    }

    #[test]
    fn shorter_trip_uses_prefix() {
        let tables = tables();
        let profile = FormatProfile::legacy();
        let aligner = RouteStopAligner::new(&tables, &profile);
        assert_eq!(
            aligner.align_trip(&trip("t1", "101", 2)).unwrap(),
            ["1201001", "1202001"]
        );
    }

    #[test]
    fn longer_trip_is_mismatch() {
        let tables = tables();
        let profile = FormatProfile::current();
        let aligner = RouteStopAligner::new(&tables, &profile);
        assert_eq!(
            aligner.align_trip(&trip("t4", "101", 4)),
            Err(AlignmentMismatch {
                trip_id: "t4".to_owned(),
                observed: 4,
                expected: 3,
            })
        );
    }

    #[test]
    fn unknown_route_is_mismatch() {
        let tables = tables();
        let profile = FormatProfile::current();
        let aligner = RouteStopAligner::new(&tables, &profile);
        let err = aligner.align_trip(&trip("t", "999", 1)).unwrap_err();
        assert_eq!(err.expected, 0);
        assert!(aligner.align_trip(&trip("", "999", 0)).unwrap().is_empty());
    }

    #[test]
    fn halt_stops_at_first_mismatch() {
        let tables = tables();
        let profile = FormatProfile::legacy();
        let aligner = RouteStopAligner::new(&tables, &profile);
        let trips = [trip("a", "101", 3), trip("b", "101", 4), trip("c", "101", 2)];
        let alignment = aligner.align(&trips, MismatchPolicy::Halt);
        assert!(alignment.halted);
        assert_eq!(alignment.trips.len(), 1);
        assert_eq!(alignment.trips[0].trip.id, "a");
        assert_eq!(alignment.failures.len(), 1);
        assert_eq!(alignment.failures[0].trip_id, "b");
    }

    #[test]
    fn skip_continues_after_mismatch() {
        let tables = tables();
        let profile = FormatProfile::legacy();
        let aligner = RouteStopAligner::new(&tables, &profile);
        let trips = [trip("a", "101", 3), trip("b", "101", 4), trip("c", "101", 2)];
        let alignment = aligner.align(&trips, MismatchPolicy::Skip);
        assert!(!alignment.halted);
        let ids: Vec<_> = alignment.trips.iter().map(|t| t.trip.id.as_str()).collect();
        assert_eq!(ids, ["a", "c"]);
        assert_eq!(alignment.failures[0].trip_id, "b");
    }

    #[test]
    fn stops_are_numbered_from_one() {
        let tables = tables();
        let profile = FormatProfile::legacy();
        let aligner = RouteStopAligner::new(&tables, &profile);
        let trips = [trip("a", "101", 3)];
        let alignment = aligner.align(&trips, MismatchPolicy::Halt);
        let stops: Vec<_> = alignment.trips[0]
            .stops()
            .map(|(sequence, stop_id, slot)| (sequence, stop_id.to_owned(), slot.stop_token.clone()))
            .collect();
        assert_eq!(
            stops,
            [
                (1, "1201001".to_owned(), "raw0".to_owned()),
                (2, "1202001".to_owned(), "raw1".to_owned()),
                (3, "1203001".to_owned(), "raw2".to_owned()),
            ]
        );
    }
}
