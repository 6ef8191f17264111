use std::path::PathBuf;

/// A record shorter than the structure its table declares. The record is
/// skipped, the run goes on.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("{table} line {line}: {field_count} fields, expected at least {expected}")]
pub struct MalformedRecord {
    pub table: &'static str,
    pub line: usize,
    pub field_count: usize,
    pub expected: usize,
}

/// A trip with more stop times than its route's itinerary has stops.
/// `expected` is 0 when the route is unknown.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("trip {trip_id}: {observed} stop times but the route itinerary has {expected} stops")]
pub struct AlignmentMismatch {
    pub trip_id: String,
    pub observed: usize,
    pub expected: usize,
}

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("input file does not exist: {}", .0.display())]
    MissingInput(PathBuf),
    #[error("reading {}: {source}", .path.display())]
    InputRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    MalformedRecord(#[from] MalformedRecord),
    #[error(transparent)]
    AlignmentMismatch(#[from] AlignmentMismatch),
    #[error("reading profile {}: {source}", .path.display())]
    ProfileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("parsing profile: {0}")]
    Profile(#[from] ron::de::SpannedError),
    #[error("writing feed: {0}")]
    Csv(#[from] csv::Error),
    #[error("writing output: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
