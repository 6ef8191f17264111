//! Locating and decoding the master tables.

use std::path::{Path, PathBuf};

use log::{debug, warn};

use crate::error::{Error, Result};
use crate::profile::InputFiles;
use crate::record::{parse_records, Record};

#[derive(clap::ValueEnum, Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum InputEncoding {
    #[default]
    ShiftJis,
    #[value(name = "utf-8")]
    Utf8,
}

impl InputEncoding {
    fn encoding(&self) -> &'static encoding_rs::Encoding {
        match self {
            InputEncoding::ShiftJis => encoding_rs::SHIFT_JIS,
            InputEncoding::Utf8 => encoding_rs::UTF_8,
        }
    }

    pub fn decode(&self, bytes: &[u8]) -> (String, bool) {
        let (text, _, had_errors) = self.encoding().decode(bytes);
        (text.into_owned(), had_errors)
    }
}

/// Paths of the six master tables, all known to exist.
#[derive(Debug, Clone)]
pub struct InputSet {
    pub stops: PathBuf,
    pub poles: PathBuf,
    pub routes: PathBuf,
    pub itineraries: PathBuf,
    pub timetable: PathBuf,
    pub generation: PathBuf,
}

impl InputSet {
    /// Fails on the first missing table, before anything is read.
    pub fn locate(dir: &Path, files: &InputFiles) -> Result<Self> {
        Ok(Self {
            stops: require_file(dir, &files.stops)?,
            poles: require_file(dir, &files.poles)?,
            routes: require_file(dir, &files.routes)?,
            itineraries: require_file(dir, &files.itineraries)?,
            timetable: require_file(dir, &files.timetable)?,
            generation: require_file(dir, &files.generation)?,
        })
    }
}

fn require_file(dir: &Path, name: &str) -> Result<PathBuf> {
    let path = dir.join(name);
    if path.is_file() {
        Ok(path)
    } else {
        Err(Error::MissingInput(path))
    }
}

pub fn read_records(path: &Path, encoding: InputEncoding) -> Result<Vec<Record>> {
    let bytes = std::fs::read(path).map_err(|source| Error::InputRead {
        path: path.to_owned(),
        source,
    })?;
    let (text, had_errors) = encoding.decode(&bytes);
    if had_errors {
        warn!(
            "{}: some bytes are not valid {encoding:?}, replaced",
            path.display()
        );
    }
    let records = parse_records(&text);
    debug!("{}: {} records", path.display(), records.len());
    Ok(records)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn decode_shift_jis() {
        // "八戸" in Shift_JIS
        let bytes = [0x94, 0xaa, 0x8c, 0xcb];
        let (text, had_errors) = InputEncoding::ShiftJis.decode(&bytes);
        assert_eq!(text, "八戸");
        assert!(!had_errors);
    }

    #[test]
    fn decode_utf8() {
        let (text, had_errors) = InputEncoding::Utf8.decode("八戸\t1".as_bytes());
        assert_eq!(text, "八戸\t1");
        assert!(!had_errors);
    }

    #[test]
    fn locate_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let files = InputFiles::default();
        std::fs::write(dir.path().join(&files.stops), "").unwrap();
        let err = InputSet::locate(dir.path(), &files).unwrap_err();
        match err {
            Error::MissingInput(path) => assert_eq!(path, dir.path().join(&files.poles)),
            other => panic!("unexpected error {other}"),
        }
    }

    #[test]
    fn read_numbered_records() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.tsv");
        std::fs::write(&path, "0\t1\r\n0\t2\r\n").unwrap();
        let records = read_records(&path, InputEncoding::Utf8).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].line, 2);
        assert_eq!(records[1].fields, ["0", "2"]);
    }
}
