//! Tab separated records and the repeating blocks they carry.

use crate::error::MalformedRecord;

/// One line of a master table, split on tabs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    /// 1-based line number in the source file.
    pub line: usize,
    pub fields: Vec<String>,
}

impl Record {
    pub fn parse(line: usize, text: &str) -> Self {
        Self {
            line,
            fields: text.split('\t').map(str::to_owned).collect(),
        }
    }

    pub fn from_fields<I, S>(line: usize, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            line,
            fields: fields.into_iter().map(Into::into).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn field(&self, index: usize) -> Option<&str> {
        self.fields.get(index).map(String::as_str)
    }

    /// Field at `index`, or the error describing why this record cannot be
    /// used.
    pub fn require(&self, table: &'static str, index: usize) -> Result<&str, MalformedRecord> {
        self.field(index).ok_or(MalformedRecord {
            table,
            line: self.line,
            field_count: self.len(),
            expected: index + 1,
        })
    }

    /// Fields after the last complete block.
    pub fn trailing_fields(&self, start: usize, width: usize) -> usize {
        self.len().saturating_sub(start) % width.max(1)
    }

    /// Complete blocks of `width` fields from field `start` on. A partial
    /// block at the end of the record is not yielded.
    pub fn blocks(&self, start: usize, width: usize) -> impl Iterator<Item = Block<'_>> {
        let tail = self.fields.get(start..).unwrap_or(&[]);
        tail.chunks_exact(width.max(1))
            .enumerate()
            .map(|(index, fields)| Block { index, fields })
    }
}

/// One repetition of a record's block structure.
#[derive(Debug, Clone, Copy)]
pub struct Block<'a> {
    pub index: usize,
    fields: &'a [String],
}

impl<'a> Block<'a> {
    pub fn get(&self, offset: usize) -> Option<&'a str> {
        self.fields.get(offset).map(String::as_str)
    }

    /// Like [`Block::get`], empty when the offset lies outside the block.
    pub fn get_or_empty(&self, offset: usize) -> &'a str {
        self.get(offset).unwrap_or_default()
    }
}

/// Splits decoded file contents into records, skipping empty lines. A
/// line of tabs is a record whose fields are all empty.
pub fn parse_records(text: &str) -> Vec<Record> {
    text.lines()
        .enumerate()
        .filter(|(_, line)| !line.is_empty())
        .map(|(index, line)| Record::parse(index + 1, line))
        .collect()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn parse_line() {
        let record = Record::parse(3, "a\tb\t\tc");
        assert_eq!(record.line, 3);
        assert_eq!(record.fields, ["a", "b", "", "c"]);
        assert_eq!(record.field(2), Some(""));
        assert_eq!(record.field(4), None);
    }

    #[test]
    fn require_reports_shape() {
        let record = Record::parse(7, "x\ty");
        assert_eq!(record.require("stops", 1), Ok("y"));
        assert_eq!(
            record.require("stops", 3),
            Err(MalformedRecord {
                table: "stops",
                line: 7,
                field_count: 2,
                expected: 4,
            })
        );
    }

    #[test]
    fn blocks_in_order() {
        let record = Record::from_fields(1, ["h0", "h1", "a", "b", "c", "d", "e"]);
        let blocks: Vec<_> = record
            .blocks(2, 2)
            .map(|block| (block.index, block.get_or_empty(0), block.get_or_empty(1)))
            .collect();
        assert_eq!(blocks, [(0, "a", "b"), (1, "c", "d")]);
        assert_eq!(record.trailing_fields(2, 2), 1);
    }

    #[test]
    fn no_blocks_past_end() {
        let record = Record::from_fields(1, ["h0", "h1"]);
        assert_eq!(record.blocks(5, 5).count(), 0);
        assert_eq!(record.trailing_fields(5, 5), 0);
    }

    #[test]
    fn block_offset_outside() {
        let record = Record::from_fields(1, ["a", "b"]);
        let block = record.blocks(0, 2).next().unwrap();
        assert_eq!(block.get(2), None);
        assert_eq!(block.get_or_empty(2), "");
    }

    #[test]
    fn records_from_text() {
        let records = parse_records("1\ta\r\n\r\n2\tb\n");
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].fields, ["1", "a"]);
        assert_eq!(records[1].line, 3);
        assert_eq!(records[1].fields, ["2", "b"]);
    }

    #[test]
    fn tab_only_line_is_a_record() {
        let records = parse_records("\t\t\t\t\t\t\n0\t1\n");
        let shapes: Vec<_> = records.iter().map(|r| (r.line, r.len())).collect();
        assert_eq!(shapes, [(1, 7), (2, 2)]);
        assert!(records[0].fields.iter().all(String::is_empty));
    }
}
