//! Streaming per-key min/mean/max over `<key>;<value>` lines.
//!
//! The pipeline is `ChunkReader` -> `parser::parse` -> `StationTable::update`
//! for every line of the source, followed by one `report::generate` pass.
//! Memory use is one read buffer plus one entry per distinct key.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use tracing::{debug, info};

pub mod config;
pub mod error;
pub mod parser;
pub mod reader;
pub mod report;
pub mod table;
pub mod value;

pub use config::{MalformedPolicy, Options, TrailingLine};
pub use error::{DecodeError, Error, ParseError, Result};
pub use reader::ChunkReader;
pub use table::{Aggregate, StationTable};
pub use value::Tenths;

/// Counters collected during one ingestion run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestStats {
    pub bytes: u64,
    pub batches: u64,
    pub records: u64,
    pub skipped: u64,
}

#[derive(Debug)]
pub struct Ingested {
    pub table: StationTable,
    pub stats: IngestStats,
}

/// Reads `source` to the end and folds every record into a fresh table.
pub fn aggregate<R: Read>(source: R, options: &Options) -> Result<Ingested> {
    let mut reader = ChunkReader::new(source, options.buffer_capacity, options.trailing_line);
    let mut table = StationTable::new();
    let mut stats = IngestStats::default();
    let mut line: u64 = 0;

    while let Some(batch) = reader.next_batch()? {
        stats.batches += 1;
        for bytes in batch.lines() {
            line += 1;
            match parser::parse(bytes, options.validate) {
                Ok(record) => {
                    table.update(record.key, record.value);
                    stats.records += 1;
                }
                Err(source) => match options.on_malformed {
                    MalformedPolicy::Abort => return Err(Error::Malformed { line, source }),
                    MalformedPolicy::Skip => {
                        stats.skipped += 1;
                        debug!(line, error = %source, "skipping malformed record");
                    }
                },
            }
        }
    }
    stats.bytes = reader.bytes_read();

    info!(
        bytes = stats.bytes,
        records = stats.records,
        skipped = stats.skipped,
        keys = table.len(),
        "ingestion finished"
    );
    Ok(Ingested { table, stats })
}

/// Opens `path` and runs [`aggregate`] over it.
pub fn aggregate_path<P: AsRef<Path>>(path: P, options: &Options) -> Result<Ingested> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| Error::Open {
        path: path.to_path_buf(),
        source,
    })?;
    aggregate(file, options)
}

/// Aggregates `source` and renders the sorted report.
pub fn solve<R: Read>(source: R, options: &Options) -> Result<Vec<u8>> {
    let ingested = aggregate(source, options)?;
    Ok(report::generate(&ingested.table))
}

pub fn solve_path<P: AsRef<Path>>(path: P, options: &Options) -> Result<Vec<u8>> {
    let ingested = aggregate_path(path, options)?;
    Ok(report::generate(&ingested.table))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::tests::Trickle;
    use findlib::{cases, read_file};

    const SAMPLE: &str = "Beijing;70.5\nNew York;70.5\nBeijing;-10.2\n";

    fn text(report: Vec<u8>) -> String {
        String::from_utf8(report).unwrap()
    }

    fn t(v: i16) -> Tenths {
        Tenths::new(v).unwrap()
    }

    #[test]
    fn end_to_end_sample() {
        let ingested = aggregate(SAMPLE.as_bytes(), &Options::default()).unwrap();

        let beijing = ingested.table.get(b"Beijing").unwrap();
        assert_eq!(beijing.count(), 2);
        assert_eq!(beijing.sum(), 603);
        assert_eq!(beijing.min(), t(-102));
        assert_eq!(beijing.max(), t(705));

        let new_york = ingested.table.get(b"New York").unwrap();
        assert_eq!(new_york.count(), 1);
        assert_eq!(new_york.sum(), 705);
        assert_eq!(new_york.min(), t(705));
        assert_eq!(new_york.max(), t(705));

        assert_eq!(ingested.stats.records, 3);
        assert_eq!(ingested.stats.bytes, SAMPLE.len() as u64);

        assert_eq!(
            text(report::generate(&ingested.table)),
            "Beijing;-10.2;30.2;70.5\nNew York;70.5;70.5;70.5"
        );
    }

    #[test]
    fn empty_input_gives_empty_report() {
        assert_eq!(text(solve(&b""[..], &Options::default()).unwrap()), "");
    }

    #[test]
    fn split_reads_match_single_read() {
        let input = "Ḩamīdīyeh;12.3\nBeijing;70.5\nNew York;-0.5\nBeijing;-10.2\n\
                     Ḩamīdīyeh;-99.9\nNew York;99.9\nA;1.0\n";
        let options = Options::default();
        let want = solve(input.as_bytes(), &options).unwrap();

        // one break at every offset
        for at in 0..=input.len() {
            let (head, tail) = input.as_bytes().split_at(at);
            let got = solve(head.chain(tail), &options).unwrap();
            assert_eq!(got, want, "break at {at}");
        }

        // many breaks with a buffer barely larger than the longest line
        for step in 1..=input.len() {
            let small = options.clone().buffer_capacity(24);
            let got = solve(Trickle::new(input.as_bytes(), step), &small).unwrap();
            assert_eq!(got, want, "step {step}");
        }
    }

    #[test]
    fn unterminated_last_record() {
        let input = "A;1.0\nB;2.0";
        let processed = solve(input.as_bytes(), &Options::default()).unwrap();
        assert_eq!(text(processed), "A;1.0;1.0;1.0\nB;2.0;2.0;2.0");

        let dropped = solve(
            input.as_bytes(),
            &Options::default().trailing_line(TrailingLine::Drop),
        )
        .unwrap();
        assert_eq!(text(dropped), "A;1.0;1.0;1.0");
    }

    #[test]
    fn malformed_record_aborts_by_default() {
        let input = "A;1.0\nB;1x0\nC;3.0\n";
        match aggregate(input.as_bytes(), &Options::default()) {
            Err(Error::Malformed { line, source }) => {
                assert_eq!(line, 2);
                assert_eq!(source, ParseError::Value(DecodeError::Period { pos: 1 }));
            }
            other => panic!("expected Malformed, got {other:?}"),
        }
    }

    #[test]
    fn malformed_records_can_be_skipped() {
        let input = "A;1.0\n\n;2.0\nB;1x0\nno delimiter\nC;3.0\nA;-1.0\n";
        let options = Options::default().on_malformed(MalformedPolicy::Skip);
        let ingested = aggregate(input.as_bytes(), &options).unwrap();
        assert_eq!(ingested.stats.records, 3);
        assert_eq!(ingested.stats.skipped, 4);
        assert_eq!(
            text(report::generate(&ingested.table)),
            "A;-1.0;0.0;1.0\nC;3.0;3.0;3.0"
        );
    }

    #[test]
    fn trusted_mode_matches_validated_on_clean_input() {
        let trusted = Options::default().validate(false);
        assert_eq!(
            solve(SAMPLE.as_bytes(), &trusted).unwrap(),
            solve(SAMPLE.as_bytes(), &Options::default()).unwrap()
        );
    }

    #[test]
    fn long_line_is_reported() {
        let options = Options::default().buffer_capacity(8);
        assert!(matches!(
            aggregate("Constantinople;1.0\n".as_bytes(), &options),
            Err(Error::LineTooLong { offset: 0, capacity: 8 })
        ));
    }

    #[test]
    fn unterminated_line_may_fill_the_buffer() {
        let options = Options::default().buffer_capacity(8);
        let report = solve("abc;12.5".as_bytes(), &options).unwrap();
        assert_eq!(text(report), "abc;12.5;12.5;12.5");
    }

    #[test]
    fn missing_file_is_an_error() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../test_cases/does-not-exist.txt");
        assert!(matches!(
            solve_path(&path, &Options::default()),
            Err(Error::Open { .. })
        ));
    }

    #[test]
    fn test_solve() {
        let root = Path::new(env!("CARGO_MANIFEST_DIR")).join("../test_cases");
        let cases = cases(&root).unwrap_or_else(|e| panic!("walking test_cases: {e}"));
        assert!(!cases.is_empty(), "no cases under {}", root.display());
        for case in cases {
            let got = solve_path(&case.input, &Options::default())
                .unwrap_or_else(|e| panic!("solve failed for {}: {e}", case.name));
            let want = read_file(&case.expected);
            assert_eq!(want, text(got), "mismatch for {}", case.name)
        }
    }
}
