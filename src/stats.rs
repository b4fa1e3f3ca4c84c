use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::filter::Disposition;

pub const STATS_COLUMNS: [&str; 6] = [
    "sample-id",
    "total-input-reads",
    "total-retained-reads",
    "reads-truncated",
    "reads-too-short-after-truncation",
    "reads-exceeding-maximum-ambiguous-bases",
];

/// Filtering counters for one sample.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SampleStats {
    pub sample_id: String,
    pub total_input_reads: u64,
    pub total_retained_reads: u64,
    pub reads_truncated: u64,
    pub reads_too_short_after_truncation: u64,
    #[serde(rename = "reads-exceeding-maximum-ambiguous-bases")]
    pub reads_exceeding_max_ambiguous: u64,
}

impl SampleStats {
    pub fn new(sample_id: &str) -> Self {
        Self {
            sample_id: sample_id.to_string(),
            ..Default::default()
        }
    }

    /// Count one input read and its outcome.
    pub fn record(&mut self, disposition: Disposition) {
        self.total_input_reads += 1;
        if disposition.was_truncated() {
            self.reads_truncated += 1;
        }
        match disposition {
            Disposition::Kept | Disposition::RetainedAfterTruncation => {
                self.total_retained_reads += 1
            }
            Disposition::TruncatedTooShort => self.reads_too_short_after_truncation += 1,
            Disposition::TooManyAmbiguous { .. } => self.reads_exceeding_max_ambiguous += 1,
        }
    }

    pub fn as_row(&self) -> (&str, u64, u64, u64, u64, u64) {
        (
            &self.sample_id,
            self.total_input_reads,
            self.total_retained_reads,
            self.reads_truncated,
            self.reads_too_short_after_truncation,
            self.reads_exceeding_max_ambiguous,
        )
    }
}

/// Read counts summed over every sample of a run.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct RunTotals {
    pub samples: u64,
    pub samples_with_output: u64,
    pub total_input_reads: u64,
    pub total_retained_reads: u64,
    pub reads_truncated: u64,
    pub reads_too_short_after_truncation: u64,
    pub reads_exceeding_max_ambiguous: u64,
}

impl RunTotals {
    pub fn merge(&mut self, other: &SampleStats) {
        self.samples += 1;
        if other.total_retained_reads > 0 {
            self.samples_with_output += 1;
        }
        self.total_input_reads += other.total_input_reads;
        self.total_retained_reads += other.total_retained_reads;
        self.reads_truncated += other.reads_truncated;
        self.reads_too_short_after_truncation += other.reads_too_short_after_truncation;
        self.reads_exceeding_max_ambiguous += other.reads_exceeding_max_ambiguous;
    }
}

/// Write the stats table as CSV, one row per sample in iteration order.
pub fn write_stats<'a, W, I>(writer: W, stats: I) -> Result<()>
where
    W: io::Write,
    I: IntoIterator<Item = &'a SampleStats>,
{
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(STATS_COLUMNS)?;
    for row in stats {
        wtr.serialize(row.as_row())?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn read_stats(path: &Path) -> Result<Vec<SampleStats>> {
    let mut rdr = csv::Reader::from_path(path)?;
    let mut rows = Vec::new();
    for row in rdr.deserialize() {
        rows.push(row?);
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_follow_disposition() {
        let mut s = SampleStats::new("foo");
        s.record(Disposition::Kept);
        s.record(Disposition::TooManyAmbiguous { truncated: false });
        assert_eq!(s.as_row(), ("foo", 2, 1, 0, 0, 1));

        s.record(Disposition::RetainedAfterTruncation);
        s.record(Disposition::TruncatedTooShort);
        s.record(Disposition::TooManyAmbiguous { truncated: true });
        assert_eq!(s.as_row(), ("foo", 5, 2, 3, 1, 2));
        assert!(s.total_retained_reads <= s.total_input_reads);
    }

    #[test]
    fn csv_header_and_rows() {
        let mut foo = SampleStats::new("foo");
        foo.record(Disposition::Kept);
        let bar = SampleStats::new("bar");

        let mut buf = Vec::new();
        write_stats(&mut buf, [&bar, &foo]).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(
            lines[0],
            "sample-id,total-input-reads,total-retained-reads,reads-truncated,\
             reads-too-short-after-truncation,reads-exceeding-maximum-ambiguous-bases"
        );
        assert_eq!(lines[1], "bar,0,0,0,0,0");
        assert_eq!(lines[2], "foo,1,1,0,0,0");
    }

    #[test]
    fn csv_reads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stats.csv");
        let mut foo = SampleStats::new("foo");
        foo.record(Disposition::RetainedAfterTruncation);
        write_stats(std::fs::File::create(&path).unwrap(), [&foo]).unwrap();
        assert_eq!(read_stats(&path).unwrap(), vec![foo]);
    }

    #[test]
    fn totals_merge() {
        let mut a = SampleStats::new("a");
        a.record(Disposition::Kept);
        a.record(Disposition::TruncatedTooShort);
        let b = SampleStats::new("b");

        let mut totals = RunTotals::default();
        totals.merge(&a);
        totals.merge(&b);
        assert_eq!(totals.samples, 2);
        assert_eq!(totals.samples_with_output, 1);
        assert_eq!(totals.total_input_reads, 2);
        assert_eq!(totals.reads_truncated, 1);
    }
}
