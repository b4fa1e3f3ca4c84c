use std::io::{BufWriter, Write};

use serde::Serialize;

use crate::config::FilterParams;
use crate::error::Result;
use crate::manifest::ManifestEntry;
use crate::run::RunResult;
use crate::stats::{RunTotals, SampleStats};

#[derive(Serialize)]
pub struct Report<'a> {
    pub summary: RunTotals,
    pub phred_offset: i32,
    pub params: &'a FilterParams,
    pub samples: Vec<&'a SampleStats>,
    pub outputs: &'a [ManifestEntry],
}

impl<'a> Report<'a> {
    pub fn new(result: &'a RunResult, params: &'a FilterParams, phred_offset: i32) -> Self {
        Self {
            summary: result.totals(),
            phred_offset,
            params,
            samples: result.stats.values().collect(),
            outputs: &result.manifest,
        }
    }
}

pub fn write_json_report<W: Write>(writer: W, report: &Report) -> Result<()> {
    let mut f = BufWriter::new(writer);
    serde_json::to_writer_pretty(&mut f, report)?;
    f.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::Disposition;

    #[test]
    fn json_layout() {
        let mut foo = SampleStats::new("foo");
        foo.record(Disposition::Kept);
        let mut result = RunResult::default();
        result.stats.insert("foo".into(), foo);
        result.manifest.push(ManifestEntry {
            sample_id: "foo".into(),
            filename: "foo_0_L001_R1_001.fastq.gz".into(),
            direction: "forward".into(),
        });
        let params = FilterParams::default();

        let value = serde_json::to_value(Report::new(&result, &params, 33)).unwrap();
        assert_eq!(value["phred_offset"], 33);
        assert_eq!(value["summary"]["total_retained_reads"], 1);
        assert_eq!(value["params"]["quality_window"], 3);
        assert_eq!(value["samples"][0]["sample-id"], "foo");
        assert_eq!(value["outputs"][0]["filename"], "foo_0_L001_R1_001.fastq.gz");
    }
}
