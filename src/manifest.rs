//! Layout of demultiplexed sequence directories.
//!
//! A directory holds one FASTQ per sample, a `MANIFEST` CSV mapping sample
//! ids to file names, and a `metadata.yml` carrying the run's phred offset.

use std::collections::HashSet;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{FilterError, Result};

pub const MANIFEST_FILE: &str = "MANIFEST";
pub const METADATA_FILE: &str = "metadata.yml";
const PHRED_OFFSET_KEY: &str = "phred-offset";

/// One row of a `MANIFEST` file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ManifestEntry {
    pub sample_id: String,
    pub filename: String,
    pub direction: String,
}

/// One sample to filter: its id, its input file and its position in the
/// input manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleInput {
    pub index: usize,
    pub sample_id: String,
    pub path: PathBuf,
}

/// Resolve the samples listed in `dir/MANIFEST`, in manifest order.
pub fn read_samples(dir: &Path) -> Result<Vec<SampleInput>> {
    let path = dir.join(MANIFEST_FILE);
    if !path.is_file() {
        return Err(FilterError::InvalidManifest(format!(
            "{} not found",
            path.display()
        )));
    }
    let mut rdr = csv::ReaderBuilder::new()
        .comment(Some(b'#'))
        .trim(csv::Trim::All)
        .from_path(&path)?;

    let mut seen = HashSet::new();
    let mut samples = Vec::new();
    for (index, row) in rdr.deserialize::<ManifestEntry>().enumerate() {
        let entry = row?;
        if !seen.insert(entry.sample_id.clone()) {
            return Err(FilterError::InvalidManifest(format!(
                "sample {} listed more than once",
                entry.sample_id
            )));
        }
        let fastq = dir.join(&entry.filename);
        if !fastq.is_file() {
            return Err(FilterError::InvalidManifest(format!(
                "{} for sample {} does not exist",
                fastq.display(),
                entry.sample_id
            )));
        }
        samples.push(SampleInput {
            index,
            sample_id: entry.sample_id,
            path: fastq,
        });
    }
    Ok(samples)
}

/// Read the phred offset from `dir/metadata.yml`.
pub fn read_phred_offset(dir: &Path) -> Result<i32> {
    let path = dir.join(METADATA_FILE);
    let text = fs::read_to_string(&path)
        .map_err(|e| FilterError::MissingMetadata(format!("{}: {}", path.display(), e)))?;
    parse_phred_offset(&text)
        .ok_or_else(|| FilterError::MissingMetadata(format!("no {} in {}", PHRED_OFFSET_KEY, path.display())))
}

/// Contents of `metadata.yml`; other keys are ignored.
#[derive(Debug, Serialize, Deserialize)]
struct Metadata {
    #[serde(rename = "phred-offset")]
    phred_offset: i32,
}

fn parse_phred_offset(text: &str) -> Option<i32> {
    serde_yaml::from_str::<Metadata>(text)
        .ok()
        .map(|m| m.phred_offset)
}

pub fn write_phred_offset(dir: &Path, offset: i32) -> Result<()> {
    let f = File::create(dir.join(METADATA_FILE))?;
    serde_yaml::to_writer(f, &Metadata { phred_offset: offset })?;
    Ok(())
}

/// File name for a sample's filtered reads; `index` is the sample's
/// position in the input manifest.
pub fn output_filename(sample_id: &str, index: usize) -> String {
    format!("{}_{}_L001_R1_001.fastq.gz", sample_id, index)
}

/// Write `dir/MANIFEST` listing the given outputs.
pub fn write_manifest(dir: &Path, entries: &[ManifestEntry]) -> Result<()> {
    let mut f = BufWriter::new(File::create(dir.join(MANIFEST_FILE))?);
    writeln!(f, "sample-id,filename,direction")?;
    writeln!(f, "# direction is not meaningful in this file as these")?;
    writeln!(f, "# data may be derived from forward, reverse, or ")?;
    writeln!(f, "# joined reads")?;

    let mut wtr = csv::WriterBuilder::new().has_headers(false).from_writer(f);
    for entry in entries {
        wtr.serialize(entry)?;
    }
    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phred_offset_from_metadata() {
        assert_eq!(parse_phred_offset("phred-offset: 33\n"), Some(33));
        assert_eq!(parse_phred_offset("{phred-offset: 64}\n"), Some(64));
        assert_eq!(parse_phred_offset("other: 1\nphred-offset: 64\n"), Some(64));
        assert_eq!(parse_phred_offset("phred-offset: abc\n"), None);
        assert_eq!(parse_phred_offset(""), None);
    }

    #[test]
    fn missing_metadata_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            read_phred_offset(dir.path()),
            Err(FilterError::MissingMetadata(_))
        ));
        write_phred_offset(dir.path(), 33).unwrap();
        assert_eq!(read_phred_offset(dir.path()).unwrap(), 33);
    }

    #[test]
    fn samples_follow_manifest_order() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join(MANIFEST_FILE),
            "sample-id,filename,direction\n# a comment\nfoo,foo.fastq.gz,forward\nbar,bar.fastq.gz,forward\n",
        )
        .unwrap();
        fs::write(dir.path().join("foo.fastq.gz"), b"").unwrap();
        fs::write(dir.path().join("bar.fastq.gz"), b"").unwrap();

        let samples = read_samples(dir.path()).unwrap();
        assert_eq!(samples.len(), 2);
        assert_eq!(samples[0].sample_id, "foo");
        assert_eq!(samples[0].index, 0);
        assert_eq!(samples[1].sample_id, "bar");
        assert_eq!(samples[1].path, dir.path().join("bar.fastq.gz"));
    }

    #[test]
    fn manifest_errors() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(read_samples(dir.path()), Err(FilterError::InvalidManifest(_))));

        fs::write(
            dir.path().join(MANIFEST_FILE),
            "sample-id,filename,direction\nfoo,missing.fastq.gz,forward\n",
        )
        .unwrap();
        assert!(matches!(read_samples(dir.path()), Err(FilterError::InvalidManifest(_))));

        fs::write(dir.path().join("a.fastq.gz"), b"").unwrap();
        fs::write(
            dir.path().join(MANIFEST_FILE),
            "sample-id,filename,direction\nfoo,a.fastq.gz,forward\nfoo,a.fastq.gz,forward\n",
        )
        .unwrap();
        assert!(matches!(read_samples(dir.path()), Err(FilterError::InvalidManifest(_))));
    }

    #[test]
    fn written_manifest_has_comment_block() {
        let dir = tempfile::tempdir().unwrap();
        let entries = vec![ManifestEntry {
            sample_id: "foo".into(),
            filename: output_filename("foo", 0),
            direction: "forward".into(),
        }];
        write_manifest(dir.path(), &entries).unwrap();
        let text = fs::read_to_string(dir.path().join(MANIFEST_FILE)).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines[0], "sample-id,filename,direction");
        assert!(lines[1..4].iter().all(|l| l.starts_with('#')));
        assert_eq!(lines[4], "foo,foo_0_L001_R1_001.fastq.gz,forward");
        assert_eq!(lines.len(), 5);
    }
}
