//! Quality-score filtering of demultiplexed sequencing reads.
//!
//! Every read is scanned for runs of low PHRED scores; a read is truncated
//! at the first run longer than the quality window and dropped when it ends
//! up too short or carries too many ambiguous base calls. Samples are
//! filtered independently and summarised in one stats row each.

pub mod config;
pub mod error;
pub mod fastq;
pub mod filter;
pub mod manifest;
pub mod report;
pub mod run;
pub mod sample;
pub mod stats;

use std::fs;
use std::path::Path;
use std::sync::Arc;

use log::info;
use tempfile::NamedTempFile;

use crate::config::Cli;
use crate::error::{FilterError, Result};
use crate::filter::Filter;
use crate::report::{write_json_report, Report};
use crate::run::{OutputOptions, RunResult};

/// Filter a demultiplexed directory as configured by `cli`.
///
/// Reads are staged next to the requested output directory and moved into
/// place only when the whole run succeeded, so a failed run leaves no
/// partial output. The stats table and the JSON report, when requested, are
/// staged the same way and land together with the reads.
pub fn filter_directory(cli: &Cli) -> Result<RunResult> {
    let params = cli.filter_params()?;
    if cli.output.exists() {
        return Err(FilterError::OutputExists(cli.output.clone()));
    }

    let phred_offset = manifest::read_phred_offset(&cli.input)?;
    let samples = manifest::read_samples(&cli.input)?;
    info!(
        "{} samples in {}, phred offset {}",
        samples.len(),
        cli.input.display(),
        phred_offset
    );

    let parent = parent_dir(&cli.output);
    fs::create_dir_all(parent)?;
    let staging = tempfile::Builder::new()
        .prefix(".qfilter-")
        .tempdir_in(parent)?;

    let output = OutputOptions {
        dir: staging.path().to_path_buf(),
        compression: cli.compression,
    };
    let filter = Arc::new(Filter::new(params));
    let result = run::run(samples, filter, phred_offset, &output, cli.threads())?;

    manifest::write_manifest(staging.path(), &result.manifest)?;
    manifest::write_phred_offset(staging.path(), phred_offset)?;

    let mut staged = Vec::with_capacity(2);
    let mut stats_file = stage_file(&cli.stats)?;
    stats::write_stats(&mut stats_file, result.stats.values())?;
    staged.push((stats_file, cli.stats.as_path()));
    if let Some(json) = &cli.json {
        let mut json_file = stage_file(json)?;
        write_json_report(&mut json_file, &Report::new(&result, &params, phred_offset))?;
        staged.push((json_file, json.as_path()));
    }

    // the guard finds nothing left to clean up once renamed
    fs::rename(staging.path(), &cli.output)?;
    let mut persisted = Vec::with_capacity(staged.len());
    for (file, path) in staged {
        if let Err(e) = file.persist(path) {
            for path in persisted {
                fs::remove_file(path)?;
            }
            fs::remove_dir_all(&cli.output)?;
            return Err(e.error.into());
        }
        persisted.push(path);
    }

    let totals = result.totals();
    info!(
        "retained {} of {} reads; {} of {} samples have output in {}",
        totals.total_retained_reads,
        totals.total_input_reads,
        totals.samples_with_output,
        totals.samples,
        cli.output.display()
    );
    Ok(result)
}

fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    }
}

/// Temp file next to `path`, so persisting it is a rename within one
/// filesystem.
fn stage_file(path: &Path) -> Result<NamedTempFile> {
    Ok(tempfile::Builder::new()
        .prefix(".qfilter-")
        .tempfile_in(parent_dir(path))?)
}
