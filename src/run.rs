use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use crossbeam::channel::{bounded, Receiver, Sender};
use log::{debug, info, warn};

use crate::error::{FilterError, Result};
use crate::fastq::{Reader, Writer};
use crate::filter::Filter;
use crate::manifest::{output_filename, ManifestEntry, SampleInput};
use crate::sample::{self, LazySink};
use crate::stats::{RunTotals, SampleStats};

/// Where and how filtered reads are written.
#[derive(Debug, Clone)]
pub struct OutputOptions {
    pub dir: PathBuf,
    pub compression: u32,
}

/// Result of one sample's processing.
#[derive(Debug)]
struct SampleOutcome {
    index: usize,
    stats: SampleStats,
    output: Option<ManifestEntry>,
}

/// Stats of every sample, ordered by sample id, plus the outputs written.
#[derive(Debug, Clone, Default)]
pub struct RunResult {
    pub stats: BTreeMap<String, SampleStats>,
    pub manifest: Vec<ManifestEntry>,
}

impl RunResult {
    pub fn totals(&self) -> RunTotals {
        let mut totals = RunTotals::default();
        for s in self.stats.values() {
            totals.merge(s);
        }
        totals
    }
}

/// Filter every sample on a pool of `threads` workers.
///
/// Samples are independent; their stats are merged only once every worker
/// has finished. Fails with [`FilterError::AllReadsFiltered`] when there
/// were samples and none of them kept a single read.
pub fn run(
    samples: Vec<SampleInput>,
    filter: Arc<Filter>,
    offset: i32,
    output: &OutputOptions,
    threads: usize,
) -> Result<RunResult> {
    let n_samples = samples.len();
    let thread_num = threads.max(1).min(n_samples.max(1));
    info!("filtering {} samples on {} threads", n_samples, thread_num);

    let (tx_job, rx_job): (Sender<SampleInput>, Receiver<SampleInput>) = bounded(thread_num * 2);
    let (tx_out, rx_out): (Sender<(usize, Result<SampleOutcome>)>, Receiver<_>) =
        bounded(n_samples.max(1));
    let abort = Arc::new(AtomicBool::new(false));

    let mut workers = Vec::with_capacity(thread_num);
    for _ in 0..thread_num {
        let rx = rx_job.clone();
        let tx = tx_out.clone();
        let filter = filter.clone();
        let abort = abort.clone();
        let output = output.clone();

        workers.push(thread::spawn(move || {
            while let Ok(job) = rx.recv() {
                // a failed sample already dooms the run
                if abort.load(Ordering::Relaxed) {
                    continue;
                }
                let index = job.index;
                let res = process_sample(job, &filter, offset, &output);
                if res.is_err() {
                    abort.store(true, Ordering::Relaxed);
                }
                if tx.send((index, res)).is_err() {
                    break;
                }
            }
        }));
    }
    drop(tx_out);

    for job in samples {
        if tx_job.send(job).is_err() {
            break;
        }
    }
    drop(tx_job);

    for w in workers {
        if let Err(panic) = w.join() {
            std::panic::resume_unwind(panic);
        }
    }

    let mut outcomes = Vec::with_capacity(n_samples);
    let mut first_error: Option<(usize, FilterError)> = None;
    for (index, res) in rx_out {
        match res {
            Ok(outcome) => outcomes.push(outcome),
            Err(e) => {
                // report the failure of the earliest sample in manifest order
                if first_error.as_ref().map_or(true, |(i, _)| index < *i) {
                    first_error = Some((index, e));
                }
            }
        }
    }
    if let Some((_, e)) = first_error {
        return Err(e);
    }

    merge(outcomes)
}

fn merge(mut outcomes: Vec<SampleOutcome>) -> Result<RunResult> {
    // an empty run has nothing to reject
    if !outcomes.is_empty() && outcomes.iter().all(|o| o.stats.total_retained_reads == 0) {
        return Err(FilterError::AllReadsFiltered);
    }

    outcomes.sort_by_key(|o| o.index);
    let mut result = RunResult::default();
    for outcome in outcomes {
        if let Some(entry) = outcome.output {
            result.manifest.push(entry);
        }
        result.stats.insert(outcome.stats.sample_id.clone(), outcome.stats);
    }
    Ok(result)
}

fn process_sample(
    job: SampleInput,
    filter: &Filter,
    offset: i32,
    output: &OutputOptions,
) -> Result<SampleOutcome> {
    let reader = Reader::open(&job.path, offset)?;
    let filename = output_filename(&job.sample_id, job.index);
    let out_path = output.dir.join(&filename);
    let compression = output.compression;
    let mut sink = LazySink::new(|| open_writer(&out_path, compression));

    let stats = sample::process(&job.sample_id, reader, filter, &mut sink)?;
    let written = sink.close()?;

    if written {
        debug!("{}: wrote {}", job.sample_id, out_path.display());
        info!(
            "{}: retained {} of {} reads",
            job.sample_id, stats.total_retained_reads, stats.total_input_reads
        );
    } else {
        warn!(
            "{}: all {} reads were filtered out",
            job.sample_id, stats.total_input_reads
        );
    }

    Ok(SampleOutcome {
        index: job.index,
        stats,
        output: written.then(|| ManifestEntry {
            sample_id: job.sample_id.clone(),
            filename,
            direction: "forward".to_string(),
        }),
    })
}

fn open_writer(path: &Path, compression: u32) -> Result<Writer> {
    Ok(Writer::create(path, compression)?)
}
