use log::debug;

use crate::error::Result;
use crate::fastq::{FastqRecord, Writer};
use crate::filter::Filter;
use crate::stats::SampleStats;

/// Destination for the reads a sample keeps.
pub trait RecordSink {
    fn write_record(&mut self, rec: &FastqRecord) -> Result<()>;

    /// Flush and release the sink.
    fn finish(self) -> Result<()>;
}

impl RecordSink for Writer {
    fn write_record(&mut self, rec: &FastqRecord) -> Result<()> {
        Ok(Writer::write_record(self, rec)?)
    }

    fn finish(self) -> Result<()> {
        Ok(Writer::finish(self)?)
    }
}

impl RecordSink for Vec<FastqRecord> {
    fn write_record(&mut self, rec: &FastqRecord) -> Result<()> {
        self.push(rec.clone());
        Ok(())
    }

    fn finish(self) -> Result<()> {
        Ok(())
    }
}

enum SinkState<S> {
    Unopened,
    Open(S),
}

/// A sink that is only created once the first record arrives, so a sample
/// that keeps nothing leaves no output behind.
pub struct LazySink<S, F> {
    open: F,
    state: SinkState<S>,
}

impl<S, F> LazySink<S, F>
where
    S: RecordSink,
    F: FnMut() -> Result<S>,
{
    pub fn new(open: F) -> Self {
        Self {
            open,
            state: SinkState::Unopened,
        }
    }

    pub fn is_open(&self) -> bool {
        matches!(self.state, SinkState::Open(_))
    }

    pub fn write_record(&mut self, rec: &FastqRecord) -> Result<()> {
        if let SinkState::Unopened = self.state {
            self.state = SinkState::Open((self.open)()?);
        }
        match &mut self.state {
            SinkState::Open(sink) => sink.write_record(rec),
            SinkState::Unopened => unreachable!("sink opened above"),
        }
    }

    /// Close the sink, returning whether it was ever opened.
    pub fn close(self) -> Result<bool> {
        match self.state {
            SinkState::Open(sink) => sink.finish().map(|_| true),
            SinkState::Unopened => Ok(false),
        }
    }
}

/// Run every read of one sample through `filter`, forwarding kept reads to
/// `sink` in input order.
///
/// Stops at the first read that fails to parse.
pub fn process<I, S, F>(
    sample_id: &str,
    reads: I,
    filter: &Filter,
    sink: &mut LazySink<S, F>,
) -> Result<SampleStats>
where
    I: IntoIterator<Item = Result<FastqRecord>>,
    S: RecordSink,
    F: FnMut() -> Result<S>,
{
    let mut stats = SampleStats::new(sample_id);

    for rec in reads {
        let (kept, disposition) = filter.evaluate(rec?);
        stats.record(disposition);
        if let Some(rec) = kept {
            if !sink.is_open() {
                debug!("{}: opening output on first retained read", sample_id);
            }
            sink.write_record(&rec)?;
        }
    }

    Ok(stats)
}
