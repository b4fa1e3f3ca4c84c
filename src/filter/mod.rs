pub mod runs;

use serde::Serialize;

use crate::config::FilterParams;
use crate::fastq::FastqRecord;

use self::runs::find_runs;

pub const AMBIGUOUS_BASE: u8 = b'N';

/// What happened to a single read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Disposition {
    /// Kept without modification.
    Kept,
    /// Truncated at a low-quality run and left too short to keep.
    TruncatedTooShort,
    /// Dropped for carrying more ambiguous bases than allowed. `truncated`
    /// records whether the read had been truncated before the count.
    TooManyAmbiguous { truncated: bool },
    /// Truncated at a low-quality run and kept.
    RetainedAfterTruncation,
}

impl Disposition {
    pub fn is_kept(&self) -> bool {
        matches!(self, Disposition::Kept | Disposition::RetainedAfterTruncation)
    }

    pub fn was_truncated(&self) -> bool {
        match self {
            Disposition::Kept => false,
            Disposition::TruncatedTooShort | Disposition::RetainedAfterTruncation => true,
            Disposition::TooManyAmbiguous { truncated } => *truncated,
        }
    }
}

pub struct Filter {
    params: FilterParams,
}

impl Filter {
    pub fn new(params: FilterParams) -> Self {
        Self { params }
    }

    /// Decide whether `rec` survives, truncating it at the first run of
    /// low-quality scores longer than the quality window.
    ///
    /// Returns the (possibly truncated) read when it is kept.
    pub fn evaluate(&self, rec: FastqRecord) -> (Option<FastqRecord>, Disposition) {
        let mut rec = rec;
        let mut truncated = false;

        if let Some(cut) = self.truncation_point(&rec) {
            let full_length = rec.len();
            rec = rec.truncated(cut);
            truncated = true;

            let fraction = round3(rec.len() as f64 / full_length as f64);
            if fraction <= self.params.min_length_fraction {
                return (None, Disposition::TruncatedTooShort);
            }
        }

        let ambiguous = rec.seq.iter().filter(|&&b| b == AMBIGUOUS_BASE).count();
        if ambiguous > self.params.max_ambiguous {
            return (None, Disposition::TooManyAmbiguous { truncated });
        }

        let disposition = if truncated {
            Disposition::RetainedAfterTruncation
        } else {
            Disposition::Kept
        };
        (Some(rec), disposition)
    }

    /// Start of the earliest run of scores below `min_quality` whose length
    /// exceeds `quality_window`. Later runs are ignored.
    pub fn truncation_point(&self, rec: &FastqRecord) -> Option<usize> {
        let below: Vec<bool> = rec
            .scores
            .iter()
            .map(|&s| s < self.params.min_quality)
            .collect();
        find_runs(&below)
            .into_iter()
            .find(|run| run.length > self.params.quality_window)
            .map(|run| run.start)
    }
}

/// Round to three decimals on the exact decimal expansion of `x`.
///
/// Scaling by 1000 first can land an inexact value such as 19/80 on a
/// spurious tie, so the digits are taken from the formatter instead.
fn round3(x: f64) -> f64 {
    format!("{:.3}", x).parse().unwrap_or(x)
}
