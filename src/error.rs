use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum FilterError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    /// The input ended in the middle of a record, or a record broke the
    /// sequence/quality length invariant.
    #[error("malformed FASTQ record {record} in {path}: {reason}")]
    MalformedRecord {
        path: PathBuf,
        record: u64,
        reason: String,
    },

    #[error("phred offset unavailable: {0}")]
    MissingMetadata(String),

    #[error(
        "all sequences from all samples were filtered out; \
         the parameter choices may be too stringent for the data"
    )]
    AllReadsFiltered,

    #[error("invalid parameter {name}: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    #[error("invalid input manifest: {0}")]
    InvalidManifest(String),

    #[error("output path already exists: {0}")]
    OutputExists(PathBuf),
}

pub type Result<T> = std::result::Result<T, FilterError>;
