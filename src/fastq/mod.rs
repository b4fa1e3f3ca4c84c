pub mod quality;

use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use flate2::read::MultiGzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;

use crate::error::{FilterError, Result};

pub use self::quality::parse_scores;

/// One 4-line FASTQ record with its decoded Phred scores.
///
/// `seq`, `qual` and `scores` always have the same length.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FastqRecord {
    pub name: String,
    pub seq: Vec<u8>,
    pub plus: String,
    pub qual: Vec<u8>,
    pub scores: Vec<i32>,
}

impl FastqRecord {
    pub fn new(name: String, seq: Vec<u8>, plus: String, qual: Vec<u8>, offset: i32) -> Self {
        let scores = parse_scores(&qual, offset);
        Self { name, seq, plus, qual, scores }
    }

    pub fn len(&self) -> usize {
        self.seq.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seq.is_empty()
    }

    /// Copy of this record keeping positions `[0, position)`.
    pub fn truncated(&self, position: usize) -> Self {
        let end = position.min(self.seq.len());
        Self {
            name: self.name.clone(),
            seq: self.seq[..end].to_vec(),
            plus: self.plus.clone(),
            qual: self.qual[..end].to_vec(),
            scores: self.scores[..end].to_vec(),
        }
    }
}

/// Streaming reader over a (optionally gzipped) FASTQ file.
///
/// Yields records lazily; the underlying file is closed when the reader is
/// dropped. After the first error the iterator is exhausted.
pub struct Reader {
    reader: Box<dyn BufRead + Send>,
    path: PathBuf,
    offset: i32,
    records: u64,
    failed: bool,
}

impl Reader {
    pub fn open(path: &Path, offset: i32) -> Result<Self> {
        let f = File::open(path)?;
        let reader: Box<dyn BufRead + Send> = if is_gzipped(path) {
            Box::new(BufReader::new(MultiGzDecoder::new(f)))
        } else {
            Box::new(BufReader::new(f))
        };
        Ok(Self::from_reader(reader, path, offset))
    }

    pub fn from_reader(reader: Box<dyn BufRead + Send>, path: &Path, offset: i32) -> Self {
        Self {
            reader,
            path: path.to_path_buf(),
            offset,
            records: 0,
            failed: false,
        }
    }

    pub fn next_record(&mut self) -> Result<Option<FastqRecord>> {
        let mut name = Vec::new();
        let mut seq = Vec::new();
        let mut plus = Vec::new();
        let mut qual = Vec::new();

        if self.reader.read_until(b'\n', &mut name)? == 0 {
            return Ok(None);
        }
        self.records += 1;
        if self.reader.read_until(b'\n', &mut seq)? == 0
            || self.reader.read_until(b'\n', &mut plus)? == 0
            || self.reader.read_until(b'\n', &mut qual)? == 0
        {
            return Err(self.malformed("input ended in the middle of a record"));
        }

        trim_line(&mut name);
        trim_whitespace(&mut seq);
        trim_line(&mut plus);
        trim_whitespace(&mut qual);

        if seq.len() != qual.len() {
            return Err(self.malformed(&format!(
                "sequence length {} differs from quality length {}",
                seq.len(),
                qual.len()
            )));
        }

        let name = String::from_utf8(name).map_err(|_| self.malformed("header is not UTF-8"))?;
        let plus = String::from_utf8(plus).map_err(|_| self.malformed("separator is not UTF-8"))?;

        Ok(Some(FastqRecord::new(name, seq, plus, qual, self.offset)))
    }

    fn malformed(&self, reason: &str) -> FilterError {
        FilterError::MalformedRecord {
            path: self.path.clone(),
            record: self.records,
            reason: reason.to_string(),
        }
    }
}

impl Iterator for Reader {
    type Item = Result<FastqRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        match self.next_record() {
            Ok(rec) => rec.map(Ok),
            Err(e) => {
                self.failed = true;
                Some(Err(e))
            }
        }
    }
}

enum Inner {
    Gz(GzEncoder<BufWriter<File>>),
    Plain(BufWriter<File>),
}

/// FASTQ writer, gzip-compressed when the path ends in `.gz`.
pub struct Writer {
    inner: Inner,
}

impl Writer {
    pub fn create(path: &Path, compression_level: u32) -> io::Result<Self> {
        let f = BufWriter::new(File::create(path)?);
        let inner = if is_gzipped(path) {
            Inner::Gz(GzEncoder::new(f, Compression::new(compression_level)))
        } else {
            Inner::Plain(f)
        };
        Ok(Self { inner })
    }

    pub fn write_record(&mut self, rec: &FastqRecord) -> io::Result<()> {
        self.write_all(rec.name.as_bytes())?;
        self.write_all(b"\n")?;
        self.write_all(&rec.seq)?;
        self.write_all(b"\n")?;
        self.write_all(rec.plus.as_bytes())?;
        self.write_all(b"\n")?;
        self.write_all(&rec.qual)?;
        self.write_all(b"\n")?;
        Ok(())
    }

    /// Writes the gzip trailer and flushes everything to disk.
    pub fn finish(self) -> io::Result<()> {
        match self.inner {
            Inner::Gz(enc) => enc.finish()?.flush(),
            Inner::Plain(mut w) => w.flush(),
        }
    }
}

impl Write for Writer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match &mut self.inner {
            Inner::Gz(w) => w.write(buf),
            Inner::Plain(w) => w.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match &mut self.inner {
            Inner::Gz(w) => w.flush(),
            Inner::Plain(w) => w.flush(),
        }
    }
}

fn is_gzipped(path: &Path) -> bool {
    path.extension().map_or(false, |ext| ext == "gz")
}

fn trim_line(line: &mut Vec<u8>) {
    if line.ends_with(b"\n") {
        line.pop();
    }
    if line.ends_with(b"\r") {
        line.pop();
    }
}

fn trim_whitespace(line: &mut Vec<u8>) {
    let end = line
        .iter()
        .rposition(|b| !b.is_ascii_whitespace())
        .map_or(0, |i| i + 1);
    line.truncate(end);
    let start = line
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(line.len());
    line.drain(..start);
}
