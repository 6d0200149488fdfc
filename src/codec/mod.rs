//! Flat binary persistence: one file per entity kind, holding a count
//! prefix followed by each record's own encoding.
//!
//! Numbers are written in host-native byte order and strings as
//! `[u64 length][raw bytes]`. Polymorphic records (products, users) write a
//! variant tag string before their fields. There is no version header.

pub mod wire;

use crate::activity_log::ActivityLog;
use crate::error::BusinessError;
use std::io::{Cursor, Read, Write};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::debug;

/// Failure while encoding or decoding a data file.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Truncated field: expected {expected} bytes, found {found}")]
    Truncated { expected: u64, found: u64 },

    #[error("Length prefix out of range: {0}")]
    LengthOutOfRange(u64),

    #[error("String field is not valid UTF-8")]
    InvalidUtf8,

    #[error("Negative {field} in data file: {value}")]
    NegativeCount { field: &'static str, value: i32 },

    #[error("Unknown {kind} tag: {tag:?}")]
    UnknownTag { kind: &'static str, tag: String },
}

/// A record kind that knows its own byte layout.
pub trait Record: Sized {
    /// Writes the record's fields.
    fn encode<W: Write>(&self, w: &mut W) -> Result<(), CodecError>;

    /// Reads one record written by [`Record::encode`].
    fn decode<R: Read>(r: &mut R) -> Result<Self, CodecError>;
}

/// Encodes `[count][record]*`.
pub fn encode_collection<T: Record, W: Write>(w: &mut W, records: &[T]) -> Result<(), CodecError> {
    wire::write_len(w, records.len())?;
    for record in records {
        record.encode(w)?;
    }
    Ok(())
}

/// Decodes `[count][record]*` into `out`, in file order.
///
/// Records decoded before a failure stay in `out`.
pub fn decode_collection<T: Record, R: Read>(r: &mut R, out: &mut Vec<T>) -> Result<(), CodecError> {
    let count = wire::read_len(r)?;
    out.reserve(count.min(1024) as usize);
    for _ in 0..count {
        out.push(T::decode(r)?);
    }
    Ok(())
}

/// Writes `bytes` to a temporary file next to `path`, then renames it over `path`.
fn replace_file(path: &Path, bytes: &[u8]) -> Result<(), CodecError> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| CodecError::Io(e.error))?;
    Ok(())
}

/// Reads the whole file; `Ok(None)` if it does not exist.
fn read_file(path: &Path) -> Result<Option<Vec<u8>>, CodecError> {
    match std::fs::read(path) {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// A data file holding a homogeneous list of records.
///
/// Failures never escape: `load` degrades to an empty or partial list and
/// `save` reports `false`, both with an ERR entry in the activity log.
#[derive(Debug, Clone)]
pub struct DataFile<T> {
    path: PathBuf,
    log: ActivityLog,
    _record: PhantomData<fn() -> T>,
}

impl<T: Record> DataFile<T> {
    pub fn new(path: impl Into<PathBuf>, log: ActivityLog) -> Self {
        Self { path: path.into(), log, _record: PhantomData }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads every record. A missing file is an empty dataset.
    pub fn load(&self) -> Vec<T> {
        let bytes = match read_file(&self.path) {
            Ok(Some(bytes)) => bytes,
            Ok(None) => {
                debug!("No data file at {}, starting empty", self.path.display());
                return Vec::new();
            }
            Err(e) => {
                self.log.error(&format!("Failed to load data from {}: {}", self.path.display(), e));
                return Vec::new();
            }
        };

        let mut records = Vec::new();
        match decode_collection(&mut Cursor::new(bytes), &mut records) {
            Ok(()) => {
                self.log.info(&format!(
                    "Data loaded from {}, items: {}",
                    self.path.display(),
                    records.len()
                ));
            }
            Err(e) => {
                self.log.error(&format!(
                    "Failed to load data from {} after {} items: {}",
                    self.path.display(),
                    records.len(),
                    e
                ));
            }
        }
        records
    }

    /// Replaces the file with `records`. Returns `false` on failure.
    pub fn save(&self, records: &[T]) -> bool {
        let mut bytes = Vec::new();
        let result = encode_collection(&mut bytes, records)
            .and_then(|()| replace_file(&self.path, &bytes));

        match result {
            Ok(()) => {
                self.log.info(&format!(
                    "Data saved to {}, items: {}",
                    self.path.display(),
                    records.len()
                ));
                true
            }
            Err(e) => {
                self.log.error(&format!("Failed to save data to {}: {}", self.path.display(), e));
                false
            }
        }
    }
}

impl<T: Record> DataFile<T> {
    /// Like [`DataFile::save`], but hands the failure back to the caller.
    pub fn try_save(&self, records: &[T]) -> Result<(), BusinessError> {
        if self.save(records) {
            Ok(())
        } else {
            Err(BusinessError::PersistFailed(self.path.display().to_string()))
        }
    }
}

/// A flat pool of names stored as `[count][string]*`.
#[derive(Debug, Clone)]
pub struct StringListFile {
    path: PathBuf,
    log: ActivityLog,
}

impl StringListFile {
    pub fn new(path: impl Into<PathBuf>, log: ActivityLog) -> Self {
        Self { path: path.into(), log }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Vec<String> {
        let result = read_file(&self.path).and_then(|bytes| match bytes {
            Some(bytes) => wire::read_str_list(&mut Cursor::new(bytes)),
            None => Ok(Vec::new()),
        });

        match result {
            Ok(list) => list,
            Err(e) => {
                self.log.error(&format!(
                    "Failed to load string list from {}: {}",
                    self.path.display(),
                    e
                ));
                Vec::new()
            }
        }
    }

    pub fn save(&self, list: &[String]) -> bool {
        let mut bytes = Vec::new();
        let result =
            wire::write_str_list(&mut bytes, list).and_then(|()| replace_file(&self.path, &bytes));

        match result {
            Ok(()) => {
                self.log.info(&format!(
                    "String list saved to {}, items: {}",
                    self.path.display(),
                    list.len()
                ));
                true
            }
            Err(e) => {
                self.log.error(&format!(
                    "Failed to save string list to {}: {}",
                    self.path.display(),
                    e
                ));
                false
            }
        }
    }

    /// Loads, appends `item` and saves.
    pub fn append(&self, item: &str) -> bool {
        let mut list = self.load();
        list.push(item.to_string());
        self.save(&list)
    }
}
