//! Id counters kept on disk, so an id that was handed out once is never
//! handed out again, even by a later process.

use crate::activity_log::ActivityLog;
use crate::codec::{wire, CodecError, DataFile, Record};
use crate::error::BusinessError;
use std::io::{Read, Write};
use std::path::PathBuf;

/// Counter names.
pub const PRODUCTS: &str = "product";
pub const SALES: &str = "sale";
pub const USERS: &str = "user";

/// Highest id ever issued for one record kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdMark {
    pub name: String,
    pub last: i32,
}

impl Record for IdMark {
    fn encode<W: Write>(&self, w: &mut W) -> Result<(), CodecError> {
        wire::write_str(w, &self.name)?;
        wire::write_i32(w, self.last)
    }

    fn decode<R: Read>(r: &mut R) -> Result<Self, CodecError> {
        Ok(Self { name: wire::read_str(r)?, last: wire::read_i32(r)? })
    }
}

/// Every counter in one small data file.
///
/// Several components may share the file. Each issue re-reads it first and
/// only ever raises a mark.
#[derive(Debug, Clone)]
pub struct IdSequence {
    marks: Vec<IdMark>,
    file: DataFile<IdMark>,
}

impl IdSequence {
    pub fn open(path: impl Into<PathBuf>, log: ActivityLog) -> Self {
        let mut sequence = Self { marks: Vec::new(), file: DataFile::new(path, log) };
        sequence.reload();
        sequence
    }

    fn reload(&mut self) {
        for mark in self.file.load() {
            self.raise(&mark.name, mark.last);
        }
    }

    fn raise(&mut self, name: &str, last: i32) {
        match self.marks.iter_mut().find(|m| m.name == name) {
            Some(mark) => mark.last = mark.last.max(last),
            None => self.marks.push(IdMark { name: name.to_string(), last }),
        }
    }

    /// Highest id issued so far for `name`, 0 if none.
    pub fn last(&self, name: &str) -> i32 {
        self.marks.iter().find(|m| m.name == name).map_or(0, |m| m.last)
    }

    /// Issues the id after both the stored mark and every id in `existing`.
    ///
    /// The new mark is written before the id is returned; if that fails the
    /// id is not issued.
    pub fn next(&mut self, name: &str, existing: impl Iterator<Item = i32>) -> Result<i32, BusinessError> {
        self.reload();
        let id = existing.fold(self.last(name), i32::max) + 1;
        self.raise(name, id);
        self.file.try_save(&self.marks)?;
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn open(dir: &TempDir) -> IdSequence {
        IdSequence::open(dir.path().join("sequences.dat"), ActivityLog::silent())
    }

    #[test]
    fn test_next_follows_existing_ids() {
        let dir = TempDir::new().unwrap();
        let mut ids = open(&dir);

        assert_eq!(ids.next(PRODUCTS, std::iter::empty()).unwrap(), 1);
        assert_eq!(ids.next(PRODUCTS, [1].into_iter()).unwrap(), 2);
        assert_eq!(ids.next(PRODUCTS, [7, 3].into_iter()).unwrap(), 8);
        // Ids 1..=8 are gone from the collection
        assert_eq!(ids.next(PRODUCTS, std::iter::empty()).unwrap(), 9);
        assert_eq!(ids.next(SALES, std::iter::empty()).unwrap(), 1);
    }

    #[test]
    fn test_marks_survive_reopen() {
        let dir = TempDir::new().unwrap();
        {
            let mut ids = open(&dir);
            ids.next(USERS, [4].into_iter()).unwrap();
        }
        let mut ids = open(&dir);
        assert_eq!(ids.last(USERS), 5);
        assert_eq!(ids.next(USERS, std::iter::empty()).unwrap(), 6);
    }

    #[test]
    fn test_shared_file_never_lowers_a_mark() {
        let dir = TempDir::new().unwrap();
        let mut store_side = open(&dir);
        let mut user_side = open(&dir);

        store_side.next(PRODUCTS, [10].into_iter()).unwrap();
        user_side.next(USERS, std::iter::empty()).unwrap();

        let ids = open(&dir);
        assert_eq!(ids.last(PRODUCTS), 11);
        assert_eq!(ids.last(USERS), 1);
    }

    #[test]
    fn test_unwritable_file_issues_nothing() {
        let dir = TempDir::new().unwrap();
        let mut ids = IdSequence::open(dir.path().join("missing").join("sequences.dat"), ActivityLog::silent());
        assert!(matches!(
            ids.next(PRODUCTS, std::iter::empty()),
            Err(BusinessError::PersistFailed(_))
        ));
    }
}
