//! Records produced by a fetch and the ordered result that carries them.

use std::collections::HashSet;
use std::slice;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A single entry in a [`FetchResult`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Record {
    pub id: u32,
    pub name: String,
    pub age: u32,
}

impl Record {
    #[must_use]
    pub fn new(id: u32, name: impl Into<String>, age: u32) -> Self {
        Self {
            id,
            name: name.into(),
            age,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("duplicate record id {0} in fetch result")]
pub struct DuplicateRecordId(pub u32);

/// Ordered records delivered by a successful fetch.
///
/// Ids are unique within one result. Order is the order the source produced,
/// never re-sorted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Record>", into = "Vec<Record>")]
pub struct FetchResult(Vec<Record>);

impl FetchResult {
    pub fn new(records: Vec<Record>) -> Result<Self, DuplicateRecordId> {
        let mut seen = HashSet::with_capacity(records.len());
        for record in &records {
            if !seen.insert(record.id) {
                return Err(DuplicateRecordId(record.id));
            }
        }
        Ok(Self(records))
    }

    /// The three users every demo source hands back.
    #[must_use]
    pub fn sample_users() -> Self {
        Self(vec![
            Record::new(1, "John", 25),
            Record::new(2, "Jane", 30),
            Record::new(3, "Jim", 20),
        ])
    }

    #[must_use]
    pub fn records(&self) -> &[Record] {
        &self.0
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = u32> + '_ {
        self.0.iter().map(|record| record.id)
    }

    #[must_use]
    pub fn get(&self, id: u32) -> Option<&Record> {
        self.0.iter().find(|record| record.id == id)
    }

    #[must_use]
    pub fn into_records(self) -> Vec<Record> {
        self.0
    }
}

impl TryFrom<Vec<Record>> for FetchResult {
    type Error = DuplicateRecordId;

    fn try_from(value: Vec<Record>) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<FetchResult> for Vec<Record> {
    fn from(value: FetchResult) -> Self {
        value.0
    }
}

impl<'a> IntoIterator for &'a FetchResult {
    type Item = &'a Record;
    type IntoIter = slice::Iter<'a, Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
