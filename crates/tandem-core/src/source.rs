//! Record sources. The engine only needs a sequence of records; the JSON file
//! source covers the static data files the demos read.

use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;

use crate::error::Result;

/// Anything that can produce records
pub trait DataSource<R> {
    fn records(&self) -> Result<Vec<R>>;
}

impl<R: Clone> DataSource<R> for Vec<R> {
    fn records(&self) -> Result<Vec<R>> {
        Ok(self.clone())
    }
}

/// Reads a JSON array of records from a file
#[derive(Debug, Clone)]
pub struct JsonFileSource<R> {
    path: PathBuf,
    _record: PhantomData<fn() -> R>,
}

impl<R> JsonFileSource<R> {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            _record: PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl<R: DeserializeOwned> DataSource<R> for JsonFileSource<R> {
    fn records(&self) -> Result<Vec<R>> {
        let raw = std::fs::read_to_string(&self.path)?;
        let records: Vec<R> = serde_json::from_str(&raw)?;
        log::debug!("read {} records from {}", records.len(), self.path.display());
        Ok(records)
    }
}
