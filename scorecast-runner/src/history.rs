//! JSONL append-only stores.
//!
//! One JSON object per line; partial writes only ever corrupt the last line,
//! and malformed lines are skipped on read. Writes are serialized with a
//! mutex so rayon workers can share one store.

use std::fs::{self, OpenOptions};
use std::io::{self, BufRead, Write};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::warn;

use scorecast_core::domain::{EntityId, ScoreHistoryPoint};
use scorecast_core::impact::ImpactForecast;
use scorecast_core::sources::{ForecastStore, HistoryStore};
use scorecast_core::StoreError;

/// Append-only JSONL file of `T` records.
pub struct JsonlLog<T> {
    path: PathBuf,
    write_lock: Mutex<()>,
    _record: PhantomData<fn() -> T>,
}

impl<T: Serialize + DeserializeOwned> JsonlLog<T> {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            write_lock: Mutex::new(()),
            _record: PhantomData,
        }
    }

    pub fn append(&self, record: &T) -> io::Result<()> {
        let json = serde_json::to_string(record)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "write lock poisoned"))?;

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{json}")?;
        file.flush()
    }

    /// Every well-formed record, in file order. A missing file is empty.
    pub fn read_all(&self) -> io::Result<Vec<T>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let reader = io::BufReader::new(fs::File::open(&self.path)?);
        let mut records = Vec::new();
        for (idx, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<T>(&line) {
                Ok(record) => records.push(record),
                Err(e) => {
                    warn!(
                        path = %self.path.display(),
                        line = idx + 1,
                        error = %e,
                        "skipping malformed line"
                    );
                }
            }
        }
        Ok(records)
    }

    pub fn file_size_bytes(&self) -> io::Result<u64> {
        match fs::metadata(&self.path) {
            Ok(meta) => Ok(meta.len()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(0),
            Err(e) => Err(e),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Score history persisted as JSONL.
pub struct JsonlHistoryStore {
    log: JsonlLog<ScoreHistoryPoint>,
}

impl JsonlHistoryStore {
    pub fn new(path: PathBuf) -> Self {
        Self {
            log: JsonlLog::new(path),
        }
    }

    pub fn path(&self) -> &Path {
        self.log.path()
    }
}

impl HistoryStore for JsonlHistoryStore {
    fn append(&self, point: &ScoreHistoryPoint) -> Result<(), StoreError> {
        Ok(self.log.append(point)?)
    }

    fn read(
        &self,
        entity: &EntityId,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<ScoreHistoryPoint>, StoreError> {
        let mut points: Vec<ScoreHistoryPoint> = self
            .log
            .read_all()?
            .into_iter()
            .filter(|p| &p.entity_id == entity)
            .filter(|p| since.map_or(true, |s| p.timestamp >= s))
            .collect();
        points.sort_by_key(|p| p.timestamp);
        Ok(points)
    }
}

/// Impact forecasts persisted as JSONL.
pub struct JsonlForecastStore {
    log: JsonlLog<ImpactForecast>,
}

impl JsonlForecastStore {
    pub fn new(path: PathBuf) -> Self {
        Self {
            log: JsonlLog::new(path),
        }
    }
}

impl ForecastStore for JsonlForecastStore {
    fn save(&self, forecast: &ImpactForecast) -> Result<(), StoreError> {
        Ok(self.log.append(forecast)?)
    }

    fn for_entity(&self, entity: &EntityId) -> Result<Vec<ImpactForecast>, StoreError> {
        Ok(self
            .log
            .read_all()?
            .into_iter()
            .filter(|f| &f.entity_id == entity)
            .collect())
    }
}
