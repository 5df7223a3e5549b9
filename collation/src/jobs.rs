//! Running the collation tasks on a shared engine.
//!
//! A run takes an exclusive lock for its whole duration. A second run started
//! while the first one holds the lock fails right away instead of
//! interleaving with it.

use std::error::Error;
use std::fmt::Display;
use std::sync::{Arc, Mutex, MutexGuard, TryLockError};
use std::thread::{self, JoinHandle};

use log::{info, warn};

use crate::config::CollationError;
use crate::CollationEngine;

#[derive(Eq, PartialEq, Debug, Clone)]
pub enum JobError {
    /// Another run holds the lock.
    AlreadyRunning,
    /// A thread panicked while holding the engine.
    Poisoned,
    Collation(CollationError),
}

impl Error for JobError {}

impl Display for JobError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobError::AlreadyRunning => write!(f, "a collation run is already in progress"),
            JobError::Poisoned => write!(f, "the engine lock is poisoned"),
            JobError::Collation(e) => write!(f, "collation failed: {}", e),
        }
    }
}

impl From<CollationError> for JobError {
    fn from(e: CollationError) -> Self {
        JobError::Collation(e)
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub struct JobReport {
    pub collation_records: usize,
    pub summary_sheets: usize,
}

#[derive(Debug, Clone)]
pub struct CollationJobs {
    engine: Arc<Mutex<CollationEngine>>,
    run_lock: Arc<Mutex<()>>,
}

impl CollationJobs {
    pub fn new(engine: CollationEngine) -> CollationJobs {
        CollationJobs {
            engine: Arc::new(Mutex::new(engine)),
            run_lock: Arc::new(Mutex::new(())),
        }
    }

    /// The shared engine, for submissions and queries between runs.
    pub fn engine(&self) -> Arc<Mutex<CollationEngine>> {
        self.engine.clone()
    }

    pub(crate) fn try_acquire(&self) -> Result<MutexGuard<'_, ()>, JobError> {
        match self.run_lock.try_lock() {
            Ok(guard) => Ok(guard),
            Err(TryLockError::WouldBlock) => {
                warn!("collation run refused: another run is in progress");
                Err(JobError::AlreadyRunning)
            }
            Err(TryLockError::Poisoned(_)) => Err(JobError::Poisoned),
        }
    }

    fn lock_engine(&self) -> Result<MutexGuard<'_, CollationEngine>, JobError> {
        self.engine.lock().map_err(|_| JobError::Poisoned)
    }

    /// Full collation followed by seat determination.
    pub fn run(&self) -> Result<JobReport, JobError> {
        let _guard = self.try_acquire()?;
        let mut engine = self.lock_engine()?;
        let collation_records = engine.run_full_collation()?;
        let summary_sheets = engine.run_seat_determination()?;
        info!(
            "collation run done: {} records, {} summary sheets",
            collation_records, summary_sheets
        );
        Ok(JobReport {
            collation_records,
            summary_sheets,
        })
    }

    /// Deletes all derived records. Returns how many were removed.
    pub fn clear(&self) -> Result<usize, JobError> {
        let _guard = self.try_acquire()?;
        let mut engine = self.lock_engine()?;
        Ok(engine.clear_collations())
    }

    /// Runs `run` on a background thread.
    pub fn spawn(&self) -> JoinHandle<Result<JobReport, JobError>> {
        let jobs = self.clone();
        thread::spawn(move || jobs.run())
    }
}
