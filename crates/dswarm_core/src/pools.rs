//! Worker pools, one per (stage kind, object kind) pair
//!
//! Every pipeline stage hops onto its own pool before doing work, so a slow
//! importer for data models never eats into the budget of a project export,
//! and reading, writing, fetching and importing each get an independent limit.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::Semaphore;
use tracing::Instrument;

use crate::config::PoolConfig;
use crate::{CoreError, Result};

/// Kind of work a pool is dedicated to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WorkerKind {
    /// Reading object files from disk
    Reader,
    /// Writing object files to disk
    Writer,
    /// Submitting objects to the remote service
    Importer,
    /// Retrieving objects from the remote service
    Exporter,
}

impl WorkerKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkerKind::Reader => "reader",
            WorkerKind::Writer => "writer",
            WorkerKind::Importer => "importer",
            WorkerKind::Exporter => "exporter",
        }
    }
}

impl fmt::Display for WorkerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PoolKey {
    pub kind: WorkerKind,
    pub object_name: String,
}

/// A bounded set of concurrently running tasks.
#[derive(Debug)]
pub struct WorkerPool {
    name: String,
    capacity: usize,
    permits: Arc<Semaphore>,
}

impl WorkerPool {
    pub fn new(name: impl Into<String>, capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            name: name.into(),
            capacity,
            permits: Arc::new(Semaphore::new(capacity)),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of tasks that could start right now without waiting.
    pub fn available(&self) -> usize {
        self.permits.available_permits()
    }

    /// Run `task` on this pool and wait for its result.
    ///
    /// Waits for a free slot, then spawns the task onto the runtime. The slot is
    /// held until the task finishes, even if the caller stops waiting for it.
    pub async fn run<F, T>(&self, task: F) -> Result<T>
    where
        F: Future<Output = Result<T>> + Send + 'static,
        T: Send + 'static,
    {
        let permit = self
            .permits
            .clone()
            .acquire_owned()
            .await
            .map_err(|e| CoreError::WorkerFailed {
                pool: self.name.clone(),
                cause: Box::new(e),
            })?;

        let span = tracing::debug_span!("worker", pool = %self.name);
        let handle = tokio::spawn(
            async move {
                let _permit = permit;
                task.await
            }
            .instrument(span),
        );

        handle.await.map_err(|e| CoreError::WorkerFailed {
            pool: self.name.clone(),
            cause: Box::new(e),
        })?
    }
}

/// Lazily created, memoized worker pools.
///
/// Constructed once per process and handed to every client and pipeline.
#[derive(Debug)]
pub struct PoolRegistry {
    config: PoolConfig,
    pools: DashMap<PoolKey, Arc<WorkerPool>>,
}

impl PoolRegistry {
    pub fn new(config: PoolConfig) -> Self {
        Self {
            config,
            pools: DashMap::new(),
        }
    }

    /// Pool for `kind` work on `object_name` objects, created on first use.
    pub fn pool_for(&self, kind: WorkerKind, object_name: &str) -> Arc<WorkerPool> {
        let key = PoolKey {
            kind,
            object_name: object_name.to_string(),
        };

        // `entry` holds the shard lock, so check-create-insert is atomic per key
        self.pools
            .entry(key)
            .or_insert_with(|| {
                let name = format!("dswarm-{object_name}-{kind}");
                tracing::debug!("creating worker pool '{}'", name);
                Arc::new(WorkerPool::new(name, self.config.capacity(kind)))
            })
            .value()
            .clone()
    }

    pub fn contains(&self, kind: WorkerKind, object_name: &str) -> bool {
        self.pools.contains_key(&PoolKey {
            kind,
            object_name: object_name.to_string(),
        })
    }

    pub fn len(&self) -> usize {
        self.pools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pools.is_empty()
    }
}

impl Default for PoolRegistry {
    fn default() -> Self {
        Self::new(PoolConfig::default())
    }
}
