//! Degree-bounded parallel map using rayon

use rayon::prelude::*;

use crate::error::Result;
use crate::pool::{PoolConfig, WorkerPool};

/// Parallel map with a forced degree of parallelism
pub struct ParallelQuery<I> {
    items: Vec<I>,
    degree: Option<usize>,
}

impl<I> ParallelQuery<I>
where
    I: Send,
{
    /// Create a new query over `items`
    pub fn new(items: Vec<I>) -> Self {
        Self {
            items,
            degree: None,
        }
    }

    /// Run on exactly `degree` threads (at least 1)
    pub fn with_degree(mut self, degree: usize) -> Self {
        self.degree = Some(degree.max(1));
        self
    }

    /// Map in parallel on a dedicated pool. Output order matches input order.
    pub fn map<O, F>(self, f: F) -> Result<Vec<O>>
    where
        O: Send,
        F: Fn(I) -> O + Send + Sync,
    {
        let mut config = PoolConfig::new().thread_name_prefix("tandem-query");
        if let Some(degree) = self.degree {
            config = config.workers(degree);
        }
        let pool = config.build()?;
        Ok(self.map_on(&pool, f))
    }

    /// Map in parallel on an existing pool
    pub fn map_on<O, F>(self, pool: &WorkerPool, f: F) -> Vec<O>
    where
        O: Send,
        F: Fn(I) -> O + Send + Sync,
    {
        let items = self.items;
        pool.thread_pool()
            .install(move || items.into_par_iter().map(f).collect())
    }

    /// Sequential baseline
    pub fn map_sequential<O, F>(self, f: F) -> Vec<O>
    where
        F: FnMut(I) -> O,
    {
        self.items.into_iter().map(f).collect()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
