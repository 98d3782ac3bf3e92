//! Request orchestration shared by the CLI and the HTTP server.
//! No transport or runtime dependencies.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use rayon::prelude::*;
use serde::Serialize;

use crate::catalog::CatalogStore;
use crate::constraint::{ConstraintError, ConstraintValidator, OptimizeRequest};
use crate::network::{Candidate, EquivalentCalculator, NetworkEnumerator, PoolLimits, Topology};
use crate::progress::{Progress, ProgressSink};
use crate::ranking::{Ranker, DEFAULT_TOP_K};

#[derive(Debug, thiserror::Error)]
pub enum CapBankError {
    #[error("Invalid constraint: {0}")]
    InvalidConstraint(#[from] ConstraintError),
    #[error("Search timed out after {elapsed:?} ({evaluated} networks evaluated)")]
    Timeout { elapsed: Duration, evaluated: u64 },
    #[error("Internal error: {0}")]
    Internal(String),
    #[error("Catalog error: {0}")]
    Catalog(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// What to do when the per-request deadline expires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum TimeoutPolicy {
    /// Rank whatever was evaluated in time
    #[default]
    BestEffort,
    /// Fail with [`CapBankError::Timeout`]
    Fail,
}

impl FromStr for TimeoutPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "best-effort" | "besteffort" | "partial" => Ok(TimeoutPolicy::BestEffort),
            "fail" | "error" => Ok(TimeoutPolicy::Fail),
            other => Err(format!("unknown timeout policy '{}'", other)),
        }
    }
}

impl fmt::Display for TimeoutPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeoutPolicy::BestEffort => f.write_str("best-effort"),
            TimeoutPolicy::Fail => f.write_str("fail"),
        }
    }
}

/// Service configuration (CLI flags or server flags).
#[derive(Clone, Debug)]
pub struct ServiceOptions {
    pub top_k: usize,
    /// Per-request budget; `None` disables the deadline
    pub deadline: Option<Duration>,
    pub on_timeout: TimeoutPolicy,
    /// Size of the evaluation thread pool
    pub workers: usize,
    /// Topologies pulled from the enumerator per parallel batch
    pub chunk_size: usize,
    pub pool: PoolLimits,
}

impl Default for ServiceOptions {
    fn default() -> Self {
        Self {
            top_k: DEFAULT_TOP_K,
            deadline: Some(Duration::from_secs(5)),
            on_timeout: TimeoutPolicy::BestEffort,
            workers: num_cpus::get(),
            chunk_size: 256,
            pool: PoolLimits::default(),
        }
    }
}

/// Ranked candidates plus bookkeeping for one request.
#[derive(Debug, Clone, Serialize)]
pub struct ResultSet {
    pub candidates: Vec<Candidate>,
    pub stats: SearchStats,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchStats {
    pub evaluated: u64,
    pub shapes_visited: u64,
    pub shapes_total: u64,
    pub elapsed: Duration,
    pub timed_out: bool,
}

impl ResultSet {
    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn best(&self) -> Option<&Candidate> {
        self.candidates.first()
    }
}

/// Optimization API used by both the CLI and the server.
///
/// Holds the shared catalog and a bounded worker pool; keeps no state between
/// requests, so one instance can serve concurrent callers.
pub struct OptimizationService {
    catalog: Arc<CatalogStore>,
    options: ServiceOptions,
    workers: rayon::ThreadPool,
}

impl OptimizationService {
    pub fn new(catalog: Arc<CatalogStore>, options: ServiceOptions) -> Result<Self, CapBankError> {
        let workers = rayon::ThreadPoolBuilder::new()
            .num_threads(options.workers.max(1))
            .thread_name(|i| format!("capbank-worker-{}", i))
            .build()
            .map_err(|e| CapBankError::Internal(format!("failed to start worker pool: {}", e)))?;

        Ok(Self {
            catalog,
            options,
            workers,
        })
    }

    pub fn catalog(&self) -> &Arc<CatalogStore> {
        &self.catalog
    }

    /// Package identifiers, smallest footprint first.
    pub fn packages(&self) -> &[String] {
        self.catalog.packages()
    }

    pub fn options(&self) -> &ServiceOptions {
        &self.options
    }

    /// Validate, enumerate, evaluate and rank one request.
    pub fn optimize(&self, request: &OptimizeRequest) -> Result<ResultSet, CapBankError> {
        self.optimize_with_progress(request, &|_: Progress| {})
    }

    /// Like [`optimize`](Self::optimize), reporting after every evaluated chunk.
    pub fn optimize_with_progress(
        &self,
        request: &OptimizeRequest,
        progress: &dyn ProgressSink,
    ) -> Result<ResultSet, CapBankError> {
        let request_id = uuid::Uuid::new_v4();
        let span = tracing::info_span!("optimize", %request_id);
        let _entered = span.enter();

        let started = Instant::now();
        let constraint = ConstraintValidator::validate(request, &self.catalog).map_err(|e| {
            tracing::info!("Rejected request: {}", e);
            e
        })?;

        let deadline = self.options.deadline.map(|budget| started + budget);
        let mut enumerator = NetworkEnumerator::new(&self.catalog, &constraint, &self.options.pool)
            .with_deadline(deadline);
        let mut ranker = Ranker::new(&constraint, self.options.top_k);
        let chunk_size = self.options.chunk_size.max(1);
        let mut evaluated: u64 = 0;

        loop {
            let chunk: Vec<Topology<'_>> = enumerator.by_ref().take(chunk_size).collect();
            if chunk.is_empty() {
                break;
            }

            let results: Vec<Result<Candidate, CapBankError>> = self.workers.install(|| {
                chunk
                    .par_iter()
                    .map(|topology| EquivalentCalculator::compute(topology, &constraint))
                    .collect()
            });

            for result in results {
                match result {
                    Ok(candidate) => ranker.push(candidate),
                    Err(e) => {
                        tracing::error!("Evaluation failed: {}", e);
                        return Err(e);
                    }
                }
            }

            evaluated += chunk.len() as u64;
            progress.on_progress(Progress::new(
                evaluated,
                enumerator.shapes_visited(),
                enumerator.shapes_total(),
            ));
        }

        let stats = SearchStats {
            evaluated,
            shapes_visited: enumerator.shapes_visited(),
            shapes_total: enumerator.shapes_total(),
            elapsed: started.elapsed(),
            timed_out: enumerator.timed_out(),
        };

        if stats.timed_out && self.options.on_timeout == TimeoutPolicy::Fail {
            tracing::warn!("Timed out after {:?}; failing request", stats.elapsed);
            return Err(CapBankError::Timeout {
                elapsed: stats.elapsed,
                evaluated,
            });
        }

        let rejected = ranker.rejected();
        let candidates = ranker.finish();
        tracing::info!(
            "Returned {} candidates ({} evaluated, {} rejected, {}/{} shapes) in {:?}{}",
            candidates.len(),
            evaluated,
            rejected,
            stats.shapes_visited,
            stats.shapes_total,
            stats.elapsed,
            if stats.timed_out { ", partial" } else { "" }
        );

        Ok(ResultSet { candidates, stats })
    }
}
