//! Incremental progress reporting for long optimizations.

use serde::Serialize;

/// Snapshot of how far a search has come.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Progress {
    pub candidates_evaluated: u64,
    /// Extrapolated from the share of shapes visited so far
    pub estimated_total: u64,
    pub shapes_visited: u64,
    pub shapes_total: u64,
}

impl Progress {
    pub fn new(candidates_evaluated: u64, shapes_visited: u64, shapes_total: u64) -> Self {
        let estimated_total = if shapes_visited == 0 {
            candidates_evaluated
        } else {
            let scaled = candidates_evaluated as u128 * shapes_total as u128 / shapes_visited as u128;
            u64::try_from(scaled)
                .unwrap_or(u64::MAX)
                .max(candidates_evaluated)
        };
        Self {
            candidates_evaluated,
            estimated_total,
            shapes_visited,
            shapes_total,
        }
    }

    /// Completed fraction in `[0, 1]`.
    pub fn fraction(&self) -> f64 {
        if self.estimated_total == 0 {
            return 0.0;
        }
        (self.candidates_evaluated as f64 / self.estimated_total as f64).min(1.0)
    }
}

/// Receiver of progress snapshots. Called from the request's thread after
/// each evaluated chunk.
pub trait ProgressSink: Sync {
    fn on_progress(&self, progress: Progress);
}

impl<F> ProgressSink for F
where
    F: Fn(Progress) + Sync,
{
    fn on_progress(&self, progress: Progress) {
        self(progress)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_estimate_scales_with_shapes() {
        let p = Progress::new(100, 10, 40);
        assert_eq!(p.estimated_total, 400);
        assert!((p.fraction() - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_estimate_never_below_evaluated() {
        let p = Progress::new(100, 50, 40);
        assert_eq!(p.estimated_total, 100);
        assert_eq!(Progress::new(0, 0, 0).fraction(), 0.0);
    }
}
