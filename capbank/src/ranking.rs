//! Filtering, deduplication and ordering of evaluated candidates.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::constraint::Constraint;
use crate::network::{Candidate, StructureKey};

/// Number of results returned when the caller does not choose.
pub const DEFAULT_TOP_K: usize = 50;

/// Kept candidates may grow to this multiple of `top_k` before pruning.
const PRUNE_FACTOR: usize = 4;

pub struct RankingEngine;

impl RankingEngine {
    /// Whether a candidate meets every hard requirement of the request.
    pub fn satisfies(candidate: &Candidate, constraint: &Constraint) -> bool {
        let esr_ok = match (constraint.max_esr, candidate.esr_ohm) {
            (Some(limit), Some(esr)) => esr <= limit,
            _ => true,
        };
        constraint.in_band(candidate.capacitance)
            && candidate.part_count <= constraint.max_count
            && candidate.voltage_rating >= constraint.min_rated_volt
            && candidate.temp_rating >= constraint.min_temp
            && candidate
                .parts
                .iter()
                .all(|p| constraint.packages.contains(&p.package))
            && esr_ok
    }

    /// Best-first total order: volume, part count, distance to target,
    /// then arrangement, label and structure.
    pub fn compare(a: &Candidate, b: &Candidate, target: f64) -> Ordering {
        a.volume_mm3
            .total_cmp(&b.volume_mm3)
            .then_with(|| a.part_count.cmp(&b.part_count))
            .then_with(|| {
                (a.capacitance - target)
                    .abs()
                    .total_cmp(&(b.capacitance - target).abs())
            })
            .then_with(|| a.shape.arrangement.cmp(&b.shape.arrangement))
            .then_with(|| a.label.cmp(&b.label))
            .then_with(|| a.key.cmp(&b.key))
    }

    /// Filter, deduplicate, sort and truncate in one pass.
    pub fn rank<I>(candidates: I, constraint: &Constraint, top_k: usize) -> Vec<Candidate>
    where
        I: IntoIterator<Item = Candidate>,
    {
        let mut ranker = Ranker::new(constraint, top_k);
        ranker.extend(candidates);
        ranker.finish()
    }
}

/// Incremental form of [`RankingEngine::rank`].
///
/// Memory stays proportional to `top_k`: once enough distinct candidates are
/// held, everything outside the current best `top_k` is dropped. Pruning is
/// exact because the order is total and duplicates are evaluated identically.
pub struct Ranker<'c> {
    constraint: &'c Constraint,
    top_k: usize,
    kept: BTreeMap<StructureKey, Candidate>,
    rejected: usize,
}

impl<'c> Ranker<'c> {
    pub fn new(constraint: &'c Constraint, top_k: usize) -> Self {
        Self {
            constraint,
            top_k,
            kept: BTreeMap::new(),
            rejected: 0,
        }
    }

    pub fn push(&mut self, candidate: Candidate) {
        if !RankingEngine::satisfies(&candidate, self.constraint) {
            self.rejected += 1;
            return;
        }
        if self.top_k == 0 {
            return;
        }
        self.kept.entry(candidate.key.clone()).or_insert(candidate);
        if self.kept.len() >= self.top_k.saturating_mul(PRUNE_FACTOR) {
            self.prune();
        }
    }

    /// Distinct candidates currently held.
    pub fn len(&self) -> usize {
        self.kept.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kept.is_empty()
    }

    /// Candidates that failed a hard requirement.
    pub fn rejected(&self) -> usize {
        self.rejected
    }

    pub fn finish(self) -> Vec<Candidate> {
        let target = self.constraint.target_cap;
        let mut ranked: Vec<Candidate> = self.kept.into_values().collect();
        ranked.sort_by(|a, b| RankingEngine::compare(a, b, target));
        ranked.truncate(self.top_k);
        ranked
    }

    fn prune(&mut self) {
        let target = self.constraint.target_cap;
        let mut ranked: Vec<Candidate> = std::mem::take(&mut self.kept).into_values().collect();
        ranked.sort_by(|a, b| RankingEngine::compare(a, b, target));
        ranked.truncate(self.top_k);
        self.kept = ranked.into_iter().map(|c| (c.key.clone(), c)).collect();
    }
}

impl Extend<Candidate> for Ranker<'_> {
    fn extend<I: IntoIterator<Item = Candidate>>(&mut self, iter: I) {
        for candidate in iter {
            self.push(candidate);
        }
    }
}
