//! Lazy enumeration of candidate networks.
//!
//! Shapes are walked in ascending part count. For every shape the per-part
//! capacitance a homogeneous fill needs is derived analytically and looked up
//! by binary search over the capacitance-sorted eligible parts. Two-part mixes
//! are only tried for shapes no homogeneous fill can satisfy, and three-part
//! parallel banks only for shapes where two-part mixes found nothing either.
//!
//! ```text
//!   ShapeCursor ──► ratio prune ──► homogeneous fills ──┬──► pending queue ──► next()
//!                                                       │
//!                                   (none satisfied) ───┼──► mixes, one anchor per step
//!                                                       │
//!                                   (none satisfied) ───┴──► triples, one anchor per step
//! ```

use std::collections::{HashSet, VecDeque};
use std::time::Instant;

use crate::catalog::{CapacitorPart, CatalogStore};
use crate::constraint::{ConnectionType, Constraint};

use super::pool::{search_pool, PoolLimits};
use super::topology::{Arrangement, Shape, Topology};

/// Relative slack on analytic windows so rounding never drops a boundary part.
/// The ranking step applies the exact tolerance check.
const WINDOW_SLACK: f64 = 1e-9;

/// Canonical identity of a two-part mix within one shape.
type MixKey<'a> = (&'a str, u32, &'a str, u32);

/// Canonical identity of a three-part bank within one shape.
type TripleKey<'a> = [(&'a str, u32); 3];

enum Phase<'a> {
    Shapes,
    Mixes {
        shape: Shape,
        anchor: usize,
        seen: HashSet<MixKey<'a>>,
        found: bool,
    },
    Triples {
        shape: Shape,
        anchor: usize,
        seen: HashSet<TripleKey<'a>>,
    },
    Done,
}

/// Finite, single-pass sequence of topologies for one request.
pub struct NetworkEnumerator<'a> {
    /// Eligible parts, ascending by derated capacitance then id
    eligible: Vec<&'a CapacitorPart>,
    /// Derated capacitance of `eligible[i]`
    caps: Vec<f64>,
    pool: Vec<&'a CapacitorPart>,
    dc_bias: f64,
    lo: f64,
    hi: f64,
    min_volt: f64,
    max_esr: Option<f64>,
    /// Leading pool entries used as A/B for three-part banks
    triple_slice: usize,
    /// Feasible `p/s` range for any fill
    ratio: (f64, f64),
    shapes: ShapeCursor,
    phase: Phase<'a>,
    pending: VecDeque<Topology<'a>>,
    deadline: Option<Instant>,
    timed_out: bool,
    shapes_visited: u64,
    shapes_total: u64,
}

impl<'a> NetworkEnumerator<'a> {
    pub fn new(catalog: &'a CatalogStore, constraint: &Constraint, limits: &PoolLimits) -> Self {
        let dc_bias = constraint.dc_bias;
        let mut eligible: Vec<&'a CapacitorPart> = catalog
            .parts(&constraint.packages)
            .filter(|p| p.rated_temp >= constraint.min_temp)
            .collect();
        eligible.sort_by(|a, b| {
            a.derated_capacitance(dc_bias)
                .total_cmp(&b.derated_capacitance(dc_bias))
                .then_with(|| a.id.cmp(&b.id))
        });
        let caps: Vec<f64> = eligible
            .iter()
            .map(|p| p.derated_capacitance(dc_bias))
            .collect();
        let pool = search_pool(&eligible, limits, dc_bias);
        let triple_slice = limits.triple_slice.min(pool.len());

        let (lo, hi) = constraint.window();
        let ratio = match (caps.first(), caps.last()) {
            (Some(&cmin), Some(&cmax)) => (
                lo / cmax * (1.0 - WINDOW_SLACK),
                hi / cmin * (1.0 + WINDOW_SLACK),
            ),
            _ => (f64::INFINITY, 0.0),
        };

        let limit = shape_limit(constraint.conn_type, constraint.max_count, ratio);
        let phase = if eligible.is_empty() {
            Phase::Done
        } else {
            Phase::Shapes
        };

        tracing::debug!(
            "Enumerating up to {} parts: {} eligible, {} anchors, {} shapes",
            limit,
            eligible.len(),
            pool.len(),
            count_shapes(constraint.conn_type, limit)
        );

        Self {
            eligible,
            caps,
            pool,
            dc_bias,
            lo,
            hi,
            min_volt: constraint.min_rated_volt,
            max_esr: constraint.max_esr,
            triple_slice,
            ratio,
            shapes: ShapeCursor::new(constraint.conn_type, limit),
            phase,
            pending: VecDeque::new(),
            deadline: None,
            timed_out: false,
            shapes_visited: 0,
            shapes_total: count_shapes(constraint.conn_type, limit),
        }
    }

    /// Stop producing topologies once `deadline` has passed.
    pub fn with_deadline(mut self, deadline: Option<Instant>) -> Self {
        self.deadline = deadline;
        self
    }

    /// Whether the sequence ended because the deadline expired.
    pub fn timed_out(&self) -> bool {
        self.timed_out
    }

    pub fn shapes_visited(&self) -> u64 {
        self.shapes_visited
    }

    /// Number of shapes the request admits, before capacitance pruning.
    pub fn shapes_total(&self) -> u64 {
        self.shapes_total
    }

    pub fn eligible_count(&self) -> usize {
        self.eligible.len()
    }

    fn finished(&self) -> bool {
        matches!(self.phase, Phase::Done) && self.pending.is_empty()
    }

    fn deadline_passed(&mut self) -> bool {
        if self.timed_out {
            return true;
        }
        match self.deadline {
            Some(deadline) if !self.finished() && Instant::now() >= deadline => {
                tracing::warn!(
                    "Deadline reached after {} of {} shapes",
                    self.shapes_visited,
                    self.shapes_total
                );
                self.timed_out = true;
                self.pending.clear();
                self.phase = Phase::Done;
                true
            }
            _ => false,
        }
    }

    fn advance_shape(&mut self) -> Phase<'a> {
        let shape = match self.shapes.next() {
            Some(shape) => shape,
            None => return Phase::Done,
        };
        self.shapes_visited += 1;

        let ratio = shape.parallel as f64 / shape.series as f64;
        if ratio < self.ratio.0 || ratio > self.ratio.1 {
            return Phase::Shapes;
        }

        if self.fill_homogeneous(shape) || shape.part_count() < 2 {
            Phase::Shapes
        } else {
            Phase::Mixes {
                shape,
                anchor: 0,
                seen: HashSet::new(),
                found: false,
            }
        }
    }

    /// Whether a network ESR meets the request; unknown ESR always does.
    fn esr_ok(&self, esr: Option<f64>) -> bool {
        match (self.max_esr, esr) {
            (Some(limit), Some(esr)) => esr <= limit * (1.0 + WINDOW_SLACK),
            _ => true,
        }
    }

    /// Queue every single-part fill of `shape`; true when one meets the request.
    fn fill_homogeneous(&mut self, shape: Shape) -> bool {
        let s = shape.series as f64;
        let p = shape.parallel as f64;
        let (start, end) = self.window_indices(self.lo * s / p, self.hi * s / p);

        let mut satisfied = false;
        for &part in &self.eligible[start..end] {
            // Same ESR for both arrangements: s in series, p in parallel
            let esr = part.esr_ohm.map(|r| r * s / p);
            if part.rated_voltage * s >= self.min_volt && self.esr_ok(esr) {
                self.pending.push_back(Topology::homogeneous(shape, part));
                satisfied = true;
            }
        }
        if satisfied {
            tracing::debug!(
                "{}x{} {:?}: {} homogeneous fills",
                shape.series,
                shape.parallel,
                shape.arrangement,
                self.pending.len()
            );
        }
        satisfied
    }

    /// Queue the mixes anchored on `a`; true when any was queued.
    fn fill_mixes(
        &mut self,
        shape: Shape,
        a: &'a CapacitorPart,
        seen: &mut HashSet<MixKey<'a>>,
    ) -> bool {
        let queued = self.pending.len();
        let ca = a.derated_capacitance(self.dc_bias);
        let s = shape.series;
        let p = shape.parallel;
        match shape.arrangement {
            Arrangement::SeriesOfParallel if p >= 2 => {
                let (wlo, whi) = (self.lo * s as f64, self.hi * s as f64);
                self.parallel_mix(shape, a, ca, (wlo, whi), seen)
            }
            Arrangement::SeriesOfParallel => {
                let (wlo, whi) = (self.lo, self.hi);
                self.series_mix(shape, a, ca, (wlo, whi), seen)
            }
            Arrangement::ParallelOfSeries => {
                let (wlo, whi) = (self.lo / p as f64, self.hi / p as f64);
                self.series_mix(shape, a, ca, (wlo, whi), seen)
            }
        }
        self.pending.len() > queued
    }

    /// Banks of `nA·A ‖ nB·B`; the bank capacitance must fall in `window`.
    fn parallel_mix(
        &mut self,
        shape: Shape,
        a: &'a CapacitorPart,
        ca: f64,
        (wlo, whi): (f64, f64),
        seen: &mut HashSet<MixKey<'a>>,
    ) {
        let size = shape.group_size();
        let series = shape.series as f64;

        for na in 1..size {
            let nb = size - na;
            let base = na as f64 * ca;
            if whi - base <= 0.0 {
                break;
            }
            let (start, end) =
                self.window_indices((wlo - base) / nb as f64, (whi - base) / nb as f64);

            for i in start..end {
                let b = self.eligible[i];
                if b.id == a.id || !seen.insert(mix_key(a, na, b, nb)) {
                    continue;
                }
                let bank = base + nb as f64 * self.caps[i];
                let voltage = a.rated_voltage.min(b.rated_voltage) * series;
                let esr = parallel_esr(&[(a.esr_ohm, na), (b.esr_ohm, nb)]).map(|r| r * series);
                if within(bank, wlo, whi) && voltage >= self.min_volt && self.esr_ok(esr) {
                    self.pending
                        .push_back(Topology::uniform_mix(shape, a, na, b, nb));
                }
            }
        }
    }

    /// Series strings of `nA` A-parts and `nB` B-parts; the string
    /// capacitance must fall in `window`.
    fn series_mix(
        &mut self,
        shape: Shape,
        a: &'a CapacitorPart,
        ca: f64,
        (wlo, whi): (f64, f64),
        seen: &mut HashSet<MixKey<'a>>,
    ) {
        let size = shape.series;

        for na in 1..size {
            let nb = size - na;
            let used = na as f64 / ca;
            let rhi = reciprocal(wlo) - used;
            if rhi <= 0.0 {
                break;
            }
            let rlo = reciprocal(whi) - used;
            let cb_hi = if rlo > 0.0 {
                nb as f64 / rlo
            } else {
                f64::INFINITY
            };
            let (start, end) = self.window_indices(nb as f64 / rhi, cb_hi);

            for i in start..end {
                let b = self.eligible[i];
                if b.id == a.id || !seen.insert(mix_key(a, na, b, nb)) {
                    continue;
                }
                let string = 1.0 / (used + nb as f64 / self.caps[i]);
                let voltage = na as f64 * a.rated_voltage + nb as f64 * b.rated_voltage;
                let esr = series_esr(&[(a.esr_ohm, na), (b.esr_ohm, nb)])
                    .map(|r| r / shape.parallel as f64);
                if within(string, wlo, whi) && voltage >= self.min_volt && self.esr_ok(esr) {
                    let topology = match shape.arrangement {
                        Arrangement::SeriesOfParallel => Topology::series_mix(shape, a, na, b, nb),
                        Arrangement::ParallelOfSeries => Topology::uniform_mix(shape, a, na, b, nb),
                    };
                    self.pending.push_back(topology);
                }
            }
        }
    }

    /// Banks of `1·A ‖ 1·B ‖ nC·C` with A the anchor and B a later entry of
    /// the triple slice; C is solved from the bank window.
    fn fill_triples(&mut self, shape: Shape, anchor: usize, seen: &mut HashSet<TripleKey<'a>>) {
        let series = shape.series as f64;
        let nc = shape.parallel - 2;
        let (wlo, whi) = (self.lo * series, self.hi * series);
        let a = self.pool[anchor];
        let ca = a.derated_capacitance(self.dc_bias);

        for j in anchor + 1..self.triple_slice {
            let b = self.pool[j];
            let base = ca + b.derated_capacitance(self.dc_bias);
            if whi - base <= 0.0 {
                continue;
            }
            let (start, end) =
                self.window_indices((wlo - base) / nc as f64, (whi - base) / nc as f64);

            for i in start..end {
                let c = self.eligible[i];
                if c.id == a.id || c.id == b.id || !seen.insert(triple_key(a, b, c, nc)) {
                    continue;
                }
                let bank = base + nc as f64 * self.caps[i];
                let voltage = a.rated_voltage.min(b.rated_voltage).min(c.rated_voltage) * series;
                let esr = parallel_esr(&[(a.esr_ohm, 1), (b.esr_ohm, 1), (c.esr_ohm, nc)])
                    .map(|r| r * series);
                if within(bank, wlo, whi) && voltage >= self.min_volt && self.esr_ok(esr) {
                    self.pending
                        .push_back(Topology::triple_mix(shape, a, b, c, nc));
                }
            }
        }
    }

    /// Index range of eligible parts whose derated capacitance lies in `[lo, hi]`.
    fn window_indices(&self, lo: f64, hi: f64) -> (usize, usize) {
        let lo = lo * (1.0 - WINDOW_SLACK);
        let hi = hi * (1.0 + WINDOW_SLACK);
        let start = self.caps.partition_point(|&c| c < lo);
        let end = self.caps.partition_point(|&c| c <= hi);
        (start, end.max(start))
    }
}

impl<'a> Iterator for NetworkEnumerator<'a> {
    type Item = Topology<'a>;

    fn next(&mut self) -> Option<Topology<'a>> {
        loop {
            if self.deadline_passed() {
                return None;
            }
            if let Some(topology) = self.pending.pop_front() {
                return Some(topology);
            }
            self.phase = match std::mem::replace(&mut self.phase, Phase::Done) {
                Phase::Done => return None,
                Phase::Shapes => self.advance_shape(),
                Phase::Mixes {
                    shape,
                    anchor,
                    found,
                    ..
                } if anchor >= self.pool.len() => {
                    tracing::debug!(
                        "{}x{} {:?}: mixes exhausted",
                        shape.series,
                        shape.parallel,
                        shape.arrangement
                    );
                    if !found
                        && shape.arrangement == Arrangement::SeriesOfParallel
                        && shape.parallel >= 3
                        && self.triple_slice >= 2
                    {
                        Phase::Triples {
                            shape,
                            anchor: 0,
                            seen: HashSet::new(),
                        }
                    } else {
                        Phase::Shapes
                    }
                }
                Phase::Mixes {
                    shape,
                    anchor,
                    mut seen,
                    found,
                } => {
                    let a = self.pool[anchor];
                    let queued = self.fill_mixes(shape, a, &mut seen);
                    Phase::Mixes {
                        shape,
                        anchor: anchor + 1,
                        seen,
                        found: found || queued,
                    }
                }
                Phase::Triples { anchor, .. } if anchor + 1 >= self.triple_slice => Phase::Shapes,
                Phase::Triples {
                    shape,
                    anchor,
                    mut seen,
                } => {
                    self.fill_triples(shape, anchor, &mut seen);
                    Phase::Triples {
                        shape,
                        anchor: anchor + 1,
                        seen,
                    }
                }
            };
        }
    }
}

/// Walks `(s, p)` pairs by ascending `s·p`, then ascending `s`.
struct ShapeCursor {
    conn: ConnectionType,
    limit: u32,
    n: u32,
    queue: VecDeque<Shape>,
}

impl ShapeCursor {
    fn new(conn: ConnectionType, limit: u32) -> Self {
        Self {
            conn,
            limit,
            n: 0,
            queue: VecDeque::new(),
        }
    }

    fn fill(&mut self) {
        let n = self.n;
        match self.conn {
            ConnectionType::SeriesOnly => {
                self.queue
                    .push_back(Shape::new(n, 1, Arrangement::SeriesOfParallel));
            }
            ConnectionType::ParallelOnly => {
                self.queue
                    .push_back(Shape::new(1, n, Arrangement::SeriesOfParallel));
            }
            conn => {
                for s in divisors(n) {
                    let p = n / s;
                    let sop = Shape::new(s, p, Arrangement::SeriesOfParallel);
                    let pos = Shape::new(s, p, Arrangement::ParallelOfSeries);
                    match conn {
                        ConnectionType::SeriesOfParallel if s < 2 => {}
                        ConnectionType::ParallelOfSeries if p < 2 => {}
                        // One string is just a parallel bank
                        ConnectionType::ParallelOfSeries if s == 1 => self.queue.push_back(sop),
                        ConnectionType::ParallelOfSeries => self.queue.push_back(pos),
                        ConnectionType::Any if s >= 2 && p >= 2 => {
                            self.queue.push_back(sop);
                            self.queue.push_back(pos);
                        }
                        _ => self.queue.push_back(sop),
                    }
                }
            }
        }
    }
}

impl Iterator for ShapeCursor {
    type Item = Shape;

    fn next(&mut self) -> Option<Shape> {
        loop {
            if let Some(shape) = self.queue.pop_front() {
                return Some(shape);
            }
            if self.n >= self.limit {
                return None;
            }
            self.n += 1;
            self.fill();
        }
    }
}

/// Largest part count worth walking. Series-only and parallel-only shapes
/// drift monotonically away from the target, so the ratio bounds cap them.
fn shape_limit(conn: ConnectionType, max_count: u32, (rlo, rhi): (f64, f64)) -> u32 {
    let bound = match conn {
        // p/s = 1/n must stay above rlo
        ConnectionType::SeriesOnly if rlo > 0.0 => (1.0 / rlo).floor(),
        // p/s = n must stay below rhi
        ConnectionType::ParallelOnly => rhi.floor(),
        _ => return max_count,
    };
    if bound >= max_count as f64 {
        max_count
    } else {
        bound.max(0.0) as u32
    }
}

/// Exact number of shapes admitted for `conn` with at most `limit` parts.
pub fn count_shapes(conn: ConnectionType, limit: u32) -> u64 {
    let n = limit as u64;
    let pairs = divisor_pairs(n);
    match conn {
        ConnectionType::SeriesOnly | ConnectionType::ParallelOnly => n,
        ConnectionType::SeriesOfParallel | ConnectionType::ParallelOfSeries => pairs - n,
        // Both arrangements for every s, p >= 2
        ConnectionType::Any if n == 0 => 0,
        ConnectionType::Any => 2 * pairs + 1 - 2 * n,
    }
}

/// `#{(s, p) : s·p ≤ n}` by the Dirichlet hyperbola method.
fn divisor_pairs(n: u64) -> u64 {
    if n == 0 {
        return 0;
    }
    let k = isqrt(n);
    2 * (1..=k).map(|s| n / s).sum::<u64>() - k * k
}

fn isqrt(n: u64) -> u64 {
    let mut r = (n as f64).sqrt() as u64;
    while r * r > n {
        r -= 1;
    }
    while (r + 1) * (r + 1) <= n {
        r += 1;
    }
    r
}

/// Divisors of `n` in ascending order.
fn divisors(n: u32) -> Vec<u32> {
    let mut small = Vec::new();
    let mut large = Vec::new();
    let mut d: u32 = 1;
    while (d as u64) * (d as u64) <= n as u64 {
        if n % d == 0 {
            small.push(d);
            if d != n / d {
                large.push(n / d);
            }
        }
        d += 1;
    }
    small.extend(large.into_iter().rev());
    small
}

fn mix_key<'a>(a: &'a CapacitorPart, na: u32, b: &'a CapacitorPart, nb: u32) -> MixKey<'a> {
    if a.id <= b.id {
        (a.id.as_str(), na, b.id.as_str(), nb)
    } else {
        (b.id.as_str(), nb, a.id.as_str(), na)
    }
}

fn triple_key<'a>(
    a: &'a CapacitorPart,
    b: &'a CapacitorPart,
    c: &'a CapacitorPart,
    nc: u32,
) -> TripleKey<'a> {
    let mut key = [(a.id.as_str(), 1), (b.id.as_str(), 1), (c.id.as_str(), nc)];
    key.sort_unstable();
    key
}

/// `1 / Σ(n / R)`; unknown when any resistance is.
fn parallel_esr(items: &[(Option<f64>, u32)]) -> Option<f64> {
    let conductance = items
        .iter()
        .map(|(r, n)| r.map(|r| *n as f64 / r))
        .sum::<Option<f64>>()?;
    Some(1.0 / conductance)
}

/// `Σ n·R`; unknown when any resistance is.
fn series_esr(items: &[(Option<f64>, u32)]) -> Option<f64> {
    items
        .iter()
        .map(|(r, n)| r.map(|r| *n as f64 * r))
        .sum()
}

fn reciprocal(x: f64) -> f64 {
    if x > 0.0 {
        1.0 / x
    } else {
        f64::INFINITY
    }
}

fn within(value: f64, lo: f64, hi: f64) -> bool {
    value >= lo * (1.0 - WINDOW_SLACK) && value <= hi * (1.0 + WINDOW_SLACK)
}
