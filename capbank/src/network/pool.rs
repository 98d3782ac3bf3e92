//! Anchor parts for heterogeneous fills.
//!
//! Mixing two parts means pairing every anchor A with a solved window for B.
//! Three-part banks pair anchors among the first `triple_slice` pool entries.
//! Anchors are limited to the parts most likely to end up in a small bank:
//! the densest, the largest, and the smallest fillers.

use std::collections::HashSet;

use crate::catalog::CapacitorPart;

/// How many parts each ranking contributes to the pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolLimits {
    pub by_density: usize,
    pub by_capacitance: usize,
    pub by_volume: usize,
    /// Leading pool entries paired up for three-part banks
    pub triple_slice: usize,
}

impl Default for PoolLimits {
    fn default() -> Self {
        Self {
            by_density: 500,
            by_capacitance: 100,
            by_volume: 50,
            triple_slice: 15,
        }
    }
}

/// Build the deduplicated anchor list in a deterministic order.
pub fn search_pool<'a>(
    parts: &[&'a CapacitorPart],
    limits: &PoolLimits,
    dc_bias: f64,
) -> Vec<&'a CapacitorPart> {
    let mut by_density = parts.to_vec();
    by_density.sort_by(|a, b| {
        b.density(dc_bias)
            .total_cmp(&a.density(dc_bias))
            .then_with(|| a.id.cmp(&b.id))
    });

    let mut by_capacitance = parts.to_vec();
    by_capacitance.sort_by(|a, b| {
        b.capacitance
            .total_cmp(&a.capacitance)
            .then_with(|| a.id.cmp(&b.id))
    });

    let mut by_volume = parts.to_vec();
    by_volume.sort_by(|a, b| {
        a.volume_mm3
            .total_cmp(&b.volume_mm3)
            .then_with(|| a.id.cmp(&b.id))
    });

    let mut seen = HashSet::new();
    by_density
        .into_iter()
        .take(limits.by_density)
        .chain(by_capacitance.into_iter().take(limits.by_capacitance))
        .chain(by_volume.into_iter().take(limits.by_volume))
        .filter(|p| seen.insert(p.id.as_str()))
        .collect()
}
