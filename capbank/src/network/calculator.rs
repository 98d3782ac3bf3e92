//! Equivalent-circuit evaluation of a topology.
//!
//! Voltage ratings use a linear model: parallel members share one voltage so
//! the weakest member sets the group rating, and series elements add their
//! ratings. This ignores charge imbalance between unequal series capacitors.

use crate::constraint::Constraint;
use crate::core::CapBankError;

use super::candidate::{Candidate, PartUsage};
use super::topology::{Arrangement, Group, Topology};

/// Electrical summary of one group.
struct GroupValues {
    capacitance: f64,
    voltage: f64,
    esr: Option<f64>,
}

pub struct EquivalentCalculator;

impl EquivalentCalculator {
    /// Evaluate a topology against a validated constraint.
    pub fn compute(topology: &Topology<'_>, constraint: &Constraint) -> Result<Candidate, CapBankError> {
        if topology.blocks.is_empty() || topology.blocks.iter().any(|b| b.repeat == 0) {
            return Err(CapBankError::Internal("topology has no groups".to_string()));
        }

        let groups = topology
            .blocks
            .iter()
            .map(|b| Self::group_values(&b.group, topology.shape.arrangement).map(|v| (v, b.repeat)))
            .collect::<Result<Vec<_>, _>>()?;

        let (raw_cap, voltage, esr) = match topology.shape.arrangement {
            Arrangement::SeriesOfParallel => (
                series_capacitance(groups.iter().map(|(g, n)| (g.capacitance, *n))),
                groups.iter().map(|(g, n)| g.voltage * *n as f64).sum::<f64>(),
                groups
                    .iter()
                    .map(|(g, n)| g.esr.map(|r| r * *n as f64))
                    .sum::<Option<f64>>(),
            ),
            Arrangement::ParallelOfSeries => (
                groups.iter().map(|(g, n)| g.capacitance * *n as f64).sum::<f64>(),
                groups.iter().map(|(g, _)| g.voltage).fold(f64::INFINITY, f64::min),
                parallel_resistance(groups.iter().map(|(g, n)| g.esr.map(|r| (r, *n)))),
            ),
        };

        if !raw_cap.is_finite() || raw_cap <= 0.0 {
            return Err(CapBankError::Internal(format!(
                "non-positive equivalent capacitance for {}",
                topology.label()
            )));
        }

        let temp_rating = topology
            .members()
            .map(|(part, _)| part.rated_temp)
            .fold(f64::INFINITY, f64::min);
        let volume_mm3: f64 = topology
            .members()
            .map(|(part, n)| part.volume_mm3 * n as f64)
            .sum();
        let footprint_mm2: f64 = topology
            .members()
            .map(|(part, n)| part.footprint_mm2() * n as f64)
            .sum();
        let height_mm = topology
            .members()
            .map(|(part, _)| part.height_mm())
            .fold(0.0, f64::max);

        let parts = topology
            .part_totals()
            .into_iter()
            .map(|(part, count)| PartUsage {
                part: part.id.clone(),
                package: part.package.clone(),
                count,
            })
            .collect();

        Ok(Candidate {
            shape_tag: topology.shape.tag(),
            volume_mm3,
            capacitance: raw_cap * (1.0 - constraint.dc_bias),
            label: topology.label(),
            bom: topology.bom(),
            part_count: topology.part_count(),
            voltage_rating: voltage,
            temp_rating,
            esr_ohm: esr,
            footprint_mm2,
            height_mm,
            parts,
            shape: topology.shape,
            key: topology.structure_key(),
        })
    }

    fn group_values(group: &Group<'_>, arrangement: Arrangement) -> Result<GroupValues, CapBankError> {
        if group.members.is_empty() {
            return Err(CapBankError::Internal("empty group in topology".to_string()));
        }
        if let Some(bad) = group
            .members
            .iter()
            .find(|m| !(m.part.capacitance.is_finite() && m.part.capacitance > 0.0) || m.count == 0)
        {
            return Err(CapBankError::Internal(format!(
                "part {} reached the calculator with capacitance {} and count {}",
                bad.part.id, bad.part.capacitance, bad.count
            )));
        }

        let members = group.members.iter();
        Ok(match arrangement {
            // Parallel bank
            Arrangement::SeriesOfParallel => GroupValues {
                capacitance: members
                    .clone()
                    .map(|m| m.part.capacitance * m.count as f64)
                    .sum(),
                voltage: members
                    .clone()
                    .map(|m| m.part.rated_voltage)
                    .fold(f64::INFINITY, f64::min),
                esr: parallel_resistance(members.map(|m| m.part.esr_ohm.map(|r| (r, m.count)))),
            },
            // Series string
            Arrangement::ParallelOfSeries => GroupValues {
                capacitance: series_capacitance(
                    members.clone().map(|m| (m.part.capacitance, m.count)),
                ),
                voltage: members
                    .clone()
                    .map(|m| m.part.rated_voltage * m.count as f64)
                    .sum(),
                esr: members
                    .map(|m| m.part.esr_ohm.map(|r| r * m.count as f64))
                    .sum::<Option<f64>>(),
            },
        })
    }
}

/// `1 / Σ(n / C)` over `(capacitance, count)` pairs.
fn series_capacitance(items: impl Iterator<Item = (f64, u32)>) -> f64 {
    let inverse: f64 = items.map(|(c, n)| n as f64 / c).sum();
    1.0 / inverse
}

/// `1 / Σ(n / R)`; unknown as soon as one resistance is unknown.
fn parallel_resistance(items: impl Iterator<Item = Option<(f64, u32)>>) -> Option<f64> {
    let conductance = items
        .map(|item| item.map(|(r, n)| n as f64 / r))
        .sum::<Option<f64>>()?;
    Some(1.0 / conductance)
}
