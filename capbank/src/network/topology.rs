//! Network shapes and part assignments.

use std::collections::BTreeMap;

use crate::catalog::package::package_area;
use crate::catalog::CapacitorPart;

/// How groups are wired together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Arrangement {
    /// Groups are parallel banks; banks are stacked in series.
    SeriesOfParallel,
    /// Groups are series strings; strings are connected in parallel.
    ParallelOfSeries,
}

/// `series × parallel` grid of positions plus the wiring between them.
///
/// For [`Arrangement::SeriesOfParallel`] there are `series` banks of `parallel`
/// parts each; for [`Arrangement::ParallelOfSeries`] there are `parallel`
/// strings of `series` parts each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Shape {
    pub series: u32,
    pub parallel: u32,
    pub arrangement: Arrangement,
}

impl Shape {
    pub fn new(series: u32, parallel: u32, arrangement: Arrangement) -> Self {
        Self {
            series,
            parallel,
            arrangement,
        }
    }

    pub fn part_count(&self) -> u32 {
        self.series * self.parallel
    }

    /// Number of groups the shape is built from.
    pub fn group_count(&self) -> u32 {
        match self.arrangement {
            Arrangement::SeriesOfParallel => self.series,
            Arrangement::ParallelOfSeries => self.parallel,
        }
    }

    /// Parts in each group.
    pub fn group_size(&self) -> u32 {
        match self.arrangement {
            Arrangement::SeriesOfParallel => self.parallel,
            Arrangement::ParallelOfSeries => self.series,
        }
    }

    /// Result label: parallel members per group.
    pub fn tag(&self) -> String {
        format!("{}p", self.parallel)
    }
}

/// `count` copies of one catalog part inside a group.
#[derive(Debug, Clone, Copy)]
pub struct Member<'a> {
    pub part: &'a CapacitorPart,
    pub count: u32,
}

/// A parallel bank or a series string, members sorted by part id.
#[derive(Debug, Clone)]
pub struct Group<'a> {
    pub members: Vec<Member<'a>>,
}

impl<'a> Group<'a> {
    pub fn single(part: &'a CapacitorPart, count: u32) -> Self {
        Self {
            members: vec![Member { part, count }],
        }
    }

    pub fn mix(a: &'a CapacitorPart, na: u32, b: &'a CapacitorPart, nb: u32) -> Self {
        let mut members = vec![Member { part: a, count: na }, Member { part: b, count: nb }];
        members.sort_by(|x, y| x.part.id.cmp(&y.part.id));
        Self { members }
    }

    pub fn triple(a: &'a CapacitorPart, b: &'a CapacitorPart, c: &'a CapacitorPart, nc: u32) -> Self {
        let mut members = vec![
            Member { part: a, count: 1 },
            Member { part: b, count: 1 },
            Member { part: c, count: nc },
        ];
        members.sort_by(|x, y| x.part.id.cmp(&y.part.id));
        Self { members }
    }

    pub fn size(&self) -> u32 {
        self.members.iter().map(|m| m.count).sum()
    }

    fn key(&self) -> Vec<(String, u32)> {
        self.members
            .iter()
            .map(|m| (m.part.id.clone(), m.count))
            .collect()
    }

    fn describe(&self) -> String {
        match self.members.as_slice() {
            [only] => format!("{}x {} ({})", only.count, only.part.id, only.part.package),
            members => members
                .iter()
                .map(|m| format!("{}x {}", m.count, m.part.id))
                .collect::<Vec<_>>()
                .join(" + "),
        }
    }
}

/// One distinct group and how many identical copies of it the network holds.
#[derive(Debug, Clone)]
pub struct Block<'a> {
    pub group: Group<'a>,
    pub repeat: u32,
}

/// Permutation-invariant identity of a network: wiring plus the sorted
/// multiset of sorted groups, each with its multiplicity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StructureKey {
    pub arrangement: Arrangement,
    pub groups: Vec<(Vec<(String, u32)>, u32)>,
}

/// A shape with a concrete part at every position.
///
/// Identical groups are stored once with a repeat count, so a long string of
/// one part costs the same as a single part.
#[derive(Debug, Clone)]
pub struct Topology<'a> {
    pub shape: Shape,
    pub blocks: Vec<Block<'a>>,
}

impl<'a> Topology<'a> {
    fn uniform(shape: Shape, group: Group<'a>) -> Self {
        Self {
            shape,
            blocks: vec![Block {
                group,
                repeat: shape.group_count(),
            }],
        }
    }

    /// Every position filled with the same part.
    pub fn homogeneous(shape: Shape, part: &'a CapacitorPart) -> Self {
        Self::uniform(shape, Group::single(part, shape.group_size()))
    }

    /// Every group holds the same two-part mix.
    pub fn uniform_mix(
        shape: Shape,
        a: &'a CapacitorPart,
        na: u32,
        b: &'a CapacitorPart,
        nb: u32,
    ) -> Self {
        Self::uniform(shape, Group::mix(a, na, b, nb))
    }

    /// Every parallel bank holds one A, one B and `nc` C-parts.
    pub fn triple_mix(
        shape: Shape,
        a: &'a CapacitorPart,
        b: &'a CapacitorPart,
        c: &'a CapacitorPart,
        nc: u32,
    ) -> Self {
        Self::uniform(shape, Group::triple(a, b, c, nc))
    }

    /// A plain series string (`parallel == 1`) of `na` A-parts and `nb` B-parts.
    pub fn series_mix(
        shape: Shape,
        a: &'a CapacitorPart,
        na: u32,
        b: &'a CapacitorPart,
        nb: u32,
    ) -> Self {
        let mut blocks = vec![
            Block {
                group: Group::single(a, 1),
                repeat: na,
            },
            Block {
                group: Group::single(b, 1),
                repeat: nb,
            },
        ];
        blocks.sort_by(|x, y| x.group.members[0].part.id.cmp(&y.group.members[0].part.id));
        Self { shape, blocks }
    }

    /// Number of groups, counting repeats.
    pub fn group_count(&self) -> u32 {
        self.blocks.iter().map(|b| b.repeat).sum()
    }

    pub fn part_count(&self) -> u32 {
        self.blocks.iter().map(|b| b.group.size() * b.repeat).sum()
    }

    /// Members with the number of times each occurs in the whole network.
    pub fn members(&self) -> impl Iterator<Item = (&'a CapacitorPart, u32)> + '_ {
        self.blocks.iter().flat_map(|b| {
            b.group
                .members
                .iter()
                .map(move |m| (m.part, m.count * b.repeat))
        })
    }

    pub fn structure_key(&self) -> StructureKey {
        let mut merged: BTreeMap<Vec<(String, u32)>, u32> = BTreeMap::new();
        for block in &self.blocks {
            *merged.entry(block.group.key()).or_insert(0) += block.repeat;
        }
        StructureKey {
            arrangement: self.shape.arrangement,
            groups: merged.into_iter().collect(),
        }
    }

    /// Total count per distinct part, largest footprint first.
    pub fn part_totals(&self) -> Vec<(&'a CapacitorPart, u32)> {
        let mut totals: BTreeMap<&str, (&'a CapacitorPart, u32)> = BTreeMap::new();
        for (part, count) in self.members() {
            totals.entry(part.id.as_str()).or_insert((part, 0)).1 += count;
        }
        let mut totals: Vec<_> = totals.into_values().collect();
        totals.sort_by(|(a, _), (b, _)| {
            footprint_key(b)
                .total_cmp(&footprint_key(a))
                .then_with(|| a.id.cmp(&b.id))
        });
        totals
    }

    /// Human-readable wiring description.
    pub fn label(&self) -> String {
        let first = match self.blocks.first() {
            Some(b) => &b.group,
            None => return String::new(),
        };
        let uniform = self.blocks.len() == 1;
        let groups = self.group_count();

        match self.shape.arrangement {
            Arrangement::SeriesOfParallel if uniform && groups == 1 => first.describe(),
            Arrangement::SeriesOfParallel if uniform => {
                format!("{}S × ({})", groups, first.describe())
            }
            Arrangement::SeriesOfParallel => {
                let members = self
                    .part_totals()
                    .iter()
                    .map(|(part, count)| format!("{}x {}", count, part.id))
                    .collect::<Vec<_>>()
                    .join(" + ");
                format!("{}S: {}", groups, members)
            }
            Arrangement::ParallelOfSeries => format!(
                "{}P × ({}S: {})",
                groups,
                self.shape.series,
                first.describe()
            ),
        }
    }

    /// Bill of materials by package, e.g. `"2x 0805 + 1x 0402"`.
    pub fn bom(&self) -> String {
        self.part_totals()
            .iter()
            .map(|(part, count)| format!("{}x {}", count, part.package))
            .collect::<Vec<_>>()
            .join(" + ")
    }
}

/// Board area of a part, falling back to the nominal package area.
fn footprint_key(part: &CapacitorPart) -> f64 {
    let area = part.footprint_mm2();
    if area > 0.0 {
        area
    } else {
        package_area(&part.package)
    }
}
