use std::cmp::Ordering;
use std::collections::BinaryHeap;

use rustc_hash::{FxHashMap, FxHashSet};
use tracing::{trace, warn};

use crate::config::Costs;

use super::error::RouteError;
use super::maps::OccupancyMap;
use super::types::{GridPoint, GridRect};

/// Obstacles are inflated by the strict buffer before splitting, so a point
/// inside a MER is routable under strict rules.
pub const STRICT_BUFFER: i32 = 1;

/// Upper bound on rectangles processed by one decomposition.
const MAX_SPLIT_STEPS: usize = 100_000;

/// A maximal empty rectangle of the decomposition.
#[derive(Debug, Clone, PartialEq)]
pub struct Mer {
    pub id: usize,
    pub rect: GridRect,
    pub has_wire: bool,
    pub subsquares: u32,
    pub wired_subsquares: u32,
}

impl Mer {
    /// Share of sub-squares crossed by an existing wire.
    pub fn density(&self) -> f32 {
        if self.subsquares == 0 {
            return 0.0;
        }
        self.wired_subsquares as f32 / self.subsquares as f32
    }
}

/// Bounding box of every input, grown by `margin` cells.
pub fn board_extent(
    obstacles: &[GridRect],
    wires: &[Vec<GridPoint>],
    terminals: &[GridPoint],
    margin: i32,
) -> GridRect {
    let mut min_x = i32::MAX;
    let mut min_y = i32::MAX;
    let mut max_x = i32::MIN;
    let mut max_y = i32::MIN;
    let mut include = |x1: i32, y1: i32, x2: i32, y2: i32| {
        min_x = min_x.min(x1);
        min_y = min_y.min(y1);
        max_x = max_x.max(x2);
        max_y = max_y.max(y2);
    };
    for rect in obstacles {
        include(rect.x, rect.y, rect.right(), rect.bottom());
    }
    for p in wires.iter().flatten().chain(terminals) {
        include(p.x, p.y, p.x + 1, p.y + 1);
    }
    if min_x > max_x {
        return GridRect::new(-margin, -margin, 2 * margin, 2 * margin);
    }
    GridRect::new(min_x, min_y, max_x - min_x, max_y - min_y).inflate(margin)
}

/// Splits `space` around the first obstacle intersecting it, repeating on the
/// pieces until no piece intersects any obstacle.
///
/// Top and bottom pieces span the full width of the space being split; left
/// and right pieces are confined to the obstacle's vertical span, so the
/// leaves never overlap.
pub fn split_free_space(space: GridRect, obstacles: &[GridRect]) -> Vec<GridRect> {
    let mut leaves = Vec::new();
    let mut stack = vec![space];
    let mut steps = 0usize;

    while let Some(space) = stack.pop() {
        steps += 1;
        if steps > MAX_SPLIT_STEPS {
            warn!(
                leaves = leaves.len(),
                pending = stack.len() + 1,
                "free-space split step cap reached"
            );
            break;
        }
        let Some(obs) = obstacles.iter().find(|o| space.intersects(o)) else {
            leaves.push(space);
            continue;
        };

        let mut pieces = Vec::with_capacity(4);
        if obs.y > space.y {
            pieces.push(GridRect::new(space.x, space.y, space.width, obs.y - space.y));
        }
        if obs.bottom() < space.bottom() {
            pieces.push(GridRect::new(
                space.x,
                obs.bottom(),
                space.width,
                space.bottom() - obs.bottom(),
            ));
        }
        let y1 = space.y.max(obs.y);
        let y2 = space.bottom().min(obs.bottom());
        if obs.x > space.x && y2 > y1 {
            pieces.push(GridRect::new(space.x, y1, obs.x - space.x, y2 - y1));
        }
        if obs.right() < space.right() && y2 > y1 {
            pieces.push(GridRect::new(
                obs.right(),
                y1,
                space.right() - obs.right(),
                y2 - y1,
            ));
        }
        // reversed so pieces are emitted top, bottom, left, right
        stack.extend(pieces.into_iter().rev());
    }
    leaves
}

/// MER decomposition of the board and its adjacency graph.
#[derive(Debug, Clone, Default)]
pub struct FreeSpace {
    pub mers: Vec<Mer>,
    pub adjacency: Vec<Vec<usize>>,
}

impl FreeSpace {
    pub fn build(
        world: GridRect,
        obstacles: &[GridRect],
        occupancy: &OccupancyMap,
        subsquare_size: i32,
    ) -> Self {
        let inflated: Vec<GridRect> = obstacles
            .iter()
            .map(|o| o.inflate(STRICT_BUFFER))
            .collect();
        let rects = split_free_space(world, &inflated);
        let size = subsquare_size.max(1);

        let mut mers: Vec<Mer> = rects
            .into_iter()
            .enumerate()
            .map(|(id, rect)| {
                let cols = (rect.width + size - 1) / size;
                let rows = (rect.height + size - 1) / size;
                Mer {
                    id,
                    rect,
                    has_wire: false,
                    subsquares: (cols.max(0) * rows.max(0)) as u32,
                    wired_subsquares: 0,
                }
            })
            .collect();

        if !occupancy.is_empty() {
            let mut wired: FxHashSet<(usize, i32, i32)> = FxHashSet::default();
            for (cell, _) in occupancy.iter() {
                for mer in &mers {
                    if mer.rect.contains_cell(cell) {
                        let col = (cell.x - mer.rect.x) / size;
                        let row = (cell.y - mer.rect.y) / size;
                        wired.insert((mer.id, col, row));
                    }
                }
            }
            for (id, _, _) in wired {
                let mer = &mut mers[id];
                mer.has_wire = true;
                mer.wired_subsquares += 1;
            }
        }

        let adjacency = mers
            .iter()
            .map(|mer| {
                mers.iter()
                    .filter(|other| other.id != mer.id && mer.rect.touches(&other.rect))
                    .map(|other| other.id)
                    .collect()
            })
            .collect();

        trace!(mers = mers.len(), "free space decomposed");
        Self { mers, adjacency }
    }

    /// First MER containing `p`, far edges included.
    pub fn locate(&self, p: GridPoint) -> Option<usize> {
        self.mers
            .iter()
            .find(|mer| mer.rect.contains_inclusive(p))
            .map(|mer| mer.id)
    }

    pub fn contains(&self, p: GridPoint) -> bool {
        self.locate(p).is_some()
    }

    /// Every lattice point covered by the given MERs, far edges included.
    pub fn corridor_mask(&self, corridor: &[usize]) -> FxHashSet<GridPoint> {
        let mut mask = FxHashSet::default();
        for &id in corridor {
            let rect = self.mers[id].rect;
            for x in rect.x..=rect.right() {
                for y in rect.y..=rect.bottom() {
                    mask.insert(GridPoint::new(x, y));
                }
            }
        }
        mask
    }

    /// Coarse A* over the adjacency graph from MER `from` to MER `to`.
    ///
    /// Step cost is the centre-to-centre Manhattan distance, plus a density
    /// charge for MERs crossed by wires, plus any fatigue penalty recorded
    /// for the entered MER.
    pub fn coarse_path(
        &self,
        from: usize,
        to: usize,
        penalties: &FxHashMap<usize, u32>,
        costs: &Costs,
    ) -> Result<Vec<usize>, RouteError> {
        // all costs are kept doubled so centre distances stay integral
        let dist = |a: usize, b: usize| -> u64 {
            let (ax, ay) = self.mers[a].rect.center2();
            let (bx, by) = self.mers[b].rect.center2();
            ((ax - bx).abs() + (ay - by).abs()) as u64
        };
        let enter_cost = |id: usize| -> u64 {
            let mer = &self.mers[id];
            let mut cost = 0.0f32;
            if mer.has_wire {
                cost += costs.coarse_wire_base + mer.density() * costs.coarse_density_weight;
            }
            cost += penalties.get(&id).copied().unwrap_or(0) as f32;
            (cost.max(0.0) * 2.0).round() as u64
        };

        let mut parents: FxHashMap<usize, usize> = FxHashMap::default();
        let mut best: FxHashMap<usize, u64> = FxHashMap::default();
        let mut closed: FxHashSet<usize> = FxHashSet::default();
        let mut heap = BinaryHeap::new();
        best.insert(from, 0);
        heap.push(CoarseEntry {
            f: dist(from, to),
            g: 0,
            id: from,
        });

        while let Some(entry) = heap.pop() {
            if !closed.insert(entry.id) {
                continue;
            }
            if entry.id == to {
                let mut path = vec![to];
                let mut current = to;
                while let Some(&parent) = parents.get(&current) {
                    path.push(parent);
                    current = parent;
                }
                path.reverse();
                return Ok(path);
            }
            for &next in &self.adjacency[entry.id] {
                if closed.contains(&next) {
                    continue;
                }
                let g = entry.g + dist(entry.id, next) + enter_cost(next);
                if best.get(&next).is_some_and(|&old| old <= g) {
                    continue;
                }
                best.insert(next, g);
                parents.insert(next, entry.id);
                heap.push(CoarseEntry {
                    f: g + dist(next, to),
                    g,
                    id: next,
                });
            }
        }
        Err(RouteError::NoCorridor)
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
struct CoarseEntry {
    f: u64,
    g: u64,
    id: usize,
}

impl Ord for CoarseEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .f
            .cmp(&self.f)
            .then_with(|| other.g.cmp(&self.g))
            .then_with(|| other.id.cmp(&self.id))
    }
}

impl PartialOrd for CoarseEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
