use rustc_hash::FxHashMap;

use super::types::{GridPoint, GridRect, Orientation};

/// Occupancy bit for a cell crossed by a horizontal wire segment.
pub const WIRE_HORIZONTAL: u8 = 1;
/// Occupancy bit for a cell crossed by a vertical wire segment.
pub const WIRE_VERTICAL: u8 = 2;

/// Sentinel for a hard-blocked cell.
pub const BLOCKED: u32 = u32::MAX;

/// Sparse per-cell extra cost. Absent cells cost nothing extra.
#[derive(Debug, Clone, Default)]
pub struct CostMap {
    cells: FxHashMap<GridPoint, u32>,
}

impl CostMap {
    pub fn block(&mut self, p: GridPoint) {
        self.cells.insert(p, BLOCKED);
    }

    pub fn unblock(&mut self, p: GridPoint) {
        self.cells.remove(&p);
    }

    pub fn is_blocked(&self, p: GridPoint) -> bool {
        self.cells.get(&p) == Some(&BLOCKED)
    }

    /// Extra cost of entering `p`, or `None` if it is blocked.
    pub fn cost(&self, p: GridPoint) -> Option<u32> {
        match self.cells.get(&p) {
            Some(&BLOCKED) => None,
            Some(&extra) => Some(extra),
            None => Some(0),
        }
    }

    pub fn blocked_count(&self) -> usize {
        self.cells.values().filter(|&&c| c == BLOCKED).count()
    }
}

/// Sparse per-cell orientation bitmask of existing wires.
#[derive(Debug, Clone, Default)]
pub struct OccupancyMap {
    cells: FxHashMap<GridPoint, u8>,
}

impl OccupancyMap {
    pub fn get(&self, p: GridPoint) -> u8 {
        self.cells.get(&p).copied().unwrap_or(0)
    }

    pub fn mark(&mut self, p: GridPoint, bit: u8) {
        *self.cells.entry(p).or_insert(0) |= bit;
    }

    /// ORs the segment's orientation bit into every cell it traverses,
    /// endpoints included. Diagonal segments are skipped.
    pub fn mark_segment(&mut self, a: GridPoint, b: GridPoint) {
        match Orientation::of(a, b) {
            Some(Orientation::Horizontal) => {
                for x in a.x.min(b.x)..=a.x.max(b.x) {
                    self.mark(GridPoint::new(x, a.y), WIRE_HORIZONTAL);
                }
            }
            Some(Orientation::Vertical) => {
                for y in a.y.min(b.y)..=a.y.max(b.y) {
                    self.mark(GridPoint::new(a.x, y), WIRE_VERTICAL);
                }
            }
            None => {}
        }
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (GridPoint, u8)> + '_ {
        self.cells.iter().map(|(p, bits)| (*p, *bits))
    }
}

#[derive(Debug, Clone, Default)]
pub struct RoutingMaps {
    pub cost: CostMap,
    pub occupancy: OccupancyMap,
}

impl RoutingMaps {
    pub fn unblock_all(&mut self, points: &[GridPoint]) {
        for p in points {
            self.cost.unblock(*p);
        }
    }
}

/// Builds the cost and occupancy maps for one stage.
///
/// Every cell in `[x - buffer, x + width + buffer) × [y - buffer, y + height + buffer)`
/// of each obstacle is hard-blocked. A buffer of 1 keeps wires off component
/// outlines; 0 lets them run along the edge.
pub fn build_maps(obstacles: &[GridRect], wires: &[Vec<GridPoint>], buffer: i32) -> RoutingMaps {
    let mut maps = RoutingMaps::default();
    for obstacle in obstacles {
        let zone = obstacle.inflate(buffer);
        for x in zone.x..zone.right() {
            for y in zone.y..zone.bottom() {
                maps.cost.block(GridPoint::new(x, y));
            }
        }
    }
    maps.occupancy = build_occupancy(wires);
    maps
}

pub fn build_occupancy(wires: &[Vec<GridPoint>]) -> OccupancyMap {
    let mut occupancy = OccupancyMap::default();
    for wire in wires {
        for pair in wire.windows(2) {
            occupancy.mark_segment(pair[0], pair[1]);
        }
    }
    occupancy
}
