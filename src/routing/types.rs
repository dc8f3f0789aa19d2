use serde::{Deserialize, Serialize};

use crate::ir::Point;

/// A lattice point in grid units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct GridPoint {
    pub x: i32,
    pub y: i32,
}

impl GridPoint {
    pub const ZERO: GridPoint = GridPoint { x: 0, y: 0 };

    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn offset(self, step: GridPoint) -> Self {
        Self::new(self.x + step.x, self.y + step.y)
    }

    pub fn manhattan(self, other: GridPoint) -> i32 {
        (self.x - other.x).abs() + (self.y - other.y).abs()
    }

    pub fn is_zero(self) -> bool {
        self.x == 0 && self.y == 0
    }

    pub fn to_pixel(self, grid_size: f32) -> Point {
        Point::new(
            super::geometry::to_pixel(self.x, grid_size),
            super::geometry::to_pixel(self.y, grid_size),
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    Horizontal,
    Vertical,
}

impl Orientation {
    /// Orientation of an axis-aligned segment. Degenerate segments count as
    /// horizontal; diagonal segments have none.
    pub fn of(a: GridPoint, b: GridPoint) -> Option<Self> {
        if a.y == b.y {
            Some(Orientation::Horizontal)
        } else if a.x == b.x {
            Some(Orientation::Vertical)
        } else {
            None
        }
    }
}

/// Axis-aligned rectangle in grid units, `[x, x + width) × [y, y + height)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridRect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl GridRect {
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> i32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> i32 {
        self.y + self.height
    }

    pub fn area(&self) -> i64 {
        self.width as i64 * self.height as i64
    }

    pub fn inflate(&self, amount: i32) -> Self {
        Self::new(
            self.x - amount,
            self.y - amount,
            self.width + 2 * amount,
            self.height + 2 * amount,
        )
    }

    /// Interior overlap; rectangles that merely share an edge do not intersect.
    pub fn intersects(&self, other: &GridRect) -> bool {
        !(other.x >= self.right()
            || other.right() <= self.x
            || other.y >= self.bottom()
            || other.bottom() <= self.y)
    }

    /// Lattice containment including the far edges.
    pub fn contains_inclusive(&self, p: GridPoint) -> bool {
        p.x >= self.x && p.x <= self.right() && p.y >= self.y && p.y <= self.bottom()
    }

    /// Cell containment, far edges excluded.
    pub fn contains_cell(&self, p: GridPoint) -> bool {
        p.x >= self.x && p.x < self.right() && p.y >= self.y && p.y < self.bottom()
    }

    /// True when the boundaries touch along a stretch of nonzero length.
    pub fn touches(&self, other: &GridRect) -> bool {
        let x_overlap = self.right().min(other.right()) - self.x.max(other.x);
        let y_overlap = self.bottom().min(other.bottom()) - self.y.max(other.y);
        let side_by_side = self.right() == other.x || other.right() == self.x;
        let stacked = self.bottom() == other.y || other.bottom() == self.y;
        (side_by_side && y_overlap > 0) || (stacked && x_overlap > 0)
    }

    /// Doubled centre, so centre distances stay integral.
    pub fn center2(&self) -> (i64, i64) {
        (
            2 * self.x as i64 + self.width as i64,
            2 * self.y as i64 + self.height as i64,
        )
    }
}

/// Grid terminals of one routing attempt and their forced approach steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Endpoints {
    pub start: GridPoint,
    pub start_dir: GridPoint,
    pub end: GridPoint,
    pub end_dir: GridPoint,
}

impl Endpoints {
    /// Cell one step beyond the start along its approach.
    pub fn start_stub(&self) -> GridPoint {
        self.start.offset(self.start_dir)
    }

    pub fn end_stub(&self) -> GridPoint {
        self.end.offset(self.end_dir)
    }

    /// Terminals and stubs; these are unblocked before every search.
    pub fn cells(&self) -> [GridPoint; 4] {
        [self.start, self.start_stub(), self.end, self.end_stub()]
    }
}

/// Position of a relaxation stage in the ladder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StageKind {
    /// Strict search masked to a coarse corridor through free space.
    Corridor,
    /// Strict search over the whole board.
    GlobalStrict,
    /// Buffer removed; wires may hug component edges.
    GlobalSoft,
    /// Buffer removed and collinear overlap allowed at heavy cost.
    GlobalOverlap,
}

/// One attempt configuration of the relaxation ladder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stage {
    pub kind: StageKind,
    pub buffer: i32,
    pub allow_collinear: bool,
    pub corridor: bool,
}

impl Stage {
    pub fn of(kind: StageKind) -> Stage {
        match kind {
            StageKind::Corridor => Stage::CORRIDOR,
            StageKind::GlobalStrict => Stage::GLOBAL_STRICT,
            StageKind::GlobalSoft => Stage::GLOBAL_SOFT,
            StageKind::GlobalOverlap => Stage::GLOBAL_OVERLAP,
        }
    }

    pub const CORRIDOR: Stage = Stage {
        kind: StageKind::Corridor,
        buffer: 1,
        allow_collinear: false,
        corridor: true,
    };
    pub const GLOBAL_STRICT: Stage = Stage {
        kind: StageKind::GlobalStrict,
        buffer: 1,
        allow_collinear: false,
        corridor: false,
    };
    pub const GLOBAL_SOFT: Stage = Stage {
        kind: StageKind::GlobalSoft,
        buffer: 0,
        allow_collinear: false,
        corridor: false,
    };
    pub const GLOBAL_OVERLAP: Stage = Stage {
        kind: StageKind::GlobalOverlap,
        buffer: 0,
        allow_collinear: true,
        corridor: false,
    };
}

/// Where the returned path came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "type", content = "stage")]
pub enum RouteSource {
    Stage(StageKind),
    /// Obstacle-blind geometric fallback. Treat as a warning.
    Fallback,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BranchKind {
    /// New wire ends on a point of the net attached to the end port.
    OntoEndNet,
    /// New wire starts from a point of the net attached to the start port.
    FromStartNet,
}

/// A rewrite performed by the net topology resolver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Branch {
    pub kind: BranchKind,
    pub point: GridPoint,
    pub direction: GridPoint,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RouteOutcome {
    pub points: Vec<Point>,
    pub grid_points: Vec<GridPoint>,
    pub source: RouteSource,
    pub branch: Option<Branch>,
    pub grid_size: f32,
}

impl RouteOutcome {
    pub fn is_fallback(&self) -> bool {
        self.source == RouteSource::Fallback
    }

    pub fn stage(&self) -> Option<StageKind> {
        match self.source {
            RouteSource::Stage(kind) => Some(kind),
            RouteSource::Fallback => None,
        }
    }
}
