use crate::ir::{Approach, Point, Side};

use super::types::GridPoint;

/// Grid index nearest to a pixel coordinate.
pub fn to_grid(value: f32, grid_size: f32) -> i32 {
    (value / grid_size).round() as i32
}

pub fn to_pixel(value: i32, grid_size: f32) -> f32 {
    value as f32 * grid_size
}

pub fn point_to_grid(point: Point, grid_size: f32) -> GridPoint {
    GridPoint::new(to_grid(point.x, grid_size), to_grid(point.y, grid_size))
}

pub fn side_vector(side: Side) -> GridPoint {
    match side {
        Side::Top => GridPoint::new(0, -1),
        Side::Bottom => GridPoint::new(0, 1),
        Side::Left => GridPoint::new(-1, 0),
        Side::Right => GridPoint::new(1, 0),
    }
}

/// Unit step for an approach direction. Vectors collapse onto their dominant
/// axis; a missing direction yields the zero vector.
pub fn direction_vector(approach: Option<&Approach>) -> GridPoint {
    match approach {
        None => GridPoint::ZERO,
        Some(Approach::Side(side)) => side_vector(*side),
        Some(Approach::Vector(v)) => {
            if !v.x.is_finite() || !v.y.is_finite() {
                return GridPoint::ZERO;
            }
            if v.x.abs() >= v.y.abs() {
                if v.x == 0.0 {
                    GridPoint::ZERO
                } else {
                    GridPoint::new(v.x.signum() as i32, 0)
                }
            } else {
                GridPoint::new(0, v.y.signum() as i32)
            }
        }
    }
}

/// Unit step from `from` toward `to` along the dominant axis of their
/// displacement. Ties go to the vertical axis.
pub fn dominant_step(from: GridPoint, to: GridPoint) -> GridPoint {
    let dx = to.x - from.x;
    let dy = to.y - from.y;
    if dx.abs() > dy.abs() {
        GridPoint::new(dx.signum(), 0)
    } else {
        GridPoint::new(0, if dy < 0 { -1 } else { 1 })
    }
}

/// Projects `p` onto the axis-aligned segment `a`-`b`, clamped to its extent.
/// Diagonal segments are not projected and yield `a`.
pub fn closest_point_on_segment(p: GridPoint, a: GridPoint, b: GridPoint) -> GridPoint {
    if a.y == b.y {
        let x = p.x.clamp(a.x.min(b.x), a.x.max(b.x));
        GridPoint::new(x, a.y)
    } else if a.x == b.x {
        let y = p.y.clamp(a.y.min(b.y), a.y.max(b.y));
        GridPoint::new(a.x, y)
    } else {
        a
    }
}

/// True if every consecutive pair shares exactly one coordinate.
pub fn is_manhattan(points: &[GridPoint]) -> bool {
    points
        .windows(2)
        .all(|pair| (pair[0].x == pair[1].x) != (pair[0].y == pair[1].y))
}
