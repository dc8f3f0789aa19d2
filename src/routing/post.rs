use super::free_space::FreeSpace;
use super::types::{GridPoint, GridRect, Orientation};

fn collinear(a: GridPoint, b: GridPoint, c: GridPoint) -> bool {
    (a.x == b.x && b.x == c.x) || (a.y == b.y && b.y == c.y)
}

/// Drops repeated points and every interior point collinear with its
/// neighbours. Idempotent.
pub fn simplify(points: &[GridPoint]) -> Vec<GridPoint> {
    let mut kept: Vec<GridPoint> = Vec::with_capacity(points.len());
    for &p in points {
        if kept.last() == Some(&p) {
            continue;
        }
        if let [.., a, b] = kept[..]
            && collinear(a, b, p)
        {
            let last = kept.len() - 1;
            kept[last] = p;
            // a reversal along the same axis can land back on `a`
            if kept[last] == a {
                kept.pop();
            }
            continue;
        }
        kept.push(p);
    }
    kept
}

/// Outward step for a segment running exactly one cell outside an obstacle
/// boundary, or `None` if it hugs nothing or hugs obstacles on both sides.
fn hugging(p1: GridPoint, p2: GridPoint, obstacles: &[GridRect]) -> Option<GridPoint> {
    let orientation = Orientation::of(p1, p2)?;
    let (min_x, max_x) = (p1.x.min(p2.x), p1.x.max(p2.x));
    let (min_y, max_y) = (p1.y.min(p2.y), p1.y.max(p2.y));
    let mut pushes = obstacles.iter().filter_map(|obs| match orientation {
        Orientation::Horizontal => {
            if max_x < obs.x || min_x > obs.right() {
                None
            } else if p1.y == obs.y - 1 {
                Some(GridPoint::new(0, -1))
            } else if p1.y == obs.bottom() {
                Some(GridPoint::new(0, 1))
            } else {
                None
            }
        }
        Orientation::Vertical => {
            if max_y < obs.y || min_y > obs.bottom() {
                None
            } else if p1.x == obs.x - 1 {
                Some(GridPoint::new(-1, 0))
            } else if p1.x == obs.right() {
                Some(GridPoint::new(1, 0))
            } else {
                None
            }
        }
    });
    let first = pushes.next()?;
    // a one-cell channel has nowhere to go
    if pushes.any(|push| push != first) {
        return None;
    }
    Some(first)
}

/// A shifted segment is acceptable when both ends lie in free space, none of
/// its cells falls inside an obstacle grown by `buffer`, and its bounding box
/// touches no existing wire segment.
fn shift_is_valid(
    n1: GridPoint,
    n2: GridPoint,
    zones: &[GridRect],
    free_space: &FreeSpace,
    wires: &[Vec<GridPoint>],
) -> bool {
    if !free_space.contains(n1) || !free_space.contains(n2) {
        return false;
    }
    let (min_x, max_x) = (n1.x.min(n2.x), n1.x.max(n2.x));
    let (min_y, max_y) = (n1.y.min(n2.y), n1.y.max(n2.y));
    let blocked = (min_x..=max_x)
        .flat_map(|x| (min_y..=max_y).map(move |y| GridPoint::new(x, y)))
        .any(|cell| zones.iter().any(|zone| zone.contains_cell(cell)));
    if blocked {
        return false;
    }
    !wires.iter().flat_map(|w| w.windows(2)).any(|seg| {
        let (a, b) = (seg[0], seg[1]);
        max_x >= a.x.min(b.x)
            && min_x <= a.x.max(b.x)
            && max_y >= a.y.min(b.y)
            && min_y <= a.y.max(b.y)
    })
}

/// Pushes interior segments that hug an obstacle one cell outward.
///
/// Single left-to-right pass. The first and last segments stay put since
/// they attach to the terminals. Neighbouring segments are perpendicular, so
/// moving both ends of one segment only stretches or shrinks them. `buffer`
/// is the clearance of the stage that produced `path`.
pub fn nudge(
    path: &[GridPoint],
    obstacles: &[GridRect],
    buffer: i32,
    free_space: &FreeSpace,
    wires: &[Vec<GridPoint>],
) -> Vec<GridPoint> {
    let zones: Vec<GridRect> = obstacles.iter().map(|o| o.inflate(buffer)).collect();
    let mut points = path.to_vec();
    let mut modified = false;

    for i in 1..points.len().saturating_sub(2) {
        let (p1, p2) = (points[i], points[i + 1]);
        let Some(push) = hugging(p1, p2, obstacles) else {
            continue;
        };
        let n1 = p1.offset(push);
        let n2 = p2.offset(push);
        if shift_is_valid(n1, n2, &zones, free_space, wires) {
            points[i] = n1;
            points[i + 1] = n2;
            modified = true;
        }
    }

    if modified { simplify(&points) } else { points }
}
