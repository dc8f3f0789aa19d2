use std::collections::VecDeque;

use tracing::debug;

use crate::ir::{Point, Wire};

use super::error::RouteError;
use super::free_space::FreeSpace;
use super::geometry::{closest_point_on_segment, dominant_step};
use super::types::{Branch, BranchKind, Endpoints, GridPoint, Orientation};

/// One straight piece of an existing wire, in grid units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NetSegment {
    pub a: GridPoint,
    pub b: GridPoint,
    /// `a` is the first point of its wire.
    pub a_is_pin: bool,
    /// `b` is the last point of its wire.
    pub b_is_pin: bool,
}

impl NetSegment {
    pub fn orientation(&self) -> Orientation {
        Orientation::of(self.a, self.b).unwrap_or(Orientation::Horizontal)
    }
}

/// Wires electrically joined to a port, as indices into the wire list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Net {
    pub wires: Vec<usize>,
}

impl Net {
    pub fn is_empty(&self) -> bool {
        self.wires.is_empty()
    }

    pub fn shares_wire(&self, other: &Net) -> bool {
        self.wires.iter().any(|w| other.wires.contains(w))
    }

    pub fn segments(&self, wire_cells: &[Vec<GridPoint>]) -> Vec<NetSegment> {
        let mut segments = Vec::new();
        for &idx in &self.wires {
            // points snapping onto the same cell would leave a zero-length
            // segment between a pin and the rest of the wire
            let mut cells = wire_cells[idx].clone();
            cells.dedup();
            let last = cells.len().saturating_sub(2);
            for (i, pair) in cells.windows(2).enumerate() {
                segments.push(NetSegment {
                    a: pair[0],
                    b: pair[1],
                    a_is_pin: i == 0,
                    b_is_pin: i == last,
                });
            }
        }
        segments
    }
}

fn ends(wire: &Wire) -> impl Iterator<Item = &Point> {
    wire.first().into_iter().chain(wire.last())
}

fn wires_joined(a: &Wire, b: &Wire) -> bool {
    let shares_port = [&a.source_port_id, &a.dest_port_id]
        .into_iter()
        .flatten()
        .any(|port| b.touches_port(port));
    shares_port || ends(a).any(|pa| ends(b).any(|pb| pa.coincides(pb)))
}

/// Breadth-first closure of the wires attached to a port, either by port id
/// or by an endpoint coinciding with `point`.
pub fn discover_net(wires: &[Wire], port_id: Option<&str>, point: Point) -> Net {
    let mut visited = vec![false; wires.len()];
    let mut queue = VecDeque::new();
    for (idx, wire) in wires.iter().enumerate() {
        if wire.points.is_empty() {
            continue;
        }
        let by_port = port_id.is_some_and(|id| wire.touches_port(id));
        let by_location = ends(wire).any(|p| p.coincides(&point));
        if by_port || by_location {
            visited[idx] = true;
            queue.push_back(idx);
        }
    }

    let mut net = Net::default();
    while let Some(idx) = queue.pop_front() {
        net.wires.push(idx);
        for (other, wire) in wires.iter().enumerate() {
            if !visited[other] && !wire.points.is_empty() && wires_joined(&wires[idx], wire) {
                visited[other] = true;
                queue.push_back(other);
            }
        }
    }
    net.wires.sort_unstable();
    net
}

/// Nearest routable point of a net to some target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Projection {
    pub point: GridPoint,
    pub distance: i32,
    pub orientation: Orientation,
    /// The point is an end of its segment rather than an interior point.
    pub at_endpoint: bool,
}

/// Projects `target` onto every segment and keeps the closest valid result.
/// Interior projections must lie in free space; segment ends are always
/// accepted.
pub fn closest_valid_point(
    target: GridPoint,
    segments: &[NetSegment],
    free_space: &FreeSpace,
) -> Result<Projection, RouteError> {
    let mut best: Option<Projection> = None;
    for seg in segments {
        let point = closest_point_on_segment(target, seg.a, seg.b);
        let at_endpoint = point == seg.a || point == seg.b;
        if !at_endpoint && !free_space.contains(point) {
            continue;
        }
        let distance = target.manhattan(point);
        if best.is_none_or(|b| distance < b.distance) {
            best = Some(Projection {
                point,
                distance,
                orientation: seg.orientation(),
                at_endpoint,
            });
        }
    }
    best.ok_or(RouteError::InvalidProjection)
}

/// Moves a point sitting on a wire pin one cell into the wire, unless that
/// would land on the wire's other pin.
pub fn apply_pin_offset(point: GridPoint, segments: &[NetSegment]) -> GridPoint {
    for seg in segments {
        let (pin, toward, toward_is_pin) = if seg.a_is_pin && point == seg.a {
            (seg.a, seg.b, seg.b_is_pin)
        } else if seg.b_is_pin && point == seg.b {
            (seg.b, seg.a, seg.a_is_pin)
        } else {
            continue;
        };
        let step = GridPoint::new((toward.x - pin.x).signum(), (toward.y - pin.y).signum());
        let shifted = pin.offset(step);
        if step.is_zero() {
            continue;
        }
        if toward_is_pin && shifted == toward {
            return point;
        }
        return shifted;
    }
    point
}

/// Approach step at a branch point, facing the other end of the new wire.
fn branch_direction(projection: &Projection, point: GridPoint, other: GridPoint) -> GridPoint {
    if projection.at_endpoint {
        return dominant_step(point, other);
    }
    match projection.orientation {
        Orientation::Horizontal => GridPoint::new(0, if other.y < point.y { -1 } else { 1 }),
        Orientation::Vertical => GridPoint::new(if other.x < point.x { -1 } else { 1 }, 0),
    }
}

/// Result of net-aware endpoint rewriting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    pub endpoints: Endpoints,
    pub branch: Option<Branch>,
}

/// Inputs for [`resolve`].
pub struct NetContext<'a> {
    pub wires: &'a [Wire],
    pub wire_cells: &'a [Vec<GridPoint>],
    pub free_space: &'a FreeSpace,
    pub start_port_id: Option<&'a str>,
    pub end_port_id: Option<&'a str>,
    pub start_pixel: Point,
    pub end_pixel: Point,
}

/// Rewrites the endpoints so the new wire branches off an existing net when
/// that is more than one cell shorter than connecting port to port.
pub fn resolve(ctx: &NetContext<'_>, endpoints: Endpoints) -> Resolution {
    let unchanged = Resolution {
        endpoints,
        branch: None,
    };
    let net_a = discover_net(ctx.wires, ctx.start_port_id, ctx.start_pixel);
    let net_b = discover_net(ctx.wires, ctx.end_port_id, ctx.end_pixel);
    if net_a.shares_wire(&net_b) {
        debug!(wires = net_a.wires.len(), "endpoints already share a net");
        return unchanged;
    }

    let mut best = unchanged;
    let mut best_distance = endpoints.start.manhattan(endpoints.end);

    if !net_b.is_empty() {
        let segments = net_b.segments(ctx.wire_cells);
        match closest_valid_point(endpoints.start, &segments, ctx.free_space) {
            Ok(projection) if projection.distance < best_distance - 1 => {
                let point = apply_pin_offset(projection.point, &segments);
                let direction = branch_direction(&projection, point, endpoints.start);
                best_distance = projection.distance;
                best = Resolution {
                    endpoints: Endpoints {
                        end: point,
                        end_dir: direction,
                        ..endpoints
                    },
                    branch: Some(Branch {
                        kind: BranchKind::OntoEndNet,
                        point,
                        direction,
                    }),
                };
            }
            Ok(_) => {}
            Err(err) => debug!(%err, "end net candidate rejected"),
        }
    }

    if !net_a.is_empty() {
        let segments = net_a.segments(ctx.wire_cells);
        match closest_valid_point(endpoints.end, &segments, ctx.free_space) {
            Ok(projection) if projection.distance < best_distance - 1 => {
                let point = apply_pin_offset(projection.point, &segments);
                let direction = branch_direction(&projection, point, endpoints.end);
                best = Resolution {
                    endpoints: Endpoints {
                        start: point,
                        start_dir: direction,
                        ..endpoints
                    },
                    branch: Some(Branch {
                        kind: BranchKind::FromStartNet,
                        point,
                        direction,
                    }),
                };
            }
            Ok(_) => {}
            Err(err) => debug!(%err, "start net candidate rejected"),
        }
    }

    if let Some(branch) = best.branch {
        debug!(kind = ?branch.kind, point = ?branch.point, "branching onto existing net");
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::geometry::point_to_grid;
    use crate::routing::maps::OccupancyMap;
    use crate::routing::types::GridRect;

    fn wire(id: &str, points: &[(f32, f32)], source: Option<&str>, dest: Option<&str>) -> Wire {
        Wire {
            id: id.to_string(),
            points: points.iter().map(|&(x, y)| Point::new(x, y)).collect(),
            source_port_id: source.map(str::to_string),
            dest_port_id: dest.map(str::to_string),
        }
    }

    fn cells(wires: &[Wire]) -> Vec<Vec<GridPoint>> {
        wires
            .iter()
            .map(|w| w.points.iter().map(|p| point_to_grid(*p, 20.0)).collect())
            .collect()
    }

    fn open_space() -> FreeSpace {
        FreeSpace::build(
            GridRect::new(-20, -20, 60, 60),
            &[],
            &OccupancyMap::default(),
            2,
        )
    }

    #[test]
    fn discovery_follows_ports_and_coincident_ends() {
        let wires = vec![
            wire("w0", &[(0.0, 0.0), (100.0, 0.0)], Some("A"), Some("B")),
            wire("w1", &[(100.0, 0.0), (100.0, 80.0)], None, None),
            wire("w2", &[(300.0, 0.0), (400.0, 0.0)], Some("B"), Some("C")),
            wire("w3", &[(0.0, 400.0), (80.0, 400.0)], Some("X"), Some("Y")),
        ];
        let net = discover_net(&wires, Some("A"), Point::new(-50.0, -50.0));
        assert_eq!(net.wires, vec![0, 1, 2]);
        let by_location = discover_net(&wires, None, Point::new(80.4, 400.3));
        assert_eq!(by_location.wires, vec![3]);
        assert!(discover_net(&wires, Some("Z"), Point::new(1.0e4, 0.0)).is_empty());
    }

    #[test]
    fn pin_offset_moves_into_the_wire() {
        let wires = vec![wire("w", &[(0.0, 0.0), (200.0, 0.0)], None, None)];
        let net = Net { wires: vec![0] };
        let segments = net.segments(&cells(&wires));
        assert_eq!(
            apply_pin_offset(GridPoint::new(0, 0), &segments),
            GridPoint::new(1, 0)
        );
        assert_eq!(
            apply_pin_offset(GridPoint::new(10, 0), &segments),
            GridPoint::new(9, 0)
        );
        assert_eq!(
            apply_pin_offset(GridPoint::new(4, 0), &segments),
            GridPoint::new(4, 0)
        );
    }

    #[test]
    fn pin_offset_abandoned_on_unit_wire() {
        let wires = vec![wire("w", &[(0.0, 0.0), (20.0, 0.0)], None, None)];
        let segments = Net { wires: vec![0] }.segments(&cells(&wires));
        assert_eq!(
            apply_pin_offset(GridPoint::new(0, 0), &segments),
            GridPoint::new(0, 0)
        );
    }

    #[test]
    fn pin_offset_skips_points_snapped_onto_the_pin() {
        // the first two points land on the same cell
        let wires = vec![wire("w", &[(0.0, 0.0), (4.0, 3.0), (200.0, 0.0)], None, None)];
        let segments = Net { wires: vec![0] }.segments(&cells(&wires));
        assert_eq!(segments.len(), 1);
        assert!(segments[0].a_is_pin && segments[0].b_is_pin);
        assert_eq!(
            apply_pin_offset(GridPoint::new(0, 0), &segments),
            GridPoint::new(1, 0)
        );
    }

    #[test]
    fn corner_points_are_not_pins() {
        let wires = vec![wire("w", &[(0.0, 0.0), (100.0, 0.0), (100.0, 100.0)], None, None)];
        let segments = Net { wires: vec![0] }.segments(&cells(&wires));
        assert_eq!(
            apply_pin_offset(GridPoint::new(5, 0), &segments),
            GridPoint::new(5, 0)
        );
    }

    #[test]
    fn projection_rejects_points_outside_free_space() {
        let space = FreeSpace::build(
            GridRect::new(-20, -20, 60, 60),
            &[GridRect::new(2, -2, 4, 4)],
            &OccupancyMap::default(),
            2,
        );
        let run = NetSegment {
            a: GridPoint::new(0, 0),
            b: GridPoint::new(10, 0),
            a_is_pin: true,
            b_is_pin: false,
        };
        let riser = NetSegment {
            a: GridPoint::new(10, 0),
            b: GridPoint::new(10, 8),
            a_is_pin: false,
            b_is_pin: true,
        };
        // (4, 0) sits in the obstacle's keep-out
        assert_eq!(
            closest_valid_point(GridPoint::new(4, 6), &[run], &space),
            Err(RouteError::InvalidProjection)
        );
        let projection = closest_valid_point(GridPoint::new(4, 6), &[run, riser], &space).unwrap();
        assert_eq!(projection.point, GridPoint::new(10, 6));
        assert_eq!(projection.orientation, Orientation::Vertical);
        assert!(!projection.at_endpoint);
        // segment ends are accepted even inside the keep-out
        let inside = NetSegment {
            a: GridPoint::new(3, 0),
            b: GridPoint::new(3, 12),
            a_is_pin: true,
            b_is_pin: true,
        };
        let pinned = closest_valid_point(GridPoint::new(3, -1), &[inside], &space).unwrap();
        assert_eq!(pinned.point, GridPoint::new(3, 0));
        assert!(pinned.at_endpoint);
    }

    #[test]
    fn branches_onto_start_net_when_closer() {
        let wires = vec![wire("w", &[(0.0, 0.0), (200.0, 0.0)], Some("S1"), Some("D"))];
        let wire_cells = cells(&wires);
        let space = open_space();
        let ctx = NetContext {
            wires: &wires,
            wire_cells: &wire_cells,
            free_space: &space,
            start_port_id: Some("D"),
            end_port_id: Some("E"),
            start_pixel: Point::new(200.0, 0.0),
            end_pixel: Point::new(60.0, 100.0),
        };
        let endpoints = Endpoints {
            start: GridPoint::new(10, 0),
            start_dir: GridPoint::ZERO,
            end: GridPoint::new(3, 5),
            end_dir: GridPoint::new(0, -1),
        };
        let resolution = resolve(&ctx, endpoints);
        let branch = resolution.branch.unwrap();
        assert_eq!(branch.kind, BranchKind::FromStartNet);
        assert_eq!(resolution.endpoints.start, GridPoint::new(3, 0));
        assert_eq!(resolution.endpoints.start_dir, GridPoint::new(0, 1));
        assert_eq!(resolution.endpoints.end, endpoints.end);
    }

    #[test]
    fn pin_coincident_branch_is_offset_and_faces_target() {
        let wires = vec![wire("w", &[(0.0, 0.0), (200.0, 0.0)], Some("S1"), Some("D"))];
        let wire_cells = cells(&wires);
        let space = open_space();
        let ctx = NetContext {
            wires: &wires,
            wire_cells: &wire_cells,
            free_space: &space,
            start_port_id: Some("D"),
            end_port_id: Some("E"),
            start_pixel: Point::new(200.0, 0.0),
            end_pixel: Point::new(-20.0, 100.0),
        };
        let endpoints = Endpoints {
            start: GridPoint::new(10, 0),
            start_dir: GridPoint::ZERO,
            end: GridPoint::new(-1, 5),
            end_dir: GridPoint::ZERO,
        };
        let resolution = resolve(&ctx, endpoints);
        assert_eq!(resolution.endpoints.start, GridPoint::new(1, 0));
        assert_eq!(resolution.endpoints.start_dir, GridPoint::new(0, 1));
    }

    #[test]
    fn same_net_is_left_alone() {
        let wires = vec![wire("w", &[(0.0, 0.0), (200.0, 0.0)], Some("A"), Some("B"))];
        let wire_cells = cells(&wires);
        let space = open_space();
        let ctx = NetContext {
            wires: &wires,
            wire_cells: &wire_cells,
            free_space: &space,
            start_port_id: Some("A"),
            end_port_id: Some("B"),
            start_pixel: Point::new(0.0, 0.0),
            end_pixel: Point::new(200.0, 0.0),
        };
        let endpoints = Endpoints {
            start: GridPoint::new(0, 0),
            end: GridPoint::new(10, 0),
            ..Endpoints::default()
        };
        assert_eq!(resolve(&ctx, endpoints).branch, None);
    }

    #[test]
    fn micro_branches_are_suppressed() {
        let wires = vec![wire("w", &[(0.0, 0.0), (200.0, 0.0)], Some("S1"), Some("D"))];
        let wire_cells = cells(&wires);
        let space = open_space();
        let ctx = NetContext {
            wires: &wires,
            wire_cells: &wire_cells,
            free_space: &space,
            start_port_id: Some("D"),
            end_port_id: None,
            start_pixel: Point::new(200.0, 0.0),
            end_pixel: Point::new(200.0, 40.0),
        };
        let endpoints = Endpoints {
            start: GridPoint::new(10, 0),
            end: GridPoint::new(10, 2),
            ..Endpoints::default()
        };
        // the closest point of the net is the start pin itself
        assert_eq!(resolve(&ctx, endpoints).branch, None);
    }
}
