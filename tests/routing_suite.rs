use std::path::Path;

use proptest::prelude::*;
use schematic_router::config::{BidirectionalKeying, RouterConfig, Strategy as RouteStrategy};
use schematic_router::ir::{Obstacle, PathRequest, Point, RequestDocument, Side};
use schematic_router::routing::geometry::{
    direction_vector, is_manhattan, point_to_grid, to_grid, to_pixel,
};
use schematic_router::routing::post::simplify;
use schematic_router::routing::{
    BranchKind, GridPoint, GridRect, RouteOutcome, StageKind, route, route_with_outcome,
};

fn load_fixture(name: &str) -> PathRequest {
    let path = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name);
    assert!(path.exists(), "fixture missing: {name}");
    let input = std::fs::read_to_string(&path).expect("fixture read failed");
    let doc: RequestDocument = serde_json::from_str(&input).expect("fixture parse failed");
    doc.into_path_request(20.0)
}

fn pixels(raw: &[(f32, f32)]) -> Vec<Point> {
    raw.iter().map(|&(x, y)| Point::new(x, y)).collect()
}

fn segment_cells(points: &[GridPoint]) -> Vec<GridPoint> {
    let mut cells = Vec::new();
    for pair in points.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        for x in a.x.min(b.x)..=a.x.max(b.x) {
            for y in a.y.min(b.y)..=a.y.max(b.y) {
                cells.push(GridPoint::new(x, y));
            }
        }
    }
    cells
}

fn assert_well_formed(outcome: &RouteOutcome, fixture: &str) {
    assert!(!outcome.points.is_empty(), "{fixture}: empty path");
    assert!(is_manhattan(&outcome.grid_points), "{fixture}: not Manhattan");
    for triple in outcome.grid_points.windows(3) {
        let (a, b, c) = (triple[0], triple[1], triple[2]);
        let collinear = (a.x == b.x && b.x == c.x) || (a.y == b.y && b.y == c.y);
        assert!(!collinear, "{fixture}: collinear triple at {b:?}");
    }
    let expected: Vec<Point> = outcome
        .grid_points
        .iter()
        .map(|p| p.to_pixel(outcome.grid_size))
        .collect();
    assert_eq!(outcome.points, expected, "{fixture}: pixel/grid mismatch");
}

/// Every visited cell, apart from the terminals and their stubs, stays out of
/// the obstacles grown by `buffer`.
fn assert_clear(outcome: &RouteOutcome, request: &PathRequest, buffer: i32, exempt: &[GridPoint]) {
    let zones: Vec<GridRect> = request
        .obstacles
        .iter()
        .map(|o| GridRect::new(o.x, o.y, o.width, o.height).inflate(buffer))
        .collect();
    for cell in segment_cells(&outcome.grid_points) {
        if exempt.contains(&cell) {
            continue;
        }
        assert!(
            !zones.iter().any(|z| z.contains_cell(cell)),
            "cell {cell:?} inside a keep-out zone"
        );
    }
}

fn terminal_cells(request: &PathRequest) -> Vec<GridPoint> {
    let start = point_to_grid(request.start, 20.0);
    let end = point_to_grid(request.end, 20.0);
    vec![
        start,
        start.offset(direction_vector(request.start_direction.as_ref())),
        end,
        end.offset(direction_vector(request.end_direction.as_ref())),
    ]
}

#[test]
fn straight_ports_route_as_one_segment() {
    let request = load_fixture("scenario_a_straight.json");
    let outcome = route_with_outcome(&request, &RouterConfig::default());
    assert_well_formed(&outcome, "scenario_a");
    assert_eq!(outcome.points, pixels(&[(0.0, 0.0), (200.0, 0.0)]));
    assert!(!outcome.is_fallback());
    assert_eq!(outcome.branch, None);
}

#[test]
fn centred_obstacle_forces_two_turn_detour() {
    let request = load_fixture("scenario_b_detour.json");
    for keying in [BidirectionalKeying::CellDirection, BidirectionalKeying::Cell] {
        let config = RouterConfig {
            bidirectional_keying: keying,
            ..RouterConfig::default()
        };
        let outcome = route_with_outcome(&request, &config);
        assert_well_formed(&outcome, "scenario_b");
        assert!(
            matches!(outcome.stage(), Some(StageKind::Corridor | StageKind::GlobalStrict)),
            "{keying:?}: unexpected stage {:?}",
            outcome.source
        );
        assert_clear(&outcome, &request, 1, &[]);
        if keying == BidirectionalKeying::CellDirection {
            assert_eq!(outcome.points.len(), 4);
        }
    }
}

#[test]
fn new_wire_branches_onto_existing_net() {
    let request = load_fixture("scenario_c_branch.json");
    let outcome = route_with_outcome(&request, &RouterConfig::default());
    assert_well_formed(&outcome, "scenario_c");
    assert_eq!(outcome.points, pixels(&[(60.0, 0.0), (60.0, 100.0)]));
    let branch = outcome.branch.expect("expected a branch");
    assert_eq!(branch.kind, BranchKind::FromStartNet);
    assert_eq!(branch.point, GridPoint::new(3, 0));
}

#[test]
fn branch_point_steps_off_the_pin() {
    let request = load_fixture("scenario_c_pin_offset.json");
    let outcome = route_with_outcome(&request, &RouterConfig::default());
    assert_well_formed(&outcome, "scenario_c_pin_offset");
    assert_eq!(outcome.points.first(), Some(&Point::new(20.0, 0.0)));
    assert_eq!(outcome.points.last(), Some(&Point::new(0.0, 100.0)));
    assert_ne!(outcome.points.first(), Some(&Point::new(0.0, 0.0)));
}

#[test]
fn nets_are_ignored_without_net_aware_strategy() {
    let request = load_fixture("scenario_c_branch.json");
    let config = RouterConfig {
        strategy: RouteStrategy::Nudged,
        ..RouterConfig::default()
    };
    let outcome = route_with_outcome(&request, &config);
    assert_eq!(outcome.branch, None);
    assert_eq!(outcome.points.first(), Some(&Point::new(200.0, 0.0)));
    assert_eq!(outcome.points.last(), Some(&Point::new(60.0, 100.0)));
}

#[test]
fn pocket_is_reached_only_by_soft_stage() {
    let request = load_fixture("scenario_d_pocket.json");
    let outcome = route_with_outcome(&request, &RouterConfig::default());
    assert_well_formed(&outcome, "scenario_d");
    assert_eq!(outcome.stage(), Some(StageKind::GlobalSoft));
    assert_eq!(outcome.points, pixels(&[(20.0, -160.0), (20.0, 60.0)]));
    // one cell from both walls of the pocket
    assert!(outcome.grid_points.iter().all(|p| p.x == 1));
    assert_clear(&outcome, &request, 0, &[]);
}

#[test]
fn dense_board_keeps_strict_clearance() {
    let request = load_fixture("dense_board.json");
    let exempt = terminal_cells(&request);
    for strategy in [
        RouteStrategy::Direct,
        RouteStrategy::Corridor,
        RouteStrategy::Nudged,
        RouteStrategy::NetAware,
    ] {
        let config = RouterConfig {
            strategy,
            ..RouterConfig::default()
        };
        let outcome = route_with_outcome(&request, &config);
        assert_well_formed(&outcome, "dense_board");
        assert!(
            matches!(outcome.stage(), Some(StageKind::Corridor | StageKind::GlobalStrict)),
            "{strategy:?}: unexpected stage {:?}",
            outcome.source
        );
        assert_eq!(outcome.points.first(), Some(&request.start));
        assert_eq!(outcome.points.last(), Some(&request.end));
        assert_clear(&outcome, &request, 1, &exempt);
    }
}

#[test]
fn component_footprints_are_shaped_and_avoided() {
    let request = load_fixture("component_request.json");
    assert_eq!(
        request.obstacles,
        vec![
            Obstacle::new("R1", 5, 0, 1, 1),
            Obstacle::new("GND1", 14, 11, 2, 3),
        ]
    );
    let outcome = route_with_outcome(&request, &RouterConfig::default());
    assert_well_formed(&outcome, "component_request");
    assert!(!outcome.is_fallback());
    assert!(outcome.points.len() > 2);
    assert_clear(&outcome, &request, 1, &terminal_cells(&request));
}

#[test]
fn enclosed_target_degrades_to_fallback() {
    let mut request = PathRequest::new(Point::new(0.0, 0.0), Point::new(240.0, 0.0));
    request.end_direction = Some(Side::Left.into());
    // closed box around the end terminal
    request.obstacles = vec![
        Obstacle::new("top", 9, -3, 7, 1),
        Obstacle::new("bottom", 9, 3, 7, 1),
        Obstacle::new("left", 9, -2, 1, 5),
        Obstacle::new("right", 15, -2, 1, 5),
    ];
    let config = RouterConfig {
        max_iterations: 4_000,
        max_bidirectional_iterations: 4_000,
        ..RouterConfig::default()
    };
    let outcome = route_with_outcome(&request, &config);
    assert!(outcome.is_fallback());
    assert_eq!(outcome.stage(), None);
    assert!(is_manhattan(&outcome.grid_points));
    assert_eq!(outcome.points.first(), Some(&request.start));
    assert_eq!(outcome.points.last(), Some(&request.end));
    // the plain entry point returns the same polyline
    assert_eq!(route(&request, &config), outcome.points);
}

fn arb_side() -> impl Strategy<Value = Option<Side>> {
    prop_oneof![
        Just(None),
        Just(Some(Side::Top)),
        Just(Some(Side::Bottom)),
        Just(Some(Side::Left)),
        Just(Some(Side::Right)),
    ]
}

fn arb_strategy() -> impl Strategy<Value = RouteStrategy> {
    prop_oneof![
        Just(RouteStrategy::Direct),
        Just(RouteStrategy::Corridor),
        Just(RouteStrategy::Nudged),
        Just(RouteStrategy::NetAware),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn snapping_lands_on_nearest_multiple(v in -10_000.0f32..10_000.0, grid in prop::sample::select(vec![10.0f32, 20.0, 25.0])) {
        let snapped = to_pixel(to_grid(v, grid), grid);
        prop_assert!((snapped - v).abs() <= grid / 2.0 + 1e-2);
        prop_assert_eq!((snapped / grid).round() * grid, snapped);
    }

    #[test]
    fn simplify_is_idempotent(raw in prop::collection::vec((0i32..5, 0i32..5), 0..24)) {
        let points: Vec<GridPoint> = raw.into_iter().map(|(x, y)| GridPoint::new(x, y)).collect();
        let once = simplify(&points);
        prop_assert_eq!(simplify(&once), once);
    }

    #[test]
    fn random_boards_yield_manhattan_paths(
        rects in prop::collection::vec((0i32..30, 0i32..30, 1i32..6, 1i32..6), 0..6),
        start in (0i32..30, 0i32..30),
        end in (0i32..30, 0i32..30),
        start_side in arb_side(),
        end_side in arb_side(),
        strategy in arb_strategy(),
    ) {
        let mut request = PathRequest::new(
            Point::new(start.0 as f32 * 20.0, start.1 as f32 * 20.0),
            Point::new(end.0 as f32 * 20.0, end.1 as f32 * 20.0),
        );
        request.start_direction = start_side.map(Into::into);
        request.end_direction = end_side.map(Into::into);
        request.obstacles = rects
            .iter()
            .enumerate()
            .map(|(i, &(x, y, w, h))| Obstacle::new(format!("O{i}"), x, y, w, h))
            .collect();
        let config = RouterConfig {
            strategy,
            max_iterations: 3_000,
            max_bidirectional_iterations: 3_000,
            ..RouterConfig::default()
        };
        let outcome = route_with_outcome(&request, &config);
        prop_assert!(is_manhattan(&outcome.grid_points));
        for triple in outcome.grid_points.windows(3) {
            let (a, b, c) = (triple[0], triple[1], triple[2]);
            let collinear = (a.x == b.x && b.x == c.x) || (a.y == b.y && b.y == c.y);
            prop_assert!(!collinear, "collinear triple at {:?}", b);
        }
        prop_assert_eq!(outcome.grid_points.first(), Some(&GridPoint::new(start.0, start.1)));
        prop_assert_eq!(outcome.grid_points.last(), Some(&GridPoint::new(end.0, end.1)));
    }
}
