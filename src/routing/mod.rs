pub mod astar;
pub mod error;
pub mod free_space;
pub mod geometry;
pub mod maps;
pub mod net;
mod obstacles;
pub mod post;
pub mod relax;
mod types;

pub use error::RouteError;
pub use free_space::{FreeSpace, Mer};
pub use obstacles::obstacle_for_component;
pub use types::*;

use tracing::debug_span;

use crate::config::RouterConfig;
use crate::ir::{PathRequest, Point};
use free_space::board_extent;
use geometry::{direction_vector, point_to_grid};
use maps::build_occupancy;
use net::{NetContext, resolve};
use post::nudge;
use relax::RoutePlan;

const DEFAULT_GRID_SIZE: f32 = 20.0;

/// Routes one wire and returns its pixel polyline.
///
/// Never fails: when no stage of the ladder finds a path the result is the
/// obstacle-blind fallback. Use [`route_with_outcome`] to tell the two apart.
pub fn route(request: &PathRequest, config: &RouterConfig) -> Vec<Point> {
    route_with_outcome(request, config).points
}

/// Routes one wire and reports the grid path, the stage that produced it (or
/// the fallback) and any branch onto an existing net.
pub fn route_with_outcome(request: &PathRequest, config: &RouterConfig) -> RouteOutcome {
    let grid_size = effective_grid_size(request.grid_size, config.grid_size);
    let _span = debug_span!("route", grid_size, strategy = ?config.strategy).entered();

    // zero-area rectangles block nothing
    let obstacles: Vec<GridRect> = request
        .obstacles
        .iter()
        .filter(|o| o.width > 0 && o.height > 0)
        .map(|o| GridRect::new(o.x, o.y, o.width, o.height))
        .collect();
    let wire_cells: Vec<Vec<GridPoint>> = request
        .existing_wires
        .iter()
        .map(|wire| {
            wire.points
                .iter()
                .map(|p| point_to_grid(*p, grid_size))
                .collect()
        })
        .collect();

    let mut endpoints = Endpoints {
        start: point_to_grid(request.start, grid_size),
        start_dir: direction_vector(request.start_direction.as_ref()),
        end: point_to_grid(request.end, grid_size),
        end_dir: direction_vector(request.end_direction.as_ref()),
    };

    let free_space = config.strategy.needs_free_space().then(|| {
        let world = config.board.unwrap_or_else(|| {
            board_extent(&obstacles, &wire_cells, &endpoints.cells(), config.board_margin)
        });
        FreeSpace::build(
            world,
            &obstacles,
            &build_occupancy(&wire_cells),
            config.subsquare_size,
        )
    });

    let mut branch = None;
    if config.strategy.resolves_nets()
        && let Some(space) = free_space.as_ref()
    {
        let ctx = NetContext {
            wires: &request.existing_wires,
            wire_cells: &wire_cells,
            free_space: space,
            start_port_id: request.start_port_id.as_deref(),
            end_port_id: request.end_port_id.as_deref(),
            start_pixel: request.start,
            end_pixel: request.end,
        };
        let resolution = resolve(&ctx, endpoints);
        endpoints = resolution.endpoints;
        branch = resolution.branch;
    }

    let plan = RoutePlan {
        config,
        endpoints,
        obstacles: &obstacles,
        wires: &wire_cells,
        free_space: free_space.as_ref(),
    };
    let (mut grid_points, source) = plan.route();

    if config.strategy.nudges()
        && let RouteSource::Stage(kind) = source
        && let Some(space) = free_space.as_ref()
    {
        let buffer = Stage::of(kind).buffer;
        grid_points = nudge(&grid_points, &obstacles, buffer, space, &wire_cells);
    }

    RouteOutcome {
        points: grid_points.iter().map(|p| p.to_pixel(grid_size)).collect(),
        grid_points,
        source,
        branch,
        grid_size,
    }
}

fn effective_grid_size(requested: Option<f32>, configured: f32) -> f32 {
    [requested.unwrap_or(0.0), configured]
        .into_iter()
        .find(|g| g.is_finite() && *g > 0.0)
        .unwrap_or(DEFAULT_GRID_SIZE)
}
