use rustc_hash::{FxHashMap, FxHashSet};
use tracing::{debug, warn};

use crate::config::RouterConfig;

use super::astar::{SearchOptions, find_path, find_path_bidirectional};
use super::error::RouteError;
use super::free_space::FreeSpace;
use super::maps::{RoutingMaps, build_maps};
use super::post::simplify;
use super::types::{Endpoints, GridPoint, GridRect, RouteSource, Stage};

/// Ordered relaxation ladder for a configuration.
pub fn stage_ladder(config: &RouterConfig) -> Vec<Stage> {
    let mut stages = Vec::with_capacity(4);
    if config.strategy.uses_corridor() {
        stages.push(Stage::CORRIDOR);
    }
    stages.push(Stage::GLOBAL_STRICT);
    stages.push(Stage::GLOBAL_SOFT);
    if config.enable_overlap_stage {
        stages.push(Stage::GLOBAL_OVERLAP);
    }
    stages
}

/// Obstacle-blind path through the horizontal midpoint between the stubs.
pub fn geometric_fallback(endpoints: &Endpoints) -> Vec<GridPoint> {
    let start_stub = endpoints.start_stub();
    let end_stub = endpoints.end_stub();
    let mid_x = (start_stub.x + end_stub.x).div_euclid(2);
    simplify(&[
        endpoints.start,
        start_stub,
        GridPoint::new(mid_x, start_stub.y),
        GridPoint::new(mid_x, end_stub.y),
        end_stub,
        endpoints.end,
    ])
}

/// Everything one routing call needs to run the ladder, in grid units.
pub struct RoutePlan<'a> {
    pub config: &'a RouterConfig,
    pub endpoints: Endpoints,
    pub obstacles: &'a [GridRect],
    pub wires: &'a [Vec<GridPoint>],
    pub free_space: Option<&'a FreeSpace>,
}

impl RoutePlan<'_> {
    /// Runs the ladder; the first stage that yields a path wins. Falls back
    /// to [`geometric_fallback`] when every stage fails.
    pub fn route(&self) -> (Vec<GridPoint>, RouteSource) {
        for stage in stage_ladder(self.config) {
            match self.run_stage(&stage) {
                Ok(path) => {
                    debug!(stage = ?stage.kind, points = path.len(), "stage succeeded");
                    return (path, RouteSource::Stage(stage.kind));
                }
                Err(err) => debug!(stage = ?stage.kind, %err, "stage failed"),
            }
        }
        warn!(
            error = %RouteError::TotalFailure,
            start = ?self.endpoints.start,
            end = ?self.endpoints.end,
            "falling back to geometric route"
        );
        (geometric_fallback(&self.endpoints), RouteSource::Fallback)
    }

    /// One stage of the ladder: builds the maps for the stage's buffer,
    /// clears the terminals and searches.
    pub fn run_stage(&self, stage: &Stage) -> Result<Vec<GridPoint>, RouteError> {
        let mut maps = build_maps(self.obstacles, self.wires, stage.buffer);
        maps.unblock_all(&self.endpoints.cells());
        if stage.corridor {
            self.run_corridor(stage, &maps)
        } else {
            self.search(stage, &maps, None)
        }
    }

    fn run_corridor(&self, stage: &Stage, maps: &RoutingMaps) -> Result<Vec<GridPoint>, RouteError> {
        let free_space = self.free_space.ok_or(RouteError::NoCorridor)?;
        let from = free_space
            .locate(self.endpoints.start_stub())
            .ok_or(RouteError::NoCorridor)?;
        let to = free_space
            .locate(self.endpoints.end_stub())
            .ok_or(RouteError::NoCorridor)?;

        let mut penalties: FxHashMap<usize, u32> = FxHashMap::default();
        let mut last_error = RouteError::NoCorridor;
        for attempt in 0..self.config.corridor_attempts {
            let corridor = free_space.coarse_path(from, to, &penalties, &self.config.costs)?;
            let mut mask = free_space.corridor_mask(&corridor);
            mask.extend(self.endpoints.cells());

            match self.search(stage, maps, Some(&mask)) {
                Ok(path) => return Ok(path),
                Err(err) => {
                    debug!(attempt, mers = corridor.len(), %err, "corridor blocked");
                    for id in corridor.into_iter().filter(|&id| id != from && id != to) {
                        *penalties.entry(id).or_insert(0) += self.config.fatigue_penalty;
                    }
                    last_error = err;
                }
            }
        }
        Err(last_error)
    }

    fn search(
        &self,
        stage: &Stage,
        maps: &RoutingMaps,
        mask: Option<&FxHashSet<GridPoint>>,
    ) -> Result<Vec<GridPoint>, RouteError> {
        let start_stub = self.endpoints.start_stub();
        let end_stub = self.endpoints.end_stub();
        let cells = if self.config.strategy.bidirectional() {
            let options = SearchOptions {
                allow_collinear: stage.allow_collinear,
                max_iterations: self.config.max_bidirectional_iterations,
                costs: self.config.costs,
            };
            find_path_bidirectional(
                start_stub,
                end_stub,
                maps,
                mask,
                self.config.bidirectional_keying,
                &options,
            )?
        } else {
            let options = SearchOptions {
                allow_collinear: stage.allow_collinear,
                max_iterations: self.config.max_iterations,
                costs: self.config.costs,
            };
            find_path(start_stub, end_stub, maps, self.endpoints.start_dir, &options)?
        };

        let mut path = Vec::with_capacity(cells.len() + 2);
        path.push(self.endpoints.start);
        path.extend(cells);
        path.push(self.endpoints.end);
        Ok(simplify(&path))
    }
}
