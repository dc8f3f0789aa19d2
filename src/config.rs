use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::routing::GridRect;

/// Which refinements of the routing pipeline are enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    /// Unidirectional A* over the whole board with the stage ladder.
    Direct,
    /// Bi-directional A* with corridor-constrained stages.
    Corridor,
    /// `Corridor` plus wall-hugging segment nudging.
    Nudged,
    /// `Nudged` plus branching onto existing nets.
    #[default]
    NetAware,
}

impl Strategy {
    pub fn bidirectional(self) -> bool {
        !matches!(self, Strategy::Direct)
    }

    pub fn uses_corridor(self) -> bool {
        !matches!(self, Strategy::Direct)
    }

    pub fn nudges(self) -> bool {
        matches!(self, Strategy::Nudged | Strategy::NetAware)
    }

    pub fn resolves_nets(self) -> bool {
        matches!(self, Strategy::NetAware)
    }

    pub fn needs_free_space(self) -> bool {
        self.uses_corridor() || self.nudges() || self.resolves_nets()
    }
}

/// State kept per cell by the bi-directional search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BidirectionalKeying {
    /// One score per cell. Faster; the turn penalty is approximate.
    Cell,
    /// One score per cell and arrival direction.
    #[default]
    CellDirection,
}

/// Cost model of the grid search and the coarse corridor search.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Costs {
    pub base_move: u32,
    pub turn_penalty: u32,
    pub crossing_wire: u32,
    pub overlap_penalty: u32,
    pub heuristic_multiplier: f32,
    pub coarse_wire_base: f32,
    pub coarse_density_weight: f32,
}

impl Default for Costs {
    fn default() -> Self {
        Self {
            base_move: 10,
            turn_penalty: 500,
            crossing_wire: 2000,
            overlap_penalty: 100_000,
            heuristic_multiplier: 1.01,
            coarse_wire_base: 30.0,
            coarse_density_weight: 100.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RouterConfig {
    pub grid_size: f32,
    pub strategy: Strategy,
    pub enable_overlap_stage: bool,
    pub corridor_attempts: usize,
    pub fatigue_penalty: u32,
    pub max_iterations: usize,
    pub max_bidirectional_iterations: usize,
    pub bidirectional_keying: BidirectionalKeying,
    /// Explicit decomposition area in grid units. Derived from the inputs
    /// when absent.
    pub board: Option<GridRect>,
    pub board_margin: i32,
    pub subsquare_size: i32,
    pub costs: Costs,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            grid_size: 20.0,
            strategy: Strategy::default(),
            enable_overlap_stage: false,
            corridor_attempts: 3,
            fatigue_penalty: 500,
            max_iterations: 50_000,
            max_bidirectional_iterations: 30_000,
            bidirectional_keying: BidirectionalKeying::default(),
            board: None,
            board_margin: 10,
            subsquare_size: 2,
            costs: Costs::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub pretty: bool,
    pub include_grid_points: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            pretty: true,
            include_grid_points: true,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub router: RouterConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RouterConfigFile {
    grid_size: Option<f32>,
    strategy: Option<Strategy>,
    enable_overlap_stage: Option<bool>,
    corridor_attempts: Option<usize>,
    fatigue_penalty: Option<u32>,
    max_iterations: Option<usize>,
    max_bidirectional_iterations: Option<usize>,
    bidirectional_keying: Option<BidirectionalKeying>,
    board: Option<GridRect>,
    board_margin: Option<i32>,
    subsquare_size: Option<i32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CostsFile {
    base_move: Option<u32>,
    turn_penalty: Option<u32>,
    crossing_wire: Option<u32>,
    overlap_penalty: Option<u32>,
    heuristic_multiplier: Option<f32>,
    coarse_wire_base: Option<f32>,
    coarse_density_weight: Option<f32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OutputConfigFile {
    pretty: Option<bool>,
    include_grid_points: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConfigFile {
    router: Option<RouterConfigFile>,
    costs: Option<CostsFile>,
    output: Option<OutputConfigFile>,
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let config = Config::default();
    let Some(path) = path else {
        return Ok(config);
    };

    let contents = std::fs::read_to_string(path)?;
    parse_config(config, &contents)
}

/// Overlays a JSON5 config document onto `config`.
pub fn parse_config(mut config: Config, contents: &str) -> anyhow::Result<Config> {
    let parsed: ConfigFile = json5::from_str(contents)?;

    if let Some(router) = parsed.router {
        if let Some(v) = router.grid_size {
            if !(v.is_finite() && v > 0.0) {
                return Err(anyhow::anyhow!("gridSize must be positive, got {v}"));
            }
            config.router.grid_size = v;
        }
        if let Some(v) = router.strategy {
            config.router.strategy = v;
        }
        if let Some(v) = router.enable_overlap_stage {
            config.router.enable_overlap_stage = v;
        }
        if let Some(v) = router.corridor_attempts {
            config.router.corridor_attempts = v;
        }
        if let Some(v) = router.fatigue_penalty {
            config.router.fatigue_penalty = v;
        }
        if let Some(v) = router.max_iterations {
            config.router.max_iterations = v;
        }
        if let Some(v) = router.max_bidirectional_iterations {
            config.router.max_bidirectional_iterations = v;
        }
        if let Some(v) = router.bidirectional_keying {
            config.router.bidirectional_keying = v;
        }
        if let Some(v) = router.board {
            config.router.board = Some(v);
        }
        if let Some(v) = router.board_margin {
            config.router.board_margin = v.max(0);
        }
        if let Some(v) = router.subsquare_size {
            config.router.subsquare_size = v.max(1);
        }
    }

    if let Some(costs) = parsed.costs {
        let target = &mut config.router.costs;
        if let Some(v) = costs.base_move {
            target.base_move = v;
        }
        if let Some(v) = costs.turn_penalty {
            target.turn_penalty = v;
        }
        if let Some(v) = costs.crossing_wire {
            target.crossing_wire = v;
        }
        if let Some(v) = costs.overlap_penalty {
            target.overlap_penalty = v;
        }
        if let Some(v) = costs.heuristic_multiplier {
            target.heuristic_multiplier = v;
        }
        if let Some(v) = costs.coarse_wire_base {
            target.coarse_wire_base = v;
        }
        if let Some(v) = costs.coarse_density_weight {
            target.coarse_density_weight = v;
        }
    }

    if let Some(output) = parsed.output {
        if let Some(v) = output.pretty {
            config.output.pretty = v;
        }
        if let Some(v) = output.include_grid_points {
            config.output.include_grid_points = v;
        }
    }

    Ok(config)
}
