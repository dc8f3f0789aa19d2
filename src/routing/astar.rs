use std::cmp::Ordering;
use std::collections::BinaryHeap;

use rustc_hash::{FxHashMap, FxHashSet};
use tracing::trace;

use crate::config::{BidirectionalKeying, Costs};

use super::error::RouteError;
use super::maps::{RoutingMaps, WIRE_HORIZONTAL, WIRE_VERTICAL};
use super::types::GridPoint;

// ── A* cost scaling ─────────────────────────────────────────────────
/// Integer multiplier so the fractional heuristic weight survives in u64 costs.
const COST_SCALE: u64 = 100;

/// Up, down, left, right.
const MOVES: [GridPoint; 4] = [
    GridPoint::new(0, -1),
    GridPoint::new(0, 1),
    GridPoint::new(-1, 0),
    GridPoint::new(1, 0),
];
/// Arrival direction of a node that was not entered by a move.
const NO_DIR: u8 = 4;

fn dir_index(step: GridPoint) -> u8 {
    MOVES
        .iter()
        .position(|m| *m == step)
        .map(|idx| idx as u8)
        .unwrap_or(NO_DIR)
}

fn is_horizontal_move(dir: u8) -> bool {
    dir >= 2
}

#[derive(Debug, Clone, Copy)]
pub struct SearchOptions {
    pub allow_collinear: bool,
    pub max_iterations: usize,
    pub costs: Costs,
}

#[derive(Debug, Clone, Copy)]
struct Weights {
    base: u64,
    turn: u64,
    crossing: u64,
    overlap: u64,
    per_cell_estimate: u64,
}

impl Weights {
    fn from_costs(costs: &Costs) -> Self {
        Self {
            base: costs.base_move as u64 * COST_SCALE,
            turn: costs.turn_penalty as u64 * COST_SCALE,
            crossing: costs.crossing_wire as u64 * COST_SCALE,
            overlap: costs.overlap_penalty as u64 * COST_SCALE,
            per_cell_estimate: (costs.heuristic_multiplier.max(0.0) * COST_SCALE as f32).round()
                as u64,
        }
    }

    fn estimate(&self, from: GridPoint, to: GridPoint) -> u64 {
        from.manhattan(to) as u64 * self.per_cell_estimate
    }
}

/// Cost of entering `next` with move `dir` after arriving with `arrival`, or
/// `None` if the move is not allowed.
fn step_cost(
    maps: &RoutingMaps,
    next: GridPoint,
    dir: u8,
    arrival: u8,
    allow_collinear: bool,
    weights: &Weights,
) -> Option<u64> {
    let extra = maps.cost.cost(next)?;
    let occupancy = maps.occupancy.get(next);
    let (parallel, perpendicular) = if is_horizontal_move(dir) {
        (WIRE_HORIZONTAL, WIRE_VERTICAL)
    } else {
        (WIRE_VERTICAL, WIRE_HORIZONTAL)
    };

    let mut cost = weights.base + extra as u64 * COST_SCALE;
    if occupancy & parallel != 0 {
        if !allow_collinear {
            return None;
        }
        cost += weights.overlap;
    }
    if occupancy & perpendicular != 0 {
        cost += weights.crossing;
    }
    if arrival != NO_DIR && arrival != dir {
        cost += weights.turn;
    }
    Some(cost)
}

#[derive(Debug, Clone, Copy)]
struct SearchNode {
    pos: GridPoint,
    dir: u8,
    parent: Option<usize>,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
struct OpenEntry {
    est: u64,
    cost: u64,
    node: usize,
}

impl Ord for OpenEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .est
            .cmp(&self.est)
            .then_with(|| other.cost.cmp(&self.cost))
            .then_with(|| other.node.cmp(&self.node))
    }
}

impl PartialOrd for OpenEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

fn chain(nodes: &[SearchNode], mut idx: usize) -> Vec<GridPoint> {
    let mut cells = vec![nodes[idx].pos];
    while let Some(parent) = nodes[idx].parent {
        cells.push(nodes[parent].pos);
        idx = parent;
    }
    cells
}

/// Unidirectional A* from `start` to `goal`.
///
/// Scores are keyed per cell and arrival direction, so the turn penalty is
/// exact. `start_dir` is the direction the search is considered to have
/// arrived with; the zero vector means no initial heading.
pub fn find_path(
    start: GridPoint,
    goal: GridPoint,
    maps: &RoutingMaps,
    start_dir: GridPoint,
    options: &SearchOptions,
) -> Result<Vec<GridPoint>, RouteError> {
    let weights = Weights::from_costs(&options.costs);
    let start_node = SearchNode {
        pos: start,
        dir: dir_index(start_dir),
        parent: None,
    };
    let mut nodes = vec![start_node];
    let mut best: FxHashMap<(GridPoint, u8), u64> = FxHashMap::default();
    best.insert((start, start_node.dir), 0);
    let mut heap = BinaryHeap::new();
    heap.push(OpenEntry {
        est: weights.estimate(start, goal),
        cost: 0,
        node: 0,
    });

    let mut iterations = 0usize;
    while let Some(entry) = heap.pop() {
        iterations += 1;
        if iterations > options.max_iterations {
            break;
        }
        let current = nodes[entry.node];
        if best
            .get(&(current.pos, current.dir))
            .is_some_and(|&g| g < entry.cost)
        {
            continue;
        }
        if current.pos == goal {
            let mut cells = chain(&nodes, entry.node);
            cells.reverse();
            trace!(iterations, cells = cells.len(), "unidirectional search reached goal");
            return Ok(cells);
        }
        for (idx, step) in MOVES.iter().enumerate() {
            let dir = idx as u8;
            let next = current.pos.offset(*step);
            let Some(cost) = step_cost(
                maps,
                next,
                dir,
                current.dir,
                options.allow_collinear,
                &weights,
            ) else {
                continue;
            };
            let g = entry.cost + cost;
            let key = (next, dir);
            if best.get(&key).is_some_and(|&old| old <= g) {
                continue;
            }
            best.insert(key, g);
            nodes.push(SearchNode {
                pos: next,
                dir,
                parent: Some(entry.node),
            });
            heap.push(OpenEntry {
                est: g + weights.estimate(next, goal),
                cost: g,
                node: nodes.len() - 1,
            });
        }
    }

    trace!(iterations, "unidirectional search exhausted");
    Err(RouteError::SearchExhausted { iterations })
}

enum Expansion {
    Continue,
    /// The popped node's cell was already reached by the other frontier.
    Met { pos: GridPoint, node: usize },
    Exhausted,
}

#[derive(Clone, Copy)]
enum Sweep {
    Forward,
    Backward,
}

struct Frontier {
    target: GridPoint,
    heap: BinaryHeap<OpenEntry>,
    nodes: Vec<SearchNode>,
    best: FxHashMap<(GridPoint, u8), u64>,
    /// Cheapest node seen per cell, used for meeting detection and splicing.
    reached: FxHashMap<GridPoint, (u64, usize)>,
}

impl Frontier {
    fn new(origin: GridPoint, target: GridPoint, weights: &Weights) -> Self {
        let mut best = FxHashMap::default();
        best.insert((origin, NO_DIR), 0);
        let mut reached = FxHashMap::default();
        reached.insert(origin, (0, 0));
        let mut heap = BinaryHeap::new();
        heap.push(OpenEntry {
            est: weights.estimate(origin, target),
            cost: 0,
            node: 0,
        });
        Self {
            target,
            heap,
            nodes: vec![SearchNode {
                pos: origin,
                dir: NO_DIR,
                parent: None,
            }],
            best,
            reached,
        }
    }

    fn key(keying: BidirectionalKeying, pos: GridPoint, dir: u8) -> (GridPoint, u8) {
        match keying {
            BidirectionalKeying::Cell => (pos, NO_DIR),
            BidirectionalKeying::CellDirection => (pos, dir),
        }
    }

    fn expand(
        &mut self,
        other: &Frontier,
        maps: &RoutingMaps,
        allowed: Option<&FxHashSet<GridPoint>>,
        keying: BidirectionalKeying,
        options: &SearchOptions,
        weights: &Weights,
    ) -> Expansion {
        let Some(entry) = self.heap.pop() else {
            return Expansion::Exhausted;
        };
        let current = self.nodes[entry.node];
        let current_key = if current.parent.is_none() {
            (current.pos, NO_DIR)
        } else {
            Self::key(keying, current.pos, current.dir)
        };
        if self.best.get(&current_key).is_some_and(|&g| g < entry.cost) {
            return Expansion::Continue;
        }
        if other.reached.contains_key(&current.pos) {
            return Expansion::Met {
                pos: current.pos,
                node: entry.node,
            };
        }

        for (idx, step) in MOVES.iter().enumerate() {
            let dir = idx as u8;
            let next = current.pos.offset(*step);
            if let Some(mask) = allowed
                && !mask.contains(&next)
            {
                continue;
            }
            let Some(cost) = step_cost(
                maps,
                next,
                dir,
                current.dir,
                options.allow_collinear,
                weights,
            ) else {
                continue;
            };
            let g = entry.cost + cost;
            let key = Self::key(keying, next, dir);
            if self.best.get(&key).is_some_and(|&old| old <= g) {
                continue;
            }
            self.best.insert(key, g);
            self.nodes.push(SearchNode {
                pos: next,
                dir,
                parent: Some(entry.node),
            });
            let node = self.nodes.len() - 1;
            let improves = self
                .reached
                .get(&next)
                .is_none_or(|&(reached_cost, _)| g < reached_cost);
            if improves {
                self.reached.insert(next, (g, node));
            }
            self.heap.push(OpenEntry {
                est: g + weights.estimate(next, self.target),
                cost: g,
                node,
            });
        }
        Expansion::Continue
    }

    fn chain_to(&self, pos: GridPoint) -> Vec<GridPoint> {
        match self.reached.get(&pos) {
            Some(&(_, idx)) => chain(&self.nodes, idx),
            None => Vec::new(),
        }
    }
}

/// Bi-directional A* between `start` and `goal`, expanding the two frontiers
/// alternately one node at a time until a popped cell has been reached by
/// the opposite side.
///
/// With [`BidirectionalKeying::Cell`] scores are kept per cell only, which
/// makes the turn penalty approximate. When `allowed` is set, only those
/// cells may be entered.
pub fn find_path_bidirectional(
    start: GridPoint,
    goal: GridPoint,
    maps: &RoutingMaps,
    allowed: Option<&FxHashSet<GridPoint>>,
    keying: BidirectionalKeying,
    options: &SearchOptions,
) -> Result<Vec<GridPoint>, RouteError> {
    let weights = Weights::from_costs(&options.costs);
    let mut forward = Frontier::new(start, goal, &weights);
    let mut backward = Frontier::new(goal, start, &weights);

    let mut iterations = 0usize;
    let mut meeting = None;
    while !forward.heap.is_empty() && !backward.heap.is_empty() {
        iterations += 1;
        if iterations > options.max_iterations {
            break;
        }
        match forward.expand(&backward, maps, allowed, keying, options, &weights) {
            Expansion::Met { pos, node } => {
                meeting = Some((Sweep::Forward, pos, node));
                break;
            }
            Expansion::Exhausted => break,
            Expansion::Continue => {}
        }
        match backward.expand(&forward, maps, allowed, keying, options, &weights) {
            Expansion::Met { pos, node } => {
                meeting = Some((Sweep::Backward, pos, node));
                break;
            }
            Expansion::Exhausted => break,
            Expansion::Continue => {}
        }
    }

    let Some((side, pos, node)) = meeting else {
        trace!(iterations, "bidirectional search exhausted");
        return Err(RouteError::SearchExhausted { iterations });
    };

    // the side that popped the meeting cell splices from that exact node
    let (mut cells, tail) = match side {
        Sweep::Forward => (chain(&forward.nodes, node), backward.chain_to(pos)),
        Sweep::Backward => (forward.chain_to(pos), chain(&backward.nodes, node)),
    };
    cells.reverse();
    // both chains contain the meeting cell
    cells.extend(tail.into_iter().skip(1));
    trace!(iterations, cells = cells.len(), "bidirectional search met");
    Ok(cells)
}
