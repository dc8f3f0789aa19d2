use crate::config::OutputConfig;
use crate::routing::{Branch, RouteOutcome, StageKind};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

/// Serialisable view of one routing result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteDump {
    pub grid_size: f32,
    pub points: Vec<[f32; 2]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grid_points: Option<Vec<[i32; 2]>>,
    /// Stage that produced the path; absent for the fallback.
    pub stage: Option<StageKind>,
    pub fallback: bool,
    pub branch: Option<BranchDump>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BranchDump {
    pub kind: String,
    pub point: [i32; 2],
    pub direction: [i32; 2],
}

impl From<&Branch> for BranchDump {
    fn from(branch: &Branch) -> Self {
        Self {
            kind: format!("{:?}", branch.kind),
            point: [branch.point.x, branch.point.y],
            direction: [branch.direction.x, branch.direction.y],
        }
    }
}

impl RouteDump {
    pub fn from_outcome(outcome: &RouteOutcome, include_grid_points: bool) -> Self {
        let grid_points = include_grid_points
            .then(|| outcome.grid_points.iter().map(|p| [p.x, p.y]).collect());
        RouteDump {
            grid_size: outcome.grid_size,
            points: outcome.points.iter().map(|p| [p.x, p.y]).collect(),
            grid_points,
            stage: outcome.stage(),
            fallback: outcome.is_fallback(),
            branch: outcome.branch.as_ref().map(BranchDump::from),
        }
    }
}

/// Writes the dump as JSON to `path`, or to stdout when no path is given.
pub fn write_route_dump(
    path: Option<&Path>,
    outcome: &RouteOutcome,
    output: &OutputConfig,
) -> anyhow::Result<()> {
    let dump = RouteDump::from_outcome(outcome, output.include_grid_points);
    match path {
        Some(path) => {
            let file = File::create(path)?;
            write_json(BufWriter::new(file), &dump, output.pretty)
        }
        None => write_json(io::stdout().lock(), &dump, output.pretty),
    }
}

fn write_json<W: Write>(mut writer: W, dump: &RouteDump, pretty: bool) -> anyhow::Result<()> {
    if pretty {
        serde_json::to_writer_pretty(&mut writer, dump)?;
    } else {
        serde_json::to_writer(&mut writer, dump)?;
    }
    writeln!(writer)?;
    writer.flush()?;
    Ok(())
}
