use schematic_router::config::{BidirectionalKeying, RouterConfig, Strategy};
use schematic_router::route_dump::RouteDump;
use schematic_router::{RequestDocument, route_with_outcome};
use serde::Deserialize;
use wasm_bindgen::prelude::*;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RouteOptions {
    strategy: Option<Strategy>,
    grid_size: Option<f32>,
    enable_overlap_stage: Option<bool>,
    bidirectional_keying: Option<BidirectionalKeying>,
    include_grid_points: Option<bool>,
}

fn build_router_config(options: &RouteOptions) -> RouterConfig {
    let mut config = RouterConfig::default();
    if let Some(strategy) = options.strategy {
        config.strategy = strategy;
    }
    if let Some(grid_size) = options.grid_size.filter(|g| g.is_finite() && *g > 0.0) {
        config.grid_size = grid_size;
    }
    if let Some(enabled) = options.enable_overlap_stage {
        config.enable_overlap_stage = enabled;
    }
    if let Some(keying) = options.bidirectional_keying {
        config.bidirectional_keying = keying;
    }
    config
}

fn route_json(request_json: &str, options_json: Option<&str>) -> Result<String, String> {
    let options = match options_json {
        Some(raw_options) => serde_json::from_str::<RouteOptions>(raw_options)
            .map_err(|error| error.to_string())?,
        None => RouteOptions::default(),
    };
    let config = build_router_config(&options);
    let request = serde_json::from_str::<RequestDocument>(request_json)
        .map_err(|error| error.to_string())?
        .into_path_request(config.grid_size);

    let outcome = route_with_outcome(&request, &config);
    let dump = RouteDump::from_outcome(&outcome, options.include_grid_points.unwrap_or(false));
    serde_json::to_string(&dump).map_err(|error| error.to_string())
}

/// Routes one wire. Takes a `PathRequest` or component `RouteRequest` as
/// JSON and returns the route dump as JSON.
#[wasm_bindgen]
pub fn route_wire_json(request_json: &str, options_json: Option<String>) -> Result<String, JsValue> {
    route_json(request_json, options_json.as_deref()).map_err(|error| JsValue::from_str(&error))
}
