use serde::{Deserialize, Serialize};

/// A point in pixel space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Two pixel points are treated as the same location when they are less
    /// than one pixel apart on both axes.
    pub fn coincides(&self, other: &Point) -> bool {
        (self.x - other.x).abs() < 1.0 && (self.y - other.y).abs() < 1.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    #[serde(alias = "up")]
    Top,
    #[serde(alias = "down")]
    Bottom,
    Left,
    Right,
}

/// Forced approach direction of a port, either as a symbolic side or as a
/// direction vector in pixel orientation (y grows downwards).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Approach {
    Side(Side),
    Vector(Point),
}

impl From<Side> for Approach {
    fn from(side: Side) -> Self {
        Approach::Side(side)
    }
}

/// Rectangular keep-out zone in grid units.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Obstacle {
    #[serde(default)]
    pub id: String,
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Obstacle {
    pub fn new(id: impl Into<String>, x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            id: id.into(),
            x,
            y,
            width,
            height,
        }
    }
}

/// An already drawn wire: a pixel-space polyline between two ports.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Wire {
    #[serde(default)]
    pub id: String,
    pub points: Vec<Point>,
    #[serde(default)]
    pub source_port_id: Option<String>,
    #[serde(default)]
    pub dest_port_id: Option<String>,
}

impl Wire {
    pub fn first(&self) -> Option<&Point> {
        self.points.first()
    }

    pub fn last(&self) -> Option<&Point> {
        self.points.last()
    }

    pub fn touches_port(&self, port_id: &str) -> bool {
        self.source_port_id.as_deref() == Some(port_id)
            || self.dest_port_id.as_deref() == Some(port_id)
    }
}

/// One routing request. Obstacles are already shaped into grid rectangles.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PathRequest {
    pub start: Point,
    pub end: Point,
    #[serde(default)]
    pub start_direction: Option<Approach>,
    #[serde(default)]
    pub end_direction: Option<Approach>,
    #[serde(default)]
    pub start_port_id: Option<String>,
    #[serde(default)]
    pub end_port_id: Option<String>,
    #[serde(default)]
    pub obstacles: Vec<Obstacle>,
    #[serde(default)]
    pub existing_wires: Vec<Wire>,
    #[serde(default)]
    pub grid_size: Option<f32>,
}

impl PathRequest {
    pub fn new(start: Point, end: Point) -> Self {
        Self {
            start,
            end,
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortPin {
    pub id: String,
    /// Absolute pixel position of the pin.
    pub position: Point,
    #[serde(default)]
    pub direction: Option<Approach>,
}

/// A placed component as seen by the router: its kind and resolved pins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentFootprint {
    pub id: String,
    #[serde(default)]
    pub kind: String,
    pub ports: Vec<PortPin>,
}

/// Request form that carries component footprints instead of shaped
/// obstacles. See [`RouteRequest::into_path_request`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteRequest {
    pub start: Point,
    pub end: Point,
    #[serde(default)]
    pub start_direction: Option<Approach>,
    #[serde(default)]
    pub end_direction: Option<Approach>,
    #[serde(default)]
    pub start_port_id: Option<String>,
    #[serde(default)]
    pub end_port_id: Option<String>,
    pub components: Vec<ComponentFootprint>,
    #[serde(default)]
    pub existing_wires: Vec<Wire>,
    #[serde(default)]
    pub grid_size: Option<f32>,
}

impl RouteRequest {
    pub fn into_path_request(self, default_grid_size: f32) -> PathRequest {
        // a non-positive grid means "unset", as in routing
        let grid_size = self
            .grid_size
            .filter(|g| g.is_finite() && *g > 0.0)
            .unwrap_or(default_grid_size);
        let obstacles = self
            .components
            .iter()
            .filter_map(|component| crate::routing::obstacle_for_component(component, grid_size))
            .collect();
        PathRequest {
            start: self.start,
            end: self.end,
            start_direction: self.start_direction,
            end_direction: self.end_direction,
            start_port_id: self.start_port_id,
            end_port_id: self.end_port_id,
            obstacles,
            existing_wires: self.existing_wires,
            grid_size: Some(grid_size),
        }
    }
}

/// Either request shape, as read from a JSON document. Footprint requests
/// are tried first since they carry a mandatory `components` key.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RequestDocument {
    Components(RouteRequest),
    Shaped(PathRequest),
}

impl RequestDocument {
    pub fn into_path_request(self, default_grid_size: f32) -> PathRequest {
        match self {
            RequestDocument::Components(request) => request.into_path_request(default_grid_size),
            RequestDocument::Shaped(request) => request,
        }
    }
}
