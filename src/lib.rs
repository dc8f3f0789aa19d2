#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod ir;
pub mod route_dump;
pub mod routing;

#[cfg(feature = "cli")]
pub use cli::run;
pub use config::{BidirectionalKeying, Costs, RouterConfig, Strategy};
pub use ir::{Approach, Obstacle, PathRequest, Point, RequestDocument, RouteRequest, Side, Wire};
pub use routing::{RouteOutcome, RouteSource, StageKind, route, route_with_outcome};
