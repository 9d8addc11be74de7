//! gridsat: uniform-grid broad phase + SAT narrow phase for 2D circles and convex polygons,
//! with new/continuing contact tracking and push-out resolution.

pub mod types;
pub mod api;
pub mod error;
pub mod geometry;
pub mod partition;
pub mod broadphase;
pub mod narrowphase;
pub mod history;
pub mod resolution;
pub mod world;

pub use crate::types::*;
pub use crate::api::*;
pub use crate::error::{CollisionError, CollisionResult, ConfigError, ShapeError};
pub use crate::geometry::{Bounds2D, Mtv, Projection};
pub use crate::history::ContactHistory;
pub use crate::resolution::Body;
pub use crate::world::CollisionWorld;
