//! Error types.
//!
//! Geometry tests never fail at runtime; these cover configuration and the
//! shape preconditions a producer can check before pushing.

use thiserror::Error;

use crate::types::ColliderId;

/// A shape snapshot that violates the pipeline's input contract.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ShapeError {
    #[error("collider {collider}: polygon needs at least 3 vertices, got {count}")]
    TooFewVertices { collider: ColliderId, count: usize },

    #[error("collider {collider}: {vertices} vertices but {normals} edge normals")]
    NormalCountMismatch { collider: ColliderId, vertices: usize, normals: usize },

    #[error("collider {collider}: negative radius {radius}")]
    NegativeRadius { collider: ColliderId, radius: f32 },

    #[error("collider {collider}: non-finite coordinates")]
    NonFinite { collider: ColliderId },
}

/// Invalid world configuration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("cell size must be finite and positive, got {0}")]
    InvalidCellSize(f32),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CollisionError {
    #[error(transparent)]
    Shape(#[from] ShapeError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

pub type CollisionResult<T> = Result<T, CollisionError>;
