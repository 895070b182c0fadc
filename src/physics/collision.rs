mod aabb;
pub use aabb::AABB;

pub mod broadphase;
pub use broadphase::{BroadPhase, BruteForce, SpatialGrid};

pub mod manifold;
pub use manifold::{ContactPoint, ContactPoints, Manifold};

pub mod narrowphase;
pub use narrowphase::{
    collide_capsules, collide_circle_shape, collide_circles, collide_polygon_capsule,
    collide_polygons, collide_shapes, LINEAR_SLOP,
};

pub mod overlap;
pub use overlap::{
    overlap_capsules, overlap_circle_shape, overlap_circles, overlap_polygon_capsule,
    overlap_polygons, overlap_shapes,
};

pub mod query;
pub use query::point_in_shape;

pub mod shape;
pub use shape::{
    Capsule, Circle, Edge, MassData, Polygon, Shape, ShapeError, MAX_POLYGON_VERTICES,
};
