//! 2D rigid-body physics: convex shapes, contact manifolds,
//! and a sequential impulse solver stepping a world of bodies.

/// Open a profiling span that lasts until the returned value is dropped.
/// Does nothing unless the `tracy` feature is enabled and a client is running.
macro_rules! tracy_span {
    ($name:literal, $fn_name:literal) => {
        tracy_client::Client::running()
            .map(|client| client.span_alloc(Some($name), $fn_name, file!(), line!(), 0))
    };
}

pub mod math;
pub use math::{uv, Angle, Pose, PoseBuilder, Rotor2, Unit, Vec2};

pub mod physics;
pub use physics::{
    body::{Body, BodyParams, BodyType, Mass, Material},
    collision::{
        self, Capsule, Circle, ContactPoint, ContactPoints, Edge, Manifold, Polygon, Shape,
        ShapeError, AABB,
    },
    dynamic_resolve, static_resolve, BodyKey, BroadPhaseMethod, ContactImpulse, ContactInfo,
    SolverParams, Velocity, World, WorldParams,
};
