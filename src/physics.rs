use crate::math::{self as m, Angle};

use itertools::izip;
use std::collections::HashMap;

//

pub mod body;
pub use body::{Body, BodyParams, BodyType, Mass, Material};

mod body_set;
use body_set::BodySet;
pub use body_set::BodyKey;

pub mod collision;
use collision::{BroadPhase, BruteForce, Manifold, Shape, SpatialGrid, AABB};

pub mod resolve;
pub use resolve::{dynamic_resolve, dynamic_resolve_with, static_resolve};

mod solver;
use solver::{ContactConstraint, SolverBody};
pub use solver::{ContactImpulse, SolverParams};

//

/// Velocity of an object.
///
// Equivalent to a Vec3 but with names for the translational and rotational part.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde-types", derive(serde::Serialize, serde::Deserialize))]
pub struct Velocity {
    /// Linear velocity in metres per second.
    pub linear: m::Vec2,
    /// Angular velocity in radians per second, counterclockwise.
    pub angular: f64,
}

impl Velocity {
    /// Get the linear velocity of a point offset from the body's origin.
    #[inline]
    pub fn point_velocity(&self, offset: m::Vec2) -> m::Vec2 {
        self.linear + m::left_normal(offset) * self.angular
    }

    /// Move a pose along this velocity for a timestep.
    /// The resulting rotation is renormalized.
    pub fn apply_to_pose(&self, dt: f64, mut pose: m::Pose) -> m::Pose {
        let scaled = *self * dt;
        pose.translation += scaled.linear;
        pose.prepend_rotation(Angle::Rad(scaled.angular).into());
        m::renormalize(&mut pose);
        pose
    }
}

impl std::ops::Add for Velocity {
    type Output = Self;
    fn add(self, other: Self) -> Self {
        Self {
            linear: self.linear + other.linear,
            angular: self.angular + other.angular,
        }
    }
}
impl std::ops::AddAssign for Velocity {
    fn add_assign(&mut self, other: Self) {
        *self = *self + other;
    }
}
impl std::ops::Mul<f64> for Velocity {
    type Output = Velocity;

    fn mul(self, rhs: f64) -> Self::Output {
        Velocity {
            linear: self.linear * rhs,
            angular: self.angular * rhs,
        }
    }
}

/// A contact found during the last update.
#[derive(Clone, Copy, Debug)]
pub struct ContactInfo {
    /// The bodies in contact, in the order the manifold was computed in.
    pub bodies: [BodyKey; 2],
    /// Contact geometry at the start of the update, with the normal pointing
    /// from the first body to the second.
    pub manifold: Manifold,
    /// Impulses the solver applied at each contact point, in the manifold's point order.
    /// Entries past the manifold's point count are zero.
    pub impulses: [ContactImpulse; 2],
}

/// Which broad phase algorithm a [`World`] uses to find potentially colliding pairs.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde-types", derive(serde::Serialize, serde::Deserialize))]
pub enum BroadPhaseMethod {
    /// Test every body against every other body. Fine for a few dozen bodies.
    BruteForce,
    /// Sort bodies into a uniform grid. Pick a cell size around the size of a typical body.
    Grid { cell_size: f64 },
}

impl Default for BroadPhaseMethod {
    fn default() -> Self {
        BroadPhaseMethod::BruteForce
    }
}

/// Parameters for a [`World`].
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(
    feature = "serde-types",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct WorldParams {
    /// Acceleration applied to every dynamic body with finite mass.
    pub gravity: m::Vec2,
    /// Fraction of velocity retained after one second, 1 meaning no drag.
    /// Clamped to [0, 1] when given to a [`World`], and treated as 1 if not finite.
    pub drag: f64,
    pub velocity_iterations: usize,
    pub position_iterations: usize,
    pub solver: SolverParams,
    pub broad_phase: BroadPhaseMethod,
}

impl Default for WorldParams {
    fn default() -> Self {
        Self {
            gravity: m::Vec2::new(0.0, -9.81),
            drag: 1.0,
            velocity_iterations: 8,
            position_iterations: 2,
            solver: SolverParams::default(),
            broad_phase: BroadPhaseMethod::default(),
        }
    }
}

impl WorldParams {
    #[inline]
    pub fn with_gravity(mut self, gravity: m::Vec2) -> Self {
        self.gravity = gravity;
        self
    }

    #[inline]
    pub fn with_drag(mut self, drag: f64) -> Self {
        self.drag = drag;
        self
    }

    /// Set drag as the fraction of velocity retained per frame at the given frame rate,
    /// which is often the more intuitive way to tune it.
    #[inline]
    pub fn with_frame_drag(mut self, retain_per_frame: f64, frame_rate: f64) -> Self {
        self.drag = retain_per_frame.powf(frame_rate);
        self
    }

    #[inline]
    pub fn with_iterations(mut self, velocity: usize, position: usize) -> Self {
        self.velocity_iterations = velocity;
        self.position_iterations = position;
        self
    }

    #[inline]
    pub fn with_solver(mut self, solver: SolverParams) -> Self {
        self.solver = solver;
        self
    }

    #[inline]
    pub fn with_broad_phase(mut self, broad_phase: BroadPhaseMethod) -> Self {
        self.broad_phase = broad_phase;
        self
    }

    /// Bring drag into the range [0, 1]. Non-finite drag turns drag off.
    fn sanitized(mut self) -> Self {
        if !self.drag.is_finite() {
            log::warn!("drag of {} isn't a number, using 1.0 (no drag)", self.drag);
            self.drag = 1.0;
        }
        self.drag = self.drag.clamp(0.0, 1.0);
        self
    }
}

#[derive(Clone, Debug)]
enum BroadPhaseState {
    BruteForce(BruteForce),
    Grid(SpatialGrid),
}

impl BroadPhaseState {
    fn new(method: BroadPhaseMethod) -> Self {
        match method {
            BroadPhaseMethod::BruteForce => Self::BruteForce(BruteForce),
            BroadPhaseMethod::Grid { cell_size } => Self::Grid(SpatialGrid::new(cell_size)),
        }
    }

    fn pairs(&mut self, aabbs: &[AABB]) -> Vec<[usize; 2]> {
        match self {
            Self::BruteForce(bp) => bp.pairs(aabbs),
            Self::Grid(bp) => bp.pairs(aabbs),
        }
    }
}

/// Owns all physics bodies and moves them forward in time.
#[derive(Clone)]
pub struct World {
    params: WorldParams,
    bodies: BodySet,
    broad_phase: BroadPhaseState,
    contacts: Vec<ContactInfo>,
}

impl Default for World {
    fn default() -> Self {
        Self::new(WorldParams::default())
    }
}

impl World {
    pub fn new(params: WorldParams) -> Self {
        let params = params.sanitized();
        Self {
            params,
            bodies: BodySet::new(),
            broad_phase: BroadPhaseState::new(params.broad_phase),
            contacts: Vec::new(),
        }
    }

    #[inline]
    pub fn params(&self) -> &WorldParams {
        &self.params
    }

    /// Replace the world's parameters. Takes effect on the next update.
    pub fn set_params(&mut self, params: WorldParams) {
        let params = params.sanitized();
        if params.broad_phase != self.params.broad_phase {
            self.broad_phase = BroadPhaseState::new(params.broad_phase);
        }
        self.params = params;
    }

    /// Add a body to the world. Its mass is computed from the shape and material.
    pub fn create_body(&mut self, params: BodyParams, shape: impl Into<Shape>) -> BodyKey {
        let key = self.bodies.insert(Body::new(params, shape.into()));
        log::debug!("created {:?} body {:?}", params.body_type, key);
        key
    }

    /// Remove a body. Returns the body if it still existed.
    pub fn remove_body(&mut self, key: BodyKey) -> Option<Body> {
        let body = self.bodies.remove(key);
        if body.is_some() {
            log::debug!("removed body {:?}", key);
        }
        body
    }

    #[inline]
    pub fn get_body(&self, key: BodyKey) -> Option<&Body> {
        self.bodies.get(key)
    }

    #[inline]
    pub fn get_body_mut(&mut self, key: BodyKey) -> Option<&mut Body> {
        self.bodies.get_mut(key)
    }

    /// Iterate over all bodies in arena order.
    pub fn bodies(&self) -> impl Iterator<Item = (BodyKey, &Body)> {
        self.bodies.iter()
    }

    pub fn bodies_mut(&mut self) -> impl Iterator<Item = (BodyKey, &mut Body)> {
        self.bodies.iter_mut()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    /// Contacts found during the most recent update.
    #[inline]
    pub fn contacts(&self) -> &[ContactInfo] {
        &self.contacts
    }

    /// Remove all bodies and stored contacts.
    pub fn clear(&mut self) {
        log::debug!("clearing {} bodies", self.bodies.len());
        self.bodies.clear();
        self.contacts.clear();
    }

    /// Find the first body, in arena order, whose shape contains the given point.
    pub fn find_body_at(&self, point: m::Vec2) -> Option<BodyKey> {
        self.bodies
            .iter()
            .find(|(_, body)| body.contains_point(point))
            .map(|(key, _)| key)
    }

    /// Push a body out of everything it overlaps using [`static_resolve`],
    /// e.g. after it has been dragged by hand into other bodies.
    ///
    /// Only positions change. Other movable bodies take their share of the correction.
    pub fn push_out(&mut self, key: BodyKey) {
        let mut body = match self.bodies.get(key) {
            Some(body) => *body,
            None => return,
        };
        for (other_key, other) in self.bodies.iter_mut() {
            if other_key == key {
                continue;
            }
            if let Some(manifold) =
                collision::collide_shapes(body.shape(), &body.pose, other.shape(), &other.pose)
            {
                static_resolve(&mut body, other, &manifold);
            }
        }
        if let Some(stored) = self.bodies.get_mut(key) {
            stored.pose = body.pose;
        }
    }

    /// Step the world forward with the iteration counts from its [`WorldParams`].
    #[inline]
    pub fn step(&mut self, dt: f64) {
        self.update(dt, self.params.velocity_iterations, self.params.position_iterations);
    }

    /// Detect collisions, solve contact impulses and move bodies.
    ///
    /// Does nothing unless `dt` is positive.
    pub fn update(&mut self, dt: f64, velocity_iterations: usize, position_iterations: usize) {
        if dt.is_nan() || dt <= 0.0 {
            return;
        }
        let _span = tracy_span!("physics update", "update");

        //
        // external forces
        //

        let drag = self.params.drag.powf(dt);
        for (_, body) in self.bodies.iter_mut() {
            let (force, torque) = body.take_force_and_torque();
            if body.body_type() != BodyType::Dynamic || !body.sees_forces() {
                continue;
            }
            body.velocity.linear += (self.params.gravity + force * body.inverse_mass()) * dt;
            body.velocity.angular += torque * body.inverse_moment_of_inertia() * dt;
            body.velocity = body.velocity * drag;
        }

        // working buffers indexed in arena order,
        // so pairs and constraints can refer to bodies by plain indices
        let mut keys: Vec<BodyKey> = Vec::with_capacity(self.bodies.len());
        let mut shapes: Vec<Shape> = Vec::with_capacity(self.bodies.len());
        let mut materials: Vec<Material> = Vec::with_capacity(self.bodies.len());
        let mut body_types: Vec<BodyType> = Vec::with_capacity(self.bodies.len());
        let mut solver_bodies: Vec<SolverBody> = Vec::with_capacity(self.bodies.len());
        for (key, body) in self.bodies.iter() {
            keys.push(key);
            shapes.push(*body.shape());
            materials.push(*body.material());
            body_types.push(body.body_type());
            solver_bodies.push(SolverBody {
                pose: body.pose,
                velocity: body.velocity,
                inv_mass: body.inverse_mass(),
                inv_inertia: body.inverse_moment_of_inertia(),
            });
        }

        //
        // collision detection
        //

        let pairs: Vec<[usize; 2]> = {
            let _span = tracy_span!("broad phase", "update");
            let aabbs: Vec<AABB> = izip!(&shapes, &solver_bodies)
                .map(|(shape, sb)| shape.compute_aabb(&sb.pose))
                .collect();
            let mut pairs = self.broad_phase.pairs(&aabbs);
            let is_movable = |sb: &SolverBody| sb.inv_mass > 0.0 || sb.inv_inertia > 0.0;
            pairs.retain(|&[i, j]| is_movable(&solver_bodies[i]) || is_movable(&solver_bodies[j]));
            pairs
        };

        let contacts: Vec<([usize; 2], Manifold)> = {
            let _span = tracy_span!("narrow phase", "update");
            narrow_phase(&pairs, &shapes, &solver_bodies)
        };
        log::trace!(
            "{} bodies, {} broad phase pairs, {} contacts",
            keys.len(),
            pairs.len(),
            contacts.len()
        );

        //
        // velocity solve
        //

        let constraints: Vec<ContactConstraint> = {
            let _span = tracy_span!("solve contacts", "update");
            // contacts that persist from the last update start from the impulses they ended with
            let mut previous: HashMap<[BodyKey; 2], &ContactInfo> = HashMap::new();
            if self.params.solver.warm_starting {
                previous.extend(self.contacts.iter().map(|c| (c.bodies, c)));
            }

            let mut constraints = Vec::with_capacity(contacts.len());
            for &([i, j], ref manifold) in &contacts {
                let mut constraint = ContactConstraint::new(
                    [i, j],
                    manifold,
                    materials[i].friction_with(&materials[j]),
                    materials[i].restitution_with(&materials[j]),
                    &self.params.solver,
                    &solver_bodies,
                );
                match previous.get(&[keys[i], keys[j]]) {
                    Some(prev) if prev.manifold.points.len() == manifold.points.len() => {
                        constraint.warm_start(&prev.impulses, &mut solver_bodies);
                    }
                    _ => {}
                }
                constraints.push(constraint);
            }

            for _ in 0..velocity_iterations {
                for constraint in &mut constraints {
                    constraint.solve_velocity(&mut solver_bodies);
                }
            }
            constraints
        };

        //
        // integrate and correct remaining penetration
        //

        for (sb, body_type) in izip!(&mut solver_bodies, &body_types) {
            if *body_type != BodyType::Static {
                sb.pose = sb.velocity.apply_to_pose(dt, sb.pose);
            }
        }

        {
            let _span = tracy_span!("position correction", "update");
            for _ in 0..position_iterations {
                solver::correct_positions(&pairs, &shapes, &mut solver_bodies, &self.params.solver);
            }
        }

        for ((_, body), sb) in self.bodies.iter_mut().zip(&solver_bodies) {
            body.pose = sb.pose;
            body.velocity = sb.velocity;
        }
        self.contacts = izip!(contacts, &constraints)
            .map(|(([i, j], manifold), constraint)| ContactInfo {
                bodies: [keys[i], keys[j]],
                manifold,
                impulses: constraint.impulses(),
            })
            .collect();
    }
}

/// Collide every pair at the given poses, keeping the ones that touch in pair order.
fn narrow_phase(
    pairs: &[[usize; 2]],
    shapes: &[Shape],
    solver_bodies: &[SolverBody],
) -> Vec<([usize; 2], Manifold)> {
    let collide = |&[i, j]: &[usize; 2]| {
        collision::collide_shapes(
            &shapes[i],
            &solver_bodies[i].pose,
            &shapes[j],
            &solver_bodies[j].pose,
        )
        .map(|manifold| ([i, j], manifold))
    };

    #[cfg(feature = "parallel")]
    let contacts = {
        use rayon::prelude::*;
        pairs.par_iter().filter_map(collide).collect()
    };
    #[cfg(not(feature = "parallel"))]
    let contacts = pairs.iter().filter_map(collide).collect();
    contacts
}
