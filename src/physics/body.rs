use super::{
    collision::{collide_shapes, point_in_shape, Shape, AABB},
    Velocity,
};
use crate::math::{self as m, Angle, PoseBuilder};

/// The type of a body determines how it is treated in physics updates.
/// It is chosen when the body is created and never changes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde-types", derive(serde::Serialize, serde::Deserialize))]
pub enum BodyType {
    /// Does not respond to collision forces and cannot move.
    Static,
    /// Does not respond to collision forces but moves with its own velocity.
    Kinematic,
    /// The default type of body; responds to gravity and collision forces.
    Dynamic,
}

/// Determines how much a body weighs and how its surface responds to collisions.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(
    feature = "serde-types",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct Material {
    /// Mass per unit of area.
    pub density: f64,
    /// Fraction of normal velocity kept after a bounce, between 0 and 1.
    pub restitution: f64,
    /// Coulomb friction coefficient.
    pub friction: f64,
}

impl Default for Material {
    fn default() -> Self {
        Material {
            density: 1.0,
            restitution: 0.0,
            friction: 0.4,
        }
    }
}

impl Material {
    /// Get the restitution coefficient between this material and another.
    ///
    /// It is the smaller of the two, so a perfectly bouncy ball
    /// still stops on an inelastic floor.
    #[inline]
    pub fn restitution_with(&self, other: &Self) -> f64 {
        self.restitution.min(other.restitution)
    }

    /// Get the friction coefficient between this material and another.
    ///
    /// It is computed as the average between the two materials' coefficients.
    #[inline]
    pub fn friction_with(&self, other: &Self) -> f64 {
        (self.friction + other.friction) / 2.0
    }
}

/// Mass or moment of inertia of a body, which can be infinite.
///
/// This stores both a mass value and its inverse, because calculating inverse mass
/// is expensive and needed a lot in physics calculations.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Mass {
    Finite { mass: f64, inverse: f64 },
    Infinite,
}

impl From<f64> for Mass {
    #[inline]
    fn from(mass: f64) -> Self {
        Mass::Finite {
            mass,
            inverse: 1.0 / mass,
        }
    }
}

impl Mass {
    /// Get the inverse of the mass, which is zero if the mass is infinite.
    #[inline]
    pub fn inv(&self) -> f64 {
        match self {
            Mass::Finite { inverse, .. } => *inverse,
            Mass::Infinite => 0.0,
        }
    }

    /// Get the mass, if it's finite.
    #[inline]
    pub fn value(&self) -> Option<f64> {
        match self {
            Mass::Finite { mass, .. } => Some(*mass),
            Mass::Infinite => None,
        }
    }
}

/// Parameters for creating a body with [`World::create_body`][crate::physics::World::create_body].
#[derive(Clone, Copy, Debug)]
pub struct BodyParams {
    pub body_type: BodyType,
    pub pose: PoseBuilder,
    pub velocity: Velocity,
    pub material: Material,
}

impl Default for BodyParams {
    fn default() -> Self {
        Self::new_dynamic()
    }
}

impl BodyParams {
    #[inline]
    pub fn new(body_type: BodyType) -> Self {
        Self {
            body_type,
            pose: PoseBuilder::new(),
            velocity: Velocity::default(),
            material: Material::default(),
        }
    }

    #[inline]
    pub fn new_dynamic() -> Self {
        Self::new(BodyType::Dynamic)
    }

    #[inline]
    pub fn new_kinematic() -> Self {
        Self::new(BodyType::Kinematic)
    }

    #[inline]
    pub fn new_static() -> Self {
        Self::new(BodyType::Static)
    }

    #[inline]
    pub fn with_pose(mut self, pose: impl Into<PoseBuilder>) -> Self {
        self.pose = pose.into();
        self
    }

    #[inline]
    pub fn with_position(mut self, pos: impl Into<[f64; 2]>) -> Self {
        self.pose = self.pose.with_position(pos);
        self
    }

    #[inline]
    pub fn with_rotation(mut self, angle: Angle) -> Self {
        self.pose = self.pose.with_rotation(angle);
        self
    }

    #[inline]
    pub fn with_velocity(mut self, vel: Velocity) -> Self {
        self.velocity = vel;
        self
    }

    #[inline]
    pub fn with_material(mut self, material: Material) -> Self {
        self.material = material;
        self
    }

    #[inline]
    pub fn with_density(mut self, density: f64) -> Self {
        self.material.density = density;
        self
    }

    #[inline]
    pub fn with_restitution(mut self, restitution: f64) -> Self {
        self.material.restitution = restitution;
        self
    }

    #[inline]
    pub fn with_friction(mut self, friction: f64) -> Self {
        self.material.friction = friction;
        self
    }
}

/// A rigid body with a single shape.
///
/// Bodies are owned by a [`World`][crate::physics::World]
/// and accessed through the [`BodyKey`][crate::physics::BodyKey] it gives out.
/// Rotation and moment of inertia are around the body's origin,
/// i.e. the translation of its pose.
#[derive(Clone, Copy, Debug)]
pub struct Body {
    pub pose: m::Pose,
    pub velocity: Velocity,
    body_type: BodyType,
    shape: Shape,
    material: Material,
    mass: Mass,
    moment_of_inertia: Mass,
    force: m::Vec2,
    torque: f64,
}

impl Body {
    pub(crate) fn new(params: BodyParams, shape: Shape) -> Self {
        let (mass, moment_of_inertia) = match params.body_type {
            BodyType::Static | BodyType::Kinematic => (Mass::Infinite, Mass::Infinite),
            BodyType::Dynamic => {
                let md = shape.mass_data(params.material.density);
                if md.mass > 0.0 && md.mass.is_finite() && md.inertia > 0.0 {
                    (Mass::from(md.mass), Mass::from(md.inertia))
                } else {
                    log::warn!(
                        "dynamic body has no finite positive mass (got {}), treating it as immovable",
                        md.mass
                    );
                    (Mass::Infinite, Mass::Infinite)
                }
            }
        };
        let velocity = match params.body_type {
            BodyType::Static => Velocity::default(),
            _ => params.velocity,
        };

        Self {
            pose: params.pose.build(),
            velocity,
            body_type: params.body_type,
            shape,
            material: params.material,
            mass,
            moment_of_inertia,
            force: m::Vec2::zero(),
            torque: 0.0,
        }
    }

    #[inline]
    pub fn body_type(&self) -> BodyType {
        self.body_type
    }

    #[inline]
    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    #[inline]
    pub fn material(&self) -> &Material {
        &self.material
    }

    #[inline]
    pub fn mass(&self) -> Mass {
        self.mass
    }

    #[inline]
    pub fn moment_of_inertia(&self) -> Mass {
        self.moment_of_inertia
    }

    #[inline]
    pub fn inverse_mass(&self) -> f64 {
        self.mass.inv()
    }

    #[inline]
    pub fn inverse_moment_of_inertia(&self) -> f64 {
        self.moment_of_inertia.inv()
    }

    /// Check whether the body has finite mass or moment of inertia, allowing forces to have an
    /// effect on it.
    #[inline]
    pub fn sees_forces(&self) -> bool {
        !matches!(
            (self.mass, self.moment_of_inertia),
            (Mass::Infinite, Mass::Infinite)
        )
    }

    /// Bounding box of the body's shape at its current pose.
    #[inline]
    pub fn aabb(&self) -> AABB {
        self.shape.compute_aabb(&self.pose)
    }

    /// Accumulate a force through the center of mass, applied on the next update.
    #[inline]
    pub fn apply_force(&mut self, force: m::Vec2) {
        self.force += force;
    }

    /// Accumulate a force applied at a world-space point, which may also cause torque.
    pub fn apply_force_at(&mut self, force: m::Vec2, point: m::Vec2) {
        self.force += force;
        self.torque += m::cross(point - self.pose.translation, force);
    }

    #[inline]
    pub fn apply_torque(&mut self, torque: f64) {
        self.torque += torque;
    }

    /// Immediately change velocity by an impulse applied at a world-space point.
    pub fn apply_impulse(&mut self, impulse: m::Vec2, point: m::Vec2) {
        if self.body_type != BodyType::Dynamic {
            return;
        }
        self.velocity.linear += impulse * self.mass.inv();
        self.velocity.angular +=
            m::cross(point - self.pose.translation, impulse) * self.moment_of_inertia.inv();
    }

    /// Immediately change angular velocity by an angular impulse.
    pub fn apply_angular_impulse(&mut self, impulse: f64) {
        if self.body_type != BodyType::Dynamic {
            return;
        }
        self.velocity.angular += impulse * self.moment_of_inertia.inv();
    }

    #[inline]
    pub(crate) fn take_force_and_torque(&mut self) -> (m::Vec2, f64) {
        let ft = (self.force, self.torque);
        self.force = m::Vec2::zero();
        self.torque = 0.0;
        ft
    }

    /// Check whether the body's shape collides with `other` placed at the world point `at`.
    ///
    /// A zero-radius circle makes this a point test.
    pub fn collides_with(&self, other: &Shape, at: m::Vec2) -> bool {
        let other_pose = m::Pose::new(at, m::Rotor2::identity());
        collide_shapes(&self.shape, &self.pose, other, &other_pose).is_some()
    }

    /// Check whether a world-space point is inside the body's shape.
    #[inline]
    pub fn contains_point(&self, point: m::Vec2) -> bool {
        self.aabb().contains_point(point) && point_in_shape(point, &self.pose, &self.shape)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::collision::{Circle, Edge, Polygon};
    use std::f64::consts::PI;

    #[test]
    fn mass_from_shape_and_density() {
        let body = Body::new(
            BodyParams::new_dynamic().with_density(5.0),
            Circle::new(2.0).into(),
        );
        let mass = body.mass().value().unwrap();
        assert!((mass - 5.0 * PI * 4.0).abs() < 1e-9);
        assert!((body.inverse_mass() - 1.0 / mass).abs() < 1e-12);
        assert!((body.moment_of_inertia().value().unwrap() - 0.5 * mass * 4.0).abs() < 1e-9);
        assert!(body.sees_forces());
    }

    #[test]
    fn static_and_massless_bodies_are_immovable() {
        let fixed = Body::new(
            BodyParams::new_static().with_velocity(Velocity {
                linear: m::Vec2::new(1.0, 0.0),
                angular: 1.0,
            }),
            Polygon::rect(1.0, 1.0).into(),
        );
        assert_eq!(fixed.inverse_mass(), 0.0);
        assert_eq!(fixed.inverse_moment_of_inertia(), 0.0);
        assert_eq!(fixed.velocity.linear, m::Vec2::zero());

        let edge = Body::new(
            BodyParams::new_dynamic(),
            Edge::new(m::Vec2::new(0.0, 0.0), m::Vec2::new(1.0, 0.0)).into(),
        );
        assert_eq!(edge.mass(), Mass::Infinite);
        assert!(!edge.sees_forces());

        let weightless = Body::new(BodyParams::new_dynamic().with_density(0.0), Circle::new(1.0).into());
        assert_eq!(weightless.mass(), Mass::Infinite);
    }

    #[test]
    fn off_center_impulse_spins() {
        let mut body = Body::new(BodyParams::new_dynamic(), Polygon::rect(1.0, 1.0).into());
        body.apply_impulse(m::Vec2::new(0.0, 1.0), m::Vec2::new(1.0, 0.0));
        assert!(body.velocity.linear.y > 0.0);
        assert!(body.velocity.angular > 0.0);

        let spin = body.velocity.angular;
        body.apply_angular_impulse(-2.0);
        let expected = spin - 2.0 * body.inverse_moment_of_inertia();
        assert!((body.velocity.angular - expected).abs() < 1e-12);

        let mut kinematic = Body::new(BodyParams::new_kinematic(), Polygon::rect(1.0, 1.0).into());
        kinematic.apply_impulse(m::Vec2::new(0.0, 1.0), m::Vec2::new(1.0, 0.0));
        kinematic.apply_angular_impulse(1.0);
        assert_eq!(kinematic.velocity, Velocity::default());
    }

    #[test]
    fn forces_accumulate_until_taken() {
        let mut body = Body::new(BodyParams::new_dynamic(), Circle::new(1.0).into());
        body.apply_force(m::Vec2::new(1.0, 0.0));
        body.apply_force_at(m::Vec2::new(0.0, 2.0), m::Vec2::new(1.0, 0.0));
        body.apply_torque(0.5);
        let (f, t) = body.take_force_and_torque();
        assert_eq!(f, m::Vec2::new(1.0, 2.0));
        assert_eq!(t, 2.5);
        assert_eq!(body.take_force_and_torque(), (m::Vec2::zero(), 0.0));
    }

    #[test]
    fn point_queries() {
        let body = Body::new(
            BodyParams::new_static().with_position([3.0, 0.0]),
            Circle::new(1.0).into(),
        );
        let point = Shape::Circle(Circle::new(0.0));
        assert!(body.collides_with(&point, m::Vec2::new(3.5, 0.5)));
        assert!(!body.collides_with(&point, m::Vec2::new(1.0, 0.0)));
        assert!(body.contains_point(m::Vec2::new(3.5, 0.5)));
    }
}
