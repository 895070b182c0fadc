//! Sequential impulse contact solver.
//!
//! Works on flat buffers of [`SolverBody`] indexed the same way as the world's body list,
//! so the same code serves both world steps and one-off pair resolution.

use super::{
    collision::{collide_shapes, Manifold, Shape},
    Velocity,
};
use crate::math as m;

/// Tuning parameters for contact resolution.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(
    feature = "serde-types",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct SolverParams {
    /// Fraction of the remaining penetration removed per position iteration.
    pub baumgarte: f64,
    /// Penetration allowed without positional correction.
    /// Keeps resting contacts from jittering in and out of contact.
    pub linear_slop: f64,
    /// Upper bound for a single positional correction.
    pub max_correction: f64,
    /// Approach speed below which collisions are treated as inelastic.
    pub restitution_threshold: f64,
    /// Start each contact from the impulses it ended the previous step with.
    /// Needed for stacks to come to rest.
    pub warm_starting: bool,
}

impl Default for SolverParams {
    fn default() -> Self {
        Self {
            baumgarte: 0.2,
            linear_slop: 0.01,
            max_correction: 0.2,
            restitution_threshold: 1.0,
            warm_starting: true,
        }
    }
}

/// Working state of a body during a solve.
#[derive(Clone, Copy, Debug)]
pub(crate) struct SolverBody {
    pub pose: m::Pose,
    pub velocity: Velocity,
    pub inv_mass: f64,
    pub inv_inertia: f64,
}

impl SolverBody {
    #[inline]
    fn apply_impulse(&mut self, impulse: m::Vec2, offset: m::Vec2, sign: f64) {
        self.velocity.linear += sign * self.inv_mass * impulse;
        self.velocity.angular += sign * self.inv_inertia * m::cross(offset, impulse);
    }
}

// block solving is skipped when the two points are too close to tell apart
const MAX_CONDITION_NUMBER: f64 = 1000.0;

/// Accumulated impulse at one contact point,
/// carried from one step to the next to warm start the solver.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde-types", derive(serde::Serialize, serde::Deserialize))]
pub struct ContactImpulse {
    pub normal: f64,
    pub tangent: f64,
}

#[derive(Clone, Copy, Debug, Default)]
struct ConstraintPoint {
    // from each body's origin to the contact point
    offsets: [m::Vec2; 2],
    normal_mass: f64,
    tangent_mass: f64,
    velocity_bias: f64,
    normal_impulse: f64,
    tangent_impulse: f64,
}

/// A contact manifold prepared for the velocity solver.
#[derive(Clone, Copy, Debug)]
pub(crate) struct ContactConstraint {
    pub bodies: [usize; 2],
    normal: m::Vec2,
    tangent: m::Vec2,
    friction: f64,
    points: [ConstraintPoint; 2],
    point_count: usize,
    block: Option<BlockMass>,
}

/// Normal effective mass matrix of a two-point contact and its inverse.
#[derive(Clone, Copy, Debug)]
struct BlockMass {
    k11: f64,
    k12: f64,
    k22: f64,
    inv11: f64,
    inv12: f64,
    inv22: f64,
}

impl BlockMass {
    fn new(
        a: &SolverBody,
        b: &SolverBody,
        points: &[ConstraintPoint; 2],
        normal: m::Vec2,
    ) -> Option<Self> {
        let [p1, p2] = points;
        let rn_a1 = m::cross(p1.offsets[0], normal);
        let rn_b1 = m::cross(p1.offsets[1], normal);
        let rn_a2 = m::cross(p2.offsets[0], normal);
        let rn_b2 = m::cross(p2.offsets[1], normal);
        let inv_mass = a.inv_mass + b.inv_mass;

        let k11 = inv_mass + a.inv_inertia * rn_a1 * rn_a1 + b.inv_inertia * rn_b1 * rn_b1;
        let k22 = inv_mass + a.inv_inertia * rn_a2 * rn_a2 + b.inv_inertia * rn_b2 * rn_b2;
        let k12 = inv_mass + a.inv_inertia * rn_a1 * rn_a2 + b.inv_inertia * rn_b1 * rn_b2;
        let det = k11 * k22 - k12 * k12;
        if k11 * k11 >= MAX_CONDITION_NUMBER * det {
            return None;
        }
        let inv_det = 1.0 / det;
        Some(Self {
            k11,
            k12,
            k22,
            inv11: k22 * inv_det,
            inv12: -k12 * inv_det,
            inv22: k11 * inv_det,
        })
    }
}

impl ContactConstraint {
    /// Compute effective masses and restitution targets from the bodies' current state.
    pub fn new(
        bodies: [usize; 2],
        manifold: &Manifold,
        friction: f64,
        restitution: f64,
        params: &SolverParams,
        solver_bodies: &[SolverBody],
    ) -> Self {
        let a = &solver_bodies[bodies[0]];
        let b = &solver_bodies[bodies[1]];
        let normal = *manifold.normal;
        let tangent = m::right_normal(normal);

        let mut points = [ConstraintPoint::default(); 2];
        let mut point_count = 0;
        for (cp, contact) in points.iter_mut().zip(manifold.points.iter()) {
            let r_a = contact.point - a.pose.translation;
            let r_b = contact.point - b.pose.translation;
            let effective_mass = |dir: m::Vec2| {
                let rn_a = m::cross(r_a, dir);
                let rn_b = m::cross(r_b, dir);
                let k = a.inv_mass
                    + b.inv_mass
                    + a.inv_inertia * rn_a * rn_a
                    + b.inv_inertia * rn_b * rn_b;
                if k > 0.0 {
                    1.0 / k
                } else {
                    0.0
                }
            };

            let rel_vel = b.velocity.point_velocity(r_b) - a.velocity.point_velocity(r_a);
            let vn = rel_vel.dot(normal);
            *cp = ConstraintPoint {
                offsets: [r_a, r_b],
                normal_mass: effective_mass(normal),
                tangent_mass: effective_mass(tangent),
                velocity_bias: if vn < -params.restitution_threshold {
                    -restitution * vn
                } else {
                    0.0
                },
                normal_impulse: 0.0,
                tangent_impulse: 0.0,
            };
            point_count += 1;
        }

        let block = if point_count == 2 {
            BlockMass::new(a, b, &points, normal)
        } else {
            None
        };

        Self {
            bodies,
            normal,
            tangent,
            friction,
            points,
            point_count,
            block,
        }
    }

    /// Start from impulses accumulated during an earlier step and apply them to the bodies.
    /// Must be called after [`new`][Self::new],
    /// so that restitution is based on the incoming velocity.
    pub fn warm_start(&mut self, impulses: &[ContactImpulse], solver_bodies: &mut [SolverBody]) {
        let [a, b] = map_pair(solver_bodies, self.bodies);
        for (cp, acc) in self.points[..self.point_count].iter_mut().zip(impulses) {
            cp.normal_impulse = acc.normal;
            cp.tangent_impulse = acc.tangent;
            let impulse = acc.normal * self.normal + acc.tangent * self.tangent;
            a.apply_impulse(impulse, cp.offsets[0], -1.0);
            b.apply_impulse(impulse, cp.offsets[1], 1.0);
        }
    }

    /// The impulses accumulated so far, one per contact point.
    pub fn impulses(&self) -> [ContactImpulse; 2] {
        let mut out = [ContactImpulse::default(); 2];
        for (acc, cp) in out.iter_mut().zip(&self.points[..self.point_count]) {
            *acc = ContactImpulse {
                normal: cp.normal_impulse,
                tangent: cp.tangent_impulse,
            };
        }
        out
    }

    /// One pass of the velocity solver over this contact.
    /// Returns the largest impulse change, which approaches zero as the solve converges.
    pub fn solve_velocity(&mut self, solver_bodies: &mut [SolverBody]) -> f64 {
        let [a, b] = map_pair(solver_bodies, self.bodies);
        let mut max_change: f64 = 0.0;

        // friction first so that the normal constraint has the last word
        for cp in &mut self.points[..self.point_count] {
            let [r_a, r_b] = cp.offsets;
            let rel_vel = b.velocity.point_velocity(r_b) - a.velocity.point_velocity(r_a);
            let vt = rel_vel.dot(self.tangent);
            let max_friction = (self.friction * cp.normal_impulse).max(0.0);
            let new_impulse =
                (cp.tangent_impulse - cp.tangent_mass * vt).clamp(-max_friction, max_friction);
            let lambda = new_impulse - cp.tangent_impulse;
            cp.tangent_impulse = new_impulse;

            let impulse = lambda * self.tangent;
            a.apply_impulse(impulse, r_a, -1.0);
            b.apply_impulse(impulse, r_b, 1.0);
            max_change = max_change.max(lambda.abs());
        }

        let block = self.block;
        let normal_change = match block {
            Some(block) => self.solve_normal_block(&block, a, b),
            None => self.solve_normal_sequential(a, b),
        };
        max_change.max(normal_change)
    }

    fn solve_normal_sequential(&mut self, a: &mut SolverBody, b: &mut SolverBody) -> f64 {
        let mut max_change: f64 = 0.0;
        for cp in &mut self.points[..self.point_count] {
            let [r_a, r_b] = cp.offsets;
            let rel_vel = b.velocity.point_velocity(r_b) - a.velocity.point_velocity(r_a);
            let vn = rel_vel.dot(self.normal);
            // accumulated impulse can only push
            let new_impulse =
                (cp.normal_impulse - cp.normal_mass * (vn - cp.velocity_bias)).max(0.0);
            let lambda = new_impulse - cp.normal_impulse;
            cp.normal_impulse = new_impulse;

            let impulse = lambda * self.normal;
            a.apply_impulse(impulse, r_a, -1.0);
            b.apply_impulse(impulse, r_b, 1.0);
            max_change = max_change.max(lambda.abs());
        }
        max_change
    }

    /// Solve both normal impulses of a two-point contact at once
    /// as a linear complementarity problem: find impulses x >= 0
    /// with resulting normal velocities vn >= 0 and x_i * vn_i = 0.
    /// Tries each combination of active points in turn.
    fn solve_normal_block(&mut self, k: &BlockMass, a: &mut SolverBody, b: &mut SolverBody) -> f64 {
        let [cp1, cp2] = &mut self.points;
        let normal_velocity = |cp: &ConstraintPoint, a: &SolverBody, b: &SolverBody| {
            let [r_a, r_b] = cp.offsets;
            (b.velocity.point_velocity(r_b) - a.velocity.point_velocity(r_a)).dot(self.normal)
        };

        let acc = [cp1.normal_impulse, cp2.normal_impulse];
        // velocities the accumulated impulses are solving against
        let b1 =
            normal_velocity(cp1, a, b) - cp1.velocity_bias - (k.k11 * acc[0] + k.k12 * acc[1]);
        let b2 =
            normal_velocity(cp2, a, b) - cp2.velocity_bias - (k.k12 * acc[0] + k.k22 * acc[1]);

        let both = [
            -(k.inv11 * b1 + k.inv12 * b2),
            -(k.inv12 * b1 + k.inv22 * b2),
        ];
        let first_only = [-cp1.normal_mass * b1, 0.0];
        let second_only = [0.0, -cp2.normal_mass * b2];
        let solution = if both[0] >= 0.0 && both[1] >= 0.0 {
            Some(both)
        } else if first_only[0] >= 0.0 && k.k12 * first_only[0] + b2 >= 0.0 {
            Some(first_only)
        } else if second_only[1] >= 0.0 && k.k12 * second_only[1] + b1 >= 0.0 {
            Some(second_only)
        } else if b1 >= 0.0 && b2 >= 0.0 {
            Some([0.0, 0.0])
        } else {
            None
        };
        let x = match solution {
            Some(x) => x,
            None => return 0.0,
        };

        let d = [x[0] - acc[0], x[1] - acc[1]];
        for (cp, lambda) in [&*cp1, &*cp2].into_iter().zip(d) {
            let impulse = lambda * self.normal;
            a.apply_impulse(impulse, cp.offsets[0], -1.0);
            b.apply_impulse(impulse, cp.offsets[1], 1.0);
        }
        cp1.normal_impulse = x[0];
        cp2.normal_impulse = x[1];
        d[0].abs().max(d[1].abs())
    }
}

/// Move two bodies apart along the normal by `correction`, split by inverse mass.
pub(crate) fn separate(a: &mut SolverBody, b: &mut SolverBody, normal: m::Vec2, correction: f64) {
    let inv_sum = a.inv_mass + b.inv_mass;
    if inv_sum <= 0.0 || correction <= 0.0 {
        return;
    }
    let per_inv_mass = normal * (correction / inv_sum);
    a.pose.translation -= per_inv_mass * a.inv_mass;
    b.pose.translation += per_inv_mass * b.inv_mass;
}

/// Baumgarte-style positional correction for a single manifold.
#[inline]
pub(crate) fn baumgarte_correction(depth: f64, params: &SolverParams) -> f64 {
    (params.baumgarte * (depth - params.linear_slop))
        .min(params.max_correction)
        .max(0.0)
}

/// One pass of positional correction over the given pairs,
/// recomputing each contact at the bodies' current poses.
pub(crate) fn correct_positions(
    pairs: &[[usize; 2]],
    shapes: &[Shape],
    solver_bodies: &mut [SolverBody],
    params: &SolverParams,
) {
    for &pair in pairs {
        let [i, j] = pair;
        let manifold = match collide_shapes(
            &shapes[i],
            &solver_bodies[i].pose,
            &shapes[j],
            &solver_bodies[j].pose,
        ) {
            Some(manifold) => manifold,
            None => continue,
        };
        let correction = baumgarte_correction(manifold.depth, params);
        let [a, b] = map_pair(solver_bodies, pair);
        separate(a, b, *manifold.normal, correction);
    }
}

/// Mutable references to two distinct elements of a slice.
pub(crate) fn map_pair<T>(slice: &mut [T], [i, j]: [usize; 2]) -> [&mut T; 2] {
    assert!(i != j, "a body can't be paired with itself");
    if i < j {
        let (head, tail) = slice.split_at_mut(j);
        [&mut head[i], &mut tail[0]]
    } else {
        let (head, tail) = slice.split_at_mut(i);
        [&mut tail[0], &mut head[j]]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::collision::{Circle, Polygon};

    fn body(x: f64, y: f64, vel: m::Vec2, inv_mass: f64) -> SolverBody {
        SolverBody {
            pose: m::Pose::new(m::Vec2::new(x, y), m::Rotor2::identity()),
            velocity: Velocity {
                linear: vel,
                angular: 0.0,
            },
            inv_mass,
            inv_inertia: inv_mass * 2.0,
        }
    }

    #[test]
    fn map_pair_either_order() {
        let mut v = [1, 2, 3, 4];
        let [a, b] = map_pair(&mut v, [3, 1]);
        std::mem::swap(a, b);
        assert_eq!(v, [1, 4, 3, 2]);
    }

    #[test]
    fn head_on_collision_stops_approach() {
        let shapes = [Shape::Circle(Circle::new(1.0)), Shape::Circle(Circle::new(1.0))];
        let mut bodies = [
            body(0.0, 0.0, m::Vec2::new(2.0, 0.0), 1.0),
            body(1.9, 0.0, m::Vec2::new(-3.0, 0.0), 0.5),
        ];
        let manifold =
            collide_shapes(&shapes[0], &bodies[0].pose, &shapes[1], &bodies[1].pose).unwrap();
        let params = SolverParams::default();
        let mut c = ContactConstraint::new([0, 1], &manifold, 0.0, 0.0, &params, &bodies);
        c.solve_velocity(&mut bodies);

        let rel = bodies[1].velocity.linear - bodies[0].velocity.linear;
        assert!(rel.x.abs() < 1e-9);
        // momentum is conserved: m_a = 1, m_b = 2
        let momentum = bodies[0].velocity.linear.x + 2.0 * bodies[1].velocity.linear.x;
        assert!((momentum - (2.0 - 6.0)).abs() < 1e-9);
    }

    #[test]
    fn restitution_reflects_fast_approach() {
        let shapes = [Shape::Polygon(Polygon::rect(5.0, 0.5)), Shape::Circle(Circle::new(0.5))];
        let mut bodies = [
            body(0.0, 0.0, m::Vec2::zero(), 0.0),
            body(0.0, 0.9, m::Vec2::new(0.0, -5.0), 1.0),
        ];
        let manifold =
            collide_shapes(&shapes[0], &bodies[0].pose, &shapes[1], &bodies[1].pose).unwrap();
        let params = SolverParams::default();
        let mut c = ContactConstraint::new([0, 1], &manifold, 0.4, 1.0, &params, &bodies);
        for _ in 0..4 {
            c.solve_velocity(&mut bodies);
        }
        assert!((bodies[1].velocity.linear.y - 5.0).abs() < 1e-9);
        assert_eq!(bodies[0].velocity.linear, m::Vec2::zero());

        // below the threshold the bounce is dropped
        let mut slow = bodies;
        slow[1].velocity.linear = m::Vec2::new(0.0, -0.5);
        let mut c = ContactConstraint::new([0, 1], &manifold, 0.4, 1.0, &params, &slow);
        c.solve_velocity(&mut slow);
        assert!(slow[1].velocity.linear.y.abs() < 1e-9);
    }

    // a box landing flat and spinning slowly, so its two points approach at different speeds
    fn landing_box() -> ([SolverBody; 2], Manifold) {
        let shapes = [
            Shape::Polygon(Polygon::rect(5.0, 0.5)),
            Shape::Polygon(Polygon::rect(1.0, 0.5)),
        ];
        let mut bodies = [
            body(0.0, 0.0, m::Vec2::zero(), 0.0),
            body(0.0, 0.99, m::Vec2::new(0.0, -2.0), 1.0),
        ];
        bodies[1].velocity.angular = 0.5;
        let manifold =
            collide_shapes(&shapes[0], &bodies[0].pose, &shapes[1], &bodies[1].pose).unwrap();
        (bodies, manifold)
    }

    fn normal_velocities(c: &ContactConstraint, bodies: &[SolverBody]) -> Vec<f64> {
        c.points[..c.point_count]
            .iter()
            .map(|cp| {
                let va = bodies[c.bodies[0]].velocity.point_velocity(cp.offsets[0]);
                let vb = bodies[c.bodies[1]].velocity.point_velocity(cp.offsets[1]);
                (vb - va).dot(c.normal)
            })
            .collect()
    }

    #[test]
    fn two_point_contact_solved_in_one_pass() {
        let (mut bodies, manifold) = landing_box();
        assert_eq!(manifold.points.len(), 2);
        let params = SolverParams::default();
        let mut c = ContactConstraint::new([0, 1], &manifold, 0.0, 0.0, &params, &bodies);
        assert!(c.block.is_some());
        c.solve_velocity(&mut bodies);

        for vn in normal_velocities(&c, &bodies) {
            assert!(vn.abs() < 1e-9, "point still moving at {}", vn);
        }
        assert!(bodies[1].velocity.angular.abs() < 1e-9);
        let [i1, i2] = c.impulses();
        assert!((i1.normal + i2.normal - 2.0).abs() < 1e-9);
        assert!(i1.normal > 0.0 && i2.normal > 0.0);
    }

    #[test]
    fn warm_start_applies_stored_impulses() {
        let (mut bodies, manifold) = landing_box();
        let params = SolverParams::default();
        let mut solved = bodies;
        let mut c = ContactConstraint::new([0, 1], &manifold, 0.0, 0.0, &params, &solved);
        c.solve_velocity(&mut solved);
        let stored = c.impulses();

        let mut warm = ContactConstraint::new([0, 1], &manifold, 0.0, 0.0, &params, &bodies);
        warm.warm_start(&stored, &mut bodies);
        assert_eq!(warm.impulses(), stored);
        for vn in normal_velocities(&warm, &bodies) {
            assert!(vn.abs() < 1e-9);
        }
        // nothing left to do
        assert!(warm.solve_velocity(&mut bodies) < 1e-9);
    }

    #[test]
    fn correction_leaves_slop_and_is_capped() {
        let params = SolverParams::default();
        assert_eq!(baumgarte_correction(0.005, &params), 0.0);
        assert!((baumgarte_correction(0.11, &params) - 0.02).abs() < 1e-12);
        assert_eq!(baumgarte_correction(10.0, &params), params.max_correction);

        let mut a = body(0.0, 0.0, m::Vec2::zero(), 0.0);
        let mut b = body(0.0, 1.0, m::Vec2::zero(), 1.0);
        separate(&mut a, &mut b, m::Vec2::new(0.0, 1.0), 0.1);
        assert_eq!(a.pose.translation, m::Vec2::zero());
        assert!((b.pose.translation.y - 1.1).abs() < 1e-12);
    }
}
