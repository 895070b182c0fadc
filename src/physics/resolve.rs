//! Resolving a single contact between two bodies outside of a world step,
//! e.g. for custom game logic or fixing up a body that was moved by hand.

use super::{
    body::Body,
    collision::Manifold,
    solver::{self, ContactConstraint, SolverBody, SolverParams},
};

const MAX_VELOCITY_PASSES: usize = 32;
// impulse change below which the velocity solve is considered converged
const CONVERGED_IMPULSE: f64 = 1e-12;

fn solver_body(body: &Body) -> SolverBody {
    SolverBody {
        pose: body.pose,
        velocity: body.velocity,
        inv_mass: body.inverse_mass(),
        inv_inertia: body.inverse_moment_of_inertia(),
    }
}

fn write_back(body: &mut Body, sb: &SolverBody) {
    body.pose = sb.pose;
    body.velocity = sb.velocity;
}

/// Push two overlapping bodies apart by the full penetration depth,
/// split by their relative inverse masses. Velocities are not touched.
///
/// Does nothing if neither body can move.
pub fn static_resolve(a: &mut Body, b: &mut Body, manifold: &Manifold) {
    let mut bodies = [solver_body(a), solver_body(b)];
    let [sa, sb] = &mut bodies;
    solver::separate(sa, sb, *manifold.normal, manifold.depth);
    write_back(a, &bodies[0]);
    write_back(b, &bodies[1]);
}

/// Apply collision impulses and a positional correction to two colliding bodies,
/// with the default [`SolverParams`][super::SolverParams].
///
/// `manifold` must have been computed with `a` as the first shape.
#[inline]
pub fn dynamic_resolve(a: &mut Body, b: &mut Body, manifold: &Manifold) {
    dynamic_resolve_with(a, b, manifold, &SolverParams::default());
}

/// Apply collision impulses and a positional correction to two colliding bodies.
///
/// Impulses are iterated until the contact points stop approaching each other.
/// Restitution is the smaller of the two bodies' coefficients
/// and is ignored for approach speeds below `params.restitution_threshold`.
pub fn dynamic_resolve_with(a: &mut Body, b: &mut Body, manifold: &Manifold, params: &SolverParams) {
    let mut bodies = [solver_body(a), solver_body(b)];
    let friction = a.material().friction_with(b.material());
    let restitution = a.material().restitution_with(b.material());

    let mut constraint =
        ContactConstraint::new([0, 1], manifold, friction, restitution, params, &bodies);
    for _ in 0..MAX_VELOCITY_PASSES {
        if constraint.solve_velocity(&mut bodies) <= CONVERGED_IMPULSE {
            break;
        }
    }

    let correction = solver::baumgarte_correction(manifold.depth, params);
    let [sa, sb] = &mut bodies;
    solver::separate(sa, sb, *manifold.normal, correction);

    write_back(a, &bodies[0]);
    write_back(b, &bodies[1]);
}
