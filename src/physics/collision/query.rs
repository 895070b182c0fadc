//! Intersection queries for points vs. shapes.

use super::{
    narrowphase::{self as np, closest_point_on_segment},
    shape::Shape,
};
use crate::math as m;

/// Check whether or not a point is inside a shape placed at `pose`.
///
/// Points exactly on the boundary are outside. Edges have no interior and contain nothing.
pub fn point_in_shape(point: m::Vec2, pose: &m::Pose, shape: &Shape) -> bool {
    let p_local = pose.inversed() * point;
    match shape {
        Shape::Circle(c) => (p_local - c.center).mag_sq() < c.radius * c.radius,
        Shape::Capsule(c) => {
            let closest = closest_point_on_segment(p_local, c.start, c.end);
            (p_local - closest).mag_sq() < c.radius * c.radius
        }
        Shape::Polygon(p) => {
            let (_, separation) = np::max_face_separation(p, p_local);
            if separation < 0.0 {
                return true;
            }
            let r = p.radius();
            if r <= 0.0 {
                return false;
            }
            // outside the core, but maybe within the rounding
            let verts = p.vertices();
            (0..verts.len()).any(|i| {
                let closest = closest_point_on_segment(p_local, verts[i], verts[(i + 1) % verts.len()]);
                (p_local - closest).mag_sq() < r * r
            })
        }
        Shape::Edge(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::collision::shape::{Capsule, Circle, Edge, Polygon};

    fn v(x: f64, y: f64) -> m::Vec2 {
        m::Vec2::new(x, y)
    }

    #[test]
    fn points_in_shapes() {
        let pose = m::Pose::new(v(2.0, 1.0), m::Angle::Deg(90.0).into());

        let rect = Shape::Polygon(Polygon::rect(2.0, 0.5));
        // rotated a quarter turn, the long side is vertical
        assert!(point_in_shape(v(2.0, 2.5), &pose, &rect));
        assert!(!point_in_shape(v(3.5, 1.0), &pose, &rect));

        let rounded = Shape::Polygon(Polygon::rect(1.0, 1.0).rounded(0.5));
        let id = m::Pose::identity();
        assert!(point_in_shape(v(1.3, 0.0), &id, &rounded));
        assert!(point_in_shape(v(1.3, 1.3), &id, &rounded));
        assert!(!point_in_shape(v(1.4, 1.4), &id, &rounded));

        let circle = Shape::Circle(Circle::new(1.0));
        assert!(point_in_shape(v(2.5, 1.5), &pose, &circle));
        assert!(!point_in_shape(v(3.1, 1.0), &pose, &circle));

        let cap = Shape::Capsule(Capsule::horizontal(1.0, 0.5));
        assert!(point_in_shape(v(1.4, 0.0), &id, &cap));
        assert!(!point_in_shape(v(1.0, 0.6), &id, &cap));

        let edge = Shape::Edge(Edge::new(v(-1.0, 0.0), v(1.0, 0.0)));
        assert!(!point_in_shape(v(0.0, 0.0), &id, &edge));
    }
}
