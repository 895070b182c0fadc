//! Boolean overlap tests.
//!
//! These answer the same question as `collide_*(..).is_some()`
//! but skip computing contact points wherever the answer is decided early.

use super::{
    narrowphase::{self as np, EPS},
    shape::{Capsule, Circle, Polygon, Shape},
};
use crate::math::Pose;

/// Check whether two shapes overlap. Edges never overlap each other.
pub fn overlap_shapes(s1: &Shape, xf1: &Pose, s2: &Shape, xf2: &Pose) -> bool {
    match (s1, s2) {
        (Shape::Circle(c), other) => overlap_circle_shape(c, xf1, other, xf2),
        (other, Shape::Circle(c)) => overlap_circle_shape(c, xf2, other, xf1),
        (Shape::Edge(_), Shape::Edge(_)) => false,
        (Shape::Edge(e), Shape::Polygon(p)) => overlap_polygons(&e.as_polygon(), xf1, p, xf2),
        (Shape::Polygon(p), Shape::Edge(e)) => overlap_polygons(&e.as_polygon(), xf2, p, xf1),
        (Shape::Edge(e), Shape::Capsule(c)) => {
            overlap_polygon_capsule(&e.as_polygon(), xf1, c, xf2)
        }
        (Shape::Capsule(c), Shape::Edge(e)) => {
            overlap_polygon_capsule(&e.as_polygon(), xf2, c, xf1)
        }
        (Shape::Polygon(p1), Shape::Polygon(p2)) => overlap_polygons(p1, xf1, p2, xf2),
        (Shape::Polygon(p), Shape::Capsule(c)) => overlap_polygon_capsule(p, xf1, c, xf2),
        (Shape::Capsule(c), Shape::Polygon(p)) => overlap_polygon_capsule(p, xf2, c, xf1),
        (Shape::Capsule(c1), Shape::Capsule(c2)) => overlap_capsules(c1, xf1, c2, xf2),
    }
}

pub fn overlap_circles(c1: &Circle, xf1: &Pose, c2: &Circle, xf2: &Pose) -> bool {
    let dist_sq = (*xf2 * c2.center - *xf1 * c1.center).mag_sq();
    let r_sum = c1.radius + c2.radius;
    dist_sq < r_sum * r_sum
}

pub fn overlap_circle_shape(circle: &Circle, xf_circle: &Pose, shape: &Shape, xf_shape: &Pose) -> bool {
    let poly = match shape {
        Shape::Circle(other) => return overlap_circles(circle, xf_circle, other, xf_shape),
        other => match other.as_polygon() {
            Some(p) => p.transformed(xf_shape),
            None => return false,
        },
    };
    let center = *xf_circle * circle.center;
    let r_sum = poly.radius() + circle.radius;

    let (face, separation) = np::max_face_separation(&poly, center);
    if separation >= r_sum {
        return false;
    }
    let v1 = poly.vertices()[face];
    let v2 = poly.vertices()[(face + 1) % poly.vertex_count()];
    if (center - v1).dot(v2 - v1) < 0.0 && separation > EPS {
        (center - v1).mag_sq() < r_sum * r_sum
    } else if (center - v2).dot(v1 - v2) < 0.0 && separation > EPS {
        (center - v2).mag_sq() < r_sum * r_sum
    } else {
        true
    }
}

/// Separated pairs are rejected by the separating axis test alone.
/// Pairs that pass it go through the full contact computation,
/// since clipping decides whether a near-touching rounded pair actually overlaps.
pub fn overlap_polygons(p1: &Polygon, xf1: &Pose, p2: &Polygon, xf2: &Pose) -> bool {
    let poly_a = p1.transformed(xf1);
    let poly_b = p2.transformed(xf2);
    let radius = poly_a.radius() + poly_b.radius();
    if np::find_max_separation(&poly_a, &poly_b).1 >= radius
        || np::find_max_separation(&poly_b, &poly_a).1 >= radius
    {
        return false;
    }
    np::collide_polygons(p1, xf1, p2, xf2).is_some()
}

pub fn overlap_capsules(c1: &Capsule, xf1: &Pose, c2: &Capsule, xf2: &Pose) -> bool {
    let sd = np::segment_distance(*xf1 * c1.start, *xf1 * c1.end, *xf2 * c2.start, *xf2 * c2.end);
    let radius = c1.radius + c2.radius;
    sd.distance_sq < radius * radius
}

#[inline]
pub fn overlap_polygon_capsule(poly: &Polygon, xf_poly: &Pose, capsule: &Capsule, xf_capsule: &Pose) -> bool {
    overlap_polygons(poly, xf_poly, &capsule.as_polygon(), xf_capsule)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        math as m,
        physics::collision::{narrowphase::collide_shapes, shape::Edge},
    };
    use rand::{Rng, SeedableRng};

    #[test]
    fn agrees_with_collide() {
        let mut rng = rand::rngs::StdRng::seed_from_u64(1234);
        let shapes = [
            Shape::Circle(Circle::new(0.5)),
            Shape::Circle(Circle::new(0.3).with_center(m::Vec2::new(0.2, 0.1))),
            Shape::Polygon(Polygon::rect(0.6, 0.3)),
            Shape::Polygon(Polygon::regular(6, 0.5).rounded(0.05)),
            Shape::Capsule(Capsule::horizontal(0.5, 0.2)),
            Shape::Edge(Edge::new(m::Vec2::new(-1.5, 0.0), m::Vec2::new(1.5, 0.0))),
        ];
        let mut overlapping = 0;
        for _ in 0..3000 {
            let s1 = shapes[rng.gen_range(0..shapes.len())];
            let s2 = shapes[rng.gen_range(0..shapes.len())];
            let pose = |rng: &mut rand::rngs::StdRng| {
                m::Pose::new(
                    m::Vec2::new(rng.gen_range(-1.2..1.2), rng.gen_range(-1.2..1.2)),
                    m::Rotor2::from_angle(rng.gen_range(-3.1..3.1)),
                )
            };
            let xf1 = pose(&mut rng);
            let xf2 = pose(&mut rng);
            let overlaps = overlap_shapes(&s1, &xf1, &s2, &xf2);
            assert_eq!(
                overlaps,
                collide_shapes(&s1, &xf1, &s2, &xf2).is_some(),
                "{:?} at {:?} vs {:?} at {:?}",
                s1,
                xf1,
                s2,
                xf2
            );
            if overlaps {
                overlapping += 1;
            }
        }
        assert!(overlapping > 100);
    }

    #[test]
    fn simple_cases() {
        let c = Circle::new(1.0);
        let origin = m::Pose::identity();
        let far = m::Pose::new(m::Vec2::new(3.0, 0.0), m::Rotor2::identity());
        assert!(!overlap_circles(&c, &origin, &c, &far));
        let near = m::Pose::new(m::Vec2::new(1.5, 0.0), m::Rotor2::identity());
        assert!(overlap_circles(&c, &origin, &c, &near));

        let rect = Shape::Polygon(Polygon::rect(1.0, 1.0));
        assert!(overlap_shapes(&rect, &origin, &Shape::Circle(c), &near));
        assert!(!overlap_shapes(&rect, &origin, &Shape::Circle(c), &far));
    }
}
