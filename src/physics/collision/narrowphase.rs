//! Exact collision tests between pairs of shapes, producing contact manifolds.
//!
//! Every routine works on world-space copies of the shapes
//! so that swapping the arguments replays the same arithmetic
//! and only flips the resulting normal.

use super::{
    manifold::{ContactPoint, ContactPoints, Manifold},
    shape::{Capsule, Circle, Polygon, Shape},
};
use crate::math::{self as m, Pose, Unit};

/// Distance tolerance for collision and resolution, in world units.
pub const LINEAR_SLOP: f64 = 0.005;

/// Tolerance used for comparing segment lengths and interval spans.
pub(super) const EPS: f64 = f64::EPSILON * 16.0;

/// Check two shapes for collision.
///
/// The returned normal points from `s1` to `s2`.
/// Mirrored pairs run the same routine as their canonical order
/// (circle, edge, polygon, capsule) and flip the result.
/// Edges are static walls and never collide with each other.
pub fn collide_shapes(s1: &Shape, xf1: &Pose, s2: &Shape, xf2: &Pose) -> Option<Manifold> {
    match (s1, s2) {
        (Shape::Circle(c1), Shape::Circle(c2)) => collide_circles(c1, xf1, c2, xf2),
        (Shape::Circle(c), other) => collide_circle_shape(c, xf1, other, xf2),
        (other, Shape::Circle(c)) => {
            collide_circle_shape(c, xf2, other, xf1).map(Manifold::flipped)
        }
        (Shape::Edge(_), Shape::Edge(_)) => None,
        (Shape::Edge(e), Shape::Polygon(p)) => collide_polygons(&e.as_polygon(), xf1, p, xf2),
        (Shape::Polygon(p), Shape::Edge(e)) => {
            collide_polygons(&e.as_polygon(), xf2, p, xf1).map(Manifold::flipped)
        }
        (Shape::Edge(e), Shape::Capsule(c)) => {
            collide_polygon_capsule(&e.as_polygon(), xf1, c, xf2)
        }
        (Shape::Capsule(c), Shape::Edge(e)) => {
            collide_polygon_capsule(&e.as_polygon(), xf2, c, xf1).map(Manifold::flipped)
        }
        (Shape::Polygon(p1), Shape::Polygon(p2)) => collide_polygons(p1, xf1, p2, xf2),
        (Shape::Polygon(p), Shape::Capsule(c)) => collide_polygon_capsule(p, xf1, c, xf2),
        (Shape::Capsule(c), Shape::Polygon(p)) => {
            collide_polygon_capsule(p, xf2, c, xf1).map(Manifold::flipped)
        }
        (Shape::Capsule(c1), Shape::Capsule(c2)) => collide_capsules(c1, xf1, c2, xf2),
    }
}

//
// CIRCLE <-> CIRCLE
//

/// Two circles collide if their centers are closer than the sum of their radii.
/// Touching exactly is not a collision.
pub fn collide_circles(c1: &Circle, xf1: &Pose, c2: &Circle, xf2: &Pose) -> Option<Manifold> {
    let pos1 = *xf1 * c1.center;
    let pos2 = *xf2 * c2.center;

    let dist = pos2 - pos1;
    let dist_sq = dist.mag_sq();
    let r_sum = c1.radius + c2.radius;
    if dist_sq >= r_sum * r_sum {
        return None;
    }

    let dist_mag = dist_sq.sqrt();
    // concentric circles have no meaningful direction, push along y
    let normal = Unit::try_new_normalize(dist, Unit::unit_y());
    let depth = r_sum - dist_mag;
    let surface1 = pos1 + c1.radius * *normal;
    let surface2 = pos2 - c2.radius * *normal;

    Some(Manifold::new(
        normal,
        ContactPoints::One(ContactPoint {
            point: (surface1 + surface2) * 0.5,
            depth,
        }),
    ))
}

//
// CIRCLE <-> ANYTHING
//

/// Collide a circle with any other shape. The normal points away from the circle.
pub fn collide_circle_shape(
    circle: &Circle,
    xf_circle: &Pose,
    shape: &Shape,
    xf_shape: &Pose,
) -> Option<Manifold> {
    match shape {
        Shape::Circle(other) => collide_circles(circle, xf_circle, other, xf_shape),
        other => {
            let poly = other.as_polygon()?.transformed(xf_shape);
            polygon_circle(&poly, *xf_circle * circle.center, circle.radius)
                .map(Manifold::flipped)
        }
    }
}

/// World-space polygon against a circle center. Normal points from the polygon to the circle.
fn polygon_circle(poly: &Polygon, center: m::Vec2, circle_r: f64) -> Option<Manifold> {
    let poly_r = poly.radius();
    let r_sum = poly_r + circle_r;

    let (face, separation) = max_face_separation(poly, center);
    if separation >= r_sum {
        return None;
    }

    let v1 = poly.vertices()[face];
    let v2 = poly.vertices()[(face + 1) % poly.vertex_count()];
    let u1 = (center - v1).dot(v2 - v1);
    let u2 = (center - v2).dot(v1 - v2);

    let vertex_region = if u1 < 0.0 && separation > EPS {
        Some(v1)
    } else if u2 < 0.0 && separation > EPS {
        Some(v2)
    } else {
        None
    };

    let (normal, surface_poly) = match vertex_region {
        Some(vert) => {
            let to_center = center - vert;
            if to_center.mag_sq() >= r_sum * r_sum {
                return None;
            }
            let normal = Unit::try_new_normalize(to_center, Unit::new_unchecked(poly.normals()[face]));
            (normal, vert + poly_r * *normal)
        }
        None => {
            let normal = Unit::new_unchecked(poly.normals()[face]);
            // project the center onto the rounded face
            (normal, center - (separation - poly_r) * *normal)
        }
    };
    let surface_circle = center - circle_r * *normal;
    let depth = (surface_poly - surface_circle).dot(*normal);
    if depth <= 0.0 {
        return None;
    }

    Some(Manifold::new(
        normal,
        ContactPoints::One(ContactPoint {
            point: (surface_poly + surface_circle) * 0.5,
            depth,
        }),
    ))
}

/// The face of `poly` that `point` is farthest outside of, and the distance to its line.
/// Negative when the point is inside the core polygon.
pub(super) fn max_face_separation(poly: &Polygon, point: m::Vec2) -> (usize, f64) {
    poly.vertices()
        .iter()
        .zip(poly.normals())
        .map(|(v, n)| n.dot(point - *v))
        .enumerate()
        .fold((0, f64::NEG_INFINITY), |best, (i, s)| {
            if s > best.1 {
                (i, s)
            } else {
                best
            }
        })
}

//
// POLYGON <-> POLYGON
//

/// Separating axis test between two (possibly rounded) convex polygons.
///
/// When the cores overlap, the face of maximum separation is the reference face
/// and the most anti-parallel face of the other polygon is clipped against it.
/// When only the rounded hulls overlap, the closest core features decide the contact.
pub fn collide_polygons(p1: &Polygon, xf1: &Pose, p2: &Polygon, xf2: &Pose) -> Option<Manifold> {
    let poly_a = p1.transformed(xf1);
    let poly_b = p2.transformed(xf2);
    let radius = poly_a.radius() + poly_b.radius();

    let (edge_a, sep_a) = find_max_separation(&poly_a, &poly_b);
    if sep_a >= radius {
        return None;
    }
    let (edge_b, sep_b) = find_max_separation(&poly_b, &poly_a);
    if sep_b >= radius {
        return None;
    }

    // prefer the first polygon as reference unless the second is clearly better
    let flip = sep_b > sep_a + 0.1 * LINEAR_SLOP;
    let (reference, ref_edge, incident, separation) = if flip {
        (&poly_b, edge_b, &poly_a, sep_b)
    } else {
        (&poly_a, edge_a, &poly_b, sep_a)
    };
    let inc_edge = incident_edge(incident, reference.normals()[ref_edge]);

    let manifold = if separation > 0.1 * LINEAR_SLOP {
        closest_features(reference, ref_edge, incident, inc_edge)
    } else {
        clip_incident_edge(reference, ref_edge, incident, inc_edge)
    }?;

    Some(if flip { manifold.flipped() } else { manifold })
}

/// Collide a polygon with a capsule by viewing the capsule as a rounded two-vertex polygon.
#[inline]
pub fn collide_polygon_capsule(
    poly: &Polygon,
    xf_poly: &Pose,
    capsule: &Capsule,
    xf_capsule: &Pose,
) -> Option<Manifold> {
    collide_polygons(poly, xf_poly, &capsule.as_polygon(), xf_capsule)
}

/// For every face normal of `p1`, the deepest point of `p2` below that face.
/// Returns the face where this is largest.
pub(super) fn find_max_separation(p1: &Polygon, p2: &Polygon) -> (usize, f64) {
    let mut best_edge = 0;
    let mut max_sep = f64::NEG_INFINITY;
    for (i, (n, v1)) in itertools::izip!(p1.normals(), p1.vertices()).enumerate() {
        let sep = p2
            .vertices()
            .iter()
            .map(|v2| n.dot(*v2 - *v1))
            .fold(f64::INFINITY, f64::min);
        if sep > max_sep {
            max_sep = sep;
            best_edge = i;
        }
    }
    (best_edge, max_sep)
}

/// The edge of `poly` whose normal is most anti-parallel to `ref_normal`.
fn incident_edge(poly: &Polygon, ref_normal: m::Vec2) -> usize {
    let mut edge = 0;
    let mut min_dot = f64::INFINITY;
    for (i, n) in poly.normals().iter().enumerate() {
        let d = n.dot(ref_normal);
        if d < min_dot {
            min_dot = d;
            edge = i;
        }
    }
    edge
}

#[inline]
fn edge_vertices(poly: &Polygon, edge: usize) -> (m::Vec2, m::Vec2) {
    let verts = poly.vertices();
    (verts[edge], verts[(edge + 1) % verts.len()])
}

/// Contact between polygons whose cores are separated but whose rounded hulls may touch.
fn closest_features(
    reference: &Polygon,
    ref_edge: usize,
    incident: &Polygon,
    inc_edge: usize,
) -> Option<Manifold> {
    let (v11, v12) = edge_vertices(reference, ref_edge);
    let (v21, v22) = edge_vertices(incident, inc_edge);
    let sd = segment_distance(v11, v12, v21, v22);
    let radius = reference.radius() + incident.radius();
    if sd.distance_sq >= radius * radius {
        return None;
    }

    let at_end = |f: f64| f == 0.0 || f == 1.0;
    if at_end(sd.fraction1) && at_end(sd.fraction2) {
        // vertex against vertex
        single_point_contact(
            &sd,
            reference.radius(),
            incident.radius(),
            Unit::new_unchecked(reference.normals()[ref_edge]),
        )
    } else {
        clip_incident_edge(reference, ref_edge, incident, inc_edge)
    }
}

/// Clip the incident edge against the side planes of the reference face,
/// keeping the points that lie below the (rounded) reference surface.
fn clip_incident_edge(
    reference: &Polygon,
    ref_edge: usize,
    incident: &Polygon,
    inc_edge: usize,
) -> Option<Manifold> {
    let r1 = reference.radius();
    let r2 = incident.radius();
    let (v11, v12) = edge_vertices(reference, ref_edge);
    let (v21, v22) = edge_vertices(incident, inc_edge);

    let normal = reference.normals()[ref_edge];
    let tangent = m::left_normal(normal);

    // reference face spans [lower1, upper1] along the tangent.
    // the incident edge winds the other way, so v22 is the lower end
    let lower1 = 0.0;
    let upper1 = (v12 - v11).dot(tangent);
    let upper2 = (v21 - v11).dot(tangent);
    let lower2 = (v22 - v11).dot(tangent);

    if upper2 < lower1 || lower2 > upper1 {
        // no overlap along the face, can only happen with degenerate two-vertex polygons
        let sd = segment_distance(v11, v12, v21, v22);
        let radius = r1 + r2;
        if sd.distance_sq >= radius * radius {
            return None;
        }
        return single_point_contact(&sd, r1, r2, Unit::new_unchecked(normal));
    }

    let span = upper2 - lower2;
    let v_lower = if lower2 < lower1 && span > EPS {
        v22 + (v21 - v22) * ((lower1 - lower2) / span)
    } else {
        v22
    };
    let v_upper = if upper2 > upper1 && span > EPS {
        v22 + (v21 - v22) * ((upper1 - lower2) / span)
    } else {
        v21
    };

    let radius = r1 + r2;
    let mut points = [ContactPoint {
        point: m::Vec2::zero(),
        depth: 0.0,
    }; 2];
    let mut count = 0;
    for v in [v_lower, v_upper] {
        let separation = (v - v11).dot(normal);
        let depth = radius - separation;
        if depth > 0.0 {
            points[count] = ContactPoint {
                // midway between the incident surface and the reference surface
                point: v + 0.5 * (r1 - r2 - separation) * normal,
                depth,
            };
            count += 1;
        }
    }

    let points = ContactPoints::from_slice(&points[..count])?;
    Some(Manifold::new(Unit::new_unchecked(normal), points))
}

//
// CAPSULE <-> CAPSULE
//

/// Capsules collide when their core segments are closer than the sum of their radii.
///
/// Crossing or parallel overlapping segments go through the polygon routine
/// to get a proper separating axis or a two-point manifold.
pub fn collide_capsules(c1: &Capsule, xf1: &Pose, c2: &Capsule, xf2: &Pose) -> Option<Manifold> {
    let (p1, q1) = (*xf1 * c1.start, *xf1 * c1.end);
    let (p2, q2) = (*xf2 * c2.start, *xf2 * c2.end);
    let radius = c1.radius + c2.radius;

    let sd = segment_distance(p1, q1, p2, q2);
    if sd.distance_sq >= radius * radius {
        return None;
    }

    let d1 = q1 - p1;
    let d2 = q2 - p2;
    let len1 = d1.mag();
    let len2 = d2.mag();
    let crossing = sd.distance_sq <= EPS * EPS;
    let parallel = len1 > EPS
        && len2 > EPS
        && m::cross(d1, d2).abs() <= 0.005 * len1 * len2
        && projections_overlap(p1, d1, len1, p2, q2);

    if crossing || parallel {
        return collide_polygons(&c1.as_polygon(), xf1, &c2.as_polygon(), xf2);
    }

    let fallback = Unit::try_new_normalize(m::right_normal(d1), Unit::unit_y());
    single_point_contact(&sd, c1.radius, c2.radius, fallback)
}

// whether segment p2-q2 projected onto the line of p1 + t*d1 overlaps the segment p1-(p1 + d1)
fn projections_overlap(p1: m::Vec2, d1: m::Vec2, len1: f64, p2: m::Vec2, q2: m::Vec2) -> bool {
    let u1 = d1 / len1;
    let fp2 = (p2 - p1).dot(u1);
    let fq2 = (q2 - p1).dot(u1);
    !((fp2 <= 0.0 && fq2 <= 0.0) || (fp2 >= len1 && fq2 >= len1))
}

//
// SEGMENT UTILS
//

/// Result of [`segment_distance`][self::segment_distance].
#[derive(Clone, Copy, Debug)]
pub(crate) struct SegmentDistance {
    pub closest1: m::Vec2,
    pub closest2: m::Vec2,
    /// Position of `closest1` along the first segment, 0 at its start and 1 at its end.
    pub fraction1: f64,
    pub fraction2: f64,
    pub distance_sq: f64,
}

/// Closest points between segments p1-q1 and p2-q2.
pub(crate) fn segment_distance(
    p1: m::Vec2,
    q1: m::Vec2,
    p2: m::Vec2,
    q2: m::Vec2,
) -> SegmentDistance {
    let d1 = q1 - p1;
    let d2 = q2 - p2;
    let r = p1 - p2;
    let dd1 = d1.dot(d1);
    let dd2 = d2.dot(d2);
    let rd1 = r.dot(d1);
    let rd2 = r.dot(d2);
    let eps_sq = EPS * EPS;

    let (f1, f2) = if dd1 < eps_sq || dd2 < eps_sq {
        // at least one segment is a point
        if dd1 >= eps_sq {
            ((-rd1 / dd1).clamp(0.0, 1.0), 0.0)
        } else if dd2 >= eps_sq {
            (0.0, (rd2 / dd2).clamp(0.0, 1.0))
        } else {
            (0.0, 0.0)
        }
    } else {
        let d12 = d1.dot(d2);
        let denom = dd1 * dd2 - d12 * d12;
        // parallel segments have no unique answer, start from the first one's start
        let f1 = if denom != 0.0 {
            ((d12 * rd2 - rd1 * dd2) / denom).clamp(0.0, 1.0)
        } else {
            0.0
        };
        let f2 = (d12 * f1 + rd2) / dd2;
        if f2 < 0.0 {
            ((-rd1 / dd1).clamp(0.0, 1.0), 0.0)
        } else if f2 > 1.0 {
            (((d12 - rd1) / dd1).clamp(0.0, 1.0), 1.0)
        } else {
            (f1, f2)
        }
    };

    let closest1 = p1 + f1 * d1;
    let closest2 = p2 + f2 * d2;
    SegmentDistance {
        closest1,
        closest2,
        fraction1: f1,
        fraction2: f2,
        distance_sq: (closest2 - closest1).mag_sq(),
    }
}

/// The point on segment a-b closest to `p`.
pub(crate) fn closest_point_on_segment(p: m::Vec2, a: m::Vec2, b: m::Vec2) -> m::Vec2 {
    let ab = b - a;
    let len_sq = ab.mag_sq();
    if len_sq <= EPS * EPS {
        return a;
    }
    let t = ((p - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    a + t * ab
}

/// A single contact between two rounded features given their closest core points.
fn single_point_contact(
    sd: &SegmentDistance,
    r1: f64,
    r2: f64,
    fallback_normal: Unit<m::Vec2>,
) -> Option<Manifold> {
    let normal = Unit::try_new_normalize(sd.closest2 - sd.closest1, fallback_normal);
    let depth = r1 + r2 - sd.distance_sq.sqrt();
    if depth <= 0.0 {
        return None;
    }
    let surface1 = sd.closest1 + r1 * *normal;
    let surface2 = sd.closest2 - r2 * *normal;
    Some(Manifold::new(
        normal,
        ContactPoints::One(ContactPoint {
            point: (surface1 + surface2) * 0.5,
            depth,
        }),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::collision::shape::Edge;
    use rand::{Rng, SeedableRng};

    const TOL: f64 = 1e-9;

    fn v(x: f64, y: f64) -> m::Vec2 {
        m::Vec2::new(x, y)
    }

    fn at(x: f64, y: f64) -> Pose {
        Pose::new(v(x, y), m::Rotor2::identity())
    }

    fn at_rot(x: f64, y: f64, deg: f64) -> Pose {
        Pose::new(v(x, y), m::Angle::Deg(deg).into())
    }

    fn close(a: m::Vec2, b: m::Vec2) -> bool {
        (a - b).mag() < 1e-6
    }

    fn assert_mirrored(s1: Shape, xf1: Pose, s2: Shape, xf2: Pose) {
        let m1 = collide_shapes(&s1, &xf1, &s2, &xf2).expect("shapes should collide");
        let m2 = collide_shapes(&s2, &xf2, &s1, &xf1).expect("mirrored shapes should collide");
        assert!(close(*m1.normal, -*m2.normal), "{:?} vs {:?}", m1, m2);
        assert!((m1.depth - m2.depth).abs() < TOL);
        assert_eq!(m1.points.len(), m2.points.len());
        for (p1, p2) in m1.points.iter().zip(m2.points.iter()) {
            assert!(close(p1.point, p2.point), "{:?} vs {:?}", m1, m2);
            assert!((p1.depth - p2.depth).abs() < TOL);
        }
    }

    #[test]
    fn separated_circles_dont_collide() {
        let c = Circle::new(1.0);
        assert!(collide_circles(&c, &at(0.0, 0.0), &c, &at(5.0, 0.0)).is_none());
        // exactly touching
        assert!(collide_circles(&c, &at(0.0, 0.0), &c, &at(2.0, 0.0)).is_none());
    }

    #[test]
    fn overlapping_circles() {
        let c = Circle::new(2.0);
        let m = collide_circles(&c, &at(0.0, 0.0), &c, &at(3.0, 0.0)).unwrap();
        assert_eq!(*m.normal, v(1.0, 0.0));
        assert!((m.depth - 1.0).abs() < TOL);
        match m.points {
            ContactPoints::One(p) => {
                assert!(close(p.point, v(1.5, 0.0)));
                assert!((p.depth - 1.0).abs() < TOL);
            }
            other => panic!("expected one point, got {:?}", other),
        }
    }

    #[test]
    fn concentric_circles_push_along_y() {
        let c = Circle::new(1.0);
        let m = collide_circles(&c, &at(1.0, 1.0), &c, &at(1.0, 1.0)).unwrap();
        assert_eq!(*m.normal, v(0.0, 1.0));
        assert!((m.depth - 2.0).abs() < TOL);
    }

    #[test]
    fn circle_resting_on_edge() {
        let edge = Shape::Edge(Edge::new(v(-5.0, 0.0), v(5.0, 0.0)));
        let ball = Shape::Circle(Circle::new(0.5));
        let m = collide_shapes(&edge, &at(0.0, 0.0), &ball, &at(0.0, 0.4)).unwrap();
        assert!(close(*m.normal, v(0.0, 1.0)));
        assert!((m.depth - 0.1).abs() < TOL);
        let p = m.points.iter().next().unwrap();
        assert!(close(p.point, v(0.0, -0.05)));

        // edges are two-sided
        let m = collide_shapes(&edge, &at(0.0, 0.0), &ball, &at(0.0, -0.4)).unwrap();
        assert!(close(*m.normal, v(0.0, -1.0)));
    }

    #[test]
    fn circle_against_polygon_corner() {
        let rect = Shape::Polygon(Polygon::rect(1.0, 1.0));
        let ball = Shape::Circle(Circle::new(1.0));
        // diagonal from the corner at (1, 1)
        let m = collide_shapes(&ball, &at(1.5, 1.5), &rect, &at(0.0, 0.0)).unwrap();
        let diag = std::f64::consts::FRAC_1_SQRT_2;
        assert!(close(*m.normal, v(-diag, -diag)));
        assert!((m.depth - (1.0 - 0.5 * std::f64::consts::SQRT_2)).abs() < TOL);
        assert!(collide_shapes(&ball, &at(1.8, 1.8), &rect, &at(0.0, 0.0)).is_none());
    }

    #[test]
    fn box_resting_on_box() {
        let b = Shape::Polygon(Polygon::rect(0.5, 0.5));
        let m = collide_shapes(&b, &at(0.0, 0.0), &b, &at(0.0, 0.9)).unwrap();
        assert!(close(*m.normal, v(0.0, 1.0)));
        assert!((m.depth - 0.1).abs() < TOL);
        assert_eq!(m.points.len(), 2);
        let mut xs: Vec<f64> = m.points.iter().map(|p| p.point.x).collect();
        xs.sort_by(|a, b| a.partial_cmp(b).unwrap());
        assert!((xs[0] + 0.5).abs() < TOL && (xs[1] - 0.5).abs() < TOL);
        for p in m.points.iter() {
            assert!((p.point.y - 0.45).abs() < TOL);
            assert!((p.depth - 0.1).abs() < TOL);
        }
    }

    #[test]
    fn tilted_box_clips_to_one_point() {
        let ground = Shape::Polygon(Polygon::rect(5.0, 0.5));
        let b = Shape::Polygon(Polygon::rect(0.5, 0.5));
        // corner pointing down, dipping 0.05 into the ground
        let h = 0.5 * std::f64::consts::SQRT_2;
        let m = collide_shapes(&ground, &at(0.0, 0.0), &b, &at_rot(0.0, 0.5 + h - 0.05, 45.0)).unwrap();
        assert!(close(*m.normal, v(0.0, 1.0)));
        assert_eq!(m.points.len(), 1);
        assert!((m.depth - 0.05).abs() < 1e-6);
    }

    #[test]
    fn capsule_lying_on_box() {
        let ground = Polygon::rect(2.0, 0.5);
        let cap = Capsule::horizontal(1.0, 0.25);
        let m = collide_polygon_capsule(&ground, &at(0.0, 0.0), &cap, &at(0.0, 0.7)).unwrap();
        assert!(close(*m.normal, v(0.0, 1.0)));
        assert!((m.depth - 0.05).abs() < TOL);
        assert_eq!(m.points.len(), 2);
        for p in m.points.iter() {
            assert!((p.point.y - 0.475).abs() < TOL);
            assert!((p.point.x.abs() - 1.0).abs() < TOL);
        }
    }

    #[test]
    fn crossed_and_end_to_end_capsules() {
        let cap = Capsule::horizontal(1.0, 0.2);
        // crossing at right angles
        let m = collide_capsules(&cap, &at(0.0, 0.0), &cap, &at_rot(0.0, 0.0, 90.0)).unwrap();
        assert!((m.normal.mag() - 1.0).abs() < TOL);
        assert!(m.depth > 0.0);

        // collinear, caps overlapping by 0.1
        let m = collide_capsules(&cap, &at(0.0, 0.0), &cap, &at(2.3, 0.0)).unwrap();
        assert!(close(*m.normal, v(1.0, 0.0)));
        assert!((m.depth - 0.1).abs() < TOL);
        assert!(close(m.points.iter().next().unwrap().point, v(1.15, 0.0)));

        assert!(collide_capsules(&cap, &at(0.0, 0.0), &cap, &at(0.0, 0.5)).is_none());
    }

    #[test]
    fn edges_never_collide_with_each_other() {
        let e = Shape::Edge(Edge::new(v(-1.0, 0.0), v(1.0, 0.0)));
        assert!(collide_shapes(&e, &at(0.0, 0.0), &e, &at(0.0, 0.0)).is_none());
    }

    #[test]
    fn mirrored_pairs_flip_normal() {
        let circle = Shape::Circle(Circle::new(0.5));
        let rect = Shape::Polygon(Polygon::rect(1.0, 0.5));
        let tri = Shape::Polygon(Polygon::regular(3, 0.8));
        let cap = Shape::Capsule(Capsule::horizontal(0.7, 0.3));
        let edge = Shape::Edge(Edge::new(v(-3.0, 0.0), v(3.0, 0.0)));

        assert_mirrored(circle, at(0.0, 0.0), Shape::Circle(Circle::new(1.0)), at(1.2, 0.3));
        assert_mirrored(circle, at(0.3, 0.8), rect, at_rot(0.0, 0.0, 10.0));
        assert_mirrored(circle, at(0.9, 0.2), cap, at(0.0, 0.0));
        assert_mirrored(circle, at(0.5, 0.3), edge, at(0.0, 0.0));
        assert_mirrored(rect, at(0.0, 0.0), tri, at_rot(0.4, 1.0, 20.0));
        assert_mirrored(rect, at(0.0, 0.0), cap, at_rot(0.2, 0.7, 30.0));
        assert_mirrored(edge, at(0.0, 0.0), rect, at_rot(0.5, 0.4, 15.0));
        assert_mirrored(edge, at(0.0, 0.0), cap, at_rot(0.0, 0.2, 25.0));
        assert_mirrored(cap, at(0.0, 0.0), cap, at_rot(0.5, 0.3, 60.0));
    }

    #[test]
    fn random_collisions_have_unit_normals() {
        let mut rng = rand::rngs::StdRng::seed_from_u64(7);
        let shapes = [
            Shape::Circle(Circle::new(0.6).with_center(v(0.1, 0.0))),
            Shape::Polygon(Polygon::rect(0.8, 0.4)),
            Shape::Polygon(Polygon::regular(5, 0.7).rounded(0.1)),
            Shape::Capsule(Capsule::horizontal(0.6, 0.3)),
            Shape::Edge(Edge::new(v(-2.0, 0.0), v(2.0, 0.0))),
        ];
        let mut hits = 0;
        for _ in 0..2000 {
            let s1 = shapes[rng.gen_range(0..shapes.len())];
            let s2 = shapes[rng.gen_range(0..shapes.len())];
            let xf1 = at_rot(rng.gen_range(-1.0..1.0), rng.gen_range(-1.0..1.0), rng.gen_range(-180.0..180.0));
            let xf2 = at_rot(rng.gen_range(-1.0..1.0), rng.gen_range(-1.0..1.0), rng.gen_range(-180.0..180.0));
            if let Some(m) = collide_shapes(&s1, &xf1, &s2, &xf2) {
                hits += 1;
                assert!((m.normal.mag() - 1.0).abs() < 1e-9, "{:?}", m);
                assert!(m.depth > 0.0 && m.depth.is_finite());
                for p in m.points.iter() {
                    assert!(p.point.x.is_finite() && p.point.y.is_finite());
                    assert!(p.depth > 0.0 && p.depth <= m.depth);
                }
            }
        }
        assert!(hits > 100);
    }

    #[test]
    fn segment_distance_regions() {
        let sd = segment_distance(v(0.0, 0.0), v(2.0, 0.0), v(1.0, 1.0), v(1.0, 3.0));
        assert!((sd.distance_sq - 1.0).abs() < TOL);
        assert!((sd.fraction1 - 0.5).abs() < TOL);
        assert_eq!(sd.fraction2, 0.0);

        let sd = segment_distance(v(0.0, 0.0), v(1.0, 0.0), v(2.0, 0.0), v(3.0, 0.0));
        assert_eq!(sd.fraction1, 1.0);
        assert_eq!(sd.fraction2, 0.0);

        assert_eq!(
            closest_point_on_segment(v(5.0, 1.0), v(0.0, 0.0), v(2.0, 0.0)),
            v(2.0, 0.0)
        );
    }
}
