//! Geometric primitives that bodies are made of.
//!
//! Shapes are defined in body-local space and placed in the world by a [`Pose`][m::Pose].
//! Nothing here mutates a shape when it's transformed; world-space copies are made instead.

use super::AABB;
use crate::math as m;

/// Maximum number of vertices in a [`Polygon`][self::Polygon].
///
/// Keeping polygons fixed-size lets every shape be `Copy`
/// and keeps the narrow phase free of allocations.
pub const MAX_POLYGON_VERTICES: usize = 8;

/// Error when constructing a shape from invalid parameters.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq)]
pub enum ShapeError {
    #[error("A polygon needs at least 3 vertices, got {0}")]
    TooFewVertices(usize),
    #[error("A polygon can have at most {max} vertices, got {0}", max = MAX_POLYGON_VERTICES)]
    TooManyVertices(usize),
    #[error("Polygon edge starting at vertex {0} has zero length")]
    DegenerateEdge(usize),
    #[error("Radius must be positive and finite, got {0}")]
    InvalidRadius(f64),
}

fn check_radius(radius: f64) -> Result<f64, ShapeError> {
    if radius.is_finite() && radius > 0.0 {
        Ok(radius)
    } else {
        Err(ShapeError::InvalidRadius(radius))
    }
}

/// Mass properties of a shape with a given density.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MassData {
    pub mass: f64,
    /// Center of mass in local space.
    pub center: m::Vec2,
    /// Moment of inertia around the local origin (not the center of mass),
    /// since bodies rotate around their pose's translation.
    pub inertia: f64,
}

impl MassData {
    const ZERO: Self = MassData {
        mass: 0.0,
        center: m::Vec2 { x: 0.0, y: 0.0 },
        inertia: 0.0,
    };
}

//
// Circle
//

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Circle {
    /// Offset of the center from the body origin.
    pub center: m::Vec2,
    pub radius: f64,
}

impl Circle {
    /// A circle centered on the body origin.
    #[inline]
    pub fn new(radius: f64) -> Self {
        Self {
            center: m::Vec2::zero(),
            radius,
        }
    }

    /// Like [`new`][Self::new], but rejects non-positive and non-finite radii.
    pub fn try_new(radius: f64) -> Result<Self, ShapeError> {
        check_radius(radius).map(Self::new)
    }

    #[inline]
    pub fn with_center(mut self, center: m::Vec2) -> Self {
        self.center = center;
        self
    }
}

//
// Capsule
//

/// A line segment with thickness, i.e. a rectangle with semicircle caps.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Capsule {
    pub start: m::Vec2,
    pub end: m::Vec2,
    pub radius: f64,
}

impl Capsule {
    #[inline]
    pub fn new(start: m::Vec2, end: m::Vec2, radius: f64) -> Self {
        Self { start, end, radius }
    }

    /// Like [`new`][Self::new], but rejects non-positive and non-finite radii.
    pub fn try_new(start: m::Vec2, end: m::Vec2, radius: f64) -> Result<Self, ShapeError> {
        check_radius(radius).map(|r| Self::new(start, end, r))
    }

    /// A capsule along the local x axis, centered on the body origin.
    #[inline]
    pub fn horizontal(half_length: f64, radius: f64) -> Self {
        Self::new(
            m::Vec2::new(-half_length, 0.0),
            m::Vec2::new(half_length, 0.0),
            radius,
        )
    }

    /// View the capsule as a two-vertex polygon with a rounding radius.
    #[inline]
    pub fn as_polygon(&self) -> Polygon {
        Polygon::from_segment(self.start, self.end, self.radius)
    }
}

//
// Edge
//

/// A two-sided line segment with no interior, used for static boundary walls.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Edge {
    pub start: m::Vec2,
    pub end: m::Vec2,
}

impl Edge {
    #[inline]
    pub fn new(start: m::Vec2, end: m::Vec2) -> Self {
        Self { start, end }
    }

    /// View the edge as a two-vertex polygon.
    #[inline]
    pub fn as_polygon(&self) -> Polygon {
        Polygon::from_segment(self.start, self.end, 0.0)
    }
}

//
// Polygon
//

/// A convex polygon with counter-clockwise winding,
/// optionally rounded by a radius.
///
/// Convexity is the caller's responsibility and is not checked.
/// Collision results for concave polygons are unspecified (but never panic).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Polygon {
    vertices: [m::Vec2; MAX_POLYGON_VERTICES],
    // outward unit normal of the edge from vertex i to vertex i+1
    normals: [m::Vec2; MAX_POLYGON_VERTICES],
    count: usize,
    radius: f64,
    centroid: m::Vec2,
}

impl Polygon {
    /// Create a polygon from convex vertices.
    ///
    /// Clockwise input is accepted and reversed.
    pub fn new(points: &[m::Vec2]) -> Result<Self, ShapeError> {
        if points.len() < 3 {
            return Err(ShapeError::TooFewVertices(points.len()));
        }
        if points.len() > MAX_POLYGON_VERTICES {
            return Err(ShapeError::TooManyVertices(points.len()));
        }
        let count = points.len();
        let mut vertices = [m::Vec2::zero(); MAX_POLYGON_VERTICES];
        vertices[..count].copy_from_slice(points);

        if signed_area(&vertices[..count]) < 0.0 {
            log::warn!("polygon vertices were given clockwise, reversing");
            vertices[..count].reverse();
        }

        for i in 0..count {
            let edge = vertices[(i + 1) % count] - vertices[i];
            if edge.mag_sq() <= f64::EPSILON * f64::EPSILON {
                return Err(ShapeError::DegenerateEdge(i));
            }
        }

        Ok(Self::from_ccw(&vertices[..count], 0.0))
    }

    /// An axis-aligned rectangle centered on the origin, given its half extents.
    pub fn rect(half_width: f64, half_height: f64) -> Self {
        Self::from_ccw(
            &[
                m::Vec2::new(-half_width, -half_height),
                m::Vec2::new(half_width, -half_height),
                m::Vec2::new(half_width, half_height),
                m::Vec2::new(-half_width, half_height),
            ],
            0.0,
        )
    }

    /// A regular polygon with its vertices on a circle of the given radius.
    /// The side count is clamped between 3 and [`MAX_POLYGON_VERTICES`][self::MAX_POLYGON_VERTICES].
    pub fn regular(sides: usize, radius: f64) -> Self {
        let sides = sides.clamp(3, MAX_POLYGON_VERTICES);
        let mut vertices = [m::Vec2::zero(); MAX_POLYGON_VERTICES];
        for (i, v) in vertices[..sides].iter_mut().enumerate() {
            let angle = std::f64::consts::TAU * i as f64 / sides as f64;
            *v = radius * m::Vec2::new(angle.cos(), angle.sin());
        }
        Self::from_ccw(&vertices[..sides], 0.0)
    }

    /// Round the corners of the polygon by the given radius.
    #[inline]
    pub fn rounded(mut self, radius: f64) -> Self {
        self.radius = radius.max(0.0);
        self
    }

    /// A degenerate two-vertex polygon, used to run capsules and edges through the polygon code.
    pub(crate) fn from_segment(start: m::Vec2, end: m::Vec2, radius: f64) -> Self {
        let normal = m::Unit::try_new_normalize(m::right_normal(end - start), m::Unit::unit_y());
        let mut vertices = [m::Vec2::zero(); MAX_POLYGON_VERTICES];
        let mut normals = [m::Vec2::zero(); MAX_POLYGON_VERTICES];
        vertices[0] = start;
        vertices[1] = end;
        normals[0] = *normal;
        normals[1] = -*normal;
        Self {
            vertices,
            normals,
            count: 2,
            radius,
            centroid: (start + end) * 0.5,
        }
    }

    // assumes counter-clockwise order and non-degenerate edges
    fn from_ccw(points: &[m::Vec2], radius: f64) -> Self {
        let count = points.len();
        let mut vertices = [m::Vec2::zero(); MAX_POLYGON_VERTICES];
        let mut normals = [m::Vec2::zero(); MAX_POLYGON_VERTICES];
        vertices[..count].copy_from_slice(points);
        for i in 0..count {
            let edge = vertices[(i + 1) % count] - vertices[i];
            normals[i] = *m::Unit::try_new_normalize(m::right_normal(edge), m::Unit::unit_y());
        }
        Self {
            vertices,
            normals,
            count,
            radius,
            centroid: centroid(points),
        }
    }

    #[inline]
    pub fn vertices(&self) -> &[m::Vec2] {
        &self.vertices[..self.count]
    }

    #[inline]
    pub fn normals(&self) -> &[m::Vec2] {
        &self.normals[..self.count]
    }

    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.count
    }

    /// Rounding radius, zero for sharp polygons.
    #[inline]
    pub fn radius(&self) -> f64 {
        self.radius
    }

    #[inline]
    pub fn centroid(&self) -> m::Vec2 {
        self.centroid
    }

    /// Index of the core vertex farthest along `dir`.
    pub(crate) fn support_index(&self, dir: m::Vec2) -> usize {
        let mut best = 0;
        let mut best_dot = self.vertices[0].dot(dir);
        for (i, v) in self.vertices().iter().enumerate().skip(1) {
            let d = v.dot(dir);
            if d > best_dot {
                best = i;
                best_dot = d;
            }
        }
        best
    }

    /// The point on the (rounded) polygon farthest along `dir`.
    pub fn support(&self, dir: m::Vec2) -> m::Vec2 {
        let core = self.vertices[self.support_index(dir)];
        if self.radius > 0.0 {
            core + self.radius * *m::Unit::try_new_normalize(dir, m::Unit::unit_y())
        } else {
            core
        }
    }

    /// A copy of the polygon with vertices and normals moved by `pose`.
    pub fn transformed(&self, pose: &m::Pose) -> Self {
        let mut out = *self;
        for i in 0..self.count {
            out.vertices[i] = *pose * self.vertices[i];
            out.normals[i] = pose.rotation * self.normals[i];
        }
        out.centroid = *pose * self.centroid;
        out
    }

    fn mass_data(&self, density: f64) -> MassData {
        if self.count < 3 {
            return MassData::ZERO;
        }
        let mut vertices = self.vertices;
        if self.radius > 0.0 {
            // approximate the rounded shape by pushing corners out along their bisectors
            const SQRT_2: f64 = std::f64::consts::SQRT_2;
            for i in 0..self.count {
                let prev = if i == 0 { self.count - 1 } else { i - 1 };
                let mid = m::Unit::try_new_normalize(
                    self.normals[prev] + self.normals[i],
                    m::Unit::new_unchecked(self.normals[i]),
                );
                vertices[i] = self.vertices[i] + SQRT_2 * self.radius * *mid;
            }
        }

        // fan triangulation around the first vertex
        let origin = vertices[0];
        let mut area = 0.0;
        let mut center = m::Vec2::zero();
        let mut rot_inertia = 0.0;
        for i in 1..self.count - 1 {
            let e1 = vertices[i] - origin;
            let e2 = vertices[i + 1] - origin;
            let d = m::cross(e1, e2);
            let tri_area = 0.5 * d;
            area += tri_area;
            center += tri_area / 3.0 * (e1 + e2);
            let intx2 = e1.x * e1.x + e2.x * e1.x + e2.x * e2.x;
            let inty2 = e1.y * e1.y + e2.y * e1.y + e2.y * e2.y;
            rot_inertia += (0.25 / 3.0 * d) * (intx2 + inty2);
        }
        if area <= 0.0 {
            return MassData::ZERO;
        }

        let mass = density * area;
        let center = center / area;
        let mass_center = origin + center;
        // inertia around the first vertex -> around the centroid -> around the body origin
        let inertia_centroid = density * rot_inertia - mass * center.mag_sq();
        MassData {
            mass,
            center: mass_center,
            inertia: inertia_centroid + mass * mass_center.mag_sq(),
        }
    }

    fn area(&self) -> f64 {
        let core = signed_area(self.vertices()).abs();
        if self.radius > 0.0 {
            let perimeter: f64 = (0..self.count)
                .map(|i| (self.vertices[(i + 1) % self.count] - self.vertices[i]).mag())
                .sum();
            core + perimeter * self.radius + std::f64::consts::PI * self.radius * self.radius
        } else {
            core
        }
    }
}

fn signed_area(points: &[m::Vec2]) -> f64 {
    let n = points.len();
    (0..n)
        .map(|i| m::cross(points[i], points[(i + 1) % n]))
        .sum::<f64>()
        * 0.5
}

fn centroid(points: &[m::Vec2]) -> m::Vec2 {
    let n = points.len();
    let average = points.iter().fold(m::Vec2::zero(), |acc, p| acc + *p) / n as f64;
    let area = signed_area(points);
    if area.abs() <= f64::EPSILON {
        return average;
    }
    // relative to the average to keep precision far from the origin
    let mut c = m::Vec2::zero();
    for i in 0..n {
        let p1 = points[i] - average;
        let p2 = points[(i + 1) % n] - average;
        c += m::cross(p1, p2) * (p1 + p2);
    }
    average + c / (6.0 * area)
}

//
// Shape
//

/// The geometry of a body. The set of shapes is closed,
/// so collision dispatch is an exhaustive match over pairs of variants.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Shape {
    Circle(Circle),
    Capsule(Capsule),
    Polygon(Polygon),
    Edge(Edge),
}

impl From<Circle> for Shape {
    fn from(c: Circle) -> Self {
        Shape::Circle(c)
    }
}
impl From<Capsule> for Shape {
    fn from(c: Capsule) -> Self {
        Shape::Capsule(c)
    }
}
impl From<Polygon> for Shape {
    fn from(p: Polygon) -> Self {
        Shape::Polygon(p)
    }
}
impl From<Edge> for Shape {
    fn from(e: Edge) -> Self {
        Shape::Edge(e)
    }
}

impl Shape {
    /// Rounding radius around the shape's core geometry.
    #[inline]
    pub fn radius(&self) -> f64 {
        match self {
            Shape::Circle(c) => c.radius,
            Shape::Capsule(c) => c.radius,
            Shape::Polygon(p) => p.radius,
            Shape::Edge(_) => 0.0,
        }
    }

    /// The shape as a polygon, if it has straight sides.
    pub(crate) fn as_polygon(&self) -> Option<Polygon> {
        match self {
            Shape::Circle(_) => None,
            Shape::Capsule(c) => Some(c.as_polygon()),
            Shape::Polygon(p) => Some(*p),
            Shape::Edge(e) => Some(e.as_polygon()),
        }
    }

    /// Axis-aligned bounding box of the shape placed at `pose`.
    pub fn compute_aabb(&self, pose: &m::Pose) -> AABB {
        match self {
            Shape::Circle(c) => {
                let center = *pose * c.center;
                AABB::from_points([center]).padded(c.radius)
            }
            Shape::Capsule(c) => AABB::from_points([*pose * c.start, *pose * c.end]).padded(c.radius),
            Shape::Polygon(p) => {
                AABB::from_points(p.vertices().iter().map(|v| *pose * *v)).padded(p.radius)
            }
            Shape::Edge(e) => AABB::from_points([*pose * e.start, *pose * e.end]),
        }
    }

    /// The point on the shape farthest along `dir`, both in local space.
    pub fn support(&self, dir: m::Vec2) -> m::Vec2 {
        let unit_dir = || *m::Unit::try_new_normalize(dir, m::Unit::unit_y());
        match self {
            Shape::Circle(c) => c.center + c.radius * unit_dir(),
            Shape::Capsule(c) => {
                let end = if c.end.dot(dir) > c.start.dot(dir) {
                    c.end
                } else {
                    c.start
                };
                end + c.radius * unit_dir()
            }
            Shape::Polygon(p) => p.support(dir),
            Shape::Edge(e) => {
                if e.end.dot(dir) > e.start.dot(dir) {
                    e.end
                } else {
                    e.start
                }
            }
        }
    }

    /// The point on the shape placed at `pose` farthest along the world-space `dir`.
    #[inline]
    pub fn support_world(&self, pose: &m::Pose, dir: m::Vec2) -> m::Vec2 {
        *pose * self.support(pose.rotation.reversed() * dir)
    }

    /// A world-space copy of the shape placed at `pose`.
    pub fn transformed(&self, pose: &m::Pose) -> Shape {
        match self {
            Shape::Circle(c) => Shape::Circle(Circle {
                center: *pose * c.center,
                radius: c.radius,
            }),
            Shape::Capsule(c) => Shape::Capsule(Capsule {
                start: *pose * c.start,
                end: *pose * c.end,
                radius: c.radius,
            }),
            Shape::Polygon(p) => Shape::Polygon(p.transformed(pose)),
            Shape::Edge(e) => Shape::Edge(Edge {
                start: *pose * e.start,
                end: *pose * e.end,
            }),
        }
    }

    pub fn area(&self) -> f64 {
        use std::f64::consts::PI;
        match self {
            Shape::Circle(c) => PI * c.radius * c.radius,
            Shape::Capsule(c) => 2.0 * c.radius * (c.end - c.start).mag() + PI * c.radius * c.radius,
            Shape::Polygon(p) => p.area(),
            Shape::Edge(_) => 0.0,
        }
    }

    /// Mass, center of mass and moment of inertia for the given density.
    /// Edges have no area and thus no mass.
    pub fn mass_data(&self, density: f64) -> MassData {
        use std::f64::consts::PI;
        match self {
            Shape::Circle(c) => {
                let mass = density * PI * c.radius * c.radius;
                MassData {
                    mass,
                    center: c.center,
                    inertia: mass * (0.5 * c.radius * c.radius + c.center.mag_sq()),
                }
            }
            Shape::Capsule(c) => {
                let r = c.radius;
                let length = (c.end - c.start).mag();
                let box_mass = density * 2.0 * r * length;
                let circle_mass = density * PI * r * r;
                let mass = box_mass + circle_mass;
                let center = (c.start + c.end) * 0.5;
                // two half discs offset from the center by half the length,
                // each with its own centroid offset
                let lc = 4.0 * r / (3.0 * PI);
                let h = 0.5 * length;
                let circle_inertia = circle_mass * (0.5 * r * r + h * h + 2.0 * h * lc);
                let box_inertia = box_mass * (4.0 * r * r + length * length) / 12.0;
                MassData {
                    mass,
                    center,
                    inertia: circle_inertia + box_inertia + mass * center.mag_sq(),
                }
            }
            Shape::Polygon(p) => p.mass_data(density),
            Shape::Edge(_) => MassData::ZERO,
        }
    }
}
