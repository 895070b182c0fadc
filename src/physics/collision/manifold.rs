use crate::math as m;

/// A point where two shapes touch.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ContactPoint {
    /// World-space position, midway between the two surfaces along the manifold normal.
    pub point: m::Vec2,
    /// Penetration depth at this point, positive when overlapping.
    pub depth: f64,
}

/// 1-2 points of contact can occur between two overlapping 2D shapes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ContactPoints {
    One(ContactPoint),
    Two(ContactPoint, ContactPoint),
}

impl ContactPoints {
    pub fn iter(&self) -> ContactPointIter<'_> {
        ContactPointIter { cp: self, idx: 0 }
    }

    #[inline]
    pub fn len(&self) -> usize {
        match self {
            ContactPoints::One(_) => 1,
            ContactPoints::Two(..) => 2,
        }
    }

    /// Execute a function on every point.
    pub fn map(self, f: impl Fn(ContactPoint) -> ContactPoint) -> Self {
        match self {
            ContactPoints::One(c) => ContactPoints::One(f(c)),
            ContactPoints::Two(c1, c2) => ContactPoints::Two(f(c1), f(c2)),
        }
    }

    /// Build from a slice of zero to two points. Extra points are ignored.
    pub(crate) fn from_slice(points: &[ContactPoint]) -> Option<Self> {
        match points {
            [] => None,
            [c] => Some(ContactPoints::One(*c)),
            [c1, c2, ..] => Some(ContactPoints::Two(*c1, *c2)),
        }
    }
}

/// An iterator over the points in [`ContactPoints`][self::ContactPoints].
pub struct ContactPointIter<'a> {
    cp: &'a ContactPoints,
    idx: u8,
}
impl<'a> Iterator for ContactPointIter<'a> {
    type Item = &'a ContactPoint;

    fn next(&mut self) -> Option<Self::Item> {
        use ContactPoints::*;
        let item = match (self.cp, self.idx) {
            (One(c), 0) => Some(c),
            (One(_), _) => None,
            (Two(c1, _), 0) => Some(c1),
            (Two(_, c2), 1) => Some(c2),
            (Two(_, _), _) => None,
        };
        if item.is_some() {
            self.idx += 1;
        }
        item
    }
}

/// The result of a narrow phase test between two overlapping shapes.
///
/// Non-overlapping pairs produce no manifold at all,
/// so a `Manifold` always describes an actual collision.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Manifold {
    /// Collision normal, pointing from the first shape towards the second.
    pub normal: m::Unit<m::Vec2>,
    /// Deepest penetration among the contact points.
    pub depth: f64,
    pub points: ContactPoints,
}

impl Manifold {
    /// Build a manifold whose depth is the deepest of its points.
    pub(crate) fn new(normal: m::Unit<m::Vec2>, points: ContactPoints) -> Self {
        let depth = points
            .iter()
            .map(|p| p.depth)
            .fold(f64::NEG_INFINITY, f64::max);
        Self {
            normal,
            depth,
            points,
        }
    }

    /// The same manifold as seen with the shapes swapped.
    /// Points are shared between the shapes so only the normal changes.
    #[inline]
    pub fn flipped(self) -> Self {
        Self {
            normal: -self.normal,
            ..self
        }
    }
}
