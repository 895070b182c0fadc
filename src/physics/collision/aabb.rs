use crate::math as m;

/// An axis-aligned bounding box.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AABB {
    pub min: m::Vec2,
    pub max: m::Vec2,
}

impl AABB {
    #[inline]
    pub fn new(min: m::Vec2, max: m::Vec2) -> Self {
        Self { min, max }
    }

    /// The smallest box containing all the given points.
    /// Returns a degenerate box at the origin if there are no points.
    pub fn from_points(points: impl IntoIterator<Item = m::Vec2>) -> Self {
        let mut iter = points.into_iter();
        let first = match iter.next() {
            Some(p) => p,
            None => return Self::new(m::Vec2::zero(), m::Vec2::zero()),
        };
        iter.fold(Self::new(first, first), |aabb, p| Self {
            min: aabb.min.min_by_component(p),
            max: aabb.max.max_by_component(p),
        })
    }

    #[inline]
    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    #[inline]
    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }

    #[inline]
    pub fn center(&self) -> m::Vec2 {
        (self.min + self.max) * 0.5
    }

    /// Check whether two boxes touch or overlap.
    #[inline]
    pub fn overlaps(&self, other: &AABB) -> bool {
        self.min.x <= other.max.x
            && other.min.x <= self.max.x
            && self.min.y <= other.max.y
            && other.min.y <= self.max.y
    }

    /// The overlapping region of two boxes, if they overlap.
    pub fn intersection(&self, other: &AABB) -> Option<AABB> {
        if !self.overlaps(other) {
            return None;
        }
        Some(AABB {
            min: self.min.max_by_component(other.min),
            max: self.max.min_by_component(other.max),
        })
    }

    /// The smallest box containing both boxes.
    #[inline]
    pub fn union(&self, other: &AABB) -> AABB {
        AABB {
            min: self.min.min_by_component(other.min),
            max: self.max.max_by_component(other.max),
        }
    }

    /// Grow the box by `amount` in every direction.
    #[inline]
    pub fn padded(&self, amount: f64) -> AABB {
        let pad = m::Vec2::new(amount, amount);
        AABB {
            min: self.min - pad,
            max: self.max + pad,
        }
    }

    #[inline]
    pub fn contains_point(&self, point: m::Vec2) -> bool {
        point.x >= self.min.x && point.x <= self.max.x && point.y >= self.min.y && point.y <= self.max.y
    }
}
