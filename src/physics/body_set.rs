use super::Body;

use thunderdome as td;

/// Key type to look up a body stored in the physics world.
///
/// Keys are generation-checked, so a key to a removed body
/// never resolves to another body that reused its slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BodyKey(pub(super) td::Index);

impl BodyKey {
    /// Get the underlying [`thunderdome::Index`][thunderdome::Index] of this key.
    /// Useful for creating your own mappings from bodies to other things,
    /// such as render objects.
    #[inline]
    pub fn index(&self) -> td::Index {
        self.0
    }
}

/// Storage for the bodies in a [`World`][super::World].
///
/// Iteration goes in ascending slot order,
/// which is the "arena order" that stepping and queries follow.
#[derive(Default, Clone)]
pub(crate) struct BodySet {
    bodies: td::Arena<Body>,
}

impl BodySet {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn insert(&mut self, body: Body) -> BodyKey {
        BodyKey(self.bodies.insert(body))
    }

    #[inline]
    pub fn remove(&mut self, key: BodyKey) -> Option<Body> {
        self.bodies.remove(key.0)
    }

    #[inline]
    pub fn get(&self, key: BodyKey) -> Option<&Body> {
        self.bodies.get(key.0)
    }

    #[inline]
    pub fn get_mut(&mut self, key: BodyKey) -> Option<&mut Body> {
        self.bodies.get_mut(key.0)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    #[inline]
    pub fn clear(&mut self) {
        self.bodies.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = (BodyKey, &Body)> {
        self.bodies.iter().map(|(idx, body)| (BodyKey(idx), body))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (BodyKey, &mut Body)> {
        self.bodies.iter_mut().map(|(idx, body)| (BodyKey(idx), body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::{collision::Circle, BodyParams};

    fn ball() -> Body {
        Body::new(BodyParams::new_dynamic(), Circle::new(1.0).into())
    }

    #[test]
    fn removed_keys_stay_dead() {
        let mut set = BodySet::new();
        let a = set.insert(ball());
        let b = set.insert(ball());
        assert_eq!(set.len(), 2);

        assert!(set.remove(a).is_some());
        assert!(set.get(a).is_none());
        assert!(set.remove(a).is_none());

        // the freed slot gets reused with a new generation
        let c = set.insert(ball());
        assert_eq!(c.index().slot(), a.index().slot());
        assert_ne!(c, a);
        assert!(set.get(a).is_none());
        assert!(set.get(c).is_some());

        itertools::assert_equal(set.iter().map(|(k, _)| k), [c, b]);
    }
}
