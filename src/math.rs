//! Types, aliases and helper operations for doing math with `ultraviolet`.
use std::f64::consts::PI;
pub use ultraviolet as uv;

/// A Pose has a rotation and a translation, no scaling.
///
/// This is the transform applied to shape-local geometry to place it in the world.
/// The rotation is a unit rotor, which in 2D is the same thing as a unit complex number,
/// so composing poses never goes through trigonometry.
pub type Pose = uv::DIsometry2;
pub type Vec2 = uv::DVec2;
pub type Rotor2 = uv::DRotor2;

/// An angle in either degrees or radians.
/// Default conversion from f64 is in degrees.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde-types", derive(serde::Deserialize, serde::Serialize))]
pub enum Angle {
    Rad(f64),
    Deg(f64),
}
impl Angle {
    /// Get the angle as degrees.
    #[inline]
    pub fn deg(&self) -> f64 {
        match self {
            Angle::Rad(rad) => rad * 180.0 / PI,
            Angle::Deg(deg) => *deg,
        }
    }

    /// Get the angle as radians.
    #[inline]
    pub fn rad(&self) -> f64 {
        match self {
            Angle::Rad(rad) => *rad,
            Angle::Deg(deg) => deg * PI / 180.0,
        }
    }
}
impl Default for Angle {
    fn default() -> Self {
        Angle::Rad(0.0)
    }
}
impl From<Angle> for Rotor2 {
    #[inline]
    fn from(ang: Angle) -> Rotor2 {
        Rotor2::from_angle(ang.rad())
    }
}
impl From<Rotor2> for Angle {
    #[inline]
    fn from(rotor: Rotor2) -> Self {
        Angle::Rad(-rotor.bv.xy.atan2(rotor.s) * 2.0)
    }
}

/// A wrapper type to indicate a vector should always be normalized.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Unit<T>(T);

impl Unit<Vec2> {
    /// Normalize `v`, or return `fallback` if `v` is too short to have a direction.
    pub fn try_new_normalize(v: Vec2, fallback: Self) -> Self {
        let mag_sq = v.mag_sq();
        if mag_sq > f64::EPSILON * f64::EPSILON {
            Unit(v / mag_sq.sqrt())
        } else {
            fallback
        }
    }

    pub const fn new_unchecked(v: Vec2) -> Self {
        Unit(v)
    }

    pub fn unit_x() -> Self {
        Unit(Vec2::unit_x())
    }

    pub fn unit_y() -> Self {
        Unit(Vec2::unit_y())
    }
}

impl<T> std::ops::Deref for Unit<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<T> std::ops::Neg for Unit<T>
where
    T: std::ops::Neg,
{
    type Output = Unit<<T as std::ops::Neg>::Output>;

    fn neg(self) -> Self::Output {
        Unit(-self.0)
    }
}

/// A builder to create [`Pose`][self::Pose]s.
#[derive(Clone, Copy, Debug)]
#[cfg_attr(
    feature = "serde-types",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct PoseBuilder {
    position: [f64; 2],
    rotation: Angle,
}
impl PoseBuilder {
    pub fn new() -> Self {
        PoseBuilder {
            position: [0.0, 0.0],
            rotation: Angle::default(),
        }
    }
    #[inline]
    pub fn with_position(mut self, pos: impl Into<[f64; 2]>) -> Self {
        self.position = pos.into();
        self
    }
    #[inline]
    pub fn with_rotation(mut self, angle: Angle) -> Self {
        self.rotation = angle;
        self
    }
    #[inline]
    pub fn build(self) -> Pose {
        Pose::new(
            Vec2::new(self.position[0], self.position[1]),
            self.rotation.into(),
        )
    }
}
impl Default for PoseBuilder {
    fn default() -> Self {
        Self::new()
    }
}
impl From<PoseBuilder> for Pose {
    fn from(pb: PoseBuilder) -> Pose {
        pb.build()
    }
}
impl From<[f64; 2]> for PoseBuilder {
    fn from(vec: [f64; 2]) -> Self {
        PoseBuilder::new().with_position(vec)
    }
}
impl From<Vec2> for PoseBuilder {
    fn from(vec: Vec2) -> Self {
        PoseBuilder::new().with_position(vec)
    }
}
impl From<Angle> for PoseBuilder {
    fn from(angle: Angle) -> Self {
        PoseBuilder::new().with_rotation(angle)
    }
}
impl From<Pose> for PoseBuilder {
    fn from(pose: Pose) -> Self {
        PoseBuilder::new()
            .with_position(pose.translation)
            .with_rotation(Angle::from(pose.rotation))
    }
}

// Vec2 utils

#[inline]
pub fn left_normal(v: Vec2) -> Vec2 {
    Vec2::new(-v.y, v.x)
}
#[inline]
pub fn right_normal(v: Vec2) -> Vec2 {
    Vec2::new(v.y, -v.x)
}

/// The scalar 2D cross product, i.e. the z component of the 3D cross product.
#[inline]
pub fn cross(a: Vec2, b: Vec2) -> f64 {
    a.wedge(b).xy
}

// pose utils

/// Bring a pose's rotation back to unit magnitude.
///
/// Repeatedly composing rotations accumulates floating point drift,
/// so anything that integrates rotation over many steps should call this.
#[inline]
pub fn renormalize(pose: &mut Pose) {
    pose.rotation.normalize();
}

/// Magnitude of a rotor, 1 for any rotor that represents a pure rotation.
#[inline]
pub fn rotor_mag(r: Rotor2) -> f64 {
    (r.s * r.s + r.bv.xy * r.bv.xy).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn angle_roundtrips_through_rotor() {
        for deg in [-170.0, -45.0, 0.0, 30.0, 90.0, 179.0] {
            let back = Angle::from(Rotor2::from(Angle::Deg(deg)));
            assert!((back.deg() - deg).abs() < 1e-9, "{} became {}", deg, back.deg());
        }
    }

    #[test]
    fn renormalize_restores_unit_rotor() {
        let mut pose = Pose::new(Vec2::zero(), Rotor2::from_angle(0.3));
        pose.rotation.s *= 1.01;
        pose.rotation.bv.xy *= 1.01;
        assert!((rotor_mag(pose.rotation) - 1.0).abs() > 1e-3);
        renormalize(&mut pose);
        assert!((rotor_mag(pose.rotation) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn cross_matches_definition() {
        let a = Vec2::new(2.0, 3.0);
        let b = Vec2::new(-1.0, 4.0);
        assert_eq!(cross(a, b), 2.0 * 4.0 - 3.0 * -1.0);
        assert_eq!(cross(a, a), 0.0);
    }

    #[test]
    fn pose_builder_places_points() {
        let pose = PoseBuilder::new()
            .with_position([1.0, 2.0])
            .with_rotation(Angle::Deg(180.0))
            .build();
        let p = pose * Vec2::new(1.0, 0.0);
        assert!((p - Vec2::new(0.0, 2.0)).mag() < 1e-9);
    }
}
