//! Core types for NBLAST point clouds.

use bytemuck::{Pod, Zeroable};

/// A 3D point (or direction) in the cloud's physical unit, typically nanometers.
///
/// This type provides a small `#[repr(C)]` representation with a stable layout,
/// so buffers of points can be reinterpreted without copies. The same type
/// carries tangent vectors, where it is unit-length by construction.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct Point3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Point3 {
    /// Create a new point from raw coordinates.
    #[inline]
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Create from any type implementing `Point3Like`.
    #[inline]
    pub fn from_like<P: Point3Like>(p: &P) -> Self {
        Self::new(p.x(), p.y(), p.z())
    }

    /// Convert to a glam::Vec3.
    #[inline]
    pub fn to_glam(self) -> glam::Vec3 {
        glam::Vec3::new(self.x, self.y, self.z)
    }

    /// Create from a glam::Vec3.
    #[inline]
    pub fn from_glam(v: glam::Vec3) -> Self {
        Self::new(v.x, v.y, v.z)
    }

    /// Compute the dot product with another vector.
    #[inline]
    pub fn dot(self, other: Self) -> f32 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    /// Compute the squared length.
    #[inline]
    pub fn length_squared(self) -> f32 {
        self.dot(self)
    }

    /// Compute the length.
    #[inline]
    pub fn length(self) -> f32 {
        self.length_squared().sqrt()
    }

    /// Compute the Euclidean distance to another point.
    #[inline]
    pub fn distance(self, other: Self) -> f32 {
        Self::new(self.x - other.x, self.y - other.y, self.z - other.z).length()
    }

    /// Normalize the vector. Returns the input unchanged if its length is zero.
    #[inline]
    pub fn normalize(self) -> Self {
        let len = self.length();
        if len > 0.0 {
            Self::new(self.x / len, self.y / len, self.z / len)
        } else {
            self
        }
    }
}

impl From<[f32; 3]> for Point3 {
    #[inline]
    fn from([x, y, z]: [f32; 3]) -> Self {
        Self::new(x, y, z)
    }
}

impl From<Point3> for [f32; 3] {
    #[inline]
    fn from(v: Point3) -> Self {
        [v.x, v.y, v.z]
    }
}

impl From<glam::Vec3> for Point3 {
    #[inline]
    fn from(v: glam::Vec3) -> Self {
        Self::from_glam(v)
    }
}

impl From<Point3> for glam::Vec3 {
    #[inline]
    fn from(v: Point3) -> glam::Vec3 {
        v.to_glam()
    }
}

/// Trait for types that can be used as input points.
///
/// This allows zero-copy input from various math libraries.
pub trait Point3Like {
    fn x(&self) -> f32;
    fn y(&self) -> f32;
    fn z(&self) -> f32;
}

impl Point3Like for Point3 {
    #[inline]
    fn x(&self) -> f32 {
        self.x
    }
    #[inline]
    fn y(&self) -> f32 {
        self.y
    }
    #[inline]
    fn z(&self) -> f32 {
        self.z
    }
}

impl Point3Like for [f32; 3] {
    #[inline]
    fn x(&self) -> f32 {
        self[0]
    }
    #[inline]
    fn y(&self) -> f32 {
        self[1]
    }
    #[inline]
    fn z(&self) -> f32 {
        self[2]
    }
}

impl Point3Like for (f32, f32, f32) {
    #[inline]
    fn x(&self) -> f32 {
        self.0
    }
    #[inline]
    fn y(&self) -> f32 {
        self.1
    }
    #[inline]
    fn z(&self) -> f32 {
        self.2
    }
}

impl Point3Like for glam::Vec3 {
    #[inline]
    fn x(&self) -> f32 {
        self.x
    }
    #[inline]
    fn y(&self) -> f32 {
        self.y
    }
    #[inline]
    fn z(&self) -> f32 {
        self.z
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point3_basics() {
        let v = Point3::new(1.0, 0.0, 0.0);
        assert_eq!(v.length(), 1.0);
        assert_eq!(v.dot(v), 1.0);
        assert_eq!(v.distance(Point3::new(4.0, 0.0, 0.0)), 3.0);
    }

    #[test]
    fn test_normalize() {
        let v = Point3::new(0.0, 3.0, 4.0).normalize();
        assert!((v.length() - 1.0).abs() < 1e-6);
        assert_eq!(Point3::new(0.0, 0.0, 0.0).normalize().length(), 0.0);
    }

    #[test]
    fn test_from_array() {
        let v: Point3 = [0.0, 1.0, 0.0].into();
        assert_eq!(v.y, 1.0);
    }

    #[test]
    fn test_point3_like_trait() {
        fn accepts_like<P: Point3Like>(p: &P) -> f32 {
            p.x() + p.y() + p.z()
        }

        let pt = Point3::new(1.0, 2.0, 3.0);
        let arr = [1.0f32, 2.0, 3.0];
        let tuple = (1.0f32, 2.0f32, 3.0f32);
        let glam_v = glam::Vec3::new(1.0, 2.0, 3.0);

        assert_eq!(accepts_like(&pt), 6.0);
        assert_eq!(accepts_like(&arr), 6.0);
        assert_eq!(accepts_like(&tuple), 6.0);
        assert_eq!(accepts_like(&glam_v), 6.0);
    }

    #[test]
    fn test_glam_round_trip() {
        let v = Point3::new(1.5, -2.0, 0.25);
        let g: glam::Vec3 = v.into();
        assert_eq!(Point3::from(g), v);
    }
}
