//! Axis-aligned extents for spatial acceleration structures.

use glam::Vec3;

/// Axis-aligned bounding box defined by its min and max corners.
///
/// The empty extent is `min = +INF, max = -INF`, chosen so that the union of
/// the empty extent with any box is that box.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Extent3 {
    pub min: Vec3,
    pub max: Vec3,
}

impl Extent3 {
    /// An empty extent (contains nothing).
    pub const EMPTY: Extent3 = Extent3 {
        min: Vec3::INFINITY,
        max: Vec3::NEG_INFINITY,
    };

    /// Create an extent from its corners. `min <= max` component-wise is the
    /// caller's responsibility.
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Create the tight extent of a set of points.
    pub fn from_points(points: &[Vec3]) -> Self {
        let mut extent = Self::EMPTY;
        for p in points {
            extent = extent.extend(*p);
        }
        extent
    }

    /// Grow the extent to include a point.
    pub fn extend(&self, point: Vec3) -> Extent3 {
        Extent3 {
            min: self.min.min(point),
            max: self.max.max(point),
        }
    }

    /// The extent that surrounds two other extents.
    pub fn union(a: &Extent3, b: &Extent3) -> Extent3 {
        Extent3 {
            min: a.min.min(b.min),
            max: a.max.max(b.max),
        }
    }

    /// Vector from the min corner to the max corner.
    #[inline]
    pub fn diagonal(&self) -> Vec3 {
        self.max - self.min
    }

    /// Total surface area of the box.
    pub fn surface_area(&self) -> f32 {
        let d = self.diagonal();
        2.0 * (d.x * d.y + d.x * d.z + d.y * d.z)
    }

    /// Index (0=X, 1=Y, 2=Z) of the axis with the longest extent.
    pub fn longest_axis(&self) -> usize {
        let d = self.diagonal();
        if d.x > d.y && d.x > d.z {
            0
        } else if d.y > d.z {
            1
        } else {
            2
        }
    }

    /// Slab test against a ray given the precomputed inverse direction.
    ///
    /// Returns the parametric entry/exit pair, or `None` when the ray misses
    /// the box or the box lies entirely behind the origin. Infinite
    /// components of `inv_direction` (axis-parallel rays) are legitimate and
    /// resolve through the min/max comparisons.
    pub fn intersect(&self, origin: Vec3, inv_direction: Vec3) -> Option<(f32, f32)> {
        let mut t_min = f32::NEG_INFINITY;
        let mut t_max = f32::INFINITY;
        for axis in 0..3 {
            let t1 = (self.min[axis] - origin[axis]) * inv_direction[axis];
            let t2 = (self.max[axis] - origin[axis]) * inv_direction[axis];
            t_min = t_min.max(t1.min(t2));
            t_max = t_max.min(t1.max(t2));
        }

        if t_max >= 0.0 && t_max >= t_min {
            Some((t_min, t_max))
        } else {
            None
        }
    }
}

impl Default for Extent3 {
    fn default() -> Self {
        Self::EMPTY
    }
}
