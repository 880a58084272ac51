//! Small geometry toolkit shared by the graph algorithms.
//!
//! Positions are plain `[f64; 3]` arrays, which also makes them usable as
//! points in an [rstar::RTree] without conversion.

/// Position of a node or connector in physical units.
pub type Point = [f64; 3];

/// Euclidean distance between two points.
pub fn distance(a: &Point, b: &Point) -> f64 {
    squared_distance(a, b).sqrt()
}

/// Squared Euclidean distance between two points.
pub fn squared_distance(a: &Point, b: &Point) -> f64 {
    let dx = a[0] - b[0];
    let dy = a[1] - b[1];
    let dz = a[2] - b[2];
    dx * dx + dy * dy + dz * dz
}

/// Linear interpolation from `a` (at `t = 0`) to `b` (at `t = 1`).
pub fn lerp(a: &Point, b: &Point, t: f64) -> Point {
    [
        a[0] + (b[0] - a[0]) * t,
        a[1] + (b[1] - a[1]) * t,
        a[2] + (b[2] - a[2]) * t,
    ]
}

/// Midpoint between two points.
pub fn midpoint(a: &Point, b: &Point) -> Point {
    lerp(a, b, 0.5)
}

/// Unit vector pointing from `a` to `b`, or `None` if both coincide.
pub fn unit_vector(a: &Point, b: &Point) -> Option<Point> {
    let len = distance(a, b);
    if len == 0.0 {
        return None;
    }
    Some([(b[0] - a[0]) / len, (b[1] - a[1]) / len, (b[2] - a[2]) / len])
}

// =#========================================================================#=
// BOUNDING BOX
// =#========================================================================#=
/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    /// Minimum corner
    pub min: Point,
    /// Maximum corner
    pub max: Point,
}

impl BoundingBox {
    /// Creates a box from two corners, in any order.
    pub fn new(a: Point, b: Point) -> Self {
        BoundingBox {
            min: [a[0].min(b[0]), a[1].min(b[1]), a[2].min(b[2])],
            max: [a[0].max(b[0]), a[1].max(b[1]), a[2].max(b[2])],
        }
    }

    /// Returns the tightest box around `points`, or `None` if there are none.
    pub fn from_points<'a, I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a Point>,
    {
        let mut iter = points.into_iter();
        let first = *iter.next()?;
        let mut bbox = BoundingBox {
            min: first,
            max: first,
        };
        for p in iter {
            bbox.expand(p);
        }
        Some(bbox)
    }

    /// Grows the box so that it contains `p`.
    pub fn expand(&mut self, p: &Point) {
        for axis in 0..3 {
            self.min[axis] = self.min[axis].min(p[axis]);
            self.max[axis] = self.max[axis].max(p[axis]);
        }
    }

    /// Edge lengths along x, y and z.
    pub fn extent(&self) -> Point {
        [
            self.max[0] - self.min[0],
            self.max[1] - self.min[1],
            self.max[2] - self.min[2],
        ]
    }

    /// Returns `true` if `p` lies inside or on the boundary.
    pub fn contains(&self, p: &Point) -> bool {
        (0..3).all(|axis| p[axis] >= self.min[axis] && p[axis] <= self.max[axis])
    }
}

// =#========================================================================#=
// VOLUME (trait)
// =#========================================================================#=
/// A region of space that can answer point-containment queries.
///
/// Used by [prune_by_volume](crate::model::Skeleton::prune_by_volume).
/// Implemented for [BoundingBox], for [Sphere] and for any
/// `Fn(&Point) -> bool`, so that callers can plug in mesh-based volumes.
pub trait Volume {
    /// Returns `true` if `p` is inside this volume.
    fn contains(&self, p: &Point) -> bool;
}

impl Volume for BoundingBox {
    fn contains(&self, p: &Point) -> bool {
        BoundingBox::contains(self, p)
    }
}

impl<F> Volume for F
where
    F: Fn(&Point) -> bool,
{
    fn contains(&self, p: &Point) -> bool {
        self(p)
    }
}

/// Ball with a center and a radius.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sphere {
    /// Center
    pub center: Point,
    /// Radius (non-negative)
    pub radius: f64,
}

impl Volume for Sphere {
    fn contains(&self, p: &Point) -> bool {
        squared_distance(&self.center, p) <= self.radius * self.radius
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lerp_endpoints() {
        let a = [0.0, 0.0, 0.0];
        let b = [2.0, 4.0, -2.0];
        assert_eq!(lerp(&a, &b, 0.0), a);
        assert_eq!(lerp(&a, &b, 1.0), b);
        assert_eq!(midpoint(&a, &b), [1.0, 2.0, -1.0]);
    }

    #[test]
    fn test_unit_vector_of_coincident_points() {
        let a = [1.0, 1.0, 1.0];
        assert_eq!(unit_vector(&a, &a), None);
        assert_eq!(unit_vector(&a, &[1.0, 3.0, 1.0]), Some([0.0, 1.0, 0.0]));
    }

    #[test]
    fn test_bounding_box_from_points() {
        let points = [[0.0, 5.0, 1.0], [2.0, -1.0, 3.0]];
        let bbox = BoundingBox::from_points(&points).unwrap();
        assert_eq!(bbox.min, [0.0, -1.0, 1.0]);
        assert_eq!(bbox.max, [2.0, 5.0, 3.0]);
        assert!(bbox.contains(&[1.0, 0.0, 2.0]));
        assert!(!bbox.contains(&[3.0, 0.0, 2.0]));
    }
}
