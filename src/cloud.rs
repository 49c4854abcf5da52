//! Point clouds augmented with per-point orientation vectors.

use std::collections::BinaryHeap;

use glam::Vec3;
use nalgebra::{Matrix3, Vector3};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::error::NblastError;
use crate::index::{KdTree, Neighbor, SpatialIndex};
use crate::par::maybe_par_range;
use crate::types::{Point3, Point3Like};

/// Configuration for vector cloud construction.
#[derive(Debug, Clone)]
pub struct CloudConfig {
    /// Number of nearest neighbors defining each point's tangent, the point
    /// itself included (it is always its own nearest neighbor). Published
    /// score tables were fit with 10-point neighborhoods.
    pub tangent_neighbors: usize,
    /// Leaf capacity of the cloud's k-d tree. This trades tree depth against
    /// leaf scan length and never changes results; values below 1 are treated
    /// as 1.
    pub leaf_size: usize,
}

impl Default for CloudConfig {
    fn default() -> Self {
        Self {
            tangent_neighbors: 10,
            leaf_size: 10,
        }
    }
}

/// The nearest match of one query point in a target cloud.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointMatch {
    /// Index of the matched point in the target cloud.
    pub index: usize,
    /// Euclidean distance between query point and match.
    pub dist: f32,
    /// Unsigned alignment of the two tangents, `|dot|`, at most 1 up to
    /// float rounding.
    pub dot: f32,
}

/// An immutable cloud of (point, tangent) pairs with a spatial index.
///
/// Each tangent is the unit principal direction of its point's local
/// neighborhood, a proxy for the neuron's trajectory through that point.
/// Tangent sign is arbitrary (an eigenvector and its negation are the same
/// eigenvector), so consumers compare tangents through `|dot|` only; see
/// [`PointMatch::dot`].
///
/// The index is built once during construction and never mutated, so a cloud
/// can be queried from many threads at once.
#[derive(Debug, Clone)]
pub struct VectorCloud {
    points: Vec<Point3>,
    tangents: Vec<Point3>,
    tree: KdTree,
    degenerate: Vec<u32>,
}

impl VectorCloud {
    /// Build a cloud with default configuration.
    pub fn build<P: Point3Like>(points: &[P]) -> Result<Self, NblastError> {
        Self::build_with(points, CloudConfig::default())
    }

    /// Build a cloud with explicit configuration.
    ///
    /// Fails with `NoPoints` on an empty slice and `InsufficientPoints` when
    /// the cloud holds fewer points than the tangent neighborhood needs.
    pub fn build_with<P: Point3Like>(
        points: &[P],
        config: CloudConfig,
    ) -> Result<Self, NblastError> {
        let points: Vec<Point3> = points.iter().map(Point3::from_like).collect();
        Self::build_impl(points, config)
    }

    /// Build a cloud from a flat `[x0, y0, z0, x1, y1, z1, ...]` buffer.
    pub fn from_flat(coords: &[f32]) -> Result<Self, NblastError> {
        Self::from_flat_with(coords, CloudConfig::default())
    }

    /// Build a cloud from a flat coordinate buffer with explicit configuration.
    ///
    /// A buffer whose length is not a multiple of 3 fails with
    /// `DimensionMismatch`.
    pub fn from_flat_with(coords: &[f32], config: CloudConfig) -> Result<Self, NblastError> {
        if coords.len() % 3 != 0 {
            return Err(NblastError::DimensionMismatch { len: coords.len() });
        }
        let points: Vec<Point3> = coords
            .chunks_exact(3)
            .map(|c| Point3::new(c[0], c[1], c[2]))
            .collect();
        Self::build_impl(points, config)
    }

    fn build_impl(points: Vec<Point3>, config: CloudConfig) -> Result<Self, NblastError> {
        if points.is_empty() {
            return Err(NblastError::NoPoints);
        }
        let k = config.tangent_neighbors;
        if k == 0 {
            return Err(NblastError::InsufficientPoints {
                required: 1,
                available: points.len(),
            });
        }
        if k > points.len() {
            return Err(NblastError::InsufficientPoints {
                required: k,
                available: points.len(),
            });
        }

        let tree = KdTree::build(&points, config.leaf_size.max(1));
        let positions: Vec<Vec3> = points.iter().map(|p| p.to_glam()).collect();

        let tangents: Vec<(Point3, bool)> = maybe_par_range!(0..points.len())
            .map(|i| {
                let mut heap = BinaryHeap::with_capacity(k + 1);
                let mut neighbors = Vec::with_capacity(k);
                tree.nearest_k_into(positions[i], k, &mut heap, &mut neighbors);
                principal_direction(&positions, positions[i], &neighbors)
            })
            .collect();

        let mut degenerate = Vec::new();
        for (i, (_, flagged)) in tangents.iter().enumerate() {
            if *flagged {
                degenerate.push(i as u32);
            }
        }
        let tangents: Vec<Point3> = tangents.into_iter().map(|(t, _)| t).collect();

        Ok(Self {
            points,
            tangents,
            tree,
            degenerate,
        })
    }

    /// Number of (point, tangent) pairs; equals the input point count.
    #[inline]
    pub fn num_points(&self) -> usize {
        self.points.len()
    }

    /// The points, in input order.
    #[inline]
    pub fn points(&self) -> &[Point3] {
        &self.points
    }

    /// The unit tangents, in input order. Sign is arbitrary.
    #[inline]
    pub fn tangents(&self) -> &[Point3] {
        &self.tangents
    }

    /// One point by index.
    #[inline]
    pub fn point(&self, i: usize) -> Point3 {
        self.points[i]
    }

    /// One tangent by index.
    #[inline]
    pub fn tangent(&self, i: usize) -> Point3 {
        self.tangents[i]
    }

    /// The cloud's nearest-neighbor index.
    #[inline]
    pub fn index(&self) -> &dyn SpatialIndex {
        &self.tree
    }

    /// Indices of points whose tangent neighborhood was degenerate (every
    /// neighbor coincident, as produced by duplicated skeleton nodes). Those
    /// points carry a fixed +X tangent. Empty for healthy inputs.
    #[inline]
    pub fn degenerate_tangents(&self) -> &[u32] {
        &self.degenerate
    }

    /// Match one of this cloud's points against `target`.
    ///
    /// Returns the target point nearest to `self.point(query_index)` along
    /// with the distance and the unsigned tangent alignment.
    pub fn nearest_match(&self, target: &VectorCloud, query_index: usize) -> PointMatch {
        let hit = target.tree.nearest_one(self.points[query_index].to_glam());
        let dot = self.tangents[query_index]
            .dot(target.tangents[hit.index as usize])
            .abs();
        PointMatch {
            index: hit.index as usize,
            dist: hit.dist2.sqrt(),
            dot,
        }
    }
}

/// Unit principal direction of a neighborhood, with a degeneracy flag.
///
/// Coordinates are accumulated in f64 relative to the query point: raw
/// nanometer coordinates are large enough that their squared sums would
/// drown the neighborhood's own spread.
fn principal_direction(
    positions: &[Vec3],
    origin: Vec3,
    neighbors: &[Neighbor],
) -> (Point3, bool) {
    let mut sum = Vector3::<f64>::zeros();
    let mut sum_sq = Matrix3::<f64>::zeros();
    for neighbor in neighbors {
        let p = positions[neighbor.index as usize] - origin;
        let v = Vector3::new(p.x as f64, p.y as f64, p.z as f64);
        sum += v;
        sum_sq += v * v.transpose();
    }
    let n = neighbors.len() as f64;
    let mean = sum / n;
    let scatter = sum_sq - mean * sum.transpose();

    let eig = scatter.symmetric_eigen();
    let mut max_i = 0;
    for j in 1..3 {
        if eig.eigenvalues[j] > eig.eigenvalues[max_i] {
            max_i = j;
        }
    }
    if eig.eigenvalues[max_i] <= 0.0 {
        // Zero scatter: every neighbor sits on the query point.
        return (Point3::new(1.0, 0.0, 0.0), true);
    }
    let principal = eig.eigenvectors.column(max_i);
    let tangent = Vec3::new(
        principal[0] as f32,
        principal[1] as f32,
        principal[2] as f32,
    );
    match tangent.try_normalize() {
        Some(unit) => (Point3::from_glam(unit), false),
        None => (Point3::new(1.0, 0.0, 0.0), true),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn z_line(n: usize) -> Vec<[f32; 3]> {
        (0..n).map(|i| [0.0, 0.0, i as f32]).collect()
    }

    #[test]
    fn test_line_tangents_follow_axis() {
        let cloud = VectorCloud::build(&z_line(100)).unwrap();
        assert_eq!(cloud.num_points(), 100);
        let axis = Point3::new(0.0, 0.0, 1.0);
        for i in 0..cloud.num_points() {
            let alignment = cloud.tangent(i).dot(axis).abs();
            assert!(
                alignment > 0.999,
                "point {} tangent {:?} not along z",
                i,
                cloud.tangent(i)
            );
        }
        assert!(cloud.degenerate_tangents().is_empty());
    }

    #[test]
    fn test_tangents_are_unit_length() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let points: Vec<[f32; 3]> = (0..200)
            .map(|_| {
                [
                    rng.gen_range(-50.0..50.0),
                    rng.gen_range(-50.0..50.0),
                    rng.gen_range(-50.0..50.0),
                ]
            })
            .collect();
        let cloud = VectorCloud::build(&points).unwrap();
        for i in 0..cloud.num_points() {
            assert!((cloud.tangent(i).length() - 1.0).abs() < 1e-4);
        }
    }

    #[test]
    fn test_empty_input_rejected() {
        let err = VectorCloud::build(&[] as &[[f32; 3]]);
        assert!(matches!(err, Err(NblastError::NoPoints)));
    }

    #[test]
    fn test_insufficient_points_rejected() {
        let err = VectorCloud::build(&z_line(5));
        assert!(matches!(
            err,
            Err(NblastError::InsufficientPoints {
                required: 10,
                available: 5
            })
        ));
    }

    #[test]
    fn test_zero_neighborhood_rejected() {
        let config = CloudConfig {
            tangent_neighbors: 0,
            ..CloudConfig::default()
        };
        let err = VectorCloud::build_with(&z_line(5), config);
        assert!(matches!(
            err,
            Err(NblastError::InsufficientPoints { required: 1, .. })
        ));
    }

    #[test]
    fn test_from_flat_matches_build() {
        let flat: Vec<f32> = z_line(30).iter().flatten().copied().collect();
        let from_flat = VectorCloud::from_flat(&flat).unwrap();
        let from_points = VectorCloud::build(&z_line(30)).unwrap();
        assert_eq!(from_flat.points(), from_points.points());
        assert_eq!(from_flat.tangents(), from_points.tangents());
    }

    #[test]
    fn test_from_flat_rejects_ragged_buffer() {
        let err = VectorCloud::from_flat(&[1.0, 2.0, 3.0, 4.0]);
        assert!(matches!(
            err,
            Err(NblastError::DimensionMismatch { len: 4 })
        ));
    }

    #[test]
    fn test_coincident_points_flagged_degenerate() {
        let points = vec![[5.0f32, -3.0, 2.0]; 12];
        let cloud = VectorCloud::build(&points).unwrap();
        assert_eq!(cloud.degenerate_tangents().len(), 12);
        for i in 0..cloud.num_points() {
            assert_eq!(cloud.tangent(i), Point3::new(1.0, 0.0, 0.0));
        }
    }

    #[test]
    fn test_leaf_size_does_not_change_tangents() {
        let mut rng = ChaCha8Rng::seed_from_u64(19);
        let points: Vec<[f32; 3]> = (0..120)
            .map(|i| {
                let t = i as f32 * 0.3;
                [
                    t.cos() * 40.0 + rng.gen_range(-1.0..1.0),
                    t.sin() * 40.0 + rng.gen_range(-1.0..1.0),
                    t * 5.0 + rng.gen_range(-1.0..1.0),
                ]
            })
            .collect();
        let narrow = VectorCloud::build_with(
            &points,
            CloudConfig {
                leaf_size: 1,
                ..CloudConfig::default()
            },
        )
        .unwrap();
        let wide = VectorCloud::build_with(
            &points,
            CloudConfig {
                leaf_size: 64,
                ..CloudConfig::default()
            },
        )
        .unwrap();
        assert_eq!(narrow.tangents(), wide.tangents());
    }

    #[test]
    fn test_nearest_match_reports_distance_and_alignment() {
        let a = VectorCloud::build(&z_line(20)).unwrap();
        let b_points: Vec<[f32; 3]> = (0..20).map(|i| [3.0, 0.0, i as f32]).collect();
        let b = VectorCloud::build(&b_points).unwrap();

        let m = a.nearest_match(&b, 7);
        assert_eq!(m.index, 7);
        assert!((m.dist - 3.0).abs() < 1e-5);
        // Both clouds run along z, so alignment is 1 whatever the signs.
        assert!(m.dot > 0.999);
    }
}
