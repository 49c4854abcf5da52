//! Nearest-neighbor search over a cloud's points.

use std::collections::BinaryHeap;

use glam::Vec3;

use crate::types::Point3;

/// Read-only nearest-neighbor capability over an immutable set of 3D points.
///
/// `VectorCloud` exposes its index through this trait so the concrete
/// structure (k-d tree, grid, ...) stays swappable. Implementations must be
/// pure: the same query always returns the same answer.
pub trait SpatialIndex {
    /// Number of indexed points.
    fn num_points(&self) -> usize;

    /// Index of the point nearest to `query` and its Euclidean distance.
    ///
    /// Ties on distance resolve to the lowest point index, so the answer does
    /// not depend on the index's internal layout.
    fn nearest(&self, query: Point3) -> (usize, f32);
}

/// A nearest-neighbor candidate ordered by (squared distance, point index).
///
/// The index component makes the ordering total and canonical: two candidates
/// at exactly the same distance always rank the same way, which keeps query
/// results independent of traversal order and leaf size.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Neighbor {
    pub(crate) dist2: f32,
    pub(crate) index: u32,
}

impl PartialEq for Neighbor {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == std::cmp::Ordering::Equal
    }
}

impl Eq for Neighbor {}

impl PartialOrd for Neighbor {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Neighbor {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.dist2
            .total_cmp(&other.dist2)
            .then(self.index.cmp(&other.index))
    }
}

/// An exact 3D k-d tree with a runtime leaf capacity.
///
/// Points are copied into a single buffer and recursively median-partitioned
/// in place on cycling axes, so every subtree is a contiguous slice and no
/// node allocations are needed. Ranges at or under `leaf_size` stay unsplit
/// and are scanned linearly; searches are branch-and-bound and exact, which
/// makes `leaf_size` a cost knob only. Building panics on an empty point set.
#[derive(Debug, Clone)]
pub struct KdTree {
    /// Permuted (position, original index) pairs, subtree-contiguous.
    entries: Vec<(Vec3, u32)>,
    leaf_size: usize,
}

impl KdTree {
    /// Build a tree over `points` with the given leaf capacity.
    pub fn build(points: &[Point3], leaf_size: usize) -> Self {
        assert!(!points.is_empty(), "k-d tree requires at least one point");
        assert!(leaf_size >= 1, "k-d tree leaf size must be at least 1");
        debug_assert!(points.len() <= u32::MAX as usize, "point count exceeds u32 index space");

        let mut entries: Vec<(Vec3, u32)> = points
            .iter()
            .enumerate()
            .map(|(i, p)| (p.to_glam(), i as u32))
            .collect();
        split(&mut entries, 0, leaf_size);
        Self { entries, leaf_size }
    }

    /// Leaf capacity this tree was built with.
    #[inline]
    pub fn leaf_size(&self) -> usize {
        self.leaf_size
    }

    /// The single nearest entry to `query`.
    pub(crate) fn nearest_one(&self, query: Vec3) -> Neighbor {
        let mut best = Neighbor {
            dist2: f32::INFINITY,
            index: u32::MAX,
        };
        self.nearest_one_in(&self.entries, 0, query, &mut best);
        best
    }

    /// The `k` nearest entries to `query`, ascending by (distance, index).
    ///
    /// `heap` is caller-provided scratch so batch callers allocate once;
    /// results land in `out`. Requires `1 <= k <= num_points`.
    pub(crate) fn nearest_k_into(
        &self,
        query: Vec3,
        k: usize,
        heap: &mut BinaryHeap<Neighbor>,
        out: &mut Vec<Neighbor>,
    ) {
        debug_assert!(
            k >= 1 && k <= self.entries.len(),
            "neighbor count must be within the indexed point count"
        );
        heap.clear();
        self.nearest_k_in(&self.entries, 0, query, k, heap);
        out.clear();
        out.extend(heap.drain());
        out.sort_unstable();
    }

    fn nearest_one_in(
        &self,
        entries: &[(Vec3, u32)],
        depth: usize,
        query: Vec3,
        best: &mut Neighbor,
    ) {
        if entries.len() <= self.leaf_size {
            for &(p, index) in entries {
                consider(
                    best,
                    Neighbor {
                        dist2: query.distance_squared(p),
                        index,
                    },
                );
            }
            return;
        }

        let axis = depth % 3;
        let mid = entries.len() / 2;
        let (pivot, pivot_index) = entries[mid];
        consider(
            best,
            Neighbor {
                dist2: query.distance_squared(pivot),
                index: pivot_index,
            },
        );

        let delta = query[axis] - pivot[axis];
        let (near, far) = if delta < 0.0 {
            (&entries[..mid], &entries[mid + 1..])
        } else {
            (&entries[mid + 1..], &entries[..mid])
        };
        self.nearest_one_in(near, depth + 1, query, best);
        // The far slab can still hold an equal-distance, lower-index point,
        // so ties must descend too.
        if delta * delta <= best.dist2 {
            self.nearest_one_in(far, depth + 1, query, best);
        }
    }

    fn nearest_k_in(
        &self,
        entries: &[(Vec3, u32)],
        depth: usize,
        query: Vec3,
        k: usize,
        heap: &mut BinaryHeap<Neighbor>,
    ) {
        if entries.len() <= self.leaf_size {
            for &(p, index) in entries {
                push_bounded(
                    heap,
                    k,
                    Neighbor {
                        dist2: query.distance_squared(p),
                        index,
                    },
                );
            }
            return;
        }

        let axis = depth % 3;
        let mid = entries.len() / 2;
        let (pivot, pivot_index) = entries[mid];
        push_bounded(
            heap,
            k,
            Neighbor {
                dist2: query.distance_squared(pivot),
                index: pivot_index,
            },
        );

        let delta = query[axis] - pivot[axis];
        let (near, far) = if delta < 0.0 {
            (&entries[..mid], &entries[mid + 1..])
        } else {
            (&entries[mid + 1..], &entries[..mid])
        };
        self.nearest_k_in(near, depth + 1, query, k, heap);
        let visit_far = match heap.peek() {
            Some(worst) if heap.len() == k => delta * delta <= worst.dist2,
            _ => true,
        };
        if visit_far {
            self.nearest_k_in(far, depth + 1, query, k, heap);
        }
    }
}

impl SpatialIndex for KdTree {
    #[inline]
    fn num_points(&self) -> usize {
        self.entries.len()
    }

    fn nearest(&self, query: Point3) -> (usize, f32) {
        let hit = self.nearest_one(query.to_glam());
        (hit.index as usize, hit.dist2.sqrt())
    }
}

/// Median-partition `entries` in place until every range fits in a leaf.
///
/// Queries re-derive the same split rule (length vs. `leaf_size`, axis from
/// depth, pivot at the middle), so no explicit node records are stored.
fn split(entries: &mut [(Vec3, u32)], depth: usize, leaf_size: usize) {
    if entries.len() <= leaf_size {
        return;
    }
    let axis = depth % 3;
    let mid = entries.len() / 2;
    entries.select_nth_unstable_by(mid, |a, b| a.0[axis].total_cmp(&b.0[axis]));
    let (left, rest) = entries.split_at_mut(mid);
    split(left, depth + 1, leaf_size);
    split(&mut rest[1..], depth + 1, leaf_size);
}

#[inline]
fn consider(best: &mut Neighbor, candidate: Neighbor) {
    if candidate < *best {
        *best = candidate;
    }
}

/// Keep the heap holding the `k` smallest candidates seen so far.
fn push_bounded(heap: &mut BinaryHeap<Neighbor>, k: usize, candidate: Neighbor) {
    if heap.len() < k {
        heap.push(candidate);
    } else if let Some(worst) = heap.peek() {
        if candidate < *worst {
            heap.pop();
            heap.push(candidate);
        }
    }
}
