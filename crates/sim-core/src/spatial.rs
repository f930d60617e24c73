//! A spatial index rebuilt per query: wraps `rstar::RTree` over whatever
//! subset of agent positions the calling phase cares about this tick.

use rstar::{PointDistance, RTree, RTreeObject, AABB};

/// An agent position tagged with its local (store) index, so index lookups
/// survive the round trip through the tree.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndexedPoint {
    pub index: usize,
    pub point: [f64; 3],
}

impl RTreeObject for IndexedPoint {
    type Envelope = AABB<[f64; 3]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.point)
    }
}

impl PointDistance for IndexedPoint {
    fn distance_2(&self, other: &[f64; 3]) -> f64 {
        self.point
            .iter()
            .zip(other.iter())
            .map(|(a, b)| (a - b) * (a - b))
            .sum()
    }
}

pub fn build_index(points: &[(usize, [f64; 3])]) -> RTree<IndexedPoint> {
    let entries: Vec<IndexedPoint> = points
        .iter()
        .map(|&(index, point)| IndexedPoint { index, point })
        .collect();
    RTree::bulk_load(entries)
}

/// All indices within Euclidean distance `radius` of `center`.
pub fn radius_query(tree: &RTree<IndexedPoint>, center: [f64; 3], radius: f64) -> Vec<usize> {
    let radius_sq = radius * radius;
    tree.locate_within_distance(center, radius_sq)
        .map(|p| p.index)
        .collect()
}

/// Nearest indexed point to `point`, with its Euclidean distance.
pub fn nearest_query(tree: &RTree<IndexedPoint>, point: [f64; 3]) -> Option<(usize, f64)> {
    tree.nearest_neighbor(&point)
        .map(|p| (p.index, p.distance_2(&point).sqrt()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn radius_query_finds_only_points_in_range() {
        let points = vec![(0, [0.0, 0.0, 0.0]), (1, [1.0, 0.0, 0.0]), (2, [10.0, 0.0, 0.0])];
        let tree = build_index(&points);
        let mut found = radius_query(&tree, [0.0, 0.0, 0.0], 2.0);
        found.sort_unstable();
        assert_eq!(found, vec![0, 1]);
    }

    #[test]
    fn nearest_query_returns_closest_index() {
        let points = vec![(0, [0.0, 0.0, 0.0]), (1, [5.0, 0.0, 0.0])];
        let tree = build_index(&points);
        let (idx, dist) = nearest_query(&tree, [4.5, 0.0, 0.0]).unwrap();
        assert_eq!(idx, 1);
        assert!((dist - 0.5).abs() < 1e-9);
    }
}
