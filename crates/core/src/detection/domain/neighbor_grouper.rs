use std::collections::HashMap;

use crate::shared::bounding_box::{BoundingBox, DEFAULT_GROUP_EPS};

/// Merges raw cascade hits into detections.
///
/// Raw windows are clustered with union-find over the box neighborhood
/// predicate, each cluster is averaged into one box, and clusters with fewer
/// raw hits than `min_neighbors` are discarded as noise. With
/// `min_neighbors == 0` the raw hits pass through untouched.
pub struct NeighborGrouper {
    eps: f64,
}

impl NeighborGrouper {
    pub fn new() -> Self {
        Self {
            eps: DEFAULT_GROUP_EPS,
        }
    }

    pub fn with_eps(eps: f64) -> Self {
        Self { eps }
    }

    /// Clusters in order of their earliest raw hit, so output is stable for
    /// a fixed input sequence.
    pub fn group(&self, raw: &[BoundingBox], min_neighbors: u32) -> Vec<BoundingBox> {
        if min_neighbors == 0 {
            return raw.to_vec();
        }
        if raw.is_empty() {
            return Vec::new();
        }

        let mut parent: Vec<usize> = (0..raw.len()).collect();
        for i in 0..raw.len() {
            for j in (i + 1)..raw.len() {
                if raw[i].similar_to(&raw[j], self.eps) {
                    union(&mut parent, i, j);
                }
            }
        }

        let mut cluster_of_root: HashMap<usize, usize> = HashMap::new();
        let mut clusters: Vec<Vec<usize>> = Vec::new();
        for i in 0..raw.len() {
            let root = find(&mut parent, i);
            let cluster = *cluster_of_root.entry(root).or_insert_with(|| {
                clusters.push(Vec::new());
                clusters.len() - 1
            });
            clusters[cluster].push(i);
        }

        clusters
            .iter()
            .filter(|members| members.len() as u32 >= min_neighbors)
            .map(|members| average(raw, members))
            .collect()
    }
}

impl Default for NeighborGrouper {
    fn default() -> Self {
        Self::new()
    }
}

/// Coordinate-wise rounded mean over a cluster's members.
fn average(raw: &[BoundingBox], members: &[usize]) -> BoundingBox {
    let n = members.len() as f64;
    let sum = members.iter().fold([0u64; 4], |mut acc, &i| {
        acc[0] += raw[i].x as u64;
        acc[1] += raw[i].y as u64;
        acc[2] += raw[i].width as u64;
        acc[3] += raw[i].height as u64;
        acc
    });
    BoundingBox {
        x: (sum[0] as f64 / n).round() as u32,
        y: (sum[1] as f64 / n).round() as u32,
        width: (sum[2] as f64 / n).round() as u32,
        height: (sum[3] as f64 / n).round() as u32,
    }
}

/// Find root of element `i` with path halving for amortized near-O(1).
fn find(parent: &mut [usize], mut i: usize) -> usize {
    while parent[i] != i {
        parent[i] = parent[parent[i]];
        i = parent[i];
    }
    i
}

/// Merge the sets containing `a` and `b`.
fn union(parent: &mut [usize], a: usize, b: usize) {
    let ra = find(parent, a);
    let rb = find(parent, b);
    if ra != rb {
        parent[ra] = rb;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bbox(x: u32, y: u32, w: u32, h: u32) -> BoundingBox {
        BoundingBox::new(x, y, w, h)
    }

    #[test]
    fn test_empty_input() {
        assert!(NeighborGrouper::new().group(&[], 2).is_empty());
    }

    #[test]
    fn test_min_neighbors_zero_passes_raw_through() {
        let raw = vec![bbox(0, 0, 50, 50), bbox(2, 2, 50, 50)];
        let grouped = NeighborGrouper::new().group(&raw, 0);
        assert_eq!(grouped, raw);
    }

    #[test]
    fn test_lone_hit_below_threshold_discarded() {
        let raw = vec![bbox(10, 10, 50, 50)];
        assert!(NeighborGrouper::new().group(&raw, 2).is_empty());
    }

    #[test]
    fn test_cluster_averaged_into_single_box() {
        let raw = vec![
            bbox(76, 76, 60, 60),
            bbox(76, 78, 60, 60),
            bbox(78, 76, 60, 60),
            bbox(78, 78, 60, 60),
        ];
        let grouped = NeighborGrouper::new().group(&raw, 2);
        assert_eq!(grouped, vec![bbox(77, 77, 60, 60)]);
    }

    #[test]
    fn test_distant_clusters_stay_separate() {
        let raw = vec![
            bbox(0, 0, 40, 40),
            bbox(2, 2, 40, 40),
            bbox(300, 300, 40, 40),
            bbox(302, 302, 40, 40),
        ];
        let grouped = NeighborGrouper::new().group(&raw, 2);
        assert_eq!(grouped.len(), 2);
        assert_eq!(grouped[0], bbox(1, 1, 40, 40));
        assert_eq!(grouped[1], bbox(301, 301, 40, 40));
    }

    #[test]
    fn test_transitive_chain_forms_one_cluster() {
        // a~b and b~c but a!~c directly; union-find still merges all three
        let raw = vec![bbox(0, 0, 50, 50), bbox(9, 0, 50, 50), bbox(18, 0, 50, 50)];
        let grouped = NeighborGrouper::new().group(&raw, 3);
        assert_eq!(grouped.len(), 1);
        assert_eq!(grouped[0], bbox(9, 0, 50, 50));
    }

    #[test]
    fn test_small_cluster_discarded_while_large_survives() {
        let raw = vec![
            bbox(0, 0, 40, 40), // lone hit
            bbox(200, 200, 40, 40),
            bbox(202, 200, 40, 40),
            bbox(200, 202, 40, 40),
        ];
        let grouped = NeighborGrouper::new().group(&raw, 3);
        assert_eq!(grouped.len(), 1);
        assert_eq!(grouped[0], bbox(201, 201, 40, 40));
    }

    #[test]
    fn test_cluster_order_follows_first_hit() {
        let raw = vec![
            bbox(300, 300, 40, 40),
            bbox(0, 0, 40, 40),
            bbox(302, 302, 40, 40),
            bbox(2, 2, 40, 40),
        ];
        let grouped = NeighborGrouper::new().group(&raw, 2);
        assert_eq!(grouped.len(), 2);
        // Cluster seeded by raw[0] comes first
        assert_eq!(grouped[0], bbox(301, 301, 40, 40));
    }

    #[test]
    fn test_group_is_deterministic() {
        let raw = vec![
            bbox(10, 10, 50, 50),
            bbox(12, 12, 50, 50),
            bbox(14, 10, 52, 50),
        ];
        let grouper = NeighborGrouper::new();
        assert_eq!(grouper.group(&raw, 2), grouper.group(&raw, 2));
    }
}
