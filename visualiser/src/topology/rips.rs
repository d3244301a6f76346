use std::collections::HashMap;

use ndarray::{Array2, ArrayView2};
use serde::{Deserialize, Serialize};

use super::{PersistenceDiagram, PersistencePair};
use crate::error::Result;

/// Computes the persistence diagram of a point cloud.
pub trait PersistenceBackend {
    /// # Arguments
    /// * `cloud` - One point per row.
    fn diagram(&self, cloud: ArrayView2<f32>) -> Result<PersistenceDiagram>;
}

/// Vietoris-Rips persistence over the euclidean distance, in homology dimensions 0 and 1.
///
/// Requested dimensions above 1 are accepted and yield no pairs. Essential classes, the
/// ones never killed inside the filtration, are left out of the diagram.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VietorisRips {
    pub homology_dimensions: Vec<usize>,
    /// Edges longer than this never enter the filtration, `None` keeps them all.
    pub max_edge_length: Option<f32>,
}

impl Default for VietorisRips {
    fn default() -> Self {
        Self {
            homology_dimensions: vec![0, 1],
            max_edge_length: None,
        }
    }
}

/// An edge `(u, v)` of the filtration.
#[derive(Debug, Clone, Copy)]
struct Edge {
    u: usize,
    v: usize,
    value: f32,
}

impl VietorisRips {
    fn pairwise_distances(cloud: ArrayView2<f32>) -> Array2<f32> {
        let n = cloud.nrows();
        let mut dist = Array2::zeros((n, n));
        for i in 0..n {
            for j in (i + 1)..n {
                let d = (&cloud.row(i) - &cloud.row(j)).mapv(|x| x * x).sum().sqrt();
                dist[[i, j]] = d;
                dist[[j, i]] = d;
            }
        }
        dist
    }

    /// Returns the edges of the filtration sorted by value, ties broken by vertices.
    fn sorted_edges(&self, dist: &Array2<f32>) -> Vec<Edge> {
        let n = dist.nrows();
        let max = self.max_edge_length.unwrap_or(f32::INFINITY);

        let mut edges: Vec<Edge> = (0..n)
            .flat_map(|u| ((u + 1)..n).map(move |v| (u, v)))
            .map(|(u, v)| Edge {
                u,
                v,
                value: dist[[u, v]],
            })
            .filter(|e| e.value <= max)
            .collect();

        edges.sort_by(|a, b| a.value.total_cmp(&b.value).then((a.u, a.v).cmp(&(b.u, b.v))));
        edges
    }

    /// Kruskal over the sorted edges: every merge kills a component born at 0.
    fn zero_dimensional(n: usize, edges: &[Edge]) -> Vec<PersistencePair> {
        let mut components = UnionFind::new(n);
        edges
            .iter()
            .filter(|e| components.union(e.u, e.v))
            .map(|e| PersistencePair {
                birth: 0.0,
                death: e.value,
                dim: 0,
            })
            .collect()
    }

    /// Reduces the boundary matrix of the triangles against the edges over Z/2.
    ///
    /// The pivot of every reduced column is a cycle creating edge, killed by that triangle.
    fn one_dimensional(n: usize, edges: &[Edge]) -> Vec<PersistencePair> {
        let index: HashMap<(usize, usize), usize> = edges
            .iter()
            .enumerate()
            .map(|(i, e)| ((e.u, e.v), i))
            .collect();

        let mut triangles = Vec::new();
        for u in 0..n {
            for v in (u + 1)..n {
                let Some(&uv) = index.get(&(u, v)) else {
                    continue;
                };
                for w in (v + 1)..n {
                    if let (Some(&uw), Some(&vw)) = (index.get(&(u, w)), index.get(&(v, w))) {
                        let mut boundary = vec![uv, uw, vw];
                        boundary.sort_unstable();
                        triangles.push(boundary);
                    }
                }
            }
        }

        // A triangle enters with its longest edge, which is also its largest edge index.
        triangles.sort_by_key(|b| b[2]);

        let mut components = UnionFind::new(n);
        let merges = edges.iter().filter(|e| components.union(e.u, e.v)).count();
        let cycles = edges.len() - merges;

        let mut pivots: HashMap<usize, Vec<usize>> = HashMap::new();
        let mut pairs = Vec::new();

        for mut column in triangles {
            if pivots.len() == cycles {
                break;
            }

            let death = edges[column[2]].value;
            while let Some(&low) = column.last() {
                match pivots.get(&low) {
                    Some(reducer) => column = symmetric_difference(&column, reducer),
                    None => break,
                }
            }

            if let Some(&low) = column.last() {
                pairs.push(PersistencePair {
                    birth: edges[low].value,
                    death,
                    dim: 1,
                });
                pivots.insert(low, column);
            }
        }

        pairs
    }
}

impl PersistenceBackend for VietorisRips {
    fn diagram(&self, cloud: ArrayView2<f32>) -> Result<PersistenceDiagram> {
        let n = cloud.nrows();
        let dist = Self::pairwise_distances(cloud);
        let edges = self.sorted_edges(&dist);

        let mut pairs = Vec::new();
        if self.homology_dimensions.contains(&0) {
            pairs.extend(Self::zero_dimensional(n, &edges));
        }
        if self.homology_dimensions.contains(&1) {
            pairs.extend(Self::one_dimensional(n, &edges));
        }

        Ok(PersistenceDiagram::new(pairs))
    }
}

/// Sorted merge of two sorted index lists, dropping indices present in both.
fn symmetric_difference(a: &[usize], b: &[usize]) -> Vec<usize> {
    let mut out = Vec::with_capacity(a.len() + b.len());
    let (mut i, mut j) = (0, 0);

    while i < a.len() && j < b.len() {
        match a[i].cmp(&b[j]) {
            std::cmp::Ordering::Less => {
                out.push(a[i]);
                i += 1;
            }
            std::cmp::Ordering::Greater => {
                out.push(b[j]);
                j += 1;
            }
            std::cmp::Ordering::Equal => {
                i += 1;
                j += 1;
            }
        }
    }

    out.extend_from_slice(&a[i..]);
    out.extend_from_slice(&b[j..]);
    out
}

struct UnionFind {
    parent: Vec<usize>,
    rank: Vec<u8>,
}

impl UnionFind {
    fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
            rank: vec![0; n],
        }
    }

    fn find(&mut self, mut x: usize) -> usize {
        while self.parent[x] != x {
            self.parent[x] = self.parent[self.parent[x]];
            x = self.parent[x];
        }
        x
    }

    /// Merges the sets of `a` and `b`, returns whether they were disjoint.
    fn union(&mut self, a: usize, b: usize) -> bool {
        let (a, b) = (self.find(a), self.find(b));
        if a == b {
            return false;
        }

        match self.rank[a].cmp(&self.rank[b]) {
            std::cmp::Ordering::Less => self.parent[a] = b,
            std::cmp::Ordering::Greater => self.parent[b] = a,
            std::cmp::Ordering::Equal => {
                self.parent[b] = a;
                self.rank[a] += 1;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::arr2;

    #[test]
    fn two_clusters_have_one_long_bar() {
        let cloud = arr2(&[[0.0_f32, 0.0], [0.1, 0.0], [0.0, 0.1], [10.0, 10.0], [10.1, 10.0]]);
        let diagram = VietorisRips::default().diagram(cloud.view()).unwrap();

        let long: Vec<_> = diagram.in_dim(0).filter(|p| p.death > 1.0).collect();
        assert_eq!(diagram.in_dim(0).count(), 4);
        assert_eq!(long.len(), 1);
        assert_eq!(long[0].birth, 0.0);
    }

    #[test]
    fn square_has_one_loop() {
        let cloud = arr2(&[[0.0_f32, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]]);
        let diagram = VietorisRips::default().diagram(cloud.view()).unwrap();

        let loops: Vec<_> = diagram.in_dim(1).collect();
        assert_eq!(loops.len(), 1);
        assert_eq!(loops[0].birth, 1.0);
        assert!((loops[0].death - 2.0_f32.sqrt()).abs() < 1e-6);
    }

    #[test]
    fn collinear_points_have_no_loop() {
        let cloud = arr2(&[[0.0_f32], [1.0], [2.0], [4.0]]);
        let diagram = VietorisRips::default().diagram(cloud.view()).unwrap();
        assert_eq!(diagram.in_dim(1).count(), 0);
        assert_eq!(diagram.in_dim(0).count(), 3);
    }

    #[test]
    fn requested_dimensions_filter_pairs() {
        let cloud = arr2(&[[0.0_f32, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]]);
        let rips = VietorisRips {
            homology_dimensions: vec![1],
            max_edge_length: None,
        };
        let diagram = rips.diagram(cloud.view()).unwrap();
        assert!(diagram.pairs().iter().all(|p| p.dim == 1));
        assert_eq!(diagram.len(), 1);
    }

    #[test]
    fn long_edges_are_cut() {
        let cloud = arr2(&[[0.0_f32, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]]);
        let rips = VietorisRips {
            homology_dimensions: vec![0, 1],
            max_edge_length: Some(1.2),
        };
        let diagram = rips.diagram(cloud.view()).unwrap();

        // the square never gets filled: its loop is essential
        assert_eq!(diagram.in_dim(1).count(), 0);
        assert_eq!(diagram.in_dim(0).count(), 3);
    }

    #[test]
    fn empty_cloud_has_empty_diagram() {
        let cloud = Array2::<f32>::zeros((0, 3));
        assert!(VietorisRips::default().diagram(cloud.view()).unwrap().is_empty());
    }
}
