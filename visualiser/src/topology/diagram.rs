use serde::{Deserialize, Serialize};

/// A topological feature of dimension `dim` born at filtration value `birth` and killed at
/// `death`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PersistencePair {
    pub birth: f32,
    pub death: f32,
    pub dim: usize,
}

impl PersistencePair {
    pub fn persistence(&self) -> f32 {
        self.death - self.birth
    }

    /// Whether the feature exists at filtration value `t`.
    pub fn is_alive_at(&self, t: f32) -> bool {
        self.birth <= t && t < self.death
    }
}

/// The finite pairs of a filtration. Pairs with `death <= birth` are never stored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersistenceDiagram {
    pairs: Vec<PersistencePair>,
}

impl PersistenceDiagram {
    pub fn new(pairs: impl IntoIterator<Item = PersistencePair>) -> Self {
        Self {
            pairs: pairs.into_iter().filter(|p| p.death > p.birth).collect(),
        }
    }

    pub fn pairs(&self) -> &[PersistencePair] {
        &self.pairs
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Returns the pairs of homology dimension `dim`.
    pub fn in_dim(&self, dim: usize) -> impl Iterator<Item = &PersistencePair> + '_ {
        self.pairs.iter().filter(move |p| p.dim == dim)
    }

    /// Returns how many features of dimension `dim` are alive at `t`.
    pub fn betti_number(&self, dim: usize, t: f32) -> usize {
        self.in_dim(dim).filter(|p| p.is_alive_at(t)).count()
    }

    /// Returns the largest death value, `None` for an empty diagram.
    pub fn max_death(&self) -> Option<f32> {
        self.pairs.iter().map(|p| p.death).reduce(f32::max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair(birth: f32, death: f32, dim: usize) -> PersistencePair {
        PersistencePair { birth, death, dim }
    }

    #[test]
    fn zero_length_pairs_are_dropped() {
        let diagram = PersistenceDiagram::new([pair(0.0, 0.0, 0), pair(1.0, 2.0, 1), pair(3.0, 2.0, 1)]);
        assert_eq!(diagram.pairs(), &[pair(1.0, 2.0, 1)]);
    }

    #[test]
    fn betti_number_counts_half_open_intervals() {
        let diagram = PersistenceDiagram::new([pair(0.0, 1.0, 0), pair(0.0, 2.0, 0), pair(0.5, 1.5, 1)]);
        assert_eq!(diagram.betti_number(0, 0.0), 2);
        assert_eq!(diagram.betti_number(0, 1.0), 1);
        assert_eq!(diagram.betti_number(1, 1.0), 1);
        assert_eq!(diagram.betti_number(1, 1.5), 0);
        assert_eq!(diagram.max_death(), Some(2.0));
    }
}
