use ndarray::{Array1, Array3, ArrayView2, s};

use super::PersistenceDiagram;
use crate::error::{Result, VisErr};

/// Betti curves sampled on a grid shared by a whole collection of diagrams.
///
/// The grid of every homology dimension spans from the smallest birth to the largest death
/// found among the pairs of that dimension.
#[derive(Debug, Clone, PartialEq)]
pub struct BettiCurve {
    dims: Vec<usize>,
    samplings: Vec<Array1<f32>>,
}

impl BettiCurve {
    /// Fits the sampling grids.
    ///
    /// # Arguments
    /// * `diagrams` - The diagrams the grids should cover.
    /// * `dims` - The homology dimensions to sample, dimensions without pairs get a
    ///   degenerate grid at `0`.
    /// * `n_bins` - The amount of samples per grid.
    ///
    /// # Errors
    /// `VisErr::EmptyInput` if `n_bins` is zero.
    pub fn fit(diagrams: &[PersistenceDiagram], dims: &[usize], n_bins: usize) -> Result<Self> {
        if n_bins == 0 {
            return Err(VisErr::EmptyInput("betti curve bins"));
        }

        let samplings = dims
            .iter()
            .map(|&dim| {
                let pairs = || diagrams.iter().flat_map(move |d| d.in_dim(dim));
                let lo = pairs().map(|p| p.birth).reduce(f32::min).unwrap_or(0.0);
                let hi = pairs().map(|p| p.death).reduce(f32::max).unwrap_or(lo);
                Array1::linspace(lo, hi, n_bins)
            })
            .collect();

        Ok(Self {
            dims: dims.to_vec(),
            samplings,
        })
    }

    pub fn dims(&self) -> &[usize] {
        &self.dims
    }

    /// Returns the sampling grid of `dim`, if it was fitted.
    pub fn sampling(&self, dim: usize) -> Option<&Array1<f32>> {
        self.dims
            .iter()
            .position(|&d| d == dim)
            .map(|i| &self.samplings[i])
    }

    /// Counts the features alive at every sample of every grid.
    ///
    /// # Returns
    /// A `(diagrams, dims, bins)` array.
    pub fn transform(&self, diagrams: &[PersistenceDiagram]) -> Array3<f32> {
        let n_bins = self.samplings.first().map_or(0, Array1::len);
        let mut curves = Array3::zeros((diagrams.len(), self.dims.len(), n_bins));

        for (i, diagram) in diagrams.iter().enumerate() {
            for (k, (&dim, grid)) in self.dims.iter().zip(&self.samplings).enumerate() {
                for (b, &t) in grid.iter().enumerate() {
                    curves[[i, k, b]] = diagram.betti_number(dim, t) as f32;
                }
            }
        }

        curves
    }

    pub fn fit_transform(
        diagrams: &[PersistenceDiagram],
        dims: &[usize],
        n_bins: usize,
    ) -> Result<(Self, Array3<f32>)> {
        let curve = Self::fit(diagrams, dims, n_bins)?;
        let curves = curve.transform(diagrams);
        Ok((curve, curves))
    }

    /// Selects the `(diagrams, bins)` surface of `dim` out of `transform`'s output.
    pub fn surface<'a>(&self, curves: &'a Array3<f32>, dim: usize) -> Option<ArrayView2<'a, f32>> {
        let k = self.dims.iter().position(|&d| d == dim)?;
        Some(curves.slice(s![.., k, ..]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::PersistencePair;

    fn diagram(pairs: &[(f32, f32, usize)]) -> PersistenceDiagram {
        PersistenceDiagram::new(pairs.iter().map(|&(birth, death, dim)| PersistencePair {
            birth,
            death,
            dim,
        }))
    }

    #[test]
    fn grid_spans_all_diagrams() {
        let diagrams = [diagram(&[(0.0, 1.0, 0)]), diagram(&[(0.0, 3.0, 0), (1.0, 2.0, 1)])];
        let curve = BettiCurve::fit(&diagrams, &[0, 1], 4).unwrap();

        assert_eq!(curve.sampling(0).unwrap(), &Array1::from(vec![0.0, 1.0, 2.0, 3.0]));
        assert_eq!(curve.sampling(1).unwrap()[0], 1.0);
        assert_eq!(curve.sampling(1).unwrap()[3], 2.0);
        assert!(curve.sampling(2).is_none());
    }

    #[test]
    fn curve_counts_alive_bars() {
        let diagrams = [
            diagram(&[(0.0, 1.0, 0), (0.0, 3.0, 0)]),
            diagram(&[(0.0, 2.0, 0)]),
        ];
        let (curve, curves) = BettiCurve::fit_transform(&diagrams, &[0], 4).unwrap();

        assert_eq!(curves.dim(), (2, 1, 4));
        let surface = curve.surface(&curves, 0).unwrap();
        assert_eq!(surface.row(0).to_vec(), vec![2.0, 1.0, 1.0, 0.0]);
        assert_eq!(surface.row(1).to_vec(), vec![1.0, 1.0, 0.0, 0.0]);
    }

    #[test]
    fn dimension_without_pairs_is_flat_zero() {
        let diagrams = [diagram(&[(0.0, 1.0, 0)])];
        let (curve, curves) = BettiCurve::fit_transform(&diagrams, &[0, 2], 3).unwrap();
        let surface = curve.surface(&curves, 2).unwrap();
        assert!(surface.iter().all(|&b| b == 0.0));
    }

    #[test]
    fn zero_bins_is_an_error() {
        assert!(BettiCurve::fit(&[], &[0], 0).is_err());
    }
}
