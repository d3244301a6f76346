//! Persistent homology of activation point clouds.
mod betti;
mod diagram;
mod rips;

pub use betti::BettiCurve;
pub use diagram::{PersistenceDiagram, PersistencePair};
pub use rips::{PersistenceBackend, VietorisRips};

use log::debug;
use ml_core::Tensor;

use crate::{error::Result, sampling::flatten_rows};

/// Computes one persistence diagram per layer.
///
/// Each activation of shape `(batch, *features)` is flattened into a `(batch, features)`
/// point cloud.
///
/// # Arguments
/// * `activations` - The output of every layer, in forward order.
/// * `backend` - The persistence algorithm.
///
/// # Errors
/// `VisErr::Shape` if an activation has no batch axis.
pub fn persistence_diagrams_of_activations(
    activations: &[Tensor],
    backend: &dyn PersistenceBackend,
) -> Result<Vec<PersistenceDiagram>> {
    activations
        .iter()
        .enumerate()
        .map(|(layer, act)| {
            let cloud = flatten_rows(act)?;
            let diagram = backend.diagram(cloud.view())?;
            debug!(
                layer = layer,
                points = cloud.nrows(),
                pairs = diagram.len();
                "computed persistence diagram"
            );
            Ok(diagram)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array3;

    #[test]
    fn one_diagram_per_layer() {
        let acts = vec![
            Array3::<f32>::zeros((3, 1, 2)).into_dyn(),
            ndarray::arr2(&[[0.0_f32], [1.0], [5.0]]).into_dyn(),
        ];
        let diagrams = persistence_diagrams_of_activations(&acts, &VietorisRips::default()).unwrap();

        assert_eq!(diagrams.len(), 2);
        // all points coincide: every bar has zero length
        assert!(diagrams[0].is_empty());
        assert_eq!(diagrams[1].len(), 2);
    }
}
