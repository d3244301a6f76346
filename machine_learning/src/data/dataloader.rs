use std::num::NonZeroUsize;

use ml_core::{Batch, DataLoader, Dataset};
use ndarray::Axis;
use rand::{SeedableRng, rngs::StdRng, seq::SliceRandom};

use super::InMemoryDataset;

/// Batching loader over an [`InMemoryDataset`].
///
/// The visiting order is fixed at construction: either the dataset order or a seeded
/// permutation of it, so every pass yields the same batches.
#[derive(Debug, Clone)]
pub struct InMemoryLoader {
    dataset: InMemoryDataset,
    batch_size: NonZeroUsize,
    order: Vec<usize>,
}

impl InMemoryLoader {
    pub fn new(dataset: InMemoryDataset, batch_size: NonZeroUsize) -> Self {
        let order = (0..dataset.num_samples()).collect();
        Self {
            dataset,
            batch_size,
            order,
        }
    }

    /// Same as `new` but visits the samples in a permutation derived from `seed`.
    pub fn shuffled(dataset: InMemoryDataset, batch_size: NonZeroUsize, seed: u64) -> Self {
        let mut loader = Self::new(dataset, batch_size);
        loader.order.shuffle(&mut StdRng::seed_from_u64(seed));
        loader
    }

    #[inline]
    pub fn batch_size(&self) -> usize {
        self.batch_size.get()
    }
}

impl DataLoader for InMemoryLoader {
    fn dataset(&self) -> &dyn Dataset {
        &self.dataset
    }

    fn batches(&self) -> Box<dyn Iterator<Item = Batch> + '_> {
        Box::new(self.order.chunks(self.batch_size.get()).map(|indices| Batch {
            inputs: self.dataset.inputs().select(Axis(0), indices),
            labels: indices
                .iter()
                .map(|&i| self.dataset.labels()[i].clone())
                .collect(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ml_core::Label;
    use ndarray::Array2;

    fn dataset(n: usize) -> InMemoryDataset {
        let inputs = Array2::from_shape_fn((n, 1), |(i, _)| i as f32).into_dyn();
        let labels = (0..n).map(|i| Label::Class(i as i64 + 100)).collect();
        InMemoryDataset::new(inputs, labels).unwrap()
    }

    #[test]
    fn batches_respect_batch_size() {
        let dl = InMemoryLoader::new(dataset(5), NonZeroUsize::new(2).unwrap());
        let batches: Vec<_> = dl.batches().collect();

        assert_eq!(batches.len(), 3);
        assert_eq!(batches[0].inputs.shape(), &[2, 1]);
        assert_eq!(batches[0].labels, vec![Label::Class(100), Label::Class(101)]);
        assert_eq!(batches[2].len(), 1);
        assert_eq!(batches[2].inputs[[0, 0]], 4.0);
    }

    #[test]
    fn every_pass_restarts_from_the_beginning() {
        let dl = InMemoryLoader::new(dataset(3), NonZeroUsize::new(2).unwrap());
        let first = dl.batches().next().unwrap();
        let again = dl.batches().next().unwrap();
        assert_eq!(first.inputs, again.inputs);
    }

    #[test]
    fn shuffled_loader_visits_every_sample_once() {
        let dl = InMemoryLoader::shuffled(dataset(10), NonZeroUsize::new(3).unwrap(), 7);
        let mut seen: Vec<f32> = dl
            .batches()
            .flat_map(|b| b.inputs.iter().copied().collect::<Vec<_>>())
            .collect();
        seen.sort_by(f32::total_cmp);
        assert_eq!(seen, (0..10).map(|i| i as f32).collect::<Vec<_>>());
    }

    #[test]
    fn empty_dataset_yields_no_batches() {
        let dl = InMemoryLoader::new(dataset(0), NonZeroUsize::new(4).unwrap());
        assert_eq!(dl.batches().count(), 0);
    }
}
