use ml_core::DataLoader;

/// What a [`Visualiser`](crate::Visualiser) reads from the training pipeline.
///
/// The writer is borrowed: it belongs to the training pipeline and outlives the visualiser.
pub struct Pipeline<'a, E, W: ?Sized> {
    pub extractor: E,
    /// Index 0 is the primary loader, the only one the visualiser reads.
    pub dataloaders: Vec<Box<dyn DataLoader + 'a>>,
    pub writer: &'a mut W,
}

impl<'a, E, W: ?Sized> Pipeline<'a, E, W> {
    pub fn new(extractor: E, writer: &'a mut W) -> Self {
        Self {
            extractor,
            dataloaders: Vec::new(),
            writer,
        }
    }

    pub fn with_loader(mut self, loader: impl DataLoader + 'a) -> Self {
        self.dataloaders.push(Box::new(loader));
        self
    }

    pub fn primary_loader(&self) -> Option<&dyn DataLoader> {
        self.dataloaders.first().map(|l| &**l as &dyn DataLoader)
    }
}
