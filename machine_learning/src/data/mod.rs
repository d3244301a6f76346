mod dataloader;
mod dataset;

pub use dataloader::InMemoryLoader;
pub use dataset::InMemoryDataset;
