use super::{Record, SummaryWriter};
use crate::error::Result;

/// Keeps every record in memory.
#[derive(Debug, Default)]
pub struct MemoryWriter {
    records: Vec<Record>,
    flushes: usize,
}

impl MemoryWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Returns the records with the given tag, in append order.
    pub fn with_tag<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = &'a Record> + 'a {
        self.records.iter().filter(move |r| r.tag == tag)
    }

    /// Returns how many times the writer was flushed.
    pub fn flushes(&self) -> usize {
        self.flushes
    }

    pub fn into_records(self) -> Vec<Record> {
        self.records
    }
}

impl SummaryWriter for MemoryWriter {
    fn append(&mut self, record: Record) -> Result<()> {
        self.records.push(record);
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.flushes += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::writer::{DataFormat, Embedding};
    use ndarray::{Array2, Array3};

    #[test]
    fn records_keep_append_order_and_tags() {
        let mut writer = MemoryWriter::new();
        writer
            .add_embedding("a", Embedding::new(Array2::zeros((2, 3))), 0)
            .unwrap();
        writer
            .add_image("b", Array3::zeros((1, 1, 3)).into_dyn(), DataFormat::Hwc, 0)
            .unwrap();
        writer
            .add_embedding("a", Embedding::new(Array2::zeros((4, 3))), 1)
            .unwrap();
        writer.flush().unwrap();

        let steps: Vec<_> = writer.with_tag("a").map(|r| r.step).collect();
        assert_eq!(steps, vec![0, 1]);
        assert!(writer.records()[1].pixels().is_some());
        assert_eq!(writer.flushes(), 1);
    }
}
