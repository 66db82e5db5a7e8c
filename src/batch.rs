//! Batching module
//!
//! Groups items into fixed-size [`Batch`]es for submission to the capture
//! API. The batch size is validated up front so a bad configuration fails
//! before any file or network I/O.

use crate::error::LoaderError;

/// A numbered batch of items to submit in one request.
///
/// Batches carry their 1-based position and the total batch count so
/// progress and failure messages can say "batch 3/12".
#[derive(Debug, Clone, PartialEq)]
pub struct Batch<T> {
    /// 1-based batch number.
    pub number: usize,
    /// Total number of batches in the run.
    pub total: usize,
    /// The items in this batch, in input order.
    pub items: Vec<T>,
}

impl<T> Batch<T> {
    /// Number of items in the batch.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Splits items into fixed-size batches.
///
/// Created with a validated batch size; [`Batcher::new`] rejects zero so the
/// degenerate configuration is caught before any work begins.
#[derive(Debug, Clone, Copy)]
pub struct Batcher {
    size: usize,
}

impl Batcher {
    /// Creates a batcher with the given batch size.
    ///
    /// # Errors
    ///
    /// Returns [`LoaderError::Config`] if `size` is zero.
    pub fn new(size: usize) -> Result<Self, LoaderError> {
        if size == 0 {
            return Err(LoaderError::Config(
                "batch size must be a positive integer".to_string(),
            ));
        }
        Ok(Self { size })
    }

    /// The configured batch size.
    #[must_use]
    pub fn size(&self) -> usize {
        self.size
    }

    /// Splits `items` into batches of the configured size.
    ///
    /// The last batch may be smaller. Input order is preserved: the
    /// concatenation of all batches' items equals `items` exactly. An empty
    /// input yields no batches.
    #[must_use]
    pub fn split<T>(&self, items: Vec<T>) -> Vec<Batch<T>> {
        let total = items.len().div_ceil(self.size);
        let mut batches = Vec::with_capacity(total);
        let mut items = items.into_iter();
        for number in 1..=total {
            let chunk: Vec<T> = items.by_ref().take(self.size).collect();
            batches.push(Batch {
                number,
                total,
                items: chunk,
            });
        }
        batches
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_batch_size_is_config_error() {
        let err = Batcher::new(0).unwrap_err();
        assert!(matches!(err, LoaderError::Config(_)));
    }

    #[test]
    fn splits_225_items_into_100_100_25() {
        let batcher = Batcher::new(100).unwrap();
        let batches = batcher.split((0..225).collect::<Vec<_>>());
        let sizes: Vec<usize> = batches.iter().map(Batch::len).collect();
        assert_eq!(sizes, vec![100, 100, 25]);
        assert_eq!(batches[0].number, 1);
        assert_eq!(batches[2].number, 3);
        assert!(batches.iter().all(|b| b.total == 3));
    }

    #[test]
    fn batch_size_larger_than_input_yields_one_batch() {
        let batcher = Batcher::new(50).unwrap();
        let batches = batcher.split(vec![1, 2, 3]);
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].items, vec![1, 2, 3]);
    }

    #[test]
    fn empty_input_yields_no_batches() {
        let batcher = Batcher::new(10).unwrap();
        let batches = batcher.split(Vec::<u8>::new());
        assert!(batches.is_empty());
    }

    #[test]
    fn concatenated_batches_reconstruct_input() {
        let batcher = Batcher::new(7).unwrap();
        let input: Vec<u32> = (0..100).collect();
        let batches = batcher.split(input.clone());
        let rebuilt: Vec<u32> = batches.into_iter().flat_map(|b| b.items).collect();
        assert_eq!(rebuilt, input);
    }
}
